use super::load_reference;
use crate::cli::InfoArgs;
use crate::error::Result;
use restime::core::elements::ElementResolver;
use restime::core::io::open_trajectory;
use std::collections::BTreeMap;
use tracing::info;

pub fn run(args: InfoArgs) -> Result<()> {
    let (elements, residues) = load_reference(&args.reference)?;
    let resolver = ElementResolver::new(&elements, &residues);

    info!("Indexing {}.", args.input.display());
    let reader = open_trajectory(&args.input, &resolver)?;

    let mut element_counts: BTreeMap<&str, usize> = BTreeMap::new();
    let mut residue_counts: BTreeMap<&str, usize> = BTreeMap::new();
    for atom in reader.atoms() {
        *element_counts.entry(atom.element.as_str()).or_default() += 1;
        *residue_counts.entry(atom.residue_name.as_str()).or_default() += 1;
    }

    println!("trajectory: {}", args.input.display());
    println!("atoms:      {}", reader.atom_count());
    println!("frames:     {}", reader.frame_count());
    println!("elements:");
    for (element, count) in &element_counts {
        println!("  {:<3} {}", element, count);
    }
    println!("residues:");
    for (residue, count) in &residue_counts {
        println!("  {:<5} {}", residue, count);
    }

    Ok(())
}
