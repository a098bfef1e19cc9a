use nalgebra::{Point3, Vector3};
use std::collections::{BTreeMap, BTreeSet};

/// Symmetric collision map: point index to the set of indices it collides
/// with. Every inserted point appears as a key; isolated points map to an
/// empty set.
pub type CollisionMap = BTreeMap<usize, BTreeSet<usize>>;

/// A point owned by a leaf: atom index, position, and interaction radius.
/// The radius participates in collision tests only, never in placement.
#[derive(Debug, Clone, Copy)]
struct WeightedPoint {
    index: usize,
    position: Point3<f64>,
    radius: f64,
    /// Monotonic insertion sequence, used to break exact distance ties in
    /// nearest-point queries deterministically.
    seq: usize,
}

/// An octree over weighted points for one trajectory frame.
///
/// Each node is an axis-aligned box; a leaf owns its points and splits into
/// 8 octants once its occupancy exceeds the configured capacity, down to a
/// configured maximum depth. Points are routed by position containment; a
/// position outside the root box is clamped onto the root boundary for
/// routing (so it lands in the nearest root-adjacent leaf) but keeps its true
/// coordinates for all distance tests — a point is never dropped silently.
#[derive(Debug, Clone)]
pub struct Octree {
    lower: Point3<f64>,
    upper: Point3<f64>,
    depth: u32,
    max_depth: u32,
    capacity: usize,
    /// Empty for a leaf, exactly 8 once split.
    children: Vec<Octree>,
    points: Vec<WeightedPoint>,
    /// Total points inserted through this node; on the root this doubles as
    /// the insertion-sequence counter.
    inserted: usize,
}

impl Octree {
    /// Allocates a root node covering `[lower, upper]`.
    ///
    /// The caller is expected to inflate the box slightly beyond the tight
    /// bounding box of its points so boundary atoms are not missed.
    pub fn new(
        lower: Point3<f64>,
        upper: Point3<f64>,
        depth: u32,
        max_depth: u32,
        capacity: usize,
    ) -> Self {
        Self {
            lower,
            upper,
            depth,
            max_depth,
            capacity: capacity.max(1),
            children: Vec::new(),
            points: Vec::new(),
            inserted: 0,
        }
    }

    /// Number of points held beneath this node.
    pub fn len(&self) -> usize {
        self.inserted
    }

    pub fn is_empty(&self) -> bool {
        self.inserted == 0
    }

    /// Inserts a weighted point, routing by position containment.
    pub fn insert(&mut self, index: usize, position: Point3<f64>, radius: f64) {
        let seq = self.inserted;
        let routing = self.clamp_into_box(&position);
        self.insert_routed(
            WeightedPoint {
                index,
                position,
                radius,
                seq,
            },
            routing,
        );
    }

    fn insert_routed(&mut self, point: WeightedPoint, routing: Point3<f64>) {
        self.inserted += 1;
        if self.children.is_empty() {
            self.points.push(point);
            if self.points.len() > self.capacity && self.depth < self.max_depth {
                self.split();
            }
        } else {
            let sector = self.sector_of(&routing);
            self.children[sector].insert_routed(point, routing);
        }
    }

    /// Splits a leaf into 8 octants and redistributes its points.
    fn split(&mut self) {
        let center = nalgebra::center(&self.lower, &self.upper);

        let mut children = Vec::with_capacity(8);
        for sector in 0..8 {
            let mut lower = self.lower;
            let mut upper = self.upper;
            for axis in 0..3 {
                if sector & (1 << axis) != 0 {
                    lower[axis] = center[axis];
                } else {
                    upper[axis] = center[axis];
                }
            }
            children.push(Octree::new(
                lower,
                upper,
                self.depth + 1,
                self.max_depth,
                self.capacity,
            ));
        }
        self.children = children;

        for point in std::mem::take(&mut self.points) {
            let routing = self.clamp_into_box(&point.position);
            let sector = self.sector_of(&routing);
            self.children[sector].insert_routed(point, routing);
        }
    }

    /// Octant index of a routing position, choosing the upper half on the
    /// center plane so boundary points resolve deterministically.
    fn sector_of(&self, position: &Point3<f64>) -> usize {
        let center = nalgebra::center(&self.lower, &self.upper);
        let mut sector = 0;
        for axis in 0..3 {
            if position[axis] >= center[axis] {
                sector |= 1 << axis;
            }
        }
        sector
    }

    fn clamp_into_box(&self, position: &Point3<f64>) -> Point3<f64> {
        Point3::new(
            position.x.clamp(self.lower.x, self.upper.x),
            position.y.clamp(self.lower.y, self.upper.y),
            position.z.clamp(self.lower.z, self.upper.z),
        )
    }

    /// Shortest distance between this node's box and `position` (0 inside).
    fn box_distance_to(&self, position: &Point3<f64>) -> f64 {
        let mut gap = Vector3::zeros();
        for axis in 0..3 {
            gap[axis] = (self.lower[axis] - position[axis])
                .max(position[axis] - self.upper[axis])
                .max(0.0);
        }
        gap.norm()
    }

    /// Shortest distance between the boxes of two nodes (0 when touching).
    fn box_distance_between(&self, other: &Octree) -> f64 {
        let mut gap = Vector3::zeros();
        for axis in 0..3 {
            gap[axis] = (self.lower[axis] - other.upper[axis])
                .max(other.lower[axis] - self.upper[axis])
                .max(0.0);
        }
        gap.norm()
    }

    fn collect_leaves<'a>(&'a self, leaves: &mut Vec<&'a Octree>) {
        if self.children.is_empty() {
            if !self.points.is_empty() {
                leaves.push(self);
            }
        } else {
            for child in &self.children {
                child.collect_leaves(leaves);
            }
        }
    }

    /// Finds all colliding pairs: `i` and `j` collide iff
    /// `distance(i, j) <= radius_i + radius_j + tolerance`.
    ///
    /// Points within one leaf are tested pairwise; points in distinct leaves
    /// are only tested when the leaf boxes are within
    /// `radius_i + radius_j + tolerance` of each other, a broad-phase prune
    /// that skips the exact distance test for far-apart regions.
    ///
    /// The result is symmetric, self-pairs are excluded, and every inserted
    /// point is present as a key (isolated points map to empty sets).
    pub fn find_collisions(&self, tolerance: f64) -> CollisionMap {
        let mut leaves = Vec::new();
        self.collect_leaves(&mut leaves);

        let mut collisions = CollisionMap::new();
        for leaf in &leaves {
            for point in &leaf.points {
                collisions.entry(point.index).or_default();
            }
        }

        for (a, leaf_a) in leaves.iter().enumerate() {
            // Same-leaf pairs.
            for (i, pi) in leaf_a.points.iter().enumerate() {
                for pj in leaf_a.points.iter().skip(i + 1) {
                    Self::test_pair(pi, pj, tolerance, 0.0, &mut collisions);
                }
            }
            // Cross-leaf pairs, pruned by box separation.
            for leaf_b in leaves.iter().skip(a + 1) {
                let box_gap = leaf_a.box_distance_between(leaf_b);
                for pi in &leaf_a.points {
                    for pj in &leaf_b.points {
                        Self::test_pair(pi, pj, tolerance, box_gap, &mut collisions);
                    }
                }
            }
        }

        collisions
    }

    fn test_pair(
        pi: &WeightedPoint,
        pj: &WeightedPoint,
        tolerance: f64,
        box_gap: f64,
        collisions: &mut CollisionMap,
    ) {
        let reach = pi.radius + pj.radius + tolerance;
        if box_gap > reach {
            return;
        }
        let squared = (pi.position - pj.position).norm_squared();
        if squared <= reach * reach {
            collisions.entry(pi.index).or_default().insert(pj.index);
            collisions.entry(pj.index).or_default().insert(pi.index);
        }
    }

    /// Returns the index of the point Euclidean-closest to `position`, or
    /// `None` for an empty tree. Exact distance ties resolve to the earliest
    /// inserted point.
    ///
    /// The search descends to the leaf containing `position` first (its box
    /// distance is zero), then visits other branches only while their boxes
    /// are closer than the best match found so far.
    pub fn nearest_point(&self, position: &Point3<f64>) -> Option<usize> {
        let mut best: Option<(f64, usize, usize)> = None;
        self.nearest_into(position, &mut best);
        best.map(|(_, _, index)| index)
    }

    fn nearest_into(&self, position: &Point3<f64>, best: &mut Option<(f64, usize, usize)>) {
        if let Some((best_dist, _, _)) = best {
            if self.box_distance_to(position) > *best_dist {
                return;
            }
        }

        if self.children.is_empty() {
            for point in &self.points {
                let dist = (point.position - position).norm();
                let better = match best {
                    None => true,
                    Some((d, seq, _)) => dist < *d || (dist == *d && point.seq < *seq),
                };
                if better {
                    *best = Some((dist, point.seq, point.index));
                }
            }
        } else {
            let mut order: Vec<&Octree> = self.children.iter().collect();
            order.sort_by(|a, b| {
                a.box_distance_to(position)
                    .partial_cmp(&b.box_distance_to(position))
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            for child in order {
                child.nearest_into(position, best);
            }
        }
    }
}
