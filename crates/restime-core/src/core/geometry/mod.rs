//! Spatial indexing for proximity queries.
//!
//! The [`octree`] module provides the weighted-point octree used for
//! geometric bond inference and nearest-atom picking. The index is rebuilt
//! from scratch for every frame that needs it; frames are uncorrelated enough
//! that incremental maintenance is not worth its complexity.

pub mod octree;
