pub mod clustering;
pub mod culling;
pub mod index;

pub use clustering::{Cluster, ClusterEngine, EngineResult};
pub use index::SpatialIndex;
