//! Flattening transform
//!
//! Turns one nested record into wide rows, one per element of the exploded
//! list field. The transform is pure and holds no shared mutable state, so
//! shard writers may run it on any number of workers.

mod plan;
mod types;

pub use plan::FlattenPlan;
pub use types::{FlatRow, RecordTransform};
