//! Storage module
//!
//! Maps location URLs onto `object_store` backends.
//!
//! # Overview
//!
//! - `StorageLocation` - a store plus a key prefix (S3, R2, GCS, Azure, local, memory)
//! - `InputLocator` - a location plus a glob selecting input objects

mod glob;
mod location;

pub use glob::{glob_to_regex, split_glob, InputLocator};
pub use location::{join_key, StorageLocation};
