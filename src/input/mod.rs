//! Input module
//!
//! Reads the objects selected by an input locator and turns them into
//! validated records. Any schema violation halts the read.

mod reader;

pub use reader::{reader_for, InputReader, ReadBatch};
