//! Repository layer: one sub-module per collection.

mod log;
mod record;

pub use log::*;
pub use record::*;
