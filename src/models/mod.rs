pub mod log;
pub mod record;

pub use log::*;
pub use record::*;
