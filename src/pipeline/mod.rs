pub mod completion;
pub mod extract;
pub mod normalize;
pub mod orchestrator;
