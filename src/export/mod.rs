pub mod batch;
pub mod orchestrator;

pub use batch::*;
pub use orchestrator::*;
