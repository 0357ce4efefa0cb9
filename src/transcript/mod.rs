pub mod align;
pub mod parser;

pub use align::*;
pub use parser::*;
