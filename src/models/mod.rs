pub mod export;
pub mod quote;
pub mod ticket;
pub mod utterance;

pub use export::*;
pub use quote::*;
pub use ticket::*;
pub use utterance::*;
