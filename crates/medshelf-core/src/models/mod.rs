//! Domain models for the medshelf system.

mod identity;
mod medication;
mod review;

pub use identity::*;
pub use medication::*;
pub use review::*;
