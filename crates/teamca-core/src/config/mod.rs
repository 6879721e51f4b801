//! Configuration system for teamca

pub mod defaults;
pub mod env;
mod loader;
mod types;
pub mod validation;

pub use defaults::*;
pub use loader::*;
pub use types::*;
pub use validation::*;
