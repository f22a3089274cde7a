//! Common types, traits, and error definitions

pub mod errors;
pub mod traits;
pub mod types;
