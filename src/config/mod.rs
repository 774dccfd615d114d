//! Configuration for the atlas generator
//!
//! Provides types and loading for the `itematlas.toml` file.

pub mod loader;
pub mod schema;

pub use loader::*;
pub use schema::*;
