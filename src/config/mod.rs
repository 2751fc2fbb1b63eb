//! # Configuration
//!
//! Centralized tunables for the volume store. Import constants from here
//! rather than redefining them locally:
//!
//! ```ignore
//! use voxstore::config::DEFAULT_BLOCK_SIDE_LENGTH;
//! ```

mod constants;

pub use constants::*;
