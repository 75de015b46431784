//! Common types, traits, and error definitions for rover_nav
//!
//! This module provides the foundational building blocks used by the
//! mapping, planning and tracking modules.

pub mod types;
pub mod traits;
pub mod error;

pub use types::*;
pub use traits::*;
pub use error::*;
