//! Persistence of map snapshots

pub mod export;

pub use export::*;
