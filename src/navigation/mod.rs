// Navigation module: session ownership and scan/replan cadences

pub mod cadence;
pub mod session;

pub use cadence::*;
pub use session::*;
