// Path Tracking module

pub mod path_follower;

pub use path_follower::*;
