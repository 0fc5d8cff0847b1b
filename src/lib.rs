pub mod config;
pub mod graph;
pub mod interaction;
pub mod layout;
pub mod physics;
pub mod session;
pub mod tx;
pub mod util;
