pub mod config;
pub mod terminal;

pub use config::*;
pub use terminal::*;
