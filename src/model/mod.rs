pub mod action;
pub mod config;
pub mod outline;
pub mod project;

pub use action::*;
pub use config::*;
pub use outline::*;
pub use project::*;
