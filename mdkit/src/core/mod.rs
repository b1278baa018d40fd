pub mod config;
pub use config::*;

pub mod diagnostics;
pub use diagnostics::*;
