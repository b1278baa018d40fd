pub mod cli;
pub mod logging;
pub mod version;

pub mod core;
pub mod compare;
pub mod convert;
pub mod export;
pub mod inspect;
pub mod nancheck;

pub use cli::OptProcess;
