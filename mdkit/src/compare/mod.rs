pub mod compare_impl;
pub use compare_impl::{
    compare_checkpoints,
    CompareOutcome,
    CompareReport,
    KeyComparison,
    KeyReport,
};

pub mod command;
pub use command::CompareCommand;
