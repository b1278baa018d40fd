pub mod nancheck_impl;
pub use nancheck_impl::{
    scan_samples,
    BatchNanCount,
    NanReport,
    ValueStats,
};

pub mod command;
pub use command::NancheckCommand;
