pub mod config;
pub use config::ConvertConfig;

pub mod convert_impl;
pub use convert_impl::{
    build_dataset,
    convert_qm_data,
};

pub mod command;
pub use command::ConvertCommand;
