pub mod export_impl;
pub use export_impl::{
    export_samples,
    load_atom_types,
    ExportOptions,
    ExportSummary,
};

pub mod command;
pub use command::ExportCommand;
