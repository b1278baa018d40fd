pub mod inspect_impl;
pub use inspect_impl::{
    inspect_samples,
    rmsd_per_timestep,
    save_first_sampled,
    InspectReport,
    RmsdStats,
};

pub mod command;
pub use command::InspectCommand;
