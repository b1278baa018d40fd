use std::path::PathBuf;

use clap::Parser;
use md_parsers::Samples;
use shared::{
    log,
    Result,
};
use crate::OptProcess;
use crate::export::load_atom_types;
use crate::inspect::{
    inspect_samples,
    save_first_sampled,
};


#[derive(Debug, Parser)]
/// Inspect a samples file: batch layout, RMSD between ground truth and sampled trajectories of
/// the first batch, and the total number of trajectories.
pub struct InspectCommand {
    /// Samples file (HDF5) holding groups `batch_0`, `batch_1`, ...
    samples: PathBuf,

    #[arg(long)]
    /// Save the sampled trajectory of the first molecule as XYZ.
    save_xyz: Option<PathBuf>,

    #[arg(long)]
    /// Dataset archive providing the element symbols for `--save-xyz`.
    ///
    /// Every atom is written as carbon if omitted.
    npz_path: Option<PathBuf>,
}


impl OptProcess for InspectCommand {
    fn process(&self) -> Result<()> {
        log::info!("Loading samples from {:?} ...", self.samples);
        let samples = Samples::from_h5(&self.samples)?;

        let report = inspect_samples(&samples)?;
        log::info!("Samples summary:\n{}", report);

        if let Some(out) = self.save_xyz.as_ref() {
            let atom_types = match self.npz_path.as_ref() {
                Some(p) => Some(load_atom_types(p)?),
                None => None,
            };
            save_first_sampled(&samples, atom_types.as_deref(), out)?;
        }

        Ok(())
    }
}
