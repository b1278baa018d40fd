use std::path::PathBuf;

use clap::Parser;
use colored::Colorize;
use md_parsers::Samples;
use shared::{
    log,
    Context,
    Result,
};
use crate::OptProcess;
use crate::nancheck::scan_samples;


#[derive(Debug, Parser)]
/// Scan the sampled trajectories of every batch for NaN values.
pub struct NancheckCommand {
    /// Samples file (HDF5) holding groups `batch_0`, `batch_1`, ...
    samples: PathBuf,
}


impl OptProcess for NancheckCommand {
    fn process(&self) -> Result<()> {
        log::info!("Loading {:?} ...", self.samples);
        let samples = Samples::from_h5(&self.samples)
            .with_context(|| format!("Error loading samples from {:?}.", self.samples))?;
        log::info!("Found {} batches", samples.len());

        let report = scan_samples(&samples);
        log::info!("NaN scan result:\n{}", report);

        if report.is_clean() {
            log::info!("{}", "SUCCESS: No NaN values found in any batch!".green().bold());
        } else {
            log::warn!("{}", format!("FAILURE: {} batches contain NaN values.", report.invalid.len()).red().bold());
        }
        Ok(())
    }
}
