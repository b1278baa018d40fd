use std::path::PathBuf;

use clap::Parser;
use colored::Colorize;
use md_parsers::ParameterMapping;
use shared::{
    log,
    ensure,
    Result,
};
use crate::OptProcess;
use crate::compare::{
    compare_checkpoints,
    CompareOutcome,
};


#[derive(Debug, Parser)]
/// Compare two model checkpoints (safetensors) key by key.
///
/// Reports keys present in only one of them, tensors of different shapes and the absolute
/// differences of the parameters.
pub struct CompareCommand {
    /// First checkpoint file.
    ckpt1: PathBuf,

    /// Second checkpoint file.
    ckpt2: PathBuf,

    #[arg(short='t', long, default_value_t=0.0)]
    /// Largest absolute difference still treated as identical.
    ///
    /// The default 0 requires exact equality, a difference of a single ULP is reported.
    tolerance: f64,
}


impl OptProcess for CompareCommand {
    fn process(&self) -> Result<()> {
        ensure!(self.tolerance >= 0.0, "Tolerance must be a non-negative number, got {}.", self.tolerance);

        log::info!("Loading checkpoint 1: {:?}", self.ckpt1);
        let ckpt1 = ParameterMapping::from_file(&self.ckpt1)?;

        log::info!("Loading checkpoint 2: {:?}", self.ckpt2);
        let ckpt2 = ParameterMapping::from_file(&self.ckpt2)?;

        log::info!("Checkpoint 1 has {} keys", ckpt1.len());
        log::info!("Checkpoint 2 has {} keys", ckpt2.len());

        match compare_checkpoints(&ckpt1, &ckpt2, self.tolerance) {
            CompareOutcome::KeyMismatch { only_in_first, only_in_second } => {
                log::warn!("{}", "Checkpoints have different keys!".red().bold());
                log::warn!("Keys only in ckpt1: {:?}", only_in_first);
                log::warn!("Keys only in ckpt2: {:?}", only_in_second);
            },
            CompareOutcome::Compared(report) => {
                log::info!("Comparing parameters:\n{}", report);
                if report.is_identical() {
                    log::info!("{}", "The checkpoints are IDENTICAL!".green().bold());
                } else {
                    log::warn!("{} ({} of {} keys differ)",
                        "The checkpoints are DIFFERENT".yellow().bold(), report.ndiffering(), report.keys.len());
                }
            },
        }

        Ok(())
    }
}
