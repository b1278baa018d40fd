use std::path::PathBuf;

use clap::Parser;
use colored::Colorize;
use md_parsers::Samples;
use shared::{
    log,
    bail,
    ensure_dir,
    Result,
};
use crate::OptProcess;
use crate::logging::logger_redirect;
use crate::export::{
    export_samples,
    load_atom_types,
    ExportOptions,
};


#[derive(Debug, Parser)]
/// Export ground truth and sampled trajectories to XYZ files.
///
/// Every molecule of every batch is written twice, once under `ground_truth/` and once under
/// `sampled/`. Element symbols are taken from the `z` field of the dataset archive.
pub struct ExportCommand {
    /// Samples file (HDF5) holding groups `batch_0`, `batch_1`, ...
    samples: PathBuf,

    #[arg(short='o', long, default_value="xyz_valid")]
    /// Output directory.
    output_dir: PathBuf,

    #[arg(long, default_value="data/md17/md17_aspirin.npz")]
    /// Dataset archive providing the atomic numbers `z`.
    npz_path: PathBuf,

    #[arg(short='n', long)]
    /// Maximum number of trajectories to export. All of them are exported if omitted.
    max_traj: Option<usize>,

    #[arg(long, default_value="Aspirin MD17")]
    /// Label put in front of the comment line of each frame.
    label: String,
}


impl OptProcess for ExportCommand {
    fn process(&self) -> Result<()> {
        if !self.npz_path.is_file() {
            bail!("NPZ file not found: {:?}", self.npz_path);
        }

        ensure_dir(&self.output_dir)?;
        logger_redirect(&self.output_dir)?;

        let atom_types = load_atom_types(&self.npz_path)?;

        log::info!("Loading samples from {:?} ...", self.samples);
        let samples = Samples::from_h5(&self.samples)?;
        log::info!("Found {} batches", samples.len());

        let opts = ExportOptions {
            output_dir: self.output_dir.clone(),
            max_traj:   self.max_traj,
            label:      self.label.clone(),
        };
        let summary = export_samples(&samples, &atom_types, &opts)?;

        let msg = format!("Exported {} trajectories to {:?}", summary.written, self.output_dir);
        if summary.warnings.is_empty() {
            log::info!("{}", msg.green().bold());
        } else {
            log::warn!("{} ({} skipped)", msg.yellow().bold(), summary.warnings.len());
        }
        Ok(())
    }
}
