use std::path::{Path, PathBuf};

use md_parsers::{
    elements::symbols_from_atomic_numbers,
    npz::read_atomic_numbers,
    xyz::save_xyz,
    Samples,
    XyzLayout,
};
use shared::{
    log,
    ensure_dir,
    Context,
    Result,
};

use crate::core::Warning;


#[derive(Clone, Debug, PartialEq)]
pub struct ExportOptions {
    pub output_dir: PathBuf,
    pub max_traj:   Option<usize>,

    /// Prefix of the comment line of every frame, e.g. `"Aspirin MD17"`.
    pub label:      String,
}


impl ExportOptions {
    pub fn gt_dir(&self) -> PathBuf { self.output_dir.join("ground_truth") }
    pub fn sampled_dir(&self) -> PathBuf { self.output_dir.join("sampled") }
}


#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExportSummary {
    /// Number of trajectories written, each one as a ground truth and a sampled file.
    pub written:       usize,
    pub limit_reached: bool,
    pub warnings:      Vec<Warning>,
}


/// Element symbols from the `z` field of a dataset archive.
pub fn load_atom_types<P>(npz_path: P) -> Result<Vec<String>>
where P: AsRef<Path> {
    let npz_path = npz_path.as_ref();
    log::info!("Loading atomic numbers from: {:?}", npz_path);
    let z = read_atomic_numbers(npz_path)
        .with_context(|| format!("Error loading NPZ {:?}.", npz_path))?;
    let atom_types = symbols_from_atomic_numbers(&z);
    log::info!("Found {} atoms: {:?}", atom_types.len(), atom_types);
    Ok(atom_types)
}


/// Write every molecule of `samples` as a pair of XYZ files under `ground_truth/` and `sampled/`.
///
/// Molecules whose atom count differs from `atom_types` are skipped with a warning.
pub fn export_samples(samples: &Samples, atom_types: &[String], opts: &ExportOptions) -> Result<ExportSummary> {
    let gt_dir = opts.gt_dir();
    let pred_dir = opts.sampled_dir();
    ensure_dir(&gt_dir)?;
    ensure_dir(&pred_dir)?;

    log::info!("Converting trajectories to XYZ format ...");
    log::info!("Output directory: {:?}", opts.output_dir);
    log::info!("Using atom types: {}", atom_types.join(" "));

    let mut summary = ExportSummary::default();

    for (ibatch, batch) in samples.batches.iter().enumerate() {
        for imol in 0 .. batch.nmolecules() {
            if opts.max_traj.is_some_and(|m| summary.written >= m) {
                log::info!("Reached maximum of {} trajectories.", summary.written);
                summary.limit_reached = true;
                return Ok(summary);
            }

            let (traj_gt, traj_pred) = batch.molecule(imol)?;
            if traj_gt.natoms() != atom_types.len() {
                let w = Warning::new(
                    format!("batch {} molecule {}", ibatch, imol),
                    format!("Molecule size mismatch! Data has {}, expected {}", traj_gt.natoms(), atom_types.len()));
                log::warn!("{}", w);
                summary.warnings.push(w);
                continue;
            }

            let count = summary.written;
            save_xyz(gt_dir.join(format!("trajectory_{:04}_gt.xyz", count)),
                     &traj_gt, atom_types,
                     &format!("{} Ground Truth {}", opts.label, count),
                     XyzLayout::Aligned)?;
            save_xyz(pred_dir.join(format!("trajectory_{:04}_sampled.xyz", count)),
                     &traj_pred, atom_types,
                     &format!("{} Sampled {}", opts.label, count),
                     XyzLayout::Aligned)?;

            summary.written += 1;
            if summary.written % 100 == 0 {
                log::info!("Converted {} trajectories ...", summary.written);
            }
        }
    }

    log::info!("Conversion complete! Total trajectories converted: {}", summary.written);
    log::info!("Ground truth files: {:?}", gt_dir);
    log::info!("Sampled files: {:?}", pred_dir);
    if !summary.warnings.is_empty() {
        log::warn!("{} molecules were skipped.", summary.warnings.len());
    }

    Ok(summary)
}


#[cfg(test)]
mod tests {
    use super::*;
    use md_parsers::{MdDataset, TrajectoryBatch};
    use shared::ndarray as nd;
    use std::fs;
    use tempfile::tempdir;

    /// One batch with two 3-atom molecules and one 2-atom molecule, 4 timesteps.
    fn samples() -> Samples {
        let x = nd::Array3::from_shape_fn((8, 3, 4), |(i, j, t)| i as f64 + j as f64 * 0.1 + t as f64);
        let x_pred = x.mapv(|v| v + 0.5);
        let batch = nd::arr1(&[0, 0, 0, 1, 1, 2, 2, 2]);
        Samples::from(vec![TrajectoryBatch::new(x, x_pred, batch).unwrap()])
    }

    fn opts(dir: &Path, max_traj: Option<usize>) -> ExportOptions {
        ExportOptions {
            output_dir: dir.join("xyz"),
            max_traj,
            label: String::from("Water"),
        }
    }

    fn types() -> Vec<String> {
        vec!["O".into(), "H".into(), "H".into()]
    }

    #[test]
    fn test_export() {
        let dir = tempdir().unwrap();
        let opts = opts(dir.path(), None);
        let summary = export_samples(&samples(), &types(), &opts).unwrap();

        assert_eq!(summary.written, 2);
        assert!(!summary.limit_reached);
        assert_eq!(summary.warnings.len(), 1);
        assert_eq!(summary.warnings[0].subject, "batch 0 molecule 1");

        let gt0 = fs::read_to_string(opts.gt_dir().join("trajectory_0000_gt.xyz")).unwrap();
        let lines = gt0.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 4 * 5);
        assert_eq!(lines[0], "3");
        assert_eq!(lines[1], "Water Ground Truth 0 Frame 0");

        // the second written trajectory is molecule 2, atoms 5..8
        let pred1 = fs::read_to_string(opts.sampled_dir().join("trajectory_0001_sampled.xyz")).unwrap();
        let lines = pred1.lines().collect::<Vec<_>>();
        assert_eq!(lines[1], "Water Sampled 1 Frame 0");
        assert_eq!(lines[2], "O      5.500000     5.600000     5.700000");

        assert!(!opts.gt_dir().join("trajectory_0002_gt.xyz").exists());
    }

    #[test]
    fn test_max_traj() {
        let dir = tempdir().unwrap();
        let opts = opts(dir.path(), Some(1));
        let summary = export_samples(&samples(), &types(), &opts).unwrap();

        assert_eq!(summary.written, 1);
        assert!(summary.limit_reached);
        assert!(opts.sampled_dir().join("trajectory_0000_sampled.xyz").is_file());
        assert!(!opts.sampled_dir().join("trajectory_0001_sampled.xyz").exists());
    }

    #[test]
    fn test_load_atom_types() {
        let dir = tempdir().unwrap();
        let fname = dir.path().join("water.npz");
        let ds = MdDataset::with_placeholders(nd::Array3::zeros((1, 4, 3)), nd::arr1(&[8, 1, 1, 26]), "water", "unknown").unwrap();
        ds.save_to_npz(&fname).unwrap();

        assert_eq!(load_atom_types(&fname).unwrap(), vec!["O", "H", "H", "X"]);
        assert!(load_atom_types(dir.path().join("missing.npz")).is_err());
    }
}
