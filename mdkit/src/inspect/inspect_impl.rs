use std::fmt;
use std::path::Path;

use md_parsers::{
    xyz::save_xyz,
    Samples,
    XyzLayout,
};
use shared::{
    ndarray as nd,
    numeric_methods::{
        mean,
        min_max,
        std_dev,
    },
    log,
    ensure,
    shape_str,
    Result,
};


/// Root mean square deviation of every timestep, `sqrt(sum((x - x_pred)^2) / natoms)`.
///
/// Both arrays are shaped as `[natoms, 3, nframes]`.
pub fn rmsd_per_timestep(x: nd::ArrayView3<f64>, x_pred: nd::ArrayView3<f64>) -> Result<nd::Array1<f64>> {
    ensure!(x.shape() == x_pred.shape(),
        "Shapes of ground truth {} and prediction {} differ.", shape_str(x.shape()), shape_str(x_pred.shape()));
    let natoms = x.shape()[0];
    ensure!(natoms > 0, "No atoms to compute RMSD for.");

    let sq = (&x - &x_pred).mapv(|d| d * d);
    let rmsd = sq.sum_axis(nd::Axis(0))
        .sum_axis(nd::Axis(0))
        .mapv(|s| (s / natoms as f64).sqrt());
    Ok(rmsd)
}


#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RmsdStats {
    pub mean: f64,
    pub std:  f64,
    pub min:  f64,
    pub max:  f64,
}


impl RmsdStats {
    pub fn from_values(rmsd: &nd::Array1<f64>) -> Option<Self> {
        let v = rmsd.to_vec();
        let (min, max) = min_max(&v)?;
        Some(Self {
            mean: mean(&v),
            std:  std_dev(&v),
            min,
            max,
        })
    }
}


#[derive(Clone, Debug, PartialEq)]
pub struct InspectReport {
    pub nbatches:           usize,
    pub keys:               Vec<String>,
    pub x_shape:            Vec<usize>,
    pub x_pred_shape:       Vec<usize>,
    pub rmsd:               nd::Array1<f64>,
    pub rmsd_stats:         Option<RmsdStats>,
    pub total_trajectories: usize,
}


impl fmt::Display for InspectReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Number of batches: {}", self.nbatches)?;
        writeln!(f, "Keys in first batch: {:?}", self.keys)?;
        writeln!(f, "  x shape:      {}", shape_str(&self.x_shape))?;
        writeln!(f, "  x_pred shape: {}", shape_str(&self.x_pred_shape))?;
        writeln!(f, "RMSD per timestep (first batch):")?;
        if let Some(s) = self.rmsd_stats {
            writeln!(f, "  Mean: {:.4} A", s.mean)?;
            writeln!(f, "  Std:  {:.4} A", s.std)?;
            writeln!(f, "  Min:  {:.4} A", s.min)?;
            writeln!(f, "  Max:  {:.4} A", s.max)?;
        } else {
            writeln!(f, "  (no frames)")?;
        }
        write!(f, "Total trajectories: {}", self.total_trajectories)
    }
}


/// Summarize the samples, evaluating the RMSD on the first batch only.
pub fn inspect_samples(samples: &Samples) -> Result<InspectReport> {
    ensure!(!samples.is_empty(), "No batches found in the samples file.");
    let first = &samples.batches[0];

    let rmsd = rmsd_per_timestep(first.x.view(), first.x_pred.view())?;
    let rmsd_stats = RmsdStats::from_values(&rmsd);
    let total_trajectories = samples.batches.iter()
        .map(|b| b.nmolecules())
        .sum();

    Ok(InspectReport {
        nbatches: samples.len(),
        keys: samples.keys.clone(),
        x_shape: first.x.shape().to_vec(),
        x_pred_shape: first.x_pred.shape().to_vec(),
        rmsd,
        rmsd_stats,
        total_trajectories,
    })
}


/// Write the sampled trajectory of the first molecule in the first batch.
///
/// Every atom is labelled `C` when `atom_types` is `None`.
pub fn save_first_sampled<P>(samples: &Samples, atom_types: Option<&[String]>, fname: P) -> Result<()>
where P: AsRef<Path> {
    ensure!(!samples.is_empty(), "No batches found in the samples file.");
    let (_, pred) = samples.batches[0].molecule(0)?;

    let carbons;
    let atom_types = match atom_types {
        Some(t) => t,
        None => {
            carbons = vec![String::from("C"); pred.natoms()];
            carbons.as_slice()
        },
    };

    save_xyz(fname.as_ref(), &pred, atom_types, "", XyzLayout::Compact)?;
    log::info!("Saved first trajectory to {:?}", fname.as_ref());
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;
    use md_parsers::TrajectoryBatch;
    use std::fs;
    use tempfile::tempdir;

    fn batch(nmol: usize, shift: f64) -> TrajectoryBatch {
        let natoms = 2 * nmol;
        let x = nd::Array3::from_shape_fn((natoms, 3, 5), |(i, j, t)| (i * 3 + j) as f64 * 0.1 + t as f64);
        let x_pred = x.mapv(|v| v + shift);
        let batch = nd::Array1::from_shape_fn(natoms, |i| i / 2);
        TrajectoryBatch::new(x, x_pred, batch).unwrap()
    }

    #[test]
    fn test_rmsd_identical() {
        let x = nd::Array3::from_shape_fn((4, 3, 6), |(i, j, t)| (i + j * t) as f64);
        let rmsd = rmsd_per_timestep(x.view(), x.view()).unwrap();
        assert_eq!(rmsd.len(), 6);
        assert!(rmsd.iter().all(|&r| r == 0.0));
    }

    #[test]
    fn test_rmsd_value() {
        // two atoms, one displaced by (3, 4, 0) at t = 1 only
        let x = nd::Array3::<f64>::zeros((2, 3, 2));
        let mut x_pred = x.clone();
        x_pred[[1, 0, 1]] = 3.0;
        x_pred[[1, 1, 1]] = 4.0;

        let rmsd = rmsd_per_timestep(x.view(), x_pred.view()).unwrap();
        assert_eq!(rmsd[0], 0.0);
        assert!((rmsd[1] - 12.5f64.sqrt()).abs() < 1E-12);

        let bad = nd::Array3::<f64>::zeros((3, 3, 2));
        assert!(rmsd_per_timestep(x.view(), bad.view()).is_err());
    }

    #[test]
    fn test_inspect() {
        let samples = Samples::from(vec![batch(2, 0.5), batch(3, 0.0)]);
        let report = inspect_samples(&samples).unwrap();

        assert_eq!(report.nbatches, 2);
        assert_eq!(report.x_shape, vec![4, 3, 5]);
        assert_eq!(report.total_trajectories, 5);

        // every coordinate is shifted by 0.5, so sqrt(3 * 0.25)
        let stats = report.rmsd_stats.unwrap();
        assert!((stats.mean - 0.75f64.sqrt()).abs() < 1E-12);
        assert!(stats.std.abs() < 1E-12);
        assert!((stats.max - stats.min).abs() < 1E-12);
        assert!(report.to_string().contains("Total trajectories: 5"));

        assert!(inspect_samples(&Samples::default()).is_err());
    }

    #[test]
    fn test_save_first_sampled() {
        let dir = tempdir().unwrap();
        let fname = dir.path().join("first.xyz");
        let samples = Samples::from(vec![batch(2, 1.0)]);

        save_first_sampled(&samples, None, &fname).unwrap();
        let txt = fs::read_to_string(&fname).unwrap();
        let lines = txt.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 5 * 4);
        assert_eq!(lines[0], "2");
        assert_eq!(lines[1], "Frame 0");
        assert_eq!(lines[2], "C 1.000000 1.100000 1.200000");

        let types = vec!["O".to_string(), "H".to_string()];
        save_first_sampled(&samples, Some(&types), &fname).unwrap();
        let txt = fs::read_to_string(&fname).unwrap();
        assert!(txt.lines().nth(3).unwrap().starts_with("H "));
    }
}
