use std::path::Path;

use hdf5::{
    File as H5File,
    Group as H5Group,
};
use shared::{
    ndarray as nd,
    log,
    ensure,
    Context,
    Regex,
    Result,
    CoordinateSequence,
};


/// Several molecules packed together, `batch[i]` tells which molecule atom `i` belongs to.
#[derive(Clone, Debug, PartialEq)]
pub struct TrajectoryBatch {
    pub x:      nd::Array3<f64>,    // ground truth, [natoms_total, 3, ntimesteps]
    pub x_pred: nd::Array3<f64>,    // sampled, [natoms_total, 3, ntimesteps]
    pub batch:  nd::Array1<usize>,  // [natoms_total]
}


impl TrajectoryBatch {
    pub fn new(x: nd::Array3<f64>, x_pred: nd::Array3<f64>, batch: nd::Array1<usize>) -> Result<Self> {
        ensure!(x.shape()[1] == 3, "Ground truth must be shaped as [natoms, 3, ntimesteps], got {:?}.", x.shape());
        ensure!(x.shape() == x_pred.shape(),
            "Inconsistent shapes of ground truth {:?} and sampled {:?} trajectories.",
            x.shape(), x_pred.shape());
        ensure!(batch.len() == x.shape()[0],
            "Length of batch index ({}) does not match the number of atoms ({}).",
            batch.len(), x.shape()[0]);
        Ok(Self { x, x_pred, batch })
    }

    pub fn natoms(&self) -> usize { self.x.shape()[0] }
    pub fn nframes(&self) -> usize { self.x.shape()[2] }

    /// Number of molecules in this batch, i.e. `max(batch) + 1`.
    pub fn nmolecules(&self) -> usize {
        self.batch.iter().max().map(|m| m + 1).unwrap_or(0)
    }

    /// Indices of the atoms belonging to molecule `imol`, in their original order.
    pub fn atoms_of(&self, imol: usize) -> Vec<usize> {
        self.batch.iter()
            .enumerate()
            .filter(|(_, b)| **b == imol)
            .map(|(i, _)| i)
            .collect()
    }

    /// Ground truth and sampled trajectories of molecule `imol`.
    pub fn molecule(&self, imol: usize) -> Result<(CoordinateSequence, CoordinateSequence)> {
        let idx = self.atoms_of(imol);
        let gt  = self.x.select(nd::Axis(0), &idx);
        let pd  = self.x_pred.select(nd::Axis(0), &idx);
        Ok((CoordinateSequence::new(gt)?, CoordinateSequence::new(pd)?))
    }

    fn from_group(g: &H5Group) -> Result<Self> {
        let x: nd::Array3<f64> = g.dataset("x")?.read()?;
        let x_pred: nd::Array3<f64> = g.dataset("x_pred")?.read()?;
        let batch: nd::Array1<i64> = g.dataset("batch")?.read()?;

        let batch = batch.iter()
            .map(|&b| usize::try_from(b).with_context(|| format!("Negative batch index {}.", b)))
            .collect::<Result<Vec<usize>>>()?;

        Self::new(x, x_pred, nd::Array1::from(batch))
    }

    fn save_to_group(&self, g: &H5Group) -> Result<()> {
        g.new_dataset_builder().with_data(&self.x).create("x")?;
        g.new_dataset_builder().with_data(&self.x_pred).create("x_pred")?;
        g.new_dataset_builder().with_data(&self.batch.mapv(|b| b as i64)).create("batch")?;
        Ok(())
    }
}


/// Sampled trajectories, stored in HDF5 as groups `batch_0`, `batch_1`, ...
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Samples {
    pub batches: Vec<TrajectoryBatch>,

    /// Dataset names found in the first batch group.
    pub keys: Vec<String>,
}


impl Samples {
    pub fn len(&self) -> usize { self.batches.len() }
    pub fn is_empty(&self) -> bool { self.batches.is_empty() }

    pub fn from_h5<P>(fname: P) -> Result<Self>
    where P: AsRef<Path> {
        let fname = fname.as_ref();
        let f = H5File::open(fname)
            .with_context(|| format!("Failed to open {:?} as HDF5 file.", fname))?;

        let re = Regex::new(r"^batch_(\d+)$")?;
        let mut groups = vec![];
        for name in f.member_names()? {
            match re.captures(&name).and_then(|c| c[1].parse::<usize>().ok()) {
                Some(idx) => groups.push((idx, name)),
                None => log::debug!("Ignoring member {:?} of {:?}.", name, fname),
            }
        }
        groups.sort();

        let mut batches = Vec::with_capacity(groups.len());
        let mut keys = vec![];
        for (i, (_, name)) in groups.iter().enumerate() {
            let g = f.group(name)?;
            if i == 0 {
                keys = g.member_names()?;
                keys.sort();
            }
            let batch = TrajectoryBatch::from_group(&g)
                .with_context(|| format!("Failed to read group {:?} of {:?}.", name, fname))?;
            batches.push(batch);
        }

        Ok(Self { batches, keys })
    }

    pub fn save_to_h5<P>(&self, fname: P) -> Result<()>
    where P: AsRef<Path> {
        let fname = fname.as_ref();
        let f = H5File::create(fname)
            .with_context(|| format!("Failed to create HDF5 file {:?}.", fname))?;

        for (i, batch) in self.batches.iter().enumerate() {
            let g = f.create_group(&format!("batch_{}", i))?;
            batch.save_to_group(&g)?;
        }
        Ok(())
    }
}


impl From<Vec<TrajectoryBatch>> for Samples {
    fn from(batches: Vec<TrajectoryBatch>) -> Self {
        let keys = if batches.is_empty() {
            vec![]
        } else {
            vec!["batch".to_string(), "x".to_string(), "x_pred".to_string()]
        };
        Self { batches, keys }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    fn batch(nframes: usize) -> TrajectoryBatch {
        let x = nd::Array3::from_shape_fn((5, 3, nframes), |(i, j, t)| (i * 10 + j) as f64 + t as f64 * 0.5);
        let x_pred = x.mapv(|v| v + 0.1);
        TrajectoryBatch::new(x, x_pred, nd::arr1(&[0, 0, 1, 1, 1])).unwrap()
    }

    #[test]
    fn test_partition() {
        let b = batch(4);
        assert_eq!(b.natoms(), 5);
        assert_eq!(b.nframes(), 4);
        assert_eq!(b.nmolecules(), 2);
        assert_eq!(b.atoms_of(1), vec![2, 3, 4]);
        assert!(b.atoms_of(2).is_empty());

        let (gt, pd) = b.molecule(1).unwrap();
        assert_eq!(gt.natoms(), 3);
        assert_eq!(gt.view()[[0, 1, 0]], 21.0);
        assert!((pd.view()[[0, 1, 0]] - 21.1).abs() < 1e-12);
    }

    #[test]
    fn test_interleaved_batch_keeps_atom_order() {
        let x = nd::Array3::from_shape_fn((4, 3, 1), |(i, _, _)| i as f64);
        let b = TrajectoryBatch::new(x.clone(), x, nd::arr1(&[1, 0, 1, 0])).unwrap();
        let (gt, _) = b.molecule(1).unwrap();
        assert_eq!(gt.view()[[0, 0, 0]], 0.0);
        assert_eq!(gt.view()[[1, 0, 0]], 2.0);
    }

    #[test]
    fn test_invalid_batch() {
        let x = nd::Array3::<f64>::zeros((3, 3, 2));
        assert!(TrajectoryBatch::new(x.clone(), nd::Array3::zeros((3, 3, 1)), nd::arr1(&[0, 0, 0])).is_err());
        assert!(TrajectoryBatch::new(x.clone(), x.clone(), nd::arr1(&[0, 0])).is_err());
        assert!(TrajectoryBatch::new(nd::Array3::zeros((3, 2, 2)), nd::Array3::zeros((3, 2, 2)), nd::arr1(&[0, 0, 0])).is_err());
    }

    #[test]
    fn test_h5() {
        let dir = TempDir::new("samples").unwrap();
        let fname = dir.path().join("samples.h5");

        let samples = Samples::from((0 .. 12).map(|i| batch(i + 1)).collect::<Vec<_>>());
        samples.save_to_h5(&fname).unwrap();

        // members not named `batch_<i>` are ignored
        {
            let f = H5File::append(&fname).unwrap();
            f.create_group("metadata").unwrap();
            f.create_group("batch_final").unwrap();
            f.new_dataset_builder()
                .with_data(&nd::arr1(&[1.0f64, 2.0]))
                .create("batch_12x")
                .unwrap();
        }

        let read = Samples::from_h5(&fname).unwrap();
        assert_eq!(read.len(), 12);
        assert_eq!(read.batches[10].nframes(), 11);
        assert_eq!(read, samples);
    }
}
