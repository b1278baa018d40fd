use ndarray as nd;
use anyhow::{ensure, Result};


/// Positions of one molecule over time, stored as `[natoms, 3, ntimesteps]`.
#[derive(Clone, Debug, PartialEq)]
pub struct CoordinateSequence {
    dat: nd::Array3<f64>,
}


impl CoordinateSequence {
    pub fn new(dat: nd::Array3<f64>) -> Result<Self> {
        ensure!(dat.shape()[1] == 3,
            "Coordinate sequence must be shaped as [natoms, 3, ntimesteps], got {:?}.", dat.shape());
        Ok(Self { dat })
    }

    pub fn natoms(&self) -> usize { self.dat.shape()[0] }
    pub fn nframes(&self) -> usize { self.dat.shape()[2] }
    pub fn view(&self) -> nd::ArrayView3<f64> { self.dat.view() }

    /// Positions at timestep `t` as `[natoms, 3]`.
    pub fn frame(&self, t: usize) -> nd::ArrayView2<f64> {
        self.dat.index_axis(nd::Axis(2), t)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame() {
        let dat = nd::Array3::from_shape_fn((2, 3, 4), |(i, j, t)| (i * 100 + j * 10 + t) as f64);
        let seq = CoordinateSequence::new(dat).unwrap();
        assert_eq!(seq.natoms(), 2);
        assert_eq!(seq.nframes(), 4);
        assert_eq!(seq.frame(3), nd::arr2(&[[3.0, 13.0, 23.0], [103.0, 113.0, 123.0]]));
    }

    #[test]
    fn test_bad_shape() {
        assert!(CoordinateSequence::new(nd::Array3::zeros((2, 2, 4))).is_err());
    }
}
