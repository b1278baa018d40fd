use itertools::Itertools;
use md_parsers::{
    npz::read_npy_f64,
    AtomIndex,
    MdDataset,
};
use shared::{
    ndarray as nd,
    log,
    bail,
    ensure_dir,
    shape_str,
    Result,
};

use crate::convert::ConvertConfig;


/// Assemble the dataset from coordinates `[nframes, natoms, 3]` and the parsed atom index.
///
/// Fails if the atom index does not list exactly `natoms` atoms.
pub fn build_dataset(coords: nd::Array3<f64>, atoms: &AtomIndex, cfg: &ConvertConfig) -> Result<MdDataset> {
    let natoms = coords.shape()[1];
    if atoms.len() != natoms {
        bail!("Mismatch between number of atoms in Coords ({}) and Index file ({})!", natoms, atoms.len());
    }

    let z = nd::Array1::from(atoms.atomic_numbers());
    MdDataset::with_placeholders(coords, z, cfg.get_name(), cfg.get_theory())
}


/// Read the inputs named in `cfg`, build the dataset and write it. No output is produced if any
/// input fails to validate.
pub fn convert_qm_data(cfg: &ConvertConfig) -> Result<MdDataset> {
    log::info!("Reading coordinates from {:?} ...", cfg.get_coords_fname());
    let coords: nd::Array3<f64> = read_npy_f64(cfg.get_coords_fname())?;
    log::info!("Coordinates shape: {}", shape_str(coords.shape()));

    log::info!("Reading atom info from {:?} ...", cfg.get_atom_index_fname());
    let atoms = AtomIndex::from_file(cfg.get_atom_index_fname())?;
    log::info!("Extracted {} atoms.", atoms.len());
    log::info!("Atom types found: {:?}", atoms.atomic_numbers().into_iter().sorted().dedup().collect::<Vec<_>>());

    let dataset = build_dataset(coords, &atoms, cfg)?;

    if let Some(parent) = cfg.get_output_fname().parent() {
        if !parent.as_os_str().is_empty() {
            ensure_dir(parent)?;
        }
    }

    log::info!("Saving to {:?} ...", cfg.get_output_fname());
    dataset.save_to_npz(cfg.get_output_fname())?;
    log::info!("Done!");

    Ok(dataset)
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use ndarray_npy::WriteNpyExt;
    use tempfile::tempdir;

    const INDEX: &str = "\
# index resid resname atomname
1 1 LIG CA1
2 1 LIG HB2
3 1 LIG OXT
";

    fn write_inputs(dir: &std::path::Path, natoms: usize) -> ConvertConfig {
        let coords_fname = dir.join("coords.npy");
        let index_fname = dir.join("index.txt");
        let coords = nd::Array3::from_shape_fn((5, natoms, 3), |(t, i, j)| (t + i + j) as f64);
        coords.write_npy(File::create(&coords_fname).unwrap()).unwrap();
        fs::write(&index_fname, INDEX).unwrap();
        ConvertConfig::new(coords_fname, index_fname, dir.join("out").join("dataset.npz"))
    }

    #[test]
    fn test_convert() {
        let dir = tempdir().unwrap();
        let cfg = write_inputs(dir.path(), 3);

        let ds = convert_qm_data(&cfg).unwrap();
        assert_eq!(ds.atomic_numbers, nd::arr1(&[6, 1, 8]));
        assert_eq!(ds.energies.shape(), &[5, 1]);
        assert_eq!(ds.forces.shape(), &[5, 3, 3]);
        assert_eq!(ds.name, "QM_region");

        let read = MdDataset::from_npz(cfg.get_output_fname()).unwrap();
        assert_eq!(read, ds);
    }

    #[test]
    fn test_mismatch_writes_nothing() {
        let dir = tempdir().unwrap();
        let cfg = write_inputs(dir.path(), 4);

        let err = convert_qm_data(&cfg).unwrap_err();
        assert!(err.to_string().contains("Mismatch"));
        assert!(!cfg.get_output_fname().exists());
    }
}
