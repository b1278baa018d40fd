use std::fmt;
use std::path::PathBuf;
use serde::Deserialize;

use crate::core::MdkitConfig;


#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConvertConfig {
    #[serde(default = "ConvertConfig::default_coords_fname")]
    coords_fname: PathBuf,

    // Text file with columns `index resid resname atomname`
    #[serde(default = "ConvertConfig::default_atom_index_fname")]
    atom_index_fname: PathBuf,

    #[serde(default = "ConvertConfig::default_output_fname")]
    output_fname: PathBuf,

    #[serde(default = "ConvertConfig::default_name")]
    name: String,

    #[serde(default = "ConvertConfig::default_theory")]
    theory: String,
}


impl ConvertConfig {
    fn default_coords_fname() -> PathBuf { PathBuf::from("data/md17/QM_region_coords.npy") }
    fn default_atom_index_fname() -> PathBuf { PathBuf::from("data/md17/QM_region_atom_index.txt") }
    fn default_output_fname() -> PathBuf { PathBuf::from("data/md17/md17_qm_region.npz") }
    fn default_name() -> String { String::from("QM_region") }
    fn default_theory() -> String { String::from("unknown") }

    pub fn new(coords_fname: PathBuf, atom_index_fname: PathBuf, output_fname: PathBuf) -> Self {
        Self {
            coords_fname,
            atom_index_fname,
            output_fname,
            ..Default::default()
        }
    }

    pub fn get_coords_fname(&self) -> &PathBuf { &self.coords_fname }
    pub fn get_atom_index_fname(&self) -> &PathBuf { &self.atom_index_fname }
    pub fn get_output_fname(&self) -> &PathBuf { &self.output_fname }
    pub fn get_name(&self) -> &str { &self.name }
    pub fn get_theory(&self) -> &str { &self.theory }
}


impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            coords_fname:     Self::default_coords_fname(),
            atom_index_fname: Self::default_atom_index_fname(),
            output_fname:     Self::default_output_fname(),
            name:             Self::default_name(),
            theory:           Self::default_theory(),
        }
    }
}


impl fmt::Display for ConvertConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# mdkit config for converting QM region coordinates into MD17 dataset archive")?;
        writeln!(f)?;

        writeln!(f, " {:>20} = {:?}", "coords_fname",     self.coords_fname)?;
        writeln!(f, " {:>20} = {:?}", "atom_index_fname", self.atom_index_fname)?;
        writeln!(f, " {:>20} = {:?}", "output_fname",     self.output_fname)?;
        writeln!(f, " {:>20} = {:?}", "name",             self.name)?;
        writeln!(f, " {:>20} = {:?}", "theory",           self.theory)?;

        Ok(())
    }
}


impl MdkitConfig for ConvertConfig {}
