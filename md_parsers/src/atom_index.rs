use std::convert::Infallible;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use shared::{
    log,
    Context,
    Result,
};

use crate::elements::atomic_number_from_name;


#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AtomRecord {
    pub index:         String,
    pub resid:         String,
    pub resname:       String,
    pub name:          String,
    pub atomic_number: u8,
}


/// Atom index file listing one atom per line: `index resid resname atomname`.
///
/// Blank lines and lines starting with `#` are skipped, as are lines with less than four columns.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AtomIndex {
    pub atoms: Vec<AtomRecord>,
}


impl AtomIndex {
    pub fn from_file<P>(path: P) -> Result<Self>
    where P: AsRef<Path> {
        let path = path.as_ref();
        let txt = fs::read_to_string(path)
            .with_context(|| format!("Failed to read atom index file {:?}.", path))?;
        Ok(Self::parse_lines(&txt))
    }

    fn parse_lines(txt: &str) -> Self {
        let atoms = txt.lines()
            .enumerate()
            .filter_map(|(iline, line)| {
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    return None;
                }

                let parts = line.split_whitespace().collect::<Vec<_>>();
                if parts.len() < 4 {
                    log::debug!("Skipping line {} of atom index: {:?}", iline + 1, line);
                    return None;
                }

                Some(AtomRecord {
                    index:         parts[0].to_string(),
                    resid:         parts[1].to_string(),
                    resname:       parts[2].to_string(),
                    name:          parts[3].to_string(),
                    atomic_number: atomic_number_from_name(parts[3]),
                })
            })
            .collect();

        Self { atoms }
    }

    pub fn len(&self) -> usize { self.atoms.len() }
    pub fn is_empty(&self) -> bool { self.atoms.is_empty() }

    pub fn atomic_numbers(&self) -> Vec<u8> {
        self.atoms.iter().map(|a| a.atomic_number).collect()
    }
}


/// Malformed lines are skipped, parsing never fails.
impl FromStr for AtomIndex {
    type Err = Infallible;

    fn from_str(txt: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse_lines(txt))
    }
}
