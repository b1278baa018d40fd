use std::path::Path;
use std::fmt;
use std::fs;
use serde::Deserialize;
use shared::{
    log,
    ensure,
    Context,
    Result,
};

pub trait MdkitConfig: Clone + Sized + Default + fmt::Display + for<'a> Deserialize<'a> {
    fn from_file<P>(fname: P) -> Result<Self>
    where P: AsRef<Path> {
        let fname = fname.as_ref();
        ensure!(fname.is_file(), "Config file {:?} not available.", fname);
        let raw = fs::read_to_string(fname)?;
        let cfg = toml::from_str::<Self>(&raw)
            .with_context(|| format!("Failed to parse config file {:?}.", fname))?;
        Ok(cfg)
    }

    /// Write `self` in TOML, the `Display` impl is responsible for producing valid TOML.
    fn to_file<P>(&self, fname: P) -> Result<()>
    where P: AsRef<Path> {
        if fname.as_ref().is_file() {
            log::warn!("File {:?} exists, overwriting ...", fname.as_ref());
        }
        fs::write(fname.as_ref(), self.to_string())?;
        Ok(())
    }
}
