use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use shared::{
    log,
    Result,
};
use crate::OptProcess;
use crate::core::MdkitConfig;
use crate::convert;


#[derive(Debug, Parser)]
/// Convert QM region coordinates and atom index into an MD17-style dataset archive.
///
/// Energies and forces are filled with zeros.
pub struct ConvertCommand {
    #[arg(short='c', long, default_value="convert_config.toml", aliases=["cfg", "conf"])]
    /// Config file name.
    ///
    /// If the file does not exist, the default paths under `data/md17/` are used.
    ///
    /// Aliases: "cfg", "conf".
    config: PathBuf,

    #[arg(long, value_enum, alias="gen")]
    /// Generate auxiliary files for the conversion.
    ///
    /// The conversion will not run if this flag is set.
    ///
    /// Alias: "gen"
    generate: Option<TemplateGenerator>,
}


#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum TemplateGenerator {
    #[value(aliases=["config", "cfg", "conf"])]
    /// Generate config template for the conversion. Aliases: "config", "cfg", "conf".
    ConfigTemplate,
}


impl OptProcess for ConvertCommand {
    fn process(&self) -> Result<()> {
        use TemplateGenerator::*;

        if let Some(g) = self.generate {
            return match g {
                ConfigTemplate => {
                    log::info!("Writing `convert_config_template.toml` ...");
                    convert::ConvertConfig::default().to_file("convert_config_template.toml")
                },
            }
        }

        let cfg = if self.config.is_file() {
            convert::ConvertConfig::from_file(&self.config)?
        } else {
            log::info!("Config file {:?} not found, using the default paths.", self.config);
            convert::ConvertConfig::default()
        };
        log::info!("Got convert config:\n{}", &cfg);

        convert::convert_qm_data(&cfg)?;
        Ok(())
    }
}
