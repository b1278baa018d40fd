use std::sync::OnceLock;

use clap::{
    Parser,
    builder::styling::{
        AnsiColor,
        Effects,
        Styles,
    },
};

use shared::{log, Result};
use crate::version::Version;
use crate::logging::logger_init;


pub fn get_style() -> Styles {
    static INSTANCE: OnceLock<Styles> = OnceLock::new();
    INSTANCE.get_or_init(|| {
        Styles::styled()
            .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
            .usage(AnsiColor::Green.on_default()   | Effects::BOLD)
            .literal(AnsiColor::Green.on_default() | Effects::BOLD)
            .placeholder(AnsiColor::BrightBlue.on_default())
            .error(AnsiColor::BrightRed.on_default())
            .valid(AnsiColor::BrightYellow.on_default())
    }).to_owned()
}


pub trait OptProcess : Parser {
    fn process(&self) -> Result<()>;
}


#[derive(Debug, Parser)]
#[command(name = "mdkit",
          about = Version::new().to_string(),
          long_about = format!("{:#}", Version::new()),
          version,
          styles = get_style())]
enum Opt {
    Compare(crate::compare::CompareCommand),
    Convert(crate::convert::ConvertCommand),
    Export(crate::export::ExportCommand),
    Inspect(crate::inspect::InspectCommand),
    Nancheck(crate::nancheck::NancheckCommand),
}


impl OptProcess for Opt {
    fn process(&self) -> Result<()> {
        use Opt::*;

        logger_init()?;
        log::debug!("Global logger initialized.");

        match self {
            Compare(cmd)  => cmd.process(),
            Convert(cmd)  => cmd.process(),
            Export(cmd)   => cmd.process(),
            Inspect(cmd)  => cmd.process(),
            Nancheck(cmd) => cmd.process(),
        }
    }
}


/// Parse the command line and run the selected subcommand.
///
/// Usage errors are printed by clap and terminate the process with exit status 1.
pub fn run() -> Result<()> {
    let opt = match Opt::try_parse() {
        Ok(opt) => opt,
        Err(e) => {
            let code = if e.use_stderr() { 1 } else { 0 };
            e.print()?;
            std::process::exit(code);
        },
    };
    opt.process()
}


#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Opt::command().debug_assert();
    }

    #[test]
    fn test_parse_compare() {
        let opt = Opt::try_parse_from(["mdkit", "compare", "a.safetensors", "b.safetensors"]).unwrap();
        assert!(matches!(opt, Opt::Compare(_)));
        assert!(Opt::try_parse_from(["mdkit", "compare", "a.safetensors"]).is_err());
        assert!(Opt::try_parse_from(["mdkit", "compare", "a", "b", "c"]).is_err());
    }

    #[test]
    fn test_parse_export() {
        let opt = Opt::try_parse_from(["mdkit", "export", "samples.h5", "--max-traj", "10",
                                       "--output-dir", "out", "--npz-path", "aspirin.npz"]).unwrap();
        assert!(matches!(opt, Opt::Export(_)));
        assert!(Opt::try_parse_from(["mdkit", "export"]).is_err());
    }
}
