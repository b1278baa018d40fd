use std::path::Path;
use std::io::IsTerminal;
use std::sync::Mutex;
use once_cell::sync::OnceCell;

use shared::{
    anyhow::anyhow,
    Result,
    log::LevelFilter,
};
use log4rs::{
    append::{
        console::{
            ConsoleAppender,
            Target,
        },
        file::FileAppender,
    },
    config::{
        Appender,
        Config,
        Root,
    },
    encode::pattern::PatternEncoder,
    init_config,
    Handle,
};


static HANDLE: OnceCell<Mutex<Handle>> = OnceCell::new();

const ENCODE_STR: &str = "{d(%Y-%m-%d %H:%M:%S)} [{h({l:>5})}] {m}{n}";


fn gen_logger_config(path: Option<&Path>) -> Result<Config> {
    let level = LevelFilter::Info;
    let isatty = std::io::stderr().is_terminal();

    let stderr = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(ENCODE_STR)))
        .target(Target::Stderr)
        .build();

    let global_log = if isatty {
        Some(FileAppender::builder()
             .encoder(Box::new(PatternEncoder::new(ENCODE_STR)))
             .build("./globalrun.log")?)
    } else {
        None
    };

    let logfile = match path {
        Some(p) => Some(FileAppender::builder()
            .encoder(Box::new(PatternEncoder::new(ENCODE_STR)))
            .build(p.join("run.log"))?),
        None => None,
    };

    // generate root for config.build()
    let root = Root::builder().appender("stderr");
    let root = if global_log.is_some() { root.appender("global_log") } else { root };
    let root = if logfile.is_some() { root.appender("logfile") } else { root };
    let root = root.build(level);

    let builder = Config::builder().appender(Appender::builder().build("stderr", Box::new(stderr)));
    let builder = if let Some(global_log) = global_log {
        builder.appender(Appender::builder().build("global_log", Box::new(global_log)))
    } else {
        builder
    };
    let builder = if let Some(logfile) = logfile {
        builder.appender(Appender::builder().build("logfile", Box::new(logfile)))
    } else {
        builder
    };

    Ok(builder.build(root)?)
}


/// Install the global logger writing to stderr, and to `./globalrun.log` when stderr is a
/// terminal. Calling it more than once is a no-op.
pub fn logger_init() -> Result<()> {
    HANDLE.get_or_try_init(|| -> Result<Mutex<Handle>> {
        let config = gen_logger_config(None)?;
        let handle = init_config(config)?;
        Ok(Mutex::new(handle))
    })?;
    Ok(())
}


/// Additionally write the log to `dir/run.log`.
pub fn logger_redirect(dir: impl AsRef<Path>) -> Result<()> {
    logger_init()?;
    let config = gen_logger_config(Some(dir.as_ref()))?;
    let handle = HANDLE.get()
        .ok_or_else(|| anyhow!("Logger is not initialized."))?;
    handle.lock()
        .map_err(|_| anyhow!("Logger handle is poisoned."))?
        .set_config(config);
    Ok(())
}
