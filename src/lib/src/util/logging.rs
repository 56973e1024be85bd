use env_logger::{Env, Target};
use std::io::Write;
use std::path::Path;

use crate::error::MirrorError;

/// Set up the global logger for a mirror run.
///
/// `verbose` lowers the default filter to debug; `RUST_LOG` still wins when
/// set. When `logfile` is given, output is redirected there instead of
/// standard error.
pub fn init_logging(verbose: bool, logfile: Option<&Path>) -> Result<(), MirrorError> {
    let default_level = if verbose { "debug" } else { "info" };
    let mut builder =
        env_logger::Builder::from_env(Env::default().default_filter_or(default_level));

    builder.format(|buf, record| {
        writeln!(
            buf,
            "[{}] {} <{}:{}> {}: {}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f"),
            record.module_path().unwrap_or(""),
            record.file().unwrap_or("unknown"),
            record.line().unwrap_or(0),
            record.level(),
            record.args()
        )
    });

    if let Some(logfile) = logfile {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(logfile)
            .map_err(|e| MirrorError::file_create_error(logfile, e))?;
        builder.target(Target::Pipe(Box::new(file)));
    }

    builder.init();
    Ok(())
}
