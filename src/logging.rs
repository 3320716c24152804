use anyhow::{Context, Result};
use env_logger::{Builder, Env, Target};
use std::fs::{self, OpenOptions};
use std::path::Path;

/// Route `log` output to `path`; the terminal belongs to the UI.
/// `RUST_LOG` overrides the default `info` level.
pub fn init(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Failed to create log directory")?;
    }

    let file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Pipe(Box::new(file)))
        .format_timestamp_millis()
        .try_init()
        .context("Failed to initialize logger")?;

    Ok(())
}
