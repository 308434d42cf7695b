use fs_err as fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// stderr subscriber. `RUST_LOG` wins when set; otherwise `warn`, or
/// `debug` for this crate when `debug` is on.
pub fn init_tracing(debug: bool) {
    let fallback = if debug { "warn,farmassist=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

pub struct SavedPaths {
    pub dir: PathBuf,
    pub prompt: PathBuf,
    pub response: PathBuf,
}

fn tx_dir(root: &Path, tx: Uuid) -> PathBuf {
    root.join("tx").join(tx.to_string())
}

/// Writes each prompt and raw reply of one run to
/// `<root>/tx/<tx>/<seq>-<stage>.{prompt,response}.txt`.
pub struct ExchangeRecorder {
    root: PathBuf,
    tx: Uuid,
    seq: AtomicUsize,
}

impl ExchangeRecorder {
    pub fn new(root: impl Into<PathBuf>, tx: Uuid) -> Self {
        Self { root: root.into(), tx, seq: AtomicUsize::new(0) }
    }

    pub fn dir(&self) -> PathBuf {
        tx_dir(&self.root, self.tx)
    }

    /// `reply` is the raw model text, or the provider error rendered as text.
    pub fn save(&self, stage: &str, prompt: &str, reply: Result<&str, String>) -> anyhow::Result<SavedPaths> {
        let dir = self.dir();
        fs::create_dir_all(&dir)?;

        let n = self.seq.fetch_add(1, Ordering::Relaxed) + 1;
        let prompt_path = dir.join(format!("{n:03}-{stage}.prompt.txt"));
        fs::write(&prompt_path, prompt)?;

        let (suffix, body) = match reply {
            Ok(text) => ("response", text.to_string()),
            Err(err) => ("error", err),
        };
        let response_path = dir.join(format!("{n:03}-{stage}.{suffix}.txt"));
        fs::write(&response_path, body)?;

        tracing::debug!(stage, dir = %dir.display(), "exchange saved");
        Ok(SavedPaths { dir, prompt: prompt_path, response: response_path })
    }
}
