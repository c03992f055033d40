//! Engine startup.
//!
//! Locates the engine binary once at boot and spawns the session pool. The
//! outcome decides the adapter's availability for the rest of the process
//! lifetime; nothing here is retried later.

use std::path::{Path, PathBuf};

use crate::adapter::EngineAdapter;
use crate::config::EngineConfig;
use crate::session::{EngineSession, UciSession};

/// Resolve the engine executable.
///
/// A path with a directory component must exist as given. A bare program
/// name is looked up in the directories on `PATH`.
pub fn locate_engine(path: &Path) -> Option<PathBuf> {
    let has_dir = path
        .parent()
        .is_some_and(|parent| !parent.as_os_str().is_empty());

    if has_dir || path.is_absolute() {
        return path.is_file().then(|| path.to_path_buf());
    }

    let search_path = std::env::var_os("PATH")?;
    std::env::split_paths(&search_path)
        .map(|dir| dir.join(path))
        .find(|candidate| candidate.is_file())
}

/// Start the configured engine sessions and build the adapter.
///
/// Never fails: a missing binary or a pool where no session starts yields
/// an unavailable adapter, and the reason is logged.
pub fn start(config: &EngineConfig) -> EngineAdapter {
    let Some(program) = locate_engine(&config.path) else {
        tracing::error!("Stockfish not found at: {}", config.path.display());
        return EngineAdapter::unavailable();
    };

    let wanted = config.pool_size.max(1);
    let mut sessions: Vec<Box<dyn EngineSession>> = Vec::with_capacity(wanted);
    for idx in 0..wanted {
        match UciSession::spawn(&program, &config.args, &config.options) {
            Ok(session) => sessions.push(Box::new(session)),
            Err(e) => {
                tracing::error!(session = idx, error = %e, "Error initializing Stockfish");
            }
        }
    }

    if sessions.is_empty() {
        return EngineAdapter::unavailable();
    }
    if sessions.len() < wanted {
        tracing::warn!(
            started = sessions.len(),
            wanted,
            "Running with a partial engine pool"
        );
    }

    let adapter = EngineAdapter::new(sessions);
    tracing::info!(
        engine = adapter.engine_name().unwrap_or_default(),
        path = %program.display(),
        pool_size = adapter.pool_size(),
        "Stockfish initialized"
    );
    adapter
}
