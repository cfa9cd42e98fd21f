//! Watch mode: re-resolve the declaration whenever it changes
//!
//! Provides file system watching with debouncing for `styleconf watch`.
//! Each resolution is independent; a malformed declaration is reported and
//! watching continues.

use notify::RecursiveMode;
use notify_debouncer_mini::{new_debouncer, DebouncedEventKind};
use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::config::{load_config, ConfigError, Configuration};

/// Default debounce delay in milliseconds
pub const DEFAULT_DEBOUNCE_MS: u64 = 100;

/// Error during watch mode
#[derive(Debug, Error)]
pub enum WatchError {
    /// Failed to initialize file watcher
    #[error("Failed to initialize file watcher: {0}")]
    WatcherInit(notify::Error),
    /// Failed to add watch path
    #[error("Failed to watch path: {0}")]
    WatchPath(notify::Error),
    /// Channel receive error
    #[error("Watch channel error: {0}")]
    ChannelError(String),
    /// Declaration file not found
    #[error("Declaration not found: {}", .0.display())]
    DeclarationNotFound(PathBuf),
}

/// Options for watch mode
#[derive(Debug, Clone)]
pub struct WatchOptions {
    /// Declaration file to watch
    pub config_path: PathBuf,
    /// Debounce delay in milliseconds
    pub debounce_ms: u64,
}

impl WatchOptions {
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        Self { config_path: config_path.into(), debounce_ms: DEFAULT_DEBOUNCE_MS }
    }
}

/// Outcome of one resolution pass
#[derive(Debug)]
pub struct ResolveOutcome {
    /// Resolved configuration, or why it failed
    pub result: Result<Configuration, ConfigError>,
    /// Time spent loading and resolving
    pub duration: Duration,
}

impl ResolveOutcome {
    pub fn success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Load and resolve the declaration once, timing the pass.
pub fn resolve_once(config_path: &Path) -> ResolveOutcome {
    let start = Instant::now();
    let result = load_config(Some(config_path));
    ResolveOutcome { result, duration: start.elapsed() }
}

/// Format duration for display
fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis < 1000 {
        format!("{}ms", millis)
    } else {
        format!("{:.2}s", duration.as_secs_f64())
    }
}

/// Log the outcome of a resolution pass.
fn report(outcome: &ResolveOutcome) {
    match &outcome.result {
        Ok(config) => info!(
            patterns = config.content_patterns().len(),
            tokens = config.theme_extension().token_count(),
            "resolved in {}",
            format_duration(outcome.duration)
        ),
        Err(e) => error!("resolution failed: {}", e),
    }
}

/// Check whether a changed path refers to the watched declaration.
fn is_declaration_change(changed: &Path, declaration: &Path) -> bool {
    changed == declaration || changed.file_name() == declaration.file_name()
}

/// Watch the declaration and re-resolve it on every change.
///
/// Blocks until the watcher channel closes. `on_resolve` receives the outcome
/// of the initial pass and of every pass after a change.
///
/// # Example
/// ```ignore
/// watch_and_resolve(WatchOptions::new("style.config.toml"), |outcome| {
///     if let Ok(config) = &outcome.result {
///         println!("{}", config.to_declaration());
///     }
/// })?;
/// ```
pub fn watch_and_resolve<F>(options: WatchOptions, mut on_resolve: F) -> Result<(), WatchError>
where
    F: FnMut(&ResolveOutcome),
{
    if !options.config_path.is_file() {
        return Err(WatchError::DeclarationNotFound(options.config_path.clone()));
    }

    // Editors often replace the file on save, so watch its directory.
    let watch_dir = match options.config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let (tx, rx) = channel();
    let debounce_duration = Duration::from_millis(options.debounce_ms);
    let mut debouncer = new_debouncer(debounce_duration, tx).map_err(WatchError::WatcherInit)?;
    debouncer
        .watcher()
        .watch(&watch_dir, RecursiveMode::NonRecursive)
        .map_err(WatchError::WatchPath)?;

    let outcome = resolve_once(&options.config_path);
    report(&outcome);
    on_resolve(&outcome);
    info!(path = %options.config_path.display(), "watching for changes");

    loop {
        match rx.recv() {
            Ok(Ok(events)) => {
                let changed = events.iter().any(|e| {
                    matches!(e.kind, DebouncedEventKind::Any)
                        && is_declaration_change(&e.path, &options.config_path)
                });
                if !changed {
                    continue;
                }

                info!(path = %options.config_path.display(), "declaration changed");
                let outcome = resolve_once(&options.config_path);
                report(&outcome);
                on_resolve(&outcome);
            }
            Ok(Err(e)) => {
                // Watch errors are not fatal
                warn!(error = ?e, "watch error, continuing");
            }
            Err(e) => return Err(WatchError::ChannelError(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(42)), "42ms");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
    }

    #[test]
    fn test_is_declaration_change() {
        let decl = Path::new("/site/style.config.toml");
        assert!(is_declaration_change(Path::new("/site/style.config.toml"), decl));
        assert!(is_declaration_change(Path::new("/private/site/style.config.toml"), decl));
        assert!(!is_declaration_change(Path::new("/site/index.html"), decl));
    }

    #[test]
    fn test_resolve_once_success_and_failure() {
        let temp = TempDir::new().expect("should create temp dir");
        let path = temp.path().join("style.config.toml");

        fs::write(&path, "content = [\"./templates/**/*.html\"]\n").expect("should write");
        let outcome = resolve_once(&path);
        assert!(outcome.success());

        fs::write(&path, "content = [\"\"]\n").expect("should write");
        let outcome = resolve_once(&path);
        assert!(!outcome.success());
        assert!(matches!(outcome.result, Err(ConfigError::Malformed(_))));
    }

    /// Block until the watcher reports `expected`, skipping repeats of other outcomes.
    fn wait_for(rx: &std::sync::mpsc::Receiver<bool>, expected: bool) {
        let deadline = Instant::now() + Duration::from_secs(10);
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match rx.recv_timeout(remaining) {
                Ok(ok) if ok == expected => return,
                Ok(_) => continue,
                Err(e) => panic!("no resolution with success={} before timeout: {}", expected, e),
            }
        }
    }

    #[test]
    fn test_watch_reloads_and_survives_malformed_edit() {
        let temp = TempDir::new().expect("should create temp dir");
        let path = temp.path().join("style.config.toml");
        fs::write(&path, "content = [\"./templates/**/*.html\"]\n").expect("should write");

        let (tx, rx) = std::sync::mpsc::channel();
        let options = WatchOptions { config_path: path.clone(), debounce_ms: 50 };
        // The watch loop never returns; the thread is dropped with the test process.
        std::thread::spawn(move || {
            let _ = watch_and_resolve(options, move |outcome| {
                let _ = tx.send(outcome.success());
            });
        });

        wait_for(&rx, true);

        // Give the watcher time to register before the first edit
        std::thread::sleep(Duration::from_millis(200));
        fs::write(&path, "content = [\"\"]\n").expect("should write");
        wait_for(&rx, false);

        fs::write(&path, "content = [\"./inventory/**/*.html\"]\n").expect("should write");
        wait_for(&rx, true);
    }

    #[test]
    fn test_watch_missing_declaration() {
        let temp = TempDir::new().expect("should create temp dir");
        let options = WatchOptions::new(temp.path().join("style.config.toml"));
        let result = watch_and_resolve(options, |_| {});
        assert!(matches!(result, Err(WatchError::DeclarationNotFound(_))));
    }
}
