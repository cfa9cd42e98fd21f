//! Declaration discovery and loading
//!
//! Provides functions to find, read, and resolve style declarations.
//! Supported formats are TOML, JSON5, and JSON, chosen by file extension.

use super::resolve::{resolve, resolve_all, MalformedConfig, RawDeclaration};
use super::schema::Configuration;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Canonical declaration file names, checked in this order in each directory
pub const CONFIG_FILE_NAMES: &[&str] =
    &["style.config.toml", "style.config.json5", "style.config.json"];

/// Configuration loading error
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// File I/O error
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Syntax error in the declaration file
    #[error("Failed to parse {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },
    /// File extension is not one of toml/json5/json
    #[error("Unsupported declaration format: {} (expected .toml, .json5, or .json)", .0.display())]
    UnsupportedFormat(PathBuf),
    /// No declaration was found by discovery
    #[error("No declaration found (looked for {})", CONFIG_FILE_NAMES.join(", "))]
    NotFound,
    /// More than one canonical declaration in the same directory
    #[error(
        "Ambiguous configuration: {} all exist; keep exactly one or pass files explicitly",
        .0.iter().map(|p| p.display().to_string()).collect::<Vec<_>>().join(", ")
    )]
    Ambiguous(Vec<PathBuf>),
    /// Declaration failed validation
    #[error(transparent)]
    Malformed(#[from] MalformedConfig),
}

/// Declaration file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationFormat {
    Toml,
    Json5,
    Json,
}

impl DeclarationFormat {
    /// Detect the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Some(Self::Toml),
            Some("json5") => Some(Self::Json5),
            Some("json") => Some(Self::Json),
            _ => None,
        }
    }
}

/// Find a declaration by walking up from the current working directory.
///
/// Search order:
/// 1. Walk up from current directory looking for a canonical file name
/// 2. Check XDG_CONFIG_HOME/styleconf/style.config.toml (or ~/.config/styleconf/...)
pub fn find_config() -> Result<Option<PathBuf>, ConfigError> {
    if let Ok(cwd) = env::current_dir() {
        if let Some(path) = find_config_from(cwd)? {
            return Ok(Some(path));
        }
    }

    Ok(find_xdg_config())
}

/// Find the declaration in the XDG config directory.
pub fn find_xdg_config() -> Option<PathBuf> {
    let xdg_config = env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|_| env::var("HOME").map(|h| PathBuf::from(h).join(".config")))
        .ok()?;

    let config_path = xdg_config.join("styleconf").join(CONFIG_FILE_NAMES[0]);
    if config_path.is_file() {
        Some(config_path)
    } else {
        None
    }
}

/// Find a declaration by walking up from a specific directory.
///
/// The nearest directory holding a canonical file wins. If that directory
/// holds more than one, this is an error rather than a silent choice.
pub fn find_config_from(start: PathBuf) -> Result<Option<PathBuf>, ConfigError> {
    let mut current = start;

    loop {
        let mut found: Vec<PathBuf> = CONFIG_FILE_NAMES
            .iter()
            .map(|name| current.join(name))
            .filter(|path| path.is_file())
            .collect();

        match found.len() {
            0 => {}
            1 => return Ok(found.pop()),
            _ => return Err(ConfigError::Ambiguous(found)),
        }

        if !current.pop() {
            return Ok(None);
        }
    }
}

/// Read and parse a declaration file without validating it.
pub fn read_declaration(path: &Path) -> Result<RawDeclaration, ConfigError> {
    let format = DeclarationFormat::from_path(path)
        .ok_or_else(|| ConfigError::UnsupportedFormat(path.to_path_buf()))?;

    let contents = fs::read_to_string(path)
        .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;

    let parse_error = |message: String| ConfigError::Parse { path: path.to_path_buf(), message };

    let raw = match format {
        DeclarationFormat::Toml => {
            let table: toml::Table = toml::from_str(&contents).map_err(|e| parse_error(e.to_string()))?;
            serde_json::to_value(table).map_err(|e| parse_error(e.to_string()))?
        }
        DeclarationFormat::Json5 => {
            json5::from_str::<RawDeclaration>(&contents).map_err(|e| parse_error(e.to_string()))?
        }
        DeclarationFormat::Json => {
            serde_json::from_str::<RawDeclaration>(&contents).map_err(|e| parse_error(e.to_string()))?
        }
    };

    debug!(path = %path.display(), ?format, "read declaration");
    Ok(raw)
}

/// Load and resolve a declaration.
///
/// If a path is provided, loads from that file. Otherwise uses `find_config()`
/// to locate one. Unlike build settings, a style declaration has no usable
/// default: its `content` globs are required.
///
/// # Example
/// ```ignore
/// let config = load_config(None)?;
/// let config = load_config(Some(Path::new("site/style.config.toml")))?;
/// ```
pub fn load_config(path: Option<&Path>) -> Result<Configuration, ConfigError> {
    let config_path = match path {
        Some(p) => p.to_path_buf(),
        None => find_config()?.ok_or(ConfigError::NotFound)?,
    };

    info!(path = %config_path.display(), "loading declaration");
    let raw = read_declaration(&config_path)?;
    Ok(resolve(&raw)?)
}

/// Load several declarations and merge them in the order given.
///
/// This is the only path on which declarations are merged.
pub fn load_configs<P: AsRef<Path>>(paths: &[P]) -> Result<Configuration, ConfigError> {
    let raws = paths
        .iter()
        .map(|p| read_declaration(p.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;

    info!(count = raws.len(), "merging declarations");
    Ok(resolve_all(&raws)?)
}

/// Load from explicit paths, or fall back to discovery when none are given.
pub fn load_from_args(paths: &[PathBuf]) -> Result<Configuration, ConfigError> {
    match paths {
        [] => load_config(None),
        [single] => load_config(Some(single.as_path())),
        many => load_configs(many),
    }
}

/// Get the project root directory from a declaration path.
///
/// Content globs are relative to this directory.
pub fn project_root(config_path: &Path) -> &Path {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}
