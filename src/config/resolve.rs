//! Declaration resolution
//!
//! Turns raw declarations into a validated, merged [`Configuration`].
//! Resolution is a pure function of its input: no I/O, no hidden state.

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use super::schema::{
    Configuration, ThemeExtension, Token, TokenMap, CATEGORY_BORDER_RADIUS, CATEGORY_BOX_SHADOW,
    CATEGORY_COLORS, CATEGORY_FONT_FAMILY,
};
use crate::color::validate_color_token;
use crate::content::{ContentPattern, ScanError};

/// A declaration as read from disk, before validation.
///
/// TOML, JSON5 and JSON sources all land in this value model.
pub type RawDeclaration = Value;

/// A declaration that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed config at `{path}`: {reason}")]
pub struct MalformedConfig {
    /// Offending field path, e.g. `theme.extend.colors.brand.500`
    pub path: String,
    /// What was wrong with it
    pub reason: String,
}

impl MalformedConfig {
    pub fn new(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self { path: path.into(), reason: reason.into() }
    }
}

/// Validation rule set for a theme category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CategoryKind {
    Colors,
    FontFamily,
    BorderRadius,
    BoxShadow,
    Other,
}

impl CategoryKind {
    fn of(name: &str) -> Self {
        match name {
            CATEGORY_COLORS => Self::Colors,
            CATEGORY_FONT_FAMILY => Self::FontFamily,
            CATEGORY_BORDER_RADIUS => Self::BorderRadius,
            CATEGORY_BOX_SHADOW => Self::BoxShadow,
            _ => Self::Other,
        }
    }

    fn expected(self) -> &'static str {
        match self {
            Self::Colors => "a color string or a color scale",
            Self::FontFamily => "a font name or a list of font names",
            Self::BorderRadius => "a CSS length or a number",
            Self::BoxShadow => "a shadow expression or a list of them",
            Self::Other => "a string, number, list of strings, or nested scale",
        }
    }
}

/// Resolve one raw declaration into a [`Configuration`].
///
/// `content` is required; `theme` and `plugins` are optional. Unknown keys
/// are ignored. Any invalid value fails the whole declaration.
///
/// # Example
/// ```
/// use serde_json::json;
/// use styleconf::config::resolve;
///
/// let config = resolve(&json!({
///     "content": ["./templates/**/*.html"],
///     "theme": { "extend": { "colors": { "brand": { "500": "#06B6D4" } } } },
///     "plugins": []
/// })).unwrap();
/// assert_eq!(config.content_patterns(), ["./templates/**/*.html"]);
/// ```
pub fn resolve(raw: &RawDeclaration) -> Result<Configuration, MalformedConfig> {
    let root = raw.as_object().ok_or_else(|| {
        MalformedConfig::new("(root)", format!("expected a record, found {}", kind_of(raw)))
    })?;

    let content_patterns = resolve_content(root)?;
    let theme_extension = resolve_theme(root)?;
    let plugins = resolve_plugins(root)?;

    debug!(
        patterns = content_patterns.len(),
        categories = theme_extension.categories().count(),
        plugins = plugins.len(),
        "resolved declaration"
    );

    Ok(Configuration::new(content_patterns, theme_extension, plugins))
}

/// Resolve several declarations and merge them in order.
///
/// Later declarations override earlier theme tokens; content patterns and
/// plugins are unioned. The union applies to every input, so duplicates are
/// dropped even when only one declaration is given; use [`resolve`] to keep
/// a single declaration exactly as written. An empty slice yields an empty
/// configuration.
pub fn resolve_all(raws: &[RawDeclaration]) -> Result<Configuration, MalformedConfig> {
    raws.iter().try_fold(Configuration::default(), |merged, raw| Ok(merged.merge(&resolve(raw)?)))
}

fn resolve_content(root: &Map<String, Value>) -> Result<Vec<String>, MalformedConfig> {
    let content = root
        .get("content")
        .ok_or_else(|| MalformedConfig::new("content", "missing required field"))?;

    let (path, entries) = match content {
        Value::Array(entries) => ("content".to_string(), entries),
        Value::Object(obj) => match obj.get("files") {
            Some(Value::Array(entries)) => ("content.files".to_string(), entries),
            Some(other) => {
                return Err(MalformedConfig::new(
                    "content.files",
                    format!("expected a sequence of glob patterns, found {}", kind_of(other)),
                ))
            }
            None => return Err(MalformedConfig::new("content.files", "missing required field")),
        },
        other => {
            return Err(MalformedConfig::new(
                "content",
                format!("expected a sequence of glob patterns, found {}", kind_of(other)),
            ))
        }
    };

    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let entry_path = format!("{}[{}]", path, i);
            let pattern = entry.as_str().ok_or_else(|| {
                MalformedConfig::new(
                    &entry_path,
                    format!("expected a glob string, found {}", kind_of(entry)),
                )
            })?;
            ContentPattern::parse(pattern).map_err(|e| match e {
                ScanError::InvalidPattern { reason, .. } => MalformedConfig::new(&entry_path, reason),
                other => MalformedConfig::new(&entry_path, other.to_string()),
            })?;
            Ok(pattern.to_string())
        })
        .collect()
}

fn resolve_theme(root: &Map<String, Value>) -> Result<ThemeExtension, MalformedConfig> {
    let mut extension = ThemeExtension::default();

    let theme = match root.get("theme") {
        None => return Ok(extension),
        Some(Value::Object(theme)) => theme,
        Some(other) => {
            return Err(MalformedConfig::new(
                "theme",
                format!("expected a record, found {}", kind_of(other)),
            ))
        }
    };

    let extend = match theme.get("extend") {
        None => return Ok(extension),
        Some(Value::Object(extend)) => extend,
        Some(other) => {
            return Err(MalformedConfig::new(
                "theme.extend",
                format!("expected a record, found {}", kind_of(other)),
            ))
        }
    };

    for (category, tokens) in extend {
        let path = format!("theme.extend.{}", category);
        let tokens = tokens.as_object().ok_or_else(|| {
            MalformedConfig::new(
                &path,
                format!("expected a record of tokens, found {}", kind_of(tokens)),
            )
        })?;
        let resolved = resolve_tokens(tokens, CategoryKind::of(category), &path)?;
        extension.insert_category(category.clone(), resolved);
    }

    Ok(extension)
}

fn resolve_tokens(
    tokens: &Map<String, Value>,
    kind: CategoryKind,
    path: &str,
) -> Result<TokenMap, MalformedConfig> {
    tokens
        .iter()
        .map(|(name, value)| {
            let token_path = format!("{}.{}", path, name);
            resolve_token(value, kind, &token_path).map(|token| (name.clone(), token))
        })
        .collect()
}

fn resolve_token(value: &Value, kind: CategoryKind, path: &str) -> Result<Token, MalformedConfig> {
    let mismatch =
        || MalformedConfig::new(path, format!("expected {}, found {}", kind.expected(), kind_of(value)));

    match value {
        Value::String(s) => {
            if s.trim().is_empty() {
                return Err(MalformedConfig::new(path, "token value is empty"));
            }
            if kind == CategoryKind::Colors {
                validate_color_token(s).map_err(|e| MalformedConfig::new(path, e.to_string()))?;
            }
            Ok(Token::Text(s.clone()))
        }
        Value::Number(n) => match kind {
            CategoryKind::BorderRadius | CategoryKind::Other => Ok(Token::Number(n.clone())),
            _ => Err(mismatch()),
        },
        Value::Array(items) => match kind {
            CategoryKind::FontFamily | CategoryKind::BoxShadow | CategoryKind::Other => {
                resolve_string_list(items, path).map(Token::List)
            }
            _ => Err(mismatch()),
        },
        Value::Object(nested) => match kind {
            CategoryKind::Colors | CategoryKind::Other => {
                resolve_tokens(nested, kind, path).map(Token::Scale)
            }
            _ => Err(mismatch()),
        },
        Value::Bool(_) | Value::Null => Err(mismatch()),
    }
}

fn resolve_string_list(items: &[Value], path: &str) -> Result<Vec<String>, MalformedConfig> {
    if items.is_empty() {
        return Err(MalformedConfig::new(path, "list is empty"));
    }
    items
        .iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::String(s) if !s.trim().is_empty() => Ok(s.clone()),
            Value::String(_) => Err(MalformedConfig::new(format!("{}[{}]", path, i), "entry is empty")),
            other => Err(MalformedConfig::new(
                format!("{}[{}]", path, i),
                format!("expected a string, found {}", kind_of(other)),
            )),
        })
        .collect()
}

fn resolve_plugins(root: &Map<String, Value>) -> Result<Vec<String>, MalformedConfig> {
    let plugins = match root.get("plugins") {
        None => return Ok(Vec::new()),
        Some(Value::Array(plugins)) => plugins,
        Some(other) => {
            return Err(MalformedConfig::new(
                "plugins",
                format!("expected a sequence of plugin references, found {}", kind_of(other)),
            ))
        }
    };

    plugins
        .iter()
        .enumerate()
        .map(|(i, plugin)| match plugin {
            Value::String(s) if !s.trim().is_empty() => Ok(s.clone()),
            Value::String(_) => {
                Err(MalformedConfig::new(format!("plugins[{}]", i), "plugin reference is empty"))
            }
            other => Err(MalformedConfig::new(
                format!("plugins[{}]", i),
                format!("expected a plugin name, found {}", kind_of(other)),
            )),
        })
        .collect()
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a record",
    }
}
