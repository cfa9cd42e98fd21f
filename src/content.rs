//! Content-file matching for the utility-class scanner.
//!
//! Decides which markup sources are scanned for class usage, based on the
//! `content` globs of a resolved configuration. Patterns are matched with
//! set semantics: a file is scanned if any include pattern matches it and
//! no `!`-prefixed exclusion pattern does. Brace alternation
//! (`*.{html,js}`) is expanded before compiling.

use glob::{glob_with, MatchOptions, Pattern};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Configuration;

/// Error during content scanning
#[derive(Debug, Error)]
pub enum ScanError {
    /// Invalid glob pattern
    #[error("invalid glob pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
    /// Scan root does not exist
    #[error("scan root not found: {}", .0.display())]
    RootNotFound(PathBuf),
}

/// A single compiled content pattern
#[derive(Debug, Clone)]
pub struct ContentPattern {
    raw: String,
    negated: bool,
    /// One compiled glob per brace alternative
    alternatives: Vec<Pattern>,
}

impl ContentPattern {
    /// Compile a content glob.
    ///
    /// A leading `!` makes it an exclusion; a leading `./` is dropped since
    /// matching is always relative to the project root.
    pub fn parse(raw: &str) -> Result<Self, ScanError> {
        let invalid = |reason: &str| ScanError::InvalidPattern {
            pattern: raw.to_string(),
            reason: reason.to_string(),
        };

        if raw.trim().is_empty() {
            return Err(invalid("pattern is empty"));
        }

        let (negated, body) = match raw.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, raw),
        };
        let body = strip_dot_slash(body);
        if body.is_empty() {
            return Err(invalid("pattern has nothing after its prefix"));
        }

        let alternatives = expand_braces(body)
            .map_err(invalid)?
            .iter()
            .map(|alt| Pattern::new(alt).map_err(|e| invalid(e.msg)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { raw: raw.to_string(), negated, alternatives })
    }

    /// Pattern text as declared
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn is_exclusion(&self) -> bool {
        self.negated
    }

    fn matches(&self, path: &Path) -> bool {
        self.alternatives.iter().any(|p| p.matches_path_with(path, match_options()))
    }
}

/// Compiled set of content patterns
#[derive(Debug, Clone, Default)]
pub struct ContentMatcher {
    includes: Vec<ContentPattern>,
    excludes: Vec<ContentPattern>,
}

impl ContentMatcher {
    /// Compile a list of content globs.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, ScanError> {
        let mut matcher = Self::default();
        for raw in patterns {
            let pattern = ContentPattern::parse(raw.as_ref())?;
            if pattern.is_exclusion() {
                matcher.excludes.push(pattern);
            } else {
                matcher.includes.push(pattern);
            }
        }
        Ok(matcher)
    }

    /// Compile the content globs of a resolved configuration.
    pub fn from_config(config: &Configuration) -> Result<Self, ScanError> {
        Self::new(config.content_patterns())
    }

    /// Whether a path relative to the project root would be scanned.
    pub fn is_match(&self, relative: &Path) -> bool {
        let relative = strip_dot_slash_path(relative);
        self.includes.iter().any(|p| p.matches(relative))
            && !self.excludes.iter().any(|p| p.matches(relative))
    }

    /// Enumerate files under `root` that would be scanned.
    ///
    /// Returns a deduplicated, sorted list of paths joined onto `root`.
    pub fn scan(&self, root: &Path) -> Result<Vec<PathBuf>, ScanError> {
        if !root.is_dir() {
            return Err(ScanError::RootNotFound(root.to_path_buf()));
        }

        // The root is literal text; only the declared pattern may glob.
        let base = PathBuf::from(Pattern::escape(&root.to_string_lossy()));

        let mut files = BTreeSet::new();
        for (include, alternative) in
            self.includes.iter().flat_map(|inc| inc.alternatives.iter().map(move |alt| (inc, alt)))
        {
            let full_pattern = base.join(alternative.as_str());
            let pattern_str = full_pattern.to_string_lossy();

            let entries =
                glob_with(&pattern_str, match_options()).map_err(|e| ScanError::InvalidPattern {
                    pattern: include.raw.clone(),
                    reason: e.msg.to_string(),
                })?;

            for entry in entries {
                match entry {
                    Ok(path) => {
                        if !path.is_file() {
                            continue;
                        }
                        let relative = path.strip_prefix(root).unwrap_or(&path);
                        if self.excludes.iter().any(|p| p.matches(relative)) {
                            continue;
                        }
                        files.insert(path);
                    }
                    Err(e) => {
                        // Unreadable entries are skipped, the scan continues
                        warn!(error = %e, "error reading path during scan");
                    }
                }
            }
        }

        debug!(root = %root.display(), files = files.len(), "content scan complete");
        Ok(files.into_iter().collect())
    }
}

fn match_options() -> MatchOptions {
    MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    }
}

/// Expand `{a,b}` alternation into one pattern per alternative.
///
/// Groups may nest and repeat: `{a,b}/*.{x,y}` yields four patterns.
/// Braces inside a `[...]` class are literal.
fn expand_braces(pattern: &str) -> Result<Vec<String>, &'static str> {
    let Some((open, close)) = find_brace_group(pattern)? else {
        return Ok(vec![pattern.to_string()]);
    };

    let prefix = &pattern[..open];
    let suffix = &pattern[close + 1..];
    let mut expanded = Vec::new();
    for alternative in split_alternatives(&pattern[open + 1..close]) {
        let combined = format!("{}{}{}", prefix, alternative, suffix);
        expanded.extend(expand_braces(&combined)?);
    }
    Ok(expanded)
}

/// Byte offsets of the first top-level `{` and its matching `}`.
fn find_brace_group(pattern: &str) -> Result<Option<(usize, usize)>, &'static str> {
    let mut open = None;
    let mut depth = 0usize;
    let mut in_class = false;

    for (i, c) in pattern.char_indices() {
        match c {
            '[' if !in_class => in_class = true,
            ']' if in_class => in_class = false,
            '{' if !in_class => {
                if depth == 0 {
                    open = Some(i);
                }
                depth += 1;
            }
            '}' if !in_class => {
                if depth == 0 {
                    return Err("unmatched '}' in pattern");
                }
                depth -= 1;
                if depth == 0 {
                    return Ok(open.map(|o| (o, i)));
                }
            }
            _ => {}
        }
    }

    if depth > 0 {
        Err("unclosed '{' in pattern")
    } else {
        Ok(None)
    }
}

/// Split a group body on commas that are not inside a nested group.
fn split_alternatives(body: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in body.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&body[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&body[start..]);
    parts
}

fn strip_dot_slash(mut s: &str) -> &str {
    while let Some(rest) = s.strip_prefix("./") {
        s = rest;
    }
    s
}

fn strip_dot_slash_path(path: &Path) -> &Path {
    path.strip_prefix(".").unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) -> PathBuf {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().expect("fixture path has a parent"))
            .expect("should create fixture dirs");
        fs::write(&path, "<div class=\"p-4\"></div>").expect("should write fixture");
        path
    }

    #[test]
    fn test_parse_rejects_empty_patterns() {
        assert!(matches!(ContentPattern::parse(""), Err(ScanError::InvalidPattern { .. })));
        assert!(matches!(ContentPattern::parse("   "), Err(ScanError::InvalidPattern { .. })));
        assert!(matches!(ContentPattern::parse("!"), Err(ScanError::InvalidPattern { .. })));
        assert!(matches!(ContentPattern::parse("./"), Err(ScanError::InvalidPattern { .. })));
    }

    #[test]
    fn test_parse_rejects_invalid_glob() {
        let err = ContentPattern::parse("templates/[a-.html").expect_err("should reject");
        assert!(err.to_string().contains("templates/[a-.html"));
    }

    #[test]
    fn test_is_match_with_dot_slash_prefix() {
        let matcher = ContentMatcher::new(&["./templates/**/*.html"]).expect("valid patterns");
        assert!(matcher.is_match(Path::new("templates/index.html")));
        assert!(matcher.is_match(Path::new("templates/inventory/list.html")));
        assert!(matcher.is_match(Path::new("./templates/base.html")));
        assert!(!matcher.is_match(Path::new("templates/app.js")));
        assert!(!matcher.is_match(Path::new("other/templates/index.html")));
    }

    #[test]
    fn test_single_star_does_not_cross_directories() {
        let matcher = ContentMatcher::new(&["static/*.js"]).expect("valid patterns");
        assert!(matcher.is_match(Path::new("static/app.js")));
        assert!(!matcher.is_match(Path::new("static/vendor/lib.js")));
    }

    #[test]
    fn test_exclusions_win() {
        let matcher =
            ContentMatcher::new(&["./static/**/*.js", "!./static/vendor/**"]).expect("valid");
        assert!(matcher.is_match(Path::new("static/app.js")));
        assert!(!matcher.is_match(Path::new("static/vendor/jquery.js")));
    }

    #[test]
    fn test_brace_alternation() {
        let matcher = ContentMatcher::new(&["./templates/**/*.{html,js}"]).expect("valid");
        assert!(matcher.is_match(Path::new("templates/a.html")));
        assert!(matcher.is_match(Path::new("templates/nested/b.js")));
        assert!(!matcher.is_match(Path::new("templates/c.css")));

        let temp = TempDir::new().expect("should create temp dir");
        let a = touch(temp.path(), "templates/a.html");
        let b = touch(temp.path(), "templates/b.js");
        touch(temp.path(), "templates/c.css");
        assert_eq!(matcher.scan(temp.path()).expect("scan should succeed"), vec![a, b]);
    }

    #[test]
    fn test_expand_braces() {
        assert_eq!(expand_braces("a/*.html"), Ok(vec!["a/*.html".to_string()]));
        assert_eq!(
            expand_braces("{src,lib}/*.{ts,tsx}"),
            Ok(vec![
                "src/*.ts".to_string(),
                "src/*.tsx".to_string(),
                "lib/*.ts".to_string(),
                "lib/*.tsx".to_string(),
            ])
        );
        assert_eq!(
            expand_braces("*.{html,{j,t}s}"),
            Ok(vec!["*.html".to_string(), "*.js".to_string(), "*.ts".to_string()])
        );
        assert_eq!(expand_braces("[{]x"), Ok(vec!["[{]x".to_string()]));
        assert!(expand_braces("*.{html,js").is_err());
        assert!(expand_braces("*.html}").is_err());
    }

    #[test]
    fn test_unbalanced_braces_rejected() {
        assert!(matches!(
            ContentPattern::parse("./templates/*.{html"),
            Err(ScanError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_scan_root_with_glob_metacharacters() {
        let temp = TempDir::new().expect("should create temp dir");
        let root = temp.path().join("site[1]");
        let page = touch(&root, "templates/a.html");

        let matcher = ContentMatcher::new(&["./templates/*.html"]).expect("valid");
        assert_eq!(matcher.scan(&root).expect("scan should succeed"), vec![page]);
    }

    #[test]
    fn test_empty_matcher_matches_nothing() {
        let matcher = ContentMatcher::new::<&str>(&[]).expect("empty is valid");
        assert!(!matcher.is_match(Path::new("templates/index.html")));
    }

    #[test]
    fn test_scan_dedupes_and_sorts() {
        let temp = TempDir::new().expect("should create temp dir");
        let root = temp.path();
        let b = touch(root, "templates/b.html");
        let a = touch(root, "templates/a.html");
        let nested = touch(root, "inventory/templates/inventory/item.html");
        touch(root, "inventory/static/vendor/lib.js");
        let js = touch(root, "inventory/static/app.js");
        touch(root, "README.md");

        let matcher = ContentMatcher::new(&[
            "./templates/**/*.html",
            "./templates/*.html",
            "./inventory/templates/**/*.html",
            "./inventory/static/**/*.js",
            "!./inventory/static/vendor/**",
        ])
        .expect("valid patterns");

        let files = matcher.scan(root).expect("scan should succeed");
        let mut expected = vec![a, b, nested, js];
        expected.sort();
        assert_eq!(files, expected);
    }

    #[test]
    fn test_scan_missing_root() {
        let temp = TempDir::new().expect("should create temp dir");
        let matcher = ContentMatcher::new(&["**/*.html"]).expect("valid");
        let result = matcher.scan(&temp.path().join("missing"));
        assert!(matches!(result, Err(ScanError::RootNotFound(_))));
    }
}
