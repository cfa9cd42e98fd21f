//! Resolved configuration types
//!
//! Defines the immutable [`Configuration`] value produced by the resolver,
//! and the design-token model carried in its theme extension.

use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// Token name -> value mapping within a category or nested scale
pub type TokenMap = BTreeMap<String, Token>;

/// Theme categories with dedicated validation rules
pub const CATEGORY_COLORS: &str = "colors";
pub const CATEGORY_FONT_FAMILY: &str = "fontFamily";
pub const CATEGORY_BORDER_RADIUS: &str = "borderRadius";
pub const CATEGORY_BOX_SHADOW: &str = "boxShadow";

/// A single design-token value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Token {
    /// Hex color, font name, CSS length or shadow expression
    Text(String),
    /// Unitless number, e.g. a radius
    Number(serde_json::Number),
    /// Font stack or layered shadow
    List(Vec<String>),
    /// Nested scale such as `brand: { 50: ..., 500: ... }`
    Scale(TokenMap),
}

impl Token {
    /// String value, if this token is plain text
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Token::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Nested scale, if this token is one
    pub fn as_scale(&self) -> Option<&TokenMap> {
        match self {
            Token::Scale(map) => Some(map),
            _ => None,
        }
    }

    /// Overlay `later` onto this token.
    ///
    /// Two scales merge key by key; anything else is replaced outright.
    pub fn merge_from(&mut self, later: &Token) {
        match (self, later) {
            (Token::Scale(ours), Token::Scale(theirs)) => merge_token_maps(ours, theirs),
            (this, _) => *this = later.clone(),
        }
    }
}

fn merge_token_maps(ours: &mut TokenMap, theirs: &TokenMap) {
    for (name, token) in theirs {
        match ours.get_mut(name) {
            Some(existing) => existing.merge_from(token),
            None => {
                ours.insert(name.clone(), token.clone());
            }
        }
    }
}

/// Additive design-token overrides, keyed by category then token name
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct ThemeExtension(BTreeMap<String, TokenMap>);

impl ThemeExtension {
    pub(crate) fn insert_category(&mut self, name: String, tokens: TokenMap) {
        self.0.insert(name, tokens);
    }

    /// Tokens of one category
    pub fn category(&self, name: &str) -> Option<&TokenMap> {
        self.0.get(name)
    }

    /// Category names in sorted order
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of tokens across all categories (nested scales count once)
    pub fn token_count(&self) -> usize {
        self.0.values().map(BTreeMap::len).sum()
    }

    /// Deep merge: category, then token, then nested scale keys. Later wins.
    pub fn merge_from(&mut self, later: &ThemeExtension) {
        for (category, tokens) in &later.0 {
            merge_token_maps(self.0.entry(category.clone()).or_default(), tokens);
        }
    }
}

/// Resolved style configuration
///
/// Built by [`crate::config::resolve`]; there is no way to construct an
/// unvalidated one or to mutate it afterwards. Combine configurations with
/// [`Configuration::merge`].
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    content_patterns: Vec<String>,
    theme_extension: ThemeExtension,
    plugins: Vec<String>,
}

impl Configuration {
    pub(crate) fn new(
        content_patterns: Vec<String>,
        theme_extension: ThemeExtension,
        plugins: Vec<String>,
    ) -> Self {
        Self { content_patterns, theme_extension, plugins }
    }

    /// Content globs in declaration order
    pub fn content_patterns(&self) -> &[String] {
        &self.content_patterns
    }

    pub fn theme_extension(&self) -> &ThemeExtension {
        &self.theme_extension
    }

    pub fn plugins(&self) -> &[String] {
        &self.plugins
    }

    /// Tokens of one theme category
    pub fn category(&self, name: &str) -> Option<&TokenMap> {
        self.theme_extension.category(name)
    }

    /// Look up a token by dot-separated path within a category.
    ///
    /// ```ignore
    /// config.token("colors", "brand.500") // Some(Token::Text("#06B6D4"))
    /// ```
    pub fn token(&self, category: &str, path: &str) -> Option<&Token> {
        let mut segments = path.split('.');
        let mut current = self.category(category)?.get(segments.next()?)?;
        for segment in segments {
            current = current.as_scale()?.get(segment)?;
        }
        Some(current)
    }

    /// Merge a later configuration into this one.
    ///
    /// Theme tokens are deep-merged with the later value winning at the leaf.
    /// Content patterns and plugins are unioned, keeping first-seen order.
    pub fn merge(&self, later: &Configuration) -> Configuration {
        let mut theme_extension = self.theme_extension.clone();
        theme_extension.merge_from(&later.theme_extension);

        Configuration {
            content_patterns: ordered_union(&self.content_patterns, &later.content_patterns),
            theme_extension,
            plugins: ordered_union(&self.plugins, &later.plugins),
        }
    }

    /// Render back into declaration shape (`content`, `theme.extend`, `plugins`),
    /// the form the utility-class build tool consumes.
    pub fn to_declaration(&self) -> Value {
        json!({
            "content": self.content_patterns,
            "theme": { "extend": self.theme_extension },
            "plugins": self.plugins,
        })
    }
}

fn ordered_union(first: &[String], second: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(first.len() + second.len());
    for item in first.iter().chain(second) {
        if !out.contains(item) {
            out.push(item.clone());
        }
    }
    out
}
