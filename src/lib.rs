//! Styleconf - resolver for utility-class CSS style declarations
//!
//! This library provides functionality to:
//! - Load style declarations (TOML, JSON5, JSON) and resolve them into one
//!   validated, immutable configuration of content globs and design tokens
//! - Merge several declarations with token-level override and glob union
//! - Decide which markup files the content globs select

pub mod cli;
pub mod color;
pub mod config;
pub mod content;
pub mod watch;
