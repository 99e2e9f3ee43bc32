//! The exclusion policy.
//!
//! Decides which paths never make it into the index. Rules come from
//! configuration: path prefixes, substrings, regular expressions, and
//! an optional hidden-file rule. The initial scan and the reconciler
//! consult the same predicate for every candidate path, so a filtered
//! subtree stays out of the index no matter how it was discovered.

use regex::RegexSet;
use serde::Deserialize;

/// Filter rules as loaded from configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct FilterConfig {
    /// Paths starting with any of these are excluded.
    pub prefixes: Vec<String>,

    /// Paths containing any of these are excluded.
    pub substrings: Vec<String>,

    /// Paths matching any of these regular expressions are excluded.
    pub patterns: Vec<String>,

    /// Exclude dotfiles and everything below dot-directories.
    pub skip_hidden: bool,
}

/// The compiled exclusion predicate.
#[derive(Debug)]
pub struct PathFilter {
    prefixes: Vec<String>,
    substrings: Vec<String>,
    patterns: RegexSet,
    skip_hidden: bool,
}

impl PathFilter {
    /// Compiles the configured rules. Fails only on an invalid regular
    /// expression.
    pub fn compile(config: &FilterConfig) -> Result<Self, regex::Error> {
        Ok(Self {
            prefixes: config.prefixes.clone(),
            substrings: config.substrings.clone(),
            patterns: RegexSet::new(&config.patterns)?,
            skip_hidden: config.skip_hidden,
        })
    }

    /// A permissive filter that excludes nothing.
    pub fn allow_all() -> Self {
        Self {
            prefixes: Vec::new(),
            substrings: Vec::new(),
            patterns: RegexSet::empty(),
            skip_hidden: false,
        }
    }

    /// Returns whether `path` must be kept out of the index.
    pub fn is_excluded(&self, path: &str) -> bool {
        if self.skip_hidden && has_hidden_segment(path) {
            return true;
        }
        if self.prefixes.iter().any(|p| path.starts_with(p.as_str())) {
            return true;
        }
        if self.substrings.iter().any(|s| path.contains(s.as_str())) {
            return true;
        }
        !self.patterns.is_empty() && self.patterns.is_match(path)
    }
}

fn has_hidden_segment(path: &str) -> bool {
    path.split('/')
        .any(|segment| segment.len() > 1 && segment.starts_with('.'))
}
