//! Wire protocol for search requests.
//!
//! A client sends one JSON object terminated by a newline; the server
//! answers with newline-delimited matching paths and closes the stream
//! when done or cancelled. There is no framing beyond that.

use scout_core::{Query, QueryMode};
use serde::{Deserialize, Serialize};

/// A search request as it travels over the socket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    /// The text to search for.
    pub query: String,

    #[serde(default)]
    pub settings: Settings,
}

/// Query settings, all optional on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct Settings {
    pub mode: Mode,

    /// Maximum number of results to transmit; 0 means unlimited.
    pub max_results: usize,

    /// Skip sorting, cheaper for huge fuzzy result sets.
    pub no_sort: bool,

    /// Emit the best result first instead of last.
    pub sort_descending: bool,

    pub case_insensitive: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mode: Mode::Substring,
            max_results: 0,
            no_sort: false,
            sort_descending: false,
            case_insensitive: false,
        }
    }
}

/// Requested matching mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Prefix,
    Substring,
    Fuzzy,
}

impl From<Mode> for QueryMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Prefix => QueryMode::Prefix,
            Mode::Substring => QueryMode::Substring,
            Mode::Fuzzy => QueryMode::Fuzzy,
        }
    }
}

impl SearchRequest {
    /// Converts the wire form into an engine query.
    pub fn into_query(self) -> Query {
        Query {
            text: self.query,
            mode: self.settings.mode.into(),
            case_insensitive: self.settings.case_insensitive,
            no_sort: self.settings.no_sort,
            sort_descending: self.settings.sort_descending,
            max_results: self.settings.max_results,
        }
    }
}
