//! Country lookup lens
//!
//! This module provides country name and code lookup functionality over a
//! static ISO 3166-1 table, and the validated [`CountryCode`] type every
//! census run starts from.
//!
//! # Example
//!
//! ```rust,ignore
//! use countryasn::lens::country::{CountryCode, CountryLens};
//!
//! let lens = CountryLens::new();
//!
//! // Look up by partial name
//! for country in lens.lookup("nether") {
//!     println!("{}: {}", country.code, country.name);
//! }
//!
//! // Validate free-text input
//! let code = CountryCode::new("nl")?;
//! assert_eq!(code.as_str(), "NL");
//! ```

mod table;

use crate::error::CensusError;
use serde::{Deserialize, Serialize};
use table::COUNTRIES;

// =============================================================================
// Types
// =============================================================================

/// A country entry with code and name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(tabled::Tabled))]
pub struct CountryEntry {
    /// ISO 3166-1 alpha-2 country code
    pub code: String,
    /// Full country name
    pub name: String,
}

/// A two-letter country code known to the country table, always uppercase
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CountryCode(String);

impl CountryCode {
    /// Validate and normalize a country code (case-insensitive)
    pub fn new(code: &str) -> Result<Self, CensusError> {
        let upper = code.trim().to_uppercase();
        if COUNTRIES.iter().any(|(c, _)| *c == upper) {
            Ok(CountryCode(upper))
        } else {
            Err(CensusError::Validation(format!(
                "'{}' is not a known 2-letter country code",
                code.trim()
            )))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Display name from the country table
    pub fn name(&self) -> &'static str {
        COUNTRIES
            .iter()
            .find(|(c, _)| *c == self.0)
            .map(|(_, n)| *n)
            .unwrap_or_default()
    }
}

impl std::fmt::Display for CountryCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for CountryCode {
    type Err = CensusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CountryCode::new(s)
    }
}

/// Output format for country lens results
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum CountryOutputFormat {
    /// Table format with borders (default)
    #[default]
    Table,
    /// JSON format
    Json,
    /// Simple text format (code: name)
    Simple,
    /// Markdown table
    Markdown,
}

// =============================================================================
// Lens
// =============================================================================

/// Country lookup lens
///
/// Provides methods for looking up countries by code or name.
#[derive(Debug, Clone, Copy, Default)]
pub struct CountryLens;

impl CountryLens {
    /// Create a new country lookup lens
    pub fn new() -> Self {
        Self
    }

    /// Lookup a country name by its 2-letter code
    pub fn lookup_code(&self, code: &str) -> Option<&'static str> {
        let code_upper = code.trim().to_uppercase();
        COUNTRIES
            .iter()
            .find(|(c, _)| *c == code_upper)
            .map(|(_, n)| *n)
    }

    /// Search for countries by code or name
    ///
    /// If the query matches a code exactly, returns only that country.
    /// Otherwise, returns all countries whose names contain the query.
    pub fn lookup(&self, query: &str) -> Vec<CountryEntry> {
        let query = query.trim();
        if query.is_empty() {
            return vec![];
        }

        let mut entries = vec![];
        let query_lower = query.to_lowercase();
        let query_upper = query.to_uppercase();

        for (code, name) in COUNTRIES {
            if *code == query_upper {
                // Exact code match - return only this
                return vec![entry(code, name)];
            } else if name.to_lowercase().contains(&query_lower) {
                entries.push(entry(code, name));
            }
        }
        entries
    }

    /// Get all countries sorted by code
    pub fn all(&self) -> Vec<CountryEntry> {
        let mut entries: Vec<CountryEntry> =
            COUNTRIES.iter().map(|(c, n)| entry(c, n)).collect();
        entries.sort_by(|a, b| a.code.cmp(&b.code));
        entries
    }

    /// Format results based on output format
    ///
    /// Table and Markdown formats require the `cli` feature and fall back to
    /// Simple format without it.
    pub fn format_results(&self, results: &[CountryEntry], format: &CountryOutputFormat) -> String {
        if results.is_empty() {
            return match format {
                CountryOutputFormat::Json => "[]".to_string(),
                _ => "No countries found".to_string(),
            };
        }

        match format {
            #[cfg(feature = "cli")]
            CountryOutputFormat::Table => {
                use tabled::settings::Style;
                use tabled::Table;
                Table::new(results).with(Style::rounded()).to_string()
            }
            #[cfg(feature = "cli")]
            CountryOutputFormat::Markdown => {
                use tabled::settings::Style;
                use tabled::Table;
                Table::new(results).with(Style::markdown()).to_string()
            }
            CountryOutputFormat::Json => serde_json::to_string_pretty(results).unwrap_or_default(),
            _ => results
                .iter()
                .map(|e| format!("{}: {}", e.code, e.name))
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

fn entry(code: &str, name: &str) -> CountryEntry {
    CountryEntry {
        code: code.to_string(),
        name: name.to_string(),
    }
}

// =============================================================================
// Tests
// =============================================================================
