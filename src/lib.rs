#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

//! countryasn - export the ASNs registered to a country
//!
//! For one country, countryasn fetches the routed and non-routed ASN lists
//! from [RIPEstat](https://stat.ripe.net), resolves each ASN's holder name
//! (Team Cymru DNS or RIPEstat) and its originated IPv4/IPv6 prefix counts,
//! and writes the result as `<CC>.csv`. It can be used as both a
//! command-line application and a library.
//!
//! # Architecture
//!
//! - **[`datasets`]**: remote data sources
//!   - `ripestat`: the [`StatFetcher`] capability and its `ureq` implementation
//!   - `cymru`: TXT lookups against `asn.cymru.com`
//! - **[`lens`]**: business logic
//!   - `country`, `messages`, `asn_list`, `asn_name`, `prefixes`,
//!     `census`, `csv_output`
//! - **[`config`]**: configuration management
//! - **[`error`]**: the [`CensusError`] classification
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use countryasn::{CensusLens, CountryAsnConfig, CountryCode};
//! use countryasn::lens::csv_output::write_csv_file;
//!
//! let config = CountryAsnConfig::new(&None)?;
//! let country = CountryCode::new("lu")?;
//!
//! let report = CensusLens::from_config(&config).run(&country, None).await?;
//! if !report.is_empty() {
//!     write_csv_file(&config.output_path(country.as_str()), &report.records)?;
//! }
//! ```

pub mod config;
pub mod datasets;
pub mod error;
pub mod lens;

pub use config::{CountryAsnConfig, NameSource};
pub use datasets::{StatFetcher, StatRequest, StatResponse};
pub use error::CensusError;
pub use lens::asn_list::{Asn, CountryAsnSet};
pub use lens::census::{
    AsnRecord, CensusLens, CensusPhase, CensusProgress, CensusProgressCallback, CensusReport,
};
pub use lens::country::{CountryCode, CountryLens};
