//! Lens module
//!
//! This module provides high-level "lens" abstractions that combine business
//! logic with output formatting. Each lens exposes a struct or function entry
//! point; the remote calls underneath live in [`crate::datasets`].
//!
//! | Lens | Purpose |
//! |------|---------|
//! | `country` | Country table lookups and [`country::CountryCode`] validation |
//! | `messages` | RIPEstat diagnostic message classification |
//! | `asn_list` | Routed/non-routed ASN lists of a country |
//! | `asn_name` | ASN holder name strategies (DNS, RIPEstat) |
//! | `prefixes` | Originated IPv4/IPv6 prefix counts |
//! | `census` | Full per-country run over all ASNs |
//! | `csv_output` | CSV encoding of census records |
//!
//! # Usage
//!
//! ```rust,ignore
//! use countryasn::lens::census::CensusLens;
//! use countryasn::lens::country::CountryCode;
//! use countryasn::lens::csv_output::write_csv_file;
//!
//! let lens = CensusLens::from_config(&config);
//! let report = lens.run(&CountryCode::new("LU")?, None).await?;
//! write_csv_file(&config.output_path("LU"), &report.records)?;
//! ```

pub mod asn_list;
pub mod asn_name;
pub mod census;
pub mod country;
pub mod csv_output;
pub mod messages;
pub mod prefixes;
