//! Country census lens
//!
//! Drives a full run for one country: fetch the ASN list, resolve every ASN
//! (active ones first, then inactive ones), and return records sorted by
//! ASN. Work is strictly sequential; each ASN is fully resolved before the
//! next one starts.
//!
//! # Example
//!
//! ```rust,ignore
//! use countryasn::lens::census::{CensusLens, CensusProgress};
//! use countryasn::lens::country::CountryCode;
//! use std::sync::Arc;
//!
//! let lens = CensusLens::from_config(&config);
//! let callback = Arc::new(|progress: CensusProgress| {
//!     if let CensusProgress::AsnResolved { done, total, .. } = progress {
//!         eprintln!("{done}/{total}");
//!     }
//! });
//!
//! let report = lens.run(&CountryCode::new("LU")?, Some(callback)).await?;
//! println!("{} ASNs", report.records.len());
//! ```

use crate::config::CountryAsnConfig;
use crate::datasets::ripestat::{StatFetcher, UreqStatFetcher};
use crate::lens::asn_list::{Asn, AsnListResolver, CountryAsnSet};
use crate::lens::asn_name::{name_resolver_for, AsnNameResolver};
use crate::lens::country::CountryCode;
use crate::lens::messages::MessageLog;
use crate::lens::prefixes::{PrefixCountResolver, PrefixCounts};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

// =============================================================================
// Types
// =============================================================================

/// One output row: an ASN with its holder and originated prefix counts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AsnRecord {
    #[serde(rename = "AS Number")]
    pub asn: Asn,
    #[serde(rename = "Organization Name")]
    pub organization_name: String,
    #[serde(rename = "Announced IPv4 Prefix Count")]
    pub prefix_count_v4: u64,
    #[serde(rename = "Announced IPv6 Prefix Count")]
    pub prefix_count_v6: u64,
}

impl AsnRecord {
    pub fn new(asn: Asn, organization_name: String, counts: PrefixCounts) -> Self {
        Self {
            asn,
            organization_name,
            prefix_count_v4: counts.v4,
            prefix_count_v6: counts.v6,
        }
    }
}

/// Run phases, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CensusPhase {
    SelectCountry,
    FetchAsnList,
    ResolveEachAsn,
    WriteOutput,
}

impl std::fmt::Display for CensusPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CensusPhase::SelectCountry => write!(f, "select-country"),
            CensusPhase::FetchAsnList => write!(f, "fetch-asn-list"),
            CensusPhase::ResolveEachAsn => write!(f, "resolve-each-asn"),
            CensusPhase::WriteOutput => write!(f, "write-output"),
        }
    }
}

/// Progress information for census runs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CensusProgress {
    /// The ASN list is known and per-ASN resolution starts
    Started {
        country: String,
        active: usize,
        inactive: usize,
    },
    /// One ASN record has been appended
    AsnResolved {
        asn: Asn,
        /// Whether the ASN is currently routed
        active: bool,
        done: usize,
        total: usize,
    },
    /// All ASNs are resolved
    Completed { total: usize },
}

/// Type alias for progress callback function
pub type CensusProgressCallback = Arc<dyn Fn(CensusProgress) + Send + Sync>;

/// Result of a census run
#[derive(Debug, Clone, Serialize)]
pub struct CensusReport {
    pub country: CountryCode,
    pub asns: CountryAsnSet,
    /// One record per ASN, ascending by ASN
    pub records: Vec<AsnRecord>,
}

impl CensusReport {
    /// Whether the country has no ASNs at all
    pub fn is_empty(&self) -> bool {
        self.asns.is_empty()
    }
}

// =============================================================================
// Lens
// =============================================================================

/// Country census lens
pub struct CensusLens {
    fetcher: Arc<dyn StatFetcher>,
    names: Arc<dyn AsnNameResolver>,
}

impl CensusLens {
    pub fn new(fetcher: Arc<dyn StatFetcher>, names: Arc<dyn AsnNameResolver>) -> Self {
        Self { fetcher, names }
    }

    /// Network-backed lens using the configured name source
    pub fn from_config(config: &CountryAsnConfig) -> Self {
        let fetcher: Arc<dyn StatFetcher> = Arc::new(
            UreqStatFetcher::new(config.sourceapp.as_str(), config.request_timeout())
                .with_base_url(config.ripestat_api.as_str()),
        );
        let names = name_resolver_for(config, fetcher.clone());
        Self::new(fetcher, names)
    }

    /// Fetch the ASN list of a country
    pub async fn country_asns(
        &self,
        country: &CountryCode,
        messages: &mut MessageLog,
    ) -> Result<CountryAsnSet> {
        AsnListResolver::new(self.fetcher.as_ref())
            .resolve(country, messages)
            .await
            .with_context(|| format!("fetching ASN list for {}", country))
    }

    /// Resolve holder name and prefix counts of one routed ASN
    pub async fn resolve_active(&self, asn: Asn, messages: &mut MessageLog) -> Result<AsnRecord> {
        let name = self
            .names
            .resolve_name(asn, messages)
            .await
            .with_context(|| format!("resolving name of AS{}", asn))?;
        let counts = PrefixCountResolver::new(self.fetcher.as_ref())
            .resolve(asn, messages)
            .await
            .with_context(|| format!("fetching prefix counts of AS{}", asn))?;
        Ok(AsnRecord::new(asn, name, counts))
    }

    /// Resolve the holder name of one non-routed ASN; counts are zero
    pub async fn resolve_inactive(
        &self,
        asn: Asn,
        messages: &mut MessageLog,
    ) -> Result<AsnRecord> {
        let name = self
            .names
            .resolve_name(asn, messages)
            .await
            .with_context(|| format!("resolving name of AS{}", asn))?;
        Ok(AsnRecord::new(asn, name, PrefixCounts::default()))
    }

    /// Run the census for a country
    ///
    /// The first failure aborts the run and no records are returned. A
    /// country without ASNs yields an empty report.
    pub async fn run(
        &self,
        country: &CountryCode,
        callback: Option<CensusProgressCallback>,
    ) -> Result<CensusReport> {
        let mut messages = MessageLog::new();

        debug!(phase = %CensusPhase::FetchAsnList, country = %country, "fetching ASN list");
        let asns = self.country_asns(country, &mut messages).await?;
        if asns.is_empty() {
            info!(country = %country, "no ASNs registered");
            return Ok(CensusReport {
                country: country.clone(),
                asns,
                records: vec![],
            });
        }

        debug!(
            phase = %CensusPhase::ResolveEachAsn,
            names = %self.names.source(),
            total = asns.len(),
            "resolving ASNs"
        );
        if let Some(ref cb) = callback {
            cb(CensusProgress::Started {
                country: country.to_string(),
                active: asns.active.len(),
                inactive: asns.inactive.len(),
            });
        }

        let total = asns.len();
        let mut records = Vec::with_capacity(total);

        for asn in &asns.active {
            records.push(self.resolve_active(*asn, &mut messages).await?);
            report(&callback, *asn, true, records.len(), total);
        }
        for asn in &asns.inactive {
            records.push(self.resolve_inactive(*asn, &mut messages).await?);
            report(&callback, *asn, false, records.len(), total);
        }

        records.sort_by_key(|r| r.asn);
        debug!(
            country = %country,
            records = records.len(),
            notices = messages.len(),
            "census complete"
        );

        if let Some(ref cb) = callback {
            cb(CensusProgress::Completed { total });
        }

        Ok(CensusReport {
            country: country.clone(),
            asns,
            records,
        })
    }
}

fn report(
    callback: &Option<CensusProgressCallback>,
    asn: Asn,
    active: bool,
    done: usize,
    total: usize,
) {
    if let Some(cb) = callback {
        cb(CensusProgress::AsnResolved {
            asn,
            active,
            done,
            total,
        });
    }
}

// =============================================================================
// Tests
// =============================================================================
