//! Team Cymru ASN lookups over DNS
//!
//! `AS<asn>.asn.cymru.com` answers with a single TXT record such as
//!
//! ```text
//! 23028 | US | arin | 2002-01-04 | TEAM-CYMRU - Team Cymru Inc., US
//! ```
//!
//! The AS name field carries a trailing `, CC` country tag which is removed.

use crate::error::CensusError;
use hickory_resolver::config::{NameServerConfigGroup, ResolverConfig, ResolverOpts};
use hickory_resolver::TokioAsyncResolver;
use std::net::IpAddr;
use std::time::Duration;

const CYMRU_ASN_ZONE: &str = "asn.cymru.com";

/// Index of the AS name in the pipe-separated record
const AS_NAME_FIELD: usize = 4;

/// Length of the `, CC` suffix appended to the AS name
const COUNTRY_SUFFIX_LEN: usize = 4;

/// Query name for an ASN
pub fn cymru_query_name(asn: u32) -> String {
    format!("AS{}.{}.", asn, CYMRU_ASN_ZONE)
}

/// Extract the organization name from a Cymru ASN TXT record
pub fn parse_cymru_asn_name(record: &str) -> Result<String, CensusError> {
    let fields: Vec<&str> = record.trim().split('|').map(str::trim).collect();
    let as_name = fields.get(AS_NAME_FIELD).ok_or_else(|| {
        CensusError::Resolution(format!(
            "expected at least {} fields in TXT record, got {}: {:?}",
            AS_NAME_FIELD + 1,
            fields.len(),
            record
        ))
    })?;

    let char_count = as_name.chars().count();
    if char_count < COUNTRY_SUFFIX_LEN {
        return Err(CensusError::Resolution(format!(
            "AS name field too short in TXT record: {:?}",
            record
        )));
    }

    let name: String = as_name
        .chars()
        .take(char_count - COUNTRY_SUFFIX_LEN)
        .collect();
    Ok(name.trim_end().to_string())
}

/// TXT lookups against a fixed list of resolvers
pub struct CymruClient {
    resolver: TokioAsyncResolver,
}

impl CymruClient {
    /// Create a client consulting `servers` in order over UDP and TCP port 53
    pub fn new(servers: &[IpAddr], timeout: Duration) -> Self {
        let group = NameServerConfigGroup::from_ips_clear(servers, 53, true);
        let config = ResolverConfig::from_parts(None, vec![], group);

        let mut opts = ResolverOpts::default();
        opts.timeout = timeout;
        opts.attempts = 1;
        opts.cache_size = 0;

        Self {
            resolver: TokioAsyncResolver::tokio(config, opts),
        }
    }

    /// Fetch the raw TXT record for an ASN
    pub async fn asn_record(&self, asn: u32) -> Result<String, CensusError> {
        let name = cymru_query_name(asn);
        let lookup = self
            .resolver
            .txt_lookup(name.as_str())
            .await
            .map_err(|e| CensusError::Resolution(format!("TXT lookup for {} failed: {}", name, e)))?;

        let txt = lookup.iter().next().ok_or_else(|| {
            CensusError::Resolution(format!("TXT lookup for {} returned no records", name))
        })?;

        let record = txt
            .txt_data()
            .iter()
            .map(|part| String::from_utf8_lossy(part).into_owned())
            .collect::<String>();
        Ok(record)
    }

    /// Resolve the organization name of an ASN
    pub async fn asn_name(&self, asn: u32) -> Result<String, CensusError> {
        let record = self.asn_record(asn).await?;
        tracing::debug!(asn, record = %record, "cymru TXT record");
        parse_cymru_asn_name(&record)
    }
}
