//! ASN holder name resolution
//!
//! Two interchangeable strategies behind [`AsnNameResolver`]:
//! - [`CymruDnsNameResolver`]: Team Cymru TXT records (default)
//! - [`RipeStatNameResolver`]: RIPEstat `as-overview` holder field

use crate::config::{CountryAsnConfig, NameSource};
use crate::datasets::cymru::CymruClient;
use crate::datasets::ripestat::{StatEndpoint, StatFetcher, StatRequest};
use crate::error::CensusError;
use crate::lens::asn_list::Asn;
use crate::lens::messages::MessageLog;
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Resolves the organization holding an ASN
#[async_trait]
pub trait AsnNameResolver: Send + Sync {
    async fn resolve_name(&self, asn: Asn, messages: &mut MessageLog) -> Result<String>;

    /// Short label used in logs
    fn source(&self) -> NameSource;
}

/// Build the resolver selected by configuration
pub fn name_resolver_for(
    config: &CountryAsnConfig,
    fetcher: Arc<dyn StatFetcher>,
) -> Arc<dyn AsnNameResolver> {
    match config.name_source {
        NameSource::Dns => Arc::new(CymruDnsNameResolver::new(CymruClient::new(
            &config.dns_servers,
            config.request_timeout(),
        ))),
        NameSource::Ripestat => Arc::new(RipeStatNameResolver::new(fetcher)),
    }
}

pub struct CymruDnsNameResolver {
    client: CymruClient,
}

impl CymruDnsNameResolver {
    pub fn new(client: CymruClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AsnNameResolver for CymruDnsNameResolver {
    async fn resolve_name(&self, asn: Asn, _messages: &mut MessageLog) -> Result<String> {
        Ok(self.client.asn_name(asn.value()).await?)
    }

    fn source(&self) -> NameSource {
        NameSource::Dns
    }
}

pub struct RipeStatNameResolver {
    fetcher: Arc<dyn StatFetcher>,
}

impl RipeStatNameResolver {
    pub fn new(fetcher: Arc<dyn StatFetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl AsnNameResolver for RipeStatNameResolver {
    async fn resolve_name(&self, asn: Asn, messages: &mut MessageLog) -> Result<String> {
        let request = StatRequest::new(StatEndpoint::AsOverview, asn.to_string());
        let resp = self.fetcher.fetch(&request).await?;
        messages.classify("as-overview", &resp.messages, true)?;

        let holder = resp
            .data
            .get("holder")
            .and_then(Value::as_str)
            .map(str::trim)
            .ok_or_else(|| {
                CensusError::Resolution(format!("no holder for AS{} in as-overview", asn))
            })?;
        Ok(holder.to_string())
    }

    fn source(&self) -> NameSource {
        NameSource::Ripestat
    }
}
