//! Originated prefix counts from RIPEstat `ris-prefixes`

use crate::datasets::ripestat::{StatEndpoint, StatFetcher, StatRequest};
use crate::lens::asn_list::Asn;
use crate::lens::messages::MessageLog;
use anyhow::Result;
use serde::Serialize;
use serde_json::Value;

/// IPv4 and IPv6 prefixes an ASN is seen originating
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PrefixCounts {
    pub v4: u64,
    pub v6: u64,
}

pub struct PrefixCountResolver<'a, F: StatFetcher + ?Sized> {
    fetcher: &'a F,
}

impl<'a, F: StatFetcher + ?Sized> PrefixCountResolver<'a, F> {
    pub fn new(fetcher: &'a F) -> Self {
        Self { fetcher }
    }

    /// Fetch the originating prefix counts of an ASN
    ///
    /// `ris-prefixes` notices repeat for every ASN, so info messages are
    /// suppressed.
    pub async fn resolve(&self, asn: Asn, messages: &mut MessageLog) -> Result<PrefixCounts> {
        let request = StatRequest::new(StatEndpoint::RisPrefixes, asn.to_string());
        let resp = self.fetcher.fetch(&request).await?;
        messages.classify("ris-prefixes", &resp.messages, true)?;

        let counts = resp.data.get("counts").unwrap_or(&Value::Null);
        Ok(PrefixCounts {
            v4: originating(counts, "v4"),
            v6: originating(counts, "v6"),
        })
    }
}

fn originating(counts: &Value, family: &str) -> u64 {
    counts
        .get(family)
        .and_then(|c| c.get("originating"))
        .and_then(Value::as_u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasets::ripestat::mock::MockStatFetcher;
    use crate::error::{classify, CensusError};
    use serde_json::json;

    #[tokio::test]
    async fn test_prefix_counts() {
        let fetcher = MockStatFetcher::new().with_response(
            StatEndpoint::RisPrefixes,
            "13335",
            json!({
                "data": {"counts": {
                    "v4": {"originating": 1740, "transiting": 12},
                    "v6": {"originating": 1366, "transiting": 0}
                }},
                "messages": [["info", "prefix list truncated"]]
            }),
        );
        let mut log = MessageLog::new();
        let counts = PrefixCountResolver::new(&fetcher)
            .resolve(Asn(13335), &mut log)
            .await
            .unwrap();

        assert_eq!(counts, PrefixCounts { v4: 1740, v6: 1366 });
        assert!(!log.has_logged("prefix list truncated"));
    }

    #[tokio::test]
    async fn test_prefix_counts_missing_default_to_zero() {
        let fetcher = MockStatFetcher::new().with_response(
            StatEndpoint::RisPrefixes,
            "64496",
            json!({"data": {"counts": {"v4": {"originating": 3}}}, "messages": []}),
        );
        let counts = PrefixCountResolver::new(&fetcher)
            .resolve(Asn(64496), &mut MessageLog::new())
            .await
            .unwrap();
        assert_eq!(counts, PrefixCounts { v4: 3, v6: 0 });
    }

    #[tokio::test]
    async fn test_prefix_counts_remote_error() {
        let fetcher = MockStatFetcher::new().with_response(
            StatEndpoint::RisPrefixes,
            "1",
            json!({"data": {}, "messages": [["error", "too many requests"]]}),
        );
        let err = PrefixCountResolver::new(&fetcher)
            .resolve(Asn(1), &mut MessageLog::new())
            .await
            .unwrap_err();
        assert!(matches!(
            classify(&err),
            Some(CensusError::RemoteService(_))
        ));
    }
}
