//! RIPEstat data API access
//!
//! All RIPEstat calls go through the [`StatFetcher`] trait: one request
//! in, one decoded response (or a classified error) out. [`UreqStatFetcher`]
//! is the network implementation; tests plug in canned responses.

use crate::error::CensusError;
use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::time::Duration;

pub const RIPESTAT_DATA_API: &str = "https://stat.ripe.net/data";

/// RIPEstat data call endpoints used by countryasn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatEndpoint {
    /// `as-overview`: holder name of an ASN
    AsOverview,
    /// `country-asns`: routed and non-routed ASNs of a country
    CountryAsns,
    /// `ris-prefixes`: prefixes seen originated by an ASN
    RisPrefixes,
}

impl StatEndpoint {
    pub fn name(&self) -> &'static str {
        match self {
            StatEndpoint::AsOverview => "as-overview",
            StatEndpoint::CountryAsns => "country-asns",
            StatEndpoint::RisPrefixes => "ris-prefixes",
        }
    }
}

impl std::fmt::Display for StatEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A single data call: endpoint, resource, and endpoint-specific parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatRequest {
    pub endpoint: StatEndpoint,
    pub resource: String,
    pub extra: Vec<(String, String)>,
}

impl StatRequest {
    pub fn new(endpoint: StatEndpoint, resource: impl Into<String>) -> Self {
        Self {
            endpoint,
            resource: resource.into(),
            extra: vec![],
        }
    }

    /// Add an endpoint-specific query parameter
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.push((key.into(), value.into()));
        self
    }

    /// Endpoint URL without query string
    pub fn url(&self) -> String {
        self.url_for(RIPESTAT_DATA_API)
    }

    /// Endpoint URL under another data API root
    pub fn url_for(&self, base: &str) -> String {
        format!("{}/{}/data.json", base.trim_end_matches('/'), self.endpoint)
    }

    /// All query parameters, fixed client parameters first
    pub fn query_params(&self, sourceapp: &str) -> Vec<(String, String)> {
        let mut params = vec![
            ("resource".to_string(), self.resource.clone()),
            ("sourceapp".to_string(), sourceapp.to_string()),
            ("soft_limit".to_string(), "ignore".to_string()),
        ];
        params.extend(self.extra.iter().cloned());
        params
    }
}

/// Severity of a RIPEstat diagnostic message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Severity {
    Info,
    Error,
    Other(String),
}

impl From<&str> for Severity {
    fn from(s: &str) -> Self {
        match s {
            "info" => Severity::Info,
            "error" => Severity::Error,
            other => Severity::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Error => write!(f, "error"),
            Severity::Other(s) => write!(f, "{}", s),
        }
    }
}

/// A `[severity, text]` entry of a response's `messages` list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticMessage {
    pub severity: Severity,
    pub text: String,
}

impl DiagnosticMessage {
    pub fn new(severity: &str, text: impl Into<String>) -> Self {
        Self {
            severity: Severity::from(severity),
            text: text.into(),
        }
    }
}

impl<'de> Deserialize<'de> for DiagnosticMessage {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (severity, text) = <(String, String)>::deserialize(deserializer)?;
        Ok(DiagnosticMessage::new(&severity, text))
    }
}

/// Decoded RIPEstat response envelope
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatResponse {
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub messages: Vec<DiagnosticMessage>,
}

/// Capability to perform RIPEstat data calls
#[async_trait]
pub trait StatFetcher: Send + Sync {
    async fn fetch(&self, request: &StatRequest) -> Result<StatResponse, CensusError>;
}

/// RIPEstat fetcher backed by a blocking `ureq` agent
///
/// Each call runs on tokio's blocking pool so the caller only awaits it.
/// Non-2xx answers are still decoded: RIPEstat explains failures such as an
/// invalid resource in the `messages` of a 4xx body.
#[derive(Clone)]
pub struct UreqStatFetcher {
    agent: ureq::Agent,
    sourceapp: String,
    base_url: String,
}

impl UreqStatFetcher {
    pub fn new(sourceapp: impl Into<String>, timeout: Duration) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();
        Self {
            agent,
            sourceapp: sourceapp.into(),
            base_url: RIPESTAT_DATA_API.to_string(),
        }
    }

    /// Send data calls to another API root, e.g. a mirror or local server
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn fetch_blocking(
        agent: &ureq::Agent,
        sourceapp: &str,
        base_url: &str,
        request: &StatRequest,
    ) -> Result<StatResponse, CensusError> {
        let url = request.url_for(base_url);
        let mut builder = agent.get(&url);
        for (key, value) in request.query_params(sourceapp) {
            builder = builder.query(key, value);
        }

        let mut resp = builder
            .call()
            .map_err(|e| CensusError::Transport(format!("{} request failed: {}", url, e)))?;
        let status = resp.status();

        let decoded = resp.body_mut().read_json::<StatResponse>().map_err(|e| {
            CensusError::Transport(format!(
                "{} returned an invalid body (http status: {}): {}",
                url, status, e
            ))
        })?;

        // error-severity messages are left to the classifier
        if !status.is_success()
            && !decoded
                .messages
                .iter()
                .any(|m| m.severity == Severity::Error)
        {
            return Err(CensusError::Transport(format!(
                "{} request failed: http status: {}",
                url, status
            )));
        }
        Ok(decoded)
    }
}

#[async_trait]
impl StatFetcher for UreqStatFetcher {
    async fn fetch(&self, request: &StatRequest) -> Result<StatResponse, CensusError> {
        let agent = self.agent.clone();
        let sourceapp = self.sourceapp.clone();
        let base_url = self.base_url.clone();
        let request = request.clone();
        tracing::debug!(
            endpoint = %request.endpoint,
            resource = %request.resource,
            "fetching RIPEstat data"
        );

        tokio::task::spawn_blocking(move || {
            Self::fetch_blocking(&agent, &sourceapp, &base_url, &request)
        })
        .await
        .map_err(|e| CensusError::Transport(format!("request task failed: {}", e)))?
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_params() {
        let req = StatRequest::new(StatEndpoint::CountryAsns, "NL").with_param("lod", "1");
        assert_eq!(
            req.url(),
            "https://stat.ripe.net/data/country-asns/data.json"
        );
        let params = req.query_params("countryasn");
        assert_eq!(
            params,
            vec![
                ("resource".to_string(), "NL".to_string()),
                ("sourceapp".to_string(), "countryasn".to_string()),
                ("soft_limit".to_string(), "ignore".to_string()),
                ("lod".to_string(), "1".to_string()),
            ]
        );
    }

    #[test]
    fn test_decode_response_messages() {
        let resp: StatResponse = serde_json::from_value(json!({
            "data": {"holder": "EXAMPLE-AS"},
            "messages": [
                ["info", "Results may be incomplete"],
                ["error", "Invalid resource"],
                ["warning", "Deprecated"]
            ]
        }))
        .unwrap();

        assert_eq!(resp.data["holder"], "EXAMPLE-AS");
        assert_eq!(resp.messages.len(), 3);
        assert_eq!(resp.messages[0].severity, Severity::Info);
        assert_eq!(resp.messages[1].severity, Severity::Error);
        assert_eq!(
            resp.messages[2].severity,
            Severity::Other("warning".to_string())
        );
        assert_eq!(resp.messages[1].text, "Invalid resource");
    }

    #[test]
    fn test_decode_response_without_messages() {
        let resp: StatResponse = serde_json::from_value(json!({"data": {}})).unwrap();
        assert!(resp.messages.is_empty());
    }

    /// Serve one canned HTTP response on a local port, returning the API root
    fn serve_once(status_line: &'static str, body: &'static str) -> String {
        use std::io::{BufRead, BufReader, Write};

        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut line = String::new();
            while reader.read_line(&mut line).unwrap() > 0 {
                if line == "\r\n" {
                    break;
                }
                line.clear();
            }
            let mut stream = stream;
            write!(
                stream,
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            )
            .unwrap();
            stream.flush().unwrap();
        });
        format!("http://{}/data", addr)
    }

    fn local_fetcher(base_url: String) -> UreqStatFetcher {
        UreqStatFetcher::new("countryasn-test", Duration::from_secs(5)).with_base_url(base_url)
    }

    #[test]
    fn test_url_for_base() {
        let req = StatRequest::new(StatEndpoint::RisPrefixes, "3333");
        assert_eq!(
            req.url_for("http://127.0.0.1:8080/data/"),
            "http://127.0.0.1:8080/data/ris-prefixes/data.json"
        );
    }

    #[tokio::test]
    async fn test_fetch_keeps_error_messages_of_4xx_body() {
        let base = serve_once(
            "400 Bad Request",
            r#"{"messages":[["error","The given resource is not valid"]],"data":{},"status":"error","status_code":400}"#,
        );
        let req = StatRequest::new(StatEndpoint::CountryAsns, "ZZ").with_param("lod", "1");
        let resp = local_fetcher(base).fetch(&req).await.unwrap();
        assert_eq!(
            resp.messages,
            vec![DiagnosticMessage::new(
                "error",
                "The given resource is not valid"
            )]
        );

        let mut log = crate::lens::messages::MessageLog::new();
        assert_eq!(
            log.classify("country-asns", &resp.messages, false),
            Err(CensusError::RemoteService(
                "The given resource is not valid".to_string()
            ))
        );
    }

    #[tokio::test]
    async fn test_fetch_non_2xx_without_error_message() {
        let base = serve_once(
            "503 Service Unavailable",
            r#"{"messages":[["info","maintenance"]],"data":{}}"#,
        );
        let req = StatRequest::new(StatEndpoint::AsOverview, "3333");
        let err = local_fetcher(base).fetch(&req).await.unwrap_err();
        assert!(matches!(err, CensusError::Transport(ref m) if m.contains("503")));
    }

    #[tokio::test]
    async fn test_fetch_non_json_body() {
        let base = serve_once("502 Bad Gateway", "<html>bad gateway</html>");
        let req = StatRequest::new(StatEndpoint::AsOverview, "3333");
        let err = local_fetcher(base).fetch(&req).await.unwrap_err();
        assert!(matches!(err, CensusError::Transport(ref m) if m.contains("invalid body")));
    }

    #[tokio::test]
    async fn test_fetch_ok_body() {
        let base = serve_once(
            "200 OK",
            r#"{"messages":[],"data":{"holder":"RIPE-NCC-AS"}}"#,
        );
        let req = StatRequest::new(StatEndpoint::AsOverview, "3333");
        let resp = local_fetcher(base).fetch(&req).await.unwrap();
        assert_eq!(resp.data["holder"], "RIPE-NCC-AS");
    }

    #[test]
    #[ignore]
    fn test_fetch_country_asns_live() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let fetcher = UreqStatFetcher::new("countryasn-test", Duration::from_secs(30));
        let req = StatRequest::new(StatEndpoint::CountryAsns, "LU").with_param("lod", "1");
        let resp = rt.block_on(fetcher.fetch(&req)).unwrap();
        dbg!(&resp.messages);
        assert!(resp.data.get("countries").is_some());
    }
}
