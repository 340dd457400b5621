//! Country ASN list resolution
//!
//! RIPEstat's `country-asns` call (at `lod=1`) returns the routed and
//! non-routed ASNs of a country as set literals:
//!
//! ```text
//! routed      := "{AsnSingle(701), AsnSingle(702)}"
//! non_routed  := "set()"
//! ```
//!
//! Grammar accepted by [`parse_asn_set`]:
//!
//! ```text
//! set    := '' | 'set()' | '{' [ entry ( ',' ' '? entry )* [','] ] '}'
//! entry  := 'AsnSingle(' digits ')'
//! ```

use crate::datasets::ripestat::{StatEndpoint, StatFetcher, StatRequest};
use crate::lens::country::CountryCode;
use crate::lens::messages::MessageLog;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

const ENTRY_OPEN: &str = "AsnSingle(";

// =============================================================================
// Types
// =============================================================================

/// Autonomous System Number, ordered numerically
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Asn(pub u32);

impl Asn {
    pub fn value(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for Asn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for Asn {
    fn from(value: u32) -> Self {
        Asn(value)
    }
}

/// Routed and non-routed ASNs of one country
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CountryAsnSet {
    /// Currently routed, ascending
    pub active: Vec<Asn>,
    /// Registered but not routed, ascending
    pub inactive: Vec<Asn>,
    /// Active and inactive together, ascending
    pub all: Vec<Asn>,
    /// Response fields that could not be parsed and were read as empty
    pub unparsed: Vec<String>,
}

impl CountryAsnSet {
    /// Build the set from unsorted lists
    pub fn new(mut active: Vec<Asn>, mut inactive: Vec<Asn>) -> Self {
        active.sort();
        inactive.sort();
        let mut all: Vec<Asn> = active.iter().chain(inactive.iter()).copied().collect();
        all.sort();
        Self {
            active,
            inactive,
            all,
            unparsed: vec![],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }

    pub fn len(&self) -> usize {
        self.all.len()
    }

    /// Whether any part of the list was dropped as unparsable
    pub fn is_incomplete(&self) -> bool {
        !self.unparsed.is_empty()
    }
}

/// Failure to parse a set literal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetLiteralError {
    /// Byte offset in the trimmed input
    pub position: usize,
    pub reason: String,
}

impl std::fmt::Display for SetLiteralError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "malformed ASN set at byte {}: {}", self.position, self.reason)
    }
}

impl std::error::Error for SetLiteralError {}

// =============================================================================
// Parser
// =============================================================================

/// Parse a `routed`/`non_routed` set literal into ASNs, in source order
pub fn parse_asn_set(input: &str) -> Result<Vec<Asn>, SetLiteralError> {
    let text = input.trim();
    if text.is_empty() || text == "set()" {
        return Ok(vec![]);
    }

    let mut cursor = Cursor { text, pos: 0 };
    cursor.expect("{")?;

    let mut asns = vec![];
    loop {
        cursor.skip_spaces();
        if cursor.eat("}") {
            break;
        }
        cursor.expect(ENTRY_OPEN)?;
        asns.push(cursor.digits()?);
        cursor.expect(")")?;
        cursor.skip_spaces();
        if cursor.eat(",") {
            continue;
        }
        cursor.expect("}")?;
        break;
    }

    if cursor.pos != text.len() {
        return Err(cursor.error("trailing characters after '}'"));
    }
    Ok(asns)
}

struct Cursor<'a> {
    text: &'a str,
    pos: usize,
}

impl Cursor<'_> {
    fn rest(&self) -> &str {
        &self.text[self.pos..]
    }

    fn eat(&mut self, token: &str) -> bool {
        if self.rest().starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &str) -> Result<(), SetLiteralError> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.error(&format!("expected '{}'", token)))
        }
    }

    fn skip_spaces(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.text.len() - trimmed.len();
    }

    fn digits(&mut self) -> Result<Asn, SetLiteralError> {
        let len = self
            .rest()
            .bytes()
            .take_while(|b| b.is_ascii_digit())
            .count();
        if len == 0 {
            return Err(self.error("expected digits"));
        }
        let value = self.rest()[..len]
            .parse::<u32>()
            .map_err(|e| self.error(&format!("invalid ASN: {}", e)))?;
        self.pos += len;
        Ok(Asn(value))
    }

    fn error(&self, reason: &str) -> SetLiteralError {
        SetLiteralError {
            position: self.pos,
            reason: reason.to_string(),
        }
    }
}

// =============================================================================
// Resolver
// =============================================================================

/// Fetches and parses the ASN list of a country
pub struct AsnListResolver<'a, F: StatFetcher + ?Sized> {
    fetcher: &'a F,
}

impl<'a, F: StatFetcher + ?Sized> AsnListResolver<'a, F> {
    pub fn new(fetcher: &'a F) -> Self {
        Self { fetcher }
    }

    pub async fn resolve(
        &self,
        country: &CountryCode,
        messages: &mut MessageLog,
    ) -> Result<CountryAsnSet> {
        let request =
            StatRequest::new(StatEndpoint::CountryAsns, country.as_str()).with_param("lod", "1");
        let resp = self.fetcher.fetch(&request).await?;
        messages.classify("country-asns", &resp.messages, false)?;

        let entry = resp
            .data
            .get("countries")
            .and_then(|c| c.get(0))
            .cloned()
            .unwrap_or(Value::Null);

        let mut unparsed = vec![];
        let mut read = |field: &str| match extract_field(&entry, field, country) {
            Ok(asns) => asns,
            Err(e) => {
                warn!(
                    country = %country,
                    field,
                    "ignoring unparsable ASN set, export will be incomplete: {}",
                    e
                );
                unparsed.push(field.to_string());
                vec![]
            }
        };
        let active = read("routed");
        let inactive = read("non_routed");

        let mut set = CountryAsnSet::new(active, inactive);
        set.unparsed = unparsed;
        debug!(
            country = %country,
            active = set.active.len(),
            inactive = set.inactive.len(),
            unparsed = ?set.unparsed,
            "resolved country ASN list"
        );
        Ok(set)
    }
}

/// Parse one set-literal field; a missing field yields no ASNs
fn extract_field(
    entry: &Value,
    field: &str,
    country: &CountryCode,
) -> Result<Vec<Asn>, SetLiteralError> {
    let Some(text) = entry.get(field).and_then(Value::as_str) else {
        debug!(country = %country, field, "field missing from country-asns response");
        return Ok(vec![]);
    };
    parse_asn_set(text)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasets::ripestat::mock::MockStatFetcher;
    use crate::error::{classify, CensusError};
    use serde_json::json;

    fn asns(values: &[u32]) -> Vec<Asn> {
        values.iter().map(|v| Asn(*v)).collect()
    }

    #[test]
    fn test_parse_asn_set() {
        assert_eq!(
            parse_asn_set("{AsnSingle(701), AsnSingle(702)}").unwrap(),
            asns(&[701, 702])
        );
        assert_eq!(
            parse_asn_set("{AsnSingle(3356),AsnSingle(174)}").unwrap(),
            asns(&[3356, 174])
        );
        assert_eq!(parse_asn_set("{AsnSingle(4200000000)}").unwrap(), asns(&[4200000000]));
    }

    #[test]
    fn test_parse_empty_forms() {
        assert!(parse_asn_set("").unwrap().is_empty());
        assert!(parse_asn_set("set()").unwrap().is_empty());
        assert!(parse_asn_set("  set()  ").unwrap().is_empty());
        assert!(parse_asn_set("{}").unwrap().is_empty());
    }

    #[test]
    fn test_parse_trailing_comma() {
        assert_eq!(
            parse_asn_set("{AsnSingle(1), AsnSingle(2),}").unwrap(),
            asns(&[1, 2])
        );
    }

    #[test]
    fn test_parse_malformed() {
        assert!(parse_asn_set("{AsnSingle(701)").is_err());
        assert!(parse_asn_set("{AsnRange(1-5)}").is_err());
        assert!(parse_asn_set("{AsnSingle()}").is_err());
        assert!(parse_asn_set("{AsnSingle(99999999999)}").is_err());
        assert!(parse_asn_set("[AsnSingle(701)]").is_err());
        assert!(parse_asn_set("{AsnSingle(701)} extra").is_err());

        let err = parse_asn_set("{AsnSingle(701) AsnSingle(702)}").unwrap_err();
        assert_eq!(err.position, 16);
    }

    #[test]
    fn test_country_asn_set_sorting() {
        let set = CountryAsnSet::new(asns(&[702, 10, 3356]), asns(&[500, 7]));
        assert_eq!(set.active, asns(&[10, 702, 3356]));
        assert_eq!(set.inactive, asns(&[7, 500]));
        assert_eq!(set.all, asns(&[7, 10, 500, 702, 3356]));
        assert_eq!(set.len(), 5);
    }

    #[test]
    fn test_asn_numeric_order() {
        let mut list = asns(&[9, 10, 100, 1000]);
        list.reverse();
        list.sort();
        assert_eq!(list, asns(&[9, 10, 100, 1000]));
        assert_eq!(Asn(701).to_string(), "701");
    }

    #[tokio::test]
    async fn test_resolve_country() {
        let fetcher = MockStatFetcher::new().with_response(
            StatEndpoint::CountryAsns,
            "LU",
            json!({
                "data": {"countries": [{
                    "resource": "LU",
                    "routed": "{AsnSingle(6661), AsnSingle(2602), AsnSingle(56665)}",
                    "non_routed": "{AsnSingle(8632), AsnSingle(196)}"
                }]},
                "messages": [["info", "Data may be incomplete"]]
            }),
        );
        let mut log = MessageLog::new();
        let country = CountryCode::new("lu").unwrap();

        let set = AsnListResolver::new(&fetcher)
            .resolve(&country, &mut log)
            .await
            .unwrap();

        assert_eq!(set.active, asns(&[2602, 6661, 56665]));
        assert_eq!(set.inactive, asns(&[196, 8632]));
        assert_eq!(set.all, asns(&[196, 2602, 6661, 8632, 56665]));
        assert!(!set.is_incomplete());
        assert!(log.has_logged("Data may be incomplete"));

        let requests = fetcher.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].extra, vec![("lod".to_string(), "1".to_string())]);
    }

    #[tokio::test]
    async fn test_resolve_degrades_on_bad_fields() {
        let fetcher = MockStatFetcher::new().with_response(
            StatEndpoint::CountryAsns,
            "VA",
            json!({
                "data": {"countries": [{
                    "routed": "{AsnRange(1-2)}",
                    "non_routed": "set()"
                }]},
                "messages": []
            }),
        );
        let mut log = MessageLog::new();
        let set = AsnListResolver::new(&fetcher)
            .resolve(&CountryCode::new("VA").unwrap(), &mut log)
            .await
            .unwrap();
        assert!(set.is_empty());
        assert_eq!(set.unparsed, vec!["routed".to_string()]);

        let fetcher = MockStatFetcher::new().with_response(
            StatEndpoint::CountryAsns,
            "VA",
            json!({"data": {"countries": []}}),
        );
        let set = AsnListResolver::new(&fetcher)
            .resolve(&CountryCode::new("VA").unwrap(), &mut log)
            .await
            .unwrap();
        assert!(set.is_empty());
        // a missing entry is not a parse failure
        assert!(!set.is_incomplete());
    }

    #[tokio::test]
    async fn test_resolve_marks_partial_list() {
        let fetcher = MockStatFetcher::new().with_response(
            StatEndpoint::CountryAsns,
            "LU",
            json!({
                "data": {"countries": [{
                    "routed": "{AsnSingle(6661), AsnSingle( 2)}",
                    "non_routed": "{AsnSingle(196)}"
                }]},
                "messages": []
            }),
        );
        let mut log = MessageLog::new();
        let set = AsnListResolver::new(&fetcher)
            .resolve(&CountryCode::new("LU").unwrap(), &mut log)
            .await
            .unwrap();

        assert!(set.active.is_empty());
        assert_eq!(set.inactive, asns(&[196]));
        assert!(set.is_incomplete());
        assert_eq!(set.unparsed, vec!["routed".to_string()]);
    }

    #[tokio::test]
    async fn test_resolve_remote_error() {
        let fetcher = MockStatFetcher::new().with_response(
            StatEndpoint::CountryAsns,
            "NL",
            json!({
                "data": {"countries": [{"routed": "{AsnSingle(1)}", "non_routed": ""}]},
                "messages": [["error", "Service unavailable"]]
            }),
        );
        let mut log = MessageLog::new();
        let err = AsnListResolver::new(&fetcher)
            .resolve(&CountryCode::new("NL").unwrap(), &mut log)
            .await
            .unwrap_err();
        assert_eq!(
            classify(&err),
            Some(&CensusError::RemoteService("Service unavailable".to_string()))
        );
    }

    #[tokio::test]
    async fn test_resolve_transport_error() {
        let fetcher = MockStatFetcher::new();
        let mut log = MessageLog::new();
        let err = AsnListResolver::new(&fetcher)
            .resolve(&CountryCode::new("NL").unwrap(), &mut log)
            .await
            .unwrap_err();
        assert!(matches!(classify(&err), Some(CensusError::Transport(_))));
    }
}
