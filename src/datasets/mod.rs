//! Remote data sources: the RIPEstat data API and Team Cymru's DNS service

pub mod cymru;
pub mod ripestat;

pub use crate::datasets::cymru::{cymru_query_name, parse_cymru_asn_name, CymruClient};
pub use crate::datasets::ripestat::{
    DiagnosticMessage, Severity, StatEndpoint, StatFetcher, StatRequest, StatResponse,
    UreqStatFetcher, RIPESTAT_DATA_API,
};
