use anyhow::{anyhow, Result};
use config::Config;
use crate::datasets::ripestat::RIPESTAT_DATA_API;
use std::collections::HashMap;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Which service resolves an ASN to its holder name
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum NameSource {
    /// Team Cymru TXT records over DNS (default)
    #[default]
    Dns,
    /// RIPEstat `as-overview` holder field
    Ripestat,
}

impl FromStr for NameSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dns" | "cymru" => Ok(NameSource::Dns),
            "ripestat" | "ripe" | "http" => Ok(NameSource::Ripestat),
            _ => Err(format!(
                "Unknown name source '{}'. Valid sources: dns, ripestat",
                s
            )),
        }
    }
}

impl std::fmt::Display for NameSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NameSource::Dns => write!(f, "dns"),
            NameSource::Ripestat => write!(f, "ripestat"),
        }
    }
}

/// Public resolvers consulted, in order, for Team Cymru lookups
pub const DEFAULT_DNS_SERVERS: [&str; 4] = ["1.1.1.1", "1.0.0.1", "8.8.8.8", "8.8.4.4"];

/// Client identifier sent to RIPEstat on every request
pub const DEFAULT_SOURCEAPP: &str = "countryasn";

pub struct CountryAsnConfig {
    /// Directory the `<CC>.csv` file is written to
    pub output_dir: PathBuf,

    /// Holder name resolution strategy
    pub name_source: NameSource,

    /// Resolvers for the DNS name source
    pub dns_servers: Vec<IpAddr>,

    /// Timeout for each HTTP request and DNS query, in seconds (default: 30)
    pub request_timeout_secs: u64,

    /// `sourceapp` query parameter for RIPEstat
    pub sourceapp: String,

    /// RIPEstat data API root
    pub ripestat_api: String,

    /// Delay before exiting after an error, in milliseconds (default: 1000)
    pub exit_delay_ms: u64,
}

const EMPTY_CONFIG: &str = r#"### countryasn configuration file

### directory the CSV output is written to
# output_dir = "."

### holder name source: "dns" (Team Cymru) or "ripestat" (as-overview)
# name_source = "dns"

### comma-separated resolvers used for the dns name source
# dns_servers = "1.1.1.1,1.0.0.1,8.8.8.8,8.8.4.4"

### per-request timeout and RIPEstat client identifier
# request_timeout_secs = 30
# sourceapp = "countryasn"

### RIPEstat data API root
# ripestat_api = "https://stat.ripe.net/data"

### delay before exiting after an error (milliseconds)
# exit_delay_ms = 1000
"#;

impl Default for CountryAsnConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            name_source: NameSource::default(),
            dns_servers: default_dns_servers(),
            request_timeout_secs: 30,
            sourceapp: DEFAULT_SOURCEAPP.to_string(),
            ripestat_api: RIPESTAT_DATA_API.to_string(),
            exit_delay_ms: 1000,
        }
    }
}

fn default_dns_servers() -> Vec<IpAddr> {
    DEFAULT_DNS_SERVERS
        .iter()
        .filter_map(|s| s.parse().ok())
        .collect()
}

impl CountryAsnConfig {
    /// Function to create and initialize a new configuration
    pub fn new(path: &Option<String>) -> Result<CountryAsnConfig> {
        dotenvy::dotenv().ok();

        let mut builder = Config::builder();

        // Add in toml configuration file
        match path {
            Some(p) => {
                let path = Path::new(p.as_str());
                if path.exists() {
                    let path_str = path
                        .to_str()
                        .ok_or_else(|| anyhow!("Could not convert path to string"))?;
                    builder = builder.add_source(config::File::with_name(path_str));
                } else {
                    std::fs::write(p.as_str(), EMPTY_CONFIG)
                        .map_err(|e| anyhow!("Unable to create config file: {}", e))?;
                }
            }
            None => {
                // By default use $HOME/.countryasn/countryasn.toml
                let home_dir = dirs::home_dir()
                    .ok_or_else(|| anyhow!("Could not find home directory"))?;
                let config_dir = home_dir.join(".countryasn");
                std::fs::create_dir_all(&config_dir)
                    .map_err(|e| anyhow!("Unable to create countryasn directory: {}", e))?;
                let p = config_dir.join("countryasn.toml");
                let p_str = p
                    .to_str()
                    .ok_or_else(|| anyhow!("Could not convert config path to string"))?;
                if p.exists() {
                    builder = builder.add_source(config::File::with_name(p_str));
                } else {
                    std::fs::write(&p, EMPTY_CONFIG)
                        .map_err(|e| anyhow!("Unable to create config file {}: {}", p_str, e))?;
                }
            }
        }

        // Add in settings from the environment (with a prefix of COUNTRYASN)
        // E.g., `COUNTRYASN_NAME_SOURCE=ripestat ./countryasn`
        builder = builder.add_source(config::Environment::with_prefix("COUNTRYASN"));

        let settings = builder
            .build()
            .map_err(|e| anyhow!("Failed to build configuration: {}", e))?;

        let config = settings
            .try_deserialize::<HashMap<String, String>>()
            .map_err(|e| anyhow!("Failed to deserialize configuration: {}", e))?;

        Self::from_map(&config)
    }

    /// Build a configuration from flattened key/value settings
    pub fn from_map(config: &HashMap<String, String>) -> Result<CountryAsnConfig> {
        let defaults = CountryAsnConfig::default();

        let output_dir = config
            .get("output_dir")
            .map(PathBuf::from)
            .unwrap_or(defaults.output_dir);

        let name_source = match config.get("name_source") {
            Some(s) => NameSource::from_str(s).map_err(|e| anyhow!(e))?,
            None => defaults.name_source,
        };

        let dns_servers = match config.get("dns_servers") {
            Some(s) => parse_dns_servers(s)?,
            None => defaults.dns_servers,
        };

        let request_timeout_secs = config
            .get("request_timeout_secs")
            .and_then(|s| s.parse().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(defaults.request_timeout_secs);

        let sourceapp = config
            .get("sourceapp")
            .filter(|s| !s.trim().is_empty())
            .cloned()
            .unwrap_or(defaults.sourceapp);

        let ripestat_api = config
            .get("ripestat_api")
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or(defaults.ripestat_api);

        let exit_delay_ms = config
            .get("exit_delay_ms")
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.exit_delay_ms);

        Ok(CountryAsnConfig {
            output_dir,
            name_source,
            dns_servers,
            request_timeout_secs,
            sourceapp,
            ripestat_api,
            exit_delay_ms,
        })
    }

    /// Get the request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Get the exit delay as Duration
    pub fn exit_delay(&self) -> Duration {
        Duration::from_millis(self.exit_delay_ms)
    }

    /// Path of the CSV file for a country code
    pub fn output_path(&self, country_code: &str) -> PathBuf {
        self.output_dir.join(format!("{}.csv", country_code))
    }

    /// Display configuration summary
    pub fn summary(&self) -> String {
        let servers = self
            .dns_servers
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        [
            format!("Output Directory:   {}", self.output_dir.display()),
            format!("Name Source:        {}", self.name_source),
            format!("DNS Servers:        {}", servers),
            format!("Request Timeout:    {} seconds", self.request_timeout_secs),
            format!("Source App:         {}", self.sourceapp),
            format!("RIPEstat API:       {}", self.ripestat_api),
        ]
        .join("\n")
    }
}

fn parse_dns_servers(value: &str) -> Result<Vec<IpAddr>> {
    let servers = value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<IpAddr>()
                .map_err(|e| anyhow!("Invalid DNS server '{}': {}", s, e))
        })
        .collect::<Result<Vec<_>>>()?;
    if servers.is_empty() {
        return Err(anyhow!("dns_servers must list at least one resolver"));
    }
    Ok(servers)
}
