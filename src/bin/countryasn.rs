mod commands;

use clap::Parser;
use countryasn::error::classify;
use countryasn::lens::country::CountryOutputFormat;
use countryasn::{CensusError, CensusLens, CensusPhase, CountryAsnConfig, CountryCode, NameSource};
use std::path::PathBuf;
use tracing::{debug, Level};

#[derive(Parser)]
#[clap(version, about, long_about = None)]
#[clap(disable_version_flag = true)]
struct Cli {
    /// configuration file path, by default $HOME/.countryasn/countryasn.toml is used
    #[clap(short, long)]
    config: Option<String>,

    /// Print debug information
    #[clap(long)]
    debug: bool,

    /// Country code to export, skipping the interactive prompts
    #[clap(short = 'C', long)]
    country: Option<String>,

    /// Holder name source, overrides the configuration file
    #[clap(short, long, value_enum)]
    name_source: Option<NameSource>,

    /// Directory to write <COUNTRYCODE>.csv to, overrides the configuration file
    #[clap(short, long)]
    output_dir: Option<PathBuf>,

    /// List known countries and exit
    #[clap(long, value_enum, num_args = 0..=1, default_missing_value = "table")]
    list_countries: Option<CountryOutputFormat>,

    /// Print version
    #[clap(short = 'v', long, action = clap::ArgAction::Version)]
    version: (),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.debug { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .init();

    if let Some(format) = cli.list_countries {
        commands::country::run(format);
        return;
    }

    let mut config = match CountryAsnConfig::new(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            std::process::exit(1);
        }
    };
    if let Some(name_source) = cli.name_source {
        config.name_source = name_source;
    }
    if let Some(output_dir) = cli.output_dir {
        config.output_dir = output_dir;
    }
    if cli.debug {
        eprintln!("{}", config.summary());
    }

    debug!(phase = %CensusPhase::SelectCountry, "selecting country");
    let country = match cli.country {
        Some(code) => CountryCode::new(&code).map_err(anyhow::Error::from),
        None => {
            let stdin = std::io::stdin();
            commands::select::select_country(&mut stdin.lock(), &mut std::io::stdout())
        }
    };
    let country = match country {
        Ok(c) => c,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            std::process::exit(1);
        }
    };

    let lens = CensusLens::from_config(&config);
    if let Err(e) = commands::census::run(&lens, &config, &country).await {
        match classify(&e) {
            Some(CensusError::RemoteService(msg)) => eprintln!(
                "{}",
                console::style(format!("RIPEstat reported an error: {}", msg))
                    .red()
                    .bold()
            ),
            _ => eprintln!("ERROR: {:?}", e),
        }
        // let pending console output flush before the process goes away
        tokio::time::sleep(config.exit_delay()).await;
        std::process::exit(exit_code(&e));
    }
}

/// Process exit code for a failed census run
///
/// An error reported by RIPEstat itself is a clean exit; local and transport
/// failures are not.
fn exit_code(err: &anyhow::Error) -> i32 {
    match classify(err) {
        Some(CensusError::RemoteService(_)) => 0,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_exit_code() {
        let remote: anyhow::Result<()> =
            Err(CensusError::RemoteService("The given resource is not valid".to_string()).into());
        let remote = remote
            .context("fetching ASN list for ZZ")
            .unwrap_err();
        assert_eq!(exit_code(&remote), 0);

        let transport = anyhow::Error::from(CensusError::Transport("timed out".to_string()));
        assert_eq!(exit_code(&transport), 1);

        let resolution: anyhow::Result<()> =
            Err(CensusError::Resolution("NXDOMAIN AS64496".to_string()).into());
        let resolution = resolution.context("resolving name of AS64496").unwrap_err();
        assert_eq!(exit_code(&resolution), 1);

        assert_eq!(exit_code(&anyhow::anyhow!("disk full")), 1);
    }
}
