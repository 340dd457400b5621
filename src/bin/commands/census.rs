use anyhow::Result;
use countryasn::lens::csv_output::write_csv_file;
use countryasn::{
    CensusLens, CensusPhase, CensusProgress, CensusProgressCallback, CountryAsnConfig, CountryCode,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Run the census for a country and write `<CC>.csv`
///
/// Nothing is written when the country has no ASNs or when any lookup fails.
/// Returns the path of the written file.
pub async fn run(
    lens: &CensusLens,
    config: &CountryAsnConfig,
    country: &CountryCode,
) -> Result<Option<PathBuf>> {
    let sty = indicatif::ProgressStyle::with_template(
        "[{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} {eta} {msg}",
    )?
    .progress_chars("##-");
    let pb = indicatif::ProgressBar::new(0);
    pb.set_style(sty);

    let pb_for_updates = pb.clone();
    let callback: CensusProgressCallback = Arc::new(move |progress: CensusProgress| match progress {
        CensusProgress::Started {
            country,
            active,
            inactive,
        } => {
            pb_for_updates.set_length((active + inactive) as u64);
            pb_for_updates.set_message(country);
        }
        CensusProgress::AsnResolved { .. } => pb_for_updates.inc(1),
        CensusProgress::Completed { .. } => pb_for_updates.finish_and_clear(),
    });

    eprintln!(
        "Fetching ASNs registered to {} ({})...",
        country.name(),
        country
    );
    let report = match lens.run(country, Some(callback)).await {
        Ok(r) => r,
        Err(e) => {
            pb.abandon();
            return Err(e);
        }
    };

    if report.asns.is_incomplete() {
        eprintln!(
            "{}",
            console::style(format!(
                "WARNING: unparsable {} list from RIPEstat, export is incomplete",
                report.asns.unparsed.join("/")
            ))
            .yellow()
            .bold()
        );
    }

    if report.is_empty() {
        println!("No ASNs found for {} ({})", country.name(), country);
        return Ok(None);
    }

    debug!(phase = %CensusPhase::WriteOutput, "writing CSV");
    let path = config.output_path(country.as_str());
    write_csv_file(&path, &report.records)?;

    println!(
        "Wrote {} ASNs ({} active, {} inactive) to {}",
        report.records.len(),
        report.asns.active.len(),
        report.asns.inactive.len(),
        path.display()
    );
    Ok(Some(path))
}
