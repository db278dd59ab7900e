//! `lvr normalize`: run the normalizer over a payload file without storing it.
//!
//! Handy for checking what a spreadsheet export will turn into before it is
//! posted to the service.

use crate::output::{CliError, OutputMode, pretty_kv, pretty_section, render, render_error};
use anyhow::Context;
use clap::Args;
use lvr_core::config::ServiceConfig;
use lvr_core::market::MarketCatalog;
use lvr_core::normalize::{NormalizedSubmission, normalize_value};
use lvr_core::ErrorCode;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub struct NormalizeArgs {
    /// Payload file (JSON). Use `-` to read stdin.
    pub file: PathBuf,

    /// Extra market bundles, overriding the configured markets file.
    #[arg(long)]
    pub markets: Option<PathBuf>,
}

fn read_payload(path: &Path) -> anyhow::Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read payload from stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

pub fn run_normalize(
    args: &NormalizeArgs,
    config: &ServiceConfig,
    output: OutputMode,
) -> anyhow::Result<()> {
    let markets = match args.markets.as_ref().or(config.markets.file.as_ref()) {
        Some(path) => MarketCatalog::load(path)?,
        None => MarketCatalog::builtin(),
    };

    let text = read_payload(&args.file)?;
    let payload: serde_json::Value = match serde_json::from_str(&text) {
        Ok(value) => value,
        Err(e) => {
            render_error(
                output,
                &CliError::from_code(ErrorCode::ValidationFailed)
                    .with_details(vec![format!("$: not valid JSON ({e})")]),
            )?;
            anyhow::bail!("{} is not valid JSON", args.file.display());
        }
    };

    let submission = match normalize_value(payload, &markets) {
        Ok(submission) => submission,
        Err(errors) => {
            let details = errors.errors.iter().map(ToString::to_string).collect();
            render_error(
                output,
                &CliError::from_code(ErrorCode::ValidationFailed).with_details(details),
            )?;
            anyhow::bail!("{errors}");
        }
    };

    render(output, &submission, render_human)
}

fn render_human(submission: &NormalizedSubmission, w: &mut dyn Write) -> io::Result<()> {
    let record = &submission.record;
    pretty_section(w, &format!("Projection {}", submission.slug()))?;
    pretty_kv(w, "Owner", &submission.owner_slug)?;
    pretty_kv(w, "Address", &record.property.address)?;
    pretty_kv(
        w,
        "Location",
        format!("{}, {}", record.property.city, record.property.state),
    )?;
    pretty_kv(w, "Market", &record.property.market)?;
    let estimates = &record.projections;
    pretty_kv(
        w,
        "Revenue",
        format!(
            "{:.0} / {:.0} / {:.0} (low / expected / high)",
            estimates.low_revenue, estimates.expected_revenue, estimates.high_revenue
        ),
    )?;
    if !estimates.is_ordered() {
        writeln!(w, "warning: revenue estimates are not in low <= expected <= high order")?;
    }
    pretty_kv(w, "Months", record.monthly_revenue.len().to_string())?;
    pretty_kv(w, "Seasons", record.seasonal_breakdown.len().to_string())?;
    pretty_kv(w, "Agent", format!("{} <{}>", record.cta.ae_name, record.cta.ae_email))?;
    Ok(())
}
