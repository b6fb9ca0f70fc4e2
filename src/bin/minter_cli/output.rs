//! Output formatting for cnft-minter CLI
//!
//! Human-readable and JSON renderings of command results.

use minter_core::{format_sol, CostBreakdown, MintReport};
use minter_transport::Asset;
use minter_types::encoding::short_id;
use minter_types::{SubmissionStatus, VerificationSubject};
use serde::Serialize;

/// Format an error chain for stderr.
pub fn format_error(error: &anyhow::Error, json_output: bool) -> String {
    if json_output {
        #[derive(Serialize)]
        struct ErrorJson {
            error: String,
            #[serde(skip_serializing_if = "Option::is_none")]
            cause: Option<String>,
        }

        let err = ErrorJson {
            error: error.to_string(),
            cause: error.source().map(|e| e.to_string()),
        };
        serde_json::to_string_pretty(&err).unwrap_or_else(|_| "{}".to_string())
    } else {
        let mut out = format!("\x1b[31mError:\x1b[0m {}\n", error);
        let mut causes = error.chain().skip(1).peekable();
        if causes.peek().is_some() {
            out.push_str("Caused by:\n");
            for (idx, cause) in causes.enumerate() {
                out.push_str(&format!("  {}: {}\n", idx + 1, cause));
            }
        }
        out
    }
}

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn format_cost(breakdown: &CostBreakdown) -> String {
    let mut out = String::new();
    out.push_str(&format!("Items:        {}\n", breakdown.quantity));
    out.push_str(&format!(
        "Provisioning: {}\n",
        format_sol(breakdown.provisioning_lamports)
    ));
    out.push_str(&format!(
        "Minting:      {}\n",
        format_sol(breakdown.items_lamports)
    ));
    out.push_str(&format!(
        "Fees:         {}\n",
        format_sol(breakdown.fees_lamports)
    ));
    out.push_str(&format!(
        "\x1b[1mTotal:        {}\x1b[0m\n",
        format_sol(breakdown.total_lamports)
    ));
    out
}

pub fn format_report(report: &MintReport, verbose: bool) -> String {
    let mut out = String::new();

    if report.cancelled {
        out.push_str(&format!(
            "\x1b[33m! Mint cancelled after {} of {} items\x1b[0m\n\n",
            report.outcomes.len(),
            report.progress.total
        ));
    } else if report.failed == 0 {
        out.push_str(&format!(
            "\x1b[32m✓ Minted {} items\x1b[0m\n\n",
            report.minted()
        ));
    } else {
        out.push_str(&format!(
            "\x1b[31m✗ Minted {} items, {} failed\x1b[0m\n\n",
            report.minted(),
            report.failed
        ));
    }

    out.push_str(&format!("Run:          {}\n", report.run_id));
    out.push_str(&format!("Payer:        {}\n", report.payer));
    out.push_str(&format!(
        "Tree:         {} (depth {}, buffer {})\n",
        report.accumulator.address, report.accumulator.max_depth, report.accumulator.max_buffer_size
    ));
    if let Some(registry) = &report.registry {
        out.push_str(&format!(
            "Collection:   {} ({})\n",
            registry.address, registry.name
        ));
    }
    out.push_str(&format!(
        "Sent/confirmed/failed: {}/{}/{}\n",
        report.sent, report.confirmed, report.failed
    ));
    out.push_str(&format!(
        "Estimated cost: {}\n",
        format_sol(report.estimated_cost.total_lamports)
    ));
    out.push_str(&format!(
        "Duration:     {:.1}s\n",
        (report.finished_at - report.started_at).num_milliseconds() as f64 / 1000.0
    ));

    let failures: Vec<_> = report
        .outcomes
        .iter()
        .filter(|o| o.status == SubmissionStatus::Failed)
        .collect();
    if !failures.is_empty() {
        out.push_str("\n\x1b[1mFailed Items:\x1b[0m\n");
        for outcome in failures {
            out.push_str(&format!(
                "  {} after {} attempt(s): {}\n",
                outcome.name,
                outcome.attempts,
                outcome.last_error.as_deref().unwrap_or("unknown error")
            ));
        }
    }

    if verbose {
        out.push_str("\n\x1b[1mOutcomes:\x1b[0m\n");
        for outcome in &report.outcomes {
            out.push_str(&format!(
                "  [{}] {} {:?} attempts={} {}\n",
                outcome.index,
                outcome.name,
                outcome.status,
                outcome.attempts,
                outcome
                    .receipt
                    .as_ref()
                    .map(|r| short_id(r.as_str()))
                    .unwrap_or_default()
            ));
        }
    }

    if !report.verification.is_empty() {
        out.push_str(&format!(
            "\n\x1b[1mVerification:\x1b[0m {}/{} verified\n",
            report.verified(),
            report.verification.len()
        ));
        for record in &report.verification {
            let subject = match &record.subject {
                VerificationSubject::Item(id) => format!("asset {}", short_id(id.as_str())),
                VerificationSubject::Receipt(receipt) => {
                    format!("tx {}", short_id(receipt.as_str()))
                }
            };
            let mark = if record.verified {
                "\x1b[32m✓\x1b[0m"
            } else {
                "\x1b[31m✗\x1b[0m"
            };
            out.push_str(&format!(
                "  {} {} {} -> {}\n",
                mark,
                record.expected_name,
                subject,
                record.resolved_name.as_deref().unwrap_or("unknown")
            ));
        }
    }

    out
}

pub fn format_assets(owner: &str, assets: &[Asset]) -> String {
    if assets.is_empty() {
        return format!("No compressed assets found for {}\n", owner);
    }
    let mut out = format!("\x1b[1m{} asset(s) owned by {}:\x1b[0m\n", assets.len(), owner);
    for asset in assets {
        out.push_str(&format!(
            "  {}  {}",
            asset.id,
            asset.name.as_deref().unwrap_or("<unnamed>")
        ));
        if let Some(collection) = &asset.collection {
            out.push_str(&format!("  [collection {}]", short_id(collection)));
        }
        out.push('\n');
    }
    out
}
