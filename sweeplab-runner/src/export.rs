//! Report export: CSV tables per instrument plus one JSON document per sweep.
//!
//! Layout under the output directory:
//! - `report.json`: the full `SweepReport`
//! - `<instrument>/summary.csv`: one row per successful variant
//! - `<instrument>/ranking.csv`: the same rows ranked by total value
//! - `<instrument>/failures.csv`: failed runs and skipped draws
//! - `<instrument>/ledgers/<key>.csv`: trade ledger per variant
//! - `<instrument>/equity/<key>.csv`: equity curve per variant
//!
//! Money columns carry 2 decimals, units 8.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use sweeplab_core::domain::TradeRecord;

use crate::report::{
    GenerationSkip, InstrumentReport, RankedRow, RunFailure, SummaryRow, SweepReport,
};

const SUMMARY_COLUMNS: [&str; 12] = [
    "instrument",
    "variant",
    "kind",
    "rsi_buy",
    "rsi_sell",
    "final_cash_value",
    "reserve_accumulated",
    "total_value",
    "profit",
    "profit_pct",
    "trade_count",
    "parameters",
];

// ─── JSON export ────────────────────────────────────────────────────

pub fn export_json(report: &SweepReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize SweepReport to JSON")
}

pub fn import_json(json: &str) -> Result<SweepReport> {
    serde_json::from_str(json).context("failed to deserialize SweepReport from JSON")
}

// ─── CSV export ─────────────────────────────────────────────────────

fn summary_fields(row: &SummaryRow) -> Vec<String> {
    let level = |v: Option<f64>| v.map(|v| v.to_string()).unwrap_or_default();
    let parameters = row
        .parameters
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(";");
    vec![
        row.instrument.clone(),
        row.variant.clone(),
        row.kind.clone(),
        level(row.rsi_buy),
        level(row.rsi_sell),
        format!("{:.2}", row.final_cash_value),
        format!("{:.2}", row.reserve_accumulated),
        format!("{:.2}", row.total_value),
        format!("{:.2}", row.profit),
        format!("{:.2}", row.profit_pct),
        row.trade_count.to_string(),
        parameters,
    ]
}

fn finish(wtr: csv::Writer<Vec<u8>>) -> Result<String> {
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

pub fn export_summary_csv(rows: &[SummaryRow]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(SUMMARY_COLUMNS)?;
    for row in rows {
        wtr.write_record(summary_fields(row))?;
    }
    finish(wtr)
}

pub fn export_ranking_csv(rows: &[RankedRow]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(std::iter::once("rank").chain(SUMMARY_COLUMNS))?;
    for ranked in rows {
        let mut fields = vec![ranked.rank.to_string()];
        fields.extend(summary_fields(&ranked.row));
        wtr.write_record(fields)?;
    }
    finish(wtr)
}

/// Trade ledger. Tax and reserve are left blank on buys.
pub fn export_ledger_csv(trades: &[TradeRecord]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "timestamp",
        "bar_index",
        "kind",
        "price",
        "units_after",
        "cash_after",
        "tax_paid",
        "reserve_portion",
        "reason",
    ])?;
    for t in trades {
        let (tax, reserve) = if t.is_sell() {
            (format!("{:.2}", t.tax_paid), format!("{:.2}", t.reserve_portion))
        } else {
            (String::new(), String::new())
        };
        wtr.write_record([
            t.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            t.bar_index.to_string(),
            t.kind.to_string(),
            format!("{:.2}", t.price),
            format!("{:.8}", t.units_after),
            format!("{:.2}", t.cash_after),
            tax,
            reserve,
            t.reason.clone(),
        ])?;
    }
    finish(wtr)
}

pub fn export_equity_csv(equity_curve: &[f64]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["bar_index", "equity"])?;
    for (i, eq) in equity_curve.iter().enumerate() {
        wtr.write_record([i.to_string(), format!("{eq:.2}")])?;
    }
    finish(wtr)
}

/// Failed runs, then skipped Monte Carlo draws (kind `skipped`).
pub fn export_failures_csv(failures: &[RunFailure], skips: &[GenerationSkip]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["variant", "kind", "message"])?;
    for f in failures {
        wtr.write_record([f.variant.clone(), f.kind.to_string(), f.message.clone()])?;
    }
    for s in skips {
        wtr.write_record([
            format!("RSI_MC_{}", s.index),
            "skipped".to_string(),
            s.reason.clone(),
        ])?;
    }
    finish(wtr)
}

// ─── Artifact bundle ────────────────────────────────────────────────

fn write(path: PathBuf, contents: &str, written: &mut Vec<PathBuf>) -> Result<()> {
    std::fs::write(&path, contents).with_context(|| format!("failed to write {}", path.display()))?;
    written.push(path);
    Ok(())
}

fn create_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create directory {}", dir.display()))
}

fn save_instrument(report: &InstrumentReport, dir: &Path, written: &mut Vec<PathBuf>) -> Result<()> {
    let ledgers = dir.join("ledgers");
    let equity = dir.join("equity");
    create_dir(&ledgers)?;
    create_dir(&equity)?;

    write(dir.join("summary.csv"), &export_summary_csv(&report.summaries)?, written)?;
    write(dir.join("ranking.csv"), &export_ranking_csv(&report.ranking)?, written)?;
    write(
        dir.join("failures.csv"),
        &export_failures_csv(&report.failures, &report.skips)?,
        written,
    )?;
    for run in &report.runs {
        let file = format!("{}.csv", run.sheet_key);
        write(ledgers.join(&file), &export_ledger_csv(&run.ledger)?, written)?;
        write(equity.join(&file), &export_equity_csv(&run.equity_curve)?, written)?;
    }
    Ok(())
}

/// Write the full artifact set for a sweep. Returns every file written.
pub fn save_report(report: &SweepReport, output_dir: &Path) -> Result<Vec<PathBuf>> {
    create_dir(output_dir)?;
    let mut written = Vec::new();
    for instrument in &report.instruments {
        save_instrument(instrument, &output_dir.join(&instrument.instrument), &mut written)?;
    }
    write(output_dir.join("report.json"), &export_json(report)?, &mut written)?;
    Ok(written)
}

/// Load a `SweepReport` from an output directory's report.json.
pub fn load_report(dir: &Path) -> Result<SweepReport> {
    let path = dir.join("report.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}
