use std::io::{self, Write};

use anyhow::Result;
use indicatif::MultiProgress;
use pintrace::process::decode::DecoderConfig;
use pintrace::structs::stats::AccessStats;
use serde::Serialize;

use super::command::{Cli, ReportFormat, StatsArgs};
use super::progress::FrameProgress;
use super::session::{check_strict, run_session};
use crate::input::InputReader;

pub fn cmd_stats(args: &StatsArgs, cli: &Cli, multi: Option<&MultiProgress>) -> Result<()> {
    log::info!(
        "Collecting access statistics of {}",
        InputReader::describe(&args.input)
    );

    let progress = FrameProgress::new(multi, "Collecting statistics...")?;
    let mut out = io::stdout();
    let mut stats = AccessStats::default();

    let summary = run_session(&args.input, DecoderConfig::default(), &progress, |frame| {
        if frame.is_diagnostic() {
            log::warn!("{frame}");
        }

        if let Some(record) = frame.record() {
            stats.record(record);
            if args.interval > 0 && stats.total_mem_access.is_multiple_of(args.interval) {
                let report = StatsReport::new(&stats);
                progress.suspend(|| write_report(&mut out, &report, args))?;
            }
        }
        Ok(())
    })?;

    write_report(&mut out, &StatsReport::new(&stats), args)?;
    if args.format == ReportFormat::Text {
        writeln!(out, "#eof")?;
    }

    check_strict(cli, &summary)
}

#[derive(Debug, Serialize)]
struct StatsReport {
    total_mem_access: u64,
    total_page_access: u64,
    instruction_fetches: u64,
    memory_reads: u64,
    memory_writes: u64,
    lowest_address: Option<String>,
    highest_address: Option<String>,
}

impl StatsReport {
    fn new(stats: &AccessStats) -> Self {
        Self {
            total_mem_access: stats.total_mem_access,
            total_page_access: stats.total_page_access(),
            instruction_fetches: stats.instructions,
            memory_reads: stats.reads,
            memory_writes: stats.writes,
            lowest_address: stats.lowest_address.map(|a| format!("{a:#x}")),
            highest_address: stats.highest_address.map(|a| format!("{a:#x}")),
        }
    }
}

fn write_report<W: Write>(out: &mut W, report: &StatsReport, args: &StatsArgs) -> Result<()> {
    match args.format {
        ReportFormat::Text => {
            let count = |n: u64| group_thousands(n, args.sep);
            let address = |a: &Option<String>| a.clone().unwrap_or_else(|| "none".to_string());

            writeln!(out, "total memory access: {}", count(report.total_mem_access))?;
            writeln!(out, "total page access: {}", count(report.total_page_access))?;
            writeln!(out, "instruction fetches: {}", count(report.instruction_fetches))?;
            writeln!(out, "memory reads: {}", count(report.memory_reads))?;
            writeln!(out, "memory writes: {}", count(report.memory_writes))?;
            writeln!(out, "lowest address: {}", address(&report.lowest_address))?;
            writeln!(out, "highest address: {}", address(&report.highest_address))?;
            writeln!(out)?;
        }
        ReportFormat::Yaml => {
            writeln!(out, "---")?;
            write!(out, "{}", serde_yaml_ng::to_string(report)?)?;
        }
    }
    Ok(())
}

/// Renders `n` with `,` between groups of three digits when `sep` is set.
fn group_thousands(n: u64, sep: bool) -> String {
    let digits = n.to_string();
    if !sep {
        return digits;
    }

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}
