use std::io::{self, Write};

use anyhow::Result;
use indicatif::MultiProgress;
use pintrace::process::decode::{DecoderConfig, SessionSummary, Termination};

use super::command::{Cli, ValidateArgs};
use super::progress::FrameProgress;
use super::session::{check_strict, run_session};
use crate::input::InputReader;

pub fn cmd_validate(args: &ValidateArgs, cli: &Cli, multi: Option<&MultiProgress>) -> Result<()> {
    log::info!(
        "Validating {} (report window {})",
        InputReader::describe(&args.input),
        args.window
    );

    let progress = FrameProgress::new(multi, "Validating frames...")?;
    let mut out = io::stdout();

    let summary = run_session(
        &args.input,
        DecoderConfig::validating(args.window),
        &progress,
        |frame| {
            if frame.is_diagnostic() {
                progress.suspend(|| writeln!(out, "{frame}"))?;
            }
            Ok(())
        },
    )?;

    print_summary(&mut out, &summary)?;
    check_strict(cli, &summary)
}

fn print_summary<W: Write>(out: &mut W, summary: &SessionSummary) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "Validation Summary")?;
    writeln!(out, "  Frames processed          {}", summary.frames)?;
    writeln!(
        out,
        "  Termination               {}",
        summary.termination.unwrap_or(Termination::Cancelled)
    )?;
    match summary.first_malformed {
        Some(malformed) => writeln!(
            out,
            "  First malformed frame     {} (tag {:#04x})",
            malformed.index, malformed.tag
        ),
        None => writeln!(out, "  First malformed frame     none"),
    }
}
