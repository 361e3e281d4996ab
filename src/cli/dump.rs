use std::io::{self, Write};

use anyhow::Result;
use pintrace::process::decode::DecoderConfig;

use super::command::{Cli, DumpArgs};
use super::progress::FrameProgress;
use super::session::run_session;
use crate::input::InputReader;

pub fn cmd_dump(args: &DumpArgs, _cli: &Cli) -> Result<()> {
    log::info!(
        "Listing up to {} frames of {}",
        args.count,
        InputReader::describe(&args.input)
    );

    let mut out = io::stdout().lock();
    let progress = FrameProgress::new(None, "")?;

    run_session(
        &args.input,
        DecoderConfig::summary(args.count),
        &progress,
        |frame| Ok(writeln!(out, "{frame}")?),
    )?;

    out.flush()?;
    Ok(())
}
