use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use pintrace::process::decode::{DecodedFrame, Decoder, DecoderConfig, SessionSummary};

use super::command::Cli;
use super::progress::FrameProgress;
use crate::input::InputReader;
use crate::timestamp::elapsed_str;

/// Decodes `input` to the end of the session, handing every frame to `on_frame`.
///
/// A truncated trace or a failing source is returned as an error naming the
/// input; every other termination yields the session summary.
pub fn run_session<F>(
    input: &Path,
    config: DecoderConfig,
    progress: &FrameProgress,
    mut on_frame: F,
) -> Result<SessionSummary>
where
    F: FnMut(&DecodedFrame) -> Result<()>,
{
    let name = InputReader::describe(input);
    let reader = InputReader::new(input)?;
    if reader.is_pipe() {
        log::debug!("Reading trace from standard input");
    }

    let start = Instant::now();
    let mut decoder = Decoder::new(reader, config);

    for frame in decoder.by_ref() {
        let frame = frame.with_context(|| format!("Failed to decode {name}"))?;
        progress.update(frame.index);
        on_frame(&frame)?;
    }

    let bytes = decoder.position();
    let summary = decoder.finish();
    progress.finish();

    log::info!(
        "{name}: {} frames ({bytes} bytes) in {}, {}",
        summary.frames,
        elapsed_str(start.elapsed()),
        summary
            .termination
            .map_or_else(|| "running".to_string(), |t| t.to_string())
    );

    Ok(summary)
}

/// Fails in strict mode when the session saw a malformed frame.
pub fn check_strict(cli: &Cli, summary: &SessionSummary) -> Result<()> {
    if let (true, Some(malformed)) = (cli.strict, summary.first_malformed) {
        bail!(
            "Malformed tag {:#04x} at frame {} (strict mode)",
            malformed.tag,
            malformed.index
        );
    }
    Ok(())
}
