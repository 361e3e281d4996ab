use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result, bail};
use indicatif::MultiProgress;
use pintrace::process::decode::DecoderConfig;
use pintrace::process::encode::TraceWriter;
use pintrace::process::text::TextReader;

use super::command::{Cli, ConvertArgs, TraceFormat};
use super::progress::FrameProgress;
use super::session::run_session;
use crate::input::InputReader;
use crate::output::TraceOutput;

pub fn cmd_convert(args: &ConvertArgs, cli: &Cli, multi: Option<&MultiProgress>) -> Result<()> {
    let name = InputReader::describe(&args.input);
    let mut output = TraceOutput::create(args.output.as_deref(), args.to.extension())?;

    match args.to {
        TraceFormat::Text => {
            log::info!("Converting binary trace {name} to text");
            let progress = FrameProgress::new(multi, "Converting frames...")?;

            let (written, skipped) = binary_to_text(&args.input, &mut output, &progress)?;
            output.flush()?;

            log::info!("{name}: {written} records written, {skipped} malformed frames skipped");
            if cli.strict && skipped > 0 {
                bail!("{skipped} malformed frames in {name} (strict mode)");
            }
            Ok(())
        }
        TraceFormat::Binary => {
            log::info!("Converting text trace {name} to binary");
            let mut reader = TextReader::new(InputReader::new(&args.input)?);
            let mut writer = TraceWriter::new(output);

            // The line number is only known between reads.
            #[allow(clippy::while_let_on_iterator)]
            while let Some(record) = reader.next() {
                let record = record.with_context(|| {
                    format!("Failed to read {name} at line {}", reader.line_number() + 1)
                })?;
                writer.write_record(&record)?;
            }
            writer.flush()?;

            log::info!(
                "{name}: {} records written, {} lines skipped",
                writer.records_written(),
                reader.skipped()
            );
            if cli.strict && reader.skipped() > 0 {
                bail!("{} unparsable lines in {name} (strict mode)", reader.skipped());
            }
            Ok(())
        }
    }
}

/// Writes every legal frame of `input` as a text trace line.
///
/// The whole trace is listed without the validator's report window, so a
/// malformed frame only drops itself. Returns the records written and the
/// malformed frames skipped.
fn binary_to_text<W: Write>(
    input: &Path,
    output: &mut W,
    progress: &FrameProgress,
) -> Result<(u64, u64)> {
    let mut written = 0;
    let mut skipped = 0;

    run_session(input, DecoderConfig::summary(u64::MAX), progress, |frame| {
        match frame.record() {
            Some(record) => {
                writeln!(output, "{record}")?;
                written += 1;
            }
            None => {
                log::warn!("Skipping malformed frame {}: {frame}", frame.index);
                skipped += 1;
            }
        }
        Ok(())
    })?;

    Ok((written, skipped))
}
