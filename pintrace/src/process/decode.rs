use std::fmt;
use std::iter::FusedIterator;

use log::{debug, error, trace, warn};

use crate::process::frame::{ByteSource, FrameRead, FrameReader};
use crate::structs::record::{DecodeOutcome, TraceRecord};
use crate::utils::errors::DecodeError;

/// Frames echoed after the first malformed frame unless configured otherwise.
pub const DEFAULT_REPORT_WINDOW: u32 = 5;

/// How a [`Decoder`] treats the frames it reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// List up to `max_records` frames without validating tags.
    Summary { max_records: u64 },
    /// Accept legal frames silently. The first malformed frame and the
    /// `report_window` frames after it are reported, then decoding halts.
    Validating { report_window: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderConfig {
    pub mode: Mode,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self::validating(DEFAULT_REPORT_WINDOW)
    }
}

impl DecoderConfig {
    pub const fn summary(max_records: u64) -> Self {
        Self {
            mode: Mode::Summary { max_records },
        }
    }

    pub const fn validating(report_window: u32) -> Self {
        Self {
            mode: Mode::Validating { report_window },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Scanning,
    Reporting,
    Terminated,
}

/// Why a decode session stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The source ended on a frame boundary.
    Clean,
    /// The source ended inside a frame.
    Truncated,
    /// The report window after a malformed frame was used up.
    ReportWindowExhausted,
    /// Summary mode listed the configured number of frames.
    RecordLimitReached,
    /// The source failed with an I/O error.
    IoError,
    /// The caller finished the session before it terminated on its own.
    Cancelled,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Termination::Clean => "clean",
            Termination::Truncated => "truncated",
            Termination::ReportWindowExhausted => "report-window-exhausted",
            Termination::RecordLimitReached => "record-limit-reached",
            Termination::IoError => "io-error",
            Termination::Cancelled => "cancelled",
        };
        f.write_str(reason)
    }
}

/// The frame that switched a validating session into reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MalformedFrame {
    /// 1-based frame index.
    pub index: u64,
    pub tag: u8,
    pub address: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSummary {
    /// Complete frames read from the source.
    pub frames: u64,
    /// `None` while the session is still running.
    pub termination: Option<Termination>,
    pub first_malformed: Option<MalformedFrame>,
}

/// What the decoder did with a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Legal frame accepted silently while scanning.
    Accepted,
    /// Frame listed in summary mode.
    Listed,
    /// First malformed frame. Reporting starts here.
    Detected,
    /// Frame echoed inside the report window. `remaining` frames are left
    /// in the window after this one.
    Reported { remaining: u32 },
}

/// A frame handed to the caller together with its 1-based index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedFrame {
    pub index: u64,
    pub outcome: DecodeOutcome,
    pub disposition: Disposition,
}

impl DecodedFrame {
    pub fn record(&self) -> Option<&TraceRecord> {
        self.outcome.record()
    }

    /// Whether this frame belongs in the diagnostic output of a validating
    /// session.
    pub fn is_diagnostic(&self) -> bool {
        matches!(
            self.disposition,
            Disposition::Detected | Disposition::Reported { .. }
        )
    }
}

/// Renders the frame the way the decoder reports it: listed frames in the
/// text trace format, diagnostics with index, raw tag byte and address.
///
/// A malformed frame listed in summary mode keeps its escaped raw tag, as in
/// `\x01 0x1008`. Such a line is not a valid text trace record and
/// [`TextReader`](crate::process::text::TextReader) skips it.
impl fmt::Display for DecodedFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = self.outcome.tag_byte();
        let address = self.outcome.address();

        match self.disposition {
            Disposition::Accepted | Disposition::Listed => match self.outcome.record() {
                Some(record) => write!(f, "{record}"),
                None => write!(f, "{} {address:#x}", tag.escape_ascii()),
            },
            Disposition::Detected => write!(
                f,
                "frame {}: malformed tag {tag:#04x} ('{}') at address {address:#018x}",
                self.index,
                tag.escape_ascii()
            ),
            Disposition::Reported { .. } => write!(
                f,
                "frame {}: tag {tag:#04x} ('{}') address {address:#018x}",
                self.index,
                tag.escape_ascii()
            ),
        }
    }
}

/// Streaming decoder over a trace byte source.
///
/// The decoder is an [`Iterator`] of decoded frames. It reads one frame per
/// call to `next`, so a caller that stops iterating stops reading. Once the
/// session terminates the iterator is fused.
///
/// A truncated trace is yielded once as [`DecodeError::Truncated`]; reaching
/// the end of the source on a frame boundary simply ends the iteration.
/// Either way [`summary`](Decoder::summary) tells the two apart afterwards.
///
/// # Example
///
/// ```rust
/// use pintrace::process::decode::{Decoder, DecoderConfig, Disposition, Termination};
///
/// // Third frame carries the illegal tag `X`.
/// let mut trace = Vec::new();
/// for tag in *b"IRXWWWWWWW" {
///     trace.push(tag);
///     trace.extend_from_slice(&0x1000u64.to_le_bytes());
/// }
///
/// let mut decoder = Decoder::new(trace.as_slice(), DecoderConfig::validating(2));
/// let reported = decoder
///     .by_ref()
///     .filter_map(Result::ok)
///     .filter(|frame| frame.is_diagnostic())
///     .map(|frame| frame.index)
///     .collect::<Vec<_>>();
/// assert_eq!(reported, [3, 4, 5]);
///
/// let summary = decoder.finish();
/// assert_eq!(summary.frames, 5);
/// assert_eq!(summary.termination, Some(Termination::ReportWindowExhausted));
/// ```
#[derive(Debug)]
pub struct Decoder<S> {
    reader: FrameReader<S>,
    config: DecoderConfig,
    state: State,
    /// -1 outside of reporting, otherwise frames left in the report window.
    countdown: i64,
    frames: u64,
    first_malformed: Option<MalformedFrame>,
    termination: Option<Termination>,
}

impl<S: ByteSource> Decoder<S> {
    pub fn new(source: S, config: DecoderConfig) -> Self {
        Self::with_reader(FrameReader::new(source), config)
    }

    pub fn with_reader(reader: FrameReader<S>, config: DecoderConfig) -> Self {
        let mut decoder = Self {
            reader,
            config,
            state: State::Scanning,
            countdown: -1,
            frames: 0,
            first_malformed: None,
            termination: None,
        };

        debug!("Starting decode session: {:?}", config.mode);
        if config.mode == (Mode::Summary { max_records: 0 }) {
            decoder.terminate(Termination::RecordLimitReached);
        }

        decoder
    }

    /// Bytes consumed from the source so far.
    pub fn position(&self) -> u64 {
        self.reader.position()
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            frames: self.frames,
            termination: self.termination,
            first_malformed: self.first_malformed,
        }
    }

    /// Ends the session and releases the source.
    ///
    /// A session that had not terminated on its own is reported as
    /// [`Termination::Cancelled`].
    pub fn finish(mut self) -> SessionSummary {
        if self.state != State::Terminated {
            self.terminate(Termination::Cancelled);
        }
        self.summary()
    }

    /// Drives the session to its end, handing every decoded frame to `f`.
    pub fn run<F>(mut self, mut f: F) -> Result<SessionSummary, DecodeError>
    where
        F: FnMut(&DecodedFrame),
    {
        for frame in self.by_ref() {
            f(&frame?);
        }
        Ok(self.finish())
    }

    fn terminate(&mut self, reason: Termination) {
        debug!(
            "Decode session terminated ({reason}) after {} frames, {} bytes",
            self.frames,
            self.reader.position()
        );
        self.state = State::Terminated;
        self.countdown = -1;
        self.termination = Some(reason);
    }

    fn classify(&mut self, index: u64, outcome: DecodeOutcome) -> Disposition {
        let report_window = match self.config.mode {
            Mode::Summary { max_records } => {
                if index >= max_records {
                    self.terminate(Termination::RecordLimitReached);
                }
                return Disposition::Listed;
            }
            Mode::Validating { report_window } => report_window,
        };

        match (self.state, outcome) {
            (State::Scanning, DecodeOutcome::Malformed { tag, address }) => {
                warn!(
                    "Malformed tag {tag:#04x} at frame {index}, reporting the next {report_window} frames"
                );
                self.first_malformed = Some(MalformedFrame {
                    index,
                    tag,
                    address,
                });

                if report_window == 0 {
                    self.terminate(Termination::ReportWindowExhausted);
                } else {
                    debug!("Entering reporting state");
                    self.state = State::Reporting;
                    self.countdown = i64::from(report_window);
                }
                Disposition::Detected
            }
            (State::Reporting, _) => {
                self.countdown -= 1;
                let remaining = self.countdown as u32;
                if self.countdown == 0 {
                    self.terminate(Termination::ReportWindowExhausted);
                }
                Disposition::Reported { remaining }
            }
            _ => {
                trace!("Accepted frame {index}: {outcome:?}");
                Disposition::Accepted
            }
        }
    }
}

impl<S: ByteSource> Iterator for Decoder<S> {
    type Item = Result<DecodedFrame, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.state == State::Terminated {
            return None;
        }

        let frame = match self.reader.next_frame() {
            Ok(FrameRead::Frame(frame)) => frame,
            Ok(FrameRead::EndOfStream) => {
                self.terminate(Termination::Clean);
                return None;
            }
            Ok(FrameRead::Truncated { offset, available }) => {
                let err = DecodeError::Truncated {
                    frame: self.frames + 1,
                    offset,
                    available,
                };
                error!("{err}");
                self.terminate(Termination::Truncated);
                return Some(Err(err));
            }
            Err(e) => {
                error!("Read failed after {} frames: {e}", self.frames);
                self.terminate(Termination::IoError);
                return Some(Err(e.into()));
            }
        };

        self.frames += 1;
        let index = self.frames;
        let outcome = frame.outcome();
        let disposition = self.classify(index, outcome);

        Some(Ok(DecodedFrame {
            index,
            outcome,
            disposition,
        }))
    }
}

impl<S: ByteSource> FusedIterator for Decoder<S> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::EXAMPLE_DATA;
    use crate::process::text::TextReader;
    use crate::structs::record::{FRAME_SIZE, TraceTag};
    use anyhow::Result;

    fn trace(tags: &[u8]) -> Vec<u8> {
        tags.iter()
            .enumerate()
            .flat_map(|(i, &tag)| {
                let mut frame = vec![tag];
                frame.extend_from_slice(&(0x1000 + i as u64 * 8).to_le_bytes());
                frame
            })
            .collect()
    }

    fn collect<S: ByteSource>(
        decoder: &mut Decoder<S>,
    ) -> (Vec<DecodedFrame>, Option<DecodeError>) {
        let mut frames = Vec::new();
        for result in decoder.by_ref() {
            match result {
                Ok(frame) => frames.push(frame),
                Err(e) => return (frames, Some(e)),
            }
        }
        (frames, None)
    }

    fn diagnostics(frames: &[DecodedFrame]) -> Vec<u64> {
        frames
            .iter()
            .filter(|frame| frame.is_diagnostic())
            .map(|frame| frame.index)
            .collect()
    }

    #[test]
    fn single_instruction_frame() {
        let data = [0x49, 1, 0, 0, 0, 0, 0, 0, 0];
        let mut decoder = Decoder::new(&data[..], DecoderConfig::default());

        let (frames, err) = collect(&mut decoder);
        assert!(err.is_none());
        assert_eq!(frames.len(), 1);
        assert_eq!(
            frames[0].outcome,
            DecodeOutcome::Record(TraceRecord::new(TraceTag::Instruction, 1))
        );
        assert_eq!(frames[0].disposition, Disposition::Accepted);

        let summary = decoder.finish();
        assert_eq!(summary.frames, 1);
        assert_eq!(summary.termination, Some(Termination::Clean));
        assert_eq!(summary.first_malformed, None);
    }

    #[test]
    fn legal_trace_has_no_diagnostics() {
        let data = trace(b"IRWWRIIRWI");
        let mut decoder = Decoder::new(data.as_slice(), DecoderConfig::default());

        let (frames, err) = collect(&mut decoder);
        assert!(err.is_none());
        assert_eq!(frames.len(), data.len() / FRAME_SIZE);
        assert!(diagnostics(&frames).is_empty());
        assert_eq!(decoder.summary().termination, Some(Termination::Clean));
    }

    #[test]
    fn every_prefix_length() {
        let data = trace(b"IRWIRWIRW");
        for len in 0..=data.len() {
            let mut decoder = Decoder::new(&data[..len], DecoderConfig::default());
            let (frames, err) = collect(&mut decoder);
            assert_eq!(frames.len(), len / FRAME_SIZE);

            let summary = decoder.finish();
            if len % FRAME_SIZE == 0 {
                assert!(err.is_none());
                assert_eq!(summary.termination, Some(Termination::Clean));
            } else {
                assert!(err.is_some_and(|e| e.is_truncated()));
                assert_eq!(summary.termination, Some(Termination::Truncated));
            }
        }
    }

    #[test]
    fn malformed_then_end_of_stream() {
        let mut data = trace(b"X");
        data[1..].fill(0);
        let mut decoder = Decoder::new(data.as_slice(), DecoderConfig::default());

        let (frames, err) = collect(&mut decoder);
        assert!(err.is_none());
        assert_eq!(diagnostics(&frames), [1]);
        assert_eq!(frames[0].disposition, Disposition::Detected);

        let summary = decoder.finish();
        assert_eq!(summary.frames, 1);
        assert_eq!(summary.termination, Some(Termination::Clean));
        assert_eq!(
            summary.first_malformed,
            Some(MalformedFrame {
                index: 1,
                tag: b'X',
                address: 0
            })
        );
    }

    #[test]
    fn tag_byte_only_is_truncated() {
        let data = [0x49];
        let mut decoder = Decoder::new(&data[..], DecoderConfig::default());

        let (frames, err) = collect(&mut decoder);
        assert!(frames.is_empty());
        assert!(matches!(
            err,
            Some(DecodeError::Truncated {
                frame: 1,
                offset: 0,
                available: 0
            })
        ));
        assert!(decoder.next().is_none());

        let summary = decoder.finish();
        assert_eq!(summary.frames, 0);
        assert_eq!(summary.termination, Some(Termination::Truncated));
    }

    #[test]
    fn report_window_is_fixed_at_detection() {
        // Frame 3 is malformed, ten legal frames follow.
        let data = trace(b"IIXRRRRRRRRRR");
        let mut decoder = Decoder::new(data.as_slice(), DecoderConfig::validating(5));

        let (frames, err) = collect(&mut decoder);
        assert!(err.is_none());
        assert_eq!(diagnostics(&frames), [3, 4, 5, 6, 7, 8]);
        assert_eq!(
            frames.last().map(|frame| frame.disposition),
            Some(Disposition::Reported { remaining: 0 })
        );

        let summary = decoder.summary();
        assert_eq!(summary.frames, 8);
        assert_eq!(
            summary.termination,
            Some(Termination::ReportWindowExhausted)
        );
        assert_eq!(decoder.position(), 8 * FRAME_SIZE as u64);
    }

    #[test]
    fn consecutive_malformed_frames_do_not_extend_window() {
        let data = trace(b"XXXXXXXXXX");
        let mut decoder = Decoder::new(data.as_slice(), DecoderConfig::validating(3));

        let (frames, _) = collect(&mut decoder);
        assert_eq!(diagnostics(&frames), [1, 2, 3, 4]);
        assert_eq!(
            decoder.summary().first_malformed.map(|m| m.index),
            Some(1)
        );
        assert_eq!(
            decoder.summary().termination,
            Some(Termination::ReportWindowExhausted)
        );
    }

    #[test]
    fn stream_ends_inside_window() {
        let data = trace(b"IXRW");
        let mut decoder = Decoder::new(data.as_slice(), DecoderConfig::validating(5));

        let (frames, err) = collect(&mut decoder);
        assert!(err.is_none());
        assert_eq!(diagnostics(&frames), [2, 3, 4]);
        assert_eq!(decoder.summary().termination, Some(Termination::Clean));
    }

    #[test]
    fn truncation_inside_window_is_still_fatal() {
        let mut data = trace(b"XRW");
        data.extend_from_slice(&[b'R', 0xff, 0xff]);
        let mut decoder = Decoder::new(data.as_slice(), DecoderConfig::validating(5));

        let (frames, err) = collect(&mut decoder);
        assert_eq!(diagnostics(&frames), [1, 2, 3]);
        match err {
            Some(DecodeError::Truncated {
                frame,
                offset,
                available,
            }) => {
                assert_eq!(frame, 4);
                assert_eq!(offset, 27);
                assert_eq!(available, 2);
            }
            other => panic!("expected truncation, got {other:?}"),
        }
        assert_eq!(decoder.summary().termination, Some(Termination::Truncated));
    }

    #[test]
    fn zero_window_stops_at_detection() {
        let data = trace(b"IXII");
        let mut decoder = Decoder::new(data.as_slice(), DecoderConfig::validating(0));

        let (frames, _) = collect(&mut decoder);
        assert_eq!(diagnostics(&frames), [2]);
        assert_eq!(decoder.summary().frames, 2);
        assert_eq!(
            decoder.summary().termination,
            Some(Termination::ReportWindowExhausted)
        );
    }

    #[test]
    fn window_counts_remaining_frames() {
        let data = trace(b"XIIII");
        let mut decoder = Decoder::new(data.as_slice(), DecoderConfig::validating(3));

        let (frames, _) = collect(&mut decoder);
        let remaining = frames
            .iter()
            .filter_map(|frame| match frame.disposition {
                Disposition::Reported { remaining } => Some(remaining),
                _ => None,
            })
            .collect::<Vec<_>>();
        assert_eq!(remaining, [2, 1, 0]);
    }

    #[test]
    fn summary_mode_lists_without_validation() {
        let data = trace(b"IX\0W");
        let mut decoder = Decoder::new(data.as_slice(), DecoderConfig::summary(3));

        let (frames, err) = collect(&mut decoder);
        assert!(err.is_none());
        assert_eq!(frames.len(), 3);
        assert!(
            frames
                .iter()
                .all(|frame| frame.disposition == Disposition::Listed)
        );
        assert!(frames[1].outcome.is_malformed());

        let summary = decoder.finish();
        assert_eq!(summary.frames, 3);
        assert_eq!(summary.termination, Some(Termination::RecordLimitReached));
        assert_eq!(summary.first_malformed, None);
    }

    #[test]
    fn summary_mode_stops_early_at_end_of_stream() {
        let mut decoder = Decoder::new(EXAMPLE_DATA, DecoderConfig::summary(100));
        let (frames, err) = collect(&mut decoder);
        assert!(err.is_none());
        assert_eq!(frames.len(), EXAMPLE_DATA.len() / FRAME_SIZE);
        assert_eq!(decoder.summary().termination, Some(Termination::Clean));
    }

    #[test]
    fn summary_mode_zero_reads_nothing() {
        let mut decoder = Decoder::new(EXAMPLE_DATA, DecoderConfig::summary(0));
        assert!(decoder.next().is_none());
        assert_eq!(decoder.position(), 0);
        assert_eq!(
            decoder.summary().termination,
            Some(Termination::RecordLimitReached)
        );
    }

    #[test]
    fn summary_mode_truncation_is_fatal() {
        let data = &EXAMPLE_DATA[..FRAME_SIZE + 4];
        let mut decoder = Decoder::new(data, DecoderConfig::summary(4));
        let (frames, err) = collect(&mut decoder);
        assert_eq!(frames.len(), 1);
        assert!(err.is_some_and(|e| e.is_truncated()));
    }

    #[test]
    fn finish_before_end_is_cancelled() -> Result<()> {
        let mut decoder = Decoder::new(EXAMPLE_DATA, DecoderConfig::default());
        decoder.next().transpose()?;
        let summary = decoder.finish();
        assert_eq!(summary.frames, 1);
        assert_eq!(summary.termination, Some(Termination::Cancelled));
        Ok(())
    }

    #[test]
    fn run_visits_every_frame() -> Result<()> {
        let mut seen = 0;
        let summary = Decoder::new(EXAMPLE_DATA, DecoderConfig::default()).run(|_| seen += 1)?;
        assert_eq!(seen, EXAMPLE_DATA.len() / FRAME_SIZE);
        assert_eq!(summary.termination, Some(Termination::Clean));
        Ok(())
    }

    #[test]
    fn diagnostic_lines() {
        let mut data = trace(b"XI");
        data[1..9].copy_from_slice(&0xffu64.to_le_bytes());
        let frames = Decoder::new(data.as_slice(), DecoderConfig::default())
            .collect::<Result<Vec<_>, _>>()
            .unwrap();

        assert_eq!(
            frames[0].to_string(),
            "frame 1: malformed tag 0x58 ('X') at address 0x00000000000000ff"
        );
        assert_eq!(
            frames[1].to_string(),
            "frame 2: tag 0x49 ('I') address 0x0000000000001008"
        );
    }

    #[test]
    fn listed_lines_use_text_format() {
        let data = trace(b"R\x01");
        let frames = Decoder::new(data.as_slice(), DecoderConfig::summary(2))
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(frames[0].to_string(), "R 0x1000");
        assert_eq!(frames[1].to_string(), "\\x01 0x1008");

        // only the legal frame survives a round trip through the text format
        let listing = format!("{}\n{}\n", frames[0], frames[1]);
        let mut reader = TextReader::new(listing.as_bytes());
        let records = reader.by_ref().collect::<Result<Vec<_>, _>>().unwrap();
        assert_eq!(records, vec![TraceRecord::new(TraceTag::Read, 0x1000)]);
        assert_eq!(reader.skipped(), 1);
    }
}
