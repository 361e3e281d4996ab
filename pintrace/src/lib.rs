#![doc = include_str!("../README.md")]
//!
//! ## Technical Overview
//!
//! Decoder for the binary memory-access traces written by a dynamic binary
//! instrumentation tool.
//!
//! ### Stream Organization
//!
//! A trace is a concatenation of 9-byte frames. There is no header, footer,
//! length prefix or padding, so the only framing signals are a clean end of
//! the source at a frame boundary and a source that ends inside a frame.
//!
//! ### Decoding Modes
//!
//! - **Summary**: list the first `N` frames without validating tags.
//! - **Validating**: accept legal frames silently; on the first malformed tag
//!   report it and a fixed window of following frames, then stop.
//!
//! ## Quick Start
//!
//! 1. Wrap any [`std::io::Read`] source in a [`process::decode::Decoder`]
//! 2. Iterate decoded frames; print the diagnostic ones
//! 3. Inspect the [`process::decode::SessionSummary`] for the termination reason
//!
//! ```rust
//! use pintrace::process::EXAMPLE_DATA;
//! use pintrace::process::decode::{Decoder, DecoderConfig};
//! use pintrace::structs::stats::AccessStats;
//!
//! let mut stats = AccessStats::default();
//! let summary = Decoder::new(EXAMPLE_DATA, DecoderConfig::default()).run(|frame| {
//!     if let Some(record) = frame.record() {
//!         stats.record(record);
//!     }
//! })?;
//!
//! assert_eq!(summary.frames, 4);
//! assert_eq!(stats.total_page_access(), 3);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

/// Framing, validation and transcoding of trace streams.
///
/// 1. **Framing** ([`process::frame`]): Pulls 9-byte frames from a byte source.
///
/// 2. **Decoding** ([`process::decode`]): Validates tags and drives the
///    reporting state machine.
///
/// 3. **Transcoding** ([`process::encode`], [`process::text`]): Binary and text
///    trace formats.
pub mod process;

/// Data structures of the trace format.
///
/// - **Records** ([`structs::record`]): Tags, records, raw frames, decode outcomes
/// - **Statistics** ([`structs::stats`]): Access statistics accumulator
pub mod structs;

/// Utility functions and supporting infrastructure.
///
/// - **Error Handling** ([`utils::errors`]): Error types
pub mod utils;
