use std::fmt;
use std::str::FromStr;

use crate::utils::errors::TextError;

/// Number of address bytes following the tag byte.
pub const ADDRESS_SIZE: usize = 8;

/// Size of one frame on the wire.
pub const FRAME_SIZE: usize = 1 + ADDRESS_SIZE;

/// Memory operation recorded by a trace frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TraceTag {
    /// Instruction fetch (`I`).
    Instruction,
    /// Memory write (`W`).
    Write,
    /// Memory read (`R`).
    Read,
}

impl TraceTag {
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'I' => Some(TraceTag::Instruction),
            b'W' => Some(TraceTag::Write),
            b'R' => Some(TraceTag::Read),
            _ => None,
        }
    }

    pub const fn as_byte(self) -> u8 {
        match self {
            TraceTag::Instruction => b'I',
            TraceTag::Write => b'W',
            TraceTag::Read => b'R',
        }
    }
}

impl TryFrom<u8> for TraceTag {
    type Error = u8;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        TraceTag::from_byte(byte).ok_or(byte)
    }
}

impl fmt::Display for TraceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_byte() as char)
    }
}

/// A well-formed memory access.
///
/// The [`Display`](fmt::Display) and [`FromStr`] implementations use the
/// line-oriented text trace format, `<tag> 0x<hex address>`:
///
/// ```rust
/// use pintrace::structs::record::{TraceRecord, TraceTag};
///
/// let record: TraceRecord = "W 0x7ffd0010".parse()?;
/// assert_eq!(record, TraceRecord::new(TraceTag::Write, 0x7ffd_0010));
/// assert_eq!(record.to_string(), "W 0x7ffd0010");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TraceRecord {
    pub tag: TraceTag,
    pub address: u64,
}

impl TraceRecord {
    pub const fn new(tag: TraceTag, address: u64) -> Self {
        Self { tag, address }
    }

    /// Encodes the record in the binary wire format.
    pub fn to_bytes(&self) -> [u8; FRAME_SIZE] {
        let mut bytes = [0u8; FRAME_SIZE];
        bytes[0] = self.tag.as_byte();
        bytes[1..].copy_from_slice(&self.address.to_le_bytes());
        bytes
    }
}

impl fmt::Display for TraceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:#x}", self.tag, self.address)
    }
}

impl FromStr for TraceRecord {
    type Err = TextError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut fields = line.split_whitespace();

        let tag_field = fields.next().ok_or(TextError::MissingTag)?;
        let mut tag_chars = tag_field.chars();
        let tag = match (tag_chars.next(), tag_chars.next()) {
            (Some(c), None) if c.is_ascii() => TraceTag::from_byte(c as u8),
            _ => None,
        }
        .ok_or_else(|| TextError::UnknownTag(tag_field.to_string()))?;

        let address_field = fields.next().ok_or(TextError::MissingAddress)?;
        let hex = address_field
            .strip_prefix("0x")
            .or_else(|| address_field.strip_prefix("0X"))
            .ok_or_else(|| TextError::BadPrefix(address_field.to_string()))?;
        // from_str_radix alone would also take a sign
        if hex.is_empty() || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(TextError::BadAddress(address_field.to_string()));
        }
        let address = u64::from_str_radix(hex, 16)
            .map_err(|_| TextError::BadAddress(address_field.to_string()))?;

        if let Some(rest) = fields.next() {
            return Err(TextError::TrailingInput(rest.to_string()));
        }

        Ok(Self { tag, address })
    }
}

/// One 9-byte unit as read from the byte source, before tag validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawFrame {
    bytes: [u8; FRAME_SIZE],
}

impl RawFrame {
    pub const fn new(bytes: [u8; FRAME_SIZE]) -> Self {
        Self { bytes }
    }

    pub const fn tag_byte(&self) -> u8 {
        self.bytes[0]
    }

    /// Address bytes interpreted as little-endian, whatever the tag byte is.
    pub fn address(&self) -> u64 {
        let mut address = [0u8; ADDRESS_SIZE];
        address.copy_from_slice(&self.bytes[1..]);
        u64::from_le_bytes(address)
    }

    pub fn outcome(&self) -> DecodeOutcome {
        let address = self.address();
        match TraceTag::from_byte(self.tag_byte()) {
            Some(tag) => DecodeOutcome::Record(TraceRecord { tag, address }),
            None => DecodeOutcome::Malformed {
                tag: self.tag_byte(),
                address,
            },
        }
    }
}

/// Tag classification of a complete frame.
///
/// End of stream and truncated frames never reach classification; they are
/// reported by the frame reader as [`FrameRead`](crate::process::frame::FrameRead)
/// and surface from the decoder as the end of iteration and
/// [`DecodeError::Truncated`](crate::utils::errors::DecodeError::Truncated).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeOutcome {
    /// Legal tag.
    Record(TraceRecord),
    /// Tag byte outside `I`/`W`/`R`. The address is still decoded for display.
    Malformed { tag: u8, address: u64 },
}

impl DecodeOutcome {
    pub fn record(&self) -> Option<&TraceRecord> {
        match self {
            DecodeOutcome::Record(record) => Some(record),
            DecodeOutcome::Malformed { .. } => None,
        }
    }

    pub fn tag_byte(&self) -> u8 {
        match self {
            DecodeOutcome::Record(record) => record.tag.as_byte(),
            DecodeOutcome::Malformed { tag, .. } => *tag,
        }
    }

    pub fn address(&self) -> u64 {
        match self {
            DecodeOutcome::Record(record) => record.address,
            DecodeOutcome::Malformed { address, .. } => *address,
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, DecodeOutcome::Malformed { .. })
    }
}
