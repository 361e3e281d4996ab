#[derive(thiserror::Error, Debug)]
pub enum DecodeError {
    #[error(
        "Truncated frame {frame} at byte offset {offset}: source ended with {available} of 8 address bytes"
    )]
    Truncated {
        frame: u64,
        offset: u64,
        available: usize,
    },

    #[error("Failed to read trace: {0}")]
    Io(#[from] std::io::Error),
}

impl DecodeError {
    pub fn is_truncated(&self) -> bool {
        matches!(self, DecodeError::Truncated { .. })
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum TextError {
    #[error("Missing access tag")]
    MissingTag,

    #[error("Unknown access tag {0:?}, expected I, W or R")]
    UnknownTag(String),

    #[error("Missing address")]
    MissingAddress,

    #[error("Address {0:?} is not 0x-prefixed")]
    BadPrefix(String),

    #[error("Address {0:?} is not a 64-bit hexadecimal value")]
    BadAddress(String),

    #[error("Unexpected input after address: {0:?}")]
    TrailingInput(String),
}
