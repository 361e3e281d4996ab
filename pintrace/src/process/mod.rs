/// Fixed-size framing over a byte source.
///
/// Provides the [`FrameReader`](frame::FrameReader), which assembles 9-byte
/// [`RawFrame`](crate::structs::record::RawFrame)s and reports end of stream
/// and truncated frames, and the [`ByteSource`](frame::ByteSource) capability
/// it reads from.
pub mod frame;

/// Tag validation and bounded error reporting.
///
/// Provides the [`Decoder`](decode::Decoder), an iterator of
/// [`DecodedFrame`](decode::DecodedFrame)s driven by a summary or
/// validating [`Mode`](decode::Mode).
pub mod decode;

/// Binary trace writing.
pub mod encode;

/// Line-oriented text trace reading.
pub mod text;

/// A short well-formed trace: an instruction fetch, a read, a write and a
/// second instruction fetch.
pub const EXAMPLE_DATA: &[u8] = &[
    0x49, 0x00, 0x10, 0x40, 0x00, 0x00, 0x00, 0x00, 0x00, // I 0x401000
    0x52, 0xF8, 0x0F, 0xFD, 0x7F, 0x00, 0x00, 0x00, 0x00, // R 0x7ffd0ff8
    0x57, 0x00, 0x10, 0xFD, 0x7F, 0x00, 0x00, 0x00, 0x00, // W 0x7ffd1000
    0x49, 0x04, 0x10, 0x40, 0x00, 0x00, 0x00, 0x00, 0x00, // I 0x401004
];

#[test]
fn example_data_decodes() {
    use crate::structs::record::{FRAME_SIZE, RawFrame, TraceRecord, TraceTag};

    let records = EXAMPLE_DATA
        .chunks_exact(FRAME_SIZE)
        .map(|chunk| {
            let mut bytes = [0u8; FRAME_SIZE];
            bytes.copy_from_slice(chunk);
            RawFrame::new(bytes).outcome()
        })
        .filter_map(|outcome| outcome.record().copied())
        .collect::<Vec<_>>();

    assert_eq!(
        records,
        [
            TraceRecord::new(TraceTag::Instruction, 0x40_1000),
            TraceRecord::new(TraceTag::Read, 0x7ffd_0ff8),
            TraceRecord::new(TraceTag::Write, 0x7ffd_1000),
            TraceRecord::new(TraceTag::Instruction, 0x40_1004),
        ]
    );
}
