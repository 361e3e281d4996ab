use std::io::{self, Read};

use crate::structs::record::{ADDRESS_SIZE, FRAME_SIZE, RawFrame};

/// Sequential byte source a [`FrameReader`] pulls from.
///
/// `read_bytes` fills a prefix of `buf` and returns how many bytes it wrote.
/// Returning 0 for a non-empty `buf` means the source is exhausted.
///
/// Every [`Read`] implementor is a byte source, so files, pipes, standard
/// input and in-memory slices all work unmodified.
pub trait ByteSource {
    fn read_bytes(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

impl<R: Read + ?Sized> ByteSource for R {
    #[inline]
    fn read_bytes(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read(buf)
    }
}

/// Framing result of a single read attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameRead {
    /// A complete 9-byte frame.
    Frame(RawFrame),
    /// Zero bytes were available at a frame boundary.
    EndOfStream,
    /// The tag byte was read but the source ended before the address was
    /// complete. `available` counts the address bytes that were present.
    Truncated { offset: u64, available: usize },
}

/// Pulls fixed-size frames from a [`ByteSource`].
///
/// The reader holds no state between calls apart from the number of bytes
/// consumed so far. Nothing beyond the current frame is buffered, so the
/// underlying source is never read past the end of the frame being assembled.
///
/// ```rust
/// use pintrace::process::frame::{FrameRead, FrameReader};
///
/// let mut reader = FrameReader::new(&[0x49u8, 1, 0, 0, 0, 0, 0, 0, 0, 0x52][..]);
///
/// let FrameRead::Frame(frame) = reader.next_frame()? else {
///     panic!("expected a complete frame");
/// };
/// assert_eq!(frame.tag_byte(), b'I');
/// assert_eq!(frame.address(), 1);
///
/// assert_eq!(
///     reader.next_frame()?,
///     FrameRead::Truncated { offset: 9, available: 0 }
/// );
/// # Ok::<(), std::io::Error>(())
/// ```
#[derive(Debug)]
pub struct FrameReader<S> {
    source: S,
    position: u64,
}

impl<S: ByteSource> FrameReader<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            position: 0,
        }
    }

    /// Reads the next frame.
    ///
    /// I/O errors from the source are passed through untouched, except
    /// [`io::ErrorKind::Interrupted`] which is retried.
    pub fn next_frame(&mut self) -> io::Result<FrameRead> {
        let offset = self.position;
        let mut bytes = [0u8; FRAME_SIZE];

        if self.fill(&mut bytes[..1])? == 0 {
            return Ok(FrameRead::EndOfStream);
        }

        let available = self.fill(&mut bytes[1..])?;
        if available < ADDRESS_SIZE {
            return Ok(FrameRead::Truncated { offset, available });
        }

        Ok(FrameRead::Frame(RawFrame::new(bytes)))
    }

    /// Total number of bytes consumed from the source.
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn into_inner(self) -> S {
        self.source
    }

    // Short reads are normal for pipes; only a zero-length read ends the fill.
    fn fill(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.source.read_bytes(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => {
                    filled += n;
                    self.position += n as u64;
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(filled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::EXAMPLE_DATA;

    /// Hands out at most `chunk` bytes per call, like a slow pipe.
    struct Trickle<'a> {
        data: &'a [u8],
        chunk: usize,
        interrupt_next: bool,
    }

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.interrupt_next {
                self.interrupt_next = false;
                return Err(io::ErrorKind::Interrupted.into());
            }
            self.interrupt_next = true;

            let n = buf.len().min(self.chunk).min(self.data.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    struct Broken;

    impl Read for Broken {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::other("device unplugged"))
        }
    }

    fn count_frames<S: ByteSource>(reader: &mut FrameReader<S>) -> io::Result<(usize, FrameRead)> {
        let mut frames = 0;
        loop {
            match reader.next_frame()? {
                FrameRead::Frame(_) => frames += 1,
                other => return Ok((frames, other)),
            }
        }
    }

    #[test]
    fn empty_source_is_end_of_stream() -> io::Result<()> {
        let mut reader = FrameReader::new(io::empty());
        assert_eq!(reader.next_frame()?, FrameRead::EndOfStream);
        assert_eq!(reader.next_frame()?, FrameRead::EndOfStream);
        assert_eq!(reader.position(), 0);
        Ok(())
    }

    #[test]
    fn whole_frames_then_end() -> io::Result<()> {
        let mut reader = FrameReader::new(EXAMPLE_DATA);
        let (frames, end) = count_frames(&mut reader)?;
        assert_eq!(frames, EXAMPLE_DATA.len() / FRAME_SIZE);
        assert_eq!(end, FrameRead::EndOfStream);
        assert_eq!(reader.position(), EXAMPLE_DATA.len() as u64);
        Ok(())
    }

    #[test]
    fn every_partial_tail_is_truncated() -> io::Result<()> {
        for tail in 1..FRAME_SIZE {
            let data = &EXAMPLE_DATA[..FRAME_SIZE * 2 + tail];
            let mut reader = FrameReader::new(data);
            let (frames, end) = count_frames(&mut reader)?;
            assert_eq!(frames, 2);
            assert_eq!(
                end,
                FrameRead::Truncated {
                    offset: (FRAME_SIZE * 2) as u64,
                    available: tail - 1,
                }
            );
            assert_eq!(reader.position(), data.len() as u64);
        }
        Ok(())
    }

    #[test]
    fn short_reads_are_reassembled() -> io::Result<()> {
        let mut reader = FrameReader::new(Trickle {
            data: EXAMPLE_DATA,
            chunk: 2,
            interrupt_next: true,
        });
        let (frames, end) = count_frames(&mut reader)?;
        assert_eq!(frames, EXAMPLE_DATA.len() / FRAME_SIZE);
        assert_eq!(end, FrameRead::EndOfStream);
        Ok(())
    }

    #[test]
    fn io_errors_pass_through() {
        let mut reader = FrameReader::new(Broken);
        let err = reader.next_frame().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Other);
    }

    #[test]
    fn does_not_read_past_frame() -> io::Result<()> {
        let data = EXAMPLE_DATA;
        let mut reader = FrameReader::new(data);
        reader.next_frame()?;
        let rest = reader.into_inner();
        assert_eq!(rest, &data[FRAME_SIZE..]);
        Ok(())
    }
}
