use std::io::{self, BufRead};

use log::warn;

use crate::structs::record::TraceRecord;

/// Reads records from the line-oriented text trace format.
///
/// Blank lines are ignored. Lines that do not parse are skipped with a
/// warning and counted, so a partially garbled text trace still yields its
/// good records.
///
/// ```rust
/// use pintrace::process::text::TextReader;
///
/// let text = "I 0x401000\nR 0x7ffd0010\nnot a record\n\nW 0x7ffd0018\n";
/// let mut reader = TextReader::new(text.as_bytes());
/// let records = reader.by_ref().collect::<Result<Vec<_>, _>>()?;
/// assert_eq!(records.len(), 3);
/// assert_eq!(reader.skipped(), 1);
/// # Ok::<(), std::io::Error>(())
/// ```
#[derive(Debug)]
pub struct TextReader<R> {
    reader: R,
    line: String,
    line_number: u64,
    skipped: u64,
}

impl<R: BufRead> TextReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: String::new(),
            line_number: 0,
            skipped: 0,
        }
    }

    /// Lines that were not blank but failed to parse.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    pub fn line_number(&self) -> u64 {
        self.line_number
    }
}

impl<R: BufRead> Iterator for TextReader<R> {
    type Item = io::Result<TraceRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.line.clear();
            match self.reader.read_line(&mut self.line) {
                Ok(0) => return None,
                Ok(_) => self.line_number += 1,
                Err(e) => return Some(Err(e)),
            }

            if self.line.trim().is_empty() {
                continue;
            }

            match self.line.parse::<TraceRecord>() {
                Ok(record) => return Some(Ok(record)),
                Err(e) => {
                    warn!("Skipping line {}: {e}", self.line_number);
                    self.skipped += 1;
                }
            }
        }
    }
}
