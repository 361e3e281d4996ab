use std::io::{self, Write};

use crate::structs::record::TraceRecord;

/// Writes records in the binary wire format.
///
/// The writer does not buffer; wrap the sink in a [`io::BufWriter`] when
/// writing many records to a file.
#[derive(Debug)]
pub struct TraceWriter<W: Write> {
    writer: W,
    records: u64,
}

impl<W: Write> TraceWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, records: 0 }
    }

    pub fn write_record(&mut self, record: &TraceRecord) -> io::Result<()> {
        self.writer.write_all(&record.to_bytes())?;
        self.records += 1;
        Ok(())
    }

    pub fn records_written(&self) -> u64 {
        self.records
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    pub fn into_inner(mut self) -> io::Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}
