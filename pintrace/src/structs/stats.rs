use std::collections::HashSet;

use crate::structs::record::{TraceRecord, TraceTag};

pub const PAGE_SIZE_BITS: u32 = 12;

/// Page number of an address for 4 KiB pages.
pub const fn page_number(address: u64) -> u64 {
    address >> PAGE_SIZE_BITS
}

/// Accumulated access statistics over one or more traces.
///
/// The accumulator is a plain value: callers thread it through their own
/// loops and [`merge`](AccessStats::merge) results from several traces.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessStats {
    pub total_mem_access: u64,
    pub instructions: u64,
    pub reads: u64,
    pub writes: u64,
    pub lowest_address: Option<u64>,
    pub highest_address: Option<u64>,
    pages: HashSet<u64>,
}

impl AccessStats {
    pub fn record(&mut self, record: &TraceRecord) {
        self.total_mem_access += 1;
        match record.tag {
            TraceTag::Instruction => self.instructions += 1,
            TraceTag::Read => self.reads += 1,
            TraceTag::Write => self.writes += 1,
        }

        let address = record.address;
        self.lowest_address = Some(self.lowest_address.map_or(address, |low| low.min(address)));
        self.highest_address = Some(
            self.highest_address
                .map_or(address, |high| high.max(address)),
        );
        self.pages.insert(page_number(address));
    }

    pub fn merge(&mut self, other: &AccessStats) {
        self.total_mem_access += other.total_mem_access;
        self.instructions += other.instructions;
        self.reads += other.reads;
        self.writes += other.writes;
        self.lowest_address = match (self.lowest_address, other.lowest_address) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        self.highest_address = match (self.highest_address, other.highest_address) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
        self.pages.extend(&other.pages);
    }

    /// Number of distinct pages touched.
    pub fn total_page_access(&self) -> u64 {
        self.pages.len() as u64
    }
}

impl<'a> Extend<&'a TraceRecord> for AccessStats {
    fn extend<I: IntoIterator<Item = &'a TraceRecord>>(&mut self, iter: I) {
        iter.into_iter().for_each(|record| self.record(record));
    }
}
