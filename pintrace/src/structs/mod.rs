//! Data structures of the trace format.

pub mod record;
pub mod stats;
