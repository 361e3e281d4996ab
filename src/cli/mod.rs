pub mod command;
pub mod convert;
pub mod dump;
pub mod progress;
pub mod session;
pub mod stats;
pub mod validate;
