// # Report Sink Implementations
//
// This module provides implementations of the ReportSink trait for
// different output strategies.

pub mod file;
pub mod memory;

pub use file::{FileReportSink, FileReportSinkFactory};
pub use memory::{MemoryReportSink, MemoryReportSinkFactory};
