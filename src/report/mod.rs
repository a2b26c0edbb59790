//! Report modules.
//!
//! The run narrative is captured in a [`ReportLog`], extended with the
//! capacity sections by the [`DeltaReporter`] and finally turned into a
//! [`ReportDocument`] for the notifier.

pub mod assembler;
pub mod delta;
pub mod log;

pub use self::assembler::ReportDocument;
pub use self::delta::DeltaReporter;
pub use self::log::ReportLog;
