//! Report output for Heft.
//!
//! * [`ReportWriter`] persists an [`Analysis`](heft_core::Analysis) as a
//!   JSON document and/or a self-contained HTML page.
//! * [`ReportSequence`] is the caller-owned counter that keeps repeated runs
//!   in one process from overwriting each other's reports.
//! * [`summary`] renders the per-chunk size table for the terminal.

pub mod error;
pub mod html;
pub mod naming;
pub mod summary;
pub mod writer;

pub use error::{ReportError, Result};
pub use naming::ReportSequence;
pub use summary::{format_bytes, render_summary};
pub use writer::{ReportFormat, ReportWriter};
