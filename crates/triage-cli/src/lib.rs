//! # triage-cli
//!
//! Support code for the `ticket-triage` binary: ticket-list loading,
//! JSON/CSV export, the console summary and logging setup.

pub mod export;
pub mod input;
pub mod report;
pub mod telemetry;

pub use export::{export_run, output_stem, ExportKind};
pub use input::{load_tickets, read_tickets, InputTicket};
pub use report::{render_summary, LogProgress};
pub use telemetry::init_tracing;
