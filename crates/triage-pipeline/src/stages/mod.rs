//! The four pipeline stages.
//!
//! ```text
//! pending ──fetch──▶ success ──synthesize──▶ synthesized ──┬─categorize─▶
//!    │                  │                                   └─diagnose───▶
//!    ▼                  ▼
//!  failed        synthesis_failed
//! ```

mod categorize;
mod diagnose;
mod fetch;
mod synthesize;

pub use categorize::CategorizeStage;
pub use diagnose::DiagnoseStage;
pub use fetch::FetchStage;
pub use synthesize::SynthesizeStage;
