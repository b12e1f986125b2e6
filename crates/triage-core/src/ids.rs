//! Run identifiers.
//!
//! Each pipeline run gets a UUIDv7, so run IDs sort by start time.

use uuid::Uuid;

/// New time-ordered run identifier.
#[inline]
pub fn new_run_id() -> Uuid {
    Uuid::now_v7()
}
