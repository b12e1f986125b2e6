//! # triage-zendesk
//!
//! Zendesk helpdesk access for ticket-triage.
//!
//! This crate provides:
//! - [`ZendeskClient`], the [`triage_core::TicketSource`] used in production
//! - Wire types for the ticket and comment endpoints
//! - Mapping of opaque custom-field IDs to diagnostics usage and escalation
//!
//! ## Example
//!
//! ```rust,ignore
//! use triage_core::{TicketSource, TriageConfig};
//! use triage_zendesk::ZendeskClient;
//!
//! let config = TriageConfig::load(None)?;
//! let client = ZendeskClient::new(
//!     config.zendesk.clone(),
//!     config.limits.request_timeout_secs,
//!     config.timezone_offset_minutes,
//! )?;
//! let details = client.fetch_ticket("12345").await?;
//! ```

pub mod client;
pub mod mapping;
pub mod types;

pub use client::ZendeskClient;
