//! Ticket record model.
//!
//! A [`TicketRecord`] is created in `pending` state from an input ID, filled in
//! by the fetch stage, and enriched by each later stage. Stages only add
//! fields; a record that fails a stage keeps everything it had and gains a
//! status and a [`StageFailure`].

use serde::{Deserialize, Serialize};

use crate::error::{Error, ErrorKind};

// =============================================================================
// STATUS
// =============================================================================

/// Status of the fetch and synthesis stages, which gate everything downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStatus {
    /// Created from an input ID, not fetched yet.
    #[default]
    Pending,
    Success,
    /// Fetch failed (including not-found).
    Failed,
    SynthesisFailed,
}

impl ProcessingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingStatus::Pending => "pending",
            ProcessingStatus::Success => "success",
            ProcessingStatus::Failed => "failed",
            ProcessingStatus::SynthesisFailed => "synthesis_failed",
        }
    }
}

/// Status of an analysis stage (categorization or diagnostics).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Success,
    Failed,
}

impl StageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageStatus::Success => "success",
            StageStatus::Failed => "failed",
        }
    }
}

/// Machine-readable kind plus human-readable message for a failed stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageFailure {
    pub kind: ErrorKind,
    pub message: String,
}

impl StageFailure {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<&Error> for StageFailure {
    fn from(err: &Error) -> Self {
        Self::new(err.kind(), err.to_string())
    }
}

// =============================================================================
// ENUMERATED ANSWERS
// =============================================================================

/// Yes/no answer that may be unknown (helpdesk fields, usage assessment).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FieldAnswer {
    Yes,
    No,
    #[default]
    Unknown,
}

impl FieldAnswer {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldAnswer::Yes => "yes",
            FieldAnswer::No => "no",
            FieldAnswer::Unknown => "unknown",
        }
    }

    /// Strict parse of a model-produced value.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "yes" => Some(FieldAnswer::Yes),
            "no" => Some(FieldAnswer::No),
            "unknown" => Some(FieldAnswer::Unknown),
            _ => None,
        }
    }
}

impl std::fmt::Display for FieldAnswer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Three-valued assessment used on the "could diagnostics help" axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Assessment {
    Yes,
    No,
    Maybe,
}

impl Assessment {
    pub const ALL: [Assessment; 3] = [Assessment::Yes, Assessment::No, Assessment::Maybe];

    pub fn as_str(&self) -> &'static str {
        match self {
            Assessment::Yes => "yes",
            Assessment::No => "no",
            Assessment::Maybe => "maybe",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "yes" => Some(Assessment::Yes),
            "no" => Some(Assessment::No),
            "maybe" => Some(Assessment::Maybe),
            _ => None,
        }
    }
}

impl std::fmt::Display for Assessment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// SOURCE CONTENT
// =============================================================================

/// One message on a ticket thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: u64,
    pub author_id: u64,
    pub author_name: String,
    /// Rendered in the configured display offset.
    pub created_at: String,
    pub body: String,
    /// `false` for internal notes.
    pub public: bool,
}

/// One page of a ticket's comment thread.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommentBatch {
    pub comments: Vec<Comment>,
    /// Cursor for the following page; `None` on the last page.
    pub next: Option<String>,
}

/// Escalation state derived from the cross-team and issue-tracker fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct EscalationInfo {
    pub is_escalated: bool,
    pub cross_team_status: FieldAnswer,
    pub jira_ticket_id: Option<String>,
    pub jira_ticket_url: Option<String>,
}

/// Helpdesk custom fields with known semantics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CustomFields {
    pub was_diagnostics_used: FieldAnswer,
    pub escalation: EscalationInfo,
    pub support_root_cause: Option<String>,
}

/// Ticket header as returned by a [`crate::TicketSource`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TicketDetails {
    pub subject: String,
    pub description: String,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
    pub custom_fields: CustomFields,
}

// =============================================================================
// STAGE RESULTS
// =============================================================================

/// Four-part summary of a ticket thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Synthesis {
    pub issue_reported: String,
    pub root_cause: String,
    pub summary: String,
    pub resolution: String,
}

/// Product-area classification of a ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Categorization {
    /// Canonical category name, or empty when the model's choice was invalid.
    pub primary_pod: String,
    pub reasoning: String,
    pub confidence: String,
    pub confidence_reason: String,
    pub alternative_pods: Vec<String>,
    pub alternative_reasoning: Option<String>,
}

/// Was the diagnostics tool used on this ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticsUsage {
    /// What the helpdesk custom field recorded.
    pub custom_field_value: FieldAnswer,
    /// What the model inferred from the thread.
    pub llm_assessment: FieldAnswer,
    pub confidence: String,
    pub reasoning: String,
}

/// Why diagnostics could not fully help, tagged by taxonomy area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticsGap {
    pub gap_area: String,
    pub gap_description: String,
}

/// Could the diagnostics tool have helped, split into triage and fix axes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticsHelp {
    pub triage_assessment: Assessment,
    pub triage_reasoning: String,
    pub fix_assessment: Assessment,
    pub fix_reasoning: String,
    /// Always derived from the two axes, never read from model output.
    pub overall_assessment: Assessment,
    pub overall_reasoning: String,
    pub confidence: String,
    pub diagnostics_capability_matched: Vec<String>,
    pub limitation_notes: String,
    pub gaps: Vec<DiagnosticsGap>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisMetadata {
    pub ticket_type: String,
    pub analysis_timestamp: Option<String>,
}

/// Full diagnostics applicability analysis of a ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticsAnalysis {
    pub was_diagnostics_used: DiagnosticsUsage,
    pub could_diagnostics_help: DiagnosticsHelp,
    pub metadata: AnalysisMetadata,
}

// =============================================================================
// RECORD
// =============================================================================

/// The unit of work flowing through the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TicketRecord {
    pub ticket_id: String,
    pub serial_no: Option<u32>,
    pub url: String,
    pub subject: String,
    pub description: String,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
    pub comments_count: usize,
    pub comments: Vec<Comment>,
    pub custom_fields: CustomFields,

    pub processing_status: ProcessingStatus,
    /// Failure of the fetch or synthesis stage.
    pub error: Option<StageFailure>,

    pub synthesis: Option<Synthesis>,

    pub categorization: Option<Categorization>,
    pub categorization_status: Option<StageStatus>,
    pub categorization_error: Option<StageFailure>,

    pub diagnostics_analysis: Option<DiagnosticsAnalysis>,
    pub diagnostics_analysis_status: Option<StageStatus>,
    pub diagnostics_analysis_error: Option<StageFailure>,
}

impl TicketRecord {
    /// A record for an ID that has not been fetched yet.
    pub fn pending(ticket_id: impl Into<String>, serial_no: Option<u32>) -> Self {
        Self {
            ticket_id: ticket_id.into(),
            serial_no,
            ..Default::default()
        }
    }

    /// Fill in fetched content and mark the fetch successful.
    pub fn apply_fetched(&mut self, url: String, details: TicketDetails, comments: Vec<Comment>) {
        self.url = url;
        self.subject = details.subject;
        self.description = details.description;
        self.status = details.status;
        self.created_at = details.created_at;
        self.updated_at = details.updated_at;
        self.custom_fields = details.custom_fields;
        self.comments_count = comments.len();
        self.comments = comments;
        self.processing_status = ProcessingStatus::Success;
        self.error = None;
    }

    /// Fetched and synthesized, so analysis stages can run.
    pub fn is_synthesized(&self) -> bool {
        self.processing_status == ProcessingStatus::Success && self.synthesis.is_some()
    }

    /// Sort key that keeps records without a serial number at the end.
    pub fn sort_key(&self) -> (u32, &str) {
        (self.serial_no.unwrap_or(u32::MAX), self.ticket_id.as_str())
    }
}
