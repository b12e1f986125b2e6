//! Ticket-list CSV loading.
//!
//! Two header layouts are accepted:
//!
//! ```text
//! Serial No,Ticket ID          Zendesk Tickets ID
//! 1,48213                      48213
//! 2,48377                      48377
//! ```
//!
//! The second layout is numbered from 1 in file order.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::{debug, info};

use triage_core::TicketRecord;

pub const SERIAL_HEADER: &str = "Serial No";
pub const TICKET_ID_HEADER: &str = "Ticket ID";
pub const ZENDESK_IDS_HEADER: &str = "Zendesk Tickets ID";

/// One row of the ticket list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputTicket {
    pub serial_no: u32,
    pub ticket_id: String,
}

impl InputTicket {
    pub fn into_record(self) -> TicketRecord {
        TicketRecord::pending(self.ticket_id, Some(self.serial_no))
    }
}

enum Layout {
    Numbered { serial: usize, id: usize },
    IdsOnly { id: usize },
}

impl Layout {
    fn detect(headers: &csv::StringRecord) -> Result<Self> {
        let position = |name: &str| headers.iter().position(|h| h == name);
        match (
            position(SERIAL_HEADER),
            position(TICKET_ID_HEADER),
            position(ZENDESK_IDS_HEADER),
        ) {
            (Some(serial), Some(id), _) => Ok(Layout::Numbered { serial, id }),
            (_, _, Some(id)) => Ok(Layout::IdsOnly { id }),
            _ => bail!(
                "unrecognized input columns [{}]; expected either '{}' and '{}', or '{}'",
                headers.iter().collect::<Vec<_>>().join(", "),
                SERIAL_HEADER,
                TICKET_ID_HEADER,
                ZENDESK_IDS_HEADER
            ),
        }
    }
}

/// Load the ticket list from a CSV file.
pub fn load_tickets(path: &Path) -> Result<Vec<InputTicket>> {
    let file =
        File::open(path).with_context(|| format!("failed to open input {}", path.display()))?;
    let tickets =
        read_tickets(file).with_context(|| format!("failed to read input {}", path.display()))?;
    info!(
        subsystem = "cli",
        path = %path.display(),
        tickets = tickets.len(),
        "Loaded ticket list"
    );
    Ok(tickets)
}

/// Parse a ticket list. Blank ids are skipped; an empty list is an error.
pub fn read_tickets<R: Read>(reader: R) -> Result<Vec<InputTicket>> {
    let mut csv = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    let layout = Layout::detect(csv.headers()?)?;

    let mut tickets = Vec::new();
    for (row, result) in csv.records().enumerate() {
        let record = result?;
        // Row numbers as a spreadsheet shows them, header being row 1.
        let line = row + 2;
        match layout {
            Layout::Numbered { serial, id } => {
                let ticket_id = record.get(id).unwrap_or_default();
                if ticket_id.is_empty() {
                    debug!(line, "Skipping row without ticket id");
                    continue;
                }
                let raw_serial = record.get(serial).unwrap_or_default();
                let serial_no = raw_serial.parse::<u32>().with_context(|| {
                    format!("row {}: invalid serial number '{}'", line, raw_serial)
                })?;
                tickets.push(InputTicket {
                    serial_no,
                    ticket_id: ticket_id.to_string(),
                });
            }
            Layout::IdsOnly { id } => {
                let ticket_id = record.get(id).unwrap_or_default();
                if ticket_id.is_empty() {
                    debug!(line, "Skipping row without ticket id");
                    continue;
                }
                tickets.push(InputTicket {
                    serial_no: tickets.len() as u32 + 1,
                    ticket_id: ticket_id.to_string(),
                });
            }
        }
    }

    if tickets.is_empty() {
        bail!("no ticket ids found");
    }
    Ok(tickets)
}
