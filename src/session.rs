//! Explicit dashboard session state.
//!
//! Each load or fetch takes a [`Ticket`]. A response is applied only while
//! its ticket is still the latest one issued, so a slow response to an older
//! request can never overwrite newer data. Insights are tied to the record
//! generation they were computed from.

use tracing::debug;

use crate::record::StudentRecord;

/// Generation number of a load request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

#[derive(Debug, Default)]
pub struct Session {
    generation: u64,
    records: Vec<StudentRecord>,
    insights: Option<String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new load, superseding every earlier ticket.
    pub fn begin(&mut self) -> Ticket {
        self.generation += 1;
        Ticket(self.generation)
    }

    /// Ticket of the newest request.
    pub fn current(&self) -> Ticket {
        Ticket(self.generation)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        ticket.0 == self.generation
    }

    /// Replaces the record set wholesale. Returns `false` and leaves state
    /// untouched when `ticket` has been superseded.
    pub fn apply_records(&mut self, ticket: Ticket, records: Vec<StudentRecord>) -> bool {
        if !self.is_current(ticket) {
            debug!(ticket = ticket.0, current = self.generation, "Discarding stale records");
            return false;
        }
        self.records = records;
        self.insights = None;
        true
    }

    pub fn apply_insights(&mut self, ticket: Ticket, text: String) -> bool {
        if !self.is_current(ticket) {
            debug!(ticket = ticket.0, current = self.generation, "Discarding stale insights");
            return false;
        }
        self.insights = Some(text);
        true
    }

    pub fn records(&self) -> &[StudentRecord] {
        &self.records
    }

    pub fn insights(&self) -> Option<&str> {
        self.insights.as_deref()
    }

    pub fn search(&self, term: &str) -> Vec<&StudentRecord> {
        search(&self.records, term)
    }
}

/// Case-insensitive substring match over each record's text fields.
/// An empty or blank term matches nothing.
pub fn search<'a>(records: &'a [StudentRecord], term: &str) -> Vec<&'a StudentRecord> {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    records
        .iter()
        .filter(|r| {
            r.text_fields()
                .iter()
                .any(|f| f.to_lowercase().contains(&needle))
        })
        .collect()
}
