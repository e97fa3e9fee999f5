//! Ticket code formatting.
//!
//! Codes are assigned from a global database sequence only when the owning
//! order completes payment, so abandoned orders never consume identifiers.
//! The sequence guarantees uniqueness across concurrent completions; this
//! module only owns the textual form.

/// Format a sequence value as a ticket code: `TK001`, `TK002`, ...
///
/// Zero-padded to three digits; values past 999 simply grow wider.
pub fn format_ticket_code(sequence: i64) -> String {
    format!("TK{sequence:03}")
}
