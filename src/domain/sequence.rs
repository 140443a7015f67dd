//! Per-(organization, document kind) monotonic counter (§3, §4.5).

use serde::{Deserialize, Serialize};

use crate::ids::OrgId;

/// Which kind of document a number sequence is counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentKind {
    Invoice,
    CreditNote,
}

impl DocumentKind {
    /// Default prefix when the caller doesn't supply one, or supplies
    /// whitespace-only / empty (§4.5).
    pub fn default_prefix(&self) -> &'static str {
        match self {
            DocumentKind::Invoice => "INV",
            DocumentKind::CreditNote => "CN",
        }
    }
}

/// Current counter state for one (org, kind) pair.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NumberSequence {
    pub org_id: OrgId,
    pub kind: DocumentKind,
    pub next_value: u64,
}

impl NumberSequence {
    pub fn starting_at(org_id: OrgId, kind: DocumentKind, next_value: u64) -> Self {
        Self {
            org_id,
            kind,
            next_value,
        }
    }
}
