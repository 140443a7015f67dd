//! Credit note and credit-note line (§3, §4.8).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{CreditNoteId, InvoiceId, OrgId};
use crate::money::Money;
use crate::store::ConcurrencyToken;

/// Why a credit note was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CreditReason {
    Discount,
    Refund,
    Correction,
    Cancellation,
    BadDebt,
}

impl CreditReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            CreditReason::Discount => "Discount",
            CreditReason::Refund => "Refund",
            CreditReason::Correction => "Correction",
            CreditReason::Cancellation => "Cancellation",
            CreditReason::BadDebt => "BadDebt",
        }
    }
}

/// One row of a credit note; `amount` is always stored negative (P3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditNoteLine {
    pub line_number: u32,
    pub invoice_line_number: u32,
    pub description: String,
    pub amount: Money,
    pub total: Money,
}

/// A negative financial document offsetting an issued invoice (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditNote {
    pub id: CreditNoteId,
    pub org_id: OrgId,
    pub invoice_id: InvoiceId,
    pub credit_note_number: String,
    pub reason: CreditReason,
    pub notes: Option<String>,
    pub lines: Vec<CreditNoteLine>,
    pub total: Money,
    pub applied_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub concurrency_token: ConcurrencyToken,
}

impl CreditNote {
    /// P3: every line is negative and the parent total is non-positive and
    /// equal to the sum of its lines.
    pub fn is_well_formed(&self) -> bool {
        let sum: Money = self.lines.iter().map(|l| l.amount).sum();
        self.lines.iter().all(|l| l.amount.is_negative()) && sum == self.total && !self.total.is_positive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{CreditNoteId, InvoiceId, OrgId};

    #[test]
    fn well_formed_credit_note_sums_to_total() {
        let line1 = CreditNoteLine {
            line_number: 1,
            invoice_line_number: 1,
            description: "partial refund".into(),
            amount: -Money::round("400".parse().unwrap()),
            total: -Money::round("400".parse().unwrap()),
        };
        let note = CreditNote {
            id: CreditNoteId::new(),
            org_id: OrgId::new(),
            invoice_id: InvoiceId::new(),
            credit_note_number: "CN-202401-000001".into(),
            reason: CreditReason::Refund,
            notes: None,
            lines: vec![line1],
            total: -Money::round("400".parse().unwrap()),
            applied_at: None,
            created_at: Utc::now(),
            concurrency_token: ConcurrencyToken::initial(),
        };
        assert!(note.is_well_formed());
    }
}
