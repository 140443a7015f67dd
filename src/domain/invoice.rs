//! Invoice and invoice line (§3, §4.6, §4.7).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{ChargeTypeId, InvoiceId, LeaseId, OrgId};
use crate::money::Money;
use crate::store::ConcurrencyToken;

/// Invoice lifecycle status (§4.7). `Paid` and `Voided` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceStatus {
    Draft,
    Issued,
    PartiallyPaid,
    Paid,
    Voided,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "Draft",
            InvoiceStatus::Issued => "Issued",
            InvoiceStatus::PartiallyPaid => "PartiallyPaid",
            InvoiceStatus::Paid => "Paid",
            InvoiceStatus::Voided => "Voided",
        }
    }
}

/// Logical origin of an invoice line, recorded for source tracking (§3, P7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineSource {
    Rent,
    RecurringCharge,
    Utility,
}

impl LineSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineSource::Rent => "Rent",
            LineSource::RecurringCharge => "RecurringCharge",
            LineSource::Utility => "Utility",
        }
    }
}

/// One row of an invoice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceLine {
    pub line_number: u32,
    pub charge_type_id: ChargeTypeId,
    pub description: String,
    pub amount: Money,
    pub tax_amount: Money,
    pub total: Money,
    pub source: LineSource,
    pub source_ref_id: String,
}

/// An immutable-once-issued financial document (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    pub org_id: OrgId,
    pub lease_id: LeaseId,
    pub invoice_number: String,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub lines: Vec<InvoiceLine>,
    pub subtotal: Money,
    pub tax: Money,
    pub total: Money,
    pub paid: Money,
    pub balance: Money,
    pub status: InvoiceStatus,
    pub issued_at: Option<DateTime<Utc>>,
    pub paid_at: Option<DateTime<Utc>>,
    pub voided_at: Option<DateTime<Utc>>,
    pub void_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub concurrency_token: ConcurrencyToken,
}

impl Invoice {
    /// P1: `subtotal + tax = total` and `paid + balance = total`.
    pub fn totals_are_consistent(&self) -> bool {
        self.subtotal + self.tax == self.total && self.paid + self.balance == self.total
    }

    /// P2: line numbers form a dense 1..N sequence and amounts are non-negative.
    pub fn lines_are_well_formed(&self) -> bool {
        self.lines
            .iter()
            .enumerate()
            .all(|(i, l)| l.line_number == (i as u32 + 1) && !l.amount.is_negative())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::lease::RENT_CHARGE_TYPE_CODE;
    use chrono::NaiveDate;

    fn line(n: u32, amount: &str) -> InvoiceLine {
        let amount = Money::round(amount.parse().unwrap());
        InvoiceLine {
            line_number: n,
            charge_type_id: ChargeTypeId::new(),
            description: RENT_CHARGE_TYPE_CODE.to_string(),
            amount,
            tax_amount: Money::ZERO,
            total: amount,
            source: LineSource::Rent,
            source_ref_id: "x".to_string(),
        }
    }

    fn invoice_with_lines(lines: Vec<InvoiceLine>) -> Invoice {
        let subtotal: Money = lines.iter().map(|l| l.amount).sum();
        Invoice {
            id: InvoiceId::new(),
            org_id: OrgId::new(),
            lease_id: LeaseId::new(),
            invoice_number: "INV-202401-000001".to_string(),
            period_start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            period_end: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            lines,
            subtotal,
            tax: Money::ZERO,
            total: subtotal,
            paid: Money::ZERO,
            balance: subtotal,
            status: InvoiceStatus::Draft,
            issued_at: None,
            paid_at: None,
            voided_at: None,
            void_reason: None,
            created_at: Utc::now(),
            concurrency_token: ConcurrencyToken::initial(),
        }
    }

    #[test]
    fn dense_line_numbering_passes_wellformedness() {
        let invoice = invoice_with_lines(vec![line(1, "10.00"), line(2, "20.00")]);
        assert!(invoice.lines_are_well_formed());
        assert!(invoice.totals_are_consistent());
    }

    #[test]
    fn gap_in_line_numbers_fails_wellformedness() {
        let invoice = invoice_with_lines(vec![line(1, "10.00"), line(3, "20.00")]);
        assert!(!invoice.lines_are_well_formed());
    }
}
