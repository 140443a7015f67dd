//! C7 — Invoice Lifecycle Service (§4.7). Draft → Issued → (PartiallyPaid →)
//! Paid, or Issued/PartiallyPaid → Voided. Terminal states: `Paid`, `Voided`.

use std::sync::Arc;

use crate::clock::ClockProvider;
use crate::domain::invoice::{Invoice, InvoiceStatus};
use crate::error::{EngineError, EngineResult};
use crate::ids::InvoiceId;
use crate::money::Money;
use crate::store::{ConcurrencyToken, InvoiceStore};

pub struct InvoiceLifecycleService {
    invoice_store: Arc<dyn InvoiceStore>,
    clock: Arc<dyn ClockProvider>,
}

impl InvoiceLifecycleService {
    pub fn new(invoice_store: Arc<dyn InvoiceStore>, clock: Arc<dyn ClockProvider>) -> Self {
        Self {
            invoice_store,
            clock,
        }
    }

    /// `issue(invoiceId)` — requires `Draft`, ≥1 line, total > 0 (§4.7).
    pub async fn issue(
        &self,
        invoice_id: InvoiceId,
        expected_token: ConcurrencyToken,
    ) -> EngineResult<Invoice> {
        let mut invoice = self.invoice_store.get(invoice_id).await?;
        if invoice.status != InvoiceStatus::Draft {
            return Err(EngineError::InvalidState(format!(
                "cannot issue invoice in status {}",
                invoice.status.as_str()
            )));
        }
        if invoice.lines.is_empty() || !invoice.total.is_positive() {
            return Err(EngineError::InvalidState(
                "draft invoice must have at least one line and a positive total to be issued"
                    .to_string(),
            ));
        }

        invoice.status = InvoiceStatus::Issued;
        invoice.issued_at = Some(self.clock.now_utc());
        self.invoice_store.update(invoice, expected_token).await
    }

    /// `void(invoiceId, reason)` — requires a non-empty reason, status ∈
    /// {Issued, PartiallyPaid}, and zero payments recorded so far (§4.7).
    pub async fn void(
        &self,
        invoice_id: InvoiceId,
        reason: &str,
        expected_token: ConcurrencyToken,
    ) -> EngineResult<Invoice> {
        let trimmed = reason.trim();
        if trimmed.is_empty() {
            return Err(EngineError::InvalidArgument(
                "void reason must not be empty".to_string(),
            ));
        }

        let mut invoice = self.invoice_store.get(invoice_id).await?;
        if !matches!(
            invoice.status,
            InvoiceStatus::Issued | InvoiceStatus::PartiallyPaid
        ) {
            return Err(EngineError::InvalidState(format!(
                "cannot void invoice in status {}",
                invoice.status.as_str()
            )));
        }
        if !invoice.paid.is_zero() {
            return Err(EngineError::InvalidState(
                "cannot void an invoice that has received payment; use a credit note".to_string(),
            ));
        }

        invoice.status = InvoiceStatus::Voided;
        invoice.voided_at = Some(self.clock.now_utc());
        invoice.void_reason = Some(trimmed.to_string());
        self.invoice_store.update(invoice, expected_token).await
    }

    /// `recordPayment(invoiceId, amount)` — amount > 0, status ∈ {Issued,
    /// PartiallyPaid}; recomputes `balance = total - paid` (§4.7).
    pub async fn record_payment(
        &self,
        invoice_id: InvoiceId,
        amount: Money,
        expected_token: ConcurrencyToken,
    ) -> EngineResult<Invoice> {
        if !amount.is_positive() {
            return Err(EngineError::InvalidArgument(
                "payment amount must be positive".to_string(),
            ));
        }

        let mut invoice = self.invoice_store.get(invoice_id).await?;
        if !matches!(
            invoice.status,
            InvoiceStatus::Issued | InvoiceStatus::PartiallyPaid
        ) {
            return Err(EngineError::InvalidState(format!(
                "cannot record payment on invoice in status {}",
                invoice.status.as_str()
            )));
        }

        let new_paid = invoice.paid + amount;
        if new_paid.as_decimal() > invoice.total.as_decimal() {
            return Err(EngineError::InvalidArgument(
                "payment would exceed invoice total".to_string(),
            ));
        }

        invoice.paid = new_paid;
        invoice.balance = invoice.total - new_paid;
        if invoice.balance.is_zero() {
            invoice.status = InvoiceStatus::Paid;
            invoice.paid_at = Some(self.clock.now_utc());
        } else {
            invoice.status = InvoiceStatus::PartiallyPaid;
        }

        self.invoice_store.update(invoice, expected_token).await
    }
}
