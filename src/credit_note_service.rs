//! C8 — Credit Note Service (§4.8).

use std::sync::Arc;

use crate::clock::ClockProvider;
use crate::domain::credit_note::{CreditNote, CreditNoteLine, CreditReason};
use crate::domain::invoice::InvoiceStatus;
use crate::domain::sequence::DocumentKind;
use crate::error::{EngineError, EngineResult};
use crate::ids::{CreditNoteId, InvoiceId};
use crate::money::Money;
use crate::number_sequence::NumberSequenceGenerator;
use crate::principal::CurrentPrincipal;
use crate::store::{ConcurrencyToken, CreditNoteStore, InvoiceStore};

/// One requested credit line: `{ invoiceLineId, amount > 0, notes? }` (§4.8).
pub struct CreditLineRequest {
    pub invoice_line_number: u32,
    pub amount: Money,
    pub description: String,
}

pub struct CreditNoteService {
    invoice_store: Arc<dyn InvoiceStore>,
    credit_note_store: Arc<dyn CreditNoteStore>,
    number_sequence: Arc<NumberSequenceGenerator>,
    clock: Arc<dyn ClockProvider>,
    principal: Arc<dyn CurrentPrincipal>,
}

impl CreditNoteService {
    pub fn new(
        invoice_store: Arc<dyn InvoiceStore>,
        credit_note_store: Arc<dyn CreditNoteStore>,
        number_sequence: Arc<NumberSequenceGenerator>,
        clock: Arc<dyn ClockProvider>,
        principal: Arc<dyn CurrentPrincipal>,
    ) -> Self {
        Self {
            invoice_store,
            credit_note_store,
            number_sequence,
            clock,
            principal,
        }
    }

    /// `create(invoiceId, reason, lineItems[], notes?)`.
    pub async fn create(
        &self,
        invoice_id: InvoiceId,
        reason: CreditReason,
        line_items: Vec<CreditLineRequest>,
        notes: Option<String>,
    ) -> EngineResult<CreditNote> {
        if line_items.is_empty() {
            return Err(EngineError::InvalidArgument(
                "at least one credit line is required".to_string(),
            ));
        }
        for item in &line_items {
            if !item.amount.is_positive() {
                return Err(EngineError::InvalidArgument(
                    "credit line amount must be positive".to_string(),
                ));
            }
        }

        let invoice = self.invoice_store.get(invoice_id).await?;
        if !matches!(
            invoice.status,
            InvoiceStatus::Issued | InvoiceStatus::Paid | InvoiceStatus::PartiallyPaid
        ) {
            return Err(EngineError::InvalidState(format!(
                "invoice in status {} is not eligible for a credit note",
                invoice.status.as_str()
            )));
        }

        let mut lines = Vec::with_capacity(line_items.len());
        for (i, item) in line_items.into_iter().enumerate() {
            let invoice_line = invoice
                .lines
                .iter()
                .find(|l| l.line_number == item.invoice_line_number)
                .ok_or_else(|| {
                    EngineError::InvalidArgument(format!(
                        "invoice line {} does not belong to invoice {}",
                        item.invoice_line_number, invoice_id
                    ))
                })?;

            let already_credited = self
                .credit_note_store
                .credited_amount_for_line(invoice_id, item.invoice_line_number)
                .await?;
            if (already_credited + item.amount).as_decimal() > invoice_line.amount.as_decimal() {
                return Err(EngineError::Conflict(format!(
                    "requested credit of {} exceeds invoice line {} amount of {} (already credited {})",
                    item.amount, item.invoice_line_number, invoice_line.amount, already_credited
                )));
            }

            lines.push(CreditNoteLine {
                line_number: i as u32 + 1,
                invoice_line_number: item.invoice_line_number,
                description: item.description,
                amount: -item.amount,
                total: -item.amount,
            });
        }

        let total: Money = lines.iter().map(|l| l.amount).sum();
        let credit_note_number = self
            .number_sequence
            .next(
                self.principal.org_id(),
                DocumentKind::CreditNote,
                None,
                self.clock.now_utc(),
            )
            .await?;

        let note = CreditNote {
            id: CreditNoteId::new(),
            org_id: invoice.org_id,
            invoice_id,
            credit_note_number,
            reason,
            notes,
            lines,
            total,
            applied_at: None,
            created_at: self.clock.now_utc(),
            concurrency_token: ConcurrencyToken::initial(),
        };
        self.credit_note_store.insert(note.clone()).await?;
        Ok(note)
    }

    /// `issue(creditNoteId)` — stamps `appliedAtUtc`; downstream settlement
    /// against the invoice ledger is out of scope (§4.8).
    pub async fn issue(
        &self,
        credit_note_id: CreditNoteId,
        expected_token: ConcurrencyToken,
    ) -> EngineResult<CreditNote> {
        let mut note = self.credit_note_store.get(credit_note_id).await?;
        if note.lines.is_empty() {
            return Err(EngineError::InvalidState(
                "credit note has no lines".to_string(),
            ));
        }
        if note.applied_at.is_some() {
            return Err(EngineError::InvalidState(
                "credit note has already been applied".to_string(),
            ));
        }
        note.applied_at = Some(self.clock.now_utc());
        self.credit_note_store.update(note, expected_token).await
    }
}
