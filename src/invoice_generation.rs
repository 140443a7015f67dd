//! C6 — Invoice Generation Service (§4.6). Orchestrates C1–C5 for a single
//! lease/period and enforces the draft-vs-terminal idempotency rule.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::debug;

use crate::clock::ClockProvider;
use crate::domain::invoice::{Invoice, InvoiceLine, InvoiceStatus, LineSource};
use crate::domain::lease::{LeaseStatus, ProrationMethod, RENT_CHARGE_TYPE_CODE};
use crate::domain::sequence::DocumentKind;
use crate::domain::utility::UtilityStatement;
use crate::error::{EngineError, EngineResult};
use crate::ids::{InvoiceId, LeaseId};
use crate::money::Money;
use crate::number_sequence::NumberSequenceGenerator;
use crate::principal::CurrentPrincipal;
use crate::recurring_charge::calculate_charges;
use crate::rent::calculate_rent;
use crate::store::{ChargeTypeStore, ConcurrencyToken, InvoiceStore, LeaseStore};

/// `{ success, invoice?, wasUpdated, error? }` (§4.6, §7: C6 never leaks an
/// unhandled error to its caller).
#[derive(Debug, Clone)]
pub struct GenerateOutcome {
    pub success: bool,
    pub invoice: Option<Invoice>,
    pub was_updated: bool,
    pub error: Option<String>,
}

impl GenerateOutcome {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            invoice: None,
            was_updated: false,
            error: Some(message.into()),
        }
    }

    fn created(invoice: Invoice) -> Self {
        Self {
            success: true,
            invoice: Some(invoice),
            was_updated: false,
            error: None,
        }
    }

    fn regenerated(invoice: Invoice) -> Self {
        Self {
            success: true,
            invoice: Some(invoice),
            was_updated: true,
            error: None,
        }
    }
}

pub struct InvoiceGenerationService {
    lease_store: Arc<dyn LeaseStore>,
    charge_type_store: Arc<dyn ChargeTypeStore>,
    invoice_store: Arc<dyn InvoiceStore>,
    number_sequence: Arc<NumberSequenceGenerator>,
    clock: Arc<dyn ClockProvider>,
    principal: Arc<dyn CurrentPrincipal>,
}

impl InvoiceGenerationService {
    pub fn new(
        lease_store: Arc<dyn LeaseStore>,
        charge_type_store: Arc<dyn ChargeTypeStore>,
        invoice_store: Arc<dyn InvoiceStore>,
        number_sequence: Arc<NumberSequenceGenerator>,
        clock: Arc<dyn ClockProvider>,
        principal: Arc<dyn CurrentPrincipal>,
    ) -> Self {
        Self {
            lease_store,
            charge_type_store,
            invoice_store,
            number_sequence,
            clock,
            principal,
        }
    }

    /// `generate(leaseId, periodStart, periodEnd, method)`. `utility_statements`
    /// is the explicit integration seam decided by O4 (§12): the caller
    /// passes in already-finalized statements it wants folded into the
    /// invoice; C6 never calls C9 itself.
    pub async fn generate(
        &self,
        lease_id: LeaseId,
        period_start: NaiveDate,
        period_end: NaiveDate,
        method: ProrationMethod,
        utility_statements: &[UtilityStatement],
    ) -> GenerateOutcome {
        match self
            .try_generate(lease_id, period_start, period_end, method, utility_statements)
            .await
        {
            Ok(outcome) => outcome,
            Err(err) => {
                debug!(error = %err, %lease_id, "invoice generation precondition failed");
                GenerateOutcome::failure(err.to_string())
            }
        }
    }

    async fn try_generate(
        &self,
        lease_id: LeaseId,
        period_start: NaiveDate,
        period_end: NaiveDate,
        method: ProrationMethod,
        utility_statements: &[UtilityStatement],
    ) -> EngineResult<GenerateOutcome> {
        let lease = self.lease_store.get(lease_id).await?;
        if lease.status != LeaseStatus::Active {
            return Err(EngineError::InvalidState("lease not active".to_string()));
        }

        let existing = self
            .invoice_store
            .find_by_lease_period(lease_id, period_start, period_end)
            .await?;

        match existing {
            None => {
                let lines = self
                    .assemble_lines(&lease, period_start, period_end, method, utility_statements)
                    .await?;
                let invoice_number = self
                    .number_sequence
                    .next(
                        self.principal.org_id(),
                        DocumentKind::Invoice,
                        None,
                        self.clock.now_utc(),
                    )
                    .await?;
                let invoice = build_invoice(
                    InvoiceId::new(),
                    lease.org_id,
                    lease_id,
                    invoice_number,
                    period_start,
                    period_end,
                    lines,
                    self.clock.now_utc(),
                    ConcurrencyToken::initial(),
                );
                self.invoice_store.insert(invoice.clone()).await?;
                Ok(GenerateOutcome::created(invoice))
            }
            Some(current) if current.status == InvoiceStatus::Draft => {
                let lines = self
                    .assemble_lines(&lease, period_start, period_end, method, utility_statements)
                    .await?;
                let token = current.concurrency_token;
                let updated = build_invoice(
                    current.id,
                    lease.org_id,
                    lease_id,
                    current.invoice_number.clone(),
                    period_start,
                    period_end,
                    lines,
                    current.created_at,
                    token,
                );
                let stored = self.invoice_store.update(updated, token).await?;
                Ok(GenerateOutcome::regenerated(stored))
            }
            Some(current) => Ok(GenerateOutcome::failure(format!(
                "An invoice already exists for this period (status: {})",
                current.status.as_str()
            ))),
        }
    }

    async fn assemble_lines(
        &self,
        lease: &crate::domain::lease::Lease,
        period_start: NaiveDate,
        period_end: NaiveDate,
        method: ProrationMethod,
        utility_statements: &[UtilityStatement],
    ) -> EngineResult<Vec<InvoiceLine>> {
        let rent_charge_type = self
            .charge_type_store
            .resolve(lease.org_id, RENT_CHARGE_TYPE_CODE)
            .await
            .map_err(|_| {
                EngineError::InvalidState(format!(
                    "charge type catalog is missing the system {RENT_CHARGE_TYPE_CODE} entry"
                ))
            })?;

        let mut lines = Vec::new();
        let mut line_number = 1u32;

        let rent = calculate_rent(lease, period_start, period_end, method)?;
        for item in rent.line_items {
            lines.push(InvoiceLine {
                line_number,
                charge_type_id: rent_charge_type.id,
                description: "Rent".to_string(),
                amount: item.amount,
                tax_amount: Money::ZERO,
                total: item.amount,
                source: LineSource::Rent,
                source_ref_id: item.term_id.to_string(),
            });
            line_number += 1;
        }

        let charges = calculate_charges(&lease.recurring_charges, period_start, period_end, method)?;
        for item in charges.line_items {
            // Missing charge-type catalog entries for non-rent charges are
            // non-fatal: the line is simply not produced (§4.6).
            let charge_type = match self.charge_type_store.get(item.charge_type_id).await {
                Ok(ct) if ct.active => ct,
                _ => continue,
            };
            lines.push(InvoiceLine {
                line_number,
                charge_type_id: charge_type.id,
                description: item.description,
                amount: item.amount,
                tax_amount: Money::ZERO,
                total: item.amount,
                source: LineSource::RecurringCharge,
                source_ref_id: item.charge_id.to_string(),
            });
            line_number += 1;
        }

        for statement in utility_statements {
            // Missing charge-type catalog entries for non-rent charges are
            // non-fatal: the line is simply not produced (§4.6).
            let charge_type = match self
                .charge_type_store
                .resolve(lease.org_id, statement.utility_type.charge_type_code())
                .await
            {
                Ok(ct) if ct.active => ct,
                _ => continue,
            };
            lines.push(InvoiceLine {
                line_number,
                charge_type_id: charge_type.id,
                description: charge_type.name.clone(),
                amount: statement.total_amount,
                tax_amount: Money::ZERO,
                total: statement.total_amount,
                source: LineSource::Utility,
                source_ref_id: statement.id.to_string(),
            });
            line_number += 1;
        }

        Ok(lines)
    }
}

#[allow(clippy::too_many_arguments)]
fn build_invoice(
    id: InvoiceId,
    org_id: crate::ids::OrgId,
    lease_id: LeaseId,
    invoice_number: String,
    period_start: NaiveDate,
    period_end: NaiveDate,
    lines: Vec<InvoiceLine>,
    created_at: chrono::DateTime<chrono::Utc>,
    concurrency_token: ConcurrencyToken,
) -> Invoice {
    let subtotal: Money = lines.iter().map(|l| l.amount).sum();
    let tax: Money = lines.iter().map(|l| l.tax_amount).sum();
    let total = subtotal + tax;
    Invoice {
        id,
        org_id,
        lease_id,
        invoice_number,
        period_start,
        period_end,
        lines,
        subtotal,
        tax,
        total,
        paid: Money::ZERO,
        balance: total,
        status: InvoiceStatus::Draft,
        issued_at: None,
        paid_at: None,
        voided_at: None,
        void_reason: None,
        created_at,
        concurrency_token,
    }
}
