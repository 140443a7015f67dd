//! C11 — Persistence & Unit of Work.
//!
//! Narrow, per-aggregate repository traits (§9: "generic repository
//! polymorphism" is re-expressed this way) with in-memory implementations
//! backed by `parking_lot::RwLock<HashMap<..>>`. Optimistic concurrency
//! tokens and soft-delete filtering live here, not in the domain layer.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::credit_note::CreditNote;
use crate::domain::invoice::Invoice;
use crate::domain::lease::{ChargeType, Lease, LeaseBillingSetting};
use crate::domain::run::InvoiceRun;
use crate::domain::sequence::DocumentKind;
use crate::domain::utility::{UtilityRatePlan, UtilityStatement, UtilityType};
use crate::error::{EngineError, EngineResult};
use crate::ids::{
    ChargeTypeId, CreditNoteId, InvoiceId, InvoiceRunId, LeaseId, OrgId, UtilityRatePlanId,
};
use crate::money::Money;

/// Opaque optimistic-concurrency token (§9). Callers never inspect it; they
/// pass back what they last read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConcurrencyToken(Uuid);

impl ConcurrencyToken {
    /// Token assigned when an entity is first persisted.
    pub fn initial() -> Self {
        Self(Uuid::new_v4())
    }

    /// Token assigned on every subsequent update.
    fn advance(&self) -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConcurrencyToken {
    fn default() -> Self {
        Self::initial()
    }
}

fn conflict(entity: &str, id: impl std::fmt::Display) -> EngineError {
    EngineError::Conflict(format!(
        "concurrency token mismatch updating {entity} {id}"
    ))
}

fn not_found(entity: &str, id: impl std::fmt::Display) -> EngineError {
    EngineError::NotFound(format!("{entity} {id} not found"))
}

// ---------------------------------------------------------------------
// Lease
// ---------------------------------------------------------------------

#[async_trait]
pub trait LeaseStore: Send + Sync {
    async fn get(&self, id: LeaseId) -> EngineResult<Lease>;
    /// Active, non-deleted leases for an organization, stable order (§4.10:
    /// "enumeration order of leases must be stable").
    async fn list_active(&self, org_id: OrgId) -> EngineResult<Vec<Lease>>;
    async fn upsert(&self, lease: Lease) -> EngineResult<()>;
}

#[derive(Default)]
pub struct InMemoryLeaseStore {
    leases: RwLock<HashMap<LeaseId, Lease>>,
}

impl InMemoryLeaseStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LeaseStore for InMemoryLeaseStore {
    async fn get(&self, id: LeaseId) -> EngineResult<Lease> {
        self.leases
            .read()
            .get(&id)
            .filter(|l| !l.deleted)
            .cloned()
            .ok_or_else(|| not_found("lease", id))
    }

    async fn list_active(&self, org_id: OrgId) -> EngineResult<Vec<Lease>> {
        use crate::domain::lease::LeaseStatus;
        let mut leases: Vec<Lease> = self
            .leases
            .read()
            .values()
            .filter(|l| l.org_id == org_id && !l.deleted && l.status == LeaseStatus::Active)
            .cloned()
            .collect();
        leases.sort_by_key(|l| l.id);
        Ok(leases)
    }

    async fn upsert(&self, lease: Lease) -> EngineResult<()> {
        self.leases.write().insert(lease.id, lease);
        Ok(())
    }
}

// ---------------------------------------------------------------------
// Lease billing settings
// ---------------------------------------------------------------------

#[async_trait]
pub trait LeaseBillingSettingStore: Send + Sync {
    /// Returns the stored setting, or a method-default one when none exists
    /// (§3: "default proration method when no setting exists is
    /// ActualDaysInMonth").
    async fn get_or_default(&self, lease_id: LeaseId) -> LeaseBillingSetting;
    async fn upsert(&self, setting: LeaseBillingSetting) -> EngineResult<()>;
}

#[derive(Default)]
pub struct InMemoryLeaseBillingSettingStore {
    settings: RwLock<HashMap<LeaseId, LeaseBillingSetting>>,
}

impl InMemoryLeaseBillingSettingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LeaseBillingSettingStore for InMemoryLeaseBillingSettingStore {
    async fn get_or_default(&self, lease_id: LeaseId) -> LeaseBillingSetting {
        self.settings
            .read()
            .get(&lease_id)
            .copied()
            .unwrap_or(LeaseBillingSetting {
                lease_id,
                billing_day: LeaseBillingSetting::MIN_BILLING_DAY,
                proration_method: Default::default(),
            })
    }

    async fn upsert(&self, setting: LeaseBillingSetting) -> EngineResult<()> {
        if !LeaseBillingSetting::is_billing_day_valid(setting.billing_day) {
            return Err(EngineError::InvalidArgument(format!(
                "billing_day {} outside 1-28",
                setting.billing_day
            )));
        }
        self.settings.write().insert(setting.lease_id, setting);
        Ok(())
    }
}

// ---------------------------------------------------------------------
// Charge type catalog
// ---------------------------------------------------------------------

#[async_trait]
pub trait ChargeTypeStore: Send + Sync {
    /// Resolves by code, organization-scoped entries first, falling back to
    /// a system-defined entry of the same code (§4.6).
    async fn resolve(&self, org_id: OrgId, code: &str) -> EngineResult<ChargeType>;
    async fn get(&self, id: ChargeTypeId) -> EngineResult<ChargeType>;
    async fn upsert(&self, charge_type: ChargeType) -> EngineResult<()>;
}

#[derive(Default)]
pub struct InMemoryChargeTypeStore {
    by_id: RwLock<HashMap<ChargeTypeId, ChargeType>>,
}

impl InMemoryChargeTypeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the system-defined `RENT` entry every engine needs (its absence
    /// is fatal to rent-line assembly, §4.6) plus one system-defined entry
    /// per `UtilityType`, so tests don't need to hand-roll the catalog.
    pub fn seed_system_defaults(&self) {
        use crate::domain::lease::RENT_CHARGE_TYPE_CODE;
        use crate::domain::utility::UtilityType;

        let mut by_id = self.by_id.write();
        let rent = ChargeType {
            id: ChargeTypeId::new(),
            org_id: None,
            code: RENT_CHARGE_TYPE_CODE.to_string(),
            name: "Rent".to_string(),
            system_defined: true,
            active: true,
        };
        by_id.insert(rent.id, rent);

        for (utility_type, name) in [
            (UtilityType::Electricity, "Electricity"),
            (UtilityType::Water, "Water"),
            (UtilityType::Gas, "Gas"),
        ] {
            let charge_type = ChargeType {
                id: ChargeTypeId::new(),
                org_id: None,
                code: utility_type.charge_type_code().to_string(),
                name: name.to_string(),
                system_defined: true,
                active: true,
            };
            by_id.insert(charge_type.id, charge_type);
        }
    }
}

#[async_trait]
impl ChargeTypeStore for InMemoryChargeTypeStore {
    async fn resolve(&self, org_id: OrgId, code: &str) -> EngineResult<ChargeType> {
        let catalog = self.by_id.read();
        catalog
            .values()
            .find(|c| c.active && c.code == code && c.org_id == Some(org_id))
            .or_else(|| {
                catalog
                    .values()
                    .find(|c| c.active && c.code == code && c.system_defined)
            })
            .cloned()
            .ok_or_else(|| not_found("charge type", code))
    }

    async fn get(&self, id: ChargeTypeId) -> EngineResult<ChargeType> {
        self.by_id
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("charge type", id))
    }

    async fn upsert(&self, charge_type: ChargeType) -> EngineResult<()> {
        self.by_id.write().insert(charge_type.id, charge_type);
        Ok(())
    }
}

// ---------------------------------------------------------------------
// Invoices
// ---------------------------------------------------------------------

#[async_trait]
pub trait InvoiceStore: Send + Sync {
    async fn get(&self, id: InvoiceId) -> EngineResult<Invoice>;
    async fn find_by_lease_period(
        &self,
        lease_id: LeaseId,
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> EngineResult<Option<Invoice>>;
    /// First persistence of a brand-new invoice (C6 create path).
    async fn insert(&self, invoice: Invoice) -> EngineResult<()>;
    /// Update under optimistic concurrency; returns the stored invoice with
    /// its freshly advanced token.
    async fn update(&self, invoice: Invoice, expected: ConcurrencyToken) -> EngineResult<Invoice>;
}

#[derive(Default)]
pub struct InMemoryInvoiceStore {
    invoices: RwLock<HashMap<InvoiceId, Invoice>>,
}

impl InMemoryInvoiceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl InvoiceStore for InMemoryInvoiceStore {
    async fn get(&self, id: InvoiceId) -> EngineResult<Invoice> {
        self.invoices
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("invoice", id))
    }

    async fn find_by_lease_period(
        &self,
        lease_id: LeaseId,
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> EngineResult<Option<Invoice>> {
        Ok(self
            .invoices
            .read()
            .values()
            .find(|inv| {
                inv.lease_id == lease_id
                    && inv.period_start == period_start
                    && inv.period_end == period_end
            })
            .cloned())
    }

    async fn insert(&self, invoice: Invoice) -> EngineResult<()> {
        let mut guard = self.invoices.write();
        if guard.contains_key(&invoice.id) {
            return Err(EngineError::Conflict(format!(
                "invoice {} already exists",
                invoice.id
            )));
        }
        guard.insert(invoice.id, invoice);
        Ok(())
    }

    async fn update(&self, invoice: Invoice, expected: ConcurrencyToken) -> EngineResult<Invoice> {
        let mut guard = self.invoices.write();
        let current = guard
            .get(&invoice.id)
            .ok_or_else(|| not_found("invoice", invoice.id))?;
        if current.concurrency_token != expected {
            return Err(conflict("invoice", invoice.id));
        }
        let mut updated = invoice;
        updated.concurrency_token = expected.advance();
        guard.insert(updated.id, updated.clone());
        Ok(updated)
    }
}

// ---------------------------------------------------------------------
// Credit notes
// ---------------------------------------------------------------------

#[async_trait]
pub trait CreditNoteStore: Send + Sync {
    async fn get(&self, id: CreditNoteId) -> EngineResult<CreditNote>;
    async fn list_by_invoice(&self, invoice_id: InvoiceId) -> EngineResult<Vec<CreditNote>>;
    async fn insert(&self, note: CreditNote) -> EngineResult<()>;
    async fn update(&self, note: CreditNote, expected: ConcurrencyToken) -> EngineResult<CreditNote>;
    /// Sum of absolute credited amounts already recorded against one invoice
    /// line, across every credit note (§3: per-line exhaustion invariant).
    async fn credited_amount_for_line(
        &self,
        invoice_id: InvoiceId,
        invoice_line_number: u32,
    ) -> EngineResult<Money>;
}

#[derive(Default)]
pub struct InMemoryCreditNoteStore {
    notes: RwLock<HashMap<CreditNoteId, CreditNote>>,
}

impl InMemoryCreditNoteStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CreditNoteStore for InMemoryCreditNoteStore {
    async fn get(&self, id: CreditNoteId) -> EngineResult<CreditNote> {
        self.notes
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("credit note", id))
    }

    async fn list_by_invoice(&self, invoice_id: InvoiceId) -> EngineResult<Vec<CreditNote>> {
        Ok(self
            .notes
            .read()
            .values()
            .filter(|n| n.invoice_id == invoice_id)
            .cloned()
            .collect())
    }

    async fn insert(&self, note: CreditNote) -> EngineResult<()> {
        self.notes.write().insert(note.id, note);
        Ok(())
    }

    async fn update(
        &self,
        note: CreditNote,
        expected: ConcurrencyToken,
    ) -> EngineResult<CreditNote> {
        let mut guard = self.notes.write();
        let current = guard
            .get(&note.id)
            .ok_or_else(|| not_found("credit note", note.id))?;
        if current.concurrency_token != expected {
            return Err(conflict("credit note", note.id));
        }
        let mut updated = note;
        updated.concurrency_token = expected.advance();
        guard.insert(updated.id, updated.clone());
        Ok(updated)
    }

    async fn credited_amount_for_line(
        &self,
        invoice_id: InvoiceId,
        invoice_line_number: u32,
    ) -> EngineResult<Money> {
        let total: Money = self
            .notes
            .read()
            .values()
            .filter(|n| n.invoice_id == invoice_id)
            .flat_map(|n| n.lines.iter())
            .filter(|l| l.invoice_line_number == invoice_line_number)
            .map(|l| -l.amount)
            .sum();
        Ok(total)
    }
}

// ---------------------------------------------------------------------
// Utility rate plans
// ---------------------------------------------------------------------

#[async_trait]
pub trait UtilityRatePlanStore: Send + Sync {
    async fn get(&self, id: UtilityRatePlanId) -> EngineResult<UtilityRatePlan>;
    async fn upsert(&self, plan: UtilityRatePlan) -> EngineResult<()>;
}

#[derive(Default)]
pub struct InMemoryUtilityRatePlanStore {
    plans: RwLock<HashMap<UtilityRatePlanId, UtilityRatePlan>>,
}

impl InMemoryUtilityRatePlanStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UtilityRatePlanStore for InMemoryUtilityRatePlanStore {
    async fn get(&self, id: UtilityRatePlanId) -> EngineResult<UtilityRatePlan> {
        self.plans
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("utility rate plan", id))
    }

    async fn upsert(&self, plan: UtilityRatePlan) -> EngineResult<()> {
        self.plans.write().insert(plan.id, plan);
        Ok(())
    }
}

// ---------------------------------------------------------------------
// Utility statements (raw CRUD; versioning rules live in C9's service)
// ---------------------------------------------------------------------

#[async_trait]
pub trait UtilityStatementStore: Send + Sync {
    async fn list_by_key(
        &self,
        lease_id: LeaseId,
        utility_type: UtilityType,
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> EngineResult<Vec<UtilityStatement>>;
    async fn insert(&self, statement: UtilityStatement) -> EngineResult<()>;
}

#[derive(Default)]
pub struct InMemoryUtilityStatementStore {
    statements: RwLock<Vec<UtilityStatement>>,
}

impl InMemoryUtilityStatementStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UtilityStatementStore for InMemoryUtilityStatementStore {
    async fn list_by_key(
        &self,
        lease_id: LeaseId,
        utility_type: UtilityType,
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> EngineResult<Vec<UtilityStatement>> {
        Ok(self
            .statements
            .read()
            .iter()
            .filter(|s| {
                s.lease_id == lease_id
                    && s.utility_type == utility_type
                    && s.period_start == period_start
                    && s.period_end == period_end
            })
            .cloned()
            .collect())
    }

    async fn insert(&self, statement: UtilityStatement) -> EngineResult<()> {
        self.statements.write().push(statement);
        Ok(())
    }
}

// ---------------------------------------------------------------------
// Number sequences
// ---------------------------------------------------------------------

#[async_trait]
pub trait NumberSequenceStore: Send + Sync {
    /// Atomically increments and returns the next value for (org, kind),
    /// starting at 1 (§4.5: "concurrent callers receive distinct values").
    async fn increment_and_get(&self, org_id: OrgId, kind: DocumentKind) -> EngineResult<u64>;
}

#[derive(Default)]
pub struct InMemoryNumberSequenceStore {
    counters: RwLock<HashMap<(OrgId, DocumentKind), u64>>,
}

impl InMemoryNumberSequenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NumberSequenceStore for InMemoryNumberSequenceStore {
    async fn increment_and_get(&self, org_id: OrgId, kind: DocumentKind) -> EngineResult<u64> {
        let mut guard = self.counters.write();
        let next = guard.entry((org_id, kind)).or_insert(0);
        *next += 1;
        Ok(*next)
    }
}

// ---------------------------------------------------------------------
// Invoice runs
// ---------------------------------------------------------------------

#[async_trait]
pub trait InvoiceRunStore: Send + Sync {
    async fn get(&self, id: InvoiceRunId) -> EngineResult<InvoiceRun>;
    async fn upsert(&self, run: InvoiceRun) -> EngineResult<()>;
}

#[derive(Default)]
pub struct InMemoryInvoiceRunStore {
    runs: RwLock<HashMap<InvoiceRunId, InvoiceRun>>,
}

impl InMemoryInvoiceRunStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl InvoiceRunStore for InMemoryInvoiceRunStore {
    async fn get(&self, id: InvoiceRunId) -> EngineResult<InvoiceRun> {
        self.runs
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("invoice run", id))
    }

    async fn upsert(&self, run: InvoiceRun) -> EngineResult<()> {
        self.runs.write().insert(run.id, run);
        Ok(())
    }
}
