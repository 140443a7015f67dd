//! Billing engine core for a multi-tenant lease-management platform.
//!
//! Turns a lease's contractual state (rent terms, recurring charges, utility
//! readings, billing settings) into immutable financial documents (invoices,
//! credit notes), and executes that computation in bulk via batch runs.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────────────┐
//! │                          BillingEngine                                │
//! │                                                                       │
//! │  ┌─────────────┐ ┌──────────────┐ ┌────────────────┐ ┌─────────────┐  │
//! │  │  Proration  │ │     Rent     │ │   Recurring    │ │   Utility   │  │
//! │  │    (C1)     │ │   Calc (C2)  │ │  Charges (C3)  │ │  Calc (C4)  │  │
//! │  └─────────────┘ └──────────────┘ └────────────────┘ └─────────────┘  │
//! │                                                                       │
//! │  ┌─────────────────────┐  ┌───────────────────┐  ┌─────────────────┐ │
//! │  │ Invoice Generation   │  │ Invoice Lifecycle │  │ Credit Note     │ │
//! │  │        (C6)          │  │       (C7)        │  │ Service (C8)    │ │
//! │  └─────────────────────┘  └───────────────────┘  └─────────────────┘ │
//! │                                                                       │
//! │  ┌──────────────────┐  ┌──────────────────────┐  ┌─────────────────┐ │
//! │  │ Utility Statement │  │ Invoice Run          │  │ Number Sequence │ │
//! │  │ Store (C9)        │  │ Orchestrator (C10)   │  │ Generator (C5)  │ │
//! │  └──────────────────┘  └──────────────────────┘  └─────────────────┘ │
//! │                                                                       │
//! │                 Persistence & Unit of Work (C11)                     │
//! └───────────────────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]

/// Engine-wide error taxonomy and result alias.
pub mod error;
/// Fixed-point money.
pub mod money;
/// Entity identifier newtypes.
pub mod ids;
/// Wall-clock collaborator.
pub mod clock;
/// Caller identity collaborator.
pub mod principal;
/// Domain entities (§3).
pub mod domain;
/// C1 — proration calculator.
pub mod proration;
/// C2 — rent calculator.
pub mod rent;
/// C3 — recurring charge calculator.
pub mod recurring_charge;
/// C4 — utility calculator.
pub mod utility_calculator;
/// C5 — number sequence generator.
pub mod number_sequence;
/// C11 — persistence & unit of work.
pub mod store;
/// C6 — invoice generation service.
pub mod invoice_generation;
/// C7 — invoice lifecycle service.
pub mod invoice_lifecycle;
/// C8 — credit note service.
pub mod credit_note_service;
/// C9 — utility statement store.
pub mod utility_statement_store;
/// C10 — invoice run orchestrator.
pub mod invoice_run;

use std::sync::Arc;

pub use error::{EngineError, EngineResult};
pub use money::Money;

use clock::{ClockProvider, SystemClock};
use credit_note_service::CreditNoteService;
use invoice_generation::InvoiceGenerationService;
use invoice_lifecycle::InvoiceLifecycleService;
use invoice_run::InvoiceRunOrchestrator;
use number_sequence::NumberSequenceGenerator;
use principal::CurrentPrincipal;
use store::{
    ChargeTypeStore, CreditNoteStore, InMemoryChargeTypeStore, InMemoryCreditNoteStore,
    InMemoryInvoiceRunStore, InMemoryInvoiceStore, InMemoryLeaseBillingSettingStore,
    InMemoryLeaseStore, InMemoryNumberSequenceStore, InMemoryUtilityRatePlanStore,
    InMemoryUtilityStatementStore, InvoiceRunStore, InvoiceStore, LeaseBillingSettingStore,
    LeaseStore, NumberSequenceStore, UtilityRatePlanStore, UtilityStatementStore,
};
use utility_statement_store::UtilityStatementService;

/// Single entry point wiring together all eleven components, constructed
/// once with a clock and principal (§6, §9: "no global state and no service
/// locator"; every service takes its stores as explicit constructor inputs).
///
/// This is purely a wiring convenience over the component services below —
/// it introduces no behavior of its own.
pub struct BillingEngine {
    /// C11 — lease store.
    pub leases: Arc<dyn LeaseStore>,
    /// C11 — per-lease billing setting store.
    pub lease_billing_settings: Arc<dyn LeaseBillingSettingStore>,
    /// C11 — charge-type catalog store.
    pub charge_types: Arc<dyn ChargeTypeStore>,
    /// C11 — invoice store.
    pub invoices: Arc<dyn InvoiceStore>,
    /// C11 — credit note store.
    pub credit_notes: Arc<dyn CreditNoteStore>,
    /// C11 — utility rate plan store.
    pub utility_rate_plans: Arc<dyn UtilityRatePlanStore>,
    /// C11 — number sequence counter store.
    pub number_sequences: Arc<dyn NumberSequenceStore>,
    /// C11 — invoice run store.
    pub invoice_runs: Arc<dyn InvoiceRunStore>,
    /// C5.
    pub number_sequence: Arc<NumberSequenceGenerator>,
    /// C6.
    pub invoice_generation: Arc<InvoiceGenerationService>,
    /// C7.
    pub invoice_lifecycle: Arc<InvoiceLifecycleService>,
    /// C8.
    pub credit_note_service: Arc<CreditNoteService>,
    /// C9.
    pub utility_statements: Arc<UtilityStatementService>,
    /// C10.
    pub invoice_run: Arc<InvoiceRunOrchestrator>,
    clock: Arc<dyn ClockProvider>,
    principal: Arc<dyn CurrentPrincipal>,
}

impl BillingEngine {
    /// Wire a fresh engine over in-memory stores, seeding the system-defined
    /// charge-type catalog (§11) so it is immediately usable.
    pub fn new(clock: Arc<dyn ClockProvider>, principal: Arc<dyn CurrentPrincipal>) -> Self {
        let leases: Arc<dyn LeaseStore> = Arc::new(InMemoryLeaseStore::new());
        let lease_billing_settings: Arc<dyn LeaseBillingSettingStore> =
            Arc::new(InMemoryLeaseBillingSettingStore::new());
        let charge_type_store = Arc::new(InMemoryChargeTypeStore::new());
        charge_type_store.seed_system_defaults();
        let charge_types: Arc<dyn ChargeTypeStore> = charge_type_store;
        let invoices: Arc<dyn InvoiceStore> = Arc::new(InMemoryInvoiceStore::new());
        let credit_notes: Arc<dyn CreditNoteStore> = Arc::new(InMemoryCreditNoteStore::new());
        let utility_rate_plans: Arc<dyn UtilityRatePlanStore> =
            Arc::new(InMemoryUtilityRatePlanStore::new());
        let utility_statement_raw: Arc<dyn UtilityStatementStore> =
            Arc::new(InMemoryUtilityStatementStore::new());
        let number_sequences: Arc<dyn NumberSequenceStore> =
            Arc::new(InMemoryNumberSequenceStore::new());
        let invoice_runs: Arc<dyn InvoiceRunStore> = Arc::new(InMemoryInvoiceRunStore::new());

        let number_sequence = Arc::new(NumberSequenceGenerator::new(number_sequences.clone()));

        let invoice_generation = Arc::new(InvoiceGenerationService::new(
            leases.clone(),
            charge_types.clone(),
            invoices.clone(),
            number_sequence.clone(),
            clock.clone(),
            principal.clone(),
        ));
        let invoice_lifecycle = Arc::new(InvoiceLifecycleService::new(
            invoices.clone(),
            clock.clone(),
        ));
        let credit_note_service = Arc::new(CreditNoteService::new(
            invoices.clone(),
            credit_notes.clone(),
            number_sequence.clone(),
            clock.clone(),
            principal.clone(),
        ));
        let utility_statements = Arc::new(UtilityStatementService::new(
            utility_statement_raw.clone(),
            clock.clone(),
        ));
        let invoice_run = Arc::new(InvoiceRunOrchestrator::new(
            leases.clone(),
            invoice_runs.clone(),
            invoice_generation.clone(),
            clock.clone(),
        ));

        Self {
            leases,
            lease_billing_settings,
            charge_types,
            invoices,
            credit_notes,
            utility_rate_plans,
            number_sequences,
            invoice_runs,
            number_sequence,
            invoice_generation,
            invoice_lifecycle,
            credit_note_service,
            utility_statements,
            invoice_run,
            clock,
            principal,
        }
    }

    /// The clock this engine was constructed with.
    pub fn clock(&self) -> &Arc<dyn ClockProvider> {
        &self.clock
    }

    /// The principal this engine was constructed with.
    pub fn principal(&self) -> &Arc<dyn CurrentPrincipal> {
        &self.principal
    }
}

impl Default for BillingEngine {
    fn default() -> Self {
        use ids::{OrgId, UserId};
        use principal::StaticPrincipal;
        Self::new(
            Arc::new(SystemClock),
            Arc::new(StaticPrincipal::new(UserId::new(), OrgId::new())),
        )
    }
}
