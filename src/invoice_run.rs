//! C10 — Invoice Run Orchestrator (§4.10). Bulk-generates rent invoices for
//! every active lease in an organization, tolerating per-lease failures.

use std::sync::Arc;

use chrono::NaiveDate;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::clock::ClockProvider;
use crate::domain::lease::ProrationMethod;
use crate::domain::run::{InvoiceRun, RunStatus};
use crate::error::EngineResult;
use crate::ids::{InvoiceRunId, OrgId};
use crate::invoice_generation::InvoiceGenerationService;
use crate::store::{InvoiceRunStore, LeaseStore};

pub struct InvoiceRunOrchestrator {
    lease_store: Arc<dyn LeaseStore>,
    invoice_run_store: Arc<dyn InvoiceRunStore>,
    generation: Arc<InvoiceGenerationService>,
    clock: Arc<dyn ClockProvider>,
}

impl InvoiceRunOrchestrator {
    pub fn new(
        lease_store: Arc<dyn LeaseStore>,
        invoice_run_store: Arc<dyn InvoiceRunStore>,
        generation: Arc<InvoiceGenerationService>,
        clock: Arc<dyn ClockProvider>,
    ) -> Self {
        Self {
            lease_store,
            invoice_run_store,
            generation,
            clock,
        }
    }

    /// `executeMonthlyRentRun(orgId, periodStart, periodEnd, method)`.
    ///
    /// Enumerates active leases in stable (identifier) order (§4.10 "Determinism
    /// requirement"), processes each concurrently via `tokio` tasks — each
    /// lease is visited at most once, so cross-lease concurrency never risks
    /// processing one lease twice within a run (§5) — and persists a run
    /// record with final status per §4.10 step 4.
    pub async fn execute_monthly_rent_run(
        &self,
        org_id: OrgId,
        period_start: NaiveDate,
        period_end: NaiveDate,
        method: ProrationMethod,
    ) -> EngineResult<InvoiceRun> {
        let run_id = InvoiceRunId::new();
        let mut run = InvoiceRun {
            id: run_id,
            org_id,
            run_at: self.clock.now_utc(),
            period_start,
            period_end,
            proration_method: method,
            total_leases: 0,
            success_count: 0,
            failure_count: 0,
            status: RunStatus::Running,
            error_messages: Vec::new(),
        };
        self.invoice_run_store.upsert(run.clone()).await?;

        let leases = self.lease_store.list_active(org_id).await?;
        run.total_leases = leases.len() as u32;

        let mut tasks = JoinSet::new();
        for lease in leases {
            let generation = self.generation.clone();
            tasks.spawn(async move {
                let outcome = generation
                    .generate(lease.id, period_start, period_end, method, &[])
                    .await;
                (lease.id, outcome)
            });
        }

        let mut results = Vec::with_capacity(run.total_leases as usize);
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((lease_id, outcome)) => results.push((lease_id, outcome)),
                Err(join_err) => {
                    run.failure_count += 1;
                    run.error_messages
                        .push(format!("task join error: {join_err}"));
                }
            }
        }
        // Stable ordering for the persisted error collection, independent of
        // task-completion order.
        results.sort_by_key(|(lease_id, _)| *lease_id);

        for (lease_id, outcome) in results {
            if outcome.success {
                run.success_count += 1;
            } else {
                run.failure_count += 1;
                let message = outcome
                    .error
                    .unwrap_or_else(|| "unknown failure".to_string());
                warn!(%lease_id, %message, "invoice generation failed during run");
                run.error_messages.push(format!("{lease_id}: {message}"));
            }
        }

        run.status = RunStatus::from_counts(run.total_leases, run.failure_count);
        info!(
            %org_id,
            total = run.total_leases,
            success = run.success_count,
            failure = run.failure_count,
            status = run.status.as_str(),
            "invoice run finished"
        );
        self.invoice_run_store.upsert(run.clone()).await?;
        Ok(run)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::domain::lease::{Lease, LeaseStatus, RentTerm};
    use crate::ids::{LeaseId, RentTermId, UnitId, UserId};
    use crate::money::Money;
    use crate::number_sequence::NumberSequenceGenerator;
    use crate::principal::StaticPrincipal;
    use crate::store::{
        InMemoryChargeTypeStore, InMemoryInvoiceRunStore, InMemoryInvoiceStore,
        InMemoryLeaseStore, InMemoryNumberSequenceStore,
    };
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    async fn active_lease(org_id: OrgId, lease_store: &InMemoryLeaseStore) -> LeaseId {
        let lease_id = LeaseId::new();
        lease_store
            .upsert(Lease {
                id: lease_id,
                org_id,
                unit_id: UnitId::new(),
                status: LeaseStatus::Active,
                start_date: d(2023, 1, 1),
                end_date: None,
                rent_terms: vec![RentTerm {
                    id: RentTermId::new(),
                    lease_id,
                    monthly_rent: Money::round(dec!(1000)),
                    effective_from: d(2023, 1, 1),
                    effective_to: None,
                }],
                recurring_charges: vec![],
                deleted: false,
            })
            .await
            .unwrap();
        lease_id
    }

    #[tokio::test]
    async fn run_over_active_leases_completes() {
        let lease_store = Arc::new(InMemoryLeaseStore::new());
        let charge_type_store = Arc::new(InMemoryChargeTypeStore::new());
        charge_type_store.seed_system_defaults();
        let invoice_store = Arc::new(InMemoryInvoiceStore::new());
        let invoice_run_store = Arc::new(InMemoryInvoiceRunStore::new());
        let number_sequence = Arc::new(NumberSequenceGenerator::new(Arc::new(
            InMemoryNumberSequenceStore::new(),
        )));
        let clock = Arc::new(FixedClock(Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap()));

        let org_id = OrgId::new();
        active_lease(org_id, &lease_store).await;
        active_lease(org_id, &lease_store).await;
        let principal = Arc::new(StaticPrincipal::new(UserId::new(), org_id));

        let generation = Arc::new(InvoiceGenerationService::new(
            lease_store.clone(),
            charge_type_store,
            invoice_store,
            number_sequence,
            clock.clone(),
            principal,
        ));
        let orchestrator =
            InvoiceRunOrchestrator::new(lease_store, invoice_run_store, generation, clock);

        let run = orchestrator
            .execute_monthly_rent_run(
                org_id,
                d(2024, 1, 1),
                d(2024, 1, 31),
                ProrationMethod::ActualDaysInMonth,
            )
            .await
            .unwrap();

        assert_eq!(run.total_leases, 2);
        assert_eq!(run.success_count, 2);
        assert_eq!(run.failure_count, 0);
        assert_eq!(run.status, RunStatus::Completed);
    }

    #[tokio::test]
    async fn zero_leases_completes_with_no_work() {
        let lease_store = Arc::new(InMemoryLeaseStore::new());
        let charge_type_store = Arc::new(InMemoryChargeTypeStore::new());
        let invoice_store = Arc::new(InMemoryInvoiceStore::new());
        let invoice_run_store = Arc::new(InMemoryInvoiceRunStore::new());
        let number_sequence = Arc::new(NumberSequenceGenerator::new(Arc::new(
            InMemoryNumberSequenceStore::new(),
        )));
        let clock = Arc::new(FixedClock(Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap()));
        let principal = Arc::new(StaticPrincipal::new(UserId::new(), OrgId::new()));

        let generation = Arc::new(InvoiceGenerationService::new(
            lease_store.clone(),
            charge_type_store,
            invoice_store,
            number_sequence,
            clock.clone(),
            principal,
        ));
        let orchestrator =
            InvoiceRunOrchestrator::new(lease_store, invoice_run_store, generation, clock);

        let run = orchestrator
            .execute_monthly_rent_run(
                OrgId::new(),
                d(2024, 1, 1),
                d(2024, 1, 31),
                ProrationMethod::ActualDaysInMonth,
            )
            .await
            .unwrap();

        assert_eq!(run.total_leases, 0);
        assert_eq!(run.status, RunStatus::Completed);
    }

    #[tokio::test]
    async fn missing_rent_charge_type_fails_that_lease_without_halting_run() {
        // No seed_system_defaults() call: every lease's RENT line assembly
        // fails `InvalidState`, so the whole run completes with total failure.
        let lease_store = Arc::new(InMemoryLeaseStore::new());
        let charge_type_store = Arc::new(InMemoryChargeTypeStore::new());
        let invoice_store = Arc::new(InMemoryInvoiceStore::new());
        let invoice_run_store = Arc::new(InMemoryInvoiceRunStore::new());
        let number_sequence = Arc::new(NumberSequenceGenerator::new(Arc::new(
            InMemoryNumberSequenceStore::new(),
        )));
        let clock = Arc::new(FixedClock(Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap()));

        let org_id = OrgId::new();
        active_lease(org_id, &lease_store).await;
        let principal = Arc::new(StaticPrincipal::new(UserId::new(), org_id));

        let generation = Arc::new(InvoiceGenerationService::new(
            lease_store.clone(),
            charge_type_store,
            invoice_store,
            number_sequence,
            clock.clone(),
            principal,
        ));
        let orchestrator =
            InvoiceRunOrchestrator::new(lease_store, invoice_run_store, generation, clock);

        let run = orchestrator
            .execute_monthly_rent_run(
                org_id,
                d(2024, 1, 1),
                d(2024, 1, 31),
                ProrationMethod::ActualDaysInMonth,
            )
            .await
            .unwrap();

        assert_eq!(run.status, RunStatus::Failed);
        assert_eq!(run.failure_count, 1);
        assert_eq!(run.error_messages.len(), 1);
    }
}
