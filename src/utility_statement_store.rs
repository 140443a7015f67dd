//! C9 — Utility Statement Store (§4.9). Versioning rules over the raw
//! [`crate::store::UtilityStatementStore`] CRUD layer.

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::clock::ClockProvider;
use crate::domain::utility::{SlabContribution, UtilityStatement, UtilityType};
use crate::error::{EngineError, EngineResult};
use crate::ids::{LeaseId, UtilityStatementId};
use crate::money::Money;
use crate::store::UtilityStatementStore;

pub struct UtilityStatementService {
    store: Arc<dyn UtilityStatementStore>,
    clock: Arc<dyn ClockProvider>,
}

/// Fields the caller supplies for a new statement; `version`, `id`, and
/// `created_at` are assigned by the service.
pub struct NewUtilityStatement {
    pub lease_id: LeaseId,
    pub utility_type: UtilityType,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub is_meter_based: bool,
    pub units_consumed: Option<Decimal>,
    pub total_amount: Money,
    pub slab_breakdown: Vec<SlabContribution>,
    pub is_final: bool,
}

impl UtilityStatementService {
    pub fn new(store: Arc<dyn UtilityStatementStore>, clock: Arc<dyn ClockProvider>) -> Self {
        Self { store, clock }
    }

    /// `UtilityStatement.Upsert(...)`. Late arrival (current date > period
    /// end) is accepted without restriction (§4.9).
    pub async fn upsert(&self, input: NewUtilityStatement) -> EngineResult<UtilityStatement> {
        let existing = self
            .store
            .list_by_key(
                input.lease_id,
                input.utility_type,
                input.period_start,
                input.period_end,
            )
            .await?;

        if input.is_final && existing.iter().any(|s| s.is_final) {
            return Err(EngineError::Conflict(format!(
                "a final utility statement already exists for lease {} / {:?} / {}..{}",
                input.lease_id, input.utility_type, input.period_start, input.period_end
            )));
        }

        let version = existing.iter().map(|s| s.version).max().unwrap_or(0) + 1;
        let statement = UtilityStatement {
            id: UtilityStatementId::new(),
            lease_id: input.lease_id,
            utility_type: input.utility_type,
            period_start: input.period_start,
            period_end: input.period_end,
            is_meter_based: input.is_meter_based,
            units_consumed: input.units_consumed,
            total_amount: input.total_amount,
            slab_breakdown: input.slab_breakdown,
            version,
            is_final: input.is_final,
            created_at: self.clock.now_utc(),
        };
        self.store.insert(statement.clone()).await?;
        Ok(statement)
    }

    pub async fn list_for_period(
        &self,
        lease_id: LeaseId,
        utility_type: UtilityType,
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> EngineResult<Vec<UtilityStatement>> {
        self.store
            .list_by_key(lease_id, utility_type, period_start, period_end)
            .await
    }

    pub async fn final_statement(
        &self,
        lease_id: LeaseId,
        utility_type: UtilityType,
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> EngineResult<Option<UtilityStatement>> {
        Ok(self
            .list_for_period(lease_id, utility_type, period_start, period_end)
            .await?
            .into_iter()
            .find(|s| s.is_final))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::store::InMemoryUtilityStatementStore;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn service() -> UtilityStatementService {
        let clock = Arc::new(FixedClock(Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap()));
        UtilityStatementService::new(Arc::new(InMemoryUtilityStatementStore::new()), clock)
    }

    fn input(lease_id: LeaseId, is_final: bool) -> NewUtilityStatement {
        NewUtilityStatement {
            lease_id,
            utility_type: UtilityType::Electricity,
            period_start: d(2024, 1, 1),
            period_end: d(2024, 1, 31),
            is_meter_based: true,
            units_consumed: Some(dec!(100)),
            total_amount: Money::round(dec!(300)),
            slab_breakdown: vec![],
            is_final,
        }
    }

    #[tokio::test]
    async fn first_statement_is_version_one() {
        let svc = service();
        let statement = svc.upsert(input(LeaseId::new(), true)).await.unwrap();
        assert_eq!(statement.version, 1);
    }

    #[tokio::test]
    async fn subsequent_statement_increments_version() {
        let svc = service();
        let lease_id = LeaseId::new();
        svc.upsert(input(lease_id, false)).await.unwrap();
        let second = svc.upsert(input(lease_id, false)).await.unwrap();
        assert_eq!(second.version, 2);
    }

    #[tokio::test]
    async fn second_final_statement_for_same_key_conflicts() {
        let svc = service();
        let lease_id = LeaseId::new();
        svc.upsert(input(lease_id, true)).await.unwrap();
        let err = svc.upsert(input(lease_id, true)).await.unwrap_err();
        assert!(matches!(err, EngineError::Conflict(_)));
    }

    #[tokio::test]
    async fn non_final_after_final_is_allowed_as_history() {
        let svc = service();
        let lease_id = LeaseId::new();
        svc.upsert(input(lease_id, true)).await.unwrap();
        let third = svc.upsert(input(lease_id, false)).await.unwrap();
        assert_eq!(third.version, 2);
        assert!(!third.is_final);
    }
}
