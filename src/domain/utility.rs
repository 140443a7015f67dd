//! Utility rate plans, slabs, and statements (§3, §4.4, §4.9).

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ids::{LeaseId, UtilityRatePlanId, UtilityStatementId};
use crate::money::Money;

/// Utility type billed (§6: at least `Electricity | Water | Gas`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UtilityType {
    Electricity,
    Water,
    Gas,
}

impl UtilityType {
    /// The system-defined charge-type catalog code for this utility (§3's
    /// Charge Type example lists `UTIL_ELEC` alongside `RENT`/`MAINT`).
    pub fn charge_type_code(&self) -> &'static str {
        match self {
            UtilityType::Electricity => "UTIL_ELEC",
            UtilityType::Water => "UTIL_WATER",
            UtilityType::Gas => "UTIL_GAS",
        }
    }
}

/// One tier of a tiered utility rate plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UtilityRateSlab {
    pub order: u32,
    pub from_units: Decimal,
    /// Exclusive upper bound; `None` means the top, open-ended tier.
    pub to_units: Option<Decimal>,
    pub rate_per_unit: Decimal,
    pub fixed_charge: Money,
}

/// Tiered or flat pricing plan for one utility type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UtilityRatePlan {
    pub id: UtilityRatePlanId,
    pub utility_type: UtilityType,
    pub active: bool,
    pub slabs: Vec<UtilityRateSlab>,
}

impl UtilityRatePlan {
    /// Slabs in ascending order (§3: "slabs form a partition of [0, ∞)").
    pub fn slabs_in_order(&self) -> Vec<&UtilityRateSlab> {
        let mut slabs: Vec<&UtilityRateSlab> = self.slabs.iter().collect();
        slabs.sort_by_key(|s| s.order);
        slabs
    }
}

/// One slab's contribution to a slab-tariff calculation, for the breakdown
/// kept on a `UtilityStatement`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlabContribution {
    pub slab_order: u32,
    pub units_in_slab: Decimal,
    pub amount: Money,
}

/// The computed utility bill for one (lease, utility type, billing period).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UtilityStatement {
    pub id: UtilityStatementId,
    pub lease_id: LeaseId,
    pub utility_type: UtilityType,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub is_meter_based: bool,
    pub units_consumed: Option<Decimal>,
    pub total_amount: Money,
    pub slab_breakdown: Vec<SlabContribution>,
    pub version: u32,
    pub is_final: bool,
    pub created_at: DateTime<Utc>,
}
