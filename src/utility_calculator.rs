//! C4 — Utility Calculator (§4.4). Three dispatch modes over a utility
//! reading; none of them touch persistence directly (slab mode is handed an
//! already-loaded rate plan).

use rust_decimal::Decimal;

use crate::domain::utility::{SlabContribution, UtilityRatePlan};
use crate::error::{EngineError, EngineResult};
use crate::money::Money;

#[derive(Debug, Clone)]
pub struct UtilityCalculation {
    pub total: Money,
    pub is_meter_based: bool,
    pub units_consumed: Option<Decimal>,
    pub slab_breakdown: Vec<SlabContribution>,
}

/// `calculateAmountBased(amount, utilityType)`.
pub fn calculate_amount_based(amount: Decimal) -> EngineResult<UtilityCalculation> {
    let total = Money::non_negative(amount)?;
    Ok(UtilityCalculation {
        total,
        is_meter_based: false,
        units_consumed: None,
        slab_breakdown: Vec::new(),
    })
}

/// `calculateMeterFlatRate(units, ratePerUnit, fixedCharge, utilityType)`.
pub fn calculate_meter_flat_rate(
    units: Decimal,
    rate_per_unit: Decimal,
    fixed_charge: Money,
) -> EngineResult<UtilityCalculation> {
    if units.is_sign_negative() || rate_per_unit.is_sign_negative() {
        return Err(EngineError::InvalidArgument(
            "units and ratePerUnit must be non-negative".to_string(),
        ));
    }
    let total = Money::round(units * rate_per_unit) + fixed_charge;
    Ok(UtilityCalculation {
        total,
        is_meter_based: true,
        units_consumed: Some(units),
        slab_breakdown: Vec::new(),
    })
}

/// `calculateMeterSlabs(units, ratePlan, utilityType)`.
pub fn calculate_meter_slabs(
    units: Decimal,
    rate_plan: &UtilityRatePlan,
) -> EngineResult<UtilityCalculation> {
    if units.is_sign_negative() {
        return Err(EngineError::InvalidArgument(
            "units must be non-negative".to_string(),
        ));
    }
    if !rate_plan.active {
        return Err(EngineError::InvalidState(format!(
            "rate plan {} is inactive",
            rate_plan.id
        )));
    }
    if rate_plan.slabs.is_empty() {
        return Err(EngineError::InvalidState(format!(
            "rate plan {} has no slabs",
            rate_plan.id
        )));
    }

    // §4.4/L4: a slab with zero units allocated contributes nothing, fixed
    // charge included — a plan is never billed for usage that didn't happen.
    let mut remaining = units;
    let mut breakdown = Vec::new();
    for slab in rate_plan.slabs_in_order() {
        if remaining.is_zero() {
            break;
        }
        let slab_width = match slab.to_units {
            Some(to) => to - slab.from_units,
            None => remaining,
        };
        let units_in_slab = remaining.min(slab_width).max(Decimal::ZERO);
        if units_in_slab.is_zero() {
            continue;
        }
        let amount = Money::round(units_in_slab * slab.rate_per_unit) + slab.fixed_charge;
        breakdown.push(SlabContribution {
            slab_order: slab.order,
            units_in_slab,
            amount,
        });
        remaining -= units_in_slab;
    }

    let total: Money = breakdown.iter().map(|c| c.amount).sum();
    Ok(UtilityCalculation {
        total,
        is_meter_based: true,
        units_consumed: Some(units),
        slab_breakdown: breakdown,
    })
}
