//! C3 — Recurring Charge Calculator (§4.3).

use chrono::NaiveDate;

use crate::domain::lease::{BillingFrequency, ProrationMethod, RecurringCharge};
use crate::error::{EngineError, EngineResult};
use crate::ids::{ChargeTypeId, RecurringChargeId};
use crate::money::Money;
use crate::proration::prorate;

#[derive(Debug, Clone)]
pub struct RecurringChargeLineItem {
    pub charge_id: RecurringChargeId,
    pub charge_type_id: ChargeTypeId,
    pub description: String,
    pub amount: Money,
}

#[derive(Debug, Clone)]
pub struct RecurringChargeCalculation {
    pub total: Money,
    pub line_items: Vec<RecurringChargeLineItem>,
}

/// `calculateCharges(charges, periodStart, periodEnd, method)`. Non-monthly
/// frequencies are silently excluded (§4.3 point 4, locked by O3 in §12).
pub fn calculate_charges(
    charges: &[RecurringCharge],
    period_start: NaiveDate,
    period_end: NaiveDate,
    method: ProrationMethod,
) -> EngineResult<RecurringChargeCalculation> {
    if period_end < period_start {
        return Err(EngineError::InvalidArgument(
            "periodEnd must not be before periodStart".to_string(),
        ));
    }

    let mut line_items = Vec::new();
    let mut active: Vec<&RecurringCharge> = charges
        .iter()
        .filter(|c| c.active && c.frequency == BillingFrequency::Monthly)
        .collect();
    active.sort_by_key(|c| c.start_date);

    for charge in active {
        let overlap_start = charge.start_date.max(period_start);
        let overlap_end = charge
            .end_date
            .map(|e| e.min(period_end))
            .unwrap_or(period_end);
        if overlap_start > overlap_end {
            continue;
        }

        let amount = prorate(
            charge.monthly_amount.as_decimal(),
            overlap_start,
            overlap_end,
            period_start,
            period_end,
            method,
        )?;

        line_items.push(RecurringChargeLineItem {
            charge_id: charge.id,
            charge_type_id: charge.charge_type_id,
            description: charge.description.clone(),
            amount,
        });
    }

    let total: Money = line_items.iter().map(|l| l.amount).sum();
    Ok(RecurringChargeCalculation { total, line_items })
}
