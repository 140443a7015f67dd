//! C1 — Proration Calculator. Pure, stateless (§4.1).

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::domain::lease::ProrationMethod;
use crate::error::{EngineError, EngineResult};
use crate::money::Money;

/// `prorate(fullAmount, usageStart, usageEnd, periodStart, periodEnd, method)`.
///
/// Computes the overlap of `[usage_start, usage_end]` with
/// `[period_start, period_end]` and scales `full_amount` by the ratio of
/// overlap days to the method's denominator, rounding half-away-from-zero to
/// 2 decimal places.
pub fn prorate(
    full_amount: Decimal,
    usage_start: NaiveDate,
    usage_end: NaiveDate,
    period_start: NaiveDate,
    period_end: NaiveDate,
    method: ProrationMethod,
) -> EngineResult<Money> {
    if full_amount.is_sign_negative() && !full_amount.is_zero() {
        return Err(EngineError::InvalidArgument(format!(
            "full_amount must be non-negative, got {full_amount}"
        )));
    }
    if usage_start > usage_end {
        return Err(EngineError::InvalidArgument(
            "usage_start must not be after usage_end".to_string(),
        ));
    }
    if period_start > period_end {
        return Err(EngineError::InvalidArgument(
            "period_start must not be after period_end".to_string(),
        ));
    }

    let overlap_start = usage_start.max(period_start);
    let overlap_end = usage_end.min(period_end);
    if overlap_start > overlap_end {
        return Ok(Money::ZERO);
    }

    let overlap_days = (overlap_end - overlap_start).num_days() + 1;
    let denominator: i64 = match method {
        ProrationMethod::ActualDaysInMonth => (period_end - period_start).num_days() + 1,
        ProrationMethod::ThirtyDayMonth => 30,
    };

    let ratio = Decimal::from(overlap_days) / Decimal::from(denominator);
    Ok(Money::round(full_amount * ratio))
}
