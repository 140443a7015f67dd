//! C2 — Rent Calculator (§4.2).

use chrono::NaiveDate;

use crate::domain::lease::{Lease, ProrationMethod, RentTerm};
use crate::error::{EngineError, EngineResult};
use crate::ids::RentTermId;
use crate::money::Money;
use crate::proration::prorate;

/// One rent line produced for a surviving rent-term overlap.
#[derive(Debug, Clone)]
pub struct RentLineItem {
    pub term_id: RentTermId,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub full_monthly_rent: Money,
    pub amount: Money,
    pub is_prorated: bool,
}

#[derive(Debug, Clone)]
pub struct RentCalculation {
    pub total: Money,
    pub line_items: Vec<RentLineItem>,
}

/// `calculateRent(lease, periodStart, periodEnd, method)`. The caller has
/// already loaded the lease (incl. rent terms); this function is pure.
pub fn calculate_rent(
    lease: &Lease,
    period_start: NaiveDate,
    period_end: NaiveDate,
    method: ProrationMethod,
) -> EngineResult<RentCalculation> {
    if period_end < period_start {
        return Err(EngineError::InvalidArgument(
            "periodEnd must not be before periodStart".to_string(),
        ));
    }

    let mut line_items = Vec::new();
    for term in lease.rent_terms_sorted() {
        if let Some(line) = term_line(term, period_start, period_end, method)? {
            line_items.push(line);
        }
    }

    let total: Money = line_items.iter().map(|l| l.amount).sum();
    Ok(RentCalculation { total, line_items })
}

fn term_line(
    term: &RentTerm,
    period_start: NaiveDate,
    period_end: NaiveDate,
    method: ProrationMethod,
) -> EngineResult<Option<RentLineItem>> {
    let overlap_start = term.effective_from.max(period_start);
    let overlap_end = term
        .effective_to
        .map(|to| to.min(period_end))
        .unwrap_or(period_end);
    if overlap_start > overlap_end {
        return Ok(None);
    }

    let is_prorated = overlap_start != period_start || overlap_end != period_end;
    let amount = if is_prorated {
        prorate(
            term.monthly_rent.as_decimal(),
            overlap_start,
            overlap_end,
            period_start,
            period_end,
            method,
        )?
    } else {
        term.monthly_rent
    };

    Ok(Some(RentLineItem {
        term_id: term.id,
        period_start: overlap_start,
        period_end: overlap_end,
        full_monthly_rent: term.monthly_rent,
        amount,
        is_prorated,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::lease::{Lease, LeaseStatus};
    use crate::ids::{LeaseId, OrgId, RentTermId, UnitId};
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn lease_with_terms(terms: Vec<RentTerm>) -> Lease {
        Lease {
            id: LeaseId::new(),
            org_id: OrgId::new(),
            unit_id: UnitId::new(),
            status: LeaseStatus::Active,
            start_date: d(2024, 1, 1),
            end_date: None,
            rent_terms: terms,
            recurring_charges: vec![],
            deleted: false,
        }
    }

    #[test]
    fn s1_mid_month_start_actual_days() {
        let lease_id = LeaseId::new();
        let lease = lease_with_terms(vec![RentTerm {
            id: RentTermId::new(),
            lease_id,
            monthly_rent: Money::round(dec!(10000)),
            effective_from: d(2024, 1, 15),
            effective_to: None,
        }]);
        let calc = calculate_rent(
            &lease,
            d(2024, 1, 1),
            d(2024, 1, 31),
            ProrationMethod::ActualDaysInMonth,
        )
        .unwrap();
        assert_eq!(calc.line_items.len(), 1);
        assert_eq!(calc.line_items[0].amount.to_string(), "5483.87");
        assert!(calc.line_items[0].is_prorated);
        assert_eq!(calc.total.to_string(), "5483.87");
    }

    #[test]
    fn s2_mid_month_term_change_two_lines() {
        let lease_id = LeaseId::new();
        let lease = lease_with_terms(vec![
            RentTerm {
                id: RentTermId::new(),
                lease_id,
                monthly_rent: Money::round(dec!(10000)),
                effective_from: d(2024, 1, 1),
                effective_to: Some(d(2024, 1, 15)),
            },
            RentTerm {
                id: RentTermId::new(),
                lease_id,
                monthly_rent: Money::round(dec!(12000)),
                effective_from: d(2024, 1, 16),
                effective_to: None,
            },
        ]);
        let calc = calculate_rent(
            &lease,
            d(2024, 1, 1),
            d(2024, 1, 31),
            ProrationMethod::ActualDaysInMonth,
        )
        .unwrap();
        assert_eq!(calc.line_items.len(), 2);
        assert_eq!(calc.line_items[0].amount.to_string(), "4838.71");
        assert_eq!(calc.line_items[1].amount.to_string(), "6193.55");
        assert_eq!(calc.total.to_string(), "11032.26");
    }

    #[test]
    fn full_open_ended_overlap_is_exact_no_proration() {
        let lease_id = LeaseId::new();
        let lease = lease_with_terms(vec![RentTerm {
            id: RentTermId::new(),
            lease_id,
            monthly_rent: Money::round(dec!(10000)),
            effective_from: d(2023, 1, 1),
            effective_to: None,
        }]);
        let calc = calculate_rent(
            &lease,
            d(2024, 1, 1),
            d(2024, 1, 31),
            ProrationMethod::ActualDaysInMonth,
        )
        .unwrap();
        assert_eq!(calc.line_items.len(), 1);
        assert!(!calc.line_items[0].is_prorated);
        assert_eq!(calc.line_items[0].amount.to_string(), "10000.00");
    }

    #[test]
    fn adjacent_terms_produce_two_lines_covering_full_period() {
        let lease_id = LeaseId::new();
        let lease = lease_with_terms(vec![
            RentTerm {
                id: RentTermId::new(),
                lease_id,
                monthly_rent: Money::round(dec!(1000)),
                effective_from: d(2024, 1, 1),
                effective_to: Some(d(2024, 1, 15)),
            },
            RentTerm {
                id: RentTermId::new(),
                lease_id,
                monthly_rent: Money::round(dec!(1000)),
                effective_from: d(2024, 1, 16),
                effective_to: Some(d(2024, 1, 31)),
            },
        ]);
        let calc = calculate_rent(
            &lease,
            d(2024, 1, 1),
            d(2024, 1, 31),
            ProrationMethod::ActualDaysInMonth,
        )
        .unwrap();
        assert_eq!(calc.line_items.len(), 2);
        let total_days = (calc.line_items[0].period_end - calc.line_items[0].period_start)
            .num_days()
            + 1
            + (calc.line_items[1].period_end - calc.line_items[1].period_start).num_days()
            + 1;
        assert_eq!(total_days, 31);
    }

    #[test]
    fn inverted_period_rejected() {
        let lease = lease_with_terms(vec![]);
        let err = calculate_rent(
            &lease,
            d(2024, 1, 31),
            d(2024, 1, 1),
            ProrationMethod::ActualDaysInMonth,
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::InvalidArgument(_)));
    }
}
