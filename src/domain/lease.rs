//! Lease, rent terms, recurring charges, billing settings, and the charge-type
//! catalog (§3).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::ids::{ChargeTypeId, LeaseId, OrgId, RecurringChargeId, RentTermId, UnitId};
use crate::money::Money;

/// Lease lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeaseStatus {
    Draft,
    Active,
    Ended,
    Terminated,
}

/// Contract between landlord and tenant for a unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lease {
    pub id: LeaseId,
    pub org_id: OrgId,
    pub unit_id: UnitId,
    pub status: LeaseStatus,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub rent_terms: Vec<RentTerm>,
    pub recurring_charges: Vec<RecurringCharge>,
    /// Soft-delete flag (§4.11 / §9): invisible to ordinary reads once set.
    pub deleted: bool,
}

impl Lease {
    /// Rent terms overlapping the given date range, in effective-from order.
    /// Does not filter on overlap itself — callers (C2) do that.
    pub fn rent_terms_sorted(&self) -> Vec<&RentTerm> {
        let mut terms: Vec<&RentTerm> = self.rent_terms.iter().collect();
        terms.sort_by_key(|t| t.effective_from);
        terms
    }
}

/// A time-bounded monthly rent amount.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RentTerm {
    pub id: RentTermId,
    pub lease_id: LeaseId,
    pub monthly_rent: Money,
    pub effective_from: NaiveDate,
    pub effective_to: Option<NaiveDate>,
}

impl RentTerm {
    /// Whether `date` falls within this term's effective interval.
    pub fn covers(&self, date: NaiveDate) -> bool {
        date >= self.effective_from && self.effective_to.map(|to| date <= to).unwrap_or(true)
    }
}

/// Billing cadence for a recurring charge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BillingFrequency {
    Monthly,
    Quarterly,
    Yearly,
}

/// A standing monthly line against a lease (parking, storage, maintenance, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurringCharge {
    pub id: RecurringChargeId,
    pub lease_id: LeaseId,
    pub charge_type_id: ChargeTypeId,
    pub description: String,
    pub monthly_amount: Money,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub frequency: BillingFrequency,
    pub active: bool,
}

/// Proration policy (§4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProrationMethod {
    ActualDaysInMonth,
    ThirtyDayMonth,
}

impl Default for ProrationMethod {
    fn default() -> Self {
        ProrationMethod::ActualDaysInMonth
    }
}

/// Per-lease billing configuration (1:1 with a lease).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LeaseBillingSetting {
    pub lease_id: LeaseId,
    pub billing_day: u8,
    pub proration_method: ProrationMethod,
}

impl LeaseBillingSetting {
    /// The billing-day range allowed by §3: 1–28 inclusive.
    pub const MIN_BILLING_DAY: u8 = 1;
    pub const MAX_BILLING_DAY: u8 = 28;

    pub fn is_billing_day_valid(day: u8) -> bool {
        (Self::MIN_BILLING_DAY..=Self::MAX_BILLING_DAY).contains(&day)
    }
}

/// Catalog entry classifying invoice lines (e.g. `RENT`, `MAINT`, `UTIL_ELEC`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargeType {
    pub id: ChargeTypeId,
    pub org_id: Option<OrgId>,
    pub code: String,
    pub name: String,
    pub system_defined: bool,
    pub active: bool,
}

/// Well-known system charge-type code for rent lines (§4.6: missing this is fatal).
pub const RENT_CHARGE_TYPE_CODE: &str = "RENT";
