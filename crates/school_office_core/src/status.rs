//! crates/school_office_core/src/status.rs
//!
//! The status deriver: recomputes an obligation's payment status from the
//! payments recorded against it. Pure functions only.

use crate::domain::{ObligationStatus, PaymentObligation, PaymentRecord};
use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Sums the amounts of the given payments.
pub fn total_paid(payments: &[PaymentRecord]) -> Decimal {
    payments.iter().map(|p| p.amount).sum()
}

/// Derives the status of an obligation.
///
/// `paid` once the total covers the amount, `partial` for any smaller positive
/// total, `overdue` when nothing was paid and the due date has passed, and
/// `pending` otherwise. A partially paid obligation stays `partial` after its
/// due date.
pub fn derive_status(
    total_paid: Decimal,
    amount: Decimal,
    due_date: NaiveDate,
    today: NaiveDate,
) -> ObligationStatus {
    if total_paid >= amount {
        ObligationStatus::Paid
    } else if total_paid > Decimal::ZERO {
        ObligationStatus::Partial
    } else if today > due_date {
        ObligationStatus::Overdue
    } else {
        ObligationStatus::Pending
    }
}

/// How much of an obligation has been paid and how much remains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Balance {
    pub total_paid: Decimal,
    /// Never negative; overpayments leave nothing remaining.
    pub remaining: Decimal,
}

pub fn balance(amount: Decimal, payments: &[PaymentRecord]) -> Balance {
    let total_paid = total_paid(payments);
    let remaining = (amount - total_paid).max(Decimal::ZERO);
    Balance {
        total_paid,
        remaining,
    }
}

impl PaymentObligation {
    /// Re-derives `status` from the owning payments. Returns true when it changed.
    pub fn refresh_status(&mut self, payments: &[PaymentRecord], today: NaiveDate) -> bool {
        let status = derive_status(total_paid(payments), self.amount, self.due_date, today);
        let changed = status != self.status;
        self.status = status;
        changed
    }
}
