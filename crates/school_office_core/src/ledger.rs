//! crates/school_office_core/src/ledger.rs
//!
//! The obligation store. A reducer-style collection of obligation accounts:
//! every change goes through `ObligationLedger::dispatch`, and every action
//! that touches payments or dates re-derives the affected statuses.

use crate::domain::{
    ObligationAccount, ObligationStatus, ObligationType, PaymentObligation, PaymentRecord,
};
use crate::status::{balance, total_paid};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LedgerError {
    #[error("Obligation {0} not found")]
    ObligationNotFound(Uuid),
    #[error("Payment {payment_id} not found on obligation {obligation_id}")]
    PaymentNotFound { obligation_id: Uuid, payment_id: Uuid },
    #[error("Invalid obligation: {0}")]
    Validation(String),
}

/// Field changes for an existing obligation. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObligationChanges {
    pub student_name: Option<String>,
    pub obligation_type: Option<ObligationType>,
    pub amount: Option<Decimal>,
    pub due_date: Option<NaiveDate>,
    pub period: Option<String>,
    pub notes: Option<Option<String>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LedgerAction {
    Add(PaymentObligation),
    /// Adds every obligation in one pass; rejected as a whole if any is invalid.
    AddMany(Vec<PaymentObligation>),
    Update {
        id: Uuid,
        changes: ObligationChanges,
    },
    Delete(Uuid),
    RecordPayment {
        obligation_id: Uuid,
        payment: PaymentRecord,
    },
    DeletePayment {
        obligation_id: Uuid,
        payment_id: Uuid,
    },
    RefreshStatuses,
}

/// Narrows a listing down by student and/or status.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObligationFilter {
    pub student_id: Option<String>,
    pub status: Option<ObligationStatus>,
}

impl ObligationFilter {
    fn matches(&self, obligation: &PaymentObligation) -> bool {
        self.student_id
            .as_deref()
            .map_or(true, |id| obligation.student_id == id)
            && self.status.map_or(true, |s| obligation.status == s)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub pending: usize,
    pub partial: usize,
    pub paid: usize,
    pub overdue: usize,
}

impl StatusCounts {
    fn bump(&mut self, status: ObligationStatus) {
        match status {
            ObligationStatus::Pending => self.pending += 1,
            ObligationStatus::Partial => self.partial += 1,
            ObligationStatus::Paid => self.paid += 1,
            ObligationStatus::Overdue => self.overdue += 1,
        }
    }
}

/// Dashboard totals across the whole ledger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedgerSummary {
    pub total_due: Decimal,
    pub total_collected: Decimal,
    pub outstanding: Decimal,
    pub counts: StatusCounts,
}

pub(crate) fn ensure_positive(amount: Decimal, what: &str) -> Result<(), String> {
    if amount > Decimal::ZERO {
        Ok(())
    } else {
        Err(format!("{} must be greater than zero, got {}", what, amount))
    }
}

//=========================================================================================
// The Ledger
//=========================================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObligationLedger {
    accounts: Vec<ObligationAccount>,
}

impl ObligationLedger {
    /// Wraps loaded accounts as they were stored; call `refresh_statuses` afterwards.
    pub fn new(accounts: Vec<ObligationAccount>) -> Self {
        Self { accounts }
    }

    pub fn accounts(&self) -> &[ObligationAccount] {
        &self.accounts
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    pub fn get(&self, id: Uuid) -> Option<&ObligationAccount> {
        self.accounts.iter().find(|a| a.obligation.id == id)
    }

    pub fn filter(&self, filter: &ObligationFilter) -> Vec<&ObligationAccount> {
        self.accounts
            .iter()
            .filter(|a| filter.matches(&a.obligation))
            .collect()
    }

    pub fn summary(&self) -> LedgerSummary {
        let mut summary = LedgerSummary::default();
        for account in &self.accounts {
            let b = balance(account.obligation.amount, &account.payments);
            summary.total_due += account.obligation.amount;
            summary.total_collected += b.total_paid;
            summary.outstanding += b.remaining;
            summary.counts.bump(account.obligation.status);
        }
        summary
    }

    /// Re-derives every status. Returns how many obligations changed.
    pub fn refresh_statuses(&mut self, today: NaiveDate) -> usize {
        let mut changed = 0;
        for account in &mut self.accounts {
            if account.obligation.refresh_status(&account.payments, today) {
                changed += 1;
            }
        }
        changed
    }

    /// Applies one action. On error the ledger is left untouched.
    pub fn dispatch(
        &mut self,
        action: LedgerAction,
        now: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        let today = now.date_naive();
        match action {
            LedgerAction::Add(obligation) => {
                self.insert_all(vec![obligation], today)?;
            }
            LedgerAction::AddMany(obligations) => {
                self.insert_all(obligations, today)?;
            }
            LedgerAction::Update { id, changes } => {
                if let Some(amount) = changes.amount {
                    ensure_positive(amount, "Amount").map_err(LedgerError::Validation)?;
                }
                let account = self.account_mut(id)?;
                apply_changes(&mut account.obligation, changes);
                account.obligation.updated_at = now;
                account.obligation.refresh_status(&account.payments, today);
            }
            LedgerAction::Delete(id) => {
                let before = self.accounts.len();
                self.accounts.retain(|a| a.obligation.id != id);
                if self.accounts.len() == before {
                    return Err(LedgerError::ObligationNotFound(id));
                }
            }
            LedgerAction::RecordPayment {
                obligation_id,
                payment,
            } => {
                ensure_positive(payment.amount, "Payment amount").map_err(LedgerError::Validation)?;
                let account = self.account_mut(obligation_id)?;
                account.payments.push(payment);
                account.obligation.updated_at = now;
                account.obligation.refresh_status(&account.payments, today);
            }
            LedgerAction::DeletePayment {
                obligation_id,
                payment_id,
            } => {
                let account = self.account_mut(obligation_id)?;
                let before = account.payments.len();
                account.payments.retain(|p| p.id != payment_id);
                if account.payments.len() == before {
                    return Err(LedgerError::PaymentNotFound {
                        obligation_id,
                        payment_id,
                    });
                }
                account.obligation.updated_at = now;
                account.obligation.refresh_status(&account.payments, today);
            }
            LedgerAction::RefreshStatuses => {
                self.refresh_statuses(today);
            }
        }
        Ok(())
    }

    /// Total paid against one obligation, if it exists.
    pub fn total_paid(&self, id: Uuid) -> Option<Decimal> {
        self.get(id).map(|a| total_paid(&a.payments))
    }

    fn account_mut(&mut self, id: Uuid) -> Result<&mut ObligationAccount, LedgerError> {
        self.accounts
            .iter_mut()
            .find(|a| a.obligation.id == id)
            .ok_or(LedgerError::ObligationNotFound(id))
    }

    fn insert_all(
        &mut self,
        obligations: Vec<PaymentObligation>,
        today: NaiveDate,
    ) -> Result<(), LedgerError> {
        for obligation in &obligations {
            ensure_positive(obligation.amount, "Amount").map_err(LedgerError::Validation)?;
            if self.get(obligation.id).is_some() {
                return Err(LedgerError::Validation(format!(
                    "Obligation {} already exists",
                    obligation.id
                )));
            }
        }
        self.accounts.extend(obligations.into_iter().map(|mut obligation| {
            obligation.refresh_status(&[], today);
            ObligationAccount {
                obligation,
                payments: Vec::new(),
            }
        }));
        Ok(())
    }
}

fn apply_changes(obligation: &mut PaymentObligation, changes: ObligationChanges) {
    if let Some(name) = changes.student_name {
        obligation.student_name = name;
    }
    if let Some(t) = changes.obligation_type {
        obligation.obligation_type = t;
    }
    if let Some(amount) = changes.amount {
        obligation.amount = amount;
    }
    if let Some(due) = changes.due_date {
        obligation.due_date = due;
    }
    if let Some(period) = changes.period {
        obligation.period = period;
    }
    if let Some(notes) = changes.notes {
        obligation.notes = notes;
    }
}
