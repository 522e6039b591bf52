//! crates/school_office_core/src/services/finance.rs
//!
//! The finance application service: owns the obligation ledger, persists it
//! through the key-value port after every successful mutation, and re-derives
//! statuses on load.

use crate::batch::{build_batch, BatchOutcome};
use crate::domain::{
    NewPayment, ObligationAccount, ObligationTemplate, PaymentObligation, StudentSelection,
};
use crate::ledger::{
    LedgerAction, LedgerSummary, ObligationChanges, ObligationFilter, ObligationLedger,
};
use crate::ports::{keys, load_collection, save_collection, Clock, KeyValueStore};
use crate::services::error::{ServiceError, ServiceResult};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

pub struct FinanceService {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    ledger: ObligationLedger,
}

impl FinanceService {
    /// Loads the stored obligations and refreshes their statuses against today,
    /// saving straight away if any obligation crossed its due date.
    pub async fn load(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> ServiceResult<Self> {
        let accounts: Vec<ObligationAccount> =
            load_collection(store.as_ref(), keys::PAYMENT_OBLIGATIONS).await?;
        let mut ledger = ObligationLedger::new(accounts);
        let changed = ledger.refresh_statuses(clock.now().date_naive());
        if changed > 0 {
            info!("{} obligation status(es) changed since last load", changed);
            save_collection(store.as_ref(), keys::PAYMENT_OBLIGATIONS, ledger.accounts()).await?;
        }
        info!("Loaded {} payment obligation(s)", ledger.len());
        Ok(Self { store, clock, ledger })
    }

    pub fn ledger(&self) -> &ObligationLedger {
        &self.ledger
    }

    pub fn list(&self, filter: &ObligationFilter) -> Vec<ObligationAccount> {
        self.ledger.filter(filter).into_iter().cloned().collect()
    }

    pub fn get(&self, id: Uuid) -> ServiceResult<ObligationAccount> {
        self.ledger
            .get(id)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(format!("Obligation {} not found", id)))
    }

    pub fn summary(&self) -> LedgerSummary {
        self.ledger.summary()
    }

    pub async fn create_obligation(
        &mut self,
        student_id: &str,
        student_name: &str,
        template: &ObligationTemplate,
    ) -> ServiceResult<ObligationAccount> {
        if student_id.trim().is_empty() || student_name.trim().is_empty() {
            return Err(ServiceError::Validation(
                "studentId and studentName are required".to_string(),
            ));
        }
        let obligation = PaymentObligation::from_template(
            student_id.trim(),
            student_name.trim(),
            template,
            self.clock.now(),
        );
        let id = obligation.id;
        self.commit(LedgerAction::Add(obligation)).await?;
        info!("Created obligation {} for student {}", id, student_id);
        self.get(id)
    }

    pub async fn update_obligation(
        &mut self,
        id: Uuid,
        changes: ObligationChanges,
    ) -> ServiceResult<ObligationAccount> {
        self.commit(LedgerAction::Update { id, changes }).await?;
        self.get(id)
    }

    pub async fn delete_obligation(&mut self, id: Uuid) -> ServiceResult<()> {
        self.commit(LedgerAction::Delete(id)).await?;
        info!("Deleted obligation {}", id);
        Ok(())
    }

    pub async fn record_payment(
        &mut self,
        obligation_id: Uuid,
        payment: NewPayment,
    ) -> ServiceResult<ObligationAccount> {
        let payment = payment.into_record(self.clock.now());
        let amount = payment.amount;
        self.commit(LedgerAction::RecordPayment {
            obligation_id,
            payment,
        })
        .await?;
        let account = self.get(obligation_id)?;
        info!(
            "Recorded payment of {} on obligation {}; status is now {}",
            amount, obligation_id, account.obligation.status
        );
        Ok(account)
    }

    pub async fn delete_payment(
        &mut self,
        obligation_id: Uuid,
        payment_id: Uuid,
    ) -> ServiceResult<ObligationAccount> {
        self.commit(LedgerAction::DeletePayment {
            obligation_id,
            payment_id,
        })
        .await?;
        self.get(obligation_id)
    }

    /// Creates one obligation per selected student. Per-student failures are
    /// reported in the outcome; the successful ones are stored in one pass.
    /// If that store fails, every student of the batch is reported as failed.
    pub async fn create_batch(
        &mut self,
        students: &[StudentSelection],
        template: &ObligationTemplate,
    ) -> ServiceResult<BatchOutcome> {
        let outcome = build_batch(students, template, self.clock.now());
        for failure in outcome.failed() {
            warn!(
                "Batch obligation failed for {}: {}",
                failure.student_name, failure.reason
            );
        }
        if outcome.created().is_empty() {
            return Ok(outcome);
        }

        match self.commit(LedgerAction::AddMany(outcome.created().to_vec())).await {
            Ok(()) => {
                info!(
                    "Batch created {} obligation(s), {} failure(s)",
                    outcome.created().len(),
                    outcome.failed().len()
                );
                Ok(outcome)
            }
            Err(ServiceError::Port(e)) => {
                warn!("Batch obligations could not be stored: {}", e);
                Ok(outcome.into_failed("could not be saved"))
            }
            Err(e) => Err(e),
        }
    }

    /// Re-derives every status against today. Returns how many changed.
    pub async fn refresh_statuses(&mut self) -> ServiceResult<usize> {
        let mut next = self.ledger.clone();
        let changed = next.refresh_statuses(self.clock.now().date_naive());
        if changed > 0 {
            save_collection(self.store.as_ref(), keys::PAYMENT_OBLIGATIONS, next.accounts()).await?;
            self.ledger = next;
        }
        Ok(changed)
    }

    /// Applies `action` to a copy of the ledger, persists the copy, then makes it current.
    async fn commit(&mut self, action: LedgerAction) -> ServiceResult<()> {
        let mut next = self.ledger.clone();
        next.dispatch(action, self.clock.now())?;
        save_collection(self.store.as_ref(), keys::PAYMENT_OBLIGATIONS, next.accounts()).await?;
        self.ledger = next;
        Ok(())
    }
}
