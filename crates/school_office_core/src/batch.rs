//! crates/school_office_core/src/batch.rs
//!
//! Batch assignment: one obligation per selected student from a shared
//! template. Each student succeeds or fails on its own; a bad roster entry
//! never aborts the rest of the batch.

use crate::domain::{ObligationTemplate, PaymentObligation, StudentSelection};
use crate::ledger::ensure_positive;
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// Name reported for a failed selection that carries no usable name.
pub const UNKNOWN_STUDENT: &str = "unknown student";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFailure {
    pub student_id: Option<String>,
    pub student_name: String,
    pub reason: String,
}

/// Aggregate result of a batch assignment.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchOutcome {
    Completed {
        created: Vec<PaymentObligation>,
    },
    PartiallyCompleted {
        created: Vec<PaymentObligation>,
        failed: Vec<BatchFailure>,
    },
    Failed {
        failed: Vec<BatchFailure>,
    },
}

impl BatchOutcome {
    fn from_parts(created: Vec<PaymentObligation>, failed: Vec<BatchFailure>) -> Self {
        match (created.is_empty(), failed.is_empty()) {
            (false, true) => BatchOutcome::Completed { created },
            (false, false) => BatchOutcome::PartiallyCompleted { created, failed },
            (true, _) => BatchOutcome::Failed { failed },
        }
    }

    pub fn created(&self) -> &[PaymentObligation] {
        match self {
            BatchOutcome::Completed { created }
            | BatchOutcome::PartiallyCompleted { created, .. } => created.as_slice(),
            BatchOutcome::Failed { .. } => &[],
        }
    }

    pub fn failed(&self) -> &[BatchFailure] {
        match self {
            BatchOutcome::Completed { .. } => &[],
            BatchOutcome::PartiallyCompleted { failed, .. } | BatchOutcome::Failed { failed } => {
                failed.as_slice()
            }
        }
    }

    pub fn failed_student_names(&self) -> Vec<&str> {
        self.failed().iter().map(|f| f.student_name.as_str()).collect()
    }

    /// Replaces the created obligations with failures carrying `reason`,
    /// used when the created set could not be stored.
    pub fn into_failed(self, reason: &str) -> Self {
        let (created, mut failed) = match self {
            BatchOutcome::Completed { created } => (created, Vec::new()),
            BatchOutcome::PartiallyCompleted { created, failed } => (created, failed),
            BatchOutcome::Failed { failed } => (Vec::new(), failed),
        };
        failed.extend(created.into_iter().map(|o| BatchFailure {
            student_id: Some(o.student_id),
            student_name: o.student_name,
            reason: reason.to_string(),
        }));
        BatchOutcome::Failed { failed }
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Builds one obligation per valid student selection.
///
/// A selection fails when its id or name is missing, when its student already
/// appeared earlier in the same batch, or when the template amount is not
/// positive. An empty selection yields `Failed` with no items.
pub fn build_batch(
    students: &[StudentSelection],
    template: &ObligationTemplate,
    now: DateTime<Utc>,
) -> BatchOutcome {
    let template_problem = ensure_positive(template.amount, "Amount").err();
    let mut seen = HashSet::new();
    let mut created = Vec::new();
    let mut failed = Vec::new();

    for selection in students {
        let name = non_blank(&selection.student_name);
        let id = non_blank(&selection.student_id);
        let fail = |reason: String| BatchFailure {
            student_id: id.map(str::to_string),
            student_name: name.unwrap_or(UNKNOWN_STUDENT).to_string(),
            reason,
        };

        let result = match (&template_problem, id, name) {
            (Some(problem), _, _) => Err(fail(problem.clone())),
            (None, None, _) => Err(fail("student id is missing".to_string())),
            (None, Some(_), None) => Err(fail("student name is missing".to_string())),
            (None, Some(id), Some(name)) => {
                if seen.insert(id.to_string()) {
                    Ok(PaymentObligation::from_template(id, name, template, now))
                } else {
                    Err(fail("student selected more than once".to_string()))
                }
            }
        };

        match result {
            Ok(obligation) => created.push(obligation),
            Err(failure) => failed.push(failure),
        }
    }

    BatchOutcome::from_parts(created, failed)
}
