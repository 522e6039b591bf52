//! crates/school_office_core/src/lessons.rs
//!
//! The private lesson book: booking, lifecycle transitions, schedule conflict
//! detection and the per-lesson billing (one obligation plus its payments).

use crate::domain::{
    LessonDraft, LessonStatus, PaymentObligation, PaymentRecord, PrivateLesson,
};
use crate::ledger::ensure_positive;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LessonError {
    #[error("Lesson {0} not found")]
    NotFound(Uuid),
    #[error("Payment {payment_id} not found on lesson {lesson_id}")]
    PaymentNotFound { lesson_id: Uuid, payment_id: Uuid },
    #[error("Invalid lesson: {0}")]
    Validation(String),
    #[error("Lesson overlaps with {} existing lesson(s)", .conflicting.len())]
    Conflict { conflicting: Vec<Uuid> },
    #[error("Lesson {0} already has a payment obligation")]
    ObligationExists(Uuid),
    #[error("Lesson {0} has no payment obligation")]
    NoObligation(Uuid),
    #[error("Lesson {lesson_id} is {from} and cannot become {to}")]
    InvalidTransition {
        lesson_id: Uuid,
        from: LessonStatus,
        to: LessonStatus,
    },
}

/// Field changes for a scheduled lesson. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LessonChanges {
    pub teacher_id: Option<String>,
    pub teacher_name: Option<String>,
    pub date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub classroom_id: Option<Option<String>>,
    pub notes: Option<Option<String>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LessonAction {
    Schedule(PrivateLesson),
    Update { id: Uuid, changes: LessonChanges },
    Complete(Uuid),
    Cancel(Uuid),
    Delete(Uuid),
    AttachObligation {
        lesson_id: Uuid,
        obligation: PaymentObligation,
    },
    RecordPayment {
        lesson_id: Uuid,
        payment: PaymentRecord,
    },
    DeletePayment {
        lesson_id: Uuid,
        payment_id: Uuid,
    },
    RefreshStatuses,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LessonFilter {
    pub student_id: Option<String>,
    pub teacher_id: Option<String>,
    pub date: Option<NaiveDate>,
}

impl LessonFilter {
    fn matches(&self, lesson: &PrivateLesson) -> bool {
        self.student_id.as_deref().map_or(true, |id| lesson.student_id == id)
            && self.teacher_id.as_deref().map_or(true, |id| lesson.teacher_id == id)
            && self.date.map_or(true, |d| lesson.date == d)
    }
}

impl PrivateLesson {
    /// Books a new lesson from a draft after validating its fields.
    pub fn from_draft(draft: LessonDraft, now: DateTime<Utc>) -> Result<Self, LessonError> {
        let lesson = Self {
            id: Uuid::new_v4(),
            student_id: draft.student_id,
            student_name: draft.student_name,
            teacher_id: draft.teacher_id,
            teacher_name: draft.teacher_name,
            date: draft.date,
            start_time: draft.start_time,
            end_time: draft.end_time,
            classroom_id: draft.classroom_id,
            status: LessonStatus::Scheduled,
            notes: draft.notes,
            payment_obligation: None,
            payments: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        lesson.validate()?;
        Ok(lesson)
    }

    fn validate(&self) -> Result<(), LessonError> {
        for (value, field) in [
            (&self.student_id, "studentId"),
            (&self.student_name, "studentName"),
            (&self.teacher_id, "teacherId"),
        ] {
            if value.trim().is_empty() {
                return Err(LessonError::Validation(format!("{} is required", field)));
            }
        }
        if self.start_time >= self.end_time {
            return Err(LessonError::Validation(format!(
                "start time {} must be before end time {}",
                self.start_time, self.end_time
            )));
        }
        Ok(())
    }

    fn refresh_obligation(&mut self, today: NaiveDate) -> bool {
        match self.payment_obligation.as_mut() {
            Some(obligation) => obligation.refresh_status(&self.payments, today),
            None => false,
        }
    }
}

/// Two lessons conflict when neither is cancelled, they fall on the same date,
/// their `[start, end)` intervals overlap, and they share a teacher, a student
/// or a classroom.
pub fn lessons_conflict(a: &PrivateLesson, b: &PrivateLesson) -> bool {
    if a.id == b.id
        || a.status == LessonStatus::Cancelled
        || b.status == LessonStatus::Cancelled
        || a.date != b.date
    {
        return false;
    }
    let overlaps = a.start_time < b.end_time && b.start_time < a.end_time;
    if !overlaps {
        return false;
    }
    let same_room = matches!(
        (&a.classroom_id, &b.classroom_id),
        (Some(x), Some(y)) if x == y
    );
    a.teacher_id == b.teacher_id || a.student_id == b.student_id || same_room
}

//=========================================================================================
// The Lesson Book
//=========================================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LessonBook {
    lessons: Vec<PrivateLesson>,
}

impl LessonBook {
    pub fn new(lessons: Vec<PrivateLesson>) -> Self {
        Self { lessons }
    }

    pub fn lessons(&self) -> &[PrivateLesson] {
        &self.lessons
    }

    pub fn get(&self, id: Uuid) -> Option<&PrivateLesson> {
        self.lessons.iter().find(|l| l.id == id)
    }

    /// Matching lessons, ordered by date and start time.
    pub fn filter(&self, filter: &LessonFilter) -> Vec<&PrivateLesson> {
        let mut found: Vec<&PrivateLesson> =
            self.lessons.iter().filter(|l| filter.matches(l)).collect();
        found.sort_by_key(|l| (l.date, l.start_time));
        found
    }

    pub fn find_conflicts(&self, candidate: &PrivateLesson) -> Vec<&PrivateLesson> {
        self.lessons
            .iter()
            .filter(|l| lessons_conflict(candidate, l))
            .collect()
    }

    /// The latest non-cancelled lesson of the same student strictly before the given one.
    pub fn previous_lesson_for_student(&self, lesson_id: Uuid) -> Option<&PrivateLesson> {
        let current = self.get(lesson_id)?;
        self.lessons
            .iter()
            .filter(|l| {
                l.id != current.id
                    && l.student_id == current.student_id
                    && l.status != LessonStatus::Cancelled
                    && (l.date, l.start_time) < (current.date, current.start_time)
            })
            .max_by_key(|l| (l.date, l.start_time))
    }

    pub fn refresh_statuses(&mut self, today: NaiveDate) -> usize {
        let mut changed = 0;
        for lesson in &mut self.lessons {
            if lesson.refresh_obligation(today) {
                changed += 1;
            }
        }
        changed
    }

    /// Applies one action. On error the book is left untouched.
    pub fn dispatch(
        &mut self,
        action: LessonAction,
        now: DateTime<Utc>,
    ) -> Result<(), LessonError> {
        let today = now.date_naive();
        match action {
            LessonAction::Schedule(lesson) => {
                lesson.validate()?;
                self.ensure_no_conflicts(&lesson)?;
                self.lessons.push(lesson);
            }
            LessonAction::Update { id, changes } => {
                let current = self.lesson(id)?;
                ensure_scheduled(current, LessonStatus::Scheduled)?;
                let mut updated = current.clone();
                apply_changes(&mut updated, changes);
                updated.validate()?;
                self.ensure_no_conflicts(&updated)?;
                updated.updated_at = now;
                *self.lesson_mut(id)? = updated;
            }
            LessonAction::Complete(id) => self.transition(id, LessonStatus::Completed, now)?,
            LessonAction::Cancel(id) => self.transition(id, LessonStatus::Cancelled, now)?,
            LessonAction::Delete(id) => {
                let before = self.lessons.len();
                self.lessons.retain(|l| l.id != id);
                if self.lessons.len() == before {
                    return Err(LessonError::NotFound(id));
                }
            }
            LessonAction::AttachObligation {
                lesson_id,
                mut obligation,
            } => {
                ensure_positive(obligation.amount, "Amount").map_err(LessonError::Validation)?;
                let lesson = self.lesson_mut(lesson_id)?;
                if lesson.payment_obligation.is_some() {
                    return Err(LessonError::ObligationExists(lesson_id));
                }
                if obligation.student_id != lesson.student_id {
                    return Err(LessonError::Validation(format!(
                        "obligation belongs to student {}, lesson to {}",
                        obligation.student_id, lesson.student_id
                    )));
                }
                obligation.refresh_status(&lesson.payments, today);
                lesson.payment_obligation = Some(obligation);
                lesson.updated_at = now;
            }
            LessonAction::RecordPayment { lesson_id, payment } => {
                ensure_positive(payment.amount, "Payment amount").map_err(LessonError::Validation)?;
                let lesson = self.lesson_mut(lesson_id)?;
                if lesson.payment_obligation.is_none() {
                    return Err(LessonError::NoObligation(lesson_id));
                }
                lesson.payments.push(payment);
                lesson.refresh_obligation(today);
                lesson.updated_at = now;
            }
            LessonAction::DeletePayment {
                lesson_id,
                payment_id,
            } => {
                let lesson = self.lesson_mut(lesson_id)?;
                let before = lesson.payments.len();
                lesson.payments.retain(|p| p.id != payment_id);
                if lesson.payments.len() == before {
                    return Err(LessonError::PaymentNotFound {
                        lesson_id,
                        payment_id,
                    });
                }
                lesson.refresh_obligation(today);
                lesson.updated_at = now;
            }
            LessonAction::RefreshStatuses => {
                self.refresh_statuses(today);
            }
        }
        Ok(())
    }

    fn lesson(&self, id: Uuid) -> Result<&PrivateLesson, LessonError> {
        self.get(id).ok_or(LessonError::NotFound(id))
    }

    fn lesson_mut(&mut self, id: Uuid) -> Result<&mut PrivateLesson, LessonError> {
        self.lessons
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or(LessonError::NotFound(id))
    }

    fn ensure_no_conflicts(&self, lesson: &PrivateLesson) -> Result<(), LessonError> {
        let conflicting: Vec<Uuid> = self.find_conflicts(lesson).iter().map(|l| l.id).collect();
        if conflicting.is_empty() {
            Ok(())
        } else {
            Err(LessonError::Conflict { conflicting })
        }
    }

    fn transition(
        &mut self,
        id: Uuid,
        to: LessonStatus,
        now: DateTime<Utc>,
    ) -> Result<(), LessonError> {
        let lesson = self.lesson_mut(id)?;
        ensure_scheduled(lesson, to)?;
        lesson.status = to;
        lesson.updated_at = now;
        Ok(())
    }
}

fn ensure_scheduled(lesson: &PrivateLesson, to: LessonStatus) -> Result<(), LessonError> {
    if lesson.status == LessonStatus::Scheduled {
        Ok(())
    } else {
        Err(LessonError::InvalidTransition {
            lesson_id: lesson.id,
            from: lesson.status,
            to,
        })
    }
}

fn apply_changes(lesson: &mut PrivateLesson, changes: LessonChanges) {
    if let Some(v) = changes.teacher_id {
        lesson.teacher_id = v;
    }
    if let Some(v) = changes.teacher_name {
        lesson.teacher_name = v;
    }
    if let Some(v) = changes.date {
        lesson.date = v;
    }
    if let Some(v) = changes.start_time {
        lesson.start_time = v;
    }
    if let Some(v) = changes.end_time {
        lesson.end_time = v;
    }
    if let Some(v) = changes.classroom_id {
        lesson.classroom_id = v;
    }
    if let Some(v) = changes.notes {
        lesson.notes = v;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        NewPayment, ObligationStatus, ObligationTemplate, ObligationType, PaymentMethod,
    };
    use chrono::TimeZone;
    use rust_decimal::Decimal;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 1, 8, 0, 0).unwrap()
    }

    fn draft(student: &str, teacher: &str, start: (u32, u32), end: (u32, u32)) -> LessonDraft {
        LessonDraft {
            student_id: student.to_string(),
            student_name: format!("Student {}", student),
            teacher_id: teacher.to_string(),
            teacher_name: format!("Teacher {}", teacher),
            date: NaiveDate::from_ymd_opt(2026, 5, 4).unwrap(),
            start_time: NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(end.0, end.1, 0).unwrap(),
            classroom_id: None,
            notes: None,
        }
    }

    fn schedule(book: &mut LessonBook, d: LessonDraft) -> Result<Uuid, LessonError> {
        let lesson = PrivateLesson::from_draft(d, now())?;
        let id = lesson.id;
        book.dispatch(LessonAction::Schedule(lesson), now())?;
        Ok(id)
    }

    #[test]
    fn rejects_end_before_start() {
        let err = PrivateLesson::from_draft(draft("s1", "t1", (10, 0), (9, 0)), now()).unwrap_err();
        assert!(matches!(err, LessonError::Validation(_)));
    }

    #[test]
    fn update_cannot_blank_the_teacher() {
        let mut book = LessonBook::default();
        let id = schedule(&mut book, draft("s1", "t1", (10, 0), (11, 0))).unwrap();
        let changes = LessonChanges {
            teacher_id: Some("  ".to_string()),
            ..Default::default()
        };

        let err = book
            .dispatch(LessonAction::Update { id, changes }, now())
            .unwrap_err();
        assert_eq!(err, LessonError::Validation("teacherId is required".to_string()));
        assert_eq!(book.get(id).unwrap().teacher_id, "t1");
    }

    #[test]
    fn overlapping_lessons_with_same_teacher_conflict() {
        let mut book = LessonBook::default();
        let first = schedule(&mut book, draft("s1", "t1", (10, 0), (11, 0))).unwrap();
        let err = schedule(&mut book, draft("s2", "t1", (10, 30), (11, 30))).unwrap_err();
        assert_eq!(err, LessonError::Conflict { conflicting: vec![first] });
    }

    #[test]
    fn back_to_back_lessons_do_not_conflict() {
        let mut book = LessonBook::default();
        schedule(&mut book, draft("s1", "t1", (10, 0), (11, 0))).unwrap();
        schedule(&mut book, draft("s2", "t1", (11, 0), (12, 0))).unwrap();
        assert_eq!(book.lessons().len(), 2);
    }

    #[test]
    fn shared_classroom_conflicts_but_distinct_people_do_not() {
        let mut book = LessonBook::default();
        let mut a = draft("s1", "t1", (10, 0), (11, 0));
        a.classroom_id = Some("room-1".to_string());
        schedule(&mut book, a).unwrap();

        schedule(&mut book, draft("s2", "t2", (10, 0), (11, 0))).unwrap();

        let mut c = draft("s3", "t3", (10, 15), (10, 45));
        c.classroom_id = Some("room-1".to_string());
        assert!(matches!(
            schedule(&mut book, c),
            Err(LessonError::Conflict { .. })
        ));
    }

    #[test]
    fn cancelled_lessons_free_the_slot() {
        let mut book = LessonBook::default();
        let first = schedule(&mut book, draft("s1", "t1", (10, 0), (11, 0))).unwrap();
        book.dispatch(LessonAction::Cancel(first), now()).unwrap();
        schedule(&mut book, draft("s2", "t1", (10, 0), (11, 0))).unwrap();

        let err = book.dispatch(LessonAction::Complete(first), now()).unwrap_err();
        assert!(matches!(err, LessonError::InvalidTransition { .. }));
    }

    #[test]
    fn lesson_billing_follows_status_rules() {
        let mut book = LessonBook::default();
        let id = schedule(&mut book, draft("s1", "t1", (10, 0), (11, 0))).unwrap();
        let payment = NewPayment {
            amount: Decimal::from(25),
            payment_date: now().date_naive(),
            method: PaymentMethod::Card,
            notes: None,
        };

        let pay = |payment: &NewPayment| LessonAction::RecordPayment {
            lesson_id: id,
            payment: payment.clone().into_record(now()),
        };

        let err = book.dispatch(pay(&payment), now()).unwrap_err();
        assert_eq!(err, LessonError::NoObligation(id));

        let template = ObligationTemplate {
            obligation_type: ObligationType::PrivateLesson,
            amount: Decimal::from(50),
            due_date: NaiveDate::from_ymd_opt(2026, 5, 4).unwrap(),
            period: "2026-05".to_string(),
            notes: None,
        };
        let obligation = PaymentObligation::from_template("s1", "Student s1", &template, now());
        let attach = |obligation: PaymentObligation| LessonAction::AttachObligation {
            lesson_id: id,
            obligation,
        };
        book.dispatch(attach(obligation.clone()), now()).unwrap();
        assert_eq!(
            book.dispatch(attach(obligation), now()),
            Err(LessonError::ObligationExists(id))
        );

        book.dispatch(pay(&payment), now()).unwrap();
        let status = book.get(id).unwrap().payment_obligation.as_ref().unwrap().status;
        assert_eq!(status, ObligationStatus::Partial);

        book.dispatch(pay(&payment), now()).unwrap();
        let status = book.get(id).unwrap().payment_obligation.as_ref().unwrap().status;
        assert_eq!(status, ObligationStatus::Paid);
    }

    #[test]
    fn previous_lesson_skips_cancelled_and_other_students() {
        let mut book = LessonBook::default();
        let mut early = draft("s1", "t1", (9, 0), (10, 0));
        early.date = NaiveDate::from_ymd_opt(2026, 4, 27).unwrap();
        let early_id = schedule(&mut book, early).unwrap();

        let mut cancelled = draft("s1", "t1", (9, 0), (10, 0));
        cancelled.date = NaiveDate::from_ymd_opt(2026, 5, 1).unwrap();
        let cancelled_id = schedule(&mut book, cancelled).unwrap();
        book.dispatch(LessonAction::Cancel(cancelled_id), now()).unwrap();

        let mut other = draft("s2", "t2", (9, 0), (10, 0));
        other.date = NaiveDate::from_ymd_opt(2026, 5, 2).unwrap();
        schedule(&mut book, other).unwrap();

        let current = schedule(&mut book, draft("s1", "t1", (9, 0), (10, 0))).unwrap();
        assert_eq!(book.previous_lesson_for_student(current).map(|l| l.id), Some(early_id));
        assert!(book.previous_lesson_for_student(early_id).is_none());
    }
}
