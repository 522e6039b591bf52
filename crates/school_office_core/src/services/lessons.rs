//! crates/school_office_core/src/services/lessons.rs
//!
//! The private lesson application service.

use crate::domain::{LessonDraft, NewPayment, ObligationTemplate, PaymentObligation, PrivateLesson};
use crate::lessons::{LessonAction, LessonBook, LessonChanges, LessonFilter};
use crate::ports::{keys, load_collection, save_collection, Clock, KeyValueStore};
use crate::services::error::{ServiceError, ServiceResult};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

pub struct LessonService {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    book: LessonBook,
}

impl LessonService {
    pub async fn load(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> ServiceResult<Self> {
        let lessons: Vec<PrivateLesson> =
            load_collection(store.as_ref(), keys::PRIVATE_LESSONS).await?;
        let mut book = LessonBook::new(lessons);
        if book.refresh_statuses(clock.now().date_naive()) > 0 {
            save_collection(store.as_ref(), keys::PRIVATE_LESSONS, book.lessons()).await?;
        }
        info!("Loaded {} private lesson(s)", book.lessons().len());
        Ok(Self { store, clock, book })
    }

    pub fn book(&self) -> &LessonBook {
        &self.book
    }

    pub fn list(&self, filter: &LessonFilter) -> Vec<PrivateLesson> {
        self.book.filter(filter).into_iter().cloned().collect()
    }

    pub fn get(&self, id: Uuid) -> ServiceResult<PrivateLesson> {
        self.book
            .get(id)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(format!("Lesson {} not found", id)))
    }

    /// Lessons the draft would clash with, without booking anything.
    pub fn conflicts_for(&self, draft: LessonDraft) -> ServiceResult<Vec<PrivateLesson>> {
        let candidate = PrivateLesson::from_draft(draft, self.clock.now())?;
        Ok(self
            .book
            .find_conflicts(&candidate)
            .into_iter()
            .cloned()
            .collect())
    }

    pub async fn schedule(&mut self, draft: LessonDraft) -> ServiceResult<PrivateLesson> {
        let lesson = PrivateLesson::from_draft(draft, self.clock.now())?;
        let id = lesson.id;
        self.commit(LessonAction::Schedule(lesson)).await?;
        info!("Scheduled private lesson {}", id);
        self.get(id)
    }

    pub async fn update(
        &mut self,
        id: Uuid,
        changes: LessonChanges,
    ) -> ServiceResult<PrivateLesson> {
        self.commit(LessonAction::Update { id, changes }).await?;
        self.get(id)
    }

    pub async fn complete(&mut self, id: Uuid) -> ServiceResult<PrivateLesson> {
        self.commit(LessonAction::Complete(id)).await?;
        self.get(id)
    }

    pub async fn cancel(&mut self, id: Uuid) -> ServiceResult<PrivateLesson> {
        self.commit(LessonAction::Cancel(id)).await?;
        info!("Cancelled private lesson {}", id);
        self.get(id)
    }

    pub async fn delete(&mut self, id: Uuid) -> ServiceResult<()> {
        self.commit(LessonAction::Delete(id)).await
    }

    /// Bills the lesson's student with an obligation built from `template`.
    pub async fn attach_obligation(
        &mut self,
        lesson_id: Uuid,
        template: &ObligationTemplate,
    ) -> ServiceResult<PrivateLesson> {
        let lesson = self.get(lesson_id)?;
        let obligation = PaymentObligation::from_template(
            lesson.student_id,
            lesson.student_name,
            template,
            self.clock.now(),
        );
        self.commit(LessonAction::AttachObligation {
            lesson_id,
            obligation,
        })
        .await?;
        self.get(lesson_id)
    }

    pub async fn record_payment(
        &mut self,
        lesson_id: Uuid,
        payment: NewPayment,
    ) -> ServiceResult<PrivateLesson> {
        let payment = payment.into_record(self.clock.now());
        self.commit(LessonAction::RecordPayment { lesson_id, payment }).await?;
        self.get(lesson_id)
    }

    pub async fn delete_payment(
        &mut self,
        lesson_id: Uuid,
        payment_id: Uuid,
    ) -> ServiceResult<PrivateLesson> {
        self.commit(LessonAction::DeletePayment {
            lesson_id,
            payment_id,
        })
        .await?;
        self.get(lesson_id)
    }

    pub async fn refresh_statuses(&mut self) -> ServiceResult<usize> {
        let mut next = self.book.clone();
        let changed = next.refresh_statuses(self.clock.now().date_naive());
        if changed > 0 {
            save_collection(self.store.as_ref(), keys::PRIVATE_LESSONS, next.lessons()).await?;
            self.book = next;
        }
        Ok(changed)
    }

    async fn commit(&mut self, action: LessonAction) -> ServiceResult<()> {
        let mut next = self.book.clone();
        next.dispatch(action, self.clock.now())?;
        save_collection(self.store.as_ref(), keys::PRIVATE_LESSONS, next.lessons()).await?;
        self.book = next;
        Ok(())
    }
}
