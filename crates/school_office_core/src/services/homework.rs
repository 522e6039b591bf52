//! crates/school_office_core/src/services/homework.rs
//!
//! The homework application service. Lesson lookups go through a borrowed
//! `LessonBook`, so callers hold the lesson service while calling in here.

use crate::domain::{
    CompletionStatus, HomeworkAssignment, HomeworkCompletion, HomeworkDraft, PrivateLesson,
};
use crate::homework::{
    completion_summary, completion_trend, CompletionSummary, CompletionTrend, HomeworkAction,
    HomeworkBook,
};
use crate::lessons::LessonBook;
use crate::ports::{keys, load_collection, save_collection, Clock, KeyValueStore};
use crate::services::error::{ServiceError, ServiceResult};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

pub struct HomeworkService {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    book: HomeworkBook,
}

/// A student's completion history and the trend derived from it.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentTrend {
    pub student_id: String,
    pub rates: Vec<f64>,
    pub trend: CompletionTrend,
}

fn find_lesson<'a>(lessons: &'a LessonBook, lesson_id: Uuid) -> ServiceResult<&'a PrivateLesson> {
    lessons
        .get(lesson_id)
        .ok_or_else(|| ServiceError::NotFound(format!("Lesson {} not found", lesson_id)))
}

impl HomeworkService {
    pub async fn load(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> ServiceResult<Self> {
        let assignments: Vec<HomeworkAssignment> =
            load_collection(store.as_ref(), keys::HOMEWORK_ASSIGNMENTS).await?;
        info!("Loaded {} homework assignment(s)", assignments.len());
        Ok(Self {
            store,
            clock,
            book: HomeworkBook::new(assignments),
        })
    }

    pub fn book(&self) -> &HomeworkBook {
        &self.book
    }

    pub fn assignment(&self, lesson_id: Uuid) -> ServiceResult<HomeworkAssignment> {
        self.book
            .for_lesson(lesson_id)
            .cloned()
            .ok_or_else(|| {
                ServiceError::NotFound(format!("No homework assigned for lesson {}", lesson_id))
            })
    }

    pub async fn assign(
        &mut self,
        lessons: &LessonBook,
        lesson_id: Uuid,
        draft: HomeworkDraft,
    ) -> ServiceResult<HomeworkAssignment> {
        find_lesson(lessons, lesson_id)?;
        self.commit(HomeworkAction::Assign { lesson_id, draft }).await?;
        self.assignment(lesson_id)
    }

    pub async fn update(
        &mut self,
        lesson_id: Uuid,
        draft: HomeworkDraft,
    ) -> ServiceResult<HomeworkAssignment> {
        self.commit(HomeworkAction::Update { lesson_id, draft }).await?;
        self.assignment(lesson_id)
    }

    pub async fn remove(&mut self, lesson_id: Uuid) -> ServiceResult<()> {
        self.commit(HomeworkAction::Remove(lesson_id)).await
    }

    /// Drops the homework of a deleted lesson, if it had any.
    pub async fn forget_lesson(&mut self, lesson_id: Uuid) -> ServiceResult<()> {
        if self.book.for_lesson(lesson_id).is_none() {
            return Ok(());
        }
        debug!("Removing homework of deleted lesson {}", lesson_id);
        self.remove(lesson_id).await
    }

    pub async fn record_completion(
        &mut self,
        lessons: &LessonBook,
        lesson_id: Uuid,
        student_id: &str,
        status: CompletionStatus,
        notes: Option<String>,
    ) -> ServiceResult<HomeworkAssignment> {
        let lesson = find_lesson(lessons, lesson_id)?;
        if lesson.student_id != student_id {
            return Err(ServiceError::Validation(format!(
                "Student {} does not attend lesson {}",
                student_id, lesson_id
            )));
        }
        let completion = HomeworkCompletion {
            student_id: student_id.to_string(),
            status,
            notes,
            recorded_at: self.clock.now(),
        };
        self.commit(HomeworkAction::RecordCompletion {
            lesson_id,
            completion,
        })
        .await?;
        self.assignment(lesson_id)
    }

    /// The homework given at the student's previous lesson, if any.
    pub fn previous_homework(
        &self,
        lessons: &LessonBook,
        lesson_id: Uuid,
    ) -> ServiceResult<Option<HomeworkAssignment>> {
        find_lesson(lessons, lesson_id)?;
        Ok(self.book.previous_for_lesson(lesson_id, lessons).cloned())
    }

    pub fn completion_summary(
        &self,
        lessons: &LessonBook,
        lesson_id: Uuid,
    ) -> ServiceResult<CompletionSummary> {
        let lesson = find_lesson(lessons, lesson_id)?;
        let assignment = self.assignment(lesson_id)?;
        Ok(completion_summary(&assignment, &[lesson.student_id.as_str()]))
    }

    pub fn student_trend(&self, lessons: &LessonBook, student_id: &str) -> StudentTrend {
        let rates = self.book.student_rates(student_id, lessons);
        let trend = completion_trend(&rates);
        StudentTrend {
            student_id: student_id.to_string(),
            rates,
            trend,
        }
    }

    async fn commit(&mut self, action: HomeworkAction) -> ServiceResult<()> {
        let mut next = self.book.clone();
        next.dispatch(action, self.clock.now())?;
        save_collection(self.store.as_ref(), keys::HOMEWORK_ASSIGNMENTS, next.assignments()).await?;
        self.book = next;
        Ok(())
    }
}
