//! crates/school_office_core/src/homework.rs
//!
//! Homework assignments per lesson, completion summaries and per-student
//! completion trends.

use crate::domain::{
    CompletionStatus, HomeworkAssignment, HomeworkCompletion, HomeworkDraft, LessonStatus,
};
use crate::lessons::LessonBook;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Minimum change in completion rate that counts as a trend.
pub const TREND_THRESHOLD: f64 = 0.1;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HomeworkError {
    #[error("No homework assigned for lesson {0}")]
    NotFound(Uuid),
    #[error("Lesson {0} already has homework assigned")]
    AlreadyAssigned(Uuid),
    #[error("Invalid homework: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum HomeworkAction {
    Assign { lesson_id: Uuid, draft: HomeworkDraft },
    Update { lesson_id: Uuid, draft: HomeworkDraft },
    Remove(Uuid),
    RecordCompletion {
        lesson_id: Uuid,
        completion: HomeworkCompletion,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionSummary {
    pub total_students: usize,
    pub completed: usize,
    pub partial: usize,
    pub not_done: usize,
    pub completion_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionTrend {
    Improving,
    Declining,
    Stable,
    InsufficientData,
}

impl CompletionTrend {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompletionTrend::Improving => "improving",
            CompletionTrend::Declining => "declining",
            CompletionTrend::Stable => "stable",
            CompletionTrend::InsufficientData => "insufficient_data",
        }
    }
}

fn score(status: CompletionStatus) -> f64 {
    match status {
        CompletionStatus::Completed => 1.0,
        CompletionStatus::Partial => 0.5,
        CompletionStatus::NotDone => 0.0,
    }
}

/// Summarizes an assignment over the expected students plus anyone with a
/// recorded completion. Students without a record count as not done.
pub fn completion_summary(
    assignment: &HomeworkAssignment,
    expected_students: &[&str],
) -> CompletionSummary {
    let students: BTreeSet<&str> = expected_students
        .iter()
        .copied()
        .chain(assignment.completions.iter().map(|c| c.student_id.as_str()))
        .collect();

    let mut summary = CompletionSummary {
        total_students: students.len(),
        completed: 0,
        partial: 0,
        not_done: 0,
        completion_rate: 0.0,
    };
    let mut points = 0.0;
    for student in students {
        let status = assignment
            .completions
            .iter()
            .find(|c| c.student_id == student)
            .map_or(CompletionStatus::NotDone, |c| c.status);
        match status {
            CompletionStatus::Completed => summary.completed += 1,
            CompletionStatus::Partial => summary.partial += 1,
            CompletionStatus::NotDone => summary.not_done += 1,
        }
        points += score(status);
    }
    if summary.total_students > 0 {
        summary.completion_rate = points / summary.total_students as f64;
    }
    summary
}

/// Compares the latest rate against the mean of the earlier ones.
pub fn completion_trend(rates: &[f64]) -> CompletionTrend {
    let Some((latest, earlier)) = rates.split_last() else {
        return CompletionTrend::InsufficientData;
    };
    if earlier.is_empty() {
        return CompletionTrend::InsufficientData;
    }
    let baseline = earlier.iter().sum::<f64>() / earlier.len() as f64;
    let delta = latest - baseline;
    if delta >= TREND_THRESHOLD {
        CompletionTrend::Improving
    } else if delta <= -TREND_THRESHOLD {
        CompletionTrend::Declining
    } else {
        CompletionTrend::Stable
    }
}

//=========================================================================================
// The Homework Book
//=========================================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HomeworkBook {
    assignments: Vec<HomeworkAssignment>,
}

impl HomeworkBook {
    pub fn new(assignments: Vec<HomeworkAssignment>) -> Self {
        Self { assignments }
    }

    pub fn assignments(&self) -> &[HomeworkAssignment] {
        &self.assignments
    }

    pub fn for_lesson(&self, lesson_id: Uuid) -> Option<&HomeworkAssignment> {
        self.assignments.iter().find(|a| a.lesson_id == lesson_id)
    }

    /// Homework of the student's previous non-cancelled lesson.
    pub fn previous_for_lesson(
        &self,
        lesson_id: Uuid,
        lessons: &LessonBook,
    ) -> Option<&HomeworkAssignment> {
        let previous = lessons.previous_lesson_for_student(lesson_id)?;
        self.for_lesson(previous.id)
    }

    /// Completion rates of one student across their lessons in date order,
    /// skipping lessons without homework or without a recorded completion.
    pub fn student_rates(&self, student_id: &str, lessons: &LessonBook) -> Vec<f64> {
        let mut student_lessons: Vec<_> = lessons
            .lessons()
            .iter()
            .filter(|l| l.student_id == student_id && l.status != LessonStatus::Cancelled)
            .collect();
        student_lessons.sort_by_key(|l| (l.date, l.start_time));

        student_lessons
            .into_iter()
            .filter_map(|l| self.for_lesson(l.id))
            .filter_map(|a| a.completions.iter().find(|c| c.student_id == student_id))
            .map(|c| score(c.status))
            .collect()
    }

    pub fn dispatch(
        &mut self,
        action: HomeworkAction,
        now: DateTime<Utc>,
    ) -> Result<(), HomeworkError> {
        match action {
            HomeworkAction::Assign { lesson_id, draft } => {
                validate(&draft)?;
                if self.for_lesson(lesson_id).is_some() {
                    return Err(HomeworkError::AlreadyAssigned(lesson_id));
                }
                self.assignments.push(HomeworkAssignment {
                    id: Uuid::new_v4(),
                    lesson_id,
                    title: draft.title.trim().to_string(),
                    description: draft.description,
                    due_date: draft.due_date,
                    completions: Vec::new(),
                    created_at: now,
                    updated_at: now,
                });
            }
            HomeworkAction::Update { lesson_id, draft } => {
                validate(&draft)?;
                let assignment = self.assignment_mut(lesson_id)?;
                assignment.title = draft.title.trim().to_string();
                assignment.description = draft.description;
                assignment.due_date = draft.due_date;
                assignment.updated_at = now;
            }
            HomeworkAction::Remove(lesson_id) => {
                let before = self.assignments.len();
                self.assignments.retain(|a| a.lesson_id != lesson_id);
                if self.assignments.len() == before {
                    return Err(HomeworkError::NotFound(lesson_id));
                }
            }
            HomeworkAction::RecordCompletion {
                lesson_id,
                completion,
            } => {
                if completion.student_id.trim().is_empty() {
                    return Err(HomeworkError::Validation("studentId is required".to_string()));
                }
                let assignment = self.assignment_mut(lesson_id)?;
                assignment
                    .completions
                    .retain(|c| c.student_id != completion.student_id);
                assignment.completions.push(completion);
                assignment.updated_at = now;
            }
        }
        Ok(())
    }

    fn assignment_mut(
        &mut self,
        lesson_id: Uuid,
    ) -> Result<&mut HomeworkAssignment, HomeworkError> {
        self.assignments
            .iter_mut()
            .find(|a| a.lesson_id == lesson_id)
            .ok_or(HomeworkError::NotFound(lesson_id))
    }
}

fn validate(draft: &HomeworkDraft) -> Result<(), HomeworkError> {
    if draft.title.trim().is_empty() {
        return Err(HomeworkError::Validation("title is required".to_string()));
    }
    Ok(())
}
