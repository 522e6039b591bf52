mod common;

use chrono::{NaiveDate, NaiveTime};
use common::{TestClock, TestStore};
use rust_decimal::Decimal;
use school_office_core::lessons::LessonChanges;
use school_office_core::{
    CompletionStatus, HomeworkDraft, HomeworkService, LessonDraft, LessonService, LessonStatus,
    NewPayment, ObligationStatus, ObligationTemplate, ObligationType, PaymentMethod, ServiceError,
};
use school_office_core::homework::CompletionTrend;
use std::sync::Arc;

fn draft(student: &str, teacher: &str, day: u32, hour: u32) -> LessonDraft {
    LessonDraft {
        student_id: student.to_string(),
        student_name: format!("Student {}", student),
        teacher_id: teacher.to_string(),
        teacher_name: format!("Teacher {}", teacher),
        date: NaiveDate::from_ymd_opt(2026, 10, day).unwrap(),
        start_time: NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
        end_time: NaiveTime::from_hms_opt(hour + 1, 0, 0).unwrap(),
        classroom_id: None,
        notes: None,
    }
}

fn assignment_draft(title: &str) -> HomeworkDraft {
    HomeworkDraft {
        title: title.to_string(),
        description: None,
        due_date: None,
    }
}

#[tokio::test]
async fn double_booking_a_teacher_is_a_conflict() {
    let store = Arc::new(TestStore::default());
    let clock = Arc::new(TestClock::at(2026, 10, 1));
    let mut lessons = LessonService::load(store.clone(), clock.clone()).await.unwrap();

    let first = lessons.schedule(draft("s1", "t1", 12, 10)).await.unwrap();
    let preview = lessons.conflicts_for(draft("s2", "t1", 12, 10)).unwrap();
    assert_eq!(preview.len(), 1);
    assert_eq!(preview[0].id, first.id);

    let err = lessons.schedule(draft("s2", "t1", 12, 10)).await.unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));
    assert_eq!(err.status_code(), 409);

    let second = lessons.schedule(draft("s2", "t1", 12, 11)).await.unwrap();
    let err = lessons
        .update(
            second.id,
            LessonChanges {
                start_time: NaiveTime::from_hms_opt(10, 30, 0),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));

    let err = lessons
        .update(
            second.id,
            LessonChanges {
                teacher_id: Some(String::new()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 422);
    assert_eq!(lessons.get(second.id).unwrap().teacher_id, "t1");
}

#[tokio::test]
async fn refresh_marks_an_unpaid_lesson_overdue_without_a_reload() {
    let store = Arc::new(TestStore::default());
    let clock = Arc::new(TestClock::at(2026, 10, 1));
    let mut lessons = LessonService::load(store.clone(), clock.clone()).await.unwrap();
    let lesson = lessons.schedule(draft("s1", "t1", 8, 9)).await.unwrap();
    let template = ObligationTemplate {
        obligation_type: ObligationType::PrivateLesson,
        amount: Decimal::from(60),
        due_date: NaiveDate::from_ymd_opt(2026, 10, 8).unwrap(),
        period: "2026-10".to_string(),
        notes: None,
    };
    lessons.attach_obligation(lesson.id, &template).await.unwrap();

    clock.set(2026, 10, 9);
    assert_eq!(lessons.refresh_statuses().await.unwrap(), 1);
    let stored = lessons.get(lesson.id).unwrap();
    assert_eq!(stored.payment_obligation.unwrap().status, ObligationStatus::Overdue);
}

#[tokio::test]
async fn lesson_billing_survives_a_reload() {
    let store = Arc::new(TestStore::default());
    let clock = Arc::new(TestClock::at(2026, 10, 1));
    let mut lessons = LessonService::load(store.clone(), clock.clone()).await.unwrap();
    let lesson = lessons.schedule(draft("s1", "t1", 5, 9)).await.unwrap();

    let template = ObligationTemplate {
        obligation_type: ObligationType::PrivateLesson,
        amount: Decimal::from(60),
        due_date: NaiveDate::from_ymd_opt(2026, 10, 5).unwrap(),
        period: "2026-10".to_string(),
        notes: None,
    };
    let billed = lessons.attach_obligation(lesson.id, &template).await.unwrap();
    assert_eq!(billed.payment_obligation.as_ref().unwrap().student_id, "s1");

    lessons
        .record_payment(
            lesson.id,
            NewPayment {
                amount: Decimal::from(20),
                payment_date: NaiveDate::from_ymd_opt(2026, 10, 2).unwrap(),
                method: PaymentMethod::Online,
                notes: None,
            },
        )
        .await
        .unwrap();
    lessons.complete(lesson.id).await.unwrap();

    clock.set(2026, 10, 20);
    let reloaded = LessonService::load(store.clone(), clock.clone()).await.unwrap();
    let stored = reloaded.get(lesson.id).unwrap();
    assert_eq!(stored.status, LessonStatus::Completed);
    assert_eq!(stored.payments.len(), 1);
    assert_eq!(stored.payment_obligation.unwrap().status, ObligationStatus::Partial);
}

#[tokio::test]
async fn homework_follows_the_students_lessons() {
    let store = Arc::new(TestStore::default());
    let clock = Arc::new(TestClock::at(2026, 10, 1));
    let mut lessons = LessonService::load(store.clone(), clock.clone()).await.unwrap();
    let mut homework = HomeworkService::load(store.clone(), clock.clone()).await.unwrap();

    let first = lessons.schedule(draft("s1", "t1", 6, 9)).await.unwrap();
    let second = lessons.schedule(draft("s1", "t1", 13, 9)).await.unwrap();
    let third = lessons.schedule(draft("s1", "t1", 20, 9)).await.unwrap();

    homework.assign(lessons.book(), first.id, assignment_draft("Unit 1")).await.unwrap();
    homework.assign(lessons.book(), second.id, assignment_draft("Unit 2")).await.unwrap();
    homework.assign(lessons.book(), third.id, assignment_draft("Unit 3")).await.unwrap();

    let previous = homework.previous_homework(lessons.book(), second.id).unwrap().unwrap();
    assert_eq!(previous.title, "Unit 1");
    assert!(homework.previous_homework(lessons.book(), first.id).unwrap().is_none());

    let summary = homework.completion_summary(lessons.book(), first.id).unwrap();
    assert_eq!(summary.total_students, 1);
    assert_eq!(summary.not_done, 1);

    for (lesson, status) in [
        (first.id, CompletionStatus::NotDone),
        (second.id, CompletionStatus::Partial),
        (third.id, CompletionStatus::Completed),
    ] {
        homework
            .record_completion(lessons.book(), lesson, "s1", status, None)
            .await
            .unwrap();
    }
    let trend = homework.student_trend(lessons.book(), "s1");
    assert_eq!(trend.rates, vec![0.0, 0.5, 1.0]);
    assert_eq!(trend.trend, CompletionTrend::Improving);

    let err = homework
        .record_completion(
            lessons.book(),
            first.id,
            "someone-else",
            CompletionStatus::Completed,
            None,
        )
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 422);

    let err = homework
        .assign(lessons.book(), first.id, assignment_draft("Again"))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));

    lessons.delete(third.id).await.unwrap();
    homework.forget_lesson(third.id).await.unwrap();
    assert!(homework.assignment(third.id).is_err());
}
