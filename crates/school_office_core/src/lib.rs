pub mod batch;
pub mod domain;
pub mod errors;
pub mod homework;
pub mod ledger;
pub mod lessons;
pub mod notification;
pub mod ports;
pub mod services;
pub mod status;

pub use domain::{
    CompletionStatus, HomeworkAssignment, HomeworkCompletion, HomeworkDraft, LessonDraft,
    LessonStatus, NewPayment, ObligationAccount, ObligationStatus, ObligationTemplate,
    ObligationType, PaymentMethod, PaymentObligation, PaymentRecord, PrivateLesson,
    StudentSelection,
};
pub use ports::{Clock, KeyValueStore, PortError, PortResult, SystemClock};
pub use services::{FinanceService, HomeworkService, LessonService, ServiceError, ServiceResult};
