pub mod error;
pub mod finance;
pub mod homework;
pub mod lessons;

pub use error::{ServiceError, ServiceResult};
pub use finance::FinanceService;
pub use homework::{HomeworkService, StudentTrend};
pub use lessons::LessonService;
