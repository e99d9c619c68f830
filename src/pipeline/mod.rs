pub mod error;
pub mod intake;
pub mod orchestrator;
pub mod unit;
pub mod verdict;

pub use error::{CoordinatorError, IntakeError, ScanError};
pub use intake::{AnalysisService, Submission};
pub use orchestrator::{FanOutCoordinator, ScanPlan, LANGUAGE_DETECTOR};
pub use unit::{ScanRequest, ScanUnit, UnitReport, UnitState};
pub use verdict::final_result;
