pub mod release_publisher;
pub mod report;

pub use release_publisher::ReleasePublisher;
pub use report::{RunReport, StepRecord, StepStatus, REPORT_FILE};
