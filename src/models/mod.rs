pub mod job;
pub mod outcome;
pub mod progress;
pub mod query;

pub use job::{ExperienceRange, JobRecord, JobSource, JobStatus, JobTags, Skills};
pub use outcome::ApplyOutcome;
pub use progress::{RunProgress, RunStatus, RunSummary};
pub use query::{ExperienceFilter, ListingQuery};
