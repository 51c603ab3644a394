pub mod assigner;
pub mod job;
pub mod lifecycle;
pub mod sanitize;
pub mod status;
pub mod store;
pub mod validate;

pub use job::{Coords, Job, JobRequest, JobType, ScheduleType, Size};
pub use status::{Stage, StatusEntry, StatusLog};
pub use store::JobStore;
