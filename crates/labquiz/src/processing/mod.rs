//! Background generation with job queue and progress tracking

mod job_queue;
mod worker;

pub use job_queue::{
    GenerateOptions, GenerationJob, JobProgress, JobQueue, JobStage, JobState, QueueStats,
};
pub use worker::GenerationWorker;
