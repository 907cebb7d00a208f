// Routing Domain Model

use serde::{Deserialize, Serialize};

/// Job category key
pub type JobCategory = String;

/// Assignment of one job category to the queue responsible for it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Routing {
    pub job_category: JobCategory,
    pub queue_name: String,
}

impl Routing {
    pub fn new(job_category: impl Into<String>, queue_name: impl Into<String>) -> Self {
        Self {
            job_category: job_category.into(),
            queue_name: queue_name.into(),
        }
    }
}
