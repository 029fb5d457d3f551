// Running job as reported by the job queue

/// One queued or running job. Rebuilt on every scrape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRecord {
    pub job_id: String,
    pub account: String,
    pub user: String,
}

impl JobRecord {
    pub fn new(
        job_id: impl Into<String>,
        account: impl Into<String>,
        user: impl Into<String>,
    ) -> Self {
        Self {
            job_id: job_id.into(),
            account: account.into(),
            user: user.into(),
        }
    }
}
