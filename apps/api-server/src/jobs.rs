//! Background job worker.
//!
//! Dispatches queued jobs by kind. Welcome-email delivery and PDF rendering
//! are integration points: the handlers log the work and succeed, keeping
//! the queue/retry machinery exercised without an SMTP or rendering backend.

use std::sync::Arc;

use folio_core::ports::{
    JOB_RENDER_PDF, JOB_SEND_WELCOME_EMAIL, Job, JobHandler, JobQueue, JobResult,
};

/// Start the job worker for the application queue.
pub async fn start_worker(queue: Arc<dyn JobQueue>) {
    let handler: JobHandler = Box::new(|job: Job| Box::pin(handle(job)));

    if let Err(e) = queue.start_worker(handler).await {
        tracing::error!("Failed to start job worker: {}", e);
    }
}

async fn handle(job: Job) -> JobResult {
    match job.job_type.as_str() {
        JOB_SEND_WELCOME_EMAIL => {
            let email = job.payload.get("email").and_then(|v| v.as_str());
            let name = job.payload.get("name").and_then(|v| v.as_str());
            match (email, name) {
                (Some(email), Some(name)) => {
                    tracing::info!(job_id = %job.id, email, name, "sending welcome email");
                    JobResult::Success
                }
                _ => JobResult::Failed(format!(
                    "malformed welcome-email payload: {}",
                    job.payload
                )),
            }
        }
        JOB_RENDER_PDF => {
            let items = job
                .payload
                .get("items")
                .and_then(|v| v.as_array())
                .map(|a| a.len())
                .unwrap_or(0);
            tracing::info!(job_id = %job.id, items, "rendering catalog PDF");
            JobResult::Success
        }
        other => JobResult::Failed(format!("unknown job type: {}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn welcome_email_job_succeeds_with_full_payload() {
        let job = Job::new(
            JOB_SEND_WELCOME_EMAIL,
            json!({ "email": "ann@example.com", "name": "Ann" }),
        );
        assert!(matches!(handle(job).await, JobResult::Success));
    }

    #[tokio::test]
    async fn welcome_email_job_without_email_fails_permanently() {
        let job = Job::new(JOB_SEND_WELCOME_EMAIL, json!({ "name": "Ann" }));
        assert!(matches!(handle(job).await, JobResult::Failed(_)));
    }

    #[tokio::test]
    async fn unknown_job_type_fails_permanently() {
        let job = Job::new("reindex-catalog", json!({}));
        assert!(matches!(handle(job).await, JobResult::Failed(_)));
    }
}
