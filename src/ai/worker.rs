use super::{
    sanitize_hint, AiJob, AiJobKind, AiOutcome, JudgeService, Verdict, HINT_UNAVAILABLE_MESSAGE,
};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

/// Worker tasks draining the shared job queue
pub const AI_WORKERS: usize = 2;

/// Spawn the worker pool. Outcomes are posted to `outcomes`; workers stop when the job
/// queue closes or the receiving side of `outcomes` is dropped.
pub fn spawn_ai_workers(
    judge: Arc<dyn JudgeService>,
    jobs: mpsc::Receiver<AiJob>,
    outcomes: mpsc::UnboundedSender<AiOutcome>,
) -> Vec<JoinHandle<()>> {
    let jobs = Arc::new(Mutex::new(jobs));

    (0..AI_WORKERS)
        .map(|worker| {
            let judge = judge.clone();
            let jobs = jobs.clone();
            let outcomes = outcomes.clone();
            tokio::spawn(async move {
                loop {
                    let job = { jobs.lock().await.recv().await };
                    let Some(job) = job else {
                        break;
                    };
                    let outcome = run_job(judge.as_ref(), job).await;
                    if outcomes.send(outcome).is_err() {
                        break;
                    }
                }
                tracing::debug!("AI worker {} stopped", worker);
            })
        })
        .collect()
}

/// Run one job to completion. Failures and timeouts collapse into safe outcomes.
pub async fn run_job(judge: &dyn JudgeService, job: AiJob) -> AiOutcome {
    match job.kind {
        AiJobKind::Validate { player, guess } => {
            let call = judge.validate_answer(&job.question, &job.answer, &guess, job.timeout);
            let verdict = match tokio::time::timeout(job.timeout, call).await {
                Ok(Ok(verdict)) => verdict,
                Ok(Err(e)) => {
                    tracing::warn!("Trivia AI validation failed: {}", e);
                    Verdict::rejected("ai error")
                }
                Err(_) => {
                    tracing::warn!("Trivia AI validation timed out after {:?}", job.timeout);
                    Verdict::rejected("timeout")
                }
            };
            AiOutcome::Validation {
                player,
                round_id: job.round_id,
                verdict,
            }
        }
        AiJobKind::Hint { scope } => {
            let call = judge.generate_hint(&job.question, &job.answer, job.timeout);
            let text = match tokio::time::timeout(job.timeout, call).await {
                Ok(Ok(raw)) => sanitize_hint(&raw, &job.answer),
                Ok(Err(e)) => {
                    tracing::warn!("Trivia AI hint failed: {}", e);
                    HINT_UNAVAILABLE_MESSAGE.to_string()
                }
                Err(_) => {
                    tracing::warn!("Trivia AI hint timed out after {:?}", job.timeout);
                    HINT_UNAVAILABLE_MESSAGE.to_string()
                }
            };
            AiOutcome::Hint {
                scope,
                round_id: job.round_id,
                text,
            }
        }
    }
}
