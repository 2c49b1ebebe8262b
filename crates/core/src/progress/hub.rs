//! Registry of background jobs and their progress channels.

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, error, info};

use super::channel::{channel, ProgressReceiver, ProgressSender, Received};
use super::types::{JobId, JobInfo, JobKind, JobState, ProgressEvent, ProgressStatus};

/// Why a viewer could not attach to a job.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AttachError {
    #[error("Job not found: {0}")]
    NotFound(JobId),

    #[error("Another viewer is attached to job {0}")]
    AlreadyAttached(JobId),

    #[error("Progress stream of job {0} was already consumed")]
    Drained(JobId),
}

enum ReceiverSlot {
    Available(ProgressReceiver),
    Attached,
    Drained,
}

struct JobEntry {
    info: JobInfo,
    receiver: ReceiverSlot,
}

#[derive(Default)]
struct HubInner {
    jobs: HashMap<JobId, JobEntry>,
    /// Finished jobs, oldest first.
    finished: VecDeque<JobId>,
}

/// Tracks jobs and hands out the single receiver of each job.
pub struct ProgressHub {
    inner: Mutex<HubInner>,
    retention: usize,
}

impl ProgressHub {
    /// Create a hub that keeps at most `retention` finished jobs.
    pub fn new(retention: usize) -> Self {
        Self {
            inner: Mutex::new(HubInner::default()),
            retention,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HubInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register a job and create its channel.
    pub fn start_job(&self, kind: JobKind, description: impl Into<String>) -> (JobId, ProgressSender) {
        let job_id = JobId::new();
        let (sender, receiver) = channel(job_id.clone());
        let info = JobInfo {
            job_id: job_id.clone(),
            kind,
            state: JobState::Running,
            description: description.into(),
            started_at: Utc::now(),
            finished_at: None,
        };

        info!("Job {} started: {} ({})", job_id, info.description, kind);

        self.lock().jobs.insert(
            job_id.clone(),
            JobEntry {
                info,
                receiver: ReceiverSlot::Available(receiver),
            },
        );

        (job_id, sender)
    }

    /// Mark a job finished and prune old finished jobs.
    pub fn finish_job(&self, job_id: &JobId) {
        let mut inner = self.lock();

        match inner.jobs.get_mut(job_id) {
            Some(entry) if entry.info.state == JobState::Running => {
                entry.info.state = JobState::Finished;
                entry.info.finished_at = Some(Utc::now());
                if let ReceiverSlot::Available(receiver) = &mut entry.receiver {
                    compact_unviewed(receiver);
                }
            }
            _ => return,
        }
        inner.finished.push_back(job_id.clone());
        info!("Job {} finished", job_id);

        while inner.finished.len() > self.retention {
            if let Some(old) = inner.finished.pop_front() {
                debug!("Pruning finished job {}", old);
                inner.jobs.remove(&old);
            }
        }
    }

    /// Register a job and run `task` on its own tokio task.
    ///
    /// If the task panics, an error event is emitted. The sentinel is
    /// always sent once the task is over.
    pub fn spawn_job<F, Fut>(
        self: &Arc<Self>,
        kind: JobKind,
        description: impl Into<String>,
        task: F,
    ) -> JobId
    where
        F: FnOnce(ProgressSender) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (job_id, sender) = self.start_job(kind, description);
        let worker = tokio::spawn(task(sender.clone()));

        let hub = Arc::clone(self);
        let id = job_id.clone();
        tokio::spawn(async move {
            if let Err(e) = worker.await {
                error!("Job {} ended unexpectedly: {}", id, e);
                sender.emit(
                    ProgressEvent::new(id.clone(), 100.0, ProgressStatus::Error)
                        .with_message("Job failed unexpectedly")
                        .with_error(e.to_string()),
                );
            }
            sender.close();
            hub.finish_job(&id);
        });

        job_id
    }

    pub fn get(&self, job_id: &JobId) -> Option<JobInfo> {
        self.lock().jobs.get(job_id).map(|entry| entry.info.clone())
    }

    /// All known jobs, newest first.
    pub fn list(&self) -> Vec<JobInfo> {
        let mut jobs: Vec<JobInfo> = self
            .lock()
            .jobs
            .values()
            .map(|entry| entry.info.clone())
            .collect();
        jobs.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        jobs
    }

    /// Take the receiver of a job for viewing.
    ///
    /// The receiver goes back to the hub when the lease is dropped, unless
    /// the sentinel was consumed.
    pub fn attach(self: &Arc<Self>, job_id: &JobId) -> Result<ReceiverLease, AttachError> {
        let mut inner = self.lock();
        let entry = inner
            .jobs
            .get_mut(job_id)
            .ok_or_else(|| AttachError::NotFound(job_id.clone()))?;

        match std::mem::replace(&mut entry.receiver, ReceiverSlot::Attached) {
            ReceiverSlot::Available(receiver) => {
                debug!("Viewer attached to job {}", job_id);
                Ok(ReceiverLease {
                    hub: Arc::clone(self),
                    receiver: Some(receiver),
                })
            }
            ReceiverSlot::Attached => Err(AttachError::AlreadyAttached(job_id.clone())),
            ReceiverSlot::Drained => {
                entry.receiver = ReceiverSlot::Drained;
                Err(AttachError::Drained(job_id.clone()))
            }
        }
    }

    fn release(&self, mut receiver: ProgressReceiver) {
        let mut inner = self.lock();
        let job_id = receiver.job_id().clone();
        if let Some(entry) = inner.jobs.get_mut(&job_id) {
            entry.receiver = if receiver.is_closed() {
                ReceiverSlot::Drained
            } else {
                if entry.info.state == JobState::Finished {
                    compact_unviewed(&mut receiver);
                }
                ReceiverSlot::Available(receiver)
            };
            debug!("Viewer detached from job {}", job_id);
        }
    }
}

/// Shrink the queue of a finished job nobody is watching.
fn compact_unviewed(receiver: &mut ProgressReceiver) {
    let dropped = receiver.compact();
    if dropped > 0 {
        debug!(
            "Dropped {} queued chunk events of finished job {}",
            dropped,
            receiver.job_id()
        );
    }
}

/// Exclusive access to a job's receiver.
pub struct ReceiverLease {
    hub: Arc<ProgressHub>,
    receiver: Option<ProgressReceiver>,
}

impl ReceiverLease {
    /// See [`ProgressReceiver::next_within`].
    pub async fn next_within(&mut self, wait: Duration) -> Received {
        match self.receiver.as_mut() {
            Some(receiver) => receiver.next_within(wait).await,
            None => Received::Closed,
        }
    }
}

impl Drop for ReceiverLease {
    fn drop(&mut self) {
        if let Some(receiver) = self.receiver.take() {
            self.hub.release(receiver);
        }
    }
}
