use std::collections::VecDeque;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::trace;

use super::types::{JobId, ProgressEvent, ProgressStatus};

enum Frame {
    Event(ProgressEvent),
    End,
}

/// Create the channel for one job.
pub fn channel(job_id: JobId) -> (ProgressSender, ProgressReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        ProgressSender {
            job_id: job_id.clone(),
            tx,
        },
        ProgressReceiver {
            job_id,
            rx,
            backlog: VecDeque::new(),
            closed: false,
        },
    )
}

/// Producer side. Cheap to clone; sending never blocks.
#[derive(Clone)]
pub struct ProgressSender {
    job_id: JobId,
    tx: mpsc::UnboundedSender<Frame>,
}

impl ProgressSender {
    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    /// Queue an event, stamped with this job's id.
    pub fn emit(&self, mut event: ProgressEvent) {
        event.job_id = self.job_id.clone();
        if self.tx.send(Frame::Event(event)).is_err() {
            trace!("Progress receiver for job {} is gone, event dropped", self.job_id);
        }
    }

    /// Queue a `{progress, message, status}` event.
    pub fn report(&self, progress: f64, message: impl Into<String>, status: ProgressStatus) {
        self.emit(ProgressEvent::new(self.job_id.clone(), progress, status).with_message(message));
    }

    /// Queue an event about one episode.
    pub fn episode(&self, episode: &str, progress: f64, status: ProgressStatus) {
        self.emit(ProgressEvent::new(self.job_id.clone(), progress, status).with_episode(episode));
    }

    /// Queue the end-of-stream sentinel.
    pub fn close(&self) {
        let _ = self.tx.send(Frame::End);
    }
}

/// What a bounded wait on the receiver produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Received {
    Event(ProgressEvent),
    /// Nothing arrived within the wait window.
    KeepAlive,
    /// Sentinel seen, or every sender dropped.
    Closed,
}

/// Consumer side of a job channel.
pub struct ProgressReceiver {
    job_id: JobId,
    rx: mpsc::UnboundedReceiver<Frame>,
    /// Frames pulled off `rx` by [`compact`](Self::compact), read first.
    backlog: VecDeque<Frame>,
    closed: bool,
}

impl ProgressReceiver {
    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    /// True once the sentinel has been consumed.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Wait at most `wait` for the next frame.
    pub async fn next_within(&mut self, wait: Duration) -> Received {
        if self.closed {
            return Received::Closed;
        }

        let frame = match self.backlog.pop_front() {
            Some(frame) => Some(frame),
            None => match tokio::time::timeout(wait, self.rx.recv()).await {
                Err(_) => return Received::KeepAlive,
                Ok(frame) => frame,
            },
        };

        match frame {
            Some(Frame::Event(event)) => Received::Event(event),
            Some(Frame::End) | None => {
                self.closed = true;
                self.backlog.clear();
                self.rx.close();
                Received::Closed
            }
        }
    }

    /// Drop queued `downloading` events, keeping every other frame in order.
    ///
    /// Per-chunk updates are only useful live. Once a job is over, its queue
    /// shrinks to one event per episode plus the sentinel. Returns how many
    /// events were dropped.
    pub fn compact(&mut self) -> usize {
        while let Ok(frame) = self.rx.try_recv() {
            self.backlog.push_back(frame);
        }

        let before = self.backlog.len();
        self.backlog.retain(|frame| {
            !matches!(frame, Frame::Event(event) if event.status == ProgressStatus::Downloading)
        });
        before - self.backlog.len()
    }
}
