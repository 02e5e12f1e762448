//! Worker-to-host event channel.
//!
//! The worker publishes log lines, status strings and progress through an
//! unbounded channel; the host (GUI or CLI) consumes them on its own event
//! loop and never shares mutable state with the worker.

use serde::Serialize;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum JobEvent {
    /// One line for the host's log view.
    Log(String),
    /// Short status text ("capturing... 12 pages").
    Status(String),
    /// Progress percent in `0.0..=100.0`; `None` when the job is unbounded
    /// and no meaningful percent exists.
    Progress(Option<f32>),
}

/// Sending half of the event channel, cloned into workers. Sends never
/// fail the job: a host that dropped its receiver just stops listening.
#[derive(Clone)]
pub struct EventSink {
    tx: UnboundedSender<JobEvent>,
}

impl EventSink {
    pub fn channel() -> (Self, UnboundedReceiver<JobEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn log(&self, line: impl Into<String>) {
        let _ = self.tx.send(JobEvent::Log(line.into()));
    }

    pub fn status(&self, text: impl Into<String>) {
        let _ = self.tx.send(JobEvent::Status(text.into()));
    }

    pub fn progress(&self, percent: Option<f32>) {
        let _ = self.tx.send(JobEvent::Progress(percent));
    }
}
