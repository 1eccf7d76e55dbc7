//! Progress reporting for the category fan-out

use std::time::Instant;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Receives progress notifications from a [`WorkerPool`](crate::crawler::WorkerPool)
///
/// All methods have empty default implementations.
pub trait ProgressReporter: Send + Sync {
    /// Called once before any job runs
    fn started(&self, _total: usize) {}

    /// Called after each job completes, in completion order
    fn advanced(&self, _completed: usize, _total: usize, _label: &str) {}

    /// Called once after every job completed
    fn finished(&self, _total: usize) {}
}

/// Reporter that ignores every notification
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {}

/// Reporter that writes progress lines through `tracing`
#[derive(Debug)]
pub struct LogProgress {
    start_time: Instant,
}

impl LogProgress {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
        }
    }
}

impl Default for LogProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for LogProgress {
    fn started(&self, total: usize) {
        tracing::info!("Dispatching {} categories", total);
    }

    fn advanced(&self, completed: usize, total: usize, label: &str) {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        let rate = if elapsed > 0.0 {
            completed as f64 / elapsed
        } else {
            0.0
        };
        tracing::info!(
            "Progress: {}/{} categories done ({}), {:.2} categories/sec",
            completed,
            total,
            label,
            rate
        );
    }

    fn finished(&self, total: usize) {
        tracing::info!(
            "All {} categories done in {:.1}s",
            total,
            self.start_time.elapsed().as_secs_f64()
        );
    }
}

/// A progress notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Started { total: usize },
    Advanced {
        completed: usize,
        total: usize,
        label: String,
    },
    Finished { total: usize },
}

/// Reporter that forwards notifications over a channel
///
/// Events are dropped silently once the receiver is gone.
#[derive(Debug, Clone)]
pub struct ChannelProgress {
    sender: UnboundedSender<ProgressEvent>,
}

impl ChannelProgress {
    /// Creates a reporter and the receiver its events arrive on
    pub fn new() -> (Self, UnboundedReceiver<ProgressEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    fn send(&self, event: ProgressEvent) {
        let _ = self.sender.send(event);
    }
}

impl ProgressReporter for ChannelProgress {
    fn started(&self, total: usize) {
        self.send(ProgressEvent::Started { total });
    }

    fn advanced(&self, completed: usize, total: usize, label: &str) {
        self.send(ProgressEvent::Advanced {
            completed,
            total,
            label: label.to_string(),
        });
    }

    fn finished(&self, total: usize) {
        self.send(ProgressEvent::Finished { total });
    }
}
