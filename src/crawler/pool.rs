//! Bounded-concurrency job runner

use crate::crawler::progress::ProgressReporter;
use futures::stream::{self, StreamExt};
use std::fmt::Display;
use std::future::Future;

/// Runs independent jobs with at most `workers` of them in flight
///
/// Results come back in input order, whatever order the jobs finish in.
/// The first failing job aborts the run: jobs still in flight are dropped
/// and its error is returned.
#[derive(Debug, Clone, Copy)]
pub struct WorkerPool {
    workers: usize,
}

impl WorkerPool {
    /// Creates a pool; a size of zero is treated as one
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Runs `job` once per input
    ///
    /// # Arguments
    ///
    /// * `inputs` - One entry per job; its `Display` form labels progress events
    /// * `progress` - Notified as jobs complete
    /// * `job` - The work to run for each input
    pub async fn run<I, T, E, F, Fut>(
        &self,
        inputs: Vec<I>,
        progress: &dyn ProgressReporter,
        job: F,
    ) -> Result<Vec<T>, E>
    where
        I: Display,
        F: Fn(I) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let total = inputs.len();
        progress.started(total);

        let job = &job;
        let mut outcomes = stream::iter(inputs.into_iter().enumerate())
            .map(|(index, input)| async move {
                let label = input.to_string();
                (index, label, job(input).await)
            })
            .buffer_unordered(self.workers);

        let mut slots: Vec<Option<T>> = (0..total).map(|_| None).collect();
        let mut completed = 0;

        while let Some((index, label, result)) = outcomes.next().await {
            slots[index] = Some(result?);
            completed += 1;
            progress.advanced(completed, total, &label);
        }

        progress.finished(total);
        Ok(slots.into_iter().flatten().collect())
    }
}
