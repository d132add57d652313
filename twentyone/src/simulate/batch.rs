use super::{run_single, RunStatus, SimulationRequest, SingleOutcome};
use crate::error::GameResult;

use log::{debug, info};
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;

/// Runs the requested number of independent simulations across the machine's
/// cores and folds the outcomes together.
pub fn run_batch(request: &SimulationRequest) -> GameResult<BatchOutcome> {
    run_batch_with_cancel(request, &AtomicBool::new(false))
}

/// Like `run_batch`, but stops picking up new runs once `cancel` is set.
/// Runs already in flight finish normally.
pub fn run_batch_with_cancel(
    request: &SimulationRequest,
    cancel: &AtomicBool,
) -> GameResult<BatchOutcome> {
    let workers = num_cpus::get().min(request.runs.max(1));
    let next = AtomicUsize::new(0);
    let (tx, rx) = mpsc::channel();
    info!("running {} simulations on {} workers", request.runs, workers);

    thread::scope(|scope| {
        for _ in 0..workers {
            let tx = tx.clone();
            let next = &next;
            scope.spawn(move || {
                while !cancel.load(Ordering::Relaxed) {
                    let index = next.fetch_add(1, Ordering::Relaxed);
                    if index >= request.runs {
                        break;
                    }
                    debug!("starting run {}", index);
                    if tx.send(run_single(request)).is_err() {
                        break;
                    }
                }
            });
        }
        drop(tx);

        let mut outcomes = Vec::new();
        for result in rx {
            outcomes.push(result?);
        }
        Ok(BatchOutcome::collect(request.runs, outcomes))
    })
}

/// The folded result of a batch. Rates are computed over finished runs only;
/// runs cut short by a ceiling say nothing about win chances.
#[derive(Debug, Serialize)]
pub struct BatchOutcome {
    pub requested_runs: usize,
    pub wins: usize,
    pub losses: usize,
    pub unfinished: usize,
    pub outcomes: Vec<SingleOutcome>,
}

impl BatchOutcome {
    fn collect(requested_runs: usize, outcomes: Vec<SingleOutcome>) -> BatchOutcome {
        let mut batch = BatchOutcome {
            requested_runs,
            wins: 0,
            losses: 0,
            unfinished: 0,
            outcomes,
        };
        for outcome in &batch.outcomes {
            match outcome.status {
                RunStatus::Won => batch.wins += 1,
                RunStatus::Lost => batch.losses += 1,
                RunStatus::Unfinished => batch.unfinished += 1,
            }
        }
        batch
    }

    pub fn finished(&self) -> usize {
        self.wins + self.losses
    }

    pub fn success_rate(&self) -> Option<f64> {
        if self.finished() == 0 {
            None
        } else {
            Some(self.wins as f64 / self.finished() as f64 * 100.0)
        }
    }

    pub fn average_hands(&self) -> Option<f64> {
        if self.outcomes.is_empty() {
            return None;
        }
        let total: u64 = self.outcomes.iter().map(|o| o.hands_played).sum();
        Some(total as f64 / self.outcomes.len() as f64)
    }

    pub fn average_final_bankroll(&self) -> Option<f64> {
        if self.outcomes.is_empty() {
            return None;
        }
        let total: f64 = self.outcomes.iter().map(|o| o.final_bankroll).sum();
        Some(total / self.outcomes.len() as f64)
    }

    /// Progress of the batch as a whole: per-run progress averaged over the
    /// requested count, with never-started runs contributing zero.
    pub fn progress(&self) -> f64 {
        if self.requested_runs == 0 {
            return 100.0;
        }
        let total: f64 = self.outcomes.iter().map(|o| o.progress).sum();
        total / self.requested_runs as f64
    }

    /// Profit summed per true-count bucket across every run.
    pub fn profit_by_bucket(&self) -> [f64; 7] {
        let mut totals = [0.0; 7];
        for outcome in &self.outcomes {
            for (total, profit) in totals.iter_mut().zip(outcome.profit_from_true.iter()) {
                *total += profit;
            }
        }
        totals
    }
}

impl fmt::Display for BatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "runs: {} completed of {} requested",
            self.outcomes.len(),
            self.requested_runs
        )?;
        writeln!(
            f,
            "won: {}, lost: {}, unfinished: {}",
            self.wins, self.losses, self.unfinished
        )?;
        match self.success_rate() {
            Some(rate) => writeln!(f, "success rate over finished runs: {:.2}%", rate)?,
            None => writeln!(f, "success rate over finished runs: n/a")?,
        }
        writeln!(f, "overall progress: {:.1}%", self.progress())?;
        if let Some(hands) = self.average_hands() {
            writeln!(f, "average hands per run: {:.1}", hands)?;
        }
        if let Some(bankroll) = self.average_final_bankroll() {
            writeln!(f, "average final bankroll: {:.2}", bankroll)?;
        }
        writeln!(f, "profit by true count bucket:")?;
        for (bucket, profit) in self.profit_by_bucket().iter().enumerate() {
            let label = if bucket == 6 {
                "6+".to_string()
            } else {
                format!("{} ", bucket)
            };
            writeln!(f, "  tc {}: {:+.2}", label, profit)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(runs: usize) -> SimulationRequest {
        let mut request = crate::simulate::tests::quick_request();
        request.runs = runs;
        request
    }

    #[test]
    fn every_requested_run_is_accounted_for() {
        let batch = run_batch(&request(4)).unwrap();
        assert_eq!(batch.outcomes.len(), 4);
        assert_eq!(batch.wins + batch.losses + batch.unfinished, 4);
        assert_eq!(batch.progress(), 100.0);
    }

    #[test]
    fn cancelled_batch_picks_up_no_runs() {
        let cancel = AtomicBool::new(true);
        let batch = run_batch_with_cancel(&request(4), &cancel).unwrap();
        assert!(batch.outcomes.is_empty());
        assert_eq!(batch.success_rate(), None);
        assert_eq!(batch.average_hands(), None);
        assert_eq!(batch.progress(), 0.0);
    }

    #[test]
    fn bucket_profits_fold_across_runs() {
        let batch = run_batch(&request(3)).unwrap();
        let folded: f64 = batch.profit_by_bucket().iter().sum();
        let individually: f64 = batch.outcomes.iter().map(|o| o.profit()).sum();
        assert!((folded - individually).abs() < 1e-9);
    }

    #[test]
    fn summary_mentions_the_run_counts() {
        let batch = run_batch(&request(2)).unwrap();
        let text = batch.to_string();
        assert!(text.contains("2 requested"));
        assert!(text.contains("profit by true count bucket"));
    }
}
