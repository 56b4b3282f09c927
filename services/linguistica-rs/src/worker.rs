//! Runs the full pipeline on a background thread.
//!
//! The worker owns its lexicon until the run finishes, so the caller cannot
//! change parameters mid-run. The finished lexicon, with every structure
//! cached, comes back through a one-slot channel.

use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread::{self, JoinHandle};

use tracing::{info, warn};

use crate::error::{LexiconError, Result};
use crate::lexicon::Lexicon;

type Outcome = Result<Lexicon>;

pub struct LexiconWorker {
    receiver: Receiver<Outcome>,
    handle: Option<JoinHandle<()>>,
}

impl LexiconWorker {
    /// Start `run_all_modules` on `lexicon` in a new thread.
    pub fn spawn(lexicon: Lexicon) -> Result<Self> {
        let (sender, receiver) = mpsc::sync_channel(1);
        let handle = thread::Builder::new()
            .name("lexicon-worker".into())
            .spawn(move || {
                let outcome = lexicon.run_all_modules().map(|()| lexicon);
                if let Err(err) = &outcome {
                    warn!("background run failed: {err}");
                }
                // The receiver may already be gone; nothing left to report to.
                let _ = sender.send(outcome);
            })?;
        info!("background run started");
        Ok(Self {
            receiver,
            handle: Some(handle),
        })
    }

    /// Block until the run finishes.
    pub fn wait(mut self) -> Outcome {
        match self.receiver.recv() {
            Ok(outcome) => {
                self.join();
                outcome
            }
            Err(_) => Err(self.panic_error()),
        }
    }

    /// The outcome if the run has finished, without blocking.
    pub fn try_result(&mut self) -> Option<Outcome> {
        match self.receiver.try_recv() {
            Ok(outcome) => {
                self.join();
                Some(outcome)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(self.panic_error())),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }

    fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    fn panic_error(&mut self) -> LexiconError {
        let message = match self.handle.take().map(JoinHandle::join) {
            Some(Err(payload)) => payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string()),
            _ => "worker exited without a result".to_string(),
        };
        LexiconError::WorkerPanicked(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameters::Parameters;

    #[test]
    fn test_worker_returns_computed_lexicon() {
        let lexicon = Lexicon::from_word_counts(
            [("talks", 5), ("talked", 3), ("walks", 4), ("walked", 2)],
            Parameters::default(),
        );
        let lexicon = LexiconWorker::spawn(lexicon).unwrap().wait().unwrap();
        let before = lexicon.computation_count();
        assert_eq!(before, 5);
        lexicon.run_all_modules().unwrap();
        assert_eq!(lexicon.computation_count(), before);
    }

    #[test]
    fn test_worker_reports_errors() {
        let lexicon = Lexicon::default();
        let err = LexiconWorker::spawn(lexicon).unwrap().wait().unwrap_err();
        assert!(matches!(err, LexiconError::PipelineNotRun { .. }));
    }

    #[test]
    fn test_try_result_eventually_ready() {
        let lexicon = Lexicon::from_word_counts([("a", 1)], Parameters::default());
        let mut worker = LexiconWorker::spawn(lexicon).unwrap();
        let outcome = loop {
            if let Some(outcome) = worker.try_result() {
                break outcome;
            }
            std::thread::yield_now();
        };
        assert!(outcome.is_ok());
        assert!(worker.is_finished());
    }
}
