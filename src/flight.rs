use std::{
    sync::mpsc::{self, Receiver, RecvTimeoutError, Sender},
    thread,
    time::{Duration, Instant},
};

use log::{debug, warn};

use crate::PaddockError;

struct Outcome<T> {
    generation: u64,
    result: Result<T, PaddockError>,
}

/// Runs one logical request at a time on a worker thread.
///
/// Every call to [`SingleFlight::start`] supersedes the previous one: results
/// are tagged with the generation that started them and anything that arrives
/// for an older generation is dropped when polled (last request wins). The
/// worker thread of a superseded request is not interrupted, its output is
/// simply ignored.
pub struct SingleFlight<T> {
    name: &'static str,
    generation: u64,
    pending: bool,
    outcome_tx: Sender<Outcome<T>>,
    outcome_rx: Receiver<Outcome<T>>,
}

impl<T: Send + 'static> SingleFlight<T> {
    pub fn new(name: &'static str) -> Self {
        let (outcome_tx, outcome_rx) = mpsc::channel();
        Self {
            name,
            generation: 0,
            pending: false,
            outcome_tx,
            outcome_rx,
        }
    }

    /// Starts `job` on a new thread and returns its generation.
    pub fn start<F>(&mut self, job: F) -> u64
    where
        F: FnOnce() -> Result<T, PaddockError> + Send + 'static,
    {
        self.generation += 1;
        self.pending = true;
        let generation = self.generation;
        let outcome_tx = self.outcome_tx.clone();
        let name = self.name;
        debug!("Starting {} request #{}", name, generation);
        thread::spawn(move || {
            let result = job();
            if outcome_tx.send(Outcome { generation, result }).is_err() {
                debug!("{} request #{} finished after its owner went away", name, generation);
            }
        });
        generation
    }

    /// Forgets the in-flight request, if any, so its result is never delivered.
    pub fn cancel(&mut self) {
        if self.pending {
            debug!("Cancelling {} request #{}", self.name, self.generation);
        }
        self.generation += 1;
        self.pending = false;
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Non-blocking check for the result of the latest request.
    pub fn poll(&mut self) -> Option<Result<T, PaddockError>> {
        while let Ok(outcome) = self.outcome_rx.try_recv() {
            if let Some(result) = self.accept(outcome) {
                return Some(result);
            }
        }
        None
    }

    /// Blocks up to `timeout` for the result of the latest request.
    pub fn wait(&mut self, timeout: Duration) -> Option<Result<T, PaddockError>> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.outcome_rx.recv_timeout(remaining) {
                Ok(outcome) => {
                    if let Some(result) = self.accept(outcome) {
                        return Some(result);
                    }
                }
                Err(RecvTimeoutError::Timeout) => return None,
                Err(RecvTimeoutError::Disconnected) => {
                    warn!("{} result channel disconnected", self.name);
                    return None;
                }
            }
        }
    }

    fn accept(&mut self, outcome: Outcome<T>) -> Option<Result<T, PaddockError>> {
        if !self.pending || outcome.generation != self.generation {
            debug!(
                "Discarding stale {} result #{} (current #{})",
                self.name, outcome.generation, self.generation
            );
            return None;
        }
        self.pending = false;
        Some(outcome.result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::channel;

    const WAIT: Duration = Duration::from_secs(5);

    #[test]
    fn test_delivers_latest_result() {
        let mut flight = SingleFlight::new("test");
        let generation = flight.start(|| Ok(42));
        assert_eq!(generation, 1);
        assert!(flight.is_pending());

        let result = flight.wait(WAIT).expect("result should arrive");
        assert_eq!(result.unwrap(), 42);
        assert!(!flight.is_pending());
    }

    #[test]
    fn test_older_request_is_discarded() {
        let mut flight = SingleFlight::new("test");
        let (release_tx, release_rx) = channel::<()>();
        let (done_tx, done_rx) = channel::<()>();

        flight.start(move || {
            release_rx.recv().unwrap();
            done_tx.send(()).unwrap();
            Ok("slow")
        });
        flight.start(|| Ok("fast"));

        assert_eq!(flight.wait(WAIT).unwrap().unwrap(), "fast");

        // let the first request complete and make sure it never surfaces
        release_tx.send(()).unwrap();
        done_rx.recv().unwrap();
        assert!(flight.wait(Duration::from_millis(200)).is_none());
        assert!(flight.poll().is_none());
    }

    #[test]
    fn test_cancel_drops_in_flight_result() {
        let mut flight = SingleFlight::new("test");
        flight.start(|| Ok(1));
        flight.cancel();
        assert!(!flight.is_pending());
        assert!(flight.wait(Duration::from_millis(200)).is_none());
    }

    #[test]
    fn test_errors_are_delivered() {
        let mut flight: SingleFlight<u32> = SingleFlight::new("test");
        flight.start(|| Err(PaddockError::NoConfigDir));
        match flight.wait(WAIT) {
            Some(Err(PaddockError::NoConfigDir)) => {}
            _ => panic!("Expected NoConfigDir error"),
        }
    }
}
