use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use tracing::debug;

use super::collect::{GraphSource, LoadedDataset};

#[derive(Debug)]
pub enum LoadEvent {
    Loaded(LoadedDataset),
    Failed(String),
    /// The worker for the latest request exited without answering.
    WorkerLost,
}

struct InFlight {
    seq: u64,
    rx: Receiver<Result<LoadedDataset, String>>,
}

/// Fetches datasets on worker threads. Every request gets a sequence
/// number and only the answer to the newest one is surfaced.
pub struct GraphLoader {
    source: Arc<dyn GraphSource>,
    next_seq: u64,
    latest: Option<u64>,
    in_flight: Vec<InFlight>,
}

impl GraphLoader {
    pub fn new(source: Arc<dyn GraphSource>) -> Self {
        Self {
            source,
            next_seq: 0,
            latest: None,
            in_flight: Vec::new(),
        }
    }

    pub fn source(&self) -> &Arc<dyn GraphSource> {
        &self.source
    }

    pub fn latest_seq(&self) -> Option<u64> {
        self.latest
    }

    pub fn is_loading(&self) -> bool {
        self.latest
            .is_some_and(|latest| self.in_flight.iter().any(|flight| flight.seq == latest))
    }

    pub fn request(&mut self, dataset: &str) -> u64 {
        self.next_seq += 1;
        let seq = self.next_seq;
        let (tx, rx) = mpsc::channel();
        let source = Arc::clone(&self.source);
        let name = dataset.to_owned();

        thread::spawn(move || {
            let result = source.fetch(&name).map_err(|error| format!("{error:#}"));
            let _ = tx.send(result);
        });

        debug!(seq, dataset, "dataset requested");
        self.latest = Some(seq);
        self.in_flight.push(InFlight { seq, rx });
        seq
    }

    pub fn poll(&mut self) -> Option<LoadEvent> {
        let latest = self.latest;
        let mut event = None;

        self.in_flight.retain(|flight| match flight.rx.try_recv() {
            Ok(result) => {
                if let Some(accepted) = accept(latest, flight.seq, result) {
                    event = Some(accepted);
                }
                false
            }
            Err(TryRecvError::Empty) => true,
            Err(TryRecvError::Disconnected) => {
                if Some(flight.seq) == latest {
                    event = Some(LoadEvent::WorkerLost);
                }
                false
            }
        });

        event
    }
}

fn accept(
    latest: Option<u64>,
    seq: u64,
    result: Result<LoadedDataset, String>,
) -> Option<LoadEvent> {
    if Some(seq) != latest {
        debug!(seq, ?latest, "discarding stale dataset response");
        return None;
    }

    Some(match result {
        Ok(dataset) => LoadEvent::Loaded(dataset),
        Err(error) => LoadEvent::Failed(error),
    })
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use anyhow::{Result, anyhow};

    use super::*;
    use crate::model::Normalized;

    struct FakeSource;

    impl GraphSource for FakeSource {
        fn datasets(&self) -> Result<Vec<String>> {
            Ok(vec!["fast".to_owned(), "slow".to_owned()])
        }

        fn fetch(&self, dataset: &str) -> Result<LoadedDataset> {
            match dataset {
                "slow" => thread::sleep(Duration::from_millis(150)),
                "panic" => panic!("worker died"),
                "broken" => return Err(anyhow!("payload missing nodes")),
                _ => {}
            }

            Ok(LoadedDataset {
                name: dataset.to_owned(),
                normalized: Normalized::default(),
            })
        }
    }

    fn drain(loader: &mut GraphLoader) -> Vec<LoadEvent> {
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut events = Vec::new();
        while !loader.in_flight.is_empty() && Instant::now() < deadline {
            events.extend(loader.poll());
            thread::sleep(Duration::from_millis(5));
        }
        events
    }

    #[test]
    fn superseded_response_is_discarded() {
        let mut loader = GraphLoader::new(Arc::new(FakeSource));
        loader.request("slow");
        let latest = loader.request("fast");
        assert_eq!(loader.latest_seq(), Some(latest));
        assert!(loader.is_loading());

        let events = drain(&mut loader);

        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], LoadEvent::Loaded(dataset) if dataset.name == "fast"));
        assert!(!loader.is_loading());
    }

    #[test]
    fn stale_sequence_numbers_are_rejected() {
        let dataset = LoadedDataset {
            name: "old".to_owned(),
            normalized: Normalized::default(),
        };
        assert!(accept(Some(3), 2, Ok(dataset)).is_none());
        assert!(matches!(
            accept(Some(3), 3, Err("boom".to_owned())),
            Some(LoadEvent::Failed(error)) if error == "boom"
        ));
    }

    #[test]
    fn failures_and_lost_workers_surface() {
        let mut loader = GraphLoader::new(Arc::new(FakeSource));
        loader.request("broken");
        let events = drain(&mut loader);
        assert!(matches!(&events[..], [LoadEvent::Failed(error)] if error.contains("missing nodes")));

        loader.request("panic");
        let events = drain(&mut loader);
        assert!(matches!(&events[..], [LoadEvent::WorkerLost]));
    }
}
