use std::sync::mpsc::{channel, Receiver, Sender};

use super::{load, LoadError, SceneData, SceneSources};

struct LoadOutcome {
    generation: u64,
    result: Result<SceneData, LoadError>,
}

/// Runs scene loads on the rayon pool. Only the most recent request is ever
/// delivered: outcomes from superseded requests are dropped on arrival.
pub struct SceneLoader {
    /// Generation of the latest request
    generation: u64,
    /// Generation of the latest delivered outcome
    delivered: u64,
    tx: Sender<LoadOutcome>,
    rx: Receiver<LoadOutcome>,
}

impl SceneLoader {
    pub fn new() -> Self {
        let (tx, rx) = channel();
        Self {
            generation: 0,
            delivered: 0,
            tx,
            rx,
        }
    }

    /// Start loading `sources` in the background. Returns the request's generation.
    pub fn request(&mut self, sources: SceneSources) -> u64 {
        self.generation += 1;
        let generation = self.generation;
        let tx = self.tx.clone();

        tracing::debug!(generation, "scene load requested");
        rayon::spawn(move || {
            let result = load(&sources);
            // Receiver gone means the app is shutting down
            let _ = tx.send(LoadOutcome { generation, result });
        });

        generation
    }

    /// Whether the latest request is still in flight.
    pub fn is_loading(&self) -> bool {
        self.delivered < self.generation
    }

    /// Non-blocking: the latest request's outcome if it has arrived.
    pub fn poll(&mut self) -> Option<Result<SceneData, LoadError>> {
        let mut latest = None;
        while let Ok(outcome) = self.rx.try_recv() {
            if outcome.generation == self.generation {
                self.delivered = outcome.generation;
                latest = Some(outcome.result);
            } else {
                tracing::debug!(
                    stale = outcome.generation,
                    current = self.generation,
                    "discarding superseded scene load"
                );
            }
        }
        latest
    }
}

impl Default for SceneLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::tests::fixture;
    use std::time::{Duration, Instant};
    use tempfile::TempDir;

    fn wait_for(loader: &mut SceneLoader) -> Result<SceneData, LoadError> {
        let deadline = Instant::now() + Duration::from_secs(10);
        loop {
            if let Some(result) = loader.poll() {
                return result;
            }
            assert!(Instant::now() < deadline, "load never completed");
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_request_delivers_scene() {
        let dir = TempDir::new().unwrap();
        let mut loader = SceneLoader::new();
        assert!(!loader.is_loading());

        loader.request(fixture(&dir));
        assert!(loader.is_loading());

        let scene = wait_for(&mut loader).unwrap();
        assert_eq!(scene.targets.len(), 2);
        assert!(!loader.is_loading());
    }

    #[test]
    fn test_stale_outcome_is_discarded() {
        let mut loader = SceneLoader::new();
        loader.generation = 2;

        // A slow first request resolving after the second was issued
        let old = SceneData {
            targets: vec![crate::data::Marker::new(1.0, 1.0)],
            ..SceneData::default()
        };
        loader.tx.send(LoadOutcome { generation: 1, result: Ok(old) }).unwrap();
        assert!(loader.poll().is_none());
        assert!(loader.is_loading());

        loader.tx.send(LoadOutcome { generation: 2, result: Ok(SceneData::default()) }).unwrap();
        let scene = loader.poll().unwrap().unwrap();
        assert!(scene.targets.is_empty());
        assert!(!loader.is_loading());
    }

    #[test]
    fn test_failed_load_is_reported() {
        let dir = TempDir::new().unwrap();
        let mut sources = fixture(&dir);
        sources.map = dir.path().join("nowhere.json");

        let mut loader = SceneLoader::new();
        loader.request(sources);
        assert!(wait_for(&mut loader).is_err());
    }
}
