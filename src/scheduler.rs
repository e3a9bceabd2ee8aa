use std::time::Instant;

use tokio::time::MissedTickBehavior;

use crate::config::Config;
use crate::output::OutputRouter;
use crate::procfs::CounterSource;
use crate::snapshot::{Snapshot, SnapshotEngine};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Waiting for the period timer.
    Idle,
    /// Capturing and publishing one snapshot.
    Sampling,
}

/// Drives capture-and-publish passes on the configured period.
///
/// Sampling or output failures never leave the loop: they are part of the snapshot or
/// logged by the router, and the scheduler returns to [`State::Idle`] after every pass.
#[derive(Debug)]
pub struct Scheduler<'a, S> {
    config: &'a Config,
    engine: SnapshotEngine<S>,
    router: OutputRouter,
    state: State,
    passes: u64,
}

impl<'a, S: CounterSource> Scheduler<'a, S> {
    pub fn new(config: &'a Config, engine: SnapshotEngine<S>, router: OutputRouter) -> Self {
        Self {
            config,
            engine,
            router,
            state: State::Idle,
            passes: 0,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Number of completed passes.
    pub fn passes(&self) -> u64 {
        self.passes
    }

    fn transition(&mut self, to: State) {
        log::trace!("scheduler: {:?} -> {:?}", self.state, to);
        self.state = to;
    }

    /// Runs a single pass: capture every metric, then publish the block to every sink.
    pub async fn run_once(&mut self) -> Snapshot {
        self.transition(State::Sampling);
        let before = Instant::now();

        let snapshot = self.engine.capture_snapshot(self.config).await;
        let failed_sinks = self.router.publish(&snapshot.render());

        self.passes += 1;
        log::debug!(
            "pass {} done in {} ms: {} readings, {} failed, {} sinks failed",
            self.passes,
            before.elapsed().as_millis(),
            snapshot.readings().len(),
            snapshot.failures(),
            failed_sinks
        );
        self.transition(State::Idle);
        snapshot
    }

    /// Runs a pass every period, the first one immediately, until `shutdown` resolves.
    ///
    /// Shutdown is only honoured between passes; the sinks are flushed and closed before
    /// returning.
    pub async fn run_until<F: Future>(mut self, shutdown: F) {
        let mut interval = tokio::time::interval(self.config.period());
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut shutdown = std::pin::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    log::debug!("shutdown requested after {} passes", self.passes);
                    break;
                }
                _ = interval.tick() => {
                    self.run_once().await;
                }
            }
        }

        self.router.close();
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::time::Duration;

    use super::*;
    use crate::output::HEADER;
    use crate::procfs::fake::FakeCounters;

    fn config(log_path: &Path) -> Config {
        format!(
            r#"{{"settings": {{"period": 5}}, "metrics": [{{"type": "cpu", "ids": [0]}}, {{"type": "memory", "spec": ["used"]}}], "outputs": [{{"type": "log", "path": "{}"}}]}}"#,
            log_path.display()
        )
        .parse()
        .unwrap()
    }

    fn source() -> FakeCounters {
        FakeCounters::default()
            .with_core(0, &[(100, 200), (150, 300)])
            .with_memory(8_000_000, 2_000_000)
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_once_returns_to_idle() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.log");
        let config = config(&path);
        let router = OutputRouter::open(config.outputs()).unwrap();
        let mut scheduler = Scheduler::new(&config, SnapshotEngine::new(source()), router);

        assert_eq!(scheduler.state(), State::Idle);
        let snapshot = scheduler.run_once().await;
        assert_eq!(scheduler.state(), State::Idle);
        assert_eq!(scheduler.passes(), 1);

        assert_eq!(snapshot.render(), "CPU Core 0: 50%\nMemory Used: 5859 MB\n");
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "----- Metrics Snapshot -----\nCPU Core 0: 50%\nMemory Used: 5859 MB\n-----------------------------\n"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_until_samples_every_period() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.log");
        let config = config(&path);
        let router = OutputRouter::open(config.outputs()).unwrap();
        let scheduler = Scheduler::new(&config, SnapshotEngine::new(source()), router);

        // Passes start at 0s, 5s and 10s.
        scheduler
            .run_until(tokio::time::sleep(Duration::from_secs(12)))
            .await;

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.matches(HEADER).count(), 3);
        // Counters stop moving after the first pass.
        assert_eq!(content.matches("CPU Core 0: 50%").count(), 1);
        assert_eq!(content.matches("CPU Core 0: 0%").count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_errors_do_not_stop_the_loop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.log");
        let config = config(&path);
        let router = OutputRouter::open(config.outputs()).unwrap();
        let scheduler = Scheduler::new(
            &config,
            SnapshotEngine::new(FakeCounters::unavailable()),
            router,
        );

        scheduler
            .run_until(tokio::time::sleep(Duration::from_secs(7)))
            .await;

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.matches(HEADER).count(), 2);
        assert_eq!(content.matches("Error reading usage").count(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_without_outputs() {
        let config: Config =
            r#"{"settings": {"period": 1}, "metrics": [{"type": "memory", "spec": ["free"]}], "outputs": []}"#
                .parse()
                .unwrap();
        assert!(config.outputs().is_empty());
        let router = OutputRouter::open(config.outputs()).unwrap();
        let mut scheduler = Scheduler::new(&config, SnapshotEngine::new(source()), router);

        let snapshot = scheduler.run_once().await;
        assert_eq!(snapshot.render(), "Memory Free: 1953 MB\n");
    }
}
