//! Simulation runner with lifecycle management.
//!
//! Runs the engine in a background thread with start, pause, resume, and
//! status tracking. The render-side collaborator reads particle state
//! through [`SimulationRunner::snapshot`]; it never writes.

use engine::{InteractionPolicy, Particle, ParticleEngine};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// Runner state enum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunnerState {
    /// Runner created but not yet started.
    Created,
    /// Ticks are being stepped.
    Running,
    /// Stepping suspended; resume to continue.
    Paused,
    /// Tick limit reached or explicitly stopped.
    Finished,
}

/// Shared state between the runner thread and the control interface.
struct SharedState {
    state: RunnerState,
    ticks: u64,
    alive: usize,
}

/// Handle for controlling and querying a running simulation.
pub struct SimulationRunner<P> {
    shared: Arc<Mutex<SharedState>>,
    engine: Arc<Mutex<ParticleEngine<P>>>,
    thread_handle: Option<thread::JoinHandle<()>>,
}

impl<P> SimulationRunner<P>
where
    P: InteractionPolicy + Send + Sync + 'static,
{
    /// Create a runner around `engine`, stepping until `max_ticks` (if
    /// given) once started.
    pub fn new(engine: ParticleEngine<P>, max_ticks: Option<u64>) -> Self {
        let shared = Arc::new(Mutex::new(SharedState {
            state: RunnerState::Created,
            ticks: engine.ticks(),
            alive: engine.alive(),
        }));
        let engine = Arc::new(Mutex::new(engine));

        let shared_clone = Arc::clone(&shared);
        let engine_clone = Arc::clone(&engine);
        let thread_handle = thread::spawn(move || {
            run_simulation_loop(engine_clone, shared_clone, max_ticks);
        });

        Self {
            shared,
            engine,
            thread_handle: Some(thread_handle),
        }
    }

    /// Begin stepping ticks.
    pub fn start(&self) {
        self.set_state(RunnerState::Running);
    }

    /// Suspend stepping at the next tick boundary.
    pub fn pause(&self) {
        let mut shared = self.shared.lock().unwrap();
        if shared.state == RunnerState::Running {
            shared.state = RunnerState::Paused;
        }
    }

    /// Resume a paused runner.
    pub fn resume(&self) {
        let mut shared = self.shared.lock().unwrap();
        if shared.state == RunnerState::Paused {
            shared.state = RunnerState::Running;
        }
    }

    /// Stop permanently; the background thread exits at the next boundary.
    pub fn stop(&self) {
        self.set_state(RunnerState::Finished);
    }

    /// Current runner state.
    pub fn state(&self) -> RunnerState {
        self.shared.lock().unwrap().state.clone()
    }

    /// Ticks stepped so far.
    pub fn ticks(&self) -> u64 {
        self.shared.lock().unwrap().ticks
    }

    /// Live particle count as of the last stepped tick.
    pub fn alive(&self) -> usize {
        self.shared.lock().unwrap().alive
    }

    /// Copy of the current resolved particle buffer, for rendering or
    /// inspection. Taken at a tick boundary.
    pub fn snapshot(&self) -> Vec<Particle> {
        self.engine.lock().unwrap().particles().to_vec()
    }

    fn set_state(&self, state: RunnerState) {
        self.shared.lock().unwrap().state = state;
    }
}

impl<P> Drop for SimulationRunner<P> {
    fn drop(&mut self) {
        self.shared.lock().unwrap().state = RunnerState::Finished;
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

/// Background loop: step while running, idle while created or paused.
fn run_simulation_loop<P>(
    engine: Arc<Mutex<ParticleEngine<P>>>,
    shared: Arc<Mutex<SharedState>>,
    max_ticks: Option<u64>,
) where
    P: InteractionPolicy + Send + Sync + 'static,
{
    loop {
        let state = shared.lock().unwrap().state.clone();
        match state {
            RunnerState::Created | RunnerState::Paused => {
                thread::sleep(Duration::from_millis(1));
            }
            RunnerState::Finished => break,
            RunnerState::Running => {
                let mut engine = engine.lock().unwrap();
                engine.step();

                let mut shared = shared.lock().unwrap();
                shared.ticks = engine.ticks();
                shared.alive = engine.alive();
                if let Some(limit) = max_ticks {
                    if shared.ticks >= limit {
                        shared.state = RunnerState::Finished;
                        tracing::info!(ticks = shared.ticks, "runner reached tick limit");
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::{EngineParams, NullPolicy, SocialMatrix, SpeciesData};
    use glam::Vec3;
    use std::time::Instant;

    fn small_engine() -> ParticleEngine<NullPolicy> {
        let params = EngineParams {
            max_particles: 32,
            chunk_side: 8,
            threads: Some(2),
            ..EngineParams::default()
        };
        let mut engine = ParticleEngine::new(
            params,
            vec![SpeciesData::default()],
            SocialMatrix::new(1),
            NullPolicy,
        );
        for i in 0..8 {
            engine.try_emit(engine::Particle::new(Vec3::splat(i as f32 * 0.01), 0));
        }
        engine
    }

    fn wait_for_finish(runner: &SimulationRunner<NullPolicy>) {
        let deadline = Instant::now() + Duration::from_secs(10);
        while runner.state() != RunnerState::Finished {
            assert!(Instant::now() < deadline, "runner did not finish in time");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn runner_steps_to_the_tick_limit() {
        let runner = SimulationRunner::new(small_engine(), Some(20));
        assert_eq!(runner.state(), RunnerState::Created);
        assert_eq!(runner.ticks(), 0);

        runner.start();
        wait_for_finish(&runner);

        assert_eq!(runner.ticks(), 20);
        assert_eq!(runner.alive(), 8);
        assert_eq!(runner.snapshot().len(), 8);
    }

    #[test]
    fn pause_holds_the_tick_count() {
        let runner = SimulationRunner::new(small_engine(), None);
        runner.start();
        thread::sleep(Duration::from_millis(20));
        runner.pause();
        assert_eq!(runner.state(), RunnerState::Paused);

        // Let any in-flight tick land before sampling the count.
        thread::sleep(Duration::from_millis(20));
        let frozen = runner.ticks();
        thread::sleep(Duration::from_millis(20));
        assert_eq!(runner.ticks(), frozen);

        runner.resume();
        runner.stop();
        wait_for_finish(&runner);
    }
}
