//! Outer driving loop on a dedicated thread.
//!
//! The stepper owns no state of its own: the engine sits behind one coarse
//! mutex taken once per step, and control requests travel through a second
//! mutex paired with a condvar. Requests are only honored at step
//! boundaries, so an inspector never sees a half-processed collision.

use crate::core::{EngineState, EventScheduler, StepOutcome};
use crate::error::Result;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use tracing::{debug, info};

/// Why the stepper thread stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Halted,
    StepBudget,
    NoFurtherEvents,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    /// Collisions processed by this runner.
    pub steps: u64,
    pub reason: StopReason,
    /// Simulation time when the stepper stopped.
    pub time: f64,
}

#[derive(Debug, Default)]
struct Control {
    pause_requested: bool,
    /// Set by the stepper once it is parked at a step boundary.
    paused: bool,
    halt_requested: bool,
    finished: bool,
    max_steps: Option<u64>,
    steps: u64,
}

#[derive(Debug)]
struct Shared {
    engine: Mutex<EventScheduler>,
    control: Mutex<Control>,
    signal: Condvar,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Shared {
    fn wait<'a>(&self, guard: MutexGuard<'a, Control>) -> MutexGuard<'a, Control> {
        self.signal.wait(guard).unwrap_or_else(PoisonError::into_inner)
    }
}

/// Cloneable handle for steering a running [`Runner`] from other threads.
#[derive(Debug, Clone)]
pub struct Controller {
    shared: Arc<Shared>,
}

impl Controller {
    /// Request a pause and block until the stepper has parked.
    pub fn pause(&self) {
        let mut control = lock(&self.shared.control);
        control.pause_requested = true;
        self.shared.signal.notify_all();
        while !control.paused && !control.finished {
            control = self.shared.wait(control);
        }
    }

    pub fn resume(&self) {
        let mut control = lock(&self.shared.control);
        control.pause_requested = false;
        self.shared.signal.notify_all();
    }

    /// Request a halt and block until the stepper has stopped.
    pub fn halt(&self) {
        let mut control = lock(&self.shared.control);
        control.halt_requested = true;
        self.shared.signal.notify_all();
        while !control.finished {
            control = self.shared.wait(control);
        }
    }

    /// Change the step budget; `None` removes it.
    pub fn set_max_steps(&self, max_steps: Option<u64>) {
        let mut control = lock(&self.shared.control);
        control.max_steps = max_steps;
        self.shared.signal.notify_all();
    }

    /// Collisions processed so far by the runner.
    pub fn steps_taken(&self) -> u64 {
        lock(&self.shared.control).steps
    }

    pub fn is_finished(&self) -> bool {
        lock(&self.shared.control).finished
    }

    /// Run `f` against the engine between two steps.
    pub fn inspect<R>(&self, f: impl FnOnce(&EventScheduler) -> R) -> R {
        f(&lock(&self.shared.engine))
    }
}

/// A scheduler being stepped on its own thread.
#[derive(Debug)]
pub struct Runner {
    controller: Controller,
    handle: JoinHandle<Result<RunSummary>>,
}

impl Runner {
    /// Initialize `engine` if needed and start stepping it. The step budget
    /// starts at the engine's `max_steps` setting.
    pub fn spawn(mut engine: EventScheduler) -> Result<Self> {
        if engine.state() == EngineState::Uninitialized {
            engine.initialize()?;
        }
        let control = Control {
            max_steps: engine.config().max_steps,
            ..Control::default()
        };
        let shared = Arc::new(Shared {
            engine: Mutex::new(engine),
            control: Mutex::new(control),
            signal: Condvar::new(),
        });
        let worker = Arc::clone(&shared);
        let handle = thread::spawn(move || {
            let result = run(&worker);
            lock(&worker.control).finished = true;
            worker.signal.notify_all();
            result
        });
        Ok(Self {
            controller: Controller { shared },
            handle,
        })
    }

    pub fn controller(&self) -> Controller {
        self.controller.clone()
    }

    /// Wait for the stepper to stop. Re-raises a panic from the stepper.
    pub fn join(self) -> Result<RunSummary> {
        self.handle
            .join()
            .unwrap_or_else(|payload| std::panic::resume_unwind(payload))
    }
}

/// Park at the step boundary while paused. Returns a stop reason once the
/// stepper must exit.
fn wait_for_go(shared: &Shared) -> Result<Option<StopReason>> {
    let mut control = lock(&shared.control);
    loop {
        if control.halt_requested {
            return Ok(Some(StopReason::Halted));
        }
        if control.max_steps.is_some_and(|max| control.steps >= max) {
            return Ok(Some(StopReason::StepBudget));
        }
        if !control.pause_requested {
            break;
        }
        if !control.paused {
            let mut engine = lock(&shared.engine);
            engine.pause()?;
            debug!(steps = control.steps, time = engine.time(), "runner paused");
            control.paused = true;
            shared.signal.notify_all();
        }
        control = shared.wait(control);
    }
    if control.paused {
        lock(&shared.engine).unpause()?;
        control.paused = false;
        debug!(steps = control.steps, "runner resumed");
    }
    Ok(None)
}

fn run(shared: &Shared) -> Result<RunSummary> {
    info!("runner started");
    let reason = loop {
        if let Some(reason) = wait_for_go(shared)? {
            break reason;
        }
        let outcome = lock(&shared.engine).step()?;
        match outcome {
            StepOutcome::Collision(_) => lock(&shared.control).steps += 1,
            StepOutcome::NoFurtherEvents => break StopReason::NoFurtherEvents,
        }
    };

    let steps = lock(&shared.control).steps;
    let mut engine = lock(&shared.engine);
    if reason == StopReason::Halted && engine.state() != EngineState::Halted {
        engine.halt()?;
    }
    let summary = RunSummary {
        steps,
        reason,
        time: engine.time(),
    };
    info!(
        steps = summary.steps,
        reason = ?summary.reason,
        time = summary.time,
        "runner stopped"
    );
    Ok(summary)
}
