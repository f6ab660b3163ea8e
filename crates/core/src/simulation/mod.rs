//! Convergence driver
//!
//! `Simulation` owns the grid, the task tree and the worker pool. Each tick runs
//! one generation, flips the buffer parity, and compares the grid-wide minimum
//! against the convergence threshold:
//!
//! - `Running` while the minimum is below the threshold
//! - `Converged` once the minimum reaches the threshold
//! - `Exhausted` when `max_generations` runs out first

pub mod display;

pub use display::{
    display_channel, GridSnapshot, PublishStatus, SnapshotPublisher, SnapshotReceiver,
};

use crate::config::SimulationConfig;
use crate::error::Result;
use crate::grid::{BufferSide, Grid};
use crate::solver::{
    build_task_tree, GenerationTimer, ProfilerScope, Scheduler, StencilKernel, TaskTree,
};
use tracing::{debug, info, trace, warn};

/// Driver state between ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    /// More generations are needed
    Running,
    /// The grid-wide minimum reached the threshold
    Converged,
    /// `max_generations` ran out before convergence
    Exhausted,
}

impl DriverState {
    /// True for `Converged` and `Exhausted`
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Running)
    }
}

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome {
    /// Every cell reached the threshold
    Converged {
        /// Generations computed
        generations: u64,
        /// Grid-wide minimum of the last generation
        local_min: f64,
    },
    /// The generation limit was hit first
    DidNotConverge {
        /// Generations computed
        generations: u64,
        /// Grid-wide minimum of the last generation
        local_min: f64,
    },
}

impl Outcome {
    /// Generations computed
    #[must_use]
    pub fn generations(&self) -> u64 {
        match *self {
            Self::Converged { generations, .. } | Self::DidNotConverge { generations, .. } => {
                generations
            }
        }
    }

    /// Grid-wide minimum of the last generation
    #[must_use]
    pub fn local_min(&self) -> f64 {
        match *self {
            Self::Converged { local_min, .. } | Self::DidNotConverge { local_min, .. } => local_min,
        }
    }

    /// True for `Converged`
    #[must_use]
    pub fn is_converged(&self) -> bool {
        matches!(self, Self::Converged { .. })
    }
}

/// Parallel heat relaxation run
pub struct Simulation {
    config: SimulationConfig,
    grid: Grid,
    tree: TaskTree,
    scheduler: Scheduler,
    kernel: StencilKernel,

    /// Cells at or above this stop changing
    ceiling: f64,
    /// Convergence target for the grid-wide minimum
    threshold: f64,

    /// Buffer the next generation reads
    read_side: BufferSide,
    generation: u64,
    state: DriverState,
    last_min: f64,

    publisher: Option<SnapshotPublisher>,
    timer: GenerationTimer,
}

impl Simulation {
    /// Validate `config` and set up the grid, task tree and worker pool.
    ///
    /// # Errors
    ///
    /// Returns a configuration error before anything is allocated, or a pool
    /// error if the worker threads cannot be started
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;

        let ceiling = config.ceiling_temperature();
        let threshold = config.threshold_temperature();
        let grid = Grid::new(&config);
        let tree = build_task_tree(&config);
        let scheduler = Scheduler::new(config.parallel_units())?;
        let kernel = StencilKernel::from_config(&config);

        info!(
            "Created {}x{} relaxation: {} heat sources, {} threads, ceiling {:.3}, threshold {:.3}",
            config.width,
            config.height,
            config.heat_sources.len(),
            scheduler.threads(),
            ceiling,
            threshold
        );

        let last_min = grid
            .buffer(BufferSide::A)
            .iter()
            .filter(|c| !c.is_heat_source)
            .map(|c| c.temperature)
            .fold(ceiling, f64::min);

        Ok(Self {
            config,
            grid,
            tree,
            scheduler,
            kernel,
            ceiling,
            threshold,
            read_side: BufferSide::A,
            generation: 0,
            state: DriverState::Running,
            last_min,
            publisher: None,
            timer: GenerationTimer::new(),
        })
    }

    /// Send a snapshot after every generation to `publisher`.
    pub fn attach_display(&mut self, publisher: SnapshotPublisher) {
        self.publisher = Some(publisher);
    }

    /// Stop publishing snapshots, handing the publisher back.
    pub fn detach_display(&mut self) -> Option<SnapshotPublisher> {
        self.publisher.take()
    }

    /// Run one generation.
    ///
    /// Does nothing once a terminal state has been reached.
    ///
    /// # Returns
    ///
    /// The state after the tick
    pub fn tick(&mut self) -> DriverState {
        if self.state.is_terminal() {
            return self.state;
        }

        let scope = ProfilerScope::new("generation");
        let min = self.scheduler.run_generation(
            &mut self.tree,
            &mut self.grid,
            self.read_side,
            &self.kernel,
            self.ceiling,
        );
        self.read_side = self.read_side.flipped();
        self.generation += 1;
        self.last_min = min;
        self.timer.record(scope.elapsed());
        drop(scope);

        trace!(
            generation = self.generation,
            local_min = min,
            elapsed_ms = self.timer.last_ms(),
            "Generation complete"
        );

        self.publish_snapshot();

        if min >= self.threshold {
            self.state = DriverState::Converged;
            info!(
                "Converged after {} generations (min {:.3} >= {:.3}, mean {:.3} ms/generation)",
                self.generation,
                min,
                self.threshold,
                self.timer.mean_ms()
            );
        } else if self
            .config
            .max_generations
            .is_some_and(|limit| self.generation >= limit)
        {
            self.state = DriverState::Exhausted;
            warn!(
                "Stopped after {} generations without converging (min {:.3} < {:.3})",
                self.generation, min, self.threshold
            );
        }

        self.state
    }

    /// Tick until a terminal state.
    ///
    /// Without `max_generations` this only returns once the grid converges.
    pub fn run(&mut self) -> Outcome {
        while !self.tick().is_terminal() {}
        self.outcome()
    }

    /// Terminal outcome so far; `None` while still running
    #[must_use]
    pub fn try_outcome(&self) -> Option<Outcome> {
        self.state.is_terminal().then(|| self.outcome())
    }

    fn outcome(&self) -> Outcome {
        let (generations, local_min) = (self.generation, self.last_min);
        match self.state {
            DriverState::Converged => Outcome::Converged {
                generations,
                local_min,
            },
            DriverState::Running | DriverState::Exhausted => Outcome::DidNotConverge {
                generations,
                local_min,
            },
        }
    }

    fn publish_snapshot(&mut self) {
        let Some(publisher) = &self.publisher else {
            return;
        };
        if !publisher.is_connected() {
            debug!("Display consumer gone, detaching publisher");
            self.publisher = None;
            return;
        }

        // The buffer just written is the one the next generation reads
        let snapshot = GridSnapshot::capture(&self.grid, self.read_side, self.generation);
        if publisher.publish(snapshot) == PublishStatus::Closed {
            debug!("Display channel closed, detaching publisher");
            self.publisher = None;
        }
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Generations computed so far
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Grid-wide minimum of the last generation (initial minimum before the first)
    #[must_use]
    pub fn local_min(&self) -> f64 {
        self.last_min
    }

    /// Resolved ceiling temperature
    #[must_use]
    pub fn ceiling(&self) -> f64 {
        self.ceiling
    }

    /// Resolved convergence threshold
    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Buffer holding the most recent generation
    #[must_use]
    pub fn current_side(&self) -> BufferSide {
        self.read_side
    }

    /// Both grid buffers
    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Static task tree
    #[must_use]
    pub fn tree(&self) -> &TaskTree {
        &self.tree
    }

    /// Validated configuration
    #[must_use]
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Generation timing
    #[must_use]
    pub fn timer(&self) -> &GenerationTimer {
        &self.timer
    }

    /// Snapshot of the most recent generation
    #[must_use]
    pub fn snapshot(&self) -> GridSnapshot {
        GridSnapshot::capture(&self.grid, self.read_side, self.generation)
    }
}
