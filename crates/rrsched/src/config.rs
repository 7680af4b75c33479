//! Scheduler configuration.

/// Threads a single task may own unless configured otherwise.
pub const DEFAULT_MAX_THREADS_PER_TASK: usize = 10;

/// Simulated ticks granted to a thread per dispatch.
pub const DEFAULT_QUANTUM_TICKS: u64 = 50;

/// Configuration for the scheduler.
///
/// Holds the fixed constants the dispatcher and the thread lifecycle consult.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SchedConfig {
    pub name: String,
    pub max_threads_per_task: usize,
    pub quantum_ticks: u64,
}

impl Default for SchedConfig {
    fn default() -> Self {
        Self {
            name: "rrsched".to_owned(),
            max_threads_per_task: DEFAULT_MAX_THREADS_PER_TASK,
            quantum_ticks: DEFAULT_QUANTUM_TICKS,
        }
    }
}

impl SchedConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> SchedConfigBuilder {
        SchedConfigBuilder::default()
    }
}

/// Builder for ergonomic configuration construction.
#[derive(Debug, Clone, Default)]
pub struct SchedConfigBuilder {
    config: SchedConfig,
}

impl SchedConfigBuilder {
    /// Sets the scheduler name used in diagnostics.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    /// Sets the maximum number of threads per task.
    pub fn max_threads_per_task(mut self, max: usize) -> Self {
        self.config.max_threads_per_task = max;
        self
    }

    /// Sets the quantum length in simulated ticks.
    pub fn quantum_ticks(mut self, ticks: u64) -> Self {
        self.config.quantum_ticks = ticks;
        self
    }

    pub fn build(self) -> SchedConfig {
        self.config
    }
}
