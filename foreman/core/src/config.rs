// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.
//

//! Foreman allocator configuration

use std::time::Duration;

use crate::error::{ForemanError, Result};

/// Configuration for the Foreman executor allocator.
///
/// The allocator validates the configuration once at construction time and
/// assumes it is valid from then on.
#[derive(Debug, Clone)]
pub struct AllocatorConfig {
    /// Heap memory per executor in MB.
    pub executor_memory_mb: u32,
    /// Explicit off-heap memory overhead per executor in MB. When unset, the
    /// overhead is computed from `memory_overhead_factor` with a floor of
    /// [`crate::resource::MIN_MEMORY_OVERHEAD_MB`].
    pub executor_memory_overhead_mb: Option<u32>,
    /// Fraction of executor memory reserved as overhead when no explicit
    /// overhead is configured.
    pub memory_overhead_factor: f64,
    /// Extra memory per executor for the interpreter worker process. Only
    /// set when the application is an interpreter application.
    pub interpreter_worker_memory_mb: Option<u32>,
    /// Number of cores per executor.
    pub executor_cores: u32,
    /// Number of cpus reserved per task; used to convert pending task counts
    /// into expected executor counts during container placement.
    pub task_cpus: u32,
    /// Initial executor target, used until the driver requests a total.
    pub initial_executors: usize,
    /// Maximum number of concurrent container launches.
    pub container_launcher_max_threads: usize,
    /// Node label expression attached to every container request.
    pub node_label_expression: Option<String>,
    /// Sliding window within which executor failures are counted. `None`
    /// means failures never expire.
    pub executor_failures_validity_interval: Option<Duration>,
    /// Number of executor failures after which the application is considered
    /// failed. Defaults to `max(2 * initial_executors, 3)`.
    pub max_executor_failures: Option<usize>,
    /// Whether allocation failures may blacklist nodes for future requests.
    pub launch_blacklist_enabled: bool,
    /// Number of allocation failures on a single host after which the host
    /// is blacklisted (when launch blacklisting is enabled).
    pub max_failures_per_host: usize,
    /// How long an allocator-blacklisted node stays blacklisted.
    pub blacklist_timeout: Duration,
    /// URL of the application driver, passed to every launched executor.
    pub driver_url: String,
    /// Application id, passed to every launched executor.
    pub app_id: String,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            executor_memory_mb: 1024,
            executor_memory_overhead_mb: None,
            memory_overhead_factor: 0.10,
            interpreter_worker_memory_mb: None,
            executor_cores: 1,
            task_cpus: 1,
            initial_executors: 2,
            container_launcher_max_threads: 25,
            node_label_expression: None,
            executor_failures_validity_interval: None,
            max_executor_failures: None,
            launch_blacklist_enabled: false,
            max_failures_per_host: 3,
            blacklist_timeout: Duration::from_secs(60 * 60),
            driver_url: String::default(),
            app_id: String::default(),
        }
    }
}

impl AllocatorConfig {
    pub fn with_executor_memory_mb(mut self, memory_mb: u32) -> Self {
        self.executor_memory_mb = memory_mb;
        self
    }

    pub fn with_executor_memory_overhead_mb(mut self, overhead_mb: u32) -> Self {
        self.executor_memory_overhead_mb = Some(overhead_mb);
        self
    }

    pub fn with_memory_overhead_factor(mut self, factor: f64) -> Self {
        self.memory_overhead_factor = factor;
        self
    }

    pub fn with_interpreter_worker_memory_mb(mut self, memory_mb: u32) -> Self {
        self.interpreter_worker_memory_mb = Some(memory_mb);
        self
    }

    pub fn with_executor_cores(mut self, cores: u32) -> Self {
        self.executor_cores = cores;
        self
    }

    pub fn with_task_cpus(mut self, task_cpus: u32) -> Self {
        self.task_cpus = task_cpus;
        self
    }

    pub fn with_initial_executors(mut self, initial_executors: usize) -> Self {
        self.initial_executors = initial_executors;
        self
    }

    pub fn with_container_launcher_max_threads(mut self, max_threads: usize) -> Self {
        self.container_launcher_max_threads = max_threads;
        self
    }

    pub fn with_node_label_expression(mut self, expression: impl Into<String>) -> Self {
        self.node_label_expression = Some(expression.into());
        self
    }

    pub fn with_executor_failures_validity_interval(mut self, interval: Duration) -> Self {
        self.executor_failures_validity_interval = Some(interval);
        self
    }

    pub fn with_max_executor_failures(mut self, max_failures: usize) -> Self {
        self.max_executor_failures = Some(max_failures);
        self
    }

    pub fn with_launch_blacklist_enabled(mut self, enabled: bool) -> Self {
        self.launch_blacklist_enabled = enabled;
        self
    }

    pub fn with_max_failures_per_host(mut self, max_failures: usize) -> Self {
        self.max_failures_per_host = max_failures;
        self
    }

    pub fn with_blacklist_timeout(mut self, timeout: Duration) -> Self {
        self.blacklist_timeout = timeout;
        self
    }

    pub fn with_driver_url(mut self, driver_url: impl Into<String>) -> Self {
        self.driver_url = driver_url.into();
        self
    }

    pub fn with_app_id(mut self, app_id: impl Into<String>) -> Self {
        self.app_id = app_id.into();
        self
    }

    /// The executor failure threshold in effect.
    pub fn effective_max_executor_failures(&self) -> usize {
        self.max_executor_failures
            .unwrap_or_else(|| (2 * self.initial_executors).max(3))
    }

    /// Validates the configuration. Invalid settings surface here, at
    /// allocator construction time, rather than in the middle of a
    /// reconciliation cycle.
    pub fn validate(&self) -> Result<()> {
        if self.executor_memory_mb == 0 {
            return Err(ForemanError::Configuration(
                "executor memory must be at least 1 MB".to_string(),
            ));
        }
        if self.executor_cores == 0 {
            return Err(ForemanError::Configuration(
                "executor cores must be at least 1".to_string(),
            ));
        }
        if self.task_cpus == 0 {
            return Err(ForemanError::Configuration(
                "task cpus must be at least 1".to_string(),
            ));
        }
        if self.container_launcher_max_threads == 0 {
            return Err(ForemanError::Configuration(
                "container launcher thread count must be at least 1".to_string(),
            ));
        }
        if !self.memory_overhead_factor.is_finite()
            || self.memory_overhead_factor <= 0.0
            || self.memory_overhead_factor > 1.0
        {
            return Err(ForemanError::Configuration(format!(
                "memory overhead factor must be in (0, 1], got {}",
                self.memory_overhead_factor
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(AllocatorConfig::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_settings_are_rejected() {
        let config = AllocatorConfig::default().with_executor_cores(0);
        assert!(config.validate().is_err());

        let config = AllocatorConfig::default().with_memory_overhead_factor(f64::NAN);
        assert!(config.validate().is_err());

        let config = AllocatorConfig::default().with_memory_overhead_factor(0.0);
        assert!(config.validate().is_err());

        let config = AllocatorConfig::default().with_memory_overhead_factor(1.5);
        assert!(config.validate().is_err());

        let config = AllocatorConfig {
            container_launcher_max_threads: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_effective_max_executor_failures() {
        let config = AllocatorConfig::default().with_initial_executors(0);
        assert_eq!(config.effective_max_executor_failures(), 3);

        let config = AllocatorConfig::default().with_initial_executors(8);
        assert_eq!(config.effective_max_executor_failures(), 16);

        let config = AllocatorConfig::default().with_max_executor_failures(5);
        assert_eq!(config.effective_max_executor_failures(), 5);
    }
}
