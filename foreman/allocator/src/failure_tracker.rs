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

//! Sliding-window executor failure accounting.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Counts executor failures, globally and per host, over a sliding time
/// window. Failures older than the validity interval expire; a `None`
/// interval means failures never expire.
pub struct FailureTracker {
    validity_interval: Option<Duration>,
    inner: Mutex<FailureLog>,
}

#[derive(Default)]
struct FailureLog {
    failures: VecDeque<Instant>,
    failures_by_host: HashMap<String, VecDeque<Instant>>,
}

impl FailureTracker {
    pub fn new(validity_interval: Option<Duration>) -> Self {
        Self {
            validity_interval,
            inner: Mutex::new(FailureLog::default()),
        }
    }

    /// Records an executor failure not attributable to any particular host.
    pub fn register_executor_failure(&self) {
        self.register_executor_failure_at(Instant::now());
    }

    /// Records an executor failure on the given host. Counts globally too.
    pub fn register_failure_on_host(&self, host: &str) {
        self.register_failure_on_host_at(host, Instant::now());
    }

    /// Number of unexpired executor failures.
    pub fn num_failed_executors(&self) -> usize {
        self.num_failed_executors_at(Instant::now())
    }

    /// Number of unexpired failures on the given host.
    pub fn num_failures_on_host(&self, host: &str) -> usize {
        self.num_failures_on_host_at(host, Instant::now())
    }

    /// Whether the failure count has reached the fatal threshold.
    pub fn exceeds_max_failures(&self, max_failures: usize) -> bool {
        self.num_failed_executors() >= max_failures
    }

    pub(crate) fn register_executor_failure_at(&self, now: Instant) {
        self.inner.lock().failures.push_back(now);
    }

    pub(crate) fn register_failure_on_host_at(&self, host: &str, now: Instant) {
        let mut log = self.inner.lock();
        log.failures.push_back(now);
        log.failures_by_host
            .entry(host.to_string())
            .or_default()
            .push_back(now);
    }

    pub(crate) fn num_failed_executors_at(&self, now: Instant) -> usize {
        let mut log = self.inner.lock();
        Self::prune(&mut log.failures, self.validity_interval, now);
        log.failures.len()
    }

    pub(crate) fn num_failures_on_host_at(&self, host: &str, now: Instant) -> usize {
        let mut log = self.inner.lock();
        match log.failures_by_host.get_mut(host) {
            Some(failures) => {
                Self::prune(failures, self.validity_interval, now);
                failures.len()
            }
            None => 0,
        }
    }

    fn prune(failures: &mut VecDeque<Instant>, validity_interval: Option<Duration>, now: Instant) {
        if let Some(interval) = validity_interval {
            while let Some(first) = failures.front() {
                if now.duration_since(*first) > interval {
                    failures.pop_front();
                } else {
                    break;
                }
            }
        }
    }
}
