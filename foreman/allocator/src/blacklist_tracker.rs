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

//! Node blacklist maintenance.
//!
//! Two blacklists feed the Resource Manager: the scheduler-supplied one,
//! replaced wholesale on every update from the driver, and the
//! allocator-derived one, built from container allocation failures. The
//! union is synchronized to the Resource Manager as a diff against the set
//! last sent.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use itertools::Itertools;
use log::info;
use parking_lot::Mutex;

use foreman_core::config::AllocatorConfig;
use foreman_core::rm::ResourceManagerClient;

use crate::failure_tracker::FailureTracker;

pub struct BlacklistTracker {
    client: Arc<dyn ResourceManagerClient>,
    failure_tracker: Arc<FailureTracker>,
    launch_blacklist_enabled: bool,
    max_failures_per_host: usize,
    blacklist_timeout: Duration,
    inner: Mutex<BlacklistState>,
}

struct BlacklistState {
    scheduler_blacklist: HashSet<String>,
    /// Allocator-blacklisted hosts with their expiry deadline.
    allocator_blacklist: HashMap<String, Instant>,
    /// The node set last synchronized to the Resource Manager.
    synced_nodes: HashSet<String>,
    num_cluster_nodes: usize,
}

impl BlacklistTracker {
    pub fn new(
        client: Arc<dyn ResourceManagerClient>,
        failure_tracker: Arc<FailureTracker>,
        config: &AllocatorConfig,
    ) -> Self {
        Self {
            client,
            failure_tracker,
            launch_blacklist_enabled: config.launch_blacklist_enabled,
            max_failures_per_host: config.max_failures_per_host,
            blacklist_timeout: config.blacklist_timeout,
            inner: Mutex::new(BlacklistState {
                scheduler_blacklist: HashSet::new(),
                allocator_blacklist: HashMap::new(),
                synced_nodes: HashSet::new(),
                // No cluster size is known until the first allocate response;
                // an unknown cluster is never considered fully blacklisted.
                num_cluster_nodes: usize::MAX,
            }),
        }
    }

    /// Replaces the scheduler-driven blacklist and synchronizes the union to
    /// the Resource Manager.
    pub fn set_scheduler_blacklisted_nodes(&self, nodes: HashSet<String>) {
        let mut state = self.inner.lock();
        state.scheduler_blacklist = nodes;
        self.refresh(&mut state);
    }

    /// Records a container allocation failure. With launch blacklisting
    /// enabled and a known host, the failure counts against that host and
    /// may blacklist it; otherwise it only feeds the global failure count.
    /// Failures on hosts that are already blacklisted are not tracked,
    /// since the application cannot lower their failure rate.
    pub fn handle_resource_allocation_failure(&self, host: Option<&str>) {
        match host {
            Some(host) if self.launch_blacklist_enabled => {
                let mut state = self.inner.lock();
                if state.scheduler_blacklist.contains(host)
                    || state.allocator_blacklist.contains_key(host)
                {
                    return;
                }
                self.failure_tracker.register_failure_on_host(host);
                if self.failure_tracker.num_failures_on_host(host) > self.max_failures_per_host {
                    info!("blacklisting host {host} after repeated allocation failures");
                    state
                        .allocator_blacklist
                        .insert(host.to_string(), Instant::now() + self.blacklist_timeout);
                    self.refresh(&mut state);
                }
            }
            _ => self.failure_tracker.register_executor_failure(),
        }
    }

    /// Records the cluster size reported by the latest allocate response.
    pub fn set_num_cluster_nodes(&self, num_cluster_nodes: usize) {
        self.inner.lock().num_cluster_nodes = num_cluster_nodes;
    }

    /// Whether every node the cluster reports is currently blacklisted.
    pub fn is_all_node_blacklisted(&self) -> bool {
        let state = self.inner.lock();
        let now = Instant::now();
        let unexpired = state
            .allocator_blacklist
            .iter()
            .filter(|(host, deadline)| {
                **deadline > now && !state.scheduler_blacklist.contains(*host)
            })
            .count();
        state.scheduler_blacklist.len() + unexpired >= state.num_cluster_nodes
    }

    fn refresh(&self, state: &mut BlacklistState) {
        let now = Instant::now();
        state.allocator_blacklist.retain(|_, deadline| *deadline > now);

        let current: HashSet<String> = state
            .scheduler_blacklist
            .iter()
            .chain(state.allocator_blacklist.keys())
            .cloned()
            .collect();
        let additions: Vec<String> = current.difference(&state.synced_nodes).cloned().sorted().collect();
        let removals: Vec<String> = state.synced_nodes.difference(&current).cloned().sorted().collect();
        if !additions.is_empty() || !removals.is_empty() {
            info!(
                "updating the Resource Manager blacklist: adding {additions:?}, removing {removals:?}"
            );
            self.client.update_blacklist(additions, removals);
            state.synced_nodes = current;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockResourceManagerClient;

    fn tracker(
        config: AllocatorConfig,
    ) -> (Arc<MockResourceManagerClient>, BlacklistTracker) {
        let client = Arc::new(MockResourceManagerClient::new());
        let failure_tracker = Arc::new(FailureTracker::new(None));
        let tracker = BlacklistTracker::new(client.clone(), failure_tracker, &config);
        (client, tracker)
    }

    #[test]
    fn test_scheduler_blacklist_is_synced_as_a_diff() {
        let (client, tracker) = tracker(AllocatorConfig::default());

        tracker.set_scheduler_blacklisted_nodes(HashSet::from(["h1".to_string(), "h2".to_string()]));
        tracker.set_scheduler_blacklisted_nodes(HashSet::from(["h2".to_string()]));

        assert_eq!(
            client.blacklist_updates(),
            vec![
                (vec!["h1".to_string(), "h2".to_string()], vec![]),
                (vec![], vec!["h1".to_string()]),
            ]
        );
    }

    #[test]
    fn test_repeated_allocation_failures_blacklist_the_host() {
        let config = AllocatorConfig::default()
            .with_launch_blacklist_enabled(true)
            .with_max_failures_per_host(1);
        let (client, tracker) = tracker(config);

        tracker.handle_resource_allocation_failure(Some("badnode"));
        assert!(client.blacklist_updates().is_empty());
        tracker.handle_resource_allocation_failure(Some("badnode"));
        assert_eq!(
            client.blacklist_updates(),
            vec![(vec!["badnode".to_string()], vec![])]
        );

        // further failures on the blacklisted host are not tracked
        tracker.handle_resource_allocation_failure(Some("badnode"));
        assert_eq!(client.blacklist_updates().len(), 1);
    }

    #[test]
    fn test_hostless_failures_only_count_globally() {
        let config = AllocatorConfig::default()
            .with_launch_blacklist_enabled(true)
            .with_max_failures_per_host(0);
        let client = Arc::new(MockResourceManagerClient::new());
        let failure_tracker = Arc::new(FailureTracker::new(None));
        let tracker =
            BlacklistTracker::new(client.clone(), failure_tracker.clone(), &config);

        tracker.handle_resource_allocation_failure(None);
        assert_eq!(failure_tracker.num_failed_executors(), 1);
        assert!(client.blacklist_updates().is_empty());
    }

    #[test]
    fn test_all_node_blacklisted_requires_a_known_cluster_size() {
        let (_, tracker) = tracker(AllocatorConfig::default());
        tracker.set_scheduler_blacklisted_nodes(HashSet::from(["h1".to_string()]));
        assert!(!tracker.is_all_node_blacklisted());

        tracker.set_num_cluster_nodes(1);
        assert!(tracker.is_all_node_blacklisted());

        tracker.set_num_cluster_nodes(2);
        assert!(!tracker.is_all_node_blacklisted());
    }
}
