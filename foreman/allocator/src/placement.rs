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

//! Locality-aware container placement.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use itertools::Itertools;

use foreman_core::resource::ExecutorResources;
use foreman_core::rm::{ContainerId, ContainerRequest};

use crate::rack::RackResolver;

/// A locality preference for one container request. `nodes == None` means
/// the container may land on any host.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerLocalityPreference {
    pub nodes: Option<Vec<String>>,
    pub racks: Option<Vec<String>>,
}

impl ContainerLocalityPreference {
    pub fn any_host() -> Self {
        Self {
            nodes: None,
            racks: None,
        }
    }
}

/// Decides where the next batch of containers should be requested.
pub trait ContainerPlacementStrategy: Send + Sync {
    /// Returns at most `num_containers` locality preferences for the next
    /// batch of container requests.
    ///
    /// `locality_matched_pending` holds the outstanding requests whose
    /// hinted hosts are still preferred, so the strategy does not place
    /// containers a pending request already covers.
    fn locality_of_requested_containers(
        &self,
        num_containers: usize,
        num_locality_aware_tasks: usize,
        host_to_local_task_count: &HashMap<String, usize>,
        allocated_host_to_containers: &HashMap<String, HashSet<ContainerId>>,
        locality_matched_pending: &[ContainerRequest],
    ) -> Vec<ContainerLocalityPreference>;
}

/// The default strategy: bias container requests toward the hosts with the
/// highest pending-task density, discounting hosts that already run enough
/// containers or have enough locality-matched requests outstanding.
pub struct LocalityPreferredPlacementStrategy {
    resources: ExecutorResources,
    task_cpus: u32,
    rack_resolver: Arc<dyn RackResolver>,
}

impl LocalityPreferredPlacementStrategy {
    pub fn new(
        resources: ExecutorResources,
        task_cpus: u32,
        rack_resolver: Arc<dyn RackResolver>,
    ) -> Self {
        Self {
            resources,
            task_cpus,
            rack_resolver,
        }
    }

    /// How many executors the given number of pending tasks can occupy.
    fn num_executors_for_tasks(&self, num_tasks: usize) -> usize {
        let cores = self.resources.cores as usize;
        (num_tasks * self.task_cpus as usize).div_ceil(cores)
    }

    /// Spreads each outstanding locality-matched request evenly over the
    /// hosts it names, so a request for `{h1, h2}` counts half a container
    /// toward each.
    fn pending_host_to_container_count(
        locality_matched_pending: &[ContainerRequest],
    ) -> HashMap<String, f64> {
        let mut counts: HashMap<String, f64> = HashMap::new();
        for request in locality_matched_pending {
            if let Some(nodes) = &request.nodes {
                if nodes.is_empty() {
                    continue;
                }
                let weight = 1.0 / nodes.len() as f64;
                for node in nodes {
                    *counts.entry(node.clone()).or_default() += weight;
                }
            }
        }
        counts
    }

    /// The number of containers each host still needs, after discounting
    /// containers already allocated there and requests already outstanding.
    fn expected_host_to_container_count(
        &self,
        num_locality_aware_tasks: usize,
        host_to_local_task_count: &HashMap<String, usize>,
        allocated_host_to_containers: &HashMap<String, HashSet<ContainerId>>,
        locality_matched_pending: &[ContainerRequest],
    ) -> HashMap<String, usize> {
        let total_local_tasks: usize = host_to_local_task_count.values().sum();
        if total_local_tasks == 0 {
            return HashMap::new();
        }
        let pending_counts = Self::pending_host_to_container_count(locality_matched_pending);
        let num_pending_executors = self.num_executors_for_tasks(num_locality_aware_tasks) as f64;

        host_to_local_task_count
            .iter()
            .map(|(host, count)| {
                let expected = *count as f64 * num_pending_executors / total_local_tasks as f64;
                let existing = allocated_host_to_containers
                    .get(host)
                    .map(|containers| containers.len())
                    .unwrap_or(0) as f64
                    + pending_counts.get(host).copied().unwrap_or(0.0);
                let required = (expected - existing).ceil().max(0.0) as usize;
                (host.clone(), required)
            })
            .collect()
    }
}

impl ContainerPlacementStrategy for LocalityPreferredPlacementStrategy {
    fn locality_of_requested_containers(
        &self,
        num_containers: usize,
        num_locality_aware_tasks: usize,
        host_to_local_task_count: &HashMap<String, usize>,
        allocated_host_to_containers: &HashMap<String, HashSet<ContainerId>>,
        locality_matched_pending: &[ContainerRequest],
    ) -> Vec<ContainerLocalityPreference> {
        let expected = self.expected_host_to_container_count(
            num_locality_aware_tasks,
            host_to_local_task_count,
            allocated_host_to_containers,
            locality_matched_pending,
        );
        let num_locality_aware: usize = expected.values().sum();

        // Containers beyond what the locality hints can occupy are requested
        // without any preference.
        let num_any_host = num_containers.saturating_sub(num_locality_aware);
        let num_localized = num_containers - num_any_host;

        let mut preferences = Vec::with_capacity(num_containers);
        for _ in 0..num_any_host {
            preferences.push(ContainerLocalityPreference::any_host());
        }
        if num_localized == 0 {
            return preferences;
        }

        // Scale each host's requirement to the number of localized requests
        // we are about to emit, then emit one preference per request,
        // dropping a host once its scaled requirement is used up.
        let largest = *expected.values().max().unwrap_or(&0) as f64;
        let mut remaining: HashMap<&str, i64> = expected
            .iter()
            .map(|(host, count)| {
                let scaled = (*count as f64 * num_localized as f64 / largest).ceil() as i64;
                (host.as_str(), scaled)
            })
            .collect();

        for _ in 0..num_localized {
            let nodes: Vec<String> = remaining
                .iter()
                .filter(|(_, count)| **count > 0)
                .map(|(host, _)| host.to_string())
                .sorted()
                .collect();
            let racks: Vec<String> = nodes
                .iter()
                .filter_map(|host| self.rack_resolver.resolve(host))
                .unique()
                .collect();
            preferences.push(ContainerLocalityPreference {
                nodes: Some(nodes),
                racks: if racks.is_empty() { None } else { Some(racks) },
            });
            for count in remaining.values_mut() {
                *count -= 1;
            }
        }
        preferences
    }
}
