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

//! Common utilities for testing the allocator.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use foreman_core::driver::{DriverEndpoint, ExecutorLossReason};
use foreman_core::error::{ForemanError, Result};
use foreman_core::resource::Resource;
use foreman_core::rm::{
    AllocateResponse, Container, ContainerId, ContainerRequest, ContainerStatus,
    ResourceManagerClient, ANY_HOST, REQUEST_PRIORITY,
};

use crate::launcher::{ExecutorLaunchContext, ExecutorLauncher};
use crate::rack::RackResolver;

/// An in-memory Resource Manager client with the same request-table
/// semantics as the real library: a request with node locality is indexed
/// under each node, each of their racks, and `*`; an unlocalized request
/// under `*` only. Grants and completions are scripted by the test and
/// handed out at the next `allocate` call.
pub struct MockResourceManagerClient {
    inner: Mutex<MockRmState>,
}

#[derive(Default)]
struct MockRmState {
    requests: Vec<ContainerRequest>,
    next_allocated: Vec<Container>,
    next_completed: Vec<ContainerStatus>,
    num_cluster_nodes: usize,
    released: Vec<ContainerId>,
    blacklist_updates: Vec<(Vec<String>, Vec<String>)>,
    rack_by_host: HashMap<String, String>,
    allocate_error: Option<String>,
}

impl Default for MockResourceManagerClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockResourceManagerClient {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MockRmState {
                num_cluster_nodes: 8,
                ..Default::default()
            }),
        }
    }

    pub fn with_racks<I, S>(racks: I) -> Self
    where
        I: IntoIterator<Item = (S, S)>,
        S: Into<String>,
    {
        let client = Self::new();
        client.inner.lock().rack_by_host = racks
            .into_iter()
            .map(|(host, rack)| (host.into(), rack.into()))
            .collect();
        client
    }

    /// Queues containers to be granted at the next `allocate` call.
    pub fn grant(&self, containers: Vec<Container>) {
        self.inner.lock().next_allocated.extend(containers);
    }

    /// Queues completion reports for the next `allocate` call.
    pub fn complete(&self, statuses: Vec<ContainerStatus>) {
        self.inner.lock().next_completed.extend(statuses);
    }

    pub fn set_num_cluster_nodes(&self, num_cluster_nodes: usize) {
        self.inner.lock().num_cluster_nodes = num_cluster_nodes;
    }

    /// Fails the next `allocate` call with a transient error.
    pub fn fail_next_allocate(&self, message: impl Into<String>) {
        self.inner.lock().allocate_error = Some(message.into());
    }

    pub fn num_pending_requests(&self) -> usize {
        self.inner.lock().requests.len()
    }

    pub fn pending_requests(&self) -> Vec<ContainerRequest> {
        self.inner.lock().requests.clone()
    }

    pub fn released(&self) -> Vec<ContainerId> {
        self.inner.lock().released.clone()
    }

    pub fn blacklist_updates(&self) -> Vec<(Vec<String>, Vec<String>)> {
        self.inner.lock().blacklist_updates.clone()
    }

    fn request_locations(state: &MockRmState, request: &ContainerRequest) -> HashSet<String> {
        let mut locations = HashSet::from([ANY_HOST.to_string()]);
        if let Some(nodes) = &request.nodes {
            for node in nodes {
                locations.insert(node.clone());
                if let Some(rack) = state.rack_by_host.get(node) {
                    locations.insert(rack.clone());
                }
            }
        }
        if let Some(racks) = &request.racks {
            locations.extend(racks.iter().cloned());
        }
        locations
    }
}

#[async_trait]
impl ResourceManagerClient for MockResourceManagerClient {
    fn add_container_request(&self, request: ContainerRequest) {
        self.inner.lock().requests.push(request);
    }

    fn remove_container_request(&self, request: &ContainerRequest) {
        let mut state = self.inner.lock();
        if let Some(position) = state.requests.iter().position(|r| r == request) {
            state.requests.remove(position);
        }
    }

    fn get_matching_requests(
        &self,
        priority: i32,
        location: &str,
        capability: Resource,
    ) -> Vec<Vec<ContainerRequest>> {
        let state = self.inner.lock();
        let mut groups: BTreeMap<Resource, Vec<ContainerRequest>> = BTreeMap::new();
        for request in &state.requests {
            if request.priority == priority
                && request.resource.memory_mb <= capability.memory_mb
                && request.resource.vcores <= capability.vcores
                && Self::request_locations(&state, request).contains(location)
            {
                groups.entry(request.resource).or_default().push(request.clone());
            }
        }
        groups.into_values().collect()
    }

    async fn allocate(&self, _progress: f32) -> Result<AllocateResponse> {
        let mut state = self.inner.lock();
        if let Some(message) = state.allocate_error.take() {
            return Err(ForemanError::ResourceManager(message));
        }
        Ok(AllocateResponse {
            allocated: std::mem::take(&mut state.next_allocated),
            completed: std::mem::take(&mut state.next_completed),
            available_resources: None,
            num_cluster_nodes: state.num_cluster_nodes,
        })
    }

    fn release_assigned_container(&self, container_id: &ContainerId) {
        let mut state = self.inner.lock();
        if !state.released.contains(container_id) {
            state.released.push(container_id.clone());
        }
    }

    fn update_blacklist(&self, additions: Vec<String>, removals: Vec<String>) {
        self.inner.lock().blacklist_updates.push((additions, removals));
    }
}

/// A driver endpoint that hands out a configurable initial executor id and
/// records every executor removal it is told about.
pub struct MockDriver {
    last_allocated_executor_id: u64,
    removed: Mutex<Vec<(String, ExecutorLossReason)>>,
}

impl MockDriver {
    pub fn new(last_allocated_executor_id: u64) -> Self {
        Self {
            last_allocated_executor_id,
            removed: Mutex::new(vec![]),
        }
    }

    pub fn removed_executors(&self) -> Vec<(String, ExecutorLossReason)> {
        self.removed.lock().clone()
    }
}

#[async_trait]
impl DriverEndpoint for MockDriver {
    async fn retrieve_last_allocated_executor_id(&self) -> Result<u64> {
        Ok(self.last_allocated_executor_id)
    }

    async fn remove_executor(
        &self,
        executor_id: &str,
        reason: ExecutorLossReason,
    ) -> Result<()> {
        self.removed.lock().push((executor_id.to_string(), reason));
        Ok(())
    }
}

/// An executor launcher that records launches and can be told to fail or
/// hang.
pub struct MockExecutorLauncher {
    launched: Mutex<Vec<ExecutorLaunchContext>>,
    fail_next: AtomicUsize,
    hang: AtomicBool,
}

impl Default for MockExecutorLauncher {
    fn default() -> Self {
        Self::new()
    }
}

impl MockExecutorLauncher {
    pub fn new() -> Self {
        Self {
            launched: Mutex::new(vec![]),
            fail_next: AtomicUsize::new(0),
            hang: AtomicBool::new(false),
        }
    }

    /// Makes the next `count` launches fail with a non-fatal error.
    pub fn fail_next(&self, count: usize) {
        self.fail_next.store(count, Ordering::SeqCst);
    }

    /// Makes every subsequent launch block until aborted.
    pub fn hang(&self) {
        self.hang.store(true, Ordering::SeqCst);
    }

    pub fn launched(&self) -> Vec<ExecutorLaunchContext> {
        self.launched.lock().clone()
    }

    pub fn num_launched(&self) -> usize {
        self.launched.lock().len()
    }
}

#[async_trait]
impl ExecutorLauncher for MockExecutorLauncher {
    async fn launch(&self, ctx: ExecutorLaunchContext) -> Result<()> {
        if self.hang.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        let remaining = self.fail_next.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_next.store(remaining - 1, Ordering::SeqCst);
            return Err(ForemanError::General(format!(
                "injected launch failure for executor {}",
                ctx.executor_id
            )));
        }
        self.launched.lock().push(ctx);
        Ok(())
    }
}

/// A rack resolver backed by a fixed host-to-rack table.
#[derive(Debug, Default)]
pub struct StaticRackResolver {
    racks: HashMap<String, String>,
}

impl StaticRackResolver {
    pub fn with_racks<I, S>(racks: I) -> Self
    where
        I: IntoIterator<Item = (S, S)>,
        S: Into<String>,
    {
        Self {
            racks: racks
                .into_iter()
                .map(|(host, rack)| (host.into(), rack.into()))
                .collect(),
        }
    }
}

impl RackResolver for StaticRackResolver {
    fn resolve(&self, host: &str) -> Option<String> {
        self.racks.get(host).cloned()
    }
}

pub fn test_container(id: &str, host: &str, resource: Resource) -> Container {
    Container {
        id: ContainerId::new(id),
        host: host.to_string(),
        resource,
    }
}

pub fn completed_status(id: &str, exit_status: i32, diagnostics: &str) -> ContainerStatus {
    ContainerStatus {
        container_id: ContainerId::new(id),
        exit_status,
        diagnostics: diagnostics.to_string(),
    }
}

pub fn test_container_request(nodes: Option<Vec<String>>) -> ContainerRequest {
    ContainerRequest {
        resource: Resource::new(1408, 1),
        nodes,
        racks: None,
        priority: REQUEST_PRIORITY,
        relax_locality: true,
        node_label: None,
    }
}
