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

//! Resource Manager data model and the consumed client contract.

use std::fmt::{Display, Formatter};

use async_trait::async_trait;

use crate::error::Result;
use crate::resource::Resource;

/// Sentinel location meaning "any host".
pub const ANY_HOST: &str = "*";

/// Fixed priority used for every container request.
pub const REQUEST_PRIORITY: i32 = 1;

/// Progress indicator reported with every allocate heartbeat.
pub const ALLOCATE_PROGRESS: f32 = 0.1;

/// Container exit status sentinels reported by the Resource Manager.
pub mod exit_status {
    pub const SUCCESS: i32 = 0;
    pub const ABORTED: i32 = -100;
    pub const DISKS_FAILED: i32 = -101;
    pub const PREEMPTED: i32 = -102;
    pub const KILLED_EXCEEDED_VMEM: i32 = -103;
    pub const KILLED_EXCEEDED_PMEM: i32 = -104;
    pub const KILLED_BY_APP_MASTER: i32 = -105;
    pub const KILLED_BY_RESOURCE_MANAGER: i32 = -106;
    pub const KILLED_AFTER_APP_COMPLETION: i32 = -107;
}

/// Opaque container identifier assigned by the Resource Manager.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContainerId(String);

impl ContainerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ContainerId {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A container granted by the Resource Manager: a slot on a node with a
/// memory and core capability.
#[derive(Debug, Clone)]
pub struct Container {
    pub id: ContainerId,
    pub host: String,
    pub resource: Resource,
}

/// Completion report for a container that has finished running.
#[derive(Debug, Clone)]
pub struct ContainerStatus {
    pub container_id: ContainerId,
    pub exit_status: i32,
    pub diagnostics: String,
}

/// An outstanding container request.
///
/// `nodes == None` means the request has no locality preference. Requests
/// are compared structurally; the client removes the first equal entry.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerRequest {
    pub resource: Resource,
    pub nodes: Option<Vec<String>>,
    pub racks: Option<Vec<String>>,
    pub priority: i32,
    pub relax_locality: bool,
    pub node_label: Option<String>,
}

/// Response to an allocate heartbeat.
#[derive(Debug, Clone, Default)]
pub struct AllocateResponse {
    pub allocated: Vec<Container>,
    pub completed: Vec<ContainerStatus>,
    pub available_resources: Option<Resource>,
    pub num_cluster_nodes: usize,
}

/// The `AMRMClient`-style Resource Manager client library the allocator
/// drives. The request table lives inside the client: a request with node
/// locality is indexed under each of its nodes, each of their racks, and
/// the [`ANY_HOST`] sentinel; an unlocalized request is indexed under
/// [`ANY_HOST`] (and its racks, when given) only. Querying at [`ANY_HOST`]
/// therefore returns every pending request.
#[async_trait]
pub trait ResourceManagerClient: Send + Sync {
    /// Registers a container request with the Resource Manager.
    fn add_container_request(&self, request: ContainerRequest);

    /// Removes a pending container request. Idempotent.
    fn remove_container_request(&self, request: &ContainerRequest);

    /// Returns pending requests matching the given priority, location, and
    /// capability, grouped by capability. Callers consume at most the first
    /// element of the first group per match.
    fn get_matching_requests(
        &self,
        priority: i32,
        location: &str,
        capability: Resource,
    ) -> Vec<Vec<ContainerRequest>>;

    /// Heartbeats the Resource Manager: ships request/release deltas and
    /// receives newly allocated and completed containers.
    async fn allocate(&self, progress: f32) -> Result<AllocateResponse>;

    /// Releases a granted container back to the Resource Manager. Idempotent.
    fn release_assigned_container(&self, container_id: &ContainerId);

    /// Updates the set of nodes the Resource Manager must not allocate on.
    fn update_blacklist(&self, additions: Vec<String>, removals: Vec<String>);
}
