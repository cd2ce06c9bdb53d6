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

//! Thin facade over the Resource Manager client.

use std::sync::Arc;

use log::debug;

use foreman_core::error::Result;
use foreman_core::resource::{ExecutorResources, Resource};
use foreman_core::rm::{
    AllocateResponse, ContainerId, ContainerRequest, ResourceManagerClient, ANY_HOST,
    REQUEST_PRIORITY,
};

/// Builds, submits, and cancels container requests on behalf of the
/// allocator. Every request carries the fixed executor resource spec, the
/// fixed priority, and the configured node label.
pub struct RequestStore {
    client: Arc<dyn ResourceManagerClient>,
    resource: Resource,
    node_label: Option<String>,
}

impl RequestStore {
    pub fn new(
        client: Arc<dyn ResourceManagerClient>,
        resources: &ExecutorResources,
        node_label: Option<String>,
    ) -> Self {
        Self {
            client,
            resource: resources.container_resource(),
            node_label,
        }
    }

    /// The resource capability attached to every request.
    pub fn resource(&self) -> Resource {
        self.resource
    }

    /// Builds a container request for the given locality preference.
    pub fn container_request(
        &self,
        nodes: Option<Vec<String>>,
        racks: Option<Vec<String>>,
    ) -> ContainerRequest {
        ContainerRequest {
            resource: self.resource,
            nodes,
            racks,
            priority: REQUEST_PRIORITY,
            relax_locality: true,
            node_label: self.node_label.clone(),
        }
    }

    pub fn submit(&self, request: ContainerRequest) {
        match &request.nodes {
            Some(nodes) => debug!("submitted container request for hosts {nodes:?}"),
            None => debug!("submitted container request for any host"),
        }
        self.client.add_container_request(request);
    }

    pub fn cancel(&self, request: &ContainerRequest) {
        self.client.remove_container_request(request);
    }

    /// All pending requests, regardless of locality. Requests register under
    /// the any-host sentinel in the client's table, so one query suffices.
    pub fn pending_requests(&self) -> Vec<ContainerRequest> {
        self.client
            .get_matching_requests(REQUEST_PRIORITY, ANY_HOST, self.resource)
            .into_iter()
            .flatten()
            .collect()
    }

    /// The first request matching the given location and capability, if any.
    /// Only the first element of the first capability group is eligible.
    pub fn first_matching(&self, location: &str, capability: Resource) -> Option<ContainerRequest> {
        self.client
            .get_matching_requests(REQUEST_PRIORITY, location, capability)
            .first()
            .and_then(|group| group.first())
            .cloned()
    }

    /// Heartbeats the Resource Manager.
    pub async fn allocate(&self, progress: f32) -> Result<AllocateResponse> {
        self.client.allocate(progress).await
    }

    pub fn release(&self, container_id: &ContainerId) {
        debug!("released container {container_id}");
        self.client.release_assigned_container(container_id);
    }
}
