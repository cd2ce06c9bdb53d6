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

//! Executor resource model

use std::fmt::{Display, Formatter};

use crate::config::AllocatorConfig;

/// Minimum off-heap memory overhead granted to every executor, in MB.
pub const MIN_MEMORY_OVERHEAD_MB: u32 = 384;

/// A Resource Manager resource capability: memory plus virtual cores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Resource {
    pub memory_mb: u32,
    pub vcores: u32,
}

impl Resource {
    pub fn new(memory_mb: u32, vcores: u32) -> Self {
        Self { memory_mb, vcores }
    }
}

impl Display for Resource {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "<memory: {} MB, vcores: {}>", self.memory_mb, self.vcores)
    }
}

/// The per-executor resource capability, computed once at allocator
/// construction and used verbatim by every outgoing container request.
#[derive(Debug, Clone, Copy)]
pub struct ExecutorResources {
    /// Heap memory per executor in MB.
    pub executor_memory_mb: u32,
    /// Off-heap overhead in MB.
    pub overhead_mb: u32,
    /// Extra memory for the interpreter worker in MB, zero for
    /// non-interpreter applications.
    pub extra_memory_mb: u32,
    /// Cores per executor.
    pub cores: u32,
}

impl ExecutorResources {
    pub fn from_config(config: &AllocatorConfig) -> Self {
        let overhead_mb = config.executor_memory_overhead_mb.unwrap_or_else(|| {
            let computed =
                (config.executor_memory_mb as f64 * config.memory_overhead_factor).ceil() as u32;
            computed.max(MIN_MEMORY_OVERHEAD_MB)
        });
        Self {
            executor_memory_mb: config.executor_memory_mb,
            overhead_mb,
            extra_memory_mb: config.interpreter_worker_memory_mb.unwrap_or(0),
            cores: config.executor_cores,
        }
    }

    /// Total container memory: heap plus overhead plus the interpreter
    /// worker extra.
    pub fn total_memory_mb(&self) -> u32 {
        self.executor_memory_mb + self.overhead_mb + self.extra_memory_mb
    }

    /// The resource requested from the Resource Manager for each container.
    pub fn container_resource(&self) -> Resource {
        Resource::new(self.total_memory_mb(), self.cores)
    }
}
