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

//! Application driver contract.

use async_trait::async_trait;

use crate::error::Result;

/// Why an executor is gone, reported to the driver and to loss-reason
/// queries.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutorLossReason {
    pub exit_status: i32,
    /// Whether the exit reflects a fault attributable to the application,
    /// as opposed to Resource Manager or cluster action.
    pub exit_caused_by_app: bool,
    pub message: String,
}

/// The allocator's view of the application driver.
#[async_trait]
pub trait DriverEndpoint: Send + Sync {
    /// Returns the last executor id allocated by any previous incarnation of
    /// the application master. Called once at allocator construction so that
    /// executor ids keep increasing across restarts.
    async fn retrieve_last_allocated_executor_id(&self) -> Result<u64>;

    /// Notifies the driver that an executor is gone. Fire-and-forget; the
    /// allocator logs and otherwise ignores delivery failures.
    async fn remove_executor(&self, executor_id: &str, reason: ExecutorLossReason)
        -> Result<()>;
}
