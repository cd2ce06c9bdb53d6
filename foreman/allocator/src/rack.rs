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

//! Host-to-rack resolution seam.

/// Resolves a host name to its rack path.
///
/// Implementations wrap cluster topology scripts or plugins. Resolution may
/// block, and the known resolvers swallow thread interrupts, which is why
/// the allocator never calls this on the reconciliation task directly (see
/// the allocated-container handling in [`crate::allocator`]).
pub trait RackResolver: Send + Sync {
    /// The rack of the given host, or `None` when the topology does not
    /// know the host.
    fn resolve(&self, host: &str) -> Option<String>;
}

/// A resolver with no topology information.
#[derive(Debug, Default)]
pub struct NilRackResolver;

impl RackResolver for NilRackResolver {
    fn resolve(&self, _host: &str) -> Option<String> {
        None
    }
}
