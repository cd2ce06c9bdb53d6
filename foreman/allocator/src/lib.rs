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

//! Foreman executor allocator.
//!
//! The allocator runs inside the application master and maintains a desired
//! executor count against the cluster Resource Manager: it generates
//! locality-aware container requests, launches executor processes inside
//! granted containers, and reconciles container completions back to the
//! application driver.

pub mod allocator;
pub mod blacklist_tracker;
pub mod failure_tracker;
pub mod launcher;
pub mod placement;
pub mod rack;
pub mod request_store;
#[cfg(test)]
pub mod test_utils;

pub use allocator::Allocator;
