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

//! Foreman error types

use std::{
    error::Error,
    fmt::{Display, Formatter},
    result,
};

/// Result type alias for Foreman operations.
pub type Result<T> = result::Result<T, ForemanError>;

/// Foreman error types for executor allocation.
#[derive(Debug)]
pub enum ForemanError {
    /// General error with a descriptive message.
    General(String),
    /// Internal error indicating a bug or unexpected state.
    Internal(String),
    /// Configuration error with invalid settings.
    Configuration(String),
    /// Transient error surfaced by the Resource Manager; the caller is
    /// expected to retry at the next heartbeat.
    ResourceManager(String),
    /// The executor is not and has never been known to the allocator.
    UnknownExecutor(String),
    /// Tokio task join error.
    TokioError(tokio::task::JoinError),
    /// Operation was cancelled.
    Cancelled,
}

impl From<String> for ForemanError {
    fn from(e: String) -> Self {
        ForemanError::General(e)
    }
}

impl From<tokio::task::JoinError> for ForemanError {
    fn from(e: tokio::task::JoinError) -> Self {
        ForemanError::TokioError(e)
    }
}

impl Display for ForemanError {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            ForemanError::General(desc) => write!(f, "General error: {desc}"),
            ForemanError::Internal(desc) => {
                write!(f, "Internal Foreman error: {desc}")
            }
            ForemanError::Configuration(desc) => {
                write!(f, "Configuration error: {desc}")
            }
            ForemanError::ResourceManager(desc) => {
                write!(f, "Resource Manager error: {desc}")
            }
            ForemanError::UnknownExecutor(executor_id) => {
                write!(f, "Unknown executor: {executor_id}")
            }
            ForemanError::TokioError(desc) => write!(f, "Tokio join error: {desc}"),
            ForemanError::Cancelled => write!(f, "Operation cancelled"),
        }
    }
}

impl Error for ForemanError {}
