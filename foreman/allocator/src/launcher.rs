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

//! Executor launch dispatch.
//!
//! Worker startup can take a while, so launch jobs run off the allocator
//! lock on a bounded pool. Shutdown is signalled with a broadcast channel
//! (based on the mini-redis example from Tokio): in-flight jobs observe the
//! signal, fail fast, and clean up through the regular launch-failure path.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{broadcast, Semaphore};
use tokio::task::JoinSet;

use foreman_core::error::Result;
use foreman_core::rm::Container;

/// Everything an executor launcher needs to start a worker process inside a
/// granted container.
#[derive(Debug, Clone)]
pub struct ExecutorLaunchContext {
    pub container: Container,
    pub executor_id: String,
    pub driver_url: String,
    pub host: String,
    pub memory_mb: u32,
    pub cores: u32,
    pub app_id: String,
}

/// Starts a worker process inside a container. Returning `Ok` means the
/// worker started; any `Err` is a non-fatal launch failure the allocator
/// cleans up after.
#[async_trait]
pub trait ExecutorLauncher: Send + Sync {
    async fn launch(&self, ctx: ExecutorLaunchContext) -> Result<()>;
}

/// Listens for the launcher pool shutdown signal.
///
/// Only a single value is ever sent; once received, the handle keeps
/// reporting shutdown. A handle subscribed after the pool already shut down
/// observes the signal immediately.
pub struct Shutdown {
    shutdown: bool,
    notify: broadcast::Receiver<()>,
}

impl Shutdown {
    fn new(shutdown: bool, notify: broadcast::Receiver<()>) -> Shutdown {
        Shutdown { shutdown, notify }
    }

    /// Receive the shutdown notice, waiting if necessary.
    pub async fn recv(&mut self) {
        if self.shutdown {
            return;
        }
        // Cannot receive a "lag error" as only one value is ever sent.
        let _ = self.notify.recv().await;
        self.shutdown = true;
    }
}

/// A bounded pool of launch jobs.
pub struct ContainerLauncher {
    permits: Arc<Semaphore>,
    notify_shutdown: broadcast::Sender<()>,
    is_shutdown: AtomicBool,
    jobs: Mutex<JoinSet<()>>,
}

impl ContainerLauncher {
    pub fn new(max_concurrent: usize) -> Self {
        let (notify_shutdown, _) = broadcast::channel(1);
        Self {
            permits: Arc::new(Semaphore::new(max_concurrent)),
            notify_shutdown,
            is_shutdown: AtomicBool::new(false),
            jobs: Mutex::new(JoinSet::new()),
        }
    }

    /// A [`Shutdown`] handle for a launch job to select against.
    pub fn subscribe_for_shutdown(&self) -> Shutdown {
        Shutdown::new(
            self.is_shutdown.load(Ordering::SeqCst),
            self.notify_shutdown.subscribe(),
        )
    }

    /// Dispatches a launch job. The job waits for a pool slot before doing
    /// any work; once the pool shuts down the slot wait ends immediately and
    /// the job runs with its shutdown handle already signalled, so it can
    /// fail fast.
    pub fn spawn<F>(&self, job: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let permits = Arc::clone(&self.permits);
        let mut jobs = self.jobs.lock();
        // reap jobs that already finished
        while jobs.try_join_next().is_some() {}
        jobs.spawn(async move {
            // A closed semaphore means the pool shut down while this job was
            // queued; run it anyway so it observes the signal and cleans up.
            let _permit = permits.acquire().await.ok();
            job.await;
        });
    }

    /// Force-shutdown: wakes queued jobs and signals every in-flight job to
    /// fail fast.
    pub fn shutdown(&self) {
        self.is_shutdown.store(true, Ordering::SeqCst);
        self.permits.close();
        let _ = self.notify_shutdown.send(());
    }
}
