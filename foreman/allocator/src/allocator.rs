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

//! The executor allocator.
//!
//! [`Allocator`] reconciles a desired executor count against three-way
//! reality: executors running, launches in flight, and container requests
//! pending at the Resource Manager. The driver calls [`Allocator::allocate`]
//! periodically; each call updates the outstanding requests from the latest
//! locality hints, heartbeats the Resource Manager, launches executors in
//! newly granted containers, and reconciles completed containers back to
//! the driver.
//!
//! All bookkeeping state lives behind one coarse mutex. The operation rate
//! is low (heartbeat cadence) and correctness under Resource Manager
//! reordering dominates, so finer locking buys little. The only work that
//! runs off the lock is executor launching, which can take a while, and the
//! rack resolution for a granted batch, which may block inside the
//! resolver.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use lazy_static::lazy_static;
use log::{debug, error, info, warn};
use regex::Regex;
use tokio::sync::{oneshot, Mutex};

use foreman_core::config::AllocatorConfig;
use foreman_core::driver::{DriverEndpoint, ExecutorLossReason};
use foreman_core::error::{ForemanError, Result};
use foreman_core::resource::{ExecutorResources, Resource};
use foreman_core::rm::{
    exit_status, Container, ContainerId, ContainerRequest, ContainerStatus,
    ResourceManagerClient, ALLOCATE_PROGRESS, ANY_HOST,
};

use crate::blacklist_tracker::BlacklistTracker;
use crate::failure_tracker::FailureTracker;
use crate::launcher::{ContainerLauncher, ExecutorLaunchContext, ExecutorLauncher};
use crate::placement::{
    ContainerLocalityPreference, ContainerPlacementStrategy, LocalityPreferredPlacementStrategy,
};
use crate::rack::RackResolver;
use crate::request_store::RequestStore;

/// Reply handle for a driver loss-reason query.
pub type LossReasonSender = oneshot::Sender<Result<ExecutorLossReason>>;

lazy_static! {
    static ref PMEM_EXCEEDED_PATTERN: Regex =
        Regex::new(r"[0-9.]+ [KMG]B of [0-9.]+ [KMG]B physical memory used").unwrap();
    static ref VMEM_EXCEEDED_PATTERN: Regex =
        Regex::new(r"[0-9.]+ [KMG]B of [0-9.]+ [KMG]B virtual memory used").unwrap();
}

/// Bookkeeping owned exclusively by the allocator; every mutation happens
/// under the allocator lock.
#[derive(Default)]
struct AllocatorState {
    /// Desired steady-state executor count.
    target_num_executors: usize,
    /// Executors that have successfully launched.
    running_executors: HashSet<String>,
    executor_id_to_container: HashMap<String, Container>,
    container_id_to_executor_id: HashMap<ContainerId, String>,
    allocated_host_to_containers: HashMap<String, HashSet<ContainerId>>,
    allocated_container_to_host: HashMap<ContainerId, String>,
    /// Containers we released on purpose; their completion must not count
    /// as a failure.
    released_containers: HashSet<ContainerId>,
    /// Loss-reason queries that arrived before the exit reason was known.
    pending_loss_reason_requests: HashMap<String, Vec<LossReasonSender>>,
    /// Exit reasons learned before the driver asked.
    released_executor_loss_reasons: HashMap<String, ExecutorLossReason>,
    /// Most recent placement hints from the driver.
    host_to_local_task_count: HashMap<String, usize>,
    num_locality_aware_tasks: usize,
    executor_id_counter: u64,
}

/// Negotiates executor containers with the cluster Resource Manager on
/// behalf of the application driver.
pub struct Allocator {
    config: AllocatorConfig,
    resources: ExecutorResources,
    request_store: Arc<RequestStore>,
    driver: Arc<dyn DriverEndpoint>,
    launcher: Arc<dyn ExecutorLauncher>,
    rack_resolver: Arc<dyn RackResolver>,
    placement: Arc<dyn ContainerPlacementStrategy>,
    failure_tracker: Arc<FailureTracker>,
    blacklist_tracker: Arc<BlacklistTracker>,
    launcher_pool: ContainerLauncher,
    state: Arc<Mutex<AllocatorState>>,
    /// Launches dispatched to the pool but not yet settled. Read lock-free.
    num_executors_starting: Arc<AtomicUsize>,
    num_unexpected_container_release: AtomicU64,
}

impl Allocator {
    /// Creates the allocator. Validates the configuration and fetches the
    /// last allocated executor id from the driver, so executor ids keep
    /// increasing across application master restarts.
    pub async fn new(
        config: AllocatorConfig,
        client: Arc<dyn ResourceManagerClient>,
        driver: Arc<dyn DriverEndpoint>,
        launcher: Arc<dyn ExecutorLauncher>,
        rack_resolver: Arc<dyn RackResolver>,
    ) -> Result<Self> {
        config.validate()?;
        let resources = ExecutorResources::from_config(&config);
        let executor_id_counter = driver.retrieve_last_allocated_executor_id().await?;
        info!(
            "creating executor allocator with container resource {} and initial target {}",
            resources.container_resource(),
            config.initial_executors
        );

        let request_store = Arc::new(RequestStore::new(
            Arc::clone(&client),
            &resources,
            config.node_label_expression.clone(),
        ));
        let failure_tracker = Arc::new(FailureTracker::new(
            config.executor_failures_validity_interval,
        ));
        let blacklist_tracker = Arc::new(BlacklistTracker::new(
            Arc::clone(&client),
            Arc::clone(&failure_tracker),
            &config,
        ));
        let placement: Arc<dyn ContainerPlacementStrategy> =
            Arc::new(LocalityPreferredPlacementStrategy::new(
                resources,
                config.task_cpus,
                Arc::clone(&rack_resolver),
            ));
        let launcher_pool = ContainerLauncher::new(config.container_launcher_max_threads);
        let state = Arc::new(Mutex::new(AllocatorState {
            target_num_executors: config.initial_executors,
            executor_id_counter,
            ..Default::default()
        }));

        Ok(Self {
            config,
            resources,
            request_store,
            driver,
            launcher,
            rack_resolver,
            placement,
            failure_tracker,
            blacklist_tracker,
            launcher_pool,
            state,
            num_executors_starting: Arc::new(AtomicUsize::new(0)),
            num_unexpected_container_release: AtomicU64::new(0),
        })
    }

    /// Replaces the default placement strategy.
    pub fn with_placement_strategy(
        mut self,
        placement: Arc<dyn ContainerPlacementStrategy>,
    ) -> Self {
        self.placement = placement;
        self
    }

    /// Records the driver's desired total and the latest placement hints.
    /// Returns whether the target changed. Shrinking never kills running
    /// executors; it only cancels pending requests at the next
    /// reconciliation.
    pub async fn request_total_executors(
        &self,
        requested_total: usize,
        locality_aware_tasks: usize,
        host_to_local_task_count: HashMap<String, usize>,
        node_blacklist: HashSet<String>,
    ) -> bool {
        let mut state = self.state.lock().await;
        state.num_locality_aware_tasks = locality_aware_tasks;
        state.host_to_local_task_count = host_to_local_task_count;
        if requested_total != state.target_num_executors {
            info!(
                "driver requested a total number of {requested_total} executors (was {})",
                state.target_num_executors
            );
            state.target_num_executors = requested_total;
            self.blacklist_tracker
                .set_scheduler_blacklisted_nodes(node_blacklist);
            true
        } else {
            false
        }
    }

    /// Releases the container of a running executor at the driver's request.
    /// Idempotent; unknown executors are logged and ignored.
    pub async fn kill_executor(&self, executor_id: &str) {
        let mut state = self.state.lock().await;
        match state.executor_id_to_container.get(executor_id).cloned() {
            Some(container) => {
                if !state.released_containers.contains(&container.id) {
                    info!("driver requested to kill executor {executor_id}");
                    state.released_containers.insert(container.id.clone());
                    self.request_store.release(&container.id);
                    state.running_executors.remove(executor_id);
                } else {
                    debug!("executor {executor_id} has already been released");
                }
            }
            None => warn!("attempted to kill unknown executor {executor_id}"),
        }
    }

    /// One reconciliation step: update outstanding requests, heartbeat the
    /// Resource Manager, launch executors in granted containers, and
    /// process completed containers. Errors from the heartbeat itself are
    /// transient; the caller retries at the next cadence.
    pub async fn allocate(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        self.update_resource_requests(&mut state);

        let response = self.request_store.allocate(ALLOCATE_PROGRESS).await?;
        self.blacklist_tracker
            .set_num_cluster_nodes(response.num_cluster_nodes);

        if !response.allocated.is_empty() {
            debug!(
                "received {} allocated containers from the Resource Manager",
                response.allocated.len()
            );
            self.handle_allocated_containers(&mut state, response.allocated)
                .await?;
        }

        let removals = if !response.completed.is_empty() {
            debug!(
                "received {} completed containers from the Resource Manager",
                response.completed.len()
            );
            self.process_completed_containers(&mut state, response.completed)
        } else {
            vec![]
        };
        drop(state);

        // Completion bookkeeping is finished before any of these go out.
        for (executor_id, reason) in removals {
            let driver = Arc::clone(&self.driver);
            tokio::spawn(async move {
                if let Err(e) = driver.remove_executor(&executor_id, reason).await {
                    warn!(
                        "failed to notify the driver about the removal of executor {executor_id}: {e}"
                    );
                }
            });
        }
        Ok(())
    }

    /// Queues or answers a driver query for an executor's loss reason.
    pub async fn enqueue_get_loss_reason(&self, executor_id: &str, reply: LossReasonSender) {
        let mut state = self.state.lock().await;
        if state.executor_id_to_container.contains_key(executor_id) {
            // The exit reason is not known yet; reply when the completion
            // for this executor's container is processed.
            state
                .pending_loss_reason_requests
                .entry(executor_id.to_string())
                .or_default()
                .push(reply);
        } else if let Some(reason) = state.released_executor_loss_reasons.remove(executor_id) {
            let _ = reply.send(Ok(reason));
        } else {
            warn!("tried to get the loss reason for non-existent executor {executor_id}");
            let _ = reply.send(Err(ForemanError::UnknownExecutor(
                executor_id.to_string(),
            )));
        }
    }

    /// Force-shutdown of the launcher pool; in-flight launches fail fast
    /// and clean up through the launch-failure path.
    pub fn stop(&self) {
        self.launcher_pool.shutdown();
    }

    pub async fn num_executors_running(&self) -> usize {
        self.state.lock().await.running_executors.len()
    }

    pub fn num_executors_starting(&self) -> usize {
        self.num_executors_starting.load(Ordering::SeqCst)
    }

    pub fn num_executors_failed(&self) -> usize {
        self.failure_tracker.num_failed_executors()
    }

    /// Whether executor failures crossed the configured fatal threshold.
    pub fn exceeds_executor_failure_threshold(&self) -> bool {
        self.failure_tracker
            .exceeds_max_failures(self.config.effective_max_executor_failures())
    }

    pub fn num_containers_pending_allocate(&self) -> usize {
        self.request_store.pending_requests().len()
    }

    pub async fn num_released_containers(&self) -> usize {
        self.state.lock().await.released_containers.len()
    }

    pub fn num_unexpected_container_release(&self) -> u64 {
        self.num_unexpected_container_release.load(Ordering::SeqCst)
    }

    pub fn is_all_node_blacklisted(&self) -> bool {
        self.blacklist_tracker.is_all_node_blacklisted()
    }

    pub async fn target_num_executors(&self) -> usize {
        self.state.lock().await.target_num_executors
    }

    /// Brings the outstanding container requests in line with the target:
    /// cancels requests whose locality went stale, asks the placement
    /// strategy where new containers should go, and trades unlocalized
    /// requests for localized ones when the strategy wants more than the
    /// shortfall allows.
    fn update_resource_requests(&self, state: &mut AllocatorState) {
        let pending = self.request_store.pending_requests();
        let num_starting = self.num_executors_starting.load(Ordering::SeqCst);
        let num_running = state.running_executors.len();
        let missing = state.target_num_executors as i64
            - pending.len() as i64
            - num_starting as i64
            - num_running as i64;
        debug!(
            "updating resource requests: target {}, pending {}, starting {num_starting}, running {num_running}",
            state.target_num_executors,
            pending.len()
        );

        let mut locality_matched = Vec::new();
        let mut stale = Vec::new();
        let mut any_host = Vec::new();
        for request in pending {
            match &request.nodes {
                Some(nodes) => {
                    if nodes
                        .iter()
                        .any(|node| state.host_to_local_task_count.contains_key(node))
                    {
                        locality_matched.push(request);
                    } else {
                        stale.push(request);
                    }
                }
                None => any_host.push(request),
            }
        }

        if missing > 0 {
            info!(
                "requesting {missing} additional containers, each with resource {}",
                self.request_store.resource()
            );
            if !stale.is_empty() {
                info!(
                    "canceling {} container requests whose locality preference went stale",
                    stale.len()
                );
                for request in &stale {
                    self.request_store.cancel(request);
                }
            }

            let available = missing as usize + stale.len();
            let potential = available + any_host.len();
            let preferences = self.placement.locality_of_requested_containers(
                potential,
                state.num_locality_aware_tasks,
                &state.host_to_local_task_count,
                &state.allocated_host_to_containers,
                &locality_matched,
            );
            let mut new_requests: Vec<ContainerRequest> = preferences
                .into_iter()
                .filter_map(|preference| {
                    let ContainerLocalityPreference { nodes, racks } = preference;
                    nodes.map(|nodes| self.request_store.container_request(Some(nodes), racks))
                })
                .collect();

            if available >= new_requests.len() {
                for _ in 0..(available - new_requests.len()) {
                    new_requests.push(self.request_store.container_request(None, None));
                }
            } else {
                // More localized requests than the shortfall allows: cancel
                // unlocalized requests to make room for localized ones.
                let num_to_cancel = new_requests.len() - available;
                for request in any_host.iter().take(num_to_cancel) {
                    self.request_store.cancel(request);
                }
            }

            for request in new_requests {
                self.request_store.submit(request);
            }
        } else if missing < 0 {
            let num_pending = locality_matched.len() + stale.len() + any_host.len();
            let num_to_cancel = (-missing as usize).min(num_pending);
            if num_to_cancel > 0 {
                info!(
                    "canceling {num_to_cancel} pending container requests to respect the target of {}",
                    state.target_num_executors
                );
                // least valuable first
                for request in stale
                    .iter()
                    .chain(any_host.iter())
                    .chain(locality_matched.iter())
                    .take(num_to_cancel)
                {
                    self.request_store.cancel(request);
                }
            }
        }
    }

    /// Matches granted containers to outstanding requests in three passes
    /// (host-local, rack-local, off-rack), releases the surplus, and
    /// launches executors in the matched containers.
    async fn handle_allocated_containers(
        &self,
        state: &mut AllocatorState,
        allocated: Vec<Container>,
    ) -> Result<()> {
        let num_allocated = allocated.len();
        let mut containers_to_use = Vec::with_capacity(num_allocated);

        // host-local matches
        let mut remaining = Vec::new();
        for container in allocated {
            let location = container.host.clone();
            self.match_container_to_request(
                container,
                &location,
                &mut containers_to_use,
                &mut remaining,
            );
        }

        // Rack resolution may block, and the known resolvers swallow thread
        // interrupts, so resolve the batch on a blocking worker; this task
        // stays cancellable, and a resolver panic surfaces here after the
        // worker joins.
        let hosts: Vec<String> = remaining.iter().map(|c| c.host.clone()).collect();
        let rack_resolver = Arc::clone(&self.rack_resolver);
        let racks: Vec<Option<String>> = tokio::task::spawn_blocking(move || {
            hosts.iter().map(|host| rack_resolver.resolve(host)).collect()
        })
        .await?;

        // rack-local matches
        let mut off_rack = Vec::new();
        for (container, rack) in remaining.into_iter().zip(racks) {
            match rack {
                Some(rack) => self.match_container_to_request(
                    container,
                    &rack,
                    &mut containers_to_use,
                    &mut off_rack,
                ),
                None => off_rack.push(container),
            }
        }

        // off-rack matches
        let mut unmatched = Vec::new();
        for container in off_rack {
            self.match_container_to_request(
                container,
                ANY_HOST,
                &mut containers_to_use,
                &mut unmatched,
            );
        }

        // Surplus containers have no outstanding request to satisfy; hand
        // them straight back.
        for container in unmatched {
            debug!(
                "releasing surplus container {} on host {}",
                container.id, container.host
            );
            state.released_containers.insert(container.id.clone());
            self.request_store.release(&container.id);
        }

        info!(
            "received {num_allocated} containers from the Resource Manager, launching executors on {} of them",
            containers_to_use.len()
        );
        self.run_allocated_containers(state, containers_to_use);
        Ok(())
    }

    /// Looks for an outstanding request matching the container at the given
    /// location. The matching key relaxes the container's vcores to the
    /// requested value, since some Resource Manager schedulers report vcores
    /// they did not honor.
    fn match_container_to_request(
        &self,
        container: Container,
        location: &str,
        containers_to_use: &mut Vec<Container>,
        remaining: &mut Vec<Container>,
    ) {
        let matching_resource =
            Resource::new(container.resource.memory_mb, self.resources.cores);
        match self.request_store.first_matching(location, matching_resource) {
            Some(request) => {
                self.request_store.cancel(&request);
                containers_to_use.push(container);
            }
            None => remaining.push(container),
        }
    }

    /// Mints executor ids for the matched containers and dispatches their
    /// launches to the pool.
    ///
    /// The starting counter increments only after the target gate passes;
    /// in the skip branch the matched request has already been consumed, so
    /// the allocator under-requests until the next reconciliation corrects
    /// it.
    fn run_allocated_containers(&self, state: &mut AllocatorState, containers_to_use: Vec<Container>) {
        for container in containers_to_use {
            state.executor_id_counter += 1;
            let executor_id = state.executor_id_counter.to_string();
            assert!(
                container.resource.memory_mb >= self.resources.total_memory_mb(),
                "allocated container {} has memory {} below the requested {}",
                container.id,
                container.resource.memory_mb,
                self.resources.total_memory_mb()
            );

            if state.running_executors.len() < state.target_num_executors {
                self.num_executors_starting.fetch_add(1, Ordering::SeqCst);
                info!(
                    "launching container {} on host {} for executor with id {executor_id}",
                    container.id, container.host
                );
                self.dispatch_launch(container, executor_id);
            } else {
                info!(
                    "skipping executor launch on container {} since the number of running executors already reached the target of {}",
                    container.id, state.target_num_executors
                );
            }
        }
    }

    fn dispatch_launch(&self, container: Container, executor_id: String) {
        let ctx = ExecutorLaunchContext {
            container: container.clone(),
            executor_id: executor_id.clone(),
            driver_url: self.config.driver_url.clone(),
            host: container.host.clone(),
            memory_mb: self.resources.executor_memory_mb,
            cores: self.resources.cores,
            app_id: self.config.app_id.clone(),
        };
        let launcher = Arc::clone(&self.launcher);
        let request_store = Arc::clone(&self.request_store);
        let state = Arc::clone(&self.state);
        let num_starting = Arc::clone(&self.num_executors_starting);
        let mut shutdown = self.launcher_pool.subscribe_for_shutdown();

        self.launcher_pool.spawn(async move {
            let result = tokio::select! {
                result = launcher.launch(ctx) => result,
                _ = shutdown.recv() => Err(ForemanError::Cancelled),
            };
            match result {
                Ok(()) => {
                    let mut state = state.lock().await;
                    state.running_executors.insert(executor_id.clone());
                    num_starting.fetch_sub(1, Ordering::SeqCst);
                    state
                        .executor_id_to_container
                        .insert(executor_id.clone(), container.clone());
                    state
                        .container_id_to_executor_id
                        .insert(container.id.clone(), executor_id);
                    state
                        .allocated_host_to_containers
                        .entry(container.host.clone())
                        .or_default()
                        .insert(container.id.clone());
                    state
                        .allocated_container_to_host
                        .insert(container.id.clone(), container.host);
                }
                Err(e) => {
                    // Non-fatal launch failure; a panic inside the launcher
                    // is fatal and deliberately skips this cleanup.
                    error!(
                        "failed to launch executor {executor_id} on container {}: {e}",
                        container.id
                    );
                    num_starting.fetch_sub(1, Ordering::SeqCst);
                    let mut state = state.lock().await;
                    state.released_containers.insert(container.id.clone());
                    request_store.release(&container.id);
                }
            }
        });
    }

    /// Applies completion reports: classifies each exit, feeds the failure
    /// and blacklist trackers, untangles the bookkeeping maps, and answers
    /// queued loss-reason queries. Returns the executor removals to notify
    /// the driver about.
    fn process_completed_containers(
        &self,
        state: &mut AllocatorState,
        completed: Vec<ContainerStatus>,
    ) -> Vec<(String, ExecutorLossReason)> {
        let mut removals = Vec::new();
        for status in completed {
            let container_id = status.container_id.clone();
            let already_released = state.released_containers.remove(&container_id);
            let host = state.allocated_container_to_host.get(&container_id).cloned();

            let exit_reason = if !already_released {
                // The next reconciliation takes care of re-requesting.
                if let Some(executor_id) =
                    state.container_id_to_executor_id.get(&container_id).cloned()
                {
                    state.running_executors.remove(&executor_id);
                } else {
                    warn!("cannot find the executor for completed container {container_id}");
                }
                let classification = classify_exit(
                    status.exit_status,
                    &status.diagnostics,
                    &container_id,
                    host.as_deref(),
                );
                if classification.bad_node {
                    self.blacklist_tracker
                        .handle_resource_allocation_failure(host.as_deref());
                } else if classification.exit_caused_by_app {
                    self.failure_tracker.register_executor_failure();
                }
                if classification.exit_caused_by_app {
                    warn!("{}", classification.message);
                } else {
                    info!("{}", classification.message);
                }
                ExecutorLossReason {
                    exit_status: status.exit_status,
                    exit_caused_by_app: classification.exit_caused_by_app,
                    message: classification.message,
                }
            } else {
                // We released this container, which means the driver asked
                // for the executor to be killed.
                ExecutorLossReason {
                    exit_status: status.exit_status,
                    exit_caused_by_app: false,
                    message: format!(
                        "Container {container_id} exited from an explicit termination request."
                    ),
                }
            };

            if let Some(host) = &host {
                if let Some(containers) = state.allocated_host_to_containers.get_mut(host) {
                    containers.remove(&container_id);
                    if containers.is_empty() {
                        state.allocated_host_to_containers.remove(host);
                    }
                }
                state.allocated_container_to_host.remove(&container_id);
            }

            if let Some(executor_id) = state.container_id_to_executor_id.remove(&container_id) {
                state.executor_id_to_container.remove(&executor_id);
                match state.pending_loss_reason_requests.remove(&executor_id) {
                    Some(handles) => {
                        for handle in handles {
                            let _ = handle.send(Ok(exit_reason.clone()));
                        }
                    }
                    None => {
                        state
                            .released_executor_loss_reasons
                            .insert(executor_id.clone(), exit_reason.clone());
                    }
                }
                if !already_released {
                    self.num_unexpected_container_release
                        .fetch_add(1, Ordering::SeqCst);
                    removals.push((executor_id, exit_reason));
                }
            }
        }
        removals
    }
}

struct ExitClassification {
    exit_caused_by_app: bool,
    message: String,
    /// Unknown exit statuses point at an unhealthy node and feed the
    /// blacklist tracker.
    bad_node: bool,
}

/// Classifies a container exit. Pure in its inputs; the caller overrides the
/// result for containers it released on purpose.
fn classify_exit(
    status: i32,
    diagnostics: &str,
    container_id: &ContainerId,
    host: Option<&str>,
) -> ExitClassification {
    let on_host = host.map(|h| format!(" on host: {h}")).unwrap_or_default();
    match status {
        exit_status::SUCCESS | exit_status::PREEMPTED => ExitClassification {
            exit_caused_by_app: false,
            message: format!(
                "Executor for container {container_id} exited because of a Resource Manager \
                 event (e.g. preemption) and not because of an error in the running job."
            ),
            bad_node: false,
        },
        exit_status::KILLED_EXCEEDED_VMEM => ExitClassification {
            exit_caused_by_app: true,
            message: mem_limit_exceeded_message(diagnostics, &VMEM_EXCEEDED_PATTERN),
            bad_node: false,
        },
        exit_status::KILLED_EXCEEDED_PMEM => ExitClassification {
            exit_caused_by_app: true,
            message: mem_limit_exceeded_message(diagnostics, &PMEM_EXCEEDED_PATTERN),
            bad_node: false,
        },
        exit_status::KILLED_BY_RESOURCE_MANAGER
        | exit_status::KILLED_BY_APP_MASTER
        | exit_status::KILLED_AFTER_APP_COMPLETION
        | exit_status::ABORTED
        | exit_status::DISKS_FAILED => ExitClassification {
            exit_caused_by_app: false,
            message: format!(
                "Container marked as failed: {container_id}{on_host}. \
                 Exit status: {status}. Diagnostics: {diagnostics}."
            ),
            bad_node: false,
        },
        _ => ExitClassification {
            exit_caused_by_app: true,
            message: format!(
                "Container from a bad node: {container_id}{on_host}. \
                 Exit status: {status}. Diagnostics: {diagnostics}."
            ),
            bad_node: true,
        },
    }
}

fn mem_limit_exceeded_message(diagnostics: &str, pattern: &Regex) -> String {
    let detail = pattern
        .find(diagnostics)
        .map(|found| format!(" {}.", found.as_str()))
        .unwrap_or_default();
    format!(
        "Container killed by the Resource Manager for exceeding memory limits.{detail} \
         Consider boosting the executor memory overhead."
    )
}
