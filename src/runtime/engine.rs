/// Workflow orchestration
///
/// Orders the graph, then attempts every node in that order: collect inputs from the
/// outputs of completed producers, dispatch to the executor, record the output or
/// report the failure, and move on. A failing node never stops the run; a cyclic or
/// malformed graph stops it before anything executes.

use crate::error::{GraphError, NodeError};
use crate::runtime::events::ExecutionCallbacks;
use crate::runtime::executor::{CallGuard, NodeExecutor};
use crate::runtime::inputs::collect_inputs;
use crate::workflow::graph::ExecutionGraph;
use crate::workflow::types::{Node, OutputBag, WorkflowGraph};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::{
    collections::{HashMap, HashSet, VecDeque},
    sync::Arc,
    time::Duration,
};
use tokio::task::{Id as TaskId, JoinSet};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Orchestrator tuning
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Per remote call; `None` waits indefinitely
    pub call_timeout: Option<Duration>,
    /// Nodes allowed in flight at once; 1 runs strictly sequentially
    pub max_parallel: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            call_timeout: None,
            max_parallel: 1,
        }
    }
}

/// Lifecycle of a single run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RunState {
    Pending,
    Ordering,
    Executing,
    /// Every node in the order was attempted
    Completed,
    /// The graph could not be ordered; nothing executed
    CycleFailure,
    /// Cancellation stopped the run before every node was attempted
    Cancelled,
}

/// What a finished run hands back to the caller
///
/// Carries no aggregate success flag: per-node outcomes arrive through the callbacks.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    /// `Completed` or `Cancelled`
    pub state: RunState,
    /// Topological order the run was scheduled in
    pub order: Vec<String>,
    /// Output of every node that succeeded
    pub outputs: HashMap<String, OutputBag>,
    /// Nodes never attempted because the run was cancelled
    pub not_attempted: Vec<String>,
}

/// DAG execution engine for generation workflows
#[derive(Debug)]
pub struct ExecutionEngine {
    executor: Arc<NodeExecutor>,
    options: EngineOptions,
}

/// Per-run bookkeeping, owned by the driving task
///
/// The outputs map is written only here, once per successful node, after its
/// executor call has returned.
struct RunProgress<'c> {
    outputs: HashMap<String, OutputBag>,
    attempted: HashSet<String>,
    callbacks: &'c dyn ExecutionCallbacks,
}

impl ExecutionEngine {
    pub fn new(executor: Arc<NodeExecutor>) -> Self {
        Self::with_options(executor, EngineOptions::default())
    }

    pub fn with_options(executor: Arc<NodeExecutor>, options: EngineOptions) -> Self {
        Self { executor, options }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Run every node of `workflow` in dependency order
    ///
    /// Returns `Err` only for run-level graph errors, before any callback fires.
    pub async fn execute_workflow(
        &self,
        workflow: &WorkflowGraph,
        callbacks: &dyn ExecutionCallbacks,
        cancel: CancellationToken,
    ) -> Result<RunReport, GraphError> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let workflow_start_time = std::time::Instant::now();
        let mut state = RunState::Pending;

        tracing::info!(
            "🚀 Starting run {} ({} nodes, {} edges)",
            run_id,
            workflow.nodes.len(),
            workflow.edges.len()
        );

        transition(&run_id, &mut state, RunState::Ordering);
        let ordered = ExecutionGraph::build(workflow).and_then(|graph| {
            let order = graph.execution_order()?;
            Ok((graph, order))
        });
        let (graph, order) = match ordered {
            Ok((graph, order)) => (graph, order.into_iter().map(str::to_string).collect::<Vec<_>>()),
            Err(e) => {
                transition(&run_id, &mut state, RunState::CycleFailure);
                tracing::error!("❌ Run {} aborted before execution: {}", run_id, e);
                return Err(e);
            }
        };
        tracing::debug!("📋 Execution order: {:?}", order);

        transition(&run_id, &mut state, RunState::Executing);
        let mut run = RunProgress {
            outputs: HashMap::with_capacity(order.len()),
            attempted: HashSet::with_capacity(order.len()),
            callbacks,
        };
        let guard = CallGuard::new(self.options.call_timeout, cancel);
        if self.options.max_parallel > 1 {
            self.execute_concurrent(&graph, workflow, &order, &mut run, &guard)
                .await;
        } else {
            self.execute_sequential(&graph, workflow, &order, &mut run, &guard)
                .await;
        }

        let not_attempted: Vec<String> = order
            .iter()
            .filter(|id| !run.attempted.contains(*id))
            .cloned()
            .collect();
        let final_state = if not_attempted.is_empty() {
            RunState::Completed
        } else {
            RunState::Cancelled
        };
        transition(&run_id, &mut state, final_state);

        tracing::info!(
            "🎉 Run {} {:?} in {:?}: {}/{} nodes produced output",
            run_id,
            state,
            workflow_start_time.elapsed(),
            run.outputs.len(),
            order.len()
        );

        Ok(RunReport {
            run_id,
            started_at,
            state,
            order,
            outputs: run.outputs,
            not_attempted,
        })
    }

    /// One node at a time, in topological order
    async fn execute_sequential(
        &self,
        graph: &ExecutionGraph<'_>,
        workflow: &WorkflowGraph,
        order: &[String],
        run: &mut RunProgress<'_>,
        guard: &CallGuard,
    ) {
        for (step, node_id) in order.iter().enumerate() {
            if guard.is_cancelled() {
                tracing::warn!("⏹️ Run cancelled before step {}/{}", step + 1, order.len());
                break;
            }
            let Some(node) = graph.node(node_id) else {
                continue;
            };

            tracing::info!(
                "📍 Step {}/{}: node '{}' (type: {})",
                step + 1,
                order.len(),
                node.id,
                node.node_type
            );

            let inputs = run.begin(node, workflow);
            let result = self.executor.execute_node(node, &inputs, guard).await;
            run.finish(node, result);
        }
    }

    /// Ready-queue scheduling: a node becomes ready once all its direct
    /// predecessors have been attempted; up to `max_parallel` run at once
    async fn execute_concurrent(
        &self,
        graph: &ExecutionGraph<'_>,
        workflow: &WorkflowGraph,
        order: &[String],
        run: &mut RunProgress<'_>,
        guard: &CallGuard,
    ) {
        let position: HashMap<&str, usize> = order
            .iter()
            .enumerate()
            .map(|(index, id)| (id.as_str(), index))
            .collect();
        let mut remaining = graph.in_degrees();
        let mut ready: VecDeque<&str> = order
            .iter()
            .map(String::as_str)
            .filter(|id| remaining.get(id) == Some(&0))
            .collect();

        let mut in_flight: JoinSet<(String, Result<OutputBag, NodeError>)> =
            JoinSet::new();
        let mut task_nodes: HashMap<TaskId, String> = HashMap::new();

        loop {
            while in_flight.len() < self.options.max_parallel && !guard.is_cancelled() {
                let Some(node_id) = ready.pop_front() else {
                    break;
                };
                let Some(node) = graph.node(node_id) else {
                    continue;
                };

                tracing::info!(
                    "📍 Dispatching node '{}' (type: {}, {} in flight)",
                    node.id,
                    node.node_type,
                    in_flight.len() + 1
                );

                let inputs = run.begin(node, workflow);
                let executor = Arc::clone(&self.executor);
                let task_node = node.clone();
                let task_guard = guard.clone();
                let handle = in_flight.spawn(async move {
                    let result = executor.execute_node(&task_node, &inputs, &task_guard).await;
                    (task_node.id, result)
                });
                task_nodes.insert(handle.id(), node.id.clone());
            }

            let Some(joined) = in_flight.join_next_with_id().await else {
                break;
            };
            let (node_id, result) = match joined {
                Ok((task_id, (node_id, result))) => {
                    task_nodes.remove(&task_id);
                    (node_id, result)
                }
                Err(join_error) => {
                    let Some(node_id) = task_nodes.remove(&join_error.id()) else {
                        continue;
                    };
                    tracing::error!("💥 Task for node '{}' aborted: {}", node_id, join_error);
                    (
                        node_id,
                        Err(NodeError::upstream(format!(
                            "Node execution aborted: {}",
                            join_error
                        ))),
                    )
                }
            };

            let Some(node) = graph.node(&node_id) else {
                continue;
            };
            run.finish(node, result);

            let mut released: Vec<&str> = Vec::new();
            for target in graph.successors(&node_id) {
                if let Some(count) = remaining.get_mut(target) {
                    *count -= 1;
                    if *count == 0 {
                        released.push(target);
                    }
                }
            }
            released.sort_by_key(|id| position.get(id).copied().unwrap_or(usize::MAX));
            ready.extend(released);
        }

        if guard.is_cancelled() && !ready.is_empty() {
            tracing::warn!("⏹️ Run cancelled with {} ready nodes not started", ready.len());
        }
    }
}

impl RunProgress<'_> {
    /// Emit the start notification and gather inputs for `node`
    fn begin(&mut self, node: &Node, workflow: &WorkflowGraph) -> OutputBag {
        if node.is_generative() {
            self.callbacks.on_node_start(&node.id);
        }
        collect_inputs(&node.id, &workflow.edges, &self.outputs)
    }

    /// Record the outcome of an attempted node
    fn finish(&mut self, node: &Node, result: Result<OutputBag, NodeError>) {
        self.attempted.insert(node.id.clone());
        match result {
            Ok(output) => {
                if node.is_generative() {
                    self.callbacks.on_node_complete(&node.id, &output);
                }
                tracing::info!("✅ Node '{}' completed", node.id);
                self.outputs.insert(node.id.clone(), output);
            }
            Err(e) => {
                tracing::warn!("❌ Node '{}' failed: {}", node.id, e);
                self.callbacks.on_node_error(&node.id, &e.to_string());
            }
        }
    }
}

fn transition(run_id: &Uuid, state: &mut RunState, next: RunState) {
    tracing::debug!("🔄 Run {}: {:?} -> {:?}", run_id, state, next);
    *state = next;
}
