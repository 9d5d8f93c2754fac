use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use futures::stream::{BoxStream, StreamExt};

use switchyard_core::Runnable;

use crate::stream::now_millis;
use crate::{
    ExecutionConfig, ExecutionOptions, GraphError, GraphEvent, GraphState, Observer, StateSchema,
    StateUpdate,
};

/// Name of the terminal pseudo-node.
pub const END: &str = "__end__";

pub trait GraphNode<S: StateSchema>:
    Runnable<GraphState<S>, StateUpdate<S>> + Send + Sync
{
}

impl<S, T> GraphNode<S> for T
where
    S: StateSchema,
    T: Runnable<GraphState<S>, StateUpdate<S>> + Send + Sync,
{
}

type Router<S> = Arc<dyn Fn(&GraphState<S>) -> String + Send + Sync>;

enum Edge<S: StateSchema> {
    Direct(String),
    Conditional(Router<S>),
}

pub struct GraphBuilder<S: StateSchema> {
    nodes: HashMap<String, Arc<dyn GraphNode<S>>>,
    edges: HashMap<String, Edge<S>>,
    entry: Option<String>,
    config: ExecutionConfig,
    observer: Option<Arc<dyn Observer>>,
}

impl<S: StateSchema> Default for GraphBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: StateSchema> GraphBuilder<S> {
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            edges: HashMap::new(),
            entry: None,
            config: ExecutionConfig::default(),
            observer: None,
        }
    }

    pub fn add_node<R>(mut self, name: &str, node: R) -> Self
    where
        R: GraphNode<S> + 'static,
    {
        self.nodes.insert(name.to_string(), Arc::new(node));
        self
    }

    pub fn set_entry(mut self, name: &str) -> Self {
        self.entry = Some(name.to_string());
        self
    }

    /// Unconditional transition. A later edge from the same node replaces it.
    pub fn add_edge(mut self, from: &str, to: &str) -> Self {
        self.edges
            .insert(from.to_string(), Edge::Direct(to.to_string()));
        self
    }

    /// The router returns the next node name, or [`END`].
    pub fn add_conditional_edge<F>(mut self, from: &str, router: F) -> Self
    where
        F: Fn(&GraphState<S>) -> String + Send + Sync + 'static,
    {
        self.edges
            .insert(from.to_string(), Edge::Conditional(Arc::new(router)));
        self
    }

    pub fn with_default_config(mut self, config: ExecutionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn build(self) -> Result<ExecutableGraph<S>, GraphError> {
        let entry = self.entry.ok_or(GraphError::MissingEntry)?;
        if !self.nodes.contains_key(&entry) {
            return Err(GraphError::MissingNode { node: entry });
        }
        for (from, edge) in &self.edges {
            if !self.nodes.contains_key(from) {
                return Err(GraphError::MissingNode { node: from.clone() });
            }
            if let Edge::Direct(to) = edge {
                if to != END && !self.nodes.contains_key(to) {
                    return Err(GraphError::InvalidEdge {
                        from: from.clone(),
                        to: to.clone(),
                    });
                }
            }
        }

        Ok(ExecutableGraph {
            nodes: self.nodes,
            edges: self.edges,
            entry,
            config: self.config,
            observer: self.observer,
        })
    }
}

/// A validated graph. Runs one node at a time from the entry node until a
/// node without an outgoing edge finishes or a router returns [`END`].
pub struct ExecutableGraph<S: StateSchema> {
    nodes: HashMap<String, Arc<dyn GraphNode<S>>>,
    edges: HashMap<String, Edge<S>>,
    entry: String,
    config: ExecutionConfig,
    observer: Option<Arc<dyn Observer>>,
}

impl<S: StateSchema> ExecutableGraph<S> {
    pub fn entry(&self) -> &str {
        &self.entry
    }

    pub fn node_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.nodes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub async fn invoke(&self, state: GraphState<S>) -> Result<GraphState<S>, GraphError> {
        self.invoke_with_options(state, ExecutionOptions::default())
            .await
    }

    pub async fn invoke_with_options(
        &self,
        mut state: GraphState<S>,
        options: ExecutionOptions,
    ) -> Result<GraphState<S>, GraphError> {
        let config = self.config.merge(&options);
        let observer = options.observer.or_else(|| self.observer.clone());
        let mut current = self.entry.clone();
        let mut steps = 0usize;

        loop {
            steps += 1;
            check_steps(&config, steps)?;
            state = self.run_node(&current, state, observer.as_deref()).await?;
            match self.next_node(&current, &state)? {
                Some(next) => current = next,
                None => break,
            }
        }
        tracing::debug!(steps, "graph finished");
        Ok(state)
    }

    /// Runs the graph, yielding an event around every node.
    pub fn stream_invoke(
        &self,
        state: GraphState<S>,
    ) -> BoxStream<'_, Result<GraphEvent<S>, GraphError>> {
        self.stream_invoke_with_options(state, ExecutionOptions::default())
    }

    pub fn stream_invoke_with_options(
        &self,
        state: GraphState<S>,
        options: ExecutionOptions,
    ) -> BoxStream<'_, Result<GraphEvent<S>, GraphError>> {
        let config = self.config.merge(&options);
        let observer = options.observer.or_else(|| self.observer.clone());
        async_stream::try_stream! {
            let mut state = state;
            let mut current = self.entry.clone();
            let mut steps = 0usize;

            loop {
                steps += 1;
                check_steps(&config, steps)?;
                yield GraphEvent::NodeEnter {
                    node: current.clone(),
                    timestamp: now_millis(),
                };
                state = self.run_node(&current, state, observer.as_deref()).await?;
                yield GraphEvent::NodeExit {
                    node: current.clone(),
                    state: state.clone(),
                    timestamp: now_millis(),
                };
                match self.next_node(&current, &state)? {
                    Some(next) => current = next,
                    None => break,
                }
            }

            yield GraphEvent::Finished(state);
        }
        .boxed()
    }

    async fn run_node(
        &self,
        name: &str,
        state: GraphState<S>,
        observer: Option<&dyn Observer>,
    ) -> Result<GraphState<S>, GraphError> {
        let node = self.nodes.get(name).ok_or_else(|| GraphError::MissingNode {
            node: name.to_string(),
        })?;

        if let Some(observer) = observer {
            let input = serde_json::to_value(&state.data).unwrap_or_default();
            observer.on_node_start(name, &input).await;
        }
        tracing::debug!(node = name, "entering node");
        let started = Instant::now();

        match node.invoke(state.clone()).await {
            Ok(update) => {
                let next = state.apply_update(update);
                if let Some(observer) = observer {
                    let output = serde_json::to_value(&next.data).unwrap_or_default();
                    observer
                        .on_node_end(name, &output, started.elapsed().as_millis())
                        .await;
                }
                Ok(next)
            }
            Err(source) => {
                let error = GraphError::NodeFailed {
                    node: name.to_string(),
                    source,
                };
                if let Some(observer) = observer {
                    observer.on_error(name, &error).await;
                }
                Err(error)
            }
        }
    }

    fn next_node(&self, current: &str, state: &GraphState<S>) -> Result<Option<String>, GraphError> {
        let next = match self.edges.get(current) {
            None => return Ok(None),
            Some(Edge::Direct(to)) => to.clone(),
            Some(Edge::Conditional(router)) => router(state),
        };
        if next == END {
            return Ok(None);
        }
        if !self.nodes.contains_key(&next) {
            return Err(GraphError::InvalidEdge {
                from: current.to_string(),
                to: next,
            });
        }
        tracing::debug!(from = current, to = %next, "transition");
        Ok(Some(next))
    }
}

fn check_steps(config: &ExecutionConfig, steps: usize) -> Result<(), GraphError> {
    match config.max_steps {
        Some(max) if steps > max => Err(GraphError::MaxStepsExceeded {
            max,
            reached: steps - 1,
        }),
        _ => Ok(()),
    }
}
