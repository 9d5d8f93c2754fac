use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;
use switchyard_core::SwitchyardError;
use switchyard_middleware::{
    AgentRequest, AgentResponse, LoggingMiddleware, MetricsMiddleware, Middleware,
    MiddlewareChain, MiddlewareError,
};

type Log = Arc<Mutex<Vec<String>>>;

struct Recorder {
    label: &'static str,
    log: Log,
}

#[async_trait]
impl Middleware for Recorder {
    fn name(&self) -> &str {
        self.label
    }

    async fn process_request(
        &self,
        mut request: AgentRequest,
    ) -> Result<AgentRequest, MiddlewareError> {
        self.log.lock().unwrap().push(format!("req:{}", self.label));
        request
            .metadata
            .insert(self.label.to_string(), json!(true));
        Ok(request)
    }

    async fn process_response(
        &self,
        response: AgentResponse,
    ) -> Result<AgentResponse, MiddlewareError> {
        self.log.lock().unwrap().push(format!("resp:{}", self.label));
        Ok(response)
    }
}

struct Failing;

#[async_trait]
impl Middleware for Failing {
    fn name(&self) -> &str {
        "failing"
    }

    async fn process_request(
        &self,
        _request: AgentRequest,
    ) -> Result<AgentRequest, MiddlewareError> {
        Err(MiddlewareError::Custom("boom".to_string()))
    }

    async fn process_response(
        &self,
        _response: AgentResponse,
    ) -> Result<AgentResponse, MiddlewareError> {
        Err(MiddlewareError::Rejected {
            name: "failing".to_string(),
            reason: "nope".to_string(),
        })
    }
}

struct Panicking;

#[async_trait]
impl Middleware for Panicking {
    fn name(&self) -> &str {
        "panicking"
    }

    async fn process_request(
        &self,
        _request: AgentRequest,
    ) -> Result<AgentRequest, MiddlewareError> {
        panic!("interceptor bug");
    }
}

fn recorder(label: &'static str, log: &Log) -> Recorder {
    Recorder {
        label,
        log: Arc::clone(log),
    }
}

async fn echo(request: AgentRequest) -> Result<AgentResponse, SwitchyardError> {
    let payload = request.payload.clone();
    Ok(AgentResponse::for_request(&request, payload))
}

#[tokio::test]
async fn response_keeps_request_correlation_id() {
    let chain = MiddlewareChain::new()
        .add(LoggingMiddleware::new().verbose(true))
        .add(MetricsMiddleware::new());

    let request = AgentRequest::new("research", json!({"task": "list files"}));
    let id = request.correlation_id;

    let response = chain.execute(request, echo).await.unwrap();
    assert_eq!(response.correlation_id, id);
    assert_eq!(response.agent_name, "research");
    assert_eq!(response.payload, json!({"task": "list files"}));
    assert!(response.metadata.contains_key("execution_time_ms"));
}

#[tokio::test]
async fn requests_run_forward_and_responses_in_reverse() {
    let log: Log = Arc::default();
    let chain = MiddlewareChain::new()
        .add(recorder("a", &log))
        .add(recorder("b", &log))
        .add(recorder("c", &log));
    assert_eq!(chain.len(), 3);

    let dispatch_log = Arc::clone(&log);
    chain
        .execute(AgentRequest::new("coordinator", "hi"), |request| async move {
            dispatch_log.lock().unwrap().push("dispatch".to_string());
            echo(request).await
        })
        .await
        .unwrap();

    assert_eq!(
        *log.lock().unwrap(),
        vec!["req:a", "req:b", "req:c", "dispatch", "resp:c", "resp:b", "resp:a"]
    );
}

#[tokio::test]
async fn failing_interceptor_does_not_abort_the_chain() {
    let log: Log = Arc::default();
    let chain = MiddlewareChain::new()
        .add(recorder("first", &log))
        .add(Failing)
        .add(recorder("last", &log));

    let request = AgentRequest::new("analysis", json!([1, 2, 3]));
    let id = request.correlation_id;

    let processed = chain.process_request(request).await;
    assert!(processed.metadata.contains_key("first"));
    assert!(processed.metadata.contains_key("last"));

    let response = chain
        .process_response(AgentResponse::for_request(&processed, "done"))
        .await;
    assert_eq!(response.correlation_id, id);
    assert_eq!(response.payload, json!("done"));
    assert_eq!(
        *log.lock().unwrap(),
        vec!["req:first", "req:last", "resp:last", "resp:first"]
    );
}

#[tokio::test]
async fn panicking_interceptor_is_isolated() {
    let log: Log = Arc::default();
    let chain = MiddlewareChain::new()
        .add(Panicking)
        .add(recorder("after", &log));

    let response = chain
        .execute(AgentRequest::new("research", "task"), echo)
        .await
        .unwrap();

    assert_eq!(response.payload, json!("task"));
    assert_eq!(*log.lock().unwrap(), vec!["req:after", "resp:after"]);
}

#[tokio::test]
async fn dispatch_errors_propagate() {
    let chain = MiddlewareChain::new().add(LoggingMiddleware::new());
    let result = chain
        .execute(AgentRequest::new("research", "task"), |_| async {
            Err(SwitchyardError::LlmProvider("down".to_string()))
        })
        .await;
    assert!(matches!(result, Err(SwitchyardError::LlmProvider(_))));
}

#[test]
fn empty_chain_reports_empty() {
    let chain = MiddlewareChain::new();
    assert!(chain.is_empty());
    assert_eq!(chain.len(), 0);
}
