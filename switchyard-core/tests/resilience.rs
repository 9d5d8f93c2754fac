use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use std::time::Duration;

use futures::stream::{BoxStream, StreamExt};

use switchyard_core::{CircuitState, Runnable, RunnableExt, StreamEvent, SwitchyardError};

struct Flaky {
    failures_before_success: usize,
    attempts: Arc<AtomicUsize>,
}

impl Flaky {
    fn new(failures_before_success: usize) -> Self {
        Self {
            failures_before_success,
            attempts: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn attempts_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.attempts)
    }
}

struct ParseFailer {
    attempts: Arc<AtomicUsize>,
}

struct Constant(&'static str);

fn empty_stream<'a>() -> BoxStream<'a, Result<StreamEvent, SwitchyardError>> {
    futures::stream::iter(vec![Ok(StreamEvent::FinalAnswer(String::new()))]).boxed()
}

#[async_trait::async_trait]
impl Runnable<String, String> for Flaky {
    async fn invoke(&self, input: String) -> Result<String, SwitchyardError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt <= self.failures_before_success {
            return Err(SwitchyardError::LlmProvider("transient".to_string()));
        }

        Ok(format!("ok:{input}"))
    }

    fn stream(&self, _input: String) -> BoxStream<'_, Result<StreamEvent, SwitchyardError>> {
        empty_stream()
    }
}

#[async_trait::async_trait]
impl Runnable<String, String> for ParseFailer {
    async fn invoke(&self, _input: String) -> Result<String, SwitchyardError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(SwitchyardError::ParseFailed {
            output: "bad".to_string(),
            reason: "invalid".to_string(),
        })
    }

    fn stream(&self, _input: String) -> BoxStream<'_, Result<StreamEvent, SwitchyardError>> {
        empty_stream()
    }
}

#[async_trait::async_trait]
impl Runnable<String, String> for Constant {
    async fn invoke(&self, input: String) -> Result<String, SwitchyardError> {
        Ok(format!("{}:{input}", self.0))
    }

    fn stream(&self, _input: String) -> BoxStream<'_, Result<StreamEvent, SwitchyardError>> {
        empty_stream()
    }
}

#[tokio::test]
async fn retries_until_success() {
    let flaky = Flaky::new(2);
    let attempts = flaky.attempts_counter();
    let output = flaky
        .with_retries(3)
        .invoke("ping".to_string())
        .await
        .unwrap();

    assert_eq!(output, "ok:ping".to_string());
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn returns_max_retries_exceeded() {
    let flaky = Flaky::new(5);
    let attempts = flaky.attempts_counter();
    let err = flaky
        .with_backoff(2, Duration::from_millis(1), Duration::from_millis(5))
        .invoke("ping".to_string())
        .await
        .unwrap_err();

    assert!(matches!(err, SwitchyardError::MaxRetriesExceeded { max: 2 }));
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn non_retryable_error_fails_fast() {
    let parse_failer = ParseFailer {
        attempts: Arc::new(AtomicUsize::new(0)),
    };
    let attempts = Arc::clone(&parse_failer.attempts);
    let err = parse_failer
        .with_retries(3)
        .invoke("ping".to_string())
        .await
        .unwrap_err();

    assert!(matches!(err, SwitchyardError::ParseFailed { .. }));
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn fallback_used_when_primary_fails() {
    let primary = Flaky::new(usize::MAX);
    let fallbacks: Vec<Arc<dyn Runnable<String, String> + Send + Sync>> =
        vec![Arc::new(Constant("fallback"))];
    let runnable = primary.with_fallbacks(fallbacks);
    let output = runnable.invoke("task".to_string()).await.unwrap();
    assert_eq!(output, "fallback:task");
}

#[tokio::test]
async fn primary_result_wins_when_it_succeeds() {
    let fallbacks: Vec<Arc<dyn Runnable<String, String> + Send + Sync>> =
        vec![Arc::new(Constant("fallback"))];
    let runnable = Constant("primary").with_fallbacks(fallbacks);
    assert_eq!(runnable.invoke("t".to_string()).await.unwrap(), "primary:t");
}

#[tokio::test]
async fn circuit_opens_after_threshold_and_short_circuits() {
    let flaky = Flaky::new(usize::MAX);
    let attempts = flaky.attempts_counter();
    let breaker = flaky.with_circuit_breaker(3, Duration::from_secs(60));

    for _ in 0..3 {
        assert!(breaker.invoke("x".to_string()).await.is_err());
    }
    assert_eq!(breaker.state(), CircuitState::Open);

    let err = breaker.invoke("x".to_string()).await.unwrap_err();
    assert!(matches!(err, SwitchyardError::CircuitOpen(_)));
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn circuit_half_opens_and_closes_on_success() {
    let flaky = Flaky::new(2);
    let breaker = flaky.with_circuit_breaker(2, Duration::from_millis(20));

    assert!(breaker.invoke("x".to_string()).await.is_err());
    assert!(breaker.invoke("x".to_string()).await.is_err());
    assert_eq!(breaker.state(), CircuitState::Open);

    tokio::time::sleep(Duration::from_millis(40)).await;
    let output = breaker.invoke("x".to_string()).await.unwrap();
    assert_eq!(output, "ok:x");
    assert_eq!(breaker.state(), CircuitState::Closed);
    assert_eq!(breaker.consecutive_failures(), 0);
}
