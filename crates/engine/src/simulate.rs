//! Dry-run simulation runner.
//!
//! [`SimulationRunner::simulate`] wraps any async operation and executes it
//! according to the current [`Mode`]:
//!
//! - `live`: run with retries and exponential backoff, propagate the last error
//! - `healing`: like live, but a final failure is logged and swallowed
//! - `dry`: never run, log a `simulated` event
//! - `preview`: never run, answer from the caller's [`Stub`]
//!
//! Every attempt lands in a bounded, newest-first event log. The runner is
//! cheap to clone; clones share mode, log and toasts.

use crate::toast::{ToastBoard, DEFAULT_TOAST_CAPACITY, DEFAULT_TOAST_LIFETIME};
use crate::types::{EventStatus, Mode, PreviewOutcome, SimulatedEvent, ToastKind};
use serde::Serialize;
use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;

pub const DEFAULT_EVENT_CAPACITY: usize = 100;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(150);
pub const OPERATION_PREVIEW_CHARS: usize = 200;

pub const DRY_RUN_RESULT: &str = "Operation was not executed.";
pub const STUB_REQUIRED_MESSAGE: &str = "Preview mode requires a 'stub' to be provided.";
pub const UNKNOWN_ERROR_MESSAGE: &str = "An unknown error occurred.";
pub const HEALED_PREFIX: &str = "HEALED: ";

#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub initial_mode: Mode,
    pub preview_outcome: PreviewOutcome,
    /// First backoff delay; attempt `i` waits `base_delay * 2^i`.
    pub base_delay: Duration,
    pub event_capacity: usize,
    pub toast_capacity: usize,
    pub toast_lifetime: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            initial_mode: Mode::default(),
            preview_outcome: PreviewOutcome::default(),
            base_delay: DEFAULT_BASE_DELAY,
            event_capacity: DEFAULT_EVENT_CAPACITY,
            toast_capacity: DEFAULT_TOAST_CAPACITY,
            toast_lifetime: DEFAULT_TOAST_LIFETIME,
        }
    }
}

/// Canned answers used in preview mode instead of running the operation.
#[derive(Debug, Clone)]
pub struct Stub<T, E> {
    pub success: T,
    pub failure: E,
}

impl<T, E> Stub<T, E> {
    pub fn new(success: T, failure: E) -> Self {
        Self { success, failure }
    }
}

pub struct SimulateOptions<T, E> {
    pub retries: u32,
    pub stub: Option<Stub<T, E>>,
    /// Text recorded as the event's `operation`; defaults to the closure type name.
    pub description: Option<String>,
}

impl<T, E> Default for SimulateOptions<T, E> {
    fn default() -> Self {
        Self {
            retries: 0,
            stub: None,
            description: None,
        }
    }
}

impl<T, E> SimulateOptions<T, E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn stub(mut self, stub: Stub<T, E>) -> Self {
        self.stub = Some(stub);
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// How a `simulate` call resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    /// The operation ran (live or healing) and produced a value.
    Completed(T),
    /// Preview mode answered with the stub's success value.
    Previewed(T),
    /// Dry mode: nothing ran.
    Simulated,
    /// Healing mode swallowed the final failure.
    Healed,
}

impl<T> Outcome<T> {
    pub fn into_value(self) -> Option<T> {
        match self {
            Outcome::Completed(v) | Outcome::Previewed(v) => Some(v),
            Outcome::Simulated | Outcome::Healed => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Completed(_) => "completed",
            Outcome::Previewed(_) => "previewed",
            Outcome::Simulated => "simulated",
            Outcome::Healed => "healed",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SimulateError<E> {
    /// Preview mode was active but the caller supplied no stub.
    #[error("Preview mode requires a 'stub' to be provided.")]
    StubRequired,
    /// Live mode exhausted its retries; carries the last error.
    #[error("{0}")]
    Operation(E),
    /// Preview mode answered with the stub's failure arm.
    #[error("{0}")]
    Stubbed(E),
}

impl<E> SimulateError<E> {
    pub fn kind(&self) -> &'static str {
        match self {
            SimulateError::StubRequired => "stub_required",
            SimulateError::Operation(_) => "failed",
            SimulateError::Stubbed(_) => "stub_failure",
        }
    }
}

// ---------------------------------------------------------------------------
// Event log
// ---------------------------------------------------------------------------

struct EventDraft {
    status: EventStatus,
    attempts: u32,
    result: Option<serde_json::Value>,
    error: Option<String>,
}

impl EventDraft {
    fn new(status: EventStatus, attempts: u32) -> Self {
        Self {
            status,
            attempts,
            result: None,
            error: None,
        }
    }

    fn result(mut self, result: Option<serde_json::Value>) -> Self {
        self.result = result;
        self
    }

    fn error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

/// Fields shared by every event of one `simulate` call.
struct CallContext {
    label: String,
    mode: Mode,
    operation: String,
    stub: Option<serde_json::Value>,
}

struct EventLog {
    next_id: u64,
    entries: VecDeque<SimulatedEvent>,
    capacity: usize,
}

impl EventLog {
    fn append(&mut self, call: &CallContext, draft: EventDraft) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push_front(SimulatedEvent {
            id,
            label: call.label.clone(),
            mode: call.mode,
            timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            status: draft.status,
            operation: call.operation.clone(),
            attempts: draft.attempts,
            result: draft.result,
            error: draft.error,
            stub: call.stub.clone(),
        });
        self.entries.truncate(self.capacity);
        id
    }
}

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

struct RunnerInner {
    mode: RwLock<Mode>,
    preview_outcome: RwLock<PreviewOutcome>,
    events: Mutex<EventLog>,
    toasts: ToastBoard,
    base_delay: Duration,
}

#[derive(Clone)]
pub struct SimulationRunner {
    inner: Arc<RunnerInner>,
}

impl SimulationRunner {
    pub fn new(config: RunnerConfig) -> Self {
        Self {
            inner: Arc::new(RunnerInner {
                mode: RwLock::new(config.initial_mode),
                preview_outcome: RwLock::new(config.preview_outcome),
                events: Mutex::new(EventLog {
                    next_id: 0,
                    entries: VecDeque::with_capacity(config.event_capacity.max(1)),
                    capacity: config.event_capacity.max(1),
                }),
                toasts: ToastBoard::new(config.toast_capacity, config.toast_lifetime),
                base_delay: config.base_delay,
            }),
        }
    }

    pub fn mode(&self) -> Mode {
        *self.inner.mode.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Switch mode. Any transition is allowed; an info toast announces it.
    pub fn set_mode(&self, mode: Mode) {
        *self.inner.mode.write().unwrap_or_else(PoisonError::into_inner) = mode;
        tracing::info!(mode = %mode, "simulation mode switched");
        self.inner.toasts.push(
            ToastKind::Info,
            "Mode Switched",
            format!("Environment is now in {} mode.", mode.as_str().to_uppercase()),
        );
    }

    pub fn preview_outcome(&self) -> PreviewOutcome {
        *self
            .inner
            .preview_outcome
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_preview_outcome(&self, outcome: PreviewOutcome) {
        *self
            .inner
            .preview_outcome
            .write()
            .unwrap_or_else(PoisonError::into_inner) = outcome;
    }

    /// Snapshot of the event log, newest first.
    pub fn events(&self) -> Vec<SimulatedEvent> {
        self.events_lock().entries.iter().cloned().collect()
    }

    /// Empty the log. Ids keep counting from where they were.
    pub fn clear_events(&self) {
        self.events_lock().entries.clear();
    }

    pub fn toasts(&self) -> &ToastBoard {
        &self.inner.toasts
    }

    pub fn add_toast(&self, kind: ToastKind, title: impl Into<String>, message: impl Into<String>) -> u64 {
        self.inner.toasts.push(kind, title, message)
    }

    pub fn dismiss_toast(&self, id: u64) -> bool {
        self.inner.toasts.dismiss(id)
    }

    /// Delay before the retry that follows failed attempt `attempt_index`.
    pub fn backoff_delay(&self, attempt_index: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt_index).unwrap_or(u32::MAX);
        self.inner.base_delay.saturating_mul(factor)
    }

    /// Run `operation` under the current mode.
    ///
    /// The mode and preview outcome are read once, at invocation. `T` must be
    /// `Serialize` because successful values are copied into the event's
    /// `result`; a value that fails to serialize is logged without one.
    pub async fn simulate<T, E, F, Fut>(
        &self,
        label: &str,
        mut operation: F,
        options: SimulateOptions<T, E>,
    ) -> Result<Outcome<T>, SimulateError<E>>
    where
        T: Serialize,
        E: fmt::Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mode = self.mode();
        let preview_outcome = self.preview_outcome();
        let SimulateOptions {
            retries,
            stub,
            description,
        } = options;

        let call = CallContext {
            label: label.to_string(),
            mode,
            operation: describe_operation(
                description.as_deref().unwrap_or_else(|| std::any::type_name::<F>()),
            ),
            stub: stub.as_ref().map(stub_echo),
        };

        match mode {
            Mode::Preview => {
                let Some(stub) = stub else {
                    self.record(
                        &call,
                        EventDraft::new(EventStatus::Failure, 1).error(STUB_REQUIRED_MESSAGE),
                    );
                    self.inner
                        .toasts
                        .push(ToastKind::Error, "Preview Error", STUB_REQUIRED_MESSAGE);
                    return Err(SimulateError::StubRequired);
                };
                match preview_outcome {
                    PreviewOutcome::Success => {
                        self.record(
                            &call,
                            EventDraft::new(EventStatus::Previewed, 1)
                                .result(to_json(&stub.success)),
                        );
                        Ok(Outcome::Previewed(stub.success))
                    }
                    PreviewOutcome::Failure => {
                        self.record(
                            &call,
                            EventDraft::new(EventStatus::Previewed, 1)
                                .error(stub.failure.to_string()),
                        );
                        Err(SimulateError::Stubbed(stub.failure))
                    }
                }
            }
            Mode::Dry => {
                self.record(
                    &call,
                    EventDraft::new(EventStatus::Simulated, 1)
                        .result(Some(serde_json::Value::from(DRY_RUN_RESULT))),
                );
                Ok(Outcome::Simulated)
            }
            Mode::Live | Mode::Healing => {
                self.execute(&call, &mut operation, retries).await
            }
        }
    }

    async fn execute<T, E, F, Fut>(
        &self,
        call: &CallContext,
        operation: &mut F,
        retries: u32,
    ) -> Result<Outcome<T>, SimulateError<E>>
    where
        T: Serialize,
        E: fmt::Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut attempt: u32 = 0;
        loop {
            let attempts = attempt + 1;
            match operation().await {
                Ok(value) => {
                    self.record(
                        call,
                        EventDraft::new(EventStatus::Success, attempts).result(to_json(&value)),
                    );
                    tracing::debug!(label = %call.label, attempts, "simulated operation succeeded");
                    return Ok(Outcome::Completed(value));
                }
                Err(err) => {
                    let message = error_message(&err);
                    if attempt < retries {
                        self.record(
                            call,
                            EventDraft::new(EventStatus::Retrying, attempts).error(message.as_str()),
                        );
                        let delay = self.backoff_delay(attempt);
                        tracing::debug!(
                            label = %call.label,
                            attempts,
                            delay_ms = delay.as_millis() as u64,
                            error = %message,
                            "attempt failed, retrying"
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        continue;
                    }

                    if call.mode == Mode::Healing {
                        tracing::warn!(
                            label = %call.label,
                            attempts,
                            error = %message,
                            "final attempt failed and was suppressed"
                        );
                        self.record(
                            call,
                            EventDraft::new(EventStatus::Failure, attempts)
                                .error(format!("{}{}", HEALED_PREFIX, message)),
                        );
                        return Ok(Outcome::Healed);
                    }

                    self.record(
                        call,
                        EventDraft::new(EventStatus::Failure, attempts).error(message),
                    );
                    return Err(SimulateError::Operation(err));
                }
            }
        }
    }

    fn record(&self, call: &CallContext, draft: EventDraft) -> u64 {
        self.events_lock().append(call, draft)
    }

    fn events_lock(&self) -> MutexGuard<'_, EventLog> {
        self.inner
            .events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SimulationRunner {
    fn default() -> Self {
        Self::new(RunnerConfig::default())
    }
}

fn describe_operation(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(OPERATION_PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

fn error_message<E: fmt::Display>(err: &E) -> String {
    let message = err.to_string();
    if message.is_empty() {
        UNKNOWN_ERROR_MESSAGE.to_string()
    } else {
        message
    }
}

fn to_json<T: Serialize>(value: &T) -> Option<serde_json::Value> {
    serde_json::to_value(value).ok()
}

fn stub_echo<T: Serialize, E: fmt::Display>(stub: &Stub<T, E>) -> serde_json::Value {
    serde_json::json!({
        "success": to_json(&stub.success),
        "failure": stub.failure.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    fn runner_in(mode: Mode) -> SimulationRunner {
        let runner = SimulationRunner::default();
        runner.set_mode(mode);
        runner
    }

    fn stub() -> Stub<String, String> {
        Stub::new("canned".to_string(), "canned failure".to_string())
    }

    #[tokio::test]
    async fn test_default_mode_is_dry() {
        let runner = SimulationRunner::default();
        assert_eq!(runner.mode(), Mode::Dry);
        assert_eq!(runner.preview_outcome(), PreviewOutcome::Success);
    }

    #[tokio::test]
    async fn test_dry_mode_never_runs_operation() {
        let runner = runner_in(Mode::Dry);
        let calls = AtomicU32::new(0);

        let outcome = runner
            .simulate(
                "Save",
                || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Ok::<_, String>(1) }
                },
                SimulateOptions::new().retries(3),
            )
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::Simulated);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        let events = runner.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].status, EventStatus::Simulated);
        assert_eq!(events[0].mode, Mode::Dry);
        assert_eq!(events[0].result, Some(serde_json::json!(DRY_RUN_RESULT)));
    }

    #[tokio::test]
    async fn test_preview_without_stub_fails_validation() {
        let runner = runner_in(Mode::Preview);
        let calls = AtomicU32::new(0);

        let err = runner
            .simulate(
                "Preview",
                || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Ok::<u32, String>(1) }
                },
                SimulateOptions::new(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, SimulateError::StubRequired));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        let events = runner.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].status, EventStatus::Failure);
        assert_eq!(events[0].error.as_deref(), Some(STUB_REQUIRED_MESSAGE));

        let toasts = runner.toasts().list();
        let last = toasts.last().unwrap();
        assert_eq!(last.kind, ToastKind::Error);
        assert_eq!(last.title, "Preview Error");
    }

    #[tokio::test]
    async fn test_preview_success_returns_stub() {
        let runner = runner_in(Mode::Preview);
        let calls = AtomicU32::new(0);

        let outcome = runner
            .simulate(
                "Preview",
                || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Ok::<String, String>("real".into()) }
                },
                SimulateOptions::new().stub(stub()),
            )
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::Previewed("canned".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        let events = runner.events();
        assert_eq!(events[0].status, EventStatus::Previewed);
        assert_eq!(events[0].attempts, 1);
        assert!(events[0].error.is_none());
        assert_eq!(events[0].result, Some(serde_json::json!("canned")));
        assert_eq!(events[0].stub.as_ref().unwrap()["failure"], "canned failure");
    }

    #[tokio::test]
    async fn test_preview_failure_rejects_with_stub_error() {
        let runner = runner_in(Mode::Preview);
        runner.set_preview_outcome(PreviewOutcome::Failure);

        let err = runner
            .simulate(
                "Preview",
                || async { Ok::<String, String>("real".into()) },
                SimulateOptions::new().stub(stub()),
            )
            .await
            .unwrap_err();

        match err {
            SimulateError::Stubbed(e) => assert_eq!(e, "canned failure"),
            other => panic!("unexpected error: {:?}", other),
        }
        let events = runner.events();
        assert_eq!(events[0].status, EventStatus::Previewed);
        assert_eq!(events[0].error.as_deref(), Some("canned failure"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_live_retries_with_doubling_backoff() {
        let runner = runner_in(Mode::Live);
        let calls = AtomicU32::new(0);
        let started = Instant::now();
        let seen: Mutex<Vec<Duration>> = Mutex::new(Vec::new());

        let outcome = runner
            .simulate(
                "Flaky",
                || {
                    let n = calls.fetch_add(1, Ordering::SeqCst);
                    seen.lock().unwrap().push(started.elapsed());
                    async move {
                        if n < 2 {
                            Err(format!("boom {}", n + 1))
                        } else {
                            Ok(42u32)
                        }
                    }
                },
                SimulateOptions::new().retries(2),
            )
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::Completed(42));
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        let seen = seen.lock().unwrap();
        assert_eq!(seen[1] - seen[0], Duration::from_millis(150));
        assert_eq!(seen[2] - seen[1], Duration::from_millis(300));

        let events = runner.events();
        let retrying: Vec<_> = events
            .iter()
            .filter(|e| e.status == EventStatus::Retrying)
            .collect();
        assert_eq!(retrying.len(), 2);
        assert_eq!(events[0].status, EventStatus::Success);
        assert_eq!(events[0].attempts, 3);
        assert_eq!(events[0].result, Some(serde_json::json!(42)));
        // newest first: retry for attempt 2, then attempt 1
        assert_eq!(events[1].attempts, 2);
        assert_eq!(events[2].attempts, 1);
        assert_eq!(events[2].error.as_deref(), Some("boom 1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_live_exhausts_retries_and_propagates() {
        let runner = runner_in(Mode::Live);

        let err = runner
            .simulate(
                "Always fails",
                || async { Err::<u32, String>("down".into()) },
                SimulateOptions::new().retries(1),
            )
            .await
            .unwrap_err();

        match err {
            SimulateError::Operation(e) => assert_eq!(e, "down"),
            other => panic!("unexpected error: {:?}", other),
        }
        let events = runner.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].status, EventStatus::Failure);
        assert_eq!(events[0].attempts, 2);
        assert_eq!(events[0].error.as_deref(), Some("down"));
        assert_eq!(events[1].status, EventStatus::Retrying);
    }

    #[tokio::test(start_paused = true)]
    async fn test_healing_swallows_final_failure() {
        let runner = runner_in(Mode::Healing);
        let calls = AtomicU32::new(0);
        let started = Instant::now();

        let outcome = runner
            .simulate(
                "Heal me",
                || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Err::<u32, String>("disk full".into()) }
                },
                SimulateOptions::new().retries(1),
            )
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::Healed);
        // same retry schedule as live: two attempts, one 150ms backoff
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(started.elapsed(), Duration::from_millis(150));

        let events = runner.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].status, EventStatus::Failure);
        assert_eq!(events[0].attempts, 2);
        assert_eq!(events[0].mode, Mode::Healing);
        assert_eq!(events[0].error.as_deref(), Some("HEALED: disk full"));
        assert_eq!(events[1].status, EventStatus::Retrying);
        assert_eq!(events[1].attempts, 1);
        assert_eq!(events[1].error.as_deref(), Some("disk full"));
    }

    #[tokio::test]
    async fn test_empty_error_message_is_replaced() {
        let runner = runner_in(Mode::Live);
        let _ = runner
            .simulate(
                "Silent",
                || async { Err::<u32, String>(String::new()) },
                SimulateOptions::new(),
            )
            .await;
        assert_eq!(
            runner.events()[0].error.as_deref(),
            Some(UNKNOWN_ERROR_MESSAGE)
        );
    }

    #[tokio::test]
    async fn test_event_log_is_capped_newest_first() {
        let runner = SimulationRunner::default();
        for i in 0..105 {
            runner
                .simulate(
                    &format!("op {}", i),
                    || async { Ok::<u32, String>(0) },
                    SimulateOptions::new(),
                )
                .await
                .unwrap();
        }
        let events = runner.events();
        assert_eq!(events.len(), DEFAULT_EVENT_CAPACITY);
        assert_eq!(events[0].id, 104);
        assert_eq!(events[0].label, "op 104");
        assert_eq!(events[99].id, 5);
    }

    #[tokio::test]
    async fn test_clear_events_keeps_counter() {
        let runner = SimulationRunner::default();
        for _ in 0..3 {
            runner
                .simulate("op", || async { Ok::<u32, String>(0) }, SimulateOptions::new())
                .await
                .unwrap();
        }
        runner.clear_events();
        assert!(runner.events().is_empty());

        runner
            .simulate("op", || async { Ok::<u32, String>(0) }, SimulateOptions::new())
            .await
            .unwrap();
        assert_eq!(runner.events()[0].id, 3);
    }

    #[tokio::test]
    async fn test_set_mode_emits_info_toast() {
        let runner = SimulationRunner::default();
        runner.set_mode(Mode::Healing);
        assert_eq!(runner.mode(), Mode::Healing);
        let toasts = runner.toasts().list();
        assert_eq!(toasts.len(), 1);
        assert_eq!(toasts[0].kind, ToastKind::Info);
        assert_eq!(toasts[0].title, "Mode Switched");
        assert_eq!(toasts[0].message, "Environment is now in HEALING mode.");
    }

    #[tokio::test]
    async fn test_mode_is_captured_at_invocation() {
        let runner = runner_in(Mode::Live);
        let switcher = runner.clone();
        let outcome = runner
            .simulate(
                "switch mid-flight",
                || {
                    switcher.set_mode(Mode::Dry);
                    async { Ok::<u32, String>(7) }
                },
                SimulateOptions::new(),
            )
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Completed(7));
        assert_eq!(runner.events()[0].mode, Mode::Live);
        assert_eq!(runner.mode(), Mode::Dry);
    }

    #[tokio::test]
    async fn test_concurrent_calls_get_unique_ids() {
        let runner = SimulationRunner::default();
        let mut handles = Vec::new();
        for i in 0..20 {
            let r = runner.clone();
            handles.push(tokio::spawn(async move {
                r.simulate(
                    &format!("task {}", i),
                    move || async move { Ok::<u32, String>(i) },
                    SimulateOptions::new(),
                )
                .await
                .map(|_| ())
                .map_err(|e| e.to_string())
            }));
        }
        for h in handles {
            h.await.unwrap().unwrap();
        }
        let mut ids: Vec<u64> = runner.events().iter().map(|e| e.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 20);
    }

    #[test]
    fn test_operation_description_is_truncated() {
        let long = "x".repeat(250);
        let described = describe_operation(&long);
        assert_eq!(described.chars().count(), OPERATION_PREVIEW_CHARS + 3);
        assert!(described.ends_with("..."));
        assert_eq!(describe_operation("short"), "short");
    }

    #[test]
    fn test_backoff_doubles() {
        let runner = SimulationRunner::default();
        assert_eq!(runner.backoff_delay(0), Duration::from_millis(150));
        assert_eq!(runner.backoff_delay(1), Duration::from_millis(300));
        assert_eq!(runner.backoff_delay(2), Duration::from_millis(600));
        // no overflow panic for absurd attempt counts
        let _ = runner.backoff_delay(64);
    }
}
