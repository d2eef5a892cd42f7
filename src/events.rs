//! Best-effort audit logging and navigation snapshots.
//!
//! Both side channels run after the dispatch result is already computed.
//! A sink that fails or panics is silenced; it can never change the
//! `LinkResult` the caller receives.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::policy::Policy;
use crate::types::{LinkContext, LinkResult, LinkType};

/// Structured audit sink. The policy's logging flag selects which of the
/// two calls the emitter uses.
pub trait LogSink: Send + Sync {
    /// One structured record: a message plus an attached field map.
    fn log_fields(&self, message: &str, fields: &Map<String, Value>);
    /// One pre-serialized JSON record.
    fn log_json(&self, record: &str);
}

/// Optional persistence sink for the last navigation action.
pub trait SnapshotSink: Send + Sync {
    /// Persist one navigation snapshot.
    fn record(&self, snapshot: &NavigationSnapshot);
}

/// Coarse outcome bucket for persisted snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultBucket {
    /// Resolution failure, missing target, or internal failure.
    Error,
    /// The handler ran and reported success.
    Ok,
    /// Blocked by policy or no handler registered.
    Warn,
}

/// Compact record of the last link action, handed to the snapshot sink.
#[derive(Debug, Clone, serde::Serialize)]
pub struct NavigationSnapshot {
    /// The action tag from the dispatch result.
    pub action: String,
    /// Bucketed outcome.
    pub bucket: ResultBucket,
    /// Contextual details, same fields as the audit record.
    pub details: Map<String, Value>,
}

/// Emits one audit record and one optional snapshot after every dispatch.
pub struct EventEmitter {
    log: Option<Arc<dyn LogSink>>,
    snapshot: Option<Arc<dyn SnapshotSink>>,
}

impl EventEmitter {
    /// An emitter with no sinks configured; `emit` becomes a no-op.
    pub fn disabled() -> Self {
        Self {
            log: None,
            snapshot: None,
        }
    }

    /// An emitter over the given sinks.
    pub fn new(log: Option<Arc<dyn LogSink>>, snapshot: Option<Arc<dyn SnapshotSink>>) -> Self {
        Self { log, snapshot }
    }

    /// Emit the audit record and snapshot for one completed dispatch.
    /// Sink panics are caught and discarded.
    pub fn emit(
        &self,
        ctx: &LinkContext,
        link_type: LinkType,
        result: &LinkResult,
        policy: &Policy,
    ) {
        let fields = audit_fields(ctx, link_type, result);

        if let Some(log) = &self.log {
            if policy.logging.structured {
                let _ = catch_unwind(AssertUnwindSafe(|| {
                    log.log_fields("link dispatched", &fields);
                }));
            } else if let Ok(record) = serde_json::to_string(&Value::Object(fields.clone())) {
                let _ = catch_unwind(AssertUnwindSafe(|| log.log_json(&record)));
            }
        }

        if let Some(sink) = &self.snapshot {
            let snapshot = NavigationSnapshot {
                action: result.action.clone(),
                bucket: bucket_for(result),
                details: fields,
            };
            let _ = catch_unwind(AssertUnwindSafe(|| sink.record(&snapshot)));
        }
    }
}

/// The audit field map shared by the log record and the snapshot details.
fn audit_fields(ctx: &LinkContext, link_type: LinkType, result: &LinkResult) -> Map<String, Value> {
    let mut fields = Map::new();
    if let Some(session_id) = ctx.session_id() {
        fields.insert("session_id".to_string(), Value::String(session_id.to_string()));
    }
    fields.insert("href".to_string(), Value::String(ctx.href.clone()));
    fields.insert(
        "link_type".to_string(),
        Value::String(link_type.as_str().to_string()),
    );
    fields.insert("action".to_string(), Value::String(result.action.clone()));
    fields.insert("success".to_string(), Value::Bool(result.success));
    if let Some(kind) = result.error_kind {
        fields.insert(
            "error_kind".to_string(),
            Value::String(kind.as_str().to_string()),
        );
    }
    if !ctx.source.is_empty() {
        fields.insert("source".to_string(), Value::String(ctx.source.clone()));
    }
    fields
}

/// ok on success, warn for policy/registration outcomes, error otherwise.
fn bucket_for(result: &LinkResult) -> ResultBucket {
    use crate::types::ErrorKind;

    if result.success {
        return ResultBucket::Ok;
    }
    match result.error_kind {
        Some(ErrorKind::SecurityBlocked | ErrorKind::Unsupported) => ResultBucket::Warn,
        _ => ResultBucket::Error,
    }
}

/// `LogSink` over the `tracing` ecosystem. Emits `info` events on the
/// `linkgate::audit` target so hosts can route or filter them with their
/// usual subscriber configuration.
pub struct TracingLogSink;

impl LogSink for TracingLogSink {
    fn log_fields(&self, message: &str, fields: &Map<String, Value>) {
        // Bound to a local: the macro grammar can't take a path expression
        // directly after `%`.
        let rendered = Value::Object(fields.clone());
        tracing::info!(target: "linkgate::audit", fields = %rendered, "{message}");
    }

    fn log_json(&self, record: &str) {
        tracing::info!(target: "linkgate::audit", "{record}");
    }
}
