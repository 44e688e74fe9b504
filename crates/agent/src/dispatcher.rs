//! Dispatcher: resolves a parsed call against the run's tool snapshot and
//! invokes it through the registry.

use planloop_core::error::ToolError;
use planloop_core::event::{DomainEvent, EventBus};
use planloop_core::tool::{ToolCallResult, ToolDescriptor, ToolRegistry};
use planloop_protocol::ParsedCall;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct Dispatcher {
    registry: Arc<dyn ToolRegistry>,
    event_bus: Option<Arc<EventBus>>,
}

impl Dispatcher {
    pub fn new(registry: Arc<dyn ToolRegistry>) -> Self {
        Self {
            registry,
            event_bus: None,
        }
    }

    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    /// Run `call` if its tool is in `snapshot`.
    ///
    /// Names match exactly. Every invocation failure comes back as
    /// `NotFound` or `ExecutionFailed`; the detail text of an
    /// `ExecutionFailed` from the registry is kept as is.
    pub async fn execute(
        &self,
        call: ParsedCall,
        snapshot: &[ToolDescriptor],
        raw_response: &str,
    ) -> Result<ToolCallResult, ToolError> {
        if !snapshot.iter().any(|t| t.name == call.tool_name) {
            warn!(tool = %call.tool_name, "Tool not in registry snapshot");
            return Err(ToolError::NotFound(call.tool_name));
        }

        debug!(tool = %call.tool_name, arguments = ?call.arguments, "Dispatching tool call");

        let start = std::time::Instant::now();
        let outcome = self.registry.invoke(&call.tool_name, &call.arguments).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        if let Some(bus) = &self.event_bus {
            bus.publish(DomainEvent::ToolExecuted {
                tool_name: call.tool_name.clone(),
                success: outcome.is_ok(),
                duration_ms,
                timestamp: chrono::Utc::now(),
            });
        }

        match outcome {
            Ok(result) => Ok(ToolCallResult {
                tool_name: call.tool_name,
                arguments: call.arguments,
                result,
                raw_response: raw_response.to_string(),
            }),
            Err(e) => {
                warn!(tool = %call.tool_name, error = %e, "Tool execution failed");
                Err(match e {
                    ToolError::NotFound(name) => ToolError::NotFound(name),
                    failed @ ToolError::ExecutionFailed { .. } => failed,
                    other => ToolError::ExecutionFailed {
                        tool_name: call.tool_name,
                        reason: other.to_string(),
                    },
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{AddTool, ConstTool, RecordingRegistry};
    use planloop_core::{Arguments, Value};

    fn registry() -> Arc<RecordingRegistry> {
        Arc::new(RecordingRegistry::new(vec![
            Box::new(AddTool),
            Box::new(ConstTool {
                name: "get_current_time",
                value: Value::from("2026-10-16 09:00:00"),
            }),
        ]))
    }

    fn add_call() -> ParsedCall {
        ParsedCall::new(
            "add",
            Arguments::from([
                ("a".to_string(), Value::Int(5)),
                ("b".to_string(), Value::Int(3)),
            ]),
        )
    }

    #[tokio::test]
    async fn resolves_exact_name() {
        let registry = registry();
        let snapshot = registry.list_tools().await.unwrap();
        let dispatcher = Dispatcher::new(registry.clone());

        let result = dispatcher
            .execute(add_call(), &snapshot, "FUNCTION_CALL: add|a=5|b=3")
            .await
            .unwrap();

        assert_eq!(result.tool_name, "add");
        assert_eq!(result.result, Value::Int(8));
        assert_eq!(result.raw_response, "FUNCTION_CALL: add|a=5|b=3");

        let invocations = registry.invocations();
        assert_eq!(invocations.len(), 1);
        assert_eq!(invocations[0].0, "add");
        assert_eq!(invocations[0].1, add_call().arguments);
    }

    #[tokio::test]
    async fn unknown_name_is_not_found_and_never_invoked() {
        let registry = registry();
        let snapshot = registry.list_tools().await.unwrap();
        let dispatcher = Dispatcher::new(registry.clone());

        let err = dispatcher
            .execute(ParsedCall::new("multiply", Arguments::new()), &snapshot, "")
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::NotFound(ref name) if name == "multiply"));

        let err = dispatcher
            .execute(ParsedCall::new("Add", Arguments::new()), &snapshot, "")
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)));

        assert!(registry.invocations().is_empty());
    }

    #[tokio::test]
    async fn snapshot_bounds_resolution() {
        // Registered but absent from this run's snapshot
        let registry = registry();
        let snapshot = vec![ToolDescriptor::new("get_current_time", None)];
        let dispatcher = Dispatcher::new(registry.clone());

        let err = dispatcher.execute(add_call(), &snapshot, "").await.unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)));
        assert!(registry.invocations().is_empty());
    }

    #[tokio::test]
    async fn tool_failure_becomes_execution_failed() {
        let registry = registry();
        let snapshot = registry.list_tools().await.unwrap();
        let dispatcher = Dispatcher::new(registry);

        let call = ParsedCall::new(
            "add",
            Arguments::from([("a".to_string(), Value::from("five"))]),
        );
        let err = dispatcher.execute(call, &snapshot, "").await.unwrap_err();
        match err {
            ToolError::ExecutionFailed { tool_name, reason } => {
                assert_eq!(tool_name, "add");
                assert!(reason.contains("'a' is not an integer"));
            }
            other => panic!("expected ExecutionFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn publishes_tool_executed() {
        let registry = registry();
        let snapshot = registry.list_tools().await.unwrap();
        let bus = Arc::new(EventBus::default());
        let mut rx = bus.subscribe();
        let dispatcher = Dispatcher::new(registry).with_event_bus(bus);

        dispatcher.execute(add_call(), &snapshot, "").await.unwrap();

        match rx.recv().await.unwrap().as_ref() {
            DomainEvent::ToolExecuted {
                tool_name, success, ..
            } => {
                assert_eq!(tool_name, "add");
                assert!(success);
            }
            other => panic!("expected ToolExecuted, got {other:?}"),
        }
    }
}
