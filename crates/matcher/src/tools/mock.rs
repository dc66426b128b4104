//! Mock tool gateway for tests
//!
//! Responses are registered per operation, optionally keyed on a needle
//! matched against the serialized arguments so concurrent fan-outs get
//! deterministic answers regardless of completion order. Unregistered
//! operations answer with the gateway's failure sentinel (`{}`).

use super::{ServiceId, ToolGateway};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
pub struct MockToolGateway {
    responses: HashMap<String, Value>,
    keyed: Vec<(String, String, Value)>,
    calls: Mutex<Vec<(ServiceId, String, Value)>>,
}

impl MockToolGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default response for an operation.
    pub fn with_response(mut self, operation: &str, response: Value) -> Self {
        self.responses.insert(operation.to_string(), response);
        self
    }

    /// Response used when the serialized arguments contain `needle`.
    /// Keyed responses take precedence over the operation default.
    pub fn with_keyed_response(mut self, operation: &str, needle: &str, response: Value) -> Self {
        self.keyed
            .push((operation.to_string(), needle.to_string(), response));
        self
    }

    /// Arguments seen for an operation, in call order.
    pub fn calls_for(&self, operation: &str) -> Vec<Value> {
        self.calls
            .lock()
            .expect("call log poisoned")
            .iter()
            .filter(|(_, op, _)| op == operation)
            .map(|(_, _, args)| args.clone())
            .collect()
    }

    pub fn call_count(&self, operation: &str) -> usize {
        self.calls_for(operation).len()
    }
}

#[async_trait]
impl ToolGateway for MockToolGateway {
    async fn invoke(&self, service: ServiceId, operation: &str, args: Value) -> Value {
        self.calls
            .lock()
            .expect("call log poisoned")
            .push((service, operation.to_string(), args.clone()));

        let serialized = args.to_string();
        for (op, needle, response) in &self.keyed {
            if op == operation && serialized.contains(needle.as_str()) {
                return response.clone();
            }
        }

        self.responses
            .get(operation)
            .cloned()
            .unwrap_or_else(|| json!({}))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn keyed_responses_win_over_defaults() {
        let gateway = MockToolGateway::new()
            .with_response("search_scholar", json!([]))
            .with_keyed_response("search_scholar", "Jane Doe", json!([{"author_id": "j1"}]));

        let keyed = gateway
            .invoke(ServiceId::Scholar, "search_scholar", json!({"name": "Jane Doe"}))
            .await;
        assert_eq!(keyed[0]["author_id"], "j1");

        let default = gateway
            .invoke(ServiceId::Scholar, "search_scholar", json!({"name": "John Roe"}))
            .await;
        assert_eq!(default, json!([]));

        assert_eq!(gateway.call_count("search_scholar"), 2);
    }

    #[tokio::test]
    async fn unregistered_operations_answer_with_failure_sentinel() {
        let gateway = MockToolGateway::new();
        let result = gateway
            .invoke(ServiceId::Search, "search_web", json!({"query": "x"}))
            .await;
        assert_eq!(result, json!({}));
    }
}
