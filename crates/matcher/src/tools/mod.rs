//! Uniform Tool Gateway
//!
//! Every external capability (web search, directory extraction, scholarly
//! lookup, CV parsing, text generation) is reached through a single
//! `invoke(service, operation, args)` contract. The gateway owns no
//! business logic and never raises: any transport or tool failure is
//! logged and degraded to an empty value.

mod gateway;
mod mock;
mod toolset;

pub use gateway::HttpToolGateway;
pub use mock::MockToolGateway;
pub use toolset::ToolSet;

use async_trait::async_trait;
use serde_json::Value;

/// External services reachable through the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceId {
    /// Web search provider
    Search,
    /// University directory and page extraction provider
    University,
    /// Scholarly-graph lookup provider
    Scholar,
    /// Document (CV) parsing provider
    Document,
    /// Text-generation oracle
    Oracle,
}

impl ServiceId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceId::Search => "search",
            ServiceId::University => "university",
            ServiceId::Scholar => "scholar",
            ServiceId::Document => "document",
            ServiceId::Oracle => "oracle",
        }
    }
}

/// Uniform invoke contract for external tools.
///
/// The returned value is a decoded structured result (object, array, or
/// scalar) or, on any failure, an empty object. Callers must treat a
/// non-matching result shape as "no data", not as an error.
#[async_trait]
pub trait ToolGateway: Send + Sync {
    async fn invoke(&self, service: ServiceId, operation: &str, args: Value) -> Value;
}
