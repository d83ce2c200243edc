//! Cleanup handle that releases tool resources.

use std::sync::Arc;

use async_trait::async_trait;
use runloop_core::Cleanup;
use runloop_tools::ToolCollection;

/// Runs `cleanup` on every tool of a collection.
#[derive(Debug, Clone)]
pub struct ToolCleanup {
    tools: Arc<ToolCollection>,
}

impl ToolCleanup {
    pub fn new(tools: Arc<ToolCollection>) -> Self {
        Self { tools }
    }
}

#[async_trait]
impl Cleanup for ToolCleanup {
    async fn cleanup(&self) {
        tracing::debug!(tools = self.tools.len(), "cleaning up tools");
        self.tools.cleanup_all().await;
    }
}
