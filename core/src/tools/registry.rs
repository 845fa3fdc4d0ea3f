use super::error::{ToolError, ToolResult};
use super::native::{math_tools, ToUpperCaseTool};
use super::traits::{Tool, ToolSpec};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Table of locally callable tools.
///
/// Built once at start-up through [`ToolRegistryBuilder`] and read-only
/// afterwards, so clones share the table without any locking.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Arc<HashMap<String, Arc<dyn Tool>>>,
}

#[derive(Default)]
pub struct ToolRegistryBuilder {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistryBuilder {
    /// Register a tool; a later registration under the same name wins
    pub fn register(mut self, tool: Arc<dyn Tool>) -> Self {
        let name = tool.name();
        info!(target: "tool_registry", tool = %name, "Registering tool");
        if self.tools.insert(name.clone(), tool).is_some() {
            warn!(target: "tool_registry", tool = %name, "Replaced previously registered tool");
        }
        self
    }

    pub fn register_all(self, tools: impl IntoIterator<Item = Arc<dyn Tool>>) -> Self {
        tools.into_iter().fold(self, |b, t| b.register(t))
    }

    pub fn build(self) -> ToolRegistry {
        ToolRegistry {
            tools: Arc::new(self.tools),
        }
    }
}

impl ToolRegistry {
    pub fn builder() -> ToolRegistryBuilder {
        ToolRegistryBuilder::default()
    }

    /// Registry holding the arithmetic tools and `toUpperCase`
    pub fn with_builtin_tools() -> Self {
        Self::builder()
            .register_all(math_tools())
            .register(Arc::new(ToUpperCaseTool))
            .build()
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Tool declarations for the model, sorted by name
    pub fn specs(&self) -> Vec<ToolSpec> {
        let mut specs: Vec<ToolSpec> = self.tools.values().map(|t| ToolSpec::of(t.as_ref())).collect();
        specs.sort_by(|a, b| a.name.cmp(&b.name));
        specs
    }

    /// Call a tool by name. Unknown names fail before anything runs.
    #[tracing::instrument(skip(self, arguments), fields(tool.name = %name))]
    pub async fn call(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> ToolResult<serde_json::Value> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;

        debug!(target: "tool_registry", tool = %name, args = %arguments, "Invoking tool");
        let started = Instant::now();
        let result = tool.call(arguments).await;
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

        match &result {
            Ok(v) => {
                debug!(target: "tool_registry", tool = %name, result = %v, latency_ms = %elapsed_ms, "Tool finished")
            }
            Err(e) => {
                warn!(target: "tool_registry", tool = %name, error = %e, "Tool execution failed")
            }
        }
        result
    }
}
