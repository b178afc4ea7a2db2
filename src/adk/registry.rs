// SPDX-License-Identifier: MIT

use crate::adk::error::MeteoError;
use crate::adk::tool::Tool;
use std::collections::HashMap;
use std::sync::Arc;

/// The fixed set of tools an agent may call.
///
/// Filled once at startup and shared read-only afterwards. Registration
/// order is kept so the prompt's tool catalog is stable.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    /// HashMap for O(1) tool lookups
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<(), MeteoError> {
        let name = tool.name().to_string();
        if self.index.contains_key(&name) {
            return Err(MeteoError::duplicate_tool(name));
        }
        self.index.insert(name, self.tools.len());
        self.tools.push(tool);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.index.get(name).map(|&i| &self.tools[i])
    }

    /// Tool names in registration order
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    /// One `name: description` line per tool
    pub fn catalog(&self) -> String {
        self.tools
            .iter()
            .map(|t| format!("{}: {}", t.name(), t.description()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    /// A mock tool for testing
    struct MockTool {
        name: String,
        description: String,
    }

    impl MockTool {
        fn new(name: &str) -> Self {
            Self {
                name: name.to_string(),
                description: format!("Mock tool: {}", name),
            }
        }
    }

    #[async_trait]
    impl Tool for MockTool {
        fn name(&self) -> &str {
            &self.name
        }

        fn description(&self) -> &str {
            &self.description
        }

        async fn invoke(&self, input: &str) -> String {
            format!("{} got {}", self.name, input)
        }
    }

    #[tokio::test]
    async fn test_register_and_get_tool() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(MockTool::new("test_tool"))).unwrap();

        let retrieved = registry.get("test_tool").unwrap();
        assert_eq!(retrieved.name(), "test_tool");
        assert_eq!(retrieved.invoke("x").await, "test_tool got x");
    }

    #[test]
    fn test_get_nonexistent_tool() {
        let registry = ToolRegistry::new();
        assert!(registry.get("nonexistent").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_register_rejects_duplicate_names() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(MockTool::new("same_name"))).unwrap();

        let err = registry
            .register(Arc::new(MockTool::new("same_name")))
            .unwrap_err();
        assert!(matches!(err, MeteoError::DuplicateTool { ref name } if name == "same_name"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_catalog_keeps_registration_order() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(MockTool::new("tool2"))).unwrap();
        registry.register(Arc::new(MockTool::new("tool1"))).unwrap();

        assert_eq!(registry.names(), vec!["tool2", "tool1"]);
        assert_eq!(
            registry.catalog(),
            "tool2: Mock tool: tool2\ntool1: Mock tool: tool1"
        );
    }

    #[test]
    fn test_registry_is_clone() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(MockTool::new("tool1"))).unwrap();

        let cloned = registry.clone();
        assert!(cloned.get("tool1").is_some());
    }
}
