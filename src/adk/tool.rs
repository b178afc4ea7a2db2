use async_trait::async_trait;

/// Trait for tools that can be called by agents.
///
/// Tools speak plain text in both directions: the agent hands over whatever
/// followed `Action Input:` and feeds the returned string back to the model
/// as the observation. A tool never fails upward; any failure it meets is
/// described in the returned text instead.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Returns the tool name (must be unique within a registry)
    fn name(&self) -> &str;

    /// Returns a concise description of when the tool applies. Rendered
    /// verbatim into the prompt.
    fn description(&self) -> &str;

    /// Run the tool on the given input
    async fn invoke(&self, input: &str) -> String;
}
