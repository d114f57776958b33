use async_trait::async_trait;

/// Produces short natural-language bullets from a free-text prompt.
///
/// Implementations never fail from the caller's point of view: any failure
/// is converted into a small fixed set of fallback bullets.
#[async_trait]
pub trait InsightGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Vec<String>;
    fn name(&self) -> &str;
}
