use async_trait::async_trait;
use reqwest::{Request, Response};

/// Executes prepared requests. Lets callers layer headers or swap transports.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}
