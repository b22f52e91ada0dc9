use super::client::HttpClient;
use async_trait::async_trait;
use std::time::Duration;

/// Plain reqwest-backed [`HttpClient`] with the timeouts every outbound call uses.
pub struct BasicClient(reqwest::Client);

impl BasicClient {
    pub fn new(user_agent: &str) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self(client))
    }
}

#[async_trait]
impl HttpClient for BasicClient {
    async fn execute(&self, req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        self.0.execute(req).await
    }
}
