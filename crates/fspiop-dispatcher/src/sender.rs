//! Outbound callback delivery over HTTP.

use std::time::Duration;

use async_trait::async_trait;

use fspiop_core::{
    CallbackSender, FspiopError, HttpMethod, OutboundRequest, HDR_DESTINATION, HDR_SOURCE,
};

/// Delivers callbacks over a shared [`reqwest::Client`]. No retries; a
/// failed delivery is reported to the caller and counted there.
pub struct HttpCallbackSender {
    client: reqwest::Client,
}

impl HttpCallbackSender {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Client configured for callback traffic: bounded total time, no
    /// redirect following (a redirected callback is a misconfigured
    /// participant endpoint, not something to chase).
    pub fn build_client(timeout: Duration) -> Result<reqwest::Client, FspiopError> {
        reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| FspiopError::Internal(format!("http client init: {e}")))
    }
}

#[async_trait]
impl CallbackSender for HttpCallbackSender {
    async fn send_request(&self, request: OutboundRequest) -> Result<(), FspiopError> {
        let mut headers = request.headers.clone();
        if let Some(source) = &request.source {
            headers.set(HDR_SOURCE, source);
        }
        if let Some(destination) = &request.destination {
            headers.set(HDR_DESTINATION, destination);
        }

        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self.client.post(&request.url),
            HttpMethod::Put => self.client.put(&request.url),
        };
        for (name, value) in headers.iter() {
            builder = builder.header(name, value);
        }
        if let Some(payload) = &request.payload {
            builder = builder.json(payload);
        }

        let response = builder.send().await.map_err(|e| {
            tracing::error!(url = %request.url, error = %e, "outbound callback failed");
            FspiopError::Transport(format!("callback delivery failed: {e}"))
        })?;

        if !response.status().is_success() {
            tracing::error!(
                url = %request.url,
                status = %response.status(),
                "outbound callback rejected"
            );
            return Err(FspiopError::Transport(format!(
                "callback rejected with status {}",
                response.status()
            )));
        }

        tracing::debug!(
            url = %request.url,
            method = request.method.as_str(),
            "callback delivered"
        );
        Ok(())
    }
}
