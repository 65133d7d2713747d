//! Retry wrapper — per-call timeout with a single bounded retry.
//!
//! Wraps a provider so that each external call gets one timed attempt and at
//! most one retry. The retry is only permitted before any output has been
//! produced: `complete()` and `embed()` retry once on failure; `stream()`
//! retries only while no token chunk has been delivered downstream. Once a
//! chunk has been handed to the caller, a failure is terminal — retrying
//! after partial output would risk duplicated or inconsistent text.
//!
//! For streams the timeout covers stream-open and time-to-first-token; once
//! tokens are flowing the stream is allowed to take as long as it takes.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::warn;

use waypoint_core::error::ProviderError;
use waypoint_core::provider::*;

/// A provider wrapper enforcing timeouts and a single pre-output retry.
pub struct RetryProvider {
    inner: Arc<dyn waypoint_core::Provider>,
    timeout: Duration,
}

impl RetryProvider {
    pub fn new(inner: Arc<dyn waypoint_core::Provider>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    async fn open_stream(
        &self,
        request: CompletionRequest,
    ) -> std::result::Result<mpsc::Receiver<std::result::Result<TokenChunk, ProviderError>>, ProviderError>
    {
        match tokio::time::timeout(self.timeout, self.inner.stream(request)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(format!(
                "Provider '{}' stream open timed out after {}s",
                self.inner.name(),
                self.timeout.as_secs()
            ))),
        }
    }
}

#[async_trait]
impl waypoint_core::Provider for RetryProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> std::result::Result<CompletionResponse, ProviderError> {
        let mut last_error = None;

        for attempt in 1..=2u32 {
            match tokio::time::timeout(self.timeout, self.inner.complete(request.clone())).await {
                Ok(Ok(response)) => return Ok(response),
                Ok(Err(e)) => {
                    warn!(provider = %self.inner.name(), attempt, error = %e, "Completion attempt failed");
                    last_error = Some(e);
                }
                Err(_) => {
                    warn!(provider = %self.inner.name(), attempt, "Completion attempt timed out");
                    last_error = Some(ProviderError::Timeout(format!(
                        "Provider '{}' timed out after {}s",
                        self.inner.name(),
                        self.timeout.as_secs()
                    )));
                }
            }
        }

        Err(last_error.expect("at least one attempt was made"))
    }

    async fn stream(
        &self,
        request: CompletionRequest,
    ) -> std::result::Result<mpsc::Receiver<std::result::Result<TokenChunk, ProviderError>>, ProviderError>
    {
        // Opening the stream failed outright: one retry, no output exists yet.
        let inner_rx = match self.open_stream(request.clone()).await {
            Ok(rx) => rx,
            Err(e) => {
                warn!(provider = %self.inner.name(), error = %e, "Stream open failed, retrying once");
                self.open_stream(request.clone()).await?
            }
        };

        let (tx, rx) = mpsc::channel(64);
        let inner = self.inner.clone();
        let timeout = self.timeout;

        tokio::spawn(async move {
            let mut inner_rx = inner_rx;
            let mut delivered = false;
            let mut retried = false;

            loop {
                let item = if delivered {
                    inner_rx.recv().await
                } else {
                    match tokio::time::timeout(timeout, inner_rx.recv()).await {
                        Ok(item) => item,
                        Err(_) => Some(Err(ProviderError::Timeout(format!(
                            "Provider '{}' produced no output within {}s",
                            inner.name(),
                            timeout.as_secs()
                        )))),
                    }
                };

                match item {
                    Some(Ok(chunk)) => {
                        let done = chunk.done;
                        delivered = true;
                        if tx.send(Ok(chunk)).await.is_err() {
                            // Caller went away — stop consuming the provider.
                            return;
                        }
                        if done {
                            return;
                        }
                    }
                    Some(Err(e)) if !delivered && !retried => {
                        warn!(error = %e, "Stream failed before first token, retrying once");
                        retried = true;
                        match tokio::time::timeout(timeout, inner.stream(request.clone())).await {
                            Ok(Ok(new_rx)) => inner_rx = new_rx,
                            Ok(Err(e)) => {
                                let _ = tx.send(Err(e)).await;
                                return;
                            }
                            Err(_) => {
                                let _ = tx
                                    .send(Err(ProviderError::Timeout(format!(
                                        "Provider '{}' stream retry timed out",
                                        inner.name()
                                    ))))
                                    .await;
                                return;
                            }
                        }
                    }
                    Some(Err(e)) => {
                        // Mid-stream failure (or retry exhausted): terminal.
                        let _ = tx.send(Err(e)).await;
                        return;
                    }
                    None => {
                        // Provider closed without a done chunk.
                        let _ = tx
                            .send(Err(ProviderError::StreamInterrupted(
                                "provider stream closed unexpectedly".into(),
                            )))
                            .await;
                        return;
                    }
                }
            }
        });

        Ok(rx)
    }

    async fn embed(
        &self,
        request: EmbeddingRequest,
    ) -> std::result::Result<EmbeddingResponse, ProviderError> {
        match tokio::time::timeout(self.timeout, self.inner.embed(request.clone())).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) => {
                warn!(provider = %self.inner.name(), error = %e, "Embedding attempt failed, retrying once");
                tokio::time::timeout(self.timeout, self.inner.embed(request))
                    .await
                    .map_err(|_| {
                        ProviderError::Timeout(format!(
                            "Provider '{}' embedding timed out",
                            self.inner.name()
                        ))
                    })?
            }
            Err(_) => {
                warn!(provider = %self.inner.name(), "Embedding attempt timed out, retrying once");
                tokio::time::timeout(self.timeout, self.inner.embed(request))
                    .await
                    .map_err(|_| {
                        ProviderError::Timeout(format!(
                            "Provider '{}' embedding timed out",
                            self.inner.name()
                        ))
                    })?
            }
        }
    }
}
