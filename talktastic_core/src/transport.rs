//! The seam between the conversation pipeline and the network.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::codec::OutboundPayload;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("HTTP error! status: {status}")]
    Status { status: u16 },

    #[error("Network error: {0}")]
    Network(String),
}

/// One best-effort POST of a payload to the agent endpoint.
///
/// Implementations return the raw body of any 2xx response unparsed and
/// never retry.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post(&self, endpoint: &str, payload: &OutboundPayload)
    -> Result<String, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn post(
        &self,
        endpoint: &str,
        payload: &OutboundPayload,
    ) -> Result<String, TransportError> {
        (**self).post(endpoint, payload).await
    }
}
