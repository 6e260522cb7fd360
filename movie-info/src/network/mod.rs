pub mod request;
pub mod session;
mod surf_transport;

pub use surf_transport::SurfTransport;

use crate::error::{DecodeError, Error, ErrorContext, Result, TransportError};
use async_trait::async_trait;
use request::Request;
use std::sync::Arc;

/// Performs HTTP exchanges on behalf of the library.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends `request` and returns the body of a successful response.
    async fn fetch(&self, request: &Request) -> std::result::Result<Vec<u8>, TransportError>;
}

/// Turns a response body into a value.
pub trait Mapper: Send + Sync {
    type Output;

    fn map(&self, bytes: &[u8]) -> std::result::Result<Self::Output, DecodeError>;
}

/// Transport plus response decoding, reporting failures as [`Error`].
#[derive(Clone)]
pub struct Network {
    transport: Arc<dyn Transport>,
}

impl Network {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub async fn request<M: Mapper>(
        &self,
        request: &Request,
        mapper: &M,
        context: ErrorContext,
    ) -> Result<M::Output> {
        let bytes = self
            .transport
            .fetch(request)
            .await
            .map_err(|err| Error::transport(context.clone(), err))?;

        mapper
            .map(&bytes)
            .map_err(|err| Error::decode(context, err))
    }
}
