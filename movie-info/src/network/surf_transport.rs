use super::request::{Method, Request};
use super::Transport;
use crate::error::TransportError;
use ::utils::surf_logging::SurfLogging;
use async_trait::async_trait;
use surf::{Client, Url};

/// [`Transport`] backed by a surf client.
#[derive(Clone)]
pub struct SurfTransport {
    http: Client,
}

impl Default for SurfTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl SurfTransport {
    pub fn new() -> Self {
        Self::with_client(Client::new())
    }

    /// Uses `client` with request logging added on top.
    pub fn with_client(client: Client) -> Self {
        Self {
            http: client.with(SurfLogging),
        }
    }
}

fn surf_method(method: Method) -> surf::http::Method {
    match method {
        Method::Get => surf::http::Method::Get,
    }
}

#[async_trait]
impl Transport for SurfTransport {
    async fn fetch(&self, request: &Request) -> Result<Vec<u8>, TransportError> {
        let url = Url::parse(&request.full_url()).map_err(|err| TransportError::InvalidUrl {
            url: request.url().clone(),
            message: err.to_string(),
        })?;

        let mut builder = surf::RequestBuilder::new(surf_method(request.method()), url);
        for (name, value) in request.headers() {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let connection_error = |message: String| TransportError::Connection {
            url: request.url().clone(),
            message,
        };

        let mut response = tokio::time::timeout(request.timeout(), self.http.send(builder.build()))
            .await
            .map_err(|_| connection_error(format!("timed out after {:?}", request.timeout())))?
            .map_err(|err| connection_error(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                url: request.url().clone(),
                status: status.into(),
            });
        }

        response
            .body_bytes()
            .await
            .map_err(|err| connection_error(err.to_string()))
    }
}
