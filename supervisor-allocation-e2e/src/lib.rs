//! Drives the HTTP service in-process, without binding a socket.

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use supervisor_allocation_backend::caller::CALLER_HEADER;
use supervisor_allocation_backend::error::AppError;
use supervisor_allocation_backend::{router, setup_state};
use supervisor_allocation_config::Config;
use tower::ServiceExt as _;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

#[derive(Clone)]
pub struct TestClient {
    router: Router,
}

impl TestClient {
    /// Builds the service like the server binary does, from `config`.
    pub async fn start(config: &Config) -> std::result::Result<Self, AppError> {
        Ok(Self {
            router: router(setup_state(config).await?),
        })
    }

    /// Sends one request as `caller` and returns the status and the JSON body, `Value::Null`
    /// for an empty body.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        caller: Option<&str>,
        body: Option<Value>,
    ) -> Result<(StatusCode, Value)> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(caller) = caller {
            builder = builder.header(CALLER_HEADER, caller);
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body)?))?,
            None => builder.body(Body::empty())?,
        };

        let response = unwrap_infallible(self.router.clone().oneshot(request).await);
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)?
        };
        Ok((status, value))
    }

    pub async fn get(&self, uri: &str, caller: Option<&str>) -> Result<(StatusCode, Value)> {
        self.request(Method::GET, uri, caller, None).await
    }

    pub async fn post(&self, uri: &str, caller: &str, body: Value) -> Result<(StatusCode, Value)> {
        self.request(Method::POST, uri, Some(caller), Some(body)).await
    }

    pub async fn put(&self, uri: &str, caller: &str, body: Value) -> Result<(StatusCode, Value)> {
        self.request(Method::PUT, uri, Some(caller), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, caller: &str) -> Result<(StatusCode, Value)> {
        self.request(Method::DELETE, uri, Some(caller), None).await
    }
}

fn unwrap_infallible<T>(result: std::result::Result<T, core::convert::Infallible>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => match err {},
    }
}
