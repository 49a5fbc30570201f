use std::net::SocketAddr;

use axum::{
    body::Bytes,
    extract::{ConnectInfo, FromRequest, FromRequestParts, Request, rejection::JsonRejection},
    http::request::Parts,
    Json,
};
use serde::{Deserialize, de::DeserializeOwned};

use super::error::ApiError;
use super::types::FieldError;
use crate::services::Upload;

/// `Json` whose rejections use the error envelope.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(json_rejection(&rejection)),
        }
    }
}

fn json_rejection(rejection: &JsonRejection) -> ApiError {
    ApiError::Validation(vec![FieldError::general(rejection.body_text())])
}

/// Client address used for spam keys: the first `X-Forwarded-For` entry,
/// then the socket peer, then `unknown`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(pub String);

impl<S: Send + Sync> FromRequestParts<S> for ClientIp {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let forwarded = parts
            .headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());

        if let Some(ip) = forwarded {
            return Ok(Self(ip.to_string()));
        }

        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string());

        Ok(Self(peer.unwrap_or_else(|| "unknown".to_string())))
    }
}

/// Body cap for raw-body upload routes, above axum's 2 MiB default.
pub const UPLOAD_BODY_LIMIT: usize = 25 * 1024 * 1024;

/// `?filename=` of raw-body uploads.
#[derive(Debug, Default, Deserialize)]
pub struct UploadQuery {
    pub filename: Option<String>,
    pub description: Option<String>,
}

impl UploadQuery {
    /// Pairs the query with the request body.
    ///
    /// # Errors
    ///
    /// A missing file name or an empty body is a validation error.
    pub fn into_upload(self, body: Bytes) -> Result<Upload, ApiError> {
        let mut errors = Vec::new();
        let filename = self.filename.filter(|f| !f.trim().is_empty());
        if filename.is_none() {
            errors.push(FieldError::at("filename", super::validation::REQUIRED));
        }
        if body.is_empty() {
            errors.push(FieldError::at("file", "The submitted file is empty."));
        }

        match filename {
            Some(filename) if errors.is_empty() => Ok(Upload {
                filename,
                bytes: body.to_vec(),
            }),
            _ => Err(ApiError::Validation(errors)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request as HttpRequest;

    async fn client_ip(request: HttpRequest<()>) -> String {
        let (mut parts, ()) = request.into_parts();
        let ClientIp(ip) = ClientIp::from_request_parts(&mut parts, &()).await.unwrap();
        ip
    }

    #[tokio::test]
    async fn forwarded_for_wins() {
        let request = HttpRequest::builder()
            .header("x-forwarded-for", "10.0.0.7, 172.16.0.1")
            .body(())
            .unwrap();
        assert_eq!(client_ip(request).await, "10.0.0.7");
    }

    #[tokio::test]
    async fn peer_then_unknown() {
        let mut request = HttpRequest::builder().body(()).unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([192, 168, 1, 4], 5050))));
        assert_eq!(client_ip(request).await, "192.168.1.4");

        let request = HttpRequest::builder().body(()).unwrap();
        assert_eq!(client_ip(request).await, "unknown");
    }

    #[test]
    fn upload_needs_name_and_bytes() {
        let query = UploadQuery::default();
        let Err(ApiError::Validation(errors)) = query.into_upload(Bytes::new()) else {
            panic!("expected validation error");
        };
        assert_eq!(errors.len(), 2);

        let query = UploadQuery {
            filename: Some("a.png".into()),
            description: None,
        };
        let upload = query.into_upload(Bytes::from_static(b"png")).unwrap();
        assert_eq!(upload.filename, "a.png");
    }
}
