use anyhow::Result;
use http_body_util::{BodyExt, Full};
use hyper::{body::Bytes, Method, Request, Response, StatusCode};
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

#[derive(Clone)]
pub struct TestClient {
    base_url: String,
    client: Client<hyper_util::client::legacy::connect::HttpConnector, Full<Bytes>>,
}

/// Request options: bearer token and/or raw Cookie header
#[derive(Default)]
pub struct RequestAuth<'a> {
    pub bearer: Option<&'a str>,
    pub cookie: Option<&'a str>,
}

impl TestClient {
    pub fn new(base_url: &str) -> Self {
        let client = Client::builder(TokioExecutor::new()).build_http();
        Self {
            base_url: base_url.to_string(),
            client,
        }
    }

    pub async fn get(&self, path: &str) -> Result<ApiResponse> {
        self.request::<()>(Method::GET, path, None, RequestAuth::default())
            .await
    }

    pub async fn get_with_auth(&self, path: &str, token: &str) -> Result<ApiResponse> {
        self.request::<()>(
            Method::GET,
            path,
            None,
            RequestAuth {
                bearer: Some(token),
                ..Default::default()
            },
        )
        .await
    }

    pub async fn post<T: Serialize>(&self, path: &str, body: &T) -> Result<ApiResponse> {
        self.request(Method::POST, path, Some(body), RequestAuth::default())
            .await
    }

    pub async fn post_with_auth<T: Serialize>(
        &self,
        path: &str,
        body: &T,
        token: &str,
    ) -> Result<ApiResponse> {
        self.request(
            Method::POST,
            path,
            Some(body),
            RequestAuth {
                bearer: Some(token),
                ..Default::default()
            },
        )
        .await
    }

    pub async fn post_with_cookie<T: Serialize>(
        &self,
        path: &str,
        body: &T,
        cookie: &str,
    ) -> Result<ApiResponse> {
        self.request(
            Method::POST,
            path,
            Some(body),
            RequestAuth {
                cookie: Some(cookie),
                ..Default::default()
            },
        )
        .await
    }

    pub async fn put_with_auth<T: Serialize>(
        &self,
        path: &str,
        body: &T,
        token: &str,
    ) -> Result<ApiResponse> {
        self.request(
            Method::PUT,
            path,
            Some(body),
            RequestAuth {
                bearer: Some(token),
                ..Default::default()
            },
        )
        .await
    }

    pub async fn request<T: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&T>,
        auth: RequestAuth<'_>,
    ) -> Result<ApiResponse> {
        let url = format!("{}{}", self.base_url, path);
        let mut req_builder = Request::builder().method(method).uri(&url);

        if let Some(token) = auth.bearer {
            req_builder = req_builder.header("Authorization", format!("Bearer {}", token));
        }
        if let Some(cookie) = auth.cookie {
            req_builder = req_builder.header("Cookie", cookie);
        }

        let body_bytes = if let Some(body) = body {
            req_builder = req_builder.header("Content-Type", "application/json");
            Full::new(Bytes::from(serde_json::to_vec(body)?))
        } else {
            Full::new(Bytes::new())
        };

        let request = req_builder.body(body_bytes)?;
        let response = self.client.request(request).await?;

        ApiResponse::from_response(response).await
    }
}

pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Option<Value>,
    pub body_bytes: Vec<u8>,
    pub headers: HashMap<String, String>,
}

impl ApiResponse {
    async fn from_response(response: Response<hyper::body::Incoming>) -> Result<Self> {
        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.to_string(), v.to_string())))
            .collect();

        let body_bytes = response.into_body().collect().await?.to_bytes().to_vec();

        let body = if !body_bytes.is_empty() {
            serde_json::from_slice(&body_bytes).ok()
        } else {
            None
        };

        Ok(Self {
            status,
            body,
            body_bytes,
            headers,
        })
    }

    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status, expected,
            "Expected status {} but got {}. Body: {:?}",
            expected, self.status, self.body
        );
        self
    }

    /// Assert the envelope reports success and return its data payload
    pub fn assert_success_data(&self) -> &Value {
        let body = self.body.as_ref().expect("Missing response body");
        assert_eq!(
            body.get("isSuccess").and_then(|v| v.as_bool()),
            Some(true),
            "Expected success envelope. Body: {:?}",
            body
        );
        body.get("data").expect("Missing data field")
    }

    /// Assert that the failure envelope contains the expected error message
    pub fn assert_error_message(&self, expected_message: &str) -> &Self {
        let body = self.body.as_ref().expect("Missing response body");
        assert_eq!(
            body.get("isSuccess").and_then(|v| v.as_bool()),
            Some(false),
            "Expected failure envelope. Body: {:?}",
            body
        );

        let error = body
            .get("error")
            .and_then(|e| e.as_str())
            .expect("Missing error field in failure envelope");
        assert!(
            error.contains(expected_message),
            "Expected error to contain '{}', but got '{}'",
            expected_message,
            error
        );
        self
    }

    pub fn header(&self, name: &str) -> Option<&String> {
        self.headers.get(name)
    }

    /// Extract a cookie value from the Set-Cookie response header
    pub fn set_cookie(&self, name: &str) -> Option<String> {
        let header = self.headers.get("set-cookie")?;
        let prefix = format!("{}=", name);
        let pair = header.split(';').next()?.trim();
        pair.strip_prefix(&prefix).map(|v| v.to_string())
    }
}
