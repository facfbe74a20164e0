use std::fmt;

use venuemap_shared::auth::{AuthResponse, LoginCredentials};
use venuemap_shared::mock::MockVenues;
use venuemap_shared::wire::{error_message, parse_venue, parse_venue_list};
use venuemap_shared::{BoundingBox, BoundsParamStyle, Venue, VenueInput, VenueUpdate};

use crate::config::ClientConfig;
use crate::log;

const VENUES_ENDPOINT: &str = "/venues";
const LOGIN_ENDPOINT: &str = "/auth/login";

#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    /// No response was received at all.
    Connectivity(String),
    /// The server answered with a non-success status.
    Status { status: u16, message: String },
    /// The body was not a recognised shape.
    Decode(String),
    NotFound(String),
}

impl ApiError {
    pub fn is_connectivity(&self) -> bool {
        matches!(self, ApiError::Connectivity(_))
    }

    /// Text suitable for an inline error banner.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Status { message, .. } if !message.is_empty() => message.clone(),
            ApiError::Status { status, .. } => format!("Request failed ({status})"),
            ApiError::Connectivity(_) => "Unable to reach the API.".to_string(),
            ApiError::Decode(_) => "Unexpected response from the API.".to_string(),
            ApiError::NotFound(what) => format!("{what} not found"),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Connectivity(detail) => write!(f, "connection failed: {detail}"),
            ApiError::Status { status, message } if message.is_empty() => {
                write!(f, "HTTP {status}")
            }
            ApiError::Status { status, message } => write!(f, "HTTP {status}: {message}"),
            ApiError::Decode(detail) => write!(f, "parse error: {detail}"),
            ApiError::NotFound(what) => write!(f, "{what} not found"),
        }
    }
}

impl std::error::Error for ApiError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Patch,
    Delete,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path below the API base, e.g. `/venues/42`.
    pub path: String,
    pub query: Vec<(&'static str, String)>,
    /// JSON body.
    pub body: Option<String>,
    pub bearer: Option<String>,
}

impl ApiRequest {
    fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            bearer: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Turn a non-success response into [`ApiError::Status`].
    fn into_success(self) -> Result<String, ApiError> {
        if self.ok() {
            return Ok(self.body);
        }
        Err(ApiError::Status {
            status: self.status,
            message: error_message(&self.body).unwrap_or_default(),
        })
    }
}

/// Moves one request over the wire. Implementations return
/// [`ApiError::Connectivity`] only when no response arrived; any response,
/// successful or not, comes back as `Ok`.
#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError>;
}

/// Browser `fetch` transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        use gloo_net::http::Request;

        let url = format!("{}{}", self.base_url, request.path);
        let mut builder = match request.method {
            Method::Get => Request::get(&url),
            Method::Post => Request::post(&url),
            Method::Patch => Request::patch(&url),
            Method::Delete => Request::delete(&url),
        };
        if !request.query.is_empty() {
            builder = builder.query(request.query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        if let Some(token) = &request.bearer {
            builder = builder.header("Authorization", &format!("Bearer {token}"));
        }

        let sent = match request.body {
            Some(body) => {
                let request = builder
                    .header("Content-Type", "application/json")
                    .body(body)
                    .map_err(|e| ApiError::Decode(e.to_string()))?;
                request.send().await
            }
            None => builder.send().await,
        };
        let resp = sent.map_err(|e| ApiError::Connectivity(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        Ok(ApiResponse { status, body })
    }
}

/// Venue data source with a remote backend and an in-memory fallback.
///
/// When configured for mock data every call is answered locally. Otherwise a
/// call goes to the remote backend and, only if that fails with
/// [`ApiError::Connectivity`], is answered by the mock backend instead.
/// Server error responses always propagate.
#[derive(Debug, Clone)]
pub struct VenueSource<T> {
    transport: T,
    mock: MockVenues,
    use_mock: bool,
    params: BoundsParamStyle,
    token: Option<String>,
}

impl VenueSource<HttpTransport> {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(HttpTransport::new(config.api_url.clone()), config)
    }
}

impl<T: Transport> VenueSource<T> {
    pub fn new(transport: T, config: &ClientConfig) -> Self {
        Self {
            transport,
            mock: MockVenues::default(),
            use_mock: config.use_mock,
            params: config.bounds_params,
            token: None,
        }
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    fn request(&self, method: Method, path: impl Into<String>) -> ApiRequest {
        let mut request = ApiRequest::new(method, path);
        request.bearer = self.token.clone();
        request
    }

    async fn call(&self, request: ApiRequest) -> Result<String, ApiError> {
        self.transport.send(request).await?.into_success()
    }

    fn fell_back(&self, operation: &str, err: &ApiError) {
        log::warn(&format!("{operation}: {err}; serving mock venues"));
    }

    /// Venues inside `bounds`, or every venue when `bounds` is `None`.
    pub async fn fetch_all(&self, bounds: Option<BoundingBox>) -> Result<Vec<Venue>, ApiError> {
        if self.use_mock {
            return Ok(self.mock.all(bounds.as_ref()));
        }
        let mut request = self.request(Method::Get, VENUES_ENDPOINT);
        if let Some(bounds) = bounds {
            request.query.extend(bounds.query_params(self.params));
        }
        let result = self.call(request).await.and_then(|body| {
            parse_venue_list(&body).map_err(|e| ApiError::Decode(e.to_string()))
        });
        match result {
            Err(err) if err.is_connectivity() => {
                self.fell_back("fetch venues", &err);
                Ok(self.mock.all(bounds.as_ref()))
            }
            other => other,
        }
    }

    pub async fn fetch_by_id(&self, id: &str) -> Result<Venue, ApiError> {
        if !self.use_mock {
            let request = self.request(Method::Get, venue_path(id));
            match self.call(request).await {
                Ok(body) => return parse_venue(&body).map_err(|e| ApiError::Decode(e.to_string())),
                Err(err) if err.is_connectivity() => self.fell_back("fetch venue", &err),
                Err(err) => return Err(err),
            }
        }
        self.mock
            .by_id(id)
            .ok_or_else(|| ApiError::NotFound(format!("Venue {id}")))
    }

    pub async fn create(&self, input: VenueInput) -> Result<Venue, ApiError> {
        if !self.use_mock {
            let mut request = self.request(Method::Post, VENUES_ENDPOINT);
            request.body = Some(to_json(&input)?);
            match self.call(request).await {
                Ok(body) => return parse_venue(&body).map_err(|e| ApiError::Decode(e.to_string())),
                Err(err) if err.is_connectivity() => self.fell_back("create venue", &err),
                Err(err) => return Err(err),
            }
        }
        Ok(self.mock.create(input, chrono::Utc::now()))
    }

    pub async fn update(&self, update: VenueUpdate) -> Result<Venue, ApiError> {
        if !self.use_mock {
            let mut request = self.request(Method::Patch, venue_path(&update.id));
            request.body = Some(to_json(&update)?);
            match self.call(request).await {
                Ok(body) => return parse_venue(&body).map_err(|e| ApiError::Decode(e.to_string())),
                Err(err) if err.is_connectivity() => self.fell_back("update venue", &err),
                Err(err) => return Err(err),
            }
        }
        self.mock
            .update(&update, chrono::Utc::now())
            .ok_or_else(|| ApiError::NotFound(format!("Venue {}", update.id)))
    }

    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        if self.use_mock {
            return Ok(());
        }
        let request = self.request(Method::Delete, venue_path(id));
        match self.call(request).await {
            Ok(_) => Ok(()),
            Err(err) if err.is_connectivity() => {
                self.fell_back("delete venue", &err);
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    /// Exchange credentials for a session token. There is no local fallback.
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<AuthResponse, ApiError> {
        let mut request = ApiRequest::new(Method::Post, LOGIN_ENDPOINT);
        request.body = Some(to_json(credentials)?);
        let body = self.call(request).await?;
        serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

/// `/venues/{id}` with the id percent-encoded as a single path segment.
fn venue_path(id: &str) -> String {
    let mut path = String::with_capacity(VENUES_ENDPOINT.len() + 1 + id.len());
    path.push_str(VENUES_ENDPOINT);
    path.push('/');
    for byte in id.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                path.push(byte as char)
            }
            _ => path.push_str(&format!("%{byte:02X}")),
        }
    }
    path
}

fn to_json(value: &impl serde::Serialize) -> Result<String, ApiError> {
    serde_json::to_string(value).map_err(|e| ApiError::Decode(e.to_string()))
}
