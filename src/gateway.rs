//! # Request Gateway
//!
//! Single choke-point for all outbound API calls. Every request flows through
//! the same pipeline: URL construction under the API root, bearer-token
//! injection from the session store, JSON body attachment, dispatch with the
//! configured deadline, then classification of the outcome onto the failure
//! taxonomy in [`crate::error`].
//!
//! The backend wraps every response in an envelope `{code, msg, data}` where
//! `code == 0` is the only success. On success the gateway resolves with
//! exactly the `data` payload; everything else rejects with a typed
//! [`ApiError`]. An authoritative 401 additionally clears the injected session
//! and publishes the forced re-login signal.

use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::config::{ApiEndpointConfig, ClientConfig};
use crate::error::{ApiError, ApiResult, ErrorKind};
use crate::events::Notifier;
use crate::session::SessionStore;

/// The only envelope code that counts as success
pub const SUCCESS_CODE: i64 = 0;

/// Response envelope every backend endpoint uses
///
/// `code == 0` carries the payload in `data`; any other code is a
/// business-level failure described by `msg`, regardless of HTTP status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub code: i64,
    #[serde(default)]
    pub msg: String,
    pub data: T,
}

/// Map an authoritative non-success HTTP status onto the failure taxonomy
///
/// Returns the kind plus the user-facing message for statuses the backend
/// uses deliberately. Statuses outside the table (400, 422, ...) return
/// `None` and fall back to the response envelope's own message.
fn classify_status(status: StatusCode) -> Option<(ErrorKind, &'static str)> {
    match status.as_u16() {
        401 => Some((ErrorKind::Auth, "session expired, please sign in again")),
        403 => Some((ErrorKind::Forbidden, "permission denied")),
        404 => Some((ErrorKind::NotFound, "requested resource does not exist")),
        s if s >= 500 => Some((ErrorKind::Server, "internal server error")),
        _ => None,
    }
}

/// HTTP gateway for the BigDataOps platform API
///
/// Holds the shared session context and the event channel; both are injected
/// at construction so the pipeline is testable without ambient state. The
/// gateway is the only writer to the session (it clears it on 401).
///
/// # Examples
///
/// ```rust,no_run
/// use bigdataops_client::{ApiGateway, ClientConfig, Notifier, SessionStore};
///
/// # async fn example() -> bigdataops_client::ApiResult<()> {
/// let config = ClientConfig::default();
/// let session = SessionStore::in_memory();
/// let notifier = Notifier::new();
/// let gateway = ApiGateway::new(&config, session, notifier)?;
///
/// let overview: serde_json::Value = gateway.get("/cluster/overview").await?;
/// println!("nodes: {}", overview["total_nodes"]);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ApiGateway {
    client: Client,
    config: ApiEndpointConfig,
    base_url: Url,
    session: SessionStore,
    notifier: Notifier,
}

impl std::fmt::Debug for ApiGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiGateway")
            .field("base_url", &self.base_url.as_str())
            .field("timeout_ms", &self.config.timeout_ms)
            .field("authenticated", &self.session.is_authenticated())
            .finish()
    }
}

impl ApiGateway {
    /// Create a new gateway with the given configuration and collaborators
    ///
    /// Validates the base URL and builds the HTTP client with the configured
    /// per-request deadline. The base URL path is treated as the API root:
    /// every request path is resolved beneath it.
    pub fn new(
        config: &ClientConfig,
        session: SessionStore,
        notifier: Notifier,
    ) -> ApiResult<Self> {
        let mut base_url = Url::parse(&config.api.base_url)
            .map_err(|e| ApiError::config(format!("Invalid base URL: {}", e)))?;

        // A trailing slash makes Url::join resolve paths under the API root
        // instead of replacing it
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .timeout(config.api.timeout())
            .user_agent(format!("bigdataops-client/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::config(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            base_url = %config.api.base_url,
            timeout_ms = config.api.timeout_ms,
            "Created API gateway"
        );

        Ok(Self {
            client,
            config: config.api.clone(),
            base_url,
            session,
            notifier,
        })
    }

    /// Issue a request and resolve with the envelope's `data` payload
    ///
    /// The caller supplies a path relative to the API root; path syntax is not
    /// validated beyond URL resolution. Rejections carry an [`ErrorKind`] the
    /// caller can branch on; no retry happens at this layer.
    pub async fn request<T, B>(&self, method: Method, path: &str, body: Option<&B>) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.dispatch(method, path, None::<&()>, body).await
    }

    // ===================================================================================
    // CONVENIENCE METHODS
    // ===================================================================================

    /// GET a resource
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.request::<T, ()>(Method::GET, path, None).await
    }

    /// GET a resource with serialized query parameters
    pub async fn get_with<T, Q>(&self, path: &str, query: &Q) -> ApiResult<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        self.dispatch(Method::GET, path, Some(query), None::<&()>)
            .await
    }

    /// POST a JSON body
    pub async fn post<T, B>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::POST, path, Some(body)).await
    }

    /// PUT a JSON body
    pub async fn put<T, B>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::PUT, path, Some(body)).await
    }

    /// PATCH a JSON body
    pub async fn patch<T, B>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::PATCH, path, Some(body)).await
    }

    /// DELETE a resource
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.request::<T, ()>(Method::DELETE, path, None).await
    }

    // ===================================================================================
    // ACCESSORS
    // ===================================================================================

    /// Get the configured base URL for debugging/logging
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Get the configured per-request deadline for debugging/logging
    #[must_use]
    pub fn timeout_ms(&self) -> u64 {
        self.config.timeout_ms
    }

    /// The session context this gateway reads from and clears on 401
    #[must_use]
    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// The event channel this gateway publishes notices on
    #[must_use]
    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    // ===================================================================================
    // PIPELINE
    // ===================================================================================

    async fn dispatch<T, Q, B>(
        &self,
        method: Method,
        path: &str,
        query: Option<&Q>,
        body: Option<&B>,
    ) -> ApiResult<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
        B: Serialize + ?Sized,
    {
        let url = match self.endpoint_url(path) {
            Ok(url) => url,
            Err(e) => {
                self.notifier.error("request configuration error");
                return Err(e);
            }
        };

        debug!(method = %method, url = %url, "Dispatching API request");

        let mut request = self.apply_auth(self.client.request(method.clone(), url.clone()));
        if let Some(query) = query {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) if e.is_builder() => {
                error!(method = %method, url = %url, error = %e, "Malformed request setup");
                self.notifier.error("request configuration error");
                return Err(ApiError::config(format!("invalid request setup: {}", e)));
            }
            Err(e) => return Err(self.transport_failure(&method, &url, e)),
        };

        self.settle(response).await
    }

    /// Resolve a request path beneath the API root
    fn endpoint_url(&self, path: &str) -> ApiResult<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::config(format!("Failed to construct URL for {}: {}", path, e)))
    }

    /// Attach the bearer token when the session holds one
    ///
    /// Read per call rather than baked into default headers: login and logout
    /// change the session while the gateway is live.
    fn apply_auth(&self, request: RequestBuilder) -> RequestBuilder {
        match self.session.token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Classify a send-level failure without raising a user notice
    ///
    /// Transport problems stay silent at this layer: callers like the liveness
    /// monitor probe while offline on purpose, and the monitor owns the
    /// debounced offline signal. Deadline expiry is logged distinctly from a
    /// hard connection failure.
    fn transport_failure(&self, method: &Method, url: &Url, e: reqwest::Error) -> ApiError {
        if e.is_timeout() {
            warn!(method = %method, url = %url, "Request deadline exceeded");
        } else {
            warn!(method = %method, url = %url, error = %e, "Network request failed");
        }
        ApiError::from(e)
    }

    /// Classify a received response and unwrap the envelope
    async fn settle<T: DeserializeOwned>(&self, response: reqwest::Response) -> ApiResult<T> {
        let status = response.status();

        if status.is_success() {
            let body = response.text().await.map_err(ApiError::from)?;
            return self.settle_success(status, &body);
        }

        match classify_status(status) {
            Some((ErrorKind::Auth, message)) => {
                // Clearing is idempotent: repeated 401s while already logged
                // out still reject per failure without multiplying side effects
                warn!(
                    status = status.as_u16(),
                    "Session rejected by backend, clearing credentials"
                );
                self.session.clear();
                self.notifier.error(message);
                self.notifier.session_expired();
                Err(ApiError::auth(message).with_status(status.as_u16()))
            }
            Some((kind, message)) => {
                error!(status = status.as_u16(), kind = %kind, "Request rejected");
                self.notifier.error(message);
                Err(ApiError::new(kind, message).with_status(status.as_u16()))
            }
            None => {
                // Statuses outside the table still carry an envelope whose msg
                // is the best description we have
                let message = response
                    .text()
                    .await
                    .ok()
                    .and_then(|body| serde_json::from_str::<ApiEnvelope<Value>>(&body).ok())
                    .map(|envelope| envelope.msg)
                    .filter(|msg| !msg.is_empty())
                    .unwrap_or_else(|| format!("request failed with status {}", status.as_u16()));

                error!(status = status.as_u16(), message = %message, "Request rejected");
                self.notifier.error(&message);
                Err(ApiError::business(message).with_status(status.as_u16()))
            }
        }
    }

    /// Unwrap a 2xx response body into the envelope payload
    fn settle_success<T: DeserializeOwned>(&self, status: StatusCode, body: &str) -> ApiResult<T> {
        let envelope: ApiEnvelope<Value> = match serde_json::from_str(body) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(error = %e, "Response envelope failed to decode");
                let message = "malformed response envelope";
                self.notifier.error(message);
                return Err(ApiError::business(message).with_status(status.as_u16()));
            }
        };

        if envelope.code != SUCCESS_CODE {
            debug!(
                code = envelope.code,
                msg = %envelope.msg,
                "Envelope signalled business failure"
            );
            let message = if envelope.msg.is_empty() {
                "request failed".to_string()
            } else {
                envelope.msg
            };
            self.notifier.error(&message);
            return Err(ApiError::business(message).with_status(status.as_u16()));
        }

        serde_json::from_value(envelope.data).map_err(|e| {
            error!(error = %e, "Failed to parse envelope payload");
            self.notifier.error("malformed response payload");
            ApiError::business(format!("malformed response payload: {}", e))
                .with_status(status.as_u16())
        })
    }
}
