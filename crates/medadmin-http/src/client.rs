//! Authenticated request client

use reqwest::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::redirect::Policy;
use reqwest::{Method, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

use medadmin_session::SessionManager;
use medadmin_ui::{AlertCenter, Notifier, Severity};

use crate::error::ApiError;
use crate::policy::{AuthErrorPolicy, TeardownPolicy};
use crate::request::RequestDescriptor;
use crate::Result;

pub struct ClientBuilder {
    sessions: SessionManager,
    base_url: Option<Url>,
    policy: Option<Arc<dyn AuthErrorPolicy>>,
    notifier: Option<Arc<dyn Notifier>>,
    timeout: Option<Duration>,
}

impl ClientBuilder {
    /// Base for relative request URLs
    pub fn base_url(mut self, base_url: Url) -> Self {
        self.base_url = Some(base_url);
        self
    }

    /// Defaults to `TeardownPolicy` over the client's session manager
    pub fn policy(mut self, policy: Arc<dyn AuthErrorPolicy>) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Defaults to a fresh `AlertCenter`
    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// No timeout unless set; the transport defaults apply
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<AuthenticatedClient> {
        let mut http = reqwest::Client::builder()
            .redirect(Policy::limited(5))
            .user_agent(concat!("medadmin/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = self.timeout {
            http = http.timeout(timeout);
        }
        let http = http.build()?;

        let policy = self
            .policy
            .unwrap_or_else(|| Arc::new(TeardownPolicy::new(self.sessions.clone())));
        let notifier = self
            .notifier
            .unwrap_or_else(|| Arc::new(AlertCenter::new()));

        Ok(AuthenticatedClient {
            http,
            sessions: self.sessions,
            base_url: self.base_url,
            policy,
            notifier,
        })
    }
}

#[derive(Clone)]
pub struct AuthenticatedClient {
    http: reqwest::Client,
    sessions: SessionManager,
    base_url: Option<Url>,
    policy: Arc<dyn AuthErrorPolicy>,
    notifier: Arc<dyn Notifier>,
}

impl AuthenticatedClient {
    pub fn builder(sessions: SessionManager) -> ClientBuilder {
        ClientBuilder {
            sessions,
            base_url: None,
            policy: None,
            notifier: None,
            timeout: None,
        }
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    /// Issue the request and dispatch its outcome to the descriptor's handlers.
    ///
    /// Nothing is returned: success goes to `on_success`, failures other than
    /// 401 go to `on_error` or become a danger alert. A 401 is left entirely to
    /// the auth policy, and a response that arrives after the page was
    /// navigated away from is dropped.
    pub async fn request(&self, descriptor: RequestDescriptor) {
        let RequestDescriptor {
            method,
            url,
            payload,
            on_success,
            on_error,
        } = descriptor;

        match self.send(method, &url, payload.as_ref()).await {
            Ok(body) => {
                if let Some(handler) = on_success {
                    handler(body);
                }
            }
            Err(e) if e.is_terminal() => {}
            Err(e) => {
                let message = e.user_message();
                match on_error {
                    Some(handler) => handler(message),
                    None => self.notifier.show(&message, Severity::Danger),
                }
            }
        }
    }

    /// Fire-and-forget version of [`request`](Self::request)
    pub fn spawn(&self, descriptor: RequestDescriptor) -> tokio::task::JoinHandle<()> {
        let client = self.clone();
        tokio::spawn(async move { client.request(descriptor).await })
    }

    /// Issue a request and return the decoded body.
    ///
    /// 401 has already been handed to the auth policy when
    /// `ApiError::Unauthorized` comes back. No alerts are shown from here.
    pub async fn send(&self, method: Method, url: &str, payload: Option<&Value>) -> Result<Value> {
        self.execute(method, url, &[], payload).await
    }

    /// GET with extra query parameters appended to `url`
    pub async fn get_with_query(&self, url: &str, query: &[(String, String)]) -> Result<Value> {
        self.execute(Method::GET, url, query, None).await
    }

    pub fn resolve_url(&self, url: &str) -> Result<Url> {
        let url = url.trim();
        if url.is_empty() {
            return Err(ApiError::InvalidRequest("URL is empty".to_string()));
        }

        match Url::parse(url) {
            Ok(absolute) => Ok(absolute),
            Err(url::ParseError::RelativeUrlWithoutBase) => match &self.base_url {
                Some(base) => base
                    .join(url)
                    .map_err(|e| ApiError::InvalidRequest(format!("{}: {}", url, e))),
                None => Err(ApiError::InvalidRequest(format!(
                    "relative URL without a base: {}",
                    url
                ))),
            },
            Err(e) => Err(ApiError::InvalidRequest(format!("{}: {}", url, e))),
        }
    }

    /// `Bearer <token>`, sent even when there is no token
    fn authorization(&self) -> Result<HeaderValue> {
        let token = match self.sessions.token() {
            Ok(token) => token.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read session token");
                String::new()
            }
        };

        let mut value = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| {
            ApiError::InvalidRequest("session token is not a valid header value".to_string())
        })?;
        value.set_sensitive(true);
        Ok(value)
    }

    async fn execute(
        &self,
        method: Method,
        url: &str,
        query: &[(String, String)],
        payload: Option<&Value>,
    ) -> Result<Value> {
        let page_epoch = self.sessions.navigator().epoch();

        let mut target = self.resolve_url(url)?;
        if !query.is_empty() {
            target
                .query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }

        let mut builder = self
            .http
            .request(method.clone(), target.clone())
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .header(AUTHORIZATION, self.authorization()?);
        if let Some(payload) = payload {
            let body = serde_json::to_vec(payload)
                .map_err(|e| ApiError::InvalidRequest(format!("payload is not JSON: {}", e)))?;
            builder = builder.body(body);
        }

        let started = Instant::now();
        let outcome = async {
            let response = builder.send().await?;
            let status = response.status();
            let body = response.text().await?;
            Ok::<_, reqwest::Error>((status, body))
        }
        .await;

        if self.sessions.navigator().epoch() != page_epoch {
            tracing::debug!(method = %method, url = %target, "Dropping response for a page that is gone");
            return Err(ApiError::Superseded);
        }

        let (status, body) = match outcome {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(method = %method, url = %target, error = %e, "API request failed");
                return Err(e.into());
            }
        };

        tracing::info!(
            method = %method,
            url = %target,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "API request completed"
        );

        if status.is_success() {
            return Ok(decode_body(&body));
        }

        if status == StatusCode::UNAUTHORIZED {
            self.policy.on_unauthorized(&target, page_epoch);
            return Err(ApiError::Unauthorized);
        }

        Err(ApiError::from_response(status.as_u16(), &body))
    }
}

/// Empty body → `null`, non-JSON text → JSON string
fn decode_body(body: &str) -> Value {
    if body.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string()))
}
