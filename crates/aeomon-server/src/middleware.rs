use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::api::ApiError;

/// Newtype wrapping a request ID string, stored as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// API key auth settings used by middleware.
#[derive(Debug, Clone)]
pub struct AuthState {
    api_keys: Arc<HashSet<String>>,
    pub enabled: bool,
}

impl AuthState {
    /// Auth over an explicit token set. An empty set disables auth.
    #[must_use]
    pub fn new(api_keys: HashSet<String>) -> Self {
        let enabled = !api_keys.is_empty();
        Self {
            api_keys: Arc::new(api_keys),
            enabled,
        }
    }

    /// Builds auth config from `AEOMON_API_KEYS` (comma-separated bearer tokens).
    ///
    /// In development, empty/missing keys disable auth for local iteration.
    /// In non-development envs, empty/missing keys fail startup.
    pub fn from_env(is_development: bool) -> anyhow::Result<Self> {
        let keys = parse_keys(&std::env::var("AEOMON_API_KEYS").unwrap_or_default());

        if keys.is_empty() {
            if is_development {
                tracing::warn!(
                    "AEOMON_API_KEYS not set; bearer auth disabled in development environment"
                );
                return Ok(Self::new(HashSet::new()));
            }

            anyhow::bail!(
                "AEOMON_API_KEYS is required outside development; provide comma-separated bearer tokens"
            );
        }

        Ok(Self::new(keys))
    }

    fn allows(&self, token: &str) -> bool {
        self.api_keys.contains(token)
    }
}

fn parse_keys(raw: &str) -> HashSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

#[derive(Debug)]
struct CallerWindow {
    started_at: Instant,
    count: usize,
}

/// Fixed-window request limiter tracked per caller.
///
/// Callers are bucketed by bearer token, so the nightly cron trigger and a
/// dashboard token never starve each other; unauthenticated requests share
/// one anonymous bucket.
#[derive(Debug, Clone)]
pub struct RateLimitState {
    max_requests: usize,
    window: Duration,
    windows: Arc<Mutex<HashMap<String, CallerWindow>>>,
}

impl RateLimitState {
    #[must_use]
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            windows: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

/// Axum middleware that extracts or generates a request ID.
///
/// If the incoming request has an `x-request-id` header, that value is used.
/// Otherwise a new `UUIDv4` is generated. The ID is:
/// - Inserted into request extensions as [`RequestId`]
/// - Set on the response as the `x-request-id` header
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;

    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert("x-request-id", val);
    }

    res
}

/// Middleware enforcing Bearer token auth when enabled.
///
/// Rejections use the same [`ApiError`] envelope as the handlers, so 401
/// responses still carry `meta.request_id`.
pub async fn require_bearer_auth(
    State(auth): State<AuthState>,
    req: Request,
    next: Next,
) -> Response {
    if !auth.enabled {
        return next.run(req).await;
    }

    match extract_bearer_token(req.headers().get(AUTHORIZATION)) {
        Some(token) if auth.allows(token) => next.run(req).await,
        _ => ApiError::new(
            request_id_of(&req),
            "unauthorized",
            "missing or invalid bearer token",
        )
        .into_response(),
    }
}

/// Middleware enforcing the per-caller request window.
pub async fn enforce_rate_limit(
    State(rate_limit): State<RateLimitState>,
    req: Request,
    next: Next,
) -> Response {
    let caller = caller_key(&req);
    let mut windows = rate_limit.windows.lock().await;

    // Expired windows are dropped wholesale; their callers start fresh.
    windows.retain(|_, w| w.started_at.elapsed() < rate_limit.window);

    let window = windows.entry(caller).or_insert_with(|| CallerWindow {
        started_at: Instant::now(),
        count: 0,
    });

    if window.count >= rate_limit.max_requests {
        drop(windows);
        return ApiError::new(request_id_of(&req), "rate_limited", "rate limit exceeded")
            .into_response();
    }

    window.count += 1;
    drop(windows);

    next.run(req).await
}

/// The rate-limit bucket for a request: its bearer token, or the shared
/// anonymous bucket.
fn caller_key(req: &Request) -> String {
    extract_bearer_token(req.headers().get(AUTHORIZATION))
        .map_or_else(|| "anonymous".to_owned(), ToOwned::to_owned)
}

fn request_id_of(req: &Request) -> String {
    req.extensions()
        .get::<RequestId>()
        .map_or_else(|| Uuid::new_v4().to_string(), |id| id.0.clone())
}

fn extract_bearer_token(value: Option<&HeaderValue>) -> Option<&str> {
    value
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|s| !s.trim().is_empty())
}
