//! Manual redirect following.
//!
//! # Responsibilities
//! - Issue upstream requests with automatic redirects disabled
//! - Follow at most [`MAX_REDIRECTS`] redirects, resolving `Location` against
//!   the current target
//! - Hand the terminal response to the relay untouched
//!
//! # Design Decisions
//! - Explicit `Attempting`/`Done` state machine; the redirect count lives in
//!   the state, so at most `MAX_REDIRECTS + 1` fetches happen per request
//! - Strictly sequential: one outstanding upstream request at a time
//! - Upstream transport errors are not retried

use std::time::Duration;

use axum::body::Bytes;
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use url::Url;

use crate::config::TimeoutConfig;
use crate::error::{RouterError, RouterResult};
use crate::observability::metrics;

/// Redirects followed before the last response is returned as-is.
pub const MAX_REDIRECTS: u8 = 3;

/// Statuses that are followed when they carry a `Location`.
pub const REDIRECT_STATUSES: [StatusCode; 5] = [
    StatusCode::MOVED_PERMANENTLY,
    StatusCode::FOUND,
    StatusCode::SEE_OTHER,
    StatusCode::TEMPORARY_REDIRECT,
    StatusCode::PERMANENT_REDIRECT,
];

pub fn is_redirect(status: StatusCode) -> bool {
    REDIRECT_STATUSES.contains(&status)
}

/// One upstream fetch: where it goes and how many redirects led here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyAttempt {
    pub target_url: Url,
    pub redirect_count: u8,
}

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Not a redirect status.
    Terminal,
    /// Redirect status without a `Location` header.
    MissingLocation,
    /// Redirect budget used up.
    BudgetExhausted,
}

/// What to do after observing a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Follow(ProxyAttempt),
    Stop(StopReason),
}

/// Decide the next state from an attempt and the response it produced.
///
/// A `Location` that is not UTF-8 or cannot be resolved is an internal error.
pub fn next_transition(
    attempt: &ProxyAttempt,
    status: StatusCode,
    location: Option<&HeaderValue>,
) -> RouterResult<Transition> {
    if !is_redirect(status) {
        return Ok(Transition::Stop(StopReason::Terminal));
    }
    let Some(location) = location else {
        return Ok(Transition::Stop(StopReason::MissingLocation));
    };
    if attempt.redirect_count >= MAX_REDIRECTS {
        return Ok(Transition::Stop(StopReason::BudgetExhausted));
    }

    let location = location.to_str().map_err(|e| {
        RouterError::Internal(format!("non-text Location from {}: {}", attempt.target_url, e))
    })?;
    let target_url = attempt.target_url.join(location).map_err(|e| {
        RouterError::Internal(format!(
            "unresolvable Location '{}' from {}: {}",
            location, attempt.target_url, e
        ))
    })?;

    Ok(Transition::Follow(ProxyAttempt {
        target_url,
        redirect_count: attempt.redirect_count + 1,
    }))
}

/// Method (and whether the body survives) for the request after a redirect.
///
/// 303 turns everything but HEAD into GET; 301/302 turn POST into GET.
/// 307/308 preserve both.
pub fn redirect_method(status: StatusCode, method: &Method) -> (Method, bool) {
    let becomes_get = match status {
        StatusCode::SEE_OTHER => method != Method::HEAD,
        StatusCode::MOVED_PERMANENTLY | StatusCode::FOUND => method == Method::POST,
        _ => false,
    };
    if becomes_get && method != Method::GET {
        (Method::GET, false)
    } else {
        (method.clone(), true)
    }
}

/// The request replayed on every attempt.
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Follow-loop state.
#[derive(Debug)]
pub enum FollowState {
    Attempting(ProxyAttempt),
    Done(FollowOutcome),
}

/// Terminal response plus how we got there.
#[derive(Debug)]
pub struct FollowOutcome {
    pub response: reqwest::Response,
    pub final_url: Url,
    pub redirect_count: u8,
    pub stop: StopReason,
}

/// Executes the follow loop against a redirect-disabled client.
#[derive(Debug, Clone)]
pub struct RedirectFollower {
    client: reqwest::Client,
}

impl RedirectFollower {
    pub fn new(timeouts: &TimeoutConfig) -> RouterResult<Self> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            // Covers the streamed body too, after the handler has returned.
            .read_timeout(Duration::from_secs(timeouts.request_secs))
            .build()
            .map_err(RouterError::internal)?;
        Ok(Self { client })
    }

    /// Fetch `target_url`, following redirects up to the budget.
    pub async fn follow(
        &self,
        mut request: UpstreamRequest,
        target_url: Url,
    ) -> RouterResult<FollowOutcome> {
        let mut state = FollowState::Attempting(ProxyAttempt {
            target_url,
            redirect_count: 0,
        });

        loop {
            let attempt = match state {
                FollowState::Done(outcome) => {
                    metrics::record_redirects(outcome.redirect_count);
                    return Ok(outcome);
                }
                FollowState::Attempting(attempt) => attempt,
            };

            let response = self.send(&request, &attempt).await?;
            let status = response.status();

            state = match next_transition(&attempt, status, response.headers().get(header::LOCATION))? {
                Transition::Follow(next) => {
                    tracing::info!(
                        from = %attempt.target_url,
                        to = %next.target_url,
                        status = %status,
                        redirect_count = next.redirect_count,
                        "Following upstream redirect"
                    );
                    let (method, keep_body) = redirect_method(status, &request.method);
                    request.method = method;
                    if !keep_body {
                        request.body = Bytes::new();
                    }
                    FollowState::Attempting(next)
                }
                Transition::Stop(stop) => {
                    if stop == StopReason::BudgetExhausted {
                        tracing::warn!(url = %attempt.target_url, status = %status, "Redirect budget exhausted");
                    }
                    FollowState::Done(FollowOutcome {
                        response,
                        final_url: attempt.target_url,
                        redirect_count: attempt.redirect_count,
                        stop,
                    })
                }
            };
        }
    }

    async fn send(
        &self,
        request: &UpstreamRequest,
        attempt: &ProxyAttempt,
    ) -> RouterResult<reqwest::Response> {
        // Framing is recomputed by the client for each attempt.
        let mut headers = request.headers.clone();
        headers.remove(header::CONTENT_LENGTH);
        headers.remove(header::TRANSFER_ENCODING);

        let mut builder = self
            .client
            .request(request.method.clone(), attempt.target_url.clone())
            .headers(headers);
        if !request.body.is_empty() {
            builder = builder.body(request.body.clone());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| {
                RouterError::Internal(format!("upstream fetch of {} failed: {}", attempt.target_url, e))
            })?;

        metrics::record_upstream_attempt(response.status().as_u16());
        tracing::info!(
            url = %attempt.target_url,
            status = %response.status(),
            redirect_count = attempt.redirect_count,
            "Upstream response"
        );
        for (name, value) in response.headers() {
            tracing::debug!(header = %name, value = ?value, "Upstream response header");
        }

        Ok(response)
    }
}
