//! IP-based rate limiting for edit-mode password attempts.

use axum::{
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use std::{
    net::{IpAddr, SocketAddr},
    num::NonZeroU32,
    sync::Arc,
};
use tower_governor::{key_extractor::KeyExtractor, GovernorError};
use tracing::warn;

/// Edit-mode password attempts per minute per IP
pub const EDIT_TOGGLE_PER_MINUTE: u32 = 10;

/// Tracked IPs above which stale limiter entries are dropped.
const MAX_TRACKED_IPS: usize = 10_000;

/// Extracts the peer IP from ConnectInfo. The port is ignored so that
/// reconnecting does not reset the budget.
#[derive(Clone)]
pub struct IpKeyExtractor;

impl KeyExtractor for IpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        req.extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip())
            .ok_or(GovernorError::UnableToExtractKey)
    }
}

pub struct IpRateLimiter {
    limiter: DefaultKeyedRateLimiter<IpAddr>,
}

impl IpRateLimiter {
    /// Allows a burst of `limit` requests, replenished over one minute.
    pub fn per_minute(limit: u32) -> Self {
        let limit = NonZeroU32::new(limit).unwrap_or(NonZeroU32::MIN);
        Self {
            limiter: RateLimiter::keyed(Quota::per_minute(limit)),
        }
    }

    pub fn check(&self, ip: IpAddr) -> bool {
        if self.limiter.len() > MAX_TRACKED_IPS {
            self.limiter.retain_recent();
        }
        self.limiter.check_key(&ip).is_ok()
    }
}

pub async fn limit_by_ip(
    State(limiter): State<Arc<IpRateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let ip = match IpKeyExtractor.extract(&request) {
        Ok(ip) => ip,
        Err(err) => {
            warn!("Rate limiting error: {:?}", err);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    if !limiter.check(ip) {
        warn!(
            "Rate limit exceeded: {} {} ip={}",
            request.method(),
            request.uri().path(),
            ip
        );
        return StatusCode::TOO_MANY_REQUESTS.into_response();
    }

    next.run(request).await
}
