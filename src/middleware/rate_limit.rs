use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    num::NonZeroU32,
    sync::Arc,
    time::Duration,
};

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};

use crate::error::AppError;

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Per-client-IP limits on the recommendation endpoints
///
/// A request must fit in both the per-minute and the per-day quota.
pub struct RecommendationRateLimiter {
    per_minute: DefaultKeyedRateLimiter<IpAddr>,
    per_day: DefaultKeyedRateLimiter<IpAddr>,
}

impl RecommendationRateLimiter {
    pub fn new(per_minute: NonZeroU32, per_day: NonZeroU32) -> Self {
        Self {
            per_minute: RateLimiter::keyed(Quota::per_minute(per_minute)),
            per_day: RateLimiter::keyed(daily_quota(per_day)),
        }
    }

    /// Records a request from `ip`, returning false once either quota is spent
    pub fn check(&self, ip: IpAddr) -> bool {
        self.per_minute.check_key(&ip).is_ok() && self.per_day.check_key(&ip).is_ok()
    }
}

fn daily_quota(limit: NonZeroU32) -> Quota {
    // A u32 limit never divides a day down to a zero period.
    Quota::with_period(DAY / limit.get())
        .unwrap_or_else(|| Quota::per_second(limit))
        .allow_burst(limit)
}

/// Peer address from `ConnectInfo`, or the unspecified address when the
/// server was not started with connect info
fn client_ip(request: &Request) -> IpAddr {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

/// Rejects requests over the client's quota with 429
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RecommendationRateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let ip = client_ip(&request);

    if !limiter.check(ip) {
        tracing::warn!(client_ip = %ip, path = %request.uri().path(), "Rate limit exceeded");
        return AppError::TooManyRequests("Too many requests! Rate Limit Exceeded!".to_string())
            .into_response();
    }

    next.run(request).await
}
