//! Small helpers for rate-limit friendly networking.

use anyhow::{anyhow, Result};
use rand::{thread_rng, Rng};
use std::time::Duration;

/// Send `rb`, retrying up to `max_retries` times on transport errors and
/// transient statuses (429, 5xx) with jittered exponential backoff.
/// `max_retries = 0` sends exactly once.
pub async fn send_with_backoff(
    rb: reqwest::RequestBuilder,
    label: &str,
    max_retries: u8,
) -> Result<reqwest::Response> {
    let mut attempt = 0u8;
    loop {
        let req = rb
            .try_clone()
            .ok_or_else(|| anyhow!("{label}: request body is not cloneable"))?;
        match req.send().await {
            Ok(r) => {
                if is_transient(r.status().as_u16()) && attempt < max_retries {
                    attempt += 1;
                    let back_ms = backoff_delay_ms(attempt);
                    log::warn!(
                        "[net] {} {} retry={} backoff={}ms",
                        r.status().as_u16(),
                        label,
                        attempt,
                        back_ms
                    );
                    tokio::time::sleep(Duration::from_millis(back_ms)).await;
                    continue;
                }
                return Ok(r);
            }
            Err(e) => {
                if attempt < max_retries {
                    attempt += 1;
                    let back_ms = backoff_delay_ms(attempt);
                    // reqwest errors carry the URL, which carries the API key
                    let e = e.without_url();
                    log::warn!("[net] err {label} retry={attempt} backoff={back_ms}ms : {e}");
                    tokio::time::sleep(Duration::from_millis(back_ms)).await;
                    continue;
                }
                return Err(anyhow!("{label}: {}", e.without_url()));
            }
        }
    }
}

fn is_transient(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

fn backoff_delay_ms(attempt: u8) -> u64 {
    let base = 300u64.saturating_mul(1u64 << (attempt.clamp(1, 6) - 1)); // 300,600,1200,2400,4800,9600
    let jitter: u64 = thread_rng().gen_range(0..=250);
    base + jitter
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_grows_and_caps() {
        let first = backoff_delay_ms(1);
        assert!((300..=550).contains(&first));
        let capped = backoff_delay_ms(40);
        assert!((9600..=9850).contains(&capped));
    }

    #[test]
    fn only_rate_limits_and_gateway_errors_retry() {
        assert!(is_transient(429));
        assert!(is_transient(503));
        assert!(!is_transient(400));
        assert!(!is_transient(401));
        assert!(!is_transient(200));
    }
}
