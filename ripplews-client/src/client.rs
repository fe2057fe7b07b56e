//! High-level call API: JSON envelope encode/decode, error classification,
//! and the rate-limit retry loop.

use crate::connection::{Connection, ConnectionConfig};
use crate::error::ClientError;
use rand::Rng;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::time::Duration;

/// Retry policy for rate-limited calls.
///
/// A `slowDown` reply is retried after a uniformly random delay in
/// `[min_delay, max_delay]`. With `max_attempts: None` the loop runs until
/// the server stops rate-limiting; callers needing bounded latency set a
/// total-attempt cap.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts allowed, including the first. None means unbounded.
    pub max_attempts: Option<u32>,
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: None,
            min_delay: Duration::from_millis(50),
            max_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Picks the next backoff delay.
    fn delay(&self) -> Duration {
        rand::thread_rng().gen_range(self.min_delay..=self.max_delay)
    }
}

/// Response envelope: `{"status": ..., "result": {...}}`.
#[derive(Debug, Deserialize)]
struct ResponseEnvelope {
    status: Option<String>,
    result: Option<Value>,
}

/// Client for a ripple WebSocket JSON-RPC server.
///
/// Wraps a [`Connection`] with envelope encoding, response classification,
/// and automatic retry when the server asks to slow down.
pub struct Client {
    conn: Connection,
    retry: RetryPolicy,
    sleep: Box<dyn Fn(Duration) + Send + Sync>,
}

impl Client {
    /// Creates a new client with the given configuration.
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            conn: Connection::new(config),
            retry: RetryPolicy::default(),
            sleep: Box::new(std::thread::sleep),
        }
    }

    /// Replaces the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Replaces the delay function used between rate-limit retries. Tests
    /// inject a recording function here instead of sleeping for real.
    pub fn with_sleep_fn(mut self, sleep: impl Fn(Duration) + Send + Sync + 'static) -> Self {
        self.sleep = Box::new(sleep);
        self
    }

    /// Connects eagerly. `call` connects lazily, so this is optional.
    pub fn connect(&mut self) -> Result<(), ClientError> {
        self.conn.connect()
    }

    /// Returns whether the underlying connection is established.
    pub fn is_connected(&self) -> bool {
        self.conn.is_connected()
    }

    /// Closes the underlying connection.
    pub fn close(&mut self) {
        self.conn.close()
    }

    /// Sends one command and returns the `result` object, blocking until the
    /// server replies.
    ///
    /// `params` must be a JSON object; its keys are flattened into the
    /// request envelope next to `command`. A `slowDown` error from the server
    /// is retried internally per the retry policy and never surfaces; every
    /// other error propagates.
    pub fn call(&mut self, command: &str, params: Value) -> Result<Value, ClientError> {
        let mut attempts = 0u32;
        loop {
            let err = match self.call_once(command, &params) {
                Err(e) if e.is_rate_limited() => e,
                other => return other,
            };

            attempts += 1;
            if self.retry.max_attempts.is_some_and(|max| attempts >= max) {
                return Err(err);
            }

            let delay = self.retry.delay();
            tracing::debug!("Server asked to slow down, retrying in {:?}", delay);
            (self.sleep)(delay);
        }
    }

    fn call_once(&mut self, command: &str, params: &Value) -> Result<Value, ClientError> {
        let mut envelope = Map::new();
        envelope.insert("command".to_string(), json!(command));
        if let Value::Object(map) = params {
            for (key, value) in map {
                envelope.insert(key.clone(), value.clone());
            }
        }
        let request = serde_json::to_string(&Value::Object(envelope))?;

        let raw = self.conn.send(&request)?.ok_or(ClientError::NoResponse)?;

        let response: ResponseEnvelope = serde_json::from_str(&raw)
            .map_err(|_| ClientError::UnexpectedResponse(raw.clone()))?;

        let Some(result) = response.result else {
            return Err(ClientError::UnexpectedResponse(raw));
        };

        if let Some(name) = result.get("error").and_then(Value::as_str) {
            let code = result.get("error_code").and_then(Value::as_i64).unwrap_or(1);
            let message = result
                .get("error_message")
                .or_else(|| result.get("error_exception"))
                .and_then(Value::as_str)
                .map(String::from);
            return Err(ClientError::Remote {
                name: name.to_string(),
                code,
                message,
            });
        }

        if response.status.as_deref() != Some("success") {
            return Err(ClientError::Remote {
                name: response.status.unwrap_or_else(|| "unknown".to_string()),
                code: 1,
                message: Some(result.to_string()),
            });
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = Client::new(ConnectionConfig::default());
        assert!(!client.is_connected());
    }

    #[test]
    fn test_retry_policy_defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, None);
        assert_eq!(policy.min_delay, Duration::from_millis(50));
        assert_eq!(policy.max_delay, Duration::from_millis(1000));
    }

    #[test]
    fn test_retry_delay_within_bounds() {
        let policy = RetryPolicy::default();
        for _ in 0..100 {
            let delay = policy.delay();
            assert!(delay >= policy.min_delay);
            assert!(delay <= policy.max_delay);
        }
    }
}
