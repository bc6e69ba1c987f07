//! Test helpers for the Aiven API

#[cfg(test)]
pub fn create_test_client(url: &str) -> super::Client {
    let config = super::ClientConfig {
        retry: super::RetryConfig {
            max_retries: 0,
            initial_backoff_ms: 1,
            max_backoff_ms: 1,
            timeout_seconds: 5,
        },
        ..Default::default()
    };
    super::Client::with_config(url, "secret-token", config).unwrap()
}
