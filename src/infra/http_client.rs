use std::time::Duration;

use reqwest::Client;

const USER_AGENT: &str = concat!("sourcerer/", env!("CARGO_PKG_VERSION"));

/// Shared reqwest client setup for the search index and the ATT&CK catalog
pub fn build_client(timeout_seconds: u64) -> reqwest::Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(timeout_seconds))
        .build()
}

/// Keep error bodies short enough for a log line
pub(crate) fn truncate_body(body: &str) -> &str {
    const LIMIT: usize = 512;
    if body.len() <= LIMIT {
        return body;
    }
    let mut end = LIMIT;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let body = "é".repeat(400);
        let truncated = truncate_body(&body);
        assert!(truncated.len() <= 512);
        assert!(truncated.chars().all(|c| c == 'é'));
        assert_eq!(truncate_body("short"), "short");
    }
}
