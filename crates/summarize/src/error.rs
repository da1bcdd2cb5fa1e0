use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum SummaryError {
    #[error("invalid completion config: {0}")]
    InvalidConfig(String),
    #[error("completion request failed: {0}")]
    Http(String),
    #[error("completion API error {status}: {body}")]
    Api { status: u16, body: String },
    #[error("invalid completion response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for SummaryError {
    fn from(err: reqwest::Error) -> Self {
        SummaryError::Http(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_display() {
        let err = SummaryError::Api {
            status: 429,
            body: "Rate limit reached".into(),
        };
        assert_eq!(err.to_string(), "completion API error 429: Rate limit reached");
    }
}
