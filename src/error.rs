use thiserror::Error;

const BODY_SNIPPET_CHARS: usize = 300;

/// Failure raised by a stage provider adapter. The orchestrator records the
/// display string on the failed stage, whichever provider produced it.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{service}: request timed out")]
    Timeout { service: &'static str },

    #[error("{service}: credentials rejected (HTTP {status})")]
    Auth { service: &'static str, status: u16 },

    #[error("{service}: quota exhausted (HTTP {status})")]
    Quota { service: &'static str, status: u16 },

    #[error("{service}: HTTP {status}: {detail}")]
    Http {
        service: &'static str,
        status: u16,
        detail: String,
    },

    #[error("{service}: transport failure: {detail}")]
    Transport {
        service: &'static str,
        detail: String,
    },

    #[error("{service}: malformed response: {detail}")]
    Malformed {
        service: &'static str,
        detail: String,
    },

    #[error("{service}: {source}")]
    Io {
        service: &'static str,
        #[source]
        source: std::io::Error,
    },
}

impl ProviderError {
    pub fn from_status(service: &'static str, status: u16, body: &str) -> Self {
        match status {
            401 | 403 => Self::Auth { service, status },
            402 | 429 => Self::Quota { service, status },
            _ => Self::Http {
                service,
                status,
                detail: body.chars().take(BODY_SNIPPET_CHARS).collect(),
            },
        }
    }

    pub fn from_reqwest(service: &'static str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::Timeout { service };
        }
        match err.status() {
            Some(status) => Self::Http {
                service,
                status: status.as_u16(),
                detail: err.to_string(),
            },
            None => Self::Transport {
                service,
                detail: err.to_string(),
            },
        }
    }

    pub fn io(service: &'static str, source: std::io::Error) -> Self {
        Self::Io { service, source }
    }

    pub fn malformed(service: &'static str, detail: impl Into<String>) -> Self {
        Self::Malformed {
            service,
            detail: detail.into(),
        }
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert!(matches!(
            ProviderError::from_status("pexels", 401, ""),
            ProviderError::Auth { status: 401, .. }
        ));
        assert!(matches!(
            ProviderError::from_status("pexels", 429, ""),
            ProviderError::Quota { status: 429, .. }
        ));
        assert!(matches!(
            ProviderError::from_status("pexels", 502, "bad gateway"),
            ProviderError::Http { status: 502, .. }
        ));
    }

    #[test]
    fn http_detail_is_truncated() {
        let body = "x".repeat(2000);
        match ProviderError::from_status("openai", 500, &body) {
            ProviderError::Http { detail, .. } => assert_eq!(detail.len(), 300),
            other => panic!("unexpected variant: {other:?}"),
        }
    }
}
