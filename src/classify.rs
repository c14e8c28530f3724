//! Mapping of transport and protocol failures onto [`Error`].

use crate::codec::FailureResponse;
use crate::rate_limit::RateLimitSignal;
use crate::transport::TransportError;
use crate::{Error, ProviderError};
use url::Url;

/// What the client should do with a failed exchange.
#[derive(Debug)]
pub enum Classification {
    /// The endpoint is throttling; consult the retry policy.
    RateLimited(RateLimitSignal),
    /// Surface this error to the caller.
    Fatal(Error),
}

/// Classifies a transport failure for the endpoint at `url`.
///
/// Only HTTP 429 is non-fatal. Other statuses and unknown failures are
/// passed through unchanged.
pub fn classify_transport(err: TransportError, url: &Url) -> Classification {
    match err {
        TransportError::ConnectionRefused => Classification::Fatal(Error::ConnectionRefused {
            url: url.to_string(),
        }),
        TransportError::Timeout => Classification::Fatal(Error::NetworkTimeout {
            url: url.to_string(),
        }),
        TransportError::Status { status, headers, .. }
            if RateLimitSignal::is_rate_limited(status) =>
        {
            Classification::RateLimited(RateLimitSignal::from_headers(&headers))
        }
        TransportError::Status {
            status,
            headers,
            body,
        } => Classification::Fatal(Error::HttpError {
            status,
            raw_response: body,
            headers,
        }),
        TransportError::Other(source) => Classification::Fatal(Error::Transport(source)),
    }
}

/// Converts a failure response into the error raised to the caller.
pub fn classify_failure(failure: FailureResponse) -> Error {
    Error::Provider(ProviderError {
        code: failure.error.code,
        message: failure.error.message,
        data: failure.error.data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::ErrorObject;
    use crate::ErrorKind;
    use http::{HeaderMap, HeaderValue, StatusCode};
    use serde_json::json;

    fn endpoint() -> Url {
        Url::parse("http://node.example.com:8545/rpc").unwrap()
    }

    #[test]
    fn test_refused_and_timeout_are_fatal() {
        match classify_transport(TransportError::ConnectionRefused, &endpoint()) {
            Classification::Fatal(Error::ConnectionRefused { url }) => {
                assert_eq!(url, "http://node.example.com:8545/rpc");
            }
            other => panic!("Expected ConnectionRefused, got {:?}", other),
        }

        match classify_transport(TransportError::Timeout, &endpoint()) {
            Classification::Fatal(e) => assert_eq!(e.kind(), ErrorKind::NetworkTimeout),
            other => panic!("Expected NetworkTimeout, got {:?}", other),
        }
    }

    #[test]
    fn test_429_is_rate_limited() {
        let mut headers = HeaderMap::new();
        headers.insert("retry-after", HeaderValue::from_static("3"));

        let err = TransportError::Status {
            status: StatusCode::TOO_MANY_REQUESTS,
            headers,
            body: String::new(),
        };

        match classify_transport(err, &endpoint()) {
            Classification::RateLimited(signal) => {
                assert_eq!(signal.retry_after.as_deref(), Some("3"));
            }
            other => panic!("Expected RateLimited, got {:?}", other),
        }
    }

    #[test]
    fn test_other_status_passes_through() {
        let err = TransportError::Status {
            status: StatusCode::BAD_GATEWAY,
            headers: HeaderMap::new(),
            body: "upstream down".to_string(),
        };

        match classify_transport(err, &endpoint()) {
            Classification::Fatal(e) => {
                assert_eq!(e.status(), Some(StatusCode::BAD_GATEWAY));
                assert_eq!(e.raw_response(), Some("upstream down"));
            }
            other => panic!("Expected HttpError, got {:?}", other),
        }
    }

    #[test]
    fn test_opaque_error_passes_through() {
        let source = std::io::Error::new(std::io::ErrorKind::Other, "tls handshake");
        match classify_transport(TransportError::Other(Box::new(source)), &endpoint()) {
            Classification::Fatal(Error::Transport(inner)) => {
                assert_eq!(inner.to_string(), "tls handshake");
            }
            other => panic!("Expected Transport, got {:?}", other),
        }
    }

    #[test]
    fn test_failure_code_and_data_unchanged() {
        let err = classify_failure(FailureResponse {
            id: Some(9),
            error: ErrorObject {
                code: 3,
                message: "execution reverted".to_string(),
                data: Some(json!("0x08c379a0")),
            },
        });

        assert_eq!(err.code(), Some(3));
        assert_eq!(err.data(), Some(json!("0x08c379a0")));
    }
}
