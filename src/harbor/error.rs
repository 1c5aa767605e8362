use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HarborError {
    #[error("Request to {url} failed")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Harbor returned {status} for {url}: {body}")]
    Status {
        url: String,
        status: StatusCode,
        body: String,
    },

    #[error("Failed to decode response from {url}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Invalid repository name '{0}': expected '<project>/<repository>'")]
    InvalidRepositoryName(String),

    #[error("Failed to build HTTP client")]
    Client(#[source] reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::ServiceError;

    fn builder_error() -> reqwest::Error {
        reqwest::Client::new()
            .get("not a url")
            .build()
            .unwrap_err()
    }

    #[test]
    fn test_cause_is_not_repeated_in_message() {
        let source = builder_error();
        let cause = source.to_string();
        let err = HarborError::Transport {
            url: "http://harbor.test/api/v2.0/projects".to_string(),
            source,
        };
        assert_eq!(
            err.to_string(),
            "Request to http://harbor.test/api/v2.0/projects failed"
        );

        let rendered =
            ServiceError::internal_anyhow(anyhow::Error::from(err), "Failed to get projects")
                .to_string();
        assert_eq!(rendered.matches(cause.as_str()).count(), 1, "{}", rendered);
        assert!(rendered.starts_with(
            "Failed to get projects: Request to http://harbor.test/api/v2.0/projects failed: "
        ));
    }

    #[test]
    fn test_client_error_chains_once() {
        let source = builder_error();
        let cause = source.to_string();
        let rendered = format!("{:#}", anyhow::Error::from(HarborError::Client(source)));
        assert_eq!(rendered, format!("Failed to build HTTP client: {}", cause));
    }
}
