//! Error types for Gramcast

use thiserror::Error;

pub type Result<T> = std::result::Result<T, GramcastError>;

#[derive(Error, Debug)]
pub enum GramcastError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Graph API error: {0}")]
    Api(#[from] ApiError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl GramcastError {
    /// Returns the appropriate process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            GramcastError::InvalidInput(_) => 3,
            GramcastError::Api(ApiError::Authentication(_)) => 2,
            GramcastError::Api(_) => 1,
            GramcastError::Config(_) => 1,
            GramcastError::Store(_) => 1,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("No access token: {0}")]
    MissingToken(String),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse {file}: {source}")]
    ParseError {
        file: String,
        source: serde_json::Error,
    },

    #[error("Failed to serialize {file}: {source}")]
    SerializeError {
        file: String,
        source: serde_json::Error,
    },

    #[error("No such entry: {0}")]
    NotFound(String),
}

/// The error envelope the Graph API returns alongside HTTP error statuses
#[derive(Debug, Clone, serde::Deserialize)]
pub struct GraphErrorBody {
    pub message: String,
    #[serde(rename = "type")]
    pub error_type: Option<String>,
    pub code: Option<i64>,
    pub error_subcode: Option<i64>,
    pub fbtrace_id: Option<String>,
}

impl std::fmt::Display for GraphErrorBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(code) = self.code {
            write!(f, " (code {}", code)?;
            if let Some(sub) = self.error_subcode {
                write!(f, ", subcode {}", sub)?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

impl GraphErrorBody {
    /// Whether this error signals an expired or invalid access token.
    ///
    /// Code 190 is OAuthException; code 102 is a session-level token problem.
    pub fn is_auth_error(&self) -> bool {
        matches!(self.code, Some(190) | Some(102))
            || self
                .error_type
                .as_deref()
                .is_some_and(|t| t.eq_ignore_ascii_case("OAuthException"))
    }
}

#[derive(Error, Debug, Clone)]
pub enum ApiError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Graph API rejected the request: {0}")]
    Graph(GraphErrorBody),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Unexpected response: {0}")]
    Decode(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_invalid_input() {
        let error = GramcastError::InvalidInput("carousel needs 2 items".to_string());
        assert_eq!(error.exit_code(), 3);
    }

    #[test]
    fn test_exit_code_authentication_error() {
        let error = GramcastError::Api(ApiError::Authentication("token expired".to_string()));
        assert_eq!(error.exit_code(), 2);
    }

    #[test]
    fn test_exit_code_network_error() {
        let error = GramcastError::Api(ApiError::Network("connection refused".to_string()));
        assert_eq!(error.exit_code(), 1);
    }

    #[test]
    fn test_exit_code_config_error() {
        let error = GramcastError::Config(ConfigError::MissingField("api.app_id".to_string()));
        assert_eq!(error.exit_code(), 1);
    }

    #[test]
    fn test_exit_code_store_error() {
        let error = GramcastError::Store(StoreError::NotFound("abc".to_string()));
        assert_eq!(error.exit_code(), 1);
    }

    #[test]
    fn test_graph_error_body_display() {
        let body = GraphErrorBody {
            message: "Media ID is not available".to_string(),
            error_type: Some("OAuthException".to_string()),
            code: Some(9007),
            error_subcode: Some(2207027),
            fbtrace_id: None,
        };
        let rendered = format!("{}", body);
        assert_eq!(
            rendered,
            "Media ID is not available (code 9007, subcode 2207027)"
        );
    }

    #[test]
    fn test_graph_error_body_display_without_codes() {
        let body = GraphErrorBody {
            message: "Unknown error".to_string(),
            error_type: None,
            code: None,
            error_subcode: None,
            fbtrace_id: None,
        };
        assert_eq!(format!("{}", body), "Unknown error");
    }

    #[test]
    fn test_graph_error_body_auth_detection() {
        let oauth = GraphErrorBody {
            message: "Error validating access token".to_string(),
            error_type: Some("OAuthException".to_string()),
            code: Some(190),
            error_subcode: None,
            fbtrace_id: Some("AbCdEf".to_string()),
        };
        assert!(oauth.is_auth_error());

        let other = GraphErrorBody {
            message: "Unsupported request".to_string(),
            error_type: Some("GraphMethodException".to_string()),
            code: Some(100),
            error_subcode: None,
            fbtrace_id: None,
        };
        assert!(!other.is_auth_error());
    }

    #[test]
    fn test_graph_error_body_deserialization() {
        let json = r#"{
            "message": "Invalid parameter",
            "type": "OAuthException",
            "code": 100,
            "error_subcode": 2207006,
            "fbtrace_id": "AxyzT"
        }"#;
        let body: GraphErrorBody = serde_json::from_str(json).unwrap();
        assert_eq!(body.message, "Invalid parameter");
        assert_eq!(body.code, Some(100));
        assert_eq!(body.error_subcode, Some(2207006));
    }

    #[test]
    fn test_error_message_formatting() {
        let error = GramcastError::Api(ApiError::Network("timed out".to_string()));
        assert_eq!(format!("{}", error), "Graph API error: Network error: timed out");

        let error = GramcastError::InvalidInput("bad schedule".to_string());
        assert_eq!(format!("{}", error), "Invalid input: bad schedule");
    }

    #[test]
    fn test_error_conversion_from_sources() {
        let config_error = ConfigError::MissingField("store.dir".to_string());
        let err: GramcastError = config_error.into();
        assert!(matches!(err, GramcastError::Config(_)));

        let store_error = StoreError::NotFound("id".to_string());
        let err: GramcastError = store_error.into();
        assert!(matches!(err, GramcastError::Store(_)));

        let api_error = ApiError::Decode("no id field".to_string());
        let err: GramcastError = api_error.into();
        assert!(matches!(err, GramcastError::Api(_)));
    }

    #[test]
    fn test_exit_code_consistency() {
        // Authentication always maps to 2, regardless of message
        let a = GramcastError::Api(ApiError::Authentication("x".to_string()));
        let b = GramcastError::Api(ApiError::Authentication("y".to_string()));
        assert_eq!(a.exit_code(), b.exit_code());

        // Graph-level rejections are operational failures, not auth failures
        let graph = GramcastError::Api(ApiError::Graph(GraphErrorBody {
            message: "rate limited".to_string(),
            error_type: None,
            code: Some(4),
            error_subcode: None,
            fbtrace_id: None,
        }));
        assert_eq!(graph.exit_code(), 1);
    }
}
