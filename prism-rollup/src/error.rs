//! Error types for rollup planning

/// Rollup planning errors
#[derive(Debug, thiserror::Error)]
pub enum RollupError {
    #[error("Malformed interval: [{0}] is neither a fixed nor a calendar interval")]
    MalformedInterval(String),

    /// The running candidate set became empty at `node`.
    #[error("no rollup job has a {node} satisfying all query requirements")]
    NoMatchingJob { node: FailedNode },

    #[error("{0}")]
    UnsupportedAggregation(String),

    #[error("Invalid aggregation: {0}")]
    InvalidAggregation(String),

    #[error("Invalid rollup job config: {0}")]
    InvalidJobConfig(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// The query node that emptied the candidate set
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailedNode {
    /// A bucket aggregation (`date_histogram`, `histogram`, `terms`)
    Bucket { kind: &'static str, field: String },
    /// A metric aggregation, identified by its name in the query
    Metric { metric: String, name: String },
}

impl std::fmt::Display for FailedNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailedNode::Bucket { kind, field } => {
                write!(f, "[{}] agg on field [{}]", kind, field)
            }
            FailedNode::Metric { metric, name } => {
                write!(f, "[{}] agg with name [{}]", metric, name)
            }
        }
    }
}

impl RollupError {
    /// Elasticsearch exception type for the REST layer
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::MalformedInterval(_)
            | Self::NoMatchingJob { .. }
            | Self::InvalidAggregation(_)
            | Self::InvalidJobConfig(_) => "illegal_argument_exception",
            Self::UnsupportedAggregation(_) | Self::Json(_) => "parsing_exception",
            Self::Config(_) | Self::Toml(_) => "settings_exception",
            Self::Io(_) => "internal_server_error",
        }
    }

    /// Failed node, if this is a [`RollupError::NoMatchingJob`]
    pub fn failed_node(&self) -> Option<&FailedNode> {
        match self {
            Self::NoMatchingJob { node } => Some(node),
            _ => None,
        }
    }
}
