use thiserror::Error;

/// Errors that can occur while running the sensor agent.
#[derive(Error, Debug)]
pub enum Error {
    /// Wrong number of process arguments.
    #[error("Incorrect number of arguments.")]
    Usage,

    /// The endpoint rejected the supplied credentials.
    #[error("invalid credentials for endpoint {endpoint_id}")]
    Authentication { endpoint_id: String },

    /// The device-management endpoint could not be reached.
    #[error("device endpoint unavailable: {0}")]
    Unavailable(String),

    /// An operation that requires an activated device ran before activation.
    #[error("device {endpoint_id} is not activated")]
    NotActivated { endpoint_id: String },

    /// Activation was attempted and failed.
    #[error("activation of {endpoint_id} failed")]
    Activation {
        endpoint_id: String,
        #[source]
        source: Box<Error>,
    },

    /// No device model is registered under the requested URN.
    #[error("unknown device model: {0}")]
    UnknownModel(String),

    /// The model does not define the attribute being set.
    #[error("attribute \"{attribute}\" is not defined by {model_urn}")]
    UnknownAttribute { attribute: String, model_urn: String },

    /// The value kind does not match the model's attribute kind.
    #[error("attribute \"{attribute}\" expects a {expected} value")]
    TypeMismatch {
        attribute: String,
        expected: &'static str,
    },

    /// An attribute update was not acknowledged.
    #[error("failed to set attributes on {endpoint_id}")]
    Publish {
        endpoint_id: String,
        #[source]
        source: Box<Error>,
    },

    /// The device channel was used after `close()`.
    #[error("device channel is closed")]
    Closed,

    /// A device model document could not be parsed.
    #[error("invalid device model document: {0}")]
    Model(#[from] serde_json::Error),
}

impl Error {
    // ---

    pub(crate) fn activation(endpoint_id: impl Into<String>, source: Error) -> Self {
        Error::Activation {
            endpoint_id: endpoint_id.into(),
            source: Box::new(source),
        }
    }

    pub(crate) fn publish(endpoint_id: impl Into<String>, source: Error) -> Self {
        Error::Publish {
            endpoint_id: endpoint_id.into(),
            source: Box::new(source),
        }
    }
}

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, Error>;
