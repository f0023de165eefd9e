//! Error types for the Cosmos client.

use thiserror::Error;

/// Client operation errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// Endpoint URI could not be parsed
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Connection error (network, DNS, timeout)
    #[error("Connection error: {0}")]
    Connection(String),

    /// The node has no record of the requested item
    #[error("Not found: {0}")]
    NotFound(String),

    /// The node does not implement the called method
    #[error("Method unimplemented: {0}")]
    Unimplemented(String),

    /// Any other gRPC failure
    #[error("gRPC error: {code}: {message}")]
    Grpc {
        /// Status code returned by the node
        code: tonic::Code,
        /// Status message returned by the node
        message: String,
    },

    /// A paginated query did not terminate
    #[error("Pagination error: {0}")]
    Pagination(String),

    /// A required response field was absent
    #[error("Response is missing {0}")]
    MissingField(&'static str),

    /// An `Any` carried a type URL this client cannot decode
    #[error("Unknown account type: {0}")]
    UnknownAccountType(String),

    /// An `Any` payload did not decode
    #[error("Decode error: {0}")]
    Decode(#[from] prost::DecodeError),

    /// Blocking runtime could not be created
    #[error("Runtime error: {0}")]
    Runtime(#[from] std::io::Error),
}

impl From<tonic::Status> for ClientError {
    fn from(status: tonic::Status) -> Self {
        use tonic::Code;

        match status.code() {
            Code::Unavailable => {
                ClientError::Connection(format!("gRPC unavailable: {}", status.message()))
            }
            Code::DeadlineExceeded => ClientError::Connection("Request timeout".to_string()),
            Code::NotFound => ClientError::NotFound(status.message().to_string()),
            Code::Unimplemented => ClientError::Unimplemented(status.message().to_string()),
            code => ClientError::Grpc {
                code,
                message: status.message().to_string(),
            },
        }
    }
}

impl From<tonic::transport::Error> for ClientError {
    fn from(e: tonic::transport::Error) -> Self {
        ClientError::Connection(e.to_string())
    }
}

impl From<cosmos_proto::Error> for ClientError {
    fn from(e: cosmos_proto::Error) -> Self {
        match e {
            cosmos_proto::Error::Runtime(e) => ClientError::Runtime(e),
            cosmos_proto::Error::Transport(e) => ClientError::from(e),
        }
    }
}

impl ClientError {
    /// Whether retrying the call could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, ClientError::Connection(_))
    }
}
