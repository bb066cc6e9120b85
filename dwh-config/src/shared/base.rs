use std::path::PathBuf;

use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required value is empty.
    #[error("`{0}` cannot be empty")]
    EmptyValue(&'static str),
    /// TLS is enabled but no trusted root certificates are provided.
    #[error("Invalid TLS config: `tls_root_certs` must be set when `tls_enabled` is true")]
    MissingTrustedRootCerts,
    /// The trusted root certificates file does not exist.
    #[error("Invalid TLS config: `{0}` is not a file")]
    TrustedRootCertsNotFound(PathBuf),
    /// The IAM role is not a role ARN.
    #[error("`{0}` is not an IAM role ARN")]
    InvalidIamRoleArn(String),
    /// An object storage location is not an `s3://` URI.
    #[error("`{key}` must be an s3:// URI, got `{value}`")]
    InvalidS3Uri { key: &'static str, value: String },
}
