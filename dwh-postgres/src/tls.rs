use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rustls::{ClientConfig, RootCertStore};
use thiserror::Error;
use tokio_postgres_rustls::MakeRustlsConnect;

/// Errors raised while preparing a TLS connector.
#[derive(Debug, Error)]
pub enum TlsSetupError {
    #[error("failed to read trusted root certificates from `{path}`: {source}")]
    ReadCertificates {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("no certificates found in `{0}`")]
    NoCertificates(PathBuf),

    #[error("invalid TLS configuration: {0}")]
    Rustls(#[from] rustls::Error),
}

/// Parses every PEM certificate in `path` into a [`RootCertStore`].
pub fn load_root_certificates(path: &Path) -> Result<RootCertStore, TlsSetupError> {
    let read_error = |source| TlsSetupError::ReadCertificates {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(read_error)?;
    let mut root_certs_reader = BufReader::new(file);

    let mut root_store = RootCertStore::empty();
    for cert in rustls_pemfile::certs(&mut root_certs_reader) {
        let cert = cert.map_err(read_error)?;
        root_store.add(cert)?;
    }

    if root_store.is_empty() {
        return Err(TlsSetupError::NoCertificates(path.to_path_buf()));
    }

    Ok(root_store)
}

/// Builds a `tokio-postgres` TLS connector that trusts only `root_store`.
///
/// The aws-lc-rs provider is passed explicitly so no process-wide default provider is needed.
pub fn make_tls_connector(root_store: RootCertStore) -> Result<MakeRustlsConnect, TlsSetupError> {
    let tls_config =
        ClientConfig::builder_with_provider(Arc::new(rustls::crypto::aws_lc_rs::default_provider()))
            .with_safe_default_protocol_versions()?
            .with_root_certificates(root_store)
            .with_no_client_auth();

    Ok(MakeRustlsConnect::new(tls_config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_bundle_is_a_read_error() {
        let path = std::env::temp_dir().join("dwh-postgres-missing-bundle.pem");
        let err = load_root_certificates(&path).unwrap_err();

        assert!(matches!(err, TlsSetupError::ReadCertificates { .. }));
    }

    #[test]
    fn bundle_without_certificates_is_rejected() {
        let path = std::env::temp_dir().join(format!(
            "dwh-postgres-empty-bundle-{}.pem",
            std::process::id()
        ));
        std::fs::write(&path, "not a certificate\n").unwrap();

        let err = load_root_certificates(&path).unwrap_err();

        assert!(matches!(err, TlsSetupError::NoCertificates(p) if p == path));
    }
}
