use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::LazyLock;
use std::time::Duration;
use tokio_postgres::{Config as TokioPgConnectOptions, config::SslMode as TokioPgSslMode};

use crate::shared::ValidationError;

const APP_NAME_PROVISIONING: &str = "dwh_create_tables";
const APP_NAME_LOAD: &str = "dwh_etl";

/// Session options for the provisioning run.
pub static DWH_PROVISIONING_OPTIONS: LazyLock<PgConnectionOptions> =
    LazyLock::new(|| PgConnectionOptions {
        application_name: APP_NAME_PROVISIONING.to_string(),
        statement_timeout_ms: None,
    });

/// Session options for the load-and-transform run.
///
/// No statement timeout is set: a `COPY` from object storage can legitimately run for a long time.
pub static DWH_LOAD_OPTIONS: LazyLock<PgConnectionOptions> =
    LazyLock::new(|| PgConnectionOptions {
        application_name: APP_NAME_LOAD.to_string(),
        statement_timeout_ms: None,
    });

/// Per-session options sent in the startup packet.
#[derive(Debug, Clone)]
pub struct PgConnectionOptions {
    pub application_name: String,
    /// Server side statement timeout, `None` leaves the server default in place.
    pub statement_timeout_ms: Option<u32>,
}

impl PgConnectionOptions {
    /// Returns the `-c key=value` list for the `options` startup parameter, if any.
    pub fn to_options_string(&self) -> Option<String> {
        self.statement_timeout_ms
            .map(|timeout| format!("-c statement_timeout={timeout}"))
    }
}

/// The `[CLUSTER]` section: where the warehouse lives and how to log in.
#[derive(Debug, Clone, Deserialize)]
pub struct ClusterConfig {
    pub host: String,
    pub db_name: String,
    pub db_user: String,
    /// Sensitive, redacted in debug output.
    pub db_password: Option<SecretString>,
    pub db_port: u16,
    #[serde(default)]
    pub tls_enabled: bool,
    /// Path to a PEM bundle with the certificates used to verify the warehouse.
    #[serde(default)]
    pub tls_root_certs: Option<PathBuf>,
    #[serde(default)]
    pub connect_timeout_secs: Option<u64>,
}

impl ClusterConfig {
    /// Validates the [`ClusterConfig`].
    ///
    /// Returns [`ValidationError::MissingTrustedRootCerts`] if TLS is enabled without a
    /// certificate bundle.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.host.trim().is_empty() {
            return Err(ValidationError::EmptyValue("host"));
        }
        if self.db_name.trim().is_empty() {
            return Err(ValidationError::EmptyValue("db_name"));
        }
        if self.db_user.trim().is_empty() {
            return Err(ValidationError::EmptyValue("db_user"));
        }

        if self.tls_enabled {
            match &self.tls_root_certs {
                None => return Err(ValidationError::MissingTrustedRootCerts),
                Some(path) if !path.is_file() => {
                    return Err(ValidationError::TrustedRootCertsNotFound(path.clone()));
                }
                Some(_) => {}
            }
        }

        Ok(())
    }
}

/// Converts connection settings into driver specific connect options.
pub trait IntoConnectOptions<Output> {
    /// Connect options for the server's maintenance database, used to create or drop databases.
    fn without_db(&self, options: Option<&PgConnectionOptions>) -> Output;

    /// Connect options for the configured database.
    fn with_db(&self, options: Option<&PgConnectionOptions>) -> Output;
}

impl IntoConnectOptions<TokioPgConnectOptions> for ClusterConfig {
    fn without_db(&self, options: Option<&PgConnectionOptions>) -> TokioPgConnectOptions {
        let ssl_mode = if self.tls_enabled {
            TokioPgSslMode::Require
        } else {
            TokioPgSslMode::Prefer
        };
        let mut config = TokioPgConnectOptions::new();
        config
            .host(&self.host)
            .port(self.db_port)
            .user(&self.db_user)
            .ssl_mode(ssl_mode);

        if let Some(password) = &self.db_password {
            config.password(password.expose_secret());
        }

        if let Some(timeout) = self.connect_timeout_secs {
            config.connect_timeout(Duration::from_secs(timeout));
        }

        if let Some(opts) = options {
            config.application_name(&opts.application_name);
            if let Some(options_string) = opts.to_options_string() {
                config.options(&options_string);
            }
        }

        config
    }

    fn with_db(&self, options: Option<&PgConnectionOptions>) -> TokioPgConnectOptions {
        let mut config: TokioPgConnectOptions = self.without_db(options);
        config.dbname(&self.db_name);
        config
    }
}
