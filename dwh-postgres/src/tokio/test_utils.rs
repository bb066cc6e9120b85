use dwh_config::shared::{ClusterConfig, IntoConnectOptions};
use secrecy::SecretString;
use tokio::runtime::Handle;
use tokio_postgres::{Client, Config, NoTls};

/// A throwaway Postgres database that is dropped together with this value.
///
/// Dropping needs a multi threaded runtime, so tests using it must be annotated with
/// `#[tokio::test(flavor = "multi_thread")]`.
pub struct PgDatabase {
    pub config: ClusterConfig,
    pub client: Option<Client>,
}

impl PgDatabase {
    /// Creates the database named in `config` and connects to it.
    pub async fn new(config: ClusterConfig) -> Self {
        create_pg_database(&config).await;
        let client = connect(&config.with_db(None)).await;

        Self {
            config,
            client: Some(client),
        }
    }

    /// Returns the connected client.
    pub fn client(&self) -> &Client {
        self.client.as_ref().expect("client is only taken on drop")
    }
}

impl Drop for PgDatabase {
    fn drop(&mut self) {
        // The client must be gone before the database can be dropped.
        self.client.take();

        let config = self.config.clone();
        tokio::task::block_in_place(move || {
            Handle::current().block_on(drop_pg_database(&config));
        });
    }
}

async fn connect(config: &Config) -> Client {
    let (client, connection) = config
        .connect(NoTls)
        .await
        .expect("Failed to connect to Postgres");
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            eprintln!("warning: test connection error: {e}");
        }
    });

    client
}

/// Creates the database named in `config`.
///
/// # Panics
/// Panics if connection or database creation fails.
pub async fn create_pg_database(config: &ClusterConfig) {
    let client = connect(&config.without_db(None)).await;
    client
        .execute(&format!(r#"create database "{}";"#, config.db_name), &[])
        .await
        .expect("Failed to create database");
}

/// Drops the database named in `config`, terminating its connections first.
///
/// Errors are printed and otherwise ignored so cleanup never fails a test.
pub async fn drop_pg_database(config: &ClusterConfig) {
    let maintenance = config.without_db(None);
    let client = match maintenance.connect(NoTls).await {
        Ok((client, connection)) => {
            tokio::spawn(async move {
                let _ = connection.await;
            });
            client
        }
        Err(e) => {
            eprintln!("warning: failed to connect to Postgres for cleanup: {e}");
            return;
        }
    };

    if let Err(e) = client
        .execute(
            r#"
            select pg_terminate_backend(pg_stat_activity.pid)
            from pg_stat_activity
            where pg_stat_activity.datname = $1
            and pid <> pg_backend_pid();"#,
            &[&config.db_name],
        )
        .await
    {
        eprintln!(
            "warning: failed to terminate connections for database {}: {}",
            config.db_name, e
        );
    }

    if let Err(e) = client
        .execute(
            &format!(r#"drop database if exists "{}";"#, config.db_name),
            &[],
        )
        .await
    {
        eprintln!("warning: failed to drop database {}: {}", config.db_name, e);
    }
}

/// Builds a [`ClusterConfig`] for a fresh database on the local test server.
///
/// Reads `TESTS_DATABASE_HOST`, `TESTS_DATABASE_PORT`, `TESTS_DATABASE_USERNAME` and the optional
/// `TESTS_DATABASE_PASSWORD`. The database name is a random UUID.
pub fn local_cluster_config() -> ClusterConfig {
    ClusterConfig {
        host: std::env::var("TESTS_DATABASE_HOST").expect("TESTS_DATABASE_HOST must be set"),
        db_port: std::env::var("TESTS_DATABASE_PORT")
            .expect("TESTS_DATABASE_PORT must be set")
            .parse()
            .expect("TESTS_DATABASE_PORT must be a valid port number"),
        db_name: uuid::Uuid::new_v4().to_string(),
        db_user: std::env::var("TESTS_DATABASE_USERNAME")
            .expect("TESTS_DATABASE_USERNAME must be set"),
        db_password: std::env::var("TESTS_DATABASE_PASSWORD")
            .ok()
            .map(SecretString::new),
        tls_enabled: false,
        tls_root_certs: None,
        connect_timeout_secs: None,
    }
}
