use std::future::Future;

use dwh_config::shared::{ClusterConfig, IntoConnectOptions, PgConnectionOptions};
use dwh_postgres::tls::{load_root_certificates, make_tls_connector};
use tokio_postgres::tls::MakeTlsConnect;
use tokio_postgres::{Client, Config, Connection, NoTls, Socket};
use tracing::{Instrument, error, info};

use crate::bail;
use crate::error::{DwhResult, ErrorKind};

/// A connection to the warehouse that runs SQL text and reports only success or failure.
///
/// Transaction control has default implementations in terms of [`WarehouseClient::execute`].
pub trait WarehouseClient {
    /// Executes `sql`, which may contain several statements, discarding any rows it returns.
    fn execute(&self, sql: &str) -> impl Future<Output = DwhResult<()>> + Send;

    fn begin(&self) -> impl Future<Output = DwhResult<()>> + Send {
        self.execute("BEGIN")
    }

    fn commit(&self) -> impl Future<Output = DwhResult<()>> + Send {
        self.execute("COMMIT")
    }

    fn rollback(&self) -> impl Future<Output = DwhResult<()>> + Send {
        self.execute("ROLLBACK")
    }

    /// Closes the connection. The client is not usable afterwards.
    fn close(self) -> impl Future<Output = DwhResult<()>> + Send
    where
        Self: Sized;
}

/// Spawns a background task that drives `connection` until it terminates.
fn spawn_postgres_connection<T>(connection: Connection<Socket, T::Stream>)
where
    T: MakeTlsConnect<Socket>,
    T::Stream: Send + 'static,
{
    let span = tracing::Span::current();
    let task = async move {
        match connection.await {
            Err(err) => error!("an error occurred during the warehouse connection: {}", err),
            Ok(()) => info!("warehouse connection terminated successfully"),
        }
    }
    .instrument(span);

    // The task ends on its own once the `Client` is dropped.
    tokio::spawn(task);
}

/// [`WarehouseClient`] backed by a `tokio-postgres` connection.
#[derive(Debug)]
pub struct PgWarehouseClient {
    client: Client,
}

impl PgWarehouseClient {
    /// Connects to the database in `cluster`, with TLS when it is enabled.
    pub async fn connect(
        cluster: &ClusterConfig,
        options: &PgConnectionOptions,
    ) -> DwhResult<PgWarehouseClient> {
        let config: Config = cluster.with_db(Some(options));

        if cluster.tls_enabled {
            let Some(path) = &cluster.tls_root_certs else {
                bail!(
                    ErrorKind::ConfigError,
                    "TLS is enabled but no trusted root certificates are configured"
                );
            };

            let connector = make_tls_connector(load_root_certificates(path)?)?;
            let (client, connection) = config.connect(connector).await?;
            spawn_postgres_connection::<tokio_postgres_rustls::MakeRustlsConnect>(connection);

            info!(host = %cluster.host, db_name = %cluster.db_name, "connected to the warehouse with tls");

            return Ok(PgWarehouseClient { client });
        }

        let (client, connection) = config.connect(NoTls).await?;
        spawn_postgres_connection::<NoTls>(connection);

        info!(host = %cluster.host, db_name = %cluster.db_name, "connected to the warehouse without tls");

        Ok(PgWarehouseClient { client })
    }
}

impl WarehouseClient for PgWarehouseClient {
    async fn execute(&self, sql: &str) -> DwhResult<()> {
        // Simple query protocol: no parameters, several statements allowed.
        self.client.batch_execute(sql).await?;

        Ok(())
    }

    async fn close(self) -> DwhResult<()> {
        // Dropping the client sends a terminate message and lets the connection task finish.
        drop(self.client);

        Ok(())
    }
}
