//! The connection adapter.
//!
//! [`ClickHouseAdapter`] parses a connection string at construction,
//! opens its session lazily on first query, and keeps it for the
//! adapter's lifetime until an explicit [`disconnect`]. Queries are
//! sent verbatim; row-tuple results are normalized into ordered
//! [`Record`]s with synthesized `col_i` keys.
//!
//! The adapter has two observable states, unconnected and connected,
//! with a one-way transition on first successful connect. One adapter
//! instance serves one caller at a time; concurrent callers should each
//! construct their own.
//!
//! [`disconnect`]: ClickHouseAdapter::disconnect

use std::sync::Arc;

use async_lock::RwLock;

use crate::error::{AdapterError, AdapterResult};
use crate::row::{ColumnDescriptor, QueryOutput, Record};
use crate::transport::{HttpTransport, QueryTransport, RawResult};
use crate::uri::ConnectionDescriptor;

/// Connection adapter for a ClickHouse analytical store.
pub struct ClickHouseAdapter {
    descriptor: ConnectionDescriptor,
    transport: Arc<dyn QueryTransport>,
    /// Lazily established session; `Some` once the probe has succeeded
    session: RwLock<Option<Arc<dyn QueryTransport>>>,
}

impl std::fmt::Debug for ClickHouseAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClickHouseAdapter")
            .field("descriptor", &self.descriptor)
            .field("transport", &"<QueryTransport>")
            .finish()
    }
}

impl ClickHouseAdapter {
    /// Parse a connection string and build an adapter over the HTTP
    /// transport.
    ///
    /// This does not connect; the session is opened on the first query
    /// or by calling [`connect`](Self::connect) explicitly.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Parse`] for a malformed connection
    /// string, before any I/O happens.
    pub fn new(uri: &str) -> AdapterResult<Self> {
        let descriptor = ConnectionDescriptor::parse(uri)?;
        let transport = Arc::new(HttpTransport::from_descriptor(&descriptor));
        Ok(Self::with_transport(descriptor, transport))
    }

    /// Build an adapter over an explicit transport. Used by tests and
    /// by hosts that bring their own session implementation.
    pub fn with_transport(
        descriptor: ConnectionDescriptor,
        transport: Arc<dyn QueryTransport>,
    ) -> Self {
        Self {
            descriptor,
            transport,
            session: RwLock::new(None),
        }
    }

    /// The parsed connection descriptor.
    pub fn descriptor(&self) -> &ConnectionDescriptor {
        &self.descriptor
    }

    /// Human-readable connection identity, `user@host:port/database`.
    pub fn display_name(&self) -> String {
        self.descriptor.display_name()
    }

    /// Establish the session.
    ///
    /// Issues the liveness probe; on success the session is stored and
    /// reused for every subsequent query. Failures are logged and
    /// returned unchanged; there is no retry.
    pub async fn connect(&self) -> AdapterResult<()> {
        if let Err(e) = self.transport.probe().await {
            tracing::error!("Failed to connect to ClickHouse: {}", e);
            return Err(e);
        }

        let mut guard = self.session.write().await;
        *guard = Some(self.transport.clone());
        tracing::info!(
            "Successfully connected to ClickHouse at {}:{}",
            self.descriptor.host,
            self.descriptor.port
        );
        Ok(())
    }

    /// Release the session, returning the adapter to the unconnected
    /// state.
    ///
    /// # Errors
    ///
    /// Returns an error if no session is active.
    pub async fn disconnect(&self) -> AdapterResult<()> {
        let mut guard = self.session.write().await;
        if guard.take().is_some() {
            Ok(())
        } else {
            Err(AdapterError::Connection(
                "no active session to disconnect".to_string(),
            ))
        }
    }

    /// Check whether the session is active and the store still answers
    /// the liveness probe.
    pub async fn is_connected(&self) -> bool {
        let guard = self.session.read().await;
        match guard.as_ref() {
            Some(session) => session.probe().await.is_ok(),
            None => false,
        }
    }

    /// Get the session, connecting lazily if none exists yet.
    async fn session(&self) -> AdapterResult<Arc<dyn QueryTransport>> {
        if let Some(session) = self.session.read().await.clone() {
            return Ok(session);
        }
        self.connect().await?;
        let guard = self.session.read().await;
        guard
            .clone()
            .ok_or_else(|| AdapterError::Connection("session not established".to_string()))
    }

    /// Execute a query verbatim and normalize the result.
    ///
    /// Row-tuple results become ordered [`Record`]s keyed `col_0`,
    /// `col_1`, ...; anything else is passed through as
    /// [`QueryOutput::Raw`]. The caller is trusted: the query is not
    /// parsed or validated here.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Connection`] if the lazy connect fails
    /// and [`AdapterError::Query`] if the store rejects the statement.
    /// Both are logged before propagating.
    pub async fn execute(&self, sql: &str) -> AdapterResult<QueryOutput> {
        let session = self.session().await?;

        match session.execute(sql).await {
            Ok(RawResult::Rows(rows)) => Ok(QueryOutput::Records(
                rows.into_iter().map(Record::from_tuple).collect(),
            )),
            Ok(RawResult::Opaque(value)) => Ok(QueryOutput::Raw(value)),
            Err(e) => {
                tracing::error!("Query execution failed: {}", e);
                Err(e)
            }
        }
    }

    /// List the tables in the connected database, in the order the
    /// store reports them.
    ///
    /// # Errors
    ///
    /// Introspection failures are logged and propagated, so callers can
    /// tell an empty schema apart from a failed lookup.
    pub async fn table_names(&self) -> AdapterResult<Vec<String>> {
        let output = match self.execute("SHOW TABLES").await {
            Ok(output) => output,
            Err(e) => {
                tracing::error!("Failed to get table names: {}", e);
                return Err(e);
            }
        };

        let names = match output {
            QueryOutput::Records(records) => records
                .iter()
                .filter_map(|record| record.first_value()?.as_str().map(str::to_string))
                .collect(),
            QueryOutput::Raw(_) => vec![],
        };
        Ok(names)
    }

    /// Describe the columns of a table.
    ///
    /// Name and type come from the store's describe query; nullability
    /// is reported as true across the board since the store does not
    /// surface it here.
    ///
    /// # Errors
    ///
    /// Same policy as [`table_names`](Self::table_names): logged, then
    /// propagated.
    pub async fn columns(&self, table: &str) -> AdapterResult<Vec<ColumnDescriptor>> {
        let output = match self.execute(&format!("DESCRIBE TABLE {}", table)).await {
            Ok(output) => output,
            Err(e) => {
                tracing::error!("Failed to get columns for table {}: {}", table, e);
                return Err(e);
            }
        };

        let columns = match output {
            QueryOutput::Records(records) => records
                .iter()
                .filter_map(|record| {
                    let name = record.value_at(0)?.as_str()?.to_string();
                    let type_name = record.value_at(1)?.as_str()?.to_string();
                    Some(ColumnDescriptor::new(name, type_name))
                })
                .collect(),
            QueryOutput::Raw(_) => vec![],
        };
        Ok(columns)
    }
}
