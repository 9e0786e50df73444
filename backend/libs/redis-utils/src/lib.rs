use anyhow::{Context, Result};
use redis::aio::ConnectionManager;
use redis::{Client, ConnectionAddr, ConnectionInfo, IntoConnectionInfo, RedisConnectionInfo};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

/// Shared Redis connection manager guarded by a Tokio mutex.
pub type SharedConnectionManager = Arc<Mutex<ConnectionManager>>;

/// Where to find Redis: either a full URL or discrete address parts.
#[derive(Clone, Debug, PartialEq)]
pub enum RedisTarget {
    Url(String),
    Address {
        /// `host:port`
        address: String,
        password: Option<String>,
        database: i64,
    },
}

impl RedisTarget {
    fn connection_info(&self) -> Result<ConnectionInfo> {
        match self {
            RedisTarget::Url(url) => url
                .as_str()
                .into_connection_info()
                .context("failed to parse REDIS_URL connection string"),
            RedisTarget::Address {
                address,
                password,
                database,
            } => {
                let (host, port) = split_address(address)?;
                Ok(ConnectionInfo {
                    addr: ConnectionAddr::Tcp(host, port),
                    redis: RedisConnectionInfo {
                        db: *database,
                        username: None,
                        password: password.clone().filter(|p| !p.is_empty()),
                        ..Default::default()
                    },
                })
            }
        }
    }

    /// Log-safe description (no credentials)
    pub fn label(&self) -> String {
        match self {
            RedisTarget::Url(url) => match url.rsplit_once('@') {
                Some((_, host)) => format!("redis://***@{}", host),
                None => url.clone(),
            },
            RedisTarget::Address {
                address, database, ..
            } => format!("{}/{}", address, database),
        }
    }
}

fn split_address(address: &str) -> Result<(String, u16)> {
    match address.rsplit_once(':') {
        Some((host, port)) => {
            let port = port
                .parse::<u16>()
                .with_context(|| format!("invalid Redis port in '{}'", address))?;
            Ok((host.to_string(), port))
        }
        None => Ok((address.to_string(), 6379)),
    }
}

/// Redis connection handle shared by every cache component.
pub struct RedisPool {
    manager: SharedConnectionManager,
    label: String,
}

impl RedisPool {
    pub async fn connect(target: &RedisTarget) -> Result<Self> {
        let info = target.connection_info()?;
        let client = Client::open(info).context("failed to construct Redis client")?;
        let connection_manager = ConnectionManager::new(client)
            .await
            .context("failed to initialize Redis connection manager")?;

        let label = target.label();
        info!("Connected to Redis at {}", label);

        Ok(Self {
            manager: Arc::new(Mutex::new(connection_manager)),
            label,
        })
    }

    pub fn manager(&self) -> SharedConnectionManager {
        self.manager.clone()
    }

    pub async fn ping(&self) -> Result<()> {
        let mut conn = self.manager.lock().await;
        let pong: String = redis::cmd("PING")
            .query_async(&mut *conn)
            .await
            .context("Redis PING failed")?;
        anyhow::ensure!(pong == "PONG", "unexpected PING response: {}", pong);
        Ok(())
    }

    /// Wait for in-flight commands holding the connection, then release it.
    ///
    /// The underlying socket closes once the last clone of the manager is
    /// dropped.
    pub async fn shutdown(self) {
        let _guard = self.manager.lock().await;
        info!("Redis connection to {} released", self.label);
    }
}
