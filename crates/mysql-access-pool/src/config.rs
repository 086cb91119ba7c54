//! Pool and connection configuration.

use crate::error::PoolError;

/// Default number of connections opened eagerly at pool creation.
pub const DEFAULT_MIN_CONNECTIONS: u32 = 2;

/// Default pool capacity ceiling.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// Parameters for opening MySQL connections.
///
/// Immutable for the lifetime of a pool; the pool keeps a copy and uses it
/// to open replacement and expansion connections on demand.
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    /// Server hostname or IP address.
    pub host: String,

    /// Server port (default: 3306).
    pub port: u16,

    /// User name.
    pub user: String,

    /// Password.
    pub password: String,

    /// Database name.
    pub database: String,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 3306,
            user: String::new(),
            password: String::new(),
            database: String::new(),
        }
    }
}

impl ConnectOptions {
    /// Create options with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `key=value;` connection string.
    ///
    /// ```text
    /// host=localhost;port=3306;user=root;password=secret;database=mydb
    /// ```
    pub fn from_connection_string(conn_str: &str) -> Result<Self, PoolError> {
        let mut opts = Self::default();

        for part in conn_str.split(';') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }

            let (key, value) = part
                .split_once('=')
                .ok_or_else(|| PoolError::Config(format!("invalid key-value: {part}")))?;

            let key = key.trim().to_lowercase();
            let value = value.trim();

            match key.as_str() {
                "host" | "server" => {
                    if let Some((host, port)) = value.split_once(':') {
                        opts.host = host.to_string();
                        opts.port = port
                            .parse()
                            .map_err(|_| PoolError::Config(format!("invalid port: {port}")))?;
                    } else {
                        opts.host = value.to_string();
                    }
                }
                "port" => {
                    opts.port = value
                        .parse()
                        .map_err(|_| PoolError::Config(format!("invalid port: {value}")))?;
                }
                "user" | "uid" | "user id" => {
                    opts.user = value.to_string();
                }
                "password" | "pwd" => {
                    opts.password = value.to_string();
                }
                "database" | "db" | "initial catalog" => {
                    opts.database = value.to_string();
                }
                _ => {
                    // Ignore unknown options for forward compatibility
                    tracing::debug!(key, value, "ignoring unknown connection string option");
                }
            }
        }

        Ok(opts)
    }

    /// Set the server host.
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the server port.
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the user name.
    #[must_use]
    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    /// Set the password.
    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    /// Set the database name.
    #[must_use]
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    /// Check the options before any network activity.
    pub fn validate(&self) -> Result<(), PoolError> {
        if self.host.is_empty() {
            return Err(PoolError::Config("host must not be empty".to_string()));
        }
        if self.database.is_empty() {
            return Err(PoolError::Config("database must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Pool sizing bounds.
#[derive(Debug, Clone, Copy)]
pub struct PoolConfig {
    /// Connections opened eagerly at pool creation.
    pub min_connections: u32,

    /// Capacity ceiling; the pool grows lazily up to this many slots and
    /// never beyond.
    pub max_connections: u32,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            min_connections: DEFAULT_MIN_CONNECTIONS,
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

impl PoolConfig {
    /// Create a configuration with default sizing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the minimum number of connections.
    #[must_use]
    pub fn min_connections(mut self, count: u32) -> Self {
        self.min_connections = count;
        self
    }

    /// Set the maximum number of connections.
    #[must_use]
    pub fn max_connections(mut self, count: u32) -> Self {
        self.max_connections = count;
        self
    }

    /// Check the sizing bounds.
    pub fn validate(&self) -> Result<(), PoolError> {
        if self.max_connections == 0 {
            return Err(PoolError::Config(
                "max_connections must be at least 1".to_string(),
            ));
        }
        if self.min_connections > self.max_connections {
            return Err(PoolError::Config(format!(
                "min_connections ({}) exceeds max_connections ({})",
                self.min_connections, self.max_connections
            )));
        }
        Ok(())
    }
}
