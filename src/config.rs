use std::collections::HashMap;

use serde::Deserialize;

use crate::error::DatasourceError;

/// Settings as persisted by the host for one datasource instance.
#[derive(Debug, Clone, Default)]
pub struct DatasourceSettings {
    /// Raw JSON blob of the non-secret settings.
    pub json_data: Vec<u8>,
    /// Secrets the host decrypted for us; `token` here wins over the JSON one.
    pub decrypted_secure_json_data: HashMap<String, String>,
}

impl DatasourceSettings {
    #[must_use]
    pub fn from_json(json_data: impl Into<Vec<u8>>) -> Self {
        Self {
            json_data: json_data.into(),
            decrypted_secure_json_data: HashMap::new(),
        }
    }
}

/// Options for connecting to a Flight SQL engine.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConnectionSettings {
    pub host: String,
    #[serde(default)]
    pub database: String,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub secure: bool,
}

impl ConnectionSettings {
    #[must_use]
    pub fn new(host: String, database: String, token: String, secure: bool) -> Self {
        Self {
            host,
            database,
            token,
            secure,
        }
    }

    /// Parse the host's persisted settings.
    ///
    /// # Errors
    ///
    /// Returns `DatasourceError::ConfigError` if the JSON does not match the settings shape.
    pub fn from_instance_settings(settings: &DatasourceSettings) -> Result<Self, DatasourceError> {
        let mut cfg: ConnectionSettings = serde_json::from_slice(&settings.json_data)
            .map_err(|e| DatasourceError::ConfigError(format!("config: {e}")))?;
        if let Some(token) = settings.decrypted_secure_json_data.get("token") {
            cfg.token.clone_from(token);
        }
        Ok(cfg)
    }

    /// Host address as a URI the channel can dial.
    ///
    /// A bare `host:port` gets `https://` when `secure` is set and `http://` otherwise.
    #[must_use]
    pub fn endpoint_uri(&self) -> String {
        if self.host.contains("://") {
            self.host.clone()
        } else if self.secure {
            format!("https://{}", self.host)
        } else {
            format!("http://{}", self.host)
        }
    }
}

/// Fluent builder for connection settings.
#[derive(Debug, Clone)]
pub struct ConnectionSettingsBuilder {
    opts: ConnectionSettings,
}

impl ConnectionSettingsBuilder {
    #[must_use]
    pub fn new(host: String) -> Self {
        Self {
            opts: ConnectionSettings::new(host, String::new(), String::new(), false),
        }
    }

    #[must_use]
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.opts.database = database.into();
        self
    }

    #[must_use]
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.opts.token = token.into();
        self
    }

    #[must_use]
    pub fn secure(mut self, secure: bool) -> Self {
        self.opts.secure = secure;
        self
    }

    #[must_use]
    pub fn finish(self) -> ConnectionSettings {
        self.opts
    }

    /// Connect and build a datasource from these settings.
    ///
    /// # Errors
    ///
    /// Returns `DatasourceError` if trust roots cannot be loaded or the connection fails.
    pub async fn build(self) -> Result<crate::datasource::FlightSqlDatasource, DatasourceError> {
        crate::datasource::FlightSqlDatasource::connect(self.finish()).await
    }
}
