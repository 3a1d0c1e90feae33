//! Server Configuration

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Bind address
    pub bind: String,

    /// Port for the binary protocol
    pub port: u16,

    /// Port for the HTTP surface (None = disabled)
    pub http_port: Option<u16>,

    /// Seconds between metrics summaries in the log (0 = never)
    pub metrics_interval: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 6390,
            http_port: Some(8390),
            metrics_interval: 60,
        }
    }
}

impl Config {
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_bind(mut self, bind: impl Into<String>) -> Self {
        self.bind = bind.into();
        self
    }

    pub fn with_http_port(mut self, port: Option<u16>) -> Self {
        self.http_port = port;
        self
    }

    pub fn with_metrics_interval(mut self, interval: u64) -> Self {
        self.metrics_interval = interval;
        self
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }

    pub fn http_addr(&self) -> Option<String> {
        self.http_port.map(|port| format!("{}:{}", self.bind, port))
    }
}
