use std::time::Duration;

use twinkv_common::{
    DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_HOST, DEFAULT_IDLE_TIMEOUT_SECS, DEFAULT_MAX_IDLE,
    DEFAULT_PORT,
};

/// Variável de ambiente com o endereço `host:porta` do servidor.
pub const ADDR_ENV: &str = "TWINKV_ADDR";

/// Configuração do pool de conexões do `PooledClient`.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientOptions {
    pub addr: String,
    /// Conexões ociosas guardadas para reuso; o excedente é fechado.
    pub max_idle: usize,
    /// Conexões ociosas há mais tempo que isso são descartadas no checkout.
    pub idle_timeout: Duration,
    pub connect_timeout: Duration,
    /// Faz PING numa conexão ociosa antes de reutilizá-la.
    pub test_on_borrow: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            addr: format!("{DEFAULT_HOST}:{DEFAULT_PORT}"),
            max_idle: DEFAULT_MAX_IDLE,
            idle_timeout: Duration::from_secs(DEFAULT_IDLE_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            test_on_borrow: true,
        }
    }
}

impl ClientOptions {
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            ..Self::default()
        }
    }

    /// Endereço de `TWINKV_ADDR`, ou o padrão se a variável não existir.
    pub fn from_env() -> Self {
        match std::env::var(ADDR_ENV) {
            Ok(addr) if !addr.trim().is_empty() => Self::new(addr.trim()),
            _ => Self::default(),
        }
    }

    pub fn with_max_idle(mut self, max_idle: usize) -> Self {
        self.max_idle = max_idle;
        self
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    pub fn with_test_on_borrow(mut self, test_on_borrow: bool) -> Self {
        self.test_on_borrow = test_on_borrow;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_pool_constants() {
        let opts = ClientOptions::default();
        assert_eq!(opts.addr, "127.0.0.1:6390");
        assert_eq!(opts.max_idle, 3);
        assert_eq!(opts.idle_timeout, Duration::from_secs(240));
        assert!(opts.test_on_borrow);
    }

    #[test]
    fn builder_overrides() {
        let opts = ClientOptions::new("10.0.0.1:7000")
            .with_max_idle(0)
            .with_idle_timeout(Duration::from_millis(10))
            .with_test_on_borrow(false);
        assert_eq!(opts.addr, "10.0.0.1:7000");
        assert_eq!(opts.max_idle, 0);
        assert_eq!(opts.idle_timeout, Duration::from_millis(10));
        assert!(!opts.test_on_borrow);
        assert_eq!(opts.connect_timeout, Duration::from_secs(5));
    }
}
