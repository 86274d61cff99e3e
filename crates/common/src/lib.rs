#![forbid(unsafe_code)]

mod error;

pub use error::*;

pub const DEFAULT_PORT: u16 = 6390;
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const MAX_CONNECTIONS: usize = 1024;
pub const INITIAL_BUFFER_CAPACITY: usize = 4 * 1024; // 4 KB
pub const MAX_FRAME_SIZE: usize = 64 * 1024 * 1024; // 64 MB

/// Conexões ociosas mantidas pelo pool do cliente de rede.
pub const DEFAULT_MAX_IDLE: usize = 3;
/// Tempo máximo que uma conexão pode ficar ociosa no pool.
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 240;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

/// Dígitos significativos usados ao formatar floats não inteiros como texto.
pub const FLOAT_PRECISION: usize = 15;
