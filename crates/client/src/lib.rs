#![forbid(unsafe_code)]

//! Clientes twinkv.
//!
//! `Client` é o contrato comum; `MemoryClient` executa direto sobre um
//! `Store` no processo e `PooledClient` fala RESP com um servidor através
//! de um pool de conexões. Os dois retornam as mesmas formas e as mesmas
//! classes de erro, então o chamador pode trocar um pelo outro.

use std::collections::HashMap;
use std::future::Future;

mod memory;
mod options;
mod pool;
mod pooled;

pub use memory::MemoryClient;
pub use options::{ADDR_ENV, ClientOptions};
pub use pooled::PooledClient;

pub use twinkv_common::{ClientError, ClientResult, StorageError};
pub use twinkv_protocol::Frame;
pub use twinkv_storage::Scalar;

/// Operações suportadas por um backend twinkv.
///
/// Leituras sem dados em listas, sets e hashes retornam coleções vazias;
/// `get` de chave ausente é erro (`StorageError::NotFound`).
pub trait Client: Send + Sync {
    /// Libera os recursos do cliente. Chamadas posteriores podem falhar.
    fn close(&self) -> impl Future<Output = ()> + Send;

    fn ping(&self) -> impl Future<Output = ClientResult<()>> + Send;

    // --- Strings e expiração ---

    fn get(&self, key: &str) -> impl Future<Output = ClientResult<String>> + Send;

    /// Uma string por chave; "" para chaves ausentes ou que não são escalares.
    fn mget(&self, keys: &[&str]) -> impl Future<Output = ClientResult<Vec<String>>> + Send;

    fn set(
        &self,
        key: &str,
        value: impl Into<Scalar> + Send,
    ) -> impl Future<Output = ClientResult<()>> + Send;

    fn set_ex(
        &self,
        key: &str,
        ttl_secs: i64,
        value: impl Into<Scalar> + Send,
    ) -> impl Future<Output = ClientResult<()>> + Send;

    /// Grava com expiração apenas se a chave não existir. true se gravou.
    fn set_nx_ex(
        &self,
        key: &str,
        value: impl Into<Scalar> + Send,
        ttl_secs: i64,
    ) -> impl Future<Output = ClientResult<bool>> + Send;

    fn expire(&self, key: &str, ttl_secs: i64) -> impl Future<Output = ClientResult<bool>> + Send;

    fn del(&self, keys: &[&str]) -> impl Future<Output = ClientResult<usize>> + Send;

    fn exists(&self, keys: &[&str]) -> impl Future<Output = ClientResult<usize>> + Send;

    fn incr(&self, key: &str) -> impl Future<Output = ClientResult<i64>> + Send;

    fn incr_by(&self, key: &str, delta: i64) -> impl Future<Output = ClientResult<i64>> + Send;

    fn incr_by_float(
        &self,
        key: &str,
        delta: f64,
    ) -> impl Future<Output = ClientResult<f64>> + Send;

    fn eval(
        &self,
        script: &str,
        num_keys: usize,
    ) -> impl Future<Output = ClientResult<Frame>> + Send;

    // --- Listas ---

    fn lpush(&self, key: &str, value: &str) -> impl Future<Output = ClientResult<usize>> + Send;

    fn rpush(&self, key: &str, value: &str) -> impl Future<Output = ClientResult<usize>> + Send;

    /// Lista inteira.
    fn range(&self, key: &str) -> impl Future<Output = ClientResult<Vec<String>>> + Send;

    /// Índices inclusivos; negativos contam a partir do fim.
    fn lrange(
        &self,
        key: &str,
        start: i64,
        stop: i64,
    ) -> impl Future<Output = ClientResult<Vec<String>>> + Send;

    fn lpop(&self, key: &str) -> impl Future<Output = ClientResult<String>> + Send;

    // --- Score-sets ---

    fn zadd(
        &self,
        key: &str,
        score: f64,
        member: impl Into<Scalar> + Send,
    ) -> impl Future<Output = ClientResult<usize>> + Send;

    /// Conta `min <= score < max`. Limites aceitam "-inf" e "+inf".
    fn zcount(
        &self,
        key: &str,
        min: impl Into<Scalar> + Send,
        max: impl Into<Scalar> + Send,
    ) -> impl Future<Output = ClientResult<usize>> + Send;

    // --- Sets ---

    fn sadd(&self, key: &str, members: &[&str]) -> impl Future<Output = ClientResult<usize>> + Send;

    fn smembers(&self, key: &str) -> impl Future<Output = ClientResult<Vec<String>>> + Send;

    // --- Hashes ---

    fn hdel(&self, key: &str, fields: &[&str]) -> impl Future<Output = ClientResult<usize>> + Send;

    fn hexists(&self, key: &str, field: &str) -> impl Future<Output = ClientResult<bool>> + Send;

    fn hget(&self, key: &str, field: &str) -> impl Future<Output = ClientResult<String>> + Send;

    fn hgetall(
        &self,
        key: &str,
    ) -> impl Future<Output = ClientResult<HashMap<String, String>>> + Send;

    /// Apenas os campos pedidos que existem.
    fn hmget(
        &self,
        key: &str,
        fields: &[&str],
    ) -> impl Future<Output = ClientResult<HashMap<String, String>>> + Send;

    fn hlen(&self, key: &str) -> impl Future<Output = ClientResult<usize>> + Send;

    fn hkeys(&self, key: &str) -> impl Future<Output = ClientResult<Vec<String>>> + Send;

    fn hvals(&self, key: &str) -> impl Future<Output = ClientResult<Vec<String>>> + Send;

    /// Pares cujo campo casa com o padrão glob.
    fn hscan(
        &self,
        key: &str,
        pattern: &str,
    ) -> impl Future<Output = ClientResult<HashMap<String, String>>> + Send;

    /// true se o campo foi criado, false se foi sobrescrito.
    fn hset(
        &self,
        key: &str,
        field: &str,
        value: impl Into<Scalar> + Send,
    ) -> impl Future<Output = ClientResult<bool>> + Send;

    fn hset_many(
        &self,
        key: &str,
        fields: &[(&str, Scalar)],
    ) -> impl Future<Output = ClientResult<()>> + Send;

    fn hincr_by(
        &self,
        key: &str,
        field: &str,
        delta: i64,
    ) -> impl Future<Output = ClientResult<i64>> + Send;

    fn hincr_by_float(
        &self,
        key: &str,
        field: &str,
        delta: f64,
    ) -> impl Future<Output = ClientResult<f64>> + Send;
}
