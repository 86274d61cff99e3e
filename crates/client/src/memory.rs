use std::collections::HashMap;

use twinkv_common::{ClientError, ClientResult};
use twinkv_protocol::Frame;
use twinkv_storage::{Scalar, Store};

use crate::Client;

/// Cliente sobre um `Store` no mesmo processo.
///
/// Clones compartilham o mesmo keyspace. Nenhuma chamada suspende: os
/// futures ficam prontos na primeira consulta.
#[derive(Clone, Default)]
pub struct MemoryClient {
    store: Store,
}

impl MemoryClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Usa um keyspace já existente (por exemplo, o mesmo servido pela rede).
    pub fn with_store(store: Store) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }
}

impl Client for MemoryClient {
    async fn close(&self) {}

    async fn ping(&self) -> ClientResult<()> {
        Ok(())
    }

    async fn get(&self, key: &str) -> ClientResult<String> {
        Ok(self.store.get(key)?)
    }

    async fn mget(&self, keys: &[&str]) -> ClientResult<Vec<String>> {
        Ok(self.store.mget(keys))
    }

    async fn set(&self, key: &str, value: impl Into<Scalar> + Send) -> ClientResult<()> {
        self.store.set(key, value);
        Ok(())
    }

    async fn set_ex(
        &self,
        key: &str,
        ttl_secs: i64,
        value: impl Into<Scalar> + Send,
    ) -> ClientResult<()> {
        Ok(self.store.set_ex(key, ttl_secs, value)?)
    }

    async fn set_nx_ex(
        &self,
        key: &str,
        value: impl Into<Scalar> + Send,
        ttl_secs: i64,
    ) -> ClientResult<bool> {
        Ok(self.store.set_nx_ex(key, value, ttl_secs)?)
    }

    async fn expire(&self, key: &str, ttl_secs: i64) -> ClientResult<bool> {
        Ok(self.store.expire(key, ttl_secs)?)
    }

    async fn del(&self, keys: &[&str]) -> ClientResult<usize> {
        Ok(self.store.del(keys))
    }

    async fn exists(&self, keys: &[&str]) -> ClientResult<usize> {
        Ok(self.store.exists(keys))
    }

    async fn incr(&self, key: &str) -> ClientResult<i64> {
        Ok(self.store.incr(key)?)
    }

    async fn incr_by(&self, key: &str, delta: i64) -> ClientResult<i64> {
        Ok(self.store.incr_by(key, delta)?)
    }

    async fn incr_by_float(&self, key: &str, delta: f64) -> ClientResult<f64> {
        Ok(self.store.incr_by_float(key, delta)?)
    }

    async fn eval(&self, _script: &str, _num_keys: usize) -> ClientResult<Frame> {
        Err(ClientError::Unsupported("EVAL"))
    }

    async fn lpush(&self, key: &str, value: &str) -> ClientResult<usize> {
        Ok(self.store.lpush(key, value)?)
    }

    async fn rpush(&self, key: &str, value: &str) -> ClientResult<usize> {
        Ok(self.store.rpush(key, value)?)
    }

    async fn range(&self, key: &str) -> ClientResult<Vec<String>> {
        Ok(self.store.range(key)?)
    }

    async fn lrange(&self, key: &str, start: i64, stop: i64) -> ClientResult<Vec<String>> {
        Ok(self.store.lrange(key, start, stop)?)
    }

    async fn lpop(&self, key: &str) -> ClientResult<String> {
        Ok(self.store.lpop(key)?)
    }

    async fn zadd(
        &self,
        key: &str,
        score: f64,
        member: impl Into<Scalar> + Send,
    ) -> ClientResult<usize> {
        Ok(self.store.zadd(key, score, member)?)
    }

    async fn zcount(
        &self,
        key: &str,
        min: impl Into<Scalar> + Send,
        max: impl Into<Scalar> + Send,
    ) -> ClientResult<usize> {
        Ok(self.store.zcount(key, min, max)?)
    }

    async fn sadd(&self, key: &str, members: &[&str]) -> ClientResult<usize> {
        Ok(self.store.sadd(key, members)?)
    }

    async fn smembers(&self, key: &str) -> ClientResult<Vec<String>> {
        Ok(self.store.smembers(key)?)
    }

    async fn hdel(&self, key: &str, fields: &[&str]) -> ClientResult<usize> {
        Ok(self.store.hdel(key, fields)?)
    }

    async fn hexists(&self, key: &str, field: &str) -> ClientResult<bool> {
        Ok(self.store.hexists(key, field)?)
    }

    async fn hget(&self, key: &str, field: &str) -> ClientResult<String> {
        Ok(self.store.hget(key, field)?)
    }

    async fn hgetall(&self, key: &str) -> ClientResult<HashMap<String, String>> {
        Ok(self.store.hgetall(key)?)
    }

    async fn hmget(&self, key: &str, fields: &[&str]) -> ClientResult<HashMap<String, String>> {
        Ok(self.store.hmget(key, fields)?)
    }

    async fn hlen(&self, key: &str) -> ClientResult<usize> {
        Ok(self.store.hlen(key)?)
    }

    async fn hkeys(&self, key: &str) -> ClientResult<Vec<String>> {
        Ok(self.store.hkeys(key)?)
    }

    async fn hvals(&self, key: &str) -> ClientResult<Vec<String>> {
        Ok(self.store.hvals(key)?)
    }

    async fn hscan(&self, key: &str, pattern: &str) -> ClientResult<HashMap<String, String>> {
        Ok(self.store.hscan(key, pattern)?)
    }

    async fn hset(
        &self,
        key: &str,
        field: &str,
        value: impl Into<Scalar> + Send,
    ) -> ClientResult<bool> {
        Ok(self.store.hset(key, field, value)?)
    }

    async fn hset_many(&self, key: &str, fields: &[(&str, Scalar)]) -> ClientResult<()> {
        self.store
            .hset_many(key, fields.iter().map(|(f, v)| (*f, v.clone())))?;
        Ok(())
    }

    async fn hincr_by(&self, key: &str, field: &str, delta: i64) -> ClientResult<i64> {
        Ok(self.store.hincr_by(key, field, delta)?)
    }

    async fn hincr_by_float(&self, key: &str, field: &str, delta: f64) -> ClientResult<f64> {
        Ok(self.store.hincr_by_float(key, field, delta)?)
    }
}
