use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use twinkv_common::{ClientError, ClientResult, StorageError};
use twinkv_protocol::{Command, Frame, reply};
use twinkv_storage::Scalar;

use crate::pool::Pool;
use crate::{Client, ClientOptions};

/// Cliente de rede: cada chamada empresta uma conexão do pool, envia um
/// comando RESP e traduz a resposta para os mesmos tipos do `MemoryClient`.
#[derive(Clone)]
pub struct PooledClient {
    pool: Arc<Pool>,
}

impl PooledClient {
    /// Não abre conexão: a primeira é criada na primeira chamada.
    pub fn new(options: ClientOptions) -> Self {
        Self {
            pool: Arc::new(Pool::new(options)),
        }
    }

    pub fn connect(addr: impl Into<String>) -> Self {
        Self::new(ClientOptions::new(addr))
    }

    pub fn options(&self) -> &ClientOptions {
        self.pool.options()
    }

    /// Conexões ociosas no pool neste momento.
    pub async fn idle_connections(&self) -> usize {
        self.pool.idle_count().await
    }

    /// Envia um comando e devolve a resposta. Respostas de erro viram
    /// `ClientError`; a conexão só volta ao pool se a troca foi completa.
    async fn execute(&self, command: Command) -> ClientResult<Frame> {
        let mut conn = self.pool.checkout().await?;
        let reply = match conn.round_trip(&command.to_frame()).await {
            Ok(reply) => reply,
            Err(e) => {
                debug!("{} falhou, descartando conexão: {e}", command.name());
                return Err(e.into());
            }
        };
        self.pool.checkin(conn).await;

        match reply {
            Frame::Error(msg) => Err(error_reply(msg)),
            other => Ok(other),
        }
    }
}

fn error_reply(msg: String) -> ClientError {
    match reply::storage_error(&msg) {
        Some(err) => ClientError::Storage(err),
        None => ClientError::Server(msg),
    }
}

fn unexpected(command: &str, frame: &Frame) -> ClientError {
    ClientError::UnexpectedReply {
        command: command.into(),
        reply: frame.describe(),
    }
}

/// Texto enviado para argumentos numéricos livres: floats vão com
/// representação exata para que o servidor compare os mesmos valores.
fn wire_arg(value: Scalar) -> String {
    match value {
        Scalar::Float(f) => f.to_string(),
        other => other.to_text(),
    }
}

fn keys_of(keys: &[&str]) -> Vec<String> {
    keys.iter().map(|k| k.to_string()).collect()
}

// --- Decodificação de respostas ---

fn expect_ok(command: &str, frame: Frame) -> ClientResult<()> {
    match frame {
        Frame::Simple(s) if s == "OK" => Ok(()),
        other => Err(unexpected(command, &other)),
    }
}

fn expect_int(command: &str, frame: Frame) -> ClientResult<i64> {
    match frame {
        Frame::Integer(n) => Ok(n),
        other => Err(unexpected(command, &other)),
    }
}

fn expect_count(command: &str, frame: Frame) -> ClientResult<usize> {
    let n = expect_int(command, frame)?;
    usize::try_from(n).map_err(|_| unexpected(command, &Frame::Integer(n)))
}

fn expect_bool(command: &str, frame: Frame) -> ClientResult<bool> {
    Ok(expect_int(command, frame)? != 0)
}

/// Null → `NotFound`, como no engine local.
fn expect_text(command: &str, frame: Frame) -> ClientResult<String> {
    match frame {
        Frame::Null => Err(StorageError::NotFound.into()),
        Frame::Simple(_) | Frame::Bulk(_) => {
            let shown = frame.describe();
            frame.into_text().ok_or(ClientError::UnexpectedReply {
                command: command.into(),
                reply: shown,
            })
        }
        other => Err(unexpected(command, &other)),
    }
}

fn expect_float(command: &str, frame: Frame) -> ClientResult<f64> {
    let text = expect_text(command, frame)?;
    text.parse::<f64>().map_err(|_| ClientError::UnexpectedReply {
        command: command.into(),
        reply: text,
    })
}

/// Array de strings; elementos Null viram `None`.
fn expect_array(command: &str, frame: Frame) -> ClientResult<Vec<Option<String>>> {
    match frame {
        Frame::Null => Ok(vec![]),
        Frame::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Frame::Null => Ok(None),
                other => expect_text(command, other).map(Some),
            })
            .collect(),
        other => Err(unexpected(command, &other)),
    }
}

fn expect_strings(command: &str, frame: Frame) -> ClientResult<Vec<String>> {
    Ok(expect_array(command, frame)?
        .into_iter()
        .map(Option::unwrap_or_default)
        .collect())
}

/// Array plano `campo, valor, campo, valor...`.
fn expect_pairs(command: &str, frame: Frame) -> ClientResult<HashMap<String, String>> {
    let items = expect_strings(command, frame)?;
    if items.len() % 2 != 0 {
        return Err(ClientError::UnexpectedReply {
            command: command.into(),
            reply: format!("array ímpar de {} itens", items.len()),
        });
    }
    let mut items = items.into_iter();
    let mut pairs = HashMap::new();
    while let (Some(field), Some(value)) = (items.next(), items.next()) {
        pairs.insert(field, value);
    }
    Ok(pairs)
}

/// `[cursor, [campo, valor, ...]]`
fn expect_scan_page(frame: Frame) -> ClientResult<(u64, HashMap<String, String>)> {
    match frame {
        Frame::Array(mut parts) if parts.len() == 2 => {
            let page = parts.pop().unwrap_or(Frame::Null);
            let cursor = parts.pop().unwrap_or(Frame::Null);
            let cursor_text = expect_text("HSCAN", cursor)?;
            let cursor = cursor_text
                .parse::<u64>()
                .map_err(|_| ClientError::UnexpectedReply {
                    command: "HSCAN".into(),
                    reply: cursor_text,
                })?;
            Ok((cursor, expect_pairs("HSCAN", page)?))
        }
        other => Err(unexpected("HSCAN", &other)),
    }
}

impl Client for PooledClient {
    async fn close(&self) {
        self.pool.close().await;
    }

    async fn ping(&self) -> ClientResult<()> {
        match self.execute(Command::Ping(None)).await? {
            Frame::Simple(s) if s == "PONG" => Ok(()),
            other => Err(unexpected("PING", &other)),
        }
    }

    async fn get(&self, key: &str) -> ClientResult<String> {
        let reply = self.execute(Command::Get(key.into())).await?;
        expect_text("GET", reply)
    }

    async fn mget(&self, keys: &[&str]) -> ClientResult<Vec<String>> {
        let reply = self.execute(Command::MGet(keys_of(keys))).await?;
        expect_strings("MGET", reply)
    }

    async fn set(&self, key: &str, value: impl Into<Scalar> + Send) -> ClientResult<()> {
        let command = Command::Set {
            key: key.into(),
            value: value.into().to_text(),
            expire_secs: None,
            nx: false,
        };
        expect_ok("SET", self.execute(command).await?)
    }

    async fn set_ex(
        &self,
        key: &str,
        ttl_secs: i64,
        value: impl Into<Scalar> + Send,
    ) -> ClientResult<()> {
        let command = Command::Set {
            key: key.into(),
            value: value.into().to_text(),
            expire_secs: Some(ttl_secs),
            nx: false,
        };
        expect_ok("SET", self.execute(command).await?)
    }

    async fn set_nx_ex(
        &self,
        key: &str,
        value: impl Into<Scalar> + Send,
        ttl_secs: i64,
    ) -> ClientResult<bool> {
        let command = Command::Set {
            key: key.into(),
            value: value.into().to_text(),
            expire_secs: Some(ttl_secs),
            nx: true,
        };
        match self.execute(command).await? {
            Frame::Null => Ok(false),
            other => expect_ok("SET", other).map(|()| true),
        }
    }

    async fn expire(&self, key: &str, ttl_secs: i64) -> ClientResult<bool> {
        let command = Command::Expire {
            key: key.into(),
            seconds: ttl_secs,
        };
        expect_bool("EXPIRE", self.execute(command).await?)
    }

    async fn del(&self, keys: &[&str]) -> ClientResult<usize> {
        if keys.is_empty() {
            return Ok(0);
        }
        expect_count("DEL", self.execute(Command::Del(keys_of(keys))).await?)
    }

    async fn exists(&self, keys: &[&str]) -> ClientResult<usize> {
        if keys.is_empty() {
            return Ok(0);
        }
        expect_count("EXISTS", self.execute(Command::Exists(keys_of(keys))).await?)
    }

    async fn incr(&self, key: &str) -> ClientResult<i64> {
        expect_int("INCR", self.execute(Command::Incr(key.into())).await?)
    }

    async fn incr_by(&self, key: &str, delta: i64) -> ClientResult<i64> {
        let command = Command::IncrBy {
            key: key.into(),
            delta,
        };
        expect_int("INCRBY", self.execute(command).await?)
    }

    async fn incr_by_float(&self, key: &str, delta: f64) -> ClientResult<f64> {
        let command = Command::IncrByFloat {
            key: key.into(),
            delta,
        };
        expect_float("INCRBYFLOAT", self.execute(command).await?)
    }

    async fn eval(&self, script: &str, num_keys: usize) -> ClientResult<Frame> {
        let command = Command::Eval {
            script: script.into(),
            num_keys,
            args: vec![],
        };
        match self.execute(command).await {
            Err(ClientError::Server(msg)) if msg.contains("not supported") => {
                Err(ClientError::Unsupported("EVAL"))
            }
            other => other,
        }
    }

    async fn lpush(&self, key: &str, value: &str) -> ClientResult<usize> {
        let command = Command::LPush {
            key: key.into(),
            values: vec![value.into()],
        };
        expect_count("LPUSH", self.execute(command).await?)
    }

    async fn rpush(&self, key: &str, value: &str) -> ClientResult<usize> {
        let command = Command::RPush {
            key: key.into(),
            values: vec![value.into()],
        };
        expect_count("RPUSH", self.execute(command).await?)
    }

    async fn range(&self, key: &str) -> ClientResult<Vec<String>> {
        self.lrange(key, 0, -1).await
    }

    async fn lrange(&self, key: &str, start: i64, stop: i64) -> ClientResult<Vec<String>> {
        let command = Command::LRange {
            key: key.into(),
            start,
            stop,
        };
        expect_strings("LRANGE", self.execute(command).await?)
    }

    async fn lpop(&self, key: &str) -> ClientResult<String> {
        expect_text("LPOP", self.execute(Command::LPop(key.into())).await?)
    }

    async fn zadd(
        &self,
        key: &str,
        score: f64,
        member: impl Into<Scalar> + Send,
    ) -> ClientResult<usize> {
        if score.is_nan() {
            return Err(StorageError::NotAFloat.into());
        }
        let command = Command::ZAdd {
            key: key.into(),
            score,
            member: member.into().to_text(),
        };
        expect_count("ZADD", self.execute(command).await?)
    }

    async fn zcount(
        &self,
        key: &str,
        min: impl Into<Scalar> + Send,
        max: impl Into<Scalar> + Send,
    ) -> ClientResult<usize> {
        let command = Command::ZCount {
            key: key.into(),
            min: wire_arg(min.into()),
            max: wire_arg(max.into()),
        };
        expect_count("ZCOUNT", self.execute(command).await?)
    }

    async fn sadd(&self, key: &str, members: &[&str]) -> ClientResult<usize> {
        if members.is_empty() {
            // SADD sem membros não existe no protocolo; só checa o tipo
            self.smembers(key).await?;
            return Ok(0);
        }
        let command = Command::SAdd {
            key: key.into(),
            members: keys_of(members),
        };
        expect_count("SADD", self.execute(command).await?)
    }

    async fn smembers(&self, key: &str) -> ClientResult<Vec<String>> {
        expect_strings("SMEMBERS", self.execute(Command::SMembers(key.into())).await?)
    }

    async fn hdel(&self, key: &str, fields: &[&str]) -> ClientResult<usize> {
        if fields.is_empty() {
            self.hlen(key).await?;
            return Ok(0);
        }
        let command = Command::HDel {
            key: key.into(),
            fields: keys_of(fields),
        };
        expect_count("HDEL", self.execute(command).await?)
    }

    async fn hexists(&self, key: &str, field: &str) -> ClientResult<bool> {
        let command = Command::HExists {
            key: key.into(),
            field: field.into(),
        };
        expect_bool("HEXISTS", self.execute(command).await?)
    }

    async fn hget(&self, key: &str, field: &str) -> ClientResult<String> {
        let command = Command::HGet {
            key: key.into(),
            field: field.into(),
        };
        expect_text("HGET", self.execute(command).await?)
    }

    async fn hgetall(&self, key: &str) -> ClientResult<HashMap<String, String>> {
        expect_pairs("HGETALL", self.execute(Command::HGetAll(key.into())).await?)
    }

    async fn hmget(&self, key: &str, fields: &[&str]) -> ClientResult<HashMap<String, String>> {
        if fields.is_empty() {
            self.hlen(key).await?;
            return Ok(HashMap::new());
        }
        let command = Command::HMGet {
            key: key.into(),
            fields: keys_of(fields),
        };
        let values = expect_array("HMGET", self.execute(command).await?)?;
        Ok(fields
            .iter()
            .zip(values)
            .filter_map(|(field, value)| value.map(|v| (field.to_string(), v)))
            .collect())
    }

    async fn hlen(&self, key: &str) -> ClientResult<usize> {
        expect_count("HLEN", self.execute(Command::HLen(key.into())).await?)
    }

    async fn hkeys(&self, key: &str) -> ClientResult<Vec<String>> {
        expect_strings("HKEYS", self.execute(Command::HKeys(key.into())).await?)
    }

    async fn hvals(&self, key: &str) -> ClientResult<Vec<String>> {
        expect_strings("HVALS", self.execute(Command::HVals(key.into())).await?)
    }

    async fn hscan(&self, key: &str, pattern: &str) -> ClientResult<HashMap<String, String>> {
        let mut found = HashMap::new();
        let mut cursor = 0;
        loop {
            let command = Command::HScan {
                key: key.into(),
                cursor,
                pattern: Some(pattern.into()),
                count: None,
            };
            let (next, page) = expect_scan_page(self.execute(command).await?)?;
            found.extend(page);
            if next == 0 {
                return Ok(found);
            }
            cursor = next;
        }
    }

    async fn hset(
        &self,
        key: &str,
        field: &str,
        value: impl Into<Scalar> + Send,
    ) -> ClientResult<bool> {
        let command = Command::HSet {
            key: key.into(),
            fields: vec![(field.into(), value.into().to_text())],
        };
        expect_bool("HSET", self.execute(command).await?)
    }

    async fn hset_many(&self, key: &str, fields: &[(&str, Scalar)]) -> ClientResult<()> {
        if fields.is_empty() {
            self.hlen(key).await?;
            return Ok(());
        }
        let command = Command::HSet {
            key: key.into(),
            fields: fields
                .iter()
                .map(|(f, v)| (f.to_string(), v.to_text()))
                .collect(),
        };
        expect_count("HSET", self.execute(command).await?).map(|_| ())
    }

    async fn hincr_by(&self, key: &str, field: &str, delta: i64) -> ClientResult<i64> {
        let command = Command::HIncrBy {
            key: key.into(),
            field: field.into(),
            delta,
        };
        expect_int("HINCRBY", self.execute(command).await?)
    }

    async fn hincr_by_float(&self, key: &str, field: &str, delta: f64) -> ClientResult<f64> {
        let command = Command::HIncrByFloat {
            key: key.into(),
            field: field.into(),
            delta,
        };
        expect_float("HINCRBYFLOAT", self.execute(command).await?)
    }
}
