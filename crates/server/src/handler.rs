use bytes::Bytes;
use tokio::sync::broadcast;
use tracing::debug;

use twinkv_common::{ConnectionError, StorageResult};
use twinkv_protocol::{Command, Connection, Frame, reply};
use twinkv_storage::{Store, numeric::format_float};

/// Página padrão do HSCAN quando o cliente não manda COUNT.
const DEFAULT_SCAN_COUNT: usize = 10;

/// Loop principal de tratamento de uma conexão.
pub async fn handle_connection(
    mut conn: Connection,
    store: Store,
    shutdown: &mut broadcast::Receiver<()>,
) -> Result<(), ConnectionError> {
    loop {
        let frame = tokio::select! {
            result = conn.read_frame() => result?,
            _ = shutdown.recv() => {
                return Ok(());
            }
        };

        let frame = match frame {
            Some(f) => f,
            None => return Ok(()), // EOF
        };

        let response = match Command::from_frame(frame) {
            Ok(cmd) => {
                debug!("comando recebido: {cmd:?}");
                execute_command(cmd, &store)
            }
            Err(e) => Frame::Error(format!("ERR {e}")),
        };

        conn.write_frame(&response).await?;
    }
}

/// Executa um comando e retorna o Frame de resposta.
pub fn execute_command(cmd: Command, store: &Store) -> Frame {
    match cmd {
        Command::Ping(msg) => match msg {
            Some(m) => Frame::Bulk(Bytes::from(m)),
            None => Frame::Simple("PONG".into()),
        },
        Command::Get(key) => respond(store.get(&key), text),
        Command::Set {
            key,
            value,
            expire_secs,
            nx,
        } => match (expire_secs, nx) {
            (None, false) => {
                store.set(&key, value);
                ok()
            }
            (Some(ttl), false) => respond(store.set_ex(&key, ttl, value), |()| ok()),
            (Some(ttl), true) => respond(store.set_nx_ex(&key, value, ttl), |stored| {
                if stored { ok() } else { Frame::Null }
            }),
            (None, true) => Frame::Error("ERR syntax error: NX requires EX".into()),
        },
        Command::Del(keys) => count(store.del(&keys)),
        Command::Exists(keys) => count(store.exists(&keys)),
        Command::MGet(keys) => list(store.mget(&keys)),
        Command::Expire { key, seconds } => respond(store.expire(&key, seconds), flag),
        Command::Incr(key) => respond(store.incr(&key), Frame::Integer),
        Command::IncrBy { key, delta } => respond(store.incr_by(&key, delta), Frame::Integer),
        Command::IncrByFloat { key, delta } => {
            respond(store.incr_by_float(&key, delta), float)
        }
        Command::LPush { key, values } => {
            respond(push_all(values, |v| store.lpush(&key, v)), count)
        }
        Command::RPush { key, values } => {
            respond(push_all(values, |v| store.rpush(&key, v)), count)
        }
        Command::LRange { key, start, stop } => respond(store.lrange(&key, start, stop), list),
        Command::LPop(key) => respond(store.lpop(&key), text),
        Command::SAdd { key, members } => respond(store.sadd(&key, &members), count),
        Command::SMembers(key) => respond(store.smembers(&key), list),
        Command::HSet { key, fields } => respond(store.hset_many(&key, fields), count),
        Command::HGet { key, field } => respond(store.hget(&key, &field), text),
        Command::HMGet { key, fields } => respond(store.hmget(&key, &fields), |mut found| {
            Frame::Array(
                fields
                    .iter()
                    .map(|f| found.remove(f).map_or(Frame::Null, text))
                    .collect(),
            )
        }),
        Command::HGetAll(key) => respond(store.hgetall(&key), |hash| {
            let mut pairs: Vec<_> = hash.into_iter().collect();
            pairs.sort();
            flat_pairs(pairs)
        }),
        Command::HKeys(key) => respond(store.hkeys(&key), list),
        Command::HVals(key) => respond(store.hvals(&key), list),
        Command::HLen(key) => respond(store.hlen(&key), count),
        Command::HDel { key, fields } => respond(store.hdel(&key, &fields), count),
        Command::HExists { key, field } => respond(store.hexists(&key, &field), flag),
        Command::HScan {
            key,
            cursor,
            pattern,
            count,
        } => {
            let pattern = pattern.as_deref().unwrap_or("*");
            respond(store.hscan(&key, pattern), |found| {
                scan_page(found, cursor, count.unwrap_or(DEFAULT_SCAN_COUNT))
            })
        }
        Command::HIncrBy { key, field, delta } => {
            respond(store.hincr_by(&key, &field, delta), Frame::Integer)
        }
        Command::HIncrByFloat { key, field, delta } => {
            respond(store.hincr_by_float(&key, &field, delta), float)
        }
        Command::ZAdd { key, score, member } => respond(store.zadd(&key, score, member), count),
        Command::ZCount { key, min, max } => respond(store.zcount(&key, min, max), count),
        Command::Eval { .. } => Frame::Error("ERR EVAL not supported".into()),
        Command::Unknown(name) => Frame::Error(format!("ERR unknown command '{name}'")),
    }
}

/// Sucesso vira a resposta de `on_ok`; erros de storage viram frames de
/// erro (ou Null, para chave ausente).
fn respond<T>(result: StorageResult<T>, on_ok: impl FnOnce(T) -> Frame) -> Frame {
    match result {
        Ok(value) => on_ok(value),
        Err(e) => {
            debug!("erro de storage: {e}");
            reply::error_frame(&e)
        }
    }
}

fn push_all(
    values: Vec<String>,
    mut push: impl FnMut(String) -> StorageResult<usize>,
) -> StorageResult<usize> {
    let mut len = 0;
    for value in values {
        len = push(value)?;
    }
    Ok(len)
}

/// Fatia ordenada por campo a partir do offset `cursor`. O próximo cursor é
/// 0 quando a varredura termina.
fn scan_page(found: std::collections::HashMap<String, String>, cursor: u64, count: usize) -> Frame {
    let mut pairs: Vec<_> = found.into_iter().collect();
    pairs.sort();

    let start = usize::try_from(cursor).unwrap_or(usize::MAX).min(pairs.len());
    let end = start.saturating_add(count).min(pairs.len());
    let next = if end < pairs.len() { end as u64 } else { 0 };
    let page: Vec<_> = pairs.drain(start..end).collect();

    Frame::Array(vec![Frame::bulk(&next.to_string()), flat_pairs(page)])
}

fn flat_pairs(pairs: Vec<(String, String)>) -> Frame {
    Frame::Array(
        pairs
            .into_iter()
            .flat_map(|(f, v)| [text(f), text(v)])
            .collect(),
    )
}

fn ok() -> Frame {
    Frame::Simple("OK".into())
}

fn text(s: String) -> Frame {
    Frame::Bulk(Bytes::from(s))
}

fn float(f: f64) -> Frame {
    text(format_float(f))
}

fn count(n: usize) -> Frame {
    Frame::Integer(n as i64)
}

fn flag(b: bool) -> Frame {
    Frame::Integer(b as i64)
}

fn list(items: Vec<String>) -> Frame {
    Frame::Array(items.into_iter().map(text).collect())
}
