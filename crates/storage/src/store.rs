use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::time::{Duration, Instant};
use tracing::debug;

use twinkv_common::{StorageError, StorageResult};

use crate::glob::GlobPattern;
use crate::numeric::{add_f64, add_i64, parse_f64, parse_i64};
use crate::value::{Scalar, Value};
use crate::zset::{ScoreBound, ScoreSet};

/// Registro de chaves e tabela lateral de expiração.
///
/// Expiração é preguiçosa: leituras tratam a chave vencida como ausente e a
/// deixam no lugar; escritas a descartam antes de recriar.
#[derive(Debug, Default)]
struct Keyspace {
    values: HashMap<String, Value>,
    expires: HashMap<String, Instant>,
}

impl Keyspace {
    fn is_expired(&self, key: &str, now: Instant) -> bool {
        self.expires.get(key).is_some_and(|deadline| now >= *deadline)
    }

    /// Caminho de leitura: não remove nada.
    fn live(&self, key: &str, now: Instant) -> Option<&Value> {
        if self.is_expired(key, now) {
            return None;
        }
        self.values.get(key)
    }

    /// Caminho de escrita: descarta a chave se ela venceu.
    fn purge_expired(&mut self, key: &str, now: Instant) {
        if self.is_expired(key, now) {
            self.remove(key);
            debug!("chave expirada descartada: {key}");
        }
    }

    fn live_mut(&mut self, key: &str, now: Instant) -> Option<&mut Value> {
        self.purge_expired(key, now);
        self.values.get_mut(key)
    }

    /// Entrada viva, criada com `init` se ausente ou vencida.
    fn entry_or_insert(
        &mut self,
        key: &str,
        now: Instant,
        init: impl FnOnce() -> Value,
    ) -> &mut Value {
        self.purge_expired(key, now);
        self.values.entry(key.to_string()).or_insert_with(init)
    }

    fn remove(&mut self, key: &str) -> Option<Value> {
        self.expires.remove(key);
        self.values.remove(key)
    }

    fn set_scalar(&mut self, key: &str, value: Scalar) {
        self.expires.remove(key);
        self.values.insert(key.to_string(), Value::Scalar(value));
    }

    fn set_deadline(&mut self, key: &str, deadline: Instant) {
        self.expires.insert(key.to_string(), deadline);
    }
}

/// Engine in-memory que emula o subconjunto de comandos usado pelos clientes.
///
/// Todas as operações tomam o mesmo lock durante toda a chamada, então
/// operações compostas (checar-e-escrever, incrementos, pops) são atômicas.
/// O handle é barato de clonar; clones compartilham o mesmo estado.
#[derive(Clone, Default)]
pub struct Store {
    shared: Arc<Mutex<Keyspace>>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    // --- String operations ---

    /// Representação textual do escalar. Ausente ou vencida → `NotFound`.
    pub fn get(&self, key: &str) -> StorageResult<String> {
        let keyspace = self.shared.lock();
        match keyspace.live(key, Instant::now()) {
            Some(Value::Scalar(scalar)) => Ok(scalar.to_text()),
            Some(_) => Err(StorageError::WrongType),
            None => Err(StorageError::NotFound),
        }
    }

    /// Grava o valor e remove qualquer expiração anterior.
    pub fn set(&self, key: &str, value: impl Into<Scalar>) {
        let mut keyspace = self.shared.lock();
        keyspace.set_scalar(key, value.into());
    }

    pub fn set_ex(&self, key: &str, ttl_secs: i64, value: impl Into<Scalar>) -> StorageResult<()> {
        let deadline = deadline_after(Instant::now(), ttl_secs)?;
        let mut keyspace = self.shared.lock();
        keyspace.set_scalar(key, value.into());
        keyspace.set_deadline(key, deadline);
        Ok(())
    }

    /// SET NX EX: grava apenas se a chave estiver ausente ou vencida.
    pub fn set_nx_ex(
        &self,
        key: &str,
        value: impl Into<Scalar>,
        ttl_secs: i64,
    ) -> StorageResult<bool> {
        let now = Instant::now();
        let deadline = deadline_after(now, ttl_secs)?;
        let mut keyspace = self.shared.lock();
        if keyspace.live(key, now).is_some() {
            return Ok(false);
        }
        keyspace.set_scalar(key, value.into());
        keyspace.set_deadline(key, deadline);
        Ok(true)
    }

    /// Define a expiração de uma chave viva. TTL não positivo remove a chave;
    /// prazo além do representável é `InvalidExpire` e a chave fica intacta.
    pub fn expire(&self, key: &str, ttl_secs: i64) -> StorageResult<bool> {
        let now = Instant::now();
        let mut keyspace = self.shared.lock();
        if keyspace.live_mut(key, now).is_none() {
            return Ok(false);
        }
        if ttl_secs <= 0 {
            keyspace.remove(key);
        } else {
            keyspace.set_deadline(key, deadline_after(now, ttl_secs)?);
        }
        Ok(true)
    }

    /// Remove as chaves; retorna quantas estavam vivas.
    pub fn del<K: AsRef<str>>(&self, keys: &[K]) -> usize {
        let now = Instant::now();
        let mut keyspace = self.shared.lock();
        let mut count = 0;
        for key in keys {
            let key = key.as_ref();
            let was_live = keyspace.live(key, now).is_some();
            if keyspace.remove(key).is_some() && was_live {
                count += 1;
            }
        }
        count
    }

    pub fn exists<K: AsRef<str>>(&self, keys: &[K]) -> usize {
        let now = Instant::now();
        let keyspace = self.shared.lock();
        keys.iter()
            .filter(|key| keyspace.live(key.as_ref(), now).is_some())
            .count()
    }

    /// Um valor por chave; "" para ausente, vencida ou não escalar.
    pub fn mget<K: AsRef<str>>(&self, keys: &[K]) -> Vec<String> {
        let now = Instant::now();
        let keyspace = self.shared.lock();
        keys.iter()
            .map(|key| match keyspace.live(key.as_ref(), now) {
                Some(Value::Scalar(scalar)) => scalar.to_text(),
                _ => String::new(),
            })
            .collect()
    }

    pub fn incr(&self, key: &str) -> StorageResult<i64> {
        self.incr_by(key, 1)
    }

    pub fn incr_by(&self, key: &str, delta: i64) -> StorageResult<i64> {
        let mut keyspace = self.shared.lock();
        let current = match keyspace.live_mut(key, Instant::now()) {
            Some(Value::Scalar(scalar)) => scalar.to_i64()?,
            Some(_) => return Err(StorageError::WrongType),
            None => 0,
        };
        let next = add_i64(current, delta)?;
        store_number(&mut keyspace, key, Scalar::Int(next));
        Ok(next)
    }

    pub fn incr_by_float(&self, key: &str, delta: f64) -> StorageResult<f64> {
        let mut keyspace = self.shared.lock();
        let current = match keyspace.live_mut(key, Instant::now()) {
            Some(Value::Scalar(scalar)) => scalar.to_f64()?,
            Some(_) => return Err(StorageError::WrongType),
            None => 0.0,
        };
        let next = add_f64(current, delta)?;
        store_number(&mut keyspace, key, Scalar::Float(next));
        Ok(next)
    }

    // --- List operations ---

    pub fn lpush(&self, key: &str, value: impl Into<String>) -> StorageResult<usize> {
        self.push(key, value.into(), true)
    }

    pub fn rpush(&self, key: &str, value: impl Into<String>) -> StorageResult<usize> {
        self.push(key, value.into(), false)
    }

    fn push(&self, key: &str, value: String, front: bool) -> StorageResult<usize> {
        let mut keyspace = self.shared.lock();
        let entry = keyspace.entry_or_insert(key, Instant::now(), || Value::List(VecDeque::new()));
        match entry {
            Value::List(list) => {
                if front {
                    list.push_front(value);
                } else {
                    list.push_back(value);
                }
                Ok(list.len())
            }
            other => Err(wrong_type(key, other)),
        }
    }

    /// Lista inteira, ou vazia se a chave não existe.
    pub fn range(&self, key: &str) -> StorageResult<Vec<String>> {
        self.lrange(key, 0, -1)
    }

    pub fn lrange(&self, key: &str, start: i64, stop: i64) -> StorageResult<Vec<String>> {
        let keyspace = self.shared.lock();
        match keyspace.live(key, Instant::now()) {
            Some(Value::List(list)) => {
                let len = list.len() as i64;
                // Normalizar índices negativos (estilo Redis)
                let s = if start < 0 {
                    (len + start).max(0)
                } else {
                    start.min(len)
                };
                let e = if stop < 0 { len + stop } else { stop.min(len - 1) };

                if s > e || s >= len {
                    return Ok(vec![]);
                }

                Ok(list.range(s as usize..=e as usize).cloned().collect())
            }
            Some(other) => Err(wrong_type(key, other)),
            None => Ok(vec![]),
        }
    }

    /// Remove e retorna a cabeça; a chave some junto com o último elemento.
    pub fn lpop(&self, key: &str) -> StorageResult<String> {
        let mut keyspace = self.shared.lock();
        let (head, now_empty) = match keyspace.live_mut(key, Instant::now()) {
            Some(Value::List(list)) => {
                let head = list.pop_front().ok_or(StorageError::NotFound)?;
                (head, list.is_empty())
            }
            Some(other) => return Err(wrong_type(key, other)),
            None => return Err(StorageError::NotFound),
        };
        if now_empty {
            keyspace.remove(key);
        }
        Ok(head)
    }

    // --- Set operations ---

    /// Retorna quantos membros foram de fato adicionados.
    pub fn sadd<M: AsRef<str>>(&self, key: &str, members: &[M]) -> StorageResult<usize> {
        let now = Instant::now();
        let mut keyspace = self.shared.lock();
        if members.is_empty() {
            return match keyspace.live(key, now) {
                Some(Value::Set(_)) | None => Ok(0),
                Some(other) => Err(wrong_type(key, other)),
            };
        }

        match keyspace.entry_or_insert(key, now, || Value::Set(HashSet::new())) {
            Value::Set(set) => Ok(members
                .iter()
                .filter(|m| set.insert(m.as_ref().to_string()))
                .count()),
            other => Err(wrong_type(key, other)),
        }
    }

    pub fn smembers(&self, key: &str) -> StorageResult<Vec<String>> {
        let keyspace = self.shared.lock();
        match keyspace.live(key, Instant::now()) {
            Some(Value::Set(set)) => Ok(set.iter().cloned().collect()),
            Some(other) => Err(wrong_type(key, other)),
            None => Ok(vec![]),
        }
    }

    // --- Hash operations ---

    /// Retorna true se o campo foi criado, false se foi sobrescrito.
    pub fn hset(&self, key: &str, field: &str, value: impl Into<Scalar>) -> StorageResult<bool> {
        let mut keyspace = self.shared.lock();
        match keyspace.entry_or_insert(key, Instant::now(), || Value::Hash(HashMap::new())) {
            Value::Hash(hash) => Ok(hash
                .insert(field.to_string(), value.into().to_text())
                .is_none()),
            other => Err(wrong_type(key, other)),
        }
    }

    /// Grava todos os pares numa só operação. Retorna quantos campos foram criados.
    pub fn hset_many<I, F, V>(&self, key: &str, fields: I) -> StorageResult<usize>
    where
        I: IntoIterator<Item = (F, V)>,
        F: Into<String>,
        V: Into<Scalar>,
    {
        let fields: Vec<(String, String)> = fields
            .into_iter()
            .map(|(f, v)| (f.into(), v.into().to_text()))
            .collect();

        let now = Instant::now();
        let mut keyspace = self.shared.lock();
        if fields.is_empty() {
            return match keyspace.live(key, now) {
                Some(Value::Hash(_)) | None => Ok(0),
                Some(other) => Err(wrong_type(key, other)),
            };
        }

        match keyspace.entry_or_insert(key, now, || Value::Hash(HashMap::new())) {
            Value::Hash(hash) => Ok(fields
                .into_iter()
                .map(|(field, value)| hash.insert(field, value).is_none())
                .filter(|created| *created)
                .count()),
            other => Err(wrong_type(key, other)),
        }
    }

    pub fn hget(&self, key: &str, field: &str) -> StorageResult<String> {
        self.read_hash(key, |hash| hash.get(field).cloned())?
            .flatten()
            .ok_or(StorageError::NotFound)
    }

    pub fn hgetall(&self, key: &str) -> StorageResult<HashMap<String, String>> {
        Ok(self.read_hash(key, |hash| hash.clone())?.unwrap_or_default())
    }

    /// Apenas os campos pedidos que existem.
    pub fn hmget<F: AsRef<str>>(
        &self,
        key: &str,
        fields: &[F],
    ) -> StorageResult<HashMap<String, String>> {
        let found = self.read_hash(key, |hash| {
            fields
                .iter()
                .filter_map(|f| {
                    let f = f.as_ref();
                    hash.get(f).map(|v| (f.to_string(), v.clone()))
                })
                .collect()
        })?;
        Ok(found.unwrap_or_default())
    }

    pub fn hkeys(&self, key: &str) -> StorageResult<Vec<String>> {
        Ok(self
            .read_hash(key, |hash| hash.keys().cloned().collect())?
            .unwrap_or_default())
    }

    pub fn hvals(&self, key: &str) -> StorageResult<Vec<String>> {
        Ok(self
            .read_hash(key, |hash| hash.values().cloned().collect())?
            .unwrap_or_default())
    }

    pub fn hlen(&self, key: &str) -> StorageResult<usize> {
        Ok(self.read_hash(key, HashMap::len)?.unwrap_or(0))
    }

    pub fn hexists(&self, key: &str, field: &str) -> StorageResult<bool> {
        Ok(self
            .read_hash(key, |hash| hash.contains_key(field))?
            .unwrap_or(false))
    }

    /// Pares cujo nome de campo casa com o padrão glob.
    pub fn hscan(&self, key: &str, pattern: &str) -> StorageResult<HashMap<String, String>> {
        let pattern = GlobPattern::compile(pattern)?;
        let found = self.read_hash(key, |hash| {
            hash.iter()
                .filter(|(field, _)| pattern.matches(field))
                .map(|(f, v)| (f.clone(), v.clone()))
                .collect()
        })?;
        Ok(found.unwrap_or_default())
    }

    pub fn hdel<F: AsRef<str>>(&self, key: &str, fields: &[F]) -> StorageResult<usize> {
        let mut keyspace = self.shared.lock();
        let (removed, now_empty) = match keyspace.live_mut(key, Instant::now()) {
            Some(Value::Hash(hash)) => {
                let removed = fields
                    .iter()
                    .filter(|f| hash.remove(f.as_ref()).is_some())
                    .count();
                (removed, hash.is_empty())
            }
            Some(other) => return Err(wrong_type(key, other)),
            None => return Ok(0),
        };
        if now_empty {
            keyspace.remove(key);
        }
        Ok(removed)
    }

    pub fn hincr_by(&self, key: &str, field: &str, delta: i64) -> StorageResult<i64> {
        self.update_hash_field(key, field, |current| {
            let current = current.map(parse_i64).transpose()?.unwrap_or(0);
            let next = add_i64(current, delta)?;
            Ok((next, next.to_string()))
        })
    }

    pub fn hincr_by_float(&self, key: &str, field: &str, delta: f64) -> StorageResult<f64> {
        self.update_hash_field(key, field, |current| {
            let current = current.map(parse_f64).transpose()?.unwrap_or(0.0);
            let next = add_f64(current, delta)?;
            Ok((next, Scalar::Float(next).to_text()))
        })
    }

    // --- Sorted-set operations ---

    /// Retorna 1 se o par foi inserido, 0 se já existia.
    pub fn zadd(&self, key: &str, score: f64, member: impl Into<Scalar>) -> StorageResult<usize> {
        if score.is_nan() {
            return Err(StorageError::NotAFloat);
        }
        let member = member.into().to_text();
        let mut keyspace = self.shared.lock();
        match keyspace.entry_or_insert(key, Instant::now(), || Value::ScoreSet(ScoreSet::new())) {
            Value::ScoreSet(zset) => Ok(usize::from(zset.insert(score, member))),
            other => Err(wrong_type(key, other)),
        }
    }

    /// Conta entradas com `min <= score < max`. Limites aceitam "-inf"/"+inf".
    pub fn zcount(
        &self,
        key: &str,
        min: impl Into<Scalar>,
        max: impl Into<Scalar>,
    ) -> StorageResult<usize> {
        let min = ScoreBound::from_scalar(&min.into())?;
        let max = ScoreBound::from_scalar(&max.into())?;
        let keyspace = self.shared.lock();
        match keyspace.live(key, Instant::now()) {
            Some(Value::ScoreSet(zset)) => Ok(zset.count(min, max)),
            Some(other) => Err(wrong_type(key, other)),
            None => Ok(0),
        }
    }

    // --- Helpers ---

    /// Aplica `f` ao hash vivo. `Ok(None)` se a chave não existe.
    fn read_hash<T>(
        &self,
        key: &str,
        f: impl FnOnce(&HashMap<String, String>) -> T,
    ) -> StorageResult<Option<T>> {
        let keyspace = self.shared.lock();
        match keyspace.live(key, Instant::now()) {
            Some(Value::Hash(hash)) => Ok(Some(f(hash))),
            Some(other) => Err(wrong_type(key, other)),
            None => Ok(None),
        }
    }

    /// Read-modify-write de um campo. `update` recebe o texto atual e
    /// devolve o resultado e o novo texto; em erro nada é gravado.
    fn update_hash_field<T>(
        &self,
        key: &str,
        field: &str,
        update: impl FnOnce(Option<&str>) -> StorageResult<(T, String)>,
    ) -> StorageResult<T> {
        let now = Instant::now();
        let mut keyspace = self.shared.lock();
        let (result, text) = match keyspace.live(key, now) {
            Some(Value::Hash(hash)) => update(hash.get(field).map(String::as_str))?,
            Some(other) => return Err(wrong_type(key, other)),
            None => update(None)?,
        };
        match keyspace.entry_or_insert(key, now, || Value::Hash(HashMap::new())) {
            Value::Hash(hash) => {
                hash.insert(field.to_string(), text);
                Ok(result)
            }
            other => Err(wrong_type(key, other)),
        }
    }
}

/// Grava o resultado de um incremento preservando a expiração da chave viva.
fn store_number(keyspace: &mut Keyspace, key: &str, value: Scalar) {
    keyspace.values.insert(key.to_string(), Value::Scalar(value));
}

/// `now + ttl_secs`. TTL não positivo ou prazo que estoura o relógio → `InvalidExpire`.
fn deadline_after(now: Instant, ttl_secs: i64) -> StorageResult<Instant> {
    u64::try_from(ttl_secs)
        .ok()
        .filter(|secs| *secs > 0)
        .and_then(|secs| now.checked_add(Duration::from_secs(secs)))
        .ok_or(StorageError::InvalidExpire(ttl_secs))
}

fn wrong_type(key: &str, found: &Value) -> StorageError {
    debug!("chave {key} contém {}", found.kind());
    StorageError::WrongType
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_set_basic() {
        let store = Store::new();
        store.set("key", "value");
        assert_eq!(store.get("key").unwrap(), "value");
    }

    #[test]
    fn get_nonexistent() {
        let store = Store::new();
        assert_eq!(store.get("missing"), Err(StorageError::NotFound));
    }

    #[test]
    fn get_formats_numbers() {
        let store = Store::new();
        store.set("int", 32);
        store.set("float", 1.5);
        store.set("whole", 2.0);
        assert_eq!(store.get("int").unwrap(), "32");
        assert_eq!(store.get("float").unwrap(), "1.5");
        assert_eq!(store.get("whole").unwrap(), "2");
    }

    #[test]
    fn get_on_list_is_wrong_type() {
        let store = Store::new();
        store.rpush("list", "a").unwrap();
        assert_eq!(store.get("list"), Err(StorageError::WrongType));
    }

    #[tokio::test(start_paused = true)]
    async fn set_with_expiry() {
        let store = Store::new();
        store.set_ex("key", 1, "1").unwrap();
        assert_eq!(store.get("key").unwrap(), "1");

        tokio::time::advance(Duration::from_millis(1100)).await;
        assert_eq!(store.get("key"), Err(StorageError::NotFound));
    }

    #[tokio::test(start_paused = true)]
    async fn set_clears_previous_expiry() {
        let store = Store::new();
        store.set_ex("key", 1, 1).unwrap();
        store.set("key", 1);

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(store.get("key").unwrap(), "1");
    }

    #[test]
    fn set_ex_rejects_non_positive_ttl() {
        let store = Store::new();
        assert_eq!(store.set_ex("key", 0, "v"), Err(StorageError::InvalidExpire(0)));
        assert_eq!(
            store.set_nx_ex("key", "v", -5),
            Err(StorageError::InvalidExpire(-5))
        );
        assert_eq!(store.get("key"), Err(StorageError::NotFound));
    }

    #[test]
    fn ttl_beyond_the_clock_is_rejected() {
        let store = Store::new();
        assert_eq!(
            store.set_ex("key", i64::MAX, "v"),
            Err(StorageError::InvalidExpire(i64::MAX))
        );
        assert_eq!(
            store.set_nx_ex("key", "v", i64::MAX),
            Err(StorageError::InvalidExpire(i64::MAX))
        );
        assert_eq!(store.get("key"), Err(StorageError::NotFound));

        store.set_ex("live", 10, "v").unwrap();
        assert_eq!(
            store.expire("live", i64::MAX),
            Err(StorageError::InvalidExpire(i64::MAX))
        );
        assert_eq!(store.get("live").unwrap(), "v");
        assert_eq!(store.expire("missing", i64::MAX), Ok(false));
    }

    #[tokio::test(start_paused = true)]
    async fn set_nx_ex_once_per_epoch() {
        let store = Store::new();
        store.set("existing", 1);
        assert!(!store.set_nx_ex("existing", 2, 1).unwrap());
        assert_eq!(store.get("existing").unwrap(), "1");

        assert!(store.set_nx_ex("fresh", "a", 1).unwrap());
        assert!(!store.set_nx_ex("fresh", "b", 1).unwrap());
        assert_eq!(store.get("fresh").unwrap(), "a");

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(store.set_nx_ex("fresh", "c", 1).unwrap());
        assert_eq!(store.get("fresh").unwrap(), "c");
    }

    #[tokio::test(start_paused = true)]
    async fn expire_existing_key() {
        let store = Store::new();
        store.set("key", "1");
        assert!(store.expire("key", 1).unwrap());
        assert_eq!(store.get("key").unwrap(), "1");

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(store.get("key"), Err(StorageError::NotFound));
        assert!(!store.expire("key", 10).unwrap());
    }

    #[test]
    fn expire_missing_key() {
        let store = Store::new();
        assert!(!store.expire("missing", 1).unwrap());
        assert_eq!(store.exists(&["missing"]), 0);
    }

    #[test]
    fn expire_non_positive_removes() {
        let store = Store::new();
        store.set("key", "v");
        assert!(store.expire("key", 0).unwrap());
        assert_eq!(store.get("key"), Err(StorageError::NotFound));
    }

    #[tokio::test(start_paused = true)]
    async fn expiry_applies_to_structures() {
        let store = Store::new();
        store.hset("hash", "f", "v").unwrap();
        store.rpush("list", "a").unwrap();
        assert!(store.expire("hash", 1).unwrap());
        assert!(store.expire("list", 1).unwrap());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(store.hlen("hash").unwrap(), 0);
        assert_eq!(store.range("list").unwrap(), Vec::<String>::new());
        assert_eq!(store.lpop("list"), Err(StorageError::NotFound));

        // Escrita em chave vencida recria sem expiração
        store.set("hash", "scalar");
        assert_eq!(store.get("hash").unwrap(), "scalar");
    }

    #[tokio::test(start_paused = true)]
    async fn write_to_expired_key_starts_fresh() {
        let store = Store::new();
        store.rpush("list", "old").unwrap();
        store.expire("list", 1).unwrap();

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(store.rpush("list", "new").unwrap(), 1);

        tokio::time::advance(Duration::from_secs(10)).await;
        assert_eq!(store.range("list").unwrap(), vec!["new"]);
    }

    #[test]
    fn del_keys() {
        let store = Store::new();
        store.set("a", "1");
        store.set("b", "2");

        let deleted = store.del(&["a", "b", "c"]);
        assert_eq!(deleted, 2);
        assert_eq!(store.get("a"), Err(StorageError::NotFound));
    }

    #[tokio::test(start_paused = true)]
    async fn del_does_not_count_expired() {
        let store = Store::new();
        store.set_ex("a", 1, "1").unwrap();
        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(store.del(&["a"]), 0);
    }

    #[test]
    fn exists_keys() {
        let store = Store::new();
        store.set("a", "1");
        assert_eq!(store.exists(&["a", "b"]), 1);
    }

    #[test]
    fn mget_with_missing_keys() {
        let store = Store::new();
        store.set("a", "1");
        store.set("b", 2);
        store.rpush("list", "x").unwrap();

        assert_eq!(
            store.mget(&["a", "b", "nope", "list"]),
            vec!["1", "2", "", ""]
        );
    }

    #[test]
    fn incr_by_basic() {
        let store = Store::new();
        // INCRBY em chave inexistente parte de 0
        assert_eq!(store.incr_by("counter", 10).unwrap(), 10);
        assert_eq!(store.incr_by("counter", 5).unwrap(), 15);
        assert_eq!(store.incr("counter").unwrap(), 16);
        assert_eq!(store.get("counter").unwrap(), "16");
    }

    #[test]
    fn incr_by_from_stored_values() {
        let store = Store::new();
        store.set("int", 1);
        assert_eq!(store.incr_by("int", 10).unwrap(), 11);

        store.set("text", "2");
        assert_eq!(store.incr("text").unwrap(), 3);
        assert_eq!(store.get("text").unwrap(), "3");
    }

    #[test]
    fn incr_not_integer() {
        let store = Store::new();
        store.set("key", "not_a_number");
        assert_eq!(store.incr("key"), Err(StorageError::NotAnInteger));
        assert_eq!(store.get("key").unwrap(), "not_a_number");

        store.set("float", 1.5);
        assert_eq!(store.incr("float"), Err(StorageError::NotAnInteger));

        store.set("max", i64::MAX);
        assert_eq!(store.incr("max"), Err(StorageError::NotAnInteger));
    }

    #[test]
    fn incr_wrong_type() {
        let store = Store::new();
        store.lpush("list", "a").unwrap();
        assert_eq!(store.incr("list"), Err(StorageError::WrongType));
    }

    #[tokio::test(start_paused = true)]
    async fn incr_keeps_expiry() {
        let store = Store::new();
        store.set_ex("counter", 1, 5).unwrap();
        assert_eq!(store.incr("counter").unwrap(), 6);

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(store.get("counter"), Err(StorageError::NotFound));
        assert_eq!(store.incr("counter").unwrap(), 1);
    }

    #[test]
    fn incr_by_float_basic() {
        let store = Store::new();
        assert_eq!(store.incr_by_float("f", 10.5).unwrap(), 10.5);

        store.set("f", 1.1);
        assert_eq!(store.incr_by_float("f", 10.5).unwrap(), 11.6);
        assert_eq!(store.get("f").unwrap(), "11.6");

        store.set("text", "abc");
        assert_eq!(store.incr_by_float("text", 1.0), Err(StorageError::NotAFloat));
        assert_eq!(
            store.incr_by_float("f", f64::INFINITY),
            Err(StorageError::NotAFloat)
        );
    }

    #[test]
    fn lpush_rpush() {
        let store = Store::new();
        assert_eq!(store.rpush("list", "a").unwrap(), 1);
        assert_eq!(store.rpush("list", "b").unwrap(), 2);
        assert_eq!(store.lpush("list", "c").unwrap(), 3);
        // list = [c, a, b]
        assert_eq!(store.range("list").unwrap(), vec!["c", "a", "b"]);
    }

    #[test]
    fn lpush_then_drain() {
        let store = Store::new();
        store.lpush("k", "a").unwrap();
        store.lpush("k", "b").unwrap();
        assert_eq!(store.range("k").unwrap(), vec!["b", "a"]);

        assert_eq!(store.lpop("k").unwrap(), "b");
        assert_eq!(store.lpop("k").unwrap(), "a");
        // Lista vazia remove a chave
        assert_eq!(store.exists(&["k"]), 0);
        assert_eq!(store.lpop("k"), Err(StorageError::NotFound));
    }

    #[test]
    fn lrange_negative_indices() {
        let store = Store::new();
        for v in ["a", "b", "c", "d"] {
            store.rpush("list", v).unwrap();
        }

        // Últimos 2 elementos
        assert_eq!(store.lrange("list", -2, -1).unwrap(), vec!["c", "d"]);
        // Primeiro ao penúltimo
        assert_eq!(store.lrange("list", 0, -2).unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn lrange_out_of_bounds() {
        let store = Store::new();
        store.rpush("list", "a").unwrap();

        assert_eq!(store.lrange("list", 0, 100).unwrap(), vec!["a"]);
        assert!(store.lrange("list", 5, 10).unwrap().is_empty());
        assert!(store.lrange("list", 0, -5).unwrap().is_empty());
    }

    #[test]
    fn range_missing_key_is_empty() {
        let store = Store::new();
        assert!(store.range("nope").unwrap().is_empty());
    }

    #[test]
    fn wrong_type_list_on_string() {
        let store = Store::new();
        store.set("key", "value");
        assert_eq!(store.lpush("key", "a"), Err(StorageError::WrongType));
        assert_eq!(store.range("key"), Err(StorageError::WrongType));
        assert_eq!(store.lpop("key"), Err(StorageError::WrongType));
        assert_eq!(store.get("key").unwrap(), "value");
    }

    #[test]
    fn sadd_counts_new_members() {
        let store = Store::new();
        assert_eq!(store.sadd("s", &["a"]).unwrap(), 1);
        assert_eq!(store.sadd("s", &["a"]).unwrap(), 0);
        assert_eq!(store.sadd("s", &["a", "b"]).unwrap(), 1);
        assert_eq!(store.sadd("s", &["c", "d"]).unwrap(), 2);
        assert_eq!(store.sadd("t", &["x", "y", "x"]).unwrap(), 2);
    }

    #[test]
    fn smembers() {
        let store = Store::new();
        store.sadd("s", &["a", "b", "c", "a"]).unwrap();
        let mut members = store.smembers("s").unwrap();
        members.sort();
        assert_eq!(members, vec!["a", "b", "c"]);
        assert!(store.smembers("missing").unwrap().is_empty());

        store.set("s", "string");
        assert_eq!(store.sadd("s", &["a"]), Err(StorageError::WrongType));
        assert_eq!(store.smembers("s"), Err(StorageError::WrongType));
    }

    #[test]
    fn sadd_without_members_does_not_create() {
        let store = Store::new();
        assert_eq!(store.sadd::<&str>("s", &[]).unwrap(), 0);
        assert_eq!(store.exists(&["s"]), 0);
    }

    #[test]
    fn hset_created_then_overwritten() {
        let store = Store::new();
        assert!(store.hset("h", "f", "1").unwrap());
        assert!(!store.hset("h", "f", "1").unwrap());
        assert_eq!(store.hget("h", "f").unwrap(), "1");
        assert_eq!(store.hincr_by("h", "f", 10).unwrap(), 11);
        assert_eq!(store.hget("h", "f").unwrap(), "11");
    }

    #[test]
    fn hset_stores_numbers_as_text() {
        let store = Store::new();
        store.hset("h", "i", 7).unwrap();
        store.hset("h", "f", 2.5).unwrap();
        store.hset("h", "b", true).unwrap();
        assert_eq!(store.hget("h", "i").unwrap(), "7");
        assert_eq!(store.hget("h", "f").unwrap(), "2.5");
        assert_eq!(store.hget("h", "b").unwrap(), "1");
    }

    #[test]
    fn hget_missing() {
        let store = Store::new();
        assert_eq!(store.hget("h", "f"), Err(StorageError::NotFound));
        store.hset("h", "exists", 0).unwrap();
        assert_eq!(store.hget("h", "f"), Err(StorageError::NotFound));
    }

    #[test]
    fn hash_ops_on_scalar_are_wrong_type() {
        let store = Store::new();
        store.set("k", "garbage");
        assert_eq!(store.hset("k", "f", "v"), Err(StorageError::WrongType));
        assert_eq!(store.hget("k", "f"), Err(StorageError::WrongType));
        assert_eq!(store.hgetall("k"), Err(StorageError::WrongType));
        assert_eq!(store.hkeys("k"), Err(StorageError::WrongType));
        assert_eq!(store.hvals("k"), Err(StorageError::WrongType));
        assert_eq!(store.hlen("k"), Err(StorageError::WrongType));
        assert_eq!(store.hexists("k", "f"), Err(StorageError::WrongType));
        assert_eq!(store.hdel("k", &["f"]), Err(StorageError::WrongType));
        assert_eq!(store.hscan("k", "*"), Err(StorageError::WrongType));
        assert_eq!(store.hincr_by("k", "f", 1), Err(StorageError::WrongType));
        assert_eq!(
            store.hset_many("k", [("a", 1)]),
            Err(StorageError::WrongType)
        );
        assert_eq!(store.get("k").unwrap(), "garbage");
    }

    #[test]
    fn hset_many_and_views() {
        let store = Store::new();
        store.hset("h", "original", "there").unwrap();
        let created = store
            .hset_many("h", [("a", Scalar::from(1)), ("b", Scalar::from("x"))])
            .unwrap();
        assert_eq!(created, 2);
        assert_eq!(store.hset_many("h", [("a", 2), ("c", 3)]).unwrap(), 1);
        store.hset("h", "a", 1).unwrap();
        store.hdel("h", &["c"]).unwrap();

        let all = store.hgetall("h").unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all["original"], "there");
        assert_eq!(all["a"], "1");
        assert_eq!(all["b"], "x");

        let mut keys = store.hkeys("h").unwrap();
        keys.sort();
        assert_eq!(keys, vec!["a", "b", "original"]);

        let mut vals = store.hvals("h").unwrap();
        vals.sort();
        assert_eq!(vals, vec!["1", "there", "x"]);

        assert_eq!(store.hlen("h").unwrap(), 3);
        assert_eq!(store.hlen("missing").unwrap(), 0);
        assert!(store.hgetall("missing").unwrap().is_empty());
    }

    #[test]
    fn hmget_only_existing_fields() {
        let store = Store::new();
        store
            .hset_many("h", [("a", "1"), ("b", "x"), ("extra", "true")])
            .unwrap();
        let got = store.hmget("h", &["a", "b", "zzz"]).unwrap();
        assert_eq!(got.len(), 2);
        assert_eq!(got["a"], "1");
        assert_eq!(got["b"], "x");
    }

    #[test]
    fn hdel_and_hexists() {
        let store = Store::new();
        store
            .hset_many("h", [("a", Scalar::from(1)), ("b", "x".into()), ("c", true.into())])
            .unwrap();

        assert!(store.hexists("h", "a").unwrap());
        assert!(!store.hexists("h", "zzz").unwrap());
        assert!(!store.hexists("missing", "a").unwrap());

        assert_eq!(store.hdel("h", &["a"]).unwrap(), 1);
        assert_eq!(store.hlen("h").unwrap(), 2);
        assert_eq!(store.hdel("h", &["a", "b", "c"]).unwrap(), 2);
        // Hash vazio remove a chave
        assert_eq!(store.exists(&["h"]), 0);
        assert_eq!(store.hdel("missing", &["a"]).unwrap(), 0);
    }

    #[test]
    fn hscan_filters_fields() {
        let store = Store::new();
        store.hset_many("h", [("aaa", Scalar::from(1)), ("aba", "x".into())]).unwrap();

        let found = store.hscan("h", "aa*").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found["aaa"], "1");

        assert_eq!(store.hscan("h", "a?a").unwrap().len(), 2);
        assert!(store.hscan("missing", "*").unwrap().is_empty());
        assert!(matches!(
            store.hscan("h", "[a"),
            Err(StorageError::InvalidPattern(_))
        ));
    }

    #[test]
    fn hincr_by_conversion_errors() {
        let store = Store::new();
        store.hset("h", "f", 1).unwrap();
        assert_eq!(store.hincr_by("h", "f", 10).unwrap(), 11);

        store.hset("h", "f", "1.1").unwrap();
        assert_eq!(store.hincr_by("h", "f", 1), Err(StorageError::NotAnInteger));
        assert_eq!(store.hget("h", "f").unwrap(), "1.1");

        assert_eq!(store.hincr_by("h", "new", -3).unwrap(), -3);
        assert_eq!(store.hincr_by("fresh", "f", 4).unwrap(), 4);
    }

    #[test]
    fn hincr_by_float() {
        let store = Store::new();
        store.hset("h", "f", 1).unwrap();
        assert_eq!(store.hincr_by_float("h", "f", 10.5).unwrap(), 11.5);

        store.hset("h", "f", "1.1").unwrap();
        assert_eq!(store.hincr_by_float("h", "f", 10.5).unwrap(), 11.6);
        assert_eq!(store.hget("h", "f").unwrap(), "11.6");

        store.hset("h", "f", "a").unwrap();
        assert_eq!(
            store.hincr_by_float("h", "f", 1.1),
            Err(StorageError::NotAFloat)
        );
    }

    #[test]
    fn hincr_by_float_error_leaves_no_key() {
        let store = Store::new();
        assert_eq!(
            store.hincr_by_float("h", "f", f64::NAN),
            Err(StorageError::NotAFloat)
        );
        assert_eq!(store.exists(&["h"]), 0);
    }

    #[test]
    fn zadd_idempotent() {
        let store = Store::new();
        assert_eq!(store.zadd("z", 1.0, "x").unwrap(), 1);
        assert_eq!(store.zadd("z", 1.0, "x").unwrap(), 0);
        assert_eq!(store.zcount("z", "-inf", "+inf").unwrap(), 1);
    }

    #[test]
    fn zadd_member_normalized_to_text() {
        let store = Store::new();
        assert_eq!(store.zadd("z", 1.0, 5).unwrap(), 1);
        assert_eq!(store.zadd("z", 1.0, "5").unwrap(), 0);
        assert_eq!(store.zadd("z", 1.0, 5.0).unwrap(), 0);
        assert_eq!(store.zadd("z", f64::NAN, "x"), Err(StorageError::NotAFloat));
    }

    #[test]
    fn zcount_ranges() {
        let store = Store::new();
        store.zadd("z", -1.0, "a").unwrap();
        store.zadd("z", 1.0, "b").unwrap();

        assert_eq!(store.zcount("z", 0, "+inf").unwrap(), 1);
        assert_eq!(store.zcount("z", "-inf", 0).unwrap(), 1);
        assert_eq!(store.zcount("z", -10, 10).unwrap(), 2);
        // limite superior exclusivo
        assert_eq!(store.zcount("z", -1, 1).unwrap(), 1);
        assert_eq!(store.zcount("z", "-1", "1.5").unwrap(), 2);
    }

    #[test]
    fn zcount_missing_key_and_bad_bounds() {
        let store = Store::new();
        assert_eq!(store.zcount("nope", "-inf", "+inf").unwrap(), 0);
        assert!(matches!(
            store.zcount("nope", "abc", "+inf"),
            Err(StorageError::InvalidBound(_))
        ));

        store.set("s", "v");
        assert_eq!(store.zadd("s", 1.0, "x"), Err(StorageError::WrongType));
        assert_eq!(store.zcount("s", 0, 1), Err(StorageError::WrongType));
    }

    #[test]
    fn key_kind_is_fixed() {
        let store = Store::new();
        store.rpush("k", "a").unwrap();
        assert_eq!(store.hset("k", "f", "v"), Err(StorageError::WrongType));
        assert_eq!(store.sadd("k", &["m"]), Err(StorageError::WrongType));
        assert_eq!(store.zadd("k", 1.0, "m"), Err(StorageError::WrongType));
        assert_eq!(store.range("k").unwrap(), vec!["a"]);
    }

    #[test]
    fn concurrent_set_del_get_mget() {
        let store = Store::new();
        let key = "shared";

        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    for _ in 0..200 {
                        store.set(key, 32);
                    }
                });
                scope.spawn(|| {
                    for _ in 0..200 {
                        store.del(&[key]);
                    }
                });
                scope.spawn(|| {
                    for _ in 0..200 {
                        match store.get(key) {
                            Ok(v) => assert_eq!(v, "32"),
                            Err(e) => assert_eq!(e, StorageError::NotFound),
                        }
                    }
                });
                scope.spawn(|| {
                    for _ in 0..200 {
                        let values = store.mget(&[key, key, key, key]);
                        assert_eq!(values.len(), 4);
                        // MGET é atômico: as quatro leituras veem o mesmo estado
                        assert!(values.iter().all(|v| *v == values[0]));
                    }
                });
            }
        });
    }

    #[test]
    fn concurrent_incr_is_atomic() {
        let store = Store::new();
        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..1_000 {
                        store.incr("counter").unwrap();
                    }
                });
            }
        });
        assert_eq!(store.get("counter").unwrap(), "4000");
    }
}
