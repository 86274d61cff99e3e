use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;

use twinkv_common::{StorageError, StorageResult};

use crate::numeric::{format_float, parse_f64, parse_i64};
use crate::zset::ScoreSet;

/// Valor escalar: texto ou número, guardado com o tipo com que foi escrito.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Str(String),
    Int(i64),
    Float(f64),
}

impl Scalar {
    /// Representação textual canônica (usada por GET, hashes e membros de score-sets).
    pub fn to_text(&self) -> String {
        match self {
            Scalar::Str(s) => s.clone(),
            Scalar::Int(n) => n.to_string(),
            Scalar::Float(f) => format_float(*f),
        }
    }

    /// Coerção para inteiro. Floats só convertem se forem integrais.
    pub fn to_i64(&self) -> StorageResult<i64> {
        match self {
            Scalar::Int(n) => Ok(*n),
            Scalar::Float(f) => {
                if f.is_finite() && f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64
                {
                    Ok(*f as i64)
                } else {
                    Err(StorageError::NotAnInteger)
                }
            }
            Scalar::Str(s) => parse_i64(s),
        }
    }

    pub fn to_f64(&self) -> StorageResult<f64> {
        match self {
            Scalar::Int(n) => Ok(*n as f64),
            Scalar::Float(f) if f.is_finite() => Ok(*f),
            Scalar::Float(_) => Err(StorageError::NotAFloat),
            Scalar::Str(s) => parse_f64(s),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Str(s) => f.write_str(s),
            Scalar::Int(n) => write!(f, "{n}"),
            Scalar::Float(v) => f.write_str(&format_float(*v)),
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Str(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::Str(s)
    }
}

impl From<&String> for Scalar {
    fn from(s: &String) -> Self {
        Scalar::Str(s.clone())
    }
}

impl From<i64> for Scalar {
    fn from(n: i64) -> Self {
        Scalar::Int(n)
    }
}

impl From<i32> for Scalar {
    fn from(n: i32) -> Self {
        Scalar::Int(n.into())
    }
}

impl From<u32> for Scalar {
    fn from(n: u32) -> Self {
        Scalar::Int(n.into())
    }
}

impl From<f64> for Scalar {
    fn from(f: f64) -> Self {
        Scalar::Float(f)
    }
}

impl From<f32> for Scalar {
    fn from(f: f32) -> Self {
        Scalar::Float(f.into())
    }
}

/// Booleanos viram 1/0, como fazem os clientes Redis.
impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Scalar::Int(i64::from(b))
    }
}

/// Tipo do valor armazenado. Uma chave tem exatamente um tipo ativo.
#[derive(Debug, Clone)]
pub enum Value {
    Scalar(Scalar),
    List(VecDeque<String>),
    Set(HashSet<String>),
    Hash(HashMap<String, String>),
    ScoreSet(ScoreSet),
}

impl Value {
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Scalar(_) => "string",
            Value::List(_) => "list",
            Value::Set(_) => "set",
            Value::Hash(_) => "hash",
            Value::ScoreSet(_) => "zset",
        }
    }
}
