use std::str::FromStr;

use twinkv_common::{StorageError, StorageResult};

use crate::value::Scalar;

/// Pares (score, membro) ordenados por score ascendente.
///
/// A unicidade é pelo par: o mesmo membro pode aparecer com scores
/// diferentes. Membros são comparados pela forma textual.
#[derive(Debug, Clone, Default)]
pub struct ScoreSet {
    entries: Vec<(f64, String)>,
}

impl ScoreSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insere o par mantendo a ordem. Retorna false se o par já existia.
    pub fn insert(&mut self, score: f64, member: String) -> bool {
        let start = self.entries.partition_point(|(s, _)| *s < score);
        let exists = self.entries[start..]
            .iter()
            .take_while(|(s, _)| *s == score)
            .any(|(_, m)| *m == member);
        if exists {
            return false;
        }

        let at = self.entries.partition_point(|(s, _)| *s <= score);
        self.entries.insert(at, (score, member));
        true
    }

    /// Conta entradas com `min <= score < max`; um limite infinito não restringe.
    pub fn count(&self, min: ScoreBound, max: ScoreBound) -> usize {
        let lower = match min {
            ScoreBound::NegInf => 0,
            ScoreBound::PosInf => self.first_not_below(f64::INFINITY),
            ScoreBound::Score(b) => self.first_not_below(b),
        };
        let upper = match max {
            ScoreBound::NegInf => 0,
            ScoreBound::PosInf => self.entries.len(),
            ScoreBound::Score(b) => self.first_not_below(b),
        };
        upper.saturating_sub(lower)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, &str)> {
        self.entries.iter().map(|(s, m)| (*s, m.as_str()))
    }

    fn first_not_below(&self, bound: f64) -> usize {
        self.entries.partition_point(|(s, _)| *s < bound)
    }
}

/// Limite de um intervalo de scores.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScoreBound {
    NegInf,
    PosInf,
    Score(f64),
}

impl ScoreBound {
    /// Interpreta um escalar como limite: números valem como score, strings
    /// precisam ser um sentinela de infinito ou um número.
    pub fn from_scalar(value: &Scalar) -> StorageResult<Self> {
        match value {
            Scalar::Int(n) => Ok(ScoreBound::Score(*n as f64)),
            Scalar::Float(f) => Self::from_f64(*f),
            Scalar::Str(s) => s.parse(),
        }
    }

    fn from_f64(f: f64) -> StorageResult<Self> {
        if f.is_nan() {
            Err(StorageError::InvalidBound("nan".into()))
        } else if f == f64::INFINITY {
            Ok(ScoreBound::PosInf)
        } else if f == f64::NEG_INFINITY {
            Ok(ScoreBound::NegInf)
        } else {
            Ok(ScoreBound::Score(f))
        }
    }
}

impl FromStr for ScoreBound {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "-inf" | "-infinity" => Ok(ScoreBound::NegInf),
            "+inf" | "inf" | "+infinity" | "infinity" => Ok(ScoreBound::PosInf),
            other => match other.parse::<f64>() {
                Ok(f) if f.is_finite() => Ok(ScoreBound::Score(f)),
                _ => Err(StorageError::InvalidBound(s.to_string())),
            },
        }
    }
}
