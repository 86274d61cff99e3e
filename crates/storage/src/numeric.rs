//! Coerção entre texto e números.
//!
//! Regras de parse: inteiro decimal com sinal opcional, ou literal de ponto
//! flutuante finito. Qualquer outra coisa falha com o erro de conversão do
//! tipo pedido.

use twinkv_common::{FLOAT_PRECISION, StorageError, StorageResult};

/// Formata um float como texto decimal.
///
/// Valores integrais saem sem parte fracionária; os demais com precisão
/// fixa de `FLOAT_PRECISION` dígitos significativos, sem zeros à direita.
pub fn format_float(value: f64) -> String {
    if value == 0.0 {
        return "0".into();
    }
    if !value.is_finite() {
        return if value.is_nan() {
            "nan".into()
        } else if value > 0.0 {
            "inf".into()
        } else {
            "-inf".into()
        };
    }
    if value.fract() == 0.0 {
        return format!("{value:.0}");
    }

    let magnitude = value.abs().log10().floor() as i32;
    let decimals = (FLOAT_PRECISION as i32 - 1 - magnitude).max(0) as usize;
    let fixed = format!("{value:.decimals$}");
    if decimals == 0 {
        return fixed;
    }
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    match trimmed {
        "-0" => "0".into(),
        s => s.to_string(),
    }
}

pub fn parse_i64(s: &str) -> StorageResult<i64> {
    s.parse::<i64>().map_err(|_| StorageError::NotAnInteger)
}

/// Aceita apenas literais finitos ("inf" e "nan" são rejeitados).
pub fn parse_f64(s: &str) -> StorageResult<f64> {
    match s.parse::<f64>() {
        Ok(f) if f.is_finite() => Ok(f),
        _ => Err(StorageError::NotAFloat),
    }
}

pub fn add_i64(current: i64, delta: i64) -> StorageResult<i64> {
    current
        .checked_add(delta)
        .ok_or(StorageError::NotAnInteger)
}

/// Soma que não pode produzir NaN nem infinito.
pub fn add_f64(current: f64, delta: f64) -> StorageResult<f64> {
    let next = current + delta;
    if next.is_finite() {
        Ok(next)
    } else {
        Err(StorageError::NotAFloat)
    }
}
