use twinkv_common::CommandError;

use crate::Frame;

/// Cursor sobre um Frame::Array para extrair argumentos sequencialmente.
pub struct Parse {
    parts: std::vec::IntoIter<Frame>,
}

impl Parse {
    /// Cria um Parse a partir de um Frame. O frame deve ser Array.
    pub fn new(frame: Frame) -> Result<Parse, CommandError> {
        match frame {
            Frame::Array(parts) => Ok(Parse {
                parts: parts.into_iter(),
            }),
            _ => Err(CommandError::InvalidArgument("esperado array".into())),
        }
    }

    /// Retorna o próximo elemento como String (de Bulk ou Simple).
    pub fn next_string(&mut self) -> Result<String, CommandError> {
        match self.next()? {
            Frame::Simple(s) => Ok(s),
            Frame::Bulk(data) => String::from_utf8(data.to_vec())
                .map_err(|_| CommandError::InvalidArgument("string UTF-8 inválida".into())),
            _ => Err(CommandError::InvalidArgument(
                "esperado string ou bulk".into(),
            )),
        }
    }

    /// Retorna o próximo elemento como i64.
    pub fn next_int(&mut self) -> Result<i64, CommandError> {
        match self.next()? {
            Frame::Integer(n) => Ok(n),
            frame => {
                let s = text_of(frame)?;
                s.parse::<i64>()
                    .map_err(|_| CommandError::InvalidArgument(format!("'{s}' não é um inteiro")))
            }
        }
    }

    /// Retorna o próximo elemento como f64 (aceita "inf"/"-inf").
    pub fn next_float(&mut self) -> Result<f64, CommandError> {
        match self.next()? {
            Frame::Integer(n) => Ok(n as f64),
            frame => {
                let s = text_of(frame)?;
                s.parse::<f64>()
                    .map_err(|_| CommandError::InvalidArgument(format!("'{s}' não é um float")))
            }
        }
    }

    /// Consome todos os argumentos restantes como strings.
    pub fn rest(&mut self) -> Result<Vec<String>, CommandError> {
        let mut out = Vec::with_capacity(self.remaining());
        while self.has_remaining() {
            out.push(self.next_string()?);
        }
        Ok(out)
    }

    /// Verifica se todos os argumentos foram consumidos.
    pub fn finish(&self) -> Result<(), CommandError> {
        if self.has_remaining() {
            Err(CommandError::InvalidArgument(
                "argumentos extras não esperados".into(),
            ))
        } else {
            Ok(())
        }
    }

    /// Verifica se ainda há argumentos restantes.
    pub fn has_remaining(&self) -> bool {
        self.remaining() > 0
    }

    /// Retorna o número de argumentos restantes.
    pub fn remaining(&self) -> usize {
        self.parts.len()
    }

    fn next(&mut self) -> Result<Frame, CommandError> {
        self.parts
            .next()
            .ok_or_else(|| CommandError::InvalidArgument("argumentos insuficientes".into()))
    }
}

fn text_of(frame: Frame) -> Result<String, CommandError> {
    frame
        .into_text()
        .ok_or_else(|| CommandError::InvalidArgument("esperado número".into()))
}
