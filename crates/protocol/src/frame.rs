use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::io::Cursor;
use twinkv_common::{MAX_FRAME_SIZE, ProtocolError};

/// Representação de um frame RESP2.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Simple(String),
    Error(String),
    Integer(i64),
    Bulk(Bytes),
    Null,
    Array(Vec<Frame>),
}

impl Frame {
    /// Verifica se um frame completo está disponível no buffer sem alocar.
    /// Retorna Ok(()) se completo, Err(Incomplete) se precisa mais dados.
    pub fn check(src: &mut Cursor<&[u8]>) -> Result<(), ProtocolError> {
        match get_u8(src)? {
            b'+' | b'-' | b':' => {
                get_line(src)?;
                Ok(())
            }
            b'$' => match get_length(src)? {
                None => Ok(()),
                Some(len) => skip(src, len + 2), // dados + \r\n
            },
            b'*' => {
                if let Some(count) = get_length(src)? {
                    for _ in 0..count {
                        Frame::check(src)?;
                    }
                }
                Ok(())
            }
            byte => Err(ProtocolError::InvalidFrameType(byte)),
        }
    }

    /// Faz o parse de um frame completo a partir do cursor.
    /// Deve ser chamado apenas após `check()` retornar Ok.
    pub fn parse(src: &mut Cursor<&[u8]>) -> Result<Frame, ProtocolError> {
        match get_u8(src)? {
            b'+' => Ok(Frame::Simple(get_text(src)?)),
            b'-' => Ok(Frame::Error(get_text(src)?)),
            b':' => Ok(Frame::Integer(get_decimal(src)?)),
            b'$' => {
                let Some(len) = get_length(src)? else {
                    return Ok(Frame::Null);
                };
                if src.remaining() < len + 2 {
                    return Err(ProtocolError::Incomplete);
                }
                let start = src.position() as usize;
                let data = Bytes::copy_from_slice(&src.get_ref()[start..start + len]);
                src.set_position((start + len + 2) as u64);
                Ok(Frame::Bulk(data))
            }
            b'*' => {
                let Some(count) = get_length(src)? else {
                    return Ok(Frame::Null);
                };
                let mut frames = Vec::with_capacity(count.min(1024));
                for _ in 0..count {
                    frames.push(Frame::parse(src)?);
                }
                Ok(Frame::Array(frames))
            }
            byte => Err(ProtocolError::InvalidFrameType(byte)),
        }
    }

    /// Encoda o frame no buffer de saída em formato RESP2.
    pub fn encode(&self, dst: &mut BytesMut) {
        match self {
            Frame::Simple(s) => {
                dst.put_u8(b'+');
                dst.put(s.as_bytes());
                dst.put(&b"\r\n"[..]);
            }
            Frame::Error(s) => {
                dst.put_u8(b'-');
                dst.put(s.as_bytes());
                dst.put(&b"\r\n"[..]);
            }
            Frame::Integer(n) => {
                dst.put_u8(b':');
                dst.put(n.to_string().as_bytes());
                dst.put(&b"\r\n"[..]);
            }
            Frame::Bulk(data) => {
                dst.put_u8(b'$');
                dst.put(data.len().to_string().as_bytes());
                dst.put(&b"\r\n"[..]);
                dst.put(data.as_ref());
                dst.put(&b"\r\n"[..]);
            }
            Frame::Null => {
                dst.put(&b"$-1\r\n"[..]);
            }
            Frame::Array(frames) => {
                dst.put_u8(b'*');
                dst.put(frames.len().to_string().as_bytes());
                dst.put(&b"\r\n"[..]);
                for frame in frames {
                    frame.encode(dst);
                }
            }
        }
    }

    /// Helper: cria um Frame::Bulk a partir de &str.
    pub fn bulk(s: &str) -> Frame {
        Frame::Bulk(Bytes::copy_from_slice(s.as_bytes()))
    }

    /// Helper: cria um Array de Bulk strings a partir de &[&str].
    pub fn array_from_strs(strs: &[&str]) -> Frame {
        Frame::Array(strs.iter().map(|s| Frame::bulk(s)).collect())
    }

    /// Array de bulk strings, formato em que todo comando trafega.
    pub fn from_args(args: Vec<String>) -> Frame {
        Frame::Array(args.into_iter().map(|a| Frame::Bulk(Bytes::from(a))).collect())
    }

    /// Conteúdo textual de Bulk/Simple. Outros tipos (inclusive Null) → None.
    pub fn into_text(self) -> Option<String> {
        match self {
            Frame::Simple(s) => Some(s),
            Frame::Bulk(data) => String::from_utf8(data.to_vec()).ok(),
            _ => None,
        }
    }

    /// Resumo curto para mensagens de erro e logs.
    pub fn describe(&self) -> String {
        match self {
            Frame::Simple(s) => format!("+{s}"),
            Frame::Error(s) => format!("-{s}"),
            Frame::Integer(n) => format!(":{n}"),
            Frame::Bulk(data) => format!("${} bytes", data.len()),
            Frame::Null => "null".into(),
            Frame::Array(frames) => format!("array[{}]", frames.len()),
        }
    }
}

fn get_u8(src: &mut Cursor<&[u8]>) -> Result<u8, ProtocolError> {
    if !src.has_remaining() {
        return Err(ProtocolError::Incomplete);
    }
    Ok(src.get_u8())
}

fn get_line<'a>(src: &mut Cursor<&'a [u8]>) -> Result<&'a [u8], ProtocolError> {
    let start = src.position() as usize;
    let buf: &'a [u8] = *src.get_ref();

    match buf[start..].windows(2).position(|w| w == b"\r\n") {
        Some(offset) => {
            src.set_position((start + offset + 2) as u64);
            Ok(&buf[start..start + offset])
        }
        None => Err(ProtocolError::Incomplete),
    }
}

fn get_text(src: &mut Cursor<&[u8]>) -> Result<String, ProtocolError> {
    let line = get_line(src)?;
    String::from_utf8(line.to_vec()).map_err(|e| ProtocolError::InvalidEncoding(e.to_string()))
}

fn get_decimal(src: &mut Cursor<&[u8]>) -> Result<i64, ProtocolError> {
    let line = get_line(src)?;
    let s = std::str::from_utf8(line).map_err(|e| ProtocolError::InvalidInteger(e.to_string()))?;
    s.parse::<i64>()
        .map_err(|e| ProtocolError::InvalidInteger(e.to_string()))
}

/// Comprimento de bulk/array. `-1` é o marcador de nulo.
fn get_length(src: &mut Cursor<&[u8]>) -> Result<Option<usize>, ProtocolError> {
    match get_decimal(src)? {
        -1 => Ok(None),
        len if len < 0 => Err(ProtocolError::InvalidBulkLength(len)),
        len => {
            let len = len as usize;
            if len > MAX_FRAME_SIZE {
                return Err(ProtocolError::FrameTooLarge(len));
            }
            Ok(Some(len))
        }
    }
}

fn skip(src: &mut Cursor<&[u8]>, n: usize) -> Result<(), ProtocolError> {
    if src.remaining() < n {
        return Err(ProtocolError::Incomplete);
    }
    src.set_position(src.position() + n as u64);
    Ok(())
}
