//! Casamento de padrões glob para HSCAN.
//!
//! - `*` casa qualquer sequência (inclusive vazia)
//! - `?` casa exatamente um caractere
//! - `[abc]`, `[a-z]` casam um caractere do conjunto; `[^..]` / `[!..]` negam
//! - `\` escapa o próximo caractere
//!
//! Classe sem `]` de fechamento ou `\` no fim do padrão são erros.

use twinkv_common::{StorageError, StorageResult};

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Star,
    Any,
    Literal(char),
    Class {
        ranges: Vec<(char, char)>,
        negated: bool,
    },
}

impl Token {
    fn matches(&self, c: char) -> bool {
        match self {
            Token::Star => true,
            Token::Any => true,
            Token::Literal(l) => *l == c,
            Token::Class { ranges, negated } => {
                let hit = ranges.iter().any(|(lo, hi)| *lo <= c && c <= *hi);
                hit != *negated
            }
        }
    }
}

/// Padrão glob compilado.
#[derive(Debug, Clone)]
pub struct GlobPattern {
    tokens: Vec<Token>,
}

impl GlobPattern {
    pub fn compile(pattern: &str) -> StorageResult<Self> {
        let chars: Vec<char> = pattern.chars().collect();
        let mut tokens = Vec::new();
        let mut i = 0;

        while i < chars.len() {
            match chars[i] {
                '*' => {
                    // Estrelas consecutivas equivalem a uma só
                    if tokens.last() != Some(&Token::Star) {
                        tokens.push(Token::Star);
                    }
                    i += 1;
                }
                '?' => {
                    tokens.push(Token::Any);
                    i += 1;
                }
                '\\' => {
                    let escaped = chars
                        .get(i + 1)
                        .ok_or_else(|| malformed(pattern, "escape sem caractere"))?;
                    tokens.push(Token::Literal(*escaped));
                    i += 2;
                }
                '[' => {
                    let (token, consumed) = compile_class(&chars[i..], pattern)?;
                    tokens.push(token);
                    i += consumed;
                }
                c => {
                    tokens.push(Token::Literal(c));
                    i += 1;
                }
            }
        }

        Ok(Self { tokens })
    }

    /// Backtracking iterativo: volta para a última `*` quando algo falha.
    pub fn matches(&self, text: &str) -> bool {
        let text: Vec<char> = text.chars().collect();
        let tokens = &self.tokens;

        let mut ti = 0;
        let mut xi = 0;
        let mut star: Option<(usize, usize)> = None;

        while xi < text.len() {
            match tokens.get(ti) {
                Some(Token::Star) => {
                    star = Some((ti, xi));
                    ti += 1;
                }
                Some(token) if token.matches(text[xi]) => {
                    ti += 1;
                    xi += 1;
                }
                _ => match star {
                    Some((star_ti, star_xi)) => {
                        // A estrela absorve mais um caractere
                        ti = star_ti + 1;
                        xi = star_xi + 1;
                        star = Some((star_ti, star_xi + 1));
                    }
                    None => return false,
                },
            }
        }

        tokens[ti..].iter().all(|t| *t == Token::Star)
    }
}

/// Compila `[...]` a partir do `[`. Retorna o token e quantos chars consumiu.
fn compile_class(chars: &[char], pattern: &str) -> StorageResult<(Token, usize)> {
    let mut i = 1;
    let mut negated = false;
    if matches!(chars.get(i), Some(&'^') | Some(&'!')) {
        negated = true;
        i += 1;
    }

    let mut ranges = Vec::new();
    loop {
        let c = match chars.get(i) {
            None => return Err(malformed(pattern, "classe sem ']'")),
            Some(&']') if !ranges.is_empty() => break,
            Some(&'\\') => {
                i += 1;
                *chars
                    .get(i)
                    .ok_or_else(|| malformed(pattern, "escape sem caractere"))?
            }
            Some(&c) => c,
        };

        if chars.get(i + 1) == Some(&'-') && !matches!(chars.get(i + 2), None | Some(&']')) {
            let end = chars[i + 2];
            let (lo, hi) = if c <= end { (c, end) } else { (end, c) };
            ranges.push((lo, hi));
            i += 3;
        } else {
            ranges.push((c, c));
            i += 1;
        }
    }

    // +1 pelo ']'
    Ok((Token::Class { ranges, negated }, i + 1))
}

fn malformed(pattern: &str, reason: &str) -> StorageError {
    StorageError::InvalidPattern(format!("{pattern}: {reason}"))
}
