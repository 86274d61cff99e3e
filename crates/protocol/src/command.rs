use twinkv_common::CommandError;

use crate::{Frame, Parse};

/// Enum com todos os comandos suportados.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Ping(Option<String>),
    Get(String),
    /// `SET key value [EX secs] [NX]`
    Set {
        key: String,
        value: String,
        expire_secs: Option<i64>,
        nx: bool,
    },
    Del(Vec<String>),
    Exists(Vec<String>),
    MGet(Vec<String>),
    Expire {
        key: String,
        seconds: i64,
    },
    Incr(String),
    IncrBy {
        key: String,
        delta: i64,
    },
    IncrByFloat {
        key: String,
        delta: f64,
    },
    LPush {
        key: String,
        values: Vec<String>,
    },
    RPush {
        key: String,
        values: Vec<String>,
    },
    LRange {
        key: String,
        start: i64,
        stop: i64,
    },
    LPop(String),
    SAdd {
        key: String,
        members: Vec<String>,
    },
    SMembers(String),
    HSet {
        key: String,
        fields: Vec<(String, String)>,
    },
    HGet {
        key: String,
        field: String,
    },
    HMGet {
        key: String,
        fields: Vec<String>,
    },
    HGetAll(String),
    HKeys(String),
    HVals(String),
    HLen(String),
    HDel {
        key: String,
        fields: Vec<String>,
    },
    HExists {
        key: String,
        field: String,
    },
    /// `HSCAN key cursor [MATCH pattern] [COUNT n]`
    HScan {
        key: String,
        cursor: u64,
        pattern: Option<String>,
        count: Option<usize>,
    },
    HIncrBy {
        key: String,
        field: String,
        delta: i64,
    },
    HIncrByFloat {
        key: String,
        field: String,
        delta: f64,
    },
    ZAdd {
        key: String,
        score: f64,
        member: String,
    },
    /// Limites chegam como texto: podem ser "-inf"/"+inf".
    ZCount {
        key: String,
        min: String,
        max: String,
    },
    Eval {
        script: String,
        num_keys: usize,
        args: Vec<String>,
    },
    Unknown(String),
}

impl Command {
    /// Faz o parse de um Frame em um Command.
    pub fn from_frame(frame: Frame) -> Result<Command, CommandError> {
        let mut parse = Parse::new(frame)?;
        let cmd_name = parse.next_string()?.to_uppercase();

        let cmd = match cmd_name.as_str() {
            "PING" => {
                let msg = if parse.has_remaining() {
                    Some(parse.next_string()?)
                } else {
                    None
                };
                parse.finish()?;
                Command::Ping(msg)
            }
            "GET" => Command::Get(single_key(&mut parse)?),
            "SET" => parse_set(&mut parse)?,
            "DEL" => Command::Del(non_empty(&mut parse, "DEL")?),
            "EXISTS" => Command::Exists(non_empty(&mut parse, "EXISTS")?),
            "MGET" => Command::MGet(non_empty(&mut parse, "MGET")?),
            "EXPIRE" => {
                let key = parse.next_string()?;
                let seconds = parse.next_int()?;
                parse.finish()?;
                Command::Expire { key, seconds }
            }
            "INCR" => Command::Incr(single_key(&mut parse)?),
            "INCRBY" => {
                let key = parse.next_string()?;
                let delta = parse.next_int()?;
                parse.finish()?;
                Command::IncrBy { key, delta }
            }
            "INCRBYFLOAT" => {
                let key = parse.next_string()?;
                let delta = parse.next_float()?;
                parse.finish()?;
                Command::IncrByFloat { key, delta }
            }
            "LPUSH" => {
                let key = parse.next_string()?;
                let values = non_empty(&mut parse, "LPUSH")?;
                Command::LPush { key, values }
            }
            "RPUSH" => {
                let key = parse.next_string()?;
                let values = non_empty(&mut parse, "RPUSH")?;
                Command::RPush { key, values }
            }
            "LRANGE" => {
                let key = parse.next_string()?;
                let start = parse.next_int()?;
                let stop = parse.next_int()?;
                parse.finish()?;
                Command::LRange { key, start, stop }
            }
            "LPOP" => Command::LPop(single_key(&mut parse)?),
            "SADD" => {
                let key = parse.next_string()?;
                let members = non_empty(&mut parse, "SADD")?;
                Command::SAdd { key, members }
            }
            "SMEMBERS" => Command::SMembers(single_key(&mut parse)?),
            "HSET" => {
                let key = parse.next_string()?;
                if !parse.has_remaining() || parse.remaining() % 2 != 0 {
                    return Err(CommandError::WrongArity("HSET".into()));
                }
                let mut fields = Vec::with_capacity(parse.remaining() / 2);
                while parse.has_remaining() {
                    let field = parse.next_string()?;
                    let value = parse.next_string()?;
                    fields.push((field, value));
                }
                Command::HSet { key, fields }
            }
            "HGET" => {
                let (key, field) = key_and_field(&mut parse)?;
                Command::HGet { key, field }
            }
            "HMGET" => {
                let key = parse.next_string()?;
                let fields = non_empty(&mut parse, "HMGET")?;
                Command::HMGet { key, fields }
            }
            "HGETALL" => Command::HGetAll(single_key(&mut parse)?),
            "HKEYS" => Command::HKeys(single_key(&mut parse)?),
            "HVALS" => Command::HVals(single_key(&mut parse)?),
            "HLEN" => Command::HLen(single_key(&mut parse)?),
            "HDEL" => {
                let key = parse.next_string()?;
                let fields = non_empty(&mut parse, "HDEL")?;
                Command::HDel { key, fields }
            }
            "HEXISTS" => {
                let (key, field) = key_and_field(&mut parse)?;
                Command::HExists { key, field }
            }
            "HSCAN" => parse_hscan(&mut parse)?,
            "HINCRBY" => {
                let (key, field) = (parse.next_string()?, parse.next_string()?);
                let delta = parse.next_int()?;
                parse.finish()?;
                Command::HIncrBy { key, field, delta }
            }
            "HINCRBYFLOAT" => {
                let (key, field) = (parse.next_string()?, parse.next_string()?);
                let delta = parse.next_float()?;
                parse.finish()?;
                Command::HIncrByFloat { key, field, delta }
            }
            "ZADD" => {
                let key = parse.next_string()?;
                let score = parse.next_float()?;
                let member = parse.next_string()?;
                parse.finish()?;
                Command::ZAdd { key, score, member }
            }
            "ZCOUNT" => {
                let key = parse.next_string()?;
                let min = parse.next_string()?;
                let max = parse.next_string()?;
                parse.finish()?;
                Command::ZCount { key, min, max }
            }
            "EVAL" => {
                let script = parse.next_string()?;
                let num_keys = parse.next_int()?;
                let num_keys = usize::try_from(num_keys).map_err(|_| {
                    CommandError::InvalidArgument("número de chaves negativo".into())
                })?;
                let args = parse.rest()?;
                if args.len() < num_keys {
                    return Err(CommandError::WrongArity("EVAL".into()));
                }
                Command::Eval {
                    script,
                    num_keys,
                    args,
                }
            }
            _ => Command::Unknown(cmd_name),
        };

        Ok(cmd)
    }

    /// Encoda o comando como Frame para envio via RESP.
    pub fn to_frame(&self) -> Frame {
        Frame::from_args(self.args())
    }

    fn args(&self) -> Vec<String> {
        fn cmd(name: &str, rest: &[&str]) -> Vec<String> {
            std::iter::once(name)
                .chain(rest.iter().copied())
                .map(str::to_string)
                .collect()
        }
        fn with_list(name: &str, head: &[&str], list: &[String]) -> Vec<String> {
            let mut args = cmd(name, head);
            args.extend(list.iter().cloned());
            args
        }

        match self {
            Command::Ping(None) => cmd("PING", &[]),
            Command::Ping(Some(msg)) => cmd("PING", &[msg]),
            Command::Get(key) => cmd("GET", &[key]),
            Command::Set {
                key,
                value,
                expire_secs,
                nx,
            } => {
                let mut args = cmd("SET", &[key, value]);
                if let Some(secs) = expire_secs {
                    args.push("EX".into());
                    args.push(secs.to_string());
                }
                if *nx {
                    args.push("NX".into());
                }
                args
            }
            Command::Del(keys) => with_list("DEL", &[], keys),
            Command::Exists(keys) => with_list("EXISTS", &[], keys),
            Command::MGet(keys) => with_list("MGET", &[], keys),
            Command::Expire { key, seconds } => cmd("EXPIRE", &[key, &seconds.to_string()]),
            Command::Incr(key) => cmd("INCR", &[key]),
            Command::IncrBy { key, delta } => cmd("INCRBY", &[key, &delta.to_string()]),
            Command::IncrByFloat { key, delta } => {
                cmd("INCRBYFLOAT", &[key, &delta.to_string()])
            }
            Command::LPush { key, values } => with_list("LPUSH", &[key], values),
            Command::RPush { key, values } => with_list("RPUSH", &[key], values),
            Command::LRange { key, start, stop } => {
                cmd("LRANGE", &[key, &start.to_string(), &stop.to_string()])
            }
            Command::LPop(key) => cmd("LPOP", &[key]),
            Command::SAdd { key, members } => with_list("SADD", &[key], members),
            Command::SMembers(key) => cmd("SMEMBERS", &[key]),
            Command::HSet { key, fields } => {
                let mut args = cmd("HSET", &[key]);
                for (field, value) in fields {
                    args.push(field.clone());
                    args.push(value.clone());
                }
                args
            }
            Command::HGet { key, field } => cmd("HGET", &[key, field]),
            Command::HMGet { key, fields } => with_list("HMGET", &[key], fields),
            Command::HGetAll(key) => cmd("HGETALL", &[key]),
            Command::HKeys(key) => cmd("HKEYS", &[key]),
            Command::HVals(key) => cmd("HVALS", &[key]),
            Command::HLen(key) => cmd("HLEN", &[key]),
            Command::HDel { key, fields } => with_list("HDEL", &[key], fields),
            Command::HExists { key, field } => cmd("HEXISTS", &[key, field]),
            Command::HScan {
                key,
                cursor,
                pattern,
                count,
            } => {
                let mut args = cmd("HSCAN", &[key, &cursor.to_string()]);
                if let Some(pattern) = pattern {
                    args.push("MATCH".into());
                    args.push(pattern.clone());
                }
                if let Some(count) = count {
                    args.push("COUNT".into());
                    args.push(count.to_string());
                }
                args
            }
            Command::HIncrBy { key, field, delta } => {
                cmd("HINCRBY", &[key, field, &delta.to_string()])
            }
            Command::HIncrByFloat { key, field, delta } => {
                cmd("HINCRBYFLOAT", &[key, field, &delta.to_string()])
            }
            Command::ZAdd { key, score, member } => {
                cmd("ZADD", &[key, &score.to_string(), member])
            }
            Command::ZCount { key, min, max } => cmd("ZCOUNT", &[key, min, max]),
            Command::Eval {
                script,
                num_keys,
                args,
            } => with_list("EVAL", &[script, &num_keys.to_string()], args),
            Command::Unknown(name) => cmd(name, &[]),
        }
    }

    /// Nome do comando, para logs e mensagens de erro.
    pub fn name(&self) -> &str {
        match self {
            Command::Ping(_) => "PING",
            Command::Get(_) => "GET",
            Command::Set { .. } => "SET",
            Command::Del(_) => "DEL",
            Command::Exists(_) => "EXISTS",
            Command::MGet(_) => "MGET",
            Command::Expire { .. } => "EXPIRE",
            Command::Incr(_) => "INCR",
            Command::IncrBy { .. } => "INCRBY",
            Command::IncrByFloat { .. } => "INCRBYFLOAT",
            Command::LPush { .. } => "LPUSH",
            Command::RPush { .. } => "RPUSH",
            Command::LRange { .. } => "LRANGE",
            Command::LPop(_) => "LPOP",
            Command::SAdd { .. } => "SADD",
            Command::SMembers(_) => "SMEMBERS",
            Command::HSet { .. } => "HSET",
            Command::HGet { .. } => "HGET",
            Command::HMGet { .. } => "HMGET",
            Command::HGetAll(_) => "HGETALL",
            Command::HKeys(_) => "HKEYS",
            Command::HVals(_) => "HVALS",
            Command::HLen(_) => "HLEN",
            Command::HDel { .. } => "HDEL",
            Command::HExists { .. } => "HEXISTS",
            Command::HScan { .. } => "HSCAN",
            Command::HIncrBy { .. } => "HINCRBY",
            Command::HIncrByFloat { .. } => "HINCRBYFLOAT",
            Command::ZAdd { .. } => "ZADD",
            Command::ZCount { .. } => "ZCOUNT",
            Command::Eval { .. } => "EVAL",
            Command::Unknown(name) => name,
        }
    }
}

fn single_key(parse: &mut Parse) -> Result<String, CommandError> {
    let key = parse.next_string()?;
    parse.finish()?;
    Ok(key)
}

fn key_and_field(parse: &mut Parse) -> Result<(String, String), CommandError> {
    let key = parse.next_string()?;
    let field = parse.next_string()?;
    parse.finish()?;
    Ok((key, field))
}

/// Restante dos argumentos; exige pelo menos um.
fn non_empty(parse: &mut Parse, name: &str) -> Result<Vec<String>, CommandError> {
    if !parse.has_remaining() {
        return Err(CommandError::WrongArity(name.into()));
    }
    parse.rest()
}

fn parse_set(parse: &mut Parse) -> Result<Command, CommandError> {
    let key = parse.next_string()?;
    let value = parse.next_string()?;

    let mut expire_secs = None;
    let mut nx = false;

    while parse.has_remaining() {
        let opt = parse.next_string()?.to_uppercase();
        match opt.as_str() {
            "EX" => expire_secs = Some(parse.next_int()?),
            "NX" => nx = true,
            other => {
                return Err(CommandError::InvalidSetOption(other.to_string()));
            }
        }
    }

    // Sem EX não há como expirar a trava criada por NX
    if nx && expire_secs.is_none() {
        return Err(CommandError::InvalidSetOption("NX exige EX".into()));
    }

    Ok(Command::Set {
        key,
        value,
        expire_secs,
        nx,
    })
}

fn parse_hscan(parse: &mut Parse) -> Result<Command, CommandError> {
    let key = parse.next_string()?;
    let cursor = parse.next_int()?;
    let cursor = u64::try_from(cursor)
        .map_err(|_| CommandError::InvalidArgument("cursor inválido".into()))?;

    let mut pattern = None;
    let mut count = None;
    while parse.has_remaining() {
        let opt = parse.next_string()?.to_uppercase();
        match opt.as_str() {
            "MATCH" => pattern = Some(parse.next_string()?),
            "COUNT" => {
                let n = parse.next_int()?;
                match usize::try_from(n) {
                    Ok(n) if n > 0 => count = Some(n),
                    _ => {
                        return Err(CommandError::InvalidArgument(
                            "COUNT deve ser positivo".into(),
                        ));
                    }
                }
            }
            other => {
                return Err(CommandError::InvalidArgument(format!(
                    "opção inválida para HSCAN: {other}"
                )));
            }
        }
    }

    Ok(Command::HScan {
        key,
        cursor,
        pattern,
        count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Command, CommandError> {
        Command::from_frame(Frame::array_from_strs(args))
    }

    #[test]
    fn parse_ping() {
        assert_eq!(parse(&["PING"]).unwrap(), Command::Ping(None));
        assert_eq!(
            parse(&["ping", "hello"]).unwrap(),
            Command::Ping(Some("hello".into()))
        );
    }

    #[test]
    fn parse_set_variants() {
        assert_eq!(
            parse(&["SET", "key", "value"]).unwrap(),
            Command::Set {
                key: "key".into(),
                value: "value".into(),
                expire_secs: None,
                nx: false,
            }
        );
        assert_eq!(
            parse(&["set", "k", "v", "ex", "10", "nx"]).unwrap(),
            Command::Set {
                key: "k".into(),
                value: "v".into(),
                expire_secs: Some(10),
                nx: true,
            }
        );
    }

    #[test]
    fn set_rejects_unknown_options() {
        assert!(matches!(
            parse(&["SET", "k", "v", "XX"]),
            Err(CommandError::InvalidSetOption(_))
        ));
        assert!(matches!(
            parse(&["SET", "k", "v", "NX"]),
            Err(CommandError::InvalidSetOption(_))
        ));
        assert!(parse(&["SET", "k", "v", "EX", "abc"]).is_err());
    }

    #[test]
    fn parse_multi_key_commands() {
        assert_eq!(
            parse(&["DEL", "a", "b", "c"]).unwrap(),
            Command::Del(vec!["a".into(), "b".into(), "c".into()])
        );
        assert_eq!(
            parse(&["MGET", "a", "a"]).unwrap(),
            Command::MGet(vec!["a".into(), "a".into()])
        );
        assert!(matches!(parse(&["DEL"]), Err(CommandError::WrongArity(_))));
        assert!(matches!(parse(&["MGET"]), Err(CommandError::WrongArity(_))));
    }

    #[test]
    fn parse_numeric_arguments() {
        assert_eq!(
            parse(&["INCRBYFLOAT", "f", "10.5"]).unwrap(),
            Command::IncrByFloat {
                key: "f".into(),
                delta: 10.5,
            }
        );
        assert_eq!(
            parse(&["EXPIRE", "k", "-1"]).unwrap(),
            Command::Expire {
                key: "k".into(),
                seconds: -1,
            }
        );
        assert!(parse(&["INCRBY", "k", "1.5"]).is_err());
    }

    #[test]
    fn parse_hset_pairs() {
        assert_eq!(
            parse(&["HSET", "h", "a", "1", "b", "x"]).unwrap(),
            Command::HSet {
                key: "h".into(),
                fields: vec![("a".into(), "1".into()), ("b".into(), "x".into())],
            }
        );
        assert!(matches!(
            parse(&["HSET", "h", "a"]),
            Err(CommandError::WrongArity(_))
        ));
    }

    #[test]
    fn parse_hscan_options() {
        assert_eq!(
            parse(&["HSCAN", "h", "0", "MATCH", "aa*", "COUNT", "5"]).unwrap(),
            Command::HScan {
                key: "h".into(),
                cursor: 0,
                pattern: Some("aa*".into()),
                count: Some(5),
            }
        );
        assert!(parse(&["HSCAN", "h", "-1"]).is_err());
        assert!(parse(&["HSCAN", "h", "0", "COUNT", "0"]).is_err());
    }

    #[test]
    fn parse_zcount_keeps_bounds_as_text() {
        assert_eq!(
            parse(&["ZCOUNT", "z", "-inf", "+inf"]).unwrap(),
            Command::ZCount {
                key: "z".into(),
                min: "-inf".into(),
                max: "+inf".into(),
            }
        );
    }

    #[test]
    fn parse_eval() {
        assert_eq!(
            parse(&["EVAL", "return 1", "1", "k", "arg"]).unwrap(),
            Command::Eval {
                script: "return 1".into(),
                num_keys: 1,
                args: vec!["k".into(), "arg".into()],
            }
        );
        assert!(parse(&["EVAL", "return 1", "2", "k"]).is_err());
    }

    #[test]
    fn parse_unknown_command() {
        assert_eq!(
            parse(&["FOOBAR"]).unwrap(),
            Command::Unknown("FOOBAR".into())
        );
    }

    #[test]
    fn to_frame_is_understood_by_from_frame() {
        let commands = vec![
            Command::Set {
                key: "k".into(),
                value: "v".into(),
                expire_secs: Some(5),
                nx: true,
            },
            Command::ZAdd {
                key: "z".into(),
                score: 0.1 + 0.2,
                member: "m".into(),
            },
            Command::HScan {
                key: "h".into(),
                cursor: 10,
                pattern: Some("f[ab]*".into()),
                count: None,
            },
            Command::HIncrByFloat {
                key: "h".into(),
                field: "f".into(),
                delta: -1e-3,
            },
            Command::Eval {
                script: "return 1".into(),
                num_keys: 0,
                args: vec![],
            },
        ];
        for command in commands {
            assert_eq!(Command::from_frame(command.to_frame()).unwrap(), command);
        }
    }

    #[test]
    fn command_names() {
        assert_eq!(parse(&["hgetall", "h"]).unwrap().name(), "HGETALL");
        assert_eq!(Command::Unknown("NOPE".into()).name(), "NOPE");
    }
}
