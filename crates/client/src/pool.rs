use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use twinkv_common::{ClientError, ClientResult, ConnectionError};
use twinkv_protocol::{Command, Connection, Frame};

use crate::ClientOptions;

struct IdleConnection {
    conn: Connection,
    since: Instant,
}

/// Pool de conexões RESP.
///
/// Conexões são emprestadas por chamada e devolvidas quando a chamada
/// termina bem. O lock da fila nunca fica preso durante I/O de rede.
pub(crate) struct Pool {
    options: ClientOptions,
    idle: Mutex<VecDeque<IdleConnection>>,
    closed: AtomicBool,
}

impl Pool {
    pub(crate) fn new(options: ClientOptions) -> Self {
        Self {
            options,
            idle: Mutex::new(VecDeque::new()),
            closed: AtomicBool::new(false),
        }
    }

    pub(crate) fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Empresta a conexão ociosa mais recente, ou abre uma nova.
    pub(crate) async fn checkout(&self) -> ClientResult<Connection> {
        loop {
            if self.closed.load(Ordering::Acquire) {
                return Err(ClientError::Closed);
            }

            let candidate = self.idle.lock().await.pop_back();
            let Some(IdleConnection { mut conn, since }) = candidate else {
                return self.dial().await;
            };

            if since.elapsed() >= self.options.idle_timeout {
                debug!("conexão ociosa há {:?}, descartando", since.elapsed());
                continue;
            }

            if self.options.test_on_borrow
                && let Err(e) = ping(&mut conn).await
            {
                debug!("conexão reprovada no PING: {e}");
                continue;
            }

            return Ok(conn);
        }
    }

    /// Devolve uma conexão saudável. Acima de `max_idle`, a mais antiga sai.
    pub(crate) async fn checkin(&self, conn: Connection) {
        if self.closed.load(Ordering::Acquire) || self.options.max_idle == 0 {
            return;
        }

        let mut idle = self.idle.lock().await;
        while idle.len() >= self.options.max_idle {
            idle.pop_front();
        }
        idle.push_back(IdleConnection {
            conn,
            since: Instant::now(),
        });
    }

    pub(crate) async fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.idle.lock().await.clear();
    }

    pub(crate) async fn idle_count(&self) -> usize {
        self.idle.lock().await.len()
    }

    async fn dial(&self) -> ClientResult<Connection> {
        let addr = &self.options.addr;
        let stream = tokio::time::timeout(self.options.connect_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| ConnectionError::Timeout(addr.clone()))??;
        stream.set_nodelay(true)?;
        debug!("nova conexão com {addr}");
        Ok(Connection::new(stream))
    }
}

async fn ping(conn: &mut Connection) -> ClientResult<()> {
    match conn.round_trip(&Command::Ping(None).to_frame()).await? {
        Frame::Simple(s) if s == "PONG" => Ok(()),
        other => Err(ClientError::UnexpectedReply {
            command: "PING".into(),
            reply: other.describe(),
        }),
    }
}
