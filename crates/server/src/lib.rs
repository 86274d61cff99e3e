#![forbid(unsafe_code)]

pub mod handler;

pub use handler::{execute_command, handle_connection};

use std::future::Future;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::{Semaphore, broadcast};
use tracing::{error, info};

use twinkv_protocol::Connection;
use twinkv_storage::Store;

/// Aceita conexões até `shutdown` completar. Cada conexão ganha sua task e
/// no máximo `max_connections` são atendidas ao mesmo tempo.
pub async fn serve(
    listener: TcpListener,
    store: Store,
    max_connections: usize,
    shutdown: impl Future<Output = ()>,
) {
    let semaphore = Arc::new(Semaphore::new(max_connections));
    let (shutdown_tx, _) = broadcast::channel::<()>(1);
    tokio::pin!(shutdown);

    loop {
        let permit = tokio::select! {
            permit = semaphore.clone().acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => break,
            },
            _ = &mut shutdown => break,
        };

        let (socket, addr) = tokio::select! {
            result = listener.accept() => {
                match result {
                    Ok(v) => v,
                    Err(e) => {
                        error!("erro ao aceitar conexão: {e}");
                        continue;
                    }
                }
            }
            _ = &mut shutdown => break,
        };

        if let Err(e) = socket.set_nodelay(true) {
            error!("set_nodelay falhou para {addr}: {e}");
        }

        info!("nova conexão: {addr}");
        let store = store.clone();
        let mut shutdown_rx = shutdown_tx.subscribe();

        tokio::spawn(async move {
            let conn = Connection::new(socket);
            if let Err(e) = handle_connection(conn, store, &mut shutdown_rx).await {
                error!("erro na conexão {addr}: {e}");
            }
            info!("conexão encerrada: {addr}");
            drop(permit);
        });
    }

    info!("shutdown: encerrando conexões");
    drop(shutdown_tx);
}
