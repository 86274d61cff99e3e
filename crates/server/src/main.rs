use clap::Parser;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};

use twinkv_common::{DEFAULT_HOST, DEFAULT_PORT, MAX_CONNECTIONS};
use twinkv_storage::Store;

#[derive(Parser, Debug)]
#[command(name = "twinkv-server", about = "twinkv: servidor RESP sobre o store em memória")]
struct Args {
    #[arg(long, default_value = DEFAULT_HOST)]
    host: String,
    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,
    #[arg(long, default_value_t = MAX_CONNECTIONS)]
    max_connections: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "twinkv_server=info".into()),
        )
        .init();

    let args = Args::parse();
    let addr = format!("{}:{}", args.host, args.port);

    let listener = TcpListener::bind(&addr).await?;
    info!("twinkv escutando em {addr}");

    twinkv_server::serve(listener, Store::new(), args.max_connections, async {
        if let Err(e) = signal::ctrl_c().await {
            error!("falha ao instalar handler de ctrl-c: {e}");
        }
        info!("shutdown signal recebido");
    })
    .await;

    Ok(())
}
