use anyhow::Result;
use clap::Parser;
use skipdex_server::{build_app, AppState};
use sha1::{Digest, Sha1};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "skipdex-server")]
#[command(about = "Build a skip-pointer inverted index and serve DAAT AND queries", long_about = None)]
struct Args {
    /// Corpus file, one `<doc_id>\t<body>` document per line
    #[arg(long)]
    corpus: String,
    /// Where each request's query output is dumped as JSON
    #[arg(long, default_value = "output.json")]
    output: String,
    /// Identity token; only its hash ever leaves the process
    #[arg(long)]
    username: String,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 9999)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();

    // Build once, freeze, then serve. No index mutation after this point.
    let index = skipdex::corpus::build_index(&args.corpus)?;

    let mut hasher = Sha1::new();
    hasher.update(args.username.as_bytes());
    let username_hash = format!("{:x}", hasher.finalize());

    let state = AppState {
        index: Arc::new(index),
        output_path: PathBuf::from(&args.output),
        username_hash,
    };
    let app = build_app(state);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
