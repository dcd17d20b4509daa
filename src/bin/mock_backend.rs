//! Mock backend binary
//!
//! Serves the health probe, the audio endpoint probe and the WebSocket audio
//! protocol from memory, so suites can be tried without the real service.

use clap::Parser;
use meetcheck::mock::{MockBackend, MockOptions};
use meetcheck::store::MemoryStore;
use tokio::net::TcpListener;

#[derive(Parser)]
#[command(name = "mock-backend", about = "In-memory stand-in for the meeting-recorder backend")]
#[command(version, long_about = None)]
struct Args {
    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on
    #[arg(long, short, default_value_t = 5000)]
    port: u16,

    /// Create meetings but never send meeting_created
    #[arg(long)]
    silent: bool,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("meetcheck=info,warn")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();
    let addr = format!("{}:{}", args.host, args.port);

    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            eprintln!("Error: failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    tracing::info!("Mock backend listening on http://{} (ws://{}/audio)", addr, addr);
    if args.silent {
        tracing::info!("Silent mode: meeting_created replies are suppressed");
    }

    let backend = MockBackend::new(MemoryStore::new(), MockOptions { silent: args.silent });
    if let Err(e) = backend.serve(listener).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
