use sitegen_vfs::server::VfsServer;
use sitegen_vfs::transport::NdjsonTransport;

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let transport = NdjsonTransport::stdout();
    let mut server = VfsServer::new(transport);

    tracing::info!("sitegen-vfs ready");

    let stdin = std::io::stdin();
    if let Err(e) = server.run(stdin.lock()) {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
