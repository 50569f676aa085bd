use ringkas::{api, config, logging, processing, upload};
use std::net::Ipv4Addr;
use std::sync::Arc;
use tokio::net::TcpListener;

const DEFAULT_PORT: u16 = 3000;

#[tokio::main]
async fn main() {
    config::init_config();
    logging::init_tracing();

    let config = config::get_config();
    let uploads = Arc::new(
        upload::UploadStore::new(config.upload_dir.clone())
            .expect("Failed to prepare upload directory"),
    );
    let service = Arc::new(processing::SummaryService::new());
    let app = api::create_router(service, uploads);

    let port = config.server_port.unwrap_or(DEFAULT_PORT);
    let listener = TcpListener::bind((Ipv4Addr::UNSPECIFIED, port))
        .await
        .expect("Failed to bind listener");
    tracing::info!("Listening on http://0.0.0.0:{}", port);
    axum::serve(listener, app).await.unwrap();
}
