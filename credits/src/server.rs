//! Static file server for the landing page.
//!
//! Serves a directory of static assets with a single-page fallback: any
//! path that does not match a file gets `index.html`.

use std::net::SocketAddr;

use axum::Router;
use tokio_util::sync::CancellationToken;
use tower_http::services::{ServeDir, ServeFile};
use tracing::info;

use crate::cli::ServeArgs;
use crate::error::AppError;

const DEFAULT_PORT: u16 = 8080;

fn resolve_port(args: &ServeArgs) -> u16 {
    args.port
        .or_else(|| {
            std::env::var("WEB_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
        })
        .unwrap_or(DEFAULT_PORT)
}

pub async fn run_server(args: &ServeArgs, cancel: CancellationToken) -> Result<(), AppError> {
    let port = resolve_port(args);
    let index = args.dir.join("index.html");
    let service = ServeDir::new(&args.dir).fallback(ServeFile::new(index));
    let app = Router::new().fallback_service(service);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, dir = %args.dir.display(), "serving static files");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn args(port: Option<u16>) -> ServeArgs {
        ServeArgs {
            port,
            dir: PathBuf::from("public"),
        }
    }

    #[test]
    fn test_explicit_port_wins() {
        std::env::remove_var("WEB_PORT");
        assert_eq!(resolve_port(&args(Some(3000))), 3000);
    }

    #[test]
    fn test_default_port() {
        std::env::remove_var("WEB_PORT");
        assert_eq!(resolve_port(&args(None)), DEFAULT_PORT);
    }
}
