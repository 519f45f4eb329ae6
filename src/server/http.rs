// src/server/http.rs

//! Static file server with a live-reload socket.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use console::style;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tower_http::compression::CompressionLayer;
use tower_http::services::ServeDir;
use tracing::{debug, info, warn};

use crate::config::ServerConfig;
use crate::errors::{AssetdagError, Result};
use crate::server::reload::ReloadHub;
use crate::types::ReloadKind;

pub const CLIENT_SCRIPT_PATH: &str = "/__assetdag/client.js";
pub const SOCKET_PATH: &str = "/__assetdag/ws";

const CLIENT_SCRIPT: &str = include_str!("client.js");

/// Tag injected into compiled pages when the server is running.
pub fn client_script_tag() -> String {
    format!(r#"<script src="{CLIENT_SCRIPT_PATH}"></script>"#)
}

#[derive(Debug)]
pub struct DevServer {
    base_dir: PathBuf,
    host: String,
    port: u16,
    compress: bool,
    tunnel: bool,
    hub: Arc<ReloadHub>,
}

impl DevServer {
    pub fn new(root: &Path, server: &ServerConfig, hub: Arc<ReloadHub>) -> Self {
        Self {
            base_dir: root.join(&server.base_dir),
            host: server.host.clone(),
            port: server.port,
            compress: server.compress,
            tunnel: server.tunnel,
            hub,
        }
    }

    pub fn hub(&self) -> &Arc<ReloadHub> {
        &self.hub
    }

    pub fn router(&self) -> Router {
        let files = ServeDir::new(&self.base_dir)
            .precompressed_gzip()
            .append_index_html_on_directories(true);

        let router = Router::new()
            .route(CLIENT_SCRIPT_PATH, get(client_script))
            .route(SOCKET_PATH, get(socket_upgrade))
            .fallback_service(files)
            .with_state(Arc::clone(&self.hub));

        if self.compress {
            router.layer(CompressionLayer::new())
        } else {
            router
        }
    }

    /// Bind and serve in a background task.
    pub async fn start(self) -> Result<ServerHandle> {
        let prefix = self.hub.prefix().to_string();
        if self.tunnel {
            warn!(server = %prefix, "tunnel is not supported; serving locally only");
        }

        let listener = tokio::net::TcpListener::bind((self.host.as_str(), self.port))
            .await
            .map_err(|e| {
                AssetdagError::ConfigError(format!(
                    "cannot bind {}:{}: {e}",
                    self.host, self.port
                ))
            })?;
        let addr = listener.local_addr()?;
        let url = format!("http://{}:{}/", self.host, addr.port());

        info!(
            server = %prefix,
            url = %style(&url).yellow(),
            dir = %self.base_dir.display(),
            "serving"
        );

        let router = self.router();
        let task = tokio::spawn(async move { axum::serve(listener, router).await });

        Ok(ServerHandle { addr, url, task })
    }
}

/// A running server; dropping it leaves the server running.
#[derive(Debug)]
pub struct ServerHandle {
    addr: SocketAddr,
    url: String,
    task: JoinHandle<std::io::Result<()>>,
}

impl ServerHandle {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn shutdown(self) {
        self.task.abort();
    }
}

async fn client_script() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/javascript; charset=utf-8")],
        CLIENT_SCRIPT,
    )
}

async fn socket_upgrade(ws: WebSocketUpgrade, State(hub): State<Arc<ReloadHub>>) -> Response {
    let rx = hub.subscribe();
    let prefix = hub.prefix().to_string();
    ws.on_upgrade(move |socket| client_session(socket, rx, prefix))
}

async fn client_session(
    mut socket: WebSocket,
    mut rx: broadcast::Receiver<ReloadKind>,
    prefix: String,
) {
    debug!(server = %prefix, "reload client connected");
    loop {
        tokio::select! {
            signal = rx.recv() => {
                let kind = match signal {
                    Ok(kind) => kind,
                    // Missed signals collapse into one full reload.
                    Err(RecvError::Lagged(_)) => ReloadKind::Full,
                    Err(RecvError::Closed) => break,
                };
                if socket.send(Message::Text(kind.as_message().into())).await.is_err() {
                    break;
                }
            }
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }
    debug!(server = %prefix, "reload client disconnected");
}
