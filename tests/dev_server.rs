// tests/dev_server.rs

mod common;
use crate::common::{init_tracing, with_timeout, write};

use std::error::Error;
use std::io::Write as _;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use flate2::Compression;
use flate2::write::GzEncoder;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use assetdag::config::ServerConfig;
use assetdag::server::{CLIENT_SCRIPT_PATH, DevServer, ReloadHub, ServerHandle};

type TestResult = Result<(), Box<dyn Error>>;

async fn start(root: &Path) -> Result<ServerHandle, Box<dyn Error>> {
    let server = ServerConfig {
        host: "127.0.0.1".into(),
        port: 0,
        open: false,
        ..ServerConfig::default()
    };
    let hub = Arc::new(ReloadHub::new(root, &server)?);
    Ok(DevServer::new(root, &server, hub).start().await?)
}

/// Minimal HTTP/1.1 GET; returns the raw response.
async fn get(addr: SocketAddr, path: &str, extra_headers: &str) -> Result<String, Box<dyn Error>> {
    let mut stream = TcpStream::connect(addr).await?;
    let request = format!(
        "GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n{extra_headers}\r\n"
    );
    stream.write_all(request.as_bytes()).await?;
    let mut response = Vec::new();
    stream.read_to_end(&mut response).await?;
    Ok(String::from_utf8_lossy(&response).into_owned())
}

#[tokio::test]
async fn serves_index_for_the_root_directory() -> TestResult {
    init_tracing();
    let tmp = tempfile::tempdir()?;
    write(tmp.path(), "src/dist/index.html", "<h1>hi</h1>");
    let server = start(tmp.path()).await?;

    let response = with_timeout(get(server.addr(), "/", "")).await?;

    assert!(response.starts_with("HTTP/1.1 200"), "{response}");
    assert!(response.ends_with("<h1>hi</h1>"), "{response}");
    server.shutdown();
    Ok(())
}

#[tokio::test]
async fn missing_files_are_not_found() -> TestResult {
    init_tracing();
    let tmp = tempfile::tempdir()?;
    std::fs::create_dir_all(tmp.path().join("src/dist"))?;
    let server = start(tmp.path()).await?;

    let response = with_timeout(get(server.addr(), "/nope.css", "")).await?;

    assert!(response.starts_with("HTTP/1.1 404"), "{response}");
    server.shutdown();
    Ok(())
}

#[tokio::test]
async fn precompressed_sibling_is_served_to_gzip_clients() -> TestResult {
    init_tracing();
    let tmp = tempfile::tempdir()?;
    let css = "body{color:red}";
    write(tmp.path(), "src/dist/css/main.css", css);
    let mut gz = GzEncoder::new(Vec::new(), Compression::best());
    gz.write_all(css.as_bytes())?;
    write(tmp.path(), "src/dist/css/main.css.gz", gz.finish()?);
    let server = start(tmp.path()).await?;

    let plain = with_timeout(get(server.addr(), "/css/main.css", "")).await?;
    assert!(plain.ends_with(css), "{plain}");
    assert!(!plain.to_ascii_lowercase().contains("content-encoding"));

    let gzipped = with_timeout(get(
        server.addr(),
        "/css/main.css",
        "Accept-Encoding: gzip\r\n",
    ))
    .await?;
    assert!(
        gzipped.to_ascii_lowercase().contains("content-encoding: gzip"),
        "{gzipped}"
    );
    server.shutdown();
    Ok(())
}

#[tokio::test]
async fn client_script_is_served() -> TestResult {
    init_tracing();
    let tmp = tempfile::tempdir()?;
    std::fs::create_dir_all(tmp.path().join("src/dist"))?;
    let server = start(tmp.path()).await?;

    let response = with_timeout(get(server.addr(), CLIENT_SCRIPT_PATH, "")).await?;

    assert!(response.starts_with("HTTP/1.1 200"), "{response}");
    assert!(response.to_ascii_lowercase().contains("text/javascript"));
    assert!(response.contains("/__assetdag/ws"));
    server.shutdown();
    Ok(())
}
