// src/server/mod.rs

//! Development server: static files, response compression and live reload.

pub mod http;
pub mod open;
pub mod reload;

pub use http::{CLIENT_SCRIPT_PATH, DevServer, SOCKET_PATH, ServerHandle, client_script_tag};
pub use open::open_browser;
pub use reload::ReloadHub;
