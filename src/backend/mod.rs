/// Backend submodules for connection and message handling
///
/// - `connection`: TLS and TCP connection establishment, line framing
/// - `handlers`: IRC message routing and action execution
/// - `main_loop`: the polling event loop run on the backend thread
mod connection;
mod handlers;
mod main_loop;

pub use connection::{create_tls_connector, ConnectionError};
pub use handlers::route_message;
pub use main_loop::run_backend;
