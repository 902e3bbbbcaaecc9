// proxy module - same-origin session bridging service

pub mod config;
pub mod cookies;
pub mod handlers;
pub mod server;
pub mod upstream;

pub use config::BridgeConfig;
pub use server::AxumServer;
