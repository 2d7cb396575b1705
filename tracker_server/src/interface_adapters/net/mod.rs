// Network adapter for the shared publisher/subscriber WebSocket endpoint.

pub mod client;

pub use client::ws_handler;
