//! ollama-relay: HTTP façade over a supervised local Ollama server.
//!
//! At startup the [`supervisor`] launches `ollama serve` and waits until it
//! answers. The [`server`] then relays `/ask` and `/pull` calls to it, one
//! outbound request per inbound request, through the [`relay`] client.

pub mod config;
pub mod metrics;
pub mod relay;
pub mod server;
pub mod supervisor;
