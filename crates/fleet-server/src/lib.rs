//! gRPC transport for the fleet-ops service: wire messages, tenancy and
//! authentication layers, and one façade per service.

pub mod app;
pub mod config;
mod error;
pub mod grpc;
pub mod layers;
pub mod services;
mod shutdown;
pub mod wire;

pub use app::{routes, serve};
pub use config::ServerConfig;
pub use error::ServerError;
