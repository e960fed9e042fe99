// vcloud-api: Async Rust client for the vCloud Director REST/XML API

pub mod auth;
pub mod client;
pub mod error;
pub mod models;
pub mod network;
pub mod query;
pub mod task;
pub mod transport;
pub mod xml;

pub use auth::{AUTH_HEADER, Session};
pub use client::VcdClient;
pub use error::Error;
pub use models::{EntityRef, MetadataEntry, Task, TaskStatus, VAppRecord, VmRecord};
pub use network::{FenceMode, IpScope, NetworkConfig, NetworkConfigSection, Vdc};
pub use transport::{TlsMode, TransportConfig};
