// vcloud-core: Inventory and network logic between vcloud-api and the Ansible binaries.

pub mod cache;
pub mod config;
pub mod error;
pub mod inventory;
pub mod model;
pub mod network;
pub mod options;
pub mod snapshot;
pub mod walker;

// ── Primary re-exports ──────────────────────────────────────────────
pub use cache::{CacheRecord, MAX_AGE};
pub use config::{ConnectionConfig, Credentials, TlsVerification};
pub use error::CoreError;
pub use inventory::{ApiSource, Inventory, Query, SnapshotSource};
pub use model::{Group, Host, parse_tags};
pub use network::{NetworkManager, NetworkOutcome, NetworkRequest, NetworkState, ServiceState};
pub use options::{HostNaming, InventoryOptions, MissingAddress};
pub use snapshot::{GroupEntry, Snapshot};
pub use walker::{Walk, Walker};
