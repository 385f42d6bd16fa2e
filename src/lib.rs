//! SkyDNS Records: Declarative DNS Record Management over etcd
//!
//! Maps a logical DNS record (a name, a TTL and a set of target hosts) onto
//! the SkyDNS key layout in an etcd v2 key space, and reconciles the store
//! toward that desired state.

pub mod config;
pub mod error;
pub mod logging;
pub mod record;
pub mod resource;
pub mod store;
pub mod tooling;
pub mod types;
