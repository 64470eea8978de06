pub mod staleness;

use convergeresource::connection::ClusterConnectionStatus;

pub const REASON_CONNECTION_READY: &str = "ConnectionReady";
pub const REASON_CONNECTION_NOT_FOUND: &str = "ConnectionNotFound";
pub const REASON_CONNECTION_NOT_READY: &str = "ConnectionNotReady";
pub const REASON_LAST_PROBE_EXCEEDED: &str = "ConnectionLastProbeTimeExceeded";

/// Snapshot of a remote connection as held by the connection cache: the
/// health prober writes conditions into the status, this layer only reads
/// them.
#[derive(Clone, Debug)]
pub struct CachedConnection {
    pub name: String,
    pub status: ClusterConnectionStatus,
}
