//! Server-side configuration pushed to clients.

use serde::{Deserialize, Serialize};

/// One datacenter endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DcOption {
    /// Datacenter id
    pub id: i32,
    /// IP address
    pub ip_address: String,
    /// Port
    pub port: u16,
    /// Whether this is an IPv6 address
    pub ipv6: bool,
    /// Whether this endpoint only serves media
    pub media_only: bool,
}

/// Configuration returned by the server's config endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Datacenter the configuration was fetched from
    pub this_dc: i32,
    /// Known datacenter endpoints
    pub dc_options: Vec<DcOption>,
    /// Server date when the configuration was produced
    pub date: i32,
    /// Unix time after which the configuration should be refetched
    pub expires: i32,
}
