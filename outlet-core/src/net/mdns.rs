//! Records published over multicast DNS: the `<host>.local` address and the
//! dashboard as an `_http._tcp` service instance.

use core::net::{Ipv4Addr, Ipv6Addr};

use edge_mdns::domain::base::Ttl;
use edge_mdns::host::{Host, Service};

pub const RECORD_TTL_SECS: u32 = 120;

// The dashboard lives at the root of the HTTP server.
const TXT: &[(&str, &str)] = &[("path", "/")];

/// A record for `hostname.local` pointing at `address`. IPv4 only.
#[must_use]
pub fn host(hostname: &str, address: Ipv4Addr) -> Host<'_> {
    Host {
        hostname,
        ipv4: address,
        ipv6: Ipv6Addr::UNSPECIFIED,
        ttl: Ttl::from_secs(RECORD_TTL_SECS),
    }
}

/// The `hostname._http._tcp.local` instance served on `port`.
#[must_use]
pub fn http_service(hostname: &str, port: u16) -> Service<'_> {
    Service {
        name: hostname,
        priority: 0,
        weight: 0,
        service: "_http",
        protocol: "_tcp",
        port,
        service_subtypes: &[],
        txt_kvs: TXT,
    }
}
