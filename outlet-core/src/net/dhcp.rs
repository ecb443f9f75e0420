//! Lease table for clients joining the access point.
//!
//! The address range holds exactly as many addresses as the lease table has
//! slots. Once every address is leased, a new client gets no offer until a
//! lease is released or expires; an active lease is never handed to another
//! client.

use core::net::Ipv4Addr;

use edge_dhcp::server::Server;

/// Number of clients that can hold a lease at the same time.
pub const LEASES: usize = 8;

pub type LeaseServer<F> = Server<F, LEASES>;

/// Lease server answering as `server`, leasing [`LEASES`] consecutive
/// addresses starting at `first`.
///
/// `now` reports seconds on a monotonic clock; lease expiry is measured
/// against it.
#[must_use]
pub fn lease_server<F>(now: F, server: Ipv4Addr, first: Ipv4Addr) -> LeaseServer<F>
where
    F: FnMut() -> u64,
{
    let mut leases = Server::new(now, server);
    leases.range_start = first;
    leases.range_end = range_end(first);
    leases
}

/// One past the last leasable address.
#[allow(clippy::cast_possible_truncation)]
fn range_end(first: Ipv4Addr) -> Ipv4Addr {
    Ipv4Addr::from(u32::from(first).saturating_add(LEASES as u32))
}

#[cfg(test)]
mod tests {
    use super::*;

    const GATEWAY: Ipv4Addr = Ipv4Addr::new(192, 168, 4, 1);
    const FIRST: Ipv4Addr = Ipv4Addr::new(192, 168, 4, 2);

    #[test]
    fn range_fits_the_lease_table() {
        let server = lease_server(|| 0, GATEWAY, FIRST);
        assert_eq!(server.range_start, FIRST);
        assert_eq!(server.range_end, Ipv4Addr::new(192, 168, 4, 10));
        let addresses = u32::from(server.range_end) - u32::from(server.range_start);
        assert_eq!(usize::try_from(addresses).unwrap(), LEASES);
    }

    #[test]
    fn gateway_is_never_leased() {
        let server = lease_server(|| 0, GATEWAY, FIRST);
        let gateway = u32::from(GATEWAY);
        assert!(gateway < u32::from(server.range_start) || gateway >= u32::from(server.range_end));
    }
}
