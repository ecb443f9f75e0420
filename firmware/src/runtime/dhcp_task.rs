use core::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

use defmt::{Debug2Format, Display2Format, error, info, warn};
use edge_dhcp::io::{self as dhcp_io, DEFAULT_SERVER_PORT};
use edge_dhcp::server::ServerOptions;
use edge_nal::UdpBind;
use edge_nal_embassy::{Udp, UdpBuffers};
use embassy_net::Stack;
use embassy_time::{Duration, Instant, Timer};
use outlet_core::net::dhcp::{self, LEASES};

use crate::config;

// Large enough for a full 576-byte BOOTP datagram plus options.
const DATAGRAM: usize = 1024;
const RESTART_DELAY_MS: u64 = 500;

/// Leases addresses to clients joining the access point.
///
/// The lease table outlives server restarts, so a socket error never hands a
/// leased address to a second client.
#[embassy_executor::task]
pub async fn run(stack: Stack<'static>) {
    let buffers = UdpBuffers::<1, DATAGRAM, DATAGRAM, 4>::new();
    let udp = Udp::new(stack, &buffers);
    let bind_to = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, DEFAULT_SERVER_PORT));
    let mut socket = match udp.bind(bind_to).await {
        Ok(socket) => socket,
        Err(err) => {
            error!(
                "dhcp: bind to port {} failed: {}",
                DEFAULT_SERVER_PORT,
                Debug2Format(&err)
            );
            return;
        }
    };

    let mut gateway = [Ipv4Addr::UNSPECIFIED];
    let options = ServerOptions::new(config::AP_ADDRESS, Some(&mut gateway));
    let mut server = dhcp::lease_server(
        || Instant::now().as_secs(),
        config::AP_ADDRESS,
        config::FIRST_LEASE,
    );
    let mut packet = [0u8; DATAGRAM];
    info!(
        "dhcp: serving {} leases from {}",
        LEASES,
        Display2Format(&config::FIRST_LEASE)
    );

    loop {
        if let Err(err) = dhcp_io::server::run(&mut server, &options, &mut socket, &mut packet).await
        {
            warn!("dhcp: server stopped: {}", Debug2Format(&err));
        }
        Timer::after(Duration::from_millis(RESTART_DELAY_MS)).await;
    }
}
