use core::net::Ipv4Addr;

use defmt::{Debug2Format, error, info, warn};
use edge_mdns::HostAnswersMdnsHandler;
use edge_mdns::buf::VecBufAccess;
use edge_mdns::host::ServiceAnswers;
use edge_mdns::io::{self as mdns_io, IPV4_DEFAULT_SOCKET};
use edge_nal::UdpSplit;
use edge_nal_embassy::{Udp, UdpBuffers};
use embassy_futures::select::{Either, select};
use embassy_net::Stack;
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Instant, Timer};
use outlet_core::net::mdns;

use crate::config;

const DATAGRAM: usize = 1500;
const RESTART_DELAY_SECS: u64 = 5;

type Announce = Signal<NoopRawMutex, ()>;

/// Publishes `iotbulb.local` and the HTTP service on the access point.
///
/// Queries sent from a port other than 5353 get a unicast reply to the sender
/// carrying the query ID; everything else is answered on the multicast group.
#[embassy_executor::task]
pub async fn run(stack: Stack<'static>) {
    let buffers = UdpBuffers::<1, DATAGRAM, DATAGRAM, 4>::new();
    let udp = Udp::new(stack, &buffers);
    let recv_buf = VecBufAccess::<NoopRawMutex, DATAGRAM>::new();
    let send_buf = VecBufAccess::<NoopRawMutex, DATAGRAM>::new();
    let announce = Announce::new();

    let host = mdns::host(config::HOSTNAME, config::AP_ADDRESS);
    let service = mdns::http_service(config::HOSTNAME, config::HTTP_PORT);

    stack.wait_config_up().await;
    info!("mdns: advertising {}.local", config::HOSTNAME);

    loop {
        let mut socket = match mdns_io::bind(
            &udp,
            IPV4_DEFAULT_SOCKET,
            Some(Ipv4Addr::UNSPECIFIED),
            None,
        )
        .await
        {
            Ok(socket) => socket,
            Err(err) => {
                error!("mdns: bind failed: {}", Debug2Format(&err));
                Timer::after(Duration::from_secs(RESTART_DELAY_SECS)).await;
                continue;
            }
        };
        let (recv, send) = socket.split();

        let responder = mdns_io::Mdns::<NoopRawMutex, _, _, _, _>::new(
            Some(Ipv4Addr::UNSPECIFIED),
            None,
            recv,
            send,
            &recv_buf,
            &send_buf,
            jitter,
            &announce,
        );
        let handler = HostAnswersMdnsHandler::new(ServiceAnswers::new(&host, &service));

        // The responder announces on start and whenever `announce` fires.
        if let Either::First(Err(err)) = select(responder.run(handler), reannounce(&announce)).await
        {
            warn!("mdns: responder stopped: {}", Debug2Format(&err));
        }
        Timer::after(Duration::from_secs(RESTART_DELAY_SECS)).await;
    }
}

async fn reannounce(announce: &Announce) {
    loop {
        Timer::after(Duration::from_secs(config::MDNS_ANNOUNCE_PERIOD_SECS)).await;
        announce.signal(());
    }
}

// Spreads response delays; timer ticks are random enough for that.
fn jitter(buf: &mut [u8]) {
    let ticks = Instant::now().as_ticks().to_le_bytes();
    for (byte, seed) in buf.iter_mut().zip(ticks.iter().cycle()) {
        *byte = *seed;
    }
}
