//! Dashboard and control endpoints on TCP port 80.
//!
//! Each worker owns one socket and serves one connection at a time: read the
//! request head, run it through the shared router, write the response and
//! close.

use defmt::{Display2Format, debug, info, warn};
use embassy_net::Stack;
use embassy_net::tcp::{self, TcpSocket};
use embassy_time::Duration;
use embedded_io_async::Write;
use heapless::String;

use super::{SharedRouter, log_status};
use crate::config;
use crate::hw::FirmwareInstant;

const RX_BUFFER: usize = 1024;
const TX_BUFFER: usize = 1024;
const RESPONSE_HEAD: usize = 160;

#[derive(Debug, defmt::Format)]
enum ServeError {
    Tcp(tcp::Error),
    HeadOverflow,
}

impl From<tcp::Error> for ServeError {
    fn from(err: tcp::Error) -> Self {
        ServeError::Tcp(err)
    }
}

#[embassy_executor::task(pool_size = config::HTTP_WORKERS)]
pub async fn run(stack: Stack<'static>, router: &'static SharedRouter, worker: usize) -> ! {
    let mut rx = [0u8; RX_BUFFER];
    let mut tx = [0u8; TX_BUFFER];

    stack.wait_config_up().await;
    info!("http worker {} listening on port {}", worker, config::HTTP_PORT);

    loop {
        let mut socket = TcpSocket::new(stack, &mut rx, &mut tx);
        socket.set_timeout(Some(Duration::from_secs(config::HTTP_SOCKET_TIMEOUT_SECS)));

        if let Err(err) = socket.accept(config::HTTP_PORT).await {
            warn!("http worker {} accept failed: {:?}", worker, err);
            continue;
        }

        if let Err(err) = serve(&mut socket, router, worker).await {
            warn!("http worker {} connection error: {:?}", worker, err);
        }

        socket.close();
        let _ = socket.flush().await;
        socket.abort();
    }
}

async fn serve(
    socket: &mut TcpSocket<'_>,
    router: &SharedRouter,
    worker: usize,
) -> Result<(), ServeError> {
    let mut head = [0u8; config::MAX_REQUEST_HEAD];
    let len = read_head(socket, &mut head).await?;
    if len == 0 {
        debug!("http worker {} peer closed before sending a request", worker);
        return Ok(());
    }

    let now = FirmwareInstant::now();
    let handled = router.lock(|cell| cell.borrow_mut().handle(&head[..len], now));

    match handled.error {
        Some(error) => warn!(
            "http worker {} rejected request: {}",
            worker,
            Display2Format(&error)
        ),
        None => info!(
            "http worker {} {} -> {}",
            worker,
            Display2Format(&handled.endpoint),
            Display2Format(&handled.response.status)
        ),
    }

    let mut response_head: String<RESPONSE_HEAD> = String::new();
    handled
        .response
        .write_head(&mut response_head)
        .map_err(|_| ServeError::HeadOverflow)?;
    socket.write_all(response_head.as_bytes()).await?;
    socket.write_all(handled.response.body_bytes()).await?;
    socket.flush().await?;

    if let Some(event) = handled.event {
        info!("event: {}", Display2Format(&event));
        log_status(router, now);
    }
    Ok(())
}

/// Reads until the blank line ending the head, the buffer fills, or the peer
/// stops sending. Returns the number of bytes read.
async fn read_head(socket: &mut TcpSocket<'_>, head: &mut [u8]) -> Result<usize, ServeError> {
    let mut len = 0;
    while len < head.len() {
        let read = socket.read(&mut head[len..]).await?;
        if read == 0 {
            break;
        }
        len += read;
        if head[..len].windows(4).any(|window| window == b"\r\n\r\n") {
            break;
        }
    }
    Ok(len)
}
