use anyhow::{Context, Result};
use std::io::{ErrorKind, Read};
use std::net::{TcpListener, TcpStream, UdpSocket};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crate::artnet;
use crate::config::MonitorConfig;
use crate::message::drain_messages;
use crate::universe::DmxUniverse;

const RECV_BUFFER_SIZE: usize = 1024;
const DATAGRAM_BUFFER_SIZE: usize = 2048;
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Stands in for the lighting node: applies ramp connections or Art-Net datagrams to a universe
pub struct MonitorServer {
    config: MonitorConfig,
    universe: Arc<Mutex<DmxUniverse>>,
    messages_received: Arc<AtomicU64>,
    running: Arc<AtomicBool>,
}

impl MonitorServer {
    pub fn new(config: MonitorConfig, universe: Arc<Mutex<DmxUniverse>>) -> Self {
        MonitorServer {
            config,
            universe,
            messages_received: Arc::new(AtomicU64::new(0)),
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Get a clone of the running flag for signal handlers
    pub fn get_running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    pub fn messages_received(&self) -> u64 {
        self.messages_received.load(Ordering::Relaxed)
    }

    /// Bind and serve until the running flag is cleared
    pub fn run(&self, stats: bool) -> Result<()> {
        let addr = self.config.addr();
        let listener =
            TcpListener::bind(&addr).with_context(|| format!("Failed to bind to {}", addr))?;
        self.serve(listener, stats)
    }

    /// Serve on an already bound listener
    pub fn serve(&self, listener: TcpListener, stats: bool) -> Result<()> {
        // accept() must not block so the running flag is polled
        listener
            .set_nonblocking(true)
            .context("Failed to set listener to non-blocking mode")?;
        log::info!("Monitor listening on {}", listener.local_addr()?);

        if stats {
            self.spawn_stats_thread();
        }

        while self.running.load(Ordering::Relaxed) {
            match listener.accept() {
                Ok((stream, peer_addr)) => {
                    log::info!("Client connected from {}", peer_addr);
                    if let Err(e) = self.handle_client(stream) {
                        log::error!("Error handling client {}: {:#}", peer_addr, e);
                    }
                    log::debug!("Client {} disconnected", peer_addr);
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => {
                    thread::sleep(POLL_INTERVAL);
                }
                Err(e) => {
                    log::error!("Error accepting connection: {}", e);
                    thread::sleep(POLL_INTERVAL);
                }
            }
        }

        Ok(())
    }

    /// Bind the Art-Net UDP port and serve until the running flag is cleared
    pub fn run_artnet(&self, stats: bool) -> Result<()> {
        let addr = self.config.artnet_addr();
        let socket =
            UdpSocket::bind(&addr).with_context(|| format!("Failed to bind to {}", addr))?;
        self.serve_artnet(socket, stats)
    }

    /// Serve Art-Net on an already bound socket. One datagram is one packet.
    pub fn serve_artnet(&self, socket: UdpSocket, stats: bool) -> Result<()> {
        socket
            .set_read_timeout(Some(POLL_INTERVAL))
            .context("Failed to set read timeout")?;
        log::info!("Art-Net monitor listening on {}", socket.local_addr()?);

        if stats {
            self.spawn_stats_thread();
        }

        let mut datagram = [0u8; DATAGRAM_BUFFER_SIZE];
        while self.running.load(Ordering::Relaxed) {
            let (n, source) = match socket.recv_from(&mut datagram) {
                Ok(received) => received,
                Err(e) if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::TimedOut => {
                    continue
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e).context("recvfrom failed"),
            };
            log::trace!("{} bytes from {}", n, source);

            let mut universe = self
                .universe
                .lock()
                .map_err(|_| anyhow::anyhow!("Universe lock poisoned"))?;
            let before = universe.clone();
            match artnet::handle_packet(&datagram[..n], &mut universe) {
                Ok(_) => {
                    log_changes(&before, &universe);
                    self.messages_received.fetch_add(1, Ordering::Relaxed);
                }
                Err(e) => log::warn!("Dropping packet from {}: {}", source, e),
            }
        }

        Ok(())
    }

    fn handle_client(&self, mut stream: TcpStream) -> Result<()> {
        stream
            .set_nonblocking(false)
            .context("Failed to set client socket to blocking mode")?;
        stream
            .set_read_timeout(Some(POLL_INTERVAL))
            .context("Failed to set read timeout")?;

        let mut buffer = Vec::new();
        let mut read_buf = [0u8; RECV_BUFFER_SIZE];

        while self.running.load(Ordering::Relaxed) {
            match stream.read(&mut read_buf) {
                Ok(0) => break,
                Ok(n) => buffer.extend_from_slice(&read_buf[..n]),
                Err(e) if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::TimedOut => {
                    continue
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e).context("Failed reading from client"),
            }

            let messages = drain_messages(&mut buffer);
            if messages.is_empty() {
                continue;
            }

            let mut universe = self
                .universe
                .lock()
                .map_err(|_| anyhow::anyhow!("Universe lock poisoned"))?;
            for msg in &messages {
                log::trace!("<- {:02x} {:02x}", msg.channel, msg.value);
                let slot = msg.channel as usize;
                let previous = universe.get(slot);
                if universe.write(slot, msg.value) && previous != Some(msg.value) {
                    log::debug!("slot {} = {}", slot, msg.value);
                }
            }
            self.messages_received
                .fetch_add(messages.len() as u64, Ordering::Relaxed);
        }

        if !buffer.is_empty() {
            log::warn!("Dropping {} trailing byte(s) of a partial message", buffer.len());
        }
        Ok(())
    }

    fn spawn_stats_thread(&self) {
        let messages_received = Arc::clone(&self.messages_received);
        let running = Arc::clone(&self.running);

        thread::spawn(move || {
            let mut last = 0u64;
            while running.load(Ordering::Relaxed) {
                thread::sleep(Duration::from_secs(5));
                let current = messages_received.load(Ordering::Relaxed);
                log::debug!("[Stats] Received: {:.1} msg/s", (current - last) as f64 / 5.0);
                last = current;
            }
        });
    }
}

fn log_changes(before: &DmxUniverse, after: &DmxUniverse) {
    if !log::log_enabled!(log::Level::Debug) {
        return;
    }
    for (slot, (old, new)) in before.frame().iter().zip(after.frame()).enumerate().skip(1) {
        if old != new {
            log::debug!("slot {} = {}", slot, new);
        }
    }
}
