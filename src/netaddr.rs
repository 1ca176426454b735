//! Best-effort discovery of the address peers should use.
//!
//! Only used for display. Nothing else depends on the answer.

use std::net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket};

use tracing::debug;

// Never contacted: connecting a UDP socket only selects a route.
const PROBE_TARGET: SocketAddr =
    SocketAddr::new(IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1)), 9);

/// The first non-loopback IPv4 address of this host, if any.
pub fn local_ipv4() -> Option<Ipv4Addr> {
    let probe = || -> std::io::Result<IpAddr> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
        socket.connect(PROBE_TARGET)?;
        Ok(socket.local_addr()?.ip())
    };

    match probe() {
        Ok(IpAddr::V4(ip)) if !ip.is_loopback() && !ip.is_unspecified() => Some(ip),
        Ok(other) => {
            debug!("No usable IPv4 address (got {})", other);
            None
        }
        Err(err) => {
            debug!("Address discovery failed: {}", err);
            None
        }
    }
}

/// A URL peers can open, falling back to `localhost`.
pub fn share_url(port: u16) -> String {
    share_url_for(local_ipv4(), port)
}

fn share_url_for(ip: Option<Ipv4Addr>, port: u16) -> String {
    match ip {
        Some(ip) => format!("http://{}:{}/", ip, port),
        None => format!("http://localhost:{}/", port),
    }
}
