//! Shareable link assembly

use std::net::{Ipv4Addr, SocketAddr, UdpSocket};

use url::Url;

/// Best-effort LAN IPv4 detection.
///
/// "Connects" a UDP socket toward a routable address and reads back the
/// local address the OS picked for it; no packet is ever sent. Returns
/// `None` when the machine has no usable route (no LAN, loopback only).
pub fn local_ip() -> Option<Ipv4Addr> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).ok()?;
    socket.connect(("8.8.8.8", 80)).ok()?;

    match socket.local_addr().ok()? {
        SocketAddr::V4(addr) if !addr.ip().is_loopback() => Some(*addr.ip()),
        _ => None,
    }
}

/// Assemble the link a nearby device uses to fetch the shared file.
pub fn share_link(ip: Ipv4Addr, port: u16, token: &str) -> Url {
    let mut url =
        Url::parse(&format!("http://{}:{}/", ip, port)).expect("authority from ip and port");
    url.set_query(Some(&format!("token={}", token)));
    url
}
