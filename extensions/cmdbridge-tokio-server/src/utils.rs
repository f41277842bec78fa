use std::io::Result;
use std::net::{IpAddr, SocketAddr};
use tokio::net::TcpListener;

/// Binds a listener on an OS-assigned loopback port and returns it together
/// with the port that was picked.
pub async fn bind_tcp_listener_on_random_port() -> Result<(TcpListener, u16)> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let port = listener.local_addr()?.port();
    Ok((listener, port))
}

/// The address a bound listener actually ended up on, split into host and
/// port.
pub fn tcp_listener_to_host_port(listener: &TcpListener) -> Result<(IpAddr, u16)> {
    let local: SocketAddr = listener.local_addr()?;
    Ok((local.ip(), local.port()))
}
