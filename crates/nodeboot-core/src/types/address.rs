use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Address published for the controller before real infrastructure is wired up (IPv4)
pub const PLACEHOLDER_IPV4: Ipv4Addr = Ipv4Addr::new(203, 0, 113, 123);

/// Address published for the controller before real infrastructure is wired up (IPv6)
pub const PLACEHOLDER_IPV6: Ipv6Addr = Ipv6Addr::new(0xfd00, 0xdead, 0x0add, 0, 0, 0, 0, 0);

/// Returns true if `ip` is one of the placeholder sentinels
#[must_use]
pub fn is_placeholder(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => v4 == PLACEHOLDER_IPV4,
        IpAddr::V6(v6) => v6 == PLACEHOLDER_IPV6,
    }
}

/// Returns true if a lookup result is a lone placeholder sentinel
#[must_use]
pub fn is_placeholder_only(ips: &[IpAddr]) -> bool {
    matches!(ips, [ip] if is_placeholder(*ip))
}
