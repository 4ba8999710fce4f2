use crate::mreg::util::RangeRandExtS;
use ipnetwork::IpNetwork;
use once_cell::sync::Lazy;
use regex::Regex;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

pub const TTL_MIN: u32 = 300;
pub const TTL_MAX: u32 = 68400;

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9-]+(\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,}$")
        .expect("email pattern")
});

// RFC 1876 section 3, textual LOC form
static LOC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"^\d{1,2}( \d{1,2}( \d{1,2}(\.\d{1,3})?)?)? [NS]",
        r" \d{1,3}( \d{1,2}( \d{1,2}(\.\d{1,3})?)?)? [EW]",
        r" -?\d{1,8}(\.\d{1,2})?m?",
        r"( \d{1,8}(\.\d{1,2})?m?( \d{1,8}(\.\d{1,2})?m?( \d{1,8}(\.\d{1,2})?m?)?)?)?$",
    ))
    .expect("loc pattern")
});

pub fn is_valid_ipv4(s: &str) -> bool {
    Ipv4Addr::from_str(s).is_ok()
}

pub fn is_valid_ipv6(s: &str) -> bool {
    Ipv6Addr::from_str(s).is_ok()
}

pub fn is_valid_ip(s: &str) -> bool {
    is_valid_ipv4(s) || is_valid_ipv6(s)
}

fn parse_network(s: &str) -> Option<IpNetwork> {
    if !s.contains('/') {
        return None;
    }
    let net = IpNetwork::from_str(s).ok()?;
    // host bits must be zero
    if net.ip() != net.network() {
        return None;
    }
    Some(net)
}

pub fn is_valid_subnet(s: &str) -> bool {
    parse_network(s).is_some()
}

pub fn is_valid_ipv4_subnet(s: &str) -> bool {
    matches!(parse_network(s), Some(IpNetwork::V4(_)))
}

pub fn is_valid_network(s: &str) -> bool {
    is_valid_subnet(s)
}

/// `true` if `outer` contains all of `inner`. Networks of different address
/// families never contain each other.
pub fn network_contains(outer: &str, inner: &str) -> bool {
    match (IpNetwork::from_str(outer), IpNetwork::from_str(inner)) {
        (Ok(o), Ok(i)) => {
            o.is_ipv4() == i.is_ipv4() && o.prefix() <= i.prefix() && o.contains(i.network())
        }
        _ => false,
    }
}

pub fn is_valid_email(s: &str) -> bool {
    EMAIL.is_match(s)
}

pub fn is_valid_ttl(s: &str) -> bool {
    if s == "default" {
        return true;
    }
    match s.parse::<u32>() {
        Ok(n) => (TTL_MIN..=TTL_MAX).contains(&n),
        Err(_) => false,
    }
}

pub fn is_valid_loc(s: &str) -> bool {
    if !LOC.is_match(s) {
        return false;
    }
    let words: Vec<&str> = s.split(' ').collect();
    let lat_end = match words.iter().position(|w| *w == "N" || *w == "S") {
        Some(i) => i,
        None => return false,
    };
    let in_range = |w: &str, max: u32| w.parse::<u32>().map_or(false, |n| n <= max);
    in_range(words[0], 90) && in_range(words[lat_end + 1], 180)
}

/// Picks a random usable host address from an IPv4 subnet. Network and
/// broadcast addresses are skipped unless the prefix is /31 or /32.
pub fn choose_ip_from_subnet(subnet: &str) -> Option<Ipv4Addr> {
    let net = match parse_network(subnet)? {
        IpNetwork::V4(net) => net,
        IpNetwork::V6(_) => return None,
    };
    let base = u32::from(net.network()) as u64;
    let size = 1u64 << (32 - net.prefix() as u64);
    let offset = if size <= 2 { (0..size).rand() } else { (1..size - 1).rand() };
    Some(Ipv4Addr::from((base + offset) as u32))
}
