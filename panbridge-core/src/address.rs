//! IPv4 address and subnet arithmetic over `address/prefix` strings.
//!
//! Every function takes the textual form reported by the kernel
//! (`192.168.5.10/24`) and fails with [`PanBridgeError::InvalidAddress`]
//! when the input is not a dotted quad followed by a prefix length.

use crate::{PanBridgeError, Result};
use ipnetwork::Ipv4Network;
use std::net::Ipv4Addr;

/// Third-octet search space used for free subnet discovery.
const PRIVATE_BASE: [u8; 2] = [192, 168];

pub fn parse(a: &str) -> Result<Ipv4Network> {
    let trimmed = a.trim();
    if !trimmed.contains('/') {
        return Err(PanBridgeError::invalid_address(a, "missing prefix length"));
    }
    trimmed
        .parse::<Ipv4Network>()
        .map_err(|e| PanBridgeError::invalid_address(a, e))
}

pub fn address(a: &str) -> Result<String> {
    Ok(parse(a)?.ip().to_string())
}

pub fn network(a: &str) -> Result<String> {
    let net = parse(a)?;
    Ok(format!("{}/{}", net.network(), net.prefix()))
}

/// Network address truncated to the octets covered by the prefix,
/// e.g. `192.168.5.10/24` gives `192.168.5`.
pub fn network_prefix(a: &str) -> Result<String> {
    let net = parse(a)?;
    let keep = (net.prefix() as usize).div_ceil(8).max(1);
    let octets = net.network().octets();
    Ok(octets[..keep]
        .iter()
        .map(|o| o.to_string())
        .collect::<Vec<_>>()
        .join("."))
}

pub fn netmask(a: &str) -> Result<String> {
    Ok(parse(a)?.mask().to_string())
}

fn first_host(net: Ipv4Network) -> Ipv4Addr {
    match net.prefix() {
        32 => net.ip(),
        31 => net.network(),
        _ => Ipv4Addr::from(u32::from(net.network()) + 1),
    }
}

fn last_host(net: Ipv4Network) -> Ipv4Addr {
    match net.prefix() {
        32 => net.ip(),
        31 => net.broadcast(),
        _ => Ipv4Addr::from(u32::from(net.broadcast()) - 1),
    }
}

pub fn host_min(a: &str) -> Result<String> {
    Ok(first_host(parse(a)?).to_string())
}

pub fn host_max(a: &str) -> Result<String> {
    Ok(last_host(parse(a)?).to_string())
}

/// Host `offset` addresses past the network address, e.g. offset 100 of
/// `10.0.0.1/16` is `10.0.0.100`. Fails unless the result is a usable host.
pub fn host_at(a: &str, offset: u32) -> Result<String> {
    let net = parse(a)?;
    let host = u32::from(net.network())
        .checked_add(offset)
        .map(Ipv4Addr::from)
        .filter(|h| (first_host(net)..=last_host(net)).contains(h))
        .ok_or_else(|| {
            PanBridgeError::invalid_address(
                a,
                format!("host offset {offset} is outside the network"),
            )
        })?;
    Ok(host.to_string())
}

/// First host of the network with the prefix reattached, the form
/// `ip addr add` expects for a gateway address.
pub fn gateway(a: &str) -> Result<String> {
    let net = parse(a)?;
    Ok(format!("{}/{}", host_min(a)?, net.prefix()))
}

/// Picks the `/24` after the highest observed `192.168.x.0` network.
///
/// Gaps below the maximum are not reused. Returns
/// [`PanBridgeError::SubnetExhausted`] when `192.168.255.0` is already taken.
pub fn next_free_subnet<'a, I>(observed: I) -> Result<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut highest: Option<u8> = None;
    for a in observed {
        let octets = parse(a)?.ip().octets();
        if octets[..2] == PRIVATE_BASE {
            highest = highest.max(Some(octets[2]));
        }
    }

    let third = match highest {
        None => 0,
        Some(max) => max.checked_add(1).ok_or(PanBridgeError::SubnetExhausted)?,
    };

    Ok(format!("{}.{}.{}.0/24", PRIVATE_BASE[0], PRIVATE_BASE[1], third))
}
