// src/utils/client_ip.rs

use std::{
    convert::Infallible,
    fmt,
    net::{IpAddr, SocketAddr},
    str::FromStr,
};

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{HeaderMap, request::Parts},
};

use crate::state::AppState;

/// Returned when no header and no peer address yields anything usable.
pub const UNKNOWN_IP: &str = "Unknown IP";

const IPV4_MAPPED_PREFIX: &str = "::ffff:";

/// A proxy header that may carry the originating client address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyHeader {
    XForwardedFor,
    CfConnectingIp,
    XRealIp,
    FastlyClientIp,
    TrueClientIp,
    XClientIp,
    XClusterClientIp,
    XForwarded,
    Forwarded,
}

impl ProxyHeader {
    pub const DEFAULT_ORDER: [ProxyHeader; 9] = [
        ProxyHeader::XForwardedFor,
        ProxyHeader::CfConnectingIp,
        ProxyHeader::XRealIp,
        ProxyHeader::FastlyClientIp,
        ProxyHeader::TrueClientIp,
        ProxyHeader::XClientIp,
        ProxyHeader::XClusterClientIp,
        ProxyHeader::XForwarded,
        ProxyHeader::Forwarded,
    ];

    pub fn header_name(self) -> &'static str {
        match self {
            ProxyHeader::XForwardedFor => "x-forwarded-for",
            ProxyHeader::CfConnectingIp => "cf-connecting-ip",
            ProxyHeader::XRealIp => "x-real-ip",
            ProxyHeader::FastlyClientIp => "fastly-client-ip",
            ProxyHeader::TrueClientIp => "true-client-ip",
            ProxyHeader::XClientIp => "x-client-ip",
            ProxyHeader::XClusterClientIp => "x-cluster-client-ip",
            ProxyHeader::XForwarded => "x-forwarded",
            ProxyHeader::Forwarded => "forwarded",
        }
    }

    /// Extracts the client address from a raw header value.
    ///
    /// Multi-hop values are split on commas and the first hop wins.
    fn first_hop(self, raw: &str) -> Option<String> {
        let first = raw.split(',').next()?.trim();
        let address = match self {
            ProxyHeader::Forwarded => forwarded_for(first)?,
            _ => first,
        };

        if address.is_empty() {
            return None;
        }
        Some(strip_mapped_prefix(address).to_string())
    }
}

impl fmt::Display for ProxyHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header_name())
    }
}

impl FromStr for ProxyHeader {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        ProxyHeader::DEFAULT_ORDER
            .into_iter()
            .find(|header| header.header_name() == wanted)
            .ok_or_else(|| format!("unknown proxy header '{}'", s.trim()))
    }
}

/// Parses a comma-separated header policy such as `x-real-ip, x-forwarded-for`.
pub fn parse_header_policy(raw: &str) -> Result<Vec<ProxyHeader>, String> {
    let policy = raw
        .split(',')
        .filter(|name| !name.trim().is_empty())
        .map(ProxyHeader::from_str)
        .collect::<Result<Vec<_>, _>>()?;

    if policy.is_empty() {
        return Err("policy must name at least one header".to_string());
    }
    Ok(policy)
}

/// Resolves the best-effort client address for audit logging.
///
/// Headers are consulted in `policy` order and the first usable value wins.
/// Falls back to the transport peer, then to [`UNKNOWN_IP`].
pub fn resolve_client_ip(
    headers: &HeaderMap,
    policy: &[ProxyHeader],
    peer: Option<IpAddr>,
) -> String {
    policy
        .iter()
        .find_map(|header| {
            let raw = headers.get(header.header_name())?.to_str().ok()?;
            header.first_hop(raw)
        })
        .or_else(|| peer.map(|ip| strip_mapped_prefix(&ip.to_string()).to_string()))
        .unwrap_or_else(|| UNKNOWN_IP.to_string())
}

fn strip_mapped_prefix(address: &str) -> &str {
    address.strip_prefix(IPV4_MAPPED_PREFIX).unwrap_or(address)
}

/// Pulls the `for=` node out of one `Forwarded` element (RFC 7239).
fn forwarded_for(element: &str) -> Option<&str> {
    let node = element.split(';').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        key.trim().eq_ignore_ascii_case("for").then(|| value.trim())
    })?;

    let node = node.trim_matches('"');
    match node.strip_prefix('[') {
        // "[2001:db8::1]:4711"
        Some(bracketed) => bracketed.split(']').next(),
        None => Some(node),
    }
}

/// Extractor carrying the resolved client address of the current request.
#[derive(Debug, Clone)]
pub struct ClientIp(pub String);

impl FromRequestParts<AppState> for ClientIp {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());

        Ok(ClientIp(resolve_client_ip(
            &parts.headers,
            &state.config.proxy_headers,
            peer,
        )))
    }
}
