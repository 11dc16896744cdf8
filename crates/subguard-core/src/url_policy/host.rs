//! Host classification helpers.

use std::net::Ipv4Addr;

use url::Host;

/// `host` is `domain` or one of its subdomains. Both already lowercase.
pub(crate) fn matches_domain(host: &str, domain: &str) -> bool {
    host == domain
        || (host.len() > domain.len()
            && host.ends_with(domain)
            && host.as_bytes()[host.len() - domain.len() - 1] == b'.')
}

pub(crate) fn matches_any(host: &str, domains: &[String]) -> bool {
    domains.iter().any(|d| matches_domain(host, d))
}

/// Loopback, unspecified, `localhost`, or any bare IP literal.
pub(crate) fn is_local_or_ip(host: &Host<&str>) -> bool {
    match host {
        Host::Domain(d) => {
            let d = d.trim_end_matches('.');
            d == "localhost" || d.ends_with(".localhost")
        }
        Host::Ipv4(_) | Host::Ipv6(_) => true,
    }
}

/// More specific label for an IP host, for the warning text.
pub(crate) fn describe_host(host: &Host<&str>) -> &'static str {
    match host {
        Host::Domain(_) => "localhost",
        Host::Ipv4(ip) if ip.is_loopback() || *ip == Ipv4Addr::UNSPECIFIED => "loopback address",
        Host::Ipv6(ip) if ip.is_loopback() || ip.is_unspecified() => "loopback address",
        Host::Ipv4(_) | Host::Ipv6(_) => "bare IP address",
    }
}
