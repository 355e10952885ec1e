/*!
Tests for dial target resolution and SOCKS5 proxy parsing.
*/

use alertr::core::network::dialer::{
    DialTarget, DialerError, DialerResolver, OverrideHost, ProxySpec,
};
use alertr::core::network::endpoint::parse_endpoints;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

fn dial_for(spec: &str) -> Option<DialTarget> {
    let targets = parse_endpoints(spec).unwrap();
    DialTarget::for_target(&targets[0])
}

#[test]
fn test_default_port_https() {
    let dial = dial_for("https://b/-/healthy;addr=10.0.0.7").unwrap();
    assert_eq!(dial.port(), 443);
    assert_eq!(dial.to_string(), "10.0.0.7:443");
}

#[test]
fn test_default_port_http() {
    let dial = dial_for("http://b/-/healthy;addr=10.0.0.7").unwrap();
    assert_eq!(dial.port(), 80);
    assert_eq!(dial.to_string(), "10.0.0.7:80");
}

#[test]
fn test_explicit_port_is_kept() {
    let dial = dial_for("https://b:9443/-/healthy;addr=10.0.0.7").unwrap();
    assert_eq!(dial.port(), 9443);

    // Scheme default written explicitly is still that port
    let dial = dial_for("http://b:8080/;addr=10.0.0.7").unwrap();
    assert_eq!(dial.port(), 8080);
}

#[test]
fn test_no_override_means_direct_dial() {
    assert!(dial_for("https://b/-/healthy").is_none());
}

#[test]
fn test_ipv6_override_is_bracketed() {
    let dial = dial_for("https://b/-/healthy;addr=::1").unwrap();
    assert_eq!(dial.host(), &OverrideHost::Ip(IpAddr::V6(Ipv6Addr::LOCALHOST)));
    assert_eq!(dial.to_string(), "[::1]:443");

    let dial = dial_for("https://b/-/healthy;addr=[::1]").unwrap();
    assert_eq!(dial.host(), &OverrideHost::Ip(IpAddr::V6(Ipv6Addr::LOCALHOST)));
}

#[test]
fn test_hostname_override() {
    let dial = dial_for("https://b/-/healthy;addr=backend.internal").unwrap();
    assert_eq!(dial.host(), &OverrideHost::Name("backend.internal".to_string()));
    assert_eq!(dial.to_string(), "backend.internal:443");
}

#[tokio::test]
async fn test_ip_override_socket_addr() {
    let dial = DialTarget::new("127.0.0.1", 8443);
    assert_eq!(
        dial.socket_addr().await.unwrap(),
        SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 8443)
    );
}

#[tokio::test]
async fn test_hostname_override_resolves() {
    let dial = DialTarget::new("localhost", 8080);
    let addr = dial.socket_addr().await.unwrap();
    assert!(addr.ip().is_loopback());
    assert_eq!(addr.port(), 8080);
}

#[test]
fn test_proxy_spec_forms() {
    let plain = ProxySpec::parse("127.0.0.1:1080").unwrap();
    assert_eq!(plain.to_string(), "127.0.0.1:1080");
    let uri = plain.uri().unwrap();
    assert_eq!(uri.scheme_str(), Some("socks5h"));
    assert_eq!(uri.host(), Some("127.0.0.1"));
    assert_eq!(uri.port_u16(), Some(1080));

    let socks5 = ProxySpec::parse("socks5://proxy.internal:1080").unwrap();
    assert_eq!(socks5.to_string(), "proxy.internal:1080");

    let socks5h = ProxySpec::parse("SOCKS5H://proxy.internal:1080/").unwrap();
    assert_eq!(socks5h, socks5);

    let v6 = ProxySpec::parse("[::1]:1080").unwrap();
    assert_eq!(v6.to_string(), "[::1]:1080");
    assert_eq!(v6.uri().unwrap().host(), Some("[::1]"));
}

#[test]
fn test_proxy_spec_rejects_invalid() {
    for raw in [
        "http://proxy:8080",
        "proxy",
        ":1080",
        "proxy:0",
        "proxy:notaport",
        "proxy:70000",
        "user@proxy:1080",
        "socks5://proxy:1080/path",
    ] {
        let err = ProxySpec::parse(raw).unwrap_err();
        assert!(
            matches!(err, DialerError::InvalidProxy { ref proxy, .. } if proxy == raw),
            "expected InvalidProxy for {:?}, got {:?}",
            raw,
            err
        );
    }
}

#[test]
fn test_resolver_binds_dial_target_per_target() {
    let resolver = DialerResolver::new(None, Duration::from_secs(5)).unwrap();
    assert_eq!(resolver.timeout(), Duration::from_secs(5));
    assert!(resolver.proxy().is_none());

    let targets = parse_endpoints("https://a/,https://b/;addr=10.0.0.9").unwrap();
    assert!(resolver.build_client(&targets[0]).dial_target().is_none());
    assert_eq!(
        resolver
            .build_client(&targets[1])
            .dial_target()
            .map(|d| d.to_string()),
        Some("10.0.0.9:443".to_string())
    );
}

#[test]
fn test_resolver_with_proxy() {
    let proxy = ProxySpec::parse("127.0.0.1:1080").unwrap();
    let resolver = DialerResolver::new(Some(proxy.clone()), Duration::from_secs(20)).unwrap();
    assert_eq!(resolver.proxy(), Some(&proxy));
}
