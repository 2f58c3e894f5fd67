//! 客户端 IP 工具

use std::net::{IpAddr, SocketAddr};

use actix_web::HttpRequest;

/// 检查 IP 是否为私有地址或 localhost
pub fn is_private_or_local(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => v4.is_private() || v4.is_loopback() || v4.is_link_local(),
        IpAddr::V6(v6) => {
            v6.is_loopback()
                || v6.is_unspecified()
                || (v6.segments()[0] & 0xfe00) == 0xfc00 // fc00::/7
                || (v6.segments()[0] & 0xffc0) == 0xfe80 // fe80::/10
        }
    }
}

/// "ip" 或 "ip:port" 形式都接受
pub fn parse_ip(raw: &str) -> Option<IpAddr> {
    let raw = raw.trim();
    raw.parse::<SocketAddr>()
        .map(|addr| addr.ip())
        .or_else(|_| raw.trim_start_matches('[').trim_end_matches(']').parse::<IpAddr>())
        .ok()
}

/// 客户端 IP：优先 Forwarded / X-Forwarded-For，其次连接地址
pub fn extract_client_ip(req: &HttpRequest) -> String {
    let conn_info = req.connection_info();
    conn_info
        .realip_remote_addr()
        .map(|addr| match parse_ip(addr) {
            Some(ip) => ip.to_string(),
            None => addr.to_string(),
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_private_detection() {
        assert!(is_private_or_local(&"127.0.0.1".parse().unwrap()));
        assert!(is_private_or_local(&"10.1.2.3".parse().unwrap()));
        assert!(is_private_or_local(&"192.168.0.10".parse().unwrap()));
        assert!(is_private_or_local(&"::1".parse().unwrap()));
        assert!(is_private_or_local(&"fd12::1".parse().unwrap()));
        assert!(!is_private_or_local(&"8.8.8.8".parse().unwrap()));
        assert!(!is_private_or_local(&"2001:4860::8888".parse().unwrap()));
    }

    #[test]
    fn test_parse_ip_with_port() {
        assert_eq!(parse_ip("1.2.3.4:5678"), "1.2.3.4".parse().ok());
        assert_eq!(parse_ip("[::1]:80"), "::1".parse().ok());
        assert_eq!(parse_ip("9.9.9.9"), "9.9.9.9".parse().ok());
        assert_eq!(parse_ip("garbage"), None);
    }

    #[test]
    fn test_extract_client_ip_prefers_forwarded_for() {
        let req = TestRequest::default()
            .insert_header(("X-Forwarded-For", "203.0.113.7, 10.0.0.1"))
            .peer_addr("10.0.0.1:4000".parse().unwrap())
            .to_http_request();
        assert_eq!(extract_client_ip(&req), "203.0.113.7");
    }

    #[test]
    fn test_extract_client_ip_from_peer() {
        let req = TestRequest::default()
            .peer_addr("198.51.100.4:1234".parse().unwrap())
            .to_http_request();
        assert_eq!(extract_client_ip(&req), "198.51.100.4");
    }
}
