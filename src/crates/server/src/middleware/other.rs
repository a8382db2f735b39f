use actix_cors::Cors;
use actix_web::HttpRequest;

pub fn cors() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "HEAD"])
        .allow_any_header()
        .max_age(3600)
}

/// Client address for rate limiting. Proxy headers are only honoured when
/// `trust_proxy_headers` is set, since any client can send them.
pub fn get_client_ip(req: &HttpRequest, trust_proxy_headers: bool) -> String {
    if trust_proxy_headers {
        // Try X-Forwarded-For header first (for reverse proxy)
        if let Some(forwarded) = req.headers().get("X-Forwarded-For") {
            if let Ok(s) = forwarded.to_str() {
                if let Some(ip) = s.split(',').next() {
                    return ip.trim().to_string();
                }
            }
        }

        if let Some(real_ip) = req.headers().get("X-Real-IP") {
            if let Ok(s) = real_ip.to_str() {
                return s.trim().to_string();
            }
        }
    }

    // Fall back to peer address
    req.peer_addr()
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_client_ip_prefers_forwarded_for() {
        let req = TestRequest::default()
            .insert_header(("X-Forwarded-For", "10.0.0.1, 172.16.0.1"))
            .insert_header(("X-Real-IP", "10.0.0.2"))
            .to_http_request();
        assert_eq!(get_client_ip(&req, true), "10.0.0.1");
    }

    #[test]
    fn test_client_ip_ignores_headers_without_proxy() {
        let req = TestRequest::default()
            .peer_addr("192.168.1.5:4000".parse().unwrap())
            .insert_header(("X-Forwarded-For", "10.0.0.1"))
            .insert_header(("X-Real-IP", "10.0.0.2"))
            .to_http_request();
        assert_eq!(get_client_ip(&req, false), "192.168.1.5");
    }

    #[test]
    fn test_client_ip_fallbacks() {
        let req = TestRequest::default()
            .insert_header(("X-Real-IP", "10.0.0.2"))
            .to_http_request();
        assert_eq!(get_client_ip(&req, true), "10.0.0.2");

        let req = TestRequest::default()
            .peer_addr("192.168.1.5:4000".parse().unwrap())
            .to_http_request();
        assert_eq!(get_client_ip(&req, true), "192.168.1.5");
        assert_eq!(
            get_client_ip(&TestRequest::default().to_http_request(), true),
            "unknown"
        );
    }
}
