use std::net::IpAddr;

/// Strip HTML tags and collapse whitespace in user-supplied text.
pub fn sanitize_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut in_tag = false;
    for ch in value.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            c if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalize a tag list: lowercase, trimmed, deduplicated, empty entries dropped.
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        let tag = sanitize_text(tag).to_lowercase();
        if !tag.is_empty() && !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}

/// Validate a callback/webhook URL against SSRF targets. Only http(s)
/// URLs with public hostnames are accepted.
pub fn callback_url_is_allowed(url: &str) -> bool {
    let Some((scheme, rest)) = url.split_once("://") else {
        return false;
    };
    if scheme != "http" && scheme != "https" {
        return false;
    }
    let authority = rest.split(['/', '?', '#']).next().unwrap_or("");
    let host = authority
        .rsplit_once('@')
        .map_or(authority, |(_, h)| h);
    let host = host
        .strip_prefix('[')
        .and_then(|h| h.split(']').next())
        .unwrap_or_else(|| host.split(':').next().unwrap_or(""));
    if host.is_empty() {
        return false;
    }

    let lower = host.to_lowercase();
    if lower == "localhost" || lower.ends_with(".local") || lower.ends_with(".internal") {
        return false;
    }

    if let Ok(ip) = lower.parse::<IpAddr>() {
        return match ip {
            IpAddr::V4(v4) => {
                !(v4.is_private()
                    || v4.is_loopback()
                    || v4.is_link_local()
                    || v4.is_unspecified()
                    || v4.is_broadcast())
            }
            IpAddr::V6(v6) => !(v6.is_loopback() || v6.is_unspecified()),
        };
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_strips_tags() {
        assert_eq!(
            sanitize_text("<script>alert(1)</script>hello  world"),
            "alert(1)hello world"
        );
    }

    #[test]
    fn test_sanitize_collapses_whitespace() {
        assert_eq!(sanitize_text("  a \n\t b  "), "a b");
    }

    #[test]
    fn test_normalize_tags_dedups_and_lowercases() {
        let tags = vec!["Design".into(), "  logo ".into(), "design".into(), "".into()];
        assert_eq!(normalize_tags(&tags), vec!["design", "logo"]);
    }

    #[test]
    fn test_callback_url_rejects_private_targets() {
        assert!(!callback_url_is_allowed("http://localhost:8000/hook"));
        assert!(!callback_url_is_allowed("http://127.0.0.1/hook"));
        assert!(!callback_url_is_allowed("https://10.0.0.5/hook"));
        assert!(!callback_url_is_allowed("https://192.168.1.1/hook"));
        assert!(!callback_url_is_allowed("http://[::1]/hook"));
        assert!(!callback_url_is_allowed("https://db.internal/hook"));
        assert!(!callback_url_is_allowed("ftp://example.com/hook"));
        assert!(!callback_url_is_allowed("not a url"));
    }

    #[test]
    fn test_callback_url_accepts_public_hosts() {
        assert!(callback_url_is_allowed("https://example.com/hook"));
        assert!(callback_url_is_allowed("http://93.184.216.34:9000/hook?x=1"));
    }
}
