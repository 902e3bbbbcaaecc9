// Set-Cookie directive handling
//
// Upstream responses may carry several cookies either as distinct header
// instances or folded into one comma-joined value. Commas also occur inside
// `Expires=` dates, so a directive boundary is only a comma followed by
// optional whitespace and a `name=` pattern.

/// Split a raw `Set-Cookie` header value into individual directives.
///
/// N cookies in, N directives out. A comma inside an `Expires=` date is never
/// a boundary because the token after it ("01 Jan ...") is not followed by `=`.
pub fn split_set_cookie(raw: &str) -> Vec<String> {
    let bytes = raw.as_bytes();
    let mut directives = Vec::new();
    let mut start = 0;

    for i in 0..bytes.len() {
        if bytes[i] == b',' && starts_new_cookie(&raw[i + 1..]) {
            let part = raw[start..i].trim();
            if !part.is_empty() {
                directives.push(part.to_string());
            }
            start = i + 1;
        }
    }

    let tail = raw[start..].trim();
    if !tail.is_empty() {
        directives.push(tail.to_string());
    }

    directives
}

/// A boundary comma is followed by optional whitespace, a cookie name, and `=`.
fn starts_new_cookie(rest: &str) -> bool {
    let rest = rest.trim_start();
    let name_len = rest
        .bytes()
        .take_while(|b| b.is_ascii_alphanumeric() || *b == b'_' || *b == b'-')
        .count();
    name_len > 0 && rest.as_bytes().get(name_len) == Some(&b'=')
}

/// Rewrite a cookie directive so its domain attribute is the serving site.
///
/// Any existing `Domain=` attribute is stripped and `Domain=.{site_domain}`
/// is inserted right after the `name=value` pair; every other attribute is
/// carried over unchanged. Exactly one domain attribute comes out regardless
/// of what went in.
pub fn rewrite_cookie_domain(directive: &str, site_domain: &str) -> String {
    let mut parts = directive.split(';');
    let name_value = parts.next().unwrap_or("").trim();

    let mut rewritten = format!("{}; Domain=.{}", name_value, site_domain);
    for attr in parts {
        let attr = attr.trim();
        if attr.is_empty() || attr.to_ascii_lowercase().starts_with("domain=") {
            continue;
        }
        rewritten.push_str("; ");
        rewritten.push_str(attr);
    }

    rewritten
}

#[cfg(test)]
mod tests {
    use super::*;

    const SITE: &str = "yogatungelsta.se";

    #[test]
    fn test_split_single_cookie() {
        let parts = split_set_cookie("session=abc123; Path=/; Secure");
        assert_eq!(parts, vec!["session=abc123; Path=/; Secure"]);
    }

    #[test]
    fn test_split_comma_joined_cookies() {
        let parts = split_set_cookie("session=abc123; Path=/, csrf-token=xyz; Secure");
        assert_eq!(
            parts,
            vec!["session=abc123; Path=/", "csrf-token=xyz; Secure"]
        );
    }

    #[test]
    fn test_split_keeps_expires_date_intact() {
        let raw = "session=abc123; Expires=Thu, 01 Jan 2026 00:00:00 GMT; Path=/, tracking=1; Path=/";
        let parts = split_set_cookie(raw);
        assert_eq!(parts.len(), 2);
        assert_eq!(
            parts[0],
            "session=abc123; Expires=Thu, 01 Jan 2026 00:00:00 GMT; Path=/"
        );
        assert_eq!(parts[1], "tracking=1; Path=/");
    }

    #[test]
    fn test_split_empty_value() {
        assert!(split_set_cookie("").is_empty());
    }

    #[test]
    fn test_split_count_is_preserved() {
        let raw = "a=1, b=2; Path=/, c=3; Expires=Wed, 21 Oct 2026 07:28:00 GMT";
        assert_eq!(split_set_cookie(raw).len(), 3);
    }

    #[test]
    fn test_rewrite_inserts_domain_after_name_value() {
        assert_eq!(
            rewrite_cookie_domain("session=abc123; Path=/; Secure", SITE),
            "session=abc123; Domain=.yogatungelsta.se; Path=/; Secure"
        );
    }

    #[test]
    fn test_rewrite_replaces_existing_domain() {
        let rewritten =
            rewrite_cookie_domain("session=abc123; Domain=z.coregym.club; Path=/; Secure", SITE);
        assert_eq!(
            rewritten,
            "session=abc123; Domain=.yogatungelsta.se; Path=/; Secure"
        );
        assert_eq!(rewritten.matches("Domain=").count(), 1);
    }

    #[test]
    fn test_rewrite_domain_attribute_is_case_insensitive() {
        let rewritten = rewrite_cookie_domain("session=abc123; domain=.other.example; Path=/", SITE);
        assert_eq!(
            rewritten,
            "session=abc123; Domain=.yogatungelsta.se; Path=/"
        );
    }

    #[test]
    fn test_rewrite_bare_name_value() {
        assert_eq!(
            rewrite_cookie_domain("session=abc123", SITE),
            "session=abc123; Domain=.yogatungelsta.se"
        );
    }

    #[test]
    fn test_rewrite_preserves_other_attributes() {
        let rewritten = rewrite_cookie_domain(
            "session=abc123; Expires=Thu, 01 Jan 2026 00:00:00 GMT; Path=/account; SameSite=Lax; HttpOnly",
            SITE,
        );
        assert_eq!(
            rewritten,
            "session=abc123; Domain=.yogatungelsta.se; Expires=Thu, 01 Jan 2026 00:00:00 GMT; Path=/account; SameSite=Lax; HttpOnly"
        );
    }

    #[test]
    fn test_split_then_rewrite_round_trip() {
        let raw = "session=abc123; Domain=z.coregym.club; Path=/, refresh=tok; Path=/";
        let rewritten: Vec<String> = split_set_cookie(raw)
            .iter()
            .map(|c| rewrite_cookie_domain(c, SITE))
            .collect();
        assert_eq!(
            rewritten,
            vec![
                "session=abc123; Domain=.yogatungelsta.se; Path=/",
                "refresh=tok; Domain=.yogatungelsta.se; Path=/"
            ]
        );
    }
}
