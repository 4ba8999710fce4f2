pub fn is_longform(name: &str, domain: &str) -> bool {
    if name.ends_with('.') {
        return true;
    }
    let domain = domain.trim_matches('.');
    name == domain || name.ends_with(&format!(".{}", domain))
}

/// Appends the default domain to a short host name.
pub fn to_longform(name: &str, domain: &str, trailing_dot: bool) -> String {
    let mut res = if is_longform(name, domain) {
        String::from(name.trim_end_matches('.'))
    } else {
        format!("{}.{}", name.trim_end_matches('.'), domain.trim_matches('.'))
    };
    if trailing_dot {
        res.push('.');
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn longform_detection() {
        assert!(is_longform("foo.uio.no", "uio.no"));
        assert!(is_longform("foo.example.org.", "uio.no"));
        assert!(!is_longform("foo", "uio.no"));
        assert!(!is_longform("foouio.no", "uio.no"));
    }

    #[test]
    fn longform_conversion() {
        assert_eq!(to_longform("foo", "uio.no", false), "foo.uio.no");
        assert_eq!(to_longform("foo.uio.no", "uio.no", false), "foo.uio.no");
        assert_eq!(to_longform("_sip._tcp", "uio.no", true), "_sip._tcp.uio.no.");
        assert_eq!(to_longform("foo.uio.no.", "uio.no", true), "foo.uio.no.");
    }
}
