//! Rotated browser-like header profiles, standing in for `curl_cffi`'s TLS
//! impersonation (no Rust crate in this corpus reproduces a TLS
//! fingerprint, but the header rotation it layers on top is reproducible
//! with plain `reqwest` headers).

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/124.0.0.0 Safari/537.36";

pub struct HeaderProfile {
    pub headers: &'static [(&'static str, &'static str)],
}

const PROFILES: &[HeaderProfile] = &[
    HeaderProfile {
        headers: &[
            ("user-agent", DEFAULT_USER_AGENT),
            ("accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
            ("accept-language", "en-US,en;q=0.9"),
            ("sec-ch-ua-platform", "\"Windows\""),
        ],
    },
    HeaderProfile {
        headers: &[
            (
                "user-agent",
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 \
                 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
            ),
            ("accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
            ("accept-language", "en-US,en;q=0.9"),
            ("sec-ch-ua-platform", "\"macOS\""),
        ],
    },
    HeaderProfile {
        headers: &[
            (
                "user-agent",
                "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) \
                 Chrome/124.0.0.0 Safari/537.36",
            ),
            ("accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
            ("accept-language", "en-US,en;q=0.9"),
            ("sec-ch-ua-platform", "\"Linux\""),
        ],
    },
];

pub fn random_profile() -> &'static HeaderProfile {
    &PROFILES[fastrand::usize(..PROFILES.len())]
}
