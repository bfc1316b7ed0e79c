//! Derive release and platform from a structured test-case path.
//!
//! Paths look like `/lan/fed/etpv5/release/<digits>/<platform>/etautotest/...`.
//! Anything else is "unparsable" and yields no tokens; that is a normal result.

const RELEASE_PREFIX: &str = "/lan/fed/etpv5/release/";
const SUITE_SEGMENT: &str = "etautotest/";

/// Release and platform tokens parsed from a test-case path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathTokens {
    pub release: Option<String>,
    pub platform: Option<String>,
}

/// Parse `release` and `platform` out of `path`, anchored at the start.
///
/// Both fields are `Some` on a match and both are `None` otherwise.
pub fn parse_testcase_path(path: &str) -> PathTokens {
    match split_tokens(path) {
        Some((release, platform)) => PathTokens {
            release: Some(release.to_string()),
            platform: Some(platform.to_string()),
        },
        None => PathTokens::default(),
    }
}

fn split_tokens(path: &str) -> Option<(&str, &str)> {
    let rest = path.strip_prefix(RELEASE_PREFIX)?;

    let (release, rest) = rest.split_once('/')?;
    if release.is_empty() || !release.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let (platform, rest) = rest.split_once('/')?;
    if platform.is_empty() {
        return None;
    }

    rest.starts_with(SUITE_SEGMENT).then_some((release, platform))
}
