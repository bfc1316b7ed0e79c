//! Fixed lookup tables: platform display names, build cadences, release targets.

/// Build cadence options offered when filing an issue.
pub const BUILD_OPTIONS: &[&str] = &["Weekly", "Daily", "Daily Plus"];

/// Human-facing name for a platform code. Unknown codes display as themselves.
pub fn platform_display(code: &str) -> &str {
    match code {
        "lnx86" => "Linux",
        "lr" => "LR",
        "rhel7.6" => "RHEL7.6",
        "centos7.4" => "CENTOS7.4",
        "sles12sp3" => "SLES12SP3",
        "lop" => "LOP",
        other => other,
    }
}

/// Release train targets known for a release. Unknown releases have none.
pub fn targets_for_release(release: &str) -> &'static [&'static str] {
    match release {
        "251" => &[
            "25.11-d065_1_Jun23",
            "25.11-d062_1_Jun_19",
            "25.11-d057_1_Jun_12",
            "25.11-d049_1_Jun_05",
        ],
        "261" => &["26.10-d075_1_May_08"],
        "231" => &["23.13-d014_1_Oct_23", "23.13-d012_1_Oct_15"],
        _ => &[],
    }
}
