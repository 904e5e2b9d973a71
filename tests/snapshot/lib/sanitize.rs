use std::sync::LazyLock;

use regex::Regex;

static FINISHED_RE: LazyLock<Regex> = LazyLock::new(|| {
    // Matches: finished in 0.12s
    Regex::new(r"finished in \d+\.\d+s").unwrap()
});

static DURATION_MS_RE: LazyLock<Regex> = LazyLock::new(|| {
    // Matches: "duration_ms":12
    Regex::new(r#""duration_ms":\d+"#).unwrap()
});

/// Replace measured durations so output can be compared byte for byte.
pub fn sanitize_durations(input: &str) -> String {
    let tmp = FINISHED_RE.replace_all(input, "finished in <duration>");
    let tmp = DURATION_MS_RE.replace_all(tmp.as_ref(), r#""duration_ms":0"#);
    tmp.to_string()
}
