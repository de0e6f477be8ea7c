//! Small text helpers for config values, API errors and list labels.

/// Longest excerpt of a raw response body kept in an error message.
const ERROR_EXCERPT_CHARS: usize = 200;

/// Trimmed value, or `None` when missing or blank.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

/// True when `url` names an `http` or `https` scheme, in any case.
pub fn has_http_scheme(url: &str) -> bool {
    url.split_once("://").is_some_and(|(scheme, rest)| {
        !rest.is_empty()
            && (scheme.eq_ignore_ascii_case("http") || scheme.eq_ignore_ascii_case("https"))
    })
}

/// One-line excerpt of a non-JSON response body, e.g. an HTML gateway page.
///
/// Whitespace runs collapse to a single space; long bodies end in `...`.
pub fn error_excerpt(body: &str) -> String {
    let mut words = body.split_whitespace();
    let mut excerpt = words.next().unwrap_or_default().to_owned();
    for word in words {
        excerpt.push(' ');
        excerpt.push_str(word);
    }

    match excerpt.char_indices().nth(ERROR_EXCERPT_CHARS) {
        Some((cut, _)) => {
            excerpt.truncate(cut);
            excerpt.push_str("...");
            excerpt
        }
        None => excerpt,
    }
}

/// Heading count for the notes list, e.g. `1 note` / `3 notes`.
pub fn note_count_label(count: usize) -> String {
    match count {
        1 => "1 note".to_owned(),
        count => format!("{count} notes"),
    }
}
