use aho_corasick::AhoCorasick;
use std::sync::OnceLock;

const CITATION_MARKER: &str = "[Source";

fn citation_matcher() -> &'static AhoCorasick {
    static MATCHER: OnceLock<AhoCorasick> = OnceLock::new();
    MATCHER.get_or_init(|| {
        AhoCorasick::new([CITATION_MARKER]).expect("static citation pattern must compile")
    })
}

/// Prepare a finalized assistant message for terminal display: numeric
/// citation tags are dropped, URL citation tags become a plain reference, and
/// blank-line runs collapse into single line breaks.
pub fn format_message(content: &str) -> String {
    collapse_lines(&rewrite_citations(content))
}

fn rewrite_citations(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut last = 0;

    for found in citation_matcher().find_iter(content) {
        if found.start() < last {
            continue;
        }
        let rest = &content[found.end()..];
        let Some(close) = rest.find(']') else {
            break;
        };
        let tag_end = found.end() + close + 1;
        let body = rest[..close].trim();

        out.push_str(&content[last..found.start()]);
        if let Some(url) = citation_url(body) {
            out.push_str("→ ");
            out.push_str(url);
        } else if !is_numeric_citation(body) {
            // Not a citation tag after all; keep the original text.
            out.push_str(&content[found.start()..tag_end]);
        }
        last = tag_end;
    }

    out.push_str(&content[last..]);
    out
}

fn citation_url(body: &str) -> Option<&str> {
    if body.starts_with("http://") || body.starts_with("https://") {
        Some(body)
    } else {
        None
    }
}

/// `1` or `1, 2, 3` style reference lists.
fn is_numeric_citation(body: &str) -> bool {
    !body.is_empty()
        && body.split(',').all(|part| {
            let part = part.trim();
            !part.is_empty() && part.chars().all(|ch| ch.is_ascii_digit())
        })
}

fn collapse_lines(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_citations_are_dropped() {
        assert_eq!(format_message("Markets fell [Source 1]."), "Markets fell .");
        assert_eq!(
            format_message("Two papers agree [Source 1, 2, 12]."),
            "Two papers agree ."
        );
    }

    #[test]
    fn test_url_citation_becomes_plain_reference() {
        assert_eq!(
            format_message("See [Source https://example.com/a]."),
            "See → https://example.com/a."
        );
    }

    #[test]
    fn test_non_citation_brackets_survive() {
        assert_eq!(
            format_message("[Source code] is on the repo"),
            "[Source code] is on the repo"
        );
        assert_eq!(format_message("[Source"), "[Source");
    }

    #[test]
    fn test_blank_line_runs_collapse() {
        assert_eq!(
            format_message("first\n\n\nsecond\n   \nthird"),
            "first\nsecond\nthird"
        );
    }

    #[test]
    fn test_mixed_citations_in_one_message() {
        let input = "Growth slowed [Source 3].\n\nDetails: [Source https://n.example/q]";
        assert_eq!(
            format_message(input),
            "Growth slowed .\nDetails: → https://n.example/q"
        );
    }
}
