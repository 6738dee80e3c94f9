//! Dry-run view of what the rule set would replace.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RedactionPreview {
    pub term: String,
    pub replacement: String,
    /// Byte offset of the match in the original content.
    pub position: usize,
    /// Text around the match with the replacement shown as `**replacement**`.
    pub context: String,
}

/// Walk `rules` in application order over unclaimed ranges of `content`, so
/// the previewed matches are exactly the ones a redaction pass would make.
pub(crate) fn preview(
    content: &str,
    rules: &[(&str, &str)],
    context_chars: usize,
) -> Vec<RedactionPreview> {
    let mut unclaimed = vec![(0, content.len())];
    let mut previews = Vec::new();

    for &(term, replacement) in rules {
        let mut next = Vec::with_capacity(unclaimed.len());

        for (start, end) in unclaimed {
            let mut cursor = start;
            for (offset, _) in content[start..end].match_indices(term) {
                let position = start + offset;
                if position > cursor {
                    next.push((cursor, position));
                }
                cursor = position + term.len();
                previews.push(RedactionPreview {
                    term: term.to_string(),
                    replacement: replacement.to_string(),
                    position,
                    context: context_window(content, position, cursor, replacement, context_chars),
                });
            }
            if end > cursor {
                next.push((cursor, end));
            }
        }

        unclaimed = next;
    }

    previews.sort_by_key(|p| p.position);
    previews
}

fn context_window(
    content: &str,
    start: usize,
    end: usize,
    replacement: &str,
    context_chars: usize,
) -> String {
    let from = content[..start]
        .char_indices()
        .rev()
        .take(context_chars)
        .last()
        .map_or(start, |(i, _)| i);
    let to = content[end..]
        .char_indices()
        .nth(context_chars)
        .map_or(content.len(), |(i, _)| end + i);

    format!(
        "{}**{}**{}",
        &content[from..start],
        replacement,
        &content[end..to]
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positions_and_context() {
        let content = "user john.doe@example.com wrote to john.doe@example.com";
        let previews = preview(content, &[("john.doe@example.com", "[EMAIL]")], 5);

        assert_eq!(previews.len(), 2);
        assert_eq!(previews[0].position, 5);
        assert_eq!(previews[0].context, "user **[EMAIL]** wrot");
        assert_eq!(previews[1].position, 36);
        assert_eq!(previews[1].context, "e to **[EMAIL]**");
    }

    #[test]
    fn test_shorter_term_inside_longer_not_reported() {
        let content = "ACME-host and ACME";
        let previews = preview(content, &[("ACME-host", "[HOST]"), ("ACME", "[ORG]")], 3);

        let terms: Vec<_> = previews.iter().map(|p| p.term.as_str()).collect();
        assert_eq!(terms, vec!["ACME-host", "ACME"]);
        assert_eq!(previews[1].position, 14);
    }

    #[test]
    fn test_context_respects_char_boundaries() {
        let content = "äöü secret äöü";
        let previews = preview(content, &[("secret", "[S]")], 2);

        assert_eq!(previews.len(), 1);
        assert_eq!(previews[0].context, "ü **[S]** ä");
    }

    #[test]
    fn test_zero_context() {
        let previews = preview("a secret b", &[("secret", "[S]")], 0);
        assert_eq!(previews[0].context, "**[S]**");
    }
}
