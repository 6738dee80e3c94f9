//! Rewrites relative links between concepts into public absolute links.

use regex::Regex;
use seed_core::{Error, Result};

/// `[text](../Other/Other_itself.md)` and looser `../Other/....md` forms
/// become `[text](/concepts/Other_itself.md)`.
pub struct LinkRewriter {
    itself: Regex,
    relative: Regex,
}

const PUBLIC_LINK: &str = "[$1](/concepts/${2}_itself.md)";

impl LinkRewriter {
    pub fn new() -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| Error::Other(anyhow::anyhow!("Invalid link pattern: {}", e)))
        };

        Ok(Self {
            itself: compile(r"\[([^\]]+)\]\(\.\./([^/)]+)/[^/)]*_itself\.md\)")?,
            relative: compile(r"\[([^\]]+)\]\(\.\./([^/)]+)(?:/[^)]*)?\.md\)")?,
        })
    }

    pub fn rewrite(&self, content: &str) -> String {
        let content = self.itself.replace_all(content, PUBLIC_LINK);
        self.relative
            .replace_all(&content, PUBLIC_LINK)
            .into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rewrite(content: &str) -> String {
        LinkRewriter::new().unwrap().rewrite(content)
    }

    #[test]
    fn test_itself_link() {
        assert_eq!(
            rewrite("[Other](../Other_Concept/Other_Concept_itself.md)"),
            "[Other](/concepts/Other_Concept_itself.md)"
        );
    }

    #[test]
    fn test_plain_and_flat_links() {
        assert_eq!(
            rewrite("see [A](../A/A.md) and [B](../B.md)"),
            "see [A](/concepts/A_itself.md) and [B](/concepts/B_itself.md)"
        );
    }

    #[test]
    fn test_mixed_forms_in_one_document() {
        let content = "[X](../X/X_itself.md), [Y](../Y/notes/Y.md)";
        assert_eq!(
            rewrite(content),
            "[X](/concepts/X_itself.md), [Y](/concepts/Y_itself.md)"
        );
    }

    #[test]
    fn test_other_links_untouched() {
        let content = "[site](https://example.com/a.md) [local](./Foo.md) [img](../a/b.png)";
        assert_eq!(rewrite(content), content);
    }

    #[test]
    fn test_rewrite_is_stable() {
        let once = rewrite("[Other](../Other/Other_itself.md)");
        assert_eq!(rewrite(&once), once);
    }
}
