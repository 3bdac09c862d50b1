//! Outline traversal and word counting.

use crate::types::{ContentBrief, Keyword, OutlineItem};

/// Words in `text`: whitespace-separated, non-empty tokens
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Pre-order flattening of the outline tree
pub fn flatten_outline(outline: &[OutlineItem]) -> Vec<&OutlineItem> {
    fn walk<'a>(items: &'a [OutlineItem], out: &mut Vec<&'a OutlineItem>) {
        for item in items {
            out.push(item);
            walk(&item.children, out);
        }
    }
    let mut out = Vec::new();
    walk(outline, &mut out);
    out
}

/// On-page H1, else the primary keyword, else the first target keyword
pub fn article_title(brief: &ContentBrief, keywords: &[Keyword]) -> String {
    brief
        .on_page_seo
        .as_ref()
        .map(|seo| seo.h1.trim())
        .filter(|h1| !h1.is_empty())
        .or_else(|| brief.primary_keyword())
        .or_else(|| keywords.first().map(|k| k.keyword.trim()))
        .unwrap_or("Untitled article")
        .to_string()
}

/// First outline item (pre-order) whose heading contains, or is contained
/// in, `heading`, ignoring case
pub fn find_outline_item<'a>(outline: &'a [OutlineItem], heading: &str) -> Option<&'a OutlineItem> {
    let needle = heading.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }
    flatten_outline(outline).into_iter().find(|item| {
        let candidate = item.heading.trim().to_lowercase();
        !candidate.is_empty() && (candidate.contains(&needle) || needle.contains(&candidate))
    })
}
