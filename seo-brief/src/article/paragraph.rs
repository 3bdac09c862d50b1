//! Rewrite a single paragraph of a finished article from user feedback.

use seo_brief_sdk::{log_agent_complete, log_agent_failed, log_agent_start};

use crate::article::outline::find_outline_item;
use crate::error::{BriefError, BriefResult};
use crate::services::{GenerationService, ParagraphRequest};
use crate::types::ContentBrief;

/// Non-empty, non-heading lines taken as context on each side
pub const CONTEXT_LINES: usize = 5;

/// What surrounds the paragraph being rewritten
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParagraphContext {
    pub original: String,
    pub before: Vec<String>,
    pub after: Vec<String>,
    pub heading: Option<String>,
    pub guidelines: Vec<String>,
}

fn is_heading(line: &str) -> bool {
    line.trim_start().starts_with('#')
}

fn is_body(line: &str) -> bool {
    !line.trim().is_empty() && !is_heading(line)
}

/// Gather the context of line `line_index` of `document`
pub fn paragraph_context(
    document: &str,
    line_index: usize,
    brief: &ContentBrief,
) -> BriefResult<ParagraphContext> {
    let lines: Vec<&str> = document.split('\n').collect();
    let target = lines.get(line_index).ok_or_else(|| {
        BriefError::Validation(format!(
            "line {} is outside the document ({} lines)",
            line_index,
            lines.len()
        ))
    })?;
    if !is_body(target) {
        return Err(BriefError::Validation(format!(
            "line {} is not a paragraph",
            line_index
        )));
    }

    let mut before: Vec<String> = lines[..line_index]
        .iter()
        .rev()
        .filter(|l| is_body(l))
        .take(CONTEXT_LINES)
        .map(|l| l.trim().to_string())
        .collect();
    before.reverse();

    let after = lines[line_index + 1..]
        .iter()
        .filter(|l| is_body(l))
        .take(CONTEXT_LINES)
        .map(|l| l.trim().to_string())
        .collect();

    let heading = lines[..line_index]
        .iter()
        .rev()
        .find(|l| is_heading(l))
        .map(|l| l.trim().trim_start_matches('#').trim().to_string())
        .filter(|h| !h.is_empty());

    let guidelines = heading
        .as_deref()
        .and_then(|h| find_outline_item(brief.outline(), h))
        .map(|item| item.guidelines.clone())
        .unwrap_or_default();

    Ok(ParagraphContext {
        original: target.trim().to_string(),
        before,
        after,
        heading,
        guidelines,
    })
}

/// Ask for one replacement paragraph for line `line_index`
pub async fn regenerate_paragraph(
    generator: &dyn GenerationService,
    brief: &ContentBrief,
    document: &str,
    line_index: usize,
    feedback: &str,
    language: &str,
) -> BriefResult<String> {
    if feedback.trim().is_empty() {
        return Err(BriefError::Validation("feedback is required".to_string()));
    }
    let ctx = paragraph_context(document, line_index, brief)?;
    let task_id = format!("paragraph_{}", line_index);
    log_agent_start!(&task_id, "Paragraph Editor", "Rewriting paragraph from feedback");

    let request = ParagraphRequest {
        brief: brief.clone(),
        original_paragraph: ctx.original,
        context_before: ctx.before,
        context_after: ctx.after,
        section_heading: ctx.heading,
        section_guidelines: ctx.guidelines,
        feedback: feedback.trim().to_string(),
        language: language.to_string(),
    };

    match generator.regenerate_paragraph(&request).await {
        Ok(text) => {
            log_agent_complete!(&task_id, "Paragraph Editor");
            Ok(text.trim().to_string())
        }
        Err(e) => {
            let err = BriefError::external("generation service", format!("paragraph: {:#}", e));
            log_agent_failed!(&task_id, "Paragraph Editor", &err);
            Err(err)
        }
    }
}

/// Replace line `line_index` with `replacement`. Out-of-range indexes leave
/// the document unchanged.
pub fn splice_paragraph(document: &str, line_index: usize, replacement: &str) -> String {
    let mut lines: Vec<&str> = document.split('\n').collect();
    if let Some(line) = lines.get_mut(line_index) {
        *line = replacement;
    }
    lines.join("\n")
}
