//! Prompt text for brief steps, article sections and paragraph rewrites.

use crate::brief::BriefStep;
use crate::services::{BriefStepRequest, LengthCorrection, ParagraphRequest, SectionRequest};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

const BRIEF_SYSTEM: &str = "You are a senior SEO content strategist. You write precise, \
evidence-based content briefs grounded in what currently ranks. Reply with a single JSON \
object and nothing else.";

const WRITER_SYSTEM: &str = "You are an expert SEO copywriter. You write clear, specific, \
well-structured web content in markdown. Reply with the requested text only: no preamble, \
no closing remarks, no code fences.";

fn step_instructions(step: BriefStep) -> &'static str {
    match step {
        BriefStep::GoalAndAudience => "Define the goal of the page, who it is for and the dominant search intent behind the keywords.",
        BriefStep::KeywordStrategy => "Choose one primary keyword and the secondary and long-tail keywords to target. Only use keywords from the available keyword list, favouring volume and relevance.",
        BriefStep::CompetitiveAnalysis => "Assess the ranking competitors: for each, what makes it rank and where it falls short. Base every point on the competitor text provided.",
        BriefStep::ContentGaps => "Find topics, questions and angles the competitors miss or treat poorly, and explain why each gap matters to the audience.",
        BriefStep::Structure => "Design the article outline. Every heading gets concrete writing guidelines, the keywords it targets and which competitors cover it. Respect the template headings and word-count targets when given.",
        BriefStep::Faqs => "Write the FAQ section: real questions searchers ask, each with guidance on how to answer it. Prefer the People Also Ask questions when relevant.",
        BriefStep::OnPageSeo => "Write the on-page SEO elements: title tag (max 60 characters), meta description (max 155 characters), H1 and URL slug.",
    }
}

fn step_schema(step: BriefStep) -> &'static str {
    match step {
        BriefStep::GoalAndAudience => r#"{"goal_and_audience": {"page_goal": "...", "target_audience": "...", "search_intent": "..."}}"#,
        BriefStep::KeywordStrategy => r#"{"keyword_strategy": {"primary_keyword": "...", "secondary_keywords": ["..."], "long_tail_keywords": ["..."], "notes": "..."}}"#,
        BriefStep::CompetitiveAnalysis => r#"{"competitive_analysis": {"competitors": [{"url": "...", "strengths": ["..."], "weaknesses": ["..."]}], "summary": "..."}}"#,
        BriefStep::ContentGaps => r#"{"content_gaps": {"gaps": [{"topic": "...", "reasoning": "..."}], "opportunities": ["..."]}}"#,
        BriefStep::Structure => r#"{"article_structure": {"word_count_target": 1800, "outline": [{"heading": "...", "level": "H2", "guidelines": ["..."], "targeted_keywords": ["..."], "competitor_coverage": ["..."], "target_word_count": 300, "children": []}]}}"#,
        BriefStep::Faqs => r#"{"faqs": {"questions": [{"question": "...", "guidance": "..."}]}}"#,
        BriefStep::OnPageSeo => r#"{"on_page_seo": {"title_tag": "...", "meta_description": "...", "h1": "...", "url_slug": "..."}}"#,
    }
}

fn section(out: &mut String, title: &str, body: &str) {
    if body.trim().is_empty() {
        return;
    }
    out.push_str("## ");
    out.push_str(title);
    out.push_str("\n\n");
    out.push_str(body.trim());
    out.push_str("\n\n");
}

fn bullet_list(items: &[String]) -> String {
    items
        .iter()
        .map(|i| format!("- {}", i))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn brief_step_prompt(req: &BriefStepRequest) -> Prompt {
    let mut user = String::new();
    user.push_str(&format!("# {}\n\n", req.step));
    user.push_str(step_instructions(req.step));
    user.push_str(&format!("\n\nWrite in {}.\n\n", req.language));

    if let Some(context) = &req.context_text {
        section(&mut user, "Page context", context);
    } else {
        section(&mut user, "Subject", &req.subject_info);
        section(&mut user, "Brand", &req.brand_info);
    }

    if let Some(keywords) = &req.available_keywords {
        let list = keywords
            .iter()
            .map(|k| format!("- {} ({} searches/month)", k.keyword, k.volume))
            .collect::<Vec<_>>()
            .join("\n");
        section(&mut user, "Available keywords", &list);
    }

    let previous = serde_json::to_string_pretty(&req.previous_steps_data).unwrap_or_default();
    if previous != "{}" {
        section(&mut user, "Brief so far", &previous);
    }

    section(&mut user, "Competitors", &req.competitor_data_json);
    section(&mut user, "Top competitor content", &req.ground_truth_text);

    if let Some(headings) = &req.template_headings {
        section(&mut user, "Template headings to follow", &bullet_list(headings));
    }
    if let Some(constraints) = &req.length_constraints {
        let mut lines = Vec::new();
        if let Some(global) = constraints.global_target {
            lines.push(format!("Total article length: about {} words", global));
        }
        for (heading, words) in &constraints.section_targets {
            lines.push(format!("\"{}\": about {} words", heading, words));
        }
        if constraints.strict_mode {
            lines.push("Targets are strict.".to_string());
        }
        section(&mut user, "Length targets", &lines.join("\n"));
    }
    if let Some(questions) = &req.paa_questions {
        section(&mut user, "People Also Ask", &bullet_list(questions));
    }

    if let Some(feedback) = &req.user_feedback {
        let title = if req.is_regeneration {
            "Revise the previous version using this feedback"
        } else {
            "User feedback"
        };
        section(&mut user, title, feedback);
    }

    user.push_str("Reply with JSON of exactly this shape:\n\n");
    user.push_str(step_schema(req.step));
    user.push('\n');

    Prompt {
        system: BRIEF_SYSTEM.to_string(),
        user,
    }
}

pub fn section_prompt(req: &SectionRequest) -> Prompt {
    let mut user = String::new();
    let heading = &req.section.heading;

    match &req.correction {
        None => {
            user.push_str(&format!(
                "Write the body of section {} of {}: \"{}\". Do not repeat the heading.\n\n",
                req.current_section_index + 1,
                req.total_sections,
                heading
            ));
        }
        Some(LengthCorrection::Expand {
            current_body,
            current_words,
            shortfall,
            minimum_words,
        }) => {
            user.push_str(&format!(
                "The section \"{}\" is too short at {} words, {} short of its target. \
                 Rewrite it to at least {} words by adding depth, examples and specifics, \
                 never filler. Return the full rewritten body.\n\n",
                heading, current_words, shortfall, minimum_words
            ));
            section(&mut user, "Current body", current_body);
        }
        Some(LengthCorrection::Trim {
            current_body,
            current_words,
            target_words,
        }) => {
            user.push_str(&format!(
                "The section \"{}\" is too long at {} words. Tighten it to about {} words \
                 while keeping every key point. Return the full rewritten body.\n\n",
                heading, current_words, target_words
            ));
            section(&mut user, "Current body", current_body);
        }
    }

    user.push_str(&format!("Write in {}.\n\n", req.language));
    section(&mut user, "Guidelines", &bullet_list(&req.section.guidelines));
    section(
        &mut user,
        "Keywords to work in naturally",
        &req.section.targeted_keywords.join(", "),
    );

    let mut budget = Vec::new();
    if let Some(target) = req.section.target_word_count {
        budget.push(format!("This section: about {} words.", target));
    }
    if let Some(global) = req.global_word_target {
        budget.push(format!(
            "Whole article: about {} words, {} written so far.",
            global, req.words_written_so_far
        ));
    }
    if req.strict_mode {
        budget.push("Stay close to the targets.".to_string());
    }
    section(&mut user, "Length", &budget.join("\n"));

    if !req.upcoming_headings.is_empty() {
        section(
            &mut user,
            "Coming next (leave these topics for later)",
            &bullet_list(&req.upcoming_headings),
        );
    }

    let brief = serde_json::to_string_pretty(&req.brief).unwrap_or_default();
    section(&mut user, "Content brief", &brief);
    section(&mut user, "Article so far", &req.content_so_far);

    Prompt {
        system: WRITER_SYSTEM.to_string(),
        user,
    }
}

pub fn paragraph_prompt(req: &ParagraphRequest) -> Prompt {
    let mut user = String::new();
    user.push_str(&format!(
        "Rewrite the paragraph below following the feedback. Keep it consistent with the \
         surrounding text. Return exactly one paragraph in {}.\n\n",
        req.language
    ));
    section(&mut user, "Feedback", &req.feedback);
    section(&mut user, "Paragraph", &req.original_paragraph);
    if let Some(heading) = &req.section_heading {
        section(&mut user, "Section", heading);
    }
    section(
        &mut user,
        "Section guidelines",
        &bullet_list(&req.section_guidelines),
    );
    section(&mut user, "Text before", &req.context_before.join("\n\n"));
    section(&mut user, "Text after", &req.context_after.join("\n\n"));

    if let Some(primary) = req.brief.primary_keyword() {
        section(&mut user, "Primary keyword", primary);
    }

    Prompt {
        system: WRITER_SYSTEM.to_string(),
        user,
    }
}
