//! Section-by-section article generation under a word budget.
//!
//! Headings are written as soon as a section starts and streamed body text
//! is appended chunk by chunk, so the document is always readable while the
//! run is in progress. A section that misses its target gets at most one
//! expansion pass and then at most one trim pass.

use std::sync::Arc;

use futures::StreamExt;
use seo_brief_sdk::{
    log_agent_message, log_phase_complete, log_phase_failed, log_phase_start, log_task_complete,
    log_task_progress, log_task_start,
};
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;

use crate::article::length;
use crate::article::outline::{article_title, flatten_outline, word_count};
use crate::cancel::{run_cancellable, CancellationToken};
use crate::error::BriefError;
use crate::services::{GenerationService, SectionRequest};
use crate::types::{ContentBrief, GeneratedArticle, HeadingLevel, Keyword, LengthConstraints, OutlineItem};

const ARTICLE_PHASE: usize = 8;
const TOTAL_PHASES: usize = 9;

const WRITER_NAME: &str = "Section Writer";

pub const FAQ_HEADING: &str = "Frequently Asked Questions";

/// Live progress of an article run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArticleEvent {
    SectionStarted {
        index: usize,
        total: usize,
        heading: String,
    },
    /// Text appended to the document
    Chunk(String),
    /// A correction pass replaced the body of the current section
    SectionRewritten {
        index: usize,
        words: usize,
    },
    SectionFinished {
        index: usize,
        words: usize,
    },
}

/// An article run that stopped early. `partial` holds everything written
/// up to the failure.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct ArticleFailure {
    pub error: BriefError,
    pub partial: GeneratedArticle,
}

struct SectionJob<'a> {
    item: OutlineItem,
    index: usize,
    total: usize,
    upcoming: Vec<String>,
    brief: &'a ContentBrief,
    constraints: &'a LengthConstraints,
    language: &'a str,
}

pub struct ArticleGenerator {
    generator: Arc<dyn GenerationService>,
    events: Option<UnboundedSender<ArticleEvent>>,
}

impl ArticleGenerator {
    pub fn new(generator: Arc<dyn GenerationService>) -> Self {
        Self {
            generator,
            events: None,
        }
    }

    /// Send progress events to `events` as the run goes
    pub fn with_events(mut self, events: UnboundedSender<ArticleEvent>) -> Self {
        self.events = Some(events);
        self
    }

    fn notify(&self, event: ArticleEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }

    /// Write the whole article for `brief`
    pub async fn generate_article(
        &self,
        brief: &ContentBrief,
        keywords: &[Keyword],
        constraints: &LengthConstraints,
        language: &str,
        cancel: &CancellationToken,
    ) -> Result<GeneratedArticle, ArticleFailure> {
        let mut article = GeneratedArticle {
            title: article_title(brief, keywords),
            content: String::new(),
        };

        log_phase_start!(ARTICLE_PHASE, "Article Generation", TOTAL_PHASES);
        match self
            .run(brief, constraints, language, cancel, &mut article)
            .await
        {
            Ok(()) => {
                log_phase_complete!(ARTICLE_PHASE, "Article Generation");
                Ok(article)
            }
            Err(error) => {
                log_phase_failed!(ARTICLE_PHASE, "Article Generation", &error);
                Err(ArticleFailure {
                    error,
                    partial: article,
                })
            }
        }
    }

    async fn run(
        &self,
        brief: &ContentBrief,
        constraints: &LengthConstraints,
        language: &str,
        cancel: &CancellationToken,
        article: &mut GeneratedArticle,
    ) -> Result<(), BriefError> {
        let sections = flatten_outline(brief.outline());
        let faqs = brief
            .faqs
            .as_ref()
            .map(|f| f.questions.as_slice())
            .unwrap_or(&[]);
        let total = sections.len() + faqs.len();

        let all_headings: Vec<&str> = sections
            .iter()
            .map(|s| s.heading.as_str())
            .chain(faqs.iter().map(|f| f.question.as_str()))
            .collect();
        let upcoming_after = |index: usize| -> Vec<String> {
            all_headings
                .iter()
                .skip(index + 1)
                .take(3)
                .map(|h| h.to_string())
                .collect()
        };

        for (index, item) in sections.iter().enumerate() {
            let mut item = OutlineItem {
                children: Vec::new(),
                ..(*item).clone()
            };
            item.target_word_count = item
                .target_word_count
                .or_else(|| constraints.section_targets.get(&item.heading).copied())
                .filter(|t| *t > 0);

            let job = SectionJob {
                item,
                index,
                total,
                upcoming: upcoming_after(index),
                brief,
                constraints,
                language,
            };
            self.write_section(job, cancel, &mut article.content).await?;
        }

        if !faqs.is_empty() {
            push_block(&mut article.content, &HeadingLevel::H2.markdown(FAQ_HEADING));
            for (offset, faq) in faqs.iter().enumerate() {
                let index = sections.len() + offset;
                // Spread what is left of the budget evenly over the remaining questions.
                let per_item = constraints.global_target.map(|global| {
                    let remaining = (global as usize).saturating_sub(word_count(&article.content));
                    (remaining / (faqs.len() - offset)) as u32
                });

                let mut item = OutlineItem::new(faq.question.clone(), HeadingLevel::H3);
                if !faq.guidance.trim().is_empty() {
                    item.guidelines.push(faq.guidance.clone());
                }
                item.target_word_count = per_item.filter(|t| *t > 0);

                let job = SectionJob {
                    item,
                    index,
                    total,
                    upcoming: upcoming_after(index),
                    brief,
                    constraints,
                    language,
                };
                self.write_section(job, cancel, &mut article.content).await?;
            }
        }

        Ok(())
    }

    async fn write_section(
        &self,
        job: SectionJob<'_>,
        cancel: &CancellationToken,
        content: &mut String,
    ) -> Result<(), BriefError> {
        if cancel.is_cancelled() {
            return Err(BriefError::Cancelled);
        }

        let task_id = format!("section_{}", job.index + 1);
        log_task_start!(ARTICLE_PHASE, &task_id, &job.item.heading, job.total);
        self.notify(ArticleEvent::SectionStarted {
            index: job.index,
            total: job.total,
            heading: job.item.heading.clone(),
        });

        let words_written_so_far = word_count(content);
        let heading = job.item.level.markdown(&job.item.heading);
        push_block(content, &heading);
        self.notify(ArticleEvent::Chunk(format!("{}\n\n", heading)));
        let body_start = content.len();

        let mut request = SectionRequest {
            brief: job.brief.clone(),
            content_so_far: content.clone(),
            section: job.item.clone(),
            upcoming_headings: job.upcoming.clone(),
            language: job.language.to_string(),
            global_word_target: job.constraints.global_target,
            words_written_so_far,
            total_sections: job.total,
            current_section_index: job.index,
            strict_mode: job.constraints.strict_mode,
            correction: None,
        };

        let mut stream = run_cancellable(cancel, self.generator.generate_section(&request))
            .await?
            .map_err(|e| section_error(&job.item.heading, e))?;
        while let Some(chunk) = run_cancellable(cancel, stream.next()).await? {
            let chunk = chunk.map_err(|e| section_error(&job.item.heading, e))?;
            log_agent_message!(&task_id, WRITER_NAME, &chunk);
            content.push_str(&chunk);
            self.notify(ArticleEvent::Chunk(chunk));
        }
        let mut body = content[body_start..].trim().to_string();

        if let Some(target) = job.item.target_word_count {
            let words = word_count(&body);
            if length::needs_expansion(words, target) {
                log_task_progress!(
                    &task_id,
                    format!("{} of {} words, expanding", words, target)
                );
                request.correction = Some(length::expansion(&body, words, target));
                body = self.rewrite(&request, cancel, &job.item.heading).await?;
                replace_body(content, body_start, &body);
                self.notify(ArticleEvent::SectionRewritten {
                    index: job.index,
                    words: word_count(&body),
                });
            }

            let words = word_count(&body);
            if length::needs_trim(words, target, job.constraints.strict_mode) {
                log_task_progress!(
                    &task_id,
                    format!("{} of {} words, trimming", words, target)
                );
                request.correction = Some(length::trim(&body, words, target));
                body = self.rewrite(&request, cancel, &job.item.heading).await?;
                replace_body(content, body_start, &body);
                self.notify(ArticleEvent::SectionRewritten {
                    index: job.index,
                    words: word_count(&body),
                });
            }
        }

        replace_body(content, body_start, &body);
        content.push_str("\n\n");

        let words = word_count(&body);
        log_task_complete!(&task_id, format!("{} words", words));
        self.notify(ArticleEvent::SectionFinished {
            index: job.index,
            words,
        });
        Ok(())
    }

    /// Run a correction request to completion and return the new body
    async fn rewrite(
        &self,
        request: &SectionRequest,
        cancel: &CancellationToken,
        heading: &str,
    ) -> Result<String, BriefError> {
        let mut stream = run_cancellable(cancel, self.generator.generate_section(request))
            .await?
            .map_err(|e| section_error(heading, e))?;
        let mut body = String::new();
        while let Some(chunk) = run_cancellable(cancel, stream.next()).await? {
            body.push_str(&chunk.map_err(|e| section_error(heading, e))?);
        }
        Ok(body.trim().to_string())
    }
}

fn section_error(heading: &str, err: anyhow::Error) -> BriefError {
    BriefError::external("generation service", format!("section \"{}\": {:#}", heading, err))
}

/// Append a block followed by a blank line
fn push_block(content: &mut String, block: &str) {
    content.push_str(block);
    content.push_str("\n\n");
}

fn replace_body(content: &mut String, body_start: usize, body: &str) {
    content.truncate(body_start);
    content.push_str(body);
}
