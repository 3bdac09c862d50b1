//! CLI argument definitions.

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// SEO content briefs from live SERP data
///
/// A session goes through three stages:
///
/// - `analyze`: fetch rankings for the keywords and score competitors
/// - `brief`: generate the seven brief steps, one at a time or on autopilot
/// - `article`: write the article section by section from the finished brief
#[derive(Parser, Debug, Clone)]
#[command(name = "seo-brief")]
#[command(about = "Competitor-grounded SEO content briefs and articles")]
#[command(version)]
pub struct Args {
    /// Session database path (defaults to SEO_BRIEF_DB, then the platform data dir)
    #[arg(long, value_name = "PATH", global = true)]
    pub db: Option<PathBuf>,

    /// Print machine-readable progress events on stderr
    #[arg(long, global = true)]
    pub emit_events: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create a session and run the competitor analysis
    Analyze(AnalyzeArgs),

    /// Generate the next brief step (or all remaining steps with --autopilot)
    Brief {
        session: String,

        /// Keep going until every step is done
        #[arg(long)]
        autopilot: bool,
    },

    /// Regenerate one brief step, optionally with feedback
    Regenerate {
        session: String,

        /// Step number, 1-7
        step: u8,

        /// What to change. Without it, feedback saved for the step is used.
        #[arg(long)]
        feedback: Option<String>,
    },

    /// Save feedback for a step without regenerating it
    Feedback {
        session: String,
        step: u8,
        text: String,
    },

    /// Star or unstar a competitor for the ground-truth set
    Star { session: String, url: String },

    /// Write the article from the finished brief
    Article {
        session: String,

        /// Also write the markdown to this file
        #[arg(long, value_name = "PATH")]
        output: Option<PathBuf>,
    },

    /// Rewrite one paragraph of the article
    Paragraph {
        session: String,

        /// Zero-based line index in the article markdown
        line: usize,

        #[arg(long)]
        feedback: String,

        /// Store the rewritten paragraph in the session
        #[arg(long)]
        apply: bool,
    },

    /// Print a session's brief, competitors or article
    Show {
        session: String,

        #[arg(long, value_enum, default_value_t = ShowFormat::Yaml)]
        format: ShowFormat,
    },

    /// List sessions, or delete one
    Sessions {
        #[arg(long, value_name = "ID")]
        delete: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ShowFormat {
    /// Brief as YAML
    Yaml,
    /// Whole session as JSON
    Json,
    /// Competitor table
    Competitors,
    /// Article markdown
    Article,
    /// Stored activity lines
    Activity,
}

#[derive(clap::Args, Debug, Clone)]
pub struct AnalyzeArgs {
    /// Session name
    #[arg(long)]
    pub name: String,

    /// Keyword list file: one `keyword<TAB|;|,>volume` per line
    #[arg(long, value_name = "PATH")]
    pub keywords_file: Option<PathBuf>,

    /// A keyword, optionally with volume (`"trail shoes,900"`). Repeatable.
    #[arg(short, long = "keyword")]
    pub keywords: Vec<String>,

    #[arg(long, default_value = "United States")]
    pub country: String,

    /// SERP language code
    #[arg(long, default_value = "en")]
    pub language: String,

    /// Language the brief and article are written in
    #[arg(long, default_value = "English")]
    pub output_language: String,

    /// What the page is about
    #[arg(long, default_value = "")]
    pub subject: String,

    /// Brand voice and positioning
    #[arg(long, default_value = "")]
    pub brand: String,

    /// Plain-text reference document
    #[arg(long, value_name = "PATH")]
    pub context_file: Option<PathBuf>,

    /// Reference URL. Repeatable.
    #[arg(long = "reference-url")]
    pub reference_urls: Vec<String>,

    /// Markdown template whose headings steer the outline
    #[arg(long, value_name = "PATH")]
    pub template: Option<PathBuf>,

    /// Target length of the whole article in words
    #[arg(long)]
    pub word_target: Option<u32>,

    /// Per-section target, `"Heading=300"`. Repeatable.
    #[arg(long = "section-target", value_name = "HEADING=WORDS")]
    pub section_targets: Vec<String>,

    /// Trim sections above 120% of their target instead of 150%
    #[arg(long)]
    pub strict: bool,

    /// Generate brief step 1 right after the analysis
    #[arg(long)]
    pub start_brief: bool,
}

impl AnalyzeArgs {
    pub fn validate(&self) -> Result<()> {
        if self.keywords_file.is_none() && self.keywords.is_empty() {
            anyhow::bail!("Provide keywords with --keyword or --keywords-file");
        }
        Ok(())
    }

    /// Parse `--section-target` values
    pub fn section_target_map(&self) -> Result<Vec<(String, u32)>> {
        self.section_targets
            .iter()
            .map(|raw| {
                let (heading, words) = raw
                    .rsplit_once('=')
                    .ok_or_else(|| anyhow::anyhow!("Invalid section target '{}': expected HEADING=WORDS", raw))?;
                let words = words
                    .trim()
                    .parse::<u32>()
                    .map_err(|_| anyhow::anyhow!("Invalid word count in section target '{}'", raw))?;
                Ok((heading.trim().to_string(), words))
            })
            .collect()
    }
}
