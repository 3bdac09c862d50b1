//! Article writing from a finished brief.
//!
//! - `outline` - pre-order flattening, titles, word counts
//! - `length` - expansion and trim thresholds
//! - `generator` - the streaming section loop
//! - `paragraph` - single-paragraph regeneration

pub mod generator;
pub mod length;
pub mod outline;
pub mod paragraph;

pub use generator::{ArticleEvent, ArticleFailure, ArticleGenerator, FAQ_HEADING};
pub use outline::{article_title, find_outline_item, flatten_outline, word_count};
pub use paragraph::{paragraph_context, regenerate_paragraph, splice_paragraph, ParagraphContext};
