//! HTTP adapters behind the service traits.
//!
//! - `dataforseo` - SERP rankings and on-page content
//! - `anthropic` - brief steps, streamed sections and paragraph rewrites
//! - `prompts` - prompt text
//! - `json` / `sse` - reply parsing

pub mod anthropic;
pub mod dataforseo;
pub mod json;
pub mod prompts;
pub mod sse;

pub use anthropic::AnthropicClient;
pub use dataforseo::DataForSeoClient;
