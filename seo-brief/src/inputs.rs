//! Parsing of user-supplied inputs: keyword lists, template headings and
//! reference URLs.

use reqwest::Url;

use crate::error::{BriefError, BriefResult};
use crate::types::Keyword;

/// Parse a keyword list, one `keyword<sep>volume` per line.
///
/// The separator is the first tab, else the first semicolon, else the first
/// comma; a missing volume means 0.
/// Blank lines, `#` comments and a `keyword,volume` style header row are
/// skipped. Thousands separators in the volume are accepted.
pub fn parse_keyword_list(text: &str) -> BriefResult<Vec<Keyword>> {
    let mut keywords = Vec::new();
    for (line_no, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (keyword, volume) = ['\t', ';', ',']
            .iter()
            .find_map(|sep| line.split_once(*sep))
            .map(|(k, v)| (k.trim(), v.trim()))
            .unwrap_or((line, ""));
        let keyword = keyword.trim_matches('"').trim();

        if line_no == 0 && keyword.eq_ignore_ascii_case("keyword") {
            continue;
        }
        if keyword.is_empty() {
            return Err(BriefError::Validation(format!(
                "line {}: keyword is empty",
                line_no + 1
            )));
        }

        let digits: String = volume.chars().filter(|c| !matches!(c, ',' | '_' | ' ' | '"')).collect();
        let volume = if digits.is_empty() {
            0
        } else {
            digits.parse::<u64>().map_err(|_| {
                BriefError::Validation(format!(
                    "line {}: invalid search volume {:?}",
                    line_no + 1,
                    volume
                ))
            })?
        };
        keywords.push(Keyword::new(keyword, volume));
    }
    Ok(keywords)
}

/// Heading texts of a markdown template, in document order
pub fn extract_template_headings(markdown: &str) -> Vec<String> {
    markdown
        .lines()
        .map(str::trim)
        .filter(|l| l.starts_with('#'))
        .map(|l| l.trim_start_matches('#').trim().to_string())
        .filter(|h| !h.is_empty())
        .collect()
}

/// Accept only absolute http(s) URLs
pub fn validate_url(raw: &str) -> BriefResult<Url> {
    let url = Url::parse(raw.trim())
        .map_err(|e| BriefError::Validation(format!("invalid URL {:?}: {}", raw, e)))?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Ok(url),
        _ => Err(BriefError::Validation(format!(
            "invalid URL {:?}: expected an http(s) address",
            raw
        ))),
    }
}
