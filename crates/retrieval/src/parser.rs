//! Raw chunk parsing.
//!
//! The backend's `raw` list holds strings shaped like
//! `"Score: 0.6172 | Text: actual content..."`. Parsing never fails the
//! caller: anything that does not fit degrades to score `0.0` with the whole
//! (trimmed) string as text.

use std::sync::LazyLock;

use ragbridge_core::ParsedChunk;
use regex_lite::Regex;
use thiserror::Error;
use tracing::warn;

static CHUNK_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^Score:\s*([\d.]+)\s*\|\s*Text:\s*(.*)").expect("static chunk pattern")
});

/// Why a raw chunk could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChunkParseError {
    #[error("invalid score {0:?}")]
    InvalidScore(String),
}

/// Parse a raw chunk, falling back to `{0.0, trimmed input}` on any problem.
pub fn parse_raw_chunk(raw: &str) -> ParsedChunk {
    match try_parse_raw_chunk(raw) {
        Ok(chunk) => chunk,
        Err(e) => {
            warn!(error = %e, "Error parsing raw chunk");
            fallback(raw)
        }
    }
}

/// Strict variant: a string without the markers is still `Ok` (whole text,
/// score 0.0), but a marker with an unparsable score is an error.
pub fn try_parse_raw_chunk(raw: &str) -> Result<ParsedChunk, ChunkParseError> {
    let Some(caps) = CHUNK_PATTERN.captures(raw) else {
        return Ok(fallback(raw));
    };

    let score_str = &caps[1];
    let score = score_str
        .parse::<f64>()
        .map_err(|_| ChunkParseError::InvalidScore(score_str.to_string()))?;

    Ok(ParsedChunk {
        score,
        text: caps[2].trim().to_string(),
    })
}

fn fallback(raw: &str) -> ParsedChunk {
    ParsedChunk {
        score: 0.0,
        text: raw.trim().to_string(),
    }
}
