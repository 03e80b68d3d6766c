

use serde::{Deserialize, Serialize};

/// Negation and exclusion markers. At equal positions the longer marker wins.
const NEGATION_MARKERS: &[&str] = &[
    "除了", "除去", "排除", "剔除", "去掉", "不包括", "不包含", "不算", "不含", "不要", "不看",
];

const CLAUSE_BOUNDARIES: &[char] = &['，', ',', '。', '.', '；', ';', '！', '!', '？', '?', '、', ' ', '\t', '\n'];

/// "除了X之外…": the frame word closes the excluded span.
const CLOSING_FRAMES: &[&str] = &["之外", "以外"];


#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Negation {
    pub marker: String,
    /// Span after the marker up to the next clause boundary.
    pub excluded: String,
}


pub fn detect_negations(text: &str) -> Vec<Negation> {
    let mut negations = Vec::new();
    let mut cursor = 0;

    while cursor < text.len() {
        let rest = &text[cursor..];
        let next = NEGATION_MARKERS
            .iter()
            .filter_map(|marker| rest.find(marker).map(|pos| (pos, *marker)))
            .min_by_key(|(pos, marker)| (*pos, std::cmp::Reverse(marker.len())));

        let Some((pos, marker)) = next else { break };

        let span_start = cursor + pos + marker.len();
        let tail = &text[span_start..];
        let span_len = tail.find(CLAUSE_BOUNDARIES).unwrap_or(tail.len());
        let mut excluded = tail[..span_len].trim();
        if let Some(end) = CLOSING_FRAMES.iter().filter_map(|f| excluded.find(f)).min() {
            excluded = excluded[..end].trim_end();
        }

        if !excluded.is_empty() {
            negations.push(Negation {
                marker: marker.to_string(),
                excluded: excluded.to_string(),
            });
        }

        cursor = span_start + span_len;
    }

    negations
}
