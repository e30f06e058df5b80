//! Fuzzy text matching for the collective-list bonus round (spec.md §4.5,
//! §9: "treat the fuzzy-match library as an external interface").
//!
//! Grounded on the earlier `Player` trait (`gameroom::player.rs`): a
//! thin `async_trait` seam plus one concrete in-process implementation,
//! the same shape earlier code used for swapping a human `Client` for a
//! scripted bot player.

use crate::model::bonus::collective_list::RuntimeListItem;
use async_trait::async_trait;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    Exact,
    Alias,
    Fuzzy,
    None,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct MatchResult {
    pub is_match: bool,
    pub matched_item_id: Option<String>,
    pub matched_display: Option<String>,
    pub already_guessed: bool,
    pub match_type: MatchType,
    pub confidence: f32,
}

impl MatchResult {
    fn none() -> Self {
        Self {
            is_match: false,
            matched_item_id: None,
            matched_display: None,
            already_guessed: false,
            match_type: MatchType::None,
            confidence: 0.0,
        }
    }
}

#[async_trait]
pub trait FuzzyMatcher: Send + Sync {
    async fn try_match(
        &self,
        text: &str,
        items: &[RuntimeListItem],
        guessed_ids: &HashSet<String>,
        threshold: f32,
    ) -> MatchResult;
}

/// Levenshtein-distance matcher. Tries an exact match first (case/space
/// insensitive), then aliases, then the closest display string by
/// normalized edit distance if it clears `threshold`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LevenshteinMatcher;

fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut row: Vec<usize> = (0..=b.len()).collect();
    for i in 1..=a.len() {
        let mut prev = row[0];
        row[0] = i;
        for j in 1..=b.len() {
            let cur = row[j];
            row[j] = if a[i - 1] == b[j - 1] {
                prev
            } else {
                1 + prev.min(row[j]).min(row[j - 1])
            };
            prev = cur;
        }
    }
    row[b.len()]
}

fn similarity(a: &str, b: &str) -> f32 {
    let max_len = a.chars().count().max(b.chars().count()).max(1);
    1.0 - (levenshtein(a, b) as f32 / max_len as f32)
}

#[async_trait]
impl FuzzyMatcher for LevenshteinMatcher {
    async fn try_match(
        &self,
        text: &str,
        items: &[RuntimeListItem],
        guessed_ids: &HashSet<String>,
        threshold: f32,
    ) -> MatchResult {
        let needle = normalize(text);
        if needle.is_empty() {
            return MatchResult::none();
        }

        for item in items {
            if normalize(&item.display) == needle {
                return Self::hit(item, guessed_ids, MatchType::Exact, 1.0);
            }
        }
        for item in items {
            if item.aliases.iter().any(|a| normalize(a) == needle) {
                return Self::hit(item, guessed_ids, MatchType::Alias, 1.0);
            }
        }

        let mut best: Option<(&RuntimeListItem, f32)> = None;
        for item in items {
            let score = similarity(&needle, &normalize(&item.display));
            if best.is_none_or(|(_, best_score)| score > best_score) {
                best = Some((item, score));
            }
        }
        match best {
            Some((item, score)) if score >= threshold => {
                Self::hit(item, guessed_ids, MatchType::Fuzzy, score)
            }
            _ => MatchResult::none(),
        }
    }
}

impl LevenshteinMatcher {
    fn hit(item: &RuntimeListItem, guessed_ids: &HashSet<String>, kind: MatchType, confidence: f32) -> MatchResult {
        MatchResult {
            is_match: true,
            matched_item_id: Some(item.id.clone()),
            matched_display: Some(item.display.clone()),
            already_guessed: guessed_ids.contains(&item.id),
            match_type: kind,
            confidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, display: &str, aliases: &[&str]) -> RuntimeListItem {
        RuntimeListItem {
            id: id.into(),
            display: display.into(),
            aliases: aliases.iter().map(|s| s.to_string()).collect(),
            group: None,
            guessed_by: None,
        }
    }

    #[tokio::test]
    async fn exact_match_wins_over_fuzzy() {
        let items = vec![item("1", "France", &[]), item("2", "Francia", &["frankreich"])];
        let result = LevenshteinMatcher.try_match("france", &items, &HashSet::new(), 0.6).await;
        assert!(result.is_match);
        assert_eq!(result.matched_item_id.as_deref(), Some("1"));
        assert_eq!(result.match_type, MatchType::Exact);
    }

    #[tokio::test]
    async fn alias_match_is_recognized() {
        let items = vec![item("1", "Germany", &["deutschland"])];
        let result = LevenshteinMatcher.try_match("Deutschland", &items, &HashSet::new(), 0.6).await;
        assert_eq!(result.match_type, MatchType::Alias);
    }

    #[tokio::test]
    async fn typo_within_threshold_is_fuzzy_matched() {
        let items = vec![item("1", "Portugal", &[])];
        let result = LevenshteinMatcher.try_match("portugual", &items, &HashSet::new(), 0.7).await;
        assert!(result.is_match);
        assert_eq!(result.match_type, MatchType::Fuzzy);
    }

    #[tokio::test]
    async fn below_threshold_is_no_match() {
        let items = vec![item("1", "Japan", &[])];
        let result = LevenshteinMatcher.try_match("xyz", &items, &HashSet::new(), 0.6).await;
        assert!(!result.is_match);
    }

    #[tokio::test]
    async fn flags_already_guessed_items() {
        let items = vec![item("1", "Spain", &[])];
        let mut guessed = HashSet::new();
        guessed.insert("1".to_string());
        let result = LevenshteinMatcher.try_match("Spain", &items, &guessed, 0.6).await;
        assert!(result.already_guessed);
    }
}
