//! In-process sanctions list with fuzzy name matching

use crate::error::ComplianceResult;
use crate::ports::{SanctionsChecker, SanctionsHit};
use async_trait::async_trait;

/// Fixed list of sanctioned names.
///
/// Names are normalized (case, punctuation, whitespace) and compared with a
/// normalized Levenshtein similarity, so transliteration noise such as
/// "Jon Doe" vs "John Doe" still matches.
#[derive(Debug, Clone)]
pub struct StaticSanctionsList {
    entries: Vec<(String, String)>,
    threshold: f64,
}

impl StaticSanctionsList {
    pub fn new<I, S>(names: I, threshold: f64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entries = names
            .into_iter()
            .map(Into::into)
            .map(|name| {
                let normalized = normalize(&name);
                (name, normalized)
            })
            .filter(|(_, normalized)| !normalized.is_empty())
            .collect();
        Self { entries, threshold }
    }

    pub fn empty() -> Self {
        Self::new(Vec::<String>::new(), 1.0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Best-scoring listed name, regardless of threshold
    pub fn best_match(&self, name: &str) -> Option<SanctionsHit> {
        let candidate = normalize(name);
        if candidate.is_empty() {
            return None;
        }
        self.entries
            .iter()
            .map(|(listed, normalized)| (listed, similarity(&candidate, normalized)))
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(listed, similarity)| SanctionsHit {
                screened_name: name.to_string(),
                listed_name: listed.clone(),
                similarity,
            })
    }
}

#[async_trait]
impl SanctionsChecker for StaticSanctionsList {
    async fn check_name(&self, name: &str) -> ComplianceResult<Option<SanctionsHit>> {
        Ok(self
            .best_match(name)
            .filter(|hit| hit.similarity >= self.threshold))
    }
}

fn normalize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() { c.to_ascii_lowercase() } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// `1 - levenshtein(a, b) / max(len)`
fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let longest = a.len().max(b.len());
    if longest == 0 {
        return 1.0;
    }
    1.0 - levenshtein(&a, &b) as f64 / longest as f64
}

fn levenshtein(a: &[char], b: &[char]) -> usize {
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein() {
        let chars = |s: &str| s.chars().collect::<Vec<_>>();
        assert_eq!(levenshtein(&chars("kitten"), &chars("sitting")), 3);
        assert_eq!(levenshtein(&chars(""), &chars("abc")), 3);
        assert_eq!(levenshtein(&chars("same"), &chars("same")), 0);
    }

    #[test]
    fn test_normalization_ignores_case_and_punctuation() {
        assert_eq!(normalize("  Ivan  PETROV-Smith. "), "ivan petrov smith");
    }

    #[tokio::test]
    async fn test_fuzzy_match_above_threshold() {
        let list = StaticSanctionsList::new(["John Doe", "Acme Shell Holdings"], 0.85);

        let hit = list.check_name("JOHN DOE").await.unwrap().unwrap();
        assert_eq!(hit.listed_name, "John Doe");
        assert!((hit.similarity - 1.0).abs() < f64::EPSILON);

        // One dropped letter out of eight
        assert!(list.check_name("Jon Doe").await.unwrap().is_some());
        assert!(list.check_name("Jane Smith").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_empty_list_never_matches() {
        let list = StaticSanctionsList::empty();
        assert!(list.is_empty());
        assert!(list.check_name("Anyone").await.unwrap().is_none());
    }
}
