//! Exact-literal multi-pattern matcher.
//!
//! Holds an ordered list of literal patterns plus a derived Aho-Corasick
//! automaton. The automaton is rebuilt in full on every addition — an accepted
//! cost, since literal sets are small and assembled once at startup — and a
//! single scan of the payload reports which literals are present. Use this
//! over [`super::RegexEngine`] when only presence of known tokens matters.

use aho_corasick::AhoCorasick;
use std::sync::{PoisonError, RwLock};

use crate::error::Result;

#[derive(Default)]
struct LiteralSet {
    patterns: Vec<String>,
    automaton: Option<AhoCorasick>,
}

/// Multi-literal presence matcher over byte payloads.
pub struct LiteralEngine {
    inner: RwLock<LiteralSet>,
}

impl LiteralEngine {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(LiteralSet::default()),
        }
    }

    /// Append a literal pattern and rebuild the automaton from the full list.
    pub fn add_string_pattern(&self, pattern: &str) -> Result<()> {
        let mut set = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        set.patterns.push(pattern.to_string());
        match AhoCorasick::new(&set.patterns) {
            Ok(automaton) => {
                set.automaton = Some(automaton);
                Ok(())
            }
            Err(e) => {
                set.patterns.pop();
                Err(e.into())
            }
        }
    }

    /// Number of literal patterns in the set.
    pub fn pattern_count(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .patterns
            .len()
    }

    /// Scan `data` once and return the distinct literal patterns present,
    /// in first-hit order. Repeated occurrences collapse naturally.
    pub fn match_all_strings(&self, data: &[u8]) -> Vec<String> {
        let set = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let Some(automaton) = &set.automaton else {
            return Vec::new();
        };

        let mut hit = vec![false; set.patterns.len()];
        let mut results = Vec::new();
        // overlapping search so literals nested inside other literals still report
        for mat in automaton.find_overlapping_iter(data) {
            let idx = mat.pattern().as_usize();
            if !hit[idx] {
                hit[idx] = true;
                results.push(set.patterns[idx].clone());
            }
        }
        results
    }
}

impl Default for LiteralEngine {
    fn default() -> Self {
        Self::new()
    }
}
