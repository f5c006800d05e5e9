//! Concurrent pattern-matching engine.
//!
//! Two interchangeable matchers over arbitrary byte payloads:
//!
//! - [`RegexEngine`] — compiled-regex matching producing rich [`Match`]
//!   records (value, byte offsets, named and positional capture groups)
//! - [`literal::LiteralEngine`] — exact-literal multi-pattern automaton for
//!   fast presence checks with no match metadata
//!
//! The built-in secret-detection patterns live in [`patterns`].

pub mod literal;
pub mod patterns;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use regex::bytes::Regex;
use serde::Serialize;
use tokio::sync::RwLock;
use tokio::task::JoinSet;

use crate::error::Result;

/// A single pattern hit inside a response body.
///
/// One `Match` is produced per distinct matched substring per pattern per
/// payload; `value` is the (lossily decoded) text of
/// `body[index..index + length]`.
#[derive(Debug, Clone, Serialize)]
pub struct Match {
    /// Source text of the pattern that matched.
    pub pattern: String,
    /// Full matched text.
    pub value: String,
    /// Named capture groups that participated in the match, by group name.
    pub groups: HashMap<String, String>,
    /// Every non-empty capture in group order; index 0 is the whole match.
    pub group_values: Vec<String>,
    /// Byte offset of the match in the original payload.
    pub index: usize,
    /// Byte length of the match.
    pub length: usize,
}

/// Append-only set of compiled regex patterns shared by all matching calls.
///
/// A single reader/writer lock scopes the whole set: a full matching pass
/// counts as one logical read, so [`add_pattern`](Self::add_pattern) waits for
/// any in-flight scan to finish and can never mutate the set mid-scan.
pub struct RegexEngine {
    regexps: RwLock<Vec<Arc<Regex>>>,
}

impl RegexEngine {
    pub fn new() -> Self {
        Self {
            regexps: RwLock::new(Vec::new()),
        }
    }

    /// Compile `pattern` and append it to the set.
    ///
    /// A compile failure is returned to the caller and leaves every
    /// previously added pattern untouched.
    pub async fn add_pattern(&self, pattern: &str) -> Result<()> {
        let re = Regex::new(pattern)?;
        self.regexps.write().await.push(Arc::new(re));
        Ok(())
    }

    /// Number of successfully compiled patterns currently in the set.
    pub async fn pattern_count(&self) -> usize {
        self.regexps.read().await.len()
    }

    /// Run every pattern over `body` and collect all surviving matches.
    ///
    /// Each pattern searches as its own task against the shared body; all
    /// tasks are joined before the aggregate result is returned. Within one
    /// pattern, matches with identical text collapse into the first
    /// occurrence and empty matches are discarded.
    pub async fn match_all(&self, body: Arc<[u8]>) -> Vec<Match> {
        // Read guard held until return: the whole fan-out/join pass is one
        // logical read and pattern appends wait for it.
        let regexps = self.regexps.read().await;

        let mut tasks = JoinSet::new();
        for re in regexps.iter() {
            let re = Arc::clone(re);
            let body = Arc::clone(&body);
            tasks.spawn(async move { scan_pattern(&re, &body) });
        }

        let mut matches = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            if let Ok(mut results) = joined {
                matches.append(&mut results);
            }
        }
        matches
    }

    /// Convenience wrapper for string payloads.
    pub async fn match_all_str(&self, data: &str) -> Vec<Match> {
        self.match_all(Arc::from(data.as_bytes())).await
    }
}

impl Default for RegexEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Non-overlapping global search of one pattern over the payload.
fn scan_pattern(re: &Regex, body: &[u8]) -> Vec<Match> {
    let names: Vec<Option<&str>> = re.capture_names().collect();
    let mut seen: HashSet<Vec<u8>> = HashSet::new();
    let mut results = Vec::new();

    for caps in re.captures_iter(body) {
        let Some(whole) = caps.get(0) else { continue };
        if whole.is_empty() {
            continue;
        }
        // Dedup by matched text: a later match with the same text collapses
        // into the first occurrence.
        if !seen.insert(whole.as_bytes().to_vec()) {
            continue;
        }

        let mut groups = HashMap::new();
        let mut group_values = Vec::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            let Some(group) = caps.get(i) else { continue };
            if group.is_empty() {
                continue;
            }
            let text = String::from_utf8_lossy(group.as_bytes()).into_owned();
            if i > 0 {
                if let Some(name) = name {
                    groups.insert((*name).to_string(), text.clone());
                }
            }
            group_values.push(text);
        }

        results.push(Match {
            pattern: re.as_str().to_string(),
            value: String::from_utf8_lossy(whole.as_bytes()).into_owned(),
            groups,
            group_values,
            index: whole.start(),
            length: whole.len(),
        });
    }
    results
}
