//! Maps a free-text query to a registered intent: exact alias first, then
//! fuzzy similarity against intent names.

use tracing::debug;

use crate::error::{IntentGrepError, Result};
use crate::registry::IntentRegistry;

/// Minimum similarity (0-100) for a fuzzy match to be accepted.
pub const DEFAULT_ACCEPT_THRESHOLD: f64 = 60.0;

const TOKEN_SORT_SCALE: f64 = 0.95;
const PARTIAL_SCALE: f64 = 0.9;
const LONG_PARTIAL_SCALE: f64 = 0.6;

/// Similarity between a query and a candidate, on a 0-100 scale.
#[cfg_attr(test, mockall::automock)]
pub trait SimilarityScorer {
    fn score(&self, query: &str, candidate: &str) -> f64;
}

/// Weighted blend of edit-distance ratios.
///
/// Takes the best of the plain ratio, the token-sort ratio and, when one
/// string is at least 1.5x longer, the best-window partial ratio. Each
/// fallback is scaled down so a full-string match always wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightedRatio;

impl WeightedRatio {
    /// Normalised Levenshtein similarity.
    pub fn ratio(a: &str, b: &str) -> f64 {
        let len_a = a.chars().count();
        let len_b = b.chars().count();
        let longest = len_a.max(len_b);
        if longest == 0 {
            return 100.0;
        }
        let distance = levenshtein::levenshtein(a, b);
        100.0 * (1.0 - distance as f64 / longest as f64)
    }

    /// Best ratio of the shorter string against every equally long window of
    /// the longer one.
    pub fn partial_ratio(a: &str, b: &str) -> f64 {
        let (short, long) = if a.chars().count() <= b.chars().count() {
            (a, b)
        } else {
            (b, a)
        };
        let long_chars: Vec<char> = long.chars().collect();
        let width = short.chars().count();
        if width == 0 {
            return 0.0;
        }

        let mut best: f64 = 0.0;
        for window in long_chars.windows(width) {
            let candidate: String = window.iter().collect();
            best = best.max(Self::ratio(short, &candidate));
            if best >= 100.0 {
                break;
            }
        }
        best
    }

    pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
        Self::ratio(&sorted_tokens(a), &sorted_tokens(b))
    }
}

fn sorted_tokens(text: &str) -> String {
    let mut tokens: Vec<&str> = text.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

impl SimilarityScorer for WeightedRatio {
    fn score(&self, query: &str, candidate: &str) -> f64 {
        let a = query.trim().to_lowercase();
        let b = candidate.trim().to_lowercase();
        let len_a = a.chars().count();
        let len_b = b.chars().count();
        if len_a == 0 || len_b == 0 {
            return 0.0;
        }

        let mut best = Self::ratio(&a, &b).max(Self::token_sort_ratio(&a, &b) * TOKEN_SORT_SCALE);

        let len_ratio = len_a.max(len_b) as f64 / len_a.min(len_b) as f64;
        if len_ratio >= 1.5 {
            let scale = if len_ratio < 8.0 {
                PARTIAL_SCALE
            } else {
                LONG_PARTIAL_SCALE
            };
            best = best.max(Self::partial_ratio(&a, &b) * scale);
        }
        best
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedVia {
    Alias,
    Name,
    Fuzzy { score: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub intent: String,
    pub via: ResolvedVia,
}

pub struct IntentResolver<'r, S = WeightedRatio> {
    registry: &'r IntentRegistry,
    scorer: S,
    threshold: f64,
}

impl<'r> IntentResolver<'r, WeightedRatio> {
    pub fn new(registry: &'r IntentRegistry) -> Self {
        Self::with_scorer(registry, WeightedRatio)
    }
}

impl<'r, S: SimilarityScorer> IntentResolver<'r, S> {
    pub fn with_scorer(registry: &'r IntentRegistry, scorer: S) -> Self {
        Self {
            registry,
            scorer,
            threshold: DEFAULT_ACCEPT_THRESHOLD,
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Highest scoring intent name. Ties go to the lexically first name.
    pub fn best_candidate(&self, query: &str) -> Option<(&'r str, f64)> {
        let mut best: Option<(&'r str, f64)> = None;
        for name in self.registry.all_intent_names() {
            let score = self.scorer.score(query, name);
            match best {
                Some((_, top)) if score <= top => {}
                _ => best = Some((name, score)),
            }
        }
        best
    }

    pub fn resolve(&self, query: &str) -> Result<Resolution> {
        let normalized = query.trim().to_lowercase();

        if let Some(intent) = self.registry.resolve_alias(&normalized) {
            debug!("Query {:?} matched alias of {:?}", query, intent);
            return Ok(Resolution {
                intent: intent.to_string(),
                via: ResolvedVia::Alias,
            });
        }

        if self.registry.contains(&normalized) {
            return Ok(Resolution {
                intent: normalized,
                via: ResolvedVia::Name,
            });
        }

        match self.best_candidate(&normalized) {
            Some((intent, score)) if score >= self.threshold => {
                debug!("Query {:?} fuzzy-matched {:?} (score {:.1})", query, intent, score);
                Ok(Resolution {
                    intent: intent.to_string(),
                    via: ResolvedVia::Fuzzy { score },
                })
            }
            best => {
                debug!("Query {:?} below threshold, best was {:?}", query, best);
                Err(IntentGrepError::IntentNotFound(query.to_string()))
            }
        }
    }
}
