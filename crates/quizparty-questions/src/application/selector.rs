//! Freshness-aware deck selection.

use std::sync::Arc;

use quizparty_core::rng::{DeterministicRng, shuffle};

use crate::domain::corpus::QuestionCorpus;
use crate::domain::history::UsageHistory;
use crate::domain::question::Question;

/// Tuning for [`select_fresh`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectorConfig {
    /// Below `max(count, min_pool)` fresh candidates the history is compacted.
    pub min_pool: usize,
    /// How many of the most recent ids survive a compaction.
    pub retained_after_compaction: usize,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            min_pool: 20,
            retained_after_compaction: 50,
        }
    }
}

/// Outcome of a selection.
#[derive(Debug, Clone)]
pub struct FreshSelection {
    /// Selected questions in play order. Shorter than requested only when
    /// the corpus itself is too small.
    pub questions: Vec<Arc<Question>>,
    /// Whether the history had to be compacted to find enough candidates.
    pub compacted: bool,
}

/// Picks `count` questions that do not appear in `history`.
///
/// When fewer than `max(count, min_pool)` candidates remain, the history is
/// cut down to its most recent tail and the candidates recomputed. The
/// candidates are shuffled uniformly and the first `count` returned.
pub fn select_fresh(
    corpus: &QuestionCorpus,
    history: &mut UsageHistory,
    count: usize,
    config: SelectorConfig,
    rng: &mut dyn DeterministicRng,
) -> FreshSelection {
    let mut candidates = corpus.excluding(&history.id_set());
    let mut compacted = false;

    if candidates.len() < count.max(config.min_pool) {
        compacted = history.retain_recent(config.retained_after_compaction);
        if compacted {
            candidates = corpus.excluding(&history.id_set());
        }
    }

    // Still short after compaction: top up from recently used questions,
    // oldest first, so a small corpus can still fill the deck.
    if candidates.len() < count {
        let mut recent: Vec<Arc<Question>> = history
            .ids()
            .filter_map(|id| corpus.get(id).cloned())
            .collect();
        shuffle(&mut candidates, rng);
        recent.truncate(count - candidates.len());
        candidates.extend(recent);
        return FreshSelection {
            questions: candidates,
            compacted,
        };
    }

    shuffle(&mut candidates, rng);
    candidates.truncate(count);

    FreshSelection {
        questions: candidates,
        compacted,
    }
}
