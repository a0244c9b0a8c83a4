use std::{collections::HashSet, sync::Arc};

use futures::future::join_all;

use crate::{
    error::{AppError, AppResult},
    models::PageFetch,
    scrape::page::MemberPageSource,
};

/// Consecutive rounds allowed to produce no new usernames before the
/// source is declared exhausted.
const MAX_EMPTY_ROUNDS: usize = 3;

/// Discovers popular usernames by walking the members listing in rounds.
///
/// Each round fetches `pages_per_round` consecutive pages concurrently and
/// folds the usernames into a set; discovery stops as soon as the set
/// reaches the target. The set is truncated to exactly the target count, so
/// which names survive an overshoot is decided by set iteration order, not
/// rank. Rounds are capped: an exhausted source surfaces as
/// [`AppError::SourceExhausted`] instead of polling forever.
pub struct MemberDiscoverer {
    source: Arc<dyn MemberPageSource>,
    pages_per_round: usize,
    max_rounds: usize,
}

impl MemberDiscoverer {
    pub fn new(source: Arc<dyn MemberPageSource>, pages_per_round: usize, max_rounds: usize) -> Self {
        Self {
            source,
            pages_per_round: pages_per_round.max(1),
            max_rounds: max_rounds.max(1),
        }
    }

    /// Accumulates usernames until `target` unique names are found.
    pub async fn discover(&self, target: usize) -> AppResult<Vec<String>> {
        if target == 0 {
            return Ok(Vec::new());
        }

        let mut found: HashSet<String> = HashSet::new();
        let mut cursor: u32 = 1;
        let mut empty_rounds = 0usize;

        for round in 0..self.max_rounds {
            let pages = cursor..cursor + self.pages_per_round as u32;
            let fetches = pages.map(|page| {
                let source = Arc::clone(&self.source);
                async move { source.fetch_members_page(page).await }
            });

            let before = found.len();
            for outcome in join_all(fetches).await {
                if let PageFetch::Records(usernames) = outcome {
                    found.extend(usernames);
                }
            }

            tracing::debug!(
                round,
                cursor,
                found = found.len(),
                target,
                "Member discovery round finished"
            );

            if found.len() >= target {
                let selected: Vec<String> = found.into_iter().take(target).collect();
                tracing::info!(count = selected.len(), "Member discovery complete");
                return Ok(selected);
            }

            if found.len() == before {
                empty_rounds += 1;
                if empty_rounds >= MAX_EMPTY_ROUNDS {
                    break;
                }
            } else {
                empty_rounds = 0;
            }

            cursor += self.pages_per_round as u32;
        }

        tracing::warn!(
            found = found.len(),
            target,
            "Member source exhausted before reaching target"
        );
        Err(AppError::SourceExhausted {
            found: found.len(),
            target,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    /// 37 unique usernames spread over four pages, with one page of overlap;
    /// every later page is empty.
    struct ThirtySevenMembers;

    #[async_trait]
    impl MemberPageSource for ThirtySevenMembers {
        async fn fetch_members_page(&self, page: u32) -> PageFetch<String> {
            let names: Vec<String> = match page {
                1 => (0..10).map(|i| format!("user{i}")).collect(),
                2 => (10..20).map(|i| format!("user{i}")).collect(),
                // page 3 repeats half of page 2 before adding new names
                3 => (15..30).map(|i| format!("user{i}")).collect(),
                4 => (30..37).map(|i| format!("user{i}")).collect(),
                _ => return PageFetch::Empty,
            };
            PageFetch::Records(names)
        }
    }

    fn discoverer() -> MemberDiscoverer {
        MemberDiscoverer::new(Arc::new(ThirtySevenMembers), 5, 50)
    }

    #[tokio::test]
    async fn test_target_below_available_returns_exactly_target() {
        let usernames = discoverer().discover(20).await.unwrap();

        assert_eq!(usernames.len(), 20);
        let unique: HashSet<&String> = usernames.iter().collect();
        assert_eq!(unique.len(), 20);
    }

    #[tokio::test]
    async fn test_target_equal_to_available_terminates() {
        let usernames = discoverer().discover(37).await.unwrap();

        assert_eq!(usernames.len(), 37);
        let unique: HashSet<&String> = usernames.iter().collect();
        assert_eq!(unique.len(), 37);
    }

    #[tokio::test]
    async fn test_target_above_available_surfaces_exhaustion() {
        let result = discoverer().discover(50).await;

        match result {
            Err(AppError::SourceExhausted { found, target }) => {
                assert_eq!(found, 37);
                assert_eq!(target, 50);
            }
            other => panic!("expected SourceExhausted, got {:?}", other.map(|v| v.len())),
        }
    }

    #[tokio::test]
    async fn test_failed_pages_are_skipped_not_fatal() {
        struct FlakyMembers;

        #[async_trait]
        impl MemberPageSource for FlakyMembers {
            async fn fetch_members_page(&self, page: u32) -> PageFetch<String> {
                match page {
                    1 => PageFetch::Failed(crate::models::FetchFailure::Timeout),
                    2 => PageFetch::Records(vec!["solo".to_string()]),
                    _ => PageFetch::Empty,
                }
            }
        }

        let discoverer = MemberDiscoverer::new(Arc::new(FlakyMembers), 5, 50);
        let usernames = discoverer.discover(1).await.unwrap();
        assert_eq!(usernames, vec!["solo"]);
    }

    #[tokio::test]
    async fn test_zero_target_short_circuits() {
        let usernames = discoverer().discover(0).await.unwrap();
        assert!(usernames.is_empty());
    }
}
