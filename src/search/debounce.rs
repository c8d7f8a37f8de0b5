use log::debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::AbortHandle;

use super::{RecipeSearch, SearchFilters};
use crate::error::CookmateError;
use crate::model::Recipe;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Results(Vec<Recipe>),
    /// A newer search was issued before this one completed
    Superseded,
}

/// Search-as-you-type on top of any [`RecipeSearch`].
///
/// Each call waits for the debounce delay and only queries the backend if no
/// newer call was made in the meantime. Starting a request aborts the one
/// still in flight, so only the latest query can produce results.
pub struct DebouncedSearch {
    inner: Arc<dyn RecipeSearch>,
    delay: Duration,
    generation: AtomicU64,
    in_flight: Mutex<Option<AbortHandle>>,
}

impl DebouncedSearch {
    pub fn new(inner: Arc<dyn RecipeSearch>, delay: Duration) -> Self {
        DebouncedSearch {
            inner,
            delay,
            generation: AtomicU64::new(0),
            in_flight: Mutex::new(None),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Search without debouncing
    pub async fn search_now(
        &self,
        query: &str,
        filters: &SearchFilters,
    ) -> Result<Vec<Recipe>, CookmateError> {
        self.inner.search(query, filters).await
    }

    pub async fn search(
        &self,
        query: &str,
        filters: &SearchFilters,
    ) -> Result<SearchOutcome, CookmateError> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        if query.trim().is_empty() {
            self.abort_in_flight();
            return Ok(SearchOutcome::Results(Vec::new()));
        }

        tokio::time::sleep(self.delay).await;
        if self.is_stale(generation) {
            debug!("Search for '{}' superseded before sending", query);
            return Ok(SearchOutcome::Superseded);
        }

        let inner = Arc::clone(&self.inner);
        let owned_query = query.to_string();
        let owned_filters = filters.clone();
        let task =
            tokio::spawn(async move { inner.search(&owned_query, &owned_filters).await });
        self.replace_in_flight(Some(task.abort_handle()));

        let result = match task.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => {
                debug!("Search for '{}' aborted", query);
                return Ok(SearchOutcome::Superseded);
            }
            Err(e) => return Err(CookmateError::Task(e.to_string())),
        };

        if self.is_stale(generation) {
            debug!("Discarding results for superseded search '{}'", query);
            return Ok(SearchOutcome::Superseded);
        }
        result.map(SearchOutcome::Results)
    }

    /// Abandon pending and in-flight searches
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.abort_in_flight();
    }

    fn is_stale(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) != generation
    }

    fn abort_in_flight(&self) {
        self.replace_in_flight(None);
    }

    fn replace_in_flight(&self, handle: Option<AbortHandle>) {
        let mut in_flight = self
            .in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(previous) = std::mem::replace(&mut *in_flight, handle) {
            previous.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use tokio::time::sleep;

    struct FakeSearch {
        calls: Arc<AtomicUsize>,
        latency: Duration,
    }

    #[async_trait]
    impl RecipeSearch for FakeSearch {
        async fn search(
            &self,
            query: &str,
            _filters: &SearchFilters,
        ) -> Result<Vec<Recipe>, CookmateError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            sleep(self.latency).await;
            Ok(vec![Recipe {
                title: query.to_string(),
                ..Default::default()
            }])
        }
    }

    fn debounced(latency: Duration) -> (Arc<AtomicUsize>, DebouncedSearch) {
        let calls = Arc::new(AtomicUsize::new(0));
        let fake = FakeSearch {
            calls: calls.clone(),
            latency,
        };
        (calls, DebouncedSearch::new(Arc::new(fake), DEFAULT_DEBOUNCE))
    }

    fn titles(outcome: &SearchOutcome) -> Vec<&str> {
        match outcome {
            SearchOutcome::Results(recipes) => recipes.iter().map(|r| r.title.as_str()).collect(),
            SearchOutcome::Superseded => panic!("expected results"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_search() {
        let (calls, search) = debounced(Duration::from_millis(50));
        let outcome = search
            .search("pasta", &SearchFilters::default())
            .await
            .unwrap();

        assert_eq!(titles(&outcome), vec!["pasta"]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_within_delay_sends_nothing() {
        let (calls, search) = debounced(Duration::from_millis(50));
        let filters = SearchFilters::default();

        let first = search.search("pas", &filters);
        let second = async {
            sleep(Duration::from_millis(100)).await;
            search.search("pasta", &filters).await
        };
        let (first, second) = tokio::join!(first, second);

        assert_eq!(first.unwrap(), SearchOutcome::Superseded);
        assert_eq!(titles(&second.unwrap()), vec!["pasta"]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_flight_search_is_superseded() {
        let (calls, search) = debounced(Duration::from_millis(1000));
        let filters = SearchFilters::default();

        // The first request is in flight from 500ms to 1500ms
        let first = search.search("pas", &filters);
        let second = async {
            sleep(Duration::from_millis(700)).await;
            search.search("pasta", &filters).await
        };
        let (first, second) = tokio::join!(first, second);

        assert_eq!(first.unwrap(), SearchOutcome::Superseded);
        assert_eq!(titles(&second.unwrap()), vec!["pasta"]);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_query_cancels_pending() {
        let (calls, search) = debounced(Duration::from_millis(50));
        let filters = SearchFilters::default();

        let first = search.search("pasta", &filters);
        let second = async {
            sleep(Duration::from_millis(100)).await;
            search.search("  ", &filters).await
        };
        let (first, second) = tokio::join!(first, second);

        assert_eq!(first.unwrap(), SearchOutcome::Superseded);
        assert_eq!(second.unwrap(), SearchOutcome::Results(Vec::new()));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
