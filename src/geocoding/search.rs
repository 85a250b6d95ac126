//! Search control state, messages and task polling.

use bevy::prelude::*;
use bevy::tasks::{AsyncComputeTaskPool, Task};
use futures_lite::future;

use super::{GeocodeError, GeocoderClient, SearchOptions, SearchResult};
use crate::config::AppConfig;
use crate::constants::SEARCH_NOT_FOUND;

/// Message to run a forward search for the given text
#[derive(Message)]
pub struct SearchRequest {
    pub query: String,
}

/// Message emitted when a search candidate is chosen (by the user, or
/// automatically when a search has a single match)
#[derive(Message, Clone)]
pub struct SearchResultSelected(pub SearchResult);

/// Result of a background search
pub struct SearchOutcome {
    pub query: String,
    pub result: Result<Vec<SearchResult>, GeocodeError>,
}

/// State of the search control
#[derive(Resource, Default)]
pub struct SearchState {
    /// Current contents of the search box
    pub query: String,
    /// Candidates waiting for the user to pick one
    pub results: Vec<SearchResult>,
    /// Inline message shown under the search box
    pub error: Option<String>,
    /// In-flight search; replacing it drops (cancels) the previous one
    pending: Option<Task<SearchOutcome>>,
}

impl SearchState {
    pub fn is_searching(&self) -> bool {
        self.pending.is_some()
    }

    pub fn clear_results(&mut self) {
        self.results.clear();
        self.error = None;
    }

    /// Store a finished search. Returns the candidate to select right away
    /// when the search matched exactly one place.
    pub fn apply_outcome(
        &mut self,
        query: &str,
        result: Result<Vec<SearchResult>, GeocodeError>,
    ) -> Option<SearchResult> {
        self.clear_results();

        match result {
            Ok(mut results) => match results.len() {
                0 => {
                    info!("No places found for '{}'", query);
                    self.error = Some(SEARCH_NOT_FOUND.to_string());
                    None
                }
                1 => results.pop(),
                _ => {
                    self.results = results;
                    None
                }
            },
            Err(e) => {
                warn!("Search for '{}' failed: {}", query, e);
                self.error = Some(SEARCH_NOT_FOUND.to_string());
                None
            }
        }
    }
}

/// Starts a background search for the newest request
pub fn start_search(
    mut requests: MessageReader<SearchRequest>,
    mut state: ResMut<SearchState>,
    client: Res<GeocoderClient>,
    config: Res<AppConfig>,
) {
    // Only the newest request of the frame matters
    let Some(request) = requests.read().last() else {
        return;
    };

    let query = request.query.trim().to_string();
    if query.is_empty() {
        return;
    }

    debug!("Searching for '{}'", query);
    state.clear_results();

    let options = SearchOptions::from(&config.data.geocoder);
    let geocoder = client.0.clone();
    let task_pool = AsyncComputeTaskPool::get();
    state.pending = Some(task_pool.spawn(async move {
        let result = geocoder.search(&query, &options);
        SearchOutcome { query, result }
    }));
}

/// Polls the search task and publishes an automatic selection
pub fn poll_search_task(
    mut state: ResMut<SearchState>,
    mut selected: MessageWriter<SearchResultSelected>,
) {
    let Some(task) = state.pending.as_mut() else {
        return;
    };

    let Some(outcome) = future::block_on(future::poll_once(task)) else {
        return;
    };

    state.pending = None;
    if let Some(result) = state.apply_outcome(&outcome.query, outcome.result) {
        selected.write(SearchResultSelected(result));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::{BoundingBox, LatLng};

    fn result(name: &str) -> SearchResult {
        let center = LatLng::new(51.5, -0.12);
        SearchResult {
            center,
            name: name.to_string(),
            bbox: BoundingBox::around(center),
            category: None,
        }
    }

    #[test]
    fn test_no_results_shows_not_found() {
        let mut state = SearchState::default();
        let selected = state.apply_outcome("atlantis", Ok(vec![]));
        assert!(selected.is_none());
        assert_eq!(state.error.as_deref(), Some("Not found"));
        assert!(state.results.is_empty());
    }

    #[test]
    fn test_failure_shows_not_found() {
        let mut state = SearchState::default();
        let selected =
            state.apply_outcome("london", Err(GeocodeError::Network("offline".into())));
        assert!(selected.is_none());
        assert_eq!(state.error.as_deref(), Some("Not found"));
    }

    #[test]
    fn test_single_result_is_selected_automatically() {
        let mut state = SearchState::default();
        let selected = state.apply_outcome("london", Ok(vec![result("London")]));
        assert_eq!(selected.map(|r| r.name), Some("London".to_string()));
        assert!(state.results.is_empty());
        assert!(state.error.is_none());
    }

    #[test]
    fn test_multiple_results_are_listed() {
        let mut state = SearchState::default();
        state.error = Some("Not found".to_string());
        let selected = state.apply_outcome(
            "london",
            Ok(vec![result("London, UK"), result("London, Ontario")]),
        );
        assert!(selected.is_none());
        assert_eq!(state.results.len(), 2);
        assert!(state.error.is_none());
    }

    #[test]
    fn test_default_state_is_idle() {
        let state = SearchState::default();
        assert!(!state.is_searching());
        assert!(state.query.is_empty());
    }
}
