//! Keystroke-driven query lifecycle on top of [`SearchEngine`].
//!
//! A [`SearchSession`] owns one debounce timer and one in-flight selection.
//! Every input bumps a sequence number; a query whose number is no longer the
//! latest is dropped wherever it happens to be (sleeping, fetching or about to
//! publish). Results reach the host as [`SearchEvent`]s on an unbounded channel.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};
use tracing::{debug, info};
use wayfinder_sources::{BoundingBox, SearchFilters, Viewport};

use crate::{aggregate::RankedResults, candidate::Candidate, core::SearchEngine};

/// Where the session is in its query/selection cycle.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum QueryPhase {
    #[default]
    Idle,
    /// Waiting out the quiet period after a keystroke
    Debouncing,
    /// Sources queried, waiting for all of them
    Fetching,
    /// Normalizing, deduplicating and ranking
    Aggregating,
    /// Results published; waits for the next keystroke or a selection
    Ready,
    /// Input is blank
    Empty,
    Resolving,
    /// Located candidate published
    Selected,
}

/// Notifications for the host map.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchEvent {
    /// Once per completed, non-superseded query; may be empty
    ResultsReady {
        term: String,
        candidates: Vec<Candidate>,
    },
    /// The category entry was selected: show exactly these and fit the map to `bounds`
    CategoryExpanded {
        candidates: Vec<Candidate>,
        bounds: Option<BoundingBox>,
    },
    /// A selection was resolved (or fell back to its approximate position)
    LocationResolved(Candidate),
    /// Input became blank; transient markers should go
    QueryCleared,
}

#[derive(Debug, Default)]
struct SharedState {
    latest_query: u64,
    latest_selection: u64,
    viewport: Option<Viewport>,
    filters: SearchFilters,
    results: RankedResults,
    visible: Vec<Candidate>,
}

/// State and channels shared between the session and its spawned tasks.
#[derive(Clone)]
struct Shared {
    state: Arc<Mutex<SharedState>>,
    phase: Arc<watch::Sender<QueryPhase>>,
    events: mpsc::UnboundedSender<SearchEvent>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, SharedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: SearchEvent) {
        if self.events.send(event).is_err() {
            debug!("Event receiver dropped");
        }
    }

    fn set_phase(&self, phase: QueryPhase) {
        self.phase.send_replace(phase);
    }

    /// Set `phase` only while `seq` is still the latest query.
    fn advance_query(&self, seq: u64, phase: QueryPhase) -> bool {
        let state = self.lock();
        if state.latest_query != seq {
            debug!(stale = seq, latest = state.latest_query, "Dropping superseded query");
            return false;
        }
        self.set_phase(phase);
        true
    }
}

/// One search box: debounced input, last-query-wins results, cancellable selection.
///
/// Must be used from within a tokio runtime.
pub struct SearchSession {
    engine: Arc<SearchEngine>,
    shared: Shared,
    pending_query: Option<JoinHandle<()>>,
    pending_selection: Option<JoinHandle<()>>,
}

impl SearchSession {
    /// A new idle session and the receiving end of its event stream.
    pub fn new(engine: Arc<SearchEngine>) -> (Self, mpsc::UnboundedReceiver<SearchEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let (phase, _) = watch::channel(QueryPhase::Idle);
        let session = Self {
            engine,
            shared: Shared {
                state: Arc::default(),
                phase: Arc::new(phase),
                events,
            },
            pending_query: None,
            pending_selection: None,
        };
        (session, receiver)
    }

    pub fn phase(&self) -> QueryPhase {
        *self.shared.phase.borrow()
    }

    pub fn subscribe_phase(&self) -> watch::Receiver<QueryPhase> {
        self.shared.phase.subscribe()
    }

    /// The map area used by the next query. Queries already in flight keep their snapshot.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.shared.lock().viewport = Some(viewport);
    }

    pub fn set_filters(&mut self, filters: SearchFilters) {
        self.shared.lock().filters = filters;
    }

    /// Currently visible list.
    pub fn visible(&self) -> Vec<Candidate> {
        self.shared.lock().visible.clone()
    }

    /// Feed the current content of the search box.
    ///
    /// Cancels any pending debounce and restarts it, and abandons an unfinished
    /// selection. Blank input clears the results immediately without querying
    /// any source.
    pub fn input(&mut self, text: &str) {
        for handle in [self.pending_query.take(), self.pending_selection.take()]
            .into_iter()
            .flatten()
        {
            handle.abort();
        }

        let term = text.trim().to_string();
        let seq = {
            let mut state = self.shared.lock();
            state.latest_query += 1;
            state.latest_selection += 1;
            if term.is_empty() {
                state.results = RankedResults::default();
                state.visible.clear();
                self.shared.set_phase(QueryPhase::Empty);
            } else {
                self.shared.set_phase(QueryPhase::Debouncing);
            }
            state.latest_query
        };

        if term.is_empty() {
            debug!(seq, "Input cleared");
            self.shared.emit(SearchEvent::QueryCleared);
            return;
        }

        let engine = Arc::clone(&self.engine);
        let shared = self.shared.clone();
        self.pending_query = Some(tokio::spawn(run_query(engine, shared, seq, term)));
    }

    /// Act on a tap on the candidate with `id`; `false` if no such candidate is shown.
    ///
    /// The category entry swaps the visible list for the local matches. Any
    /// other candidate is resolved in the background; a newer selection
    /// supersedes an unfinished one.
    pub fn select(&mut self, id: &str) -> bool {
        let (candidate, viewport) = {
            let mut state = self.shared.lock();
            let Some(candidate) = state.results.find(id).cloned() else {
                return false;
            };

            if candidate.is_synthetic() {
                let local = state.results.local.clone();
                let bounds = state.results.local_bounds();
                state.visible.clone_from(&local);
                drop(state);
                info!(count = local.len(), "Expanding category entry");
                self.shared.emit(SearchEvent::CategoryExpanded {
                    candidates: local,
                    bounds,
                });
                return true;
            }

            state.latest_selection += 1;
            self.shared.set_phase(QueryPhase::Resolving);
            (candidate, state.viewport)
        };

        if let Some(handle) = self.pending_selection.take() {
            handle.abort();
        }
        let seq = self.shared.lock().latest_selection;
        let engine = Arc::clone(&self.engine);
        let shared = self.shared.clone();
        self.pending_selection = Some(tokio::spawn(run_selection(
            engine, shared, seq, candidate, viewport,
        )));
        true
    }
}

impl Drop for SearchSession {
    fn drop(&mut self) {
        for handle in [self.pending_query.take(), self.pending_selection.take()]
            .into_iter()
            .flatten()
        {
            handle.abort();
        }
    }
}

async fn run_query(engine: Arc<SearchEngine>, shared: Shared, seq: u64, term: String) {
    tokio::time::sleep(engine.config().debounce).await;

    if !shared.advance_query(seq, QueryPhase::Fetching) {
        return;
    }
    let (viewport, filters) = {
        let state = shared.lock();
        (state.viewport, state.filters.clone())
    };

    let results = engine.fetch(&term, viewport.as_ref(), &filters).await;
    if !shared.advance_query(seq, QueryPhase::Aggregating) {
        return;
    }
    let ranked = engine.aggregate(&term, &results, viewport.as_ref());

    let mut state = shared.lock();
    if state.latest_query != seq {
        debug!(stale = seq, latest = state.latest_query, "Dropping superseded results");
        return;
    }
    let candidates = ranked.visible.clone();
    state.visible.clone_from(&candidates);
    state.results = ranked;
    shared.set_phase(QueryPhase::Ready);
    drop(state);

    debug!(seq, results = candidates.len(), "Publishing results");
    shared.emit(SearchEvent::ResultsReady { term, candidates });
}

async fn run_selection(
    engine: Arc<SearchEngine>,
    shared: Shared,
    seq: u64,
    candidate: Candidate,
    viewport: Option<Viewport>,
) {
    let resolution = engine.resolve(&candidate, viewport.as_ref()).await;

    let state = shared.lock();
    if state.latest_selection != seq {
        debug!(stale = seq, latest = state.latest_selection, "Dropping superseded resolution");
        return;
    }
    match resolution.into_candidate() {
        Some(located) => {
            shared.set_phase(QueryPhase::Selected);
            shared.emit(SearchEvent::LocationResolved(located));
            shared.set_phase(QueryPhase::Idle);
        }
        None => {
            shared.set_phase(QueryPhase::Ready);
        }
    }
    drop(state);
}
