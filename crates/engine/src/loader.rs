use core_types::{DateRange, FilterState, ReturnMode};

/// The filter parameters a fetch was issued for.
///
/// A result is only committed if its ticket still describes the current filters.
/// Tickets without a return mode (events, change points) ignore that field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FetchTicket {
    pub range: DateRange,
    pub return_mode: Option<ReturnMode>,
}

impl FetchTicket {
    pub fn prices(state: &FilterState) -> Self {
        Self {
            range: state.range(),
            return_mode: Some(state.return_mode),
        }
    }

    pub fn range_only(state: &FilterState) -> Self {
        Self {
            range: state.range(),
            return_mode: None,
        }
    }

    pub fn is_current(&self, state: &FilterState) -> bool {
        self.range == state.range() && self.return_mode.is_none_or(|mode| mode == state.return_mode)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    /// Nothing requested yet.
    Idle,
    Loading,
    Ready,
    /// The last fetch failed; any earlier data is kept as last-good.
    Failed(String),
}

/// What happened to a completed fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotOutcome {
    Applied,
    Discarded,
    Failed,
}

/// One region's data together with the fetch bookkeeping around it.
///
/// `T` is expected to be cheap to clone (an `Arc` of the decoded records).
#[derive(Debug)]
pub struct LoadSlot<T> {
    data: Option<T>,
    state: LoadState,
    in_flight: Option<FetchTicket>,
    loaded_for: Option<FetchTicket>,
}

impl<T> Default for LoadSlot<T> {
    fn default() -> Self {
        Self {
            data: None,
            state: LoadState::Idle,
            in_flight: None,
            loaded_for: None,
        }
    }
}

impl<T> LoadSlot<T> {
    /// Marks a new fetch as pending; it supersedes any fetch still in flight.
    pub fn begin(&mut self, ticket: FetchTicket) {
        self.in_flight = Some(ticket);
        self.state = LoadState::Loading;
    }

    /// Commits `result` if `ticket` is the latest fetch and still matches `current`.
    pub fn complete(&mut self, ticket: FetchTicket, result: Result<T, String>, current: &FilterState) -> SlotOutcome {
        if self.in_flight != Some(ticket) || !ticket.is_current(current) {
            tracing::debug!(?ticket, "Discarding superseded fetch result.");
            return SlotOutcome::Discarded;
        }
        self.in_flight = None;

        match result {
            Ok(data) => {
                self.data = Some(data);
                self.loaded_for = Some(ticket);
                self.state = LoadState::Ready;
                SlotOutcome::Applied
            }
            Err(message) => {
                self.state = LoadState::Failed(message);
                SlotOutcome::Failed
            }
        }
    }

    /// The latest committed data, which may be last-good data for an older window.
    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    /// Whether the held data was loaded for `current` and no newer fetch is pending.
    pub fn is_fresh(&self, current: &FilterState) -> bool {
        self.state == LoadState::Ready && self.loaded_for.is_some_and(|t| t.is_current(current))
    }
}
