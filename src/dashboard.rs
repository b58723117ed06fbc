//! Application state for one map session.
//!
//! [`Dashboard`] owns the fetched event collection and the filter controls.
//! Control changes arrive as [`Command`]s and never trigger a re-fetch; a
//! time-window change goes through [`Dashboard::begin_fetch`] and
//! [`Dashboard::finish_fetch`], where the most recently issued request wins
//! and stale responses are dropped.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::client::TimeWindow;
use crate::errors::QuakemapError;
use crate::filters::{DepthBucket, FilterState};
use crate::models::Quake;
use crate::render::{RenderFrame, render};
use crate::stats::{Focus, LocateTarget, PanelText, Statistics};

/// A synchronous change to the filter controls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    SetMinMagnitude(f64),
    SetMaxMagnitude(f64),
    SetDepth(DepthBucket),
}

/// Proof that a fetch was requested; hand it back with the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
    window: TimeWindow,
}

impl FetchTicket {
    #[must_use]
    pub fn window(&self) -> TimeWindow {
        self.window
    }
}

/// Everything the page needs to redraw.
#[derive(Debug, Clone, Serialize)]
pub struct View {
    pub window: TimeWindow,
    pub filter: FilterState,
    pub loading: bool,
    pub total_events: usize,
    pub frame: RenderFrame,
    pub statistics: Statistics,
    pub panel: PanelText,
}

/// Owning controller for the event collection and filter state.
#[derive(Debug, Default)]
pub struct Dashboard {
    events: Vec<Quake>,
    filter: FilterState,
    window: TimeWindow,
    /// Generation of the most recently issued fetch
    latest_request: u64,
    /// Generation of the fetch whose events are currently held
    applied_request: u64,
}

impl Dashboard {
    #[must_use]
    pub fn new(window: TimeWindow, filter: FilterState) -> Self {
        Self {
            window,
            filter,
            ..Self::default()
        }
    }

    /// True while the latest requested fetch has not come back.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.latest_request != self.applied_request
    }

    /// Apply a filter control change.
    ///
    /// # Errors
    ///
    /// Returns an error if a magnitude is not a finite number; the filter
    /// is left unchanged in that case.
    pub fn apply(&mut self, command: Command) -> Result<(), QuakemapError> {
        match command {
            Command::SetMinMagnitude(v) => self.filter.magnitude.set_min(v)?,
            Command::SetMaxMagnitude(v) => self.filter.magnitude.set_max(v)?,
            Command::SetDepth(bucket) => self.filter.depth = bucket,
        }
        debug!(
            "filter now {:.1}..={:.1}, depth {}",
            self.filter.magnitude.min(),
            self.filter.magnitude.max(),
            self.filter.depth.as_str()
        );
        Ok(())
    }

    /// Record a request for a new time window.
    ///
    /// Any fetch still in flight becomes stale.
    pub fn begin_fetch(&mut self, window: TimeWindow) -> FetchTicket {
        self.latest_request += 1;
        self.window = window;
        FetchTicket {
            generation: self.latest_request,
            window,
        }
    }

    /// Install the result of a fetch.
    ///
    /// Returns `false` (and discards `events`) if a newer fetch has been
    /// requested since `ticket` was issued.
    pub fn finish_fetch(&mut self, ticket: FetchTicket, events: Vec<Quake>) -> bool {
        if ticket.generation != self.latest_request {
            debug!(
                "discarding stale {} response (request {}, latest {})",
                ticket.window, ticket.generation, self.latest_request
            );
            return false;
        }

        info!("loaded {} events for {} window", events.len(), ticket.window);
        self.events = events;
        self.applied_request = ticket.generation;
        true
    }

    /// Recompute the map overlays and statistics from the held collection.
    #[must_use]
    pub fn view(&self, now: DateTime<Utc>) -> View {
        let selected = self.filter.apply(&self.events);
        let statistics = Statistics::compute(&selected, now);

        View {
            window: self.window,
            filter: self.filter,
            loading: self.is_loading(),
            total_events: self.events.len(),
            frame: render(&selected),
            panel: statistics.display(),
            statistics,
        }
    }

    /// Resolve a sidebar click to a map focus.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when no event passes the filter.
    pub fn locate(&self, target: LocateTarget, now: DateTime<Utc>) -> Result<Focus, QuakemapError> {
        let selected = self.filter.apply(&self.events);
        Statistics::compute(&selected, now).locate(target)
    }
}
