//! Orchestrator - sequences transform and execution for each new source
//!
//! ```text
//!            source_changed (new value)
//!   Idle ─────────────────────────────▶ Pending ──transform──▶ execute ──▶ Succeeded
//!                                          │                     │
//!                                          └──────── error ──────┴──────▶ Failed
//! ```
//!
//! `Succeeded` and `Failed` go back through `Pending` only when the source
//! differs by value from the last one processed; identical source keeps the
//! current outcome and does no work.

use tracing::{debug, info, warn};

use crate::error::TranspileError;
use crate::executor::{Executor, Val};
use crate::sandbox::{SandboxResolver, ScopeMapping};
use crate::transform::{transform, TransformConfig};

/* ===================== Requests ===================== */

/// Everything one cycle needs, borrowed from the caller for that cycle only
#[derive(Clone, Copy)]
pub struct TranspileRequest<'a> {
    pub source: &'a str,
    pub config: &'a TransformConfig,
    pub scope: &'a ScopeMapping,
    pub executor: &'a dyn Executor,
}

impl<'a> TranspileRequest<'a> {
    pub fn new(
        source: &'a str,
        config: &'a TransformConfig,
        scope: &'a ScopeMapping,
        executor: &'a dyn Executor,
    ) -> Self {
        Self {
            source,
            config,
            scope,
            executor,
        }
    }
}

/* ===================== States ===================== */

/// Orchestrator state
#[derive(Debug, Clone, PartialEq)]
pub enum State {
    /// No source seen yet
    Idle,
    /// A cycle is running
    Pending,
    Succeeded(Val),
    Failed(TranspileError),
}

impl State {
    pub fn kind(&self) -> StateKind {
        match self {
            State::Idle => StateKind::Idle,
            State::Pending => StateKind::Pending,
            State::Succeeded(_) => StateKind::Succeeded,
            State::Failed(_) => StateKind::Failed,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, State::Succeeded(_) | State::Failed(_))
    }
}

/// Payload-free tag of a [`State`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateKind {
    Idle,
    Pending,
    Succeeded,
    Failed,
}

/// The outcome as a caller observes it: exactly one of three
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome<'a> {
    Pending,
    Failed(&'a TranspileError),
    Succeeded(&'a Val),
}

/// What a `source_changed` call did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Same source as last time; nothing ran
    Unchanged,
    /// A full cycle ran
    Completed {
        previous: StateKind,
        current: StateKind,
    },
}

/// Receives the dispatched outcome
pub trait OutcomeHandler {
    type Output;

    fn on_error(&mut self, error: &TranspileError) -> Self::Output;

    fn on_result(&mut self, value: &Val) -> Self::Output;

    /// Only called while no terminal outcome exists
    fn on_pending(&mut self) -> Self::Output;
}

/// Work counters, for observing the no-redundant-work guarantee
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleStats {
    /// Transform stage invocations
    pub transforms: u64,
    /// Executor invocations
    pub executions: u64,
    /// Triggers ignored because the source was unchanged
    pub skipped: u64,
}

/* ===================== Orchestrator ===================== */

#[derive(Debug)]
pub struct Orchestrator {
    state: State,
    last_source: Option<String>,
    stats: CycleStats,
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl Orchestrator {
    pub fn new() -> Self {
        Self {
            state: State::Idle,
            last_source: None,
            stats: CycleStats::default(),
        }
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn stats(&self) -> CycleStats {
        self.stats
    }

    pub fn outcome(&self) -> Outcome<'_> {
        match &self.state {
            State::Succeeded(value) => Outcome::Succeeded(value),
            State::Failed(error) => Outcome::Failed(error),
            State::Idle | State::Pending => Outcome::Pending,
        }
    }

    /// Handle a "source changed" trigger
    ///
    /// Runs a full cycle unless `request.source` equals the last source
    /// processed. The new outcome replaces the previous one outright.
    pub fn source_changed(&mut self, request: TranspileRequest<'_>) -> Transition {
        if self.last_source.as_deref() == Some(request.source) {
            self.stats.skipped += 1;
            debug!(state = ?self.state.kind(), "Source unchanged, keeping outcome");
            return Transition::Unchanged;
        }

        let previous = self.state.kind();
        self.last_source = Some(request.source.to_string());
        self.state = State::Pending;
        info!(bytes = request.source.len(), "Source changed, transpiling");

        self.state = self.run_cycle(&request);
        match &self.state {
            State::Failed(err) => warn!(kind = err.kind(), "Transpile failed: {}", err),
            _ => info!("Transpile succeeded"),
        }

        Transition::Completed {
            previous,
            current: self.state.kind(),
        }
    }

    /// Hand the current outcome to exactly one handler method
    pub fn dispatch<H: OutcomeHandler>(&self, handler: &mut H) -> H::Output {
        match self.outcome() {
            Outcome::Failed(error) => handler.on_error(error),
            Outcome::Succeeded(value) => handler.on_result(value),
            Outcome::Pending => handler.on_pending(),
        }
    }

    /// `source_changed` then, if a cycle ran, `dispatch`
    pub fn process<H: OutcomeHandler>(
        &mut self,
        request: TranspileRequest<'_>,
        handler: &mut H,
    ) -> Option<H::Output> {
        match self.source_changed(request) {
            Transition::Unchanged => None,
            Transition::Completed { .. } => Some(self.dispatch(handler)),
        }
    }

    fn run_cycle(&mut self, request: &TranspileRequest<'_>) -> State {
        self.stats.transforms += 1;
        let target = match transform(request.source, request.config) {
            Ok(target) => target,
            Err(err) => return State::Failed(err.into()),
        };

        self.stats.executions += 1;
        let resolver = SandboxResolver::new(request.scope);
        match request
            .executor
            .execute(&target, &resolver, request.source)
        {
            Ok(value) => State::Succeeded(value),
            Err(err) => State::Failed(err),
        }
    }
}
