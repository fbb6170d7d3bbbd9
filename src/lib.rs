pub mod cli;
pub mod config;
pub mod error;
pub mod executor;
pub mod orchestrator;
pub mod parser;
pub mod sandbox;
pub mod transform;

// Re-export main types
pub use config::Config;
pub use error::{Location, RuntimeError, TransformError, TranspileError, UnresolvedImportError};
pub use executor::{Executor, ResultMode, SandboxEvaluator, Val};
pub use orchestrator::{
    CycleStats, Orchestrator, Outcome, OutcomeHandler, State, StateKind, Transition,
    TranspileRequest,
};
pub use sandbox::{Resolve, SandboxResolver, ScopeMapping};
pub use transform::{transform, TargetCode, TransformConfig};
