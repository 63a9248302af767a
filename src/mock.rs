pub mod engine;
pub mod error;
pub mod fault;
pub mod model;
pub mod result;
pub mod seed;
pub mod store;
pub mod watch;

pub use engine::{AdvanceReport, MockEngine, RunOutcome, TickEvent};
pub use error::{EntityKind, MockError};
pub use fault::{FaultPolicy, NoFaults, TickModuloFault};
pub use model::{
    Flow, FlowStep, Run, RunStatus, State, StepExecution, StepStatus, StepType, Workspace,
};
pub use result::StepResult;
pub use seed::seed_default;
pub use store::{load_state, save_state_atomic, MockStore};
pub use watch::StateWatcher;
