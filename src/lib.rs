// Library surface for the round engine and its collaborators.
// The terminal front end in main.rs only wires these together.
pub mod app_dirs;
pub mod celebration;
pub mod clock;
pub mod config;
pub mod difficulty;
pub mod engine;
pub mod feedback;
pub mod history;
pub mod records;
pub mod runtime;
pub mod scheduler;
pub mod scoring;
pub mod session;
pub mod store;
pub mod summary;
pub mod util;

pub use difficulty::Difficulty;
pub use engine::{Engine, EngineConfig, EngineEvent, Outcome, RoundPhase, RoundResult};
pub use session::{SessionConfig, SessionState};
