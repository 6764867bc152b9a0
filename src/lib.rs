pub mod arena;
pub mod coord;
pub mod engine;
pub mod entity;
pub mod error;
pub mod grid;
pub mod mid_cache;
pub mod report;
pub mod rng;
pub mod scenario;
pub mod stack;
pub mod systems;
pub mod validator;
pub mod world;

pub use engine::{Engine, EngineBuilder, EngineSettings, RunSummary, TurnSummary};
pub use error::StoreError;
pub use scenario::{Scenario, ScenarioLoader};
pub use validator::{AuditReport, Severity, Violation, ViolationKind};
pub use world::{Placement, World};
