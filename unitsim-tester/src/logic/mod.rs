pub mod policy;
pub mod reports;
pub mod seeds;
pub mod simulation;

pub use policy::GameplayStrategy;
pub use reports::aggregate_records;
pub use seeds::resolve_seed_inputs;
pub use simulation::run_batch;
