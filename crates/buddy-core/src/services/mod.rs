pub mod config_loader;
pub mod container_builder;
pub mod ecs;
pub mod orchestrator;
pub mod substitution;
pub mod target;
