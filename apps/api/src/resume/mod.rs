pub mod analysis;
pub mod handlers;
pub mod locks;
pub mod merge;
pub mod plan;
pub mod planner;
pub mod prompts;
pub mod service;
pub mod store;
pub mod structured;
