//! Actor 模块

#[allow(clippy::module_inception)]
mod actor;
mod instance;
mod scheduler;

pub use actor::{Actor, NodeMeshSlot};
pub use instance::ActorInstance;
pub use scheduler::UpdateScheduler;
