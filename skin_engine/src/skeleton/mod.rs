//! 骨架系统：节点层级、绑定姿势与当前姿势

mod node;
mod pose;
#[allow(clippy::module_inception)]
mod skeleton;

pub use node::Node;
pub use pose::Pose;
pub use skeleton::Skeleton;
