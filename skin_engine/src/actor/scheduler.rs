//! 多实例更新调度

use rayon::prelude::*;

use super::ActorInstance;

/// 实例之间相互独立，多线程只在实例之间并行，
/// 单个实例的变形器栈始终顺序执行
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UpdateScheduler {
    #[default]
    SingleThread,
    MultiThread,
}

impl UpdateScheduler {
    /// 更新所有实例，返回执行的变形器总数
    pub fn update(self, instances: &mut [ActorInstance], time_delta: f32) -> usize {
        match self {
            Self::SingleThread => instances
                .iter_mut()
                .map(|instance| instance.update_mesh_deformers(time_delta))
                .sum(),
            Self::MultiThread => instances
                .par_iter_mut()
                .map(|instance| instance.update_mesh_deformers(time_delta))
                .sum(),
        }
    }
}
