//! 变形器栈
//!
//! 按列表顺序执行。第一个参与更新的变形器之前恢复一次原始数据，
//! 之后的变形器在上一个的结果上继续改写。

use super::{DeformContext, DeformerType, MeshDeformer};
use crate::mesh::Mesh;

#[derive(Clone, Debug, Default)]
pub struct MeshDeformerStack {
    deformers: Vec<MeshDeformer>,
}

impl MeshDeformerStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取变形器数量
    pub fn num_deformers(&self) -> usize {
        self.deformers.len()
    }

    pub fn deformer(&self, index: usize) -> Option<&MeshDeformer> {
        self.deformers.get(index)
    }

    pub fn deformer_mut(&mut self, index: usize) -> Option<&mut MeshDeformer> {
        self.deformers.get_mut(index)
    }

    pub fn deformers(&self) -> &[MeshDeformer] {
        &self.deformers
    }

    pub fn add_deformer(&mut self, deformer: impl Into<MeshDeformer>) {
        self.deformers.push(deformer.into());
    }

    pub fn insert_deformer(&mut self, index: usize, deformer: impl Into<MeshDeformer>) {
        self.deformers.insert(index, deformer.into());
    }

    pub fn remove_deformer(&mut self, index: usize) -> MeshDeformer {
        self.deformers.remove(index)
    }

    /// 删除某类型的所有变形器，返回删除数量
    pub fn remove_all_deformers_by_type(&mut self, kind: DeformerType) -> usize {
        let before = self.deformers.len();
        self.deformers.retain(|deformer| deformer.kind() != kind);
        before - self.deformers.len()
    }

    pub fn remove_all_deformers(&mut self) {
        self.deformers.clear();
    }

    /// 第 occurrence 个该类型的变形器
    pub fn find_deformer_by_type(
        &self,
        kind: DeformerType,
        occurrence: usize,
    ) -> Option<&MeshDeformer> {
        self.deformers
            .iter()
            .filter(|deformer| deformer.kind() == kind)
            .nth(occurrence)
    }

    pub fn find_deformer_by_type_mut(
        &mut self,
        kind: DeformerType,
        occurrence: usize,
    ) -> Option<&mut MeshDeformer> {
        self.deformers
            .iter_mut()
            .filter(|deformer| deformer.kind() == kind)
            .nth(occurrence)
    }

    /// 启用/禁用某类型的所有变形器，返回受影响的数量
    pub fn enable_all_deformers_by_type(&mut self, kind: DeformerType, enabled: bool) -> usize {
        let mut count = 0;
        for deformer in self.deformers.iter_mut().filter(|d| d.kind() == kind) {
            deformer.set_enabled(enabled);
            count += 1;
        }
        count
    }

    pub fn check_if_has_deformer_of_type(&self, kind: DeformerType) -> bool {
        self.deformers.iter().any(|deformer| deformer.kind() == kind)
    }

    /// 重新初始化所有变形器
    pub fn reinitialize_deformers(&mut self, mesh: &Mesh) {
        for deformer in &mut self.deformers {
            deformer.reinitialize(mesh);
        }
    }

    /// 每帧每节点调用一次
    ///
    /// 返回实际执行的变形器数量。禁用的变形器只在
    /// `force_update_disabled_deformers` 时执行。
    pub fn update(
        &mut self,
        mesh: &mut Mesh,
        ctx: &DeformContext,
        force_update_disabled_deformers: bool,
    ) -> usize {
        let mut reset_done = false;
        let mut executed = 0;
        for deformer in &mut self.deformers {
            if !deformer.is_enabled() && !force_update_disabled_deformers {
                continue;
            }
            if !reset_done {
                mesh.reset_to_original_data();
                reset_done = true;
            }
            deformer.update(mesh, ctx);
            executed += 1;
        }
        executed
    }
}
