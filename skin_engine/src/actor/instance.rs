//! Actor 实例：姿势 + 私有的网格与变形器栈副本

use std::sync::Arc;

use super::{Actor, NodeMeshSlot};
use crate::deformer::{DeformContext, MeshDeformerStack};
use crate::mesh::Mesh;
use crate::skeleton::Pose;
use crate::Result;

#[derive(Clone, Debug)]
pub struct ActorInstance {
    actor: Arc<Actor>,
    lod_level: usize,
    pose: Pose,
    slots: Vec<NodeMeshSlot>,
    force_update_disabled_deformers: bool,
}

impl ActorInstance {
    /// 以绑定姿势和 LOD 0 创建
    pub fn new(actor: Arc<Actor>) -> Self {
        let pose = Pose::from_skeleton(actor.skeleton());
        let mut instance = Self {
            actor,
            lod_level: 0,
            pose,
            slots: Vec::new(),
            force_update_disabled_deformers: false,
        };
        instance.clone_lod_slots();
        instance
    }

    /// 复制 LOD 的网格与变形器栈，并按副本重新初始化
    fn clone_lod_slots(&mut self) {
        self.slots = self
            .actor
            .lod_slots(self.lod_level)
            .map(<[NodeMeshSlot]>::to_vec)
            .unwrap_or_default();
        for slot in &mut self.slots {
            if let (Some(mesh), Some(stack)) = (&slot.mesh, &mut slot.stack) {
                stack.reinitialize_deformers(mesh);
            }
        }
    }

    pub fn actor(&self) -> &Arc<Actor> {
        &self.actor
    }

    pub fn lod_level(&self) -> usize {
        self.lod_level
    }

    /// 切换 LOD，重新复制该 LOD 的网格
    pub fn set_lod_level(&mut self, lod: usize) -> Result<()> {
        self.actor.lod_slots(lod)?;
        self.lod_level = lod;
        self.clone_lod_slots();
        Ok(())
    }

    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    pub fn pose_mut(&mut self) -> &mut Pose {
        &mut self.pose
    }

    pub fn force_update_disabled_deformers(&self) -> bool {
        self.force_update_disabled_deformers
    }

    pub fn set_force_update_disabled_deformers(&mut self, force: bool) {
        self.force_update_disabled_deformers = force;
    }

    /// 获取节点上的变形后网格
    pub fn mesh(&self, node: usize) -> Option<&Mesh> {
        self.slots.get(node).and_then(|slot| slot.mesh.as_ref())
    }

    pub fn mesh_deformer_stack(&self, node: usize) -> Option<&MeshDeformerStack> {
        self.slots.get(node).and_then(|slot| slot.stack.as_ref())
    }

    pub fn mesh_deformer_stack_mut(&mut self, node: usize) -> Option<&mut MeshDeformerStack> {
        self.slots.get_mut(node).and_then(|slot| slot.stack.as_mut())
    }

    /// 解析全局矩阵后逐节点更新变形器栈，返回执行的变形器总数
    pub fn update_mesh_deformers(&mut self, time_delta: f32) -> usize {
        let skeleton = self.actor.skeleton();
        self.pose.calc_global_transforms(skeleton);

        let mut executed = 0;
        for (node, slot) in self.slots.iter_mut().enumerate() {
            if let (Some(mesh), Some(stack)) = (&mut slot.mesh, &mut slot.stack) {
                let ctx = DeformContext::new(skeleton, &self.pose, node, time_delta);
                executed += stack.update(mesh, &ctx, self.force_update_disabled_deformers);
            }
        }
        executed
    }
}
