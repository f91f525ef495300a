//! Actor：骨架 + 每个 LOD 每个节点的网格与变形器栈

use crate::config::{get_config, SkinningConfig};
use crate::deformer::MeshDeformerStack;
use crate::mesh::{Mesh, MeshType};
use crate::skeleton::Skeleton;
use crate::{Result, SkinError};

/// 某 LOD 下某节点挂载的网格与变形器栈
#[derive(Clone, Debug, Default)]
pub struct NodeMeshSlot {
    pub mesh: Option<Mesh>,
    pub stack: Option<MeshDeformerStack>,
}

#[derive(Clone, Debug)]
pub struct Actor {
    name: String,
    skeleton: Skeleton,
    /// lods[lod][node]
    lods: Vec<Vec<NodeMeshSlot>>,
}

impl Actor {
    /// 创建带一个 LOD 的 Actor，骨架必须已经 build_hierarchy
    pub fn new(name: impl Into<String>, skeleton: Skeleton) -> Self {
        let num_nodes = skeleton.num_nodes();
        Self {
            name: name.into(),
            skeleton,
            lods: vec![vec![NodeMeshSlot::default(); num_nodes]],
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    pub fn num_nodes(&self) -> usize {
        self.skeleton.num_nodes()
    }

    pub fn num_lod_levels(&self) -> usize {
        self.lods.len()
    }

    /// 添加一个空 LOD，返回其序号
    pub fn add_lod_level(&mut self) -> usize {
        self.lods
            .push(vec![NodeMeshSlot::default(); self.skeleton.num_nodes()]);
        self.lods.len() - 1
    }

    pub(crate) fn lod_slots(&self, lod: usize) -> Result<&[NodeMeshSlot]> {
        self.lods
            .get(lod)
            .map(Vec::as_slice)
            .ok_or(SkinError::InvalidLod(lod))
    }

    fn slot(&self, lod: usize, node: usize) -> Result<&NodeMeshSlot> {
        self.lod_slots(lod)?
            .get(node)
            .ok_or(SkinError::InvalidNode(node))
    }

    fn slot_mut(&mut self, lod: usize, node: usize) -> Result<&mut NodeMeshSlot> {
        self.lods
            .get_mut(lod)
            .ok_or(SkinError::InvalidLod(lod))?
            .get_mut(node)
            .ok_or(SkinError::InvalidNode(node))
    }

    pub fn set_mesh(&mut self, lod: usize, node: usize, mesh: Mesh) -> Result<()> {
        self.slot_mut(lod, node)?.mesh = Some(mesh);
        Ok(())
    }

    pub fn set_mesh_deformer_stack(
        &mut self,
        lod: usize,
        node: usize,
        stack: MeshDeformerStack,
    ) -> Result<()> {
        self.slot_mut(lod, node)?.stack = Some(stack);
        Ok(())
    }

    /// 获取网格，节点没有网格时为 None
    pub fn mesh(&self, lod: usize, node: usize) -> Result<Option<&Mesh>> {
        Ok(self.slot(lod, node)?.mesh.as_ref())
    }

    pub fn mesh_mut(&mut self, lod: usize, node: usize) -> Result<Option<&mut Mesh>> {
        Ok(self.slot_mut(lod, node)?.mesh.as_mut())
    }

    pub fn mesh_deformer_stack(
        &self,
        lod: usize,
        node: usize,
    ) -> Result<Option<&MeshDeformerStack>> {
        Ok(self.slot(lod, node)?.stack.as_ref())
    }

    pub fn mesh_deformer_stack_mut(
        &mut self,
        lod: usize,
        node: usize,
    ) -> Result<Option<&mut MeshDeformerStack>> {
        Ok(self.slot_mut(lod, node)?.stack.as_mut())
    }

    /// 按配置判断网格的变形方式，节点没有网格时为静态
    ///
    /// `config` 为 `None` 时使用全局配置。
    pub fn classify_mesh_type(
        &self,
        lod: usize,
        node: usize,
        config: Option<&SkinningConfig>,
    ) -> Result<MeshType> {
        let slot = self.slot(lod, node)?;
        let config = config.cloned().unwrap_or_else(get_config);
        Ok(slot.mesh.as_ref().map_or(MeshType::Static, |mesh| {
            mesh.classify_mesh_type(
                slot.stack.as_ref(),
                config.force_cpu_skinning,
                config.max_influences,
                config.max_bones_per_submesh,
            )
        }))
    }

    /// 重新初始化某 LOD 下所有变形器
    pub fn reinitialize_mesh_deformers(&mut self, lod: usize) -> Result<()> {
        let slots = self.lods.get_mut(lod).ok_or(SkinError::InvalidLod(lod))?;
        for slot in slots {
            if let (Some(mesh), Some(stack)) = (&slot.mesh, &mut slot.stack) {
                stack.reinitialize_deformers(mesh);
            }
        }
        Ok(())
    }
}
