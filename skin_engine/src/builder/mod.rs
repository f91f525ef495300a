//! 网格构建模块
//!
//! 导入器逐多边形提交顶点属性，构建器负责焊接相同顶点、
//! 按材质/骨骼数/顶点数划分子网格，最后烘焙为 [`crate::mesh::Mesh`]。

mod bake;
mod mesh_builder;
mod skinning_info;
mod sub_mesh;
pub mod triangle_list;
mod vertex_attribute_layer;

pub use mesh_builder::MeshBuilder;
pub use skinning_info::MeshBuilderSkinningInfo;
pub use sub_mesh::MeshBuilderSubMesh;
pub use vertex_attribute_layer::{AttributeValue, MeshBuilderVertexAttributeLayer};

/// 构建期顶点标识：原始顶点号 + 复制序号
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MeshBuilderVertexLookup {
    pub org_vtx: usize,
    pub duplicate_nr: usize,
}

impl MeshBuilderVertexLookup {
    pub fn new(org_vtx: usize, duplicate_nr: usize) -> Self {
        Self { org_vtx, duplicate_nr }
    }
}
