//! 网格数据模型
//!
//! 顶点按“复制顶点”存储（硬边法线、UV 接缝会拆分顶点），
//! 通过 `OrgVtxNumbers` 层映射回原始顶点。蒙皮信息存放在按原始顶点索引的共享层中。

mod attribute_layer;
mod classify;
mod geometry;
mod runtime;
mod skinning_layer;
mod submesh;

pub use attribute_layer::{AttributeData, AttributeElement, VertexAttributeLayer};
pub use classify::classify_mesh_type;
pub use geometry::RayHit;
pub use runtime::Mesh;
pub use skinning_layer::{SkinInfluence, SkinningInfoVertexAttributeLayer};
pub use submesh::SubMesh;

pub(crate) use skinning_layer::optimize_influence_row;

/// 逐顶点属性类型
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    /// Vec3
    Positions,
    /// Vec3
    Normals,
    /// Vec4，w 为手性
    Tangents,
    /// Vec2
    UvCoords,
    /// u32 打包 RGBA
    Colors32,
    /// u32，复制顶点到原始顶点的映射
    OrgVtxNumbers,
    /// Vec4
    Colors128,
    /// Vec3
    Bitangents,
}

impl AttributeKind {
    /// 变形器会改写的属性
    pub fn is_deformable(self) -> bool {
        matches!(
            self,
            Self::Positions | Self::Normals | Self::Tangents | Self::Bitangents
        )
    }
}

/// 共享（按原始顶点）属性层
#[derive(Clone, Debug, PartialEq)]
pub enum SharedVertexAttributeLayer {
    SkinningInfo(SkinningInfoVertexAttributeLayer),
}

/// 共享层类型
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SharedAttributeKind {
    SkinningInfo,
}

impl SharedVertexAttributeLayer {
    pub fn kind(&self) -> SharedAttributeKind {
        match self {
            Self::SkinningInfo(_) => SharedAttributeKind::SkinningInfo,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::SkinningInfo(layer) => layer.name(),
        }
    }

    pub fn num_attributes(&self) -> usize {
        match self {
            Self::SkinningInfo(layer) => layer.num_attributes(),
        }
    }

    pub fn as_skinning_info(&self) -> Option<&SkinningInfoVertexAttributeLayer> {
        match self {
            Self::SkinningInfo(layer) => Some(layer),
        }
    }

    pub fn as_skinning_info_mut(&mut self) -> Option<&mut SkinningInfoVertexAttributeLayer> {
        match self {
            Self::SkinningInfo(layer) => Some(layer),
        }
    }
}

impl From<SkinningInfoVertexAttributeLayer> for SharedVertexAttributeLayer {
    fn from(layer: SkinningInfoVertexAttributeLayer) -> Self {
        Self::SkinningInfo(layer)
    }
}

/// 网格变形方式
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MeshType {
    /// 没有变形器
    Static,
    /// CPU 变形
    CpuDeformed,
    /// 可以在 GPU 上蒙皮
    GpuDeformed,
}
