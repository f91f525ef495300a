//! Skin Engine - 角色网格蒙皮变形管线
//!
//! 提供：
//! - 复制顶点网格模型（原始顶点映射、共享/非共享属性层）
//! - MeshBuilder 导入构建（顶点焊接、按骨骼数/顶点数划分子网格）
//! - 蒙皮权重优化
//! - 变形器栈（Morph、线性混合蒙皮、对偶四元数蒙皮）
//! - Actor / ActorInstance 与多实例更新调度

pub mod actor;
pub mod builder;
pub mod config;
pub mod deformer;
pub mod math;
pub mod mesh;
pub mod skeleton;

pub use actor::{Actor, ActorInstance, UpdateScheduler};
pub use builder::{MeshBuilder, MeshBuilderSkinningInfo};
pub use config::SkinningConfig;
pub use deformer::{
    DeformContext, DeformerType, DualQuatSkinDeformer, MeshDeformer, MeshDeformerStack,
    MorphMeshDeformer, MorphTarget, SoftSkinDeformer,
};
pub use mesh::{AttributeKind, Mesh, MeshType, SkinningInfoVertexAttributeLayer, SubMesh};
pub use skeleton::{Node, Pose, Skeleton};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SkinError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Mesh builder error: {0}")]
    Builder(String),

    #[error("Invalid node index: {0}")]
    InvalidNode(usize),

    #[error("Invalid LOD level: {0}")]
    InvalidLod(usize),
}

pub type Result<T> = std::result::Result<T, SkinError>;
