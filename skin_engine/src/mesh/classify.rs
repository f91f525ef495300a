//! 网格变形方式分类（GPU 蒙皮 / CPU 变形 / 静态）

use super::{Mesh, MeshType};
use crate::deformer::{DeformerType, MeshDeformerStack};

/// 判断网格能否在 GPU 上蒙皮
///
/// - 多于一个变形器：CPU
/// - 唯一的变形器不是线性混合蒙皮：CPU
/// - 强制 CPU、顶点影响数超过 `max_influences`、任一子网格骨骼数超过
///   `max_bones_per_sub_mesh`：CPU
/// - 没有变形器：静态
pub fn classify_mesh_type(
    mesh: &Mesh,
    stack: Option<&MeshDeformerStack>,
    force_cpu_skinning: bool,
    max_influences: usize,
    max_bones_per_sub_mesh: usize,
) -> MeshType {
    let Some(stack) = stack else {
        return MeshType::Static;
    };

    match stack.deformers() {
        [] => MeshType::Static,
        [deformer] if deformer.kind() == DeformerType::SoftSkin => {
            if force_cpu_skinning {
                return MeshType::CpuDeformed;
            }

            let mesh_max_influences = mesh.calc_max_num_influences();
            if mesh_max_influences > max_influences {
                log::warn!(
                    "*** 性能警告 *** 网格使用了超过 {} 个 ({}) 骨骼影响，改为 CPU 变形",
                    max_influences,
                    mesh_max_influences
                );
                return MeshType::CpuDeformed;
            }

            for (i, sub_mesh) in mesh.sub_meshes().iter().enumerate() {
                if sub_mesh.num_bones() > max_bones_per_sub_mesh {
                    log::warn!(
                        "*** 性能警告 *** 子网格 {} 使用了超过 {} 个骨骼 ({})，改为 CPU 变形",
                        i,
                        max_bones_per_sub_mesh,
                        sub_mesh.num_bones()
                    );
                    return MeshType::CpuDeformed;
                }
            }

            MeshType::GpuDeformed
        }
        _ => MeshType::CpuDeformed,
    }
}

impl Mesh {
    /// 见 [`classify_mesh_type`]
    pub fn classify_mesh_type(
        &self,
        stack: Option<&MeshDeformerStack>,
        force_cpu_skinning: bool,
        max_influences: usize,
        max_bones_per_sub_mesh: usize,
    ) -> MeshType {
        classify_mesh_type(
            self,
            stack,
            force_cpu_skinning,
            max_influences,
            max_bones_per_sub_mesh,
        )
    }
}
