//! 蒙皮配置
//!
//! 所有阈值扁平化存放。进程内有一份全局配置：`MeshBuilder::new` 从中读取
//! 焊接容差，`Actor::classify_mesh_type` 未传配置时使用它。

use once_cell::sync::Lazy;
use serde::Deserialize;
use std::sync::RwLock;

use crate::{Result, SkinError};

/// 蒙皮配置（扁平化，不嵌套）
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SkinningConfig {
    // ========== GPU 蒙皮限制 ==========
    /// 每个顶点允许的最大影响数，超过则整个网格回退到 CPU，默认 4
    pub max_influences: usize,
    /// 每个子网格允许的最大骨骼数，默认 50
    pub max_bones_per_submesh: usize,
    /// 每个子网格允许的最大顶点数，默认 65535
    pub max_submesh_vertices: usize,
    /// 强制 CPU 蒙皮，默认 false
    pub force_cpu_skinning: bool,

    // ========== 权重优化 ==========
    /// 低于该值的权重会被剔除，默认 0.0001
    pub weight_tolerance: f32,
    /// 优化后每个顶点保留的最大权重数，默认 4
    pub max_weights_per_vertex: usize,

    // ========== 构建 ==========
    /// 顶点焊接时属性比较的容差，默认 0.00001
    pub vertex_weld_tolerance: f32,
}

impl Default for SkinningConfig {
    fn default() -> Self {
        Self {
            max_influences: 4,
            max_bones_per_submesh: 50,
            max_submesh_vertices: 65535,
            force_cpu_skinning: false,
            weight_tolerance: 0.0001,
            max_weights_per_vertex: 4,
            vertex_weld_tolerance: 0.00001,
        }
    }
}

impl SkinningConfig {
    /// 从 TOML 文本解析，缺失字段使用默认值
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| SkinError::Config(e.to_string()))
    }

    /// 从 TOML 文件加载
    pub fn load<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}

/// 全局配置实例
static SKINNING_CONFIG: Lazy<RwLock<SkinningConfig>> =
    Lazy::new(|| RwLock::new(SkinningConfig::default()));

/// 获取当前配置（只读副本）
pub fn get_config() -> SkinningConfig {
    match SKINNING_CONFIG.read() {
        Ok(config) => config.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}

/// 手动设置配置
pub fn set_config(config: SkinningConfig) {
    match SKINNING_CONFIG.write() {
        Ok(mut guard) => *guard = config,
        Err(poisoned) => *poisoned.into_inner() = config,
    }
}

/// 重置为默认配置
pub fn reset_config() {
    set_config(SkinningConfig::default());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = SkinningConfig::from_toml_str(
            "max_bones_per_submesh = 24\nforce_cpu_skinning = true\n",
        )
        .unwrap();
        assert_eq!(config.max_bones_per_submesh, 24);
        assert!(config.force_cpu_skinning);
        assert_eq!(config.max_influences, 4);
        assert_eq!(config.max_submesh_vertices, 65535);
    }

    #[test]
    fn test_invalid_toml() {
        let err = SkinningConfig::from_toml_str("max_influences = \"four\"").unwrap_err();
        assert!(matches!(err, SkinError::Config(_)));
    }

    #[test]
    fn test_global_config_roundtrip() {
        let mut config = get_config();
        config.weight_tolerance = 0.01;
        set_config(config.clone());
        assert_eq!(get_config().weight_tolerance, 0.01);
        reset_config();
        assert_eq!(get_config(), SkinningConfig::default());
    }
}
