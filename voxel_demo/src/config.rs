/// Demo settings

use std::path::PathBuf;

use voxel_engine::voxel::RendererConfig;

/// Directory holding the compiled `.spv` files, set by build.rs
const BUILD_SHADER_DIR: &str = env!("VOXEL_SHADER_DIR");

#[derive(Debug, Clone)]
pub struct DemoConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub shader_dir: PathBuf,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            title: "Voxel Demo".to_string(),
            width: 800,
            height: 600,
            shader_dir: PathBuf::from(BUILD_SHADER_DIR),
        }
    }
}

impl DemoConfig {
    /// Defaults, with `VOXEL_SHADER_DIR` overriding the build-time shader directory
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(dir) = std::env::var_os("VOXEL_SHADER_DIR") {
            config.shader_dir = PathBuf::from(dir);
        }
        config
    }

    pub fn shader_path(&self, name: &str) -> PathBuf {
        self.shader_dir.join(format!("{}.spv", name))
    }

    pub fn renderer_config(&self) -> RendererConfig {
        RendererConfig {
            enable_validation: cfg!(feature = "vulkan-validation"),
            ..RendererConfig::default()
        }
        .with_app_name(self.title.clone())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
