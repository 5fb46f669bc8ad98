/// SimpleRenderSystem - draws every game object that has a mesh
///
/// Objects are drawn sorted by mesh so each mesh is bound once per pass.
/// Point lights are skipped; `PointLightSystem` draws them.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec4};

use crate::error::Result;
use crate::graphics_device::{GraphicsDevice, PipelineConfig, PushConstantRange, ShaderStages};
use crate::renderer::FrameInfo;
use crate::scene::{GameObject, MeshHandle, Scene, Vertex};
use super::system_pipeline::{ShaderSet, SystemPipeline};

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct SimplePushConstants {
    /// projection * view * model
    pub transform: Mat4,
    /// rgb = object color
    pub color: Vec4,
}

const PUSH_STAGES: ShaderStages = ShaderStages::VERTEX.union(ShaderStages::FRAGMENT);

pub struct SimpleRenderSystem<'d, D: GraphicsDevice> {
    device: &'d D,
    pipeline: SystemPipeline<'d, D>,
}

impl<'d, D: GraphicsDevice> SimpleRenderSystem<'d, D> {
    pub fn new(
        device: &'d D,
        shaders: ShaderSet,
        render_pass: D::RenderPass,
        global_set_layout: D::DescriptorSetLayout,
        pipeline_epoch: u64,
    ) -> Result<Self> {
        let config = PipelineConfig {
            vertex_bindings: Vertex::bindings(),
            vertex_attributes: Vertex::attributes(),
            ..PipelineConfig::default()
        };
        let push_range = PushConstantRange {
            stages: PUSH_STAGES,
            offset: 0,
            size: std::mem::size_of::<SimplePushConstants>() as u32,
        };
        let pipeline = SystemPipeline::new(
            device,
            "SimpleRenderSystem",
            shaders,
            config,
            &[global_set_layout],
            &[push_range],
            render_pass,
            pipeline_epoch,
        )?;
        Ok(Self { device, pipeline })
    }

    /// Rebuild the pipeline when the renderer's pipeline epoch changed
    pub fn refresh(&mut self, render_pass: D::RenderPass, pipeline_epoch: u64) -> Result<bool> {
        self.pipeline.refresh(render_pass, pipeline_epoch)
    }

    /// Record draws for all mesh objects; must be called inside the swapchain render pass
    pub fn render(&self, frame_info: &FrameInfo<'_, D>, scene: &Scene<'_, D>) {
        let cb = frame_info.command_buffer;
        self.pipeline.bind(cb);
        self.device.cmd_bind_descriptor_sets(
            cb,
            self.pipeline.layout(),
            0,
            &[frame_info.global_descriptor_set],
        );

        let mut drawables: Vec<(MeshHandle, &GameObject)> = scene
            .objects()
            .filter(|object| !object.is_point_light())
            .filter_map(|object| object.mesh.map(|mesh| (mesh, object)))
            .collect();
        drawables.sort_by_key(|(mesh, object)| (*mesh, object.id()));

        let projection_view = frame_info.camera.view_projection_matrix();
        let mut bound: Option<MeshHandle> = None;
        for (handle, object) in drawables {
            let Some(mesh) = scene.mesh(handle) else {
                continue;
            };
            let push = SimplePushConstants {
                transform: projection_view * object.transform.matrix(),
                color: object.color.extend(1.0),
            };
            self.device.cmd_push_constants(
                cb,
                self.pipeline.layout(),
                PUSH_STAGES,
                0,
                bytemuck::bytes_of(&push),
            );
            if bound != Some(handle) {
                mesh.bind(cb);
                bound = Some(handle);
            }
            mesh.draw(cb);
        }
    }

    pub fn pipeline_epoch(&self) -> u64 {
        self.pipeline.epoch()
    }
}

#[cfg(test)]
#[path = "simple_render_system_tests.rs"]
mod tests;
