/// PointLightSystem - uploads point lights to the global UBO and draws them as billboards
///
/// Each light is a camera-facing quad generated in the vertex shader from
/// six vertices, with no vertex input. Lights are drawn back to front so
/// alpha blending composes correctly.

use bytemuck::{Pod, Zeroable};
use glam::Vec4;

use crate::engine_warn;
use crate::error::Result;
use crate::graphics_device::{GraphicsDevice, PipelineConfig, PushConstantRange, ShaderStages};
use crate::renderer::{FrameInfo, GlobalUbo, PointLight, MAX_LIGHTS};
use crate::scene::{GameObject, Scene};
use super::system_pipeline::{ShaderSet, SystemPipeline};

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PointLightPushConstants {
    pub position: Vec4,
    /// rgb = color, w = intensity
    pub color: Vec4,
    pub radius: f32,
    pub _padding: [f32; 3],
}

const PUSH_STAGES: ShaderStages = ShaderStages::VERTEX.union(ShaderStages::FRAGMENT);

pub struct PointLightSystem<'d, D: GraphicsDevice> {
    device: &'d D,
    pipeline: SystemPipeline<'d, D>,
}

impl<'d, D: GraphicsDevice> PointLightSystem<'d, D> {
    pub fn new(
        device: &'d D,
        shaders: ShaderSet,
        render_pass: D::RenderPass,
        global_set_layout: D::DescriptorSetLayout,
        pipeline_epoch: u64,
    ) -> Result<Self> {
        let config = PipelineConfig::default()
            .without_vertex_input()
            .with_alpha_blending();
        let push_range = PushConstantRange {
            stages: PUSH_STAGES,
            offset: 0,
            size: std::mem::size_of::<PointLightPushConstants>() as u32,
        };
        let pipeline = SystemPipeline::new(
            device,
            "PointLightSystem",
            shaders,
            config,
            &[global_set_layout],
            &[push_range],
            render_pass,
            pipeline_epoch,
        )?;
        Ok(Self { device, pipeline })
    }

    pub fn refresh(&mut self, render_pass: D::RenderPass, pipeline_epoch: u64) -> Result<bool> {
        self.pipeline.refresh(render_pass, pipeline_epoch)
    }

    /// Write up to `MAX_LIGHTS` scene lights into `ubo`, in id order
    pub fn update(&self, scene: &Scene<'_, D>, ubo: &mut GlobalUbo) {
        let mut lights: Vec<&GameObject> = scene.point_lights().collect();
        lights.sort_by_key(|light| light.id());
        if lights.len() > MAX_LIGHTS {
            engine_warn!(
                "voxel::PointLightSystem",
                "{} point lights in the scene, only the first {} are lit",
                lights.len(),
                MAX_LIGHTS
            );
            lights.truncate(MAX_LIGHTS);
        }

        for (slot, light) in ubo.point_lights.iter_mut().zip(&lights) {
            *slot = PointLight {
                position: light.transform.translation.extend(1.0),
                color: light.color.extend(intensity(light)),
            };
        }
        ubo.num_lights = lights.len() as u32;
    }

    /// Draw every light billboard; must be called inside the swapchain render pass
    pub fn render(&self, frame_info: &FrameInfo<'_, D>, scene: &Scene<'_, D>) {
        let camera_position = frame_info.camera.position();
        let mut lights: Vec<(f32, &GameObject)> = scene
            .point_lights()
            .map(|light| (camera_position.distance_squared(light.transform.translation), light))
            .collect();
        // Farthest first
        lights.sort_by(|(a, la), (b, lb)| b.total_cmp(a).then(la.id().cmp(&lb.id())));

        let cb = frame_info.command_buffer;
        self.pipeline.bind(cb);
        self.device.cmd_bind_descriptor_sets(
            cb,
            self.pipeline.layout(),
            0,
            &[frame_info.global_descriptor_set],
        );

        for (_, light) in lights {
            let push = PointLightPushConstants {
                position: light.transform.translation.extend(1.0),
                color: light.color.extend(intensity(light)),
                radius: light.transform.scale,
                _padding: [0.0; 3],
            };
            self.device.cmd_push_constants(
                cb,
                self.pipeline.layout(),
                PUSH_STAGES,
                0,
                bytemuck::bytes_of(&push),
            );
            self.device.cmd_draw(cb, 6, 1, 0, 0);
        }
    }

    pub fn pipeline_epoch(&self) -> u64 {
        self.pipeline.epoch()
    }
}

fn intensity(light: &GameObject) -> f32 {
    light.point_light.map_or(0.0, |component| component.intensity)
}

#[cfg(test)]
#[path = "point_light_system_tests.rs"]
mod tests;
