/// SystemPipeline - a render system's pipeline layout and graphics pipeline
///
/// The layout never depends on the render pass, so only the pipeline is
/// rebuilt when the renderer's pipeline epoch moves.

use crate::engine_debug;
use crate::error::Result;
use crate::graphics_device::{GraphicsDevice, PipelineConfig, PipelineDesc, PushConstantRange};

/// SPIR-V words of a vertex and fragment shader pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSet {
    pub vertex: Vec<u32>,
    pub fragment: Vec<u32>,
}

pub struct SystemPipeline<'d, D: GraphicsDevice> {
    device: &'d D,
    name: &'static str,
    shaders: ShaderSet,
    config: PipelineConfig,
    layout: D::PipelineLayout,
    pipeline: D::Pipeline,
    epoch: u64,
}

impl<'d, D: GraphicsDevice> SystemPipeline<'d, D> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        device: &'d D,
        name: &'static str,
        shaders: ShaderSet,
        config: PipelineConfig,
        set_layouts: &[D::DescriptorSetLayout],
        push_constant_ranges: &[PushConstantRange],
        render_pass: D::RenderPass,
        epoch: u64,
    ) -> Result<Self> {
        let layout = device.create_pipeline_layout(set_layouts, push_constant_ranges)?;
        let pipeline = match build(device, &shaders, &config, layout, render_pass) {
            Ok(pipeline) => pipeline,
            Err(e) => {
                device.destroy_pipeline_layout(layout);
                return Err(e);
            }
        };
        engine_debug!("voxel::RenderSystem", "{} pipeline created (epoch {})", name, epoch);
        Ok(Self { device, name, shaders, config, layout, pipeline, epoch })
    }

    /// Rebuild the pipeline against `render_pass` if `epoch` moved on
    ///
    /// Returns whether a rebuild happened. On error the old pipeline is kept.
    pub fn refresh(&mut self, render_pass: D::RenderPass, epoch: u64) -> Result<bool> {
        if epoch == self.epoch {
            return Ok(false);
        }
        let pipeline = build(self.device, &self.shaders, &self.config, self.layout, render_pass)?;
        self.device.destroy_pipeline(std::mem::replace(&mut self.pipeline, pipeline));
        engine_debug!(
            "voxel::RenderSystem",
            "{} pipeline rebuilt (epoch {} -> {})",
            self.name,
            self.epoch,
            epoch
        );
        self.epoch = epoch;
        Ok(true)
    }

    pub fn bind(&self, command_buffer: D::CommandBuffer) {
        self.device.cmd_bind_pipeline(command_buffer, self.pipeline);
    }

    pub fn layout(&self) -> D::PipelineLayout {
        self.layout
    }

    pub fn pipeline(&self) -> D::Pipeline {
        self.pipeline
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

impl<D: GraphicsDevice> Drop for SystemPipeline<'_, D> {
    fn drop(&mut self) {
        self.device.destroy_pipeline(self.pipeline);
        self.device.destroy_pipeline_layout(self.layout);
    }
}

fn build<D: GraphicsDevice>(
    device: &D,
    shaders: &ShaderSet,
    config: &PipelineConfig,
    layout: D::PipelineLayout,
    render_pass: D::RenderPass,
) -> Result<D::Pipeline> {
    device.create_graphics_pipeline(&PipelineDesc {
        vertex_spirv: &shaders.vertex,
        fragment_spirv: &shaders.fragment,
        layout,
        render_pass,
        config,
    })
}
