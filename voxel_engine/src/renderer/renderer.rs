/// Renderer - per-frame protocol over a Swapchain
///
/// A frame is `frame_begin` -> record (usually inside
/// `begin_swapchain_render_pass` / `end_swapchain_render_pass`) -> `frame_end`.
/// The renderer owns one primary command buffer per swapchain image and
/// rebuilds the swapchain when it goes out of date, turns suboptimal, or the
/// window is resized.

use crate::config::RendererConfig;
use crate::error::Result;
use crate::graphics_device::{
    AcquireOutcome, ClearValue, Extent2D, GraphicsDevice, Rect2D, SwapchainStatus, Viewport,
};
use crate::swapchain::Swapchain;
use crate::window::Window;
use crate::{engine_debug, engine_warn};

/// How `frame_end` finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameEnd {
    /// The image was queued for presentation and the swapchain is still valid
    Presented,
    /// The swapchain was rebuilt after this frame; the frame may not have been shown
    SwapchainRecreated,
}

pub struct Renderer<'d, D: GraphicsDevice> {
    device: &'d D,
    swapchain: Swapchain<'d, D>,
    config: RendererConfig,
    command_buffers: Vec<D::CommandBuffer>,
    current_image_index: u32,
    is_frame_started: bool,
    /// Bumped when a recreated swapchain changes color or depth format
    pipeline_epoch: u64,
}

impl<'d, D: GraphicsDevice> Renderer<'d, D> {
    pub fn new(device: &'d D, swapchain: Swapchain<'d, D>, config: RendererConfig) -> Result<Self> {
        let command_buffers = device.allocate_command_buffers(swapchain.image_count() as u32)?;
        engine_debug!(
            "voxel::Renderer",
            "Renderer created with {} command buffers",
            command_buffers.len()
        );
        Ok(Self {
            device,
            swapchain,
            config,
            command_buffers,
            current_image_index: 0,
            is_frame_started: false,
            pipeline_epoch: 0,
        })
    }

    /// Acquire an image and begin its command buffer
    ///
    /// Returns `None` when the swapchain was out of date; it has been recreated
    /// and the caller should skip this frame.
    pub fn frame_begin<W: Window + ?Sized>(&mut self, window: &mut W) -> Result<Option<D::CommandBuffer>> {
        debug_assert!(!self.is_frame_started, "Can't begin a frame while one is already in progress");

        let image_index = match self.swapchain.acquire_next_image()? {
            AcquireOutcome::Acquired { image_index, .. } => image_index,
            AcquireOutcome::OutOfDate => {
                engine_debug!("voxel::Renderer", "Swapchain out of date on acquire, recreating");
                self.recreate_swapchain(window)?;
                return Ok(None);
            }
        };

        self.current_image_index = image_index;
        let command_buffer = self.command_buffers[image_index as usize];
        self.device.begin_command_buffer(command_buffer, false)?;
        self.is_frame_started = true;
        Ok(Some(command_buffer))
    }

    /// End the current command buffer, submit it and present
    pub fn frame_end<W: Window + ?Sized>(&mut self, window: &mut W) -> Result<FrameEnd> {
        debug_assert!(self.is_frame_started, "Can't end a frame when one isn't in progress");
        self.is_frame_started = false;

        let command_buffer = self.current_command_buffer();
        self.device.end_command_buffer(command_buffer)?;
        let status = self
            .swapchain
            .submit_and_present(command_buffer, self.current_image_index)?;

        if status != SwapchainStatus::Success || window.was_resized() || self.swapchain.is_stale() {
            engine_debug!(
                "voxel::Renderer",
                "Recreating swapchain after present ({:?}, resized: {})",
                status,
                window.was_resized()
            );
            window.reset_resized_flag();
            self.recreate_swapchain(window)?;
            return Ok(FrameEnd::SwapchainRecreated);
        }
        Ok(FrameEnd::Presented)
    }

    /// Begin the swapchain render pass on `command_buffer` and set viewport and scissor
    pub fn begin_swapchain_render_pass(&self, command_buffer: D::CommandBuffer) {
        debug_assert!(
            self.is_frame_started,
            "Can't begin the swapchain render pass when no frame is in progress"
        );
        debug_assert!(
            command_buffer == self.current_command_buffer(),
            "Can't begin the swapchain render pass with a command buffer from another frame"
        );

        let extent = self.swapchain.extent();
        let clear_values = [
            ClearValue::Color(self.config.clear_color),
            ClearValue::DepthStencil { depth: 1.0, stencil: 0 },
        ];
        self.device.cmd_begin_render_pass(
            command_buffer,
            self.swapchain.render_pass(),
            self.swapchain.framebuffer(self.current_image_index as usize),
            extent,
            &clear_values,
        );
        self.device.cmd_set_viewport(command_buffer, Viewport::from_extent(extent));
        self.device.cmd_set_scissor(command_buffer, Rect2D::from_extent(extent));
    }

    pub fn end_swapchain_render_pass(&self, command_buffer: D::CommandBuffer) {
        debug_assert!(
            self.is_frame_started,
            "Can't end the swapchain render pass when no frame is in progress"
        );
        debug_assert!(
            command_buffer == self.current_command_buffer(),
            "Can't end the swapchain render pass with a command buffer from another frame"
        );
        self.device.cmd_end_render_pass(command_buffer);
    }

    /// Rebuild the swapchain for the window's current size
    ///
    /// Blocks in `wait_events` while the window is minimized.
    pub fn recreate_swapchain<W: Window + ?Sized>(&mut self, window: &mut W) -> Result<()> {
        let mut extent = window.extent();
        while extent.is_empty() {
            window.wait_events();
            extent = window.extent();
        }

        self.device.wait_idle()?;
        let swapchain = Swapchain::with_previous(self.device, extent, &self.config, &self.swapchain)?;
        let formats_match = swapchain.compare_formats(&self.swapchain);
        self.swapchain = swapchain;

        if self.swapchain.image_count() != self.command_buffers.len() {
            let old = std::mem::take(&mut self.command_buffers);
            self.device.free_command_buffers(&old);
            self.command_buffers = self
                .device
                .allocate_command_buffers(self.swapchain.image_count() as u32)?;
        }

        if !formats_match {
            self.pipeline_epoch += 1;
            engine_debug!(
                "voxel::Renderer",
                "Swapchain formats changed, pipeline epoch now {}",
                self.pipeline_epoch
            );
        }
        Ok(())
    }

    // ===== ACCESSORS =====

    /// Frame-in-flight slot of the frame being recorded (or about to be)
    pub fn frame_index(&self) -> usize {
        self.swapchain.current_frame()
    }

    pub fn current_command_buffer(&self) -> D::CommandBuffer {
        self.command_buffers[self.current_image_index as usize]
    }

    pub fn is_frame_started(&self) -> bool {
        self.is_frame_started
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.swapchain.aspect_ratio()
    }

    pub fn extent(&self) -> Extent2D {
        self.swapchain.extent()
    }

    pub fn render_pass(&self) -> D::RenderPass {
        self.swapchain.render_pass()
    }

    /// Pipelines built against an older epoch must be rebuilt
    pub fn pipeline_epoch(&self) -> u64 {
        self.pipeline_epoch
    }

    pub fn swapchain(&self) -> &Swapchain<'d, D> {
        &self.swapchain
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    pub fn device(&self) -> &'d D {
        self.device
    }

    pub fn wait_idle(&self) -> Result<()> {
        self.device.wait_idle()
    }
}

impl<D: GraphicsDevice> Drop for Renderer<'_, D> {
    fn drop(&mut self) {
        if let Err(e) = self.device.wait_idle() {
            engine_warn!("voxel::Renderer", "wait_idle failed before teardown: {}", e);
        }
        self.device.free_command_buffers(&self.command_buffers);
    }
}

#[cfg(test)]
#[path = "renderer_tests.rs"]
mod tests;
