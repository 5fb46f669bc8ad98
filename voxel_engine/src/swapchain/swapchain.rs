/// Swapchain - presentable images, their render targets and frame synchronization
///
/// Owns the driver swapchain, one depth buffer and framebuffer per image, the
/// render pass they share, and the sync objects that pace frames:
///
/// - one image-available semaphore and one in-flight fence per frame slot
///   (`MAX_FRAMES_IN_FLIGHT`)
/// - one render-finished semaphore per swapchain image, so a semaphore is never
///   re-signaled while the presentation engine may still wait on it
/// - `images_in_flight`, the fence of the frame that last rendered each image
///
/// A swapchain is never resized in place. When it goes `Stale` the renderer
/// builds a replacement with `with_previous` and drops this one.

use std::time::Duration;

use crate::config::{RendererConfig, MAX_FRAMES_IN_FLIGHT};
use crate::error::Result;
use crate::graphics_device::surface::{
    choose_extent, choose_image_count, choose_present_mode, choose_surface_format,
};
use crate::graphics_device::{
    AcquireOutcome, Extent2D, Format, GraphicsDevice, ImageAspect, ImageDesc, MemoryProperties,
    PresentMode, SurfaceFormat, SwapchainDesc, SwapchainStatus,
};
use crate::{engine_debug, engine_error, engine_warn};

/// Whether the swapchain still matches its surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapchainState {
    Valid,
    /// Out of date or suboptimal; must be recreated before further use
    Stale,
}

pub struct Swapchain<'d, D: GraphicsDevice> {
    device: &'d D,
    handle: D::Swapchain,
    state: SwapchainState,

    surface_format: SurfaceFormat,
    depth_format: Format,
    present_mode: PresentMode,
    extent: Extent2D,

    render_pass: D::RenderPass,
    images: Vec<D::Image>,
    image_views: Vec<D::ImageView>,
    depth_images: Vec<(D::Image, D::DeviceMemory)>,
    depth_image_views: Vec<D::ImageView>,
    framebuffers: Vec<D::Framebuffer>,

    image_available_semaphores: Vec<D::Semaphore>,
    render_finished_semaphores: Vec<D::Semaphore>,
    in_flight_fences: Vec<D::Fence>,
    images_in_flight: Vec<Option<D::Fence>>,
    current_frame: usize,

    fence_timeout: Option<Duration>,
}

impl<'d, D: GraphicsDevice> Swapchain<'d, D> {
    /// Build a swapchain for a window of `window_extent`
    pub fn new(device: &'d D, window_extent: Extent2D, config: &RendererConfig) -> Result<Self> {
        Self::build(device, window_extent, config, None)
    }

    /// Build a replacement for `previous`, handing its handle to the driver for reuse
    ///
    /// `previous` stays valid and must be dropped by the caller afterwards.
    pub fn with_previous(
        device: &'d D,
        window_extent: Extent2D,
        config: &RendererConfig,
        previous: &Swapchain<'d, D>,
    ) -> Result<Self> {
        Self::build(device, window_extent, config, Some(previous.handle))
    }

    fn build(
        device: &'d D,
        window_extent: Extent2D,
        config: &RendererConfig,
        previous: Option<D::Swapchain>,
    ) -> Result<Self> {
        let capabilities = device.surface_capabilities()?;
        let surface_format = choose_surface_format(&device.surface_formats()?)?;
        let present_mode =
            choose_present_mode(&device.surface_present_modes()?, config.preferred_present_mode);
        let extent = choose_extent(&capabilities, window_extent);
        let min_image_count = choose_image_count(&capabilities);
        let depth_format = device.find_depth_format()?;

        let render_pass = device.create_render_pass(surface_format.format, depth_format)?;
        let desc = SwapchainDesc { surface_format, present_mode, extent, min_image_count };
        let handle = match device.create_swapchain(&desc, previous) {
            Ok(handle) => handle,
            Err(e) => {
                device.destroy_render_pass(render_pass);
                return Err(e);
            }
        };

        // From here on, Drop releases whatever was created if a step fails
        let mut swapchain = Self {
            device,
            handle,
            state: SwapchainState::Valid,
            surface_format,
            depth_format,
            present_mode,
            extent,
            render_pass,
            images: Vec::new(),
            image_views: Vec::new(),
            depth_images: Vec::new(),
            depth_image_views: Vec::new(),
            framebuffers: Vec::new(),
            image_available_semaphores: Vec::new(),
            render_finished_semaphores: Vec::new(),
            in_flight_fences: Vec::new(),
            images_in_flight: Vec::new(),
            current_frame: 0,
            fence_timeout: config.fence_timeout,
        };

        swapchain.images = device.swapchain_images(handle)?;
        swapchain.create_render_targets()?;
        swapchain.create_sync_objects()?;

        engine_debug!(
            "voxel::Swapchain",
            "Swapchain created: {} images, {}x{}, {:?}, {:?}, depth {:?}",
            swapchain.images.len(),
            extent.width,
            extent.height,
            surface_format.format,
            present_mode,
            depth_format
        );
        Ok(swapchain)
    }

    fn create_render_targets(&mut self) -> Result<()> {
        let device = self.device;
        for &image in &self.images {
            self.image_views.push(device.create_image_view(
                image,
                self.surface_format.format,
                ImageAspect::Color,
            )?);
        }

        let depth_desc = ImageDesc::depth_attachment(self.extent, self.depth_format);
        for _ in 0..self.images.len() {
            let (image, memory) = device.create_image(&depth_desc, MemoryProperties::DEVICE_LOCAL)?;
            self.depth_images.push((image, memory));
            self.depth_image_views
                .push(device.create_image_view(image, self.depth_format, ImageAspect::Depth)?);
        }

        for (&view, &depth_view) in self.image_views.iter().zip(&self.depth_image_views) {
            self.framebuffers.push(device.create_framebuffer(
                self.render_pass,
                &[view, depth_view],
                self.extent,
            )?);
        }
        Ok(())
    }

    fn create_sync_objects(&mut self) -> Result<()> {
        let device = self.device;
        for _ in 0..MAX_FRAMES_IN_FLIGHT {
            self.image_available_semaphores.push(device.create_semaphore()?);
            self.in_flight_fences.push(device.create_fence(true)?);
        }
        for _ in 0..self.images.len() {
            self.render_finished_semaphores.push(device.create_semaphore()?);
        }
        self.images_in_flight = vec![None; self.images.len()];
        Ok(())
    }

    /// Wait for the current frame slot to be free and acquire the next image
    ///
    /// A returned image is idle: if an earlier frame still renders into it,
    /// this blocks on that frame's fence first.
    ///
    /// `OutOfDate` and suboptimal acquisitions mark the swapchain `Stale`;
    /// a suboptimal image is still returned and may be rendered and presented.
    pub fn acquire_next_image(&mut self) -> Result<AcquireOutcome> {
        let frame = self.current_frame;
        self.device
            .wait_for_fence(self.in_flight_fences[frame], self.fence_timeout)
            .inspect_err(|e| {
                engine_error!("voxel::Swapchain", "Waiting for frame slot {} failed: {}", frame, e)
            })?;

        let outcome = self.device.acquire_next_image(
            self.handle,
            self.image_available_semaphores[frame],
            self.fence_timeout,
        )?;

        match outcome {
            AcquireOutcome::Acquired { image_index, suboptimal } => {
                debug_assert!(
                    (image_index as usize) < self.images.len(),
                    "acquired image {} out of {}",
                    image_index,
                    self.images.len()
                );
                if suboptimal {
                    self.state = SwapchainState::Stale;
                }
                // The image's command buffer is re-recorded next; its last frame must be done
                self.wait_for_image(image_index as usize)?;
            }
            AcquireOutcome::OutOfDate => self.state = SwapchainState::Stale,
        }
        Ok(outcome)
    }

    /// Submit `command_buffer` for `image_index` and present it
    ///
    /// The frame slot advances whether or not the submission or the present
    /// succeeded.
    pub fn submit_and_present(
        &mut self,
        command_buffer: D::CommandBuffer,
        image_index: u32,
    ) -> Result<SwapchainStatus> {
        let result = self.submit_frame(command_buffer, image_index as usize);
        self.current_frame = (self.current_frame + 1) % MAX_FRAMES_IN_FLIGHT;

        if let Ok(SwapchainStatus::OutOfDate | SwapchainStatus::Suboptimal) = result {
            self.state = SwapchainState::Stale;
        }
        result
    }

    fn submit_frame(&mut self, command_buffer: D::CommandBuffer, image: usize) -> Result<SwapchainStatus> {
        let frame = self.current_frame;

        // Another slot may still be rendering into this image
        self.wait_for_image(image)?;
        let fence = self.in_flight_fences[frame];
        self.images_in_flight[image] = Some(fence);

        self.device.reset_fence(fence)?;
        self.device
            .submit(
                command_buffer,
                Some(self.image_available_semaphores[frame]),
                Some(self.render_finished_semaphores[image]),
                Some(fence),
            )
            .inspect_err(|e| engine_error!("voxel::Swapchain", "Failed to submit frame: {}", e))?;

        self.device
            .queue_present(self.handle, image as u32, self.render_finished_semaphores[image])
            .inspect_err(|e| engine_error!("voxel::Swapchain", "Failed to present image {}: {}", image, e))
    }

    /// Block until the last frame submitted for `image` has finished
    fn wait_for_image(&self, image: usize) -> Result<()> {
        let Some(fence) = self.images_in_flight[image] else {
            return Ok(());
        };
        self.device.wait_for_fence(fence, self.fence_timeout).inspect_err(|e| {
            engine_error!("voxel::Swapchain", "Waiting for image {} failed: {}", image, e)
        })
    }

    // ===== ACCESSORS =====

    pub fn state(&self) -> SwapchainState {
        self.state
    }

    pub fn is_stale(&self) -> bool {
        self.state == SwapchainState::Stale
    }

    /// Frame-in-flight slot the next frame will use
    pub fn current_frame(&self) -> usize {
        self.current_frame
    }

    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    pub fn extent(&self) -> Extent2D {
        self.extent
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.extent.aspect_ratio()
    }

    pub fn render_pass(&self) -> D::RenderPass {
        self.render_pass
    }

    pub fn framebuffer(&self, index: usize) -> D::Framebuffer {
        self.framebuffers[index]
    }

    pub fn image_format(&self) -> Format {
        self.surface_format.format
    }

    pub fn depth_format(&self) -> Format {
        self.depth_format
    }

    pub fn present_mode(&self) -> PresentMode {
        self.present_mode
    }

    /// Fence of the frame that last rendered `image`, if any
    pub fn image_fence(&self, image: usize) -> Option<D::Fence> {
        self.images_in_flight[image]
    }

    /// True when both swapchains render to the same color and depth formats
    pub fn compare_formats(&self, other: &Swapchain<'_, D>) -> bool {
        self.surface_format.format == other.surface_format.format
            && self.depth_format == other.depth_format
    }

    /// Per-image and per-slot collections have consistent lengths
    pub fn invariants_hold(&self) -> bool {
        let n = self.images.len();
        n > 0
            && self.image_views.len() == n
            && self.depth_images.len() == n
            && self.depth_image_views.len() == n
            && self.framebuffers.len() == n
            && self.render_finished_semaphores.len() == n
            && self.images_in_flight.len() == n
            && self.image_available_semaphores.len() == MAX_FRAMES_IN_FLIGHT
            && self.in_flight_fences.len() == MAX_FRAMES_IN_FLIGHT
            && self.current_frame < MAX_FRAMES_IN_FLIGHT
    }
}

impl<D: GraphicsDevice> Drop for Swapchain<'_, D> {
    fn drop(&mut self) {
        if let Err(e) = self.device.wait_idle() {
            engine_warn!("voxel::Swapchain", "wait_idle failed before teardown: {}", e);
        }
        let device = self.device;
        for semaphore in self.image_available_semaphores.drain(..) {
            device.destroy_semaphore(semaphore);
        }
        for semaphore in self.render_finished_semaphores.drain(..) {
            device.destroy_semaphore(semaphore);
        }
        for fence in self.in_flight_fences.drain(..) {
            device.destroy_fence(fence);
        }
        for framebuffer in self.framebuffers.drain(..) {
            device.destroy_framebuffer(framebuffer);
        }
        for view in self.depth_image_views.drain(..) {
            device.destroy_image_view(view);
        }
        for (image, memory) in self.depth_images.drain(..) {
            device.destroy_image(image, memory);
        }
        for view in self.image_views.drain(..) {
            device.destroy_image_view(view);
        }
        device.destroy_render_pass(self.render_pass);
        device.destroy_swapchain(self.handle);
    }
}

#[cfg(test)]
#[path = "swapchain_tests.rs"]
mod tests;
