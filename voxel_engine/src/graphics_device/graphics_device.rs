/// GraphicsDevice trait - the GPU primitives the frame core is built on
///
/// A backend (Vulkan, or the test mock) owns the logical device, its queues,
/// the command pool and the presentation surface. Everything above this trait
/// (swapchain state machine, frame coordinator, render systems) is backend
/// independent and only manipulates the opaque handles declared here.
///
/// Handles are plain `Copy` values; ownership of the GPU object they name is
/// tracked by whoever created them and must end with the matching `destroy_*`
/// call. Recording calls (`cmd_*`) never fail: errors surface when the
/// command buffer is ended or submitted.

use std::fmt::Debug;
use std::time::Duration;

use crate::error::Result;
use crate::graphics_device::command::{
    ClearValue, ImageAspect, ImageDesc, IndexType, Rect2D, ShaderStages, Viewport,
};
use crate::graphics_device::descriptor::{DescriptorBinding, DescriptorPoolSize, DescriptorWrite};
use crate::graphics_device::format::{
    find_supported_format, Format, FormatFeatures, FormatProperties, ImageTiling, SurfaceFormat,
    DEPTH_FORMAT_CANDIDATES,
};
use crate::graphics_device::memory::{find_memory_type, BufferUsage, MemoryProperties, MemoryType};
use crate::graphics_device::pipeline::{PipelineDesc, PushConstantRange};
use crate::graphics_device::surface::{
    AcquireOutcome, Extent2D, PresentMode, SurfaceCapabilities, SwapchainDesc, SwapchainStatus,
};

/// Bound shared by every handle type
pub trait GpuHandle: Copy + Eq + Debug {}

impl<T: Copy + Eq + Debug> GpuHandle for T {}

pub trait GraphicsDevice {
    type Fence: GpuHandle;
    type Semaphore: GpuHandle;
    type CommandBuffer: GpuHandle;
    type Buffer: GpuHandle;
    type DeviceMemory: GpuHandle;
    type Image: GpuHandle;
    type ImageView: GpuHandle;
    type RenderPass: GpuHandle;
    type Framebuffer: GpuHandle;
    type Swapchain: GpuHandle;
    type PipelineLayout: GpuHandle;
    type Pipeline: GpuHandle;
    type DescriptorSetLayout: GpuHandle;
    type DescriptorPool: GpuHandle;
    type DescriptorSet: GpuHandle;

    // ===== DEVICE QUERIES =====

    /// The device's memory type table, in driver order
    fn memory_types(&self) -> &[MemoryType];

    fn format_properties(&self, format: Format) -> FormatProperties;

    /// Alignment required between dynamic uniform buffer instances
    fn min_uniform_buffer_offset_alignment(&self) -> u64;

    /// First memory type allowed by `type_filter` that has all of `properties`
    fn find_memory_type(&self, type_filter: u32, properties: MemoryProperties) -> Result<u32> {
        find_memory_type(self.memory_types(), type_filter, properties)
    }

    fn find_supported_format(
        &self,
        candidates: &[Format],
        tiling: ImageTiling,
        features: FormatFeatures,
    ) -> Result<Format> {
        find_supported_format(candidates, tiling, features, |format| {
            self.format_properties(format)
        })
    }

    /// Preferred depth attachment format
    fn find_depth_format(&self) -> Result<Format> {
        self.find_supported_format(
            &DEPTH_FORMAT_CANDIDATES,
            ImageTiling::Optimal,
            FormatFeatures::DEPTH_STENCIL_ATTACHMENT,
        )
    }

    // ===== SYNCHRONIZATION =====

    fn create_fence(&self, signaled: bool) -> Result<Self::Fence>;
    fn destroy_fence(&self, fence: Self::Fence);

    /// Block until `fence` is signaled; `None` waits forever
    fn wait_for_fence(&self, fence: Self::Fence, timeout: Option<Duration>) -> Result<()>;
    fn reset_fence(&self, fence: Self::Fence) -> Result<()>;

    fn create_semaphore(&self) -> Result<Self::Semaphore>;
    fn destroy_semaphore(&self, semaphore: Self::Semaphore);

    /// Block until every queue of the device is idle
    fn wait_idle(&self) -> Result<()>;

    // ===== COMMAND BUFFERS AND SUBMISSION =====

    fn allocate_command_buffers(&self, count: u32) -> Result<Vec<Self::CommandBuffer>>;
    fn free_command_buffers(&self, command_buffers: &[Self::CommandBuffer]);
    fn begin_command_buffer(&self, command_buffer: Self::CommandBuffer, one_time_submit: bool) -> Result<()>;
    fn end_command_buffer(&self, command_buffer: Self::CommandBuffer) -> Result<()>;

    /// Submit one command buffer to the graphics queue
    ///
    /// `wait` is waited on at the color-attachment-output stage; `signal` and
    /// `fence` are signaled when the command buffer completes.
    fn submit(
        &self,
        command_buffer: Self::CommandBuffer,
        wait: Option<Self::Semaphore>,
        signal: Option<Self::Semaphore>,
        fence: Option<Self::Fence>,
    ) -> Result<()>;

    /// Block until the graphics queue is idle
    fn queue_wait_idle(&self) -> Result<()>;

    /// Allocate and begin a transient command buffer
    fn begin_single_time_commands(&self) -> Result<Self::CommandBuffer> {
        let command_buffer = self
            .allocate_command_buffers(1)?
            .into_iter()
            .next()
            .ok_or_else(|| crate::engine_err!("voxel::Device", "Command buffer allocation returned nothing"))?;
        if let Err(e) = self.begin_command_buffer(command_buffer, true) {
            self.free_command_buffers(&[command_buffer]);
            return Err(e);
        }
        Ok(command_buffer)
    }

    /// End, submit and wait for a buffer from `begin_single_time_commands`, then free it
    fn end_single_time_commands(&self, command_buffer: Self::CommandBuffer) -> Result<()> {
        let result = self
            .end_command_buffer(command_buffer)
            .and_then(|_| self.submit(command_buffer, None, None, None))
            .and_then(|_| self.queue_wait_idle());
        self.free_command_buffers(&[command_buffer]);
        result
    }

    /// Copy `size` bytes between buffers and wait for completion
    fn copy_buffer(&self, src: Self::Buffer, dst: Self::Buffer, size: u64) -> Result<()> {
        let command_buffer = self.begin_single_time_commands()?;
        self.cmd_copy_buffer(command_buffer, src, dst, size);
        self.end_single_time_commands(command_buffer)
    }

    /// Copy tightly packed texels into an image in transfer-destination layout
    fn copy_buffer_to_image(
        &self,
        buffer: Self::Buffer,
        image: Self::Image,
        extent: Extent2D,
        layer_count: u32,
    ) -> Result<()> {
        let command_buffer = self.begin_single_time_commands()?;
        self.cmd_copy_buffer_to_image(command_buffer, buffer, image, extent, layer_count);
        self.end_single_time_commands(command_buffer)
    }

    // ===== BUFFERS, IMAGES AND MEMORY =====

    /// Create a buffer bound to freshly allocated memory
    fn create_buffer(
        &self,
        size: u64,
        usage: BufferUsage,
        properties: MemoryProperties,
    ) -> Result<(Self::Buffer, Self::DeviceMemory)>;
    fn destroy_buffer(&self, buffer: Self::Buffer, memory: Self::DeviceMemory);

    /// Copy `data` into host-visible memory at `offset`
    fn write_memory(&self, memory: Self::DeviceMemory, offset: u64, data: &[u8]) -> Result<()>;

    /// Make host writes visible to the device (non-coherent memory)
    fn flush_memory(&self, memory: Self::DeviceMemory, offset: u64, size: u64) -> Result<()>;

    fn create_image(
        &self,
        desc: &ImageDesc,
        properties: MemoryProperties,
    ) -> Result<(Self::Image, Self::DeviceMemory)>;
    fn destroy_image(&self, image: Self::Image, memory: Self::DeviceMemory);

    fn create_image_view(&self, image: Self::Image, format: Format, aspect: ImageAspect) -> Result<Self::ImageView>;
    fn destroy_image_view(&self, view: Self::ImageView);

    // ===== PRESENTATION =====

    fn surface_capabilities(&self) -> Result<SurfaceCapabilities>;
    fn surface_formats(&self) -> Result<Vec<SurfaceFormat>>;
    fn surface_present_modes(&self) -> Result<Vec<PresentMode>>;

    /// Create the driver swapchain; `previous` is handed to the driver as a recycling hint
    fn create_swapchain(&self, desc: &SwapchainDesc, previous: Option<Self::Swapchain>) -> Result<Self::Swapchain>;
    fn swapchain_images(&self, swapchain: Self::Swapchain) -> Result<Vec<Self::Image>>;
    fn destroy_swapchain(&self, swapchain: Self::Swapchain);

    /// Request the next presentable image, signaling `signal` when it is usable
    fn acquire_next_image(
        &self,
        swapchain: Self::Swapchain,
        signal: Self::Semaphore,
        timeout: Option<Duration>,
    ) -> Result<AcquireOutcome>;

    /// Present `image_index` once `wait` is signaled
    fn queue_present(
        &self,
        swapchain: Self::Swapchain,
        image_index: u32,
        wait: Self::Semaphore,
    ) -> Result<SwapchainStatus>;

    // ===== RENDER PASSES AND FRAMEBUFFERS =====

    /// Single-subpass render pass: one color attachment presented afterwards, one depth attachment
    fn create_render_pass(&self, color_format: Format, depth_format: Format) -> Result<Self::RenderPass>;
    fn destroy_render_pass(&self, render_pass: Self::RenderPass);

    fn create_framebuffer(
        &self,
        render_pass: Self::RenderPass,
        attachments: &[Self::ImageView],
        extent: Extent2D,
    ) -> Result<Self::Framebuffer>;
    fn destroy_framebuffer(&self, framebuffer: Self::Framebuffer);

    // ===== PIPELINES =====

    fn create_pipeline_layout(
        &self,
        set_layouts: &[Self::DescriptorSetLayout],
        push_constant_ranges: &[PushConstantRange],
    ) -> Result<Self::PipelineLayout>;
    fn destroy_pipeline_layout(&self, layout: Self::PipelineLayout);

    fn create_graphics_pipeline(&self, desc: &PipelineDesc<'_, Self>) -> Result<Self::Pipeline>;
    fn destroy_pipeline(&self, pipeline: Self::Pipeline);

    // ===== DESCRIPTORS =====

    fn create_descriptor_set_layout(&self, bindings: &[DescriptorBinding]) -> Result<Self::DescriptorSetLayout>;
    fn destroy_descriptor_set_layout(&self, layout: Self::DescriptorSetLayout);

    /// `free_individual_sets` allows `free_descriptor_sets` on sets from this pool
    fn create_descriptor_pool(
        &self,
        max_sets: u32,
        pool_sizes: &[DescriptorPoolSize],
        free_individual_sets: bool,
    ) -> Result<Self::DescriptorPool>;
    fn destroy_descriptor_pool(&self, pool: Self::DescriptorPool);

    fn allocate_descriptor_set(
        &self,
        pool: Self::DescriptorPool,
        layout: Self::DescriptorSetLayout,
    ) -> Result<Self::DescriptorSet>;
    fn free_descriptor_sets(&self, pool: Self::DescriptorPool, sets: &[Self::DescriptorSet]) -> Result<()>;
    fn reset_descriptor_pool(&self, pool: Self::DescriptorPool) -> Result<()>;
    fn update_descriptor_set(&self, set: Self::DescriptorSet, writes: &[DescriptorWrite<Self::Buffer>]);

    // ===== COMMAND RECORDING =====

    fn cmd_begin_render_pass(
        &self,
        command_buffer: Self::CommandBuffer,
        render_pass: Self::RenderPass,
        framebuffer: Self::Framebuffer,
        extent: Extent2D,
        clear_values: &[ClearValue],
    );
    fn cmd_end_render_pass(&self, command_buffer: Self::CommandBuffer);
    fn cmd_set_viewport(&self, command_buffer: Self::CommandBuffer, viewport: Viewport);
    fn cmd_set_scissor(&self, command_buffer: Self::CommandBuffer, scissor: Rect2D);
    fn cmd_bind_pipeline(&self, command_buffer: Self::CommandBuffer, pipeline: Self::Pipeline);
    fn cmd_bind_descriptor_sets(
        &self,
        command_buffer: Self::CommandBuffer,
        layout: Self::PipelineLayout,
        first_set: u32,
        sets: &[Self::DescriptorSet],
    );
    fn cmd_push_constants(
        &self,
        command_buffer: Self::CommandBuffer,
        layout: Self::PipelineLayout,
        stages: ShaderStages,
        offset: u32,
        data: &[u8],
    );
    fn cmd_bind_vertex_buffers(
        &self,
        command_buffer: Self::CommandBuffer,
        first_binding: u32,
        buffers: &[Self::Buffer],
        offsets: &[u64],
    );
    fn cmd_bind_index_buffer(
        &self,
        command_buffer: Self::CommandBuffer,
        buffer: Self::Buffer,
        offset: u64,
        index_type: IndexType,
    );
    fn cmd_draw(
        &self,
        command_buffer: Self::CommandBuffer,
        vertex_count: u32,
        instance_count: u32,
        first_vertex: u32,
        first_instance: u32,
    );
    fn cmd_draw_indexed(
        &self,
        command_buffer: Self::CommandBuffer,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    );
    fn cmd_copy_buffer(&self, command_buffer: Self::CommandBuffer, src: Self::Buffer, dst: Self::Buffer, size: u64);
    fn cmd_copy_buffer_to_image(
        &self,
        command_buffer: Self::CommandBuffer,
        buffer: Self::Buffer,
        image: Self::Image,
        extent: Extent2D,
        layer_count: u32,
    );
}
