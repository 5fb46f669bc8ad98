/// GraphicsDevice implementation for VulkanDevice
///
/// Every engine handle is the raw `ash::vk` handle. Failed calls are logged
/// and mapped through `error_from_vk`; out-of-date swapchains are reported as
/// outcomes, not errors.

use std::time::Duration;

use ash::vk;
use voxel_engine::voxel::device::{
    AcquireOutcome, BufferUsage, ClearValue, DescriptorBinding, DescriptorPoolSize, DescriptorType,
    DescriptorWrite, Extent2D, Format, FormatProperties, GraphicsDevice, ImageAspect, ImageDesc,
    IndexType, MemoryProperties, MemoryType, PipelineDesc, PresentMode, PushConstantRange, Rect2D,
    ShaderStages, SurfaceCapabilities, SurfaceFormat, SwapchainDesc, SwapchainStatus, Viewport,
};
use voxel_engine::voxel::{Error, Result};
use voxel_engine::{engine_bail, engine_trace, engine_warn};

use crate::vulkan_device::VulkanDevice;
use crate::vulkan_format::*;
use crate::vulkan_shader::{check_push_constant_size, reflect_push_constant_size};

const SOURCE: &str = "voxel::vulkan";

fn has_stencil(format: Format) -> bool {
    matches!(format, Format::D32_SFLOAT_S8_UINT | Format::D24_UNORM_S8_UINT)
}

impl VulkanDevice {
    /// Allocate memory matching `requirements` with `properties`
    fn allocate_memory(
        &self,
        requirements: vk::MemoryRequirements,
        properties: MemoryProperties,
    ) -> Result<vk::DeviceMemory> {
        let memory_type_index = self.find_memory_type(requirements.memory_type_bits, properties)?;
        let info = vk::MemoryAllocateInfo::default()
            .allocation_size(requirements.size)
            .memory_type_index(memory_type_index);
        unsafe {
            self.device
                .allocate_memory(&info, None)
                .map_err(|e| error_from_vk("Failed to allocate memory", e))
        }
    }

    fn create_shader_module(&self, code: &[u32]) -> Result<vk::ShaderModule> {
        if code.is_empty() {
            engine_bail!(SOURCE, "Cannot create a shader module from empty SPIR-V");
        }
        let info = vk::ShaderModuleCreateInfo::default().code(code);
        unsafe {
            self.device
                .create_shader_module(&info, None)
                .map_err(|e| error_from_vk("Failed to create shader module", e))
        }
    }

    /// Reflected push constant block of both stages against the layout's declared ranges
    fn validate_push_constants(&self, desc: &PipelineDesc<'_, Self>) -> Result<()> {
        let vertex = reflect_push_constant_size(desc.vertex_spirv)?;
        let fragment = reflect_push_constant_size(desc.fragment_spirv)?;
        let reflected = match (vertex, fragment) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
        let ranges = self.layout_push_ranges.borrow();
        let declared = ranges.get(&desc.layout).map(Vec::as_slice).unwrap_or(&[]);
        check_push_constant_size(reflected, declared)
    }

    unsafe fn build_pipeline(
        &self,
        desc: &PipelineDesc<'_, Self>,
        vertex_module: vk::ShaderModule,
        fragment_module: vk::ShaderModule,
    ) -> Result<vk::Pipeline> {
        let config = desc.config;
        let stages = [
            vk::PipelineShaderStageCreateInfo::default()
                .stage(vk::ShaderStageFlags::VERTEX)
                .module(vertex_module)
                .name(c"main"),
            vk::PipelineShaderStageCreateInfo::default()
                .stage(vk::ShaderStageFlags::FRAGMENT)
                .module(fragment_module)
                .name(c"main"),
        ];

        let bindings: Vec<vk::VertexInputBindingDescription> = config
            .vertex_bindings
            .iter()
            .map(|b| vk::VertexInputBindingDescription {
                binding: b.binding,
                stride: b.stride,
                input_rate: vk::VertexInputRate::VERTEX,
            })
            .collect();
        let attributes: Vec<vk::VertexInputAttributeDescription> = config
            .vertex_attributes
            .iter()
            .map(|a| vk::VertexInputAttributeDescription {
                location: a.location,
                binding: a.binding,
                format: format_to_vk(a.format),
                offset: a.offset,
            })
            .collect();
        let vertex_input = vk::PipelineVertexInputStateCreateInfo::default()
            .vertex_binding_descriptions(&bindings)
            .vertex_attribute_descriptions(&attributes);

        let input_assembly = vk::PipelineInputAssemblyStateCreateInfo::default()
            .topology(topology_to_vk(config.topology))
            .primitive_restart_enable(false);

        // Viewport and scissor are dynamic
        let viewport_state = vk::PipelineViewportStateCreateInfo::default()
            .viewport_count(1)
            .scissor_count(1);

        let rasterization = vk::PipelineRasterizationStateCreateInfo::default()
            .depth_clamp_enable(false)
            .rasterizer_discard_enable(false)
            .polygon_mode(polygon_mode_to_vk(config.polygon_mode))
            .line_width(1.0)
            .cull_mode(cull_mode_to_vk(config.cull_mode))
            .front_face(front_face_to_vk(config.front_face))
            .depth_bias_enable(false);

        let multisample = vk::PipelineMultisampleStateCreateInfo::default()
            .sample_shading_enable(false)
            .rasterization_samples(vk::SampleCountFlags::TYPE_1);

        let mut blend_attachment = vk::PipelineColorBlendAttachmentState::default()
            .color_write_mask(vk::ColorComponentFlags::RGBA)
            .blend_enable(config.alpha_blending);
        if config.alpha_blending {
            blend_attachment = blend_attachment
                .src_color_blend_factor(vk::BlendFactor::SRC_ALPHA)
                .dst_color_blend_factor(vk::BlendFactor::ONE_MINUS_SRC_ALPHA)
                .color_blend_op(vk::BlendOp::ADD)
                .src_alpha_blend_factor(vk::BlendFactor::ONE)
                .dst_alpha_blend_factor(vk::BlendFactor::ZERO)
                .alpha_blend_op(vk::BlendOp::ADD);
        }
        let color_blend = vk::PipelineColorBlendStateCreateInfo::default()
            .logic_op_enable(false)
            .attachments(std::slice::from_ref(&blend_attachment));

        let depth_stencil = vk::PipelineDepthStencilStateCreateInfo::default()
            .depth_test_enable(config.depth_test)
            .depth_write_enable(config.depth_write)
            .depth_compare_op(compare_op_to_vk(config.depth_compare))
            .depth_bounds_test_enable(false)
            .stencil_test_enable(false);

        let dynamic_states = [vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR];
        let dynamic_state = vk::PipelineDynamicStateCreateInfo::default().dynamic_states(&dynamic_states);

        let info = vk::GraphicsPipelineCreateInfo::default()
            .stages(&stages)
            .vertex_input_state(&vertex_input)
            .input_assembly_state(&input_assembly)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterization)
            .multisample_state(&multisample)
            .color_blend_state(&color_blend)
            .depth_stencil_state(&depth_stencil)
            .dynamic_state(&dynamic_state)
            .layout(desc.layout)
            .render_pass(desc.render_pass)
            .subpass(0);

        let pipelines = self
            .device
            .create_graphics_pipelines(vk::PipelineCache::null(), std::slice::from_ref(&info), None)
            .map_err(|(_, e)| error_from_vk("Failed to create graphics pipeline", e))?;
        pipelines
            .into_iter()
            .next()
            .ok_or_else(|| Error::BackendError("Pipeline creation returned nothing".to_string()))
    }
}

impl GraphicsDevice for VulkanDevice {
    type Fence = vk::Fence;
    type Semaphore = vk::Semaphore;
    type CommandBuffer = vk::CommandBuffer;
    type Buffer = vk::Buffer;
    type DeviceMemory = vk::DeviceMemory;
    type Image = vk::Image;
    type ImageView = vk::ImageView;
    type RenderPass = vk::RenderPass;
    type Framebuffer = vk::Framebuffer;
    type Swapchain = vk::SwapchainKHR;
    type PipelineLayout = vk::PipelineLayout;
    type Pipeline = vk::Pipeline;
    type DescriptorSetLayout = vk::DescriptorSetLayout;
    type DescriptorPool = vk::DescriptorPool;
    type DescriptorSet = vk::DescriptorSet;

    // ===== DEVICE QUERIES =====

    fn memory_types(&self) -> &[MemoryType] {
        &self.memory_types
    }

    fn format_properties(&self, format: Format) -> FormatProperties {
        let properties = unsafe {
            self.instance
                .get_physical_device_format_properties(self.physical_device, format_to_vk(format))
        };
        FormatProperties {
            linear_tiling_features: format_features_from_vk(properties.linear_tiling_features),
            optimal_tiling_features: format_features_from_vk(properties.optimal_tiling_features),
        }
    }

    fn min_uniform_buffer_offset_alignment(&self) -> u64 {
        self.min_uniform_buffer_offset_alignment
    }

    // ===== SYNCHRONIZATION =====

    fn create_fence(&self, signaled: bool) -> Result<vk::Fence> {
        let flags = if signaled { vk::FenceCreateFlags::SIGNALED } else { vk::FenceCreateFlags::empty() };
        let info = vk::FenceCreateInfo::default().flags(flags);
        unsafe {
            self.device
                .create_fence(&info, None)
                .map_err(|e| error_from_vk("Failed to create fence", e))
        }
    }

    fn destroy_fence(&self, fence: vk::Fence) {
        unsafe { self.device.destroy_fence(fence, None) }
    }

    fn wait_for_fence(&self, fence: vk::Fence, timeout: Option<Duration>) -> Result<()> {
        unsafe {
            self.device
                .wait_for_fences(&[fence], true, timeout_to_nanos(timeout))
                .map_err(|e| error_from_vk("Failed to wait for fence", e))
        }
    }

    fn reset_fence(&self, fence: vk::Fence) -> Result<()> {
        unsafe {
            self.device
                .reset_fences(&[fence])
                .map_err(|e| error_from_vk("Failed to reset fence", e))
        }
    }

    fn create_semaphore(&self) -> Result<vk::Semaphore> {
        let info = vk::SemaphoreCreateInfo::default();
        unsafe {
            self.device
                .create_semaphore(&info, None)
                .map_err(|e| error_from_vk("Failed to create semaphore", e))
        }
    }

    fn destroy_semaphore(&self, semaphore: vk::Semaphore) {
        unsafe { self.device.destroy_semaphore(semaphore, None) }
    }

    fn wait_idle(&self) -> Result<()> {
        unsafe {
            self.device
                .device_wait_idle()
                .map_err(|e| error_from_vk("Failed to wait for device idle", e))
        }
    }

    // ===== COMMAND BUFFERS AND SUBMISSION =====

    fn allocate_command_buffers(&self, count: u32) -> Result<Vec<vk::CommandBuffer>> {
        let info = vk::CommandBufferAllocateInfo::default()
            .command_pool(self.command_pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(count);
        unsafe {
            self.device
                .allocate_command_buffers(&info)
                .map_err(|e| error_from_vk("Failed to allocate command buffers", e))
        }
    }

    fn free_command_buffers(&self, command_buffers: &[vk::CommandBuffer]) {
        if command_buffers.is_empty() {
            return;
        }
        unsafe { self.device.free_command_buffers(self.command_pool, command_buffers) }
    }

    fn begin_command_buffer(&self, command_buffer: vk::CommandBuffer, one_time_submit: bool) -> Result<()> {
        let flags = if one_time_submit {
            vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT
        } else {
            vk::CommandBufferUsageFlags::empty()
        };
        let info = vk::CommandBufferBeginInfo::default().flags(flags);
        unsafe {
            self.device
                .begin_command_buffer(command_buffer, &info)
                .map_err(|e| error_from_vk("Failed to begin recording command buffer", e))
        }
    }

    fn end_command_buffer(&self, command_buffer: vk::CommandBuffer) -> Result<()> {
        unsafe {
            self.device
                .end_command_buffer(command_buffer)
                .map_err(|e| error_from_vk("Failed to record command buffer", e))
        }
    }

    fn submit(
        &self,
        command_buffer: vk::CommandBuffer,
        wait: Option<vk::Semaphore>,
        signal: Option<vk::Semaphore>,
        fence: Option<vk::Fence>,
    ) -> Result<()> {
        let wait_semaphores: Vec<vk::Semaphore> = wait.into_iter().collect();
        let wait_stages = vec![vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT; wait_semaphores.len()];
        let signal_semaphores: Vec<vk::Semaphore> = signal.into_iter().collect();
        let command_buffers = [command_buffer];

        let info = vk::SubmitInfo::default()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);
        unsafe {
            self.device
                .queue_submit(self.graphics_queue, &[info], fence.unwrap_or_default())
                .map_err(|e| error_from_vk("Failed to submit draw command buffer", e))
        }
    }

    fn queue_wait_idle(&self) -> Result<()> {
        unsafe {
            self.device
                .queue_wait_idle(self.graphics_queue)
                .map_err(|e| error_from_vk("Failed to wait for graphics queue", e))
        }
    }

    // ===== BUFFERS, IMAGES AND MEMORY =====

    fn create_buffer(
        &self,
        size: u64,
        usage: BufferUsage,
        properties: MemoryProperties,
    ) -> Result<(vk::Buffer, vk::DeviceMemory)> {
        let info = vk::BufferCreateInfo::default()
            .size(size)
            .usage(buffer_usage_to_vk(usage))
            .sharing_mode(vk::SharingMode::EXCLUSIVE);
        unsafe {
            let buffer = self
                .device
                .create_buffer(&info, None)
                .map_err(|e| error_from_vk("Failed to create buffer", e))?;
            let requirements = self.device.get_buffer_memory_requirements(buffer);
            let memory = match self.allocate_memory(requirements, properties) {
                Ok(memory) => memory,
                Err(e) => {
                    self.device.destroy_buffer(buffer, None);
                    return Err(e);
                }
            };
            if let Err(e) = self.device.bind_buffer_memory(buffer, memory, 0) {
                self.device.destroy_buffer(buffer, None);
                self.device.free_memory(memory, None);
                return Err(error_from_vk("Failed to bind buffer memory", e));
            }
            engine_trace!(SOURCE, "Created buffer ({} bytes, {:?})", size, usage);
            Ok((buffer, memory))
        }
    }

    fn destroy_buffer(&self, buffer: vk::Buffer, memory: vk::DeviceMemory) {
        unsafe {
            self.device.destroy_buffer(buffer, None);
            self.device.free_memory(memory, None);
        }
    }

    fn write_memory(&self, memory: vk::DeviceMemory, offset: u64, data: &[u8]) -> Result<()> {
        if data.is_empty() {
            return Ok(());
        }
        unsafe {
            let mapped = self
                .device
                .map_memory(memory, offset, data.len() as u64, vk::MemoryMapFlags::empty())
                .map_err(|e| error_from_vk("Failed to map memory", e))?;
            std::ptr::copy_nonoverlapping(data.as_ptr(), mapped.cast::<u8>(), data.len());
            self.device.unmap_memory(memory);
        }
        Ok(())
    }

    /// Flushes from `offset` (rounded down to the atom size) to the end of the allocation
    fn flush_memory(&self, memory: vk::DeviceMemory, offset: u64, _size: u64) -> Result<()> {
        let atom = self.non_coherent_atom_size;
        let start = offset - offset % atom;
        let range = vk::MappedMemoryRange::default()
            .memory(memory)
            .offset(start)
            .size(vk::WHOLE_SIZE);
        unsafe {
            self.device
                .map_memory(memory, start, vk::WHOLE_SIZE, vk::MemoryMapFlags::empty())
                .map_err(|e| error_from_vk("Failed to map memory", e))?;
            let result = self.device.flush_mapped_memory_ranges(&[range]);
            self.device.unmap_memory(memory);
            result.map_err(|e| error_from_vk("Failed to flush memory", e))
        }
    }

    fn create_image(&self, desc: &ImageDesc, properties: MemoryProperties) -> Result<(vk::Image, vk::DeviceMemory)> {
        let info = vk::ImageCreateInfo::default()
            .image_type(vk::ImageType::TYPE_2D)
            .extent(vk::Extent3D { width: desc.extent.width, height: desc.extent.height, depth: 1 })
            .mip_levels(desc.mip_levels)
            .array_layers(desc.array_layers)
            .format(format_to_vk(desc.format))
            .tiling(image_tiling_to_vk(desc.tiling))
            .initial_layout(vk::ImageLayout::UNDEFINED)
            .usage(image_usage_to_vk(desc.usage))
            .samples(vk::SampleCountFlags::TYPE_1)
            .sharing_mode(vk::SharingMode::EXCLUSIVE);
        unsafe {
            let image = self
                .device
                .create_image(&info, None)
                .map_err(|e| error_from_vk("Failed to create image", e))?;
            let requirements = self.device.get_image_memory_requirements(image);
            let memory = match self.allocate_memory(requirements, properties) {
                Ok(memory) => memory,
                Err(e) => {
                    self.device.destroy_image(image, None);
                    return Err(e);
                }
            };
            if let Err(e) = self.device.bind_image_memory(image, memory, 0) {
                self.device.destroy_image(image, None);
                self.device.free_memory(memory, None);
                return Err(error_from_vk("Failed to bind image memory", e));
            }
            Ok((image, memory))
        }
    }

    fn destroy_image(&self, image: vk::Image, memory: vk::DeviceMemory) {
        unsafe {
            self.device.destroy_image(image, None);
            self.device.free_memory(memory, None);
        }
    }

    fn create_image_view(&self, image: vk::Image, format: Format, aspect: ImageAspect) -> Result<vk::ImageView> {
        let aspect_mask = match aspect {
            ImageAspect::Color => vk::ImageAspectFlags::COLOR,
            ImageAspect::Depth if has_stencil(format) => vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL,
            ImageAspect::Depth => vk::ImageAspectFlags::DEPTH,
        };
        let info = vk::ImageViewCreateInfo::default()
            .image(image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(format_to_vk(format))
            .subresource_range(vk::ImageSubresourceRange {
                aspect_mask,
                base_mip_level: 0,
                level_count: 1,
                base_array_layer: 0,
                layer_count: 1,
            });
        unsafe {
            self.device
                .create_image_view(&info, None)
                .map_err(|e| error_from_vk("Failed to create image view", e))
        }
    }

    fn destroy_image_view(&self, view: vk::ImageView) {
        unsafe { self.device.destroy_image_view(view, None) }
    }

    // ===== PRESENTATION =====

    fn surface_capabilities(&self) -> Result<SurfaceCapabilities> {
        let caps = unsafe {
            self.surface_loader
                .get_physical_device_surface_capabilities(self.physical_device, self.surface)
                .map_err(|e| error_from_vk("Failed to query surface capabilities", e))?
        };
        Ok(surface_capabilities_from_vk(&caps))
    }

    fn surface_formats(&self) -> Result<Vec<SurfaceFormat>> {
        let formats = unsafe {
            self.surface_loader
                .get_physical_device_surface_formats(self.physical_device, self.surface)
                .map_err(|e| error_from_vk("Failed to query surface formats", e))?
        };
        Ok(formats.into_iter().map(surface_format_from_vk).collect())
    }

    fn surface_present_modes(&self) -> Result<Vec<PresentMode>> {
        let modes = unsafe {
            self.surface_loader
                .get_physical_device_surface_present_modes(self.physical_device, self.surface)
                .map_err(|e| error_from_vk("Failed to query present modes", e))?
        };
        Ok(modes.into_iter().filter_map(present_mode_from_vk).collect())
    }

    fn create_swapchain(&self, desc: &SwapchainDesc, previous: Option<vk::SwapchainKHR>) -> Result<vk::SwapchainKHR> {
        let caps = unsafe {
            self.surface_loader
                .get_physical_device_surface_capabilities(self.physical_device, self.surface)
                .map_err(|e| error_from_vk("Failed to query surface capabilities", e))?
        };
        let family_indices = self.queue_families().unique();
        let sharing_mode = if family_indices.len() > 1 {
            vk::SharingMode::CONCURRENT
        } else {
            vk::SharingMode::EXCLUSIVE
        };

        let mut info = vk::SwapchainCreateInfoKHR::default()
            .surface(self.surface)
            .min_image_count(desc.min_image_count)
            .image_format(format_to_vk(desc.surface_format.format))
            .image_color_space(color_space_to_vk(desc.surface_format.color_space))
            .image_extent(extent_to_vk(desc.extent))
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .image_sharing_mode(sharing_mode)
            .pre_transform(caps.current_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(present_mode_to_vk(desc.present_mode))
            .clipped(true)
            .old_swapchain(previous.unwrap_or_default());
        if sharing_mode == vk::SharingMode::CONCURRENT {
            info = info.queue_family_indices(&family_indices);
        }

        unsafe {
            self.swapchain_loader
                .create_swapchain(&info, None)
                .map_err(|e| error_from_vk("Failed to create swap chain", e))
        }
    }

    fn swapchain_images(&self, swapchain: vk::SwapchainKHR) -> Result<Vec<vk::Image>> {
        unsafe {
            self.swapchain_loader
                .get_swapchain_images(swapchain)
                .map_err(|e| error_from_vk("Failed to get swap chain images", e))
        }
    }

    fn destroy_swapchain(&self, swapchain: vk::SwapchainKHR) {
        unsafe { self.swapchain_loader.destroy_swapchain(swapchain, None) }
    }

    fn acquire_next_image(
        &self,
        swapchain: vk::SwapchainKHR,
        signal: vk::Semaphore,
        timeout: Option<Duration>,
    ) -> Result<AcquireOutcome> {
        let result = unsafe {
            self.swapchain_loader
                .acquire_next_image(swapchain, timeout_to_nanos(timeout), signal, vk::Fence::null())
        };
        match result {
            Ok((image_index, suboptimal)) => Ok(AcquireOutcome::Acquired { image_index, suboptimal }),
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(AcquireOutcome::OutOfDate),
            Err(e) => Err(error_from_vk("Failed to acquire swap chain image", e)),
        }
    }

    fn queue_present(&self, swapchain: vk::SwapchainKHR, image_index: u32, wait: vk::Semaphore) -> Result<SwapchainStatus> {
        let wait_semaphores = [wait];
        let swapchains = [swapchain];
        let image_indices = [image_index];
        let info = vk::PresentInfoKHR::default()
            .wait_semaphores(&wait_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);
        let result = unsafe { self.swapchain_loader.queue_present(self.present_queue, &info) };
        match result {
            Ok(false) => Ok(SwapchainStatus::Success),
            Ok(true) => Ok(SwapchainStatus::Suboptimal),
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(SwapchainStatus::OutOfDate),
            Err(e) => Err(error_from_vk("Failed to present swap chain image", e)),
        }
    }

    // ===== RENDER PASSES AND FRAMEBUFFERS =====

    fn create_render_pass(&self, color_format: Format, depth_format: Format) -> Result<vk::RenderPass> {
        let attachments = [
            vk::AttachmentDescription::default()
                .format(format_to_vk(color_format))
                .samples(vk::SampleCountFlags::TYPE_1)
                .load_op(vk::AttachmentLoadOp::CLEAR)
                .store_op(vk::AttachmentStoreOp::STORE)
                .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
                .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
                .initial_layout(vk::ImageLayout::UNDEFINED)
                .final_layout(vk::ImageLayout::PRESENT_SRC_KHR),
            vk::AttachmentDescription::default()
                .format(format_to_vk(depth_format))
                .samples(vk::SampleCountFlags::TYPE_1)
                .load_op(vk::AttachmentLoadOp::CLEAR)
                .store_op(vk::AttachmentStoreOp::DONT_CARE)
                .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
                .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
                .initial_layout(vk::ImageLayout::UNDEFINED)
                .final_layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL),
        ];
        let color_ref = vk::AttachmentReference {
            attachment: 0,
            layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
        };
        let depth_ref = vk::AttachmentReference {
            attachment: 1,
            layout: vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
        };
        let subpass = vk::SubpassDescription::default()
            .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
            .color_attachments(std::slice::from_ref(&color_ref))
            .depth_stencil_attachment(&depth_ref);

        let stages = vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT | vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS;
        let dependency = vk::SubpassDependency::default()
            .src_subpass(vk::SUBPASS_EXTERNAL)
            .dst_subpass(0)
            .src_stage_mask(stages)
            .src_access_mask(vk::AccessFlags::empty())
            .dst_stage_mask(stages)
            .dst_access_mask(
                vk::AccessFlags::COLOR_ATTACHMENT_WRITE | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
            );

        let info = vk::RenderPassCreateInfo::default()
            .attachments(&attachments)
            .subpasses(std::slice::from_ref(&subpass))
            .dependencies(std::slice::from_ref(&dependency));
        unsafe {
            self.device
                .create_render_pass(&info, None)
                .map_err(|e| error_from_vk("Failed to create render pass", e))
        }
    }

    fn destroy_render_pass(&self, render_pass: vk::RenderPass) {
        unsafe { self.device.destroy_render_pass(render_pass, None) }
    }

    fn create_framebuffer(
        &self,
        render_pass: vk::RenderPass,
        attachments: &[vk::ImageView],
        extent: Extent2D,
    ) -> Result<vk::Framebuffer> {
        let info = vk::FramebufferCreateInfo::default()
            .render_pass(render_pass)
            .attachments(attachments)
            .width(extent.width)
            .height(extent.height)
            .layers(1);
        unsafe {
            self.device
                .create_framebuffer(&info, None)
                .map_err(|e| error_from_vk("Failed to create framebuffer", e))
        }
    }

    fn destroy_framebuffer(&self, framebuffer: vk::Framebuffer) {
        unsafe { self.device.destroy_framebuffer(framebuffer, None) }
    }

    // ===== PIPELINES =====

    fn create_pipeline_layout(
        &self,
        set_layouts: &[vk::DescriptorSetLayout],
        push_constant_ranges: &[PushConstantRange],
    ) -> Result<vk::PipelineLayout> {
        let ranges: Vec<vk::PushConstantRange> = push_constant_ranges
            .iter()
            .map(|r| vk::PushConstantRange {
                stage_flags: shader_stages_to_vk(r.stages),
                offset: r.offset,
                size: r.size,
            })
            .collect();
        let info = vk::PipelineLayoutCreateInfo::default()
            .set_layouts(set_layouts)
            .push_constant_ranges(&ranges);
        let layout = unsafe {
            self.device
                .create_pipeline_layout(&info, None)
                .map_err(|e| error_from_vk("Failed to create pipeline layout", e))?
        };
        self.layout_push_ranges
            .borrow_mut()
            .insert(layout, push_constant_ranges.to_vec());
        Ok(layout)
    }

    fn destroy_pipeline_layout(&self, layout: vk::PipelineLayout) {
        self.layout_push_ranges.borrow_mut().remove(&layout);
        unsafe { self.device.destroy_pipeline_layout(layout, None) }
    }

    fn create_graphics_pipeline(&self, desc: &PipelineDesc<'_, Self>) -> Result<vk::Pipeline> {
        self.validate_push_constants(desc)?;

        let vertex_module = self.create_shader_module(desc.vertex_spirv)?;
        let fragment_module = match self.create_shader_module(desc.fragment_spirv) {
            Ok(module) => module,
            Err(e) => {
                unsafe { self.device.destroy_shader_module(vertex_module, None) };
                return Err(e);
            }
        };

        let pipeline = unsafe { self.build_pipeline(desc, vertex_module, fragment_module) };
        unsafe {
            self.device.destroy_shader_module(vertex_module, None);
            self.device.destroy_shader_module(fragment_module, None);
        }
        pipeline
    }

    fn destroy_pipeline(&self, pipeline: vk::Pipeline) {
        unsafe { self.device.destroy_pipeline(pipeline, None) }
    }

    // ===== DESCRIPTORS =====

    fn create_descriptor_set_layout(&self, bindings: &[DescriptorBinding]) -> Result<vk::DescriptorSetLayout> {
        let vk_bindings: Vec<vk::DescriptorSetLayoutBinding> = bindings
            .iter()
            .map(|b| {
                vk::DescriptorSetLayoutBinding::default()
                    .binding(b.binding)
                    .descriptor_type(descriptor_type_to_vk(b.descriptor_type))
                    .descriptor_count(b.count)
                    .stage_flags(shader_stages_to_vk(b.stages))
            })
            .collect();
        let info = vk::DescriptorSetLayoutCreateInfo::default().bindings(&vk_bindings);
        unsafe {
            self.device
                .create_descriptor_set_layout(&info, None)
                .map_err(|e| error_from_vk("Failed to create descriptor set layout", e))
        }
    }

    fn destroy_descriptor_set_layout(&self, layout: vk::DescriptorSetLayout) {
        unsafe { self.device.destroy_descriptor_set_layout(layout, None) }
    }

    fn create_descriptor_pool(
        &self,
        max_sets: u32,
        pool_sizes: &[DescriptorPoolSize],
        free_individual_sets: bool,
    ) -> Result<vk::DescriptorPool> {
        let sizes: Vec<vk::DescriptorPoolSize> = pool_sizes
            .iter()
            .map(|s| vk::DescriptorPoolSize {
                ty: descriptor_type_to_vk(s.descriptor_type),
                descriptor_count: s.count,
            })
            .collect();
        let flags = if free_individual_sets {
            vk::DescriptorPoolCreateFlags::FREE_DESCRIPTOR_SET
        } else {
            vk::DescriptorPoolCreateFlags::empty()
        };
        let info = vk::DescriptorPoolCreateInfo::default()
            .max_sets(max_sets)
            .pool_sizes(&sizes)
            .flags(flags);
        unsafe {
            self.device
                .create_descriptor_pool(&info, None)
                .map_err(|e| error_from_vk("Failed to create descriptor pool", e))
        }
    }

    fn destroy_descriptor_pool(&self, pool: vk::DescriptorPool) {
        unsafe { self.device.destroy_descriptor_pool(pool, None) }
    }

    fn allocate_descriptor_set(
        &self,
        pool: vk::DescriptorPool,
        layout: vk::DescriptorSetLayout,
    ) -> Result<vk::DescriptorSet> {
        let layouts = [layout];
        let info = vk::DescriptorSetAllocateInfo::default()
            .descriptor_pool(pool)
            .set_layouts(&layouts);
        let sets = unsafe {
            self.device
                .allocate_descriptor_sets(&info)
                .map_err(|e| error_from_vk("Failed to allocate descriptor set", e))?
        };
        sets.into_iter()
            .next()
            .ok_or_else(|| Error::BackendError("Descriptor set allocation returned nothing".to_string()))
    }

    fn free_descriptor_sets(&self, pool: vk::DescriptorPool, sets: &[vk::DescriptorSet]) -> Result<()> {
        if sets.is_empty() {
            return Ok(());
        }
        unsafe {
            self.device
                .free_descriptor_sets(pool, sets)
                .map_err(|e| error_from_vk("Failed to free descriptor sets", e))
        }
    }

    fn reset_descriptor_pool(&self, pool: vk::DescriptorPool) -> Result<()> {
        unsafe {
            self.device
                .reset_descriptor_pool(pool, vk::DescriptorPoolResetFlags::empty())
                .map_err(|e| error_from_vk("Failed to reset descriptor pool", e))
        }
    }

    fn update_descriptor_set(&self, set: vk::DescriptorSet, writes: &[DescriptorWrite<vk::Buffer>]) {
        let buffer_writes: Vec<&DescriptorWrite<vk::Buffer>> = writes
            .iter()
            .filter(|w| {
                let is_buffer = w.descriptor_type != DescriptorType::CombinedImageSampler;
                if !is_buffer {
                    engine_warn!(SOURCE, "Skipping image write at binding {}: buffer writes only", w.binding);
                }
                is_buffer
            })
            .collect();
        let infos: Vec<[vk::DescriptorBufferInfo; 1]> = buffer_writes
            .iter()
            .map(|w| {
                [vk::DescriptorBufferInfo {
                    buffer: w.buffer_info.buffer,
                    offset: w.buffer_info.offset,
                    range: w.buffer_info.range,
                }]
            })
            .collect();
        let vk_writes: Vec<vk::WriteDescriptorSet> = buffer_writes
            .iter()
            .zip(&infos)
            .map(|(w, info)| {
                vk::WriteDescriptorSet::default()
                    .dst_set(set)
                    .dst_binding(w.binding)
                    .dst_array_element(0)
                    .descriptor_type(descriptor_type_to_vk(w.descriptor_type))
                    .buffer_info(info)
            })
            .collect();
        unsafe { self.device.update_descriptor_sets(&vk_writes, &[]) }
    }

    // ===== COMMAND RECORDING =====

    fn cmd_begin_render_pass(
        &self,
        command_buffer: vk::CommandBuffer,
        render_pass: vk::RenderPass,
        framebuffer: vk::Framebuffer,
        extent: Extent2D,
        clear_values: &[ClearValue],
    ) {
        let clears: Vec<vk::ClearValue> = clear_values
            .iter()
            .map(|c| match *c {
                ClearValue::Color(float32) => vk::ClearValue { color: vk::ClearColorValue { float32 } },
                ClearValue::DepthStencil { depth, stencil } => vk::ClearValue {
                    depth_stencil: vk::ClearDepthStencilValue { depth, stencil },
                },
            })
            .collect();
        let info = vk::RenderPassBeginInfo::default()
            .render_pass(render_pass)
            .framebuffer(framebuffer)
            .render_area(vk::Rect2D { offset: vk::Offset2D { x: 0, y: 0 }, extent: extent_to_vk(extent) })
            .clear_values(&clears);
        unsafe {
            self.device
                .cmd_begin_render_pass(command_buffer, &info, vk::SubpassContents::INLINE)
        }
    }

    fn cmd_end_render_pass(&self, command_buffer: vk::CommandBuffer) {
        unsafe { self.device.cmd_end_render_pass(command_buffer) }
    }

    fn cmd_set_viewport(&self, command_buffer: vk::CommandBuffer, viewport: Viewport) {
        let viewport = vk::Viewport {
            x: viewport.x,
            y: viewport.y,
            width: viewport.width,
            height: viewport.height,
            min_depth: viewport.min_depth,
            max_depth: viewport.max_depth,
        };
        unsafe { self.device.cmd_set_viewport(command_buffer, 0, &[viewport]) }
    }

    fn cmd_set_scissor(&self, command_buffer: vk::CommandBuffer, scissor: Rect2D) {
        let scissor = vk::Rect2D {
            offset: vk::Offset2D { x: scissor.x, y: scissor.y },
            extent: vk::Extent2D { width: scissor.width, height: scissor.height },
        };
        unsafe { self.device.cmd_set_scissor(command_buffer, 0, &[scissor]) }
    }

    fn cmd_bind_pipeline(&self, command_buffer: vk::CommandBuffer, pipeline: vk::Pipeline) {
        unsafe {
            self.device
                .cmd_bind_pipeline(command_buffer, vk::PipelineBindPoint::GRAPHICS, pipeline)
        }
    }

    fn cmd_bind_descriptor_sets(
        &self,
        command_buffer: vk::CommandBuffer,
        layout: vk::PipelineLayout,
        first_set: u32,
        sets: &[vk::DescriptorSet],
    ) {
        unsafe {
            self.device.cmd_bind_descriptor_sets(
                command_buffer,
                vk::PipelineBindPoint::GRAPHICS,
                layout,
                first_set,
                sets,
                &[],
            )
        }
    }

    fn cmd_push_constants(
        &self,
        command_buffer: vk::CommandBuffer,
        layout: vk::PipelineLayout,
        stages: ShaderStages,
        offset: u32,
        data: &[u8],
    ) {
        unsafe {
            self.device
                .cmd_push_constants(command_buffer, layout, shader_stages_to_vk(stages), offset, data)
        }
    }

    fn cmd_bind_vertex_buffers(
        &self,
        command_buffer: vk::CommandBuffer,
        first_binding: u32,
        buffers: &[vk::Buffer],
        offsets: &[u64],
    ) {
        unsafe {
            self.device
                .cmd_bind_vertex_buffers(command_buffer, first_binding, buffers, offsets)
        }
    }

    fn cmd_bind_index_buffer(
        &self,
        command_buffer: vk::CommandBuffer,
        buffer: vk::Buffer,
        offset: u64,
        index_type: IndexType,
    ) {
        unsafe {
            self.device
                .cmd_bind_index_buffer(command_buffer, buffer, offset, index_type_to_vk(index_type))
        }
    }

    fn cmd_draw(
        &self,
        command_buffer: vk::CommandBuffer,
        vertex_count: u32,
        instance_count: u32,
        first_vertex: u32,
        first_instance: u32,
    ) {
        unsafe {
            self.device
                .cmd_draw(command_buffer, vertex_count, instance_count, first_vertex, first_instance)
        }
    }

    fn cmd_draw_indexed(
        &self,
        command_buffer: vk::CommandBuffer,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    ) {
        unsafe {
            self.device.cmd_draw_indexed(
                command_buffer,
                index_count,
                instance_count,
                first_index,
                vertex_offset,
                first_instance,
            )
        }
    }

    fn cmd_copy_buffer(&self, command_buffer: vk::CommandBuffer, src: vk::Buffer, dst: vk::Buffer, size: u64) {
        let region = vk::BufferCopy { src_offset: 0, dst_offset: 0, size };
        unsafe { self.device.cmd_copy_buffer(command_buffer, src, dst, &[region]) }
    }

    fn cmd_copy_buffer_to_image(
        &self,
        command_buffer: vk::CommandBuffer,
        buffer: vk::Buffer,
        image: vk::Image,
        extent: Extent2D,
        layer_count: u32,
    ) {
        let region = vk::BufferImageCopy {
            buffer_offset: 0,
            buffer_row_length: 0,
            buffer_image_height: 0,
            image_subresource: vk::ImageSubresourceLayers {
                aspect_mask: vk::ImageAspectFlags::COLOR,
                mip_level: 0,
                base_array_layer: 0,
                layer_count,
            },
            image_offset: vk::Offset3D { x: 0, y: 0, z: 0 },
            image_extent: vk::Extent3D { width: extent.width, height: extent.height, depth: 1 },
        };
        unsafe {
            self.device.cmd_copy_buffer_to_image(
                command_buffer,
                buffer,
                image,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                &[region],
            )
        }
    }
}
