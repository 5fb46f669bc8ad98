/// MockGraphicsDevice - in-memory GraphicsDevice for unit tests
///
/// Records every call, simulates fence and semaphore lifetimes, stores buffer
/// contents in host memory and lets tests script acquire/present results.
/// With `GpuLatency::Slow`, submitted work stays pending until something waits
/// on its fence, which is how the frame-pacing tests observe blocking.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::time::Duration;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::{Error, Result};
use crate::graphics_device::command::{
    ClearValue, ImageAspect, ImageDesc, IndexType, Rect2D, ShaderStages, Viewport,
};
use crate::graphics_device::descriptor::{DescriptorBinding, DescriptorPoolSize, DescriptorWrite};
use crate::graphics_device::format::{
    ColorSpace, Format, FormatFeatures, FormatProperties, SurfaceFormat,
};
use crate::graphics_device::graphics_device::GraphicsDevice;
use crate::graphics_device::memory::{find_memory_type, BufferUsage, MemoryProperties, MemoryType};
use crate::graphics_device::pipeline::{PipelineDesc, PushConstantRange};
use crate::graphics_device::surface::{
    AcquireOutcome, Extent2D, PresentMode, SurfaceCapabilities, SwapchainDesc, SwapchainStatus,
};

/// Opaque handle used for every object kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MockHandle(pub u32);

/// When submitted work completes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpuLatency {
    /// Fences and semaphores are signaled as soon as work is submitted
    Instant,
    /// Work completes only when a fence wait (or idle wait) forces it
    Slow,
}

/// One `submit` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitRecord {
    pub command_buffer: MockHandle,
    pub wait: Option<MockHandle>,
    pub signal: Option<MockHandle>,
    pub fence: Option<MockHandle>,
}

struct MemoryBlock {
    properties: MemoryProperties,
    bytes: Vec<u8>,
}

struct MockState {
    next_handle: u32,
    calls: Vec<String>,
    violations: Vec<String>,
    live: FxHashMap<&'static str, FxHashSet<MockHandle>>,

    latency: GpuLatency,
    signaled_fences: FxHashSet<MockHandle>,
    pending_fences: FxHashSet<MockHandle>,
    max_pending_fences: usize,
    semaphore_last_fence: FxHashMap<MockHandle, MockHandle>,
    /// Serial of the submission each fence was last attached to
    fence_submission: FxHashMap<MockHandle, u64>,
    /// Last fenced submission of each command buffer
    command_buffer_submission: FxHashMap<MockHandle, (MockHandle, u64)>,
    next_submission: u64,
    recording: FxHashSet<MockHandle>,
    submits: Vec<SubmitRecord>,
    fail_next_submit: bool,

    capabilities: SurfaceCapabilities,
    surface_formats: Vec<SurfaceFormat>,
    present_modes: Vec<PresentMode>,
    depth_formats: Vec<Format>,

    swapchain_descs: FxHashMap<MockHandle, SwapchainDesc>,
    swapchain_images: FxHashMap<MockHandle, Vec<MockHandle>>,
    next_round_robin: FxHashMap<MockHandle, u32>,
    acquire_script: VecDeque<AcquireOutcome>,
    present_script: VecDeque<Result<SwapchainStatus>>,
    presents: Vec<u32>,
    created_swapchains: Vec<(SwapchainDesc, Option<MockHandle>)>,

    memory: FxHashMap<MockHandle, MemoryBlock>,
    buffer_memory: FxHashMap<MockHandle, MockHandle>,
    push_constants: Vec<Vec<u8>>,
    descriptor_writes: Vec<(MockHandle, DescriptorWrite<MockHandle>)>,
}

pub struct MockGraphicsDevice {
    memory_types: Vec<MemoryType>,
    state: RefCell<MockState>,
}

impl Default for MockGraphicsDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGraphicsDevice {
    /// Device with a 2..=3 image surface of 800x600 and instant GPU
    pub fn new() -> Self {
        Self {
            memory_types: vec![
                MemoryType { properties: MemoryProperties::DEVICE_LOCAL, heap_index: 0 },
                MemoryType {
                    properties: MemoryProperties::HOST_VISIBLE | MemoryProperties::HOST_COHERENT,
                    heap_index: 1,
                },
            ],
            state: RefCell::new(MockState {
                next_handle: 1,
                calls: Vec::new(),
                violations: Vec::new(),
                live: FxHashMap::default(),
                latency: GpuLatency::Instant,
                signaled_fences: FxHashSet::default(),
                pending_fences: FxHashSet::default(),
                max_pending_fences: 0,
                semaphore_last_fence: FxHashMap::default(),
                fence_submission: FxHashMap::default(),
                command_buffer_submission: FxHashMap::default(),
                next_submission: 0,
                recording: FxHashSet::default(),
                submits: Vec::new(),
                fail_next_submit: false,
                capabilities: SurfaceCapabilities {
                    min_image_count: 2,
                    max_image_count: 3,
                    current_extent: None,
                    min_image_extent: Extent2D::new(1, 1),
                    max_image_extent: Extent2D::new(4096, 4096),
                },
                surface_formats: vec![SurfaceFormat {
                    format: Format::B8G8R8A8_UNORM,
                    color_space: ColorSpace::SrgbNonlinear,
                }],
                present_modes: vec![PresentMode::Fifo, PresentMode::Mailbox],
                depth_formats: vec![Format::D32_SFLOAT],
                swapchain_descs: FxHashMap::default(),
                swapchain_images: FxHashMap::default(),
                next_round_robin: FxHashMap::default(),
                acquire_script: VecDeque::new(),
                present_script: VecDeque::new(),
                presents: Vec::new(),
                created_swapchains: Vec::new(),
                memory: FxHashMap::default(),
                buffer_memory: FxHashMap::default(),
                push_constants: Vec::new(),
                descriptor_writes: Vec::new(),
            }),
        }
    }

    // ===== CONFIGURATION =====

    pub fn set_latency(&self, latency: GpuLatency) {
        self.state.borrow_mut().latency = latency;
    }

    /// Surface image limits; the swapchain will use `min + 1` capped at `max`
    pub fn set_image_count_limits(&self, min: u32, max: u32) {
        let mut state = self.state.borrow_mut();
        state.capabilities.min_image_count = min;
        state.capabilities.max_image_count = max;
    }

    pub fn set_surface_formats(&self, formats: Vec<SurfaceFormat>) {
        self.state.borrow_mut().surface_formats = formats;
    }

    pub fn set_depth_formats(&self, formats: Vec<Format>) {
        self.state.borrow_mut().depth_formats = formats;
    }

    /// Results returned by the next acquires, before falling back to round-robin
    pub fn script_acquire(&self, outcomes: impl IntoIterator<Item = AcquireOutcome>) {
        self.state.borrow_mut().acquire_script.extend(outcomes);
    }

    /// Results returned by the next presents, before falling back to `Success`
    pub fn script_present(&self, results: impl IntoIterator<Item = Result<SwapchainStatus>>) {
        self.state.borrow_mut().present_script.extend(results);
    }

    pub fn fail_next_submit(&self) {
        self.state.borrow_mut().fail_next_submit = true;
    }

    // ===== INSPECTION =====

    pub fn calls(&self) -> Vec<String> {
        self.state.borrow().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    /// Position of the first call equal to `call`
    pub fn call_position(&self, call: &str) -> Option<usize> {
        self.state.borrow().calls.iter().position(|c| c == call)
    }

    pub fn count_calls(&self, prefix: &str) -> usize {
        self.state.borrow().calls.iter().filter(|c| c.starts_with(prefix)).count()
    }

    /// Synchronization rule breaks detected so far
    pub fn violations(&self) -> Vec<String> {
        self.state.borrow().violations.clone()
    }

    pub fn max_pending_fences(&self) -> usize {
        self.state.borrow().max_pending_fences
    }

    pub fn submits(&self) -> Vec<SubmitRecord> {
        self.state.borrow().submits.clone()
    }

    /// Image indices passed to `queue_present`, in order
    pub fn presents(&self) -> Vec<u32> {
        self.state.borrow().presents.clone()
    }

    /// Every `create_swapchain` call with the previous handle it received
    pub fn created_swapchains(&self) -> Vec<(SwapchainDesc, Option<MockHandle>)> {
        self.state.borrow().created_swapchains.clone()
    }

    pub fn live_count(&self, kind: &str) -> usize {
        self.state.borrow().live.get(kind).map_or(0, |set| set.len())
    }

    pub fn total_live(&self) -> usize {
        self.state.borrow().live.values().map(|set| set.len()).sum()
    }

    pub fn is_fence_signaled(&self, fence: MockHandle) -> bool {
        self.state.borrow().signaled_fences.contains(&fence)
    }

    /// Bytes currently stored in `memory`
    pub fn memory_contents(&self, memory: MockHandle) -> Vec<u8> {
        self.state
            .borrow()
            .memory
            .get(&memory)
            .map(|block| block.bytes.clone())
            .unwrap_or_default()
    }

    /// Bytes currently stored behind `buffer`
    pub fn buffer_contents(&self, buffer: MockHandle) -> Vec<u8> {
        let memory = self.state.borrow().buffer_memory.get(&buffer).copied();
        memory.map(|m| self.memory_contents(m)).unwrap_or_default()
    }

    pub fn push_constants(&self) -> Vec<Vec<u8>> {
        self.state.borrow().push_constants.clone()
    }

    pub fn descriptor_writes(&self) -> Vec<(MockHandle, DescriptorWrite<MockHandle>)> {
        self.state.borrow().descriptor_writes.clone()
    }

    // ===== INTERNALS =====

    fn log(&self, call: String) {
        self.state.borrow_mut().calls.push(call);
    }

    fn create(&self, kind: &'static str) -> MockHandle {
        let mut state = self.state.borrow_mut();
        let handle = MockHandle(state.next_handle);
        state.next_handle += 1;
        state.live.entry(kind).or_default().insert(handle);
        handle
    }

    fn destroy(&self, kind: &'static str, handle: MockHandle) {
        let mut state = self.state.borrow_mut();
        let removed = state.live.get_mut(kind).is_some_and(|set| set.remove(&handle));
        if !removed {
            state.violations.push(format!("destroy of unknown {} {}", kind, handle.0));
        }
        state.calls.push(format!("destroy_{}({})", kind, handle.0));
    }

    fn complete_all(state: &mut MockState) {
        let pending: Vec<MockHandle> = state.pending_fences.drain().collect();
        state.signaled_fences.extend(pending);
    }
}

impl GraphicsDevice for MockGraphicsDevice {
    type Fence = MockHandle;
    type Semaphore = MockHandle;
    type CommandBuffer = MockHandle;
    type Buffer = MockHandle;
    type DeviceMemory = MockHandle;
    type Image = MockHandle;
    type ImageView = MockHandle;
    type RenderPass = MockHandle;
    type Framebuffer = MockHandle;
    type Swapchain = MockHandle;
    type PipelineLayout = MockHandle;
    type Pipeline = MockHandle;
    type DescriptorSetLayout = MockHandle;
    type DescriptorPool = MockHandle;
    type DescriptorSet = MockHandle;

    // ===== DEVICE QUERIES =====

    fn memory_types(&self) -> &[MemoryType] {
        &self.memory_types
    }

    fn format_properties(&self, format: Format) -> FormatProperties {
        if self.state.borrow().depth_formats.contains(&format) {
            FormatProperties {
                linear_tiling_features: FormatFeatures::empty(),
                optimal_tiling_features: FormatFeatures::DEPTH_STENCIL_ATTACHMENT,
            }
        } else {
            FormatProperties::default()
        }
    }

    fn min_uniform_buffer_offset_alignment(&self) -> u64 {
        256
    }

    // ===== SYNCHRONIZATION =====

    fn create_fence(&self, signaled: bool) -> Result<MockHandle> {
        let fence = self.create("fence");
        if signaled {
            self.state.borrow_mut().signaled_fences.insert(fence);
        }
        Ok(fence)
    }

    fn destroy_fence(&self, fence: MockHandle) {
        {
            let mut state = self.state.borrow_mut();
            if state.pending_fences.remove(&fence) {
                state.violations.push(format!("fence {} destroyed while pending", fence.0));
            }
            state.signaled_fences.remove(&fence);
        }
        self.destroy("fence", fence);
    }

    fn wait_for_fence(&self, fence: MockHandle, timeout: Option<Duration>) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if state.signaled_fences.contains(&fence) {
            state.calls.push(format!("wait_fence({})", fence.0));
            return Ok(());
        }
        if state.pending_fences.remove(&fence) {
            state.calls.push(format!("wait_fence({}) blocked", fence.0));
            state.signaled_fences.insert(fence);
            return Ok(());
        }
        // Unsignaled and never submitted: nothing will ever signal it
        state.calls.push(format!("wait_fence({}) timeout", fence.0));
        if timeout.is_none() {
            state.violations.push(format!("unbounded wait on fence {} that can never signal", fence.0));
        }
        Err(Error::Timeout(format!("fence {}", fence.0)))
    }

    fn reset_fence(&self, fence: MockHandle) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if state.pending_fences.contains(&fence) {
            state.violations.push(format!("fence {} reset while pending", fence.0));
        }
        state.signaled_fences.remove(&fence);
        state.calls.push(format!("reset_fence({})", fence.0));
        Ok(())
    }

    fn create_semaphore(&self) -> Result<MockHandle> {
        Ok(self.create("semaphore"))
    }

    fn destroy_semaphore(&self, semaphore: MockHandle) {
        self.state.borrow_mut().semaphore_last_fence.remove(&semaphore);
        self.destroy("semaphore", semaphore);
    }

    fn wait_idle(&self) -> Result<()> {
        let mut state = self.state.borrow_mut();
        Self::complete_all(&mut state);
        state.calls.push("wait_idle".to_string());
        Ok(())
    }

    // ===== COMMAND BUFFERS AND SUBMISSION =====

    fn allocate_command_buffers(&self, count: u32) -> Result<Vec<MockHandle>> {
        self.log(format!("allocate_command_buffers({})", count));
        Ok((0..count).map(|_| self.create("command_buffer")).collect())
    }

    fn free_command_buffers(&self, command_buffers: &[MockHandle]) {
        for &command_buffer in command_buffers {
            let mut state = self.state.borrow_mut();
            state.recording.remove(&command_buffer);
            state.command_buffer_submission.remove(&command_buffer);
            drop(state);
            self.destroy("command_buffer", command_buffer);
        }
    }

    fn begin_command_buffer(&self, command_buffer: MockHandle, one_time_submit: bool) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if !state.recording.insert(command_buffer) {
            state.violations.push(format!("command buffer {} begun twice", command_buffer.0));
        }
        if let Some(&(fence, serial)) = state.command_buffer_submission.get(&command_buffer) {
            let same_submission = state.fence_submission.get(&fence) == Some(&serial);
            if same_submission && state.pending_fences.contains(&fence) {
                state.violations.push(format!(
                    "command buffer {} begun while fence {} is pending",
                    command_buffer.0, fence.0
                ));
            }
        }
        state.calls.push(format!("begin_command_buffer({}, one_time={})", command_buffer.0, one_time_submit));
        Ok(())
    }

    fn end_command_buffer(&self, command_buffer: MockHandle) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.calls.push(format!("end_command_buffer({})", command_buffer.0));
        if !state.recording.remove(&command_buffer) {
            return Err(Error::BackendError(format!(
                "command buffer {} is not recording",
                command_buffer.0
            )));
        }
        Ok(())
    }

    fn submit(
        &self,
        command_buffer: MockHandle,
        wait: Option<MockHandle>,
        signal: Option<MockHandle>,
        fence: Option<MockHandle>,
    ) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.calls.push(format!(
            "submit(cb={}, fence={})",
            command_buffer.0,
            fence.map_or(0, |f| f.0)
        ));
        if state.fail_next_submit {
            state.fail_next_submit = false;
            return Err(Error::BackendError("queue submit failed".to_string()));
        }
        state.submits.push(SubmitRecord { command_buffer, wait, signal, fence });

        if let Some(fence) = fence {
            if state.signaled_fences.contains(&fence) || state.pending_fences.contains(&fence) {
                state.violations.push(format!("fence {} submitted while not reset", fence.0));
            }
        }
        if let Some(semaphore) = signal {
            if let Some(previous) = state.semaphore_last_fence.get(&semaphore).copied() {
                if state.pending_fences.contains(&previous) {
                    state.violations.push(format!(
                        "semaphore {} re-signaled while fence {} is pending",
                        semaphore.0, previous.0
                    ));
                }
            }
            if let Some(fence) = fence {
                state.semaphore_last_fence.insert(semaphore, fence);
            }
        }

        if let Some(fence) = fence {
            let serial = state.next_submission;
            state.next_submission += 1;
            state.fence_submission.insert(fence, serial);
            state.command_buffer_submission.insert(command_buffer, (fence, serial));
            match state.latency {
                GpuLatency::Instant => {
                    state.signaled_fences.insert(fence);
                }
                GpuLatency::Slow => {
                    state.pending_fences.insert(fence);
                    let pending = state.pending_fences.len();
                    state.max_pending_fences = state.max_pending_fences.max(pending);
                }
            }
        }
        Ok(())
    }

    fn queue_wait_idle(&self) -> Result<()> {
        let mut state = self.state.borrow_mut();
        Self::complete_all(&mut state);
        state.calls.push("queue_wait_idle".to_string());
        Ok(())
    }

    // ===== BUFFERS, IMAGES AND MEMORY =====

    fn create_buffer(
        &self,
        size: u64,
        usage: BufferUsage,
        properties: MemoryProperties,
    ) -> Result<(MockHandle, MockHandle)> {
        // Every memory type is allowed for buffers
        let type_index = find_memory_type(&self.memory_types, 0b11, properties)?;
        let properties = self.memory_types[type_index as usize].properties;
        let buffer = self.create("buffer");
        let memory = self.create("memory");
        let mut state = self.state.borrow_mut();
        state.memory.insert(memory, MemoryBlock { properties, bytes: vec![0; size as usize] });
        state.buffer_memory.insert(buffer, memory);
        state.calls.push(format!("create_buffer({}, {:?})", size, usage));
        Ok((buffer, memory))
    }

    fn destroy_buffer(&self, buffer: MockHandle, memory: MockHandle) {
        {
            let mut state = self.state.borrow_mut();
            state.buffer_memory.remove(&buffer);
            state.memory.remove(&memory);
        }
        self.destroy("buffer", buffer);
        self.destroy("memory", memory);
    }

    fn write_memory(&self, memory: MockHandle, offset: u64, data: &[u8]) -> Result<()> {
        let mut state = self.state.borrow_mut();
        let block = state
            .memory
            .get_mut(&memory)
            .ok_or_else(|| Error::InvalidResource(format!("unknown memory {}", memory.0)))?;
        if !block.properties.contains(MemoryProperties::HOST_VISIBLE) {
            return Err(Error::InvalidResource("memory is not host visible".to_string()));
        }
        let start = offset as usize;
        let end = start + data.len();
        if end > block.bytes.len() {
            return Err(Error::InvalidResource(format!(
                "write of {} bytes at {} exceeds allocation of {}",
                data.len(),
                offset,
                block.bytes.len()
            )));
        }
        block.bytes[start..end].copy_from_slice(data);
        Ok(())
    }

    fn flush_memory(&self, memory: MockHandle, offset: u64, size: u64) -> Result<()> {
        self.log(format!("flush_memory({}, {}, {})", memory.0, offset, size));
        Ok(())
    }

    fn create_image(&self, desc: &ImageDesc, _properties: MemoryProperties) -> Result<(MockHandle, MockHandle)> {
        let image = self.create("image");
        let memory = self.create("memory");
        self.log(format!("create_image({:?}, {}x{})", desc.format, desc.extent.width, desc.extent.height));
        Ok((image, memory))
    }

    fn destroy_image(&self, image: MockHandle, memory: MockHandle) {
        self.destroy("image", image);
        self.destroy("memory", memory);
    }

    fn create_image_view(&self, image: MockHandle, format: Format, aspect: ImageAspect) -> Result<MockHandle> {
        self.log(format!("create_image_view({}, {:?}, {:?})", image.0, format, aspect));
        Ok(self.create("image_view"))
    }

    fn destroy_image_view(&self, view: MockHandle) {
        self.destroy("image_view", view);
    }

    // ===== PRESENTATION =====

    fn surface_capabilities(&self) -> Result<SurfaceCapabilities> {
        Ok(self.state.borrow().capabilities)
    }

    fn surface_formats(&self) -> Result<Vec<SurfaceFormat>> {
        Ok(self.state.borrow().surface_formats.clone())
    }

    fn surface_present_modes(&self) -> Result<Vec<PresentMode>> {
        Ok(self.state.borrow().present_modes.clone())
    }

    fn create_swapchain(&self, desc: &SwapchainDesc, previous: Option<MockHandle>) -> Result<MockHandle> {
        let swapchain = self.create("swapchain");
        let mut state = self.state.borrow_mut();
        if let Some(previous) = previous {
            if !state.live.get("swapchain").is_some_and(|set| set.contains(&previous)) {
                state.violations.push(format!("previous swapchain {} is not alive", previous.0));
            }
        }
        let first_image = state.next_handle;
        state.next_handle += desc.min_image_count;
        let images = (0..desc.min_image_count).map(|i| MockHandle(first_image + i)).collect();
        state.swapchain_images.insert(swapchain, images);
        state.swapchain_descs.insert(swapchain, *desc);
        state.created_swapchains.push((*desc, previous));
        state.calls.push(format!(
            "create_swapchain({}x{}, previous={})",
            desc.extent.width,
            desc.extent.height,
            previous.map_or(0, |p| p.0)
        ));
        Ok(swapchain)
    }

    fn swapchain_images(&self, swapchain: MockHandle) -> Result<Vec<MockHandle>> {
        self.state
            .borrow()
            .swapchain_images
            .get(&swapchain)
            .cloned()
            .ok_or_else(|| Error::InvalidResource(format!("unknown swapchain {}", swapchain.0)))
    }

    fn destroy_swapchain(&self, swapchain: MockHandle) {
        {
            let mut state = self.state.borrow_mut();
            state.swapchain_images.remove(&swapchain);
            state.swapchain_descs.remove(&swapchain);
            state.next_round_robin.remove(&swapchain);
        }
        self.destroy("swapchain", swapchain);
    }

    fn acquire_next_image(
        &self,
        swapchain: MockHandle,
        _signal: MockHandle,
        _timeout: Option<Duration>,
    ) -> Result<AcquireOutcome> {
        let mut state = self.state.borrow_mut();
        let outcome = match state.acquire_script.pop_front() {
            Some(outcome) => outcome,
            None => {
                let count = state
                    .swapchain_images
                    .get(&swapchain)
                    .map_or(0, |images| images.len() as u32);
                if count == 0 {
                    return Err(Error::InvalidResource(format!("unknown swapchain {}", swapchain.0)));
                }
                let next = state.next_round_robin.entry(swapchain).or_insert(0);
                let image_index = *next % count;
                *next += 1;
                AcquireOutcome::Acquired { image_index, suboptimal: false }
            }
        };
        match outcome {
            AcquireOutcome::Acquired { image_index, .. } => {
                state.calls.push(format!("acquire({})", image_index))
            }
            AcquireOutcome::OutOfDate => state.calls.push("acquire(out_of_date)".to_string()),
        }
        Ok(outcome)
    }

    fn queue_present(&self, _swapchain: MockHandle, image_index: u32, _wait: MockHandle) -> Result<SwapchainStatus> {
        let mut state = self.state.borrow_mut();
        state.calls.push(format!("present({})", image_index));
        let result = state.present_script.pop_front().unwrap_or(Ok(SwapchainStatus::Success));
        if matches!(result, Ok(SwapchainStatus::Success) | Ok(SwapchainStatus::Suboptimal)) {
            state.presents.push(image_index);
        }
        result
    }

    // ===== RENDER PASSES AND FRAMEBUFFERS =====

    fn create_render_pass(&self, color_format: Format, depth_format: Format) -> Result<MockHandle> {
        self.log(format!("create_render_pass({:?}, {:?})", color_format, depth_format));
        Ok(self.create("render_pass"))
    }

    fn destroy_render_pass(&self, render_pass: MockHandle) {
        self.destroy("render_pass", render_pass);
    }

    fn create_framebuffer(
        &self,
        _render_pass: MockHandle,
        attachments: &[MockHandle],
        extent: Extent2D,
    ) -> Result<MockHandle> {
        self.log(format!(
            "create_framebuffer({} attachments, {}x{})",
            attachments.len(),
            extent.width,
            extent.height
        ));
        Ok(self.create("framebuffer"))
    }

    fn destroy_framebuffer(&self, framebuffer: MockHandle) {
        self.destroy("framebuffer", framebuffer);
    }

    // ===== PIPELINES =====

    fn create_pipeline_layout(
        &self,
        set_layouts: &[MockHandle],
        push_constant_ranges: &[PushConstantRange],
    ) -> Result<MockHandle> {
        self.log(format!(
            "create_pipeline_layout({} sets, {} ranges)",
            set_layouts.len(),
            push_constant_ranges.len()
        ));
        Ok(self.create("pipeline_layout"))
    }

    fn destroy_pipeline_layout(&self, layout: MockHandle) {
        self.destroy("pipeline_layout", layout);
    }

    fn create_graphics_pipeline(&self, desc: &PipelineDesc<'_, Self>) -> Result<MockHandle> {
        if desc.vertex_spirv.is_empty() || desc.fragment_spirv.is_empty() {
            return Err(Error::InvalidResource("empty shader module".to_string()));
        }
        self.log(format!("create_graphics_pipeline(render_pass={})", desc.render_pass.0));
        Ok(self.create("pipeline"))
    }

    fn destroy_pipeline(&self, pipeline: MockHandle) {
        self.destroy("pipeline", pipeline);
    }

    // ===== DESCRIPTORS =====

    fn create_descriptor_set_layout(&self, bindings: &[DescriptorBinding]) -> Result<MockHandle> {
        self.log(format!("create_descriptor_set_layout({} bindings)", bindings.len()));
        Ok(self.create("descriptor_set_layout"))
    }

    fn destroy_descriptor_set_layout(&self, layout: MockHandle) {
        self.destroy("descriptor_set_layout", layout);
    }

    fn create_descriptor_pool(
        &self,
        max_sets: u32,
        pool_sizes: &[DescriptorPoolSize],
        free_individual_sets: bool,
    ) -> Result<MockHandle> {
        self.log(format!(
            "create_descriptor_pool(max_sets={}, {} sizes, free={})",
            max_sets,
            pool_sizes.len(),
            free_individual_sets
        ));
        Ok(self.create("descriptor_pool"))
    }

    fn destroy_descriptor_pool(&self, pool: MockHandle) {
        self.destroy("descriptor_pool", pool);
    }

    fn allocate_descriptor_set(&self, pool: MockHandle, layout: MockHandle) -> Result<MockHandle> {
        self.log(format!("allocate_descriptor_set(pool={}, layout={})", pool.0, layout.0));
        Ok(self.create("descriptor_set"))
    }

    fn free_descriptor_sets(&self, _pool: MockHandle, sets: &[MockHandle]) -> Result<()> {
        for &set in sets {
            self.destroy("descriptor_set", set);
        }
        Ok(())
    }

    fn reset_descriptor_pool(&self, pool: MockHandle) -> Result<()> {
        self.log(format!("reset_descriptor_pool({})", pool.0));
        self.state.borrow_mut().live.remove("descriptor_set");
        Ok(())
    }

    fn update_descriptor_set(&self, set: MockHandle, writes: &[DescriptorWrite<MockHandle>]) {
        let mut state = self.state.borrow_mut();
        state.calls.push(format!("update_descriptor_set({}, {} writes)", set.0, writes.len()));
        state.descriptor_writes.extend(writes.iter().map(|w| (set, *w)));
    }

    // ===== COMMAND RECORDING =====

    fn cmd_begin_render_pass(
        &self,
        command_buffer: MockHandle,
        render_pass: MockHandle,
        framebuffer: MockHandle,
        extent: Extent2D,
        clear_values: &[ClearValue],
    ) {
        self.log(format!(
            "cmd_begin_render_pass(cb={}, rp={}, fb={}, {}x{}, {} clears)",
            command_buffer.0,
            render_pass.0,
            framebuffer.0,
            extent.width,
            extent.height,
            clear_values.len()
        ));
    }

    fn cmd_end_render_pass(&self, command_buffer: MockHandle) {
        self.log(format!("cmd_end_render_pass(cb={})", command_buffer.0));
    }

    fn cmd_set_viewport(&self, command_buffer: MockHandle, viewport: Viewport) {
        self.log(format!(
            "cmd_set_viewport(cb={}, {}x{})",
            command_buffer.0, viewport.width, viewport.height
        ));
    }

    fn cmd_set_scissor(&self, command_buffer: MockHandle, scissor: Rect2D) {
        self.log(format!(
            "cmd_set_scissor(cb={}, {}x{})",
            command_buffer.0, scissor.width, scissor.height
        ));
    }

    fn cmd_bind_pipeline(&self, command_buffer: MockHandle, pipeline: MockHandle) {
        self.log(format!("cmd_bind_pipeline(cb={}, {})", command_buffer.0, pipeline.0));
    }

    fn cmd_bind_descriptor_sets(
        &self,
        command_buffer: MockHandle,
        _layout: MockHandle,
        first_set: u32,
        sets: &[MockHandle],
    ) {
        self.log(format!(
            "cmd_bind_descriptor_sets(cb={}, first={}, {:?})",
            command_buffer.0,
            first_set,
            sets.iter().map(|s| s.0).collect::<Vec<_>>()
        ));
    }

    fn cmd_push_constants(
        &self,
        command_buffer: MockHandle,
        _layout: MockHandle,
        stages: ShaderStages,
        offset: u32,
        data: &[u8],
    ) {
        let mut state = self.state.borrow_mut();
        state.calls.push(format!(
            "cmd_push_constants(cb={}, {:?}, offset={}, {} bytes)",
            command_buffer.0,
            stages,
            offset,
            data.len()
        ));
        state.push_constants.push(data.to_vec());
    }

    fn cmd_bind_vertex_buffers(
        &self,
        command_buffer: MockHandle,
        first_binding: u32,
        buffers: &[MockHandle],
        _offsets: &[u64],
    ) {
        self.log(format!(
            "cmd_bind_vertex_buffers(cb={}, first={}, {:?})",
            command_buffer.0,
            first_binding,
            buffers.iter().map(|b| b.0).collect::<Vec<_>>()
        ));
    }

    fn cmd_bind_index_buffer(
        &self,
        command_buffer: MockHandle,
        buffer: MockHandle,
        _offset: u64,
        index_type: IndexType,
    ) {
        self.log(format!(
            "cmd_bind_index_buffer(cb={}, {}, {:?})",
            command_buffer.0, buffer.0, index_type
        ));
    }

    fn cmd_draw(
        &self,
        command_buffer: MockHandle,
        vertex_count: u32,
        instance_count: u32,
        first_vertex: u32,
        first_instance: u32,
    ) {
        self.log(format!(
            "cmd_draw(cb={}, {}, {}, {}, {})",
            command_buffer.0, vertex_count, instance_count, first_vertex, first_instance
        ));
    }

    fn cmd_draw_indexed(
        &self,
        command_buffer: MockHandle,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    ) {
        self.log(format!(
            "cmd_draw_indexed(cb={}, {}, {}, {}, {}, {})",
            command_buffer.0, index_count, instance_count, first_index, vertex_offset, first_instance
        ));
    }

    fn cmd_copy_buffer(&self, command_buffer: MockHandle, src: MockHandle, dst: MockHandle, size: u64) {
        let mut state = self.state.borrow_mut();
        state.calls.push(format!(
            "cmd_copy_buffer(cb={}, {} -> {}, {} bytes)",
            command_buffer.0, src.0, dst.0, size
        ));
        let src_memory = state.buffer_memory.get(&src).copied();
        let dst_memory = state.buffer_memory.get(&dst).copied();
        if let (Some(src_memory), Some(dst_memory)) = (src_memory, dst_memory) {
            let bytes: Vec<u8> = state
                .memory
                .get(&src_memory)
                .map(|block| block.bytes.iter().take(size as usize).copied().collect())
                .unwrap_or_default();
            if let Some(block) = state.memory.get_mut(&dst_memory) {
                let len = bytes.len().min(block.bytes.len());
                block.bytes[..len].copy_from_slice(&bytes[..len]);
            }
        }
    }

    fn cmd_copy_buffer_to_image(
        &self,
        command_buffer: MockHandle,
        buffer: MockHandle,
        image: MockHandle,
        extent: Extent2D,
        layer_count: u32,
    ) {
        self.log(format!(
            "cmd_copy_buffer_to_image(cb={}, {} -> {}, {}x{}, layers={})",
            command_buffer.0, buffer.0, image.0, extent.width, extent.height, layer_count
        ));
    }
}

#[cfg(test)]
#[path = "mock_graphics_device_tests.rs"]
mod tests;
