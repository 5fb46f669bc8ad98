/// Graphics pipeline description types

use crate::graphics_device::command::ShaderStages;
use crate::graphics_device::format::Format;
use crate::graphics_device::graphics_device::GraphicsDevice;

/// Primitive topology
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveTopology {
    PointList,
    LineList,
    TriangleList,
    TriangleStrip,
}

/// Rasterizer fill mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolygonMode {
    Fill,
    Line,
}

/// Face culling mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CullMode {
    None,
    Front,
    Back,
}

/// Winding order of front faces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontFace {
    Clockwise,
    CounterClockwise,
}

/// Depth comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Never,
    Less,
    LessOrEqual,
    Always,
}

/// A vertex buffer binding slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexBinding {
    pub binding: u32,
    pub stride: u32,
}

/// One vertex attribute read from a binding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    pub location: u32,
    pub binding: u32,
    pub format: Format,
    pub offset: u32,
}

/// Push-constant block visible to `stages`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PushConstantRange {
    pub stages: ShaderStages,
    pub offset: u32,
    pub size: u32,
}

/// Fixed-function state of a graphics pipeline
///
/// Viewport and scissor are always dynamic; the renderer sets them to the
/// swapchain extent when the render pass begins.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub topology: PrimitiveTopology,
    pub polygon_mode: PolygonMode,
    pub cull_mode: CullMode,
    pub front_face: FrontFace,
    pub depth_test: bool,
    pub depth_write: bool,
    pub depth_compare: CompareOp,
    pub alpha_blending: bool,
    pub vertex_bindings: Vec<VertexBinding>,
    pub vertex_attributes: Vec<VertexAttribute>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            topology: PrimitiveTopology::TriangleList,
            polygon_mode: PolygonMode::Fill,
            cull_mode: CullMode::None,
            front_face: FrontFace::Clockwise,
            depth_test: true,
            depth_write: true,
            depth_compare: CompareOp::Less,
            alpha_blending: false,
            vertex_bindings: Vec::new(),
            vertex_attributes: Vec::new(),
        }
    }
}

impl PipelineConfig {
    /// Drop the vertex input state (vertices generated in the shader)
    pub fn without_vertex_input(mut self) -> Self {
        self.vertex_bindings.clear();
        self.vertex_attributes.clear();
        self
    }

    pub fn with_alpha_blending(mut self) -> Self {
        self.alpha_blending = true;
        self
    }
}

/// Everything needed to build one graphics pipeline
pub struct PipelineDesc<'a, D: GraphicsDevice + ?Sized> {
    /// SPIR-V words of the vertex stage
    pub vertex_spirv: &'a [u32],
    /// SPIR-V words of the fragment stage
    pub fragment_spirv: &'a [u32],
    pub layout: D::PipelineLayout,
    pub render_pass: D::RenderPass,
    pub config: &'a PipelineConfig,
}
