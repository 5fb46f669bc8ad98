/// Voxel demo - a lit cube and a floor circled by colored point lights
///
/// WASD/QE move the viewer, the arrow keys look around, Escape quits.

mod config;
mod models;

use std::time::Instant;

use glam::{Mat4, Vec3};
use voxel_engine::input::{KeyCode, KeyboardMovementController};
use voxel_engine::voxel::device::{
    BufferUsage, DescriptorPool, DescriptorSetLayout, DescriptorType, DescriptorWriter, GpuBuffer,
    GraphicsDevice, MemoryProperties, ShaderStages,
};
use voxel_engine::voxel::render::{
    FrameEnd, FrameInfo, GlobalUbo, PointLightSystem, Renderer, ShaderSet, SimpleRenderSystem, Swapchain,
};
use voxel_engine::voxel::scene::{Camera, GameObjectId, Mesh, Scene, Transform};
use voxel_engine::voxel::{Result, MAX_FRAMES_IN_FLIGHT};
use voxel_engine::window::{DesktopWindow, Window};
use voxel_engine::{engine_error, engine_info};
use voxel_engine_renderer_vulkan::{load_spirv, print_validation_stats_report, VulkanDevice};

use config::DemoConfig;

const SOURCE: &str = "voxel_demo";

/// Longest step fed to the controller, so a stalled frame does not teleport the viewer
const MAX_FRAME_TIME: f32 = 0.25;

const LIGHT_COLORS: [Vec3; 6] = [
    Vec3::new(1.0, 0.1, 0.1),
    Vec3::new(0.1, 0.1, 1.0),
    Vec3::new(0.1, 1.0, 0.1),
    Vec3::new(1.0, 1.0, 0.1),
    Vec3::new(0.1, 1.0, 1.0),
    Vec3::new(1.0, 1.0, 1.0),
];

fn main() {
    let config = DemoConfig::from_env();
    if let Err(e) = run(&config) {
        engine_error!(SOURCE, "Demo failed: {}", e);
        std::process::exit(1);
    }
}

fn load_shaders(config: &DemoConfig, name: &str) -> Result<ShaderSet> {
    Ok(ShaderSet {
        vertex: load_spirv(config.shader_path(&format!("{}.vert", name)))?,
        fragment: load_spirv(config.shader_path(&format!("{}.frag", name)))?,
    })
}

fn build_scene<'d>(device: &'d VulkanDevice, scene: &mut Scene<'d, VulkanDevice>) -> Result<Vec<GameObjectId>> {
    let (vertices, indices) = models::cube();
    let cube = scene.add_mesh(Mesh::new(device, &vertices, &indices)?);
    let (vertices, indices) = models::floor(3.0, Vec3::splat(0.6));
    let floor = scene.add_mesh(Mesh::new(device, &vertices, &indices)?);

    let object = scene.spawn_mesh(cube);
    object.transform = Transform::from_translation(Vec3::new(-0.8, 0.0, 0.0)).with_scale(0.6);
    object.color = Vec3::new(1.0, 0.8, 0.6);

    let object = scene.spawn_mesh(cube);
    object.transform = Transform::from_translation(Vec3::new(0.8, 0.2, 0.0))
        .with_scale(0.4)
        .with_rotation(Vec3::new(0.0, 0.6, 0.0));
    object.color = Vec3::ONE;

    let object = scene.spawn_mesh(floor);
    object.transform = Transform::from_translation(Vec3::new(0.0, 0.5, 0.0));
    object.color = Vec3::ONE;

    let lights = models::ring(LIGHT_COLORS.len(), 1.6, -1.0)
        .into_iter()
        .zip(LIGHT_COLORS)
        .map(|(position, color)| {
            let id = scene.spawn_point_light(0.1, color, 0.2);
            if let Some(light) = scene.object_mut(id) {
                light.transform.translation = position;
            }
            id
        })
        .collect();
    Ok(lights)
}

fn run(config: &DemoConfig) -> Result<()> {
    let mut window = DesktopWindow::new(&config.title, config.width, config.height)?;
    let renderer_config = config.renderer_config();
    let device = VulkanDevice::new(&window, &renderer_config)?;

    let swapchain = Swapchain::new(&device, window.extent(), &renderer_config)?;
    let mut renderer = Renderer::new(&device, swapchain, renderer_config)?;

    // One uniform buffer and descriptor set per frame in flight
    let global_pool = DescriptorPool::builder(&device)
        .max_sets(MAX_FRAMES_IN_FLIGHT as u32)
        .add_pool_size(DescriptorType::UniformBuffer, MAX_FRAMES_IN_FLIGHT as u32)
        .build()?;
    let global_layout = DescriptorSetLayout::builder(&device)
        .add_binding(
            0,
            DescriptorType::UniformBuffer,
            ShaderStages::VERTEX | ShaderStages::FRAGMENT,
            1,
        )
        .build()?;

    let mut ubo_buffers = Vec::with_capacity(MAX_FRAMES_IN_FLIGHT);
    let mut global_sets = Vec::with_capacity(MAX_FRAMES_IN_FLIGHT);
    for _ in 0..MAX_FRAMES_IN_FLIGHT {
        let buffer = GpuBuffer::new(
            &device,
            std::mem::size_of::<GlobalUbo>() as u64,
            1,
            BufferUsage::UNIFORM,
            MemoryProperties::HOST_VISIBLE | MemoryProperties::HOST_COHERENT,
            device.min_uniform_buffer_offset_alignment(),
        )?;
        let set = DescriptorWriter::new(&global_layout, &global_pool)
            .write_buffer(0, buffer.descriptor_info_for_index(0))?
            .build()?;
        ubo_buffers.push(buffer);
        global_sets.push(set);
    }

    let mut simple_system = SimpleRenderSystem::new(
        &device,
        load_shaders(config, "simple_shader")?,
        renderer.render_pass(),
        global_layout.handle(),
        renderer.pipeline_epoch(),
    )?;
    let mut light_system = PointLightSystem::new(
        &device,
        load_shaders(config, "point_light")?,
        renderer.render_pass(),
        global_layout.handle(),
        renderer.pipeline_epoch(),
    )?;

    let mut scene = Scene::new();
    let lights = build_scene(&device, &mut scene)?;

    let mut camera = Camera::new();
    let controller = KeyboardMovementController::default();
    let mut viewer = Transform::from_translation(Vec3::new(0.0, -0.5, -3.0));

    engine_info!(SOURCE, "Running on {}", device.device_name());

    let mut last_frame = Instant::now();
    while !window.should_close() {
        window.poll_events();
        if window.is_key_pressed(KeyCode::Escape) {
            window.request_close();
            continue;
        }

        let now = Instant::now();
        let frame_time = now.duration_since(last_frame).as_secs_f32().min(MAX_FRAME_TIME);
        last_frame = now;

        controller.move_in_plane_xz(&window, frame_time, &mut viewer);
        camera.set_view_yxz(viewer.translation, viewer.rotation);
        camera.set_perspective_projection(50f32.to_radians(), renderer.aspect_ratio(), 0.1, 100.0);

        simple_system.refresh(renderer.render_pass(), renderer.pipeline_epoch())?;
        light_system.refresh(renderer.render_pass(), renderer.pipeline_epoch())?;

        let Some(command_buffer) = renderer.frame_begin(&mut window)? else {
            continue;
        };
        let frame_index = renderer.frame_index();

        let orbit = Mat4::from_axis_angle(Vec3::NEG_Y, frame_time * 0.5);
        for &id in &lights {
            if let Some(light) = scene.object_mut(id) {
                light.transform.translation = orbit.transform_point3(light.transform.translation);
            }
        }

        let frame_info = FrameInfo {
            frame_index,
            frame_time,
            command_buffer,
            camera: &camera,
            global_descriptor_set: global_sets[frame_index],
        };

        let mut ubo = GlobalUbo::default();
        ubo.set_camera(&camera);
        light_system.update(&scene, &mut ubo);
        ubo_buffers[frame_index].write_value(&ubo, 0)?;
        ubo_buffers[frame_index].flush_all()?;

        renderer.begin_swapchain_render_pass(command_buffer);
        simple_system.render(&frame_info, &scene);
        light_system.render(&frame_info, &scene);
        renderer.end_swapchain_render_pass(command_buffer);

        if renderer.frame_end(&mut window)? == FrameEnd::SwapchainRecreated {
            engine_info!(SOURCE, "Swapchain recreated at {:?}", renderer.extent());
        }
    }

    renderer.wait_idle()?;
    print_validation_stats_report();
    Ok(())
}
