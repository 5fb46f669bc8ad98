//! Unit tests for the Renderer frame protocol
//!
//! Drives full frames against MockGraphicsDevice and MockWindow.

use super::*;
use crate::error::Error;
use crate::graphics_device::mock_graphics_device::{GpuLatency, MockGraphicsDevice, MockHandle};
use crate::graphics_device::{ColorSpace, Format, SurfaceFormat};
use crate::window::mock_window::MockWindow;

fn renderer(device: &MockGraphicsDevice) -> Renderer<'_, MockGraphicsDevice> {
    let config = RendererConfig::default();
    let swapchain = Swapchain::new(device, Extent2D::new(800, 600), &config).unwrap();
    Renderer::new(device, swapchain, config).unwrap()
}

/// One full frame with an empty render pass; `None` when the frame was skipped
fn draw_frame(
    renderer: &mut Renderer<'_, MockGraphicsDevice>,
    window: &mut MockWindow,
) -> Option<(u32, FrameEnd)> {
    let cb = renderer.frame_begin(window).unwrap()?;
    let image = renderer.current_image_index;
    renderer.begin_swapchain_render_pass(cb);
    renderer.end_swapchain_render_pass(cb);
    let end = renderer.frame_end(window).unwrap();
    Some((image, end))
}

// ============================================================================
// Construction
// ============================================================================

#[test]
fn test_one_command_buffer_per_image() {
    let device = MockGraphicsDevice::new();
    let renderer = renderer(&device);
    assert_eq!(renderer.command_buffers.len(), renderer.swapchain().image_count());
    assert_eq!(device.live_count("command_buffer"), 3);
    assert!(!renderer.is_frame_started());
    assert_eq!(renderer.frame_index(), 0);
    assert_eq!(renderer.pipeline_epoch(), 0);
    assert_eq!(renderer.aspect_ratio(), 800.0 / 600.0);
}

#[test]
fn test_drop_releases_everything() {
    let device = MockGraphicsDevice::new();
    let mut window = MockWindow::new(800, 600);
    {
        let mut renderer = renderer(&device);
        draw_frame(&mut renderer, &mut window);
    }
    assert_eq!(device.total_live(), 0);
    assert!(device.violations().is_empty());
}

// ============================================================================
// Steady state
// ============================================================================

#[test]
fn test_double_buffered_frame_sequence() {
    let device = MockGraphicsDevice::new();
    device.set_image_count_limits(1, 2);
    let mut renderer = renderer(&device);
    let mut window = MockWindow::new(800, 600);
    assert_eq!(renderer.swapchain().image_count(), 2);

    let mut images = Vec::new();
    let mut frame_indices = Vec::new();
    for _ in 0..5 {
        let (image, end) = draw_frame(&mut renderer, &mut window).unwrap();
        assert_eq!(end, FrameEnd::Presented);
        images.push(image);
        frame_indices.push(renderer.frame_index());
    }

    assert_eq!(images, vec![0, 1, 0, 1, 0]);
    assert_eq!(frame_indices, vec![1, 0, 1, 0, 1]);
    assert_eq!(device.presents(), vec![0, 1, 0, 1, 0]);
    assert!(device.violations().is_empty());
}

#[test]
fn test_frame_records_into_image_command_buffer() {
    let device = MockGraphicsDevice::new();
    let mut renderer = renderer(&device);
    let mut window = MockWindow::new(800, 600);
    device.script_acquire([AcquireOutcome::Acquired { image_index: 2, suboptimal: false }]);

    let cb = renderer.frame_begin(&mut window).unwrap().unwrap();

    assert_eq!(cb, renderer.command_buffers[2]);
    assert_eq!(renderer.current_command_buffer(), cb);
    assert!(renderer.is_frame_started());
    renderer.frame_end(&mut window).unwrap();
    assert!(!renderer.is_frame_started());
    assert_eq!(device.submits()[0].command_buffer, cb);
}

#[test]
fn test_swapchain_render_pass_commands() {
    let device = MockGraphicsDevice::new();
    let mut renderer = renderer(&device);
    let mut window = MockWindow::new(800, 600);
    let cb = renderer.frame_begin(&mut window).unwrap().unwrap();
    let render_pass = renderer.render_pass();
    let framebuffer = renderer.swapchain().framebuffer(0);
    device.clear_calls();

    renderer.begin_swapchain_render_pass(cb);
    renderer.end_swapchain_render_pass(cb);

    assert_eq!(
        device.calls(),
        vec![
            format!(
                "cmd_begin_render_pass(cb={}, rp={}, fb={}, 800x600, 2 clears)",
                cb.0, render_pass.0, framebuffer.0
            ),
            format!("cmd_set_viewport(cb={}, 800x600)", cb.0),
            format!("cmd_set_scissor(cb={}, 800x600)", cb.0),
            format!("cmd_end_render_pass(cb={})", cb.0),
        ]
    );
    renderer.frame_end(&mut window).unwrap();
}

#[test]
fn test_slow_gpu_never_exceeds_frames_in_flight() {
    let device = MockGraphicsDevice::new();
    device.set_latency(GpuLatency::Slow);
    let mut renderer = renderer(&device);
    let mut window = MockWindow::new(800, 600);

    for _ in 0..20 {
        draw_frame(&mut renderer, &mut window).unwrap();
    }

    assert!(device.max_pending_fences() <= crate::config::MAX_FRAMES_IN_FLIGHT);
    assert!(device.violations().is_empty());
}

#[test]
fn test_reacquired_image_buffer_is_not_rerecorded_while_pending() {
    let device = MockGraphicsDevice::new();
    device.set_latency(GpuLatency::Slow);
    let mut renderer = renderer(&device);
    let mut window = MockWindow::new(800, 600);
    let cb1 = renderer.command_buffers[1];
    device.script_acquire([
        AcquireOutcome::Acquired { image_index: 0, suboptimal: false },
        AcquireOutcome::Acquired { image_index: 1, suboptimal: false },
        AcquireOutcome::Acquired { image_index: 1, suboptimal: false },
    ]);

    for _ in 0..3 {
        draw_frame(&mut renderer, &mut window).unwrap();
    }

    // Frame 2 used slot 1, so image 1's previous submission carried slot 1's fence
    let previous_fence = device.submits()[1].fence.unwrap();
    let begins: Vec<usize> = device
        .calls()
        .iter()
        .enumerate()
        .filter(|(_, call)| call.starts_with(&format!("begin_command_buffer({},", cb1.0)))
        .map(|(i, _)| i)
        .collect();
    assert_eq!(begins.len(), 2);
    let waited = device
        .call_position(&format!("wait_fence({}) blocked", previous_fence.0))
        .expect("waited on image 1's previous frame");
    assert!(waited < begins[1]);
    assert!(device.violations().is_empty());
}

// ============================================================================
// Recreation
// ============================================================================

#[test]
fn test_out_of_date_present_recreates_and_restarts_frame_index() {
    let device = MockGraphicsDevice::new();
    device.set_image_count_limits(1, 2);
    let mut renderer = renderer(&device);
    let mut window = MockWindow::new(800, 600);
    device.script_present([
        Ok(SwapchainStatus::Success),
        Ok(SwapchainStatus::Success),
        Ok(SwapchainStatus::OutOfDate),
    ]);

    let mut ends = Vec::new();
    let mut begin_indices = Vec::new();
    for _ in 0..5 {
        begin_indices.push(renderer.frame_index());
        let (_, end) = draw_frame(&mut renderer, &mut window).unwrap();
        ends.push(end);
    }

    assert_eq!(
        ends,
        vec![
            FrameEnd::Presented,
            FrameEnd::Presented,
            FrameEnd::SwapchainRecreated,
            FrameEnd::Presented,
            FrameEnd::Presented,
        ]
    );
    // Frame 4 starts on a fresh swapchain at slot 0
    assert_eq!(begin_indices, vec![0, 1, 0, 0, 1]);
    let created = device.created_swapchains();
    assert_eq!(created.len(), 2);
    assert!(created[1].1.is_some());
    assert!(renderer.swapchain().invariants_hold());
    assert!(device.violations().is_empty());
}

#[test]
fn test_out_of_date_acquire_skips_frame() {
    let device = MockGraphicsDevice::new();
    let mut renderer = renderer(&device);
    let mut window = MockWindow::new(800, 600);
    device.script_acquire([AcquireOutcome::OutOfDate]);

    assert!(renderer.frame_begin(&mut window).unwrap().is_none());
    assert!(!renderer.is_frame_started());
    assert_eq!(device.created_swapchains().len(), 2);
    assert!(device.submits().is_empty());

    let (_, end) = draw_frame(&mut renderer, &mut window).unwrap();
    assert_eq!(end, FrameEnd::Presented);
}

#[test]
fn test_suboptimal_acquire_recreates_after_present() {
    let device = MockGraphicsDevice::new();
    let mut renderer = renderer(&device);
    let mut window = MockWindow::new(800, 600);
    device.script_acquire([AcquireOutcome::Acquired { image_index: 0, suboptimal: true }]);

    let (image, end) = draw_frame(&mut renderer, &mut window).unwrap();

    assert_eq!(image, 0);
    assert_eq!(end, FrameEnd::SwapchainRecreated);
    assert_eq!(device.presents(), vec![0]);
    assert!(!renderer.swapchain().is_stale());
}

#[test]
fn test_window_resize_recreates_with_new_extent() {
    let device = MockGraphicsDevice::new();
    let mut renderer = renderer(&device);
    let mut window = MockWindow::new(800, 600);
    window.resize(1024, 768);

    let (_, end) = draw_frame(&mut renderer, &mut window).unwrap();

    assert_eq!(end, FrameEnd::SwapchainRecreated);
    assert!(!window.was_resized());
    assert_eq!(renderer.extent(), Extent2D::new(1024, 768));
    let (_, end) = draw_frame(&mut renderer, &mut window).unwrap();
    assert_eq!(end, FrameEnd::Presented);
}

#[test]
fn test_repeated_recreation_is_stable() {
    let device = MockGraphicsDevice::new();
    let mut renderer = renderer(&device);
    let mut window = MockWindow::new(800, 600);
    let live_before = device.total_live();

    renderer.recreate_swapchain(&mut window).unwrap();
    renderer.recreate_swapchain(&mut window).unwrap();

    assert!(renderer.swapchain().invariants_hold());
    assert_eq!(renderer.pipeline_epoch(), 0);
    assert_eq!(renderer.command_buffers.len(), renderer.swapchain().image_count());
    assert_eq!(device.total_live(), live_before);
    // Command buffers are kept when the image count is unchanged
    assert_eq!(device.count_calls("allocate_command_buffers"), 1);
    assert!(device.violations().is_empty());
}

#[test]
fn test_format_change_bumps_pipeline_epoch() {
    let device = MockGraphicsDevice::new();
    let mut renderer = renderer(&device);
    let mut window = MockWindow::new(800, 600);

    device.set_surface_formats(vec![SurfaceFormat {
        format: Format::R8G8B8A8_SRGB,
        color_space: ColorSpace::SrgbNonlinear,
    }]);
    renderer.recreate_swapchain(&mut window).unwrap();
    assert_eq!(renderer.pipeline_epoch(), 1);

    renderer.recreate_swapchain(&mut window).unwrap();
    assert_eq!(renderer.pipeline_epoch(), 1);

    device.set_depth_formats(vec![Format::D24_UNORM_S8_UINT]);
    renderer.recreate_swapchain(&mut window).unwrap();
    assert_eq!(renderer.pipeline_epoch(), 2);
}

#[test]
fn test_image_count_change_reallocates_command_buffers() {
    let device = MockGraphicsDevice::new();
    let mut renderer = renderer(&device);
    let mut window = MockWindow::new(800, 600);
    assert_eq!(renderer.command_buffers.len(), 3);

    device.set_image_count_limits(1, 2);
    renderer.recreate_swapchain(&mut window).unwrap();

    assert_eq!(renderer.command_buffers.len(), 2);
    assert_eq!(device.live_count("command_buffer"), 2);
}

#[test]
fn test_minimized_window_polls_until_visible() {
    const POLLS: usize = 4;
    let device = MockGraphicsDevice::new();
    let mut renderer = renderer(&device);
    let mut window = MockWindow::new(800, 600);
    window.script_extents([Extent2D::new(0, 0), Extent2D::new(800, 0), Extent2D::new(0, 600), Extent2D::new(0, 0)]);

    renderer.recreate_swapchain(&mut window).unwrap();

    assert_eq!(window.wait_event_calls(), POLLS);
    assert_eq!(window.extent_queries(), POLLS + 1);
    assert_eq!(renderer.extent(), Extent2D::new(800, 600));
}

#[test]
fn test_visible_window_does_not_poll() {
    let device = MockGraphicsDevice::new();
    let mut renderer = renderer(&device);
    let mut window = MockWindow::new(800, 600);

    renderer.recreate_swapchain(&mut window).unwrap();

    assert_eq!(window.wait_event_calls(), 0);
    assert_eq!(window.extent_queries(), 1);
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn test_present_error_is_fatal_but_advances_frame() {
    let device = MockGraphicsDevice::new();
    let mut renderer = renderer(&device);
    let mut window = MockWindow::new(800, 600);
    device.script_present([Err(Error::BackendError("device lost".to_string()))]);

    renderer.frame_begin(&mut window).unwrap().unwrap();
    let result = renderer.frame_end(&mut window);

    assert!(matches!(result, Err(Error::BackendError(_))));
    assert!(!renderer.is_frame_started());
    assert_eq!(renderer.frame_index(), 1);
}

#[test]
fn test_submit_error_is_fatal() {
    let device = MockGraphicsDevice::new();
    let mut renderer = renderer(&device);
    let mut window = MockWindow::new(800, 600);
    device.fail_next_submit();

    renderer.frame_begin(&mut window).unwrap().unwrap();
    assert!(renderer.frame_end(&mut window).is_err());
    assert_eq!(renderer.frame_index(), 1);
}

// ============================================================================
// Contract checks
// ============================================================================

#[test]
#[cfg(debug_assertions)]
#[should_panic(expected = "already in progress")]
fn test_nested_frame_begin_panics() {
    let device = MockGraphicsDevice::new();
    let mut renderer = renderer(&device);
    let mut window = MockWindow::new(800, 600);
    renderer.frame_begin(&mut window).unwrap();
    let _ = renderer.frame_begin(&mut window);
}

#[test]
#[cfg(debug_assertions)]
#[should_panic(expected = "isn't in progress")]
fn test_frame_end_without_begin_panics() {
    let device = MockGraphicsDevice::new();
    let mut renderer = renderer(&device);
    let mut window = MockWindow::new(800, 600);
    let _ = renderer.frame_end(&mut window);
}

#[test]
#[cfg(debug_assertions)]
#[should_panic(expected = "another frame")]
fn test_render_pass_with_foreign_command_buffer_panics() {
    let device = MockGraphicsDevice::new();
    let mut renderer = renderer(&device);
    let mut window = MockWindow::new(800, 600);
    renderer.frame_begin(&mut window).unwrap();
    renderer.begin_swapchain_render_pass(MockHandle(9999));
}

#[test]
#[cfg(debug_assertions)]
#[should_panic(expected = "no frame is in progress")]
fn test_render_pass_outside_frame_panics() {
    let device = MockGraphicsDevice::new();
    let renderer = renderer(&device);
    let cb = renderer.current_command_buffer();
    renderer.begin_swapchain_render_pass(cb);
}
