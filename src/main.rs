mod buffers;
mod camera;
mod compute;
mod define_scene;
mod pipeline;
mod present;
mod render_target;
mod scene;
mod shader;

use anyhow::{Context, Result};
use buffers::{GeometryBuffer, Params};
use camera::{Camera, InputState};
use compute::ComputeDispatcher;
use define_scene::define_render_scene;
use pipeline::{run_frame, FrameStages};
use present::PresentPass;
use render_target::RenderTarget;

use std::time::Instant;

use wgpu::{
    Adapter, Backends, Device, Dx12Compiler, Gles3MinorVersion, Instance, InstanceDescriptor,
    InstanceFlags, Queue, Surface, TextureUsages,
};

use winit::{
    dpi::PhysicalSize,
    event::{DeviceEvent, ElementState, Event, WindowEvent},
    event_loop::EventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::{CursorGrabMode, Fullscreen, Window},
};

pub fn main() {
    env_logger::init();

    let event_loop = EventLoop::new().expect("failed to make eventloop");

    let window = winit::window::WindowBuilder::new()
        .with_inner_size(PhysicalSize::new(800, 600))
        .with_title("Ray Tracing")
        .build(&event_loop)
        .expect("failed to make window");

    if let Err(error) = pollster::block_on(run(event_loop, window)) {
        log::error!("fatal: {error:#}");
        std::process::exit(1);
    }
}

async fn run(event_loop: EventLoop<()>, window: Window) -> Result<()> {
    let mut size = window.inner_size();
    size.width = size.width.max(1);
    size.height = size.height.max(1);

    let instance = generate_instance();
    let surface: Surface = instance
        .create_surface(&window)
        .context("failed to make a surface")?;
    let adapter = create_adapter(&instance, &surface).await?;
    let (device, queue) = generate_device_and_queue(&adapter).await?;

    let capabilities = surface.get_capabilities(&adapter);
    let surface_format = capabilities
        .formats
        .first()
        .copied()
        .context("surface reports no supported formats")?;

    let mut surface_config = wgpu::SurfaceConfiguration {
        usage: TextureUsages::RENDER_ATTACHMENT,
        format: surface_format,
        width: size.width,
        height: size.height,
        present_mode: wgpu::PresentMode::Fifo,
        desired_maximum_frame_latency: 2,
        alpha_mode: wgpu::CompositeAlphaMode::Auto,
        view_formats: vec![],
    };
    surface.configure(&device, &surface_config);

    let mut camera = Camera::new();
    let mut input = InputState::default();

    // programs are loaded once; a compile or link failure here is fatal
    let startup_scene = define_render_scene(0.0);
    let startup_params = Params::new(size.width, size.height, &startup_scene, &camera);
    let dispatcher = ComputeDispatcher::new(&device, &startup_params)?;

    let mut target = RenderTarget::create(&device, size.width, size.height)?;
    let mut present_pass = PresentPass::new(&device, surface_config.format, &target)?;

    let mut geometry: Option<GeometryBuffer> = None;

    // resize events only get recorded here; the target is recreated at the
    // next safe point, between frames, never mid-dispatch
    let mut pending_resize: Option<PhysicalSize<u32>> = None;
    let mut windowed_size = size;

    window.set_cursor_visible(false);
    if let Err(error) = window.set_cursor_grab(CursorGrabMode::Confined) {
        log::warn!("could not grab the cursor: {error}");
    }

    let start_time = Instant::now();
    let mut fps_timer = Instant::now();
    let mut frame_count: u32 = 0;

    let window = &window;

    event_loop
        .run(|event, target_loop| match event {
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::CloseRequested => target_loop.exit(),

                WindowEvent::Resized(new_size) => {
                    pending_resize = Some(new_size);
                    window.request_redraw();
                }

                WindowEvent::KeyboardInput { event, .. } => {
                    let PhysicalKey::Code(code) = event.physical_key else {
                        return;
                    };
                    let pressed = event.state == ElementState::Pressed;

                    match code {
                        KeyCode::KeyW => input.forward = pressed,
                        KeyCode::KeyS => input.back = pressed,
                        KeyCode::KeyA => input.left = pressed,
                        KeyCode::KeyD => input.right = pressed,
                        KeyCode::Space => input.up = pressed,
                        KeyCode::KeyR => input.down = pressed,
                        KeyCode::ArrowUp => input.focal_in = pressed,
                        KeyCode::ArrowDown => input.focal_out = pressed,
                        KeyCode::Escape if pressed => target_loop.exit(),
                        KeyCode::F11 if pressed && !event.repeat => {
                            if window.fullscreen().is_none() {
                                windowed_size = window.inner_size();
                                window.set_fullscreen(Some(Fullscreen::Borderless(None)));
                            } else {
                                window.set_fullscreen(None);
                                let _ = window.request_inner_size(windowed_size);
                            }
                        }
                        _ => {}
                    }
                }

                WindowEvent::RedrawRequested => {
                    camera.on_update(&mut input);

                    let mut frame = GpuFrame {
                        device: &device,
                        queue: &queue,
                        surface: &surface,
                        surface_config: &mut surface_config,
                        dispatcher: &dispatcher,
                        present_pass: &mut present_pass,
                        target: &mut target,
                        camera: &camera,
                        geometry: &mut geometry,
                        pending_resize: &mut pending_resize,
                        size: &mut size,
                        time: start_time.elapsed().as_secs_f32(),
                        encoder: None,
                        bind_group: None,
                    };

                    let result = run_frame(&mut frame);

                    match result {
                        Ok(()) => {
                            frame_count += 1;
                            if fps_timer.elapsed().as_millis() >= 1000 {
                                log::info!("fps: {frame_count}");
                                frame_count = 0;
                                fps_timer = Instant::now();
                            }
                        }
                        Err(error) => {
                            // skip the rest of this frame, retry next tick;
                            // reconfiguring also recovers a lost surface
                            log::warn!("frame aborted: {error:#}");
                            surface.configure(&device, &surface_config);
                        }
                    }
                }

                _ => {}
            },

            Event::DeviceEvent {
                event: DeviceEvent::MouseMotion { delta },
                ..
            } => {
                input.mouse_delta.0 += delta.0 as f32;
                input.mouse_delta.1 += delta.1 as f32;
            }

            Event::AboutToWait => window.request_redraw(),

            _ => {}
        })
        .context("event loop failed")?;

    Ok(())
}

/// One frame's pass over the GPU: owns the command encoder and the per-frame
/// bind group while the pipeline state machine walks its stages.
struct GpuFrame<'a, 'w> {
    device: &'a Device,
    queue: &'a Queue,
    surface: &'a Surface<'w>,
    surface_config: &'a mut wgpu::SurfaceConfiguration,
    dispatcher: &'a ComputeDispatcher,
    present_pass: &'a mut PresentPass,
    target: &'a mut RenderTarget,
    camera: &'a Camera,
    geometry: &'a mut Option<GeometryBuffer>,
    pending_resize: &'a mut Option<PhysicalSize<u32>>,
    size: &'a mut PhysicalSize<u32>,
    time: f32,
    encoder: Option<wgpu::CommandEncoder>,
    bind_group: Option<wgpu::BindGroup>,
}

impl FrameStages for GpuFrame<'_, '_> {
    fn service_resize(&mut self) -> Result<()> {
        // safe point: the previous frame has been issued, this one has not
        // started, so a stale target can be swapped out
        let Some(new_size) = self.pending_resize.take() else {
            return Ok(());
        };

        self.size.width = new_size.width.max(1);
        self.size.height = new_size.height.max(1);

        self.surface_config.width = self.size.width;
        self.surface_config.height = self.size.height;
        self.surface.configure(self.device, self.surface_config);

        if let Err(error) = self
            .target
            .resize(self.device, self.size.width, self.size.height)
        {
            // keep the stale flag set so the next tick retries; the old
            // target stays alive but nothing renders against it this frame
            *self.pending_resize = Some(new_size);
            return Err(error.context("render target resize failed"));
        }

        self.present_pass.rebind(self.device, self.target);
        Ok(())
    }

    fn rebuild_geometry(&mut self) -> Result<()> {
        // release the previous frame's buffer now, after that frame's
        // dispatch and draw were submitted; wgpu keeps the device memory
        // alive until no in-flight work references it
        self.geometry.take();

        let scene = define_render_scene(self.time);
        let params = Params::new(self.target.width, self.target.height, &scene, self.camera);
        self.dispatcher.update_params(self.queue, &params);

        let geometry = GeometryBuffer::upload(self.device, self.queue, &scene);
        self.bind_group = Some(self.dispatcher.bind(self.device, &geometry, self.target));
        *self.geometry = Some(geometry);

        self.encoder = Some(
            self.device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Frame Encoder"),
                }),
        );
        Ok(())
    }

    fn dispatch_compute(&mut self) -> Result<()> {
        let (Some(encoder), Some(bind_group)) = (self.encoder.as_mut(), self.bind_group.as_ref())
        else {
            // missing resources here mean the state machine sequencing broke
            anyhow::bail!("compute dispatched before geometry rebuild");
        };
        self.dispatcher
            .dispatch(encoder, bind_group, self.target.width, self.target.height);
        Ok(())
    }

    fn barrier(&mut self) {
        // the compute pass was closed inside dispatch(); wgpu transitions the
        // storage texture at that pass boundary, so all compute writes are
        // visible to the present pass recorded next
        log::trace!("compute writes flushed for sampling");
    }

    fn present(&mut self) -> Result<()> {
        let Some(mut encoder) = self.encoder.take() else {
            anyhow::bail!("present without a recorded frame");
        };

        let frame = self
            .surface
            .get_current_texture()
            .context("failed to acquire surface texture")?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.present_pass.draw(&mut encoder, &view);
        self.queue.submit(Some(encoder.finish()));
        frame.present();
        Ok(())
    }
}

fn generate_instance() -> Instance {
    let instance_desc: wgpu::InstanceDescriptor = InstanceDescriptor {
        backends: Backends::PRIMARY,
        flags: InstanceFlags::default(),
        dx12_shader_compiler: Dx12Compiler::default(),
        gles_minor_version: Gles3MinorVersion::default(),
    };

    wgpu::Instance::new(instance_desc)
}

async fn create_adapter(instance: &Instance, surface: &Surface<'_>) -> Result<Adapter> {
    instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            force_fallback_adapter: false,
            // Request an adapter which can render to our surface
            compatible_surface: Some(surface),
        })
        .await
        .context("failed to find an appropriate adapter")
}

async fn generate_device_and_queue(adapter: &Adapter) -> Result<(Device, Queue)> {
    let adapter_limits = wgpu::Limits::downlevel_defaults().using_resolution(adapter.limits());
    adapter
        .request_device(
            &wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                required_limits: adapter_limits,
            },
            None,
        )
        .await
        .context("failed to create device")
}
