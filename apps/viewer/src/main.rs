mod ui;

use anyhow::Result;
use clap::Parser;
use egui::Context as EguiContext;
use glam::{Mat4, Vec3};
use lumen_assets::{AssetDir, Model};
use lumen_render::{FpsCounter, FramePacer};
use lumen_render_wgpu::{FrameState, GpuModel, SceneRenderer};
use lumen_scene::{Camera, FlashLight, MaterialLibrary, MoveDirection, PointLight, SpotLight};
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{DeviceEvent, ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{CursorGrabMode, Window, WindowId};

const MODEL_PATH: &str = "pool-ball/pool-ball.gltf";
const MATERIALS_PATH: &str = "materials.json";
const MOUSE_SENSITIVITY: f32 = 0.02;

#[derive(Parser)]
#[command(name = "lumen-viewer", about = "PBR model viewer with a debug panel")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Asset directory (models, skybox faces, material presets, shaders)
    #[arg(long, default_value = "assets")]
    assets: String,
}

/// Scene-side application state, mutated by input and the debug panel.
struct SceneState {
    camera: Camera,
    point_light: PointLight,
    flash_light: FlashLight,
    spot_lights: Vec<SpotLight>,
    materials: MaterialLibrary,
    draw_skybox: bool,
    draw_pbr: bool,
    shadows_enabled: bool,
    /// UI-focus mode: cursor released, camera input suppressed.
    ui_focus: bool,
    keys_held: std::collections::HashSet<KeyCode>,
    /// Last cursor position tracked while in free-look, restored on
    /// Continue so the cursor does not visibly jump.
    free_look_cursor: Option<PhysicalPosition<f64>>,
    pacer: FramePacer,
    fps: FpsCounter,
}

impl SceneState {
    fn new(assets: &AssetDir) -> Self {
        let mut camera = Camera::new();
        camera.init(Vec3::new(11.0, 3.2, 10.5), Vec3::ZERO, Vec3::Y);
        camera.update_angle(0.0, 0.0);

        let point_light = PointLight::new(Vec3::new(2.42, 1.7, -1.5));
        let mut flash_light = FlashLight::new(Vec3::ZERO, Vec3::NEG_Z);
        flash_light.on = false;

        Self {
            camera,
            point_light,
            flash_light,
            spot_lights: Vec::new(),
            materials: MaterialLibrary::load_or_default(assets.resolve(MATERIALS_PATH)),
            draw_skybox: true,
            draw_pbr: true,
            shadows_enabled: false,
            ui_focus: false,
            keys_held: std::collections::HashSet::new(),
            free_look_cursor: None,
            pacer: FramePacer::new(),
            fps: FpsCounter::new(),
        }
    }

    /// Advance the camera from held movement keys. Suppressed in UI focus.
    fn process_keys(&mut self) {
        if self.ui_focus {
            return;
        }
        let mapping = [
            (KeyCode::KeyW, MoveDirection::Forward),
            (KeyCode::KeyS, MoveDirection::Backward),
            (KeyCode::KeyA, MoveDirection::Left),
            (KeyCode::KeyD, MoveDirection::Right),
            (KeyCode::KeyQ, MoveDirection::Up),
            (KeyCode::KeyE, MoveDirection::Down),
        ];
        for (key, direction) in mapping {
            if self.keys_held.contains(&key) {
                self.camera.apply_move(direction);
            }
        }
    }

    /// Keep the headlamp glued to the camera.
    fn sync_flash_light(&mut self) {
        self.flash_light.position = self.camera.position();
        self.flash_light.direction = self.camera.forward();
    }
}

struct ViewerApp {
    state: SceneState,
    assets: AssetDir,
    window: Option<Arc<Window>>,
    surface: Option<wgpu::Surface<'static>>,
    device: Option<wgpu::Device>,
    queue: Option<wgpu::Queue>,
    config: Option<wgpu::SurfaceConfiguration>,
    renderer: Option<SceneRenderer>,
    model: Option<GpuModel>,
    renderer_name: String,
    egui_ctx: EguiContext,
    egui_winit: Option<egui_winit::State>,
    egui_renderer: Option<egui_wgpu::Renderer>,
}

impl ViewerApp {
    fn new(assets: AssetDir) -> Self {
        Self {
            state: SceneState::new(&assets),
            assets,
            window: None,
            surface: None,
            device: None,
            queue: None,
            config: None,
            renderer: None,
            model: None,
            renderer_name: String::new(),
            egui_ctx: EguiContext::default(),
            egui_winit: None,
            egui_renderer: None,
        }
    }

    fn capture_cursor(&mut self) {
        let Some(window) = &self.window else {
            return;
        };
        if window
            .set_cursor_grab(CursorGrabMode::Locked)
            .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined))
            .is_err()
        {
            tracing::warn!("cursor grab unavailable on this platform");
        }
        window.set_cursor_visible(false);
    }

    fn release_cursor(&mut self) {
        let Some(window) = &self.window else {
            return;
        };
        let _ = window.set_cursor_grab(CursorGrabMode::None);
        window.set_cursor_visible(true);
    }

    fn enter_ui_focus(&mut self) {
        self.state.ui_focus = true;
        self.release_cursor();
        if let (Some(window), Some(config)) = (&self.window, &self.config) {
            let center = PhysicalPosition::new(
                f64::from(config.width) / 2.0,
                f64::from(config.height) / 2.0,
            );
            let _ = window.set_cursor_position(center);
        }
    }

    /// Leave UI focus: re-capture the cursor and put it back at the last
    /// free-look position so the view does not jump.
    fn leave_ui_focus(&mut self) {
        self.state.ui_focus = false;
        self.capture_cursor();
        if let (Some(window), Some(position)) = (&self.window, self.state.free_look_cursor) {
            let _ = window.set_cursor_position(position);
        }
    }

    fn handle_key(&mut self, event_loop: &ActiveEventLoop, key: KeyCode, pressed: bool) {
        if pressed {
            self.state.keys_held.insert(key);
        } else {
            self.state.keys_held.remove(&key);
        }
        if !pressed {
            return;
        }

        match key {
            KeyCode::Space => {
                event_loop.exit();
            }
            KeyCode::Escape if !self.state.ui_focus => {
                self.enter_ui_focus();
            }
            _ => {}
        }
    }

    fn projection(&self) -> Mat4 {
        let (width, height) = match &self.config {
            Some(config) => (config.width, config.height.max(1)),
            None => (1280, 720),
        };
        Mat4::perspective_rh(
            45.0_f32.to_radians(),
            width as f32 / height as f32,
            0.1,
            500.0,
        )
    }

    fn redraw(&mut self) {
        let now = Instant::now();
        // Free-running: the leftover frame budget is tracked, not slept.
        let _budget = self.state.pacer.frame(now);
        let fps = self.state.fps.tick(now);

        self.state.process_keys();
        if !self.state.ui_focus {
            self.state.camera.update();
        }
        self.state.sync_flash_light();

        let (Some(surface), Some(device), Some(queue)) =
            (&self.surface, &self.device, &self.queue)
        else {
            return;
        };

        let output = match surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                if let Some(config) = &self.config {
                    surface.configure(device, config);
                }
                return;
            }
            Err(err) => {
                tracing::error!("surface error: {err}");
                return;
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let projection = self.projection();
        if let (Some(renderer), Some(model)) = (&mut self.renderer, &mut self.model) {
            let flash_lights = [self.state.flash_light.clone()];
            let frame = FrameState {
                projection,
                camera: &self.state.camera,
                point_light: &self.state.point_light,
                flash_lights: &flash_lights,
                spot_lights: &self.state.spot_lights,
                material: self.state.materials.working(),
                draw_skybox: self.state.draw_skybox,
                draw_model: self.state.draw_pbr,
                shadows_enabled: self.state.shadows_enabled,
            };
            renderer.render(device, queue, &view, model, &frame);
        }

        // Debug overlay on top of the scene.
        let raw_input = self
            .egui_winit
            .as_mut()
            .unwrap()
            .take_egui_input(self.window.as_ref().unwrap());
        let telemetry = ui::Telemetry {
            renderer_name: &self.renderer_name,
            fps,
            camera_position: self.state.camera.position(),
            camera_forward: self.state.camera.forward(),
        };
        let mut response = ui::UiResponse::default();
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            response = ui::draw_debug_panel(
                ctx,
                ui::PanelState {
                    draw_skybox: &mut self.state.draw_skybox,
                    draw_pbr: &mut self.state.draw_pbr,
                    shadows_enabled: &mut self.state.shadows_enabled,
                    materials: &mut self.state.materials,
                    point_light: &mut self.state.point_light,
                    flash_light: &mut self.state.flash_light,
                },
                &telemetry,
            );
        });

        self.egui_winit.as_mut().unwrap().handle_platform_output(
            self.window.as_ref().unwrap(),
            full_output.platform_output,
        );

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [
                self.config.as_ref().unwrap().width,
                self.config.as_ref().unwrap().height,
            ],
            pixels_per_point: full_output.pixels_per_point,
        };

        {
            let egui_renderer = self.egui_renderer.as_mut().unwrap();
            for (id, image_delta) in &full_output.textures_delta.set {
                egui_renderer.update_texture(device, queue, *id, image_delta);
            }
            let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("egui_encoder"),
            });
            egui_renderer.update_buffers(
                device,
                queue,
                &mut encoder,
                &paint_jobs,
                &screen_descriptor,
            );
            {
                let mut pass = encoder
                    .begin_render_pass(&wgpu::RenderPassDescriptor {
                        label: Some("egui_pass"),
                        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                            view: &view,
                            resolve_target: None,
                            ops: wgpu::Operations {
                                load: wgpu::LoadOp::Load,
                                store: wgpu::StoreOp::Store,
                            },
                        })],
                        depth_stencil_attachment: None,
                        ..Default::default()
                    })
                    .forget_lifetime();
                egui_renderer.render(&mut pass, &paint_jobs, &screen_descriptor);
            }
            queue.submit(std::iter::once(encoder.finish()));
            for id in &full_output.textures_delta.free {
                egui_renderer.free_texture(id);
            }
        }

        output.present();

        if response.continue_clicked {
            self.leave_ui_focus();
        }
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

impl ApplicationHandler for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title("Lumen")
            .with_inner_size(PhysicalSize::new(1280u32, 720));
        let window = match event_loop.create_window(attrs) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                tracing::error!("failed to create window: {err}");
                event_loop.exit();
                return;
            }
        };

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = match instance.create_surface(window.clone()) {
            Ok(surface) => surface,
            Err(err) => {
                tracing::error!("failed to create surface: {err}");
                event_loop.exit();
                return;
            }
        };

        let Some(adapter) =
            pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            }))
        else {
            tracing::error!("no suitable graphics adapter");
            event_loop.exit();
            return;
        };

        let (device, queue) = match pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("lumen_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        )) {
            Ok(pair) => pair,
            Err(err) => {
                tracing::error!("failed to create device: {err}");
                event_loop.exit();
                return;
            }
        };

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            // Free-running, matching the tracked-but-unenforced frame
            // target.
            present_mode: wgpu::PresentMode::AutoNoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let renderer = SceneRenderer::new(
            &device,
            &queue,
            &self.assets,
            surface_format,
            size.width,
            size.height,
        );
        let model = GpuModel::from_model(&Model::load(&self.assets, MODEL_PATH));

        let egui_winit = egui_winit::State::new(
            self.egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        self.renderer_name = adapter.get_info().name;
        tracing::info!(
            renderer = %self.renderer_name,
            backend = adapter.get_info().backend.to_str(),
            "GPU initialized"
        );

        self.window = Some(window);
        self.surface = Some(surface);
        self.device = Some(device);
        self.queue = Some(queue);
        self.config = Some(config);
        self.renderer = Some(renderer);
        self.model = Some(model);
        self.egui_winit = Some(egui_winit);
        self.egui_renderer = Some(egui_renderer);

        self.capture_cursor();
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let Some(egui_winit) = &mut self.egui_winit {
            let response = egui_winit.on_window_event(self.window.as_ref().unwrap(), &event);
            if self.state.ui_focus && response.consumed {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let (Some(surface), Some(device), Some(config)) =
                    (&self.surface, &self.device, &mut self.config)
                {
                    config.width = new_size.width.max(1);
                    config.height = new_size.height.max(1);
                    surface.configure(device, config);
                    if let Some(renderer) = &mut self.renderer {
                        renderer.resize(device, config.width, config.height);
                    }
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: key_state,
                        ..
                    },
                ..
            } => {
                self.handle_key(event_loop, key, key_state == ElementState::Pressed);
            }
            WindowEvent::CursorMoved { position, .. } => {
                if !self.state.ui_focus {
                    self.state.free_look_cursor = Some(position);
                }
            }
            WindowEvent::RedrawRequested => {
                self.redraw();
            }
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta } = event {
            if !self.state.ui_focus {
                self.state.camera.update_angle(
                    delta.0 as f32 * MOUSE_SENSITIVITY,
                    -delta.1 as f32 * MOUSE_SENSITIVITY,
                );
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!(assets = %cli.assets, "lumen-viewer starting");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = ViewerApp::new(AssetDir::new(cli.assets));
    event_loop.run_app(&mut app)?;

    Ok(())
}
