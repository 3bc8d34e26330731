use anyhow::{Context as _, Result, anyhow};
use clap::Parser;
use egui::Context as EguiContext;
use endless_common::Viewport;
use endless_params::{ParamKind, ParamSpec};
use endless_render::{
    FrameReport, FrameStats, RenderError, ResizePolicy, Sketch, SketchOptions, SystemClock,
};
use endless_render_wgpu::WgpuRenderer;
use endless_text::{FontRegistry, FsFontLoader};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "endless-desktop", about = "Kinetic typography on a torus knot")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Directory holding the font files
    #[arg(long, default_value = "./fonts")]
    fonts_dir: String,

    /// Word rendered into the off-screen target
    #[arg(long, default_value = "ENDLESS")]
    text: String,

    /// How the off-screen target follows window resizes: fixed or track
    #[arg(long, default_value = "track")]
    resize: ResizePolicy,

    /// Also draw the text in front of the knot
    #[arg(long)]
    show_text: bool,
}

type DesktopSketch = Sketch<SystemClock, FsFontLoader>;

/// Application state, created once the window exists.
struct AppState {
    sketch: DesktopSketch,
    show_panel: bool,
    last_report: Option<FrameReport>,
    stats: FrameStats,
}

impl AppState {
    fn handle_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::F1 => {
                self.show_panel = !self.show_panel;
            }
            KeyCode::KeyR => {
                self.sketch.params_mut().reset_all();
                tracing::info!("parameters reset");
            }
            _ => {}
        }
    }

    fn draw_ui(&mut self, ctx: &EguiContext) {
        if !self.show_panel {
            return;
        }

        // Specs are cloned so the sliders can write back into the store.
        let specs: Vec<ParamSpec> = self.sketch.params().specs().cloned().collect();

        egui::SidePanel::right("parameters")
            .default_width(260.0)
            .show(ctx, |ui| {
                ui.heading("Endless");
                ui.separator();

                for spec in &specs {
                    self.param_control(ui, spec);
                }

                ui.separator();
                if ui.button("Reset (R)").clicked() {
                    self.sketch.params_mut().reset_all();
                }

                if let Some(err) = self.sketch.text_error() {
                    ui.separator();
                    ui.colored_label(egui::Color32::LIGHT_RED, err);
                }

                ui.separator();
                if let Some(fps) = self.stats.fps() {
                    ui.label(format!("FPS: {fps:.0}"));
                }
                if let Some(report) = &self.last_report {
                    ui.label(format!("Frame: {}", report.frame));
                    ui.label(format!("Time: {:.2}s", report.time));
                    ui.label(format!(
                        "Target: {}x{}",
                        report.target.width, report.target.height
                    ));
                }
                ui.label(format!(
                    "Text regenerations: {}",
                    self.sketch.text().regenerations()
                ));
                ui.small("F1: Toggle Panel | R: Reset | Esc: Quit");
            });
    }

    fn param_control(&mut self, ui: &mut egui::Ui, spec: &ParamSpec) {
        let params = self.sketch.params_mut();
        match &spec.kind {
            ParamKind::Number { min, max, .. } => {
                let Ok(mut value) = params.get_number(&spec.name) else {
                    return;
                };
                let slider = egui::Slider::new(&mut value, *min..=*max).text(spec.name.as_str());
                if ui.add(slider).changed() {
                    if let Err(e) = params.set_number(&spec.name, value) {
                        tracing::warn!("{e}");
                    }
                }
            }
            ParamKind::Choice { items, .. } => {
                let Ok(current) = params.get_choice(&spec.name) else {
                    return;
                };
                let mut selected = current.to_string();
                egui::ComboBox::from_label(spec.name.as_str())
                    .selected_text(selected.clone())
                    .show_ui(ui, |ui| {
                        for item in items {
                            ui.selectable_value(&mut selected, item.clone(), item.as_str());
                        }
                    });
                if selected != current {
                    if let Err(e) = params.set_choice(&spec.name, &selected) {
                        tracing::warn!("{e}");
                    }
                }
            }
        }
    }
}

struct GpuApp {
    cli: Cli,
    state: Option<AppState>,
    window: Option<Arc<Window>>,
    surface: Option<wgpu::Surface<'static>>,
    device: Option<wgpu::Device>,
    queue: Option<wgpu::Queue>,
    config: Option<wgpu::SurfaceConfiguration>,
    renderer: Option<WgpuRenderer>,
    egui_ctx: EguiContext,
    egui_winit: Option<egui_winit::State>,
    egui_renderer: Option<egui_wgpu::Renderer>,
}

impl GpuApp {
    fn new(cli: Cli) -> Self {
        Self {
            cli,
            state: None,
            window: None,
            surface: None,
            device: None,
            queue: None,
            config: None,
            renderer: None,
            egui_ctx: EguiContext::default(),
            egui_winit: None,
            egui_renderer: None,
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title("Endless")
            .with_inner_size(PhysicalSize::new(1280u32, 720));
        let window = Arc::new(event_loop.create_window(attrs)?);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or_else(|| anyhow!("no suitable GPU adapter"))?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("endless_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))?;

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or_else(|| anyhow!("surface reports no formats"))?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let registry = FontRegistry::builtin(&self.cli.fonts_dir);
        let options = SketchOptions {
            text: self.cli.text.clone(),
            resize: self.cli.resize,
            show_text: self.cli.show_text,
        };
        let sketch = Sketch::mount(
            SystemClock::new(),
            FsFontLoader,
            registry,
            Viewport::new(size.width, size.height),
            options,
        )
        .with_context(|| format!("mounting sketch (fonts dir: {})", self.cli.fonts_dir))?;

        let renderer = WgpuRenderer::new(&device, surface_format, config.width, config.height);

        let egui_winit = egui_winit::State::new(
            self.egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        tracing::info!(
            "GPU initialized with {} backend",
            adapter.get_info().backend.to_str()
        );

        self.state = Some(AppState {
            sketch,
            show_panel: true,
            last_report: None,
            stats: FrameStats::new(),
        });
        self.window = Some(window);
        self.surface = Some(surface);
        self.device = Some(device);
        self.queue = Some(queue);
        self.config = Some(config);
        self.renderer = Some(renderer);
        self.egui_winit = Some(egui_winit);
        self.egui_renderer = Some(egui_renderer);
        Ok(())
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let (
            Some(window),
            Some(surface),
            Some(device),
            Some(queue),
            Some(config),
            Some(renderer),
            Some(state),
            Some(egui_winit),
            Some(egui_renderer),
        ) = (
            &self.window,
            &self.surface,
            &self.device,
            &self.queue,
            &self.config,
            &mut self.renderer,
            &mut self.state,
            &mut self.egui_winit,
            &mut self.egui_renderer,
        )
        else {
            return;
        };

        let output = match surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                surface.configure(device, config);
                return;
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                tracing::error!("{}", RenderError::ContextLost);
                event_loop.exit();
                return;
            }
            Err(e) => {
                tracing::error!("{}", RenderError::Surface(e.to_string()));
                return;
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut frame = renderer.begin_frame(device, queue, &view);
        match state.sketch.frame(&mut frame) {
            Ok(report) => {
                state.stats.record(&report);
                state.last_report = Some(report);
            }
            Err(RenderError::ContextLost) => {
                tracing::error!("GPU context lost, shutting down");
                event_loop.exit();
                return;
            }
            Err(e) => tracing::error!("frame failed: {e}"),
        }
        frame.submit();

        let raw_input = egui_winit.take_egui_input(window);
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            state.draw_ui(ctx);
        });

        egui_winit.handle_platform_output(window, full_output.platform_output);

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [config.width, config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            egui_renderer.update_texture(device, queue, *id, image_delta);
        }
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("egui_encoder"),
        });
        egui_renderer.update_buffers(device, queue, &mut encoder, &paint_jobs, &screen_descriptor);
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

        output.present();
        window.request_redraw();
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.init(event_loop) {
            tracing::error!("startup failed: {e:#}");
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let (Some(egui_winit), Some(window)) = (&mut self.egui_winit, &self.window) {
            let response = egui_winit.on_window_event(window, &event);
            if response.consumed {
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
                if let Some(state) = &mut self.state {
                    state
                        .sketch
                        .resize(Viewport::new(new_size.width, new_size.height));
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                if key == KeyCode::Escape {
                    event_loop.exit();
                } else if let Some(state) = &mut self.state {
                    state.handle_key(key);
                }
            }
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
            }
            _ => {}
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

    tracing::info!("endless-desktop starting");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(cli);
    event_loop.run_app(&mut app)?;

    Ok(())
}
