use std::sync::Arc;

use tracing::{error, info, warn};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, KeyEvent, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::KeyCode,
    window::{Window, WindowId},
};

use submersible::{
    config::ViewerConfig,
    controller::{key_code, FrameTimer, InputController, KeyAction, PointerState},
    logging,
    model::Scene,
    ui::{self, HudStats},
    view::{GpuContext, Renderer, UiFrame},
    Result, ViewerError,
};

/// Everything that exists once the window is up. Field order is drop order:
/// GPU resources go before the device that owns them.
struct Viewer {
    renderer: Renderer,
    egui_state: egui_winit::State,
    egui_ctx: egui::Context,
    gpu: GpuContext,
    window: Arc<Window>,
    controller: InputController,
    scene: Scene,
    timer: FrameTimer,
    pointer: PointerState,
}

impl Viewer {
    fn new(event_loop: &ActiveEventLoop, config: &ViewerConfig) -> Result<Self> {
        let window_attributes = Window::default_attributes()
            .with_title(config.window.title.clone())
            .with_inner_size(PhysicalSize::new(config.window.width, config.window.height));
        let window = Arc::new(event_loop.create_window(window_attributes)?);
        let size = window.inner_size();

        let gpu = pollster::block_on(GpuContext::new(window.clone()))?;

        let scene = Scene::dive_site(&config.asset_root);
        let controller = InputController::new(config, scene.player.transform, size.width, size.height);
        let renderer = Renderer::new(&gpu, &scene);

        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            None,
            None,
            None,
        );

        info!(width = size.width, height = size.height, "Viewer ready");
        Ok(Self {
            renderer,
            egui_state,
            egui_ctx,
            gpu,
            window,
            controller,
            scene,
            timer: FrameTimer::new(),
            pointer: PointerState::default(),
        })
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        if self.gpu.resize(size.width, size.height) {
            self.renderer.resize(&self.gpu.device, size.width, size.height);
            self.controller.set_aspect(size.width, size.height);
        }
    }

    fn keyboard(&mut self, event: &KeyEvent) {
        if let Some(code) = key_code(&event.physical_key) {
            self.controller
                .on_key_event(code, KeyAction::from_winit(event.state, event.repeat));
        }
    }

    fn render(&mut self) -> std::result::Result<(), wgpu::SurfaceError> {
        self.timer.tick();
        let stats = HudStats::from_controller(&self.controller, self.timer.fps());
        let raw_input = self.egui_state.take_egui_input(&self.window);
        let output = ui::build_ui(&self.egui_ctx, raw_input, &stats, self.controller.bindings());
        self.egui_state
            .handle_platform_output(&self.window, output.platform_output);
        let primitives = self.egui_ctx.tessellate(output.shapes, output.pixels_per_point);

        let frame = UiFrame {
            primitives,
            textures_delta: output.textures_delta,
            pixels_per_point: output.pixels_per_point,
        };
        self.renderer
            .draw_frame(&self.gpu, &self.controller, &self.scene.sun, frame)
    }
}

struct App {
    config: ViewerConfig,
    viewer: Option<Viewer>,
    error: Option<ViewerError>,
}

impl App {
    fn new(config: ViewerConfig) -> Self {
        Self { config, viewer: None, error: None }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.viewer.is_some() {
            return;
        }
        match Viewer::new(event_loop, &self.config) {
            Ok(viewer) => self.viewer = Some(viewer),
            Err(err) => {
                error!("Startup failed: {err}");
                self.error = Some(err);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let Some(viewer) = self.viewer.as_mut() else {
            return;
        };
        if window_id != viewer.window.id() {
            return;
        }

        // Let egui take input aimed at the HUD first
        let consumed = viewer.egui_state.on_window_event(&viewer.window, &event).consumed;
        match &event {
            WindowEvent::CursorMoved { position, .. } => viewer.pointer.moved(position.x, position.y),
            WindowEvent::MouseInput { state, button: MouseButton::Left, .. } => {
                if viewer.pointer.button(*state == ElementState::Pressed, consumed) {
                    let (x, y) = viewer.pointer.position;
                    viewer.controller.on_cursor_event(x, y, viewer.pointer.left_down);
                }
                return;
            }
            _ => {}
        }
        if consumed {
            return;
        }

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => viewer.resize(size),
            WindowEvent::KeyboardInput { event, .. } => {
                if key_code(&event.physical_key) == Some(KeyCode::Escape)
                    && event.state == ElementState::Pressed
                {
                    info!("Escape pressed, closing");
                    event_loop.exit();
                    return;
                }
                viewer.keyboard(&event);
            }
            WindowEvent::CursorMoved { position, .. } => {
                viewer.controller.on_cursor_event(position.x, position.y, viewer.pointer.left_down);
            }
            WindowEvent::RedrawRequested => match viewer.render() {
                Ok(()) => {}
                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => viewer.gpu.reconfigure(),
                Err(wgpu::SurfaceError::OutOfMemory) => {
                    error!("GPU out of memory");
                    event_loop.exit();
                }
                Err(e) => warn!("Surface error: {e:?}"),
            },
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(viewer) = &self.viewer {
            viewer.window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    logging::init();

    let config = ViewerConfig::load_or_default();
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;

    // Dropping the viewer releases GPU resources before the process exits
    app.viewer = None;
    match app.error.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
