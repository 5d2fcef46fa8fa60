//! egui layer drawn on top of the scene.
//!
//! `egui_wgpu::Renderer::render()` needs a `RenderPass<'static>` while
//! `begin_render_pass` borrows the encoder, so a frame goes through four calls:
//!
//!   1. `prepare()` runs the UI closure and tessellates
//!   2. `upload()`  pushes textures and buffers (borrows the encoder mutably)
//!   3. `paint()`   renders into a pass created with `forget_lifetime()`
//!   4. `cleanup()` frees textures egui dropped this frame

use winit::window::Window;

pub struct UiFrame<R> {
    pub primitives: Vec<egui::ClippedPrimitive>,
    pub textures_delta: egui::TexturesDelta,
    pub output: R,
}

pub struct UiLayer {
    pub egui_ctx: egui::Context,
    egui_winit_state: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl UiLayer {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        window: &Window,
    ) -> Self {
        let egui_ctx = egui::Context::default();
        let egui_winit_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui_ctx.viewport_id(),
            window,
            None,
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(device, surface_format, None, 1, false);

        Self {
            egui_ctx,
            egui_winit_state,
            egui_renderer,
        }
    }

    /// Feed a window event to egui. Returns true when egui consumed it.
    pub fn handle_window_event(
        &mut self,
        window: &Window,
        event: &winit::event::WindowEvent,
    ) -> bool {
        self.egui_winit_state.on_window_event(window, event).consumed
    }

    /// True while the pointer is over an egui area (e.g. the dialogue box).
    pub fn wants_pointer(&self) -> bool {
        self.egui_ctx.wants_pointer_input()
    }

    pub fn prepare<R: Default>(
        &mut self,
        window: &Window,
        mut run_ui: impl FnMut(&egui::Context) -> R,
    ) -> UiFrame<R> {
        let mut output = R::default();
        let raw_input = self.egui_winit_state.take_egui_input(window);
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            output = run_ui(ctx);
        });

        self.egui_winit_state
            .handle_platform_output(window, full_output.platform_output);

        let primitives = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        UiFrame {
            primitives,
            textures_delta: full_output.textures_delta,
            output,
        }
    }

    pub fn upload(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        primitives: &[egui::ClippedPrimitive],
        textures_delta: &egui::TexturesDelta,
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
    ) {
        for (id, image_delta) in &textures_delta.set {
            self.egui_renderer
                .update_texture(device, queue, *id, image_delta);
        }

        self.egui_renderer
            .update_buffers(device, queue, encoder, primitives, screen_descriptor);
    }

    pub fn paint(
        &self,
        render_pass: &mut wgpu::RenderPass<'static>,
        primitives: &[egui::ClippedPrimitive],
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
    ) {
        self.egui_renderer
            .render(render_pass, primitives, screen_descriptor);
    }

    pub fn cleanup(&mut self, textures_delta: &egui::TexturesDelta) {
        for id in &textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }
}
