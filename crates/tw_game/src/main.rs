//! Tilewalk: a top-down tile-map walker.
//!
//! winit drives the event loop through `ApplicationHandler`. Simulation runs
//! inside `RedrawRequested` on a fixed timestep (see `TimeState`):
//!
//!   1. `begin_frame()` feeds wall-clock time into the accumulator
//!   2. `while should_step()` advances the scene in fixed slices
//!   3. the sprite batch is rebuilt from the map, the player and debug overlays
//!   4. the camera uniform is uploaded, sprites are drawn, egui composites on top
//!
//! Content (config, map, sprite sheet, dialogue) is loaded and validated once at
//! startup. Any failure there is logged and the app exits.

mod audio;
mod collision;
mod config;
mod controls;
mod dialogue;
mod map;
mod player;
#[cfg(test)]
mod replay;
mod scene;
#[cfg(test)]
mod testing;

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use glam::Vec2;
use wgpu::util::DeviceExt;
use winit::application::ApplicationHandler;
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use audio::AudioContext;
use config::{load_config_from_path, GameConfig};
use dialogue::load_dialogue_from_path;
use map::load_map_from_path;
use scene::{is_dialogue_zone, MainScene, SceneServices, MUSIC, UI_SOUND};
use tw_core::animation::load_sprite_sheet;
use tw_core::input::{InputState, Key, MouseBtn};
use tw_core::time::{TimeState, FIXED_DT_US};
use tw_render::{GpuContext, Quad, SpriteBatch, SpritePipeline, SpriteVertex, Texture};
use tw_ui::{DebugPanel, DebugStats, DialogueBox, UiLayer};

const CONFIG_PATH: &str = "assets/config.json";
const MAP_TEXTURE: &str = "map";
const SHEET_TEXTURE: &str = "spritesheet";
const WHITE_TEXTURE: &str = "__white";

const WALL_OVERLAY_COLOR: [f32; 4] = [0.15, 0.9, 0.15, 0.35];
const ZONE_OVERLAY_COLOR: [f32; 4] = [0.95, 0.8, 0.1, 0.4];
const PLAYER_OVERLAY_COLOR: [f32; 4] = [1.0, 0.3, 0.3, 0.9];

struct GpuSpriteTexture {
    texture: Texture,
    bind_group: wgpu::BindGroup,
}

/// Routes scene side effects to kira and the dialogue box.
struct EngineServices<'a> {
    audio: &'a mut AudioContext,
    dialogue: &'a mut DialogueBox,
}

impl SceneServices for EngineServices<'_> {
    fn play_sound(&mut self, name: &str, volume: f32) {
        self.audio.play(name, volume);
    }

    fn play_music(&mut self, name: &str, volume: f32) {
        self.audio.play_music(name, volume);
    }

    fn open_dialogue(&mut self, zone: &str, text: &str) {
        self.dialogue.open(zone, text);
    }
}

/// Everything that exists once the window and GPU surface are up.
struct EngineState {
    window: Arc<Window>,
    gpu: GpuContext,
    time: TimeState,
    input: InputState,
    sprite_pipeline: SpritePipeline,
    ui: UiLayer,
    dialogue_box: DialogueBox,
    debug_panel: DebugPanel,
    show_colliders: bool,
    audio: AudioContext,
    scene: MainScene,
    scale_factor: f32,
    map_origin: Vec2,
    clear_color: wgpu::Color,
    textures: HashMap<&'static str, GpuSpriteTexture>,

    // The batch is rebuilt on the CPU each frame and streamed into these
    // buffers. Buffers grow (power-of-two) but never shrink.
    batch: SpriteBatch,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    mesh_vertex_capacity: usize,
    mesh_index_capacity: usize,
}

impl EngineState {
    fn new(window: Arc<Window>, config: &GameConfig) -> Result<Self, String> {
        let gpu = GpuContext::new(window.clone())?;
        let sprite_pipeline = SpritePipeline::new(&gpu.device, gpu.surface_format);
        let ui = UiLayer::new(&gpu.device, gpu.surface_format, &window);

        let sheet = load_sprite_sheet(Path::new(&config.sprite_sheet))?;
        let map = load_map_from_path(Path::new(&config.map))?;
        let dialogue = load_dialogue_from_path(Path::new(&config.dialogue))?;
        if dialogue.is_empty() {
            log::warn!("Dialogue file {} has no entries", config.dialogue);
        }
        log::info!(
            "Content loaded: {} map layers, {} dialogue entries, sheet '{}'",
            map.layers.len(),
            dialogue.len(),
            sheet.sheet_id
        );

        let mut textures = HashMap::new();
        let sheet_image = sheet.image.clone();
        textures.insert(
            MAP_TEXTURE,
            load_texture_asset(&gpu, &sprite_pipeline, &config.map_image),
        );
        textures.insert(
            SHEET_TEXTURE,
            load_texture_asset(&gpu, &sprite_pipeline, &sheet_image),
        );
        let white = Texture::from_rgba8(
            &gpu.device,
            &gpu.queue,
            &[255, 255, 255, 255],
            1,
            1,
            "white",
        );
        let white_bind_group = sprite_pipeline.create_texture_bind_group(&gpu.device, &white);
        textures.insert(
            WHITE_TEXTURE,
            GpuSpriteTexture {
                texture: white,
                bind_group: white_bind_group,
            },
        );

        let scene = MainScene::build(&map, dialogue, sheet, config, gpu.size)?;

        let mut audio = AudioContext::new();
        if audio.is_available() {
            audio.load_sound(MUSIC, Path::new(&config.music));
            audio.load_sound(UI_SOUND, Path::new(&config.ui_sound));
        }

        let [r, g, b] = config.background_rgb()?;
        let clear_color = if gpu.surface_format.is_srgb() {
            wgpu::Color {
                r: srgb_to_linear(r),
                g: srgb_to_linear(g),
                b: srgb_to_linear(b),
                a: 1.0,
            }
        } else {
            wgpu::Color {
                r: r as f64,
                g: g as f64,
                b: b as f64,
                a: 1.0,
            }
        };

        let camera_uniform = scene.camera().build_uniform();
        let camera_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Camera Uniform Buffer"),
                contents: bytemuck::cast_slice(&[camera_uniform]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
        let camera_bind_group =
            sprite_pipeline.create_camera_bind_group(&gpu.device, &camera_buffer);
        let vertex_buffer = create_vertex_buffer(&gpu.device, 1);
        let index_buffer = create_index_buffer(&gpu.device, 1);

        let mut state = Self {
            window,
            gpu,
            time: TimeState::new(),
            input: InputState::new(),
            sprite_pipeline,
            ui,
            dialogue_box: DialogueBox::new(),
            debug_panel: DebugPanel::new(),
            show_colliders: false,
            audio,
            scene,
            scale_factor: config.scale_factor,
            map_origin: Vec2::from(config.map_origin),
            clear_color,
            textures,
            batch: SpriteBatch::new(),
            vertex_buffer,
            index_buffer,
            camera_buffer,
            camera_bind_group,
            mesh_vertex_capacity: 0,
            mesh_index_capacity: 0,
        };

        let mut services = EngineServices {
            audio: &mut state.audio,
            dialogue: &mut state.dialogue_box,
        };
        state.scene.enter(&mut services);
        state.rebuild_mesh();
        Ok(state)
    }

    fn texture_size(&self, key: &str) -> (u32, u32) {
        self.textures
            .get(key)
            .map(|t| t.texture.size)
            .unwrap_or((1, 1))
    }

    fn rebuild_mesh(&mut self) {
        self.batch.clear();

        let (map_w, map_h) = self.texture_size(MAP_TEXTURE);
        let map_min = self.map_origin * self.scale_factor;
        self.batch.push_quad(Quad::solid(
            MAP_TEXTURE,
            map_min.into(),
            [
                map_w as f32 * self.scale_factor,
                map_h as f32 * self.scale_factor,
            ],
            [1.0; 4],
        ));

        let player = self.scene.player();
        let sheet = self.scene.sprite_sheet();
        if let Some(frame) = player.frame(sheet) {
            let (frame_w, frame_h) = sheet.frame_size_px(self.texture_size(SHEET_TEXTURE));
            let size = Vec2::new(frame_w, frame_h) * self.scale_factor;
            let min = player.position - size * 0.5;
            self.batch.push_quad(Quad {
                texture_key: SHEET_TEXTURE,
                min: min.into(),
                size: size.into(),
                uv: sheet.frame_uv(frame),
                color: [1.0; 4],
                flip_x: player.flip_x,
            });
        }

        if self.show_colliders {
            for collider in self.scene.colliders().iter() {
                let color = if is_dialogue_zone(&collider.tag) {
                    ZONE_OVERLAY_COLOR
                } else {
                    WALL_OVERLAY_COLOR
                };
                let aabb = &collider.aabb;
                self.batch.push_quad(Quad::solid(
                    WHITE_TEXTURE,
                    [aabb.min_x(), aabb.min_y()],
                    [aabb.half_w * 2.0, aabb.half_h * 2.0],
                    color,
                ));
            }
            let body = player.collider();
            self.batch.push_outline(
                WHITE_TEXTURE,
                [body.min_x(), body.min_y()],
                [body.half_w * 2.0, body.half_h * 2.0],
                2.0,
                PLAYER_OVERLAY_COLOR,
            );
        }

        self.ensure_mesh_capacity(self.batch.vertices.len(), self.batch.indices.len());
        if !self.batch.vertices.is_empty() {
            self.gpu.queue.write_buffer(
                &self.vertex_buffer,
                0,
                bytemuck::cast_slice(&self.batch.vertices),
            );
        }
        if !self.batch.indices.is_empty() {
            self.gpu.queue.write_buffer(
                &self.index_buffer,
                0,
                bytemuck::cast_slice(&self.batch.indices),
            );
        }
    }

    fn ensure_mesh_capacity(&mut self, vertex_count: usize, index_count: usize) {
        let needed_vertices = vertex_count.max(1);
        if needed_vertices > self.mesh_vertex_capacity {
            self.mesh_vertex_capacity = needed_vertices.next_power_of_two();
            self.vertex_buffer = create_vertex_buffer(&self.gpu.device, self.mesh_vertex_capacity);
        }
        let needed_indices = index_count.max(1);
        if needed_indices > self.mesh_index_capacity {
            self.mesh_index_capacity = needed_indices.next_power_of_two();
            self.index_buffer = create_index_buffer(&self.gpu.device, self.mesh_index_capacity);
        }
    }

    fn debug_stats(&self) -> DebugStats {
        let player = self.scene.player();
        DebugStats {
            player_position: player.position.into(),
            player_screen: self.scene.camera().world_to_screen(player.position).into(),
            direction: player.direction.label().to_string(),
            animation: player.animation().to_string(),
            flip_x: player.flip_x,
            in_dialogue: player.in_dialogue,
            dialogue_zone: self.dialogue_box.zone().map(str::to_string),
            camera_scale: self.scene.camera().scale,
            draw_calls: self.batch.draw_calls.len() as u32,
            texture_binds: self.batch.texture_binds() as u32,
            show_colliders: self.show_colliders,
        }
    }

    /// Run the fixed steps owed for this frame. Returns false when the app
    /// should quit.
    fn simulate(&mut self) -> bool {
        self.time.begin_frame();
        while self.time.should_step() {
            // Edges persist for the whole frame; act on hotkeys once.
            if self.time.steps_this_frame == 1 {
                if self.input.is_just_pressed(Key::Escape) {
                    log::info!("Escape pressed, exiting.");
                    return false;
                }
                if self.input.is_just_pressed(Key::F3) {
                    self.debug_panel.toggle();
                }
                if self.input.is_just_pressed(Key::F4) {
                    self.show_colliders = !self.show_colliders;
                    log::info!(
                        "Collider overlay: {}",
                        if self.show_colliders { "ON" } else { "OFF" }
                    );
                }
            }

            let mut services = EngineServices {
                audio: &mut self.audio,
                dialogue: &mut self.dialogue_box,
            };
            self.scene.update(&self.input, FIXED_DT_US, &mut services);
            self.dialogue_box.tick(self.time.fixed_dt as f32);
        }
        true
    }

    fn render(&mut self) {
        self.rebuild_mesh();

        let camera_uniform = self.scene.camera().build_uniform();
        self.gpu.queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::cast_slice(&[camera_uniform]),
        );

        let Some((output, view)) = self.gpu.begin_frame() else {
            return;
        };

        let stats = self.debug_stats();
        let dialogue_box = &mut self.dialogue_box;
        let debug_panel = &self.debug_panel;
        let time = &self.time;
        let ui_frame = self.ui.prepare(&self.window, |ctx| {
            debug_panel.show(ctx, time, &stats);
            dialogue_box.show(ctx)
        });
        if ui_frame.output {
            self.scene.finish_dialogue();
        }

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.gpu.size.0, self.gpu.size.1],
            pixels_per_point: self.window.scale_factor() as f32,
        };

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut last_bound: Option<&str> = None;
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                ..Default::default()
            });

            render_pass.set_pipeline(&self.sprite_pipeline.render_pipeline);
            render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
            render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);

            for draw in &self.batch.draw_calls {
                let key: &str = &draw.texture_key;
                let Some(texture) = self.textures.get(key) else {
                    continue;
                };
                if last_bound != Some(key) {
                    render_pass.set_bind_group(1, &texture.bind_group, &[]);
                    last_bound = Some(key);
                }
                render_pass.draw_indexed(
                    draw.index_start..(draw.index_start + draw.index_count),
                    0,
                    0..1,
                );
            }
        }

        self.ui.upload(
            &self.gpu.device,
            &self.gpu.queue,
            &mut encoder,
            &ui_frame.primitives,
            &ui_frame.textures_delta,
            &screen_descriptor,
        );

        {
            let mut egui_pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui Render Pass"),
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

            self.ui
                .paint(&mut egui_pass, &ui_frame.primitives, &screen_descriptor);
        }

        self.ui.cleanup(&ui_frame.textures_delta);

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
    }
}

struct App {
    config: GameConfig,
    state: Option<EngineState>,
}

impl App {
    fn new(config: GameConfig) -> Self {
        Self {
            config,
            state: None,
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        let started = tw_platform::window::create_window(event_loop, &self.config.platform_config())
            .and_then(|window| EngineState::new(window, &self.config));
        match started {
            Ok(state) => self.state = Some(state),
            Err(err) => {
                log::error!("Startup failed: {err}");
                event_loop.exit();
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = &self.state {
            state.window.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(state) = self.state.as_mut() else {
            return;
        };

        let egui_consumed = state.ui.handle_window_event(&state.window, &event);

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, exiting.");
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                let w = physical_size.width;
                let h = physical_size.height;
                if w > 0 && h > 0 {
                    state.gpu.resize(w, h);
                    state.scene.on_resize(w, h);
                    log::info!("Resized to {}x{}", w, h);
                }
            }
            WindowEvent::Focused(false) => {
                state.input.release_all();
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key_code) = event.physical_key {
                    if let Some(key) = map_key(key_code) {
                        route_key(&mut state.input, key, event.state, egui_consumed);
                    }
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                state.input.mouse_position = (position.x, position.y);
            }
            WindowEvent::MouseInput {
                state: button_state,
                button,
                ..
            } => {
                let Some(btn) = map_mouse_button(button) else {
                    return;
                };
                let over_ui = egui_consumed || state.ui.wants_pointer();
                match button_state {
                    ElementState::Pressed if !over_ui => state.input.mouse_down(btn),
                    ElementState::Released => state.input.mouse_up(btn),
                    _ => {}
                }
            }
            WindowEvent::RedrawRequested => {
                if state.gpu.size.0 == 0 || state.gpu.size.1 == 0 {
                    return;
                }
                if !state.simulate() {
                    event_loop.exit();
                    return;
                }
                state.render();

                // Edges are cleared only once a fixed step has consumed them,
                // so a press landing on a zero-step frame is not lost.
                if state.time.steps_this_frame > 0 {
                    state.input.end_frame();
                }
            }
            _ => {}
        }
    }
}

/// Load an image into a bound texture. A missing or broken file yields a
/// small magenta checker so the rest of the scene still renders.
fn load_texture_asset(
    gpu: &GpuContext,
    pipeline: &SpritePipeline,
    asset_path: &str,
) -> GpuSpriteTexture {
    let loaded = std::fs::read(asset_path)
        .map_err(|e| format!("Failed to read {asset_path}: {e}"))
        .and_then(|bytes| Texture::from_bytes(&gpu.device, &gpu.queue, &bytes, asset_path));
    let texture = match loaded {
        Ok(texture) => {
            log::info!(
                "Loaded texture {asset_path} ({}x{})",
                texture.size.0,
                texture.size.1
            );
            texture
        }
        Err(err) => {
            log::warn!("{err}. Using placeholder texture.");
            #[rustfmt::skip]
            let checker: [u8; 16] = [
                255, 0, 255, 255,   0, 0, 0, 255,
                0, 0, 0, 255,       255, 0, 255, 255,
            ];
            Texture::from_rgba8(&gpu.device, &gpu.queue, &checker, 2, 2, asset_path)
        }
    };
    let bind_group = pipeline.create_texture_bind_group(&gpu.device, &texture);
    GpuSpriteTexture {
        texture,
        bind_group,
    }
}

fn srgb_to_linear(c: f32) -> f64 {
    let c = c as f64;
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

fn create_vertex_buffer(device: &wgpu::Device, vertex_capacity: usize) -> wgpu::Buffer {
    let byte_len = (vertex_capacity * std::mem::size_of::<SpriteVertex>()).max(1) as u64;
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Scene Vertex Buffer"),
        size: byte_len,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn create_index_buffer(device: &wgpu::Device, index_capacity: usize) -> wgpu::Buffer {
    let byte_len = (index_capacity * std::mem::size_of::<u32>()).max(1) as u64;
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Scene Index Buffer"),
        size: byte_len,
        usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn map_key(key_code: KeyCode) -> Option<Key> {
    match key_code {
        KeyCode::ArrowLeft => Some(Key::Left),
        KeyCode::ArrowRight => Some(Key::Right),
        KeyCode::ArrowUp => Some(Key::Up),
        KeyCode::ArrowDown => Some(Key::Down),
        KeyCode::Enter | KeyCode::NumpadEnter => Some(Key::Enter),
        KeyCode::Escape => Some(Key::Escape),
        KeyCode::F3 => Some(Key::F3),
        KeyCode::F4 => Some(Key::F4),
        _ => None,
    }
}

/// Presses egui consumed are dropped; releases always land so no key stays
/// held after egui gives focus back.
fn route_key(input: &mut InputState, key: Key, key_state: ElementState, egui_consumed: bool) {
    match key_state {
        ElementState::Pressed if !egui_consumed => input.key_down(key),
        ElementState::Released => input.key_up(key),
        _ => {}
    }
}

fn map_mouse_button(button: MouseButton) -> Option<MouseBtn> {
    match button {
        MouseButton::Left => Some(MouseBtn::Left),
        MouseButton::Right => Some(MouseBtn::Right),
        MouseButton::Middle => Some(MouseBtn::Middle),
        _ => None,
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Tilewalk starting...");

    let config = match load_config_from_path(Path::new(CONFIG_PATH)) {
        Ok(config) => config,
        Err(err) => {
            log::error!("{err}");
            std::process::exit(1);
        }
    };

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(err) => {
            log::error!("Failed to create event loop: {err}");
            std::process::exit(1);
        }
    };
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config);
    if let Err(err) = event_loop.run_app(&mut app) {
        log::error!("Event loop error: {err}");
        std::process::exit(1);
    }
}
