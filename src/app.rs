use std::sync::Arc;

use anyhow::{bail, Result};
use log::{error, info};
use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::ActiveEventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use crate::cli::Cli;
use crate::controller::FrameController;
use crate::device::DeviceCatalog;
use crate::engine::{PatternEngine, RenderEngine};
use crate::gpu::GpuContext;
use crate::surface::SurfaceRenderer;

const INITIAL_WINDOW_WIDTH: u32 = 412;
const INITIAL_WINDOW_HEIGHT: u32 = 900;
/// Side length of the magnifier inset, a multiple of the 5x factor.
const MAGNIFIER_SIZE: u32 = 200;

/// What the selector widgets currently show.
#[derive(Debug, Clone, PartialEq)]
struct UiSelection {
    device_id: String,
    language: String,
    magnified: bool,
}

/// Window-side GPU and egui state, created once the window exists.
struct Gfx {
    gpu: Arc<GpuContext>,
    surface: SurfaceRenderer,
    egui_ctx: egui::Context,
    egui_state: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
    magnifier_tex: Option<egui::TextureHandle>,
}

/// Top-level winit application: wires window events to the frame
/// controller and draws the selector overlay plus the magnifier inset.
pub struct App {
    catalog: DeviceCatalog,
    languages: Vec<String>,
    controller: FrameController,
    ui: UiSelection,
    window: Option<Arc<Window>>,
    gfx: Option<Gfx>,
}

impl App {
    pub fn new(cli: &Cli, catalog: DeviceCatalog) -> Result<Self> {
        if catalog.get(&cli.device).is_none() {
            let known: Vec<&str> = catalog.ids().collect();
            bail!("unknown device {:?}; known devices: {}", cli.device, known.join(", "));
        }
        let engine = PatternEngine::new();
        let languages = engine.language_ids();
        if !languages.iter().any(|id| id == &cli.language) {
            bail!("unknown language {:?}; known languages: {}", cli.language, languages.join(", "));
        }

        Ok(Self {
            catalog,
            languages,
            controller: FrameController::new(Box::new(engine)),
            ui: UiSelection {
                device_id: cli.device.clone(),
                language: cli.language.clone(),
                magnified: cli.magnified,
            },
            window: None,
            gfx: None,
        })
    }

    /// Push the selector state into the controller.
    fn apply_selection(&mut self) {
        let Some(profile) = self.catalog.get(&self.ui.device_id).cloned() else {
            error!("selected device {:?} disappeared from the catalog", self.ui.device_id);
            return;
        };
        self.controller
            .on_selection_changed(profile, &self.ui.language, self.ui.magnified);
    }

    fn redraw(&mut self) {
        let (Some(window), Some(gfx)) = (&self.window, &mut self.gfx) else {
            return;
        };
        let Gfx {
            gpu,
            surface,
            egui_ctx,
            egui_state,
            egui_renderer,
            magnifier_tex,
        } = gfx;

        let (width, height) = surface.dimensions();
        // Paint read under the frame pair's lock; a stale image from
        // before a resize falls back to a blank frame for this redraw.
        let pixels = self
            .controller
            .with_display(|display| {
                (display.width() == width && display.height() == height)
                    .then(|| display.pixels().to_vec())
            })
            .flatten()
            .unwrap_or_else(|| vec![0; width as usize * height as usize * 4]);

        let catalog = &self.catalog;
        let languages = &self.languages;
        let controller = &self.controller;
        let mut selection = self.ui.clone();

        let raw_input = egui_state.take_egui_input(window);
        let full_output = egui_ctx.run(raw_input, |ctx| {
            egui::Window::new("Device")
                .anchor(egui::Align2::RIGHT_TOP, egui::vec2(-10.0, 10.0))
                .resizable(false)
                .show(ctx, |ui| {
                    egui::ComboBox::from_label("Device")
                        .selected_text(selection.device_id.clone())
                        .show_ui(ui, |ui| {
                            for profile in catalog.profiles() {
                                ui.selectable_value(
                                    &mut selection.device_id,
                                    profile.id.clone(),
                                    &profile.id,
                                );
                            }
                        });
                    egui::ComboBox::from_label("Language")
                        .selected_text(selection.language.clone())
                        .show_ui(ui, |ui| {
                            for id in languages {
                                ui.selectable_value(&mut selection.language, id.clone(), id);
                            }
                        });
                    ui.checkbox(&mut selection.magnified, "Magnified");
                    ui.separator();

                    let inset = controller.magnifier().with_image(|image| {
                        egui::ColorImage::from_rgba_premultiplied(
                            [image.width() as usize, image.height() as usize],
                            image.pixels(),
                        )
                    });
                    if let Some(inset) = inset {
                        match magnifier_tex {
                            Some(tex) => tex.set(inset, egui::TextureOptions::NEAREST),
                            None => {
                                *magnifier_tex = Some(ctx.load_texture(
                                    "magnifier",
                                    inset,
                                    egui::TextureOptions::NEAREST,
                                ))
                            }
                        }
                    }
                    if let Some(tex) = magnifier_tex.as_ref() {
                        ui.image(tex);
                    }
                });
        });

        egui_state.handle_platform_output(window, full_output.platform_output);

        let tris = egui_ctx.tessellate(full_output.shapes, egui_ctx.pixels_per_point());
        for (id, image_delta) in &full_output.textures_delta.set {
            egui_renderer.update_texture(gpu.device(), gpu.queue(), *id, image_delta);
        }

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [width, height],
            pixels_per_point: window.scale_factor() as f32,
        };

        let result = surface.render(&pixels, |encoder, view| {
            egui_renderer.update_buffers(gpu.device(), gpu.queue(), encoder, &tris, &screen_descriptor);

            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("egui Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            // SAFETY: The render pass lifetime is actually tied to the encoder,
            // but egui-wgpu requires 'static. This is safe because we drop the
            // render pass before using the encoder again.
            let render_pass_static = unsafe {
                std::mem::transmute::<&mut wgpu::RenderPass<'_>, &mut wgpu::RenderPass<'static>>(
                    &mut render_pass,
                )
            };
            egui_renderer.render(render_pass_static, &tris, &screen_descriptor);
        });
        if let Err(e) = result {
            error!("render error: {}", e);
        }

        for id in &full_output.textures_delta.free {
            egui_renderer.free_texture(id);
        }

        if selection != self.ui {
            self.ui = selection;
            self.apply_selection();
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window = match event_loop.create_window(
            Window::default_attributes()
                .with_title("fbviz")
                .with_inner_size(winit::dpi::LogicalSize::new(
                    INITIAL_WINDOW_WIDTH,
                    INITIAL_WINDOW_HEIGHT,
                )),
        ) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                error!("failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        let (surface, gpu) = match SurfaceRenderer::new(window.clone()) {
            Ok(pair) => pair,
            Err(e) => {
                error!("failed to initialize presentation: {}", e);
                event_loop.exit();
                return;
            }
        };

        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(
            gpu.device(),
            surface.format(),
            egui_wgpu::RendererOptions::default(),
        );

        let size = window.inner_size();
        self.controller.magnifier().resize(MAGNIFIER_SIZE, MAGNIFIER_SIZE);
        self.controller.on_viewport_resized(size.width, size.height);

        self.window = Some(window);
        self.gfx = Some(Gfx {
            gpu,
            surface,
            egui_ctx,
            egui_state,
            egui_renderer,
            magnifier_tex: None,
        });

        self.apply_selection();
        info!("window up at {}x{}", size.width, size.height);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        if let (Some(gfx), Some(window)) = (&mut self.gfx, &self.window) {
            if gfx.egui_state.on_window_event(window, &event).consumed {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        ..
                    },
                ..
            } => event_loop.exit(),
            WindowEvent::Resized(size) => {
                if let Some(gfx) = &mut self.gfx {
                    gfx.surface.resize(size.width, size.height);
                }
                self.controller.on_viewport_resized(size.width, size.height);
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.controller.on_pointer_move(position.x as i32, position.y as i32);
            }
            WindowEvent::RedrawRequested => self.redraw(),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}
