use crate::camera3d::{Camera3D, OrbitCamera};
use crate::cli::CliOptions;
use crate::config::AppConfig;
use crate::editing::EditSession;
use crate::element::ElementKey;
use crate::input::{Input, InputEvent};
use crate::picking::PickEngine;
use crate::renderer::{BoxInstance, Renderer};
use crate::scene::{SceneBuild, SceneBuilder, SceneLayout, VolumeColor};
use crate::workspace::Workspace;

mod editor_ui;

use anyhow::{Context, Result};
use glam::Vec2;
use std::time::{Duration, Instant};
use winit::application::ApplicationHandler;
use winit::event::{DeviceEvent, ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{Key, NamedKey};

use egui::Context as EguiCtx;
use egui_wgpu::{Renderer as EguiRenderer, RendererOptions, ScreenDescriptor};
use egui_winit::State as EguiWinit;

const STATUS_TTL: Duration = Duration::from_secs(3);
const FILL_ALPHA: f32 = 0.75;
const ORBIT_SENSITIVITY: f32 = 0.008;

pub async fn run() -> Result<()> {
    run_with_options(CliOptions::default()).await
}

pub async fn run_with_options(options: CliOptions) -> Result<()> {
    let mut config = AppConfig::load_or_default("config/app.json");
    config.apply_overrides(&options.config_overrides());
    let event_loop = EventLoop::new().context("Failed to create winit event loop")?;
    let mut app = App::new(config);
    if let Some(path) = options.archive() {
        match app.workspace.load_archive(path) {
            Ok(import) => app.note_archive_import(import.screens.len(), import.skipped.len()),
            Err(err) => eprintln!("Archive load error: {err:?}"),
        }
    }
    event_loop.run_app(&mut app).context("Event loop execution failed")?;
    Ok(())
}

pub struct App {
    renderer: Renderer,
    input: Input,
    should_close: bool,

    pub(crate) workspace: Workspace,
    scene_builder: SceneBuilder,
    scene: SceneBuild,
    scene_dirty: bool,
    refit_camera: bool,
    layout: SceneLayout,

    pick: PickEngine,
    orbit: OrbitCamera,
    camera: Camera3D,

    selected: Option<ElementKey>,
    edit: Option<EditSession>,

    // egui
    egui_ctx: EguiCtx,
    egui_winit: Option<EguiWinit>,
    egui_renderer: Option<EguiRenderer>,
    egui_screen: Option<ScreenDescriptor>,

    // UI state
    ui_archive_input: String,
    status: Option<(String, Instant)>,
    screenshot_tex: Option<egui::TextureHandle>,
    screenshot_dirty: bool,
    screenshot_enlarged: bool,

    config: AppConfig,
}

impl App {
    pub fn new(config: AppConfig) -> Self {
        let layout = SceneLayout {
            screen_width: config.layout.screen_width,
            screen_height: config.layout.screen_height,
            box_depth: config.layout.box_depth,
            depth_step: config.layout.depth_step,
            fit_padding: config.layout.fit_padding,
        };
        let workspace =
            Workspace::new(config.paths.state_dir.clone(), config.paths.export_dir.clone());
        Self {
            renderer: Renderer::new(&config.window),
            input: Input::new(),
            should_close: false,
            workspace,
            scene_builder: SceneBuilder::default(),
            scene: SceneBuild::empty(),
            scene_dirty: true,
            refit_camera: true,
            layout,
            pick: PickEngine::default(),
            orbit: OrbitCamera::new(glam::Vec3::ZERO, 3000.0),
            camera: Camera3D::new(
                glam::Vec3::new(0.0, 0.0, 3000.0),
                glam::Vec3::ZERO,
                config.camera.fov_degrees.to_radians(),
                config.camera.near,
                config.camera.far,
            ),
            selected: None,
            edit: None,
            egui_ctx: EguiCtx::default(),
            egui_winit: None,
            egui_renderer: None,
            egui_screen: None,
            ui_archive_input: String::new(),
            status: None,
            screenshot_tex: None,
            screenshot_dirty: true,
            screenshot_enlarged: false,
            config,
        }
    }

    fn fov_y_radians(&self) -> f32 {
        self.config.camera.fov_degrees.to_radians()
    }

    fn set_status(&mut self, message: impl Into<String>) {
        self.status = Some((message.into(), Instant::now()));
    }

    fn note_archive_import(&mut self, screens: usize, skipped: usize) {
        if skipped > 0 {
            self.set_status(format!("Loaded {screens} screens ({skipped} entries skipped)"));
        } else {
            self.set_status(format!("Loaded {screens} screens"));
        }
        self.selected = None;
        self.edit = None;
        self.scene_dirty = true;
        self.refit_camera = true;
        self.screenshot_dirty = true;
    }

    fn note_screen_changed(&mut self) {
        self.selected = None;
        self.edit = None;
        self.scene_dirty = true;
        self.refit_camera = true;
        self.screenshot_dirty = true;
    }

    /// Uploads the current screenshot to an egui texture, dropping the old one.
    fn refresh_screenshot(&mut self) {
        if !self.screenshot_dirty {
            return;
        }
        self.screenshot_dirty = false;
        self.screenshot_tex = None;
        let Some(png) = self.workspace.current_screen().map(|s| s.screenshot_png.clone()) else {
            return;
        };
        match image::load_from_memory(&png) {
            Ok(decoded) => {
                let rgba = decoded.to_rgba8();
                let size = [rgba.width() as usize, rgba.height() as usize];
                let color_image = egui::ColorImage::from_rgba_unmultiplied(size, rgba.as_raw());
                let handle = self.egui_ctx.load_texture(
                    "screenshot",
                    color_image,
                    egui::TextureOptions::LINEAR,
                );
                self.screenshot_tex = Some(handle);
            }
            Err(err) => {
                eprintln!("Screenshot decode error: {err:?}");
                self.set_status("Screenshot could not be decoded");
            }
        }
    }

    fn rebuild_scene_if_needed(&mut self) {
        if !self.scene_dirty {
            return;
        }
        self.scene_dirty = false;
        self.scene = self.scene_builder.build(
            self.workspace.elements(),
            self.selected.as_ref(),
            &self.layout,
            self.fov_y_radians(),
        );
        self.pick.clear_hover();
        if self.refit_camera {
            self.refit_camera = false;
            self.orbit.apply_framing(&self.scene.framing);
        }
    }

    /// Summary shown in the hover tooltip for a volume.
    fn hover_summary(&self, volume_index: usize) -> Option<String> {
        let volume = self.scene.volumes.get(volume_index)?;
        let element = self.workspace.elements().get(volume.element_index)?;
        let mut lines = Vec::new();
        if let Some(text) = element.text.as_deref().filter(|t| !t.is_empty()) {
            lines.push(format!("\"{text}\""));
        }
        if let Some(id) = element.resource_id.as_deref().filter(|t| !t.is_empty()) {
            lines.push(id.to_string());
        }
        if let Some(class) = element.class_name.as_deref().filter(|t| !t.is_empty()) {
            lines.push(class.to_string());
        }
        if let Some(info) = element.information.as_deref().filter(|t| !t.is_empty()) {
            lines.push(format!("note: {info}"));
        }
        if lines.is_empty() {
            lines.push(element.bounds.clone().unwrap_or_else(|| "element".to_string()));
        }
        Some(lines.join("\n"))
    }

    fn open_selection(&mut self, volume_index: usize) {
        let Some(volume) = self.scene.volumes.get(volume_index) else {
            return;
        };
        let key = volume.key.clone();
        let Some(element) = self.workspace.elements().find_by_key(&key) else {
            return;
        };
        match EditSession::open(element) {
            Ok(session) => {
                self.selected = Some(key);
                self.edit = Some(session);
                self.scene_dirty = true;
            }
            Err(err) => {
                eprintln!("Failed to open element: {err:?}");
                self.set_status("Could not open element for editing");
            }
        }
    }

    fn clear_selection(&mut self) {
        if self.selected.take().is_some() {
            self.edit = None;
            self.scene_dirty = true;
        }
    }

    fn delete_selected_element(&mut self) {
        if let Some(key) = self.selected.clone() {
            self.delete_key(key);
        }
    }

    fn delete_key(&mut self, key: ElementKey) {
        match self.workspace.delete_element(&key) {
            Ok(0) => {}
            Ok(_) => {
                if self.selected.as_ref() == Some(&key) {
                    self.selected = None;
                    self.edit = None;
                }
                self.scene_dirty = true;
                self.set_status("Element deleted");
            }
            Err(err) => {
                eprintln!("Delete failed: {err:?}");
                self.set_status("Delete failed");
            }
        }
    }

    fn build_instances(&self) -> (Vec<BoxInstance>, Option<BoxInstance>) {
        let hovered = self.pick.hovered();
        let instances: Vec<BoxInstance> = self
            .scene
            .volumes
            .iter()
            .enumerate()
            .map(|(index, volume)| {
                let alpha = if hovered == Some(index) { 1.0 } else { FILL_ALPHA };
                let [r, g, b] = volume.color.rgb_f32();
                BoxInstance::new(
                    volume.center().to_array(),
                    volume.half_extent().to_array(),
                    [r, g, b, alpha],
                )
            })
            .collect();
        let outline = hovered.and_then(|index| self.scene.volumes.get(index)).map(|volume| {
            BoxInstance::new(
                volume.center().to_array(),
                volume.half_extent().to_array(),
                [1.0, 1.0, 1.0, 1.0],
            )
        });
        (instances, outline)
    }

    fn apply_ui_actions(&mut self, actions: editor_ui::UiActions) {
        if actions.load_archive {
            let path = self.ui_archive_input.trim().to_string();
            if path.is_empty() {
                self.set_status("Enter an archive path first");
            } else {
                match self.workspace.load_archive(&path) {
                    Ok(import) => {
                        self.note_archive_import(import.screens.len(), import.skipped.len())
                    }
                    Err(err) => {
                        eprintln!("Archive load error: {err:?}");
                        self.set_status(format!("Archive load failed: {err}"));
                    }
                }
            }
        }
        if actions.previous_screen {
            match self.workspace.previous_screen() {
                Ok(true) => self.note_screen_changed(),
                Ok(false) => {}
                Err(err) => {
                    eprintln!("Screen change error: {err:?}");
                    self.set_status("Could not load previous screen");
                }
            }
        }
        if actions.next_screen {
            match self.workspace.next_screen() {
                Ok(true) => self.note_screen_changed(),
                Ok(false) => {}
                Err(err) => {
                    eprintln!("Screen change error: {err:?}");
                    self.set_status("Could not load next screen");
                }
            }
        }
        if actions.apply_json {
            match self.workspace.apply_json_text() {
                Ok(()) => {
                    self.selected = None;
                    self.edit = None;
                    self.scene_dirty = true;
                }
                Err(err) => self.set_status(format!("Invalid JSON: {err}")),
            }
        }
        if actions.save_edit {
            if let Some(mut session) = self.edit.take() {
                match self.workspace.commit_edit(&mut session) {
                    Ok(committed) => {
                        self.selected = Some(committed.key());
                        self.edit = Some(session);
                        self.scene_dirty = true;
                        self.set_status("Changes saved");
                    }
                    Err(err) => {
                        self.set_status(format!("Save failed: {err}"));
                        self.edit = Some(session);
                    }
                }
            }
        }
        if actions.delete_selected {
            self.delete_selected_element();
        }
        if actions.close_selection {
            self.clear_selection();
        }
        if actions.export {
            match self.workspace.export() {
                Ok(path) => self.set_status(format!("Exported to {}", path.display())),
                Err(err) => {
                    eprintln!("Export error: {err:?}");
                    self.set_status(format!("Export failed: {err}"));
                }
            }
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if let Err(err) = self.renderer.ensure_window(event_loop) {
            eprintln!("Renderer initialization error: {err:?}");
            self.should_close = true;
            return;
        }

        if self.egui_winit.is_none() {
            if let Some(window) = self.renderer.window() {
                let state = EguiWinit::new(
                    self.egui_ctx.clone(),
                    egui::ViewportId::ROOT,
                    window,
                    Some(self.renderer.pixels_per_point()),
                    window.theme(),
                    None,
                );
                self.egui_winit = Some(state);
            }
        }

        let egui_renderer = match (self.renderer.device(), self.renderer.surface_format()) {
            (Ok(device), Ok(format)) => EguiRenderer::new(device, format, RendererOptions::default()),
            (Err(err), _) | (_, Err(err)) => {
                eprintln!("Unable to initialize egui renderer: {err:?}");
                self.should_close = true;
                return;
            }
        };
        self.egui_renderer = Some(egui_renderer);
        let size = self.renderer.size();
        self.egui_screen = Some(ScreenDescriptor {
            size_in_pixels: [size.width, size.height],
            pixels_per_point: self.renderer.pixels_per_point(),
        });
    }

    fn window_event(
        &mut self,
        _el: &ActiveEventLoop,
        id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        // egui wants the events too
        let mut consumed = false;
        let input_event = InputEvent::from_window_event(&event);
        let is_cursor_event =
            matches!(&input_event, InputEvent::CursorPos { .. } | InputEvent::CursorLeft);
        if let (Some(window), Some(state)) = (self.renderer.window(), self.egui_winit.as_mut()) {
            if id == window.id() {
                let resp = state.on_window_event(window, &event);
                if resp.consumed {
                    consumed = true;
                }
            }
        }
        if !consumed || is_cursor_event {
            self.input.push(input_event);
        }

        if consumed {
            return;
        }

        match &event {
            WindowEvent::CloseRequested => self.should_close = true,
            WindowEvent::Resized(size) => {
                self.renderer.resize(*size);
                if let Some(sd) = &mut self.egui_screen {
                    sd.size_in_pixels = [size.width, size.height];
                    sd.pixels_per_point = self.renderer.pixels_per_point();
                }
            }
            WindowEvent::KeyboardInput {
                event: KeyEvent { logical_key, state, .. }, ..
            } => {
                if let Key::Named(NamedKey::Escape) = logical_key {
                    if *state == ElementState::Pressed {
                        self.should_close = true;
                    }
                }
            }
            _ => {}
        }
    }

    fn device_event(&mut self, _e: &ActiveEventLoop, _dev: winit::event::DeviceId, ev: DeviceEvent) {
        self.input.push(InputEvent::from_device_event(&ev));
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.should_close {
            event_loop.exit();
            return;
        }

        if let Some((_, shown_at)) = &self.status {
            if shown_at.elapsed() > STATUS_TTL {
                self.status = None;
            }
        }

        // Camera control.
        if let Some(delta) = self.input.consume_wheel_delta() {
            self.orbit.zoom(0.92_f32.powf(delta));
        }
        let dragging = self.input.right_held();
        self.pick.set_dragging(dragging);
        if dragging {
            let (dx, dy) = self.input.mouse_delta;
            if dx.abs() > f32::EPSILON || dy.abs() > f32::EPSILON {
                self.orbit.orbit(Vec2::new(-dx * ORBIT_SENSITIVITY, -dy * ORBIT_SENSITIVITY));
            }
        }

        // Keyboard delete targets the current selection.
        if self.input.take_delete_pressed() {
            self.delete_selected_element();
        }

        self.rebuild_scene_if_needed();
        self.camera = self.orbit.to_camera(
            self.fov_y_radians(),
            self.config.camera.near,
            self.config.camera.far,
        );

        let viewport = self.renderer.size();
        let cursor_screen = self.input.cursor_position().map(|(x, y)| Vec2::new(x, y));
        self.pick.set_cursor(cursor_screen);
        let cursor_ray =
            cursor_screen.and_then(|pos| self.camera.screen_ray(pos, viewport));
        self.pick.update_hover(&self.scene, cursor_ray);

        if self.input.take_left_click() {
            match cursor_ray.and_then(|(origin, dir)| self.pick.pick(&self.scene, origin, dir)) {
                Some(index) => self.open_selection(index),
                None => self.clear_selection(),
            }
        }

        let (instances, outline) = self.build_instances();
        let view_proj = self.camera.view_projection(viewport);
        let frame = match self.renderer.render_frame(&instances, outline.as_ref(), view_proj) {
            Ok(frame) => frame,
            Err(err) => {
                eprintln!("Render error: {err:?}");
                self.input.clear_frame();
                return;
            }
        };

        if self.egui_winit.is_none() {
            frame.present();
            self.input.clear_frame();
            return;
        }

        self.refresh_screenshot();

        let raw_input = {
            let Some(window) = self.renderer.window() else {
                return;
            };
            self.egui_winit.as_mut().unwrap().take_egui_input(window)
        };

        let pixels_per_point = self.egui_ctx.pixels_per_point();
        let tooltip = self.pick.hovered().and_then(|index| {
            let summary = self.hover_summary(index)?;
            let cursor = cursor_screen?;
            let pos = egui::pos2(
                cursor.x / pixels_per_point + 14.0,
                cursor.y / pixels_per_point + 14.0,
            );
            Some((pos, summary))
        });

        let screen_label = match (self.workspace.current_index(), self.workspace.screen_count()) {
            (Some(index), count) if count > 0 => format!("Screen {} of {}", index + 1, count),
            _ => "No archive loaded".to_string(),
        };
        let selection_open =
            self.selected.as_ref().and_then(|key| self.workspace.elements().find_by_key(key));
        let selection_title = selection_open.map(|element| {
            element
                .text
                .clone()
                .filter(|t| !t.is_empty())
                .or_else(|| element.resource_id.clone())
                .unwrap_or_else(|| "element".to_string())
        });

        let params = editor_ui::EditorUiParams {
            raw_input,
            screen_label,
            can_navigate: self.workspace.screen_count() > 1,
            screen_name: self.workspace.screen_name().to_string(),
            json_text: self.workspace.json_text().to_string(),
            archive_input: self.ui_archive_input.clone(),
            selection_title,
            edit_draft: self.edit.as_ref().map(|session| editor_ui::EditDraft {
                json: session.draft_json().to_string(),
                information: session.information().to_string(),
                dirty: session.is_dirty(),
            }),
            volume_count: self.scene.volumes.len(),
            element_count: self.workspace.elements().len(),
            labeled_count: self.workspace.labeled_count(),
            status: self.status.as_ref().map(|(message, _)| message.clone()),
            tooltip,
            screenshot: self
                .screenshot_tex
                .as_ref()
                .map(|tex| (tex.id(), egui::vec2(tex.size()[0] as f32, tex.size()[1] as f32))),
            screenshot_enlarged: self.screenshot_enlarged,
        };

        let output = self.render_editor_ui(params);
        let editor_ui::EditorUiOutput {
            full_output,
            screen_name,
            json_text,
            archive_input,
            edit_draft,
            screenshot_enlarged,
            actions,
        } = output;

        self.workspace.set_screen_name(screen_name);
        *self.workspace.json_text_mut() = json_text;
        self.ui_archive_input = archive_input;
        self.screenshot_enlarged = screenshot_enlarged;
        if let (Some(session), Some(draft)) = (self.edit.as_mut(), edit_draft) {
            *session.draft_json_mut() = draft.json;
            *session.information_mut() = draft.information;
        }
        self.apply_ui_actions(actions);

        let egui::FullOutput { platform_output, textures_delta, shapes, .. } = full_output;
        if let Some(window) = self.renderer.window() {
            self.egui_winit.as_mut().unwrap().handle_platform_output(window, platform_output);
        } else {
            return;
        }

        if let (Some(ren), Some(screen)) = (self.egui_renderer.as_mut(), self.egui_screen.as_ref())
        {
            if let (Ok(device), Ok(queue)) = (self.renderer.device(), self.renderer.queue()) {
                for (id, delta) in &textures_delta.set {
                    ren.update_texture(device, queue, *id, delta);
                }
            }
            let meshes = self.egui_ctx.tessellate(shapes, screen.pixels_per_point);
            if let Err(err) = self.renderer.render_egui(ren, &meshes, screen, frame) {
                eprintln!("Egui render error: {err:?}");
            }
            for id in &textures_delta.free {
                ren.free_texture(id);
            }
        } else {
            frame.present();
        }

        if let Some(w) = self.renderer.window() {
            w.request_redraw();
        }
        self.input.clear_frame();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delete_shortcut_targets_the_selection() {
        let mut app = App::new(AppConfig::default());
        let before = app.workspace.elements().len();
        let selected = app.workspace.elements().elements()[2].key();
        app.selected = Some(selected.clone());

        // Hovering a different volume must not redirect the delete.
        app.scene = app.scene_builder.build(
            app.workspace.elements(),
            None,
            &app.layout,
            app.fov_y_radians(),
        );
        app.pick.update_hover(
            &app.scene,
            Some((glam::Vec3::new(0.0, 0.0, 10_000.0), glam::Vec3::NEG_Z)),
        );

        app.delete_selected_element();
        assert_eq!(app.workspace.elements().len(), before - 1);
        assert!(app.workspace.elements().find_by_key(&selected).is_none());
        assert_eq!(app.selected, None);
    }

    #[test]
    fn delete_shortcut_without_selection_is_a_noop() {
        let mut app = App::new(AppConfig::default());
        let before = app.workspace.elements().len();
        app.delete_selected_element();
        assert_eq!(app.workspace.elements().len(), before);
    }
}
