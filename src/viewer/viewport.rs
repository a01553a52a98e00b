//! Central preview: the scene drawn on the GPU into a texture

use egui::{Color32, Rect, Response, Sense, TextureId, Ui, Vec2};

use super::gpu::PreviewRenderer;
use crate::render::OrbitCamera;
use crate::Controller;

/// What the current texture was drawn from
#[derive(Clone, Copy, PartialEq)]
struct TextureKey {
    generation: u64,
    camera: OrbitCamera,
    size: (u32, u32),
}

#[derive(Default)]
pub struct Viewport {
    renderer: Option<PreviewRenderer>,
    texture_id: Option<TextureId>,
    key: Option<TextureKey>,
}

impl Viewport {
    /// Show viewport UI and handle input
    pub fn show(
        &mut self,
        ui: &mut Ui,
        ctl: &mut Controller,
        wgpu_render_state: Option<&egui_wgpu::RenderState>,
    ) -> Response {
        let available = ui.available_size();
        let size = Vec2::new(available.x.max(64.0), available.y.max(64.0));
        let (rect, response) = ui.allocate_exact_size(size, Sense::click_and_drag());

        self.handle_input(ui, &response, ctl.camera_mut());

        let Some(render_state) = wgpu_render_state else {
            // No renderer - draw placeholder
            ui.painter().rect_filled(rect, 0.0, Color32::from_rgb(30, 30, 35));
            ui.painter().text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                "Initializing...",
                egui::FontId::default(),
                Color32::GRAY,
            );
            return response;
        };

        if ctl.preview_scene().is_none() {
            ui.painter().rect_filled(rect, 0.0, Color32::from_rgb(30, 30, 35));
            ui.painter().text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                "Load Directory to view a mesh sequence",
                egui::FontId::proportional(16.0),
                Color32::GRAY,
            );
            return response;
        }

        // Render at physical resolution so the preview stays sharp
        let ppp = ui.ctx().pixels_per_point();
        let key = TextureKey {
            generation: ctl.sink().generation(),
            camera: *ctl.camera(),
            size: ((size.x * ppp) as u32, (size.y * ppp) as u32),
        };
        if self.key != Some(key) {
            let renderer = self
                .renderer
                .get_or_insert_with(|| PreviewRenderer::new(render_state));
            self.texture_id = renderer.render(
                render_state,
                ctl.preview_scene(),
                key.generation,
                ctl.camera(),
                ctl.sink().params().background,
                key.size.0,
                key.size.1,
            );
            self.key = Some(key);
        }

        if let Some(texture_id) = self.texture_id {
            ui.painter().image(
                texture_id,
                rect,
                Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                Color32::WHITE,
            );
        }

        // File name overlay
        ui.painter().text(
            rect.left_top() + Vec2::new(8.0, 8.0),
            egui::Align2::LEFT_TOP,
            ctl.sink().label(),
            egui::FontId::monospace(14.0),
            Color32::WHITE,
        );
        response
    }

    fn handle_input(&mut self, ui: &Ui, response: &Response, camera: &mut OrbitCamera) {
        let input = ui.input(|i| i.clone());

        // Orbit with left mouse drag, pan with shift or middle drag
        if response.dragged_by(egui::PointerButton::Primary) && !input.modifiers.shift {
            let delta = response.drag_delta();
            camera.orbit(delta.x, delta.y);
        }
        if response.dragged_by(egui::PointerButton::Middle)
            || (response.dragged_by(egui::PointerButton::Primary) && input.modifiers.shift)
        {
            let delta = response.drag_delta();
            camera.pan(delta.x, delta.y);
        }

        // Zoom with right mouse drag
        if response.dragged_by(egui::PointerButton::Secondary) {
            camera.zoom(response.drag_delta().y * 2.0);
        }

        // Zoom with scroll
        if response.hovered() {
            let scroll = input.raw_scroll_delta.y;
            if scroll.abs() > 0.0 {
                camera.zoom(scroll);
            }
        }

        // Reset camera with double click
        if response.double_clicked() {
            camera.reset();
        }
    }
}
