//! Main application state and UI

use std::path::PathBuf;
use std::time::{Duration, Instant};

use egui::{CentralPanel, RichText, TopBottomPanel};

use super::viewport::Viewport;
use crate::field::{FieldSelection, MissingFieldPolicy, NONE_LABEL};
use crate::heightmap::RevertMode;
use crate::playback::MIN_RATE;
use crate::record::DEFAULT_RECORDING;
use crate::render::builtin;
use crate::settings::Settings;
use crate::state::Event;
use crate::Controller;

/// Repaint interval while a load is running
const LOAD_REPAINT: Duration = Duration::from_millis(50);

pub struct ViewerApp {
    ctl: Controller,
    settings: Settings,
    viewport: Viewport,
    /// Directory to load on the next update
    pending_dir: Option<PathBuf>,
    /// Directory shown in the window title
    title_dir: Option<PathBuf>,
}

impl ViewerApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        settings: Settings,
        initial_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            ctl: Controller::new(&settings),
            settings,
            viewport: Viewport::default(),
            pending_dir: initial_dir,
            title_dir: None,
        }
    }

    fn load_dir(&mut self, dir: PathBuf) {
        self.settings.add_recent(dir.clone());
        self.settings.save();
        self.ctl.begin_load(dir, Instant::now());
    }

    fn open_dir_dialog(&mut self) {
        let mut dialog = rfd::FileDialog::new().set_title("Open Directory");
        if let Some(last) = &self.settings.last_dir {
            dialog = dialog.set_directory(last);
        }
        if let Some(dir) = dialog.pick_folder() {
            self.load_dir(dir);
        }
    }

    fn record_dialog(&mut self) {
        let name = self
            .ctl
            .recording_path()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| DEFAULT_RECORDING.to_string());
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("GIF animation", &["gif"])
            .set_file_name(&name)
            .save_file()
        {
            // errors end up on the status line
            if let Err(err) = self.ctl.start_recording(path) {
                log::debug!("recording not started: {}", err);
            }
        }
    }

    fn menu_bar(&mut self, ctx: &egui::Context, ui: &mut egui::Ui) {
        // Collect recent dirs to avoid borrow issues
        let recent: Vec<PathBuf> = self.settings.recent_dirs().into_iter().cloned().collect();

        egui::MenuBar::new().ui(ui, |ui| {
            ui.menu_button("File", |ui| {
                if ui.button("Load Directory...").clicked() {
                    self.open_dir_dialog();
                    ui.close();
                }

                if !recent.is_empty() {
                    ui.menu_button("Recent", |ui| {
                        for path in &recent {
                            if ui.button(path.display().to_string()).clicked() {
                                self.pending_dir = Some(path.clone());
                                ui.close();
                            }
                        }
                        ui.separator();
                        if ui.button("Clear Recent").clicked() {
                            self.settings.recent_dirs.clear();
                            self.settings.save();
                            ui.close();
                        }
                    });
                }

                ui.separator();
                if ui.button("Record To...").clicked() {
                    self.record_dialog();
                    ui.close();
                }

                ui.separator();
                if ui.button("Exit").clicked() {
                    ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                }
            });

            ui.menu_button("View", |ui| {
                ui.label("Color map");
                for map in builtin::all() {
                    let selected = self.settings.color_map == map.name;
                    if ui.selectable_label(selected, &map.name).clicked() {
                        self.settings.color_map = map.name.clone();
                        self.ctl.set_shading(self.settings.shading_params());
                    }
                }

                ui.separator();
                ui.label("Height map off");
                let mut mode = self.ctl.revert_mode();
                ui.radio_value(&mut mode, RevertMode::Restore, "Restore geometry");
                ui.radio_value(&mut mode, RevertMode::Flatten, "Flatten to z = 0");
                if mode != self.ctl.revert_mode() {
                    self.ctl.set_revert_mode(mode);
                }

                ui.separator();
                ui.label("Missing field");
                let mut policy = self.ctl.sink().policy();
                ui.radio_value(&mut policy, MissingFieldPolicy::Unshaded, "Draw unshaded");
                ui.radio_value(&mut policy, MissingFieldPolicy::Fail, "Keep last image");
                if policy != self.ctl.sink().policy() {
                    self.ctl.set_missing_field_policy(policy);
                }

                ui.separator();
                if ui.button("Reset Camera").clicked() {
                    self.ctl.camera_mut().reset();
                    ui.close();
                }
            });

            ui.menu_button("Help", |ui| {
                ui.label(format!(
                    "simview {} (built {})",
                    env!("CARGO_PKG_VERSION"),
                    env!("SIMVIEW_BUILD_DATE")
                ));
                ui.label("Drag to orbit, shift+drag to pan, scroll to zoom");
                ui.label("Space: play/stop, arrows: step, double click: reset view");
            });
        });
    }

    fn toolbar(&mut self, ui: &mut egui::Ui) {
        let now = Instant::now();
        let has_frames = !self.ctl.store().is_empty();

        ui.horizontal(|ui| {
            if ui.button("Load Directory").clicked() {
                self.open_dir_dialog();
            }

            let label = if self.ctl.state().is_playing() { "Stop" } else { "Play" };
            if ui.add_enabled(has_frames, egui::Button::new(label)).clicked() {
                self.ctl.dispatch(Event::TogglePlay, now);
            }

            let recording = self.ctl.state().recording;
            let record_label = if recording {
                RichText::new("Stop Recording").color(egui::Color32::from_rgb(230, 80, 80))
            } else {
                RichText::new("Record")
            };
            if ui.button(record_label).clicked() {
                self.ctl.dispatch(Event::Recording(!recording), now);
            }

            ui.separator();

            // Field selector
            let current = self.ctl.state().field.clone();
            let mut chosen = None;
            egui::ComboBox::from_id_salt("field_select")
                .selected_text(current.label())
                .width(160.0)
                .show_ui(ui, |ui| {
                    if ui.selectable_label(current == FieldSelection::None, NONE_LABEL).clicked() {
                        chosen = Some(FieldSelection::None);
                    }
                    for name in self.ctl.field_names() {
                        let selected = current.name() == Some(name.as_str());
                        if ui.selectable_label(selected, &name).clicked() {
                            chosen = Some(FieldSelection::select(name));
                        }
                    }
                });
            if let Some(field) = chosen.filter(|f| *f != current) {
                self.ctl.dispatch(Event::Select(field), now);
            }

            ui.separator();

            let mut height_map = self.ctl.state().height_map;
            if ui.checkbox(&mut height_map, "Height map").changed() {
                self.ctl.dispatch(Event::HeightMap(height_map), now);
            }
            let mut scale = self.ctl.height_scale();
            let response = ui.add(
                egui::DragValue::new(&mut scale)
                    .speed(0.1)
                    .prefix("scale ")
                    .max_decimals(3),
            );
            if response.changed() {
                self.ctl.set_height_scale(scale);
            }
        });
    }

    /// Index of the frame on screen; a tick advances the state past it.
    fn shown_index(&self) -> usize {
        self.ctl.shown_index().unwrap_or(self.ctl.state().index)
    }

    fn timeline_panel(&mut self, ui: &mut egui::Ui) {
        let now = Instant::now();
        let len = self.ctl.store().len();
        let shown = self.shown_index();

        ui.horizontal(|ui| {
            ui.label(format!("{} / {}", shown + 1, len.max(1)));

            let mut step = self.ctl.state().playback.step;
            if ui
                .add(egui::DragValue::new(&mut step).range(1..=1000).prefix("step "))
                .changed()
            {
                self.ctl.dispatch(Event::SetStep(step), now);
            }

            let mut rate = self.ctl.state().playback.rate;
            if ui
                .add(
                    egui::DragValue::new(&mut rate)
                        .range(MIN_RATE..=240.0)
                        .speed(0.5)
                        .suffix(" fps"),
                )
                .changed()
            {
                self.ctl.dispatch(Event::SetRate(rate), now);
            }

            ui.separator();

            // Frame slider - fill remaining width
            let mut index = shown;
            ui.spacing_mut().slider_width = (ui.available_width() - 10.0).max(100.0);
            let response = ui.add_enabled(
                len > 1,
                egui::Slider::new(&mut index, 0..=len.saturating_sub(1)).show_value(false),
            );
            if response.changed() && index != shown {
                self.ctl.dispatch(Event::Seek(index), now);
            }
        });
    }

    fn status_bar(&self, ui: &mut egui::Ui) {
        let bar = egui::ProgressBar::new(self.ctl.progress()).text(self.ctl.status());
        ui.add(bar);
    }

    fn handle_keys(&mut self, ctx: &egui::Context) {
        if ctx.wants_keyboard_input() {
            return;
        }
        let now = Instant::now();
        let (space, left, right) = ctx.input(|i| {
            (
                i.key_pressed(egui::Key::Space),
                i.key_pressed(egui::Key::ArrowLeft),
                i.key_pressed(egui::Key::ArrowRight),
            )
        });
        let index = self.shown_index();
        if space {
            self.ctl.dispatch(Event::TogglePlay, now);
        }
        if left {
            self.ctl.dispatch(Event::Seek(index.saturating_sub(1)), now);
        }
        if right {
            self.ctl.dispatch(Event::Seek(index + 1), now);
        }
    }
}

impl eframe::App for ViewerApp {
    fn on_exit(&mut self) {
        self.ctl.store_settings(&mut self.settings);
        self.ctl.shutdown();
        self.settings.save();
    }

    fn update(&mut self, ctx: &egui::Context, frame: &mut eframe::Frame) {
        if let Some(dir) = self.pending_dir.take() {
            self.load_dir(dir);
        }

        // Loader messages and playback ticks
        let now = Instant::now();
        self.ctl.poll(now);
        self.handle_keys(ctx);

        if self.ctl.dir() != self.title_dir.as_deref() {
            self.title_dir = self.ctl.dir().map(PathBuf::from);
            if let Some(dir) = &self.title_dir {
                ctx.send_viewport_cmd(egui::ViewportCommand::Title(format!(
                    "simview: {}",
                    dir.display()
                )));
            }
        }

        TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            self.menu_bar(ctx, ui);
        });
        TopBottomPanel::top("toolbar").show(ctx, |ui| {
            self.toolbar(ui);
        });
        TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            self.status_bar(ui);
        });
        TopBottomPanel::bottom("timeline")
            .resizable(false)
            .show(ctx, |ui| {
                self.timeline_panel(ui);
            });

        CentralPanel::default().show(ctx, |ui| {
            let render_state = frame.wgpu_render_state();
            self.viewport.show(ui, &mut self.ctl, render_state);
        });

        // Track window size for saving on exit
        ctx.input(|i| {
            if let Some(rect) = i.viewport().inner_rect {
                self.settings.window_width = rect.width();
                self.settings.window_height = rect.height();
            }
        });

        // Repaint only while something is moving
        if self.ctl.is_loading() {
            ctx.request_repaint_after(LOAD_REPAINT);
        } else if let Some(wait) = self.ctl.next_tick_in(Instant::now()) {
            ctx.request_repaint_after(wait);
        }
    }
}
