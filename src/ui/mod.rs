pub mod form_state;
pub mod formatting;
pub mod modal;
pub mod settings_panel;
pub mod theme;
pub mod widgets;

use crate::backend::BackendClient;
use crate::effects::Effects;
use crate::session::media::LocalPhoto;
use crate::session::{Action, Controller};
use crate::settings::{self, Settings};
use crate::state::AppEvent;
use eframe::egui;
use egui::{RichText, TextureHandle};
use std::path::PathBuf;
use std::sync::mpsc::{Receiver as EventReceiver, Sender as EventSender};
use std::sync::Arc;
use std::time::Duration;

use form_state::FormState;
use modal::{ModalInputs, ModalView};
use theme::*;
use widgets::*;

/// Things the user did this frame. Collected while rendering and applied
/// once the frame's borrows are released.
#[derive(Debug)]
pub enum UiIntent {
    Session(Action),
    UploadPath,
    CheckBackend,
    ToggleSettings,
    SaveSettings,
    RevertSettings,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PingState {
    NotChecked,
    Checking,
    Reply(String),
}

pub struct SosApp {
    pub event_rx: EventReceiver<AppEvent>,
    // Owns the worker threads the effects spawn onto.
    _runtime: Arc<tokio::runtime::Runtime>,
    pub settings: Settings,
    pub settings_open: bool,
    pub settings_status: Option<String>,
    pub form: FormState,
    pub controller: Controller,
    effects: Effects,
    pub inputs: ModalInputs,
    pub ping: PingState,
    /// Decoded thumbnail of the current photo, keyed by its sequence number.
    preview: Option<(u64, Option<TextureHandle>)>,
    started: std::time::Instant,
}

impl SosApp {
    pub fn new(
        event_tx: EventSender<AppEvent>,
        event_rx: EventReceiver<AppEvent>,
        runtime: Arc<tokio::runtime::Runtime>,
        backend: BackendClient,
        settings: Settings,
    ) -> Self {
        let effects = Effects::new(
            runtime.handle().clone(),
            backend,
            settings.room_url.clone(),
            event_tx,
        );
        Self {
            event_rx,
            _runtime: runtime,
            form: FormState::from_settings(&settings),
            settings,
            settings_open: false,
            settings_status: None,
            controller: Controller::new(),
            effects,
            inputs: ModalInputs::default(),
            ping: PingState::NotChecked,
            preview: None,
            started: std::time::Instant::now(),
        }
    }

    fn dispatch(&mut self, action: Action) {
        let opening = matches!(action, Action::Open) && self.controller.is_idle();
        let commands = self.controller.update(action);
        self.effects.run_all(commands);
        if opening {
            self.inputs = ModalInputs::default();
            self.settings_open = false;
        }
    }

    fn process_events(&mut self) {
        while let Ok(event) = self.event_rx.try_recv() {
            match event {
                AppEvent::PingFinished(result) => {
                    self.ping = match result {
                        Ok(message) => PingState::Reply(message),
                        Err(e) => {
                            log::warn!("[ui] backend check failed: {}", e);
                            PingState::Reply("Error talking to backend".into())
                        }
                    };
                }
                AppEvent::Session(action) => self.dispatch(action),
            }
        }
    }

    fn handle_intent(&mut self, intent: UiIntent) {
        match intent {
            UiIntent::Session(action) => self.dispatch(action),
            UiIntent::UploadPath => {
                let path = PathBuf::from(self.inputs.photo_path.trim());
                self.pick_photo(LocalPhoto::load(&path));
            }
            UiIntent::CheckBackend => {
                self.ping = PingState::Checking;
                self.effects.ping();
            }
            UiIntent::ToggleSettings => {
                self.settings_open = !self.settings_open;
                self.settings_status = None;
            }
            UiIntent::SaveSettings => self.save_settings(),
            UiIntent::RevertSettings => {
                self.form = FormState::from_settings(&self.settings);
                self.settings_status = None;
            }
        }
    }

    fn pick_photo(&mut self, loaded: Result<LocalPhoto, crate::error::ServiceError>) {
        let photo = match loaded {
            Ok(photo) => {
                self.inputs.photo_error = None;
                Some(photo)
            }
            Err(e) => {
                log::warn!("[ui] photo not usable: {}", e);
                self.inputs.photo_error = Some(e.to_string());
                None
            }
        };
        self.dispatch(Action::UploadPhoto(photo));
    }

    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        // Only the first file counts; a drop is one selection.
        let Some(file) = dropped.into_iter().next() else {
            return;
        };
        if self
            .controller
            .session()
            .and_then(|s| s.connected())
            .is_none()
        {
            return;
        }
        if let Some(path) = file.path {
            self.inputs.photo_path = path.display().to_string();
            self.pick_photo(LocalPhoto::load(&path));
        } else if let Some(bytes) = file.bytes {
            self.pick_photo(LocalPhoto::from_bytes(file.name, bytes.to_vec()));
        }
    }

    fn save_settings(&mut self) {
        if !self.controller.is_idle() || self.effects.has_room() {
            self.settings_status = Some("Close the active session before saving.".into());
            return;
        }
        let mut next = self.settings.clone();
        if let Err(e) = self.form.apply_to_settings(&mut next) {
            self.settings_status = Some(e);
            return;
        }
        let backend = match BackendClient::new(&next.backend_url, next.request_timeout()) {
            Ok(client) => client,
            Err(e) => {
                self.settings_status = Some(format!("HTTP client error: {}", e));
                return;
            }
        };
        self.effects.reconfigure(backend, next.room_url.clone());
        self.settings_status = Some(match settings::save(&next) {
            Ok(()) => "Saved".into(),
            Err(e) => {
                log::warn!("[settings] {}", e);
                format!("Applied, but not saved: {}", e)
            }
        });
        self.settings = next;
        self.form = FormState::from_settings(&self.settings);
        self.ping = PingState::NotChecked;
    }

    fn sync_preview(&mut self, ctx: &egui::Context) {
        let current = self
            .controller
            .session()
            .and_then(|s| s.connected())
            .and_then(|c| c.media.photo())
            .map(|p| (p.seq, p.local.clone()));
        let Some((seq, local)) = current else {
            self.preview = None;
            return;
        };
        if self.preview.as_ref().is_some_and(|(s, _)| *s == seq) {
            return;
        }
        let texture = match image::load_from_memory(&local.bytes) {
            Ok(img) => {
                let rgba = img.thumbnail(480, 480).to_rgba8();
                let size = [rgba.width() as usize, rgba.height() as usize];
                let color = egui::ColorImage::from_rgba_unmultiplied(size, rgba.as_raw());
                Some(ctx.load_texture(
                    format!("photo-{}", seq),
                    color,
                    egui::TextureOptions::LINEAR,
                ))
            }
            Err(e) => {
                log::debug!("[ui] no preview for {}: {}", local.file_name, e);
                None
            }
        };
        self.preview = Some((seq, texture));
    }

    fn render_home(&mut self, ui: &mut egui::Ui, intents: &mut Vec<UiIntent>) {
        let p = theme_palette();
        ui.vertical_centered(|ui| {
            ui.add_space(36.0);
            ui.label(
                RichText::new("Emergency Assistance")
                    .size(24.0)
                    .strong()
                    .color(p.text),
            );
            muted(ui, "Press SOS to talk to a support agent.");
            ui.add_space(24.0);
            if sos_button(ui, sos_accent()).clicked() {
                intents.push(UiIntent::Session(Action::Open));
            }
            ui.add_space(28.0);

            ui.horizontal(|ui| {
                let row_w = 96.0 * 2.0 + ui.spacing().item_spacing.x;
                ui.add_space(((ui.available_width() - row_w) * 0.5).max(0.0));
                let checking = self.ping == PingState::Checking;
                if action_button(ui, "Check backend", p.btn_bg, !checking).clicked() {
                    intents.push(UiIntent::CheckBackend);
                }
                let label = if self.settings_open { "Hide settings" } else { "Settings" };
                if action_button(ui, label, p.btn_bg, true).clicked() {
                    intents.push(UiIntent::ToggleSettings);
                }
            });
            match &self.ping {
                PingState::NotChecked => {}
                PingState::Checking => {
                    ui.spinner();
                }
                PingState::Reply(message) => muted(ui, message.as_str()),
            }

            if self.settings_open {
                ui.add_space(16.0);
                let dirty = self.form.is_dirty(&self.settings);
                settings_panel::render(
                    ui,
                    &mut self.form,
                    dirty,
                    self.settings_status.as_deref(),
                    intents,
                );
            }
        });
    }

    fn render_main_ui(&mut self, ctx: &egui::Context) {
        let mut intents = Vec::new();
        let frame = egui::Frame::none()
            .fill(APP_BG)
            .inner_margin(egui::Margin::same(16.0));
        egui::CentralPanel::default().frame(frame).show(ctx, |ui| {
            if self.controller.is_idle() {
                self.render_home(ui, &mut intents);
                return;
            }
            if let Some(session) = self.controller.session() {
                let view = ModalView {
                    session,
                    preview: self.preview.as_ref().and_then(|(_, t)| t.as_ref()),
                    backend_url: self.effects.backend_url(),
                    time: self.started.elapsed().as_secs_f32(),
                };
                modal::render(ui, view, &mut self.inputs, &mut intents);
            }
        });
        for intent in intents {
            self.handle_intent(intent);
        }
    }
}

impl eframe::App for SosApp {
    fn clear_color(&self, _visuals: &egui::Visuals) -> [f32; 4] {
        APP_BG.to_normalized_gamma_f32()
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_events();
        self.handle_dropped_files(ctx);
        self.sync_preview(ctx);
        self.render_main_ui(ctx);

        // Keep the agent bars moving and pick up background results.
        ctx.request_repaint_after(Duration::from_millis(33));
    }
}
