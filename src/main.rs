#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod backend;
mod effects;
mod error;
mod room;
mod session;
mod settings;
mod state;
mod ui;

use backend::BackendClient;
use eframe::egui;
use egui::{vec2, ViewportBuilder};
use state::AppEvent;
use std::sync::Arc;

fn main() {
    env_logger::init();

    let settings = settings::load();
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => Arc::new(rt),
        Err(e) => {
            log::error!("[sos] failed to create tokio runtime: {}", e);
            std::process::exit(1);
        }
    };
    let backend = match BackendClient::new(&settings.backend_url, settings.request_timeout()) {
        Ok(client) => client,
        Err(e) => {
            log::error!("[sos] failed to build HTTP client: {}", e);
            std::process::exit(1);
        }
    };
    let (event_tx, event_rx) = std::sync::mpsc::channel::<AppEvent>();
    log::info!(
        "[sos] backend={} room={}",
        settings.backend_url,
        settings.room_url
    );

    let native_options = eframe::NativeOptions {
        viewport: ViewportBuilder::default()
            .with_title("SOS Assist")
            .with_inner_size(vec2(960.0, 660.0))
            .with_min_inner_size(vec2(480.0, 380.0))
            .with_drag_and_drop(true),
        ..Default::default()
    };

    let result = eframe::run_native(
        "SOS Assist",
        native_options,
        Box::new(move |cc| {
            cc.egui_ctx.set_visuals(egui::Visuals::dark());
            Ok(Box::new(ui::SosApp::new(
                event_tx, event_rx, runtime, backend, settings,
            )))
        }),
    );
    if let Err(e) = result {
        log::error!("[sos] eframe exited with error: {}", e);
        std::process::exit(1);
    }
}
