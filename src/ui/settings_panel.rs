use eframe::egui;
use egui::RichText;

use super::form_state::FormState;
use super::theme::*;
use super::widgets::*;
use super::UiIntent;

fn field(ui: &mut egui::Ui, label: &str, value: &mut String, hint: &str) {
    ui.label(RichText::new(label).size(12.0).color(TEXT_MUTED));
    ui.add(
        egui::TextEdit::singleline(value)
            .hint_text(hint)
            .desired_width(f32::INFINITY),
    );
    ui.add_space(6.0);
}

pub fn render(
    ui: &mut egui::Ui,
    form: &mut FormState,
    dirty: bool,
    status: Option<&str>,
    intents: &mut Vec<UiIntent>,
) {
    egui::Frame::none()
        .fill(PANEL_BG)
        .stroke(egui::Stroke::new(1.0, BTN_BORDER))
        .rounding(8.0)
        .inner_margin(egui::Margin::same(12.0))
        .show(ui, |ui| {
            ui.set_max_width(420.0);
            section_header(ui, "CONNECTION");
            field(ui, "Backend URL", &mut form.backend_url, "http://127.0.0.1:5000");
            field(ui, "Room server URL", &mut form.room_url, "ws://127.0.0.1:7880");
            field(
                ui,
                "Request timeout (seconds)",
                &mut form.request_timeout_secs,
                "15",
            );
            ui.horizontal(|ui| {
                if action_button(ui, "Save", sos_accent().base, dirty).clicked() {
                    intents.push(UiIntent::SaveSettings);
                }
                if action_button(ui, "Revert", BTN_BG, dirty).clicked() {
                    intents.push(UiIntent::RevertSettings);
                }
            });
            if let Some(status) = status {
                ui.add_space(4.0);
                muted(ui, status);
            }
        });
}
