use eframe::egui;
use egui::{pos2, vec2, Color32, CursorIcon, FontId, Rect, Sense, Stroke};

use crate::room::AgentState;

use super::theme::*;

/// Large round SOS trigger shown on the home screen.
pub fn sos_button(ui: &mut egui::Ui, accent: AccentPalette) -> egui::Response {
    let size = 148.0;
    let radius = size / 2.0;
    let (rect, response) = ui.allocate_exact_size(vec2(size, size), Sense::click());

    if ui.is_rect_visible(rect) {
        let center = rect.center();
        let hovered = response.hovered();
        let (fill, ring) = if hovered {
            (accent.hover, accent.base)
        } else {
            (accent.base, accent.ring)
        };

        ui.painter()
            .circle_filled(center, radius, accent.tint_bg);
        ui.painter()
            .circle_stroke(center, radius - 6.0, Stroke::new(3.0, ring));
        ui.painter().circle_filled(center, radius - 12.0, fill);
        ui.painter().text(
            center,
            egui::Align2::CENTER_CENTER,
            "SOS",
            FontId::proportional(40.0),
            Color32::WHITE,
        );
    }

    response.on_hover_cursor(CursorIcon::PointingHand)
}

pub fn close_button(ui: &mut egui::Ui) -> egui::Response {
    let size = vec2(28.0, 28.0);
    let (rect, response) = ui.allocate_exact_size(size, Sense::click());
    if ui.is_rect_visible(rect) {
        let fill = if response.hovered() {
            Color32::from_rgb(0x2d, 0x31, 0x3c)
        } else {
            BTN_BG
        };
        ui.painter()
            .rect(rect, 6.0, fill, Stroke::new(1.0, BTN_BORDER));
        // Font-independent cross.
        let c = rect.center();
        let d = 5.5;
        let stroke = Stroke::new(1.6, TEXT_COLOR);
        ui.painter()
            .line_segment([c + vec2(-d, -d), c + vec2(d, d)], stroke);
        ui.painter()
            .line_segment([c + vec2(-d, d), c + vec2(d, -d)], stroke);
    }
    response.on_hover_cursor(CursorIcon::PointingHand)
}

/// Filled pill button. Disabled buttons keep their label but go gray.
pub fn action_button(
    ui: &mut egui::Ui,
    label: &str,
    fill: Color32,
    enabled: bool,
) -> egui::Response {
    let text = egui::RichText::new(label).size(13.0).color(if enabled {
        Color32::WHITE
    } else {
        TEXT_MUTED
    });
    let fill = if enabled { fill } else { BTN_BG };
    let button = egui::Button::new(text)
        .fill(fill)
        .stroke(Stroke::new(1.0, BTN_BORDER))
        .rounding(6.0)
        .min_size(vec2(96.0, 30.0));
    let response = ui.add_enabled(enabled, button);
    if enabled {
        response.on_hover_cursor(CursorIcon::PointingHand)
    } else {
        response
    }
}

/// Seven-bar agent visualizer. Bars sway while the agent speaks, pulse
/// gently while it thinks and sit low otherwise.
pub fn draw_agent_bars(
    painter: &egui::Painter,
    rect: Rect,
    t: f32,
    state: AgentState,
    accent: AccentPalette,
) {
    let bar_count = 7usize;
    let gap = 6.0;
    let bar_w = ((rect.width() - gap * (bar_count as f32 - 1.0)) / bar_count as f32)
        .clamp(3.0, 14.0);
    let total_w = bar_w * bar_count as f32 + gap * (bar_count as f32 - 1.0);
    let left = rect.center().x - total_w * 0.5;

    let (amp, speed, color) = match state {
        AgentState::Speaking => (0.85, 7.0, accent.base),
        AgentState::Thinking => (0.35, 2.2, accent.hover),
        AgentState::Listening => (0.18, 1.4, Color32::from_rgb(184, 192, 204)),
        AgentState::Initializing | AgentState::Disconnected => {
            (0.0, 0.0, Color32::from_rgb(0x4a, 0x4d, 0x55))
        }
    };

    for i in 0..bar_count {
        let nx = i as f32 / (bar_count - 1) as f32;
        // Taper toward the edges so the middle bar leads.
        let envelope = (std::f32::consts::PI * (0.1 + nx * 0.8)).sin();
        let wave = ((t * speed) + i as f32 * 0.9).sin() * 0.5 + 0.5;
        let level = 0.12 + amp * envelope * wave;
        let h = (level * rect.height()).max(bar_w);
        let x = left + i as f32 * (bar_w + gap);
        let y = rect.center().y - h * 0.5;
        painter.rect_filled(
            Rect::from_min_size(pos2(x, y), vec2(bar_w, h)),
            bar_w * 0.5,
            color,
        );
    }
}

pub fn section_header(ui: &mut egui::Ui, text: &str) {
    let p = theme_palette();
    ui.add_space(4.0);
    let rect = ui.available_rect_before_wrap();
    ui.painter().line_segment(
        [
            pos2(rect.min.x, rect.min.y),
            pos2(rect.max.x, rect.min.y),
        ],
        Stroke::new(0.5, p.btn_border),
    );
    ui.add_space(4.0);
    ui.label(
        egui::RichText::new(text)
            .size(11.0)
            .strong()
            .color(TEXT_MUTED),
    );
}

pub fn muted(ui: &mut egui::Ui, text: impl Into<String>) {
    ui.label(egui::RichText::new(text).size(12.0).color(TEXT_MUTED));
}
