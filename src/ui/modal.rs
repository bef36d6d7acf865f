use eframe::egui;
use egui::{vec2, Color32, RichText, TextureHandle};

use crate::session::location::LocationStatus;
use crate::session::media::{IncidentPhoto, MediaFlow, PhotoStatus, ShareStatus};
use crate::session::{Action, ConnectedSession, ConnectionPhase, RoomStatus, Session};

use super::formatting::{fmt_bytes, fmt_clock, resolve_link};
use super::theme::*;
use super::widgets::*;
use super::UiIntent;

/// Text the user is typing inside the support modal. Cleared whenever a new
/// session opens.
#[derive(Debug, Default)]
pub struct ModalInputs {
    pub name: String,
    pub photo_path: String,
    pub photo_error: Option<String>,
}

pub struct ModalView<'a> {
    pub session: &'a Session,
    pub preview: Option<&'a TextureHandle>,
    pub backend_url: &'a str,
    pub time: f32,
}

pub fn render(
    ui: &mut egui::Ui,
    view: ModalView<'_>,
    inputs: &mut ModalInputs,
    intents: &mut Vec<UiIntent>,
) {
    let p = theme_palette();
    ui.horizontal(|ui| {
        ui.label(RichText::new("SOS Support").size(18.0).strong().color(p.text));
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if close_button(ui).on_hover_text("Close").clicked() {
                intents.push(UiIntent::Session(Action::Close));
            }
        });
    });
    ui.add_space(8.0);

    match &view.session.phase {
        ConnectionPhase::AwaitingName => name_form(ui, inputs, intents),
        ConnectionPhase::AcquiringCredential => {
            ui.vertical_centered(|ui| {
                ui.add_space(48.0);
                ui.spinner();
                ui.add_space(8.0);
                muted(ui, format!("Connecting {}...", view.session.display_name));
            });
        }
        ConnectionPhase::Connected(connected) => {
            ui.columns(2, |cols| {
                voice_pane(&mut cols[0], connected, view.time, intents);
                cols[1].vertical(|ui| {
                    location_pane(ui, connected, view.backend_url);
                    ui.add_space(12.0);
                    photo_pane(
                        ui,
                        &connected.media,
                        view.preview,
                        view.backend_url,
                        inputs,
                        intents,
                    );
                });
            });
        }
    }
}

fn name_form(ui: &mut egui::Ui, inputs: &mut ModalInputs, intents: &mut Vec<UiIntent>) {
    ui.vertical_centered(|ui| {
        ui.add_space(40.0);
        ui.label(
            RichText::new("Enter your name to connect with support")
                .size(15.0)
                .color(TEXT_COLOR),
        );
        ui.add_space(10.0);
        let edit = ui.add(
            egui::TextEdit::singleline(&mut inputs.name)
                .hint_text("Your name")
                .desired_width(260.0),
        );
        let submitted = edit.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
        ui.add_space(10.0);
        ui.horizontal(|ui| {
            // Center the two buttons under the field.
            let row_w = 96.0 * 2.0 + ui.spacing().item_spacing.x;
            ui.add_space(((ui.available_width() - row_w) * 0.5).max(0.0));
            let has_name = !inputs.name.trim().is_empty();
            let connect = action_button(ui, "Connect", sos_accent().base, has_name);
            if (connect.clicked() || submitted) && has_name {
                intents.push(UiIntent::Session(Action::SubmitName(inputs.name.clone())));
            }
            if action_button(ui, "Cancel", BTN_BG, true).clicked() {
                intents.push(UiIntent::Session(Action::Close));
            }
        });
    });
}

fn pane_frame() -> egui::Frame {
    egui::Frame::none()
        .fill(PANEL_BG)
        .stroke(egui::Stroke::new(1.0, BTN_BORDER))
        .rounding(8.0)
        .inner_margin(egui::Margin::same(12.0))
}

fn voice_pane(
    ui: &mut egui::Ui,
    connected: &ConnectedSession,
    time: f32,
    intents: &mut Vec<UiIntent>,
) {
    pane_frame().show(ui, |ui| {
        ui.set_min_height(ui.available_height());
        ui.horizontal(|ui| {
            ui.label(RichText::new("Voice Assistant").size(14.0).strong());
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let status = match connected.room {
                    RoomStatus::Joining => "Joining room...",
                    RoomStatus::Joined => connected.agent_state.label(),
                };
                muted(ui, status);
            });
        });

        let (rect, _) =
            ui.allocate_exact_size(vec2(ui.available_width(), 56.0), egui::Sense::hover());
        draw_agent_bars(
            ui.painter(),
            rect.shrink2(vec2(rect.width() * 0.3, 4.0)),
            time,
            connected.agent_state,
            sos_accent(),
        );

        section_header(ui, "TRANSCRIPT");
        let list_h = (ui.available_height() - 48.0).max(80.0);
        egui::ScrollArea::vertical()
            .id_salt("transcript")
            .max_height(list_h)
            .stick_to_bottom(true)
            .auto_shrink([false, false])
            .show(ui, |ui| {
                if connected.transcript.is_empty() {
                    muted(ui, "Waiting for transcripts...");
                    return;
                }
                for (index, entry) in connected.transcript.entries().iter().enumerate() {
                    ui.push_id(entry.display_key(index), |ui| {
                        ui.horizontal_wrapped(|ui| {
                            ui.label(
                                RichText::new(fmt_clock(entry.received_at))
                                    .size(11.0)
                                    .color(TEXT_MUTED),
                            );
                            ui.label(RichText::new(entry.speaker.label()).strong());
                            ui.label(&entry.text);
                        });
                    });
                }
            });

        ui.add_space(8.0);
        ui.horizontal(|ui| {
            let (label, fill) = if connected.microphone_enabled {
                ("Mute", BTN_BG)
            } else {
                ("Unmute", Color32::from_rgb(0x7c, 0x2d, 0x12))
            };
            let joined = connected.room == RoomStatus::Joined;
            if action_button(ui, label, fill, joined).clicked() {
                intents.push(UiIntent::Session(Action::ToggleMicrophone));
            }
            if action_button(ui, "Disconnect", RED, true).clicked() {
                intents.push(UiIntent::Session(Action::Close));
            }
        });
    });
}

fn location_pane(ui: &mut egui::Ui, connected: &ConnectedSession, backend_url: &str) {
    pane_frame().show(ui, |ui| {
        ui.set_width(ui.available_width());
        ui.label(RichText::new("Live Location").size(14.0).strong());
        ui.add_space(4.0);
        match connected.location.status() {
            LocationStatus::Loading => {
                ui.horizontal(|ui| {
                    ui.spinner();
                    muted(ui, "Loading map...");
                });
            }
            LocationStatus::Loaded(snapshot) => {
                if let Some(coords) = snapshot.coordinates_label() {
                    ui.label(coords);
                }
                match snapshot.map_url.as_deref().filter(|_| snapshot.is_available()) {
                    Some(url) => {
                        ui.hyperlink_to("Open live map", resolve_link(backend_url, url));
                    }
                    None => muted(ui, "Location unavailable."),
                }
            }
        }
    });
}

fn photo_pane(
    ui: &mut egui::Ui,
    media: &MediaFlow,
    preview: Option<&TextureHandle>,
    backend_url: &str,
    inputs: &mut ModalInputs,
    intents: &mut Vec<UiIntent>,
) {
    pane_frame().show(ui, |ui| {
        ui.set_width(ui.available_width());
        ui.label(RichText::new("Incident Photo").size(14.0).strong());
        ui.add_space(4.0);

        ui.horizontal(|ui| {
            ui.add(
                egui::TextEdit::singleline(&mut inputs.photo_path)
                    .hint_text("Image path, or drop a file on the window")
                    .desired_width(ui.available_width() - 4.0),
            );
        });
        ui.add_space(6.0);
        ui.horizontal(|ui| {
            let uploading = media.is_uploading();
            let label = if uploading { "Uploading..." } else { "Upload Photo" };
            let can_upload = !uploading && !inputs.photo_path.trim().is_empty();
            if action_button(ui, label, BTN_BG, can_upload).clicked() {
                intents.push(UiIntent::UploadPath);
            }
            let label = if media.is_sharing() { "Sharing..." } else { "Share Photo" };
            if action_button(ui, label, sos_accent().base, media.can_share()).clicked() {
                intents.push(UiIntent::Session(Action::SharePhoto));
            }
        });
        if let Some(err) = &inputs.photo_error {
            ui.label(RichText::new(err).size(12.0).color(RED));
        }
        ui.add_space(8.0);

        let Some(photo) = media.photo() else {
            muted(ui, "Upload an image of the incident.");
            return;
        };
        ui.horizontal(|ui| {
            ui.label(RichText::new(&photo.local.file_name).strong());
            muted(ui, fmt_bytes(photo.local.bytes.len() as u64));
        });
        if let Some(texture) = preview {
            ui.add(
                egui::Image::new(texture)
                    .max_width(ui.available_width())
                    .max_height(200.0)
                    .rounding(6.0),
            );
        }
        match &photo.status {
            PhotoStatus::Uploading => {}
            PhotoStatus::UploadFailed => {
                ui.label(RichText::new("Upload failed. Try again.").size(12.0).color(RED));
            }
            PhotoStatus::Uploaded {
                analysis, share, ..
            } => {
                if let Some(analysis) = analysis {
                    section_header(ui, "INCIDENT NOTE");
                    ui.label(RichText::new(analysis).size(12.0));
                }
                if *share == ShareStatus::Shared {
                    ui.add_space(6.0);
                    ui.label(
                        RichText::new("Shared with first responders")
                            .strong()
                            .color(GREEN),
                    );
                    if let Some(url) = shared_photo_link(backend_url, photo) {
                        muted(ui, "Realtime photo has been delivered.");
                        ui.hyperlink_to("View shared photo", url);
                    }
                }
            }
        }
    });
}

/// Upload URLs may come back relative to the backend, like the map page.
fn shared_photo_link(backend_url: &str, photo: &IncidentPhoto) -> Option<String> {
    photo.shared_url().map(|url| resolve_link(backend_url, url))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::media::LocalPhoto;

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

    fn photo_with(url: &str, share: ShareStatus) -> IncidentPhoto {
        IncidentPhoto {
            seq: 1,
            local: LocalPhoto::from_bytes("crash.png".into(), PNG_MAGIC.to_vec()).unwrap(),
            status: PhotoStatus::Uploaded {
                url: url.into(),
                analysis: None,
                share,
            },
        }
    }

    #[test]
    fn relative_shared_photo_links_point_at_backend() {
        let photo = photo_with("/uploads/abc.png", ShareStatus::Shared);
        assert_eq!(
            shared_photo_link("http://127.0.0.1:5000/", &photo).as_deref(),
            Some("http://127.0.0.1:5000/uploads/abc.png")
        );
    }

    #[test]
    fn absolute_shared_photo_links_are_kept() {
        let photo = photo_with("http://10.0.0.2:5000/uploads/abc.png", ShareStatus::Shared);
        assert_eq!(
            shared_photo_link("http://127.0.0.1:5000", &photo).as_deref(),
            Some("http://10.0.0.2:5000/uploads/abc.png")
        );
    }

    #[test]
    fn unshared_photo_has_no_link() {
        let photo = photo_with("/uploads/abc.png", ShareStatus::NotShared);
        assert_eq!(shared_photo_link("http://127.0.0.1:5000", &photo), None);
    }
}
