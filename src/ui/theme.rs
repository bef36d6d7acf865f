use eframe::egui::Color32;

pub const TEXT_COLOR: Color32 = Color32::from_rgb(0xe6, 0xe6, 0xe6);
pub const TEXT_MUTED: Color32 = Color32::from_rgb(0x9c, 0xa3, 0xaf);
pub const BTN_BG: Color32 = Color32::from_rgb(0x25, 0x28, 0x30);
pub const BTN_BORDER: Color32 = Color32::from_rgb(0x2c, 0x2f, 0x36);
pub const PANEL_BG: Color32 = Color32::from_rgb(0x1c, 0x1f, 0x2a);
pub const APP_BG: Color32 = Color32::from_rgb(0x14, 0x16, 0x1d);
pub const RED: Color32 = Color32::from_rgb(0xef, 0x44, 0x44);
pub const GREEN: Color32 = Color32::from_rgb(0x4d, 0xb8, 0x8a);

#[derive(Clone, Copy)]
pub struct ThemePalette {
    pub text: Color32,
    pub btn_bg: Color32,
    pub btn_border: Color32,
}

/// Emergency red used for the SOS button and live-call accents.
#[derive(Clone, Copy)]
pub struct AccentPalette {
    pub base: Color32,
    pub hover: Color32,
    pub ring: Color32,
    pub tint_bg: Color32,
}

pub fn theme_palette() -> ThemePalette {
    ThemePalette {
        text: TEXT_COLOR,
        btn_bg: BTN_BG,
        btn_border: BTN_BORDER,
    }
}

pub fn sos_accent() -> AccentPalette {
    AccentPalette {
        base: Color32::from_rgb(0xdc, 0x26, 0x26),
        hover: Color32::from_rgb(0xef, 0x44, 0x44),
        ring: Color32::from_rgb(0x99, 0x1b, 0x1b),
        tint_bg: Color32::from_rgb(0x3b, 0x14, 0x18),
    }
}
