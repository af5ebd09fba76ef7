use eframe::egui;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ThemeMode {
    Light,
    Dark,
}

impl ThemeMode {
    pub fn from_egui(theme: egui::Theme) -> Self {
        match theme {
            egui::Theme::Dark => ThemeMode::Dark,
            egui::Theme::Light => ThemeMode::Light,
        }
    }
}

pub struct ColorPalette;

impl ColorPalette {
    pub const BLUE_50: egui::Color32 = egui::Color32::from_rgb(239, 246, 255);
    pub const BLUE_400: egui::Color32 = egui::Color32::from_rgb(96, 165, 250);
    pub const BLUE_500: egui::Color32 = egui::Color32::from_rgb(59, 130, 246);
    pub const BLUE_600: egui::Color32 = egui::Color32::from_rgb(37, 99, 235);
    pub const BLUE_700: egui::Color32 = egui::Color32::from_rgb(29, 78, 216);

    pub const GRAY_50: egui::Color32 = egui::Color32::from_rgb(249, 250, 251);
    pub const GRAY_100: egui::Color32 = egui::Color32::from_rgb(243, 244, 246);
    pub const GRAY_200: egui::Color32 = egui::Color32::from_rgb(229, 231, 235);
    pub const GRAY_300: egui::Color32 = egui::Color32::from_rgb(209, 213, 219);
    pub const GRAY_400: egui::Color32 = egui::Color32::from_rgb(156, 163, 175);
    pub const GRAY_500: egui::Color32 = egui::Color32::from_rgb(107, 114, 128);
    pub const GRAY_600: egui::Color32 = egui::Color32::from_rgb(75, 85, 99);
    pub const GRAY_700: egui::Color32 = egui::Color32::from_rgb(55, 65, 81);
    pub const GRAY_800: egui::Color32 = egui::Color32::from_rgb(31, 41, 55);
    pub const GRAY_900: egui::Color32 = egui::Color32::from_rgb(17, 24, 39);

    pub const GREEN_100: egui::Color32 = egui::Color32::from_rgb(220, 252, 231);
    pub const GREEN_200: egui::Color32 = egui::Color32::from_rgb(187, 247, 208);
    pub const GREEN_800: egui::Color32 = egui::Color32::from_rgb(22, 101, 52);
    pub const GREEN_900: egui::Color32 = egui::Color32::from_rgb(20, 83, 45);

    pub const RED_100: egui::Color32 = egui::Color32::from_rgb(254, 226, 226);
    pub const RED_200: egui::Color32 = egui::Color32::from_rgb(254, 202, 202);
    pub const RED_400: egui::Color32 = egui::Color32::from_rgb(248, 113, 113);
    pub const RED_600: egui::Color32 = egui::Color32::from_rgb(220, 38, 38);
    pub const RED_800: egui::Color32 = egui::Color32::from_rgb(153, 27, 27);
    pub const RED_900: egui::Color32 = egui::Color32::from_rgb(127, 29, 29);
}

#[derive(Debug, Clone, Copy)]
pub struct PanelColors {
    pub panel_bg: egui::Color32,
    pub item_bg: egui::Color32,
    pub derived_bg: egui::Color32,
    pub border: egui::Color32,
    pub text: egui::Color32,
    pub weak: egui::Color32,
    pub accent: egui::Color32,
    pub danger: egui::Color32,
}

impl PanelColors {
    pub fn for_theme(theme: ThemeMode) -> Self {
        match theme {
            ThemeMode::Dark => Self {
                panel_bg: ColorPalette::GRAY_800,
                item_bg: ColorPalette::GRAY_900,
                derived_bg: egui::Color32::from_rgb(36, 46, 62),
                border: ColorPalette::GRAY_700,
                text: ColorPalette::GRAY_200,
                weak: ColorPalette::GRAY_400,
                accent: ColorPalette::BLUE_400,
                danger: ColorPalette::RED_400,
            },
            ThemeMode::Light => Self {
                panel_bg: egui::Color32::WHITE,
                item_bg: egui::Color32::WHITE,
                derived_bg: ColorPalette::BLUE_50,
                border: ColorPalette::GRAY_300,
                text: ColorPalette::GRAY_900,
                weak: ColorPalette::GRAY_500,
                accent: ColorPalette::BLUE_600,
                danger: ColorPalette::RED_600,
            },
        }
    }
}

pub fn badge_colors(label: &str, theme: ThemeMode) -> (egui::Color32, egui::Color32) {
    let dark = matches!(theme, ThemeMode::Dark);
    match label {
        "Done" if dark => (ColorPalette::GREEN_900, ColorPalette::GREEN_200),
        "Done" => (ColorPalette::GREEN_100, ColorPalette::GREEN_800),
        "Error" if dark => (ColorPalette::RED_900, ColorPalette::RED_200),
        "Error" => (ColorPalette::RED_100, ColorPalette::RED_800),
        _ if dark => (ColorPalette::GRAY_700, ColorPalette::GRAY_200),
        _ => (ColorPalette::GRAY_100, ColorPalette::GRAY_800),
    }
}

pub fn apply_theme(ctx: &egui::Context, theme: ThemeMode) {
    let mut style = (*ctx.style()).clone();

    style.visuals.widgets.noninteractive.corner_radius = egui::CornerRadius::same(6);
    style.visuals.widgets.inactive.corner_radius = egui::CornerRadius::same(6);
    style.visuals.widgets.hovered.corner_radius = egui::CornerRadius::same(6);
    style.visuals.widgets.active.corner_radius = egui::CornerRadius::same(6);

    style.spacing.item_spacing = egui::vec2(8.0, 8.0);
    style.spacing.button_padding = egui::vec2(12.0, 6.0);

    match theme {
        ThemeMode::Dark => {
            style.visuals.dark_mode = true;
            style.visuals.panel_fill = ColorPalette::GRAY_900;
            style.visuals.window_fill = ColorPalette::GRAY_800;
            style.visuals.faint_bg_color = ColorPalette::GRAY_800;
            style.visuals.widgets.inactive.weak_bg_fill = ColorPalette::GRAY_700;
            style.visuals.widgets.hovered.weak_bg_fill = ColorPalette::GRAY_600;
            style.visuals.widgets.inactive.fg_stroke = egui::Stroke::new(1.0, ColorPalette::GRAY_200);
            style.visuals.selection.bg_fill = ColorPalette::BLUE_500;
            style.visuals.hyperlink_color = ColorPalette::BLUE_400;
        }
        ThemeMode::Light => {
            style.visuals.dark_mode = false;
            style.visuals.panel_fill = ColorPalette::GRAY_100;
            style.visuals.window_fill = egui::Color32::WHITE;
            style.visuals.faint_bg_color = ColorPalette::GRAY_50;
            style.visuals.widgets.inactive.weak_bg_fill = ColorPalette::GRAY_200;
            style.visuals.widgets.hovered.weak_bg_fill = ColorPalette::GRAY_300;
            style.visuals.widgets.inactive.fg_stroke = egui::Stroke::new(1.0, ColorPalette::GRAY_800);
            style.visuals.selection.bg_fill = ColorPalette::BLUE_600;
            style.visuals.hyperlink_color = ColorPalette::BLUE_600;
        }
    }

    ctx.set_style(style);
}

pub fn primary_button(ui: &mut egui::Ui, text: &str) -> egui::Response {
    ui.scope(|ui| {
        let style = ui.style_mut();
        for widget in [
            &mut style.visuals.widgets.inactive,
            &mut style.visuals.widgets.hovered,
            &mut style.visuals.widgets.active,
        ] {
            widget.fg_stroke = egui::Stroke::new(1.0, egui::Color32::WHITE);
            widget.bg_stroke = egui::Stroke::NONE;
        }
        style.visuals.widgets.inactive.weak_bg_fill = ColorPalette::BLUE_600;
        style.visuals.widgets.hovered.weak_bg_fill = ColorPalette::BLUE_500;
        style.visuals.widgets.active.weak_bg_fill = ColorPalette::BLUE_700;

        let button = egui::Button::new(egui::RichText::new(text).size(14.0))
            .min_size(egui::vec2(130.0, 34.0));
        ui.add(button)
    })
    .inner
}

pub fn secondary_button(ui: &mut egui::Ui, text: &str, theme: ThemeMode) -> egui::Response {
    let colors = PanelColors::for_theme(theme);
    let button = egui::Button::new(egui::RichText::new(text).size(14.0).color(colors.text))
        .fill(colors.panel_bg)
        .stroke(egui::Stroke::new(1.0, colors.border))
        .min_size(egui::vec2(110.0, 34.0));
    ui.add(button)
}
