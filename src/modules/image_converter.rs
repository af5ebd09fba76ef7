use eframe::egui;
use std::collections::HashMap;
use std::path::PathBuf;

use crate::format::TargetFormat;
use crate::jobs::{BlobId, Job, JobId, JobStatus, JobStore, SUPPORTED_EXTENSIONS};
use crate::preferences::ViewMode;
use crate::style::{self, PanelColors, ThemeMode};
use crate::utils::{format_kb, size_reduction_percent};

const THUMBNAIL_SIZE: u32 = 160;
const GRID_CARD_WIDTH: f32 = 190.0;

#[derive(Debug, Clone)]
pub enum ConverterAction {
    AddFiles(Vec<PathBuf>),
    SetTargetFormat(TargetFormat),
    ConvertExisting(JobId, TargetFormat),
    Remove(JobId),
    ClearAll,
    ExportAll,
    Download(JobId),
    SetViewMode(ViewMode),
}

pub struct PanelView<'a> {
    pub store: &'a JobStore,
    pub target_format: TargetFormat,
    pub view_mode: ViewMode,
    pub theme: ThemeMode,
}

struct StatusLine {
    text: String,
    is_error: bool,
}

/// Renders the job list. Owns only presentation state (thumbnails, hover,
/// status line); every change to jobs goes back out as a [`ConverterAction`].
#[derive(Default)]
pub struct ImageConverterPanel {
    thumbnails: HashMap<BlobId, Option<egui::TextureHandle>>,
    status: Option<StatusLine>,
}

impl ImageConverterPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_status(&mut self, text: impl Into<String>) {
        self.status = Some(StatusLine { text: text.into(), is_error: false });
    }

    pub fn set_error(&mut self, text: impl Into<String>) {
        self.status = Some(StatusLine { text: text.into(), is_error: true });
    }

    pub fn ui(&mut self, ui: &mut egui::Ui, ctx: &egui::Context, view: PanelView<'_>) -> Vec<ConverterAction> {
        let mut actions = Vec::new();
        self.thumbnails.retain(|blob, _| view.store.blob(*blob).is_some());

        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                ui.add_space(8.0);
                self.render_header(ui, &view);

                ui.add_space(12.0);
                self.render_controls(ui, ctx, &view, &mut actions);

                if let Some(status) = &self.status {
                    ui.add_space(8.0);
                    let colors = PanelColors::for_theme(view.theme);
                    let color = if status.is_error { colors.danger } else { colors.weak };
                    ui.label(egui::RichText::new(&status.text).size(12.0).color(color));
                }

                if !view.store.is_empty() {
                    ui.add_space(12.0);
                    self.render_view_toggle(ui, &view, &mut actions);
                    ui.add_space(8.0);
                    match view.view_mode {
                        ViewMode::List => self.render_list(ui, ctx, &view, &mut actions),
                        ViewMode::Grid => self.render_grid(ui, ctx, &view, &mut actions),
                    }
                }
                ui.add_space(16.0);
            });

        actions
    }

    fn render_header(&self, ui: &mut egui::Ui, view: &PanelView<'_>) {
        let colors = PanelColors::for_theme(view.theme);
        ui.vertical_centered(|ui| {
            ui.label(egui::RichText::new("Bulk Image Converter").size(26.0).color(colors.text));
            ui.add_space(4.0);
            ui.label(
                egui::RichText::new("Convert your images to different formats with ease")
                    .size(14.0)
                    .color(colors.weak),
            );
        });
    }

    fn render_controls(
        &mut self,
        ui: &mut egui::Ui,
        ctx: &egui::Context,
        view: &PanelView<'_>,
        actions: &mut Vec<ConverterAction>,
    ) {
        let colors = PanelColors::for_theme(view.theme);

        egui::Frame::new()
            .fill(colors.panel_bg)
            .stroke(egui::Stroke::new(1.0, colors.border))
            .corner_radius(10.0)
            .inner_margin(16.0)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    for format in TargetFormat::all() {
                        let selected = view.target_format == format;
                        let (fill, text) = if selected {
                            (colors.accent, egui::Color32::WHITE)
                        } else {
                            (colors.item_bg, colors.text)
                        };
                        let button = egui::Button::new(egui::RichText::new(format.as_str()).size(13.0).color(text))
                            .fill(fill)
                            .stroke(egui::Stroke::new(1.0, colors.border))
                            .corner_radius(6.0)
                            .min_size(egui::vec2(64.0, 30.0));
                        if ui.add(button).clicked() && !selected {
                            actions.push(ConverterAction::SetTargetFormat(format));
                        }
                    }

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if view.store.is_empty() {
                            return;
                        }
                        if view.store.has_completed() && style::primary_button(ui, "Download All").clicked() {
                            actions.push(ConverterAction::ExportAll);
                        }
                        if style::secondary_button(ui, "Clear All", view.theme).clicked() {
                            actions.push(ConverterAction::ClearAll);
                        }
                    });
                });

                ui.add_space(12.0);
                self.render_drop_zone(ui, ctx, view, actions);
            });
    }

    fn render_drop_zone(
        &self,
        ui: &mut egui::Ui,
        ctx: &egui::Context,
        view: &PanelView<'_>,
        actions: &mut Vec<ConverterAction>,
    ) {
        let colors = PanelColors::for_theme(view.theme);
        let hovering = ctx.input(|i| !i.raw.hovered_files.is_empty());
        let (fill, border) = if hovering {
            (colors.derived_bg, colors.accent)
        } else {
            (colors.item_bg, colors.border)
        };

        let (rect, response) = ui.allocate_exact_size(egui::vec2(ui.available_width(), 140.0), egui::Sense::click());
        ui.painter().rect_filled(rect, 10.0, fill);
        ui.painter()
            .rect_stroke(rect, 10.0, egui::Stroke::new(2.0, border), egui::StrokeKind::Inside);

        let headline = if hovering { "Drop images here" } else { "Drag & drop images here" };
        ui.painter().text(
            rect.center() - egui::vec2(0.0, 10.0),
            egui::Align2::CENTER_CENTER,
            headline,
            egui::FontId::proportional(16.0),
            colors.text,
        );
        ui.painter().text(
            rect.center() + egui::vec2(0.0, 14.0),
            egui::Align2::CENTER_CENTER,
            format!("or click to select files ({})", SUPPORTED_EXTENSIONS.join(", ")),
            egui::FontId::proportional(12.0),
            colors.weak,
        );

        if response.on_hover_cursor(egui::CursorIcon::PointingHand).clicked() {
            if let Some(paths) = rfd::FileDialog::new()
                .add_filter("Images", SUPPORTED_EXTENSIONS)
                .pick_files()
            {
                actions.push(ConverterAction::AddFiles(paths));
            }
        }
    }

    fn render_view_toggle(&self, ui: &mut egui::Ui, view: &PanelView<'_>, actions: &mut Vec<ConverterAction>) {
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            for (mode, label) in [(ViewMode::Grid, "Grid"), (ViewMode::List, "List")] {
                if ui.selectable_label(view.view_mode == mode, label).clicked() && view.view_mode != mode {
                    actions.push(ConverterAction::SetViewMode(mode));
                }
            }
        });
    }

    fn render_list(
        &mut self,
        ui: &mut egui::Ui,
        ctx: &egui::Context,
        view: &PanelView<'_>,
        actions: &mut Vec<ConverterAction>,
    ) {
        let colors = PanelColors::for_theme(view.theme);

        egui::Frame::new()
            .fill(colors.panel_bg)
            .stroke(egui::Stroke::new(1.0, colors.border))
            .corner_radius(10.0)
            .inner_margin(12.0)
            .show(ui, |ui| {
                egui::Grid::new("job_list")
                    .num_columns(6)
                    .striped(true)
                    .spacing(egui::vec2(18.0, 10.0))
                    .show(ui, |ui| {
                        for heading in ["FILE", "STATUS", "FORMAT", "ORIGINAL SIZE", "NEW SIZE", "ACTIONS"] {
                            ui.label(egui::RichText::new(heading).size(11.0).color(colors.weak));
                        }
                        ui.end_row();

                        for job in view.store.jobs() {
                            ui.horizontal(|ui| {
                                if job.is_derived() {
                                    ui.add_space(24.0);
                                }
                                self.render_thumbnail(ui, ctx, view.store, job, 28.0);
                                ui.label(egui::RichText::new(job.source().stem()).size(13.0).color(colors.text));
                            });
                            render_status(ui, job, view.theme);
                            ui.label(egui::RichText::new(job.target_format().as_str()).color(colors.weak));
                            ui.label(egui::RichText::new(format_kb(job.source().size_bytes())).color(colors.weak));
                            ui.label(egui::RichText::new(new_size_text(job)).color(colors.weak));
                            ui.horizontal(|ui| render_job_actions(ui, job, view.theme, actions));
                            ui.end_row();
                        }
                    });
            });
    }

    fn render_grid(
        &mut self,
        ui: &mut egui::Ui,
        ctx: &egui::Context,
        view: &PanelView<'_>,
        actions: &mut Vec<ConverterAction>,
    ) {
        let colors = PanelColors::for_theme(view.theme);

        ui.horizontal_wrapped(|ui| {
            for job in view.store.jobs() {
                let fill = if job.is_derived() { colors.derived_bg } else { colors.item_bg };
                egui::Frame::new()
                    .fill(fill)
                    .stroke(egui::Stroke::new(1.0, colors.border))
                    .corner_radius(10.0)
                    .inner_margin(10.0)
                    .show(ui, |ui| {
                        ui.set_width(GRID_CARD_WIDTH);
                        ui.vertical(|ui| {
                            ui.vertical_centered(|ui| {
                                self.render_thumbnail(ui, ctx, view.store, job, 120.0);
                            });
                            ui.label(egui::RichText::new(job.source().name()).size(13.0).color(colors.text));
                            let caption = if job.status() == JobStatus::Done {
                                format!("Converted to {}", job.target_format().as_str())
                            } else {
                                format!("Target {}", job.target_format().as_str())
                            };
                            ui.label(egui::RichText::new(caption).size(11.0).color(colors.weak));
                            render_status(ui, job, view.theme);
                            ui.label(
                                egui::RichText::new(format!(
                                    "{} → {}",
                                    format_kb(job.source().size_bytes()),
                                    new_size_text(job)
                                ))
                                .size(11.0)
                                .color(colors.weak),
                            );
                            ui.horizontal(|ui| render_job_actions(ui, job, view.theme, actions));
                        });
                    });
            }
        });
    }

    fn render_thumbnail(&mut self, ui: &mut egui::Ui, ctx: &egui::Context, store: &JobStore, job: &Job, max_side: f32) {
        let texture = self
            .thumbnails
            .entry(job.preview())
            .or_insert_with(|| load_thumbnail(ctx, store, job.preview()));
        match texture {
            Some(texture) => {
                let sized = egui::load::SizedTexture::from_handle(texture);
                ui.add(egui::Image::new(sized).max_size(egui::vec2(max_side, max_side)));
            }
            None => {
                ui.add_space(max_side);
            }
        }
    }
}

fn load_thumbnail(ctx: &egui::Context, store: &JobStore, blob: BlobId) -> Option<egui::TextureHandle> {
    let bytes = store.blob(blob)?;
    let decoded = match image::load_from_memory(&bytes) {
        Ok(img) => img,
        Err(err) => {
            tracing::debug!("No preview for blob {}: {err}", blob.raw());
            return None;
        }
    };
    let rgba = decoded.thumbnail(THUMBNAIL_SIZE, THUMBNAIL_SIZE).to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    let color_image = egui::ColorImage::from_rgba_unmultiplied(size, rgba.as_raw());
    Some(ctx.load_texture(format!("preview-{}", blob.raw()), color_image, egui::TextureOptions::LINEAR))
}

fn new_size_text(job: &Job) -> String {
    match job.result() {
        Some(result) => {
            let reduction = size_reduction_percent(job.source().size_bytes(), result.size_bytes);
            let change = if reduction >= 0 {
                format!("-{reduction}%")
            } else {
                format!("+{}%", -reduction)
            };
            format!("{} ({change})", format_kb(result.size_bytes))
        }
        None => "-".to_string(),
    }
}

fn render_status(ui: &mut egui::Ui, job: &Job, theme: ThemeMode) {
    if job.status() == JobStatus::Converting {
        ui.add(
            egui::ProgressBar::new(job.progress() as f32 / 100.0)
                .desired_width(120.0)
                .text(format!("{}%", job.progress())),
        );
        return;
    }
    let label = job.status_label();
    let (bg, fg) = style::badge_colors(label, theme);
    egui::Frame::new()
        .fill(bg)
        .corner_radius(10.0)
        .inner_margin(egui::Margin::symmetric(8, 2))
        .show(ui, |ui| {
            ui.label(egui::RichText::new(label).size(11.0).color(fg));
        });
}

fn render_job_actions(ui: &mut egui::Ui, job: &Job, theme: ThemeMode, actions: &mut Vec<ConverterAction>) {
    let colors = PanelColors::for_theme(theme);

    if job.status() == JobStatus::Done {
        if ui.button(egui::RichText::new("Download").color(colors.accent)).clicked() {
            actions.push(ConverterAction::Download(job.id().clone()));
        }
        if !job.is_derived() {
            ui.menu_button("Convert to…", |ui| {
                for format in TargetFormat::all() {
                    if format == job.target_format() {
                        continue;
                    }
                    if ui.button(format!("Convert to {}", format.as_str())).clicked() {
                        actions.push(ConverterAction::ConvertExisting(job.id().clone(), format));
                        ui.close();
                    }
                }
            });
        }
    }
    if ui.button(egui::RichText::new("Remove").color(colors.danger)).clicked() {
        actions.push(ConverterAction::Remove(job.id().clone()));
    }
}
