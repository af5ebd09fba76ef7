use eframe::egui;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::convert::{Converter, ImageCompressor};
use crate::export;
use crate::format::TargetFormat;
use crate::jobs::{JobId, JobStore, SourceFile, is_supported};
use crate::modules::image_converter::{ConverterAction, ImageConverterPanel, PanelView};
use crate::preferences::{KeyValueStore, Preferences, ViewMode};
use crate::style::{self, ThemeMode};

pub struct ConverterApp {
    theme_mode: ThemeMode,
    config: AppConfig,
    store: JobStore,
    converter: Converter,
    target_format: TargetFormat,
    preferences: Preferences,
    prefs_store: Box<dyn KeyValueStore>,
    panel: ImageConverterPanel,
}

impl ConverterApp {
    pub fn new(cc: &eframe::CreationContext<'_>, config: AppConfig, prefs_store: Box<dyn KeyValueStore>) -> Self {
        let theme_mode = ThemeMode::from_egui(cc.egui_ctx.theme());
        style::apply_theme(&cc.egui_ctx, theme_mode);

        let preferences = Preferences::load(prefs_store.as_ref());
        let compressor = Arc::new(ImageCompressor::new(config.compression.clone()));
        let converter = Converter::new(compressor, config.recompress_threshold_bytes);

        Self {
            theme_mode,
            target_format: config.default_format,
            config,
            store: JobStore::new(),
            converter,
            preferences,
            prefs_store,
            panel: ImageConverterPanel::new(),
        }
    }

    fn add_paths(&mut self, paths: Vec<PathBuf>) {
        let mut rejected = 0;
        for path in paths {
            if !is_supported(&path) {
                rejected += 1;
                continue;
            }
            match SourceFile::from_path(&path) {
                Ok(source) => self.start(source),
                Err(err) => {
                    tracing::warn!("{err}");
                    self.panel.set_error(err.to_string());
                }
            }
        }
        self.report_rejected(rejected);
    }

    fn add_dropped(&mut self, files: Vec<egui::DroppedFile>) {
        let mut rejected = 0;
        for file in files {
            let loaded = match (&file.bytes, &file.path) {
                (Some(bytes), _) => SourceFile::from_bytes(file.name.clone(), Arc::clone(bytes)),
                (None, Some(path)) if is_supported(path) => SourceFile::from_path(path),
                _ => {
                    rejected += 1;
                    continue;
                }
            };
            match loaded {
                Ok(source) => self.start(source),
                Err(err) => {
                    tracing::debug!("Ignoring dropped file {}: {err}", file.name);
                    rejected += 1;
                }
            }
        }
        self.report_rejected(rejected);
    }

    fn report_rejected(&mut self, rejected: usize) {
        if rejected > 0 {
            self.panel
                .set_error(format!("Ignored {rejected} file(s) that are not supported images"));
        }
    }

    fn start(&mut self, source: SourceFile) {
        tracing::info!("Queued {} for {}", source.name(), self.target_format);
        self.converter
            .convert(&mut self.store, Arc::new(source), self.target_format, None);
    }

    fn apply(&mut self, action: ConverterAction) {
        match action {
            ConverterAction::AddFiles(paths) => self.add_paths(paths),
            ConverterAction::SetTargetFormat(format) => self.target_format = format,
            ConverterAction::ConvertExisting(id, format) => {
                if self.converter.convert_existing(&mut self.store, &id, format).is_none() {
                    self.panel
                        .set_status(format!("Already a small {format}; nothing to convert"));
                }
            }
            ConverterAction::Remove(id) => self.store.remove_job(&id),
            ConverterAction::ClearAll => {
                self.store.clear_all();
                self.panel.set_status("Cleared all images");
            }
            ConverterAction::ExportAll => self.export_all(),
            ConverterAction::Download(id) => self.download(&id),
            ConverterAction::SetViewMode(mode) => self.set_view_mode(mode),
        }
    }

    fn export_all(&mut self) {
        let archive = match export::export_all(&self.store) {
            Ok(archive) => archive,
            Err(err) => {
                tracing::warn!("{err}");
                self.panel.set_error(err.to_string());
                return;
            }
        };
        let Some(path) = rfd::FileDialog::new()
            .set_file_name(&self.config.archive_name)
            .add_filter("Zip archive", &["zip"])
            .save_file()
        else {
            return;
        };
        match archive.write_to(&path) {
            Ok(()) => {
                let mut message = format!("Saved {} image(s) to {}", archive.entries.len(), path.display());
                if !archive.skipped.is_empty() {
                    message.push_str(&format!(", {} unavailable", archive.skipped.len()));
                }
                self.panel.set_status(message);
            }
            Err(err) => {
                tracing::error!("{err}");
                self.panel.set_error(err.to_string());
            }
        }
    }

    fn download(&mut self, id: &JobId) {
        let Some(job) = self.store.get(id) else { return };
        let Some(bytes) = job.result().and_then(|result| self.store.blob(result.blob)) else {
            self.panel.set_error(format!("{} has no converted output", job.source().name()));
            return;
        };
        let format = job.target_format();
        let Some(path) = rfd::FileDialog::new()
            .set_file_name(job.output_name())
            .add_filter(format.as_str(), &[format.extension()])
            .save_file()
        else {
            return;
        };
        match fs::write(&path, &bytes[..]) {
            Ok(()) => {
                tracing::info!("Saved {}", path.display());
                self.panel.set_status(format!("Saved {}", path.display()));
            }
            Err(err) => {
                tracing::error!("Failed to write {}: {err}", path.display());
                self.panel
                    .set_error(format!("Failed to write {}: {err}", path.display()));
            }
        }
    }

    fn set_view_mode(&mut self, mode: ViewMode) {
        if self.preferences.view_mode == mode {
            return;
        }
        self.preferences.view_mode = mode;
        self.preferences.save(self.prefs_store.as_ref());
    }

    fn top_bar(&mut self, ctx: &egui::Context) {
        let mut pending = Vec::new();

        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.add_space(4.0);
            egui::MenuBar::new().ui(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Add Images...").clicked() {
                        if let Some(paths) = rfd::FileDialog::new()
                            .add_filter("Images", crate::jobs::SUPPORTED_EXTENSIONS)
                            .pick_files()
                        {
                            pending.push(ConverterAction::AddFiles(paths));
                        }
                        ui.close();
                    }
                    if ui
                        .add_enabled(self.store.has_completed(), egui::Button::new("Download All"))
                        .clicked()
                    {
                        pending.push(ConverterAction::ExportAll);
                        ui.close();
                    }
                    if ui
                        .add_enabled(!self.store.is_empty(), egui::Button::new("Clear All"))
                        .clicked()
                    {
                        pending.push(ConverterAction::ClearAll);
                        ui.close();
                    }
                    ui.separator();
                    if ui.button("Exit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });

                ui.menu_button("View", |ui| {
                    for (mode, label) in [(ViewMode::List, "List"), (ViewMode::Grid, "Grid")] {
                        if ui
                            .radio(self.preferences.view_mode == mode, label)
                            .clicked()
                        {
                            pending.push(ConverterAction::SetViewMode(mode));
                            ui.close();
                        }
                    }
                });

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let in_flight = self.converter.in_flight();
                    if in_flight > 0 {
                        ui.spinner();
                        ui.label(format!("Converting {in_flight}"));
                    }
                });
            });
            ui.add_space(4.0);
        });

        for action in pending {
            self.apply(action);
        }
    }
}

impl eframe::App for ConverterApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let system_theme = ThemeMode::from_egui(ctx.theme());
        if self.theme_mode != system_theme {
            self.theme_mode = system_theme;
            style::apply_theme(ctx, self.theme_mode);
        }

        let failures = self.converter.pump(&mut self.store);
        if let Some(failure) = failures.last() {
            self.panel.set_error(format!("Failed to convert {}", failure.name));
        }

        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        if !dropped.is_empty() {
            self.add_dropped(dropped);
        }

        self.top_bar(ctx);

        let view = PanelView {
            store: &self.store,
            target_format: self.target_format,
            view_mode: self.preferences.view_mode,
            theme: self.theme_mode,
        };
        let panel = &mut self.panel;
        let actions = egui::CentralPanel::default()
            .show(ctx, |ui| panel.ui(ui, ctx, view))
            .inner;
        for action in actions {
            self.apply(action);
        }

        if self.converter.in_flight() > 0 {
            ctx.request_repaint_after(Duration::from_millis(50));
        }
    }
}
