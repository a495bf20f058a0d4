//! Application window
//!
//! Single-window egui app: the sketch canvas on top, search controls, and
//! the result panel below. One click on Search runs the whole pipeline to
//! completion before the next frame renders the outcome.

pub mod canvas;
pub mod results;

use eframe::egui;
use tracing::error;

use crate::config::AppConfig;
use crate::search::{SearchOutcome, SearchPipeline};
use canvas::SketchCanvas;

/// The pillfinder application window
pub struct SketchApp {
    canvas: SketchCanvas,
    pipeline: Option<SearchPipeline>,
    pipeline_error: Option<String>,
    outcome: Option<SearchOutcome>,
    blank_notice: bool,
}

impl SketchApp {
    /// Create the app, building the pipeline from configuration
    pub fn new(config: AppConfig) -> Self {
        let canvas = SketchCanvas::new(&config.canvas);

        let (pipeline, pipeline_error) = match SearchPipeline::from_config(&config) {
            Ok(pipeline) => (Some(pipeline), None),
            Err(e) => {
                error!("Failed to build search pipeline: {}", e);
                (None, Some(format!("Search is unavailable: {}", e)))
            }
        };

        Self {
            canvas,
            pipeline,
            pipeline_error,
            outcome: None,
            blank_notice: false,
        }
    }

    /// Create eframe options for the main window
    pub fn options() -> eframe::NativeOptions {
        eframe::NativeOptions {
            viewport: egui::ViewportBuilder::default()
                .with_inner_size([420.0, 760.0])
                .with_min_inner_size([360.0, 560.0])
                .with_title("pillfinder"),
            ..Default::default()
        }
    }

    fn run_search(&mut self) {
        if self.canvas.is_blank() {
            self.blank_notice = true;
            self.outcome = None;
            return;
        }
        self.blank_notice = false;

        if let Some(pipeline) = &self.pipeline {
            let sketch = self.canvas.rasterize();
            self.outcome = Some(pipeline.run(&sketch));
        }
    }
}

impl eframe::App for SketchApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::Frame::none().inner_margin(16.0).show(ui, |ui| {
                ui.heading("Draw the pill's shape and imprint");
                ui.add_space(8.0);

                self.canvas.ui(ui);
                ui.add_space(8.0);

                ui.horizontal(|ui| {
                    let search_enabled = self.pipeline.is_some();
                    if ui
                        .add_enabled(search_enabled, egui::Button::new("🔍 Search"))
                        .clicked()
                    {
                        self.run_search();
                    }
                    if ui.button("Clear").clicked() {
                        self.canvas.clear();
                        self.outcome = None;
                        self.blank_notice = false;
                    }
                });

                if let Some(error) = &self.pipeline_error {
                    ui.colored_label(egui::Color32::RED, error);
                }
                if self.blank_notice {
                    ui.label("Draw the pill first!");
                }

                if let Some(outcome) = &self.outcome {
                    ui.add_space(8.0);
                    ui.separator();
                    egui::ScrollArea::vertical().show(ui, |ui| {
                        results::render_outcome(ui, outcome);
                    });
                }
            });
        });
    }
}

/// Run the application window (blocking)
pub fn run_app(config: AppConfig) -> Result<(), eframe::Error> {
    let app = SketchApp::new(config);
    eframe::run_native(
        "pillfinder",
        SketchApp::options(),
        Box::new(|cc| {
            // Needed so result photos can be loaded straight from their URLs
            egui_extras::install_image_loaders(&cc.egui_ctx);
            Ok(Box::new(app))
        }),
    )
}
