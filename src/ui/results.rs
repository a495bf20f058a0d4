//! Search result rendering

use egui::{Color32, RichText};

use crate::lookup::PillRecord;
use crate::search::SearchOutcome;

/// Render one finished search: the estimate, any warning, and the records
pub fn render_outcome(ui: &mut egui::Ui, outcome: &SearchOutcome) {
    ui.heading("Estimated result");
    ui.label(format!("Estimated shape: {}", outcome.shape));

    let imprint = if outcome.imprint.is_empty() {
        "(none)".to_string()
    } else {
        outcome.imprint.clone()
    };
    ui.label(format!("Extracted imprint: {}", imprint));

    if let Some(warning) = &outcome.ocr_warning {
        ui.horizontal(|ui| {
            ui.label(RichText::new("⚠").color(Color32::YELLOW));
            ui.label(RichText::new(warning).color(Color32::YELLOW));
        });
    }

    ui.add_space(8.0);
    ui.separator();
    ui.heading("Matching pills");

    match &outcome.records {
        Err(e) => {
            ui.horizontal(|ui| {
                ui.label(RichText::new("⚠").color(Color32::RED));
                ui.label(RichText::new(format!("Search failed: {}", e)).color(Color32::RED));
            });
        }
        Ok(records) if records.is_empty() => {
            ui.label("No matches found. Try drawing more precisely!");
        }
        Ok(records) => {
            for (idx, record) in records.iter().enumerate() {
                ui.push_id(idx, |ui| {
                    render_record(ui, record);
                });
                ui.add_space(4.0);
            }
        }
    }
}

fn render_record(ui: &mut egui::Ui, record: &PillRecord) {
    egui::Frame::group(ui.style()).show(ui, |ui| {
        ui.heading(&record.name);
        ui.label(format!("Manufacturer: {}", record.manufacturer));
        if let Some(url) = &record.image_url {
            ui.add(egui::Image::new(url.as_str()).max_width(120.0));
        }
    });
}
