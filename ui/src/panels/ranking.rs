use crate::app::ClashboardApp;
use crate::panels::{MUTED, header};
use crate::types::format_score;

impl ClashboardApp {
    pub(crate) fn render_ranking_panel(&mut self, ui: &mut egui::Ui) {
        if ui.button("Refresh").clicked() {
            self.engine.fetch_ranking();
        }
        ui.separator();

        if self.engine.ranking().is_empty() {
            ui.label(egui::RichText::new("No ranking available.").color(MUTED));
            return;
        }

        egui::ScrollArea::vertical().auto_shrink(false).show(ui, |ui| {
            egui::Grid::new("ranking_grid")
                .striped(true)
                .min_col_width(45.0)
                .show(ui, |ui| {
                    header(ui, "#");
                    header(ui, "Player");
                    header(ui, "Points");
                    ui.end_row();
                    for (pos, entry) in self.engine.ranking().iter().enumerate() {
                        ui.label(format!("{}", pos + 1));
                        ui.label(&entry.name);
                        ui.label(format_score(entry.points));
                        ui.end_row();
                    }
                });
        });
    }
}
