use crate::app::ClashboardApp;
use crate::panels::{ACCENT, MUTED};

impl ClashboardApp {
    pub(crate) fn render_controls(&mut self, ui: &mut egui::Ui) {
        let started = self.engine.clash_started();
        let finished = self.engine.clash_finished();
        let has_players = !self.engine.players().is_empty();

        ui.horizontal(|ui| {
            if ui
                .add_enabled(!finished, egui::Button::new("Add map"))
                .clicked()
            {
                self.engine.add_map();
            }
            if ui
                .add_enabled(
                    !finished && self.engine.map_count() > 1,
                    egui::Button::new("Remove map"),
                )
                .clicked()
            {
                self.engine.remove_map();
            }

            ui.separator();

            if ui
                .add_enabled(!started, egui::Button::new("Start clash"))
                .clicked()
            {
                self.engine.start_clash();
            }
            if ui
                .add_enabled(
                    started && !finished && has_players,
                    egui::Button::new("Determine winner"),
                )
                .clicked()
            {
                self.engine.determine_winner();
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("Delete all clashes").clicked() {
                    self.confirm_delete_all = true;
                }
                ui.separator();
                match self.engine.clash_id() {
                    Some(id) if started => {
                        ui.label(egui::RichText::new(format!("Clash #{id}")).color(ACCENT));
                    }
                    _ => {
                        ui.label(egui::RichText::new("No clash running").color(MUTED));
                    }
                }
            });
        });
    }
}
