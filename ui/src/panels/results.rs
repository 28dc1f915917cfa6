use crate::app::ClashboardApp;
use crate::panels::{ACCENT, header};
use crate::types::format_score;

impl ClashboardApp {
    /// Results dialog, open on every viewer once a winner is determined.
    pub(crate) fn render_results_window(&mut self, ctx: &egui::Context) {
        if !self.engine.show_results() {
            return;
        }
        let mut close = false;
        egui::Window::new("Results")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                match self.engine.winner() {
                    Some(winner) => {
                        ui.label(
                            egui::RichText::new(format!("Winner: {}", winner.name))
                                .size(20.0)
                                .strong()
                                .color(ACCENT),
                        );
                        ui.label(format!("Score: {}", self.engine.total_score(winner)));
                    }
                    None => {
                        ui.label("No winner.");
                    }
                }
                ui.add_space(8.0);

                egui::Grid::new("results_grid").striped(true).show(ui, |ui| {
                    header(ui, "#");
                    header(ui, "Player");
                    header(ui, "Score");
                    ui.end_row();
                    for (pos, (player, score)) in self.engine.ranked_players().into_iter().enumerate() {
                        ui.label(format!("{}", pos + 1));
                        ui.label(&player.name);
                        ui.label(format_score(score));
                        ui.end_row();
                    }
                });

                ui.add_space(8.0);
                if ui.button("Close").clicked() {
                    close = true;
                }
            });
        if close {
            self.engine.close_results();
        }
    }
}
