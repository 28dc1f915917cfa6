use crate::app::ClashboardApp;
use crate::panels::{ACCENT, MUTED};
use crate::types::PlayerId;

impl ClashboardApp {
    pub(crate) fn render_roster_panel(&mut self, ui: &mut egui::Ui) {
        let started = self.engine.clash_started();

        ui.label(egui::RichText::new("Players").strong().color(ACCENT));
        ui.horizontal(|ui| {
            let resp = ui.add_enabled(
                !started,
                egui::TextEdit::singleline(&mut self.new_player_name)
                    .hint_text("New player")
                    .desired_width(130.0),
            );
            let submitted = resp.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            let can_add = !started && !self.new_player_name.trim().is_empty();
            if ui.add_enabled(can_add, egui::Button::new("Add")).clicked() || (submitted && can_add)
            {
                self.engine.add_player_to_roster(&self.new_player_name);
                self.new_player_name.clear();
            }
        });
        ui.separator();

        let mut enter: Option<PlayerId> = None;
        let mut delete: Option<PlayerId> = None;

        egui::ScrollArea::vertical()
            .id_salt("roster_scroll")
            .auto_shrink(false)
            .show(ui, |ui| {
                if self.engine.roster().is_empty() {
                    ui.label(egui::RichText::new("No players yet.").color(MUTED));
                }
                for player in self.engine.roster() {
                    let entered = self.engine.players().iter().any(|p| p.id == player.id);
                    ui.horizontal(|ui| {
                        ui.label(&player.name);
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            if ui.small_button("Delete").clicked() {
                                delete = Some(player.id);
                            }
                            if ui
                                .add_enabled(!started && !entered, egui::Button::new("Enter").small())
                                .clicked()
                            {
                                enter = Some(player.id);
                            }
                        });
                    });
                }
            });

        if let Some(id) = enter {
            self.engine.add_player_to_clash(id);
        }
        if let Some(id) = delete {
            self.engine.remove_roster_entry(id);
        }
    }
}
