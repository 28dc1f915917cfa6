use std::collections::HashMap;

use crate::app::ClashboardApp;
use crate::panels::{MUTED, header, stat_text};
use crate::types::{Field, Player, PlayerId};

/// Text being typed into each competitor cell, keyed by player and field.
pub(crate) type CellBuffers = HashMap<(PlayerId, Field), String>;

/// Drop buffers for competitors or maps that are no longer in the clash,
/// whether they went away locally, remotely or through a reset.
pub(crate) fn prune_cell_buffers(buffers: &mut CellBuffers, players: &[Player], map_count: u32) {
    buffers.retain(|(id, field), _| {
        let map_active = match field {
            Field::Name => true,
            Field::Kills(map) | Field::Rank(map) => *map <= map_count,
        };
        map_active && players.iter().any(|p| p.id == *id)
    });
}

/// One editable cell. Returns the new text when the user changed it.
///
/// While the cell has focus the typed text is kept as-is; otherwise it
/// follows the engine's value (which may have been changed remotely).
fn edit_cell(
    ui: &mut egui::Ui,
    buffers: &mut CellBuffers,
    key: (PlayerId, Field),
    current: String,
    enabled: bool,
) -> Option<String> {
    let width = if key.1 == Field::Name { 120.0 } else { 48.0 };
    let buf = buffers.entry(key).or_insert_with(|| current.clone());
    let resp = ui.add_enabled(enabled, egui::TextEdit::singleline(buf).desired_width(width));
    if resp.changed() {
        return Some(buf.clone());
    }
    if !resp.has_focus() {
        *buf = current;
    }
    None
}

impl ClashboardApp {
    pub(crate) fn render_clash_table(&mut self, ui: &mut egui::Ui) {
        if self.engine.players().is_empty() {
            ui.label(egui::RichText::new("No players in the clash yet.").color(MUTED));
            return;
        }

        let editable = !self.engine.clash_finished();
        let maps: Vec<u32> = self.engine.maps().collect();

        // Applied after the grid so the engine isn't borrowed while rendering
        let mut edits: Vec<(PlayerId, Field, String)> = Vec::new();
        let mut removals: Vec<PlayerId> = Vec::new();

        egui::ScrollArea::both().auto_shrink(false).show(ui, |ui| {
            egui::Grid::new("clash_grid")
                .striped(true)
                .min_col_width(48.0)
                .show(ui, |ui| {
                    header(ui, "Player");
                    for map in &maps {
                        header(ui, &format!("Map {map}\nkills"));
                        header(ui, &format!("Map {map}\nrank"));
                    }
                    header(ui, "Score");
                    ui.end_row();

                    for player in self.engine.players() {
                        let id = player.id;
                        if let Some(text) = edit_cell(
                            ui,
                            &mut self.cell_buffers,
                            (id, Field::Name),
                            player.name.clone(),
                            editable,
                        ) {
                            edits.push((id, Field::Name, text));
                        }

                        for &map in &maps {
                            let stats = player.stats(map);
                            for (field, value) in
                                [(Field::Kills(map), stats.kills), (Field::Rank(map), stats.rank)]
                            {
                                if let Some(text) = edit_cell(
                                    ui,
                                    &mut self.cell_buffers,
                                    (id, field),
                                    stat_text(value),
                                    editable,
                                ) {
                                    edits.push((id, field, text));
                                }
                            }
                        }

                        ui.label(egui::RichText::new(self.engine.total_score(player)).strong());
                        if ui
                            .add_enabled(editable, egui::Button::new("Remove").small())
                            .clicked()
                        {
                            removals.push(id);
                        }
                        ui.end_row();
                    }
                });
        });

        for (id, field, text) in edits {
            self.engine.edit_field(id, field, &text);
        }
        for id in removals {
            self.engine.remove_competitor(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffers(keys: &[(PlayerId, Field)]) -> CellBuffers {
        keys.iter().map(|k| (*k, "7".to_string())).collect()
    }

    #[test]
    fn pruning_follows_the_engine_roster() {
        let mut bufs = buffers(&[
            (1, Field::Name),
            (1, Field::Kills(1)),
            (2, Field::Kills(1)),
            (2, Field::Rank(2)),
        ]);

        // Player 2 removed by another viewer.
        let players = [Player::new(1, "A").with_zeroed_maps(2)];
        prune_cell_buffers(&mut bufs, &players, 2);
        assert_eq!(bufs.len(), 2);
        assert!(bufs.contains_key(&(1, Field::Name)));
        assert!(bufs.contains_key(&(1, Field::Kills(1))));

        // Session reset.
        prune_cell_buffers(&mut bufs, &[], 1);
        assert!(bufs.is_empty());
    }

    #[test]
    fn pruning_drops_removed_maps() {
        let mut bufs = buffers(&[(1, Field::Kills(1)), (1, Field::Kills(3)), (1, Field::Rank(3))]);
        let players = [Player::new(1, "A")];
        prune_cell_buffers(&mut bufs, &players, 2);
        assert_eq!(bufs.keys().copied().collect::<Vec<_>>(), vec![(1, Field::Kills(1))]);
    }
}
