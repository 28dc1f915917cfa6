pub(crate) mod controls;
pub(crate) mod ranking;
pub(crate) mod results;
pub(crate) mod roster;
pub(crate) mod table;

#[derive(Clone, Copy, PartialEq)]
pub(crate) enum Tab {
    Clash,
    Ranking,
}

pub(crate) const MUTED: egui::Color32 = egui::Color32::from_rgb(140, 140, 140);
pub(crate) const ACCENT: egui::Color32 = egui::Color32::from_rgb(180, 200, 255);

/// Stat text as shown in an input: whole numbers without decimals.
/// "12" for 12.0, "1.5" for 1.5.
pub(crate) fn stat_text(value: f64) -> String {
    format!("{value}")
}

pub(crate) fn header(ui: &mut egui::Ui, text: &str) {
    ui.label(egui::RichText::new(text).strong().size(11.0));
}
