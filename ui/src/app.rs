//! egui application: ClashboardApp.

use crate::engine::{ClashSyncEngine, NoticeLevel};
use crate::net::{self, HttpBackend, WsChannel, WsPollEvent};
use crate::panels::table::{CellBuffers, prune_cell_buffers};
use crate::panels::{ACCENT, MUTED, Tab};
use crate::storage::SessionStore;
use crate::types::ClashboardConfig;

const ERROR_RED: egui::Color32 = egui::Color32::from_rgb(220, 53, 69);

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

pub struct ClashboardApp {
    pub(crate) engine: ClashSyncEngine,

    // Networking
    websocket_url: String,
    ws_receiver: Option<ewebsock::WsReceiver>,
    ws_connected: bool,
    ws_ever_connected: bool,

    // UI state
    pub(crate) active_tab: Tab,
    pub(crate) new_player_name: String,
    pub(crate) cell_buffers: CellBuffers,
    pub(crate) confirm_delete_all: bool,
}

impl ClashboardApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        config: ClashboardConfig,
        store: Box<dyn SessionStore>,
    ) -> Self {
        log::info!(
            "backend {} / channel {}",
            config.backend_url,
            config.websocket_url
        );
        let backend = HttpBackend::new(&config.backend_url);
        let mut engine = ClashSyncEngine::new(Box::new(backend), store);

        let ctx = cc.egui_ctx.clone();
        engine.set_waker(move || ctx.request_repaint());
        let ctx = cc.egui_ctx.clone();
        engine.subscribe(move |_| ctx.request_repaint());

        engine.bootstrap();

        // Defer the WebSocket connection to the first update().

        Self {
            engine,
            websocket_url: config.websocket_url,
            ws_receiver: None,
            ws_connected: false,
            ws_ever_connected: false,
            active_tab: Tab::Clash,
            new_player_name: String::new(),
            cell_buffers: CellBuffers::new(),
            confirm_delete_all: false,
        }
    }

    fn connect(&mut self) {
        self.ws_ever_connected = true;
        if let Some((tx, rx)) = net::connect_ws(&self.websocket_url) {
            self.engine.attach_channel(Box::new(WsChannel::new(tx)));
            self.ws_receiver = Some(rx);
            self.ws_connected = true;
        }
    }

    /// Feed channel events to the engine.
    fn poll_ws(&mut self) {
        let Some(rx) = &mut self.ws_receiver else {
            return;
        };
        let mut ws_disconnected = false;
        for event in net::poll_ws(rx) {
            match event {
                WsPollEvent::Opened => self.engine.on_channel_open(),
                WsPollEvent::Text(text) => self.engine.receive(&text),
                WsPollEvent::Error(_) | WsPollEvent::Disconnected => ws_disconnected = true,
            }
        }
        if ws_disconnected {
            self.ws_receiver = None;
            self.ws_connected = false;
            self.engine.on_channel_closed();
        }
    }

    fn render_notice(&mut self, ctx: &egui::Context) {
        let Some(notice) = self.engine.notice() else {
            return;
        };
        let color = match notice.level {
            NoticeLevel::Info => ACCENT,
            NoticeLevel::Error => ERROR_RED,
        };
        let message = notice.message.clone();
        let mut dismiss = false;
        egui::Window::new("Notice")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(egui::RichText::new(message).color(color).strong());
                ui.add_space(8.0);
                if ui.button("OK").clicked() {
                    dismiss = true;
                }
            });
        if dismiss {
            self.engine.dismiss_notice();
        }
    }

    fn render_delete_all_confirm(&mut self, ctx: &egui::Context) {
        if !self.confirm_delete_all {
            return;
        }
        let mut keep_open = true;
        egui::Window::new("Confirm deletion")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label("Delete every stored clash? This cannot be undone.");
                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    if ui.button("Delete").clicked() {
                        self.engine.delete_all_clashes();
                        keep_open = false;
                    }
                    if ui.button("Cancel").clicked() {
                        keep_open = false;
                    }
                });
            });
        if !keep_open {
            self.confirm_delete_all = false;
        }
    }

    fn render_disconnected(&mut self, ctx: &egui::Context) {
        let mut reconnect = false;
        egui::CentralPanel::default()
            .frame(egui::Frame::new().fill(egui::Color32::from_rgb(20, 20, 20)))
            .show(ctx, |ui| {
                ui.vertical_centered(|ui| {
                    ui.add_space(ui.available_height() * 0.4);
                    ui.label(
                        egui::RichText::new("DISCONNECTED")
                            .size(32.0)
                            .color(MUTED)
                            .strong(),
                    );
                    ui.add_space(12.0);
                    if ui.button("Reconnect").clicked() {
                        reconnect = true;
                    }
                });
            });
        if reconnect {
            self.connect();
        }
    }
}

impl eframe::App for ClashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Poll for channel events ~10x/sec instead of only on user input.
        ctx.request_repaint_after(std::time::Duration::from_millis(100));

        // Connect on the first frame only; afterwards only via Reconnect.
        if !self.ws_ever_connected {
            self.connect();
        }

        self.engine.poll();
        self.poll_ws();
        prune_cell_buffers(
            &mut self.cell_buffers,
            self.engine.players(),
            self.engine.map_count(),
        );

        self.render_notice(ctx);
        self.render_delete_all_confirm(ctx);
        self.render_results_window(ctx);

        if !self.ws_connected {
            self.render_disconnected(ctx);
            return;
        }

        egui::SidePanel::left("roster_panel")
            .resizable(true)
            .default_width(230.0)
            .show(ctx, |ui| self.render_roster_panel(ui));

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.selectable_value(&mut self.active_tab, Tab::Clash, "Clash");
                if ui
                    .selectable_value(&mut self.active_tab, Tab::Ranking, "Ranking")
                    .clicked()
                {
                    self.engine.fetch_ranking();
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(
                        egui::RichText::new("CLASHBOARD")
                            .strong()
                            .size(14.0)
                            .color(MUTED),
                    );
                });
            });
            ui.separator();

            match self.active_tab {
                Tab::Clash => {
                    self.render_controls(ui);
                    ui.separator();
                    self.render_clash_table(ui);
                }
                Tab::Ranking => self.render_ranking_panel(ui),
            }
        });
    }
}
