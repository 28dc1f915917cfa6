pub mod app;
pub mod engine;
pub mod net;
pub(crate) mod panels;
pub mod storage;
pub mod types;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// Keep the effective pixel ratio at 2.0 on high-DPI phones; larger WebGL
/// backing stores can get the tab killed on iOS Safari.
#[cfg(target_arch = "wasm32")]
fn capped_zoom_factor() -> f32 {
    let dpr = web_sys::window()
        .map(|w| w.device_pixel_ratio() as f32)
        .unwrap_or(1.0);
    if dpr > 2.0 { 2.0 / dpr } else { 1.0 }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    eframe::WebLogger::init(log::LevelFilter::Info).ok();

    wasm_bindgen_futures::spawn_local(async {
        let Some(canvas) = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id("the_canvas_id"))
            .and_then(|e| e.dyn_into::<web_sys::HtmlCanvasElement>().ok())
        else {
            log::error!("canvas #the_canvas_id not found");
            return;
        };

        let config = net::browser_config();
        let zoom = capped_zoom_factor();

        let started = eframe::WebRunner::new()
            .start(
                canvas,
                eframe::WebOptions::default(),
                Box::new(move |cc| {
                    cc.egui_ctx.set_zoom_factor(zoom);
                    Ok(Box::new(app::ClashboardApp::new(
                        cc,
                        config,
                        storage::browser_store(),
                    )))
                }),
            )
            .await;
        if let Err(e) = started {
            log::error!("failed to start eframe: {e:?}");
        }
    });
}
