mod agent;
mod app;
mod event;
mod recipe;
mod session;
mod theme;
mod ui;

use agent::AgentClient;
use app::SousChefApp;
use eframe::egui;
use recipe::mirror::RemoteStateMirror;
use recipe::Recipe;
use std::sync::mpsc;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let (event_tx, event_rx) = mpsc::channel();
    let (patch_tx, patch_rx) = mpsc::channel();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("souschef-runtime")
        .build()?;

    let agent = runtime.block_on(async { AgentClient::new(event_tx, patch_rx) })?;
    agent.start();

    let mirror = RemoteStateMirror::new(&Recipe::starter(), patch_tx);
    let app = SousChefApp::new(event_rx, agent, mirror);
    let _runtime = runtime;

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([1024.0, 640.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Sous Chef",
        native_options,
        Box::new(move |_creation_context| Ok(Box::new(app))),
    )?;

    Ok(())
}
