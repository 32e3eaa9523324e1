use crate::agent::AgentClient;
use crate::event::{AppEvent, ConnectionState};
use crate::recipe::mirror::RemoteStateMirror;
use crate::recipe::partial::PartialRecipe;
use crate::recipe::reconcile::Reconciler;
use crate::recipe::Recipe;
use crate::session::{store, Message, SessionMeta, SCHEMA_VERSION};
use crate::theme::Theme;
use crate::ui::recipe_card::{CardAction, RecipeCard};
use eframe::egui::{self, Color32, RichText, ScrollArea};
use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::{SystemTime, UNIX_EPOCH};

const IMPROVE_PROMPT: &str = "Improve the recipe with better ingredients and techniques";

pub struct SousChefApp {
    rx: Receiver<AppEvent>,
    agent: AgentClient,
    theme: Theme,
    theme_applied: bool,
    connection_state: ConnectionState,
    transcript: Vec<Message>,
    sessions: Vec<SessionMeta>,
    current_session: Option<SessionMeta>,
    input_buffer: String,
    in_progress_assistant: String,
    is_streaming: bool,
    diagnostics_log: Vec<String>,
    scroll_to_bottom: bool,
    session_unavailable: bool,
    mirror: RemoteStateMirror,
    recipe: Recipe,
    reconciler: Reconciler,
    recipe_card: RecipeCard,
}

impl SousChefApp {
    pub fn new(rx: Receiver<AppEvent>, agent: AgentClient, mirror: RemoteStateMirror) -> Self {
        let (sessions, warnings) = store::load_all();
        let mut app = Self {
            rx,
            agent,
            theme: Theme::default(),
            theme_applied: false,
            connection_state: ConnectionState::Disconnected,
            transcript: Vec::new(),
            sessions,
            current_session: None,
            input_buffer: String::new(),
            in_progress_assistant: String::new(),
            is_streaming: false,
            diagnostics_log: Vec::new(),
            scroll_to_bottom: false,
            session_unavailable: false,
            mirror,
            recipe: Recipe::starter(),
            reconciler: Reconciler::new(),
            recipe_card: RecipeCard::new(),
        };

        for warning in warnings {
            app.log_diagnostic(format!("session load warning: {warning}"));
        }

        app
    }

    fn timestamp() -> String {
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(duration) => duration.as_secs().to_string(),
            Err(_) => "0".to_string(),
        }
    }

    fn log_diagnostic(&mut self, message: impl Into<String>) {
        self.diagnostics_log
            .push(format!("[{}] {}", Self::timestamp(), message.into()));
    }

    fn connection_label(&self) -> (&'static str, Color32) {
        match self.connection_state {
            ConnectionState::Connected => ("Agent Connected", self.theme.success),
            ConnectionState::Connecting => ("Connecting...", self.theme.accent_primary),
            ConnectionState::Disconnected => ("Disconnected", self.theme.text_muted),
            ConnectionState::Error => ("Agent Error", self.theme.danger),
        }
    }

    /// One reconciliation pass over the current `(snapshot, replica)` pair.
    /// The replica is rebound at most once, only when a field was adopted.
    fn run_reconcile(&mut self) {
        if let Some(next) =
            self.reconciler
                .reconcile(self.mirror.read(), &self.recipe, self.is_streaming)
        {
            self.recipe = next;
        }
    }

    fn refresh_sessions(&mut self) {
        let (sessions, warnings) = store::load_all();
        self.sessions = sessions;
        for warning in warnings {
            self.log_diagnostic(format!("session load warning: {warning}"));
        }
    }

    fn persist_transcript(&mut self) {
        if let Some(meta) = self.current_session.as_mut() {
            meta.messages = self.transcript.clone();
            if let Err(err) = store::save(meta) {
                self.log_diagnostic(format!("failed to persist session: {err}"));
            }
        }
    }

    fn send_message(&mut self, content: String, ctx: &egui::Context) {
        let content = content.trim().to_string();
        if content.is_empty() || self.is_streaming {
            return;
        }

        self.transcript.push(Message {
            role: "user".to_string(),
            content: content.clone(),
            timestamp: Self::timestamp(),
        });
        self.persist_transcript();

        // The turn is in flight from here until StreamEnd; the reconciler
        // holds highlight markers for the whole window.
        self.is_streaming = true;
        self.agent.send(content);
        self.scroll_to_bottom = true;
        ctx.request_repaint();
    }

    fn open_session(&mut self, session_id: &str) {
        let (session, warning) = store::load_one(session_id);
        if let Some(warning) = warning {
            self.log_diagnostic(format!("session load warning: {warning}"));
        }

        if let Some(session) = session {
            self.transcript = session.messages.clone();
            self.current_session = Some(session);
            self.is_streaming = false;
            self.in_progress_assistant.clear();
            self.scroll_to_bottom = true;
            self.session_unavailable = false;
            // Transcripts persist; the shared document does not. Reopening
            // a session starts again from the fixed default.
            self.reset_shared_state();
        } else {
            self.session_unavailable = true;
        }
    }

    fn reset_shared_state(&mut self) {
        self.recipe = Recipe::starter();
        self.mirror.reset(&self.recipe);
        self.reconciler.reset();
        self.agent.reset();
    }

    fn drain_events(&mut self, ctx: &egui::Context) {
        loop {
            match self.rx.try_recv() {
                Ok(event) => self.apply_event(event, ctx),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.log_diagnostic("event channel disconnected");
                    break;
                }
            }
        }
    }

    fn apply_event(&mut self, event: AppEvent, ctx: &egui::Context) {
        match event {
            AppEvent::StreamDelta(text) => {
                self.in_progress_assistant.push_str(&text);
                self.is_streaming = true;
                self.scroll_to_bottom = true;
                ctx.request_repaint();
            }
            AppEvent::StreamEnd => {
                if !self.in_progress_assistant.is_empty() {
                    self.transcript.push(Message {
                        role: "assistant".to_string(),
                        content: std::mem::take(&mut self.in_progress_assistant),
                        timestamp: Self::timestamp(),
                    });
                    self.persist_transcript();
                }

                self.is_streaming = false;
                // The channel just went idle; this pass exists to apply
                // the highlight clearing rule and is otherwise a no-op.
                self.run_reconcile();
                self.scroll_to_bottom = true;
                ctx.request_repaint();
            }
            AppEvent::StatusChanged(state) => {
                self.connection_state = state;
                self.log_diagnostic(format!("connection state changed: {state:?}"));
            }
            AppEvent::AgentError(message) => {
                self.log_diagnostic(format!("agent error: {message}"));
                self.is_streaming = false;
            }
            AppEvent::SessionCreated(session_id) => {
                let meta = SessionMeta {
                    schema_version: SCHEMA_VERSION,
                    session_id: session_id.clone(),
                    title: Some(format!(
                        "Session {}",
                        session_id.trim_start_matches("session-")
                    )),
                    created_at: Self::timestamp(),
                    messages: Vec::new(),
                };

                self.current_session = Some(meta.clone());
                self.transcript.clear();
                self.in_progress_assistant.clear();
                self.is_streaming = false;
                self.session_unavailable = false;
                self.reset_shared_state();

                if let Err(err) = store::save(&meta) {
                    self.log_diagnostic(format!("failed to persist new session: {err}"));
                }

                self.refresh_sessions();
            }
            AppEvent::StateSnapshot(value) => {
                // Full replacement candidate from the agent; the mirror
                // takes it wholesale and the reconciler decides adoption.
                self.mirror.replace(PartialRecipe::from_value(&value));
                self.run_reconcile();
                ctx.request_repaint();
            }
        }
    }

    fn render_top_bar(&mut self, ctx: &egui::Context) {
        let (status_label, status_color) = self.connection_label();
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.strong("Sous Chef");
                ui.separator();
                ui.label(RichText::new(status_label).color(status_color));
                if self.is_streaming {
                    ui.separator();
                    ui.label(RichText::new("Cooking up changes...").color(self.theme.text_muted));
                }
            });
        });
    }

    fn render_sessions_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::left("sessions_panel")
            .resizable(true)
            .default_width(200.0)
            .show(ctx, |ui| {
                ui.heading("Sessions");
                ui.separator();
                let mut clicked_session: Option<String> = None;
                for session in &self.sessions {
                    let label = session
                        .title
                        .clone()
                        .unwrap_or_else(|| session.session_id.clone());
                    if ui.button(label).clicked() {
                        clicked_session = Some(session.session_id.clone());
                    }
                }

                if let Some(session_id) = clicked_session {
                    self.open_session(&session_id);
                }
            });
    }

    fn render_recipe_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::right("recipe_panel")
            .resizable(true)
            .default_width(420.0)
            .show(ctx, |ui| {
                let mut actions = Vec::new();
                ScrollArea::vertical().id_salt("recipe_card").show(ui, |ui| {
                    let Self {
                        recipe_card,
                        recipe,
                        reconciler,
                        theme,
                        is_streaming,
                        ..
                    } = self;
                    recipe_card.show(ui, theme, recipe, reconciler, *is_streaming, &mut |action| {
                        actions.push(action)
                    });
                });

                for action in actions {
                    match action {
                        CardAction::Edited(patch) => {
                            // Local edit path: the replica is already
                            // mutated; echo the touched fields upstream and
                            // run the edit-commit pass.
                            self.mirror.write(patch);
                            self.run_reconcile();
                        }
                        CardAction::ImproveRequested => {
                            self.send_message(IMPROVE_PROMPT.to_string(), ctx);
                        }
                    }
                }
            });
    }

    fn render_chat_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Chat");
            ui.separator();

            let transcript_height = (ui.available_height() - 170.0).max(120.0);
            ScrollArea::vertical()
                .id_salt("chat_transcript")
                .max_height(transcript_height)
                .stick_to_bottom(true)
                .show(ui, |ui| {
                    if self.session_unavailable {
                        ui.label(RichText::new("Session unavailable").color(self.theme.danger));
                    }

                    for message in &self.transcript {
                        let label = if message.role == "user" {
                            format!("[You] {}", message.content)
                        } else {
                            format!("[Chef] {}", message.content)
                        };
                        ui.label(label);
                    }

                    if self.is_streaming && !self.in_progress_assistant.is_empty() {
                        ui.label(format!("[Chef] {}", self.in_progress_assistant));
                    }

                    if self.scroll_to_bottom {
                        ui.scroll_to_cursor(Some(egui::Align::BOTTOM));
                    }
                });
            self.scroll_to_bottom = false;

            ui.separator();
            egui::CollapsingHeader::new("Diagnostics")
                .default_open(false)
                .show(ui, |ui| {
                    ScrollArea::vertical()
                        .id_salt("diagnostics_log")
                        .max_height(90.0)
                        .stick_to_bottom(true)
                        .show(ui, |ui| {
                            for entry in &self.diagnostics_log {
                                ui.label(entry);
                            }
                        });
                });

            ui.separator();
            let connected = self.connection_state == ConnectionState::Connected;
            let input_enabled = connected && !self.is_streaming;
            let hint = if !connected {
                "Not connected"
            } else if self.is_streaming {
                "Waiting for the chef..."
            } else {
                "Ask about the recipe..."
            };

            let mut send_now = false;
            self.theme.composer_frame().show(ui, |ui| {
                ui.horizontal(|ui| {
                    let response = ui.add_enabled(
                        input_enabled,
                        egui::TextEdit::singleline(&mut self.input_buffer)
                            .desired_width(f32::INFINITY)
                            .hint_text(hint),
                    );
                    if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                        send_now = true;
                    }

                    let clicked = ui
                        .add_enabled(
                            input_enabled && !self.input_buffer.trim().is_empty(),
                            egui::Button::new("Send"),
                        )
                        .clicked();
                    send_now |= clicked;
                });
            });

            if send_now && input_enabled {
                let content = std::mem::take(&mut self.input_buffer);
                self.send_message(content, ctx);
            }
        });
    }
}

impl eframe::App for SousChefApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if !self.theme_applied {
            self.theme.apply_visuals(ctx);
            self.theme_applied = true;
        }
        self.drain_events(ctx);
        self.render_top_bar(ctx);
        self.render_sessions_panel(ctx);
        self.render_recipe_panel(ctx);
        self.render_chat_panel(ctx);
    }
}
