use std::{sync::Arc, time::SystemTime};

use eframe::egui;
use egui::{CentralPanel, CollapsingHeader, Context, Id, SidePanel, TopBottomPanel, Ui};
use tokio::{
    runtime::Runtime,
    sync::mpsc::{self, UnboundedReceiver, UnboundedSender},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::{
    config::Config,
    gui::{
        graph_view::{GraphView, InteractionState},
        param_panel::{self, PanelAction, PanelStatus},
        scene::Scene,
    },
    layout::ForceLayout,
    network::{
        network_graph::{NetworkGraph, Viewport},
        node::Entity,
    },
    params::form::{ParamForm, ParamPatch},
    topology::{
        HandoverApiClient,
        http::SubmitError,
        poller::{PollEvent, spawn_poll_loop},
        snapshot::{BasicAuth, ParamValues, Snapshot},
    },
};

pub fn main(rt: Arc<Runtime>, config: Config) -> eframe::Result {
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([config.width, config.height])
            .with_title(format!("Handover manager - {}", config.tenant_id)),
        ..Default::default()
    };
    eframe::run_native(
        "handover-visualization",
        native_options,
        Box::new(move |cc| Ok(Box::new(App::new(cc, rt, &config)) as Box<dyn eframe::App>)),
    )
}

/// Everything background tasks report back to the UI thread.
#[derive(Debug)]
pub enum AppEvent {
    Poll(PollEvent),
    Submitted(Result<(), SubmitError>),
}

impl From<PollEvent> for AppEvent {
    fn from(event: PollEvent) -> Self {
        AppEvent::Poll(event)
    }
}

struct App {
    runtime: Arc<Runtime>,
    client: HandoverApiClient,
    events_tx: UnboundedSender<AppEvent>,
    events: UnboundedReceiver<AppEvent>,
    poll_task: JoinHandle<()>,

    graph: NetworkGraph,
    layout: ForceLayout,
    scene: Scene,
    interaction: InteractionState,

    // Mirror of the controller's parameters and credentials from the last snapshot
    params: ParamValues,
    auth: Option<BasicAuth>,
    last_poll: Option<SystemTime>,
    last_error: Option<String>,

    form: ParamForm,
    panel_open: bool,
    submitting: bool,
    alert: Option<String>,
}

impl App {
    fn new(cc: &eframe::CreationContext<'_>, runtime: Arc<Runtime>, config: &Config) -> Self {
        catppuccin_egui::set_theme(&cc.egui_ctx, catppuccin_egui::LATTE);

        let client = HandoverApiClient::new(&config.server, &config.tenant_id);
        info!(target: "app", url = %client.component_url(), "Polling handover manager");

        let (events_tx, events) = mpsc::unbounded_channel();
        let repaint_ctx = cc.egui_ctx.clone();
        let poll_task = spawn_poll_loop(
            runtime.handle(),
            Box::new(client.clone()),
            config.poll_interval(),
            events_tx.clone(),
            move || repaint_ctx.request_repaint(),
        );

        Self {
            runtime,
            client,
            events_tx,
            events,
            poll_task,

            graph: NetworkGraph::new(Viewport::new(config.width, config.height)),
            layout: ForceLayout::default(),
            scene: Scene::default(),
            interaction: InteractionState::default(),

            params: ParamValues::default(),
            auth: None,
            last_poll: None,
            last_error: None,

            form: ParamForm::default(),
            panel_open: false,
            submitting: false,
            alert: None,
        }
    }

    fn drain_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            match event {
                AppEvent::Poll(PollEvent::Snapshot(Some(snapshot))) => self.apply_snapshot(snapshot),
                AppEvent::Poll(PollEvent::Snapshot(None)) => {}
                AppEvent::Poll(PollEvent::Failed(err)) => self.last_error = Some(err.to_string()),
                AppEvent::Submitted(result) => self.finish_submit(result),
            }
        }
    }

    fn apply_snapshot(&mut self, snapshot: Snapshot) {
        let auth = snapshot.credentials();
        let Snapshot {
            graph_data, params, ..
        } = snapshot;

        let report = self.graph.reconcile(graph_data);
        if report.dropped_links > 0 {
            warn!(target: "app", dropped = report.dropped_links, "Ignored links with unknown endpoints");
        }
        if report.is_structural_change() {
            info!(
                target: "app",
                created = report.created.len(),
                removed = report.removed.len(),
                nodes = self.graph.nodes.len(),
                "Topology changed"
            );
        }
        let diff = self.scene.join(&self.graph.nodes);
        debug!(
            target: "app",
            entered = ?diff.entered,
            exited = ?diff.exited,
            elements = self.scene.len(),
            "Scene joined"
        );
        self.layout.restart();

        if auth != self.auth {
            match &auth {
                Some(auth) => debug!(target: "app", user = auth.user(), "Controller credentials updated"),
                None => debug!(target: "app", "Controller sent no credentials"),
            }
        }
        self.params = params;
        self.auth = auth;
        self.last_poll = Some(SystemTime::now());
        self.last_error = None;
    }

    fn submit(&mut self, ctx: &Context, patch: ParamPatch) {
        info!(target: "app", ?patch, "Submitting parameter update");
        self.submitting = true;

        let client = self.client.clone();
        let auth = self.auth.clone();
        let tx = self.events_tx.clone();
        let ctx = ctx.clone();
        self.runtime.spawn(async move {
            let result = client.submit_params(&patch, auth.as_ref()).await;
            _ = tx.send(AppEvent::Submitted(result));
            ctx.request_repaint();
        });
    }

    fn finish_submit(&mut self, result: Result<(), SubmitError>) {
        self.submitting = false;
        match result {
            Ok(()) => {
                info!(target: "app", "Parameters updated");
                self.set_panel_open(false);
            }
            Err(err) => {
                warn!(target: "app", error = %err, "Parameter update failed");
                self.alert = Some(err.to_string());
            }
        }
    }

    /// Closing the drawer discards whatever was typed into it.
    fn set_panel_open(&mut self, open: bool) {
        if self.panel_open && !open {
            self.form.clear();
        }
        self.panel_open = open;
    }

    fn handle_panel_action(&mut self, ctx: &Context, action: PanelAction) {
        match action {
            PanelAction::None => {}
            PanelAction::Submit(patch) => self.submit(ctx, patch),
            PanelAction::Invalid(err) => {
                debug!(target: "app", error = %err, "Rejected parameter form");
                self.alert = Some(err.to_string());
            }
            PanelAction::Close => self.set_panel_open(false),
        }
    }

    fn render_top_bar(&mut self, ctx: &Context) {
        TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui
                    .selectable_label(self.panel_open, "☰ Parameters")
                    .on_hover_text("Show or hide the handover parameter panel")
                    .clicked()
                {
                    self.set_panel_open(!self.panel_open);
                }
                ui.separator();
                ui.label(format!(
                    "eNBs: {}  UEs: {}",
                    self.graph.count(Entity::Enb),
                    self.graph.count(Entity::Ue)
                ));
                if self.last_error.is_some() {
                    ui.separator();
                    ui.colored_label(ui.visuals().warn_fg_color, "⚠ controller unreachable");
                }
            });
        });
    }

    fn render_forces_section(&mut self, ui: &mut Ui) {
        CollapsingHeader::new("Forces").default_open(false).show(ui, |ui| {
            let params = &mut self.layout.params;
            let mut changed = false;
            ui.horizontal(|ui| {
                changed |= ui.add(egui::Slider::new(&mut params.charge, -1500.0..=0.0).text("charge")).changed();
                info_icon(ui, "Pairwise node charge; more negative pushes nodes further apart.");
            });
            ui.horizontal(|ui| {
                changed |= ui
                    .add(egui::Slider::new(&mut params.link_distance, 10.0..=300.0).text("link_distance"))
                    .changed();
                info_icon(ui, "Rest length of the spring along each link.");
            });
            ui.horizontal(|ui| {
                changed |= ui
                    .add(egui::Slider::new(&mut params.link_strength, 0.0..=1.0).text("link_strength"))
                    .changed();
                info_icon(ui, "Stiffness of the link springs.");
            });
            ui.horizontal(|ui| {
                changed |= ui.add(egui::Slider::new(&mut params.gravity, 0.0..=1.0).text("gravity")).changed();
                info_icon(ui, "Pull toward the centre of the canvas.");
            });
            ui.horizontal(|ui| {
                changed |= ui.add(egui::Slider::new(&mut params.friction, 0.0..=1.0).text("friction")).changed();
                info_icon(ui, "Fraction of velocity kept per tick; lower settles faster.");
            });
            if changed {
                self.layout.restart();
            }
            ui.label(format!("alpha: {:.3}", self.layout.alpha()));

            ui.separator();
            if ui.button("Print graph data").clicked() {
                info!(target: "app", "Pressed print graph data button\n{}", self.graph);
            }
        });
    }

    fn render_panel(&mut self, ctx: &Context) {
        if !self.panel_open {
            return;
        }
        let mut action = PanelAction::None;
        SidePanel::right("param_panel")
            .resizable(true)
            .min_width(380.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    let status = PanelStatus {
                        values: &self.params,
                        last_poll: self.last_poll,
                        last_error: self.last_error.as_deref(),
                        submitting: self.submitting,
                    };
                    action = param_panel::show(ui, &mut self.form, &status);
                    ui.separator();
                    self.render_forces_section(ui);
                });
            });

        self.handle_panel_action(ctx, action);
    }

    fn render_alert(&mut self, ctx: &Context) {
        let Some(message) = &self.alert else {
            return;
        };
        let modal = egui::Modal::new(Id::new("alert_modal")).show(ctx, |ui| {
            ui.set_width(300.0);
            ui.heading("Alert");
            ui.add_space(4.0);
            ui.label(message.as_str());
            ui.add_space(8.0);
            ui.button("OK").clicked()
        });
        if modal.inner || modal.should_close() {
            self.alert = None;
        }
    }
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _: &mut eframe::Frame) {
        self.drain_events();

        self.render_top_bar(ctx);
        self.render_panel(ctx);
        CentralPanel::default().show(ctx, |ui| {
            GraphView::new(&mut self.graph, &mut self.layout, &self.scene, &mut self.interaction).show(ui);
        });
        self.render_alert(ctx);
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.poll_task.abort();
    }
}

fn info_icon(ui: &mut egui::Ui, tip: &str) {
    ui.add_space(4.0);
    ui.small_button("ℹ").on_hover_text(tip);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::source::TopologyError;

    fn app_state() -> (App, UnboundedSender<AppEvent>) {
        let runtime = Arc::new(Runtime::new().unwrap());
        let (events_tx, events) = mpsc::unbounded_channel();
        let poll_task = runtime.spawn(async {});
        let app = App {
            runtime,
            client: HandoverApiClient::new("http://127.0.0.1:8888", "t1"),
            events_tx: events_tx.clone(),
            events,
            poll_task,
            graph: NetworkGraph::new(Viewport::new(1130.0, 750.0)),
            layout: ForceLayout::default(),
            scene: Scene::default(),
            interaction: InteractionState::default(),
            params: ParamValues::default(),
            auth: None,
            last_poll: None,
            last_error: None,
            form: ParamForm::default(),
            panel_open: true,
            submitting: false,
            alert: None,
        };
        (app, events_tx)
    }

    fn fixture() -> Snapshot {
        serde_json::from_str(include_str!("../../test_data/snapshot.json")).unwrap()
    }

    #[test]
    fn test_snapshot_updates_graph_params_and_auth() {
        let (mut app, tx) = app_state();
        tx.send(PollEvent::Snapshot(Some(fixture())).into()).unwrap();
        app.drain_events();

        assert_eq!(app.graph.nodes.len(), 4);
        assert_eq!(app.graph.links.len(), 3);
        assert_eq!(app.scene.len(), 4);
        assert_eq!(app.params.every, Some(5000.0));
        assert_eq!(app.auth, Some(BasicAuth::new("root", "root")));
        assert!(app.layout.is_running());
        assert!(app.last_poll.is_some());
    }

    #[test]
    fn test_empty_poll_and_failure_keep_state() {
        let (mut app, tx) = app_state();
        tx.send(PollEvent::Snapshot(Some(fixture())).into()).unwrap();
        app.drain_events();
        let nodes = app.graph.nodes.clone();

        tx.send(PollEvent::Snapshot(None).into()).unwrap();
        tx.send(
            PollEvent::Failed(TopologyError::Acquisition("HTTP 502".into())).into(),
        )
        .unwrap();
        app.drain_events();

        assert_eq!(app.graph.nodes, nodes);
        assert_eq!(app.auth, Some(BasicAuth::new("root", "root")));
        assert_eq!(app.last_error.as_deref(), Some("acquisition error: HTTP 502"));
    }

    #[test]
    fn test_successful_submit_clears_and_closes() {
        let (mut app, tx) = app_state();
        app.form.s_dl_thr = "20".into();
        app.submitting = true;
        tx.send(AppEvent::Submitted(Ok(()))).unwrap();
        app.drain_events();

        assert!(app.form.is_blank());
        assert!(!app.panel_open);
        assert!(!app.submitting);
        assert!(app.alert.is_none());
    }

    #[test]
    fn test_closing_the_panel_discards_input() {
        let (mut app, _tx) = app_state();
        app.form.s_dl_thr = "20".into();
        app.handle_panel_action(&Context::default(), PanelAction::Close);
        assert!(!app.panel_open);
        assert!(app.form.is_blank());

        app.set_panel_open(true);
        app.form.every = "500".into();
        app.set_panel_open(!app.panel_open);
        assert!(!app.panel_open);
        assert!(app.form.is_blank());
    }

    #[test]
    fn test_invalid_form_alerts_without_submitting() {
        let (mut app, _tx) = app_state();
        app.form.s_dl_thr = "150".into();
        let action = match app.form.validate() {
            Err(err) => PanelAction::Invalid(err),
            Ok(patch) => PanelAction::Submit(patch),
        };
        app.handle_panel_action(&Context::default(), action);

        assert_eq!(app.alert.as_deref(), Some("Source DL threshold must be < 100"));
        assert!(!app.submitting);
        assert!(app.panel_open);
        assert_eq!(app.form.s_dl_thr, "150");
        assert!(app.events.try_recv().is_err());
    }

    #[test]
    fn test_failed_submit_alerts_and_keeps_form() {
        let (mut app, tx) = app_state();
        app.form.rsrq_thr = "-10".into();
        tx.send(AppEvent::Submitted(Err(SubmitError::NotFound))).unwrap();
        app.drain_events();

        assert_eq!(app.alert.as_deref(), Some("Component not found"));
        assert_eq!(app.form.rsrq_thr, "-10");
        assert!(app.panel_open);
    }

    #[test]
    fn test_missing_credentials_clear_auth() {
        let (mut app, tx) = app_state();
        tx.send(PollEvent::Snapshot(Some(fixture())).into()).unwrap();
        let mut anonymous = fixture();
        anonymous.base_auth_pwd = None;
        tx.send(PollEvent::Snapshot(Some(anonymous)).into()).unwrap();
        app.drain_events();
        assert_eq!(app.auth, None);
    }
}
