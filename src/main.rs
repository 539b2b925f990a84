//! SCENEDECK - interactive 3D scene editor shell.
//!
//! Wires the coordination core together: event bus, command hub, overlay
//! state, dialog orchestrator, annotation projector, camera presets. The
//! widgets here are deliberately minimal; the coordination contracts live in
//! the library modules.

use scenedeck::cli::Args;
use scenedeck::commands::*;
use scenedeck::config::{AppSettings, PathConfig};
use scenedeck::core::command_hub::CommandHub;
use scenedeck::core::event_bus::{downcast_event, EventBus};
use scenedeck::dialogs::export::{codec_label, known_codecs, Container, ImageExportSettings, VideoExportSettings};
use scenedeck::dialogs::publish::{PublishSettings, UserProfile};
use scenedeck::dialogs::{DialogKind, DialogOrchestrator, DialogOutcome, DialogTicket, RfdSaveHost};
use scenedeck::overlay::OverlayState;
use scenedeck::scene::camera::{preset_keys, CameraPose, CameraPresetController, CameraRig};
use scenedeck::scene::camera_events::SetCameraPoseEvent;
use scenedeck::scene::capability::SceneCapability;
use scenedeck::viewport::projector::AnnotationProjector;
use scenedeck::viewport::viewport_events::{PreRenderEvent, ViewportResizedEvent};

use clap::Parser;
use eframe::{egui, glow};
use glam::{Mat4, Vec3};
use log::{debug, info};
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// World anchor the annotation overlay stays glued to.
const ANNOTATION_ANCHOR: Vec3 = Vec3::new(0.0, 1.2, 0.0);

/// Queued notification popup, owned by the shell's ShowPopup handler.
struct PopupRequest {
    kind: PopupKind,
    header: String,
    message: String,
}

/// Scene capability handle backed by the shell's camera rig.
struct SceneHandle {
    rig: Arc<Mutex<CameraRig>>,
    ctx: egui::Context,
}

impl SceneCapability for SceneHandle {
    fn set_camera_pose(&self, pose: &CameraPose) {
        self.rig.lock().unwrap_or_else(|e| e.into_inner()).set_pose(pose);
    }

    fn request_redraw(&self) {
        self.ctx.request_repaint();
    }
}

/// Main application state
struct ScenedeckApp {
    event_bus: EventBus,
    overlay: Arc<Mutex<OverlayState>>,
    projector: Arc<Mutex<AnnotationProjector>>,
    orchestrator: Arc<DialogOrchestrator>,
    presets: CameraPresetController,
    rig: Arc<Mutex<CameraRig>>,

    popups: Arc<Mutex<Vec<PopupRequest>>>,
    doc_name: Arc<Mutex<String>>,
    session: Arc<Mutex<Option<UserProfile>>>,

    settings: AppSettings,
    path_config: PathConfig,

    // Working copies edited by the dialog windows
    publish_draft: PublishSettings,
    image_draft: ImageExportSettings,
    video_draft: VideoExportSettings,

    publish_ticket: Option<DialogTicket<PublishSettings>>,
    image_ticket: Option<DialogTicket<ImageExportSettings>>,
    video_ticket: Option<DialogTicket<VideoExportSettings>>,

    status_message: String,
    last_canvas: egui::Rect,
    last_tick: Option<Instant>,
}

impl ScenedeckApp {
    fn new(cc: &eframe::CreationContext<'_>, args: Args) -> Self {
        let path_config = PathConfig::from_env_and_cli(args.config_dir.clone());
        let settings = AppSettings::load(&path_config);

        let event_bus = EventBus::new();
        let hub = CommandHub::new();

        let overlay = Arc::new(Mutex::new(OverlayState::new()));
        OverlayState::wire(&event_bus, Arc::clone(&overlay));

        let projector = Arc::new(Mutex::new(AnnotationProjector::new(ANNOTATION_ANCHOR)));
        AnnotationProjector::wire(&event_bus, Arc::clone(&projector));

        let rig = Arc::new(Mutex::new(CameraRig::new()));
        let scene_handle = Arc::new(SceneHandle {
            rig: Arc::clone(&rig),
            ctx: cc.egui_ctx.clone(),
        });
        let presets = CameraPresetController::with_scene(event_bus.emitter(), scene_handle);

        let popups: Arc<Mutex<Vec<PopupRequest>>> = Default::default();
        let doc_name = Arc::new(Mutex::new(
            args.document
                .as_ref()
                .and_then(|p| p.file_name())
                .and_then(|n| n.to_str())
                .unwrap_or("untitled.scene")
                .to_string(),
        ));
        let session: Arc<Mutex<Option<UserProfile>>> = Default::default();

        register_shell_commands(&hub, &cc.egui_ctx, &popups, &doc_name, &session);
        register_backend_commands(&hub);

        let orchestrator = Arc::new(DialogOrchestrator::new(hub.clone(), Arc::new(RfdSaveHost)));

        if let Some(key) = &args.preset {
            presets.apply_preset(key);
        }

        Self {
            event_bus,
            overlay,
            projector,
            orchestrator,
            presets,
            rig,
            popups,
            doc_name,
            session,
            publish_draft: settings.publish.clone(),
            image_draft: settings.image_export.clone(),
            video_draft: settings.video_export.clone(),
            settings,
            path_config,
            publish_ticket: None,
            image_ticket: None,
            video_ticket: None,
            status_message: String::new(),
            last_canvas: egui::Rect::ZERO,
            last_tick: None,
        }
    }

    /// Drain the deferred bus queue (immediate subscribers already ran).
    fn handle_events(&mut self) {
        for event in self.event_bus.poll() {
            if let Some(e) = downcast_event::<SetCameraPoseEvent>(&event) {
                debug!("camera pose requested: target {:?}", e.pose.target);
                self.rig.lock().unwrap_or_else(|e| e.into_inner()).set_pose(&e.pose);
            }
        }
    }

    /// Surface resolved dialog tickets in the status bar.
    fn poll_tickets(&mut self) {
        if let Some(outcome) = self.publish_ticket.as_ref().and_then(|t| t.try_outcome()) {
            self.status_message = match outcome {
                DialogOutcome::Confirmed(_) => "Scene published".to_string(),
                DialogOutcome::Cancelled => "Publish cancelled".to_string(),
                DialogOutcome::Failed(msg) => format!("Publish failed: {}", msg),
            };
            self.publish_ticket = None;
        }
        if let Some(outcome) = self.image_ticket.as_ref().and_then(|t| t.try_outcome()) {
            self.status_message = match outcome {
                DialogOutcome::Confirmed(_) => "Image exported".to_string(),
                DialogOutcome::Cancelled => "Image export cancelled".to_string(),
                DialogOutcome::Failed(msg) => format!("Image export failed: {}", msg),
            };
            self.image_ticket = None;
        }
        if let Some(outcome) = self.video_ticket.as_ref().and_then(|t| t.try_outcome()) {
            self.status_message = match outcome {
                DialogOutcome::Confirmed(_) => "Video exported".to_string(),
                DialogOutcome::Cancelled => "Video export cancelled".to_string(),
                DialogOutcome::Failed(msg) => format!("Video export failed: {}", msg),
            };
            self.video_ticket = None;
        }
    }

    fn menu_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::MenuBar::new().ui(ui, |ui| {
                ui.menu_button("Scene", |ui| {
                    if ui.button("Publish…").clicked() {
                        self.publish_ticket = Some(self.orchestrator.show_publish());
                        ui.close();
                    }
                    ui.separator();
                    if ui.button("Quit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });
                ui.menu_button("Export", |ui| {
                    if ui.button("Image…").clicked() {
                        self.image_ticket = Some(self.orchestrator.show_image_export());
                        ui.close();
                    }
                    if ui.button("Video…").clicked() {
                        self.video_ticket = Some(self.orchestrator.show_video_export());
                        ui.close();
                    }
                });
                ui.menu_button("View", |ui| {
                    for key in preset_keys() {
                        if ui.button(key).clicked() {
                            self.presets.apply_preset(key);
                            ui.close();
                        }
                    }
                    ui.separator();
                    ui.checkbox(&mut self.settings.show_annotation, "Annotation");
                    ui.checkbox(&mut self.settings.dark_mode, "Dark mode");
                });
                ui.menu_button("Account", |ui| {
                    let logged_in = self.session.lock().unwrap_or_else(|e| e.into_inner()).is_some();
                    if logged_in {
                        if ui.button("Log out").clicked() {
                            *self.session.lock().unwrap_or_else(|e| e.into_inner()) = None;
                            ui.close();
                        }
                    } else if ui.button("Log in (demo)").clicked() {
                        *self.session.lock().unwrap_or_else(|e| e.into_inner()) =
                            Some(UserProfile { name: "demo".to_string() });
                        ui.close();
                    }
                });
            });
        });
    }

    fn viewport_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let (rect, _response) =
                ui.allocate_exact_size(ui.available_size(), egui::Sense::hover());

            if rect != self.last_canvas {
                self.last_canvas = rect;
                self.event_bus.emit(ViewportResizedEvent { canvas: rect });
            }

            let aspect = rect.width() / rect.height().max(1.0);
            let view_proj = self.rig.lock().unwrap_or_else(|e| e.into_inner()).view_proj(aspect);

            // Same camera snapshot for every camera-dependent overlay this frame
            self.event_bus.emit(PreRenderEvent { view_proj: Some(view_proj) });

            let painter = ui.painter_at(rect);
            painter.rect_filled(rect, 0.0, egui::Color32::from_gray(18));
            paint_ground_grid(&painter, rect, view_proj);

            if self.settings.show_annotation {
                let pixel = self.projector.lock().unwrap_or_else(|e| e.into_inner()).pixel_position();
                if let Some(pos) = pixel {
                    painter.circle_filled(pos, 4.0, egui::Color32::from_rgb(255, 196, 0));
                    painter.text(
                        pos + egui::vec2(8.0, -8.0),
                        egui::Align2::LEFT_BOTTOM,
                        "Scene pivot",
                        egui::FontId::proportional(13.0),
                        egui::Color32::from_gray(230),
                    );
                }
            }
        });
    }

    fn overlays(&mut self, ctx: &egui::Context) {
        let (spinner_visible, progress) = {
            let overlay = self.overlay.lock().unwrap_or_else(|e| e.into_inner());
            let progress = overlay.progress_visible().then(|| {
                (
                    overlay.progress_header().to_string(),
                    overlay.progress_text().to_string(),
                    overlay.progress_value(),
                )
            });
            (overlay.spinner_visible(), progress)
        };

        if spinner_visible {
            egui::Area::new(egui::Id::new("busy_spinner"))
                .anchor(egui::Align2::RIGHT_TOP, egui::vec2(-16.0, 40.0))
                .show(ctx, |ui| {
                    ui.add(egui::Spinner::new().size(24.0));
                });
            ctx.request_repaint();
        }

        if let Some((header, text, value)) = progress {
            egui::Window::new(header)
                .id(egui::Id::new("progress_overlay"))
                .anchor(egui::Align2::CENTER_BOTTOM, egui::vec2(0.0, -32.0))
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    if !text.is_empty() {
                        ui.label(text);
                    }
                    ui.add(egui::ProgressBar::new(value).show_percentage());
                });
        }
    }

    fn dialog_windows(&mut self, ctx: &egui::Context) {
        if self.orchestrator.is_showing(DialogKind::Publish) {
            let mut confirm = false;
            let mut cancel = false;
            egui::Window::new("Publish scene")
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.horizontal(|ui| {
                        ui.label("Title");
                        ui.text_edit_singleline(&mut self.publish_draft.title);
                    });
                    ui.label("Description");
                    ui.text_edit_multiline(&mut self.publish_draft.description);
                    ui.checkbox(&mut self.publish_draft.listed, "Listed in gallery");
                    ui.horizontal(|ui| {
                        confirm = ui.button("Publish").clicked();
                        cancel = ui.button("Cancel").clicked();
                    });
                });
            if confirm {
                self.orchestrator.confirm_publish(self.publish_draft.clone());
            } else if cancel {
                self.orchestrator.cancel(DialogKind::Publish);
            }
        }

        if self.orchestrator.is_showing(DialogKind::ImageExport) {
            let mut confirm = false;
            let mut cancel = false;
            egui::Window::new("Export image")
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.horizontal(|ui| {
                        ui.label("Size");
                        ui.add(egui::DragValue::new(&mut self.image_draft.width).range(64..=8192));
                        ui.label("x");
                        ui.add(egui::DragValue::new(&mut self.image_draft.height).range(64..=8192));
                    });
                    ui.checkbox(&mut self.image_draft.transparent_background, "Transparent background");
                    ui.horizontal(|ui| {
                        confirm = ui.button("Export").clicked();
                        cancel = ui.button("Cancel").clicked();
                    });
                });
            if confirm {
                self.orchestrator.confirm_image_export(self.image_draft.clone());
            } else if cancel {
                self.orchestrator.cancel(DialogKind::ImageExport);
            }
        }

        if self.orchestrator.is_showing(DialogKind::VideoExport) {
            let mut confirm = false;
            let mut cancel = false;
            egui::Window::new("Export video")
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    egui::ComboBox::from_label("Format")
                        .selected_text(Container::from_format(&self.video_draft.format).to_string())
                        .show_ui(ui, |ui| {
                            for container in Container::all() {
                                ui.selectable_value(
                                    &mut self.video_draft.format,
                                    container.extension().to_string(),
                                    container.to_string(),
                                );
                            }
                        });
                    egui::ComboBox::from_label("Codec")
                        .selected_text(codec_label(&self.video_draft.codec))
                        .show_ui(ui, |ui| {
                            for &codec in known_codecs() {
                                ui.selectable_value(
                                    &mut self.video_draft.codec,
                                    codec.to_string(),
                                    codec_label(codec),
                                );
                            }
                        });
                    ui.horizontal(|ui| {
                        ui.label("FPS");
                        ui.add(egui::DragValue::new(&mut self.video_draft.fps).range(1.0..=120.0));
                        ui.label("Duration (s)");
                        ui.add(egui::DragValue::new(&mut self.video_draft.duration_secs).range(0.5..=120.0));
                    });
                    ui.horizontal(|ui| {
                        confirm = ui.button("Export").clicked();
                        cancel = ui.button("Cancel").clicked();
                    });
                });
            if confirm {
                self.orchestrator.confirm_video_export(self.video_draft.clone());
            } else if cancel {
                self.orchestrator.cancel(DialogKind::VideoExport);
            }
        }
    }

    fn popup_windows(&mut self, ctx: &egui::Context) {
        let mut popups = self.popups.lock().unwrap_or_else(|e| e.into_inner());
        let mut dismissed: Option<usize> = None;
        for (i, popup) in popups.iter().enumerate() {
            let title = match popup.kind {
                PopupKind::Error => format!("⚠ {}", popup.header),
                PopupKind::Info => popup.header.clone(),
            };
            egui::Window::new(title)
                .id(egui::Id::new(("popup", i)))
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, -60.0))
                .show(ctx, |ui| {
                    ui.label(&popup.message);
                    if ui.button("OK").clicked() {
                        dismissed = Some(i);
                    }
                });
        }
        if let Some(i) = dismissed {
            popups.remove(i);
        }
    }

    fn status_bar(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.monospace(self.doc_name.lock().unwrap_or_else(|e| e.into_inner()).as_str());
                ui.separator();
                let pos = self.rig.lock().unwrap_or_else(|e| e.into_inner()).position();
                ui.monospace(format!("cam {:>5.1} {:>5.1} {:>5.1}", pos.x, pos.y, pos.z));
                if !self.status_message.is_empty() {
                    ui.separator();
                    ui.monospace(&self.status_message);
                }
            });
        });
    }
}

impl eframe::App for ScenedeckApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ctx.set_visuals(if self.settings.dark_mode {
            egui::Visuals::dark()
        } else {
            egui::Visuals::light()
        });

        let now = Instant::now();
        let dt = self
            .last_tick
            .map(|t| (now - t).as_secs_f32().min(0.1))
            .unwrap_or(0.0);
        self.last_tick = Some(now);

        if self.rig.lock().unwrap_or_else(|e| e.into_inner()).advance(dt) {
            ctx.request_repaint();
        }

        self.handle_events();
        self.poll_tickets();

        self.menu_bar(ctx);
        self.status_bar(ctx);
        self.viewport_panel(ctx);
        self.overlays(ctx);
        self.dialog_windows(ctx);
        self.popup_windows(ctx);
    }

    fn on_exit(&mut self, _gl: Option<&glow::Context>) {
        self.settings.publish = self.publish_draft.clone();
        self.settings.image_export = self.image_draft.clone();
        self.settings.video_export = self.video_draft.clone();
        if let Err(e) = self.settings.save(&self.path_config) {
            log::warn!("Failed to save settings: {}", e);
        }
    }
}

/// Register the UI-facing command handlers owned by the shell.
fn register_shell_commands(
    hub: &CommandHub,
    ctx: &egui::Context,
    popups: &Arc<Mutex<Vec<PopupRequest>>>,
    doc_name: &Arc<Mutex<String>>,
    session: &Arc<Mutex<Option<UserProfile>>>,
) {
    let queue = Arc::clone(popups);
    let repaint = ctx.clone();
    hub.register::<ShowPopupCommand, _>(move |cmd| {
        queue.lock().unwrap_or_else(|e| e.into_inner()).push(PopupRequest {
            kind: cmd.kind,
            header: cmd.header,
            message: cmd.message,
        });
        repaint.request_repaint();
        Ok(())
    });

    let name = Arc::clone(doc_name);
    hub.register::<DocNameCommand, _>(move |_| {
        Ok(name.lock().unwrap_or_else(|e| e.into_inner()).clone())
    });

    let auth = Arc::clone(session);
    hub.register::<UserStatusCommand, _>(move |_| {
        Ok(auth.lock().unwrap_or_else(|e| e.into_inner()).clone())
    });
}

/// Default backend handlers. An embedding application replaces these through
/// the hub's overwrite semantics.
fn register_backend_commands(hub: &CommandHub) {
    hub.register::<PublishSceneCommand, _>(|cmd| {
        info!("scene.publish: '{}' (listed: {})", cmd.settings.title, cmd.settings.listed);
        Ok(())
    });
    hub.register::<RenderImageCommand, _>(|cmd| {
        info!("render.image: {}x{}", cmd.settings.width, cmd.settings.height);
        Ok(())
    });
    hub.register::<RenderVideoCommand, _>(|cmd| {
        let container = Container::from_format(&cmd.settings.format);
        info!(
            "render.video: {} ({}) to {:?}",
            container.extension(),
            container.mime(),
            cmd.destination
        );
        Ok(())
    });
}

/// Project a world point onto the canvas for decoration drawing.
fn project_to_canvas(view_proj: Mat4, rect: egui::Rect, world: Vec3) -> Option<egui::Pos2> {
    let clip = view_proj * world.extend(1.0);
    if clip.w <= f32::EPSILON {
        return None;
    }
    let ndc = clip.truncate() / clip.w;
    if ndc.x.abs() > 1.5 || ndc.y.abs() > 1.5 {
        return None;
    }
    Some(egui::pos2(
        rect.min.x + (ndc.x + 1.0) * 0.5 * rect.width(),
        rect.min.y + (1.0 - ndc.y) * 0.5 * rect.height(),
    ))
}

/// Ground grid on y=0 so camera transitions read visually.
fn paint_ground_grid(painter: &egui::Painter, rect: egui::Rect, view_proj: Mat4) {
    let stroke = egui::Stroke::new(1.0, egui::Color32::from_gray(48));
    let axis_stroke = egui::Stroke::new(1.0, egui::Color32::from_gray(90));
    for i in -4..=4 {
        let stroke = if i == 0 { axis_stroke } else { stroke };
        let a = project_to_canvas(view_proj, rect, Vec3::new(i as f32, 0.0, -4.0));
        let b = project_to_canvas(view_proj, rect, Vec3::new(i as f32, 0.0, 4.0));
        if let (Some(a), Some(b)) = (a, b) {
            painter.line_segment([a, b], stroke);
        }
        let a = project_to_canvas(view_proj, rect, Vec3::new(-4.0, 0.0, i as f32));
        let b = project_to_canvas(view_proj, rect, Vec3::new(4.0, 0.0, i as f32));
        if let (Some(a), Some(b)) = (a, b) {
            painter.line_segment([a, b], stroke);
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = match args.verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    info!("SCENEDECK {} starting", env!("CARGO_PKG_VERSION"));

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1280.0, 800.0]),
        ..Default::default()
    };
    eframe::run_native(
        "SCENEDECK",
        options,
        Box::new(move |cc| Ok(Box::new(ScenedeckApp::new(cc, args)))),
    )
    .map_err(|e| anyhow::anyhow!("eframe failed: {}", e))?;

    info!("Application exiting");
    Ok(())
}
