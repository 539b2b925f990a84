//! Modal dialog orchestration: publish, image export, video export.
//!
//! Per dialog kind the state machine is Idle -> Showing -> resolved -> Idle.
//! show_*() hands back a DialogTicket; the shell draws the dialog while the
//! kind is showing and calls confirm/cancel from the buttons. Confirm paths
//! invoke the external commands; any command failure is surfaced through a
//! ShowPopupCommand with the kind's header and the failure's message, except
//! destination-picker cancellation in the video flow, which ends the flow
//! silently.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crossbeam_channel::Sender;
use log::{debug, info, warn};
use uuid::Uuid;

use crate::commands::{
    DocNameCommand, PopupKind, PublishSceneCommand, RenderImageCommand, RenderVideoCommand,
    ShowPopupCommand, UserStatusCommand,
};
use crate::core::command_hub::CommandHub;
use crate::dialogs::export::{
    codec_label, suggested_output_name, Container, ImageExportSettings, VideoExportSettings,
};
use crate::dialogs::host::{DestinationChoice, SaveDestinationHost};
use crate::dialogs::outcome::{DialogKind, DialogOutcome, DialogTicket};
use crate::dialogs::publish::{PublishSettings, LOGIN_REQUIRED_MESSAGE};

const PUBLISH_HEADER: &str = "Publish";
const IMAGE_HEADER: &str = "Image export";
const VIDEO_HEADER: &str = "Video export";

/// Resolver half of an open dialog.
struct Pending<T> {
    id: Uuid,
    tx: Sender<DialogOutcome<T>>,
}

/// Orchestrates the three modal dialog flows over the command hub.
pub struct DialogOrchestrator {
    hub: CommandHub,
    host: Arc<dyn SaveDestinationHost>,
    publish: Mutex<Option<Pending<PublishSettings>>>,
    image: Mutex<Option<Pending<ImageExportSettings>>>,
    video: Mutex<Option<Pending<VideoExportSettings>>>,
}

impl DialogOrchestrator {
    pub fn new(hub: CommandHub, host: Arc<dyn SaveDestinationHost>) -> Self {
        Self {
            hub,
            host,
            publish: Mutex::new(None),
            image: Mutex::new(None),
            video: Mutex::new(None),
        }
    }

    /// Whether a dialog of this kind is currently showing.
    pub fn is_showing(&self, kind: DialogKind) -> bool {
        match kind {
            DialogKind::Publish => self.publish.lock().unwrap_or_else(|e| e.into_inner()).is_some(),
            DialogKind::ImageExport => self.image.lock().unwrap_or_else(|e| e.into_inner()).is_some(),
            DialogKind::VideoExport => self.video.lock().unwrap_or_else(|e| e.into_inner()).is_some(),
        }
    }

    /// Cancel an open dialog (user dismissed it without confirming).
    pub fn cancel(&self, kind: DialogKind) {
        match kind {
            DialogKind::Publish => Self::cancel_slot(&self.publish, kind),
            DialogKind::ImageExport => Self::cancel_slot(&self.image, kind),
            DialogKind::VideoExport => Self::cancel_slot(&self.video, kind),
        }
    }

    fn cancel_slot<T>(slot: &Mutex<Option<Pending<T>>>, kind: DialogKind) {
        if let Some(pending) = slot.lock().unwrap_or_else(|e| e.into_inner()).take() {
            debug!("{} dialog cancelled ({})", kind, pending.id);
            let _ = pending.tx.send(DialogOutcome::Cancelled);
        }
    }

    fn notify_error(&self, header: &str, message: &str) {
        if let Err(err) = self.hub.invoke(ShowPopupCommand {
            kind: PopupKind::Error,
            header: header.to_string(),
            message: message.to_string(),
        }) {
            warn!("failed to show error popup '{}': {}", header, err);
        }
    }

    // ========== Publish ==========

    /// Open the publish dialog.
    ///
    /// Auth gate runs first: an unauthenticated session shows the login
    /// notification and resolves Cancelled without ever opening the dialog.
    pub fn show_publish(&self) -> DialogTicket<PublishSettings> {
        let (tx, ticket) = DialogTicket::channel();
        if self.is_showing(DialogKind::Publish) {
            warn!("publish dialog already open, ignoring show request");
            let _ = tx.send(DialogOutcome::Cancelled);
            return ticket;
        }

        // Auth gate runs with no slot lock held: the popup handler may
        // legitimately call back into the orchestrator.
        match self.hub.invoke(UserStatusCommand) {
            Ok(Some(profile)) => {
                debug!("publish dialog opened ({}) for user {}", ticket.id(), profile.name);
            }
            Ok(None) => {
                info!("publish blocked: not logged in");
                self.notify_error(PUBLISH_HEADER, LOGIN_REQUIRED_MESSAGE);
                let _ = tx.send(DialogOutcome::Cancelled);
                return ticket;
            }
            Err(err) => {
                let message = err.message();
                self.notify_error(PUBLISH_HEADER, &message);
                let _ = tx.send(DialogOutcome::Failed(message));
                return ticket;
            }
        }

        *self.publish.lock().unwrap_or_else(|e| e.into_inner()) =
            Some(Pending { id: ticket.id(), tx });
        ticket
    }

    /// Confirm the publish dialog with the edited settings.
    pub fn confirm_publish(&self, settings: PublishSettings) {
        let Some(pending) = self.publish.lock().unwrap_or_else(|e| e.into_inner()).take() else {
            warn!("confirm_publish with no open dialog");
            return;
        };
        match self.hub.invoke(PublishSceneCommand { settings: settings.clone() }) {
            Ok(()) => {
                info!("scene published ({})", pending.id);
                let _ = pending.tx.send(DialogOutcome::Confirmed(settings));
            }
            Err(err) => {
                let message = err.message();
                self.notify_error(PUBLISH_HEADER, &message);
                let _ = pending.tx.send(DialogOutcome::Failed(message));
            }
        }
    }

    // ========== Image export ==========

    pub fn show_image_export(&self) -> DialogTicket<ImageExportSettings> {
        let (tx, ticket) = DialogTicket::channel();
        let mut slot = self.image.lock().unwrap_or_else(|e| e.into_inner());
        if slot.is_some() {
            warn!("image export dialog already open, ignoring show request");
            let _ = tx.send(DialogOutcome::Cancelled);
            return ticket;
        }
        debug!("image export dialog opened ({})", ticket.id());
        *slot = Some(Pending { id: ticket.id(), tx });
        ticket
    }

    pub fn confirm_image_export(&self, settings: ImageExportSettings) {
        let Some(pending) = self.image.lock().unwrap_or_else(|e| e.into_inner()).take() else {
            warn!("confirm_image_export with no open dialog");
            return;
        };
        match self.hub.invoke(RenderImageCommand { settings: settings.clone() }) {
            Ok(()) => {
                info!("image rendered ({})", pending.id);
                let _ = pending.tx.send(DialogOutcome::Confirmed(settings));
            }
            Err(err) => {
                let message = err.message();
                self.notify_error(IMAGE_HEADER, &message);
                let _ = pending.tx.send(DialogOutcome::Failed(message));
            }
        }
    }

    // ========== Video export ==========

    pub fn show_video_export(&self) -> DialogTicket<VideoExportSettings> {
        let (tx, ticket) = DialogTicket::channel();
        let mut slot = self.video.lock().unwrap_or_else(|e| e.into_inner());
        if slot.is_some() {
            warn!("video export dialog already open, ignoring show request");
            let _ = tx.send(DialogOutcome::Cancelled);
            return ticket;
        }
        debug!("video export dialog opened ({})", ticket.id());
        *slot = Some(Pending { id: ticket.id(), tx });
        ticket
    }

    /// Confirm the video export dialog with the edited settings.
    ///
    /// Picker cancellation ends the flow silently: Cancelled outcome, no
    /// popup, no render. An unavailable picker renders without a destination.
    pub fn confirm_video_export(&self, settings: VideoExportSettings) {
        let Some(pending) = self.video.lock().unwrap_or_else(|e| e.into_inner()).take() else {
            warn!("confirm_video_export with no open dialog");
            return;
        };
        match self.run_video_export(&settings) {
            Ok(Some(())) => {
                info!("video rendered ({})", pending.id);
                let _ = pending.tx.send(DialogOutcome::Confirmed(settings));
            }
            Ok(None) => {
                debug!("video export cancelled at destination picker ({})", pending.id);
                let _ = pending.tx.send(DialogOutcome::Cancelled);
            }
            Err(message) => {
                self.notify_error(VIDEO_HEADER, &message);
                let _ = pending.tx.send(DialogOutcome::Failed(message));
            }
        }
    }

    /// Ok(Some) rendered, Ok(None) user cancelled at the picker, Err broken.
    fn run_video_export(&self, settings: &VideoExportSettings) -> Result<Option<()>, String> {
        let container = Container::from_format(&settings.format);
        debug!(
            "video export: {} ({}), codec {}",
            container.extension(),
            container.mime(),
            codec_label(&settings.codec)
        );

        let doc_name = self.hub.invoke(DocNameCommand).map_err(|e| e.message())?;
        let suggested = suggested_output_name(&doc_name, container);

        let destination: Option<PathBuf> =
            match self.host.pick_save_destination(&suggested, container.extension()) {
                DestinationChoice::Selected(path) => Some(path),
                DestinationChoice::Unavailable => {
                    debug!("no destination picker in this environment, rendering without one");
                    None
                }
                DestinationChoice::Cancelled => return Ok(None),
            };

        self.hub
            .invoke(RenderVideoCommand { settings: settings.clone(), destination })
            .map_err(|e| e.message())?;
        Ok(Some(()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialogs::publish::UserProfile;

    /// Everything the flows touched, for assertions.
    #[derive(Default)]
    struct Recorded {
        popups: Vec<(PopupKind, String, String)>,
        published: Vec<PublishSettings>,
        rendered_videos: Vec<(VideoExportSettings, Option<PathBuf>)>,
        rendered_images: Vec<ImageExportSettings>,
        picker_calls: Vec<(String, String)>,
    }

    struct FakeHost {
        choice: DestinationChoice,
        recorded: Arc<Mutex<Recorded>>,
    }

    impl SaveDestinationHost for FakeHost {
        fn pick_save_destination(&self, suggested_name: &str, extension: &str) -> DestinationChoice {
            self.recorded
                .lock()
                .unwrap()
                .picker_calls
                .push((suggested_name.to_string(), extension.to_string()));
            self.choice.clone()
        }
    }

    struct Fixture {
        orchestrator: DialogOrchestrator,
        recorded: Arc<Mutex<Recorded>>,
        hub: CommandHub,
    }

    fn fixture(logged_in: bool, picker: DestinationChoice) -> Fixture {
        let recorded: Arc<Mutex<Recorded>> = Default::default();
        let hub = CommandHub::new();

        let r = Arc::clone(&recorded);
        hub.register::<ShowPopupCommand, _>(move |cmd| {
            r.lock().unwrap().popups.push((cmd.kind, cmd.header, cmd.message));
            Ok(())
        });
        hub.register::<UserStatusCommand, _>(move |_| {
            Ok(logged_in.then(|| UserProfile { name: "ada".to_string() }))
        });
        let r = Arc::clone(&recorded);
        hub.register::<PublishSceneCommand, _>(move |cmd| {
            r.lock().unwrap().published.push(cmd.settings);
            Ok(())
        });
        let r = Arc::clone(&recorded);
        hub.register::<RenderImageCommand, _>(move |cmd| {
            r.lock().unwrap().rendered_images.push(cmd.settings);
            Ok(())
        });
        let r = Arc::clone(&recorded);
        hub.register::<RenderVideoCommand, _>(move |cmd| {
            r.lock().unwrap().rendered_videos.push((cmd.settings, cmd.destination));
            Ok(())
        });
        hub.register::<DocNameCommand, _>(|_| Ok("scene.ply".to_string()));

        let host = Arc::new(FakeHost { choice: picker, recorded: Arc::clone(&recorded) });
        Fixture {
            orchestrator: DialogOrchestrator::new(hub.clone(), host),
            recorded,
            hub,
        }
    }

    fn mkv_settings() -> VideoExportSettings {
        VideoExportSettings {
            format: "mkv".to_string(),
            codec: "h265".to_string(),
            ..VideoExportSettings::default()
        }
    }

    #[test]
    fn test_publish_blocked_without_login() {
        let f = fixture(false, DestinationChoice::Unavailable);
        let ticket = f.orchestrator.show_publish();

        // Resolved Cancelled without the dialog ever showing
        assert_eq!(ticket.try_outcome(), Some(DialogOutcome::Cancelled));
        assert!(!f.orchestrator.is_showing(DialogKind::Publish));

        let rec = f.recorded.lock().unwrap();
        assert_eq!(rec.popups.len(), 1);
        assert_eq!(rec.popups[0].0, PopupKind::Error);
        assert_eq!(rec.popups[0].2, LOGIN_REQUIRED_MESSAGE);
        assert!(rec.published.is_empty());
    }

    #[test]
    fn test_publish_confirm_invokes_backend() {
        let f = fixture(true, DestinationChoice::Unavailable);
        let ticket = f.orchestrator.show_publish();
        assert!(f.orchestrator.is_showing(DialogKind::Publish));
        assert!(ticket.try_outcome().is_none());

        let settings = PublishSettings { title: "Turntable".to_string(), ..Default::default() };
        f.orchestrator.confirm_publish(settings.clone());

        assert_eq!(ticket.try_outcome(), Some(DialogOutcome::Confirmed(settings)));
        assert!(!f.orchestrator.is_showing(DialogKind::Publish));
        let rec = f.recorded.lock().unwrap();
        assert_eq!(rec.published.len(), 1);
        assert_eq!(rec.published[0].title, "Turntable");
        assert!(rec.popups.is_empty());
    }

    #[test]
    fn test_publish_backend_failure_notifies() {
        let f = fixture(true, DestinationChoice::Unavailable);
        f.hub.register::<PublishSceneCommand, _>(|_| Err(anyhow::anyhow!("server unreachable")));

        let ticket = f.orchestrator.show_publish();
        f.orchestrator.confirm_publish(PublishSettings::default());

        assert_eq!(ticket.try_outcome(), Some(DialogOutcome::Failed("server unreachable".to_string())));
        let rec = f.recorded.lock().unwrap();
        assert_eq!(rec.popups.len(), 1);
        assert_eq!(rec.popups[0].1, "Publish");
        assert_eq!(rec.popups[0].2, "server unreachable");
    }

    #[test]
    fn test_publish_cancel() {
        let f = fixture(true, DestinationChoice::Unavailable);
        let ticket = f.orchestrator.show_publish();
        f.orchestrator.cancel(DialogKind::Publish);

        assert_eq!(ticket.try_outcome(), Some(DialogOutcome::Cancelled));
        assert!(f.recorded.lock().unwrap().published.is_empty());
    }

    #[test]
    fn test_image_confirm_renders() {
        let f = fixture(true, DestinationChoice::Unavailable);
        let ticket = f.orchestrator.show_image_export();
        f.orchestrator.confirm_image_export(ImageExportSettings::default());

        assert!(matches!(ticket.try_outcome(), Some(DialogOutcome::Confirmed(_))));
        assert_eq!(f.recorded.lock().unwrap().rendered_images.len(), 1);
    }

    #[test]
    fn test_video_confirm_with_destination() {
        let dest = PathBuf::from("/out/movie.mkv");
        let f = fixture(true, DestinationChoice::Selected(dest.clone()));
        let ticket = f.orchestrator.show_video_export();
        f.orchestrator.confirm_video_export(mkv_settings());

        assert!(matches!(ticket.try_outcome(), Some(DialogOutcome::Confirmed(_))));
        let rec = f.recorded.lock().unwrap();
        // Document "scene.ply" + mkv container: picker got "scene.mkv"
        assert_eq!(rec.picker_calls, vec![("scene.mkv".to_string(), "mkv".to_string())]);
        assert_eq!(rec.rendered_videos.len(), 1);
        assert_eq!(rec.rendered_videos[0].1, Some(dest));
        assert!(rec.popups.is_empty());
    }

    #[test]
    fn test_video_picker_cancel_is_silent() {
        let f = fixture(true, DestinationChoice::Cancelled);
        let ticket = f.orchestrator.show_video_export();
        f.orchestrator.confirm_video_export(mkv_settings());

        assert_eq!(ticket.try_outcome(), Some(DialogOutcome::Cancelled));
        let rec = f.recorded.lock().unwrap();
        // The one cancellation that is not failure: no popup, no render
        assert!(rec.popups.is_empty());
        assert!(rec.rendered_videos.is_empty());
    }

    #[test]
    fn test_video_unavailable_picker_renders_without_destination() {
        let f = fixture(true, DestinationChoice::Unavailable);
        let ticket = f.orchestrator.show_video_export();
        f.orchestrator.confirm_video_export(mkv_settings());

        assert!(matches!(ticket.try_outcome(), Some(DialogOutcome::Confirmed(_))));
        let rec = f.recorded.lock().unwrap();
        assert_eq!(rec.rendered_videos.len(), 1);
        assert_eq!(rec.rendered_videos[0].1, None);
    }

    #[test]
    fn test_video_render_failure_notifies() {
        let f = fixture(true, DestinationChoice::Unavailable);
        f.hub.register::<RenderVideoCommand, _>(|_| Err(anyhow::anyhow!("disk full")));

        let ticket = f.orchestrator.show_video_export();
        f.orchestrator.confirm_video_export(mkv_settings());

        assert_eq!(ticket.try_outcome(), Some(DialogOutcome::Failed("disk full".to_string())));
        let rec = f.recorded.lock().unwrap();
        assert_eq!(rec.popups.len(), 1);
        assert_eq!(rec.popups[0].1, "Video export");
        assert_eq!(rec.popups[0].2, "disk full");
    }

    #[test]
    fn test_second_show_while_open_is_rejected() {
        let f = fixture(true, DestinationChoice::Unavailable);
        let first = f.orchestrator.show_video_export();
        let second = f.orchestrator.show_video_export();

        // The latecomer resolves Cancelled; the open dialog is untouched
        assert_eq!(second.try_outcome(), Some(DialogOutcome::Cancelled));
        assert!(first.try_outcome().is_none());
        assert!(f.orchestrator.is_showing(DialogKind::VideoExport));
    }
}
