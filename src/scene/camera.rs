//! Camera poses, easing curves and named preset application.
//!
//! apply_preset() fires a SetCameraPoseEvent on the bus and, as a defensive
//! fallback for shells where the pose listener might not be wired, also calls
//! the injected scene capability directly. Both paths may execute; the rig
//! treats a repeated identical pose as a restart of the same transition.

use std::f32::consts::{FRAC_PI_4, PI};
use std::sync::Arc;

use glam::{Mat4, Vec3};
use indexmap::IndexMap;
use log::{debug, warn};
use once_cell::sync::Lazy;

use crate::core::event_bus::EventEmitter;
use crate::scene::camera_events::SetCameraPoseEvent;
use crate::scene::capability::SceneCapability;

/// Transition speed used by all presets (transition progress per second).
pub const PRESET_SPEED: f32 = 1.6;

/// Easing curve used by all presets.
pub const PRESET_EASING: Easing = Easing::CubicInOut;

/// Named interpolation curve for pose transitions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Easing {
    Linear,
    SineInOut,
    CubicInOut,
    QuintInOut,
}

impl Easing {
    pub fn all() -> &'static [Easing] {
        &[Easing::Linear, Easing::SineInOut, Easing::CubicInOut, Easing::QuintInOut]
    }

    /// Map linear progress t in [0,1] onto the curve. f(0)=0, f(1)=1.
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::SineInOut => -((PI * t).cos() - 1.0) / 2.0,
            Easing::CubicInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            Easing::QuintInOut => {
                if t < 0.5 {
                    16.0 * t.powi(5)
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(5) / 2.0
                }
            }
        }
    }
}

impl std::fmt::Display for Easing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Easing::Linear => write!(f, "Linear"),
            Easing::SineInOut => write!(f, "Sine In/Out"),
            Easing::CubicInOut => write!(f, "Cubic In/Out"),
            Easing::QuintInOut => write!(f, "Quint In/Out"),
        }
    }
}

/// Camera position + look-at target + transition parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct CameraPose {
    pub position: Vec3,
    pub target: Vec3,
    pub speed: f32,
    pub easing: Easing,
}

/// Fixed preset table: key -> (position, target).
///
/// "top" is nudged off the vertical axis so look_at keeps a valid up vector.
static PRESETS: Lazy<IndexMap<&'static str, (Vec3, Vec3)>> = Lazy::new(|| {
    IndexMap::from([
        ("home", (Vec3::new(5.0, 3.5, 5.0), Vec3::new(0.0, 0.8, 0.0))),
        ("front", (Vec3::new(0.0, 1.0, 8.0), Vec3::new(0.0, 1.0, 0.0))),
        ("back", (Vec3::new(0.0, 1.0, -8.0), Vec3::new(0.0, 1.0, 0.0))),
        ("left", (Vec3::new(-8.0, 1.0, 0.0), Vec3::new(0.0, 1.0, 0.0))),
        ("right", (Vec3::new(8.0, 1.0, 0.0), Vec3::new(0.0, 1.0, 0.0))),
        ("top", (Vec3::new(0.0, 9.0, 0.01), Vec3::ZERO)),
    ])
});

/// Look up a preset pose by key.
pub fn preset_pose(key: &str) -> Option<CameraPose> {
    PRESETS.get(key).map(|(position, target)| CameraPose {
        position: *position,
        target: *target,
        speed: PRESET_SPEED,
        easing: PRESET_EASING,
    })
}

/// Preset keys in menu order.
pub fn preset_keys() -> impl Iterator<Item = &'static str> {
    PRESETS.keys().copied()
}

/// Applies named camera poses via the bus, with a direct capability fallback.
pub struct CameraPresetController {
    emitter: EventEmitter,
    scene: Option<Arc<dyn SceneCapability>>,
}

impl CameraPresetController {
    pub fn new(emitter: EventEmitter) -> Self {
        Self { emitter, scene: None }
    }

    /// Inject the scene capability enabling the direct fallback path.
    pub fn with_scene(emitter: EventEmitter, scene: Arc<dyn SceneCapability>) -> Self {
        Self { emitter, scene: Some(scene) }
    }

    /// Apply a preset by key. Returns false (and fires nothing) on unknown keys.
    pub fn apply_preset(&self, key: &str) -> bool {
        let Some(pose) = preset_pose(key) else {
            warn!("unknown camera preset '{}'", key);
            return false;
        };
        debug!("applying camera preset '{}'", key);
        self.emitter.emit(SetCameraPoseEvent { pose: pose.clone() });

        // Defensive fallback: also reach the scene directly, in case the pose
        // listener is absent in this shell. Both paths may execute.
        if let Some(scene) = &self.scene {
            scene.set_camera_pose(&pose);
            scene.request_redraw();
        }
        true
    }
}

/// Shell-side camera state: current position/target plus an eased transition.
#[derive(Debug)]
pub struct CameraRig {
    position: Vec3,
    target: Vec3,
    transition: Option<Transition>,
}

#[derive(Debug)]
struct Transition {
    from_position: Vec3,
    from_target: Vec3,
    to: CameraPose,
    t: f32,
}

impl Default for CameraRig {
    fn default() -> Self {
        let (position, target) = PRESETS["home"];
        Self { position, target, transition: None }
    }
}

impl CameraRig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    /// Begin an eased transition from the current pose.
    pub fn set_pose(&mut self, pose: &CameraPose) {
        self.transition = Some(Transition {
            from_position: self.position,
            from_target: self.target,
            to: pose.clone(),
            t: 0.0,
        });
    }

    /// Advance the running transition by dt seconds. Returns true while animating.
    pub fn advance(&mut self, dt: f32) -> bool {
        let Some(tr) = &mut self.transition else {
            return false;
        };
        tr.t = (tr.t + dt * tr.to.speed).min(1.0);
        let k = tr.to.easing.apply(tr.t);
        self.position = tr.from_position.lerp(tr.to.position, k);
        self.target = tr.from_target.lerp(tr.to.target, k);
        if tr.t >= 1.0 {
            self.transition = None;
        }
        true
    }

    pub fn is_animating(&self) -> bool {
        self.transition.is_some()
    }

    /// View-projection matrix for the current pose.
    pub fn view_proj(&self, aspect: f32) -> Mat4 {
        let proj = Mat4::perspective_rh_gl(FRAC_PI_4, aspect.max(1e-3), 0.1, 100.0);
        let view = Mat4::look_at_rh(self.position, self.target, Vec3::Y);
        proj * view
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::event_bus::EventBus;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[test]
    fn test_easing_endpoints() {
        for easing in Easing::all() {
            assert_eq!(easing.apply(0.0), 0.0, "{} at 0", easing);
            assert!((easing.apply(1.0) - 1.0).abs() < 1e-6, "{} at 1", easing);
            // In/out curves pass through the midpoint
            assert!((easing.apply(0.5) - 0.5).abs() < 1e-6, "{} at 0.5", easing);
        }
    }

    #[test]
    fn test_easing_clamps_input() {
        assert_eq!(Easing::CubicInOut.apply(-2.0), 0.0);
        assert!((Easing::CubicInOut.apply(3.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_preset_lookup() {
        let pose = preset_pose("front").unwrap();
        assert_eq!(pose.position, Vec3::new(0.0, 1.0, 8.0));
        assert_eq!(pose.speed, PRESET_SPEED);
        assert_eq!(pose.easing, PRESET_EASING);

        assert!(preset_pose("isometric").is_none());
        assert!(preset_keys().any(|k| k == "top"));
    }

    #[test]
    fn test_apply_preset_fires_event() {
        let bus = EventBus::new();
        let seen: std::sync::Arc<Mutex<Vec<CameraPose>>> = Default::default();
        let s = std::sync::Arc::clone(&seen);
        bus.subscribe::<SetCameraPoseEvent, _>(move |e| {
            s.lock().unwrap().push(e.pose.clone());
        });

        let controller = CameraPresetController::new(bus.emitter());
        assert!(controller.apply_preset("home"));
        assert_eq!(seen.lock().unwrap().len(), 1);
        assert_eq!(seen.lock().unwrap()[0].position, Vec3::new(5.0, 3.5, 5.0));
    }

    #[test]
    fn test_unknown_preset_fires_nothing() {
        let bus = EventBus::new();
        let count = std::sync::Arc::new(AtomicUsize::new(0));
        let c = std::sync::Arc::clone(&count);
        bus.subscribe::<SetCameraPoseEvent, _>(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        let controller = CameraPresetController::new(bus.emitter());
        assert!(!controller.apply_preset("no-such-pose"));
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    struct CountingScene {
        poses: AtomicUsize,
        redraws: AtomicUsize,
    }

    impl SceneCapability for CountingScene {
        fn set_camera_pose(&self, _pose: &CameraPose) {
            self.poses.fetch_add(1, Ordering::SeqCst);
        }
        fn request_redraw(&self) {
            self.redraws.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_apply_preset_uses_both_paths() {
        let bus = EventBus::new();
        let bus_hits = std::sync::Arc::new(AtomicUsize::new(0));
        let c = std::sync::Arc::clone(&bus_hits);
        bus.subscribe::<SetCameraPoseEvent, _>(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        let scene = std::sync::Arc::new(CountingScene {
            poses: AtomicUsize::new(0),
            redraws: AtomicUsize::new(0),
        });
        let scene_capability: std::sync::Arc<dyn SceneCapability> = scene.clone();
        let controller = CameraPresetController::with_scene(bus.emitter(), scene_capability);
        assert!(controller.apply_preset("top"));

        // Event fired AND capability called: intentional redundancy
        assert_eq!(bus_hits.load(Ordering::SeqCst), 1);
        assert_eq!(scene.poses.load(Ordering::SeqCst), 1);
        assert_eq!(scene.redraws.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_rig_transition_reaches_pose() {
        let mut rig = CameraRig::new();
        let pose = preset_pose("front").unwrap();
        rig.set_pose(&pose);
        assert!(rig.is_animating());

        // Plenty of time to finish regardless of speed
        while rig.advance(0.05) {}
        assert!(!rig.is_animating());
        assert!((rig.position() - pose.position).length() < 1e-4);
        assert!((rig.target() - pose.target).length() < 1e-4);
    }

    #[test]
    fn test_rig_view_proj_is_finite() {
        let rig = CameraRig::new();
        let m = rig.view_proj(16.0 / 9.0);
        assert!(m.to_cols_array().iter().all(|v| v.is_finite()));
    }
}
