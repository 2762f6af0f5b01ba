/// Demo scene: a ground, a box that tumbles when clicked, a ball that grows
/// and a bar that stretches back and forth
use std::cell::{Cell, RefCell};
use std::f32::consts::FRAC_PI_2;
use std::rc::Rc;
use std::time::Duration;

use nalgebra::{Point3, Vector3};
use simple3d_core::{
    Camera, DeliveryMode, Dispatcher, Easing, EventKind, FrameLoop, ObjectId, Repeat, Scene,
    Shape, Transform, Tween, Viewport,
};

const SPIN_TIME: Duration = Duration::from_millis(600);
const BALL_SMALL: f32 = 1.0;
const BALL_LARGE: f32 = 1.6;
const STRETCH_TIME: Duration = Duration::from_millis(1000);
const BAR_LONG: f32 = 2.5;

/// A rotation about a fixed pivot, spread over several frames
#[derive(Debug, Clone)]
struct Spin {
    object: ObjectId,
    pivot: Point3<f32>,
    axis: Vector3<f32>,
    tween: Tween,
    elapsed: Duration,
    applied: f32,
}

pub struct Demo {
    pub scene: Scene,
    pub dispatcher: Dispatcher,
    pub frame_loop: FrameLoop<Scene>,
    pub ground: ObjectId,
    pub cube: ObjectId,
    pub ball: ObjectId,
    pub bar: ObjectId,
    hovered: Rc<Cell<Option<ObjectId>>>,
    clicks: Rc<Cell<u32>>,
}

impl Demo {
    pub fn new(mode: DeliveryMode) -> Self {
        let mut scene = Scene::new();
        let ground = scene.add(
            "ground",
            Shape::Ground {
                width: 10.0,
                depth: 10.0,
            },
            Transform::identity(),
        );
        let cube = scene.add("box", Shape::unit_box(), Transform::from_position(-1.5, 0.5, 0.0));
        let ball = scene.add(
            "ball",
            Shape::Sphere { diameter: 1.0 },
            Transform::from_position(1.5, 0.5, 0.0),
        );
        let bar = scene.add("bar", Shape::unit_box(), Transform::from_position(0.0, 0.5, -3.0));

        let mut demo = Self {
            scene,
            dispatcher: Dispatcher::new(mode),
            frame_loop: FrameLoop::new(),
            ground,
            cube,
            ball,
            bar,
            hovered: Rc::new(Cell::new(None)),
            clicks: Rc::new(Cell::new(0)),
        };
        demo.wire_events();
        demo
    }

    fn wire_events(&mut self) {
        // Nearest hovered object wins: hits arrive nearest first
        for id in [self.ground, self.cube, self.ball, self.bar] {
            let hovered = Rc::clone(&self.hovered);
            self.dispatcher.register(id, EventKind::Hover, move |event, _scene| {
                if hovered.get().is_none() {
                    hovered.set(Some(event.hit.object));
                }
            });
        }

        let spins: Rc<RefCell<Vec<Spin>>> = Rc::new(RefCell::new(Vec::new()));

        let pending = Rc::clone(&spins);
        let clicks = Rc::clone(&self.clicks);
        self.dispatcher.register(self.cube, EventKind::Click, move |event, scene| {
            clicks.set(clicks.get() + 1);
            let object = event.hit.object;
            if pending.borrow().iter().any(|spin| spin.object == object) {
                return;
            }
            let Some(target) = scene.get(object) else {
                return;
            };
            // Tumble over the bottom edge on the +x side
            let transform = &target.transform;
            let edge = Vector3::new(transform.scale.x / 2.0, -transform.scale.y / 2.0, 0.0);
            pending.borrow_mut().push(Spin {
                object,
                pivot: Point3::from(transform.position + edge),
                axis: -Vector3::z(),
                tween: Tween::new(0.0, FRAC_PI_2, SPIN_TIME).with_easing(Easing::QuadInOut),
                elapsed: Duration::ZERO,
                applied: 0.0,
            });
        });

        let clicks = Rc::clone(&self.clicks);
        self.dispatcher.register(self.ball, EventKind::Click, move |event, scene| {
            clicks.set(clicks.get() + 1);
            let Ok(transform) = scene.transform_mut(event.hit.object) else {
                return;
            };
            let target = if transform.scale.x > BALL_SMALL { BALL_SMALL } else { BALL_LARGE };
            // Keep the point touching the ground fixed
            let radius = transform.scale.y / 2.0;
            let pivot = Point3::from(transform.position - Vector3::new(0.0, radius, 0.0));
            if let Err(err) = transform.scale_from_pivot(&pivot, target, target, target) {
                log::warn!("demo: cannot resize ball: {err}");
            }
        });

        self.frame_loop.on_update(move |scene, dt| {
            spins.borrow_mut().retain_mut(|spin| advance_spin(spin, scene, dt));
        });

        // Stretch along x with the left end held in place, forever
        let bar = self.bar;
        let stretch = Tween::new(1.0, BAR_LONG, STRETCH_TIME)
            .with_easing(Easing::QuadInOut)
            .with_repeat(Repeat::Forever)
            .with_yoyo(true);
        let mut elapsed = Duration::ZERO;
        self.frame_loop.on_update(move |scene, dt| {
            elapsed += dt;
            let Ok(transform) = scene.transform_mut(bar) else {
                return;
            };
            let (sy, sz) = (transform.scale.y, transform.scale.z);
            if let Err(err) = transform.scale_from_min_corner(stretch.sample(elapsed), sy, sz) {
                log::warn!("demo: cannot stretch bar: {err}");
            }
        });
    }

    /// Route a pointer event at cell-space coordinates through the dispatcher
    pub fn pointer(
        &mut self,
        camera: &Camera,
        viewport: &Viewport,
        x: f32,
        y: f32,
        kind: &EventKind,
    ) -> simple3d_core::Result<usize> {
        if *kind == EventKind::Hover {
            self.hovered.set(None);
        }
        let invoked = self
            .dispatcher
            .dispatch(&mut self.scene, camera, viewport, x, y, kind)?;
        if invoked > 0 {
            self.frame_loop.request_render();
        }
        Ok(invoked)
    }

    pub fn tick(&mut self, dt: Duration) -> bool {
        self.frame_loop.tick(&mut self.scene, dt)
    }

    pub fn hovered(&self) -> Option<ObjectId> {
        self.hovered.get()
    }

    pub fn clicks(&self) -> u32 {
        self.clicks.get()
    }

    pub fn toggle_delivery_mode(&self) -> DeliveryMode {
        let next = match self.dispatcher.mode() {
            DeliveryMode::AllHits => DeliveryMode::NearestHit,
            DeliveryMode::NearestHit => DeliveryMode::AllHits,
        };
        self.dispatcher.set_mode(next);
        log::info!("demo: delivery mode is now {next:?}");
        next
    }
}

/// Apply this frame's share of a spin; false once it is done
fn advance_spin(spin: &mut Spin, scene: &mut Scene, dt: Duration) -> bool {
    spin.elapsed += dt;
    let angle = spin.tween.sample(spin.elapsed);
    let Ok(transform) = scene.transform_mut(spin.object) else {
        return false;
    };
    if let Err(err) = transform.rotate_around_pivot(&spin.pivot, &spin.axis, angle - spin.applied) {
        log::warn!("demo: dropping spin of {}: {err}", spin.object);
        return false;
    }
    spin.applied = angle;
    !spin.tween.is_finished(spin.elapsed)
}
