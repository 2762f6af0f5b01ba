/// Simple3D Web - wasm-bindgen host for pivot transforms and pick dispatch
///
/// The page owns the canvas and the render loop; this module owns the scene,
/// the camera and the per-object JS callbacks. Pointer events are forwarded
/// with `dispatch(x, y, "click")` and callbacks receive a plain JS object
/// describing the hit.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use js_sys::{Array, Function, Object, Reflect};
use nalgebra::{Point3, Vector3};
use simple3d_core::{
    Camera, DeliveryMode, Dispatcher, Error, EventKind, FrameLoop, ObjectId, PickEvent,
    RotationState, Scene, Shape, Transform, Viewport,
};
use wasm_bindgen::prelude::*;

/// Used when there is no window to measure (workers, tests)
const FALLBACK_SIZE: (f32, f32) = (800.0, 600.0);

fn to_js(err: Error) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn window_size() -> Option<(f32, f32)> {
    let window = web_sys::window()?;
    let width = window.inner_width().ok()?.as_f64()?;
    let height = window.inner_height().ok()?.as_f64()?;
    Some((width as f32, height as f32))
}

/// Scene handle exposed to JavaScript.
///
/// Every method takes `&self` so a JS callback may call back into the scene
/// while a dispatch is running. The scene is never borrowed across a callback.
#[wasm_bindgen]
pub struct WebScene {
    scene: Rc<RefCell<Scene>>,
    camera: RefCell<Camera>,
    viewport: Cell<Viewport>,
    dispatcher: Dispatcher<()>,
    frame_loop: RefCell<FrameLoop<Scene>>,
}

#[wasm_bindgen]
impl WebScene {
    /// Create a scene sized to the browser window
    #[wasm_bindgen(constructor)]
    pub fn new() -> WebScene {
        let (width, height) = window_size().unwrap_or(FALLBACK_SIZE);
        WebScene::with_size(width, height)
    }

    /// Create a scene for a surface of the given size in CSS pixels
    pub fn with_size(width: f32, height: f32) -> WebScene {
        let viewport = Viewport::new(width.max(1.0), height.max(1.0));
        let mut camera = Camera::new(viewport.width as u32, viewport.height as u32);
        camera.set_viewport(&viewport);
        WebScene {
            scene: Rc::new(RefCell::new(Scene::new())),
            camera: RefCell::new(camera),
            viewport: Cell::new(viewport),
            dispatcher: Dispatcher::default(),
            frame_loop: RefCell::new(FrameLoop::new()),
        }
    }

    pub fn add_box(&self, name: &str, x: f32, y: f32, z: f32, width: f32, height: f32, depth: f32) -> u32 {
        self.add(name, Shape::Cuboid { width, height, depth }, x, y, z)
    }

    pub fn add_sphere(&self, name: &str, x: f32, y: f32, z: f32, diameter: f32) -> u32 {
        self.add(name, Shape::Sphere { diameter }, x, y, z)
    }

    pub fn add_ground(&self, name: &str, width: f32, depth: f32) -> u32 {
        self.add(name, Shape::Ground { width, depth }, 0.0, 0.0, 0.0)
    }

    /// Remove an object and every callback registered for it
    pub fn remove(&self, id: u32) -> bool {
        let id = ObjectId(id);
        let removed = self.scene.borrow_mut().remove(id).is_some();
        self.dispatcher.unregister_all(id);
        if removed {
            self.frame_loop.borrow_mut().request_render();
        }
        removed
    }

    /// World position as `[x, y, z]`
    pub fn position(&self, id: u32) -> Result<Vec<f32>, JsValue> {
        self.read(id, |transform| transform.position.as_slice().to_vec())
    }

    /// Per-axis scale as `[x, y, z]`
    pub fn scale(&self, id: u32) -> Result<Vec<f32>, JsValue> {
        self.read(id, |transform| transform.scale.as_slice().to_vec())
    }

    /// Euler angles in radians as `[x, y, z]`
    pub fn rotation(&self, id: u32) -> Result<Vec<f32>, JsValue> {
        self.read(id, |transform| {
            let euler = transform.euler();
            vec![euler.x, euler.y, euler.z]
        })
    }

    pub fn set_position(&self, id: u32, x: f32, y: f32, z: f32) -> Result<(), JsValue> {
        self.update(id, |transform| {
            transform.set_position(x, y, z);
            Ok(())
        })
    }

    /// Move by an offset
    pub fn translate(&self, id: u32, dx: f32, dy: f32, dz: f32) -> Result<(), JsValue> {
        self.update(id, |transform| {
            transform.translate(dx, dy, dz);
            Ok(())
        })
    }

    /// Replace the orientation with Euler angles in radians
    pub fn set_rotation(&self, id: u32, x: f32, y: f32, z: f32) -> Result<(), JsValue> {
        self.update(id, |transform| {
            transform.set_euler(RotationState::new(x, y, z));
            Ok(())
        })
    }

    /// Set the absolute scale keeping the minimum corner of the box in place
    pub fn set_scale(&self, id: u32, sx: f32, sy: f32, sz: f32) -> Result<(), JsValue> {
        self.update(id, |transform| transform.scale_from_min_corner(sx, sy, sz))
    }

    /// Hidden objects are neither drawn nor picked
    pub fn set_visible(&self, id: u32, visible: bool) -> Result<(), JsValue> {
        self.scene
            .borrow_mut()
            .object_mut(ObjectId(id))
            .map_err(to_js)?
            .visible = visible;
        self.frame_loop.borrow_mut().request_render();
        Ok(())
    }

    /// Unpickable objects stay visible but never reach callbacks
    pub fn set_pickable(&self, id: u32, pickable: bool) -> Result<(), JsValue> {
        self.scene
            .borrow_mut()
            .object_mut(ObjectId(id))
            .map_err(to_js)?
            .pickable = pickable;
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    pub fn rotate_around_pivot(
        &self,
        id: u32,
        pivot_x: f32,
        pivot_y: f32,
        pivot_z: f32,
        axis_x: f32,
        axis_y: f32,
        axis_z: f32,
        angle: f32,
    ) -> Result<(), JsValue> {
        let pivot = Point3::new(pivot_x, pivot_y, pivot_z);
        let axis = Vector3::new(axis_x, axis_y, axis_z);
        self.update(id, |transform| transform.rotate_around_pivot(&pivot, &axis, angle))
    }

    #[allow(clippy::too_many_arguments)]
    pub fn scale_from_pivot(
        &self,
        id: u32,
        pivot_x: f32,
        pivot_y: f32,
        pivot_z: f32,
        sx: f32,
        sy: f32,
        sz: f32,
    ) -> Result<(), JsValue> {
        let pivot = Point3::new(pivot_x, pivot_y, pivot_z);
        self.update(id, |transform| transform.scale_from_pivot(&pivot, sx, sy, sz))
    }

    /// Register `callback` for `(id, kind)`. Returns true if it replaced one.
    pub fn on(&self, id: u32, kind: &str, callback: Function) -> Result<bool, JsValue> {
        let kind: EventKind = kind.parse().map_err(to_js)?;
        let replaced = self.dispatcher.register(ObjectId(id), kind, move |event, _| {
            if let Err(err) = callback.call1(&JsValue::NULL, &event_object(event)) {
                log::warn!("web: {} callback for {} threw {err:?}", event.kind, event.hit.object);
            }
        });
        Ok(replaced)
    }

    pub fn off(&self, id: u32, kind: &str) -> Result<bool, JsValue> {
        let kind: EventKind = kind.parse().map_err(to_js)?;
        Ok(self.dispatcher.unregister(ObjectId(id), &kind))
    }

    /// Route a pointer event at page coordinates. Returns the number of callbacks run.
    pub fn dispatch(&self, x: f32, y: f32, kind: &str) -> Result<u32, JsValue> {
        let kind: EventKind = kind.parse().map_err(to_js)?;
        let hits = {
            let scene = self.scene.borrow();
            let camera = self.camera.borrow();
            self.dispatcher
                .pick(&scene, &camera, &self.viewport.get(), x, y)
                .map_err(to_js)?
        };
        let invoked = self.dispatcher.deliver(&kind, &hits, (x, y), &mut ());
        if invoked > 0 {
            self.frame_loop.borrow_mut().request_render();
        }
        Ok(invoked as u32)
    }

    pub fn set_viewport(&self, width: f32, height: f32) -> Result<(), JsValue> {
        let viewport = Viewport::new(width, height);
        // Validates the size without needing a real pointer position
        viewport.screen_to_ndc(0.0, 0.0).map_err(to_js)?;
        self.viewport.set(viewport);
        self.camera.borrow_mut().set_viewport(&viewport);
        self.frame_loop.borrow_mut().request_render();
        Ok(())
    }

    pub fn orbit(&self, yaw: f32, pitch: f32) {
        self.camera.borrow_mut().orbit(yaw, pitch);
        self.frame_loop.borrow_mut().request_render();
    }

    pub fn set_delivery_mode(&self, mode: &str) -> Result<(), JsValue> {
        let mode: DeliveryMode = mode.parse().map_err(to_js)?;
        self.dispatcher.set_mode(mode);
        Ok(())
    }

    /// Returns false if a render was already pending
    pub fn request_render(&self) -> bool {
        self.frame_loop.borrow_mut().request_render()
    }

    /// Advance one frame of `dt_ms` milliseconds. Returns true when the page should redraw.
    pub fn tick(&self, dt_ms: f64) -> bool {
        let dt = Duration::from_secs_f64(dt_ms.max(0.0) / 1000.0);
        let mut scene = self.scene.borrow_mut();
        self.frame_loop.borrow_mut().tick(&mut scene, dt)
    }

    /// Column-major model-view-projection matrix for an object, for the page's renderer
    pub fn mvp(&self, id: u32) -> Result<Vec<f32>, JsValue> {
        let camera = self.camera.borrow();
        let (view, projection) = (camera.view_matrix(), camera.projection_matrix());
        self.read(id, |transform| {
            Transform::mvp_matrix(&transform.model_matrix(), &view, &projection)
                .as_slice()
                .to_vec()
        })
    }

    pub fn fps(&self) -> f32 {
        self.frame_loop.borrow().stats().fps()
    }
}

impl WebScene {
    fn add(&self, name: &str, shape: Shape, x: f32, y: f32, z: f32) -> u32 {
        let id = self
            .scene
            .borrow_mut()
            .add(name, shape, Transform::from_position(x, y, z));
        self.frame_loop.borrow_mut().request_render();
        id.0
    }

    fn read<T>(&self, id: u32, f: impl FnOnce(&Transform) -> T) -> Result<T, JsValue> {
        let scene = self.scene.borrow();
        let object = scene
            .get(ObjectId(id))
            .ok_or_else(|| to_js(Error::UnknownObject(ObjectId(id))))?;
        Ok(f(&object.transform))
    }

    fn update(
        &self,
        id: u32,
        f: impl FnOnce(&mut Transform) -> simple3d_core::Result<()>,
    ) -> Result<(), JsValue> {
        let result = self
            .scene
            .borrow_mut()
            .transform_mut(ObjectId(id))
            .and_then(f);
        result.map_err(to_js)?;
        self.frame_loop.borrow_mut().request_render();
        Ok(())
    }
}

impl Default for WebScene {
    fn default() -> Self {
        Self::new()
    }
}

/// `{ id, kind, distance, point: [x, y, z], normal: [x, y, z], screenX, screenY }`
fn event_object(event: &PickEvent) -> JsValue {
    let object = Object::new();
    let triple = |x: f32, y: f32, z: f32| -> Array {
        [x, y, z].into_iter().map(JsValue::from).collect()
    };
    let hit = &event.hit;
    let fields: [(&str, JsValue); 7] = [
        ("id", hit.object.0.into()),
        ("kind", event.kind.as_str().into()),
        ("distance", hit.distance.into()),
        ("point", triple(hit.point.x, hit.point.y, hit.point.z).into()),
        ("normal", triple(hit.normal.x, hit.normal.y, hit.normal.z).into()),
        ("screenX", event.screen_x.into()),
        ("screenY", event.screen_y.into()),
    ];
    for (key, value) in fields {
        if let Err(err) = Reflect::set(&object, &JsValue::from_str(key), &value) {
            log::warn!("web: cannot set '{key}' on {} event: {err:?}", event.kind);
        }
    }
    object.into()
}

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    // A second init fails harmlessly when the page reloads the module
    console_log::init_with_level(log::Level::Info).ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_delivery_mode() {
        let scene = WebScene::with_size(800.0, 600.0);
        scene.set_delivery_mode("nearest_hit").unwrap();
        assert_eq!(scene.dispatcher.mode(), DeliveryMode::NearestHit);
    }

    #[test]
    fn test_object_setters() {
        let scene = WebScene::with_size(800.0, 600.0);
        let id = scene.add_box("box", 0.5, 0.5, 0.5, 1.0, 1.0, 1.0);

        scene.translate(id, 1.0, 0.0, -1.0).unwrap();
        assert_eq!(scene.position(id).unwrap(), vec![1.5, 0.5, -0.5]);

        scene.set_rotation(id, 0.0, 0.3, 0.0).unwrap();
        let rotation = scene.rotation(id).unwrap();
        assert!(rotation[0].abs() < 1e-5 && (rotation[1] - 0.3).abs() < 1e-5 && rotation[2].abs() < 1e-5);

        // Minimum corner stays at (1, 0, -1)
        scene.set_scale(id, 3.0, 1.0, 1.0).unwrap();
        assert_eq!(scene.scale(id).unwrap(), vec![3.0, 1.0, 1.0]);
        assert!((scene.position(id).unwrap()[0] - 2.5).abs() < 1e-5);
    }

    #[test]
    fn test_hidden_and_unpickable_objects_are_not_picked() {
        let scene = WebScene::with_size(800.0, 600.0);
        let id = scene.add_box("box", 0.0, 0.0, 0.0, 1.0, 1.0, 1.0);
        let hits = |scene: &WebScene| {
            let camera = scene.camera.borrow();
            let picked = scene
                .dispatcher
                .pick(&scene.scene.borrow(), &camera, &scene.viewport.get(), 400.0, 300.0)
                .unwrap();
            picked.len()
        };
        assert_eq!(hits(&scene), 1);

        scene.set_pickable(id, false).unwrap();
        assert_eq!(hits(&scene), 0);
        scene.set_pickable(id, true).unwrap();
        scene.set_visible(id, false).unwrap();
        assert_eq!(hits(&scene), 0);
        assert!(!scene.scene.borrow().get(ObjectId(id)).unwrap().visible);
    }

    #[test]
    fn test_objects_move_through_pivot_operations() {
        let scene = WebScene::with_size(800.0, 600.0);
        let id = scene.add_box("box", 0.0, 0.0, 0.0, 1.0, 1.0, 1.0);
        scene
            .rotate_around_pivot(id, -1.0, 0.0, 0.0, 0.0, 1.0, 0.0, std::f32::consts::PI)
            .unwrap();
        let position = scene.position(id).unwrap();
        assert!((position[0] + 2.0).abs() < 1e-5);
        assert!(position[2].abs() < 1e-5);

        scene.scale_from_pivot(id, -2.5, 0.0, 0.0, 2.0, 1.0, 1.0).unwrap();
        assert_eq!(scene.scale(id).unwrap(), vec![2.0, 1.0, 1.0]);
        assert!((scene.position(id).unwrap()[0] + 1.5).abs() < 1e-5);
    }

    #[test]
    fn test_dispatch_without_callbacks_runs_nothing() {
        let scene = WebScene::with_size(800.0, 600.0);
        scene.add_box("box", 0.0, 0.0, 0.0, 1.0, 1.0, 1.0);
        assert_eq!(scene.dispatch(400.0, 300.0, "click").unwrap(), 0);
    }

    #[test]
    fn test_remove_and_render_requests() {
        let scene = WebScene::with_size(800.0, 600.0);
        // First frame always renders
        assert!(scene.tick(16.0));
        assert!(!scene.tick(16.0));

        let id = scene.add_sphere("ball", 0.0, 0.5, 0.0, 1.0);
        assert!(!scene.request_render());
        assert!(scene.tick(16.0));
        assert!(scene.remove(id));
        assert!(!scene.remove(id));
        assert!(scene.scene.borrow().is_empty());
    }
}
