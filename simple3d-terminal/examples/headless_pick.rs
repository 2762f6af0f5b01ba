/// Example: drive the demo scene with synthetic pointer events, no terminal needed
///
/// Usage: cargo run --example headless_pick

use std::time::Duration;

use nalgebra::{Matrix4, Point3};
use simple3d_core::EventKind;
use simple3d_terminal::{Demo, DemoConfig};

const COLUMNS: u16 = 80;
const ROWS: u16 = 24;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = DemoConfig::default();
    let camera = config.camera(COLUMNS, ROWS);
    let viewport = simple3d_core::Viewport::new(f32::from(COLUMNS), f32::from(ROWS));
    let mut demo = Demo::new(config.delivery_mode);

    let cube = demo.scene.get(demo.cube).map(|object| object.transform.position);
    let Some(cube) = cube else {
        return Err("demo scene has no box".into());
    };

    let Some((x, y, _)) = camera.project_to_screen(
        &Point3::from(cube),
        &Matrix4::identity(),
        u32::from(COLUMNS),
        u32::from(ROWS),
    ) else {
        return Err("box is off screen".into());
    };

    let hovered = demo.pointer(&camera, &viewport, x, y, &EventKind::Hover)?;
    println!("hover at ({x:.1}, {y:.1}) ran {hovered} callback(s), hovering {:?}", demo.hovered());

    let clicked = demo.pointer(&camera, &viewport, x, y, &EventKind::Click)?;
    println!("click ran {clicked} callback(s)");

    for _ in 0..40 {
        demo.tick(Duration::from_millis(20));
    }
    if let Some(object) = demo.scene.get(demo.cube) {
        let euler = object.transform.euler();
        println!(
            "box now at {:?}, euler ({:.2}, {:.2}, {:.2})",
            object.transform.position, euler.x, euler.y, euler.z
        );
    }

    Ok(())
}
