/// Simple3D Terminal Demo - pick and hover in the terminal
///
/// Usage: simple3d-terminal [OPTIONS] [CONFIG]
/// Controls:
///   - Mouse move: hover highlight
///   - Left click: tumble the box / resize the ball
///   - WASD / Arrow Keys: Orbit the camera
///   - M: Toggle all-hits / nearest-hit delivery
///   - Q/ESC: Quit

use clap::Parser;
use simple3d_terminal::{Cli, TerminalApp};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr; keep them quiet unless RUST_LOG asks for more
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let config = Cli::parse().resolve()?;
    log::info!("Starting terminal demo with {config:?}");

    let mut app = TerminalApp::new(config)?;
    app.run()?;

    println!("Thank you for using the Simple3D terminal demo!");
    Ok(())
}
