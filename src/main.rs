//! First-person walk-mesh level.
//!
//! ```bash
//! cargo run --release -- [--walkmeshes plane.w] [--mesh WalkMesh]
//! ```
//!
//! WASD walks, click to capture the mouse for looking around, Escape
//! releases it (a second Escape quits).  The HUD text is shown in the
//! window title.

use std::{path::PathBuf, time::Instant};

use clap::Parser;
use glam::UVec2;
use minifb::{Key as WinKey, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};

use walkplane::{
    assets::LEVEL_MESH_NAME,
    config::PlayConfig,
    mode::Mode,
    renderer::{RendererExt, software::Software},
    sim::{InputEvent, Key, PlayMode},
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Opts {
    /// Walk-mesh bundle (`.w`); the built-in plane is used when omitted
    #[arg(long, value_name = "FILE")]
    walkmeshes: Option<PathBuf>,

    /// Mesh to walk on inside the bundle
    #[arg(long, default_value = LEVEL_MESH_NAME)]
    mesh: String,

    #[arg(long, default_value_t = 1280)]
    width: usize,

    #[arg(long, default_value_t = 720)]
    height: usize,

    /// Walking speed override, units per second
    #[arg(long)]
    speed: Option<f32>,
}

fn map_key(key: WinKey) -> Key {
    match key {
        WinKey::A => Key::A,
        WinKey::D => Key::D,
        WinKey::W => Key::W,
        WinKey::S => Key::S,
        WinKey::Escape => Key::Escape,
        _ => Key::Other,
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let opts = Opts::parse();

    let mut config = PlayConfig::default();
    config.walkmesh = opts.mesh;
    if let Some(speed) = opts.speed {
        config.player_speed = speed;
    }
    let mut play = PlayMode::load(config, opts.walkmeshes.as_deref())?;

    let mut win = Window::new(
        "walkplane",
        opts.width,
        opts.height,
        WindowOptions {
            resize: true,
            ..WindowOptions::default()
        },
    )?;
    win.set_target_fps(60);

    let mut renderer = Software::default();
    let mut last_mouse: Option<(f32, f32)> = None;
    let mut mouse_was_down = false;
    let mut last_tick = Instant::now();

    while win.is_open() {
        let (w, h) = win.get_size();
        let size = UVec2::new(w as u32, h as u32);

        /* --------------- translate window input ------------------------- */
        let mut events = Vec::new();
        for key in win.get_keys_pressed(KeyRepeat::No) {
            events.push(InputEvent::KeyDown(map_key(key)));
        }
        for key in win.get_keys_released() {
            events.push(InputEvent::KeyUp(map_key(key)));
        }

        let mouse_down = win.get_mouse_down(MouseButton::Left);
        if mouse_down && !mouse_was_down {
            events.push(InputEvent::MouseButtonDown);
        }
        mouse_was_down = mouse_down;

        let mouse = win.get_mouse_pos(MouseMode::Pass);
        if let (Some((x, y)), Some((px, py))) = (mouse, last_mouse) {
            if (x, y) != (px, py) {
                events.push(InputEvent::MouseMotion {
                    dx: x - px,
                    dy: y - py,
                });
            }
        }
        last_mouse = mouse;

        let mut quit = false;
        for event in &events {
            let captured = play.mouse_captured();
            let handled = play.handle_event(event, size)?;
            if *event == InputEvent::KeyDown(Key::Escape) && !captured {
                quit = true;
            }
            log::trace!("{event:?} handled={handled}");
        }
        if quit {
            break;
        }
        win.set_cursor_visibility(!play.mouse_captured());

        /* --------------- tick + draw ------------------------------------ */
        let now = Instant::now();
        play.update((now - last_tick).as_secs_f32())?;
        last_tick = now;

        if w == 0 || h == 0 {
            // minimised
            win.update();
            continue;
        }
        let frame = play.draw(size)?;
        let title: Vec<&str> = frame.hud.iter().map(|t| t.text.as_str()).collect();
        win.set_title(&format!("walkplane: {}", title.join(" ")));

        let mut result = Ok(());
        renderer.draw_frame(w, h, &frame, |fb, fw, fh| {
            result = win.update_with_buffer(fb, fw, fh);
        });
        result?;
    }

    Ok(())
}
