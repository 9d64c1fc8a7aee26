use image::{Rgba, RgbaImage};
use std::{path::Path, process::Command, sync::OnceLock, time::Duration};
use ureq::Agent;

use crate::error::HttpError;

/// Timeout for the single POST of a score record.
pub const SUBMIT_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout for any script or config download.
pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);

pub const APP_NAME: &str = "BizHawk High Score Tracker";

static USER_AGENT: OnceLock<String> = OnceLock::new();

pub fn user_agent() -> &'static str {
    USER_AGENT
        .get_or_init(|| format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")))
        .as_str()
}

/// Builds an agent whose every request is bounded by `timeout`.
pub fn http_agent(timeout: Duration) -> Agent {
    let config = Agent::config_builder()
        .timeout_global(Some(timeout))
        .user_agent(user_agent())
        .build();
    config.into()
}

/// Performs one GET and returns the body as text. Any non-2xx status is an error.
pub fn download_text(agent: &Agent, url: &str) -> Result<String, HttpError> {
    let mut response = agent.get(url).call()?;
    response
        .body_mut()
        .read_to_string()
        .map_err(|e| HttpError::Body(e.to_string()))
}

/// Opens `dir` in the platform file manager without waiting for it.
pub fn open_in_file_manager(dir: &Path) -> std::io::Result<()> {
    #[cfg(target_os = "windows")]
    let program = "explorer";
    #[cfg(target_os = "macos")]
    let program = "open";
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    let program = "xdg-open";

    Command::new(program).arg(dir).spawn().map(|_| ())
}

/// Detects if the system is using light mode.
pub fn is_light_mode() -> bool {
    match dark_light::detect() {
        Ok(dark_light::Mode::Light) => true,
        Ok(dark_light::Mode::Unspecified) => {
            // Default to dark mode (white icon) when unspecified
            false
        }
        Ok(dark_light::Mode::Dark) => false,
        Err(_) => false,
    }
}

/// Creates an inverted (dark) version of the icon for light mode.
/// Preserves alpha channel while inverting RGB values.
pub fn create_dark_icon(image: &RgbaImage) -> RgbaImage {
    let mut dark = image.clone();
    for pixel in dark.pixels_mut() {
        pixel[0] = 255 - pixel[0];
        pixel[1] = 255 - pixel[1];
        pixel[2] = 255 - pixel[2];
    }
    dark
}

pub const ICON_SIZE: u32 = 64;

/// Draws the tray glyph: a white gamepad on a transparent background with a
/// d-pad and two buttons punched out.
pub fn render_icon() -> RgbaImage {
    let white = Rgba([255, 255, 255, 255]);
    let clear = Rgba([0, 0, 0, 0]);
    let mut image = RgbaImage::from_pixel(ICON_SIZE, ICON_SIZE, clear);

    let in_circle = |x: u32, y: u32, cx: i64, cy: i64, r: i64| {
        let (dx, dy) = (x as i64 - cx, y as i64 - cy);
        dx * dx + dy * dy <= r * r
    };

    for (x, y, pixel) in image.enumerate_pixels_mut() {
        let body = (12..=51).contains(&x) && (18..=45).contains(&y);
        let grips = in_circle(x, y, 12, 32, 12) || in_circle(x, y, 51, 32, 12);
        if body || grips {
            *pixel = white;
        }

        let dpad = ((14..=24).contains(&x) && (29..=34).contains(&y))
            || ((17..=21).contains(&x) && (26..=37).contains(&y));
        let buttons = in_circle(x, y, 44, 28, 3) || in_circle(x, y, 50, 35, 3);
        if dpad || buttons {
            *pixel = clear;
        }
    }

    image
}

/// Icon matching the current system theme.
pub fn themed_icon() -> RgbaImage {
    let icon = render_icon();
    if is_light_mode() {
        tracing::debug!("Light mode detected, using dark tray icon");
        create_dark_icon(&icon)
    } else {
        icon
    }
}
