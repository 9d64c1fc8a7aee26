pub mod app;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod host_config;
pub mod logging;
pub mod modules;
pub mod notifier;
pub mod state;
pub mod submit;
pub mod utils;
pub mod watcher;

// Platform-specific tray implementations:
// - Linux: ksni (KDE StatusNotifierItem) for native KDE/freedesktop support
// - Windows/macOS: tray-icon crate
#[cfg(target_os = "linux")]
#[path = "tray_linux.rs"]
pub mod tray;

#[cfg(not(target_os = "linux"))]
pub mod tray;
