//! Linux-specific tray implementation using ksni (KDE StatusNotifierItem).
//!
//! This module provides native integration with KDE Plasma and other desktop environments
//! that support the freedesktop StatusNotifierItem specification.

use crossbeam_channel::{Receiver, Sender};
use ksni::blocking::TrayMethods;
use ksni::menu::*;
use std::sync::{Arc, RwLock};

use crate::state::AppState;
use crate::utils::themed_icon;

/// Commands that can be triggered from the tray menu.
pub enum TrayCommand {
    ShowStatus,
    OpenFolder,
    Quit,
}

/// Internal state shared between the tray icon and the main application.
struct TrayState {
    status_text: String,
    command_sender: Sender<TrayCommand>,
}

impl TrayState {
    fn send(&self, command: TrayCommand) {
        let _ = self.command_sender.send(command);
    }
}

struct ScorehawkTray {
    state: Arc<RwLock<TrayState>>,
}

impl ksni::Tray for ScorehawkTray {
    // Make left-click open the menu (same as right-click)
    const MENU_ON_ACTIVATE: bool = true;

    fn id(&self) -> String {
        "scorehawk".into()
    }

    fn icon_pixmap(&self) -> Vec<ksni::Icon> {
        let image = themed_icon();
        let (width, height) = image.dimensions();

        // Convert RGBA to ARGB (ksni expects ARGB format)
        let mut argb_data = Vec::with_capacity((width * height * 4) as usize);
        for pixel in image.pixels() {
            argb_data.push(pixel[3]);
            argb_data.push(pixel[0]);
            argb_data.push(pixel[1]);
            argb_data.push(pixel[2]);
        }

        vec![ksni::Icon {
            width: width as i32,
            height: height as i32,
            data: argb_data,
        }]
    }

    fn title(&self) -> String {
        "BizHawk Tracker".into()
    }

    fn tool_tip(&self) -> ksni::ToolTip {
        let description = self
            .state
            .read()
            .map(|s| format!("BizHawk Tracker: {}", s.status_text))
            .unwrap_or_else(|_| "BizHawk High Score Tracker".into());

        ksni::ToolTip {
            icon_name: String::new(),
            icon_pixmap: vec![],
            title: "BizHawk Tracker".into(),
            description,
        }
    }

    fn menu(&self) -> Vec<MenuItem<Self>> {
        let status_text = self
            .state
            .read()
            .map(|s| s.status_text.clone())
            .unwrap_or_else(|_| "Starting...".into());

        vec![
            // Status display (disabled item, just for showing info)
            StandardItem {
                label: status_text,
                enabled: false,
                ..Default::default()
            }
            .into(),
            MenuItem::Separator,
            StandardItem {
                label: "Status".into(),
                activate: Box::new(|tray: &mut Self| {
                    if let Ok(state) = tray.state.read() {
                        state.send(TrayCommand::ShowStatus);
                    }
                }),
                ..Default::default()
            }
            .into(),
            StandardItem {
                label: "Open Folder".into(),
                activate: Box::new(|tray: &mut Self| {
                    if let Ok(state) = tray.state.read() {
                        state.send(TrayCommand::OpenFolder);
                    }
                }),
                ..Default::default()
            }
            .into(),
            MenuItem::Separator,
            StandardItem {
                label: "Quit".into(),
                activate: Box::new(|tray: &mut Self| {
                    if let Ok(state) = tray.state.read() {
                        state.send(TrayCommand::Quit);
                    }
                }),
                ..Default::default()
            }
            .into(),
        ]
    }
}

/// Handle to the tray icon, allowing updates from the main thread.
pub struct Tray {
    handle: ksni::blocking::Handle<ScorehawkTray>,
    tray_state: Arc<RwLock<TrayState>>,
    command_receiver: Receiver<TrayCommand>,
    last_status: String,
}

impl Tray {
    /// Creates a new system tray icon.
    ///
    /// This spawns a background task to handle the D-Bus StatusNotifierItem protocol.
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let (command_sender, command_receiver) = crossbeam_channel::unbounded();

        let tray_state = Arc::new(RwLock::new(TrayState {
            status_text: "Starting...".into(),
            command_sender,
        }));

        let tray = ScorehawkTray {
            state: Arc::clone(&tray_state),
        };

        let handle = tray.spawn().map_err(|e| {
            tracing::error!("Failed to spawn ksni tray: {}", e);
            Box::new(std::io::Error::other(format!("ksni spawn failed: {}", e)))
                as Box<dyn std::error::Error>
        })?;

        tracing::info!("System tray initialized (ksni/StatusNotifierItem)");

        Ok(Tray {
            handle,
            tray_state,
            command_receiver,
            last_status: String::new(),
        })
    }

    /// Updates the tray status display based on the current application state.
    pub fn update_status(&mut self, state: &Arc<RwLock<AppState>>) {
        if let Ok(app_state) = state.read() {
            let status = app_state.status_text();

            if status != self.last_status {
                if let Ok(mut tray_state) = self.tray_state.write() {
                    tray_state.status_text = status.clone();
                }

                // Signal ksni to refresh the tray
                self.handle.update(|_| {});

                self.last_status = status;
            }
        }
    }

    /// Polls for menu events and returns any command that was triggered.
    pub fn poll_events(&mut self) -> Option<TrayCommand> {
        let command = self.command_receiver.try_recv().ok()?;
        if let TrayCommand::Quit = command {
            tracing::info!("Quit requested from tray menu");
        }
        Some(command)
    }
}
