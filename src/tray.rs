//! System tray implementation using tray-icon (Windows/macOS).
//!
//! This module is only compiled on non-Linux platforms.
//! Linux uses the ksni-based implementation in tray_linux.rs.

use crossbeam_channel::Receiver;
use std::sync::{Arc, RwLock};
use tray_icon::{
    menu::{Menu, MenuEvent, MenuId, MenuItem, PredefinedMenuItem},
    Icon, TrayIcon, TrayIconBuilder,
};

use crate::state::AppState;
use crate::utils::themed_icon;

pub enum TrayCommand {
    ShowStatus,
    OpenFolder,
    Quit,
}

pub struct Tray {
    tray_icon: TrayIcon,
    menu_receiver: Receiver<MenuEvent>,
    status_action_id: MenuId,
    open_folder_item_id: MenuId,
    quit_item_id: MenuId,
    status_item: MenuItem,
    last_status: String,
}

impl Tray {
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let icon = Self::load_icon()?;

        // Status display (disabled, just for showing info)
        let status_item = MenuItem::new("Starting...", false, None);
        let status_action = MenuItem::new("Status", true, None);
        let open_folder_item = MenuItem::new("Open Folder", true, None);
        let quit_item = MenuItem::new("Quit", true, None);

        let status_action_id = status_action.id().clone();
        let open_folder_item_id = open_folder_item.id().clone();
        let quit_item_id = quit_item.id().clone();

        let menu = Menu::new();
        menu.append(&status_item)?;
        menu.append(&PredefinedMenuItem::separator())?;
        menu.append(&status_action)?;
        menu.append(&open_folder_item)?;
        menu.append(&PredefinedMenuItem::separator())?;
        menu.append(&quit_item)?;

        let tray_icon = TrayIconBuilder::new()
            .with_menu(Box::new(menu))
            .with_tooltip("BizHawk High Score Tracker")
            .with_icon(icon)
            .build()?;

        let menu_receiver = MenuEvent::receiver().clone();

        tracing::info!("System tray initialized");

        Ok(Tray {
            tray_icon,
            menu_receiver,
            status_action_id,
            open_folder_item_id,
            quit_item_id,
            status_item,
            last_status: String::new(),
        })
    }

    fn load_icon() -> Result<Icon, Box<dyn std::error::Error>> {
        let image = themed_icon();
        let (width, height) = image.dimensions();
        Icon::from_rgba(image.into_raw(), width, height).map_err(|e| e.into())
    }

    pub fn update_status(&mut self, state: &Arc<RwLock<AppState>>) {
        if let Ok(state) = state.read() {
            let status = state.status_text();
            if status != self.last_status {
                self.status_item.set_text(&status);
                let _ = self
                    .tray_icon
                    .set_tooltip(Some(&format!("BizHawk Tracker: {}", status)));
                self.last_status = status;
            }
        }
    }

    pub fn poll_events(&mut self) -> Option<TrayCommand> {
        let event = self.menu_receiver.try_recv().ok()?;

        if event.id == self.quit_item_id {
            tracing::info!("Quit requested from tray menu");
            Some(TrayCommand::Quit)
        } else if event.id == self.status_action_id {
            Some(TrayCommand::ShowStatus)
        } else if event.id == self.open_folder_item_id {
            Some(TrayCommand::OpenFolder)
        } else {
            None
        }
    }
}
