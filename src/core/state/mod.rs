mod app_state;
mod mods_config;

pub use app_state::{AppState, LauncherPaths, LauncherSettings};
pub use mods_config::ModsConfig;
