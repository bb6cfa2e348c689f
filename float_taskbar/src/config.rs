use crate::branding::APP_ID;
use crate::taskbar::{AppId, Favorites, TaskbarSettings};
use log::{info, warn};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};

pub const MAX_FAVORITES: usize = 24;
pub const DEFAULT_ITEM_WIDTH: f32 = 132.0;
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WindowShape {
    Square,
    RoundedRect,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default, deserialize_with = "deserialize_favorites")]
    pub favorites: Vec<AppId>,
    #[serde(default = "default_true")]
    pub show_separator: bool,
    #[serde(default = "default_true")]
    pub isolate_workspaces: bool,
    #[serde(default = "default_true")]
    pub show_all_windows: bool,
    #[serde(default = "default_item_width")]
    pub item_width: f32,
    #[serde(default = "default_shape")]
    pub shape: WindowShape,
    #[serde(default)]
    pub last_pos: Option<(f32, f32)>,
    #[serde(default)]
    pub last_size: Option<(f32, f32)>,
    /// Directory the config was loaded from; `save` is a no-op without it.
    #[serde(skip)]
    dir: Option<PathBuf>,
}

/// Older files stored favorites as objects carrying extra launch data.
#[derive(Deserialize)]
#[serde(untagged)]
enum FavoriteCompat {
    Id(AppId),
    Entry { app: AppId },
}

fn deserialize_favorites<'de, D>(deserializer: D) -> Result<Vec<AppId>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<FavoriteCompat>::deserialize(deserializer)?;
    let mut favorites: Vec<AppId> = Vec::with_capacity(raw.len());
    for item in raw {
        let app = match item {
            FavoriteCompat::Id(app) => app,
            FavoriteCompat::Entry { app } => app,
        };
        let app = app.trim().to_string();
        if !app.is_empty() && !favorites.contains(&app) {
            favorites.push(app);
        }
    }
    favorites.truncate(MAX_FAVORITES);
    Ok(favorites)
}

fn default_true() -> bool {
    true
}

fn default_item_width() -> f32 {
    DEFAULT_ITEM_WIDTH
}

fn default_shape() -> WindowShape {
    WindowShape::RoundedRect
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            favorites: Vec::new(),
            show_separator: true,
            isolate_workspaces: true,
            show_all_windows: true,
            item_width: default_item_width(),
            shape: default_shape(),
            last_pos: None,
            last_size: None,
            dir: None,
        }
    }
}

impl AppConfig {
    pub fn config_dir() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", APP_ID, APP_ID)
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    pub fn load() -> Self {
        match Self::config_dir() {
            Some(dir) => Self::load_at(&dir),
            None => {
                warn!("No config directory available, settings will not persist");
                Self::default()
            }
        }
    }

    pub fn load_at(dir: &Path) -> Self {
        let config_path = dir.join(CONFIG_FILE);
        let mut config = if config_path.exists() {
            match std::fs::File::open(&config_path) {
                Ok(file) => match serde_json::from_reader::<_, AppConfig>(file) {
                    Ok(config) => config,
                    Err(err) => {
                        warn!("Failed to parse config, using default: {err}");
                        Self::default()
                    }
                },
                Err(err) => {
                    warn!("Failed to open config, using default: {err}");
                    Self::default()
                }
            }
        } else {
            Self::default()
        };
        if !config.item_width.is_finite() || config.item_width < 24.0 {
            config.item_width = default_item_width();
        }
        config.dir = Some(dir.to_path_buf());
        config
    }

    pub fn save(&self) {
        let Some(dir) = &self.dir else {
            return;
        };
        if let Err(err) = std::fs::create_dir_all(dir) {
            warn!("Failed to create config dir {}: {err}", dir.display());
            return;
        }
        match std::fs::File::create(dir.join(CONFIG_FILE)) {
            Ok(file) => {
                if let Err(err) = serde_json::to_writer_pretty(file, self) {
                    warn!("Failed to write config: {err}");
                }
            }
            Err(err) => warn!("Failed to create config file: {err}"),
        }
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    pub fn settings(&self) -> TaskbarSettings {
        TaskbarSettings {
            show_separator: self.show_separator,
            isolate_workspaces: self.isolate_workspaces,
            show_all_windows: self.show_all_windows,
        }
    }
}

impl Favorites for AppConfig {
    fn apps(&self) -> Vec<AppId> {
        self.favorites.clone()
    }

    fn can_add(&self, app: &str) -> bool {
        !app.trim().is_empty()
            && (self.favorites.len() < MAX_FAVORITES || self.favorites.iter().any(|f| f == app))
    }

    fn add(&mut self, app: &str, position: usize) {
        if !self.can_add(app) || self.favorites.iter().any(|f| f == app) {
            return;
        }
        let position = position.min(self.favorites.len());
        self.favorites.insert(position, app.to_string());
        info!("pinned {app} at {position}");
        self.save();
    }

    fn remove(&mut self, app: &str) {
        let before = self.favorites.len();
        self.favorites.retain(|f| f != app);
        if self.favorites.len() != before {
            info!("unpinned {app}");
            self.save();
        }
    }

    fn move_to(&mut self, app: &str, position: usize) {
        let Some(current) = self.favorites.iter().position(|f| f == app) else {
            return;
        };
        let entry = self.favorites.remove(current);
        let position = position.min(self.favorites.len());
        self.favorites.insert(position, entry);
        if current != position {
            self.save();
        }
    }
}
