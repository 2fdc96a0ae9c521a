use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Named target screen a frame is rendered for.
///
/// Profiles are immutable once loaded; the user only ever selects one.
/// `scale_x`/`scale_y` default to the density-derived dp scale and are
/// spelled out explicitly only where a device needs to override them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceProfile {
    pub id: String,
    pub width_px: u32,
    pub height_px: u32,
    pub density_dpi: u32,
    #[serde(default)]
    pub scale_x: Option<f64>,
    #[serde(default)]
    pub scale_y: Option<f64>,
}

impl DeviceProfile {
    fn new(id: &str, width_px: u32, height_px: u32, density_dpi: u32) -> Self {
        Self {
            id: id.to_string(),
            width_px,
            height_px,
            density_dpi,
            scale_x: None,
            scale_y: None,
        }
    }

    /// Horizontal dp-to-px factor (density / 160 unless overridden).
    pub fn dp2px_x(&self) -> f64 {
        self.scale_x.unwrap_or(self.density_dpi as f64 / 160.0)
    }

    /// Vertical dp-to-px factor (density / 160 unless overridden).
    pub fn dp2px_y(&self) -> f64 {
        self.scale_y.unwrap_or(self.density_dpi as f64 / 160.0)
    }
}

/// Id of the profile selected when none is requested.
pub const DEFAULT_DEVICE: &str = "coral";

/// The set of device profiles the user can pick from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceCatalog {
    profiles: Vec<DeviceProfile>,
}

impl DeviceCatalog {
    /// The built-in profile table.
    pub fn builtin() -> Self {
        let mut emulator = DeviceProfile::new("emulator", 256, 400, 160);
        emulator.scale_x = Some(1.0);
        emulator.scale_y = Some(1.0);
        Self {
            profiles: vec![
                DeviceProfile::new("blueline", 1080, 2160, 440),
                DeviceProfile::new("crosshatch", 1440, 2960, 560),
                DeviceProfile::new("coral", 1440, 3040, 560),
                DeviceProfile::new("flame", 1080, 2280, 440),
                DeviceProfile::new("sargo", 1080, 2220, 440),
                DeviceProfile::new("bonito", 1080, 2160, 440),
                emulator,
            ],
        }
    }

    /// Built-in table extended with profiles from a JSON file. Entries
    /// sharing an id with a built-in profile replace it.
    pub fn with_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read device catalog {}", path.display()))?;
        let extra: Vec<DeviceProfile> = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse device catalog {}", path.display()))?;
        let mut catalog = Self::builtin();
        catalog.merge(extra);
        Ok(catalog)
    }

    /// Add profiles, replacing any existing entry with the same id.
    pub fn merge(&mut self, extra: Vec<DeviceProfile>) {
        for profile in extra {
            self.profiles.retain(|p| p.id != profile.id);
            self.profiles.push(profile);
        }
    }

    /// Look up a profile by id.
    pub fn get(&self, id: &str) -> Option<&DeviceProfile> {
        self.profiles.iter().find(|p| p.id == id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.profiles.iter().map(|p| p.id.as_str())
    }

    pub fn profiles(&self) -> &[DeviceProfile] {
        &self.profiles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_has_default_device() {
        let catalog = DeviceCatalog::builtin();
        let coral = catalog.get(DEFAULT_DEVICE).unwrap();
        assert_eq!(coral.width_px, 1440);
        assert_eq!(coral.height_px, 3040);
    }

    #[test]
    fn emulator_carries_explicit_scale_factors() {
        let catalog = DeviceCatalog::builtin();
        let emulator = catalog.get("emulator").unwrap();
        assert_eq!(emulator.dp2px_x(), 1.0);
        assert_eq!(emulator.dp2px_y(), 1.0);
        // Density-derived scale everywhere else.
        let coral = catalog.get("coral").unwrap();
        assert_eq!(coral.dp2px_x(), 560.0 / 160.0);
    }

    #[test]
    fn unknown_id_is_none() {
        assert!(DeviceCatalog::builtin().get("walleye").is_none());
    }

    #[test]
    fn json_profiles_merge_and_override() {
        let json = r#"[
            {"id": "coral", "width_px": 720, "height_px": 1520, "density_dpi": 280},
            {"id": "bench", "width_px": 256, "height_px": 400, "density_dpi": 160}
        ]"#;
        let extra: Vec<DeviceProfile> = serde_json::from_str(json).unwrap();
        let mut catalog = DeviceCatalog::builtin();
        catalog.merge(extra);
        assert_eq!(catalog.get("coral").unwrap().width_px, 720);
        assert_eq!(catalog.get("bench").unwrap().height_px, 400);
        assert!(catalog.get("blueline").is_some());
    }
}
