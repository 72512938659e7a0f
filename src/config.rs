use serde::{Deserialize, Serialize};

/// Tunables for the explorer window and its renderers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    /// Initial window size in points.
    pub window_size: [f32; 2],
    /// Minimum window size in points.
    pub min_window_size: [f32; 2],
    /// How many numeric columns are pre-selected after a load.
    pub default_selected_columns: usize,
    /// Height of the visualisation viewport in points / pixels.
    pub viewport_height: f32,
    /// Rows shown in the data preview table.
    pub preview_rows: usize,
    /// HSL saturation of the colour palette.
    pub palette_saturation: f32,
    /// HSL lightness of the colour palette.
    pub palette_lightness: f32,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            window_size: [1200.0, 800.0],
            min_window_size: [600.0, 400.0],
            default_selected_columns: 5,
            viewport_height: 600.0,
            preview_rows: 50,
            palette_saturation: 0.75,
            palette_lightness: 0.55,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let cfg: ExplorerConfig = serde_json::from_str(r#"{"viewport_height": 420.0}"#).unwrap();
        assert_eq!(cfg.viewport_height, 420.0);
        assert_eq!(cfg.default_selected_columns, 5);
    }
}
