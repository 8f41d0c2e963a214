use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub font_size: f64,
    pub background: String,
    pub label_fill: String,
    pub label_stroke: String,
    pub label_text: String,
    pub leader_color: String,
    pub anchor_color: String,
}

impl Theme {
    pub fn light() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            font_size: 11.0,
            background: "#FFFFFF".to_string(),
            label_fill: "#F8FAFF".to_string(),
            label_stroke: "#7A8AA6".to_string(),
            label_text: "#1C2430".to_string(),
            leader_color: "#333333".to_string(),
            anchor_color: "#C0392B".to_string(),
        }
    }

    pub fn dark() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            font_size: 11.0,
            background: "#1E1E24".to_string(),
            label_fill: "#2B2F3A".to_string(),
            label_stroke: "#8FA3C7".to_string(),
            label_text: "#E6E9F0".to_string(),
            leader_color: "#C8CCD6".to_string(),
            anchor_color: "#FF7A6B".to_string(),
        }
    }
}
