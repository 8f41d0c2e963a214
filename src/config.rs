use crate::model::{FailurePolicy, LeaderStyle, PlacementStrategy, SortAxis};
use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::path::Path;

// Per-axis presets in millimetres: rows are packed tighter than columns.
const HORIZONTAL_SPACING_MM: f64 = 80.0;
const HORIZONTAL_MARGIN_MM: f64 = 20.0;
const VERTICAL_SPACING_MM: f64 = 150.0;
const VERTICAL_MARGIN_MM: f64 = 30.0;
const REPAIR_SHIFT_MM: f64 = 2.0;
const REPAIR_MAX_SHIFTS: usize = 500;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementConfig {
    pub axis: SortAxis,
    pub leader_style: LeaderStyle,
    pub strategy: PlacementStrategy,
    /// Edge-to-edge gap between neighbours in oriented-edge mode.
    pub spacing: f64,
    /// Clearance around every box in overlap-repair mode.
    pub margin: f64,
    /// Uniform candidate increment in overlap-repair mode.
    pub step: f64,
    /// Distance a colliding candidate is pushed per retry.
    pub shift_step: f64,
    /// Retry bound for overlap repair; the loop always terminates after this
    /// many shifts.
    pub max_shift_attempts: usize,
    pub failure_policy: FailurePolicy,
    /// Decimal places used to group anchors by X in vertical sorting.
    pub coordinate_precision: u32,
}

impl PlacementConfig {
    pub fn for_axis(axis: SortAxis) -> Self {
        let mut config = Self {
            axis,
            ..Self::default()
        };
        config.apply_axis_preset(axis);
        config
    }

    /// Switch axis and load that axis' spacing, margin and step.
    pub fn apply_axis_preset(&mut self, axis: SortAxis) {
        let (spacing, margin) = match axis {
            SortAxis::Horizontal => (HORIZONTAL_SPACING_MM, HORIZONTAL_MARGIN_MM),
            SortAxis::Vertical => (VERTICAL_SPACING_MM, VERTICAL_MARGIN_MM),
        };
        self.axis = axis;
        self.spacing = spacing + margin;
        self.margin = margin;
        self.step = spacing + margin;
    }
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            axis: SortAxis::Horizontal,
            leader_style: LeaderStyle::Straight,
            strategy: PlacementStrategy::OrientedEdge,
            spacing: HORIZONTAL_SPACING_MM + HORIZONTAL_MARGIN_MM,
            margin: HORIZONTAL_MARGIN_MM,
            step: HORIZONTAL_SPACING_MM + HORIZONTAL_MARGIN_MM,
            shift_step: REPAIR_SHIFT_MM,
            max_shift_attempts: REPAIR_MAX_SHIFTS,
            failure_policy: FailurePolicy::SkipAndContinue,
            coordinate_precision: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderConfig {
    /// Pixels per drawing millimetre.
    pub scale: f64,
    /// Blank border around the content, in pixels.
    pub padding: f64,
    pub min_width: f64,
    pub min_height: f64,
    pub show_ids: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            scale: 1.0,
            padding: 24.0,
            min_width: 200.0,
            min_height: 200.0,
            show_ids: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub theme: Theme,
    pub placement: PlacementConfig,
    pub render: RenderConfig,
    /// Spacing or margin came from the user; axis presets must not replace them.
    pub spacing_pinned: bool,
    /// Axis named in the config file; answers the axis prompt up front.
    pub axis_preset: Option<SortAxis>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: Theme::light(),
            placement: PlacementConfig::default(),
            render: RenderConfig::default(),
            spacing_pinned: false,
            axis_preset: None,
        }
    }
}

impl Config {
    /// Select the layout axis, loading that axis' presets unless pinned.
    pub fn select_axis(&mut self, axis: SortAxis) {
        if self.spacing_pinned {
            self.placement.axis = axis;
        } else {
            self.placement.apply_axis_preset(axis);
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct PlacementConfigFile {
    axis: Option<SortAxis>,
    leader_style: Option<LeaderStyle>,
    strategy: Option<PlacementStrategy>,
    spacing: Option<f64>,
    margin: Option<f64>,
    step: Option<f64>,
    shift_step: Option<f64>,
    max_shift_attempts: Option<usize>,
    failure_policy: Option<FailurePolicy>,
    coordinate_precision: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RenderConfigFile {
    scale: Option<f64>,
    padding: Option<f64>,
    min_width: Option<f64>,
    min_height: Option<f64>,
    show_ids: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    font_size: Option<f64>,
    background: Option<String>,
    label_fill: Option<String>,
    label_stroke: Option<String>,
    label_text: Option<String>,
    leader_color: Option<String>,
    anchor_color: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    placement: Option<PlacementConfigFile>,
    render: Option<RenderConfigFile>,
}

/// Defaults, overlaid with the JSON5 file at `path` when given.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let parsed: ConfigFile = json5::from_str(contents)?;

    if let Some(theme_name) = parsed.theme.as_deref() {
        match theme_name {
            "dark" => config.theme = Theme::dark(),
            "light" | "default" => config.theme = Theme::light(),
            other => anyhow::bail!("unknown theme '{other}'"),
        }
    }

    if let Some(vars) = parsed.theme_variables {
        if let Some(v) = vars.font_family {
            config.theme.font_family = v;
        }
        if let Some(v) = vars.font_size {
            config.theme.font_size = v;
        }
        if let Some(v) = vars.background {
            config.theme.background = v;
        }
        if let Some(v) = vars.label_fill {
            config.theme.label_fill = v;
        }
        if let Some(v) = vars.label_stroke {
            config.theme.label_stroke = v;
        }
        if let Some(v) = vars.label_text {
            config.theme.label_text = v;
        }
        if let Some(v) = vars.leader_color {
            config.theme.leader_color = v;
        }
        if let Some(v) = vars.anchor_color {
            config.theme.anchor_color = v;
        }
    }

    if let Some(placement) = parsed.placement {
        if let Some(v) = placement.axis {
            config.placement.apply_axis_preset(v);
            config.axis_preset = Some(v);
        }
        if let Some(v) = placement.leader_style {
            config.placement.leader_style = v;
        }
        if let Some(v) = placement.strategy {
            config.placement.strategy = v;
        }
        if let Some(v) = placement.spacing {
            config.placement.spacing = v;
            config.spacing_pinned = true;
        }
        if let Some(v) = placement.margin {
            config.placement.margin = v;
            config.spacing_pinned = true;
        }
        if let Some(v) = placement.step {
            config.placement.step = v;
            config.spacing_pinned = true;
        }
        if let Some(v) = placement.shift_step {
            config.placement.shift_step = v;
        }
        if let Some(v) = placement.max_shift_attempts {
            config.placement.max_shift_attempts = v;
        }
        if let Some(v) = placement.failure_policy {
            config.placement.failure_policy = v;
        }
        if let Some(v) = placement.coordinate_precision {
            config.placement.coordinate_precision = v;
        }
    }

    if let Some(render) = parsed.render {
        if let Some(v) = render.scale {
            config.render.scale = v;
        }
        if let Some(v) = render.padding {
            config.render.padding = v;
        }
        if let Some(v) = render.min_width {
            config.render.min_width = v;
        }
        if let Some(v) = render.min_height {
            config.render.min_height = v;
        }
        if let Some(v) = render.show_ids {
            config.render.show_ids = v;
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_presets_add_margin_to_spacing() {
        let h = PlacementConfig::for_axis(SortAxis::Horizontal);
        assert_eq!(h.spacing, 100.0);
        assert_eq!(h.margin, 20.0);
        let v = PlacementConfig::for_axis(SortAxis::Vertical);
        assert_eq!(v.axis, SortAxis::Vertical);
        assert_eq!(v.spacing, 180.0);
        assert_eq!(v.margin, 30.0);
        assert_eq!(PlacementConfig::default(), h);
    }

    #[test]
    fn file_overrides_defaults_and_pins_spacing() {
        let config = parse_config(
            r#"{
                // comments are fine, this is JSON5
                theme: "dark",
                placement: { axis: "vertical", spacing: 42, strategy: "overlapRepair", leaderStyle: "lShape" },
                render: { scale: 2.5 },
            }"#,
        )
        .expect("config should parse");
        assert_eq!(config.placement.axis, SortAxis::Vertical);
        assert_eq!(config.axis_preset, Some(SortAxis::Vertical));
        assert_eq!(config.placement.spacing, 42.0);
        assert_eq!(config.placement.margin, 30.0, "margin comes from the vertical preset");
        assert_eq!(config.placement.strategy, PlacementStrategy::OverlapRepair);
        assert_eq!(config.placement.leader_style, LeaderStyle::LShape);
        assert_eq!(config.render.scale, 2.5);
        assert_eq!(config.theme.background, Theme::dark().background);
        assert!(config.spacing_pinned);
    }

    #[test]
    fn select_axis_keeps_pinned_spacing() {
        let mut config = Config::default();
        config.select_axis(SortAxis::Vertical);
        assert_eq!(config.placement.spacing, 180.0);

        let mut pinned = Config {
            spacing_pinned: true,
            ..Config::default()
        };
        pinned.placement.spacing = 12.0;
        pinned.select_axis(SortAxis::Vertical);
        assert_eq!(pinned.placement.axis, SortAxis::Vertical);
        assert_eq!(pinned.placement.spacing, 12.0);
    }

    #[test]
    fn unknown_theme_is_rejected() {
        assert!(parse_config(r#"{ "theme": "neon" }"#).is_err());
    }
}
