pub mod arrange;
#[cfg(feature = "cli")]
pub mod cli;
pub mod command;
pub mod config;
pub mod document;
pub mod layout;
pub mod model;
pub mod render;
pub mod report_dump;
pub mod theme;

pub use arrange::{ArrangeError, ArrangePhase, ArrangeReport, LabelIssue, LabelReport, arrange};
#[cfg(feature = "cli")]
pub use cli::run;
pub use command::{
    CommandOutcome, ConfirmationService, Scripted, SelectionService, run_arrange_command,
};
pub use config::{Config, PlacementConfig, RenderConfig, load_config, parse_config};
pub use document::{DocumentStore, Extent, Scene, StoreError};
pub use layout::{BBox, Point};
pub use model::{
    Element, ElementId, ElementLocation, FailurePolicy, Label, LabelId, Leader,
    LeaderEndCondition, LeaderStyle, PlacementStrategy, SortAxis,
};
pub use render::render_svg;
pub use theme::Theme;
