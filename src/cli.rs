use crate::command::{
    AXIS_TITLE, CommandOutcome, ConfirmationService, LEADER_TITLE, SelectionService,
    run_arrange_command,
};
use crate::config::{Config, load_config};
use crate::document::{DocumentStore, Scene};
use crate::layout::Point;
use crate::model::{FailurePolicy, LabelId, LeaderStyle, PlacementStrategy, SortAxis};
use crate::render::{render_svg, write_output_svg};
use crate::report_dump::write_report_dump;
use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "tagarr",
    version,
    about = "Arrange annotation labels into a tidy row or column"
)]
pub struct Args {
    /// Scene file (.json) with elements and labels
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,

    /// Arranged scene output. Defaults to stdout if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Write a preview of the arranged scene
    #[arg(long = "preview")]
    pub preview: Option<PathBuf>,

    /// Preview format
    #[arg(long = "preview-format", value_enum, default_value = "svg")]
    pub preview_format: PreviewFormat,

    /// Write a JSON report of the arrangement
    #[arg(long = "report")]
    pub report: Option<PathBuf>,

    /// Start point as x,y[,z]; prompted for when omitted
    #[arg(long = "origin", value_parser = parse_point)]
    pub origin: Option<Point>,

    /// Comma-separated label ids; defaults to every label in the scene
    #[arg(long = "labels", value_delimiter = ',')]
    pub labels: Option<Vec<u64>>,

    /// horizontal | vertical; prompted for when omitted
    #[arg(long = "axis", value_parser = parse_axis)]
    pub axis: Option<SortAxis>,

    /// straight | l-shape; prompted for when omitted
    #[arg(long = "leader-style", value_parser = parse_leader_style)]
    pub leader_style: Option<LeaderStyle>,

    /// edge | repair
    #[arg(long = "strategy", value_parser = parse_strategy)]
    pub strategy: Option<PlacementStrategy>,

    /// Edge-to-edge spacing in millimetres
    #[arg(long = "spacing")]
    pub spacing: Option<f64>,

    /// Overlap clearance in millimetres
    #[arg(long = "margin")]
    pub margin: Option<f64>,

    /// Abort the whole batch if any label fails
    #[arg(long = "strict")]
    pub strict: bool,

    /// Config file (JSON5)
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Debug logging
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Append log lines to this file instead of stderr
    #[arg(long = "log-file")]
    pub log_file: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum PreviewFormat {
    Svg,
    Png,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose, args.log_file.as_deref());

    let mut config = load_config(args.config.as_deref())?;
    if let Some(strategy) = args.strategy {
        config.placement.strategy = strategy;
    }
    if let Some(spacing) = args.spacing {
        config.placement.spacing = spacing;
        config.placement.step = spacing;
        config.spacing_pinned = true;
    }
    if let Some(margin) = args.margin {
        config.placement.margin = margin;
        config.spacing_pinned = true;
    }
    if args.strict {
        config.placement.failure_policy = FailurePolicy::AllOrNothing;
    }

    let mut scene = Scene::load(&args.input)?;
    let labels: Vec<LabelId> = match &args.labels {
        Some(ids) => ids.iter().map(|id| LabelId(*id)).collect(),
        None => scene.label_ids(),
    };
    let mut selection = TerminalSelection {
        labels: Some(labels),
        origin: args.origin,
    };
    let mut confirmation = TerminalConfirmation {
        presets: confirmation_presets(&args, &config),
    };

    let outcome = run_arrange_command(&mut scene, &mut selection, &mut confirmation, &config);
    let report = match outcome {
        CommandOutcome::Succeeded(report) => report,
        CommandOutcome::Cancelled => {
            eprintln!("cancelled");
            return Ok(());
        }
        CommandOutcome::Failed(reason) => return Err(anyhow::anyhow!(reason)),
    };
    eprintln!("{}", CommandOutcome::Succeeded(report.clone()));

    let json = scene.to_json()?;
    match args.output.as_deref() {
        Some(path) => std::fs::write(path, json)?,
        None => println!("{json}"),
    }
    if let Some(path) = args.report.as_deref() {
        write_report_dump(path, &report)?;
    }
    if let Some(path) = args.preview.as_deref() {
        let svg = render_svg(&scene, &config.theme, &config.render);
        match args.preview_format {
            PreviewFormat::Svg => write_output_svg(&svg, Some(path))?,
            PreviewFormat::Png => write_preview_png(&svg, path, &config.theme)?,
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
fn write_preview_png(svg: &str, path: &Path, theme: &crate::theme::Theme) -> Result<()> {
    crate::render::write_output_png(svg, path, theme)
}

#[cfg(not(feature = "png"))]
fn write_preview_png(_svg: &str, _path: &Path, _theme: &crate::theme::Theme) -> Result<()> {
    Err(anyhow::anyhow!("PNG preview requires the 'png' feature"))
}

/// Install the log sink. Failing to open the log file falls back to stderr;
/// logging problems never stop the command.
fn init_tracing(verbose: bool, log_file: Option<&Path>) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    if let Some(path) = log_file {
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => {
                let _ = tracing_subscriber::fmt()
                    .with_env_filter(filter())
                    .with_ansi(false)
                    .with_writer(Mutex::new(file))
                    .try_init();
                return;
            }
            Err(err) => eprintln!("warning: cannot open log file {}: {err}", path.display()),
        }
    }
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter())
        .with_writer(io::stderr)
        .try_init();
}

/// Labels come from the command line; the origin is asked for on the terminal
/// when not given.
struct TerminalSelection {
    labels: Option<Vec<LabelId>>,
    origin: Option<Point>,
}

impl SelectionService for TerminalSelection {
    fn pick_labels(&mut self, _prompt: &str) -> Option<Vec<LabelId>> {
        self.labels.take()
    }

    fn pick_point(&mut self, prompt: &str) -> Option<Point> {
        if let Some(origin) = self.origin {
            return Some(origin);
        }
        loop {
            let line = prompt_line(&format!("{prompt} (x,y[,z]; empty to cancel): "))?;
            match parse_point(&line) {
                Ok(point) => return Some(point),
                Err(err) => eprintln!("{err}"),
            }
        }
    }
}

struct TerminalConfirmation {
    presets: HashMap<&'static str, usize>,
}

impl ConfirmationService for TerminalConfirmation {
    fn choose(&mut self, title: &str, options: &[&str]) -> Option<usize> {
        if let Some(choice) = self.presets.get(title) {
            return Some(*choice);
        }
        eprintln!("{title}:");
        for (idx, option) in options.iter().enumerate() {
            eprintln!("  {}) {option}", idx + 1);
        }
        loop {
            let line = prompt_line("choice (empty to cancel): ")?;
            match line.parse::<usize>() {
                Ok(n) if (1..=options.len()).contains(&n) => return Some(n - 1),
                _ => eprintln!("enter a number between 1 and {}", options.len()),
            }
        }
    }
}

/// One trimmed line from stdin; `None` on EOF, read error or empty input.
fn prompt_line(prompt: &str) -> Option<String> {
    eprint!("{prompt}");
    let _ = io::stderr().flush();
    let mut line = String::new();
    match io::stdin().lock().read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => {
            let trimmed = line.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
    }
}

/// Prompt answers known before the command starts. `--axis` wins over the
/// config file's axis.
fn confirmation_presets(args: &Args, config: &Config) -> HashMap<&'static str, usize> {
    let mut presets = HashMap::new();
    if let Some(axis) = args.axis.or(config.axis_preset) {
        presets.insert(AXIS_TITLE, axis_choice(axis));
    }
    if let Some(style) = args.leader_style {
        presets.insert(LEADER_TITLE, leader_choice(style));
    }
    presets
}

fn axis_choice(axis: SortAxis) -> usize {
    match axis {
        SortAxis::Horizontal => 0,
        SortAxis::Vertical => 1,
    }
}

fn leader_choice(style: LeaderStyle) -> usize {
    match style {
        LeaderStyle::Straight => 0,
        LeaderStyle::LShape => 1,
    }
}

fn parse_point(input: &str) -> Result<Point, String> {
    let parts: Vec<&str> = input.split(',').map(str::trim).collect();
    if !(2..=3).contains(&parts.len()) {
        return Err(format!("expected x,y or x,y,z, got '{input}'"));
    }
    let mut coords = [0.0f64; 3];
    for (slot, part) in coords.iter_mut().zip(&parts) {
        *slot = part
            .parse()
            .map_err(|_| format!("'{part}' is not a number"))?;
    }
    Ok(Point::new(coords[0], coords[1], coords[2]))
}

fn parse_axis(input: &str) -> Result<SortAxis, String> {
    SortAxis::from_token(input).ok_or_else(|| format!("unknown axis '{input}'"))
}

fn parse_leader_style(input: &str) -> Result<LeaderStyle, String> {
    LeaderStyle::from_token(input).ok_or_else(|| format!("unknown leader style '{input}'"))
}

fn parse_strategy(input: &str) -> Result<PlacementStrategy, String> {
    PlacementStrategy::from_token(input).ok_or_else(|| format!("unknown strategy '{input}'"))
}
