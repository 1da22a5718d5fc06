use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use chrono::TimeDelta;
use clap::{Args, Parser, Subcommand, ValueEnum};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;
use tracing_subscriber::EnvFilter;

use eqwatch::data::duration::{format_duration, parse_width};
use eqwatch::data::{
    compare_distributions, report, DistributionOptions, SensorWindow, UnresolvedPolicy,
};
use eqwatch::plot::{self, BarPlan, DistributionPlan, OverlayPlan};
use eqwatch::prepare::{self, SensorTable};
use eqwatch::store::{join_key, region};
use eqwatch::ui::common::{format_share, format_value};
use eqwatch::{
    events, labels, ui, App, DiagnosticsData, DiagnosticsOptions, FileSource, ObjectStore, Settings,
    TagComponentMap, TimeRange,
};
use eqwatch_types::tag_of;

#[derive(Parser, Debug)]
#[command(name = "eqwatch")]
#[command(about = "Prepare sensor datasets and explain anomaly-detection model results")]
struct Cli {
    /// Config file (default: eqwatch.toml in the working directory, if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Merge per-component CSV folders into one table and tag map
    Prepare(PrepareArgs),
    /// Rank the components and sensors behind detected events
    Diagnose(DiagnoseArgs),
    /// Draw charts to SVG or PNG
    Plot {
        #[command(subcommand)]
        chart: PlotCommand,
    },
    /// Validate a label file and optionally upload it
    Labels(LabelsArgs),
    /// Browse an evaluation in the terminal
    Inspect(InspectArgs),
}

#[derive(Args, Debug)]
struct PrepareArgs {
    /// Directory with one sub-directory of CSV files per component
    #[arg(short, long)]
    input: PathBuf,

    /// Where to write the merged wide table
    #[arg(short, long, default_value = "merged.csv")]
    output: PathBuf,

    /// Where to write the Tag,Component map
    #[arg(long, default_value = "tags.csv")]
    tags: PathBuf,

    /// Average readings into windows of this width first (e.g. "10min")
    #[arg(long)]
    resample: Option<String>,

    /// Upload one object per component to the configured bucket
    #[arg(long)]
    upload: bool,
}

/// Time window shared by the analysis commands.
#[derive(Args, Debug, Clone)]
struct WindowArgs {
    /// Window start (e.g. 2019-08-01 or 2019-08-01T00:00:00)
    #[arg(long, requires = "end")]
    start: Option<String>,

    /// Window end
    #[arg(long, requires = "start")]
    end: Option<String>,
}

impl WindowArgs {
    fn parse(&self) -> Result<Option<TimeRange>> {
        match (&self.start, &self.end) {
            (Some(start), Some(end)) => Ok(Some(
                TimeRange::parse(start, end).with_context(|| format!("Invalid window {start} .. {end}"))?,
            )),
            _ => Ok(None),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Breakdown {
    Component,
    Sensor,
}

#[derive(Args, Debug)]
struct DiagnoseArgs {
    /// Describe-model response or metrics JSON
    #[arg(short, long)]
    model: PathBuf,

    /// Tag,Component map
    #[arg(short, long)]
    tags: PathBuf,

    #[command(flatten)]
    window: WindowArgs,

    #[arg(long, value_enum, default_value = "component")]
    by: Breakdown,

    /// Rows to show (default from config)
    #[arg(long)]
    top: Option<usize>,

    /// What to do with sensors missing from the tag map
    #[arg(long, value_enum)]
    policy: Option<UnresolvedPolicy>,

    /// Write the full diagnostics as JSON
    #[arg(long)]
    export: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum PlotCommand {
    /// Sensor time series with known anomalies and detected events shaded
    Overlay(OverlayArgs),
    /// Ranked bars of component or sensor importance
    Contributions(ContributionArgs),
    /// Normal vs anomalous value distributions of the top sensors
    Histograms(HistogramArgs),
}

#[derive(Args, Debug)]
struct OverlayArgs {
    /// Merged sensor table
    #[arg(short, long)]
    data: PathBuf,

    /// Known anomaly ranges
    #[arg(short, long)]
    labels: Option<PathBuf>,

    /// Model evaluation, for detected events
    #[arg(short, long)]
    model: Option<PathBuf>,

    /// Tags to draw (default: most important sensors, else the first columns)
    #[arg(short, long, value_delimiter = ',')]
    sensors: Vec<String>,

    #[arg(long, default_value_t = 3)]
    top: usize,

    #[command(flatten)]
    window: WindowArgs,

    #[arg(short, long, default_value = "overlay.svg")]
    output: PathBuf,
}

#[derive(Args, Debug)]
struct ContributionArgs {
    #[arg(short, long)]
    model: PathBuf,

    #[arg(short, long)]
    tags: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "component")]
    by: Breakdown,

    /// Only this event (its index in the predicted ranges)
    #[arg(long)]
    event: Option<usize>,

    #[arg(long)]
    top: Option<usize>,

    /// Show shares of the total instead of raw importance
    #[arg(long)]
    normalize: bool,

    #[arg(long, value_enum)]
    policy: Option<UnresolvedPolicy>,

    #[command(flatten)]
    window: WindowArgs,

    #[arg(short, long, default_value = "contributions.svg")]
    output: PathBuf,
}

#[derive(Args, Debug)]
struct HistogramArgs {
    #[arg(short, long)]
    data: PathBuf,

    /// Model evaluation: ranks sensors, and its detected events are the
    /// anomalous period unless --labels is given
    #[arg(short, long)]
    model: Option<PathBuf>,

    /// Use these ranges as the anomalous period
    #[arg(short, long)]
    labels: Option<PathBuf>,

    /// Tags to compare (default: the most important sensors)
    #[arg(short, long, value_delimiter = ',')]
    sensors: Vec<String>,

    #[arg(long)]
    top: Option<usize>,

    #[arg(long)]
    bins: Option<usize>,

    /// Average readings into windows of this width first (e.g. "10min")
    #[arg(long)]
    resample: Option<String>,

    /// Plot raw counts instead of densities
    #[arg(long)]
    counts: bool,

    #[command(flatten)]
    window: WindowArgs,

    #[arg(short, long, default_value = "histograms.svg")]
    output: PathBuf,
}

#[derive(Args, Debug)]
struct LabelsArgs {
    #[arg(short, long)]
    input: PathBuf,

    /// Rewrite the ranges in canonical form
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Upload to the configured bucket
    #[arg(long)]
    upload: bool,

    /// Object key (default: <prefix>/labels/labels.csv)
    #[arg(long)]
    key: Option<String>,
}

#[derive(Args, Debug)]
struct InspectArgs {
    #[arg(short, long)]
    model: PathBuf,

    /// Tag,Component map; without one, components come from sensor name prefixes
    #[arg(short, long)]
    tags: Option<PathBuf>,

    #[command(flatten)]
    window: WindowArgs,

    #[arg(long, value_enum)]
    policy: Option<UnresolvedPolicy>,

    /// Refresh interval in seconds
    #[arg(short, long, default_value = "1")]
    refresh: u64,

    /// Export diagnostics to a JSON file and exit
    #[arg(short, long)]
    export: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs would corrupt the alternate screen
    let default_filter = match &cli.command {
        Command::Inspect(args) if args.export.is_none() => "off",
        _ => "info",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with_writer(io::stderr)
        .init();

    let settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Command::Prepare(args) => run_prepare(&settings, args),
        Command::Diagnose(args) => run_diagnose(&settings, args),
        Command::Plot { chart } => match chart {
            PlotCommand::Overlay(args) => run_overlay(&settings, args),
            PlotCommand::Contributions(args) => run_contributions(&settings, args),
            PlotCommand::Histograms(args) => run_histograms(&settings, args),
        },
        Command::Labels(args) => run_labels(&settings, args),
        Command::Inspect(args) => run_inspect(&settings, args),
    }
}

fn load_tag_map(path: &Path) -> Result<TagComponentMap> {
    let file = File::open(path).with_context(|| format!("Failed to open tag map {}", path.display()))?;
    prepare::read_tag_map(file).with_context(|| format!("Invalid tag map {}", path.display()))
}

fn load_table(path: &Path) -> Result<SensorTable> {
    prepare::read_table_path(path).with_context(|| format!("Failed to read sensor table {}", path.display()))
}

fn diagnostics_options(
    settings: &Settings,
    policy: Option<UnresolvedPolicy>,
    window: &WindowArgs,
) -> Result<DiagnosticsOptions> {
    Ok(DiagnosticsOptions {
        policy: policy.unwrap_or(settings.diagnostics.policy),
        step: settings.step()?,
        window: window.parse()?,
    })
}

fn run_prepare(settings: &Settings, args: PrepareArgs) -> Result<()> {
    let width = args.resample.as_deref().map(parse_width).transpose()?;

    // Fail before any work if the upload cannot happen
    let store = if args.upload {
        region::warn_if_unavailable(settings.service.region.as_deref());
        Some(settings.store()?)
    } else {
        None
    };

    let mut frames = prepare::discover_components(&args.input)
        .with_context(|| format!("Failed to read components from {}", args.input.display()))?;
    if let Some(width) = width {
        for frame in &mut frames {
            frame.table = frame.table.resample(width)?;
        }
        info!(width = %format_duration(width), "readings resampled");
    }

    let (table, map) = prepare::merge(&frames)?;

    let output = File::create(&args.output).with_context(|| format!("Failed to create {}", args.output.display()))?;
    prepare::write_table(&table, output)?;
    let tags = File::create(&args.tags).with_context(|| format!("Failed to create {}", args.tags.display()))?;
    prepare::write_tag_map(&map, tags)?;

    println!(
        "Merged {} components, {} sensors, {} rows into {}",
        frames.len(),
        map.len(),
        table.len(),
        args.output.display()
    );
    if let Some(span) = table.span() {
        println!("  {} → {}", span.start, span.end);
    }
    println!("Wrote tag map to {}", args.tags.display());

    if let Some(store) = store {
        let keys = prepare::upload_dataset(&store, &settings.storage.prefix, &frames)?;
        println!("Uploaded {} objects to {}", keys.len(), store.description());
        for key in keys {
            println!("  {key}");
        }
    }
    Ok(())
}

fn run_diagnose(settings: &Settings, args: DiagnoseArgs) -> Result<()> {
    let map = load_tag_map(&args.tags)?;
    let options = diagnostics_options(settings, args.policy, &args.window)?;
    let data = DiagnosticsData::load(&args.model, &map, &options)?;
    let top = args.top.unwrap_or(settings.diagnostics.top);

    print_summary(&data);
    println!();
    match args.by {
        Breakdown::Component => print_components(&data, top),
        Breakdown::Sensor => print_sensors(&data, &map, top),
    }

    println!();
    println!("{:>4}  {:<19}  {:>8}  {:<8}  TOP COMPONENT", "#", "START", "DURATION", "LABEL");
    for event in &data.events {
        println!(
            "{:>4}  {:<19}  {:>8}  {:<8}  {}",
            event.index,
            event.range.start.format("%Y-%m-%d %H:%M:%S").to_string(),
            format_duration(event.duration()),
            if event.labeled { "known" } else { "unknown" },
            event.top_component().unwrap_or(plot::UNMAPPED_LABEL),
        );
    }

    if let Some(path) = args.export {
        let json = serde_json::to_string_pretty(&report::to_json(&data, top))?;
        std::fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        println!();
        println!("Exported diagnostics to: {}", path.display());
    }
    Ok(())
}

fn print_summary(data: &DiagnosticsData) {
    match &data.status {
        Some(status) => println!("Model: {} ({status})", data.model_name),
        None => println!("Model: {}", data.model_name),
    }
    if let Some(window) = data.window {
        println!("Window: {} → {} ({})", window.start, window.end, format_duration(window.duration()));
    }
    let recall = data
        .summary
        .recall()
        .map(|r| format!("{:.0}%", r * 100.0))
        .unwrap_or_else(|| "-".to_string());
    println!(
        "Events: {} predicted, {}/{} labels detected (recall {recall}), {} unknown",
        data.events.len(),
        data.summary.detected_count(),
        data.summary.matches.len(),
        data.unknown_count()
    );
    for m in &data.summary.matches {
        if let Some(delay) = m.detection_delay() {
            println!("  label {} detected after {}", m.label.start, format_duration(delay));
        } else {
            println!("  label {} missed", m.label.start);
        }
    }
}

fn print_components(data: &DiagnosticsData, top: usize) {
    let normalized = data.components.normalized();
    println!("{:<24}  {:>12}  {:>7}", "COMPONENT", "IMPORTANCE", "SHARE");
    for (c, n) in data.components.top(top).iter().zip(&normalized.components) {
        println!("{:<24}  {:>12}  {:>7}", c.component, format_value(c.value), format_share(n.value));
    }
    if !data.components.unresolved.is_empty() {
        println!(
            "{:<24}  {:>12}  {:>7}",
            plot::UNMAPPED_LABEL,
            format_value(data.components.unresolved_total()),
            format_share(normalized.unresolved_total())
        );
        let names: Vec<&str> = data.unresolved_sensors().into_iter().collect();
        println!("  not in the tag map: {}", names.join(", "));
    }
}

fn print_sensors(data: &DiagnosticsData, map: &TagComponentMap, top: usize) {
    let total: f64 = data.sensors.iter().map(|s| s.value).sum();
    println!("{:<24}  {:<16}  {:>12}  {:>7}", "SENSOR", "COMPONENT", "IMPORTANCE", "SHARE");
    for s in data.sensors.iter().take(top) {
        println!(
            "{:<24}  {:<16}  {:>12}  {:>7}",
            tag_of(&s.sensor),
            map.resolve(&s.sensor).unwrap_or(plot::UNMAPPED_LABEL),
            format_value(s.value),
            format_share(if total > 0.0 { s.value / total } else { 0.0 })
        );
    }
}

/// Tags of the `n` most important sensors over `window`.
fn top_tags(model: &Path, window: Option<TimeRange>, settings: &Settings, n: usize) -> Result<Vec<String>> {
    let evaluation = FileSource::new(model).load()?;
    let sensors = SensorWindow::new(settings.step()?)
        .with_window(window)
        .sum(evaluation.predicted_ranges())?;
    Ok(sensors.iter().take(n).map(|s| tag_of(&s.sensor).to_string()).collect())
}

fn run_overlay(settings: &Settings, args: OverlayArgs) -> Result<()> {
    let table = load_table(&args.data)?;
    let evaluation = args.model.as_deref().map(|m| FileSource::new(m).load()).transpose()?;
    let labels = args
        .labels
        .as_deref()
        .map(labels::read_labels_path)
        .transpose()?
        .or_else(|| evaluation.as_ref().map(|e| e.labeled_ranges().to_vec()))
        .unwrap_or_default();

    let window = match args.window.parse()? {
        Some(w) => w,
        None => evaluation
            .as_ref()
            .and_then(|e| e.evaluation_window())
            .or_else(|| table.span())
            .context("Sensor table is empty and no window was given")?,
    };

    let sensors = if !args.sensors.is_empty() {
        args.sensors.clone()
    } else if let Some(model) = args.model.as_deref() {
        top_tags(model, Some(window), settings, args.top)?
    } else {
        table.tags().take(args.top).map(str::to_string).collect()
    };
    let tags: Vec<&str> = sensors.iter().map(String::as_str).collect();

    let title = match &evaluation {
        Some(e) => format!("{}: known anomalies and detected events", e.display_name()),
        None => "Known anomalies".to_string(),
    };
    let mut plan = OverlayPlan::new(title, window).with_table(&table, &tags).with_labels(&labels);
    if let Some(evaluation) = &evaluation {
        plan = plan.with_predictions(evaluation.predicted_ranges());
    }

    plot::render_overlay(&plan, &args.output, &settings.render_options())?;
    println!(
        "Wrote {} ({} series, {} bands)",
        args.output.display(),
        plan.series.len(),
        plan.bands.len()
    );
    Ok(())
}

fn run_contributions(settings: &Settings, args: ContributionArgs) -> Result<()> {
    let map = match args.tags.as_deref() {
        Some(path) => load_tag_map(path)?,
        None => TagComponentMap::new(),
    };
    let policy = args.policy.or(args.tags.is_none().then_some(UnresolvedPolicy::NamePrefix));
    let options = diagnostics_options(settings, policy, &args.window)?;
    let data = DiagnosticsData::load(&args.model, &map, &options)?;
    let top = args.top.unwrap_or(settings.diagnostics.top);

    let (title, sensors, components) = match args.event {
        Some(index) => {
            let event = data
                .events
                .iter()
                .find(|e| e.index == index)
                .with_context(|| format!("No event #{index} in the window ({} events)", data.events.len()))?;
            (
                format!("{}: event #{index} ({})", data.model_name, event.range.start),
                &event.sensors,
                &event.components,
            )
        }
        None => (data.model_name.clone(), &data.sensors, &data.components),
    };

    let plan = match args.by {
        Breakdown::Component => BarPlan::from_aggregation(format!("{title}: components"), components, args.normalize),
        Breakdown::Sensor => BarPlan::from_sensors(format!("{title}: top sensors"), sensors, top, args.normalize),
    };

    plot::render_bars(&plan, &args.output, &settings.render_options())?;
    println!("Wrote {} ({} bars)", args.output.display(), plan.bars.len());
    Ok(())
}

fn run_histograms(settings: &Settings, args: HistogramArgs) -> Result<()> {
    let table = load_table(&args.data)?;
    let window = args.window.parse()?;
    let top = args.top.unwrap_or(settings.diagnostics.top);

    let ranges: Vec<TimeRange> = match (args.labels.as_deref(), args.model.as_deref()) {
        (Some(path), _) => labels::read_labels_path(path)?.into_iter().map(|l| l.range).collect(),
        (None, Some(model)) => FileSource::new(model)
            .load()?
            .predicted_ranges()
            .iter()
            .map(|p| p.range)
            .collect(),
        (None, None) => bail!("Give --labels or --model to define the anomalous period"),
    };

    let sensors = match (args.sensors.is_empty(), args.model.as_deref()) {
        (false, _) => args.sensors.clone(),
        (true, Some(model)) => top_tags(model, window, settings, top)?,
        (true, None) => bail!("Give --sensors or --model to choose which sensors to compare"),
    };
    let tags: Vec<&str> = sensors.iter().map(String::as_str).collect();

    let table = match window {
        Some(w) => table.slice(&w),
        None => table,
    };
    let options = DistributionOptions {
        bins: args.bins.unwrap_or(settings.plot.bins),
        density: !args.counts,
        resample: args.resample.as_deref().map(parse_width).transpose()?,
    };
    let panels = compare_distributions(&table, &tags, &ranges, &options)?;

    let plan = DistributionPlan::new("Normal vs anomalous readings", panels);
    plot::render_distributions(&plan, &args.output, &settings.render_options())?;
    println!("Wrote {} ({} sensors)", args.output.display(), plan.panels.len());
    Ok(())
}

fn run_labels(settings: &Settings, args: LabelsArgs) -> Result<()> {
    let ranges = labels::read_labels_path(&args.input)?;
    let total: TimeDelta = ranges.iter().map(|l| l.range.duration()).sum();
    println!("Read {} labeled ranges covering {}", ranges.len(), format_duration(total));
    if let Some(span) = TimeRange::span(ranges.iter().map(|l| &l.range)) {
        println!("  {} → {}", span.start, span.end);
    }

    if let Some(path) = &args.output {
        let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
        labels::write_labels(&ranges, file)?;
        println!("Wrote {}", path.display());
    }

    if args.upload {
        region::warn_if_unavailable(settings.service.region.as_deref());
        let store = settings.store()?;
        let key = args
            .key
            .unwrap_or_else(|| join_key(&[&settings.storage.prefix, "labels", "labels.csv"]));
        labels::upload_labels(&store, &key, &ranges)?;
        println!("Uploaded labels to {}/{key}", store.description());
    }
    Ok(())
}

fn run_inspect(settings: &Settings, args: InspectArgs) -> Result<()> {
    let map = match args.tags.as_deref() {
        Some(path) => load_tag_map(path)?,
        None => TagComponentMap::new(),
    };
    let policy = args.policy.or(args.tags.is_none().then_some(UnresolvedPolicy::NamePrefix));
    let options = diagnostics_options(settings, policy, &args.window)?;
    let top = settings.diagnostics.top;

    if let Some(export_path) = args.export {
        let data = DiagnosticsData::load(&args.model, &map, &options)?;
        let json = serde_json::to_string_pretty(&report::to_json(&data, top))?;
        std::fs::write(&export_path, json)
            .with_context(|| format!("Failed to write {}", export_path.display()))?;
        println!("Exported diagnostics to: {}", export_path.display());
        return Ok(());
    }

    let source = Box::new(FileSource::new(&args.model));
    let app = App::new(source, map, options).with_top(top);
    run_tui(app, Duration::from_secs(args.refresh.max(1)))
}

/// Run the TUI until the user quits
fn run_tui(mut app: App, refresh_interval: Duration) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Restore the terminal on panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic);
    }));

    let _ = app.reload_data();
    let result = run_app(&mut terminal, &mut app, refresh_interval);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    refresh_interval: Duration,
) -> Result<()> {
    let mut last_refresh = Instant::now();

    while app.running {
        terminal.draw(|frame| ui::draw(frame, app))?;

        if let Some(event) = events::poll_event(Duration::from_millis(100))? {
            match event {
                Event::Key(key) => events::handle_key_event(app, key),
                Event::Mouse(mouse) => events::handle_mouse_event(app, mouse, ui::CONTENT_START_ROW),
                _ => {}
            }
        }

        // Picks up a rewritten model document
        if last_refresh.elapsed() >= refresh_interval {
            let _ = app.reload_data();
            last_refresh = Instant::now();
        }
    }

    Ok(())
}
