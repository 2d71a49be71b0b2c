use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context as _;
use clap::{ArgAction, Parser, Subcommand};
use statemap_explorer::{
    Dataset, Gesture, Outcome, RecordingRenderer, ScriptStep, Session, SessionOpts, SessionSnapshot,
    StateId, Statemap, percent, state_at, state_over_interval, time_units,
};

#[derive(Parser, Debug)]
#[command(name = "statemap-explorer", version)]
struct Cli {
    /// Increase log verbosity (`-v` debug, `-vv` trace). Logs go to stderr.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Strictly validate a statemap document and print a summary.
    Check(CheckArgs),
    /// Print one entity's state breakdown at a time or over a range.
    Breakdown(BreakdownArgs),
    /// Run a gesture script through a headless session.
    Replay(ReplayArgs),
}

#[derive(Parser, Debug)]
struct CheckArgs {
    /// Input statemap JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

#[derive(Parser, Debug)]
struct BreakdownArgs {
    /// Input statemap JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Entity name.
    #[arg(long)]
    entity: String,

    /// Absolute time in nanoseconds.
    #[arg(long)]
    at: u64,

    /// End of the range (absolute nanoseconds); a point query when omitted.
    #[arg(long)]
    until: Option<u64>,

    /// Print JSON instead of text.
    #[arg(long)]
    json: bool,
}

#[derive(Parser, Debug)]
struct ReplayArgs {
    /// Input statemap JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Gesture script: a JSON array of gesture objects or shorthand names.
    #[arg(long)]
    script: PathBuf,

    /// Print one JSON snapshot per line instead of text.
    #[arg(long)]
    json: bool,

    /// Tag breakdown rows shown before folding into "...".
    #[arg(long)]
    tag_rows: Option<usize>,

    /// Do not recenter on the marker when zooming.
    #[arg(long)]
    no_follow: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Check(args) => cmd_check(args),
        Command::Breakdown(args) => cmd_breakdown(args),
        Command::Replay(args) => cmd_replay(args),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_target(false)
        .init();
}

fn read_dataset(path: &Path) -> anyhow::Result<Dataset> {
    let f = File::open(path).with_context(|| format!("open statemap '{}'", path.display()))?;
    let r = BufReader::new(f);
    let ds: Dataset = serde_json::from_reader(r).with_context(|| "parse statemap JSON")?;
    Ok(ds)
}

fn load_map(path: &Path) -> anyhow::Result<Statemap> {
    let ds = read_dataset(path)?;
    Statemap::from_dataset(ds).with_context(|| format!("load statemap '{}'", path.display()))
}

fn cmd_check(args: CheckArgs) -> anyhow::Result<()> {
    let ds = read_dataset(&args.in_path)?;
    ds.validate()?;

    let samples: usize = ds.entities.values().map(|e| e.data.len()).sum();
    let map = Statemap::from_dataset(ds)?;
    let geom = map.geometry();

    println!("ok: {}", args.in_path.display());
    if let Some(title) = map.title() {
        println!("  title:    {title}");
    }
    println!("  entities: {} ({})", map.entities().len(), map.entity_kind());
    println!("  samples:  {samples}");
    println!("  states:   {}", map.states().len());
    println!("  tags:     {}", map.tags().len());
    println!(
        "  span:     {} from {}",
        time_units(geom.time_width),
        time_units(geom.begin)
    );
    Ok(())
}

#[derive(serde::Serialize)]
struct BreakdownRow {
    state: StateId,
    name: String,
    fraction: f64,
}

fn cmd_breakdown(args: BreakdownArgs) -> anyhow::Result<()> {
    let map = load_map(&args.in_path)?;
    let entity = map.entity_by_name(&args.entity)?;

    let at = args.at as f64;
    let mix = match args.until {
        Some(until) if until < args.at => {
            anyhow::bail!("--until ({until}) precedes --at ({})", args.at)
        }
        Some(until) => state_over_interval(&entity.series, at, until as f64),
        None => state_at(&entity.series, at),
    };

    let rows: Vec<BreakdownRow> = mix
        .into_iter()
        .map(|(state, fraction)| BreakdownRow {
            state,
            name: map.state_name(state),
            fraction,
        })
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }
    if rows.is_empty() {
        println!("{}: no active sample", entity.name);
        return Ok(());
    }
    for row in rows {
        println!("{:>8}  {}", percent(row.fraction * 100.0), row.name);
    }
    Ok(())
}

#[derive(serde::Serialize)]
struct ReplayLine<'a> {
    step: usize,
    gesture: &'a Gesture,
    outcome: Outcome,
    snapshot: SessionSnapshot,
}

fn cmd_replay(args: ReplayArgs) -> anyhow::Result<()> {
    let map = Arc::new(load_map(&args.in_path)?);

    let f = File::open(&args.script)
        .with_context(|| format!("open script '{}'", args.script.display()))?;
    let steps: Vec<ScriptStep> =
        serde_json::from_reader(BufReader::new(f)).with_context(|| "parse gesture script")?;

    let mut opts = SessionOpts::default();
    if let Some(rows) = args.tag_rows {
        opts.tag_rows = rows;
    }
    if args.no_follow {
        opts.zoom_follows_marker = false;
    }

    let mut session = Session::new(map, RecordingRenderer::new(), opts.clone());
    for (step, s) in steps.into_iter().enumerate() {
        let gesture = s.resolve(&opts);
        let outcome = session.handle(gesture.clone());
        let snapshot = session.snapshot();

        if args.json {
            let line = ReplayLine {
                step,
                gesture: &gesture,
                outcome,
                snapshot,
            };
            println!("{}", serde_json::to_string(&line)?);
        } else {
            println!("[{step}] {} -> {outcome:?}", gesture.name());
            print_snapshot(&snapshot);
        }
    }

    let r = session.renderer();
    eprintln!(
        "live markers: {}, live labels: {}, stale removals: {}",
        r.live_markers().len(),
        r.live_labels().len(),
        r.stale_removals()
    );
    Ok(())
}

fn print_snapshot(snap: &SessionSnapshot) {
    println!("    {}", snap.span_label);
    if let Some(m) = &snap.marker {
        let place = m.x.map_or("hidden".to_string(), |x| format!("x={x:.1}"));
        println!("    marker: {} ({place})", m.text);
    }
    if let Some(d) = &snap.delta {
        println!("    delta:  {}", d.text);
    }
    if let Some(d) = &snap.detail {
        println!("    detail: {}", d.text);
    }
    let Some(sel) = &snap.selection else {
        return;
    };
    println!("    inspecting {} (keys: {})", sel.state_name, sel.keys.join(", "));
    if let (Some(header), Some(b)) = (&sel.header, &sel.breakdown) {
        println!("    {header}");
        for row in &b.rows {
            println!("      {:>8} {}", row.percent_text(), row.label);
        }
        println!("      {:>8} total", percent(b.total));
    }
}
