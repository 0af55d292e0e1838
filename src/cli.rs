use clap::{Args, Parser, Subcommand};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use ecotracker::adapters::{
    Element, FixedGeolocator, HttpBackend, MapScene, MemoryDom, SceneBackend, TokioTimeProvider,
    UnavailableGeolocator,
};
use ecotracker::config::{AppConfig, MapProvider};
use ecotracker::geo::{LatLng, format_distance, nearest_first};
use ecotracker::notifications::badge_text;
use ecotracker::page::PageGlobals;
use ecotracker::ports::{Geolocator, NotificationApi, SearchApi, Target, TimeProvider};
use ecotracker::{Center, MapController, NotificationPoller, ToastQueue};

const DEFAULT_SEARCH_ENDPOINT: &str = "/centers/search/";

pub(crate) enum RunOutcome {
    Execute(Invocation),
    Exit(i32),
}

pub(crate) struct Invocation {
    pub(crate) config: AppConfig,
    command: Command,
}

pub(crate) fn run() -> RunOutcome {
    let cli = Cli::parse();
    match resolve_config(&cli) {
        Ok(config) => RunOutcome::Execute(Invocation {
            config,
            command: cli.command,
        }),
        Err(err) => {
            eprintln!("error: {err}");
            RunOutcome::Exit(2)
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "ecotracker",
    version,
    about = "Recycling center map, notification and search tools"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
    /// TOML config file; built-in defaults apply to anything it leaves out.
    #[arg(long, env = "ECOTRACKER_CONFIG")]
    config: Option<PathBuf>,
    #[arg(long, env = "ECOTRACKER_BASE_URL")]
    base_url: Option<String>,
    #[arg(long, value_enum)]
    provider: Option<MapProvider>,
    #[arg(long, env = "ECOTRACKER_LOG_LEVEL")]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Distance between two "lat,lng" points.
    Distance(DistanceArgs),
    /// Render a centers file into a map scene (JSON).
    Render(RenderArgs),
    /// List centers by distance from a point.
    Nearest(NearestArgs),
    /// Print the unread notification badge.
    Badge(BadgeArgs),
    Search(SearchArgs),
}

#[derive(Args, Debug)]
struct DistanceArgs {
    #[arg(allow_hyphen_values = true)]
    from: LatLng,
    #[arg(allow_hyphen_values = true)]
    to: LatLng,
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// JSON list of centers, or page globals with `centers`.
    #[arg(long)]
    centers: PathBuf,
    #[arg(long, allow_hyphen_values = true)]
    user: Option<LatLng>,
    #[arg(long)]
    material: Option<String>,
}

#[derive(Args, Debug)]
struct NearestArgs {
    #[arg(long)]
    centers: PathBuf,
    #[arg(long, allow_hyphen_values = true)]
    from: LatLng,
    #[arg(long, default_value_t = 5)]
    limit: usize,
}

#[derive(Args, Debug)]
struct BadgeArgs {
    /// Keep polling at the configured interval.
    #[arg(long)]
    watch: bool,
}

#[derive(Args, Debug)]
struct SearchArgs {
    query: String,
    #[arg(long, default_value = DEFAULT_SEARCH_ENDPOINT)]
    endpoint: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CentersFile {
    List(Vec<Center>),
    Page(PageGlobals),
}

fn resolve_config(cli: &Cli) -> Result<AppConfig, String> {
    let mut config = match cli.config.as_deref() {
        Some(path) => AppConfig::load(path).map_err(|err| err.to_string())?,
        None => AppConfig::default(),
    };
    if let Some(base_url) = cli.base_url.as_deref() {
        config.base_url = base_url.trim().to_string();
    }
    if let Some(provider) = cli.provider {
        config.map.provider = provider;
    }
    if let Some(log_level) = cli.log_level.as_deref() {
        config.log_level = log_level.trim().to_string();
    }
    config.validate().map_err(|err| err.to_string())?;
    Ok(config)
}

pub(crate) async fn execute(invocation: Invocation) -> i32 {
    let Invocation { config, command } = invocation;
    match command {
        Command::Distance(args) => run_distance(args),
        Command::Render(args) => run_render(&config, args).await,
        Command::Nearest(args) => run_nearest(args),
        Command::Badge(args) => run_badge(&config, args).await,
        Command::Search(args) => run_search(&config, args).await,
    }
}

fn run_distance(args: DistanceArgs) -> i32 {
    let km = args.from.distance_km_to(args.to);
    println!("{} ({km:.3} km)", format_distance(km));
    0
}

fn read_centers(path: &Path) -> Result<PageGlobals, String> {
    let raw = std::fs::read_to_string(path)
        .map_err(|err| format!("failed to read {}: {err}", path.display()))?;
    let file: CentersFile = serde_json::from_str(&raw)
        .map_err(|err| format!("failed to parse {}: {err}", path.display()))?;
    Ok(match file {
        CentersFile::List(centers) => PageGlobals {
            centers,
            selected_material: None,
        },
        CentersFile::Page(globals) => globals,
    })
}

async fn run_render(config: &AppConfig, args: RenderArgs) -> i32 {
    let mut globals = match read_centers(&args.centers) {
        Ok(globals) => globals,
        Err(err) => {
            eprintln!("error: {err}");
            return 1;
        }
    };
    if args.material.is_some() {
        globals.selected_material = args.material;
    }
    let scene = match args.user {
        Some(user) => render_scene(config, FixedGeolocator::new(user), globals, true).await,
        None => render_scene(config, UnavailableGeolocator, globals, false).await,
    };
    let scene = match scene {
        Ok(scene) => scene,
        Err(err) => {
            eprintln!("error: {err}");
            return 1;
        }
    };
    match serde_json::to_string_pretty(&scene) {
        Ok(json) => {
            println!("{json}");
            0
        }
        Err(err) => {
            eprintln!("error: failed to serialize scene: {err}");
            1
        }
    }
}

async fn render_scene<G: Geolocator>(
    config: &AppConfig,
    geolocator: G,
    globals: PageGlobals,
    locate: bool,
) -> Result<MapScene, String> {
    let dom = MemoryDom::new().with(Element::with_id(&config.map.container_id));
    let mut controller = MapController::new(
        SceneBackend::new(config.map.provider),
        geolocator,
        dom,
        TokioTimeProvider,
        config.map.clone(),
        config.geolocation.position_options(),
    );
    controller.ensure_map();
    controller
        .render_centers(globals.centers)
        .map_err(|err| format!("failed to render centers: {err}"))?;
    if let Some(material) = globals.selected_material.as_deref() {
        controller.filter_by_material(material);
    }
    if locate {
        controller
            .locate_user()
            .await
            .map_err(|err| err.to_string())?;
    }
    controller
        .map()
        .map(|map| map.scene().clone())
        .ok_or_else(|| "map was not created".to_string())
}

fn run_nearest(args: NearestArgs) -> i32 {
    let globals = match read_centers(&args.centers) {
        Ok(globals) => globals,
        Err(err) => {
            eprintln!("error: {err}");
            return 1;
        }
    };
    for (center, km) in nearest_first(&globals.centers, args.from)
        .into_iter()
        .take(args.limit)
    {
        println!("{}\t{}\t{}", format_distance(km), center.name, center.address);
    }
    0
}

fn backend(config: &AppConfig) -> Option<HttpBackend> {
    match HttpBackend::new(&config.base_url, None) {
        Ok(api) => Some(api),
        Err(err) => {
            eprintln!("error: {err}");
            None
        }
    }
}

async fn run_badge(config: &AppConfig, args: BadgeArgs) -> i32 {
    let Some(api) = backend(config) else {
        return 2;
    };
    if !args.watch {
        return match api.unread_count().await {
            Ok(count) => {
                println!("{}", badge_text(count));
                0
            }
            Err(err) => {
                eprintln!("error: {err}");
                1
            }
        };
    }

    let dom = MemoryDom::new().with(Element::with_id("badge").class("notification-badge"));
    let time = TokioTimeProvider;
    let toasts = ToastQueue::new(dom.clone(), time, config.toast.clone());
    let poller = NotificationPoller::new(api, dom.clone(), time, toasts, config.notifications.clone());
    loop {
        if poller.refresh_badge().await.is_some() {
            let visible = dom
                .find(&Target::NotificationBadge)
                .first()
                .is_some_and(|badge| badge.visible);
            let label = dom
                .element("badge")
                .map(|badge| badge.text)
                .unwrap_or_default();
            if visible {
                println!("{label}");
            } else {
                println!("0");
            }
        }
        time.sleep(config.notifications.poll_interval()).await;
    }
}

async fn run_search(config: &AppConfig, args: SearchArgs) -> i32 {
    let Some(api) = backend(config) else {
        return 2;
    };
    match api.search(&args.endpoint, args.query.trim()).await {
        Ok(results) if results.is_empty() => {
            println!("No results found.");
            0
        }
        Ok(results) => {
            for result in results {
                let distance = result.distance.map(format_distance).unwrap_or_default();
                println!("{}\t{}\t{}", result.title, distance, result.url);
            }
            0
        }
        Err(err) => {
            eprintln!("error: {err}");
            1
        }
    }
}
