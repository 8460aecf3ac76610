use std::path::{Path, PathBuf};

use beacon_console::{
    analytics::{self, CohortSummary, PerformanceSummary},
    api::{self, ApiClient, NetworkAnalysisSource},
    config::Config,
    fetch::{Cascade, Dependent, FetchError, LoadState},
    list::{
        ListController, ListView, Listable, PageControl,
        filter::{
            DeviceDimension, DeviceSortBy, OrganizationDimension, OrganizationSortBy,
            SiteDimension, SiteSortBy, parse_device_status, parse_group_status,
        },
    },
    state::{ActiveGroup, AppContext},
};
use beacon_core::{
    AirQloudPerformance, Device, DeviceId, DeviceStatus, DistrictSummary, GroupStatus,
    Organization, PerformanceSeries, Site, SiteId,
};
use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{bail, eyre};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "beacon-console")]
#[command(about = "Read-only console for the air-quality device monitoring backend")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "beacon.toml")]
    config: PathBuf,

    /// Network to scope collection requests to
    #[arg(short, long)]
    network: Option<String>,

    /// Organization title or id to scope collection requests to
    #[arg(short, long)]
    group: Option<String>,

    /// Site id to select; repeat to select several. Site lists show only
    /// the selection
    #[arg(long = "site")]
    sites: Vec<String>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List organizations
    Orgs {
        #[command(flatten)]
        list: ListArgs,
        /// Column to sort by; repeat to toggle the order like a header click
        #[arg(long)]
        sort: Vec<OrganizationSortBy>,
        #[arg(long, value_parser = parse_group_status)]
        status: Option<GroupStatus>,
        #[arg(long)]
        industry: Option<String>,
    },
    /// List monitoring sites
    Sites {
        #[command(flatten)]
        list: ListArgs,
        #[arg(long)]
        sort: Vec<SiteSortBy>,
        /// Only online (`true`) or offline (`false`) sites
        #[arg(long)]
        online: Option<bool>,
    },
    /// List devices
    Devices {
        #[command(flatten)]
        list: ListArgs,
        #[arg(long)]
        sort: Vec<DeviceSortBy>,
        #[arg(long, value_parser = parse_device_status)]
        status: Option<DeviceStatus>,
        #[arg(long)]
        category: Option<String>,
    },
    /// Daily uptime and error margin of one device
    Performance {
        device: String,
        #[arg(short, long, default_value_t = 7)]
        days: u32,
        /// Read the raw series from a JSON file instead of the backend
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Per-device performance of an AirQloud
    Airqloud {
        id: String,
        #[arg(short, long, default_value_t = 7)]
        days: u32,
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Walk the region, country and district selection and summarize the district
    Districts {
        #[arg(long)]
        region: Option<String>,
        #[arg(long)]
        country: Option<String>,
        #[arg(long)]
        district: Option<String>,
    },
}

#[derive(Args)]
struct ListArgs {
    /// Case-insensitive substring search
    #[arg(short, long)]
    search: Option<String>,
    /// 1-based page to show
    #[arg(short, long, default_value_t = 1)]
    page: usize,
    #[arg(long)]
    per_page: Option<usize>,
    /// Read the collection from a JSON file instead of the backend
    #[arg(long)]
    file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "beacon_console=info".to_owned());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = if cli.config.exists() {
        info!(path = ?cli.config, "Loading configuration");
        Config::load(&cli.config)?
    } else {
        info!("No configuration file found, using defaults");
        Config::default()
    };

    let context = AppContext::new();
    let network = cli.network.clone().or_else(|| config.api.network.clone());
    context.set_active_network(network).await;

    let client = ApiClient::new(&config.api, context)?;
    let cancel = CancellationToken::new();

    tokio::select! {
        result = run(cli, &config, &client, &cancel) => result,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, cancelling outstanding requests");
            cancel.cancel();
            Ok(())
        }
    }
}

async fn run(
    cli: Cli,
    config: &Config,
    client: &ApiClient,
    cancel: &CancellationToken,
) -> color_eyre::Result<()> {
    if let Some(group) = &cli.group {
        scope_to_group(client, group, cancel).await?;
    }
    for site in &cli.sites {
        client.context().select_site(SiteId(site.as_str().into())).await;
    }
    let selected = client.context().selected_sites().await;
    if !selected.is_empty() {
        info!(sites = selected.len(), "Site selection active");
    }

    match cli.command {
        Command::Orgs {
            list,
            sort,
            status,
            industry,
        } => {
            let mut controller = controller(config, &list);
            let items = match &list.file {
                Some(path) => read_collection(path, "groups"),
                None => client.organizations(cancel.child_token()).await,
            };
            load(&mut controller, items);
            controller.set_filter(OrganizationDimension::Status(status));
            controller.set_filter(OrganizationDimension::Industry(industry));
            prepare(&mut controller, &list, sort);
            render_list(&controller, cli.json, |org: &Organization| {
                format!(
                    "{:<32} {:<10} {:<20} {:>6}  {}",
                    org.grp_title,
                    org.grp_status.map_or("-", |status| status.as_str()),
                    org.grp_industry.as_deref().unwrap_or("-"),
                    org.number_of_group_users.unwrap_or(0),
                    org.created_at.as_deref().unwrap_or("-"),
                )
            })
        }
        Command::Sites { list, sort, online } => {
            let mut controller = controller(config, &list);
            let items = match &list.file {
                Some(path) => read_collection(path, "sites"),
                None => client.sites(cancel.child_token()).await,
            };
            let items = match items {
                Ok(sites) => Ok(client.context().narrow_to_selection(sites).await),
                Err(err) => Err(err),
            };
            load(&mut controller, items);
            controller.set_filter(SiteDimension::Online(online));
            prepare(&mut controller, &list, sort);
            render_list(&controller, cli.json, |site: &Site| {
                format!(
                    "{:<32} {:<8} {}",
                    site.name.as_deref().unwrap_or("-"),
                    if site.is_online { "online" } else { "offline" },
                    site.location_name.as_deref().unwrap_or("-"),
                )
            })
        }
        Command::Devices {
            list,
            sort,
            status,
            category,
        } => {
            let mut controller = controller(config, &list);
            let items = match &list.file {
                Some(path) => read_collection(path, "devices"),
                None => client.devices(cancel.child_token()).await,
            };
            load(&mut controller, items);
            controller.set_filter(DeviceDimension::Status(status));
            controller.set_filter(DeviceDimension::Category(category));
            prepare(&mut controller, &list, sort);
            render_list(&controller, cli.json, |device: &Device| {
                format!(
                    "{:<24} {:<14} {:<10} {}",
                    device.name.as_deref().unwrap_or(&device.id.0),
                    device.status.map_or("-", |status| status.as_str()),
                    device.category.as_deref().unwrap_or("-"),
                    device.created_at.as_deref().unwrap_or("-"),
                )
            })
        }
        Command::Performance { device, days, file } => {
            let series: PerformanceSeries = match &file {
                Some(path) => read_json(path)?,
                None => {
                    client
                        .device_performance(&DeviceId(device.as_str().into()), days, cancel.child_token())
                        .await?
                }
            };
            let summary = analytics::aggregate(&series, &config.analytics.options()?);
            if cli.json {
                print_json(&summary)
            } else {
                print_summary(&device, &summary);
                Ok(())
            }
        }
        Command::Airqloud { id, days, file } => {
            let cohort: AirQloudPerformance = match &file {
                Some(path) => read_json(path)?,
                None => client.airqloud(&id, days, cancel.child_token()).await?,
            };
            let summary = analytics::aggregate_cohort(&cohort, &config.analytics.options()?);
            if cli.json {
                print_json(&summary)
            } else {
                print_cohort(&summary);
                Ok(())
            }
        }
        Command::Districts {
            region,
            country,
            district,
        } => districts(config, client, cancel, [region, country, district], cli.json).await,
    }
}

async fn scope_to_group(
    client: &ApiClient,
    wanted: &str,
    cancel: &CancellationToken,
) -> color_eyre::Result<()> {
    let organizations = client.organizations(cancel.child_token()).await?;
    let Some(org) = organizations.into_iter().find(|org| {
        org.grp_title.eq_ignore_ascii_case(wanted) || &*org.id.0 == wanted
    }) else {
        bail!("no organization named `{wanted}`");
    };

    info!(group = %org.grp_title, "Scoping requests to organization");
    client
        .context()
        .set_active_group(Some(ActiveGroup {
            id: org.id,
            title: org.grp_title.into(),
        }))
        .await;
    Ok(())
}

fn controller<T: Listable>(config: &Config, list: &ListArgs) -> ListController<T> {
    let mut controller = ListController::new(list.per_page.unwrap_or(config.list.items_per_page));
    controller.begin_loading();
    controller
}

fn load<T: Listable>(controller: &mut ListController<T>, items: Result<Vec<T>, FetchError>) {
    match items {
        Ok(items) => {
            info!(count = items.len(), "Loaded collection");
            controller.set_items(items);
        }
        Err(err) => controller.set_failed(err.to_string()),
    }
}

/// Applies search, sort clicks and the requested page, in the order a user
/// would.
fn prepare<T: Listable>(controller: &mut ListController<T>, list: &ListArgs, sort: Vec<T::SortBy>) {
    if let Some(query) = &list.search {
        controller.set_search_query(query.as_str());
    }
    for by in sort {
        controller.set_sort(by);
    }
    controller.set_page(list.page);
}

fn render_list<T, F>(controller: &ListController<T>, json: bool, row: F) -> color_eyre::Result<()>
where
    T: Listable + Serialize,
    F: Fn(&T) -> String,
{
    match controller.view() {
        ListView::Loading => println!("Loading..."),
        ListView::Failed(message) => return Err(eyre!("failed to load collection: {message}")),
        ListView::Empty { query } if json => {
            print_json(&serde_json::json!({ "items": [], "query": query, "total_items": 0 }))?;
        }
        ListView::Empty { query: Some(query) } => println!("No results match \"{query}\""),
        ListView::Empty { query: None } => println!("No results"),
        ListView::Page(page) if json => {
            print_json(&serde_json::json!({
                "items": page.items,
                "current_page": page.current_page,
                "total_pages": page.total_pages,
                "total_items": page.total_items,
            }))?;
        }
        ListView::Page(page) => {
            for item in &page.items {
                println!("{}", row(item));
            }
            println!();
            println!(
                "Showing {}-{} of {}",
                page.first_index, page.last_index, page.total_items
            );
            let controls: Vec<String> = page
                .window()
                .into_iter()
                .map(|control| match control {
                    PageControl::Page(n) if n == page.current_page => format!("[{n}]"),
                    PageControl::Page(n) => n.to_string(),
                    PageControl::Ellipsis => "...".to_string(),
                })
                .collect();
            println!("Pages: {}", controls.join(" "));
        }
    }
    Ok(())
}

async fn districts(
    config: &Config,
    client: &ApiClient,
    cancel: &CancellationToken,
    overrides: [Option<String>; 3],
    json: bool,
) -> color_eyre::Result<()> {
    let source = NetworkAnalysisSource::new(client.clone());
    let cascade = Cascade::new(source.clone(), cancel)
        .with_timeout(config.api.timeout())
        .auto_select_first(config.cascade.auto_select_first);
    let summaries: Dependent<(String, String), DistrictSummary, _> =
        Dependent::new(source, cancel).with_timeout(config.api.timeout());

    cascade.load_root().await;
    for (level, value) in overrides.into_iter().enumerate() {
        if let Some(value) = value {
            cascade.select(level, value).await?;
        }
    }

    let snapshot = cascade.snapshot().await;
    for level in &snapshot {
        if let LoadState::Failed(message) = &level.options {
            bail!("failed to load {} options: {message}", level.name);
        }
    }

    let key = match cascade.selection_path().await.as_slice() {
        [_, country, district] => Some((country.clone(), district.clone())),
        _ => None,
    };
    summaries.fetch_dependent(key).await;
    let summary = summaries.state().await;

    if json {
        let levels: Vec<_> = snapshot
            .iter()
            .map(|level| {
                serde_json::json!({
                    "level": level.name,
                    "selected": level.selected,
                    "options": level
                        .options
                        .loaded()
                        .map(|options| options.iter().map(|option| option.value.as_str()).collect::<Vec<_>>()),
                })
            })
            .collect();
        return print_json(&serde_json::json!({
            "levels": levels,
            "summary": summary.loaded(),
        }));
    }

    for level in &snapshot {
        let count = level.options.loaded().map_or(0, Vec::len);
        println!(
            "{:<10} {:<24} ({count} options)",
            level.name,
            level.selected.as_deref().unwrap_or("-"),
        );
    }

    match summary {
        LoadState::Loaded(summary) => print_district(&summary),
        LoadState::Failed(message) => bail!("failed to load district summary: {message}"),
        LoadState::Idle | LoadState::Loading => println!("\nSelect a district to see its summary"),
    }
    Ok(())
}

fn print_summary(device: &str, summary: &PerformanceSummary) {
    println!("Device {device}");
    println!("{:<12} {:>8} {:>12}", "date", "uptime", "error margin");
    for (uptime, margin) in summary
        .uptime_history
        .iter()
        .zip(&summary.error_margin_history)
    {
        println!(
            "{:<12} {:>7.1}% {:>12.2}",
            uptime.date.to_string(),
            uptime.value,
            margin.value
        );
    }
    println!();
    println!(
        "Overall uptime {:.1}% ({}), average error margin {:.2}, average frequency {:.2}",
        summary.overall_uptime,
        summary.status(),
        summary.overall_average_error_margin,
        summary.average_frequency,
    );
    println!(
        "{} samples, {} with unreadable timestamps",
        summary.total_data_points, summary.discarded_timestamps
    );
}

fn print_cohort(cohort: &CohortSummary) {
    println!("AirQloud {}", cohort.name.as_deref().unwrap_or(&cohort.id));
    for device in &cohort.devices {
        println!(
            "{:<24} {:>7.1}% {:<5} {:>8.2}",
            device.name,
            device.summary.overall_uptime,
            device.status.label(),
            device.summary.overall_average_error_margin,
        );
    }
    println!();
    println!(
        "Average uptime {:.1}% ({}), average error margin {:.2}",
        cohort.average_uptime,
        cohort.status(),
        cohort.average_error_margin,
    );
}

fn print_district(summary: &DistrictSummary) {
    let reading = |value: Option<f64>| value.map_or_else(|| "-".to_string(), |v| format!("{v:.1}"));
    println!();
    println!("PM2.5 {}  PM10 {}", reading(summary.pm25), reading(summary.pm10));
    println!("{} devices", summary.devices_list.len());
    for device in &summary.devices_list {
        println!(
            "  {}",
            device
                .name
                .as_deref()
                .or(device.id.as_deref())
                .unwrap_or("-")
        );
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> color_eyre::Result<T> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn read_collection<T: DeserializeOwned>(path: &Path, key: &str) -> Result<Vec<T>, FetchError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| FetchError::Source(format!("failed to read {}: {e}", path.display())))?;
    api::decode_collection(serde_json::from_str(&content)?, key)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> color_eyre::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
