use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use stop_server::config::AppConfig;
use stop_server::domain::FuelBrand;
use stop_server::fuel::{FuelMaster, HttpStationDirectory, JsonFileStore, StationDirectory};
use stop_server::link::{HttpLinkExpander, LinkResolver};
use stop_server::planner::{FuelCollector, Planner, RestCascade};
use stop_server::providers::{
    LocalSeedProvider, OverpassClient, OverpassConfig, PlacesClient, PlacesConfig,
    PlacesFuelLookup, PlacesRestProvider, RestProvider,
};
use stop_server::routing::{
    CachedRouteProvider, DirectionsClient, DirectionsConfig, RouteCacheConfig,
};
use stop_server::web::{AppState, create_router};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("stop_server=info,tower_http=info")),
        )
        .init();

    let config = AppConfig::from_env()?;
    if config.maps_api_key.is_none() {
        warn!("GOOGLE_MAPS_API_KEY not set. Route lookups will fail.");
    }
    if config.places_api_key.is_none() {
        warn!("no Places API key set. Places lookups will return nothing.");
    }

    let http = reqwest::Client::new();

    // Routing, cached across requests
    let directions = DirectionsClient::new(
        http.clone(),
        DirectionsConfig::new(config.maps_api_key.clone())
            .with_timeout_ms(config.routing_timeout_ms),
    );
    let cache_config = RouteCacheConfig {
        ttl: Duration::from_secs(config.route_cache_ttl_secs),
        ..RouteCacheConfig::default()
    };
    let routes = Arc::new(CachedRouteProvider::new(directions, &cache_config));

    let links = LinkResolver::new(Arc::new(HttpLinkExpander::new(
        config.link_expand_timeout_ms,
    )?));

    // Rest providers, in cascade order
    let places = PlacesClient::new(
        http.clone(),
        PlacesConfig::new(config.places_api_key.clone())
            .with_timeouts(
                config.places_nearby_timeout_ms,
                config.places_details_timeout_ms,
            )
            .with_total_budget_ms(config.places_total_budget_ms),
    );
    let overpass = OverpassClient::new(
        http.clone(),
        OverpassConfig::new(config.overpass_urls.clone())
            .with_buffer_km(config.route_buffer_km)
            .with_timeout_ms(config.overpass_timeout_ms),
    );
    let providers: Vec<Arc<dyn RestProvider>> = vec![
        Arc::new(overpass),
        Arc::new(PlacesRestProvider::new(places.clone())),
        Arc::new(LocalSeedProvider::new(config.rest_seed_path.clone())),
    ];

    // Fuel master catalog
    let store = Arc::new(JsonFileStore::open(config.fuel_store_path.clone()).await?);
    let directories: Vec<Arc<dyn StationDirectory>> = [
        (FuelBrand::Ew, config.ew_source_url.clone()),
        (FuelBrand::Usami, config.usami_source_url.clone()),
    ]
    .into_iter()
    .filter_map(|(brand, url)| {
        url.map(|url| {
            Arc::new(HttpStationDirectory::new(http.clone(), url, brand))
                as Arc<dyn StationDirectory>
        })
    })
    .collect();
    let master = Arc::new(FuelMaster::new(
        store,
        config.fuel_seed_paths.clone(),
        directories,
    ));

    let fuel = FuelCollector::new(
        master.clone(),
        Arc::new(PlacesFuelLookup::new(places, config.fuel_budget_ms)),
        config.fuel_budget_ms,
    );

    let cascade = RestCascade::new(providers);
    info!(providers = ?cascade.provider_names(), "rest provider cascade");

    let planner = Planner::new(routes, links, cascade, fuel, master.clone());

    // Fill the catalog before the first request needs it
    let report = master.ensure_ready().await;
    for warning in &report.warnings {
        warn!("{warning}");
    }

    let app = create_router(AppState::new(planner));

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!(addr = %config.bind_addr, "stop planner listening");
    info!("  GET  /health    - Health check");
    info!("  POST /api/plan  - Plan rest and fuel stops");

    axum::serve(listener, app).await?;
    Ok(())
}
