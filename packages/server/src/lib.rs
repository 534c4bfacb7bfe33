#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web server for the barangay hotspot map.
//!
//! Loads the location table and the exported model once at startup,
//! then serves a month selector. Each submission labels the month
//! (thresholds for historical months, the model for December), renders a
//! Leaflet page under `static/maps/`, and shows it in the selector page.
//! Rendered pages are served from the static directory.

pub mod config;
mod error;
mod handlers;
mod page;
pub mod render;

use std::path::PathBuf;
use std::sync::Arc;

use actix_files::Files;
use actix_web::{App, HttpServer, middleware, web};
use hotspot_map_analysis::{HotspotAnalyzer, registry};
use hotspot_map_dataset::Dataset;
use hotspot_map_render::MapView;

pub use config::ServerConfig;
pub use error::ServerError;
pub use render::{RenderedMonth, render_month};

/// Shared application state.
///
/// Everything here is read-only after startup; the only interior
/// mutability is the analyzer's per-month label cache.
#[derive(Debug)]
pub struct AppState {
    /// Labels locations per month.
    pub analyzer: Arc<HotspotAnalyzer>,
    /// Directory rendered maps are written to and served from.
    pub static_dir: PathBuf,
    /// Initial map viewport.
    pub view: MapView,
    /// Default map path relative to `static_dir`.
    pub default_map: String,
}

impl AppState {
    /// Creates the state and writes the default map if it is missing.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Render`] if the default map cannot be written.
    pub fn new(
        analyzer: Arc<HotspotAnalyzer>,
        static_dir: PathBuf,
        view: MapView,
    ) -> Result<Self, ServerError> {
        let default_map = hotspot_map_render::write_default_map(&static_dir, &view)?;
        Ok(Self {
            analyzer,
            static_dir,
            view,
            default_map: default_map.relative_path,
        })
    }
}

/// Loads the table, model, and classification config.
///
/// # Errors
///
/// Returns a startup [`ServerError`] if any input is missing or invalid.
pub fn load_state(config: &ServerConfig) -> Result<AppState, ServerError> {
    log::info!("Loading location table from {}...", config.data_path.display());
    let dataset = Dataset::load(&config.data_path)?;

    log::info!("Loading model from {}...", config.model_path.display());
    let predictor = hotspot_map_predictor::load_model(&config.model_path)?;

    let analysis_config = hotspot_map_analysis::config::load_config(config.config_path.as_deref())
        .map_err(ServerError::Config)?;

    let analyzer = HotspotAnalyzer::new(
        Arc::new(dataset),
        Arc::from(predictor),
        analysis_config,
        registry::all_months(),
    )
    .map_err(ServerError::Config)?;

    AppState::new(
        Arc::new(analyzer),
        config.static_dir.clone(),
        MapView::default(),
    )
}

/// Registers all routes. The caller must add `web::Data<AppState>`.
pub fn configure(cfg: &mut web::ServiceConfig, static_dir: &std::path::Path) {
    cfg.route("/", web::get().to(handlers::index))
        .route("/", web::post().to(handlers::submit))
        .service(
            web::scope("/api")
                .route("/health", web::get().to(handlers::health))
                .route("/months", web::get().to(handlers::months))
                .route("/hotspots", web::get().to(handlers::hotspots)),
        )
        .service(Files::new("/static", static_dir));
}

/// Starts the hotspot map server.
///
/// Loads all inputs before binding; any load failure aborts startup. This
/// is a regular async function; the caller provides the runtime (e.g. via
/// `#[actix_web::main]`).
///
/// # Errors
///
/// Returns a startup [`ServerError`] if inputs fail to load, or
/// [`ServerError::Io`] if the server fails to bind or run.
#[allow(clippy::future_not_send)]
pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let state = web::Data::new(load_state(&config)?);
    let static_dir = config.static_dir.clone();

    log::info!("Starting server on {}:{}", config.bind_addr, config.port);

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(|cfg| configure(cfg, &static_dir))
    })
    .bind((config.bind_addr.as_str(), config.port))?
    .run()
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use hotspot_map_analysis_models::{AnalysisConfig, ForecastOutput};
    use hotspot_map_predictor::{FeatureMatrix, PredictError, Predictor};
    use hotspot_map_server_models::{ApiHotspots, ApiMonth};
    use hotspot_map_severity_models::MarkerColor;
    use std::path::Path;

    #[derive(Debug)]
    struct Constant {
        features: Vec<String>,
        value: f64,
    }

    impl Predictor for Constant {
        fn features(&self) -> &[String] {
            &self.features
        }

        fn predict(&self, matrix: &FeatureMatrix) -> Result<Vec<f64>, PredictError> {
            Ok(vec![self.value; matrix.rows()])
        }
    }

    fn temp_static_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "hotspot_map_server_{name}_{}",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    fn state(csv: &str, config: AnalysisConfig, value: f64, static_dir: &Path) -> AppState {
        let dataset = Dataset::from_reader(csv.as_bytes()).unwrap();
        let predictor = Arc::new(Constant {
            features: hotspot_map_predictor::DEFAULT_FEATURES
                .iter()
                .map(ToString::to_string)
                .collect(),
            value,
        });
        let analyzer =
            HotspotAnalyzer::new(Arc::new(dataset), predictor, config, registry::all_months())
                .unwrap();
        AppState::new(
            Arc::new(analyzer),
            static_dir.to_path_buf(),
            MapView::default(),
        )
        .unwrap()
    }

    const ONE_ROW: &str = "barangay,latitude,longitude,population,land_area_km2,jun_density\n\
                           A,8.48,124.64,1000,1.0,2500\n";

    const FULL: &str = "barangay,latitude,longitude,population,land_area_km2,\
                        jun_density,jul_density,aug_density,sep_density,oct_density\n\
                        A,8.48,124.64,1000,1.0,2500,4500,3000,3100,3200\n\
                        B,8.49,124.65,2000,2.0,3500,1000,3300,3400,3500\n";

    fn map_src(body: &str) -> String {
        let start = body.find("src=\"/static/").unwrap() + "src=\"/static/".len();
        let end = start + body[start..].find('"').unwrap();
        body[start..end].to_string()
    }

    #[actix_web::test]
    async fn get_shows_default_map() {
        let dir = temp_static_dir("get");
        let state = web::Data::new(state(ONE_ROW, AnalysisConfig::default(), 0.0, &dir));
        let app = actix_test::init_service(
            App::new()
                .app_data(state.clone())
                .configure(|cfg| configure(cfg, &dir)),
        )
        .await;

        let resp =
            actix_test::call_service(&app, actix_test::TestRequest::get().uri("/").to_request())
                .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = String::from_utf8(actix_test::read_body(resp).await.to_vec()).unwrap();
        assert_eq!(map_src(&body), "default_map.html");
        assert!(body.contains("Selected month: <strong>None</strong>"));
        assert!(dir.join("default_map.html").exists());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[actix_web::test]
    async fn post_june_renders_single_green_marker() {
        let dir = temp_static_dir("june");
        let state = web::Data::new(state(ONE_ROW, AnalysisConfig::default(), 0.0, &dir));
        let app = actix_test::init_service(
            App::new()
                .app_data(state.clone())
                .configure(|cfg| configure(cfg, &dir)),
        )
        .await;

        let req = actix_test::TestRequest::post()
            .uri("/")
            .set_form([("month", "June")])
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = String::from_utf8(actix_test::read_body(resp).await.to_vec()).unwrap();
        assert!(body.contains("Selected month: <strong>June</strong>"));

        let src = map_src(&body);
        assert!(src.starts_with("maps/june-"), "{src}");
        let map = std::fs::read_to_string(dir.join(&src)).unwrap();
        assert_eq!(map.matches(r#""type":"Feature""#).count(), 1);
        assert!(map.contains(r#""color":"green""#));
        assert!(map.contains("A - Low (2,500.0 kg/km²)"));

        let rendered = render_month(&state.analyzer, &dir, &state.view, "June").unwrap();
        assert_eq!(rendered.markers.len(), 1);
        assert_eq!(rendered.markers[0].color, MarkerColor::Green);
        assert_eq!(rendered.markers[0].popup, "A - Low (2,500.0 kg/km²)");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[actix_web::test]
    async fn post_june_with_text_column_and_nan_cell_shows_no_data_marker() {
        let dir = temp_static_dir("june_nan");
        let csv = "barangay,district,latitude,longitude,population,land_area_km2,jun_density\n\
                   A,Poblacion,8.48,124.64,1000,1.0,2500\n\
                   B,Uptown,8.49,124.65,2000,2.0,NaN\n";
        let state = web::Data::new(state(csv, AnalysisConfig::default(), 0.0, &dir));
        let app = actix_test::init_service(
            App::new()
                .app_data(state.clone())
                .configure(|cfg| configure(cfg, &dir)),
        )
        .await;

        let req = actix_test::TestRequest::post()
            .uri("/")
            .set_form([("month", "June")])
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = String::from_utf8(actix_test::read_body(resp).await.to_vec()).unwrap();

        let map = std::fs::read_to_string(dir.join(map_src(&body))).unwrap();
        assert!(map.contains(r#""color":"green""#));
        assert!(map.contains(r#""color":"gray""#));
        assert!(map.contains("B - Unknown (no data)"));
        assert!(!map.contains("NaN"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[actix_web::test]
    async fn post_december_with_flag_model_marks_every_hotspot() {
        let dir = temp_static_dir("december");
        let mut config = AnalysisConfig::default();
        config.forecast.output = ForecastOutput::HotspotFlag;
        let state = web::Data::new(state(FULL, config, 1.0, &dir));
        let app = actix_test::init_service(
            App::new()
                .app_data(state.clone())
                .configure(|cfg| configure(cfg, &dir)),
        )
        .await;

        let req = actix_test::TestRequest::post()
            .uri("/")
            .set_form([("month", "December")])
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = String::from_utf8(actix_test::read_body(resp).await.to_vec()).unwrap();

        let map = std::fs::read_to_string(dir.join(map_src(&body))).unwrap();
        assert_eq!(map.matches(r#""color":"red""#).count(), 2);
        assert_eq!(map.matches("HOTSPOT").count(), 2);
        assert!(!map.contains(r#""color":"green""#));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn repeated_month_reuses_labels_and_artifact() {
        let dir = temp_static_dir("repeat");
        let state = web::Data::new(state(FULL, AnalysisConfig::default(), 0.0, &dir));

        let first = render_month(&state.analyzer, &dir, &state.view, "July").unwrap();
        let second = render_month(&state.analyzer, &dir, &state.view, "July").unwrap();
        assert_eq!(state.analyzer.threshold_runs(), 1);
        assert_eq!(first.markers, second.markers);
        assert_eq!(first.artifact, second.artifact);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn concurrent_months_get_their_own_artifacts() {
        let dir = temp_static_dir("concurrent");
        let state = Arc::new(state(FULL, AnalysisConfig::default(), 0.0, &dir));

        let handles: Vec<_> = ["June", "July", "June", "July"]
            .into_iter()
            .map(|month| {
                let state = Arc::clone(&state);
                std::thread::spawn(move || {
                    render_month(&state.analyzer, &state.static_dir, &state.view, month).unwrap()
                })
            })
            .collect();
        let rendered: Vec<RenderedMonth> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_ne!(rendered[0].artifact.path, rendered[1].artifact.path);
        assert_eq!(rendered[0].artifact.path, rendered[2].artifact.path);
        assert_eq!(rendered[1].artifact.path, rendered[3].artifact.path);

        let june = std::fs::read_to_string(&rendered[0].artifact.path).unwrap();
        assert!(june.contains("A - Low (2,500.0 kg/km²)"));
        assert!(june.contains("B - Moderate (3,500.0 kg/km²)"));
        let july = std::fs::read_to_string(&rendered[1].artifact.path).unwrap();
        assert!(july.contains("A - Severe (4,500.0 kg/km²)"));
        assert!(july.contains("B - Low (1,000.0 kg/km²)"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[actix_web::test]
    async fn unknown_month_is_a_bad_request() {
        let dir = temp_static_dir("unknown");
        let state = web::Data::new(state(ONE_ROW, AnalysisConfig::default(), 0.0, &dir));
        let app = actix_test::init_service(
            App::new()
                .app_data(state.clone())
                .configure(|cfg| configure(cfg, &dir)),
        )
        .await;

        let req = actix_test::TestRequest::post()
            .uri("/")
            .set_form([("month", "Smarch")])
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = String::from_utf8(actix_test::read_body(resp).await.to_vec()).unwrap();
        assert!(body.contains("Unknown month &#39;Smarch&#39;"));
        assert_eq!(map_src(&body), "default_map.html");

        let req = actix_test::TestRequest::get()
            .uri("/api/hotspots?month=Smarch")
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[actix_web::test]
    async fn missing_month_column_is_a_server_error_without_map() {
        let dir = temp_static_dir("missing");
        let state = web::Data::new(state(ONE_ROW, AnalysisConfig::default(), 0.0, &dir));
        let app = actix_test::init_service(
            App::new()
                .app_data(state.clone())
                .configure(|cfg| configure(cfg, &dir)),
        )
        .await;

        let req = actix_test::TestRequest::post()
            .uri("/")
            .set_form([("month", "August")])
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!dir.join("maps").exists());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[actix_web::test]
    async fn api_lists_months_and_hotspots() {
        let dir = temp_static_dir("api");
        let state = web::Data::new(state(FULL, AnalysisConfig::default(), 0.0, &dir));
        let app = actix_test::init_service(
            App::new()
                .app_data(state.clone())
                .configure(|cfg| configure(cfg, &dir)),
        )
        .await;

        let months: Vec<ApiMonth> = actix_test::call_and_read_body_json(
            &app,
            actix_test::TestRequest::get().uri("/api/months").to_request(),
        )
        .await;
        assert_eq!(months.len(), 7);
        assert!(months.iter().filter(|m| m.predicted).all(|m| m.name == "December"));

        let hotspots: ApiHotspots = actix_test::call_and_read_body_json(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/hotspots?month=June")
                .to_request(),
        )
        .await;
        assert_eq!(hotspots.month, "June");
        assert_eq!(hotspots.locations.len(), 2);
        assert_eq!(hotspots.locations[0].label.as_deref(), Some("Low"));
        assert_eq!(hotspots.locations[1].color, MarkerColor::Orange);

        let resp =
            actix_test::call_service(&app, actix_test::TestRequest::get().uri("/api/health").to_request())
                .await;
        assert_eq!(resp.status(), StatusCode::OK);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
