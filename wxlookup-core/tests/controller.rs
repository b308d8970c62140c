//! Controller driving a real provider adapter against a mock server.

use std::sync::Arc;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use wxlookup_core::{
    SearchController, SearchState, WeatherView, provider::openmeteo::OpenMeteoProvider,
    search_log::DisabledSearchLog,
};

#[derive(Default)]
struct LastFrame(Option<SearchState>);

impl WeatherView for LastFrame {
    fn render(&mut self, state: &SearchState) {
        self.0 = Some(state.clone());
    }
}

fn controller(server: &MockServer) -> SearchController<LastFrame> {
    let provider = OpenMeteoProvider::new().with_base_urls(server.uri(), server.uri());
    SearchController::new(Arc::new(provider), Arc::new(DisabledSearchLog), LastFrame::default())
}

async fn mount_geocode(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn conditions_500_ends_in_failed_with_message() {
    let server = MockServer::start().await;
    mount_geocode(
        &server,
        serde_json::json!({
            "results": [{
                "latitude": 48.85,
                "longitude": 2.35,
                "name": "Paris",
                "country_code": "FR"
            }]
        }),
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let mut ctl = controller(&server);
    let state = ctl.search("Paris").await;

    let message = state.error().expect("search should fail");
    assert!(!message.is_empty());
    assert_eq!(ctl.view().0.as_ref(), Some(ctl.state()));
}

#[tokio::test]
async fn unknown_city_ends_in_failed() {
    let server = MockServer::start().await;
    mount_geocode(&server, serde_json::json!({ "results": [] })).await;

    let mut ctl = controller(&server);
    ctl.search("Qwxzzy").await;

    let message = ctl.state().error().expect("search should fail");
    assert!(message.contains("Qwxzzy"));
}

#[tokio::test]
async fn successful_search_ends_loaded() {
    let server = MockServer::start().await;
    mount_geocode(
        &server,
        serde_json::json!({
            "results": [{
                "latitude": 59.91,
                "longitude": 10.75,
                "name": "Oslo",
                "country_code": "NO",
                "admin1": "Oslo County"
            }]
        }),
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "current_weather": { "temperature": 0.0, "windspeed": 3.6, "weathercode": 73 }
        })))
        .mount(&server)
        .await;

    let mut ctl = controller(&server);
    ctl.search("Oslo").await;
    ctl.flush_log_writes().await;

    let weather = ctl.state().weather().expect("search should load");
    assert_eq!(weather.location_label, "Oslo, Oslo County, NO");
    assert_eq!(weather.temperature_c, 0.0);
    assert_eq!(weather.wind_kmh, 4);
    assert_eq!(weather.description, "moderate snow");
}
