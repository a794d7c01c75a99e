//! End-to-end resolution against a mock OpenWeather endpoint.

use std::sync::Arc;

use serde_json::json;
use wardrobe_core::{
    Classification, Coordinates, Environment, FailureReason, LocationResolver, ResolutionOutcome,
    WeatherProvider, WeatherView,
    geolocation::FixedGeolocation,
    provider::openweather::OpenWeatherProvider,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn payload(city: &str, temp: f64) -> serde_json::Value {
    json!({
        "name": city,
        "dt": 1_700_000_000,
        "main": { "temp": temp, "feels_like": temp },
        "weather": [{ "main": "Snow", "description": "light snow" }],
        "sys": { "sunrise": 1_699_990_000, "sunset": 1_700_020_000 },
    })
}

fn provider(server: &MockServer) -> Arc<dyn WeatherProvider> {
    Arc::new(OpenWeatherProvider::with_base_url("TEST_KEY".into(), &server.uri()))
}

#[tokio::test]
async fn test_device_position_resolves_cold_snapshot() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .and(query_param("lat", "40.7"))
        .and(query_param("lon", "-74"))
        .and(query_param("units", "imperial"))
        .and(query_param("appid", "TEST_KEY"))
        .respond_with(ResponseTemplate::new(200).set_body_json(payload("New York", 30.0)))
        .expect(1)
        .mount(&server)
        .await;

    let env = Environment::default()
        .with_geolocation(Arc::new(FixedGeolocation(Coordinates::new(40.7, -74.0))));
    let resolver = LocationResolver::new(env, provider(&server), Coordinates::new(0.0, 0.0));
    let view = WeatherView::new();

    let outcome = resolver.resolve(&view).await;

    let ResolutionOutcome::Success(snapshot) = outcome else {
        panic!("expected success, got {outcome:?}");
    };
    assert_eq!(snapshot.classification, Classification::Cold);
    assert_eq!(snapshot.temperature.fahrenheit, 30.0);
    assert_eq!(snapshot.city, "New York");
    assert_eq!(snapshot.condition, "snow");
    assert!(snapshot.is_daytime);
    assert!(view.failure().is_none());
}

#[tokio::test]
async fn test_unsupported_environment_uses_fallback_coordinates() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .and(query_param("lat", "51.5"))
        .and(query_param("lon", "-0.12"))
        .respond_with(ResponseTemplate::new(200).set_body_json(payload("London", 70.0)))
        .expect(1)
        .mount(&server)
        .await;

    let resolver = LocationResolver::new(
        Environment::unsupported(),
        provider(&server),
        Coordinates::new(51.5, -0.12),
    );
    let view = WeatherView::new();

    let outcome = resolver.resolve(&view).await;

    assert!(outcome.is_success());
    assert_eq!(view.snapshot().map(|s| s.classification), Some(Classification::Warm));
    assert!(view.banner().is_none());
}

#[tokio::test]
async fn test_weather_service_error_is_weather_fetch_failure() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(401).set_body_string(r#"{"cod":401}"#))
        .mount(&server)
        .await;

    let resolver = LocationResolver::new(
        Environment::unsupported(),
        provider(&server),
        Coordinates::new(1.0, 1.0),
    );
    let view = WeatherView::new();

    let outcome = resolver.resolve(&view).await;

    let ResolutionOutcome::Failure(failure) = outcome else {
        panic!("expected failure, got {outcome:?}");
    };
    let FailureReason::WeatherFetch(detail) = &failure.reason else {
        panic!("expected weather fetch failure, got {:?}", failure.reason);
    };
    assert!(detail.contains("401"), "detail should mention status: {detail}");
    assert!(failure.used_fallback);
    assert!(view.snapshot().is_none());
}
