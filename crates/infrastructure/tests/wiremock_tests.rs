//! Adapter-level tests exercising retry and circuit breaker behavior
//! against a mock upstream

use application::ports::ForecastSourcePort;
use application::ApplicationError;
use futures::StreamExt;
use infrastructure::adapters::{CircuitBreakerConfig, ForecastSourceAdapter};
use infrastructure::config::ResilienceConfig;
use infrastructure::retry::RetryConfig;
use integration_forecast::{ForecastClient, ForecastClientConfig};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn adapter_for(server: &MockServer, resilience: &ResilienceConfig) -> ForecastSourceAdapter {
    let client = ForecastClient::new(ForecastClientConfig {
        base_url: server.uri(),
        timeout_secs: 2,
    })
    .expect("client construction should succeed");
    ForecastSourceAdapter::new(client, resilience)
}

fn fast_retries(max_retries: u32) -> ResilienceConfig {
    ResilienceConfig {
        retry: RetryConfig::fixed(10, max_retries),
        circuit_breaker: CircuitBreakerConfig {
            failure_threshold: 100,
            success_threshold: 1,
            open_duration_secs: 60,
        },
    }
}

#[tokio::test]
async fn successful_fetch_streams_domain_records() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/WeatherForecast"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"[{"date":"2022-08-10T00:00:00Z","temperatureC":40,"summary":"Harno"}]"#,
            "application/json",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = adapter_for(&server, &fast_retries(2));
    let stream = adapter.fetch_forecasts().await.unwrap();
    let records: Vec<_> = stream.collect().await;

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].as_ref().unwrap().temperature_c, Some(40));
}

#[tokio::test]
async fn transient_failures_consume_full_retry_budget() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/WeatherForecast"))
        .respond_with(ResponseTemplate::new(500))
        // 1 initial attempt + 2 retries
        .expect(3)
        .mount(&server)
        .await;

    let adapter = adapter_for(&server, &fast_retries(2));
    let Err(err) = adapter.fetch_forecasts().await else {
        panic!("expected the fetch to fail");
    };
    assert!(matches!(err, ApplicationError::UpstreamUnavailable(_)));
}

#[tokio::test]
async fn recovery_mid_retry_returns_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/WeatherForecast"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/WeatherForecast"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("[]", "application/json"))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = adapter_for(&server, &fast_retries(5));
    let stream = adapter.fetch_forecasts().await.unwrap();
    assert!(stream.collect::<Vec<_>>().await.is_empty());
}

#[tokio::test]
async fn client_error_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/WeatherForecast"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = adapter_for(&server, &fast_retries(5));
    let Err(err) = adapter.fetch_forecasts().await else {
        panic!("expected the fetch to fail");
    };
    assert!(matches!(err, ApplicationError::UpstreamBadResponse(_)));
}

#[tokio::test]
async fn open_circuit_fails_fast_without_calling_upstream() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/WeatherForecast"))
        .respond_with(ResponseTemplate::new(500))
        // Only the two calls that trip the breaker reach the server.
        .expect(2)
        .mount(&server)
        .await;

    let resilience = ResilienceConfig {
        retry: RetryConfig::fixed(10, 0),
        circuit_breaker: CircuitBreakerConfig {
            failure_threshold: 2,
            success_threshold: 1,
            open_duration_secs: 60,
        },
    };
    let adapter = adapter_for(&server, &resilience);

    for _ in 0..2 {
        let Err(err) = adapter.fetch_forecasts().await else {
            panic!("expected the fetch to fail");
        };
        assert!(matches!(err, ApplicationError::UpstreamUnavailable(_)));
    }
    assert!(!adapter.is_available().await);

    let Err(err) = adapter.fetch_forecasts().await else {
        panic!("expected the fetch to fail");
    };
    assert!(matches!(err, ApplicationError::UpstreamUnavailable(_)));
}

#[tokio::test]
async fn malformed_payload_surfaces_mid_stream() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/WeatherForecast"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(r#"{"not":"an array"}"#, "application/json"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let adapter = adapter_for(&server, &fast_retries(5));
    let stream = adapter.fetch_forecasts().await.unwrap();
    let items: Vec<_> = stream.collect().await;

    assert_eq!(items.len(), 1);
    assert!(matches!(
        items[0],
        Err(ApplicationError::MalformedPayload(_))
    ));
}

#[tokio::test]
async fn adapter_reports_available_while_circuit_closed() {
    let server = MockServer::start().await;
    let adapter = adapter_for(&server, &fast_retries(0));
    assert!(adapter.is_available().await);
}
