//! Shared helpers for the integration tests
#![allow(dead_code)]

use chirpy::clock::{Clock, ManualClock};
use chirpy::configuration::{get_configuration, Platform, Settings};
use chirpy::startup::run;
use chirpy::storage::Stores;
use chirpy::telemetry::try_init_test_telemetry;
use secrecy::ExposeSecret;
use serde_json::{json, Value};
use std::net::TcpListener;
use std::sync::Arc;

pub const PASSWORD: &str = "04234abcd";

pub struct TestApp {
    pub address: String,
    pub clock: Arc<ManualClock>,
    pub polka_key: String,
    pub client: reqwest::Client,
}

pub fn test_configuration() -> Settings {
    let mut configuration = get_configuration().expect("Failed to read configuration.");
    configuration.application.platform = Platform::Dev;
    configuration.application.static_dir = "./public".to_string();
    // cheap hashing keeps the suite fast
    configuration.auth.hashing.memory_kib = 8192;
    configuration.auth.hashing.iterations = 1;
    configuration
}

pub fn spawn_app() -> TestApp {
    spawn_app_with(test_configuration())
}

pub fn spawn_app_with(configuration: Settings) -> TestApp {
    try_init_test_telemetry();

    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let clock = Arc::new(ManualClock::default());
    let dyn_clock: Arc<dyn Clock> = clock.clone();
    let server = run(listener, &configuration, Stores::in_memory(), dyn_clock)
        .expect("Failed to build server");
    let _ = tokio::spawn(server);

    TestApp {
        address,
        clock,
        polka_key: configuration.auth.polka_key.expose_secret().clone(),
        client: reqwest::Client::new(),
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn post_user(&self, email: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/api/users"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// Register `email` and return the account JSON
    pub async fn create_user(&self, email: &str) -> Value {
        let response = self.post_user(email, PASSWORD).await;
        assert_eq!(201, response.status().as_u16());
        response.json().await.expect("Failed to parse response")
    }

    pub async fn post_login(&self, email: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/api/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// Register and log in, returning the login JSON
    pub async fn create_logged_in_user(&self, email: &str) -> Value {
        self.create_user(email).await;
        let response = self.post_login(email, PASSWORD).await;
        assert_eq!(200, response.status().as_u16());
        response.json().await.expect("Failed to parse response")
    }

    pub async fn post_with_bearer(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_chirp(&self, token: &str, body: &str) -> reqwest::Response {
        self.client
            .post(self.url("/api/chirps"))
            .bearer_auth(token)
            .json(&json!({ "body": body }))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn delete_chirp(&self, id: &str, authorization: Option<&str>) -> reqwest::Response {
        let mut request = self.client.delete(self.url(&format!("/api/chirps/{}", id)));
        if let Some(value) = authorization {
            request = request.header("Authorization", value);
        }
        request.send().await.expect("Failed to execute request.")
    }
}

pub async fn error_body(response: reqwest::Response) -> Value {
    response.json().await.expect("Failed to parse error response")
}
