//! Walks one client session through its lifecycle against a local mock: an authorized API
//! call, a 401 that drops the cached credential, a refresh rotation, and the forced sign-out
//! that follows a dead refresh token.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use parking_lot::Mutex;
use url::Url;
// self
use session_broker::{
	auth::Session,
	config::LifecycleConfig,
	flows::SessionBroker,
	provider::{MemorySessionProvider, Navigator},
	reqwest::{Method, Request},
};

#[derive(Default)]
struct PrintingNavigator(Mutex<Option<Url>>);
impl Navigator for PrintingNavigator {
	fn current_location(&self) -> String {
		"/players/compare?ids=7,11".into()
	}

	fn redirect(&self, target: &Url) {
		println!("Navigating to {target}.");

		*self.0.lock() = Some(target.clone());
	}
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let api_ok = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/watchlists").header("authorization", "Bearer demo-access");
			then.status(200).header("content-type", "application/json").body("[]");
		})
		.await;
	let api_rejected = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/reports").header("authorization", "Bearer demo-access");
			then.status(401);
		})
		.await;
	let refresh_ok = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh").body("{\"refreshToken\":\"demo-refresh\"}");
			then.status(200).header("content-type", "application/json").body(
				"{\"accessToken\":\"demo-access-2\",\"refreshToken\":\"demo-refresh-2\",\"expiresIn\":900}",
			);
		})
		.await;
	let refresh_dead = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh").body("{\"refreshToken\":\"revoked\"}");
			then.status(401);
		})
		.await;
	let config = LifecycleConfig::builder()
		.identity_base(Url::parse(&server.base_url())?)
		.sign_in_url(Url::parse("https://scouting.example.com/sign-in")?)
		.build()?;
	let provider = MemorySessionProvider::with_session(Session::new("demo-access"));
	let navigator = Arc::new(PrintingNavigator::default());
	let broker = SessionBroker::new(config, Arc::new(provider.clone()), navigator.clone());
	let response = broker
		.send(Request::new(Method::GET, Url::parse(&server.url("/api/watchlists"))?))
		.await?;

	println!("Watchlists answered with HTTP {}.", response.status());

	let response =
		broker.send(Request::new(Method::GET, Url::parse(&server.url("/api/reports"))?)).await?;

	println!(
		"Reports answered with HTTP {}; cached credential is now {:?}.",
		response.status(),
		broker.cache().get()
	);

	let rotated = broker.refresh("demo-refresh").await?;

	println!("Rotated credential valid until {}.", rotated.expires_at);

	if let Err(err) = broker.refresh("revoked").await {
		println!("Refresh failed: {err}.");
	}

	println!(
		"Session cleared: {}; provider lookups: {}; sign-outs: {}.",
		provider.peek().is_none(),
		provider.lookups(),
		broker.metrics.sign_outs()
	);

	api_ok.assert_async().await;
	api_rejected.assert_async().await;
	refresh_ok.assert_async().await;
	refresh_dead.assert_async().await;

	Ok(())
}
