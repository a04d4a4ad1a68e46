// crates.io
use oauth2::{AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse};
// self
use crate::{
	_prelude::*,
	config::LifecycleConfig,
	endpoint::{TransportErrorMapper, map_generic_transport_error},
	flows::SessionBroker,
	http::{AuthHttpClient, ResponseMetadata, ResponseMetadataSlot},
	provider::{MemorySessionProvider, Navigator},
};

#[derive(Debug, ThisError)]
#[error("offline")]
pub(crate) struct Offline;

/// Transport whose every call fails before reaching the network.
pub(crate) struct OfflineClient;
impl AuthHttpClient for OfflineClient {
	type Handle = OfflineHandle;
	type TransportError = Offline;

	fn with_metadata(&self, _: ResponseMetadataSlot) -> Self::Handle {
		OfflineHandle
	}
}

pub(crate) struct OfflineHandle;
impl<'c> AsyncHttpClient<'c> for OfflineHandle {
	type Error = HttpClientError<Offline>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send + Sync>>;

	fn call(&'c self, _: HttpRequest) -> Self::Future {
		Box::pin(async { Err(HttpClientError::Other("connection refused".into())) })
	}
}

pub(crate) struct OfflineMapper;
impl TransportErrorMapper<Offline> for OfflineMapper {
	fn map_transport_error(
		&self,
		meta: Option<&ResponseMetadata>,
		err: HttpClientError<Offline>,
	) -> Error {
		map_generic_transport_error(meta, err)
	}
}

#[derive(Debug, Default)]
pub(crate) struct RecordingNavigator {
	pub(crate) redirects: Mutex<Vec<Url>>,
}
impl Navigator for RecordingNavigator {
	fn current_location(&self) -> String {
		"/players/42".into()
	}

	fn redirect(&self, target: &Url) {
		self.redirects.lock().push(target.clone());
	}
}

pub(crate) type OfflineBroker = SessionBroker<OfflineClient, OfflineMapper>;

pub(crate) fn offline_broker(
	provider: &MemorySessionProvider,
) -> (OfflineBroker, Arc<RecordingNavigator>) {
	let config = LifecycleConfig::builder()
		.identity_base(
			Url::parse("https://id.example.com").expect("Identity base fixture should parse."),
		)
		.sign_in_url(
			Url::parse("https://app.example.com/sign-in").expect("Sign-in fixture should parse."),
		)
		.build()
		.expect("Lifecycle config fixture should be valid.");
	let navigator = Arc::new(RecordingNavigator::default());
	let broker = SessionBroker::with_http_client(
		config,
		Arc::new(provider.clone()),
		navigator.clone(),
		OfflineClient,
		OfflineMapper,
	);

	(broker, navigator)
}
