//! [`RemoteResolver`] over the peers' HTTP action API.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::{Deserialize, Serialize};

use relayhub_app::action::{BoxFuture, CallOptions, Outcome};
use relayhub_app::ports::RemoteResolver;
use relayhub_domain::action::{ActionInfo, Origin};
use relayhub_domain::error::{BindingError, RelayHubError, TimeoutError, UnknownActionError};
use relayhub_domain::id::ActionId;
use relayhub_domain::value::{Args, Map, Value};

/// Marks requests as forwarded so the peer resolves them locally only.
const PEER_HEADER: &str = "x-relayhub-peer";

/// Errors raised while setting up an [`HttpResolver`].
#[derive(Debug, thiserror::Error)]
pub enum ResolverError {
    #[error("invalid peer url `{url}`: {reason}")]
    InvalidPeer { url: String, reason: String },

    #[error("failed to build http client")]
    Client(#[from] reqwest::Error),
}

#[derive(Serialize)]
struct CallBody {
    args: Vec<Value>,
    kwargs: Map<String, Value>,
    run_async: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    timeout_ms: Option<u64>,
}

#[derive(Serialize)]
struct InterruptBody {
    args: Vec<Value>,
    kwargs: Map<String, Value>,
}

#[derive(Deserialize)]
struct Returned {
    value: Value,
}

#[derive(Deserialize)]
struct Interrupted {
    interrupted: bool,
}

#[derive(Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: String,
    #[serde(default)]
    binding: Option<BindingError>,
}

/// Resolves identifiers on a fixed list of peer hubs.
///
/// Peers are asked in order; the first one that describes an identifier owns
/// it from then on, until it answers `404` for it.
pub struct HttpResolver {
    client: Client,
    peers: Vec<String>,
    describe_timeout: Duration,
    routes: RwLock<HashMap<ActionId, String>>,
}

impl HttpResolver {
    /// Resolver over `peers`, given as base URLs such as
    /// `http://10.0.0.7:8080`. Lookups give up on a peer after
    /// `describe_timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`ResolverError::InvalidPeer`] if a peer is not an absolute
    /// `http(s)` URL.
    pub fn new(
        peers: impl IntoIterator<Item = impl Into<String>>,
        describe_timeout: Duration,
    ) -> Result<Self, ResolverError> {
        let peers = peers
            .into_iter()
            .map(|peer| parse_peer(peer.into()))
            .collect::<Result<Vec<_>, _>>()?;
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            peers,
            describe_timeout,
            routes: RwLock::default(),
        })
    }

    #[must_use]
    pub fn peers(&self) -> &[String] {
        &self.peers
    }

    fn request(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.header(PEER_HEADER, "1")
    }

    /// First peer describing `id`, with its description.
    async fn find(&self, id: &ActionId) -> Option<(String, ActionInfo)> {
        for peer in &self.peers {
            let request = self
                .request(self.client.get(format!("{peer}/api/actions/{id}")))
                .timeout(self.describe_timeout);
            let response = match request.send().await {
                Ok(response) => response,
                Err(err) => {
                    tracing::warn!(%peer, action = %id, %err, "peer unreachable");
                    continue;
                }
            };
            match response.status() {
                StatusCode::OK => {}
                StatusCode::NOT_FOUND => continue,
                status => {
                    tracing::warn!(%peer, action = %id, %status, "unexpected answer to lookup");
                    continue;
                }
            }
            match response.json::<ActionInfo>().await {
                Ok(mut info) => {
                    info.origin = Origin::Remote;
                    return Some((peer.clone(), info));
                }
                Err(err) => {
                    tracing::warn!(%peer, action = %id, %err, "malformed action description");
                }
            }
        }
        None
    }

    async fn peer_of(&self, id: &ActionId) -> Result<String, RelayHubError> {
        let known = self
            .routes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned();
        if let Some(peer) = known {
            return Ok(peer);
        }
        match self.find(id).await {
            Some((peer, _)) => {
                self.remember(id, &peer);
                Ok(peer)
            }
            None => Err(UnknownActionError { id: id.clone() }.into()),
        }
    }

    fn remember(&self, id: &ActionId, peer: &str) {
        self.routes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.clone(), peer.to_string());
    }

    fn forget(&self, id: &ActionId) {
        self.routes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id);
    }

    /// Map a non-success answer back onto [`RelayHubError`].
    async fn failure(
        &self,
        id: &ActionId,
        response: Response,
        timeout: Option<Duration>,
    ) -> RelayHubError {
        let status = response.status();
        let body: ErrorBody = response.json().await.unwrap_or_default();
        match (status, body.binding) {
            (StatusCode::NOT_FOUND, _) => {
                self.forget(id);
                UnknownActionError { id: id.clone() }.into()
            }
            (StatusCode::BAD_REQUEST, Some(binding)) => binding.into(),
            (StatusCode::GATEWAY_TIMEOUT, _) => TimeoutError {
                action: id.clone(),
                after: timeout.unwrap_or_default(),
            }
            .into(),
            _ => RelayHubError::work(
                id.clone(),
                anyhow::anyhow!("peer answered {status}: {}", body.error),
            ),
        }
    }
}

fn parse_peer(peer: String) -> Result<String, ResolverError> {
    match Url::parse(&peer) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {
            Ok(peer.trim_end_matches('/').to_string())
        }
        Ok(url) => Err(ResolverError::InvalidPeer {
            reason: format!("unsupported scheme `{}`", url.scheme()),
            url: peer,
        }),
        Err(err) => Err(ResolverError::InvalidPeer {
            reason: err.to_string(),
            url: peer,
        }),
    }
}

fn transport_failure(id: &ActionId, peer: &str, err: reqwest::Error) -> RelayHubError {
    RelayHubError::work(
        id.clone(),
        anyhow::Error::new(err).context(format!("peer {peer} unreachable")),
    )
}

impl RemoteResolver for HttpResolver {
    fn describe<'a>(
        &'a self,
        id: &'a ActionId,
    ) -> BoxFuture<'a, Result<Option<ActionInfo>, RelayHubError>> {
        Box::pin(async move {
            Ok(self.find(id).await.map(|(peer, info)| {
                tracing::debug!(%peer, action = %id, "action found on peer");
                self.remember(id, &peer);
                info
            }))
        })
    }

    fn call<'a>(
        &'a self,
        id: &'a ActionId,
        args: Args,
        options: CallOptions,
    ) -> BoxFuture<'a, Result<Outcome, RelayHubError>> {
        Box::pin(async move {
            let peer = self.peer_of(id).await?;
            let body = CallBody {
                args: args.positional,
                kwargs: args.keyword,
                run_async: options.run_async,
                timeout_ms: options
                    .timeout
                    .map(|t| u64::try_from(t.as_millis()).unwrap_or(u64::MAX)),
            };
            let response = self
                .request(self.client.post(format!("{peer}/api/actions/{id}/call")))
                .json(&body)
                .send()
                .await
                .map_err(|err| transport_failure(id, &peer, err))?;

            match response.status() {
                StatusCode::OK => {
                    let Returned { value } = response
                        .json()
                        .await
                        .map_err(|err| transport_failure(id, &peer, err))?;
                    Ok(Outcome::Returned(value))
                }
                StatusCode::ACCEPTED => Ok(Outcome::Detached),
                _ => Err(self.failure(id, response, options.timeout).await),
            }
        })
    }

    fn interrupt<'a>(
        &'a self,
        id: &'a ActionId,
        args: Args,
    ) -> BoxFuture<'a, Result<bool, RelayHubError>> {
        Box::pin(async move {
            let peer = self.peer_of(id).await?;
            let body = InterruptBody {
                args: args.positional,
                kwargs: args.keyword,
            };
            let response = self
                .request(self.client.post(format!("{peer}/api/actions/{id}/interrupt")))
                .json(&body)
                .send()
                .await
                .map_err(|err| transport_failure(id, &peer, err))?;

            if response.status() != StatusCode::OK {
                return Err(self.failure(id, response, None).await);
            }
            let Interrupted { interrupted } = response
                .json()
                .await
                .map_err(|err| transport_failure(id, &peer, err))?;
            Ok(interrupted)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relayhub_adapter_http_axum::router;
    use relayhub_adapter_http_axum::state::AppState;
    use relayhub_app::action::{Action, Invocation};
    use relayhub_app::hub::Hub;
    use relayhub_domain::action::ParamSpec;
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::net::TcpListener;

    async fn add(invocation: Invocation) -> anyhow::Result<Value> {
        let a = invocation.param("a").and_then(Value::as_i64).unwrap_or_default();
        let b = invocation.param("b").and_then(Value::as_i64).unwrap_or_default();
        Ok(json!(a + b))
    }

    async fn listener() -> (TcpListener, String) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        (listener, url)
    }

    fn serve(listener: TcpListener, hub: Arc<Hub>) {
        let app = router::build(AppState::new(hub));
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
    }

    /// A served hub with `math.add(a, b=0)` and an interruptible `test.hold`,
    /// plus the flag `test.hold`'s interrupt handler sets.
    async fn peer() -> (String, Arc<AtomicBool>) {
        let hub = Arc::new(Hub::builder().build().unwrap());
        hub.register(
            Action::builder("add")
                .controller("math")
                .param(ParamSpec::required("a"))
                .param(ParamSpec::optional("b", 0))
                .work(add)
                .build()
                .unwrap(),
        )
        .unwrap();
        let interrupted = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&interrupted);
        hub.register(
            Action::builder("hold")
                .controller("test")
                .work(|invocation: Invocation| async move {
                    invocation.exit_flag().wait().await;
                    Ok(json!("released"))
                })
                .on_interrupt(move |_| {
                    flag.store(true, Ordering::SeqCst);
                    async { Ok(()) }
                })
                .build()
                .unwrap(),
        )
        .unwrap();
        let (listener, url) = listener().await;
        serve(listener, hub);
        (url, interrupted)
    }

    fn caller(peers: &[&str]) -> Hub {
        let resolver = HttpResolver::new(peers.iter().copied(), Duration::from_millis(500)).unwrap();
        Hub::builder().remote(Arc::new(resolver)).build().unwrap()
    }

    fn id(s: &str) -> ActionId {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn should_describe_and_call_action_defined_on_peer() {
        let (url, _) = peer().await;
        let hub = caller(&[&url]);

        let action = hub.action(&id("math.add")).await.unwrap();
        assert_eq!(action.info().origin, Origin::Remote);
        assert_eq!(action.info().params.len(), 2);

        let value = action.call(Args::positional([json!(2), json!(3)])).await.unwrap();
        assert_eq!(value, json!(5));
    }

    #[tokio::test]
    async fn should_report_binding_failure_of_peer() {
        let (url, _) = peer().await;
        let hub = caller(&[&url]);

        let err = hub
            .action(&id("math.add"))
            .await
            .unwrap()
            .call(Args::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            RelayHubError::Binding(BindingError::Missing(ref name)) if name == "a"
        ));
    }

    #[tokio::test]
    async fn should_report_timeout_of_peer() {
        let (url, _) = peer().await;
        let hub = caller(&[&url]);
        let hold = hub.action(&id("test.hold")).await.unwrap();

        let err = hold
            .call_with(
                Args::new(),
                CallOptions::sync().with_timeout(Duration::from_millis(20)),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, RelayHubError::Timeout(_)));
        assert!(hold.interrupt(Args::new()).await.unwrap());
    }

    #[tokio::test]
    async fn should_detach_background_call_and_forward_interrupt() {
        let (url, interrupted) = peer().await;
        let hub = caller(&[&url]);
        let hold = hub.action(&id("test.hold")).await.unwrap();

        let outcome = hold
            .call_with(Args::new(), CallOptions::background())
            .await
            .unwrap();
        assert!(matches!(outcome, Outcome::Detached));

        assert!(hold.interrupt(Args::new()).await.unwrap());
        assert!(interrupted.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn should_skip_unreachable_peer() {
        let (url, _) = peer().await;
        let (closed, dead) = listener().await;
        drop(closed);
        let hub = caller(&[&dead, &url]);

        let value = hub
            .action(&id("math.add"))
            .await
            .unwrap()
            .call(Args::positional([json!(1)]))
            .await
            .unwrap();
        assert_eq!(value, json!(1));
    }

    #[tokio::test]
    async fn should_not_bounce_lookups_between_peers_listing_each_other() {
        let (first_listener, first_url) = listener().await;
        let (second_listener, second_url) = listener().await;
        let first = Arc::new(caller(&[&second_url]));
        let second = Arc::new(caller(&[&first_url]));
        serve(first_listener, Arc::clone(&first));
        serve(second_listener, second);

        let result = tokio::time::timeout(Duration::from_secs(2), first.action(&id("ghost")))
            .await
            .expect("lookup should settle");

        assert!(matches!(result, Err(RelayHubError::UnknownAction(_))));
    }

    #[test]
    fn should_reject_peer_that_is_not_an_http_url() {
        assert!(matches!(
            HttpResolver::new(["ftp://10.0.0.7"], Duration::from_secs(1)),
            Err(ResolverError::InvalidPeer { .. })
        ));
        assert!(matches!(
            HttpResolver::new(["not a url"], Duration::from_secs(1)),
            Err(ResolverError::InvalidPeer { .. })
        ));
    }

    #[test]
    fn should_trim_trailing_slash_of_peer() {
        let resolver = HttpResolver::new(["http://10.0.0.7:8080/"], Duration::from_secs(1)).unwrap();
        assert_eq!(resolver.peers(), ["http://10.0.0.7:8080"]);
    }
}
