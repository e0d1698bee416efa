use std::sync::Arc;

use axum::handler::Handler;
use axum::http::HeaderName;
use axum::routing::get;
use axum::Router;
use tokio::net::{TcpListener, ToSocketAddrs};
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::files;
use crate::{Delivery, FerryAxumState, ObjectResolver};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Clone)]
pub struct AxumApp {
    pub state: FerryAxumState,
    pub router: Router<()>,
}

impl AxumApp {
    /// File routes (`/u/{id}`, `/r/{id}`) wired to `delivery`.
    pub fn new(delivery: Delivery, resolver: Arc<dyn ObjectResolver>) -> Self {
        let state = FerryAxumState::new(delivery, resolver);
        Self {
            router: files::router(state.clone()),
            state,
        }
    }

    pub fn service<H, T>(mut self, path: &str, handler: H) -> Self
    where
        H: Handler<T, ()> + Clone + Send + Sync + 'static,
        T: 'static,
    {
        self.router = self.router.route(path, get(handler));
        self
    }

    /// Request ids and HTTP tracing around every route.
    pub fn into_router(self) -> Router<()> {
        let request_id = HeaderName::from_static(REQUEST_ID_HEADER);
        self.router.layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::new(request_id)),
        )
    }

    pub async fn listen<A>(self, addr: A) -> anyhow::Result<()>
    where
        A: ToSocketAddrs,
    {
        let listener = TcpListener::bind(addr).await?;
        info!(addr = %listener.local_addr()?, "listening");
        axum::serve(listener, self.into_router()).await?;
        Ok(())
    }
}

pub fn axum(delivery: Delivery, resolver: Arc<dyn ObjectResolver>) -> AxumApp {
    AxumApp::new(delivery, resolver)
}
