//! HTTP/1.1 server: one task per connection, all sharing the router

use crate::handlers::Routes;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info};

pub struct GateServer {
    routes: Arc<Routes>,
}

impl GateServer {
    pub fn new(routes: Routes) -> Self {
        Self {
            routes: Arc::new(routes),
        }
    }

    pub fn routes(&self) -> &Routes {
        &self.routes
    }

    /// Bind `addr` and serve until `shutdown` resolves
    pub async fn serve(
        self,
        addr: SocketAddr,
        shutdown: impl Future<Output = ()>,
    ) -> std::io::Result<()> {
        let listener = TcpListener::bind(addr).await?;
        self.run(listener, shutdown).await
    }

    /// Serve connections from an already-bound listener until `shutdown`
    /// resolves. Connections in flight are left to finish on their own tasks.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: impl Future<Output = ()>,
    ) -> std::io::Result<()> {
        info!(
            addr = %listener.local_addr()?,
            refresh = self.routes.refresh_mounted(),
            "jwtgate server listening"
        );
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let (stream, remote_addr) = match accepted {
                        Ok(accepted) => accepted,
                        Err(err) => {
                            error!(error = %err, "Failed to accept connection");
                            continue;
                        }
                    };
                    debug!(%remote_addr, "New connection");

                    let routes = Arc::clone(&self.routes);
                    tokio::spawn(async move {
                        Self::handle_connection(stream, remote_addr, routes).await;
                    });
                }
                _ = &mut shutdown => {
                    info!("Shutdown signal received, no longer accepting connections");
                    return Ok(());
                }
            }
        }
    }

    async fn handle_connection(stream: TcpStream, remote_addr: SocketAddr, routes: Arc<Routes>) {
        let io = TokioIo::new(stream);

        let service = service_fn(move |request| {
            let routes = Arc::clone(&routes);
            async move { Ok::<_, Infallible>(routes.dispatch(request).await) }
        });

        if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
            error!(%remote_addr, error = %err, "HTTP connection error");
        }
    }
}
