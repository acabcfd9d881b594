use anyhow::Context;

use axum::Router;

use hyper_util::{
    rt::{TokioExecutor, TokioIo},
    server,
};

use tokio::net::{TcpListener, TcpStream};

use tower::Service;

use tracing::{debug, info, instrument, warn};

use std::{
    net::SocketAddr,
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

use crate::config::{ConnectionConfiguration, ServerConfiguration};

static NEXT_CONNECTION_ID: AtomicUsize = AtomicUsize::new(0);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct ConnectionID(usize);

impl ConnectionID {
    fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    fn as_usize(&self) -> usize {
        self.0
    }
}

pub async fn run(routes: Router, server_configuration: &ServerConfiguration) -> anyhow::Result<()> {
    let listener = create_listener(server_configuration).await?;

    serve(
        listener,
        routes,
        connection_timeout_durations(&server_configuration.connection),
    )
    .await
}

/// Durations to wait before first asking a connection to shut down
/// gracefully, then before dropping it.
fn connection_timeout_durations(connection_configuration: &ConnectionConfiguration) -> Vec<Duration> {
    vec![
        connection_configuration.max_lifetime,
        connection_configuration.graceful_shutdown_timeout,
    ]
}

async fn create_listener(
    server_configuration: &ServerConfiguration,
) -> anyhow::Result<TcpListener> {
    let tcp_listener = TcpListener::bind(&server_configuration.bind_address)
        .await
        .with_context(|| {
            format!(
                "TCP server bind error address = {:?}",
                server_configuration.bind_address
            )
        })?;

    let local_addr = tcp_listener.local_addr().with_context(|| {
        format!(
            "TCP server local_addr error address = {:?}",
            server_configuration.bind_address
        )
    })?;

    info!("listening on tcp {:?}", local_addr);

    Ok(tcp_listener)
}

async fn serve(
    listener: TcpListener,
    routes: Router,
    connection_timeout_durations: Vec<Duration>,
) -> anyhow::Result<()> {
    debug!(
        "connection_timeout_durations = {:?}",
        connection_timeout_durations
    );

    loop {
        let (tcp_stream, remote_addr) = listener.accept().await.context("listener accept error")?;

        if let Err(e) = tcp_stream.set_nodelay(true) {
            warn!("error setting tcp no delay {:?}", e);
            continue;
        };

        tokio::spawn(handle_connection(
            ConnectionID::next(),
            tcp_stream,
            remote_addr,
            connection_timeout_durations.clone(),
            routes.clone(),
        ));
    }
}

#[instrument(
    name = "conn",
    skip_all,
    fields(
        id = connection_id.as_usize(),
    )
)]
async fn handle_connection(
    connection_id: ConnectionID,
    socket: TcpStream,
    remote_addr: SocketAddr,
    connection_timeout_durations: Vec<Duration>,
    tower_service: Router,
) {
    info!("begin handle_connection remote_addr = {remote_addr:?}");

    let num_requests = AtomicUsize::new(0);

    let socket = TokioIo::new(socket);

    let hyper_service = hyper::service::service_fn(|request| {
        num_requests.fetch_add(1, Ordering::Relaxed);
        tower_service.clone().call(request)
    });

    let builder = server::conn::auto::Builder::new(TokioExecutor::new());

    let hyper_conn = builder.serve_connection(socket, hyper_service);
    tokio::pin!(hyper_conn);

    for (iter, sleep_duration) in connection_timeout_durations.iter().enumerate() {
        debug!("iter = {} sleep_duration = {:?}", iter, sleep_duration);
        tokio::select! {
            res = hyper_conn.as_mut() => {
                match res {
                    Ok(()) => debug!("after polling conn, no error"),
                    Err(e) =>  warn!("error serving connection: {:?}", e),
                };
                break;
            }
            _ = tokio::time::sleep(*sleep_duration) => {
                info!("iter = {} got timeout_interval, calling conn.graceful_shutdown", iter);
                hyper_conn.as_mut().graceful_shutdown();
            }
        }
    }

    info!(
        "end handle_connection num requests = {}",
        num_requests.load(Ordering::Relaxed),
    );
}
