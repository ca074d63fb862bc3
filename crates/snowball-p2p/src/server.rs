//! The wire server answering peer queries.

use crate::{QueryHandler, Result};
use snowball_protocol::{read_request, write_frame};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Accepts peer connections and answers their requests.
#[derive(Debug)]
pub struct Server {
    listener: TcpListener,
}

impl Server {
    /// Binds the listen socket.
    pub async fn bind(addr: SocketAddr) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        info!(addr = %listener.local_addr()?, "Listening for peers");
        Ok(Self { listener })
    }

    /// Returns the bound address.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serves connections in the background until `shutdown` is cancelled.
    pub fn spawn(
        self,
        handler: Arc<dyn QueryHandler>,
        shutdown: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(self.serve(handler, shutdown))
    }

    /// Serves connections until `shutdown` is cancelled.
    ///
    /// Connections are handled on their own tasks and are closed when the
    /// server stops.
    pub async fn serve(self, handler: Arc<dyn QueryHandler>, shutdown: CancellationToken) {
        loop {
            tokio::select! {
                () = shutdown.cancelled() => break,
                (stream, remote) = accept_with_backoff(|| self.listener.accept()) => {
                    debug!(remote = %remote, "Accepted peer connection");
                    let handler = Arc::clone(&handler);
                    let shutdown = shutdown.child_token();
                    tokio::spawn(async move {
                        tokio::select! {
                            () = shutdown.cancelled() => {}
                            result = handle_connection(stream, handler.as_ref()) => {
                                if let Err(e) = result {
                                    warn!(remote = %remote, error = %e, "Peer connection closed");
                                }
                            }
                        }
                    });
                }
            }
        }
        info!("Server stopped");
    }
}

/// Pause after a failed `accept`, so a lasting failure such as running out
/// of file descriptors does not spin.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Retries `accept` until it yields a connection.
async fn accept_with_backoff<F, Fut, T>(mut accept: F) -> T
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::io::Result<T>>,
{
    loop {
        match accept().await {
            Ok(accepted) => return accepted,
            Err(e) => {
                error!(error = %e, "Accept failed");
                tokio::time::sleep(ACCEPT_BACKOFF).await;
            }
        }
    }
}

/// Answers requests on one connection until the peer hangs up.
async fn handle_connection(mut stream: TcpStream, handler: &dyn QueryHandler) -> Result<()> {
    stream.set_nodelay(true)?;
    while let Some(request) = read_request(&mut stream).await? {
        let response = handler.respond(request)?;
        write_frame(&mut stream, &response.encode()).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::P2pError;
    use snowball_protocol::{read_response, Request, Response};
    use snowball_types::{Index, Transaction};
    use std::net::{IpAddr, Ipv4Addr};
    use std::sync::atomic::{AtomicBool, Ordering};

    struct Fixed {
        values: Vec<i64>,
        done: AtomicBool,
    }

    impl QueryHandler for Fixed {
        fn answer(&self, ix: Index) -> Result<Transaction> {
            self.values
                .get(ix as usize)
                .copied()
                .map(Transaction::new)
                .ok_or_else(|| P2pError::Handler(format!("index {ix} out of range")))
        }

        fn is_done(&self) -> bool {
            self.done.load(Ordering::SeqCst)
        }
    }

    async fn start(handler: Arc<Fixed>) -> (SocketAddr, CancellationToken, JoinHandle<()>) {
        let server = Server::bind(SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0))
            .await
            .unwrap();
        let addr = server.local_addr().unwrap();
        let token = CancellationToken::new();
        let handle = server.spawn(handler, token.clone());
        (addr, token, handle)
    }

    async fn send(stream: &mut TcpStream, request: Request) -> Response {
        write_frame(stream, &request.encode().unwrap()).await.unwrap();
        read_response(stream).await.unwrap()
    }

    #[tokio::test]
    async fn answers_queries_and_probes_on_one_connection() {
        let handler = Arc::new(Fixed {
            values: vec![7, 8, 9],
            done: AtomicBool::new(false),
        });
        let (addr, token, handle) = start(Arc::clone(&handler)).await;
        let mut stream = TcpStream::connect(addr).await.unwrap();

        assert_eq!(send(&mut stream, Request::Query(0)).await.value(), 7);
        assert_eq!(send(&mut stream, Request::Query(2)).await.value(), 9);
        assert!(!send(&mut stream, Request::Probe).await.is_done());

        handler.done.store(true, Ordering::SeqCst);
        assert!(send(&mut stream, Request::Probe).await.is_done());

        token.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn handler_error_closes_the_connection() {
        let handler = Arc::new(Fixed {
            values: vec![1],
            done: AtomicBool::new(false),
        });
        let (addr, token, _handle) = start(handler).await;
        let mut stream = TcpStream::connect(addr).await.unwrap();

        write_frame(&mut stream, &Request::Query(5).encode().unwrap())
            .await
            .unwrap();
        assert!(read_response(&mut stream).await.is_err());

        token.cancel();
    }

    #[tokio::test]
    async fn cancelled_server_refuses_connections() {
        let handler = Arc::new(Fixed {
            values: vec![],
            done: AtomicBool::new(true),
        });
        let (addr, token, handle) = start(handler).await;
        token.cancel();
        handle.await.unwrap();

        assert!(TcpStream::connect(addr).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_accepts_back_off() {
        let mut failures = 3;
        let start = tokio::time::Instant::now();

        let accepted = accept_with_backoff(|| {
            let result = if failures > 0 {
                failures -= 1;
                Err(std::io::Error::other("too many open files"))
            } else {
                Ok(7)
            };
            async move { result }
        })
        .await;

        assert_eq!(accepted, 7);
        assert_eq!(failures, 0);
        assert!(start.elapsed() >= ACCEPT_BACKOFF * 3);
    }
}
