//! End-to-end cluster tests over localhost TCP.
//!
//! Starts several full nodes on a private port range and checks that they
//! decide identical sequences, write them to disk, and shut down together.

use futures::future::join_all;
use snowball_node::{Node, NodeConfig};
use snowball_protocol::{read_response, write_frame, Request};
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;
use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tokio_util::sync::CancellationToken;

const MIN_PORT: u16 = 47310;
const NODES: u16 = 4;

fn config(port: u16, seed: u64, folder: &std::path::Path) -> NodeConfig {
    NodeConfig {
        port,
        min_port: MIN_PORT,
        max_port: MIN_PORT + NODES,
        folder: folder.to_path_buf(),
        run_name: Some("cluster".into()),
        n: 3,
        k: 3,
        alpha: 2,
        beta: 3,
        seed: Some(seed),
        dial_timeout_ms: 200,
        io_timeout_ms: 1_000,
        round_delay_ms: 10,
        poll_interval_ms: 20,
        shutdown_timeout_ms: 10_000,
        ..NodeConfig::default()
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn tcp_cluster_decides_identical_sequences() {
    let dir = tempfile::tempdir().unwrap();

    // Three nodes share a seed, so their initial preferences agree.
    let mut nodes = Vec::new();
    for i in 0..NODES {
        let seed = if i == NODES - 1 { 99 } else { 7 };
        let node = Node::start(config(MIN_PORT + i, seed, dir.path()))
            .await
            .unwrap();
        nodes.push(node);
    }

    let cancel = CancellationToken::new();
    let runs = nodes.into_iter().map(|node| node.run(cancel.clone()));
    let reports = tokio::time::timeout(Duration::from_secs(60), join_all(runs))
        .await
        .expect("cluster stalled");

    let reports: Vec<_> = reports.into_iter().map(Result::unwrap).collect();
    let first = &reports[0].decided;
    assert_eq!(first.len(), 3);

    for (i, report) in reports.iter().enumerate() {
        assert_eq!(&report.decided, first, "node {i} diverged");
        assert!(report.sweep.is_complete());

        let port = MIN_PORT + i as u16;
        assert_eq!(
            report.output,
            dir.path().join("cluster").join(format!("{port}.txt"))
        );
        let written = std::fs::read_to_string(&report.output).unwrap();
        let expected: Vec<String> = first.iter().map(|tx| tx.value().to_string()).collect();
        assert_eq!(written, format!("{}\n", expected.join(" ")));
    }
}

#[tokio::test]
async fn invalid_config_is_rejected_before_binding() {
    let dir = tempfile::tempdir().unwrap();
    let config = NodeConfig {
        alpha: 9,
        ..config(MIN_PORT + 20, 1, dir.path())
    };
    assert!(matches!(
        Node::start(config).await,
        Err(snowball_node::NodeError::Config(_))
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cancellation_stops_a_lonely_node() {
    let dir = tempfile::tempdir().unwrap();
    let config = NodeConfig {
        port: MIN_PORT + 30,
        min_port: MIN_PORT + 30,
        max_port: MIN_PORT + 32,
        ..config(MIN_PORT + 30, 1, dir.path())
    };
    let node = Node::start(config).await.unwrap();
    let output = node.output();

    let cancel = CancellationToken::new();
    let run = tokio::spawn(node.run(cancel.clone()));
    tokio::time::sleep(Duration::from_millis(200)).await;
    cancel.cancel();

    let result = run.await.unwrap();
    assert!(matches!(result, Err(snowball_node::NodeError::Consensus(_))));
    assert!(!output.exists());
}

/// Binds `port` with a full accept queue, so dials to it hang.
async fn stalled_listener(port: u16) -> (TcpListener, Vec<TcpStream>) {
    let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
    let socket = TcpSocket::new_v4().unwrap();
    socket.bind(addr).unwrap();
    let listener = socket.listen(1).unwrap();

    let mut queued = Vec::new();
    while queued.len() < 64 {
        match tokio::time::timeout(Duration::from_millis(100), TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => queued.push(stream),
            _ => break,
        }
    }
    (listener, queued)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn answers_peers_while_dialing() {
    let dir = tempfile::tempdir().unwrap();
    let port = MIN_PORT + 40;
    let _stalled = stalled_listener(port + 1).await;

    let config = NodeConfig {
        min_port: port,
        max_port: port + 2,
        dial_timeout_ms: 3_000,
        ..config(port, 5, dir.path())
    };
    let starting = tokio::spawn(Node::start(config));

    let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
    let mut stream = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match TcpStream::connect(addr).await {
                Ok(stream) => break stream,
                Err(_) => tokio::time::sleep(Duration::from_millis(10)).await,
            }
        }
    })
    .await
    .expect("node never bound its port");
    write_frame(&mut stream, &Request::Query(0).encode().unwrap())
        .await
        .unwrap();
    let answered = tokio::time::timeout(Duration::from_secs(1), read_response(&mut stream)).await;
    assert!(answered.expect("listener silent while dialing").is_ok());

    let node = starting.await.unwrap().unwrap();
    assert_eq!(node.local_addr(), addr);
}
