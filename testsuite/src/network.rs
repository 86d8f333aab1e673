//! Loopback TCP echo network built by the example tests' setup routines.
//!
//! Each node is a listener on `127.0.0.1:0` with its own accept loop. Every
//! accepted connection is echoed line by line until the peer closes it.
//! Dropping the [`EchoNetwork`] aborts every node task.

use std::net::SocketAddr;

use testbed_core::error::TestError;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, warn};

/// A running set of echo nodes.
#[derive(Debug)]
pub struct EchoNetwork {
    addrs: Vec<SocketAddr>,
    tasks: Vec<JoinHandle<()>>,
}

impl EchoNetwork {
    /// Binds `node_count` echo nodes on loopback.
    pub async fn start(node_count: usize) -> Result<Self, TestError> {
        if node_count == 0 {
            return Err(TestError::failed("echo network needs at least one node"));
        }

        let mut addrs = Vec::with_capacity(node_count);
        let mut tasks = Vec::with_capacity(node_count);
        for index in 0..node_count {
            let listener = TcpListener::bind("127.0.0.1:0").await?;
            let addr = listener.local_addr()?;
            debug!(node = index, %addr, "echo node listening");
            addrs.push(addr);
            tasks.push(tokio::spawn(accept_loop(index, listener)));
        }

        Ok(Self { addrs, tasks })
    }

    pub fn node_count(&self) -> usize {
        self.addrs.len()
    }

    pub fn addrs(&self) -> &[SocketAddr] {
        &self.addrs
    }

    /// Sends `message` to node `index` and returns the line it echoes back.
    pub async fn echo(&self, index: usize, message: &str) -> Result<String, TestError> {
        let addr = self
            .addrs
            .get(index)
            .ok_or_else(|| TestError::failed(format!("no echo node {index}")))?;

        let stream = TcpStream::connect(addr).await?;
        let (read_half, mut write_half) = stream.into_split();
        write_half.write_all(message.as_bytes()).await?;
        write_half.write_all(b"\n").await?;
        write_half.shutdown().await?;

        let mut reader = BufReader::new(read_half);
        let mut line = String::new();
        reader.read_line(&mut line).await?;
        Ok(line.trim_end_matches('\n').to_owned())
    }
}

impl Drop for EchoNetwork {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

/// Accepts until aborted. Connection tasks live in a `JoinSet` owned by the
/// loop so they are aborted together with it.
async fn accept_loop(index: usize, listener: TcpListener) {
    let mut connections = JoinSet::new();
    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    debug!(node = index, %peer, "echo connection accepted");
                    connections.spawn(echo_connection(index, stream));
                }
                Err(e) => {
                    warn!(node = index, error = %e, "echo node accept failed");
                    return;
                }
            },
            Some(_) = connections.join_next(), if !connections.is_empty() => {}
        }
    }
}

async fn echo_connection(index: usize, stream: TcpStream) {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);
    let mut line = String::new();

    loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) => break,
            Ok(_) => {
                if let Err(e) = write_half.write_all(line.as_bytes()).await {
                    debug!(node = index, error = %e, "echo write failed");
                    break;
                }
            }
            Err(e) => {
                debug!(node = index, error = %e, "echo read failed");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn every_node_echoes() {
        let network = EchoNetwork::start(3).await.unwrap();
        assert_eq!(network.node_count(), 3);
        for i in 0..3 {
            assert_eq!(network.echo(i, "ping").await.unwrap(), "ping");
        }
    }

    #[tokio::test]
    async fn nodes_listen_on_distinct_ports() {
        let network = EchoNetwork::start(4).await.unwrap();
        let mut ports: Vec<u16> = network.addrs().iter().map(SocketAddr::port).collect();
        ports.sort_unstable();
        ports.dedup();
        assert_eq!(ports.len(), 4);
    }

    #[tokio::test]
    async fn zero_nodes_is_an_error() {
        let err = EchoNetwork::start(0).await.unwrap_err();
        assert!(matches!(err, TestError::Failed(_)));
    }

    #[tokio::test]
    async fn unknown_node_is_an_error() {
        let network = EchoNetwork::start(1).await.unwrap();
        let err = network.echo(5, "ping").await.unwrap_err();
        assert!(err.to_string().contains("no echo node 5"));
    }

    #[tokio::test]
    async fn dropping_the_network_stops_its_nodes() {
        let network = EchoNetwork::start(1).await.unwrap();
        let addr = network.addrs()[0];
        drop(network);

        // Abort is asynchronous; give the runtime a few turns to tear down.
        let mut refused = false;
        for _ in 0..50 {
            tokio::task::yield_now().await;
            if TcpStream::connect(addr).await.is_err() {
                refused = true;
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert!(refused, "echo node still accepting after drop");
    }
}
