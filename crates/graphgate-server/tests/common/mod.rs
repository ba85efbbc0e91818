//! A live gateway on a loopback port, backed by scripted doubles.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use reqwest::{Client, RequestBuilder};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use graphgate_llm::MockBackend;
use graphgate_mcp::MockInvoker;
use graphgate_server::{Server, ServerConfig};

pub struct TestServer {
    addr: SocketAddr,
    client: Client,
    /// Shared with the server, so tests can inspect recorded calls.
    pub invoker: Arc<MockInvoker>,
    pub llm: Arc<MockBackend>,
    _task: JoinHandle<()>,
}

impl TestServer {
    /// The listener is bound before this returns, so requests can be sent
    /// immediately; they queue until the accept loop picks them up.
    pub async fn start(invoker: MockInvoker, llm: MockBackend) -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let invoker = Arc::new(invoker);
        let llm = Arc::new(llm);

        let config = ServerConfig::new()
            .with_bind_address(addr)
            .with_request_logging(false);
        let server = Server::new(invoker.clone(), llm.clone(), config);
        let task = tokio::spawn(async move {
            server.serve(listener, std::future::pending()).await.ok();
        });

        Ok(Self {
            addr,
            client: Client::new(),
            invoker,
            llm,
            _task: task,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn get(&self, path: &str) -> RequestBuilder {
        self.client.get(self.url(path))
    }

    pub fn post(&self, path: &str) -> RequestBuilder {
        self.client.post(self.url(path))
    }
}
