//! In-process test harness: spins up a registry, a lease manager and a
//! storage node on ephemeral loopback ports, wired together exactly as the
//! three real binaries are, so scenario tests drive the coordination
//! protocol through its real HTTP surface instead of calling library
//! functions directly.

use std::collections::BTreeSet;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use dfsx_client::config::ClientConfig;
use dfsx_lease::api::LeaseApi;
use dfsx_lease::lease::LeaseManager;
use dfsx_lease::store::MemoryLeaseStore;
use dfsx_registry::api::RegistryApi;
use dfsx_registry::directory::DirectoryRegistry;
use dfsx_registry::store::MemoryRegistryStore;
use dfsx_storage::api::StorageApi;
use dfsx_storage::node::StorageNode;
use tempfile::TempDir;
use tokio::net::TcpListener;

/// A running registry + lease manager + storage node, each on its own
/// ephemeral loopback port, plus the storage node's backing temp directory.
pub struct Cluster {
    pub registry_addr: SocketAddr,
    pub lease_addr: SocketAddr,
    pub storage_addr: SocketAddr,
    /// Kept alive for the cluster's lifetime; the storage node serves files under here.
    pub storage_dir: TempDir,
}

async fn bind_ephemeral() -> (TcpListener, SocketAddr) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind ephemeral port");
    let addr = listener.local_addr().expect("listener has a local addr");
    (listener, addr)
}

impl Cluster {
    /// Starts a registry, lease manager, and a storage node serving `served_dir`
    /// (e.g. `"/d"`), registering the node with the registry before returning.
    pub async fn start(served_dir: &str) -> Self {
        let (registry_listener, registry_addr) = bind_ephemeral().await;
        let registry = Arc::new(DirectoryRegistry::new(Arc::new(MemoryRegistryStore::new())));
        let registry_api = RegistryApi::new(registry);
        tokio::spawn(async move {
            axum::serve(registry_listener, registry_api.router().into_make_service())
                .await
                .expect("registry server");
        });

        let (lease_listener, lease_addr) = bind_ephemeral().await;
        let lease_manager = Arc::new(LeaseManager::new(
            Arc::new(MemoryLeaseStore::new()),
            Duration::from_secs(2),
        ));
        let lease_api = LeaseApi::new(lease_manager);
        tokio::spawn(async move {
            axum::serve(lease_listener, lease_api.router().into_make_service())
                .await
                .expect("lease server");
        });

        let storage_dir = tempfile::tempdir().expect("storage temp dir");
        let mut directories = BTreeSet::new();
        directories.insert(served_dir.to_string());
        let storage_node = Arc::new(StorageNode::new(
            storage_dir.path().to_path_buf(),
            directories,
            format!("http://{lease_addr}"),
        ));

        let srv = {
            let (listener, addr) = bind_ephemeral().await;
            let nameserver = format!("http://{registry_addr}");
            storage_node
                .register_with_registry(&nameserver, &addr.to_string())
                .await
                .expect("register storage node with registry");
            let storage_api = StorageApi::new(storage_node);
            tokio::spawn(async move {
                axum::serve(listener, storage_api.router().into_make_service())
                    .await
                    .expect("storage server");
            });
            addr
        };

        // give the spawned servers a moment to start accepting connections
        tokio::time::sleep(Duration::from_millis(20)).await;

        Self {
            registry_addr,
            lease_addr,
            storage_addr: srv,
            storage_dir,
        }
    }

    /// Builds a [`ClientConfig`] pointed at this cluster's registry and lease manager.
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            nameserver: format!("http://{}", self.registry_addr),
            lockserver: format!("http://{}", self.lease_addr),
            max_size: 64 * 1024,
        }
    }

    /// The lease lifetime this cluster's lease manager was configured with.
    pub fn lease_lifetime() -> Duration {
        Duration::from_secs(2)
    }
}
