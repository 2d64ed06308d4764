use std::path::PathBuf;

use crate::toml::ConfigToml;

pub const DEFAULT_WORKING_DIR: &str = "data";
pub const DEFAULT_ULIMIT: usize = 2048;
pub const DEFAULT_MEMORY_AVAILABLE: usize = 8;
pub const DEFAULT_BITCOIND_RPC_THREADS: usize = 4;
pub const DEFAULT_BITCOIND_RPC_TIMEOUT: u32 = 15;
pub const DEFAULT_QUEUE_MAX_DEPTH: usize = 10;

#[derive(Clone, Debug)]
pub struct Config {
    pub bitcoind: BitcoindConfig,
    pub storage: StorageConfig,
    pub brc20_db: PgDatabaseConfig,
    pub ingestion: IngestionConfig,
    pub resources: ResourcesConfig,
}

#[derive(Clone, Debug)]
pub struct BitcoindConfig {
    pub rpc_url: String,
    pub rpc_username: String,
    pub rpc_password: String,
}

/// A Postgres configuration for a single database.
#[derive(Clone, Debug)]
pub struct PgDatabaseConfig {
    pub dbname: String,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Option<String>,
    pub search_path: Option<String>,
    pub pool_max_size: Option<usize>,
}

#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub working_dir: String,
}

#[derive(Clone, Debug)]
pub struct IngestionConfig {
    pub queue_max_depth: usize,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ResourcesConfig {
    pub ulimit: usize,
    pub cpu_core_available: usize,
    pub memory_available: usize,
    pub bitcoind_rpc_threads: usize,
    pub bitcoind_rpc_timeout: u32,
}

impl ResourcesConfig {
    pub fn get_optimal_thread_pool_capacity(&self) -> usize {
        // Generally speaking when dealing a pool, we need one thread for
        // feeding the thread pool and eventually another thread for
        // handling the "reduce" step.
        self.cpu_core_available.saturating_sub(2).max(1)
    }
}

impl Config {
    pub fn from_file_path(file_path: &str) -> Result<Config, String> {
        ConfigToml::config_from_file_path(file_path)
    }

    pub fn expected_cache_path(&self) -> PathBuf {
        let mut destination_path = PathBuf::new();
        destination_path.push(&self.storage.working_dir);
        destination_path
    }

    pub fn devnet_default() -> Config {
        Config {
            storage: StorageConfig {
                working_dir: default_cache_path(),
            },
            resources: ResourcesConfig {
                cpu_core_available: num_cpus::get(),
                memory_available: DEFAULT_MEMORY_AVAILABLE,
                ulimit: DEFAULT_ULIMIT,
                bitcoind_rpc_threads: DEFAULT_BITCOIND_RPC_THREADS,
                bitcoind_rpc_timeout: DEFAULT_BITCOIND_RPC_TIMEOUT,
            },
            bitcoind: BitcoindConfig {
                rpc_url: "http://0.0.0.0:18443".into(),
                rpc_username: "devnet".into(),
                rpc_password: "devnet".into(),
            },
            brc20_db: PgDatabaseConfig {
                dbname: "brc20".to_string(),
                host: "localhost".to_string(),
                port: 5432,
                user: "postgres".to_string(),
                password: Some("postgres".to_string()),
                search_path: None,
                pool_max_size: None,
            },
            ingestion: IngestionConfig {
                queue_max_depth: DEFAULT_QUEUE_MAX_DEPTH,
            },
        }
    }

    pub fn testnet_default() -> Config {
        Config::devnet_default()
    }

    pub fn mainnet_default() -> Config {
        let mut default = Config::devnet_default();
        default.bitcoind.rpc_url = "http://localhost:8332".into();
        default
    }

    // TODO: Move this to a shared test utils component
    pub fn test_default() -> Config {
        let mut config = Self::mainnet_default();
        config.storage.working_dir = "tmp".to_string();
        config.resources.bitcoind_rpc_threads = 1;
        config.resources.cpu_core_available = 1;
        config
    }
}

pub fn default_cache_path() -> String {
    let mut cache_path = std::env::current_dir().expect("unable to get current dir");
    cache_path.push("data");
    format!("{}", cache_path.display())
}
