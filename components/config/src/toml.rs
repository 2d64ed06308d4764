use std::fs::File;
use std::io::{BufReader, Read};

use crate::{
    BitcoindConfig, Config, IngestionConfig, PgDatabaseConfig, ResourcesConfig, StorageConfig,
    DEFAULT_BITCOIND_RPC_THREADS, DEFAULT_BITCOIND_RPC_TIMEOUT, DEFAULT_MEMORY_AVAILABLE,
    DEFAULT_QUEUE_MAX_DEPTH, DEFAULT_ULIMIT, DEFAULT_WORKING_DIR,
};

#[derive(Deserialize, Clone, Debug)]
pub struct PgDatabaseConfigToml {
    pub database: String,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: Option<String>,
    pub search_path: Option<String>,
    pub pool_max_size: Option<usize>,
}

impl PgDatabaseConfigToml {
    fn to_config(self) -> PgDatabaseConfig {
        PgDatabaseConfig {
            dbname: self.database,
            host: self.host,
            port: self.port,
            user: self.username,
            password: self.password,
            search_path: self.search_path,
            pool_max_size: self.pool_max_size,
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct StorageConfigToml {
    pub working_dir: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct IngestionConfigToml {
    pub queue_max_depth: Option<usize>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ResourcesConfigToml {
    pub ulimit: Option<usize>,
    pub cpu_core_available: Option<usize>,
    pub memory_available: Option<usize>,
    pub bitcoind_rpc_threads: Option<usize>,
    pub bitcoind_rpc_timeout: Option<u32>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct BitcoindConfigToml {
    pub rpc_url: String,
    pub rpc_username: String,
    pub rpc_password: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ConfigToml {
    pub storage: StorageConfigToml,
    pub brc20_db: PgDatabaseConfigToml,
    pub ingestion: Option<IngestionConfigToml>,
    pub bitcoind: BitcoindConfigToml,
    pub resources: ResourcesConfigToml,
}

impl ConfigToml {
    pub fn config_from_file_path(file_path: &str) -> Result<Config, String> {
        let file = File::open(file_path)
            .map_err(|e| format!("unable to read file {}\n{:?}", file_path, e))?;
        let mut file_reader = BufReader::new(file);
        let mut file_buffer = vec![];
        file_reader
            .read_to_end(&mut file_buffer)
            .map_err(|e| format!("unable to read file {}\n{:?}", file_path, e))?;

        let config_file: ConfigToml = match toml::from_slice(&file_buffer) {
            Ok(s) => s,
            Err(e) => {
                return Err(format!("Config file malformatted {}", e));
            }
        };
        ConfigToml::config_from_toml(config_file)
    }

    fn config_from_toml(toml: ConfigToml) -> Result<Config, String> {
        let ingestion = match toml.ingestion {
            Some(ingestion) => IngestionConfig {
                queue_max_depth: ingestion.queue_max_depth.unwrap_or(DEFAULT_QUEUE_MAX_DEPTH),
            },
            None => IngestionConfig {
                queue_max_depth: DEFAULT_QUEUE_MAX_DEPTH,
            },
        };
        let config = Config {
            storage: StorageConfig {
                working_dir: toml
                    .storage
                    .working_dir
                    .unwrap_or(DEFAULT_WORKING_DIR.into()),
            },
            brc20_db: toml.brc20_db.to_config(),
            ingestion,
            resources: ResourcesConfig {
                ulimit: toml.resources.ulimit.unwrap_or(DEFAULT_ULIMIT),
                cpu_core_available: toml.resources.cpu_core_available.unwrap_or(num_cpus::get()),
                memory_available: toml
                    .resources
                    .memory_available
                    .unwrap_or(DEFAULT_MEMORY_AVAILABLE),
                bitcoind_rpc_threads: toml
                    .resources
                    .bitcoind_rpc_threads
                    .unwrap_or(DEFAULT_BITCOIND_RPC_THREADS),
                bitcoind_rpc_timeout: toml
                    .resources
                    .bitcoind_rpc_timeout
                    .unwrap_or(DEFAULT_BITCOIND_RPC_TIMEOUT),
            },
            bitcoind: BitcoindConfig {
                rpc_url: toml.bitcoind.rpc_url.to_string(),
                rpc_username: toml.bitcoind.rpc_username.to_string(),
                rpc_password: toml.bitcoind.rpc_password.to_string(),
            },
        };
        Ok(config)
    }
}
