pub fn generate_toml_config(network: &str) -> String {
    let rpc_url = match network.to_lowercase().as_str() {
        "regtest" => "http://localhost:18443",
        "testnet" => "http://localhost:18332",
        _ => "http://localhost:8332",
    };
    format!(
        r#"[storage]
working_dir = "tmp"

[brc20_db]
database = "brc20"
host = "localhost"
port = 5432
username = "postgres"
password = "postgres"

[ingestion]
queue_max_depth = 10

[bitcoind]
rpc_url = "{rpc_url}"
rpc_username = "devnet"
rpc_password = "devnet"

[resources]
ulimit = 2048
cpu_core_available = 6
memory_available = 16
bitcoind_rpc_threads = 2
bitcoind_rpc_timeout = 15
"#,
    )
}
