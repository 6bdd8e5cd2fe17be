//! Minimal ZooKeeper CLI: fetch a node's data or list its children.
//!
//! Run with: `cargo run --example zkcli -- [--server host:port] get <path>`
//! or `cargo run --example zkcli -- [--server host:port] list <path>`.

use std::process::ExitCode;

use tokio_util::sync::CancellationToken;
use zookeeper_client::{ClientConfig, ZkClient};

struct Args {
    server: String,
    command: String,
    path: String,
}

fn parse_args() -> Result<Args, String> {
    let mut server = "127.0.0.1:2181".to_string();
    let mut positional = Vec::new();

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--server" {
            server = args
                .next()
                .ok_or_else(|| "--server requires a host:port value".to_string())?;
        } else {
            positional.push(arg);
        }
    }

    match positional.as_slice() {
        [command, path] if command == "get" || command == "list" => Ok(Args {
            server,
            command: command.clone(),
            path: path.clone(),
        }),
        _ => Err("usage: zkcli [--server host:port] <get|list> <path>".to_string()),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(message) => {
            eprintln!("{}", message);
            return ExitCode::FAILURE;
        }
    };

    let config = match ClientConfig::builder().ensemble(&args.server).build() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{}", err);
            return ExitCode::FAILURE;
        }
    };
    let client = ZkClient::new(config);
    let cancel = CancellationToken::new();

    let result = match args.command.as_str() {
        "get" => client
            .get_data(&cancel, &args.path)
            .await
            .map(|data| println!("{}", String::from_utf8_lossy(&data))),
        _ => client.get_children(&cancel, &args.path).await.map(|children| {
            for child in children {
                println!("{}", child);
            }
        }),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}
