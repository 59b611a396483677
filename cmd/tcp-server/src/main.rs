//! Job pool TCP server
//!
//! Accepts connections and bounces each session through a job pool,
//! answering with the echo handler or saving traffic with the file handler.
//!
//! Usage:
//!     ./target/release/tcp-server [echo|file] [port]
//!
//! Type `stop` on stdin to shut down. Pool and socket settings also come
//! from `JP_*` environment variables (see `ServerConfig::from_env`).
//!
//! Test with:
//!     echo "hello" | nc localhost 9999
//!     ./target/release/tcp-client parallel 100

use std::io::BufRead;
use std::process::ExitCode;
use std::sync::Arc;
use std::thread;

use jobpool::{
    kerror, kinfo, AcceptLoop, EchoHandler, FileHandler, NetResult, PerSessionFactory, Server,
    ServerConfig,
};

const USAGE: &str = "usage: tcp-server [echo|file] [port]";

fn build(mode: &str, config: ServerConfig) -> Option<NetResult<Server>> {
    match mode {
        "echo" => Some(Server::new(config, PerSessionFactory::<EchoHandler>::new())),
        "file" => Some(Server::new(config, PerSessionFactory::<FileHandler>::new())),
        _ => None,
    }
}

/// Reads stdin until `stop` (or end of input, which leaves the server running)
fn console(server: Arc<Server>) {
    for line in std::io::stdin().lock().lines() {
        let Ok(line) = line else { break };
        match line.trim() {
            "stop" => {
                server.stop();
                break;
            }
            "stats" => println!("{}", server.stats()),
            "" => {}
            other => println!("unknown command '{}' (stop, stats)", other),
        }
    }
}

fn main() -> ExitCode {
    jobpool::init_logging();

    let args: Vec<String> = std::env::args().collect();
    let mode = args.get(1).map(String::as_str).unwrap_or("echo");

    let mut config = ServerConfig::from_env();
    if let Some(arg) = args.get(2) {
        match arg.parse() {
            Ok(port) => config = config.port(port),
            Err(_) => {
                eprintln!("{}", USAGE);
                return ExitCode::from(2);
            }
        }
    }

    let server = match build(mode, config) {
        Some(Ok(server)) => Arc::new(server),
        Some(Err(e)) => {
            kerror!("failed to start: {}", e);
            return ExitCode::FAILURE;
        }
        None => {
            eprintln!("{}", USAGE);
            return ExitCode::from(2);
        }
    };

    println!(
        "{} server on {} with {} lane pairs. Type 'stop' to quit.",
        mode,
        server.local_addr(),
        server.config().pool.worker_pairs
    );

    {
        let server = Arc::clone(&server);
        if let Err(e) = thread::Builder::new().name("console".into()).spawn(move || console(server)) {
            kerror!("failed to spawn console: {}", e);
            return ExitCode::FAILURE;
        }
    }

    let result = server.start().and_then(AcceptLoop::join);
    kinfo!("final stats: {}", server.stats());

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            kerror!("server failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
