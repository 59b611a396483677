//! Traffic driver for the job pool TCP server
//!
//! Usage:
//!     ./target/release/tcp-client [parallel|stream] [count] [addr]
//!
//! - `parallel`: `count` concurrent connections, one echo exchange each
//! - `stream`: one long-lived `SessionClient` sending `count` messages in turn
//!
//! Defaults: `parallel 10 127.0.0.1:9999`.

use std::io::{Read, Write};
use std::net::TcpStream;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use jobpool::{EchoHandler, PoolConfig, SessionClient};

const USAGE: &str = "usage: tcp-client [parallel|stream] [count] [addr]";
const TIMEOUT: Duration = Duration::from_secs(10);

fn exchange(addr: &str, message: &str) -> std::io::Result<bool> {
    let mut stream = TcpStream::connect(addr)?;
    stream.set_read_timeout(Some(TIMEOUT))?;
    stream.write_all(message.as_bytes())?;

    let expected = format!("{}{}", EchoHandler::DEFAULT_PREFIX, message);
    let mut reply = vec![0u8; expected.len()];
    stream.read_exact(&mut reply)?;
    Ok(reply == expected.as_bytes())
}

fn parallel(addr: &str, count: usize) -> usize {
    let handles: Vec<_> = (0..count)
        .map(|i| {
            let addr = addr.to_string();
            thread::spawn(move || exchange(&addr, &format!("message {}", i)))
        })
        .collect();

    let mut failed = 0;
    for (i, handle) in handles.into_iter().enumerate() {
        match handle.join() {
            Ok(Ok(true)) => {}
            Ok(Ok(false)) => {
                eprintln!("client {}: wrong reply", i);
                failed += 1;
            }
            Ok(Err(e)) => {
                eprintln!("client {}: {}", i, e);
                failed += 1;
            }
            Err(_) => failed += 1,
        }
    }
    failed
}

fn stream(addr: &str, count: usize) -> usize {
    let received = Arc::new(Mutex::new(Vec::<u8>::new()));
    let sink = Arc::clone(&received);
    let client = match SessionClient::connect(addr, PoolConfig::new().worker_pairs(1).lane_name("client"), move |bytes: &[u8]| {
        sink.lock().unwrap_or_else(|e| e.into_inner()).extend_from_slice(bytes);
    }) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            eprintln!("{}", e);
            return count;
        }
    };

    let runner = {
        let client = Arc::clone(&client);
        thread::spawn(move || client.run())
    };

    let mut failed = 0;
    for i in 0..count {
        let message = format!("message {}", i);
        let expected = format!("{}{}", EchoHandler::DEFAULT_PREFIX, message).into_bytes();
        client.send(message);

        let deadline = Instant::now() + TIMEOUT;
        loop {
            let mut got = received.lock().unwrap_or_else(|e| e.into_inner());
            if got.len() >= expected.len() {
                if got[..expected.len()] != expected[..] {
                    failed += 1;
                }
                got.drain(..expected.len());
                break;
            }
            drop(got);
            if Instant::now() > deadline || !client.is_connected() {
                eprintln!("message {}: no reply", i);
                failed += 1;
                break;
            }
            thread::sleep(Duration::from_millis(1));
        }
    }

    client.close();
    if let Ok(Err(e)) = runner.join() {
        eprintln!("client pool: {}", e);
    }
    failed
}

fn main() -> ExitCode {
    jobpool::init_logging();

    let args: Vec<String> = std::env::args().collect();
    let mode = args.get(1).map(String::as_str).unwrap_or("parallel");
    let count: usize = match args.get(2).map(|s| s.parse()) {
        None => 10,
        Some(Ok(n)) => n,
        Some(Err(_)) => {
            eprintln!("{}", USAGE);
            return ExitCode::from(2);
        }
    };
    let addr = args.get(3).map(String::as_str).unwrap_or("127.0.0.1:9999");

    let start = Instant::now();
    let failed = match mode {
        "parallel" => parallel(addr, count),
        "stream" => stream(addr, count),
        _ => {
            eprintln!("{}", USAGE);
            return ExitCode::from(2);
        }
    };

    println!(
        "{}: {} ok, {} failed in {:.1?}",
        mode,
        count - failed,
        failed,
        start.elapsed()
    );
    if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
