// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! xhr-adapter CLI
//!
//! Sends one request through the adapter and prints the settled outcome.

use std::env;
use std::process::ExitCode;

use serde::Serialize;
use xhr_adapter::{
    Headers, HttpHandleConfig, Rejection, RequestConfig, Response, ResponseData, XhrAdapter,
};

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("xhr_adapter=info".parse().unwrap()),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        return ExitCode::from(1);
    }

    let request = match args[1].as_str() {
        "get" => {
            if args.len() < 3 {
                eprintln!("Usage: xhr-adapter get <url> [--timeout <ms>]");
                return ExitCode::from(1);
            }
            RequestConfig::get(&args[2])
        }
        "post" => {
            if args.len() < 4 {
                eprintln!("Usage: xhr-adapter post <url> <body> [--timeout <ms>]");
                return ExitCode::from(1);
            }
            RequestConfig::post(&args[2], args[3].clone())
                .header("Content-Type", "application/json")
        }
        "--help" | "-h" | "help" => {
            print_usage();
            return ExitCode::SUCCESS;
        }
        "--version" | "-v" | "version" => {
            println!("xhr-adapter {}", xhr_adapter::VERSION);
            return ExitCode::SUCCESS;
        }
        cmd => {
            eprintln!("Unknown command: {}", cmd);
            print_usage();
            return ExitCode::from(1);
        }
    };

    let request = match parse_options(request, &args[3..]) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::from(1);
        }
    };

    send(request).await
}

fn print_usage() {
    println!(
        r#"xhr-adapter - single-exchange HTTP transport adapter

USAGE:
    xhr-adapter <COMMAND> [OPTIONS]

COMMANDS:
    get <url>           Send a GET request
    post <url> <body>   Send a POST request with a JSON body
    help                Show this help message
    version             Show version information

OPTIONS:
    --timeout <ms>      Fail with a timeout after <ms> milliseconds
    --credentials       Send credentials cross-origin

EXAMPLES:
    xhr-adapter get https://example.com/api/items --timeout 2000
    xhr-adapter post https://example.com/api/items '{{"name":"x"}}'
"#
    );
}

fn parse_options(mut request: RequestConfig, args: &[String]) -> Result<RequestConfig, String> {
    let mut iter = args.iter().skip_while(|a| !a.starts_with("--"));
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--timeout" => {
                let value = iter.next().ok_or("--timeout needs a value")?;
                let ms = value
                    .parse()
                    .map_err(|_| format!("invalid timeout '{}'", value))?;
                request = request.timeout(ms);
            }
            "--credentials" => request = request.with_credentials(true),
            other => return Err(format!("Unknown option: {}", other)),
        }
    }
    Ok(request)
}

/// JSON view of a settled response
#[derive(Serialize)]
struct Summary<'a> {
    status: u16,
    status_text: &'a str,
    headers: &'a Headers,
    data: &'a ResponseData,
}

impl<'a> From<&'a Response> for Summary<'a> {
    fn from(response: &'a Response) -> Self {
        Self {
            status: response.status,
            status_text: &response.status_text,
            headers: &response.headers,
            data: &response.data,
        }
    }
}

async fn send(request: RequestConfig) -> ExitCode {
    let adapter = match XhrAdapter::http(HttpHandleConfig::default()) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Failed to create adapter: {}", e);
            return ExitCode::from(1);
        }
    };

    let pending = match adapter.execute(request) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Request not sent: {}", e);
            return ExitCode::from(1);
        }
    };

    match pending.await {
        Ok(response) => {
            print_summary(&response);
            ExitCode::SUCCESS
        }
        Err(Rejection::Classified(err)) => {
            eprintln!("{} ({})", err.message, err.kind);
            if let Some(code) = &err.code {
                eprintln!("  code: {}", code);
            }
            if let Some(response) = &err.response {
                print_summary(response);
            }
            ExitCode::from(2)
        }
        Err(Rejection::Cancelled(reason)) => {
            eprintln!("{}", reason);
            ExitCode::from(2)
        }
    }
}

fn print_summary(response: &Response) {
    match serde_json::to_string_pretty(&Summary::from(response)) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to render response: {}", e),
    }
}
