//! emojimatch CLI Client
//!
//! Interactive command-line client for the emojimatch server.

use clap::Parser;
use emojimatch::protocol::{Command, EmjCodec, Frame, Response};
use emojimatch::LabelFormat;
use futures::{SinkExt, StreamExt};
use std::io::{self, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::net::TcpStream;
use tokio_util::codec::Framed;

/// emojimatch CLI - Interactive Client
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Server host
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server port
    #[arg(short, long, default_value_t = 6390)]
    port: u16,
}

static REQUEST_ID: AtomicU64 = AtomicU64::new(1);

fn next_request_id() -> u64 {
    REQUEST_ID.fetch_add(1, Ordering::Relaxed)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let addr = format!("{}:{}", args.host, args.port);

    println!("Connecting to emojimatch at {}...", addr);

    let stream = TcpStream::connect(&addr).await?;
    let mut framed = Framed::new(stream, EmjCodec::new());

    println!("Connected! Type a word, 'help' for available commands, 'quit' to exit.\n");

    loop {
        print!("emojimatch> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        if input.eq_ignore_ascii_case("quit") || input.eq_ignore_ascii_case("exit") {
            println!("Goodbye!");
            break;
        }

        if input.eq_ignore_ascii_case("help") {
            print_help();
            continue;
        }

        match parse_command(input) {
            Ok(cmd) => {
                let (opcode, payload) = cmd.encode();
                let frame = Frame::new(opcode, next_request_id(), payload);

                framed.send(frame).await?;

                match framed.next().await {
                    Some(Ok(response_frame)) => {
                        let response = Response::from_frame(&response_frame)?;
                        println!("{}", response);
                    }
                    Some(Err(e)) => {
                        eprintln!("Error: {}", e);
                    }
                    None => {
                        eprintln!("Connection closed by server");
                        break;
                    }
                }
            }
            Err(e) => {
                eprintln!("Error: {}", e);
            }
        }
    }

    Ok(())
}

/// `PING`, `QUERY <word> [n] [--chars]`, or a bare word
fn parse_command(input: &str) -> anyhow::Result<Command> {
    let parts: Vec<&str> = input.split_whitespace().collect();

    if parts.is_empty() {
        anyhow::bail!("Empty command");
    }

    let cmd = parts[0].to_uppercase();

    match cmd.as_str() {
        "PING" if parts.len() == 1 => Ok(Command::Ping),

        "QUERY" => {
            if parts.len() < 2 {
                anyhow::bail!("QUERY requires a word: QUERY <word> [n] [--chars]");
            }
            parse_query(&parts[1..])
        }

        _ => parse_query(&parts),
    }
}

fn parse_query(parts: &[&str]) -> anyhow::Result<Command> {
    let word = parts[0].to_string();
    let mut count = 0;
    let mut format = LabelFormat::Name;

    for part in &parts[1..] {
        match *part {
            "--chars" | "-c" => format = LabelFormat::Char,
            n => {
                count = n
                    .parse::<u32>()
                    .map_err(|_| anyhow::anyhow!("Invalid count: {}", n))?;
            }
        }
    }

    Ok(Command::Query {
        word,
        count,
        format,
    })
}

fn print_help() {
    println!(
        r#"
Available commands:

  PING                       - Check server connectivity
  QUERY <word> [n] [--chars] - Up to n emoji for a word (server default if n is omitted)
  <word> [n] [--chars]       - Same as QUERY

  help                       - Show this help
  quit / exit                - Exit the CLI

Examples:
  QUERY happy 5
  pizza --chars
"#
    );
}
