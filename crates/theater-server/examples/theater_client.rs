use std::env;
use std::error::Error;
use std::time::Duration;

use theater_protocol::{decode, encode_raw, frame_length, to_printable, HEADER_SIZE};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout};

/// Scripted session: host a match, list it, tear it down.
const SCRIPT: &[(&str, &str)] = &[
    ("CONN", "PROT=2 PROD=\"demo\" VERS=1.0 PLAT=PSP"),
    ("USER", "NAME=\"demo\""),
    ("CGAM", "REGION-ID=1 NAME=\"Demo Match\" MAX-PLAYERS=8 HOST-PLAYER=\"demo\""),
    ("GLST", "TID=1 LOBBY-ID=1 FAV-GAME=Demo FAV-PLAYER=demo"),
    ("RGAM", ""),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Where to connect: env override or default.
    let addr = env::var("THEATER_CLIENT_ADDR").unwrap_or_else(|_| "127.0.0.1:14300".to_string());

    println!("Connecting to {}...", addr);
    let mut stream = TcpStream::connect(&addr).await?;
    println!("Connected.");

    for (action, body) in SCRIPT {
        let frame = encode_raw(action, body);
        println!(">> {}", to_printable(&frame));

        // One frame per write; the server does not reassemble.
        stream.write_all(&frame).await?;

        // Read back every reply that arrives shortly after.
        loop {
            let mut header = [0u8; HEADER_SIZE];
            match timeout(Duration::from_millis(200), stream.read_exact(&mut header)).await {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => {
                    eprintln!("Read error (header): {:?}", e);
                    return Ok(());
                }
                // Nothing more for this request.
                Err(_) => break,
            }

            let Some(len) = frame_length(&header).filter(|&len| len > HEADER_SIZE) else {
                eprintln!("Bad frame header: {}", to_printable(&header));
                return Ok(());
            };

            let mut buf = header.to_vec();
            buf.resize(len, 0);
            if let Err(e) = stream.read_exact(&mut buf[HEADER_SIZE..]).await {
                eprintln!("Read error (body): {:?}", e);
                return Ok(());
            }

            match decode(&buf) {
                Ok(frame) => {
                    let pairs: Vec<String> = frame
                        .parameter
                        .iter()
                        .map(|(key, value)| format!("{}={}", key, value))
                        .collect();
                    println!("<< {} {}", frame.action, pairs.join(" "));
                }
                Err(e) => eprintln!("Decode error: {}", e),
            }
        }

        sleep(Duration::from_millis(50)).await;
    }

    println!("Done.");
    Ok(())
}
