//! End-to-end theater sessions over real TCP.

use std::sync::Arc;
use std::time::Duration;

use theater_core::{MatchRegistry, Parameter, Region};
use theater_protocol::{decode_body, encode_raw, frame_length, HEADER_SIZE};
use theater_server::config::SettingsStore;
use theater_server::file_cache::FileCache;
use theater_server::listener::Listener;
use theater_server::theater::{TheaterContext, TheaterSession};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout};

struct Harness {
    listener: Arc<Listener<TheaterSession>>,
    matchmaker: Arc<MatchRegistry>,
}

async fn start() -> Harness {
    let matchmaker = Arc::new(MatchRegistry::new());
    let settings = Arc::new(SettingsStore::default());
    let context = Arc::new(TheaterContext::new(
        Arc::clone(&matchmaker),
        Arc::clone(&settings),
        Arc::new(FileCache::new()),
    ));

    let listener = Listener::<TheaterSession>::bind("127.0.0.1:0".parse().unwrap(), context, settings)
        .await
        .unwrap();

    let accept = Arc::clone(&listener);
    tokio::spawn(async move { accept.run().await });

    Harness {
        listener,
        matchmaker,
    }
}

async fn send(stream: &mut TcpStream, action: &str, body: &str) {
    stream.write_all(&encode_raw(action, body)).await.unwrap();
    // One request per server read.
    sleep(Duration::from_millis(20)).await;
}

async fn recv(stream: &mut TcpStream) -> (String, Parameter) {
    timeout(Duration::from_secs(2), async {
        let mut header = [0u8; HEADER_SIZE];
        stream.read_exact(&mut header).await.unwrap();
        let len = frame_length(&header).unwrap();

        let mut rest = vec![0u8; len - HEADER_SIZE];
        stream.read_exact(&mut rest).await.unwrap();
        assert_eq!(rest.last(), Some(&0));

        let action = String::from_utf8_lossy(&header[..4]).into_owned();
        let body = String::from_utf8_lossy(&rest[..rest.len() - 1]).into_owned();
        (action, decode_body(&body))
    })
    .await
    .expect("reply frame")
}

async fn wait_for(mut done: impl FnMut() -> bool) {
    timeout(Duration::from_secs(2), async {
        while !done() {
            sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition should hold");
}

#[tokio::test]
async fn host_list_and_remove_a_match() {
    let harness = start().await;
    let mut stream = TcpStream::connect(harness.listener.local_addr()).await.unwrap();

    send(&mut stream, "CONN", "PROT=2 PROD=\"mohh\"").await;
    for _ in 0..2 {
        let (action, conn) = recv(&mut stream).await;
        assert_eq!(action, "CONN");
        assert_eq!(conn.get("NUM-CHALLENGES"), Some("0"));
    }

    send(&mut stream, "USER", "NAME=\"alice\"").await;
    let (_, user) = recv(&mut stream).await;
    assert_eq!(user.get("TICKET"), Some("\"1111\""));

    send(
        &mut stream,
        "CGAM",
        "REGION-ID=1 NAME=\"Test\" MAX-PLAYERS=8 HOST-PLAYER=\"Alice\"",
    )
    .await;
    let (action, created) = recv(&mut stream).await;
    assert_eq!(action, "CGAM");
    assert_eq!(created.get("LOBBY-ID"), Some("1"));
    assert_eq!(created.get("GAME-ID"), Some("1"));
    let (action, quench) = recv(&mut stream).await;
    assert_eq!(action, "UGAM");
    assert_eq!(quench.get("QUENCH"), Some("20"));

    let games = harness.matchmaker.find_by_region(Region::Europe);
    assert_eq!(games.len(), 1);
    assert_eq!(games[0].ip, "127.0.0.1");
    assert_eq!(games[0].owner, stream.local_addr().unwrap().to_string());

    send(&mut stream, "GLST", "TID=2 LOBBY-ID=1").await;
    let (_, summary) = recv(&mut stream).await;
    assert_eq!(summary.get("NUM-GAMES"), Some("1"));
    let (action, game) = recv(&mut stream).await;
    assert_eq!(action, "GDAT");
    assert_eq!(game.get("IP"), Some("\"127.0.0.1\""));
    assert_eq!(game.get("NAME"), Some("\"Test\""));

    send(&mut stream, "RGAM", "").await;
    send(&mut stream, "GLST", "TID=3 LOBBY-ID=1").await;
    let (_, summary) = recv(&mut stream).await;
    assert_eq!(summary.get("NUM-GAMES"), Some("0"));
    assert!(harness.matchmaker.is_empty());
}

#[tokio::test]
async fn hangup_drops_the_hosts_match() {
    let harness = start().await;
    let mut host = TcpStream::connect(harness.listener.local_addr()).await.unwrap();
    let mut guest = TcpStream::connect(harness.listener.local_addr()).await.unwrap();

    send(
        &mut host,
        "CGAM",
        "REGION-ID=5 NAME=\"Asia Night\" MAX-PLAYERS=4 HOST-PLAYER=\"Kai\"",
    )
    .await;
    recv(&mut host).await;
    recv(&mut host).await;
    assert_eq!(harness.matchmaker.len(), 1);

    drop(host);
    let matchmaker = Arc::clone(&harness.matchmaker);
    wait_for(move || matchmaker.is_empty()).await;

    // The other session is untouched.
    send(&mut guest, "RLST", "TID=9").await;
    let (action, summary) = recv(&mut guest).await;
    assert_eq!(action, "RLST");
    assert_eq!(summary.get("NUM-REGIONS"), Some("8"));
    for _ in 0..8 {
        let (action, region) = recv(&mut guest).await;
        assert_eq!(action, "RDAT");
        assert_eq!(region.get("NUM-GAMES"), Some("0"));
    }
}

#[tokio::test]
async fn file_request_hangs_up() {
    let harness = start().await;
    let mut stream = TcpStream::connect(harness.listener.local_addr()).await.unwrap();

    send(&mut stream, "FILE", "TID=1 TYPE=moh3/tos/0_20753 ENCODING=TEXT").await;

    let mut rest = Vec::new();
    timeout(Duration::from_secs(2), stream.read_to_end(&mut rest))
        .await
        .expect("server should close")
        .unwrap();
    assert!(rest.is_empty());
}
