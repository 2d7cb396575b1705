mod support;

use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio_tungstenite::tungstenite::Message;
use tracker_server::ServerSettings;
use tracker_server::use_cases::SelfDelivery;

#[tokio::test]
async fn published_update_reaches_every_client_exactly_once() {
    let server = support::spawn_server(ServerSettings::default()).await;
    let mut a = support::connect_registered(&server.ws_url).await;
    let mut b = support::connect_registered(&server.ws_url).await;
    let mut c = support::connect_registered(&server.ws_url).await;

    let payload = support::position_json("X1", 1.0, 2.0, "R1");
    support::send_text(&mut a, &payload).await;

    for ws in [&mut a, &mut b, &mut c] {
        let frames = support::collect_for(ws, Duration::from_millis(400)).await;
        let copies = frames.iter().filter(|f| **f == payload).count();
        assert_eq!(copies, 1, "frames: {frames:?}");
    }

    server.stop().await;
}

#[tokio::test]
async fn payload_is_relayed_byte_for_byte() {
    let server = support::spawn_server(ServerSettings::default()).await;
    let mut publisher = support::connect_registered(&server.ws_url).await;
    let mut watcher = support::connect_registered(&server.ws_url).await;

    // Odd spacing and key order must survive untouched; the relay never re-encodes.
    let payload = r#"{ "route":"R9",  "lon":77.5, "lat":12.9,"bus_id":"raw-1" }"#;
    support::send_text(&mut publisher, payload).await;

    support::wait_for(&mut watcher, payload).await;
    server.stop().await;
}

#[tokio::test]
async fn excluded_origin_does_not_get_its_own_update() {
    let settings = ServerSettings {
        self_delivery: SelfDelivery::ExcludeOrigin,
        ..ServerSettings::default()
    };
    let server = support::spawn_server(settings).await;
    let mut watcher = support::connect(&server.ws_url).await;
    let mut publisher = support::connect(&server.ws_url).await;

    // Send markers until the watcher sees the publisher: both are registered from then on.
    let marker = format!("marker-{}", uuid::Uuid::new_v4());
    let mut seen = false;
    for _ in 0..50 {
        support::send_text(&mut publisher, &marker).await;
        if support::next_text(&mut watcher, Duration::from_millis(100)).await.as_deref()
            == Some(marker.as_str())
        {
            seen = true;
            break;
        }
    }
    assert!(seen, "watcher never saw the publisher");

    let payload = support::position_json("X2", 3.0, 4.0, "R2");
    support::send_text(&mut publisher, &payload).await;

    support::wait_for(&mut watcher, &payload).await;
    let echoed = support::collect_for(&mut publisher, Duration::from_millis(300)).await;
    assert!(echoed.is_empty(), "publisher got: {echoed:?}");

    server.stop().await;
}

#[tokio::test]
async fn departed_client_does_not_disturb_remaining_ones() {
    let server = support::spawn_server(ServerSettings::default()).await;
    let mut a = support::connect_registered(&server.ws_url).await;
    let mut gone = support::connect_registered(&server.ws_url).await;
    let mut c = support::connect_registered(&server.ws_url).await;

    gone.close(None).await.expect("close");
    drop(gone);

    let payload = support::position_json("X3", 5.0, 6.0, "R3");
    support::send_text(&mut c, &payload).await;

    support::wait_for(&mut a, &payload).await;
    support::wait_for(&mut c, &payload).await;
    server.stop().await;
}

#[tokio::test]
async fn binary_frames_close_the_connection_as_unsupported() {
    let server = support::spawn_server(ServerSettings::default()).await;
    let mut ws = support::connect_registered(&server.ws_url).await;

    ws.send(Message::binary(vec![1u8, 2, 3]))
        .await
        .expect("send binary");

    let code = loop {
        let next = tokio::time::timeout(support::WAIT, ws.next())
            .await
            .expect("close frame timed out");
        match next {
            Some(Ok(Message::Close(Some(frame)))) => break u16::from(frame.code),
            Some(Ok(_)) => continue,
            other => panic!("expected close frame, got {other:?}"),
        }
    };
    assert_eq!(code, 1003);

    server.stop().await;
}
