use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

use padlink_core::{ClientMessage, ControlMessage, RoomCode, ServerMessage, Signal};
use padlink_host::{
    HostCommand, HostConfig, HostSession, PeerLinkState, RelayClient, SharedCapture,
};
use padlink_server::ServerConfig;

use crate::integration::{eventually, init_tracing};
use crate::utils::{
    CONNECTION_TIMEOUT_MS, CountingCaptureSource, HostEvent, ICE_GATHERING_TIMEOUT_MS,
    SIGNAL_TIMEOUT_MS, TestClient, TestHostBehavior, wait_for_client_ready,
};

async fn start_relay() -> SocketAddr {
    let config = ServerConfig {
        bind: SocketAddr::from(([127, 0, 0, 1], 0)),
        ..ServerConfig::default()
    };
    let (addr, server) = padlink_server::bind(config, std::future::pending())
        .await
        .expect("Failed to bind relay");
    tokio::spawn(server);
    addr
}

async fn next_message(inbound: &mut mpsc::UnboundedReceiver<ServerMessage>) -> ServerMessage {
    tokio::time::timeout(Duration::from_millis(SIGNAL_TIMEOUT_MS), inbound.recv())
        .await
        .expect("Timeout waiting for relay message")
        .expect("Relay connection closed")
}

#[tokio::test]
async fn test_host_session_over_relay() {
    init_tracing();
    let addr = start_relay().await;
    let room = RoomCode::new("AB12CD");

    let behavior = TestHostBehavior::new();
    let source = CountingCaptureSource::new();
    let session = HostSession::start(
        HostConfig {
            server_url: format!("http://{}", addr),
            room: Some(room.clone()),
            name: "Host".into(),
            ice_servers: Some(vec![]),
        },
        Box::new(behavior.clone()),
        SharedCapture::new(Arc::new(source.clone())),
    )
    .await
    .expect("Failed to start host session");
    assert_eq!(session.room(), &room);

    let host_id = session.endpoint_id();
    let ctx = session.context();
    let commands = session.commands();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let host_task = tokio::spawn(session.run(async {
        let _ = stop_rx.await;
    }));

    // Alice joins through the relay like a browser would.
    let (relay, mut inbound) = RelayClient::connect(&format!("ws://{}/ws", addr))
        .await
        .expect("Alice failed to connect");
    relay
        .send(ClientMessage::JoinRoom {
            room_id: room.clone(),
            user_name: "Alice".into(),
        })
        .unwrap();
    assert_eq!(
        next_message(&mut inbound).await,
        ServerMessage::RoomJoined {
            room_id: room.clone()
        }
    );

    let alice = TestClient::new(relay.endpoint_id())
        .await
        .expect("Failed to create client");

    let offer = match next_message(&mut inbound).await {
        ServerMessage::Offer(relayed) => {
            assert_eq!(relayed.sender, host_id);
            relayed.payload
        }
        other => panic!("Expected offer, got {:?}", other),
    };
    let answer = alice.accept_offer(offer).await.expect("Failed to answer");
    relay
        .send(ClientMessage::Answer(Signal::to_target(
            host_id,
            Some(room.clone()),
            answer,
        )))
        .unwrap();

    for candidate in alice.gather_ice_candidates(ICE_GATHERING_TIMEOUT_MS).await {
        relay
            .send(ClientMessage::IceCandidate(Signal::to_target(
                host_id,
                Some(room.clone()),
                candidate,
            )))
            .unwrap();
    }

    let deadline = tokio::time::Instant::now() + Duration::from_millis(CONNECTION_TIMEOUT_MS);
    while ctx.state_of(&alice.member) != Some(PeerLinkState::Connected) {
        assert!(
            tokio::time::Instant::now() < deadline,
            "Host never saw Alice connect"
        );
        if let Ok(Some(ServerMessage::IceCandidate(relayed))) =
            tokio::time::timeout(Duration::from_millis(100), inbound.recv()).await
        {
            let _ = alice.add_ice_candidate(relayed.payload).await;
        }
    }
    wait_for_client_ready(&alice)
        .await
        .expect("Alice not ready");

    alice
        .send_control(&ControlMessage::button("A", 1.0))
        .await
        .expect("Failed to send control");
    let alice_id = alice.member;
    assert!(
        behavior
            .wait_for(5000, |e| matches!(
                e,
                HostEvent::Control { member, input } if *member == alice_id
                    && *input == ControlMessage::button("A", 1.0)
            ))
            .await,
        "Host should observe Alice pressing A"
    );

    // Chat from Alice reaches the host application.
    relay
        .send(ClientMessage::ChatMessage {
            room_id: room.clone(),
            text: "gg".into(),
            sender_name: "Alice".into(),
        })
        .unwrap();
    assert!(
        behavior
            .wait_for(5000, |e| matches!(
                e,
                HostEvent::Chat { message } if message.text == "gg" && !message.is_host
            ))
            .await
    );

    // Kicking goes out through the relay.
    commands
        .send(HostCommand::Kick {
            member_id: alice.member,
        })
        .await
        .unwrap();
    loop {
        match next_message(&mut inbound).await {
            ServerMessage::Kicked { room_id } => {
                assert_eq!(room_id, room);
                break;
            }
            _ => continue,
        }
    }
    assert!(
        ctx.wait_for_state(&alice.member, None, Duration::from_secs(2))
            .await
    );

    stop_tx.send(()).unwrap();
    host_task
        .await
        .expect("Host task panicked")
        .expect("Host session failed");
    assert_eq!(source.starts(), 1);
    let stopped = source.clone();
    assert!(
        eventually(3000, || {
            let source = stopped.clone();
            async move { source.stops() == 1 }
        })
        .await,
        "Capture should stop once the session is over"
    );

    alice.close().await.expect("Failed to close client");
}
