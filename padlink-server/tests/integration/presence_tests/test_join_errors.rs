use padlink_core::{ClientMessage, RoomCode, ServerMessage};
use padlink_server::RegistryConfig;

use crate::integration::{init_tracing, start_server, start_server_with};
use crate::utils::TestEndpoint;

#[tokio::test]
async fn test_join_unknown_room() {
    init_tracing();
    let addr = start_server().await;

    let mut alice = TestEndpoint::connect(addr).await.unwrap();
    alice
        .send(ClientMessage::JoinRoom {
            room_id: RoomCode::new("ZZZZZZ"),
            user_name: "Alice".into(),
        })
        .await
        .unwrap();

    let ServerMessage::Error { message } = alice.recv().await.unwrap() else {
        panic!("expected error");
    };
    assert!(message.contains("not found"));
}

#[tokio::test]
async fn test_duplicate_room_code() {
    init_tracing();
    let addr = start_server().await;
    let code = RoomCode::new("DUPE01");

    let mut first = TestEndpoint::connect(addr).await.unwrap();
    let mut second = TestEndpoint::connect(addr).await.unwrap();
    first.create_room(&code).await.unwrap();

    second
        .send(ClientMessage::CreateRoom { room_id: code })
        .await
        .unwrap();
    let ServerMessage::Error { message } = second.recv().await.unwrap() else {
        panic!("expected error");
    };
    assert!(message.contains("already in use"));
}

#[tokio::test]
async fn test_blank_room_code_is_refused() {
    init_tracing();
    let addr = start_server().await;

    let mut host = TestEndpoint::connect(addr).await.unwrap();
    host.send(ClientMessage::CreateRoom {
        room_id: RoomCode::new("   "),
    })
    .await
    .unwrap();
    let ServerMessage::Error { message } = host.recv().await.unwrap() else {
        panic!("expected error");
    };
    assert!(message.contains("must not be empty"));

    // Joining the blank code finds nothing either.
    let mut alice = TestEndpoint::connect(addr).await.unwrap();
    alice
        .send(ClientMessage::JoinRoom {
            room_id: RoomCode::new(""),
            user_name: "Alice".into(),
        })
        .await
        .unwrap();
    let ServerMessage::Error { message } = alice.recv().await.unwrap() else {
        panic!("expected error");
    };
    assert!(message.contains("not found"));
}

#[tokio::test]
async fn test_room_capacity() {
    init_tracing();
    let addr = start_server_with(RegistryConfig {
        max_members: Some(1),
    })
    .await;
    let code = RoomCode::new("FULL01");

    let mut host = TestEndpoint::connect(addr).await.unwrap();
    let mut alice = TestEndpoint::connect(addr).await.unwrap();
    let mut bob = TestEndpoint::connect(addr).await.unwrap();
    host.create_room(&code).await.unwrap();
    alice.join_room(&code, "Alice").await.unwrap();

    bob.send(ClientMessage::JoinRoom {
        room_id: code,
        user_name: "Bob".into(),
    })
    .await
    .unwrap();
    let ServerMessage::Error { message } = bob.recv().await.unwrap() else {
        panic!("expected error");
    };
    assert!(message.contains("full"));
}
