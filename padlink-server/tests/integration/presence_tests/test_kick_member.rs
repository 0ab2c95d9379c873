use padlink_core::{ClientMessage, RoomCode, ServerMessage};

use crate::integration::{init_tracing, start_server};
use crate::utils::TestEndpoint;

#[tokio::test]
async fn test_kick_member() {
    init_tracing();
    let addr = start_server().await;
    let code = RoomCode::new("KICK01");

    let mut host = TestEndpoint::connect(addr).await.unwrap();
    let mut alice = TestEndpoint::connect(addr).await.unwrap();
    let mut bob = TestEndpoint::connect(addr).await.unwrap();

    host.create_room(&code).await.unwrap();
    alice.join_room(&code, "Alice").await.unwrap();
    bob.join_room(&code, "Bob").await.unwrap();
    host.recv().await.unwrap();
    host.recv().await.unwrap();

    let kick = ClientMessage::KickClient {
        member_id: bob.id,
        room_id: code.clone(),
    };
    host.send(kick.clone()).await.unwrap();

    assert_eq!(
        bob.recv().await.unwrap(),
        ServerMessage::Kicked {
            room_id: code.clone()
        }
    );
    assert_eq!(
        host.recv().await.unwrap(),
        ServerMessage::ClientLeft { member_id: bob.id }
    );

    // Second kick is a no-op for everyone.
    host.send(kick).await.unwrap();
    host.expect_silence().await.unwrap();

    // Room traffic no longer reaches Bob; Alice is untouched.
    host.send(ClientMessage::ChatMessage {
        room_id: code.clone(),
        text: "still here?".into(),
        sender_name: "Host".into(),
    })
    .await
    .unwrap();
    assert!(matches!(
        alice.recv().await.unwrap(),
        ServerMessage::ChatMessage(_)
    ));
    assert!(matches!(
        host.recv().await.unwrap(),
        ServerMessage::ChatMessage(_)
    ));
    bob.expect_silence().await.unwrap();

    // Nor does Bob's chat reach the room any more.
    bob.send(ClientMessage::ChatMessage {
        room_id: code.clone(),
        text: "let me back in".into(),
        sender_name: "Bob".into(),
    })
    .await
    .unwrap();
    alice.expect_silence().await.unwrap();
    host.expect_silence().await.unwrap();
}

#[tokio::test]
async fn test_non_host_cannot_kick() {
    init_tracing();
    let addr = start_server().await;
    let code = RoomCode::new("KICK02");

    let mut host = TestEndpoint::connect(addr).await.unwrap();
    let mut alice = TestEndpoint::connect(addr).await.unwrap();
    let mut bob = TestEndpoint::connect(addr).await.unwrap();

    host.create_room(&code).await.unwrap();
    alice.join_room(&code, "Alice").await.unwrap();
    bob.join_room(&code, "Bob").await.unwrap();

    alice
        .send(ClientMessage::KickClient {
            member_id: bob.id,
            room_id: code,
        })
        .await
        .unwrap();

    bob.expect_silence().await.unwrap();
}
