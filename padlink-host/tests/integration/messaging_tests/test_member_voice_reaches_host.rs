use padlink_core::EndpointId;

use crate::integration::{create_test_host, init_tracing};
use crate::utils::{HostEvent, TestClient, perform_signaling, wait_for_client_ready};

#[tokio::test]
async fn test_member_voice_reaches_host() {
    init_tracing();

    let mut host = create_test_host();

    let alice = TestClient::with_microphone(EndpointId::new())
        .await
        .expect("Failed to create client");
    let bob = TestClient::new(EndpointId::new())
        .await
        .expect("Failed to create client");

    perform_signaling(&alice, "Alice", &host.cmd_tx, &mut host.signal_rx)
        .await
        .expect("Signaling failed for Alice");
    wait_for_client_ready(&alice)
        .await
        .expect("Alice not ready");
    perform_signaling(&bob, "Bob", &host.cmd_tx, &mut host.signal_rx)
        .await
        .expect("Signaling failed for Bob");
    wait_for_client_ready(&bob).await.expect("Bob not ready");

    let alice_id = alice.member;
    assert!(
        host.behavior
            .wait_for(10000, |e| matches!(
                e,
                HostEvent::Track { member, kind } if *member == alice_id && kind == "audio"
            ))
            .await,
        "Alice's microphone should reach the host"
    );

    // A muted member sends no media.
    let bob_id = bob.member;
    let events = host.behavior.get_events().await;
    assert!(
        !events
            .iter()
            .any(|e| matches!(e, HostEvent::Track { member, .. } if *member == bob_id)),
        "unexpected track from Bob: {:?}",
        events
    );

    alice.close().await.expect("Failed to close client");
    bob.close().await.expect("Failed to close client");
}
