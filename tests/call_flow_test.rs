//! End-to-end call flows through the orchestrator runtime

use callflow::config::{CallPreferences, Config};
use callflow::domain::account::{AccountSnapshot, RegistrationState};
use callflow::domain::call::{
    AudioRoute, CallSnapshot, CallState, CoreEvent, ErrorInfo, Reason, Screen, UserAction,
    UserMessage,
};
use callflow::domain::message::{ChatMessage, Content, MediaKind};
use callflow::domain::shared::value_objects::{RoomId, SipAddress};
use callflow::infrastructure::simulated::{Interaction, SimulatedPlatform, StaticProbe};
use callflow::Orchestrator;
use std::sync::Arc;
use std::time::Duration;

fn start(preferences: CallPreferences, probe: StaticProbe) -> (Orchestrator, Arc<SimulatedPlatform>) {
    let config = Config {
        preferences,
        ..Config::default()
    };
    let platform = SimulatedPlatform::new("example.com");
    let orchestrator = Orchestrator::start(
        &config,
        Arc::new(probe),
        platform.collaborators(),
        platform.clone(),
    );
    (orchestrator, platform)
}

fn incoming_call() -> CallSnapshot {
    CallSnapshot::incoming(SipAddress::parse("sip:alice@example.com").unwrap())
}

fn outgoing_call() -> CallSnapshot {
    CallSnapshot::outgoing(SipAddress::parse("sip:bob@example.com").unwrap())
}

#[tokio::test(start_paused = true)]
async fn test_delayed_auto_answer() {
    let prefs = CallPreferences {
        auto_answer_enabled: true,
        auto_answer_delay_ms: 2000,
        ..CallPreferences::default()
    };
    let (orchestrator, platform) = start(prefs, StaticProbe::default());
    let call = incoming_call();
    let id = call.id;

    let publisher = orchestrator.publisher();
    publisher.call_state_changed(call.clone(), CallState::IncomingReceived, 1);
    publisher.call_state_changed(call, CallState::IncomingEarlyMedia, 1);

    tokio::time::sleep(Duration::from_secs(3)).await;
    orchestrator.shutdown().await;

    assert_eq!(
        platform.interactions(),
        vec![
            Interaction::Show(Screen::Incoming(id)),
            Interaction::Show(Screen::Incoming(id)),
            Interaction::Accept {
                call: id,
                with_params: true
            },
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_auto_answer_cancelled_when_caller_hangs_up() {
    let prefs = CallPreferences {
        auto_answer_enabled: true,
        auto_answer_delay_ms: 5000,
        ..CallPreferences::default()
    };
    let (orchestrator, platform) = start(prefs, StaticProbe::default());
    let call = incoming_call();
    let id = call.id;

    let publisher = orchestrator.publisher();
    publisher.call_state_changed(call.clone(), CallState::IncomingReceived, 1);
    tokio::time::sleep(Duration::from_secs(1)).await;
    publisher.call_state_changed(call.clone(), CallState::End, 0);
    publisher.call_state_changed(call, CallState::Released, 0);

    tokio::time::sleep(Duration::from_secs(10)).await;
    let snapshot = orchestrator.snapshot();
    orchestrator.shutdown().await;

    assert_eq!(platform.interactions(), vec![Interaction::Show(Screen::Incoming(id))]);
    assert!(snapshot.calls.is_empty());
}

#[tokio::test]
async fn test_gsm_call_rejects_incoming() {
    let probe = StaticProbe {
        gsm_call_active: true,
        ..StaticProbe::default()
    };
    let (orchestrator, platform) = start(CallPreferences::default(), probe);
    let call = incoming_call();
    let id = call.id;

    orchestrator
        .publisher()
        .call_state_changed(call, CallState::IncomingReceived, 1);
    orchestrator.shutdown().await;

    assert_eq!(
        platform.interactions(),
        vec![Interaction::Decline {
            call: id,
            reason: Reason::Busy
        }]
    );
}

#[tokio::test]
async fn test_outgoing_call_declined_by_remote() {
    let (orchestrator, platform) = start(CallPreferences::default(), StaticProbe::default());
    let call = outgoing_call();
    let id = call.id;

    let publisher = orchestrator.publisher();
    publisher.user_action(UserAction::StartCall {
        address: " bob ".to_string(),
    });
    publisher.call_state_changed(call.clone(), CallState::OutgoingProgress, 1);
    let declined = call.with_error(ErrorInfo::new(Reason::Declined, 603, "Decline"));
    publisher.call_state_changed(declined.clone(), CallState::End, 0);
    publisher.call_state_changed(declined, CallState::Released, 0);
    orchestrator.shutdown().await;

    let interactions = platform.interactions();
    assert_eq!(interactions.len(), 4);
    assert!(matches!(
        &interactions[0],
        Interaction::Invite { target, .. } if target.uri_only() == "sip:bob@example.com"
    ));
    assert_eq!(
        &interactions[1..],
        &[
            Interaction::Show(Screen::Outgoing(id)),
            Interaction::RouteAudio {
                call: id,
                route: AudioRoute::Bluetooth
            },
            Interaction::Message(UserMessage::CallDeclined),
        ]
    );
}

#[tokio::test]
async fn test_start_call_with_bad_address() {
    let (orchestrator, platform) = start(CallPreferences::default(), StaticProbe::default());

    orchestrator.publisher().user_action(UserAction::StartCall {
        address: "not a valid address".to_string(),
    });
    orchestrator.shutdown().await;

    assert_eq!(
        platform.interactions(),
        vec![Interaction::Message(UserMessage::NetworkUnreachable)]
    );
}

#[tokio::test]
async fn test_answer_falls_back_without_params() {
    let (orchestrator, platform) = start(CallPreferences::default(), StaticProbe::default());
    platform.set_params_unavailable(true);
    let call = incoming_call();
    let id = call.id;

    let publisher = orchestrator.publisher();
    publisher.call_state_changed(call, CallState::IncomingReceived, 1);
    publisher.user_action(UserAction::Answer(id));
    orchestrator.shutdown().await;

    assert_eq!(
        platform.interactions(),
        vec![
            Interaction::Show(Screen::Incoming(id)),
            Interaction::Accept {
                call: id,
                with_params: false
            },
        ]
    );
}

#[tokio::test]
async fn test_first_media_routes_and_records_once() {
    let prefs = CallPreferences {
        automatically_start_call_recording: true,
        ..CallPreferences::default()
    };
    let probe = StaticProbe {
        headset_available: true,
        ..StaticProbe::default()
    };
    let (orchestrator, platform) = start(prefs, probe);
    let call = incoming_call();
    let id = call.id;

    let publisher = orchestrator.publisher();
    publisher.call_state_changed(call.clone(), CallState::Connected, 1);
    publisher.call_state_changed(call.clone(), CallState::StreamsRunning, 1);
    publisher.call_state_changed(call.clone(), CallState::StreamsRunning, 1);
    publisher.call_state_changed(call.clone(), CallState::Connected, 1);
    publisher.call_state_changed(call, CallState::StreamsRunning, 1);
    orchestrator.shutdown().await;

    let interactions = platform.interactions();
    assert_eq!(
        interactions
            .iter()
            .filter(|i| matches!(i, Interaction::RouteAudio { route: AudioRoute::Headset, .. }))
            .count(),
        1
    );
    assert_eq!(
        interactions
            .iter()
            .filter(|i| **i == Interaction::StartRecording { call: id })
            .count(),
        1
    );
}

#[tokio::test(start_paused = true)]
async fn test_foreground_notification_lifecycle() {
    let prefs = CallPreferences {
        keep_service_alive: true,
        ..CallPreferences::default()
    };
    let (orchestrator, platform) = start(prefs, StaticProbe::default());

    let check = orchestrator.check_foreground_notification_after(Duration::from_secs(5));
    orchestrator.publish(CoreEvent::RegistrationChanged {
        account: AccountSnapshot::new(SipAddress::parse("sip:me@example.com").unwrap(), true),
        state: RegistrationState::Progress,
        message: "Registration in progress".to_string(),
    });

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(platform.is_foreground());

    orchestrator.publish(CoreEvent::RegistrationChanged {
        account: AccountSnapshot::new(SipAddress::parse("sip:me@example.com").unwrap(), true),
        state: RegistrationState::Ok,
        message: "Registration successful".to_string(),
    });
    check.await.unwrap();
    orchestrator.shutdown().await;

    assert!(!platform.is_foreground());
    assert_eq!(
        platform.interactions(),
        vec![Interaction::ForegroundStarted, Interaction::ForegroundStopped]
    );
}

#[tokio::test]
async fn test_received_image_is_exported() {
    let prefs = CallPreferences {
        make_public_media_files_downloaded: true,
        ..CallPreferences::default()
    };
    let (orchestrator, platform) = start(prefs, StaticProbe::default());

    orchestrator.publish(CoreEvent::MessagesReceived {
        room: RoomId::new("room-1"),
        messages: vec![ChatMessage::new(
            "msg-1",
            vec![
                Content::text("holiday"),
                Content::file("beach.png", "/tmp/beach.png"),
                Content::file("notes.xyz", "/tmp/notes.xyz"),
            ],
        )],
    });
    orchestrator.shutdown().await;

    assert_eq!(
        platform.interactions(),
        vec![Interaction::Exported {
            name: "beach.png".to_string(),
            kind: MediaKind::Image
        }]
    );
}

#[tokio::test]
async fn test_snapshot_follows_current_call() {
    let (orchestrator, _platform) = start(CallPreferences::default(), StaticProbe::default());
    let mut snapshots = orchestrator.subscribe();
    let call = outgoing_call();
    let id = call.id;

    orchestrator
        .publisher()
        .call_state_changed(call, CallState::Connected, 1);

    let snapshot = snapshots
        .wait_for(|s| s.current_call.is_some())
        .await
        .unwrap()
        .clone();
    assert_eq!(snapshot.current_call, Some(id));
    assert_eq!(snapshot.calls.len(), 1);
    assert_eq!(snapshot.calls[0].state, CallState::Connected);

    orchestrator.shutdown().await;
}

#[tokio::test]
async fn test_presence_and_microphone() {
    let (orchestrator, platform) = start(CallPreferences::default(), StaticProbe::default());

    orchestrator.publish(CoreEvent::AppForeground);
    orchestrator.publish(CoreEvent::LastCallEnded {
        microphone_enabled: false,
    });
    orchestrator.publish(CoreEvent::AppBackground);
    orchestrator.shutdown().await;

    assert_eq!(
        platform.interactions(),
        vec![
            Interaction::Presence(callflow::domain::call::Presence::Online),
            Interaction::MicrophoneEnabled(true),
            Interaction::Presence(callflow::domain::call::Presence::Offline),
        ]
    );
}
