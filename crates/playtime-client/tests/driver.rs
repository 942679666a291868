//! Heartbeat driver tests against a mock service.

mod common;

use std::time::Duration;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use playtime_client::{ClientError, HeartbeatDriver, SessionOutcome, SessionState};
use playtime_core::StoryId;

use common::{blocked, client, heartbeat_bodies, pass, FixedPlayer};

async fn allow_access(server: &MockServer, story_id: StoryId) {
    Mock::given(method("GET"))
        .and(path(format!("/v1/stories/{story_id}/access")))
        .respond_with(ResponseTemplate::new(200).set_body_json(pass()))
        .mount(server)
        .await;
}

async fn heartbeat_responds(server: &MockServer, template: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path("/v1/heartbeat"))
        .respond_with(template)
        .mount(server)
        .await;
}

#[tokio::test]
async fn preflight_block_locks_without_heartbeats() {
    let server = MockServer::start().await;
    let story_id = StoryId::generate();
    Mock::given(method("GET"))
        .and(path(format!("/v1/stories/{story_id}/access")))
        .respond_with(ResponseTemplate::new(200).set_body_json(blocked("Restricted")))
        .mount(&server)
        .await;

    let mut driver = HeartbeatDriver::new(client(&server), FixedPlayer::playing(), story_id);
    let outcome = driver.start().await.unwrap();

    assert!(matches!(
        outcome,
        Some(SessionOutcome::Locked { ref reason, .. }) if reason == "Restricted"
    ));
    assert!(matches!(driver.state(), SessionState::Locked { .. }));
    assert!(heartbeat_bodies(&server).await.is_empty());
}

#[tokio::test]
async fn heartbeats_carry_whole_seconds_and_position() {
    let server = MockServer::start().await;
    let story_id = StoryId::generate();
    allow_access(&server, story_id).await;
    heartbeat_responds(&server, ResponseTemplate::new(200).set_body_json(pass())).await;

    let mut driver = HeartbeatDriver::new(client(&server), FixedPlayer::playing(), story_id);
    assert!(driver.start().await.unwrap().is_none());
    assert_eq!(driver.state(), &SessionState::Playing);

    assert!(driver
        .report_played(Duration::from_millis(5_500))
        .await
        .unwrap()
        .is_none());
    assert!(driver
        .report_played(Duration::from_millis(2_500))
        .await
        .unwrap()
        .is_none());

    let bodies = heartbeat_bodies(&server).await;
    assert_eq!(bodies.len(), 2);
    assert_eq!(bodies[0]["increment_seconds"], 5);
    assert_eq!(bodies[1]["increment_seconds"], 3);
    assert_eq!(bodies[0]["story_id"], story_id.to_string());
    assert_eq!(bodies[0]["current_chapter_index"], 1);
    assert_eq!(bodies[0]["is_playing"], true);
    assert_eq!(driver.pending_seconds(), 0);
}

#[tokio::test]
async fn failed_heartbeat_seconds_go_out_with_the_next_one() {
    let server = MockServer::start().await;
    let story_id = StoryId::generate();
    allow_access(&server, story_id).await;
    Mock::given(method("POST"))
        .and(path("/v1/heartbeat"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    heartbeat_responds(&server, ResponseTemplate::new(200).set_body_json(pass())).await;

    let mut driver = HeartbeatDriver::new(client(&server), FixedPlayer::playing(), story_id);
    driver.start().await.unwrap();

    let err = driver
        .report_played(Duration::from_secs(5))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Api { status: 503, .. }));
    assert_eq!(driver.pending_seconds(), 5);

    driver.report_played(Duration::from_secs(5)).await.unwrap();

    let bodies = heartbeat_bodies(&server).await;
    assert_eq!(bodies.len(), 2);
    assert_eq!(bodies[1]["increment_seconds"], 10);
    assert_eq!(driver.pending_seconds(), 0);
}

#[tokio::test]
async fn block_response_locks_and_stops_heartbeats() {
    let server = MockServer::start().await;
    let story_id = StoryId::generate();
    allow_access(&server, story_id).await;
    heartbeat_responds(
        &server,
        ResponseTemplate::new(200).set_body_json(blocked("Global Time Limit Reached")),
    )
    .await;

    let mut driver = HeartbeatDriver::new(client(&server), FixedPlayer::playing(), story_id);
    driver.start().await.unwrap();

    let outcome = driver
        .report_played(Duration::from_secs(5))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        outcome,
        SessionOutcome::Locked {
            reason: "Global Time Limit Reached".into(),
            redirect: Some("/times-up?reason=Global%20Time%20Limit%20Reached".into()),
        }
    );

    // Locked is terminal: nothing more is sent.
    let again = driver.tick().await.unwrap();
    assert_eq!(again, Some(outcome));
    assert_eq!(heartbeat_bodies(&server).await.len(), 1);
}

#[tokio::test]
async fn run_until_returns_lock_from_periodic_heartbeat() {
    let server = MockServer::start().await;
    let story_id = StoryId::generate();
    allow_access(&server, story_id).await;
    heartbeat_responds(
        &server,
        ResponseTemplate::new(200).set_body_json(blocked("Global Time Limit Reached")),
    )
    .await;

    let mut driver = HeartbeatDriver::new(client(&server), FixedPlayer::playing(), story_id)
        .with_interval(Duration::from_millis(20));
    let outcome = driver
        .run_until(tokio::time::sleep(Duration::from_secs(10)))
        .await
        .unwrap();

    assert!(matches!(outcome, SessionOutcome::Locked { .. }));
}

#[tokio::test]
async fn run_until_stop_sends_pause_heartbeat() {
    let server = MockServer::start().await;
    let story_id = StoryId::generate();
    allow_access(&server, story_id).await;
    heartbeat_responds(&server, ResponseTemplate::new(200).set_body_json(pass())).await;

    let mut driver = HeartbeatDriver::new(client(&server), FixedPlayer::playing(), story_id)
        .with_interval(Duration::from_secs(60));
    let outcome = driver
        .run_until(tokio::time::sleep(Duration::from_millis(20)))
        .await
        .unwrap();

    assert_eq!(outcome, SessionOutcome::Stopped);
    let bodies = heartbeat_bodies(&server).await;
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0]["is_playing"], false);
}

#[tokio::test]
async fn paused_player_time_is_not_counted() {
    let server = MockServer::start().await;
    let story_id = StoryId::generate();
    allow_access(&server, story_id).await;
    heartbeat_responds(&server, ResponseTemplate::new(200).set_body_json(pass())).await;

    let mut player = FixedPlayer::playing();
    player.0.is_playing = false;
    let mut driver = HeartbeatDriver::new(client(&server), player, story_id);
    driver.start().await.unwrap();

    tokio::time::sleep(Duration::from_millis(1_100)).await;
    driver.tick().await.unwrap();

    let bodies = heartbeat_bodies(&server).await;
    assert_eq!(bodies[0]["increment_seconds"], 0);
    assert_eq!(bodies[0]["is_playing"], false);
}

#[tokio::test]
async fn unload_heartbeat_is_delivered_without_waiting() {
    let server = MockServer::start().await;
    let story_id = StoryId::generate();
    allow_access(&server, story_id).await;
    heartbeat_responds(&server, ResponseTemplate::new(500)).await;

    let mut driver = HeartbeatDriver::new(client(&server), FixedPlayer::playing(), story_id);
    driver.start().await.unwrap();
    let _ = driver.report_played(Duration::from_secs(3)).await;

    // The failed 3 seconds ride along with the unload heartbeat.
    driver.unload().await.await.unwrap();

    let bodies = heartbeat_bodies(&server).await;
    assert_eq!(bodies.len(), 2);
    assert_eq!(bodies[1]["is_playing"], false);
    assert!(bodies[1]["increment_seconds"].as_u64().unwrap() >= 3);
}
