//! Terminal session tests.
//!
//! Drives a [`Session`] over a seeded demo runtime with output captured in
//! memory. The clock starts at 09:00 two days after the epoch so the demo
//! history renders with stable times.

use std::time::Duration;

use ephemera_app::{ChatRuntime, Flow, Session, TokioEnv, demo};
use ephemera_core::{ChatSimulator, SimulatorConfig, Timestamp, UserId};

const ME: UserId = UserId(1);
const START: Timestamp = Timestamp::from_millis((2 * 24 + 9) * 3_600_000);

fn quiet_config() -> SimulatorConfig {
    SimulatorConfig::default().with_reply_probability(0.0).with_unsolicited_delay(None)
}

async fn session(config: SimulatorConfig) -> (Session<Vec<u8>>, ephemera_app::ChatHandle) {
    let env = TokioEnv::new(START, Some(5));
    let (handle, _task) = ChatRuntime::spawn(ChatSimulator::with_config(env, ME, config));
    let roster = demo::roster(ME);
    demo::seed(&handle, &roster, START).await.expect("seed history");
    (Session::new(handle.clone(), roster, Vec::new()), handle)
}

fn output(session: &Session<Vec<u8>>) -> String {
    String::from_utf8_lossy(session.output()).into_owned()
}

#[tokio::test(start_paused = true)]
async fn chat_walkthrough() {
    let (mut session, handle) = session(quiet_config()).await;
    let mut events = handle.events();

    for line in ["/image", "/open alex_j", "hello"] {
        assert_eq!(session.handle_line(line).await.expect("line handled"), Flow::Continue);
    }

    tokio::time::sleep(Duration::from_secs(3)).await;
    while let Ok(event) = events.try_recv() {
        session.handle_event(event).await.expect("event handled");
    }

    for line in ["/history", "/close", "/bogus"] {
        assert_eq!(session.handle_line(line).await.expect("line handled"), Flow::Continue);
    }
    assert_eq!(session.handle_line("/q").await.expect("line handled"), Flow::Quit);

    insta::assert_snapshot!(output(&session), @r#"
    No chat is open. Use /open <username>
    ── Alex Johnson (alex_j) · Offline ──
    [09:00] alex_j: Hey, how are you doing today?
    [09:01] you: I'm doing great! Just finished that project we talked about. ✓✓ seen
    [09:23] alex_j: That's awesome! Would love to see it sometime.
    [09:00] you: hello ✓
      "hello" delivered
      "hello" read
    [09:00] alex_j: Hey, how are you doing today?
    [09:01] you: I'm doing great! Just finished that project we talked about. ✓✓ seen
    [09:23] alex_j: That's awesome! Would love to see it sometime.
    [09:00] you: hello ✓✓ seen
    Closed chat with alex_j
    Unknown command /bogus. Try /friends  /open <username>  /close  /image  /voice  /history  /quit
    "#);
}

#[tokio::test(start_paused = true)]
async fn friends_list_shows_presence() {
    let (mut session, _handle) = session(quiet_config()).await;
    session.handle_line("/friends").await.expect("line handled");

    insta::assert_snapshot!(output(&session), @r"
    alex_j       Alex Johnson   streak 15  Offline
    taylor89     Taylor Swift   streak  7  Offline
    sam_wilson   Sam Wilson     streak  3  Offline
    ");
}

#[tokio::test(start_paused = true)]
async fn peer_reply_is_printed_in_the_open_chat() {
    let config =
        SimulatorConfig::default().with_reply_probability(1.0).with_unsolicited_delay(None);
    let (mut session, handle) = session(config).await;
    let mut events = handle.events();

    session.handle_line("/open sam_wilson").await.expect("line handled");
    session.handle_line("/voice").await.expect("line handled");
    tokio::time::sleep(Duration::from_secs(10)).await;
    while let Ok(event) = events.try_recv() {
        session.handle_event(event).await.expect("event handled");
    }

    let text = output(&session);
    assert!(text.contains("you: [voice] Voice message (0:12) ✓"));
    assert!(text.contains("sam_wilson is typing..."));
    let reply = text.lines().last().expect("reply line");
    assert!(reply.contains("] sam_wilson: "), "unexpected last line: {reply}");
}

#[tokio::test(start_paused = true)]
async fn switching_chats_closes_the_previous_one() {
    let (mut session, _handle) = session(quiet_config()).await;

    session.handle_line("/open alex_j").await.expect("line handled");
    session.handle_line("/open taylor89").await.expect("line handled");
    assert_eq!(session.active().map(|friend| friend.username.as_str()), Some("taylor89"));
    assert!(output(&session).contains("Closed chat with alex_j"));

    session.handle_line("/open nobody").await.expect("line handled");
    assert!(output(&session).contains("No friend named nobody"));
    assert_eq!(session.active().map(|friend| friend.username.as_str()), Some("taylor89"));
}
