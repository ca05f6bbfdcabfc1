//! Conversation close and timer cancellation tests.
//!
//! Closing a conversation cancels pending typing and reply timers. Status
//! timers of already submitted messages keep running, but reads in a closed
//! conversation never schedule a reply.

use std::time::Duration;

use ephemera_core::{
    ChatEvent, ConversationId, DelayRange, MessageOrigin, MessageStatus, SimulatorConfig,
    Timestamp, UserId,
};
use ephemera_harness::SimDriver;

const ME: UserId = UserId(1);
const C1: UserId = UserId(2);
const C2: UserId = UserId(3);

fn always_reply() -> SimulatorConfig {
    SimulatorConfig::default().with_reply_probability(1.0).with_unsolicited_delay(None)
}

#[test]
fn close_before_any_timer_leaves_only_the_original_message() {
    let mut driver = SimDriver::new(1, ME, always_reply());
    let id = driver.submit(C1, "hello").expect("valid message");
    driver.close(C1);

    driver.run_until_idle();
    driver.advance(Duration::from_secs(60));

    let messages = driver.messages(C1);
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].id, id);
    // status timers are allowed to finish after close
    assert_eq!(messages[0].status, MessageStatus::Read);
    assert!(driver.typing_history(C1).is_empty());
    assert!(!driver.is_typing(C1));
}

#[test]
fn close_while_typing_cancels_reply_and_drops_indicator() {
    let config = always_reply().with_reply_lead(DelayRange::ZERO);
    let mut driver = SimDriver::new(2, ME, config);
    driver.submit(C1, "hello").expect("valid message");

    // read at 2.5s, typing starts immediately
    driver.advance(Duration::from_millis(2500));
    assert!(driver.is_typing(C1));
    let closed_at = driver.now();

    driver.close(C1);
    assert!(!driver.is_typing(C1));
    assert_eq!(driver.sim().pending_timers(), 0);

    driver.advance(Duration::from_secs(30));
    assert!(driver.peer_messages_since(C1, closed_at).is_empty());
    assert_eq!(driver.typing_history(C1), [(closed_at, true), (closed_at, false)]);

    let closed = driver.trace().iter().find_map(|entry| match entry.event {
        ChatEvent::ConversationClosed { cancelled, .. } => Some(cancelled),
        _ => None,
    });
    assert_eq!(closed, Some(1));
}

#[test]
fn close_during_reply_lead_cancels_before_typing() {
    let config = always_reply().with_reply_lead(DelayRange::millis(2000, 2000));
    let mut driver = SimDriver::new(3, ME, config);
    driver.submit(C1, "hello").expect("valid message");

    // read fired, typing scheduled for 4.5s
    driver.advance(Duration::from_millis(3000));
    assert_eq!(driver.sim().pending_timers(), 1);
    assert!(!driver.is_typing(C1));

    driver.close(C1);
    driver.run_until_idle();

    assert_eq!(driver.messages(C1).len(), 1);
    assert!(driver.typing_history(C1).is_empty());
}

#[test]
fn closing_one_conversation_leaves_others_alone() {
    let mut driver = SimDriver::new(4, ME, always_reply());
    driver.submit(C1, "to c1").expect("valid");
    driver.submit(C2, "to c2").expect("valid");
    driver.close(C1);
    driver.run_until_idle();

    assert_eq!(driver.messages(C1).len(), 1);
    let c2 = driver.messages(C2);
    assert_eq!(c2.len(), 2);
    assert_eq!(c2[1].origin(), MessageOrigin::Peer);
}

#[test]
fn reopened_conversation_replies_to_new_messages_only() {
    let mut driver = SimDriver::new(5, ME, always_reply());
    driver.submit(C1, "first").expect("valid");
    driver.close(C1);
    driver.run_until_idle();
    assert_eq!(driver.messages(C1).len(), 1);

    driver.submit(C1, "second").expect("valid");
    driver.run_until_idle();

    let messages = driver.messages(C1);
    let peer: Vec<_> = messages.iter().filter(|m| m.origin() == MessageOrigin::Peer).collect();
    assert_eq!(peer.len(), 1);
    assert_eq!(messages.len(), 3);
}

#[test]
fn close_is_idempotent_and_ignores_unknown_conversations() {
    let mut driver = SimDriver::new(6, ME, always_reply());
    driver.close(C2);
    assert!(driver.trace().is_empty());

    driver.submit(C1, "hello").expect("valid");
    driver.close(C1);
    let after_first = driver.trace().len();
    driver.close(C1);
    assert_eq!(driver.trace().len(), after_first);
    assert!(!driver.sim().is_open(ConversationId::with_peer(C1)));
}

#[test]
fn unsolicited_activity_is_cancelled_by_close() {
    let config = SimulatorConfig::default()
        .with_unsolicited_delay(Some(DelayRange::millis(5000, 5000)))
        .with_typing_duration(DelayRange::millis(3000, 3000));
    let mut driver = SimDriver::new(7, ME, config);

    driver.open(C1).expect("peer conversation");
    driver.advance(Duration::from_millis(6000));
    assert!(driver.is_typing(C1));

    driver.close(C1);
    driver.advance(Duration::from_secs(60));
    assert!(driver.messages(C1).is_empty());
    assert!(!driver.is_typing(C1));
}

#[test]
fn unsolicited_activity_lands_when_left_open() {
    let config = SimulatorConfig::default()
        .with_unsolicited_delay(Some(DelayRange::millis(1000, 1000)))
        .with_typing_duration(DelayRange::millis(3000, 3000));
    let mut driver = SimDriver::new(8, ME, config);

    driver.open(C1).expect("peer conversation");
    driver.advance(Duration::from_secs(5));

    let messages = driver.messages(C1);
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].origin(), MessageOrigin::Peer);
    assert_eq!(messages[0].timestamp, Timestamp::from_millis(4000));
    assert_eq!(driver.sim().last_active(C1), Some(Timestamp::from_millis(4000)));
}
