//! Oracle helpers for verifying scenario outcomes.

use crate::scenario::World;

/// Verification run against the final world state.
pub type OracleFn = Box<dyn Fn(&World) -> Result<(), String>>;

/// Every submitted message was read.
pub fn all_read() -> OracleFn {
    Box::new(|world| {
        if world.all_submitted_read() {
            Ok(())
        } else {
            Err("not every submitted message reached read".to_string())
        }
    })
}

/// Every submitted message progressed one step at a time.
pub fn statuses_monotonic() -> OracleFn {
    Box::new(|world| {
        if world.statuses_monotonic() {
            Ok(())
        } else {
            Err("a submitted message skipped or repeated a status".to_string())
        }
    })
}

/// Every conversation is sorted by timestamp.
pub fn conversations_sorted() -> OracleFn {
    Box::new(|world| {
        if world.conversations_sorted() {
            Ok(())
        } else {
            Err("a conversation is out of timestamp order".to_string())
        }
    })
}

/// The named conversation has exactly `count` messages.
pub fn message_count(peer: &str, count: usize) -> OracleFn {
    let peer = peer.to_string();
    Box::new(move |world| {
        let actual = world.messages(&peer).len();
        if actual == count {
            Ok(())
        } else {
            Err(format!("{peer}: expected {count} messages, found {actual}"))
        }
    })
}

/// The named conversation got nothing from the peer after it was closed and
/// its typing indicator is down.
pub fn silent_after_close(peer: &str) -> OracleFn {
    let peer = peer.to_string();
    Box::new(move |world| {
        if world.closed_at(&peer).is_none() {
            return Err(format!("{peer}: conversation is not closed"));
        }
        let late = world.replies_after_close(&peer);
        if late > 0 {
            return Err(format!("{peer}: {late} peer messages after close"));
        }
        if world.is_typing(&peer) {
            return Err(format!("{peer}: still typing after close"));
        }
        Ok(())
    })
}

/// Run several oracles, failing on the first error.
pub fn all_of(oracles: Vec<OracleFn>) -> OracleFn {
    Box::new(move |world| oracles.iter().try_for_each(|oracle| oracle(world)))
}
