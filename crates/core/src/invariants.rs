//! Developer guardrails and invariants
//!
//! Debug assertions for detecting impossible states during development.
//! These checks are compiled out in release builds.

use crate::models::{DebateRecord, Outcome, Seat};
use crate::room::{Room, RoomStatus};

/// Validate that a room's phase and ledgers agree
pub fn assert_room_invariants(room: &Room) {
    let target = room.rules().rounds_target;
    let first = room.rounds_submitted(Seat::First);
    let second = room.rounds_submitted(Seat::Second);

    debug_assert!(
        first <= target && second <= target,
        "Room {} ledgers exceed target: {} / {} of {}",
        room.key(),
        first,
        second,
        target
    );

    match room.status() {
        RoomStatus::Waiting => {
            debug_assert!(
                first == 0 && second == 0,
                "Room {} accepted arguments before starting",
                room.key()
            );
            debug_assert!(room.challenger().is_none(), "Room {} waiting with a challenger", room.key());
        }
        RoomStatus::InProgress => {
            // First seat always leads, so ledgers never drift apart by more than one
            debug_assert!(
                first == second || first == second + 1,
                "Room {} ledgers out of step: {} vs {}",
                room.key(),
                first,
                second
            );
            let expected = if first == second { Seat::First } else { Seat::Second };
            debug_assert_eq!(
                room.turn_seat(),
                Some(expected),
                "Room {} turn does not match ledgers",
                room.key()
            );
        }
        RoomStatus::Completed => {
            debug_assert!(
                first == target && second == target,
                "Room {} completed with {} / {} of {} rounds",
                room.key(),
                first,
                second,
                target
            );
            debug_assert!(room.current_turn().is_none(), "Room {} completed with a turn", room.key());
        }
    }

    debug_assert!(
        !room.challenger().is_some_and(|c| c.same_player(room.host())),
        "Room {} seats {} twice",
        room.key(),
        room.host()
    );
}

/// Validate that a finished record is self-consistent
pub fn assert_record_invariants(record: &DebateRecord) {
    let rounds = record.rounds.len();
    for side in [&record.participant1, &record.participant2] {
        debug_assert_eq!(
            side.turn_scores.len(),
            side.arguments.len(),
            "Participant {} has unscored turns",
            side.id
        );
        debug_assert_eq!(
            side.arguments.len(),
            rounds,
            "Participant {} argument count does not match rounds",
            side.id
        );
    }

    let wins = (record.participant1.rounds_won + record.participant2.rounds_won) as usize;
    debug_assert!(wins <= rounds, "More round wins ({}) than rounds ({})", wins, rounds);

    if let Outcome::Winner(id) = &record.outcome {
        debug_assert!(
            *id == record.participant1.id || *id == record.participant2.id,
            "Winner {} did not take part",
            id
        );
    }

    debug_assert!(!record.reason.trim().is_empty(), "Record has no verdict reason");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ParticipantId, RoomKey};
    use crate::room::RoomRules;

    #[test]
    fn test_valid_room_lifecycle() {
        let mut room = Room::new(
            RoomKey::new("INV001"),
            ParticipantId::new("A"),
            "topic".into(),
            RoomRules::default().with_rounds(1),
        )
        .unwrap();
        assert_room_invariants(&room);

        room.join(ParticipantId::new("B")).unwrap();
        assert_room_invariants(&room);

        room.submit(&ParticipantId::new("A"), "a".into()).unwrap();
        assert_room_invariants(&room);

        room.submit(&ParticipantId::new("B"), "b".into()).unwrap();
        assert_eq!(room.status(), RoomStatus::Completed);
        assert_room_invariants(&room);
    }
}
