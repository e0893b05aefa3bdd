//! Concurrent submissions must complete and score each room exactly once

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use agora_core::room::{Room, RoomRules, SharedRoom, SubmitOutcome};
use agora_core::scoring::{Judgment, JudgmentRequest};
use agora_core::{
    AgoraConfig, Collaborators, Database, DebateService, Error, MemoryArchive, OracleError,
    ParticipantId, RoomKey, RoomStatus, Score, ScoringOracle, SharedDatabase, SubmitResult,
    TopicBank,
};
use async_trait::async_trait;

struct CountingOracle {
    judge_calls: AtomicUsize,
}

#[async_trait]
impl ScoringOracle for CountingOracle {
    async fn score_argument(
        &self,
        _argument: &str,
        _topic: &str,
        _round: Option<u32>,
    ) -> Result<Score, OracleError> {
        tokio::task::yield_now().await;
        Ok(Score::NEUTRAL)
    }

    async fn judge(&self, request: &JudgmentRequest) -> Result<Judgment, OracleError> {
        self.judge_calls.fetch_add(1, Ordering::SeqCst);
        Ok(Judgment {
            winner: "Tie".into(),
            reason: request.default_reason.clone(),
        })
    }
}

/// Submit until this participant's ledger is full. Returns completions observed.
async fn debater(service: Arc<DebateService>, key: RoomKey, me: ParticipantId, rounds: u32) -> usize {
    let mut accepted = 0;
    loop {
        match service
            .submit_argument(&key, &me, format!("{me} argument {accepted}"))
            .await
        {
            Ok(SubmitResult::InProgress { .. }) => {
                accepted += 1;
                if accepted == rounds {
                    return 0;
                }
            }
            Ok(SubmitResult::Completed(_)) => return 1,
            Err(Error::NotYourTurn { .. }) => tokio::task::yield_now().await,
            Err(e) => panic!("unexpected error for {me}: {e}"),
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn scoring_runs_once_per_room() {
    const ROOMS: usize = 40;
    const ROUNDS: u32 = 5;

    let oracle = Arc::new(CountingOracle {
        judge_calls: AtomicUsize::new(0),
    });
    let mut config = AgoraConfig::default();
    config.debate.require_registered_players = false;
    let service = Arc::new(DebateService::new(
        &config,
        Collaborators {
            oracle: oracle.clone(),
            topics: Arc::new(TopicBank),
            players: Arc::new(SharedDatabase::new(Database::open_in_memory().unwrap())),
            archive: Arc::new(MemoryArchive::new()),
        },
    ));

    let mut handles = Vec::new();
    let mut keys = Vec::new();
    for i in 0..ROOMS {
        let a = ParticipantId::new(format!("a{i}"));
        let b = ParticipantId::new(format!("b{i}"));
        let created = service
            .create_room(a.clone(), Some(format!("topic {i}")), None, Some(ROUNDS))
            .await
            .unwrap();
        service.join_room(&created.room_key, b.clone()).unwrap();

        for who in [a, b] {
            handles.push(tokio::spawn(debater(
                service.clone(),
                created.room_key.clone(),
                who,
                ROUNDS,
            )));
        }
        keys.push(created.room_key);
    }

    let mut completions = 0;
    for handle in handles {
        completions += handle.await.unwrap();
    }

    assert_eq!(completions, ROOMS);
    assert_eq!(oracle.judge_calls.load(Ordering::SeqCst), ROOMS);
    for key in keys {
        let snapshot = service.room_status(&key).unwrap();
        assert_eq!(snapshot.status, RoomStatus::Completed);
        assert!(snapshot.result.is_some());
    }
}

#[test]
fn racing_threads_claim_completion_once() {
    for _ in 0..50 {
        let mut room = Room::new(
            RoomKey::new("RACE01"),
            ParticipantId::new("A"),
            "topic".into(),
            RoomRules::default().with_rounds(3),
        )
        .unwrap();
        room.join(ParticipantId::new("B")).unwrap();
        let room = Arc::new(SharedRoom::new(room));
        let claims = Arc::new(AtomicUsize::new(0));

        let workers: Vec<_> = ["A", "B"]
            .into_iter()
            .map(|who| {
                let room = Arc::clone(&room);
                let claims = Arc::clone(&claims);
                thread::spawn(move || {
                    let me = ParticipantId::new(who);
                    let mut accepted = 0;
                    while accepted < 3 {
                        match room.submit(&me, format!("{who}{accepted}")) {
                            Ok(SubmitOutcome::InProgress { .. }) => accepted += 1,
                            Ok(SubmitOutcome::Completed(_)) => {
                                claims.fetch_add(1, Ordering::SeqCst);
                                accepted += 1;
                            }
                            Err(Error::NotYourTurn { .. }) => thread::yield_now(),
                            Err(e) => panic!("unexpected error: {e}"),
                        }
                    }
                })
            })
            .collect();

        for w in workers {
            w.join().unwrap();
        }
        assert_eq!(claims.load(Ordering::SeqCst), 1);
        assert_eq!(room.status(), RoomStatus::Completed);
    }
}
