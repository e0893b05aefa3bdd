//! Client and server talking over a real TCP socket

use std::net::SocketAddr;
use std::sync::Arc;

use agora_core::scoring::{Judgment, JudgmentRequest};
use agora_core::{
    AgoraConfig, Collaborators, Database, DebateService, ErrorCode, Genre, MemoryArchive,
    OracleError, Outcome, ParticipantId, RoomStatus, Score, ScoringOracle, SharedDatabase,
    TopicBank,
};
use agora_net::{Client, InviteUrl, Server, SubmitReply};
use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// Longer arguments score higher; the judge agrees with the scores
struct VerboseOracle;

#[async_trait]
impl ScoringOracle for VerboseOracle {
    async fn score_argument(
        &self,
        argument: &str,
        _topic: &str,
        _round: Option<u32>,
    ) -> Result<Score, OracleError> {
        let v = (argument.len() as f64 / 4.0).min(10.0);
        Ok(Score::new(v, v, v))
    }

    async fn judge(&self, request: &JudgmentRequest) -> Result<Judgment, OracleError> {
        Ok(Judgment {
            winner: request.default_winner.label().to_string(),
            reason: "More developed arguments".into(),
        })
    }
}

async fn start() -> (Server, Arc<DebateService>) {
    let config = AgoraConfig::default();
    let service = DebateService::new(
        &config,
        Collaborators {
            oracle: Arc::new(VerboseOracle),
            topics: Arc::new(TopicBank),
            players: Arc::new(SharedDatabase::new(Database::open_in_memory().unwrap())),
            archive: Arc::new(MemoryArchive::new()),
        },
    );
    let service = Arc::new(service);
    let bind: SocketAddr = "127.0.0.1:0".parse().unwrap();
    let server = Server::start(bind, Arc::clone(&service)).await.unwrap();
    (server, service)
}

#[tokio::test]
async fn debate_over_tcp() {
    let (server, service) = start().await;
    let mut alice = Client::connect(server.addr()).await.unwrap();
    let mut bob = Client::connect(server.addr()).await.unwrap();

    alice.ping().await.unwrap();
    alice.create_player("alice").await.unwrap();
    bob.create_player("bob").await.unwrap();

    let ticket = alice
        .create_room("alice", None, Some(Genre::Philosophy), Some(2))
        .await
        .unwrap();
    let invite = InviteUrl::parse(&ticket.invite).unwrap();
    assert_eq!(invite.socket_addr(), server.addr());
    assert_eq!(invite.room_key, ticket.room_key);

    // Keys are accepted in any case
    let key = ticket.room_key.as_str().to_ascii_lowercase();
    let room = bob.join_room(&key, "bob").await.unwrap();
    assert_eq!(room.status, RoomStatus::InProgress);
    assert_eq!(room.topic, ticket.topic);

    let err = bob.submit_argument(&key, "bob", "I go first").await.unwrap_err();
    assert_eq!(err.server_code(), Some(ErrorCode::NotYourTurn));

    let reply = alice
        .submit_argument(&key, "alice", "A carefully reasoned opening statement")
        .await
        .unwrap();
    assert_eq!(
        reply,
        SubmitReply::Accepted {
            current_round: 1,
            next_turn: ParticipantId::new("bob")
        }
    );
    bob.submit_argument(&key, "bob", "No").await.unwrap();
    alice
        .submit_argument(&key, "alice", "An even longer and more carefully argued rebuttal")
        .await
        .unwrap();
    let reply = bob.submit_argument(&key, "bob", "Still no").await.unwrap();

    let SubmitReply::Completed(record) = reply else {
        panic!("expected the debate to complete");
    };
    assert_eq!(record.outcome, Outcome::Winner(ParticipantId::new("alice")));
    assert_eq!(record.reason, "More developed arguments");

    let history = alice.debate_history(&key).await.unwrap();
    assert_eq!(history, record);
    let status = bob.room_status(&key).await.unwrap();
    assert_eq!(status.result, Some(record));

    service.flush_records().await;
    let alice_profile = alice.get_player("alice").await.unwrap();
    assert_eq!(alice_profile.wins, 1);
    let board = bob.leaderboard(10).await.unwrap();
    assert_eq!(board[0].username, "alice");

    server.shutdown();
}

#[tokio::test]
async fn errors_are_coded() {
    let (server, _service) = start().await;
    let mut client = Client::connect(server.addr()).await.unwrap();

    let err = client.room_status("ZZZZZZ").await.unwrap_err();
    assert_eq!(err.server_code(), Some(ErrorCode::NotFound));

    let err = client.room_status("not a key!").await.unwrap_err();
    assert_eq!(err.server_code(), Some(ErrorCode::Validation));

    let err = client.create_room("stranger", Some("topic"), None, None).await.unwrap_err();
    assert_eq!(err.server_code(), Some(ErrorCode::PlayerNotFound));

    client.create_player("carol").await.unwrap();
    let err = client.create_player("carol").await.unwrap_err();
    assert_eq!(err.server_code(), Some(ErrorCode::PlayerExists));

    assert_eq!(client.genres().await.unwrap().len(), Genre::ALL.len());
    assert_eq!(client.topics(Genre::Brainrot).await.unwrap().len(), 3);
}

#[tokio::test]
async fn garbage_request_keeps_connection_open() {
    let (server, _service) = start().await;
    let mut stream = TcpStream::connect(server.addr()).await.unwrap();

    let payload = br#"{"type":"reticulate_splines"}"#;
    stream.write_all(&(payload.len() as u32).to_be_bytes()).await.unwrap();
    stream.write_all(payload).await.unwrap();

    let mut len = [0u8; 4];
    stream.read_exact(&mut len).await.unwrap();
    let mut body = vec![0u8; u32::from_be_bytes(len) as usize];
    stream.read_exact(&mut body).await.unwrap();
    let reply: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(reply["type"], "error");
    assert_eq!(reply["code"], "validation");

    let ping = br#"{"type":"ping"}"#;
    stream.write_all(&(ping.len() as u32).to_be_bytes()).await.unwrap();
    stream.write_all(ping).await.unwrap();
    stream.read_exact(&mut len).await.unwrap();
    let mut body = vec![0u8; u32::from_be_bytes(len) as usize];
    stream.read_exact(&mut body).await.unwrap();
    let reply: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(reply["type"], "pong");
}
