//! TCP server exposing the debate service
//!
//! One task per connection. Requests on a connection are answered in order;
//! connections are served concurrently and only contend on the room they touch.

use std::net::SocketAddr;
use std::sync::Arc;

use agora_core::service::SubmitResult;
use agora_core::{DebateService, Error as CoreError, ErrorCode, RoomKey};
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::error::{Error, Result};
use crate::frame::{read_frame, write_frame};
use crate::invite::InviteUrl;
use crate::protocol::{Request, Response};

/// Debate server handle
pub struct Server {
    addr: SocketAddr,
    shutdown_tx: broadcast::Sender<()>,
}

impl Server {
    /// Bind and start accepting connections
    pub async fn start(bind: SocketAddr, service: Arc<DebateService>) -> Result<Self> {
        let listener = TcpListener::bind(bind).await?;
        let addr = listener.local_addr()?;

        info!(addr = %addr, "Server started");

        let (shutdown_tx, _) = broadcast::channel(1);
        tokio::spawn(accept_loop(listener, addr, service, shutdown_tx.clone()));

        Ok(Server { addr, shutdown_tx })
    }

    /// Get the server's bound address
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Stop accepting and close every connection after its current request
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
        info!("Server shutdown initiated");
    }
}

async fn accept_loop(
    listener: TcpListener,
    public_addr: SocketAddr,
    service: Arc<DebateService>,
    shutdown_tx: broadcast::Sender<()>,
) {
    let mut shutdown_rx = shutdown_tx.subscribe();
    loop {
        tokio::select! {
            result = listener.accept() => {
                match result {
                    Ok((stream, peer)) => {
                        debug!(peer = %peer, "New connection");
                        tokio::spawn(handle_connection(
                            stream,
                            peer,
                            public_addr,
                            service.clone(),
                            shutdown_tx.subscribe(),
                        ));
                    }
                    Err(e) => {
                        error!(error = %e, "Accept failed");
                    }
                }
            }
            _ = shutdown_rx.recv() => {
                info!("Accept loop shutting down");
                break;
            }
        }
    }
}

async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    public_addr: SocketAddr,
    service: Arc<DebateService>,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    let (mut reader, mut writer) = tokio::io::split(stream);

    loop {
        let request = tokio::select! {
            frame = read_frame::<Request, _>(&mut reader) => frame,
            _ = shutdown_rx.recv() => break,
        };

        let response = match request {
            Ok(request) => dispatch(&service, request, public_addr).await,
            Err(Error::Decode(e)) => {
                debug!(peer = %peer, error = %e, "Undecodable request");
                Response::Error {
                    code: ErrorCode::Validation,
                    message: format!("invalid request: {}", e),
                }
            }
            Err(Error::ConnectionClosed) => {
                debug!(peer = %peer, "Connection closed");
                break;
            }
            Err(e) => {
                warn!(peer = %peer, error = %e, "Read error");
                break;
            }
        };

        if let Err(e) = write_frame(&mut writer, &response).await {
            warn!(peer = %peer, error = %e, "Write error");
            break;
        }
    }

    let _ = writer.shutdown().await;
}

fn room_key(input: &str) -> std::result::Result<RoomKey, CoreError> {
    RoomKey::parse(input).ok_or_else(|| CoreError::Validation(format!("invalid room key: {:?}", input)))
}

/// Answer one request against the service
pub async fn dispatch(service: &DebateService, request: Request, public_addr: SocketAddr) -> Response {
    match handle(service, request, public_addr).await {
        Ok(response) => response,
        Err(e) => {
            if e.kind() == agora_core::ErrorKind::Internal {
                error!(error = %e, "Request failed");
            } else {
                debug!(error = %e, "Request rejected");
            }
            e.into()
        }
    }
}

async fn handle(
    service: &DebateService,
    request: Request,
    public_addr: SocketAddr,
) -> std::result::Result<Response, CoreError> {
    let response = match request {
        Request::Ping => Response::Pong,
        Request::CreatePlayer { username } => Response::Player {
            player: service.create_player(&username)?,
        },
        Request::GetPlayer { username } => Response::Player {
            player: service.get_player(&username)?,
        },
        Request::Leaderboard { limit } => Response::Players {
            players: service.leaderboard(limit)?,
        },
        Request::ListGenres => Response::Genres {
            genres: service.genres().to_vec(),
        },
        Request::Topics { genre } => Response::Topics {
            genre,
            topics: service.topics_for_genre(genre).await,
        },
        Request::CreateRoom {
            participant,
            topic,
            genre,
            rounds,
        } => {
            let created = service.create_room(participant, topic, genre, rounds).await?;
            let invite = InviteUrl::from_addr(public_addr, created.room_key.clone()).to_url();
            Response::RoomCreated {
                room_key: created.room_key,
                topic: created.topic,
                invite,
            }
        }
        Request::JoinRoom {
            room_key: key,
            participant,
        } => Response::Room {
            room: service.join_room(&room_key(&key)?, participant)?,
        },
        Request::SubmitArgument {
            room_key: key,
            participant,
            argument,
        } => match service
            .submit_argument(&room_key(&key)?, &participant, argument)
            .await?
        {
            SubmitResult::InProgress {
                current_round,
                next_turn,
            } => Response::ArgumentAccepted {
                current_round,
                next_turn,
            },
            SubmitResult::Completed(record) => Response::DebateCompleted {
                record: (*record).clone(),
            },
        },
        Request::RoomStatus { room_key: key } => Response::Room {
            room: service.room_status(&room_key(&key)?)?,
        },
        Request::DebateHistory { room_key: key } => Response::Debate {
            record: service.debate_history(&room_key(&key)?)?,
        },
    };
    Ok(response)
}
