use axum::{
    extract::{
        ws::{Message, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tracing::debug;

use crate::auth;
use crate::database::models::{Role, User};
use crate::error::ApiError;
use crate::events::Room;
use crate::realtime::RoomSubscription;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct WsQuery {
    pub token: String,
}

/// Commands a connected client may send, e.g. joining the room of a
/// discussion it just opened.
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
enum ClientCommand {
    Join { room: String },
}

/// GET /ws - authenticated push channel. The client presents its bearer
/// token as a query parameter (browsers cannot set headers on WebSocket
/// upgrades); the server derives the room set from the user's role and
/// jurisdiction.
pub async fn ws(
    State(state): State<AppState>,
    Query(query): Query<WsQuery>,
    upgrade: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    let claims = auth::verify_token(&query.token)?;

    let user: Option<User> = sqlx::query_as(
        "SELECT id, name, email, password_hash, role, province, district, sector, created_at \
         FROM users WHERE id = $1",
    )
    .bind(claims.sub)
    .fetch_optional(&state.pool)
    .await?;

    let user = user.ok_or_else(|| {
        ApiError::unauthorized("The user belonging to this token no longer exists")
    })?;

    Ok(upgrade.on_upgrade(move |socket| handle_socket(socket, state, user)))
}

async fn handle_socket(socket: WebSocket, state: AppState, user: User) {
    let rooms = default_rooms(&user);
    debug!("ws connect: {} joining {:?}", user.id, rooms);

    let mut subscription = RoomSubscription::attach(state.hub.clone(), &rooms).await;
    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            outbound = subscription.receiver.recv() => {
                match outbound {
                    Some(payload) => {
                        if sink.send(Message::Text(payload)).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
            inbound = stream.next() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => {
                        if let Ok(ClientCommand::Join { room }) = serde_json::from_str(&text) {
                            debug!("ws: {} joining extra room {}", user.id, room);
                            subscription.join(&room).await;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(_)) => break,
                }
            }
        }
    }

    debug!("ws disconnect: {}", user.id);
}

/// Rooms a client is placed into on connect, keyed by role and jurisdiction.
pub fn default_rooms(user: &User) -> Vec<String> {
    let mut rooms = vec![Room::User(user.id).to_string()];
    match user.role {
        Role::Citizen => {}
        Role::SectorAdmin => {
            rooms.push(Room::Sector(user.location.sector.clone()).to_string());
            rooms.push(Room::SectorAdmins.to_string());
        }
        Role::DistrictAdmin => {
            rooms.push(Room::District(user.location.district.clone()).to_string());
            rooms.push(Room::DistrictAdmins.to_string());
        }
        Role::SuperAdmin => {
            rooms.push(Room::SuperAdmins.to_string());
        }
    }
    rooms
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::Location;
    use chrono::Utc;
    use uuid::Uuid;

    fn user(role: Role) -> User {
        User {
            id: Uuid::nil(),
            name: "Test".into(),
            email: "t@example.com".into(),
            password_hash: String::new(),
            role,
            location: Location::new("Kigali", "Gasabo", "Remera"),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn citizen_gets_only_user_room() {
        assert_eq!(
            default_rooms(&user(Role::Citizen)),
            vec!["user-00000000-0000-0000-0000-000000000000".to_string()]
        );
    }

    #[test]
    fn sector_admin_joins_sector_rooms() {
        let rooms = default_rooms(&user(Role::SectorAdmin));
        assert!(rooms.contains(&"sector-Remera".to_string()));
        assert!(rooms.contains(&"sector-admins".to_string()));
    }

    #[test]
    fn district_admin_joins_district_rooms() {
        let rooms = default_rooms(&user(Role::DistrictAdmin));
        assert!(rooms.contains(&"district-Gasabo".to_string()));
        assert!(rooms.contains(&"district-admins".to_string()));
    }

    #[test]
    fn super_admin_joins_super_room() {
        let rooms = default_rooms(&user(Role::SuperAdmin));
        assert!(rooms.contains(&"super-admins".to_string()));
        assert_eq!(rooms.len(), 2);
    }
}
