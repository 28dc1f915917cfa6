//! REST surface of the clash backend: request descriptions and
//! request/response bodies.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::player::coerce_id;
use crate::{ClashError, ClashId, Field, PlayerId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        })
    }
}

/// One call against the backend. Paths are relative to the configured base URL.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiRequest {
    /// GET /clash/{id}: full `ClashSnapshot`.
    GetClash(ClashId),
    /// POST /clash: `CreatedResponse`.
    CreateClash,
    /// DELETE /clash/{id}
    DeleteClash(ClashId),
    /// DELETE /clash
    DeleteAllClashes,
    /// PUT /clash/{id}/player/{playerId}/map/{mapIndex}
    UpdateMapStat {
        clash_id: ClashId,
        player_id: PlayerId,
        map_index: u32,
        update: MapStatUpdate,
    },
    /// GET /players: `Vec<Player>`.
    ListPlayers,
    /// POST /players: `CreatedResponse`.
    CreatePlayer(NewPlayerRequest),
    /// DELETE /players/{id}
    DeletePlayer(PlayerId),
    /// GET /clash/players/ranking: `Vec<RankingEntry>`.
    Ranking,
}

impl ApiRequest {
    pub fn method(&self) -> Method {
        match self {
            ApiRequest::GetClash(_) | ApiRequest::ListPlayers | ApiRequest::Ranking => Method::Get,
            ApiRequest::CreateClash | ApiRequest::CreatePlayer(_) => Method::Post,
            ApiRequest::UpdateMapStat { .. } => Method::Put,
            ApiRequest::DeleteClash(_)
            | ApiRequest::DeleteAllClashes
            | ApiRequest::DeletePlayer(_) => Method::Delete,
        }
    }

    pub fn path(&self) -> String {
        match self {
            ApiRequest::GetClash(id) | ApiRequest::DeleteClash(id) => format!("/clash/{id}"),
            ApiRequest::CreateClash | ApiRequest::DeleteAllClashes => "/clash".into(),
            ApiRequest::UpdateMapStat {
                clash_id,
                player_id,
                map_index,
                ..
            } => format!("/clash/{clash_id}/player/{player_id}/map/{map_index}"),
            ApiRequest::ListPlayers | ApiRequest::CreatePlayer(_) => "/players".into(),
            ApiRequest::DeletePlayer(id) => format!("/players/{id}"),
            ApiRequest::Ranking => "/clash/players/ranking".into(),
        }
    }

    /// JSON body, if the request carries one.
    pub fn body(&self) -> Option<Vec<u8>> {
        match self {
            ApiRequest::UpdateMapStat { update, .. } => serde_json::to_vec(update).ok(),
            ApiRequest::CreatePlayer(req) => serde_json::to_vec(req).ok(),
            _ => None,
        }
    }
}

impl fmt::Display for ApiRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method(), self.path())
    }
}

// ---------------------------------------------------------------------------
// Bodies
// ---------------------------------------------------------------------------

/// PUT body for a single per-map stat: `{"kills": 12}` or `{"rank": 3}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MapStatUpdate {
    Kills(f64),
    Rank(f64),
}

impl MapStatUpdate {
    /// Body for `field`, or `None` for fields that are not per-map stats.
    pub fn for_field(field: Field, value: f64) -> Option<Self> {
        match field {
            Field::Name => None,
            Field::Kills(_) => Some(MapStatUpdate::Kills(value)),
            Field::Rank(_) => Some(MapStatUpdate::Rank(value)),
        }
    }
}

/// POST /players request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPlayerRequest {
    pub id: PlayerId,
    pub name: String,
}

/// POST /clash and POST /players response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedResponse {
    #[serde(default, deserialize_with = "lenient_opt_id")]
    pub id: Option<u64>,
}

/// GET /clash/players/ranking entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingEntry {
    pub id: PlayerId,
    pub name: String,
    #[serde(default)]
    pub points: f64,
}

/// Error body returned with non-2xx responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn lenient_opt_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    let raw = Value::deserialize(deserializer)?;
    Ok(coerce_id(&raw).filter(|id| *id != 0))
}

/// Decode a JSON response body.
pub fn decode_body<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ClashError> {
    serde_json::from_slice(bytes).map_err(|e| ClashError::Body(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn paths_and_methods() {
        let put = ApiRequest::UpdateMapStat {
            clash_id: 9,
            player_id: 4,
            map_index: 2,
            update: MapStatUpdate::Rank(3.0),
        };
        assert_eq!(put.to_string(), "PUT /clash/9/player/4/map/2");
        assert_eq!(put.body().unwrap(), br#"{"rank":3.0}"#.to_vec());

        assert_eq!(ApiRequest::DeleteAllClashes.to_string(), "DELETE /clash");
        assert_eq!(ApiRequest::GetClash(5).to_string(), "GET /clash/5");
        assert_eq!(ApiRequest::DeletePlayer(8).to_string(), "DELETE /players/8");
        assert_eq!(ApiRequest::Ranking.to_string(), "GET /clash/players/ranking");
        assert!(ApiRequest::CreateClash.body().is_none());
    }

    #[test]
    fn created_response_without_id() {
        let resp: CreatedResponse = decode_body(br#"{"message":"ok"}"#).unwrap();
        assert_eq!(resp.id, None);
        let resp: CreatedResponse = decode_body(br#"{"id":"12"}"#).unwrap();
        assert_eq!(resp.id, Some(12));
    }

    #[test]
    fn non_array_ranking_is_a_body_error() {
        let err = decode_body::<Vec<RankingEntry>>(br#"{"error":"nope"}"#).unwrap_err();
        assert!(matches!(err, ClashError::Body(_)));
    }
}
