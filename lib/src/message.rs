//! Channel message types.
//!
//! Every viewer exchanges `ClashMessage` envelopes over one persistent
//! WebSocket: `{ "type": "<kind>", ...payload }`. Senders apply a change
//! locally first and then broadcast it; receivers apply the same change.
//! There are no sequence numbers or acknowledgements, the last message wins.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::player::coerce_id;
use crate::{ClashError, Player, PlayerId};

/// Server-assigned clash session identifier.
pub type ClashId = u64;

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Full clash state, as carried by `initial_state` and returned by
/// `GET /clash/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClashSnapshot {
    #[serde(default, deserialize_with = "nullable")]
    pub players: Vec<Player>,
    #[serde(default, deserialize_with = "nullable")]
    pub player_list: Vec<Player>,
    #[serde(default = "default_maps", deserialize_with = "nullable")]
    pub maps: Vec<u32>,
    #[serde(default, deserialize_with = "nullable")]
    pub clash_started: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub clash_finished: bool,
    #[serde(default)]
    pub winner: Option<Player>,
    #[serde(default, deserialize_with = "nullable")]
    pub show_modal: bool,
}

impl ClashSnapshot {
    /// Number of active maps; an empty list still means one map.
    pub fn map_count(&self) -> u32 {
        (self.maps.len() as u32).max(1)
    }
}

fn default_maps() -> Vec<u32> {
    vec![1]
}

/// Treat an explicit `null` like a missing field.
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn lenient_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let raw = Value::deserialize(deserializer)?;
    coerce_id(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid id {raw}")))
}

fn map_index<E: serde::de::Error>(raw: &Value) -> Result<u32, E> {
    coerce_id(raw)
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| E::custom(format!("invalid map index {raw}")))
}

/// Map indices arrive as numbers or numeric strings.
fn lenient_index<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    map_index(&Value::deserialize(deserializer)?)
}

fn lenient_opt_index<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<u32>, D::Error> {
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(raw) => map_index(&raw).map(Some),
    }
}

// ---------------------------------------------------------------------------
// ClashMessage
// ---------------------------------------------------------------------------

/// One channel envelope. Field names follow the wire protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClashMessage {
    /// Replace every state field.
    InitialState { data: ClashSnapshot },
    /// Replace the competitor list.
    UpdatePlayers { data: Vec<Player> },
    /// Append a player to the roster.
    NewPlayer { data: Player },
    AddMap {
        #[serde(rename = "newMapIndex", deserialize_with = "lenient_index")]
        new_map_index: u32,
        #[serde(rename = "updatedPlayers", default, deserialize_with = "nullable")]
        updated_players: Vec<Player>,
    },
    RemoveMap {
        #[serde(
            rename = "mapIndexToRemove",
            default,
            deserialize_with = "lenient_opt_index",
            skip_serializing_if = "Option::is_none"
        )]
        map_index_to_remove: Option<u32>,
        #[serde(rename = "updatedPlayers", default, deserialize_with = "nullable")]
        updated_players: Vec<Player>,
    },
    RemovePlayerFromClash {
        #[serde(rename = "playerId", deserialize_with = "lenient_id")]
        player_id: PlayerId,
    },
    DeletePlayerFromList {
        #[serde(rename = "playerId", deserialize_with = "lenient_id")]
        player_id: PlayerId,
    },
    ClashStarted {
        #[serde(rename = "clashId", deserialize_with = "lenient_id")]
        clash_id: ClashId,
    },
    ClashFinished,
    ShowModal {
        #[serde(default)]
        winner: Option<Player>,
    },
}

impl ClashMessage {
    /// Every `type` value this client understands.
    pub const KINDS: &[&str] = &[
        "initial_state",
        "update_players",
        "new_player",
        "add_map",
        "remove_map",
        "remove_player_from_clash",
        "delete_player_from_list",
        "clash_started",
        "clash_finished",
        "show_modal",
    ];

    /// The wire `type` of this message.
    pub fn kind(&self) -> &'static str {
        match self {
            ClashMessage::InitialState { .. } => "initial_state",
            ClashMessage::UpdatePlayers { .. } => "update_players",
            ClashMessage::NewPlayer { .. } => "new_player",
            ClashMessage::AddMap { .. } => "add_map",
            ClashMessage::RemoveMap { .. } => "remove_map",
            ClashMessage::RemovePlayerFromClash { .. } => "remove_player_from_clash",
            ClashMessage::DeletePlayerFromList { .. } => "delete_player_from_list",
            ClashMessage::ClashStarted { .. } => "clash_started",
            ClashMessage::ClashFinished => "clash_finished",
            ClashMessage::ShowModal { .. } => "show_modal",
        }
    }

    /// Decode a text frame.
    ///
    /// Unknown kinds come back as `ClashError::UnknownKind` so callers can
    /// ignore them without treating them as corrupt input.
    pub fn parse(text: &str) -> Result<Self, ClashError> {
        let value: Value = serde_json::from_str(text)?;
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or(ClashError::MissingKind)?
            .to_string();
        if !Self::KINDS.contains(&kind.as_str()) {
            return Err(ClashError::UnknownKind(kind));
        }
        serde_json::from_value(value).map_err(|source| ClashError::Payload { kind, source })
    }

    pub fn to_json(&self) -> Result<String, ClashError> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MapStats;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_add_map_wire_names() {
        let msg = ClashMessage::parse(
            r#"{"type":"add_map","newMapIndex":2,"updatedPlayers":[{"id":1,"name":"A","kills_map1":3,"rank_map1":1,"kills_map2":0,"rank_map2":0}]}"#,
        )
        .unwrap();
        let ClashMessage::AddMap {
            new_map_index,
            updated_players,
        } = msg
        else {
            panic!("expected add_map");
        };
        assert_eq!(new_map_index, 2);
        assert_eq!(updated_players[0].stats(1), MapStats::new(3.0, 1.0));
        assert_eq!(updated_players[0].maps.len(), 2);
    }

    #[test]
    fn unknown_kind_is_reported_separately() {
        let err = ClashMessage::parse(r#"{"type":"confetti","data":1}"#).unwrap_err();
        assert!(matches!(err, ClashError::UnknownKind(ref k) if k == "confetti"));

        let err = ClashMessage::parse(r#"{"data":1}"#).unwrap_err();
        assert!(matches!(err, ClashError::MissingKind));

        let err = ClashMessage::parse("not json").unwrap_err();
        assert!(matches!(err, ClashError::Malformed(_)));

        let err = ClashMessage::parse(r#"{"type":"new_player"}"#).unwrap_err();
        assert!(matches!(err, ClashError::Payload { ref kind, .. } if kind == "new_player"));
    }

    #[test]
    fn clash_ids_accept_strings() {
        let msg = ClashMessage::parse(r#"{"type":"clash_started","clashId":"17"}"#).unwrap();
        assert_eq!(msg, ClashMessage::ClashStarted { clash_id: 17 });
    }

    #[test]
    fn map_indices_accept_strings() {
        let msg = ClashMessage::parse(
            r#"{"type":"add_map","newMapIndex":"3","updatedPlayers":[]}"#,
        )
        .unwrap();
        assert_eq!(
            msg,
            ClashMessage::AddMap {
                new_map_index: 3,
                updated_players: Vec::new(),
            }
        );

        let msg = ClashMessage::parse(
            r#"{"type":"remove_map","mapIndexToRemove":" 2 ","updatedPlayers":null}"#,
        )
        .unwrap();
        assert_eq!(
            msg,
            ClashMessage::RemoveMap {
                map_index_to_remove: Some(2),
                updated_players: Vec::new(),
            }
        );

        let msg = ClashMessage::parse(r#"{"type":"remove_map","mapIndexToRemove":null}"#).unwrap();
        assert!(matches!(
            msg,
            ClashMessage::RemoveMap {
                map_index_to_remove: None,
                ..
            }
        ));

        let err = ClashMessage::parse(r#"{"type":"add_map","newMapIndex":"4294967296"}"#)
            .unwrap_err();
        assert!(matches!(err, ClashError::Payload { ref kind, .. } if kind == "add_map"));
    }

    #[test]
    fn empty_snapshot_defaults_to_one_idle_map() {
        let snapshot: ClashSnapshot = serde_json::from_str("{}").unwrap();
        assert_eq!(snapshot.maps, vec![1]);
        assert_eq!(snapshot.map_count(), 1);
        assert!(snapshot.players.is_empty());
        assert!(!snapshot.clash_started && !snapshot.clash_finished);
        assert!(snapshot.winner.is_none());
    }

    #[test]
    fn encodes_tagged_envelopes() {
        let json = ClashMessage::RemovePlayerFromClash { player_id: 4 }
            .to_json()
            .unwrap();
        assert_eq!(json, r#"{"type":"remove_player_from_clash","playerId":4}"#);

        let json = ClashMessage::ClashFinished.to_json().unwrap();
        assert_eq!(json, r#"{"type":"clash_finished"}"#);
    }

    #[test]
    fn snapshot_tolerates_nulls_and_missing_fields() {
        let msg = ClashMessage::parse(
            r#"{"type":"initial_state","data":{"players":null,"maps":[],"clashStarted":true,"winner":null}}"#,
        )
        .unwrap();
        let ClashMessage::InitialState { data } = msg else {
            panic!("expected initial_state");
        };
        assert!(data.players.is_empty());
        assert!(data.player_list.is_empty());
        assert_eq!(data.map_count(), 1);
        assert!(data.clash_started);
        assert!(!data.show_modal);
    }

    #[test]
    fn every_listed_kind_is_known() {
        for kind in ClashMessage::KINDS {
            assert!(
                !matches!(
                    ClashMessage::parse(&format!(r#"{{"type":"{kind}"}}"#)),
                    Err(ClashError::UnknownKind(_))
                ),
                "{kind} should be known"
            );
        }
    }
}
