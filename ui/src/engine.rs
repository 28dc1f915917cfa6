//! ClashSyncEngine: the single owner of clash state.
//!
//! Every user action is applied locally first and then broadcast on the
//! channel so other viewers converge; some actions also call the backend.
//! Backend results land in a shared pending queue (callbacks may run on any
//! thread) and are applied on the next `poll()`, so all state mutation happens
//! on the caller's frame loop.
//!
//! Requests that touch the session carry the session epoch they were issued
//! in. A reset bumps the epoch, and results from an older epoch are dropped.

use std::collections::VecDeque;
use std::ops::RangeInclusive;
use std::sync::{Arc, Mutex};

use clashboard::{format_score, is_complete, pick_winner, ranked, total_score};

use crate::storage::SessionStore;
use crate::types::{
    ApiRequest, ClashError, ClashId, ClashMessage, ClashSnapshot, CreatedResponse, Field,
    MapStatUpdate, MapStats, NewPlayerRequest, Player, PlayerId, RankingEntry, decode_body,
};

// ---------------------------------------------------------------------------
// Collaborator seams
// ---------------------------------------------------------------------------

/// Completion callback for a backend request: the response body on 2xx.
pub type ResponseHandler = Box<dyn FnOnce(Result<Vec<u8>, ClashError>) + Send>;

/// Request/response backend. `on_done` is called exactly once, from any thread.
pub trait Backend {
    fn send(&self, request: ApiRequest, on_done: ResponseHandler);
}

/// Outbound half of the broadcast channel.
pub trait Channel {
    fn send(&mut self, text: String);
}

// ---------------------------------------------------------------------------
// Pending results queue: shared between backend callbacks and the engine.
// ---------------------------------------------------------------------------

enum Completion {
    Snapshot {
        epoch: u64,
        result: Result<ClashSnapshot, ClashError>,
    },
    Roster(Result<Vec<Player>, ClashError>),
    ClashCreated {
        epoch: u64,
        result: Result<ClashId, ClashError>,
    },
    PlayerCreated {
        name: String,
        result: Result<PlayerId, ClashError>,
    },
    PlayerDeleted {
        player_id: PlayerId,
        result: Result<(), ClashError>,
    },
    Ranking(Result<Vec<RankingEntry>, ClashError>),
    AllClashesDeleted(Result<(), ClashError>),
    /// Fire-and-forget writes: only logged.
    Acknowledged {
        what: String,
        result: Result<(), ClashError>,
    },
}

type PendingHandle = Arc<Mutex<VecDeque<Completion>>>;

fn created_id(result: Result<Vec<u8>, ClashError>) -> Result<u64, ClashError> {
    let created: CreatedResponse = decode_body(&result?)?;
    created
        .id
        .ok_or_else(|| ClashError::Body("no id returned by server".into()))
}

// ---------------------------------------------------------------------------
// Notices
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// A message the dashboard shows in a blocking dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    fn info(message: &str) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    fn error(message: &str) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

pub struct ClashSyncEngine {
    // Clash state
    players: Vec<Player>,
    roster: Vec<Player>,
    map_count: u32,
    clash_started: bool,
    clash_finished: bool,
    winner: Option<Player>,
    show_results: bool,
    clash_id: Option<ClashId>,

    // Auxiliary views
    ranking: Vec<RankingEntry>,
    notice: Option<Notice>,

    // Collaborators
    backend: Box<dyn Backend>,
    store: Box<dyn SessionStore>,
    channel: Option<Box<dyn Channel>>,
    channel_open: bool,
    pending: PendingHandle,

    // Bookkeeping
    epoch: u64,
    revision: u64,
    listeners: Vec<Box<dyn Fn(u64)>>,
    waker: Option<Arc<dyn Fn() + Send + Sync>>,
}

impl ClashSyncEngine {
    pub fn new(backend: Box<dyn Backend>, store: Box<dyn SessionStore>) -> Self {
        Self {
            players: Vec::new(),
            roster: Vec::new(),
            map_count: 1,
            clash_started: false,
            clash_finished: false,
            winner: None,
            show_results: false,
            clash_id: None,
            ranking: Vec::new(),
            notice: None,
            backend,
            store,
            channel: None,
            channel_open: false,
            pending: Arc::new(Mutex::new(VecDeque::new())),
            epoch: 0,
            revision: 0,
            listeners: Vec::new(),
            waker: None,
        }
    }

    // ----- Observers -----

    /// Register a listener called with the new revision after every state change.
    pub fn subscribe(&mut self, listener: impl Fn(u64) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Called from backend callback threads when a result is queued.
    pub fn set_waker(&mut self, waker: impl Fn() + Send + Sync + 'static) {
        self.waker = Some(Arc::new(waker));
    }

    fn changed(&mut self) {
        self.revision += 1;
        for listener in &self.listeners {
            listener(self.revision);
        }
    }

    // ----- Read access -----

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn roster(&self) -> &[Player] {
        &self.roster
    }

    pub fn maps(&self) -> RangeInclusive<u32> {
        1..=self.map_count
    }

    pub fn map_count(&self) -> u32 {
        self.map_count
    }

    pub fn clash_started(&self) -> bool {
        self.clash_started
    }

    pub fn clash_finished(&self) -> bool {
        self.clash_finished
    }

    pub fn winner(&self) -> Option<&Player> {
        self.winner.as_ref()
    }

    pub fn show_results(&self) -> bool {
        self.show_results
    }

    pub fn clash_id(&self) -> Option<ClashId> {
        self.clash_id
    }

    pub fn ranking(&self) -> &[RankingEntry] {
        &self.ranking
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn is_channel_open(&self) -> bool {
        self.channel_open
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// A competitor's score, formatted to two decimals.
    pub fn total_score(&self, player: &Player) -> String {
        format_score(total_score(player, self.map_count))
    }

    /// Competitors with their scores, best first.
    pub fn ranked_players(&self) -> Vec<(&Player, f64)> {
        ranked(&self.players, self.map_count)
    }

    // ----- Backend plumbing -----

    fn request<F>(&self, request: ApiRequest, complete: F)
    where
        F: FnOnce(Result<Vec<u8>, ClashError>) -> Completion + Send + 'static,
    {
        log::debug!("{request}");
        let pending = Arc::clone(&self.pending);
        let waker = self.waker.clone();
        self.backend.send(
            request,
            Box::new(move |result| {
                let completion = complete(result);
                pending
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .push_back(completion);
                if let Some(wake) = waker {
                    wake();
                }
            }),
        );
    }

    fn acknowledge(&self, request: ApiRequest) {
        let what = request.to_string();
        self.request(request, move |result| Completion::Acknowledged {
            what,
            result: result.map(|_| ()),
        });
    }

    /// Drain queued backend results and apply them.
    pub fn poll(&mut self) {
        let completions: Vec<Completion> = self
            .pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .drain(..)
            .collect();
        if completions.is_empty() {
            return;
        }
        for completion in completions {
            self.complete(completion);
        }
        self.changed();
    }

    fn is_stale(&self, epoch: u64, what: &str) -> bool {
        let stale = epoch != self.epoch;
        if stale {
            log::debug!("discarding {what} from a previous session");
        }
        stale
    }

    fn complete(&mut self, completion: Completion) {
        match completion {
            Completion::Snapshot { epoch, result } => {
                if self.is_stale(epoch, "clash state") {
                    return;
                }
                match result {
                    Ok(snapshot) => self.apply_snapshot(snapshot),
                    Err(e) => log::error!("error fetching clash state: {e}"),
                }
            }
            Completion::Roster(result) => match result {
                Ok(players) => self.roster = players,
                Err(e) => log::error!("error fetching players: {e}"),
            },
            Completion::ClashCreated { epoch, result } => {
                if self.is_stale(epoch, "clash creation") {
                    return;
                }
                match result {
                    Ok(id) => {
                        log::info!("clash started with id {id}");
                        self.clash_id = Some(id);
                        self.store.save(id);
                        self.clash_started = true;
                        self.broadcast(&ClashMessage::ClashStarted { clash_id: id });
                    }
                    Err(e) => log::error!("error starting clash: {e}"),
                }
            }
            Completion::PlayerCreated { name, result } => match result {
                Ok(id) => {
                    let player = Player::new(id, name);
                    if !self.roster.iter().any(|p| p.id == id) {
                        self.roster.push(player.clone());
                    }
                    self.broadcast(&ClashMessage::NewPlayer { data: player });
                }
                Err(e) => log::error!("error adding player {name:?}: {e}"),
            },
            Completion::PlayerDeleted { player_id, result } => match result {
                Ok(()) => {
                    self.roster.retain(|p| p.id != player_id);
                    self.broadcast(&ClashMessage::DeletePlayerFromList { player_id });
                }
                Err(e) => log::error!("failed to delete player {player_id}: {e}"),
            },
            Completion::Ranking(result) => match result {
                Ok(entries) => self.ranking = entries,
                Err(e) => {
                    log::error!("error fetching player ranking: {e}");
                    self.ranking.clear();
                }
            },
            Completion::AllClashesDeleted(result) => match result {
                Ok(()) => {
                    log::info!("all clashes deleted");
                    self.notice = Some(Notice::info("All clashes deleted successfully."));
                }
                Err(e) => {
                    log::error!("error deleting clashes: {e}");
                    self.notice = Some(Notice::error("Failed to delete clashes."));
                }
            },
            Completion::Acknowledged { what, result } => match result {
                Ok(()) => log::debug!("{what}: ok"),
                Err(e) => log::error!("{what}: {e}"),
            },
        }
    }

    // ----- Bootstrap -----

    /// Restore the persisted session, if any.
    pub fn bootstrap(&mut self) {
        if let Some(id) = self.store.load() {
            log::info!("restoring clash {id}");
            self.clash_id = Some(id);
            self.fetch_snapshot();
        }
    }

    fn fetch_snapshot(&self) {
        let Some(id) = self.clash_id else {
            return;
        };
        let epoch = self.epoch;
        self.request(ApiRequest::GetClash(id), move |result| {
            Completion::Snapshot {
                epoch,
                result: result.and_then(|bytes| decode_body(&bytes)),
            }
        });
    }

    fn fetch_roster(&self) {
        self.request(ApiRequest::ListPlayers, |result| {
            Completion::Roster(result.and_then(|bytes| decode_body(&bytes)))
        });
    }

    pub fn fetch_ranking(&self) {
        self.request(ApiRequest::Ranking, |result| {
            Completion::Ranking(result.and_then(|bytes| decode_body(&bytes)))
        });
    }

    // ----- Channel -----

    /// Install a freshly connected channel. Nothing is sent until it opens.
    pub fn attach_channel(&mut self, channel: Box<dyn Channel>) {
        self.channel = Some(channel);
        self.channel_open = false;
    }

    /// The channel is open: pull a fresh snapshot in case a reload raced it.
    pub fn on_channel_open(&mut self) {
        log::info!("channel connected");
        self.channel_open = true;
        self.fetch_snapshot();
        self.fetch_roster();
        self.changed();
    }

    pub fn on_channel_closed(&mut self) {
        log::warn!("channel disconnected");
        self.channel = None;
        self.channel_open = false;
        self.changed();
    }

    fn broadcast(&mut self, msg: &ClashMessage) {
        let channel = match self.channel.as_mut() {
            Some(channel) if self.channel_open => channel,
            _ => {
                log::warn!("channel not connected, {} not sent", msg.kind());
                return;
            }
        };
        match msg.to_json() {
            Ok(text) => channel.send(text),
            Err(e) => log::error!("failed to encode {}: {e}", msg.kind()),
        }
    }

    /// Handle one inbound text frame.
    pub fn receive(&mut self, text: &str) {
        match ClashMessage::parse(text) {
            Ok(msg) => self.apply(msg),
            Err(ClashError::UnknownKind(kind)) => log::warn!("unknown message type: {kind}"),
            Err(e) => log::warn!("dropping channel message: {e}"),
        }
    }

    /// Apply a message broadcast by another viewer (or the server).
    pub fn apply(&mut self, msg: ClashMessage) {
        log::debug!("applying {}", msg.kind());
        match msg {
            ClashMessage::InitialState { data } => self.apply_snapshot(data),
            ClashMessage::UpdatePlayers { data } => self.players = data,
            ClashMessage::NewPlayer { data } => {
                if !self.roster.iter().any(|p| p.id == data.id) {
                    self.roster.push(data);
                }
            }
            ClashMessage::AddMap {
                new_map_index,
                updated_players,
            } => {
                // Grows by one map at most; an echo of our own add carries
                // the index we already have.
                if new_map_index > self.map_count {
                    self.map_count = self.map_count.saturating_add(1);
                }
                self.players = updated_players;
            }
            ClashMessage::RemoveMap {
                map_index_to_remove,
                updated_players,
            } => {
                let is_last = map_index_to_remove.is_none_or(|i| i == self.map_count);
                if is_last && self.map_count > 1 {
                    self.map_count -= 1;
                }
                self.players = updated_players;
            }
            ClashMessage::RemovePlayerFromClash { player_id } => {
                self.players.retain(|p| p.id != player_id);
            }
            ClashMessage::DeletePlayerFromList { player_id } => {
                self.roster.retain(|p| p.id != player_id);
            }
            ClashMessage::ClashStarted { clash_id } => {
                self.clash_started = true;
                self.clash_id = Some(clash_id);
                self.store.save(clash_id);
            }
            ClashMessage::ClashFinished => self.reset_session(),
            ClashMessage::ShowModal { winner } => {
                self.clash_finished |= winner.is_some();
                self.winner = winner;
                self.show_results = true;
            }
        }
        self.changed();
    }

    fn apply_snapshot(&mut self, snapshot: ClashSnapshot) {
        self.map_count = snapshot.map_count();
        self.players = snapshot.players;
        self.roster = snapshot.player_list;
        self.clash_started = snapshot.clash_started;
        self.clash_finished = snapshot.clash_finished;
        self.winner = snapshot.winner;
        self.show_results = snapshot.show_modal;
    }

    /// Back to an empty single-map clash with no session.
    fn reset_session(&mut self) {
        self.show_results = false;
        self.clash_started = false;
        self.clash_finished = false;
        self.winner = None;
        self.players.clear();
        self.map_count = 1;
        self.clash_id = None;
        self.store.clear();
        self.epoch += 1;
    }

    // ----- Maps -----

    pub fn add_map(&mut self) {
        let Some(index) = self.map_count.checked_add(1) else {
            log::warn!("add_map: map limit reached");
            return;
        };
        self.map_count = index;
        for player in &mut self.players {
            player.maps.insert(index, MapStats::default());
        }
        self.broadcast(&ClashMessage::UpdatePlayers {
            data: self.players.clone(),
        });
        self.broadcast(&ClashMessage::AddMap {
            new_map_index: index,
            updated_players: self.players.clone(),
        });
        self.changed();
    }

    /// Drop the last map. Refused while only one map is left.
    pub fn remove_map(&mut self) {
        if self.map_count <= 1 {
            log::debug!("remove_map: only one map left");
            return;
        }
        let index = self.map_count;
        self.map_count -= 1;
        for player in &mut self.players {
            player.maps.remove(&index);
        }
        self.broadcast(&ClashMessage::UpdatePlayers {
            data: self.players.clone(),
        });
        self.broadcast(&ClashMessage::RemoveMap {
            map_index_to_remove: Some(index),
            updated_players: self.players.clone(),
        });
        self.changed();
    }

    // ----- Clash lifecycle -----

    pub fn start_clash(&mut self) {
        if self.clash_started {
            log::debug!("start_clash: clash already running");
            return;
        }
        let epoch = self.epoch;
        self.request(ApiRequest::CreateClash, move |result| {
            Completion::ClashCreated {
                epoch,
                result: created_id(result),
            }
        });
    }

    /// Pick the best competitor and open the results for every viewer.
    pub fn determine_winner(&mut self) {
        let Some(top) = pick_winner(&self.players, self.map_count).cloned() else {
            return;
        };
        log::info!("clash won by {}", top.name);
        self.winner = Some(top.clone());
        self.show_results = true;
        self.clash_finished = true;
        self.broadcast(&ClashMessage::ShowModal { winner: Some(top) });
        self.changed();
    }

    /// Determine the winner once every competitor has every active map filled.
    /// Returns whether that happened on this call.
    pub fn check_completion(&mut self) -> bool {
        if self.clash_finished || !is_complete(&self.players, self.map_count) {
            return false;
        }
        self.determine_winner();
        true
    }

    /// Close the results and tear the session down for everyone.
    pub fn close_results(&mut self) {
        let finished = self.clash_id;
        self.reset_session();
        if let Some(id) = finished {
            self.acknowledge(ApiRequest::DeleteClash(id));
        }
        self.broadcast(&ClashMessage::ClashFinished);
        self.changed();
    }

    /// Delete every stored clash. The outcome is reported as a notice.
    pub fn delete_all_clashes(&self) {
        self.request(ApiRequest::DeleteAllClashes, |result| {
            Completion::AllClashesDeleted(result.map(|_| ()))
        });
    }

    pub fn dismiss_notice(&mut self) {
        if self.notice.take().is_some() {
            self.changed();
        }
    }

    // ----- Competitors -----

    /// Update one competitor field from raw text input.
    ///
    /// Stat fields are coerced to numbers (anything non-numeric is 0). The
    /// change is broadcast, stat changes are saved to the backend, and the
    /// clash is checked for completion.
    pub fn edit_field(&mut self, player_id: PlayerId, field: Field, raw: &str) {
        if self.clash_finished {
            log::debug!("edit_field: clash finished");
            return;
        }
        if field.map_index().is_some_and(|i| !self.maps().contains(&i)) {
            log::debug!("edit_field: {field} is not an active map");
            return;
        }
        let Some(pos) = self.players.iter().position(|p| p.id == player_id) else {
            log::debug!("edit_field: player {player_id} not in clash");
            return;
        };

        let mut updated = self.players[pos].clone();
        let value = match field {
            Field::Name => {
                updated.name = raw.to_string();
                None
            }
            Field::Kills(_) | Field::Rank(_) => {
                let value = clashboard::coerce_number(raw);
                updated.set_stat(field, value);
                Some(value)
            }
        };
        self.players[pos] = updated;

        self.broadcast(&ClashMessage::UpdatePlayers {
            data: self.players.clone(),
        });

        if let (Some(clash_id), Some(map_index), Some(update)) = (
            self.clash_id,
            field.map_index(),
            value.and_then(|v| MapStatUpdate::for_field(field, v)),
        ) {
            self.acknowledge(ApiRequest::UpdateMapStat {
                clash_id,
                player_id,
                map_index,
                update,
            });
        }

        self.check_completion();
        self.changed();
    }

    /// Enter a roster player into the clash with zeroed stats.
    pub fn add_player_to_clash(&mut self, player_id: PlayerId) {
        if self.clash_started {
            log::debug!("add_player_to_clash: clash already running");
            return;
        }
        if self.players.iter().any(|p| p.id == player_id) {
            log::debug!("add_player_to_clash: player {player_id} already entered");
            return;
        }
        let Some(entry) = self.roster.iter().find(|p| p.id == player_id) else {
            log::debug!("add_player_to_clash: player {player_id} not in roster");
            return;
        };
        let competitor = entry.clone().with_zeroed_maps(self.map_count);
        self.players.push(competitor);
        self.broadcast(&ClashMessage::UpdatePlayers {
            data: self.players.clone(),
        });
        self.changed();
    }

    pub fn remove_competitor(&mut self, player_id: PlayerId) {
        let before = self.players.len();
        self.players.retain(|p| p.id != player_id);
        if self.players.len() == before {
            return;
        }
        self.broadcast(&ClashMessage::RemovePlayerFromClash { player_id });
        self.changed();
    }

    // ----- Roster -----

    /// Create a player on the backend and add it to the roster.
    pub fn add_player_to_roster(&mut self, name: &str) {
        let name = name.trim();
        if name.is_empty() || self.clash_started {
            log::debug!("add_player_to_roster: rejected");
            return;
        }
        let body = NewPlayerRequest {
            id: 0,
            name: name.to_string(),
        };
        let name = body.name.clone();
        self.request(ApiRequest::CreatePlayer(body), move |result| {
            Completion::PlayerCreated {
                name,
                result: created_id(result),
            }
        });
    }

    /// Delete a player on the backend; the roster only changes if that succeeds.
    pub fn remove_roster_entry(&mut self, player_id: PlayerId) {
        self.request(ApiRequest::DeletePlayer(player_id), move |result| {
            Completion::PlayerDeleted {
                player_id,
                result: result.map(|_| ()),
            }
        });
    }
}
