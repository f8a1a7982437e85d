use std::sync::Arc;

use axum::extract::{Json, Path, State};
use axum::http::Response;
use uuid::Uuid;

use crate::cards::catalog;
use crate::Resp;

use super::effects::{Modifier, LEADERS};
use super::session::{DecisionAnswer, Session, SessionSetup};
use super::state::Zone;
use super::store::{InMemoryStore, SessionStore};

type Store = State<Arc<InMemoryStore>>;

fn default_level() -> u32 {
    1
}

#[derive(serde::Deserialize)]
pub struct CardAction {
    session_id: Uuid,
    card: String,
    #[serde(default = "default_level")]
    level: u32,
}

#[derive(serde::Deserialize)]
pub struct ZonedCardAction {
    session_id: Uuid,
    card: String,
    #[serde(default = "default_level")]
    level: u32,
    zone: Zone,
}

#[derive(serde::Deserialize)]
pub struct MoveAction {
    session_id: Uuid,
    card: String,
    #[serde(default = "default_level")]
    level: u32,
    from: Zone,
    to: Zone,
}

#[derive(serde::Deserialize)]
pub struct BattleReport {
    session_id: Uuid,
    victory: bool,
    #[serde(default)]
    enemy_remaining: u32,
}

#[derive(serde::Deserialize)]
pub struct Candidate {
    card: String,
    #[serde(default = "default_level")]
    level: u32,
}

#[derive(serde::Deserialize)]
pub struct RecommendRequest {
    session_id: Uuid,
    candidates: Vec<Candidate>,
}

#[derive(serde::Deserialize)]
pub struct DecisionAction {
    session_id: Uuid,
    decision_id: Uuid,
    answer: DecisionAnswer,
}

pub async fn cards() -> Response<String> {
    Resp::payload(&catalog().all())
}

pub async fn leaders() -> Response<String> {
    Resp::payload(&LEADERS)
}

#[derive(serde::Serialize)]
struct ModifierInfo {
    modifier: Modifier,
    description: &'static str,
}

pub async fn modifiers() -> Response<String> {
    let listing: Vec<ModifierInfo> = Modifier::ALL
        .iter()
        .map(|&modifier| ModifierInfo {
            modifier,
            description: modifier.description(),
        })
        .collect();
    Resp::payload(&listing)
}

pub async fn new_game(State(store): Store, Json(setup): Json<SessionSetup>) -> Response<String> {
    let session = match Session::create(&setup) {
        Ok(session) => session,
        Err(reason) => return Resp::reject(reason),
    };

    let id = Uuid::new_v4();
    store.put(id, session).await;
    tracing::info!("Created game session {id}.");

    #[derive(serde::Serialize)]
    struct Created {
        session_id: Uuid,
    }
    Resp::payload(&Created { session_id: id })
}

pub async fn state(State(store): Store, Path(id): Path<Uuid>) -> Response<String> {
    let Some(session) = store.get(id).await else {
        return Resp::e404("Session not found.");
    };
    let session = session.lock().await;
    Resp::payload(&session.snapshot())
}

pub async fn evict(State(store): Store, Path(id): Path<Uuid>) -> Response<String> {
    if store.remove(id).await {
        tracing::info!("Evicted game session {id}.");
        Resp::ok("Session removed.")
    } else {
        Resp::e404("Session not found.")
    }
}

pub async fn buy_card(State(store): Store, Json(req): Json<CardAction>) -> Response<String> {
    let Some(session) = store.get(req.session_id).await else {
        return Resp::e404("Session not found.");
    };
    let mut session = session.lock().await;
    match session.buy_card(&req.card, req.level) {
        Ok(outcome) => Resp::payload(&outcome),
        Err(reason) => Resp::reject(reason),
    }
}

pub async fn manual_merge(State(store): Store, Json(req): Json<CardAction>) -> Response<String> {
    let Some(session) = store.get(req.session_id).await else {
        return Resp::e404("Session not found.");
    };
    let mut session = session.lock().await;
    match session.manual_merge(&req.card, req.level) {
        Ok(outcome) => Resp::payload(&outcome),
        Err(reason) => Resp::reject(reason),
    }
}

pub async fn delete_card(State(store): Store, Json(req): Json<ZonedCardAction>) -> Response<String> {
    let Some(session) = store.get(req.session_id).await else {
        return Resp::e404("Session not found.");
    };
    let mut session = session.lock().await;
    match session.delete_card(&req.card, req.level, req.zone) {
        Ok(outcome) => Resp::payload(&outcome),
        Err(reason) => Resp::reject(reason),
    }
}

pub async fn sell_card(State(store): Store, Json(req): Json<ZonedCardAction>) -> Response<String> {
    let Some(session) = store.get(req.session_id).await else {
        return Resp::e404("Session not found.");
    };
    let mut session = session.lock().await;
    match session.sell_card(&req.card, req.level, req.zone) {
        Ok(outcome) => Resp::payload(&outcome),
        Err(reason) => Resp::reject(reason),
    }
}

pub async fn move_card(State(store): Store, Json(req): Json<MoveAction>) -> Response<String> {
    let Some(session) = store.get(req.session_id).await else {
        return Resp::e404("Session not found.");
    };
    let mut session = session.lock().await;
    match session.move_card(&req.card, req.level, req.from, req.to) {
        Ok(()) => Resp::ok(format!(
            "{} level {} moved to the {}.",
            req.card, req.level, req.to
        )),
        Err(reason) => Resp::reject(reason),
    }
}

pub async fn move_to_board(State(store): Store, Json(req): Json<CardAction>) -> Response<String> {
    let Some(session) = store.get(req.session_id).await else {
        return Resp::e404("Session not found.");
    };
    let mut session = session.lock().await;
    match session.move_to_board(&req.card, req.level) {
        Ok(outcome) => Resp::payload(&outcome),
        Err(reason) => Resp::reject(reason),
    }
}

pub async fn battle_result(State(store): Store, Json(req): Json<BattleReport>) -> Response<String> {
    let Some(session) = store.get(req.session_id).await else {
        return Resp::e404("Session not found.");
    };
    let mut session = session.lock().await;
    let outcome = session.battle_result(req.victory, req.enemy_remaining);
    Resp::payload(&outcome)
}

pub async fn recommend(State(store): Store, Json(req): Json<RecommendRequest>) -> Response<String> {
    let offers: Vec<(String, u32)> = req
        .candidates
        .into_iter()
        .map(|c| (c.card, c.level))
        .collect();
    let Some(session) = store.get(req.session_id).await else {
        return Resp::e404("Session not found.");
    };
    let session = session.lock().await;
    match session.recommend(&offers) {
        Ok(recommendations) => Resp::payload(&recommendations),
        Err(reason) => Resp::reject(reason),
    }
}

pub async fn resolve_decision(
    State(store): Store,
    Json(req): Json<DecisionAction>,
) -> Response<String> {
    let Some(session) = store.get(req.session_id).await else {
        return Resp::e404("Session not found.");
    };
    let mut session = session.lock().await;
    match session.resolve_decision(req.decision_id, req.answer) {
        Ok(outcome) => Resp::payload(&outcome),
        Err(reason) => Resp::reject(reason),
    }
}
