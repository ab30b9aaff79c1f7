use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::response::Html;
use axum::Json;
use serde::Serialize;
use serde_json::{Map, Value};

use super::{ApiError, AppState};
use crate::board::Position;
use crate::engine::EngineError;

const INDEX_HTML: &str = include_str!("../../static/index.html");

const MISSING_FEN: &str = "Missing 'fen' in request";
const MISSING_FEN_OR_MOVE: &str = "Missing 'fen' or 'move' in request";

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub engine: String,
}

#[derive(Debug, Serialize)]
pub struct BoardResponse {
    pub board: String,
    pub legal_moves: Vec<String>,
    pub game_over: bool,
}

#[derive(Debug, Serialize)]
pub struct MoveResponse {
    pub board: String,
    pub legal_moves: Vec<String>,
    pub game_over: bool,
    pub result: Option<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct BestMoveResponse {
    pub best_move: Option<String>,
    pub board: String,
}

#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    /// White's point of view: `+35`, `-120`, `#3`, `#-2`.
    pub score: String,
    pub best_move: Option<String>,
    pub pv: Vec<String>,
    pub depth: u32,
    pub nodes: u64,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ValidateResponse {
    Valid { valid: bool, board: String, turn: &'static str, legal_moves: Vec<String>, game_over: bool },
    Invalid { valid: bool, error: String },
}

#[derive(Debug, Serialize)]
pub struct GameInfoResponse {
    pub fen: String,
    pub turn: &'static str,
    pub castling_rights: String,
    pub en_passant: Option<String>,
    pub halfmove_clock: u32,
    pub fullmove_number: u16,
    pub legal_moves: Vec<String>,
    pub is_check: bool,
    pub is_checkmate: bool,
    pub is_stalemate: bool,
    pub is_game_over: bool,
    pub result: Option<&'static str>,
}

fn json_object(body: &[u8]) -> Option<Map<String, Value>> {
    match serde_json::from_slice(body) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

fn str_field<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    obj.get(key).and_then(Value::as_str)
}

fn fen_field(body: &[u8]) -> Result<(Map<String, Value>, String), ApiError> {
    let obj = json_object(body).ok_or(ApiError::MissingField(MISSING_FEN))?;
    let fen = str_field(&obj, "fen").ok_or(ApiError::MissingField(MISSING_FEN))?.to_string();
    Ok((obj, fen))
}

fn time_budget(state: &AppState, obj: &Map<String, Value>) -> Result<Duration, ApiError> {
    let requested = match obj.get("time_limit") {
        None | Some(Value::Null) => None,
        Some(v) => Some(v.as_f64().ok_or_else(|| ApiError::InvalidTimeLimit(format!("{v} is not a number")))?),
    };
    state.limits.budget(requested).map_err(ApiError::InvalidTimeLimit)
}

pub async fn index() -> Html<&'static str> { Html(INDEX_HTML) }

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        message: "Chess server is running",
        engine: state.pool.name().to_string(),
    })
}

pub async fn new_game() -> Json<BoardResponse> {
    let pos = Position::startpos();
    Json(BoardResponse { board: pos.fen(), legal_moves: pos.legal_moves(), game_over: pos.is_game_over() })
}

pub async fn make_move(body: Bytes) -> Result<Json<MoveResponse>, ApiError> {
    let obj = json_object(&body).ok_or(ApiError::MissingField(MISSING_FEN_OR_MOVE))?;
    let (fen, mv) = match (str_field(&obj, "fen"), str_field(&obj, "move")) {
        (Some(f), Some(m)) => (f, m),
        _ => return Err(ApiError::MissingField(MISSING_FEN_OR_MOVE)),
    };
    let mut pos = Position::from_fen(fen)?;
    pos.play_uci(mv)?;
    Ok(Json(MoveResponse {
        board: pos.fen(),
        legal_moves: pos.legal_moves(),
        game_over: pos.is_game_over(),
        result: pos.result(),
    }))
}

pub async fn get_best_move(State(state): State<Arc<AppState>>, body: Bytes) -> Result<Json<BestMoveResponse>, ApiError> {
    let (obj, fen) = fen_field(&body)?;
    let pos = Position::from_fen(&fen)?;
    let budget = time_budget(&state, &obj)?;
    let board = pos.fen();
    let query = board.clone();
    let best_move = state.pool.run(move |engine| engine.best_move(&query, budget)).await?;
    Ok(Json(BestMoveResponse { best_move, board }))
}

pub async fn analyze_position(State(state): State<Arc<AppState>>, body: Bytes) -> Result<Json<AnalysisResponse>, ApiError> {
    let (obj, fen) = fen_field(&body)?;
    let pos = Position::from_fen(&fen)?;
    let budget = time_budget(&state, &obj)?;
    let query = pos.fen();
    let analysis = state.pool.run(move |engine| engine.analyse(&query, budget)).await?;
    let score = analysis.score
        .ok_or_else(|| EngineError::Protocol("engine reported no score".into()))?
        .white_pov(pos.side_to_move());
    Ok(Json(AnalysisResponse {
        score: score.to_string(),
        best_move: analysis.best_move,
        pv: analysis.pv,
        depth: analysis.depth,
        nodes: analysis.nodes,
    }))
}

pub async fn validate_fen(body: Bytes) -> Json<ValidateResponse> {
    let checked = fen_field(&body).and_then(|(_, fen)| Ok(Position::from_fen(&fen)?));
    Json(match checked {
        Ok(pos) => ValidateResponse::Valid {
            valid: true,
            board: pos.fen(),
            turn: pos.turn(),
            legal_moves: pos.legal_moves(),
            game_over: pos.is_game_over(),
        },
        Err(e) => ValidateResponse::Invalid { valid: false, error: e.to_string() },
    })
}

pub async fn game_info(body: Bytes) -> Result<Json<GameInfoResponse>, ApiError> {
    let (_, fen) = fen_field(&body)?;
    let pos = Position::from_fen(&fen)?;
    Ok(Json(GameInfoResponse {
        fen: pos.fen(),
        turn: pos.turn(),
        castling_rights: pos.castling_rights(),
        en_passant: pos.en_passant(),
        halfmove_clock: pos.halfmove_clock(),
        fullmove_number: pos.fullmove_number(),
        legal_moves: pos.legal_moves(),
        is_check: pos.is_check(),
        is_checkmate: pos.is_checkmate(),
        is_stalemate: pos.is_stalemate(),
        is_game_over: pos.is_game_over(),
        result: pos.result(),
    }))
}
