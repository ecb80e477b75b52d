pub mod ai;
pub mod game;
pub mod utils;

use gloo_timers::future::TimeoutFuture;
use serde::Serialize;
use serde_wasm_bindgen::to_value;
use std::fmt::Display;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use web_sys::js_sys::Promise;

pub use ai::{choose_move, score_moves, AiAgent, AiConfig, AiDecision, AiError, MoveScore};
pub use game::{
    AiTurn, Board, BoardError, Cell, GameEvent, GameMode, GameModeParseError, GameSession, Outcome,
    Player, PlayerConfig, SessionConfig, SessionError, SessionSnapshot, Side, SymbolParseError,
    TurnResolution,
};

#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn start() {
    utils::set_panic_hook();
}

fn to_js_error<E: Serialize + Display>(error: E) -> JsValue {
    to_value(&error).unwrap_or_else(|_| JsValue::from_str(&error.to_string()))
}

fn serde_to_js_error<E: Display>(error: E) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn to_json<T: Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(serde_to_js_error)
}

#[wasm_bindgen]
pub struct TicTacToe {
    session: GameSession,
}

#[wasm_bindgen]
impl TicTacToe {
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<TicTacToe, JsValue> {
        let config = match config_json {
            Some(json) => serde_json::from_str(&json).map_err(serde_to_js_error)?,
            None => SessionConfig::default(),
        };
        let session = GameSession::new(config).map_err(to_js_error)?;
        Ok(TicTacToe { session })
    }

    pub fn board(&self) -> String {
        self.session.board().to_string()
    }

    pub fn status(&self) -> String {
        self.session.status_message()
    }

    pub fn state_json(&self) -> Result<String, JsValue> {
        to_json(&self.session.snapshot())
    }

    pub fn play(&mut self, index: usize) -> Result<String, JsValue> {
        let resolution = self.session.play(index).map_err(to_js_error)?;
        to_json(&resolution)
    }

    pub fn play_ai(&mut self) -> Result<String, JsValue> {
        let turn = self.session.play_ai().map_err(to_js_error)?;
        to_json(&turn)
    }

    /// 等待 `delay_ms`（默认取配置中的思考时间）后计算 AI 落子，
    /// 结果需通过 `apply_ai_move` 落到棋盘上。
    pub fn think_ai(&self, delay_ms: Option<u32>) -> Promise {
        if let Err(error) = self.session.ensure_ai_turn() {
            return Promise::reject(&to_js_error(error));
        }
        let Some(mut agent) = self.session.fresh_agent() else {
            return Promise::reject(&to_js_error(SessionError::NotAiTurn));
        };
        let board = self.session.board().clone();
        let delay = delay_ms.unwrap_or(self.session.ai_config().think_delay_ms);

        future_to_promise(async move {
            if delay > 0 {
                TimeoutFuture::new(delay).await;
            }
            let decision = agent.decide(&board).map_err(to_js_error)?;
            Ok(JsValue::from_str(&to_json(&decision)?))
        })
    }

    pub fn apply_ai_move(&mut self, index: usize) -> Result<String, JsValue> {
        let resolution = self.session.apply_ai_move(index).map_err(to_js_error)?;
        to_json(&resolution)
    }

    pub fn restart(&mut self) -> Result<String, JsValue> {
        self.session.restart();
        self.state_json()
    }
}

/// 为 `ai_symbol` 一方计算落子点，对手使用相反的标记。
#[wasm_bindgen(js_name = "chooseMove")]
pub fn choose_move_js(cells: &str, ai_symbol: &str, depth: Option<u8>) -> Result<usize, JsValue> {
    let board: Board = cells.parse().map_err(to_js_error)?;
    let ai_side: Side = ai_symbol.parse().map_err(to_js_error)?;
    let depth = depth.unwrap_or(ai::MAX_DEPTH);
    choose_move(&board, ai_side, ai_side.opponent(), depth).map_err(to_js_error)
}

#[wasm_bindgen(js_name = "checkOutcome")]
pub fn check_outcome(cells: &str) -> Result<JsValue, JsValue> {
    let board: Board = cells.parse().map_err(to_js_error)?;
    to_value(&board.outcome()).map_err(JsValue::from)
}
