//! AI 对手：深度受限的 minimax 搜索。

pub mod minimax;

pub use minimax::{
    choose_move, score_moves, AiAgent, AiConfig, AiDecision, AiError, MoveScore, MAX_DEPTH,
    WIN_SCORE,
};
