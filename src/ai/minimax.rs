use std::ops::{Deref, DerefMut};

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::game::{Board, Cell, Outcome, Side};

/// 井字棋最多九步，完整搜索所需的深度。
pub const MAX_DEPTH: u8 = 9;
/// 立即获胜的分值，随搜索步数递减。
pub const WIN_SCORE: i32 = 10;

const DEFAULT_THINK_DELAY_MS: u32 = 600;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AiConfig {
    pub depth: u8,
    pub think_delay_ms: u32,
}

impl AiConfig {
    pub fn with_depth(mut self, depth: u8) -> Self {
        self.depth = depth.clamp(1, MAX_DEPTH);
        self
    }

    pub fn with_think_delay(mut self, delay_ms: u32) -> Self {
        self.think_delay_ms = delay_ms;
        self
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            depth: MAX_DEPTH,
            think_delay_ms: DEFAULT_THINK_DELAY_MS,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Error)]
#[serde(tag = "type")]
pub enum AiError {
    #[error("no legal moves: the board is full or the game is already decided")]
    NoLegalMoves,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct MoveScore {
    pub index: usize,
    pub score: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AiDecision {
    pub index: usize,
    pub score: i32,
    /// 与最佳分值并列的全部落子点，`index` 从中随机选出。
    pub candidates: Vec<usize>,
    pub nodes: u64,
    pub depth: u8,
}

/// 假设性落子，离开作用域时自动撤销。
struct Placement<'a> {
    board: &'a mut Board,
    index: usize,
}

impl<'a> Placement<'a> {
    fn new(board: &'a mut Board, index: usize, side: Side) -> Self {
        board.place(index, Cell::Taken(side));
        Self { board, index }
    }
}

impl Deref for Placement<'_> {
    type Target = Board;

    fn deref(&self) -> &Board {
        self.board
    }
}

impl DerefMut for Placement<'_> {
    fn deref_mut(&mut self) -> &mut Board {
        self.board
    }
}

impl Drop for Placement<'_> {
    fn drop(&mut self) {
        self.board.place(self.index, Cell::Empty);
    }
}

struct Search {
    ai_side: Side,
    opponent_side: Side,
    depth_cap: u8,
    nodes: u64,
}

impl Search {
    fn new(ai_side: Side, opponent_side: Side, depth_cap: u8) -> Self {
        Self {
            ai_side,
            opponent_side,
            depth_cap,
            nodes: 0,
        }
    }

    fn root_scores(&mut self, board: &Board) -> Result<Vec<MoveScore>, AiError> {
        let moves = board.empty_indices();
        if board.outcome().is_terminal() || moves.is_empty() {
            return Err(AiError::NoLegalMoves);
        }

        let mut scratch = board.clone();
        let mut scores = Vec::with_capacity(moves.len());
        for index in moves {
            let mut placed = Placement::new(&mut scratch, index, self.ai_side);
            let score = self.minimax(&mut placed, self.depth_cap, false);
            scores.push(MoveScore { index, score });
        }
        Ok(scores)
    }

    fn minimax(&mut self, board: &mut Board, depth: u8, maximizing: bool) -> i32 {
        self.nodes += 1;

        // Plies played below the root move; shorter wins and longer losses score better.
        let ply = i32::from(self.depth_cap.saturating_sub(depth));
        match board.outcome() {
            Outcome::Win(side) if side == self.ai_side => return WIN_SCORE - ply,
            Outcome::Win(_) => return -WIN_SCORE + ply,
            Outcome::Tie => return 0,
            Outcome::InProgress => {}
        }

        if depth == 0 {
            return 0;
        }

        let moves = board.empty_indices();
        if moves.is_empty() {
            return 0;
        }

        let side = if maximizing {
            self.ai_side
        } else {
            self.opponent_side
        };
        let mut best = if maximizing { i32::MIN } else { i32::MAX };
        for index in moves {
            let mut placed = Placement::new(board, index, side);
            let score = self.minimax(&mut placed, depth - 1, !maximizing);
            best = if maximizing {
                best.max(score)
            } else {
                best.min(score)
            };
        }
        best
    }
}

/// `ai_side` 每个合法落子点的根节点分值，按下标升序。
pub fn score_moves(
    board: &Board,
    ai_side: Side,
    opponent_side: Side,
    depth_cap: u8,
) -> Result<Vec<MoveScore>, AiError> {
    Search::new(ai_side, opponent_side, depth_cap).root_scores(board)
}

fn select_move<R: Rng + ?Sized>(
    board: &Board,
    ai_side: Side,
    opponent_side: Side,
    depth_cap: u8,
    rng: &mut R,
) -> Result<AiDecision, AiError> {
    let mut search = Search::new(ai_side, opponent_side, depth_cap);
    let scores = search.root_scores(board)?;

    let best_score = scores
        .iter()
        .map(|entry| entry.score)
        .max()
        .ok_or(AiError::NoLegalMoves)?;
    let candidates: Vec<usize> = scores
        .iter()
        .filter(|entry| entry.score == best_score)
        .map(|entry| entry.index)
        .collect();
    let index = candidates
        .choose(rng)
        .copied()
        .ok_or(AiError::NoLegalMoves)?;

    Ok(AiDecision {
        index,
        score: best_score,
        candidates,
        nodes: search.nodes,
        depth: depth_cap,
    })
}

/// 为 `ai_side` 选择落子点：深度受限的 minimax，并在并列最佳的落子点中随机选择。
///
/// 棋盘本身不会被修改。棋局已结束或没有空格时返回 [`AiError::NoLegalMoves`]。
pub fn choose_move(
    board: &Board,
    ai_side: Side,
    opponent_side: Side,
    depth_cap: u8,
) -> Result<usize, AiError> {
    let mut rng = SmallRng::from_entropy();
    select_move(board, ai_side, opponent_side, depth_cap, &mut rng).map(|decision| decision.index)
}

/// 绑定到某一方的 AI 玩家。
#[derive(Debug, Clone)]
pub struct AiAgent {
    config: AiConfig,
    side: Side,
    rng: SmallRng,
}

impl AiAgent {
    pub fn new(config: AiConfig, side: Side) -> Self {
        Self {
            config,
            side,
            rng: SmallRng::from_entropy(),
        }
    }

    pub fn with_seed(config: AiConfig, side: Side, seed: u64) -> Self {
        Self {
            config,
            side,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn decide(&mut self, board: &Board) -> Result<AiDecision, AiError> {
        select_move(
            board,
            self.side,
            self.side.opponent(),
            self.config.depth,
            &mut self.rng,
        )
    }
}
