//! 游戏核心逻辑模块（棋盘、胜负判定、对局控制）。

pub mod board;
pub mod session;

pub use board::{
    Board, BoardError, Cell, Outcome, Side, SymbolParseError, BOARD_SIZE, WINNING_LINES,
};
pub use session::{
    AiTurn, GameEvent, GameMode, GameModeParseError, GameSession, Player, PlayerConfig,
    SessionConfig, SessionError, SessionSnapshot, TurnResolution,
};
