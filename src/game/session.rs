use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

use super::board::{Board, BoardError, Cell, Outcome, Side};
use crate::ai::{AiAgent, AiConfig, AiDecision, AiError};
use crate::console_log;

const DEFAULT_PLAYER_ONE: &str = "Player One";
const DEFAULT_PLAYER_TWO: &str = "Player Two";
const AI_NAME: &str = "AI";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    #[default]
    Player,
    Ai,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
#[error("unknown game mode '{0}', expected player or ai")]
pub struct GameModeParseError(pub String);

impl FromStr for GameMode {
    type Err = GameModeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "player" | "pvp" | "human" => Ok(GameMode::Player),
            "ai" | "computer" | "cpu" => Ok(GameMode::Ai),
            _ => Err(GameModeParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<Side>,
}

/// 前端传入的会话配置，缺省字段使用默认值。
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SessionConfig {
    pub mode: GameMode,
    pub player_one: PlayerConfig,
    /// AI 模式下忽略：AI 总是使用与玩家一相反的标记。
    pub player_two: PlayerConfig,
    pub ai: AiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Player {
    pub name: String,
    pub side: Side,
    pub is_ai: bool,
}

impl Player {
    fn human(name: String, side: Side) -> Self {
        Self {
            name,
            side,
            is_ai: false,
        }
    }

    fn ai(side: Side) -> Self {
        Self {
            name: AI_NAME.to_string(),
            side,
            is_ai: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum GameEvent {
    GameStarted {
        mode: GameMode,
        player_one: Side,
        player_two: Side,
    },
    MovePlayed {
        side: Side,
        index: usize,
    },
    TurnChanged {
        side: Side,
    },
    GameWon {
        winner: Side,
        #[serde(skip_serializing_if = "Option::is_none")]
        line: Option<[usize; 3]>,
    },
    GameTied,
    GameRestarted,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
#[serde(tag = "type")]
pub enum SessionError {
    #[error("both players must choose different symbols (both picked {symbol})")]
    DuplicateSymbols { symbol: Side },
    #[error("the game is already over")]
    GameOver,
    #[error("cell {index} is already taken")]
    CellOccupied { index: usize },
    #[error("it is not a human player's turn")]
    NotHumanTurn,
    #[error("it is not the AI's turn")]
    NotAiTurn,
    #[error(transparent)]
    Board {
        #[from]
        error: BoardError,
    },
    #[error(transparent)]
    Ai {
        #[from]
        error: AiError,
    },
}

/// 一次落子之后的结果，返回给前端用于渲染。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TurnResolution {
    pub board: Board,
    pub outcome: Outcome,
    pub events: Vec<GameEvent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<Side>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AiTurn {
    pub decision: AiDecision,
    pub resolution: TurnResolution,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub board: Board,
    pub mode: GameMode,
    pub players: [Player; 2],
    pub current: Side,
    pub outcome: Outcome,
    pub over: bool,
    pub status: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub event_log: Vec<GameEvent>,
}

/// 单局对战的控制器：负责轮次、合法性检查与重开。
#[derive(Debug, Clone)]
pub struct GameSession {
    board: Board,
    mode: GameMode,
    players: [Player; 2],
    current: usize,
    over: bool,
    ai_config: AiConfig,
    agent: Option<AiAgent>,
    event_log: Vec<GameEvent>,
}

impl GameSession {
    pub fn new(config: SessionConfig) -> Result<Self, SessionError> {
        let players = resolve_players(&config)?;
        let mut session = Self {
            board: Board::new(),
            mode: config.mode,
            players,
            current: 0,
            over: false,
            ai_config: config.ai.with_depth(config.ai.depth),
            agent: None,
            event_log: Vec::new(),
        };
        session.agent = session.fresh_agent();
        session.record(GameEvent::GameStarted {
            mode: session.mode,
            player_one: session.players[0].side,
            player_two: session.players[1].side,
        });
        console_log!(
            "tic-tac-toe: {} ({}) vs {} ({})",
            session.players[0].name,
            session.players[0].side,
            session.players[1].name,
            session.players[1].side
        );
        Ok(session)
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn players(&self) -> &[Player; 2] {
        &self.players
    }

    pub fn current_player(&self) -> &Player {
        &self.players[self.current]
    }

    pub fn ai_config(&self) -> &AiConfig {
        &self.ai_config
    }

    pub fn ai_side(&self) -> Option<Side> {
        self.players
            .iter()
            .find(|player| player.is_ai)
            .map(|player| player.side)
    }

    pub fn outcome(&self) -> Outcome {
        self.board.outcome()
    }

    pub fn is_over(&self) -> bool {
        self.over
    }

    pub fn event_log(&self) -> &[GameEvent] {
        &self.event_log
    }

    /// 一个新的 AI 玩家（使用新的随机源），人人对战时为 `None`。
    pub fn fresh_agent(&self) -> Option<AiAgent> {
        self.ai_side().map(|side| AiAgent::new(self.ai_config, side))
    }

    pub fn status_message(&self) -> String {
        let outcome = self.board.outcome();
        if let Some(winner) = outcome.winner() {
            let name = self
                .players
                .iter()
                .find(|player| player.side == winner)
                .map(|player| player.name.as_str())
                .unwrap_or(AI_NAME);
            return format!("{name} wins!");
        }

        if outcome == Outcome::Tie {
            "It's a tie!".to_string()
        } else {
            format!("It's {}'s turn.", self.current_player().name)
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            board: self.board.clone(),
            mode: self.mode,
            players: self.players.clone(),
            current: self.current_player().side,
            outcome: self.board.outcome(),
            over: self.over,
            status: self.status_message(),
            event_log: self.event_log.clone(),
        }
    }

    pub fn ensure_ai_turn(&self) -> Result<(), SessionError> {
        if self.over {
            return Err(SessionError::GameOver);
        }
        if !self.current_player().is_ai {
            return Err(SessionError::NotAiTurn);
        }
        Ok(())
    }

    /// 人类玩家落子。
    pub fn play(&mut self, index: usize) -> Result<TurnResolution, SessionError> {
        if self.over {
            return Err(SessionError::GameOver);
        }
        if self.current_player().is_ai {
            return Err(SessionError::NotHumanTurn);
        }
        self.apply_move(index)
    }

    /// 由会话内的 AI 玩家搜索并落子。
    pub fn play_ai(&mut self) -> Result<AiTurn, SessionError> {
        self.ensure_ai_turn()?;
        let agent = self.agent.as_mut().ok_or(SessionError::NotAiTurn)?;
        let decision = agent.decide(&self.board)?;
        console_log!(
            "AI ({}) plays {} (score {}, {} nodes, {} candidates)",
            agent.side(),
            decision.index,
            decision.score,
            decision.nodes,
            decision.candidates.len()
        );
        let resolution = self.apply_move(decision.index)?;
        Ok(AiTurn {
            decision,
            resolution,
        })
    }

    /// 落下在别处（例如延迟的 Promise 中）算出的 AI 落子。
    pub fn apply_ai_move(&mut self, index: usize) -> Result<TurnResolution, SessionError> {
        self.ensure_ai_turn()?;
        self.apply_move(index)
    }

    pub fn restart(&mut self) {
        self.board.reset();
        self.current = 0;
        self.over = false;
        self.agent = self.fresh_agent();
        self.event_log.clear();
        self.record(GameEvent::GameRestarted);
        console_log!("tic-tac-toe: game restarted");
    }

    fn apply_move(&mut self, index: usize) -> Result<TurnResolution, SessionError> {
        if self.board.get(index)? != Cell::Empty {
            return Err(SessionError::CellOccupied { index });
        }

        let side = self.current_player().side;
        self.board.set(index, side)?;
        let mut events = vec![GameEvent::MovePlayed { side, index }];

        let outcome = self.board.outcome();
        match outcome {
            Outcome::Win(winner) => {
                self.over = true;
                events.push(GameEvent::GameWon {
                    winner,
                    line: self.board.winning_line(),
                });
            }
            Outcome::Tie => {
                self.over = true;
                events.push(GameEvent::GameTied);
            }
            Outcome::InProgress => {
                self.current = 1 - self.current;
                events.push(GameEvent::TurnChanged {
                    side: self.current_player().side,
                });
            }
        }

        if self.over {
            console_log!("tic-tac-toe: {}", self.status_message());
        }
        self.event_log.extend(events.iter().cloned());

        Ok(TurnResolution {
            board: self.board.clone(),
            outcome,
            events,
            next: (!self.over).then(|| self.current_player().side),
        })
    }

    fn record(&mut self, event: GameEvent) {
        self.event_log.push(event);
    }
}

fn display_name(name: &Option<String>, fallback: &str) -> String {
    name.as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

fn resolve_players(config: &SessionConfig) -> Result<[Player; 2], SessionError> {
    let first_side = config.player_one.symbol.unwrap_or(Side::X);
    let first = Player::human(
        display_name(&config.player_one.name, DEFAULT_PLAYER_ONE),
        first_side,
    );

    let second = match config.mode {
        GameMode::Ai => Player::ai(first_side.opponent()),
        GameMode::Player => {
            let side = config
                .player_two
                .symbol
                .unwrap_or_else(|| first_side.opponent());
            if side == first_side {
                return Err(SessionError::DuplicateSymbols { symbol: side });
            }
            Player::human(
                display_name(&config.player_two.name, DEFAULT_PLAYER_TWO),
                side,
            )
        }
    };

    Ok([first, second])
}
