use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// 棋盘格子数量（3x3）。
pub const BOARD_SIZE: usize = 9;

/// 三行、三列、两条对角线。
pub const WINNING_LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// 玩家使用的标记。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Side {
    X,
    O,
}

impl Side {
    pub fn opponent(self) -> Self {
        match self {
            Side::X => Side::O,
            Side::O => Side::X,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Side::X => 'X',
            Side::O => 'O',
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
#[error("unknown symbol '{0}', expected X or O")]
pub struct SymbolParseError(pub String);

impl FromStr for Side {
    type Err = SymbolParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "x" => Ok(Side::X),
            "o" => Ok(Side::O),
            _ => Err(SymbolParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Taken(Side),
}

impl Cell {
    pub fn is_empty(self) -> bool {
        matches!(self, Cell::Empty)
    }

    pub fn side(self) -> Option<Side> {
        match self {
            Cell::Empty => None,
            Cell::Taken(side) => Some(side),
        }
    }

    fn symbol(self) -> char {
        self.side().map(Side::symbol).unwrap_or('-')
    }

    fn from_symbol(ch: char, position: usize) -> Result<Self, BoardError> {
        match ch {
            'X' | 'x' => Ok(Cell::Taken(Side::X)),
            'O' | 'o' => Ok(Cell::Taken(Side::O)),
            '-' | '.' | ' ' => Ok(Cell::Empty),
            _ => Err(BoardError::InvalidCell { ch, position }),
        }
    }
}

/// 由棋盘内容推导出的对局结果，从不单独存储。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "winner")]
pub enum Outcome {
    InProgress,
    Win(Side),
    Tie,
}

impl Outcome {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Outcome::InProgress)
    }

    pub fn winner(self) -> Option<Side> {
        match self {
            Outcome::Win(side) => Some(side),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
#[serde(tag = "type")]
pub enum BoardError {
    #[error("cell index {index} is outside 0..=8")]
    InvalidIndex { index: usize },
    #[error("board text must describe 9 cells, got {len}")]
    InvalidLength { len: usize },
    #[error("invalid cell character '{ch}' at position {position}")]
    InvalidCell { ch: char, position: usize },
}

/// 3x3 棋盘。只保存九个格子，不做落子合法性检查（由会话层负责）。
///
/// 序列化为紧凑的文本形式，例如 `"XO--X---O"`。
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Board {
    cells: [Cell; BOARD_SIZE],
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_cells(cells: [Cell; BOARD_SIZE]) -> Self {
        Self { cells }
    }

    pub fn cells(&self) -> &[Cell; BOARD_SIZE] {
        &self.cells
    }

    pub fn get(&self, index: usize) -> Result<Cell, BoardError> {
        self.cells
            .get(index)
            .copied()
            .ok_or(BoardError::InvalidIndex { index })
    }

    pub fn set(&mut self, index: usize, side: Side) -> Result<(), BoardError> {
        let cell = self
            .cells
            .get_mut(index)
            .ok_or(BoardError::InvalidIndex { index })?;
        *cell = Cell::Taken(side);
        Ok(())
    }

    /// 搜索专用的无检查写入，下标总是来自 `empty_indices`。
    pub(crate) fn place(&mut self, index: usize, cell: Cell) {
        self.cells[index] = cell;
    }

    pub fn reset(&mut self) {
        self.cells = [Cell::Empty; BOARD_SIZE];
    }

    pub fn empty_indices(&self) -> Vec<usize> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.is_empty())
            .map(|(index, _)| index)
            .collect()
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|cell| !cell.is_empty())
    }

    pub fn winning_line(&self) -> Option<[usize; 3]> {
        WINNING_LINES.iter().copied().find(|&[a, b, c]| {
            let first = self.cells[a];
            !first.is_empty() && first == self.cells[b] && first == self.cells[c]
        })
    }

    pub fn outcome(&self) -> Outcome {
        if let Some(side) = self
            .winning_line()
            .and_then(|[first, _, _]| self.cells[first].side())
        {
            return Outcome::Win(side);
        }

        if self.is_full() {
            Outcome::Tie
        } else {
            Outcome::InProgress
        }
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for cell in &self.cells {
            write!(f, "{}", cell.symbol())?;
        }
        Ok(())
    }
}

impl FromStr for Board {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let symbols: Vec<char> = s.chars().collect();
        if symbols.len() != BOARD_SIZE {
            return Err(BoardError::InvalidLength { len: symbols.len() });
        }

        let mut cells = [Cell::Empty; BOARD_SIZE];
        for (position, (cell, ch)) in cells.iter_mut().zip(symbols).enumerate() {
            *cell = Cell::from_symbol(ch, position)?;
        }
        Ok(Self { cells })
    }
}

impl From<Board> for String {
    fn from(board: Board) -> Self {
        board.to_string()
    }
}

impl TryFrom<String> for Board {
    type Error = BoardError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;

    fn board(text: &str) -> Board {
        text.parse().expect("board text should parse")
    }

    #[test]
    fn get_rejects_out_of_range_index() {
        let board = Board::new();
        assert_eq!(board.get(8), Ok(Cell::Empty));
        assert_eq!(board.get(9), Err(BoardError::InvalidIndex { index: 9 }));
    }

    #[test]
    fn set_rejects_out_of_range_index() {
        let mut board = Board::new();
        assert_eq!(
            board.set(42, Side::X),
            Err(BoardError::InvalidIndex { index: 42 })
        );
        assert_eq!(board, Board::new());
    }

    #[test]
    fn set_overwrites_without_legality_check() {
        let mut board = Board::new();
        board.set(4, Side::X).expect("index is valid");
        board.set(4, Side::O).expect("index is valid");
        assert_eq!(board.get(4), Ok(Cell::Taken(Side::O)));
    }

    #[test]
    fn empty_indices_after_reset_and_set() {
        let mut board = board("XOXOXOXOX");
        board.reset();
        assert_eq!(board.empty_indices(), (0..9).collect::<Vec<_>>());

        board.set(3, Side::O).expect("index is valid");
        assert_eq!(board.empty_indices(), vec![0, 1, 2, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn reset_is_idempotent() {
        let mut once = board("XO-X-O--X");
        once.reset();
        let mut twice = once.clone();
        twice.reset();
        assert_eq!(once, twice);
        assert_eq!(twice, Board::new());
    }

    #[test]
    fn outcome_detects_every_line() {
        for line in WINNING_LINES {
            let mut board = Board::new();
            for index in line {
                board.set(index, Side::O).expect("index is valid");
            }
            assert_eq!(board.outcome(), Outcome::Win(Side::O));
            assert_eq!(board.winning_line(), Some(line));
        }
    }

    #[test]
    fn win_takes_precedence_over_full_board() {
        let board = board("XXXOOXOXO");
        assert!(board.is_full());
        assert_eq!(board.outcome(), Outcome::Win(Side::X));
    }

    #[test]
    fn full_board_without_line_is_tie() {
        assert_eq!(board("XOXXOOOXX").outcome(), Outcome::Tie);
        assert_eq!(board("XO--X----").outcome(), Outcome::InProgress);
    }

    #[test]
    fn random_games_never_have_two_winners() {
        for seed in 0..200 {
            let mut rng = SmallRng::seed_from_u64(seed);
            let mut board = Board::new();
            let mut side = Side::X;
            loop {
                let x_lines = WINNING_LINES
                    .iter()
                    .filter(|line| line.iter().all(|&i| board.cells[i] == Cell::Taken(Side::X)))
                    .count();
                let o_lines = WINNING_LINES
                    .iter()
                    .filter(|line| line.iter().all(|&i| board.cells[i] == Cell::Taken(Side::O)))
                    .count();
                assert!(x_lines == 0 || o_lines == 0, "both sides won on {board}");

                if board.outcome().is_terminal() {
                    break;
                }
                let index = *board
                    .empty_indices()
                    .choose(&mut rng)
                    .expect("in-progress board has an empty cell");
                board.set(index, side).expect("index is valid");
                side = side.opponent();
            }
        }
    }

    #[test]
    fn text_form_round_trips_and_reports_errors() {
        let board = board("x.o -X-o-");
        assert_eq!(board.to_string(), "X-O--X-O-");
        assert_eq!(
            "XO".parse::<Board>(),
            Err(BoardError::InvalidLength { len: 2 })
        );
        assert_eq!(
            "XO-?-----".parse::<Board>(),
            Err(BoardError::InvalidCell { ch: '?', position: 3 })
        );
    }

    #[test]
    fn side_parses_case_insensitively() {
        assert_eq!(" x ".parse::<Side>(), Ok(Side::X));
        assert_eq!("O".parse::<Side>(), Ok(Side::O));
        assert!("Z".parse::<Side>().is_err());
        assert_eq!(Side::X.opponent(), Side::O);
    }
}
