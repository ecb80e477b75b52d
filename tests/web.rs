//! 浏览器端测试：`wasm-pack test --headless --firefox`。

#![cfg(target_arch = "wasm32")]

use tictactoe_wasm::{check_outcome, choose_move_js, TicTacToe};
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn choose_move_takes_the_win() {
    let index = choose_move_js("OO-XX----", "o", None).expect("board is in progress");
    assert_eq!(index, 2);
}

#[wasm_bindgen_test]
fn choose_move_rejects_finished_board() {
    assert!(choose_move_js("XXXOO----", "O", Some(9)).is_err());
    assert!(choose_move_js("XX", "O", None).is_err());
    assert!(choose_move_js("---------", "Z", None).is_err());
}

#[wasm_bindgen_test]
fn check_outcome_reports_tie() {
    let outcome = check_outcome("XOXXOOOXX").expect("board text is valid");
    assert!(outcome.is_object());
}

#[wasm_bindgen_test]
fn session_round_trip() {
    let mut game = TicTacToe::new(Some(r#"{"mode":"ai","player_one":{"symbol":"X"}}"#.into()))
        .expect("config is valid");
    game.play(4).expect("centre is free");
    assert!(game.play(0).is_err());
    game.play_ai().expect("AI is to move");
    assert_eq!(game.board().chars().filter(|c| *c != '-').count(), 2);
    game.restart().expect("restart succeeds");
    assert_eq!(game.board(), "---------");
}

#[wasm_bindgen_test]
async fn think_ai_resolves_after_delay() {
    let mut game = TicTacToe::new(Some(r#"{"mode":"ai"}"#.into())).expect("config is valid");
    game.play(0).expect("corner is free");
    let value: JsValue = JsFuture::from(game.think_ai(Some(10)))
        .await
        .expect("AI is to move");
    let json = value.as_string().expect("decision is JSON text");
    let decision: tictactoe_wasm::AiDecision =
        serde_json::from_str(&json).expect("decision JSON parses");
    game.apply_ai_move(decision.index).expect("AI move applies");
    assert_eq!(game.status(), "It's Player One's turn.");
}
