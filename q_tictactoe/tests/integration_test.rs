use q_tictactoe::board::{Board, Outcome};
use q_tictactoe::players::{ExternalPolicy, Mark, Player};
use q_tictactoe::q_table::{self, DEFAULT_Q_VALUE};
use q_tictactoe::{Game, GameStatus, QPolicy, QTable, Trainer, TrainingConfig};

fn changed_values(q: &QTable) -> usize {
    q.values()
        .flat_map(|moves| moves.values())
        .filter(|&&value| value != DEFAULT_Q_VALUE)
        .count()
}

#[test]
fn one_episode_of_training_changes_the_table() {
    let trainer = Trainer::new(TrainingConfig {
        episodes: 1,
        alpha: 0.5,
        gamma: 0.9,
        seed: Some(3),
        ..Default::default()
    })
    .unwrap();
    let mut q = QTable::new();
    let stats = trainer.train(&mut q).unwrap();
    assert_eq!(stats.episodes, 1);
    assert!(!q.is_empty());
    assert!(changed_values(&q) > 0);
}

#[test]
fn table_keeps_growing_across_episodes() {
    let mut q = QTable::new();
    let short = Trainer::new(TrainingConfig {
        episodes: 5,
        seed: Some(1),
        log_every: 0,
        ..Default::default()
    })
    .unwrap();
    short.train(&mut q).unwrap();
    let after_short = q.len();
    let long = Trainer::new(TrainingConfig {
        episodes: 200,
        seed: Some(2),
        log_every: 50,
        ..Default::default()
    })
    .unwrap();
    long.train(&mut q).unwrap();
    assert!(q.len() > after_short);
}

#[test]
fn saved_table_reloads_and_drives_a_greedy_player() {
    let dir = tempfile::tempdir().unwrap();
    let trainer = Trainer::new(TrainingConfig {
        episodes: 100,
        seed: Some(8),
        log_every: 0,
        out_dir: dir.path().to_path_buf(),
        ..Default::default()
    })
    .unwrap();
    let (q, _stats, paths) = trainer.train_and_save().unwrap();
    assert_eq!(paths.len(), 2);
    assert!(paths
        .iter()
        .all(|path| path.file_stem().unwrap() == "q_training_100_episodes"));

    for path in &paths {
        let mut loaded = q_table::q_table_from_disk(path).unwrap();
        assert_eq!(loaded, q);

        let cross = Player::new(Mark::Cross, Box::new(QPolicy::with_seed("x", 0.0, 1).unwrap()));
        let nought = Player::new(Mark::Nought, Box::new(QPolicy::with_seed("o", 0.0, 2).unwrap()));
        let mut game = Game::new(cross, nought).unwrap();
        let outcome = game.play_episode(&mut loaded).unwrap();
        assert_eq!(game.status(), GameStatus::Ended(outcome));
        assert!(loaded.len() >= q.len());
    }
}

#[test]
fn external_player_against_a_greedy_policy() {
    let first_free = |board: &Board, _: Mark| -> q_tictactoe::Result<(usize, usize)> {
        Ok(board.available_moves()[0])
    };
    let cross = Player::new(Mark::Cross, Box::new(ExternalPolicy::new("human", first_free)));
    let nought = Player::new(Mark::Nought, Box::new(QPolicy::with_seed("o", 0.0, 4).unwrap()));
    let mut game = Game::new(cross, nought).unwrap();
    let mut q = QTable::new();
    let outcome = game.play_episode(&mut q).unwrap();
    assert!(game.board().is_terminal());
    assert_eq!(game.board().outcome(), Some(outcome));
    // only nought's decisions touch the table when learning is off
    assert!(q.keys().all(|key| key.as_str().ends_with('O')));
    assert_eq!(changed_values(&q), 0);
}

#[test]
fn end_to_end_top_row_and_draw() {
    let mut board = Board::new();
    for (mv, mark) in [
        ((0, 0), Mark::Cross),
        ((1, 1), Mark::Nought),
        ((0, 1), Mark::Cross),
        ((2, 2), Mark::Nought),
        ((0, 2), Mark::Cross),
    ] {
        board.apply_move(mv, mark).unwrap();
    }
    assert_eq!(board.winner(), Some(Mark::Cross));
    assert!(!board.is_full());

    let mut board = Board::new();
    let rows = ["XOX", "XOO", "OXX"];
    for (row, marks) in rows.iter().enumerate() {
        for (col, c) in marks.chars().enumerate() {
            board.apply_move((row, col), Mark::try_from(c).unwrap()).unwrap();
        }
    }
    assert_eq!(board.winner(), None);
    assert!(board.is_full());
    assert_eq!(board.reward(), 0.5);
}
