//! Tests for the shared session.

use noughts_server::{
    FinishedMatch, JoinRejection, MoveRejection, RejectReason, Session, Square, StateSnapshot,
    Symbol, Winner,
};
use std::sync::Barrier;
use tokio::sync::mpsc;

fn started_session() -> (Session, mpsc::UnboundedReceiver<FinishedMatch>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let session = Session::new(tx);
    session
        .register_player("ann@example.com", "Ann")
        .expect("first join failed");
    session
        .register_player("bob@example.com", "Bob")
        .expect("second join failed");
    (session, rx)
}

#[test]
fn test_third_player_always_rejected() {
    let (session, _rx) = started_session();
    for _ in 0..3 {
        assert_eq!(
            session.register_player("eve@example.com", "Eve"),
            Err(JoinRejection::Full)
        );
    }
    let names: Vec<_> = session.players().iter().map(|p| p.name().clone()).collect();
    assert_eq!(names, ["Ann", "Bob"]);
}

#[test]
fn test_winning_move_reports_once() {
    let (session, mut rx) = started_session();

    for (symbol, pos) in [(Symbol::X, 0), (Symbol::O, 3), (Symbol::X, 1), (Symbol::O, 4)] {
        let snapshot = session.submit_move(symbol, pos).expect("move rejected");
        assert!(!snapshot.terminal());
        assert!(rx.try_recv().is_err());
    }

    let snapshot = session.submit_move(Symbol::X, 2).expect("winning move rejected");
    assert!(*snapshot.terminal());
    assert_eq!(*snapshot.winner(), Some(Winner::X));

    let finished = rx.try_recv().expect("no finish dispatched");
    assert_eq!(*finished.winner(), Winner::X);
    assert_eq!(finished.recipients(), ["ann@example.com", "bob@example.com"]);
    assert_eq!(finished.player_o().name(), "Bob");

    assert_eq!(
        session.submit_move(Symbol::O, 5),
        Err(MoveRejection::Rejected(RejectReason::Finished))
    );
    assert!(rx.try_recv().is_err(), "finish dispatched twice");
}

#[test]
fn test_rejected_move_leaves_state_unchanged() {
    let (session, _rx) = started_session();
    session.submit_move(Symbol::X, 4).unwrap();
    let before = session.read_state();

    assert!(session.submit_move(Symbol::O, 4).is_err());
    assert!(session.submit_move(Symbol::X, 0).is_err());
    assert!(session.submit_move(Symbol::O, 9).is_err());
    assert_eq!(session.read_state(), before);
}

#[test]
fn test_reset_returns_to_empty() {
    let (session, _rx) = started_session();
    session.submit_move(Symbol::X, 4).unwrap();

    session.reset();
    assert_eq!(
        session.read_state(),
        StateSnapshot::NotStarted { player_count: 0 }
    );
    assert_eq!(session.submit_move(Symbol::O, 0), Err(MoveRejection::NotStarted));

    // A fresh pair can join and gets X then O again.
    assert_eq!(session.register_player("c@example.com", "Cid"), Ok(Symbol::X));
    assert_eq!(session.register_player("d@example.com", "Dee"), Ok(Symbol::O));
}

#[test]
fn test_reset_after_finish() {
    let (session, _rx) = started_session();
    let moves = [
        (Symbol::X, 0),
        (Symbol::O, 3),
        (Symbol::X, 1),
        (Symbol::O, 4),
        (Symbol::X, 2),
    ];
    for (symbol, pos) in moves {
        session.submit_move(symbol, pos).unwrap();
    }
    session.reset();
    assert_eq!(
        session.read_state(),
        StateSnapshot::NotStarted { player_count: 0 }
    );
}

#[test]
fn test_concurrent_moves_on_same_cell_single_write() {
    for _ in 0..100 {
        let (session, _rx) = started_session();
        session.submit_move(Symbol::X, 0).unwrap();
        let barrier = Barrier::new(2);
        let (barrier, session) = (&barrier, &session);

        let results: Vec<_> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..2)
                .map(|_| {
                    s.spawn(move || {
                        barrier.wait();
                        session.submit_move(Symbol::O, 4)
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().expect("mover panicked"))
                .collect()
        });

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        let loser = results.iter().find_map(|r| r.as_ref().err()).copied();
        assert!(matches!(
            loser,
            Some(MoveRejection::Rejected(RejectReason::Occupied | RejectReason::WrongTurn))
        ));

        match session.read_state() {
            StateSnapshot::Started { board, turn, .. } => {
                assert_eq!(board.squares()[4], Square::Occupied(Symbol::O));
                assert_eq!(turn, Symbol::X);
            }
            other => panic!("expected started, got {other:?}"),
        }
    }
}

#[test]
fn test_conflicting_symbols_only_turn_holder_wins() {
    let (session, _rx) = started_session();
    let barrier = Barrier::new(2);

    let (x, o) = std::thread::scope(|s| {
        let x = s.spawn(|| {
            barrier.wait();
            session.submit_move(Symbol::X, 4)
        });
        let o = s.spawn(|| {
            barrier.wait();
            session.submit_move(Symbol::O, 4)
        });
        (x.join().unwrap(), o.join().unwrap())
    });

    assert!(x.is_ok());
    assert!(o.is_err());
}
