// Copyright (c) 2024 Mike Tsao

use more_asserts::assert_le;
use refrain::prelude::*;

fn piece(beats: Beat) -> Piece {
    TimelineBuilder::default()
        .add_note(0, beats, 1, 60, 100)
        .unwrap()
        .finish()
        .unwrap()
}

// Plays from the start until the transport stops itself, returning every beat
// the cursor visited.
fn perform(piece: &Piece) -> Vec<Beat> {
    let mut transport = TransportBuilder::default().build().unwrap();
    let mut visited = vec![transport.beat()];
    transport.play();
    while let Some(event) = transport.tick(piece) {
        if let TransportEvent::Stopped(_) = event {
            break;
        }
        visited.push(event.beat());
    }
    visited
}

#[test]
fn simple_repeat_plays_twice() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut piece = piece(20);
    piece
        .add_repeat(Repeat::new_with(0, vec![10]).unwrap())
        .unwrap();

    let visited = perform(&piece);
    let first_pass: Vec<Beat> = (0..10).collect();
    assert_eq!(&visited[..10], first_pass.as_slice());
    assert_eq!(visited[10], 0, "beat 10 sends playback back to the start");
    assert_eq!(*visited.last().unwrap(), 20);
    assert_eq!(visited.len(), 10 + 21);
}

#[test]
fn endings_are_skipped_on_later_passes() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut piece = piece(30);
    piece
        .add_repeat(Repeat::new_with(0, vec![10, 15, 20]).unwrap())
        .unwrap();

    let visited = perform(&piece);
    // First pass runs through the first ending; the second skips it.
    assert_eq!(jumps(&visited), vec![(14, 0), (9, 15)]);
    assert_eq!(*visited.last().unwrap(), 30);
}

fn jumps(visited: &[Beat]) -> Vec<(Beat, Beat)> {
    visited
        .windows(2)
        .filter(|w| w[1] != w[0] + 1)
        .map(|w| (w[0], w[1]))
        .collect()
}

#[test]
fn repeat_after_three_endings_still_fires() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut piece = piece(30);
    piece
        .add_repeat(Repeat::new_with(0, vec![6, 10, 14]).unwrap())
        .unwrap();
    piece
        .add_repeat(Repeat::new_with(16, vec![20]).unwrap())
        .unwrap();

    let visited = perform(&piece);
    assert_eq!(jumps(&visited), vec![(9, 0), (5, 10), (19, 16)]);
    assert_eq!(visited.iter().filter(|b| **b == 14).count(), 1);
    assert_eq!(visited.iter().filter(|b| **b == 16).count(), 2);
    assert_eq!(*visited.last().unwrap(), 30);
}

#[test]
fn repeat_after_two_endings_still_fires() {
    let mut piece = piece(12);
    piece
        .add_repeat(Repeat::new_with(0, vec![2, 4]).unwrap())
        .unwrap();
    piece
        .add_repeat(Repeat::new_with(5, vec![7]).unwrap())
        .unwrap();

    let visited = perform(&piece);
    // The second pass skips straight to the last ending, which uses the
    // first repeat up and lets the next one fire at 7.
    assert_eq!(jumps(&visited), vec![(3, 0), (1, 4), (6, 5)]);
    assert_eq!(*visited.last().unwrap(), 12);
}

#[test]
fn consecutive_repeats_each_fire_once() {
    let mut piece = piece(12);
    piece
        .add_repeat(Repeat::new_with(0, vec![4]).unwrap())
        .unwrap();
    piece
        .add_repeat(Repeat::new_with(4, vec![8]).unwrap())
        .unwrap();

    let visited = perform(&piece);
    assert_eq!(visited.iter().filter(|b| **b == 0).count(), 2);
    assert_eq!(visited.iter().filter(|b| **b == 4).count(), 2);
    assert_eq!(visited.iter().filter(|b| **b == 10).count(), 1);
    visited.iter().for_each(|b| assert_le!(*b, piece.cursor_limit()));
}

#[test]
fn overlapping_repeat_is_refused() {
    let mut piece = piece(20);
    piece
        .add_repeat(Repeat::new_with(0, vec![5]).unwrap())
        .unwrap();
    assert_eq!(
        piece.add_repeat(Repeat::new_with(3, vec![8]).unwrap()),
        Err(RefrainError::RepeatOverlap { start: 3, end: 8 })
    );
    assert_eq!(piece.repeats().len(), 1);
}

#[test]
fn seeking_home_rearms_repeats() {
    let mut piece = piece(8);
    piece
        .add_repeat(Repeat::new_with(0, vec![2]).unwrap())
        .unwrap();
    let mut t = TransportBuilder::default().build().unwrap();
    t.play();
    for _ in 0..3 {
        t.tick(&piece);
    }
    assert_eq!(t.cursor().active_repeat(), 1);
    t.skip_to_start();
    assert_eq!(t.cursor().active_repeat(), 0);
    assert_eq!(
        t.tick(&piece),
        Some(TransportEvent::Advanced { from: 0, to: 1 })
    );
    assert_eq!(t.tick(&piece), Some(TransportEvent::Jumped { from: 2, to: 0 }));
}
