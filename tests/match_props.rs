use proptest::prelude::*;
use rand::{rngs::SmallRng, Rng, SeedableRng};
use seabattle::{
    auto_place, Game, MatchError, MatchId, MatchResult, MatchStatus, Mode, PlayerId, Side,
    Violation, FLEET, GRID_SIZE,
};

fn started_online_game(rng: &mut SmallRng) -> Game {
    let mut game = Game::create(MatchId(1), Mode::HumanOpponent, PlayerId(1), 0);
    game.join(PlayerId(2)).unwrap();
    for side in [Side::Host, Side::Guest] {
        let grid = auto_place(rng, &FLEET, true, 2000).unwrap();
        game.populate(side, grid, 0).unwrap();
        game.mark_ready(side, 0).unwrap();
    }
    assert_eq!(game.record().status(), MatchStatus::InProgress);
    game
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn turn_passes_only_on_a_miss(seed in any::<u64>()) {
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut game = started_online_game(&mut rng);
        let mut now = 0;
        while game.record().status() == MatchStatus::InProgress {
            now += 1;
            let side = game.record().turn();
            let x = rng.random_range(0..GRID_SIZE);
            let y = rng.random_range(0..GRID_SIZE);
            let outcome = game.fire(side, x, y, now).unwrap();
            let target_gone = game.grid(side.opponent()).all_sunk();

            prop_assert_eq!(game.record().status() == MatchStatus::Finished, target_gone);
            if target_gone {
                prop_assert_eq!(game.record().result(), Some(side.win()));
            } else if outcome.hit || outcome.already_shot {
                prop_assert_eq!(game.record().turn(), side);
            } else {
                prop_assert_eq!(game.record().turn(), side.opponent());
            }
        }
    }

    #[test]
    fn move_log_skips_repeat_shots(seed in any::<u64>(), shots in 1usize..60) {
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut game = started_online_game(&mut rng);
        let mut applied = 0;
        for now in 0..shots as u64 {
            if game.record().status() != MatchStatus::InProgress {
                break;
            }
            let side = game.record().turn();
            let outcome = game
                .fire(side, rng.random_range(0..3), rng.random_range(0..3), now)
                .unwrap();
            if !outcome.already_shot {
                applied += 1;
            }
        }
        prop_assert_eq!(game.record().moves().len(), applied);
    }
}

#[test]
fn wrong_side_and_wrong_status_are_turn_violations() {
    let mut game = Game::create(MatchId(2), Mode::HumanOpponent, PlayerId(1), 0);
    assert_eq!(
        game.fire(Side::Host, 0, 0, 1),
        Err(MatchError::TurnViolation(Violation::NotInProgress(
            MatchStatus::Waiting
        )))
    );

    let mut rng = SmallRng::seed_from_u64(3);
    let mut game = started_online_game(&mut rng);
    assert_eq!(
        game.fire(Side::Guest, 0, 0, 1),
        Err(MatchError::TurnViolation(Violation::OutOfTurn {
            side: Side::Guest,
            turn: Side::Host
        }))
    );
    assert_eq!(
        game.fire(Side::Host, 10, 0, 1),
        Err(MatchError::InvalidCoordinate { x: 10, y: 0 })
    );
    assert!(game.surrender(Side::Host, 2).is_ok());
    assert!(matches!(
        game.surrender(Side::Guest, 3),
        Err(MatchError::TurnViolation(_))
    ));
    assert_eq!(game.record().result(), Some(MatchResult::GuestWin));
}

#[test]
fn repopulating_clears_readiness() {
    let mut rng = SmallRng::seed_from_u64(8);
    let mut game = Game::create(MatchId(3), Mode::HumanOpponent, PlayerId(1), 0);
    game.join(PlayerId(2)).unwrap();
    let grid = auto_place(&mut rng, &FLEET, true, 2000).unwrap();
    game.populate(Side::Host, grid.clone(), 0).unwrap();
    game.mark_ready(Side::Host, 0).unwrap();
    assert!(game.record().is_ready(Side::Host));
    game.populate(Side::Host, grid, 1).unwrap();
    assert!(!game.record().is_ready(Side::Host));
}
