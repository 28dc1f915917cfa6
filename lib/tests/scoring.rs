use clashboard::{
    Field, Player, format_score, is_complete, multiplier, pick_winner, ranked, total_score,
};
use pretty_assertions::assert_eq;

fn competitor(id: u64, stats: &[(f64, f64)]) -> Player {
    let mut player = Player::new(id, format!("player{id}"));
    for (i, (kills, rank)) in stats.iter().enumerate() {
        let map = i as u32 + 1;
        player.set_stat(Field::Kills(map), *kills);
        player.set_stat(Field::Rank(map), *rank);
    }
    player
}

#[test]
fn multiplier_boundaries() {
    let table = [
        (0.0, 1.0),
        (1.0, 2.0),
        (2.0, 1.8),
        (5.0, 1.8),
        (6.0, 1.6),
        (10.0, 1.6),
        (11.0, 1.5),
        (15.0, 1.5),
        (16.0, 1.2),
        (20.0, 1.2),
        (21.0, 1.0),
    ];
    for (rank, expected) in table {
        assert_eq!(multiplier(rank), expected, "rank {rank}");
    }
}

#[test]
fn two_map_total() {
    let player = competitor(1, &[(10.0, 1.0), (5.0, 6.0)]);
    assert_eq!(format_score(total_score(&player, 2)), "28.00");
}

#[test]
fn inactive_maps_do_not_count() {
    let player = competitor(1, &[(10.0, 1.0), (5.0, 6.0)]);
    assert_eq!(format_score(total_score(&player, 1)), "20.00");
    // a third active map with no entry scores zero
    assert_eq!(format_score(total_score(&player, 3)), "28.00");
}

#[test]
fn first_of_tied_leaders_wins() {
    let players = [
        competitor(1, &[(10.0, 30.0)]),
        competitor(2, &[(15.0, 30.0)]),
        competitor(3, &[(15.0, 30.0)]),
    ];
    assert_eq!(pick_winner(&players, 1).map(|p| p.id), Some(2));
}

#[test]
fn completion_requires_positive_pairs_everywhere() {
    let mut players = vec![
        competitor(1, &[(3.0, 2.0), (4.0, 1.0)]),
        competitor(2, &[(1.0, 7.0), (0.0, 3.0)]),
    ];
    assert!(!is_complete(&players, 2));

    players[1].set_stat(Field::Kills(2), -1.0);
    assert!(!is_complete(&players, 2));

    players[1].set_stat(Field::Kills(2), 2.0);
    assert!(is_complete(&players, 2));

    // a newly added map is empty until filled
    assert!(!is_complete(&players, 3));
}

#[test]
fn ranking_is_descending_and_stable() {
    let players = [
        competitor(1, &[(2.0, 30.0)]),
        competitor(2, &[(9.0, 1.0)]),
        competitor(3, &[(2.0, 30.0)]),
    ];
    let order: Vec<u64> = ranked(&players, 1).iter().map(|(p, _)| p.id).collect();
    assert_eq!(order, vec![2, 1, 3]);
}
