//! Scoring rules.
//!
//! A competitor's score is the sum over active maps of
//! `kills * multiplier(rank)`. Scores are compared and displayed at two
//! decimal places.

use crate::Player;

/// Rank-dependent weight applied to a map's kill count.
///
/// | rank  | multiplier |
/// |-------|------------|
/// | 1     | 2.0        |
/// | 2–5   | 1.8        |
/// | 6–10  | 1.6        |
/// | 11–15 | 1.5        |
/// | 16–20 | 1.2        |
/// | other | 1.0        |
pub fn multiplier(rank: f64) -> f64 {
    if rank == 1.0 {
        2.0
    } else if (2.0..=5.0).contains(&rank) {
        1.8
    } else if (6.0..=10.0).contains(&rank) {
        1.6
    } else if (11.0..=15.0).contains(&rank) {
        1.5
    } else if (16.0..=20.0).contains(&rank) {
        1.2
    } else {
        1.0
    }
}

/// Unrounded score over maps `1..=map_count`. Missing maps count as zero.
pub fn raw_score(player: &Player, map_count: u32) -> f64 {
    (1..=map_count)
        .map(|map| {
            let stats = player.stats(map);
            stats.kills * multiplier(stats.rank)
        })
        .sum()
}

/// Score rounded to two decimals, the value used for comparisons.
pub fn total_score(player: &Player, map_count: u32) -> f64 {
    (raw_score(player, map_count) * 100.0).round() / 100.0
}

pub fn format_score(score: f64) -> String {
    // Adding +0.0 folds -0.0 into 0.0.
    format!("{:.2}", score + 0.0)
}

/// Every competitor has strictly positive kills and rank on every active map.
/// An empty field is never complete.
pub fn is_complete(players: &[Player], map_count: u32) -> bool {
    !players.is_empty()
        && players
            .iter()
            .all(|p| (1..=map_count).all(|map| p.stats(map).is_filled()))
}

/// Highest score wins; on a tie the earliest competitor keeps the lead.
pub fn pick_winner(players: &[Player], map_count: u32) -> Option<&Player> {
    let mut best: Option<(&Player, f64)> = None;
    for player in players {
        let score = total_score(player, map_count);
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((player, score)),
        }
    }
    best.map(|(p, _)| p)
}

/// Competitors with their scores, best first. Equal scores keep list order.
pub fn ranked(players: &[Player], map_count: u32) -> Vec<(&Player, f64)> {
    let mut rows: Vec<_> = players
        .iter()
        .map(|p| (p, total_score(p, map_count)))
        .collect();
    rows.sort_by(|a, b| b.1.total_cmp(&a.1));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Field;

    #[test]
    fn fractional_ranks_fall_through_to_one() {
        assert_eq!(multiplier(1.5), 1.0);
        assert_eq!(multiplier(5.5), 1.0);
        assert_eq!(multiplier(-3.0), 1.0);
    }

    #[test]
    fn rounding_decides_ties() {
        let mut a = Player::new(1, "a");
        a.set_stat(Field::Kills(1), 10.001);
        a.set_stat(Field::Rank(1), 30.0);
        let mut b = Player::new(2, "b");
        b.set_stat(Field::Kills(1), 10.004);
        b.set_stat(Field::Rank(1), 30.0);

        let players = [a, b];
        assert_eq!(pick_winner(&players, 1).map(|p| p.id), Some(1));
    }

    #[test]
    fn negative_zero_prints_unsigned() {
        assert_eq!(format_score(-0.0), "0.00");
        assert_eq!(format_score(12.5), "12.50");

        let mut p = Player::new(1, "a");
        p.set_stat(Field::Kills(1), -0.0);
        p.set_stat(Field::Rank(1), 3.0);
        assert_eq!(format_score(total_score(&p, 1)), "0.00");
    }

    #[test]
    fn empty_field_has_no_winner_and_is_not_complete() {
        assert!(pick_winner(&[], 3).is_none());
        assert!(!is_complete(&[], 3));
    }
}
