//! Plain-text view of the local table.

use bowl_sync_core::store::GameTable;
use bowl_sync_core::MatchTier;
use std::collections::BTreeMap;

pub fn print_table(table: &GameTable) {
    println!(
        "{:<6} {:<34} {:<17} {:<24} {:<24} {:<11} {:<8} {}",
        "id", "bowl", "kickoff", "away", "home", "cfbd id", "tier", "winner"
    );
    for row in &table.rows {
        println!(
            "{:<6} {:<34} {:<17} {:<24} {:<24} {:<11} {:<8} {}",
            row.game_id,
            truncate(&row.bowl_name, 34),
            row.kickoff_datetime,
            truncate(&row.away_team, 24),
            truncate(&row.home_team, 24),
            row.provider_game_id.as_ref().map(|id| id.to_string()).unwrap_or_else(|| "-".to_string()),
            row.match_tier.map(|t| t.as_str()).unwrap_or(if row.provider_game_id.is_some() { "manual" } else { "-" }),
            row.winner.as_deref().unwrap_or("")
        );
    }
    println!();
    println!("{}", summary_line(table));
}

fn summary_line(table: &GameTable) -> String {
    let mut by_tier: BTreeMap<MatchTier, usize> = BTreeMap::new();
    let mut manual = 0;
    for row in table.rows.iter().filter(|r| r.provider_game_id.is_some()) {
        match row.match_tier {
            Some(tier) => *by_tier.entry(tier).or_default() += 1,
            None => manual += 1,
        }
    }
    let matched: usize = by_tier.values().sum::<usize>() + manual;
    let completed = table.rows.iter().filter(|r| r.completed).count();

    let tiers = by_tier
        .iter()
        .rev()
        .map(|(tier, count)| format!("{} {}", tier, count))
        .chain((manual > 0).then(|| format!("manual {}", manual)))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "{} rows, {} matched ({}), {} unmatched, {} completed",
        table.rows.len(),
        matched,
        if tiers.is_empty() { "none".to_string() } else { tiers },
        table.rows.len() - matched,
        completed
    )
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
        cut.push('~');
        cut
    }
}
