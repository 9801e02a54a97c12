use anyhow::Result;
use chrono::Utc;
use colored::Colorize;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::time::Duration;
use unitsim_game::numbers::{ratio, usize_to_f64};
use unitsim_game::{Ending, REGISTRY, RulesetProfile};

use super::policy::GameplayStrategy;
use super::simulation::GameRecord;

/// Per-strategy roll-up of a batch of games.
#[derive(Debug, Clone, Serialize)]
pub struct StrategyAggregate {
    pub strategy: GameplayStrategy,
    pub games: usize,
    pub wins: usize,
    pub win_rate: f64,
    pub endings: BTreeMap<String, usize>,
    pub mean_final_net_profit: f64,
    pub best_final_net_profit: f64,
    pub mean_final_balance: f64,
    pub mean_turns: f64,
    /// Share of games that unlocked each achievement, keyed by achievement id.
    pub achievement_rates: BTreeMap<String, f64>,
}

#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    profile: &'a str,
    generated_at: String,
    aggregates: &'a [StrategyAggregate],
    games: &'a [GameRecord],
}

/// Group records by strategy, in strategy order.
#[must_use]
pub fn aggregate_records(records: &[GameRecord]) -> Vec<StrategyAggregate> {
    let mut grouped: BTreeMap<GameplayStrategy, Vec<&GameRecord>> = BTreeMap::new();
    for record in records {
        grouped.entry(record.strategy).or_default().push(record);
    }
    grouped
        .into_iter()
        .map(|(strategy, games)| summarize(strategy, &games))
        .collect()
}

fn summarize(strategy: GameplayStrategy, games: &[&GameRecord]) -> StrategyAggregate {
    let count = games.len();
    let denom = usize_to_f64(count.max(1));
    let wins = games.iter().filter(|g| g.ending.is_victory()).count();

    let mut endings: BTreeMap<String, usize> = Ending::ALL
        .iter()
        .map(|ending| (ending.key().to_string(), 0))
        .collect();
    for game in games {
        *endings.entry(game.ending.key().to_string()).or_default() += 1;
    }

    let achievement_rates = REGISTRY
        .iter()
        .map(|achievement| {
            let key = achievement.id.key();
            let unlocked = games
                .iter()
                .filter(|g| g.achievements.iter().any(|a| a == key))
                .count();
            (key.to_string(), ratio(unlocked, count))
        })
        .collect();

    StrategyAggregate {
        strategy,
        games: count,
        wins,
        win_rate: ratio(wins, count),
        endings,
        mean_final_net_profit: games.iter().map(|g| g.final_net_profit).sum::<f64>() / denom,
        best_final_net_profit: games
            .iter()
            .map(|g| g.final_net_profit)
            .fold(f64::NEG_INFINITY, f64::max),
        mean_final_balance: games.iter().map(|g| g.final_balance).sum::<f64>() / denom,
        mean_turns: games.iter().map(|g| f64::from(g.turns_played)).sum::<f64>() / denom,
        achievement_rates,
    }
}

pub fn generate_console_report<W: Write + ?Sized>(
    writer: &mut W,
    profile: RulesetProfile,
    aggregates: &[StrategyAggregate],
    total_duration: Duration,
) -> Result<()> {
    writeln!(writer)?;
    writeln!(
        writer,
        "{}",
        format!("📊 Strategy Results ({profile})").as_str().bright_cyan().bold()
    )?;
    writeln!(writer, "{}", "==============================".cyan())?;

    let total_games: usize = aggregates.iter().map(|a| a.games).sum();
    writeln!(writer, "Games played: {total_games}")?;
    writeln!(writer, "Total time: {total_duration:?}")?;
    writeln!(writer)?;

    for aggregate in aggregates {
        let rate = aggregate.win_rate * 100.0;
        let rate_label = format!("{rate:.1}%");
        let rate_label = if aggregate.wins > 0 {
            rate_label.as_str().green()
        } else {
            rate_label.as_str().red()
        };
        writeln!(
            writer,
            "{} {} wins/{} games ({rate_label})",
            aggregate.strategy.label().bold(),
            aggregate.wins,
            aggregate.games
        )?;
        let endings: Vec<String> = aggregate
            .endings
            .iter()
            .map(|(key, count)| format!("{key} {count}"))
            .collect();
        writeln!(writer, "   Endings: {}", endings.join(", "))?;
        writeln!(
            writer,
            "   Mean net profit: ${:.2} (best ${:.2})",
            aggregate.mean_final_net_profit, aggregate.best_final_net_profit
        )?;
        writeln!(
            writer,
            "   Mean balance: ${:.2}  Mean turns: {:.1}",
            aggregate.mean_final_balance, aggregate.mean_turns
        )?;
        let unlocked: Vec<String> = aggregate
            .achievement_rates
            .iter()
            .filter(|(_, rate)| **rate > 0.0)
            .map(|(key, rate)| format!("{key} {:.0}%", rate * 100.0))
            .collect();
        if !unlocked.is_empty() {
            writeln!(writer, "   Achievements: {}", unlocked.join(", "))?;
        }
        writeln!(writer)?;
    }

    if let Some(best) = aggregates
        .iter()
        .max_by(|a, b| a.win_rate.total_cmp(&b.win_rate))
    {
        writeln!(
            writer,
            "{} {}",
            "🏆 Best strategy:".bright_yellow().bold(),
            best.strategy.label().green()
        )?;
    }
    Ok(())
}

pub fn generate_json_report<W: Write + ?Sized>(
    writer: &mut W,
    profile: RulesetProfile,
    aggregates: &[StrategyAggregate],
    games: &[GameRecord],
) -> Result<()> {
    let report = JsonReport {
        profile: profile.key(),
        generated_at: Utc::now().to_rfc3339(),
        aggregates,
        games,
    };
    serde_json::to_writer_pretty(&mut *writer, &report)?;
    writeln!(writer)?;
    Ok(())
}

pub fn generate_markdown_report<W: Write + ?Sized>(
    writer: &mut W,
    profile: RulesetProfile,
    aggregates: &[StrategyAggregate],
) -> Result<()> {
    writeln!(writer, "# Unitsim Strategy Results ({profile})\n")?;
    writeln!(
        writer,
        "| Strategy | Games | Wins | Win rate | Mean net profit | Mean balance | Mean turns |"
    )?;
    writeln!(
        writer,
        "|----------|-------|------|----------|-----------------|--------------|------------|"
    )?;
    for aggregate in aggregates {
        writeln!(
            writer,
            "| {} | {} | {} | {:.1}% | {:.2} | {:.2} | {:.1} |",
            aggregate.strategy.label(),
            aggregate.games,
            aggregate.wins,
            aggregate.win_rate * 100.0,
            aggregate.mean_final_net_profit,
            aggregate.mean_final_balance,
            aggregate.mean_turns
        )?;
    }

    writeln!(writer, "\n## Endings\n")?;
    for aggregate in aggregates {
        let endings: Vec<String> = aggregate
            .endings
            .iter()
            .map(|(key, count)| format!("{key}: {count}"))
            .collect();
        writeln!(
            writer,
            "- **{}**: {}",
            aggregate.strategy.label(),
            endings.join(", ")
        )?;
    }

    writeln!(writer, "\n## Achievement unlock rates\n")?;
    for aggregate in aggregates {
        writeln!(writer, "### {}\n", aggregate.strategy.label())?;
        for (key, rate) in &aggregate.achievement_rates {
            let title = REGISTRY
                .iter()
                .find(|a| a.id.key() == key)
                .map_or(key.as_str(), |a| a.title);
            writeln!(writer, "- {title}: {:.1}%", rate * 100.0)?;
        }
        writeln!(writer)?;
    }
    Ok(())
}
