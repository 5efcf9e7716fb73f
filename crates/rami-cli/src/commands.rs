use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context as _};
use colored::Colorize;
use rami_ledger::{RecordValidator, ReplayEngine, RoundDeltaRow, RoundHistoryRow, Standing};
use rami_server::{RamiServer, ServerConfig};
use rami_session::{GameSession, SessionError, SessionRegistry};
use rami_store::{FileGameStore, GameStore};
use rami_types::{GameId, PlayerName, PlayerRoster, RoundDelta};
use serde::Serialize;
use serde_json::json;

use crate::cli::*;

/// Settings shared by every command.
struct Context {
    game: String,
    data_dir: PathBuf,
    format: OutputFormat,
}

impl Context {
    fn game_id(&self) -> anyhow::Result<GameId> {
        GameId::new(&self.game).with_context(|| format!("invalid --game {:?}", self.game))
    }

    fn store(&self) -> anyhow::Result<Arc<FileGameStore>> {
        let store = FileGameStore::open(&self.data_dir)
            .with_context(|| format!("cannot open data directory {}", self.data_dir.display()))?;
        Ok(Arc::new(store))
    }

    fn registry(&self) -> anyhow::Result<SessionRegistry> {
        Ok(SessionRegistry::new(self.store()?))
    }

    /// Load the selected game, failing with a hint when it does not exist.
    /// An unreadable save starts over with the default players.
    fn session(&self) -> anyhow::Result<Arc<GameSession>> {
        let id = self.game_id()?;
        let fallback = ServerConfig::default().default_roster()?;
        match self.registry()?.get(&id, &fallback) {
            Ok(session) => Ok(session),
            Err(SessionError::GameNotFound(_)) => {
                bail!("no saved game {id:?}; start one with `rami new --players ...`")
            }
            Err(e) => Err(e).with_context(|| format!("cannot load game {id:?}")),
        }
    }

    fn json(&self) -> bool {
        self.format == OutputFormat::Json
    }
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let ctx = Context {
        game: cli.game,
        data_dir: cli.data_dir,
        format: cli.format,
    };
    tracing::debug!(game = %ctx.game, data_dir = %ctx.data_dir.display(), "running command");
    match cli.command {
        Command::New(args) => cmd_new(&ctx, args),
        Command::Round(args) => cmd_round(&ctx, args),
        Command::Scores => cmd_scores(&ctx),
        Command::History => cmd_history(&ctx),
        Command::Rounds => cmd_rounds(&ctx),
        Command::Reset(args) => cmd_reset(&ctx, args),
        Command::Verify => cmd_verify(&ctx),
        Command::List => cmd_list(&ctx),
        Command::Serve(args) => cmd_serve(&ctx, args),
    }
}

fn cmd_new(ctx: &Context, args: NewArgs) -> anyhow::Result<()> {
    let roster = PlayerRoster::new(args.players).context("invalid players")?;
    let id = ctx.game_id()?;
    let session = match ctx.registry()?.create(id.clone(), roster) {
        Ok(session) => session,
        Err(SessionError::GameExists(_)) => {
            bail!("game {id:?} already exists; use `rami reset` or pick another --game")
        }
        Err(e) => return Err(e.into()),
    };
    if ctx.json() {
        return print_json(&json!({ "id": id, "players": session.roster()? }));
    }
    let names: Vec<String> = session.roster()?.iter().map(|p| p.to_string()).collect();
    println!("{} Started game {}", "✓".green().bold(), id.as_str().bold());
    println!("  Players: {}", names.join(", ").cyan());
    Ok(())
}

fn cmd_round(ctx: &Context, args: RoundArgs) -> anyhow::Result<()> {
    let mut delta = RoundDelta::new();
    for (name, amount) in args.scores {
        let player = PlayerName::new(name).context("invalid player name")?;
        if delta.insert(player.clone(), amount).is_some() {
            bail!("{player} is listed more than once");
        }
    }
    let session = ctx.session()?;
    session.record_round(delta).context("round rejected")?;
    let standings = session.standings()?;
    if ctx.json() {
        return print_json(&standings);
    }
    let rounds = session.with_ledger(|l| l.round_count())?;
    println!("{} Round {} recorded", "✓".green().bold(), rounds.to_string().bold());
    print_standings(&standings);
    Ok(())
}

fn cmd_scores(ctx: &Context) -> anyhow::Result<()> {
    let session = ctx.session()?;
    let standings = session.standings()?;
    if ctx.json() {
        return print_json(&json!({
            "id": session.id(),
            "phase": session.phase()?,
            "scores": session.current_scores()?,
            "standings": standings,
        }));
    }
    let rounds = session.with_ledger(|l| l.round_count())?;
    println!("Game {} after {} round(s)", session.id().as_str().bold(), rounds);
    print_standings(&standings);
    Ok(())
}

fn cmd_history(ctx: &Context) -> anyhow::Result<()> {
    let session = ctx.session()?;
    let rows = session.round_history_table()?;
    if ctx.json() {
        return print_json(&rows);
    }
    let roster = session.roster()?;
    print_round_table(&roster, rows.iter().map(history_cells));
    Ok(())
}

fn cmd_rounds(ctx: &Context) -> anyhow::Result<()> {
    let session = ctx.session()?;
    let rows = session.round_deltas()?;
    if ctx.json() {
        return print_json(&rows);
    }
    let roster = session.roster()?;
    print_round_table(&roster, rows.iter().map(delta_cells));
    Ok(())
}

fn cmd_reset(ctx: &Context, args: ResetArgs) -> anyhow::Result<()> {
    let roster = args
        .players
        .map(PlayerRoster::new)
        .transpose()
        .context("invalid players")?;
    let session = ctx.session()?;
    session.reset(roster)?;
    if ctx.json() {
        return print_json(&json!({ "id": session.id(), "players": session.roster()? }));
    }
    println!("{} Game {} reset", "✓".green().bold(), session.id().as_str().bold());
    Ok(())
}

fn cmd_verify(ctx: &Context) -> anyhow::Result<()> {
    let id = ctx.game_id()?;
    let record = ctx
        .store()?
        .load(&id)
        .with_context(|| format!("cannot read game {id:?}"))?;
    let report = RecordValidator::validate(&record);
    let converges = if report.is_valid() {
        ReplayEngine::verify_convergence(&record)?
    } else {
        false
    };

    if ctx.json() {
        let violations: Vec<_> = report
            .violations
            .iter()
            .map(|v| json!({ "round": v.round, "player": v.player, "kind": format!("{:?}", v.kind), "description": v.description }))
            .collect();
        print_json(&json!({
            "id": id,
            "valid": report.is_valid(),
            "players": report.player_count,
            "rounds": report.round_count,
            "replay_converges": converges,
            "violations": violations,
        }))?;
    } else if report.is_valid() {
        println!("{} Game {} is consistent", "✓".green().bold(), id.as_str().bold());
        println!("  Players: {}", report.player_count);
        println!("  Rounds: {}", report.round_count);
        println!("  Replay: {}", if converges { "matches".green() } else { "differs".red() });
    } else {
        println!("{} Game {} has problems", "✗".red().bold(), id.as_str().bold());
        for v in &report.violations {
            let place = match (v.round, &v.player) {
                (Some(r), Some(p)) => format!("round {r}, {p}: "),
                (Some(r), None) => format!("round {r}: "),
                (None, Some(p)) => format!("{p}: "),
                (None, None) => String::new(),
            };
            println!("  - {}{}", place.yellow(), v.description);
        }
    }

    if !report.is_valid() {
        bail!("{} problem(s) found in game {id:?}", report.violations.len());
    }
    Ok(())
}

fn cmd_list(ctx: &Context) -> anyhow::Result<()> {
    let ids = ctx.store()?.list()?;
    if ctx.json() {
        return print_json(&ids);
    }
    if ids.is_empty() {
        println!("No saved games in {}.", ctx.data_dir.display());
    }
    for id in ids {
        println!("{id}");
    }
    Ok(())
}

fn cmd_serve(ctx: &Context, args: ServeArgs) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(path) => ServerConfig::load(path)
            .with_context(|| format!("cannot load config {}", path.display()))?,
        None => ServerConfig {
            data_dir: ctx.data_dir.clone(),
            ..ServerConfig::default()
        },
    };
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    println!(
        "Rami server on {} (games: {})",
        config.bind_addr.to_string().bold(),
        config.data_dir.display()
    );
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(RamiServer::new(config).serve())?;
    Ok(())
}

// ---- Tables ----

fn score_cell(score: i64) -> String {
    let text = format!("{score:>8}");
    match score.signum() {
        1 => text.green().to_string(),
        -1 => text.red().to_string(),
        _ => text,
    }
}

fn print_standings(standings: &[Standing]) {
    for s in standings {
        println!("  {:>2}. {:<16}{}", s.rank, s.player.as_str(), score_cell(s.score));
    }
}

fn history_cells(row: &RoundHistoryRow) -> (usize, bool, Vec<i64>) {
    (row.round, false, row.scores.values().copied().collect())
}

fn delta_cells(row: &RoundDeltaRow) -> (usize, bool, Vec<i64>) {
    (row.round, row.null_round, row.deltas.iter().map(|(_, v)| v).collect())
}

/// Print one line per round with a column per player in seat order.
///
/// Cells arrive in name order (the rows are keyed maps), so they are
/// re-ordered through the sorted roster.
fn print_round_table(roster: &PlayerRoster, rows: impl Iterator<Item = (usize, bool, Vec<i64>)>) {
    let mut sorted: Vec<&PlayerName> = roster.iter().collect();
    sorted.sort();
    let seat_to_sorted: Vec<usize> = roster
        .iter()
        .filter_map(|p| sorted.iter().position(|s| *s == p))
        .collect();

    let header: String = roster.iter().map(|p| format!("{:>8}", p.as_str())).collect();
    println!("{}{}", "Round".bold(), header.bold());
    let mut empty = true;
    for (round, null_round, cells) in rows {
        empty = false;
        let line: String = seat_to_sorted
            .iter()
            .map(|&i| cells.get(i).map_or_else(|| format!("{:>8}", "-"), |&v| score_cell(v)))
            .collect();
        let marker = if null_round { " (null)".dimmed().to_string() } else { String::new() };
        println!("{round:>5}{line}{marker}");
    }
    if empty {
        println!("{}", "No rounds recorded.".dimmed());
    }
}
