mod init;
pub use init::cmd_init;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;

use crate::board::{AutoRefresh, BoardController, BoardEvent, CycleOutcome, CycleReason, RefreshOutcome};
use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::board_io::{self, BoardPaths};
use crate::io::config_io;
use crate::io::repository::FileRepository;
use crate::io::watcher::BoardWatcher;
use crate::model::config::BoardConfig;
use crate::model::task::{NewTask, TaskId};
use crate::ops::columns::lanes;
use crate::ops::timeline::{ZoomLevel, layout_board};
use crate::ops::templates::{RegistryError, StatusTemplateRegistry};

type CmdResult = Result<(), Box<dyn std::error::Error>>;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub async fn dispatch(cli: Cli) -> CmdResult {
    let json = cli.json;
    let start = match &cli.board_dir {
        Some(dir) => std::fs::canonicalize(dir)
            .map_err(|e| format!("cannot resolve -C path '{}': {}", dir, e))?,
        None => std::env::current_dir()?,
    };

    match cli.command {
        Commands::Init(args) => cmd_init(args, &start),
        Commands::Templates => cmd_templates(&start, json),
        Commands::Template(args) => cmd_template(args, &start, json).await,
        Commands::Board => cmd_board(&start, json).await,
        Commands::Add(args) => cmd_add(args, &start, json).await,
        Commands::Mv(args) => cmd_mv(args, &start, json).await,
        Commands::Refresh => cmd_refresh(&start, json).await,
        Commands::Timeline(args) => cmd_timeline(args, &start, json).await,
        Commands::Zoom(args) => cmd_zoom(args, &start),
        Commands::Watch(args) => cmd_watch(args, &start).await,
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// An opened board: files, config, and a controller that has already run
/// its initial load-and-reconcile cycle.
struct Session {
    paths: BoardPaths,
    config: BoardConfig,
    controller: BoardController,
    loaded: CycleOutcome,
}

async fn open_session(start: &Path) -> Result<Session, Box<dyn std::error::Error>> {
    let paths = board_io::discover_board(start)?;
    let config = board_io::load_config(&paths)?;

    let mut registry = StatusTemplateRegistry::builtin();
    registry.set_active(&config.board.template)?;

    let controller = BoardController::new(
        config.board.name.clone(),
        registry,
        Arc::new(FileRepository::new(paths.clone())),
        Duration::from_secs(config.refresh.request_timeout_secs),
    );
    let loaded = controller.run_cycle(CycleReason::Load).await?;
    report_cycle(&loaded);

    Ok(Session {
        paths,
        config,
        controller,
        loaded,
    })
}

/// Migration notice and persistence failures go to stderr so JSON output
/// stays clean.
fn report_cycle(outcome: &CycleOutcome) {
    let CycleOutcome::Completed(rec) = outcome else {
        return;
    };
    if let Some(msg) = rec.notification() {
        eprintln!("{}", msg);
    }
    if !rec.failures.is_empty() {
        let ids: Vec<String> = rec.failures.iter().map(|f| format!("#{}", f.task_id)).collect();
        eprintln!(
            "warning: could not save {} task(s): {} (run `tb refresh` to retry)",
            ids.len(),
            ids.join(", ")
        );
    }
}

fn parse_task_id(raw: &str) -> Result<TaskId, String> {
    raw.parse().map_err(|_| format!("invalid task id: {}", raw))
}

fn today() -> chrono::NaiveDate {
    Local::now().date_naive()
}

// ---------------------------------------------------------------------------
// Template commands
// ---------------------------------------------------------------------------

fn cmd_templates(start: &Path, json: bool) -> CmdResult {
    let registry = StatusTemplateRegistry::builtin();
    // Outside a board nothing is marked active
    let active = board_io::discover_board(start)
        .and_then(|paths| board_io::load_config(&paths))
        .map(|config| config.board.template)
        .ok();
    let is_active = |id: &str| active.as_deref() == Some(id);

    if json {
        let out: Vec<TemplateJson> = registry
            .list_templates()
            .map(|t| template_to_json(t, is_active(&t.id)))
            .collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        for t in registry.list_templates() {
            println!("{}", format_template(t, is_active(&t.id)));
        }
    }
    Ok(())
}

async fn cmd_template(args: TemplateArgs, start: &Path, json: bool) -> CmdResult {
    let session = open_session(start).await?;
    let outcome = switch_template(&session.controller, &session.paths.board_dir, &args.id).await?;
    report_cycle(&outcome);

    let template = session.controller.snapshot().await.template;
    if json {
        let rec = match outcome {
            CycleOutcome::Completed(rec) => Some(rec),
            CycleOutcome::Queued => None,
        };
        let out = serde_json::json!({
            "template": template.id,
            "reconciliation": rec,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("Active template: {} ({})", template.name, template.id);
    }
    Ok(())
}

/// Record `id` in board.toml, then reconcile the board against it. A failed
/// reconcile leaves board.toml naming the new template, so the next load
/// finishes the migration.
async fn switch_template(
    controller: &BoardController,
    board_dir: &Path,
    id: &str,
) -> Result<CycleOutcome, Box<dyn std::error::Error>> {
    if !controller.templates().iter().any(|t| t.id == id) {
        return Err(RegistryError::TemplateNotFound(id.to_string()).into());
    }
    let (_, mut doc) = config_io::read_config(board_dir)?;
    config_io::set_active_template(&mut doc, id);
    config_io::write_config(board_dir, &doc)?;

    controller
        .activate_template(id)
        .await
        .map_err(|e| -> Box<dyn std::error::Error> {
            format!(
                "switched to template {} but could not reconcile tasks: {} (run `tb refresh` to retry)",
                id, e
            )
            .into()
        })
}

// ---------------------------------------------------------------------------
// Board commands
// ---------------------------------------------------------------------------

async fn cmd_board(start: &Path, json: bool) -> CmdResult {
    let session = open_session(start).await?;
    let context = session.controller.snapshot().await;
    let columns = context.columns();
    let lanes = lanes(&columns, &context.tasks);

    if json {
        println!("{}", serde_json::to_string_pretty(&lanes_to_json(&lanes))?);
    } else {
        println!("{} [{}]", session.config.board.name, context.template.name);
        print!("{}", format_lanes(&lanes));
    }
    Ok(())
}

async fn cmd_add(args: AddArgs, start: &Path, json: bool) -> CmdResult {
    if let (Some(s), Some(e)) = (args.start, args.end)
        && e < s
    {
        return Err(format!("end date {} is before start date {}", e, s).into());
    }
    let session = open_session(start).await?;
    let task = session
        .controller
        .create_task(NewTask {
            title: args.title,
            description: args.description.unwrap_or_default(),
            start_date: args.start,
            end_date: args.end,
            assignees: args.assignees.into_iter().collect(),
        })
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&task_to_json(&task))?);
    } else {
        println!("{} [{}]", format_task_line(&task), task.status);
    }
    Ok(())
}

async fn cmd_mv(args: MvArgs, start: &Path, json: bool) -> CmdResult {
    let id = parse_task_id(&args.id)?;
    let session = open_session(start).await?;
    let mut events = session.controller.subscribe();
    let verdict = session.controller.attempt_move(id, &args.status).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&verdict)?);
        return Ok(());
    }
    if let Some(reason) = verdict.reason {
        return Err(format!("cannot move #{} to {}: {}", id, args.status, reason).into());
    }
    match events.try_recv() {
        Ok(BoardEvent::TaskMoved { message, .. }) => println!("{}", message),
        _ => println!("#{} → {}", id, args.status),
    }
    Ok(())
}

async fn cmd_refresh(start: &Path, json: bool) -> CmdResult {
    let session = open_session(start).await?;
    let CycleOutcome::Completed(rec) = &session.loaded else {
        return Ok(());
    };
    if json {
        println!("{}", serde_json::to_string_pretty(rec)?);
    } else if rec.migrated_count == 0 {
        let context = session.controller.snapshot().await;
        println!(
            "Board is up to date ({} tasks, template {})",
            context.tasks.len(),
            context.template.id
        );
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Timeline commands
// ---------------------------------------------------------------------------

async fn cmd_timeline(args: TimelineArgs, start: &Path, json: bool) -> CmdResult {
    let session = open_session(start).await?;
    let zoom = ZoomLevel::new(args.zoom.unwrap_or(session.config.timeline.zoom))?;
    let context = session.controller.snapshot().await;
    let layout = layout_board(
        &context.tasks,
        args.today.unwrap_or_else(today),
        zoom,
        session.config.timeline.default_duration_days,
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&layout)?);
    } else {
        print!("{}", format_timeline(&layout));
    }
    Ok(())
}

fn cmd_zoom(args: ZoomArgs, start: &Path) -> CmdResult {
    let paths = board_io::discover_board(start)?;
    let (config, mut doc) = config_io::read_config(&paths.board_dir)?;
    let current = ZoomLevel::new(config.timeline.zoom).unwrap_or_default();

    let next = match args.step.as_str() {
        "in" => current.zoom_in(),
        "out" => current.zoom_out(),
        n => {
            let level: u8 = n
                .parse()
                .map_err(|_| format!("invalid zoom step '{}': expected in, out or 1-5", n))?;
            ZoomLevel::new(level)?
        }
    };

    config_io::set_zoom(&mut doc, next.level());
    config_io::write_config(&paths.board_dir, &doc)?;
    println!("Zoom: {} ({}px/day)", next.level(), next.day_width());
    Ok(())
}

// ---------------------------------------------------------------------------
// Watch
// ---------------------------------------------------------------------------

async fn cmd_watch(args: WatchArgs, start: &Path) -> CmdResult {
    let session = open_session(start).await?;
    let interval = Duration::from_secs(
        args.interval
            .unwrap_or(session.config.refresh.interval_secs)
            .max(1),
    );

    let watcher = match BoardWatcher::start(&session.paths.board_dir) {
        Ok(w) => Some(w),
        Err(e) => {
            tracing::warn!(error = %e, "file watching unavailable; interval refresh only");
            None
        }
    };

    let board_dir: PathBuf = session.paths.board_dir.clone();
    println!(
        "Watching {} every {}s (Ctrl-C to stop)",
        board_dir.display(),
        interval.as_secs()
    );

    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    AutoRefresh::new(&session.controller, interval)
        .follow_config(&board_dir)
        .run_until(watcher, shutdown, |result| {
            let stamp = Local::now().format("%H:%M:%S");
            match result {
                Ok(RefreshOutcome::Ran(outcome)) => {
                    if let CycleOutcome::Completed(rec) = &outcome {
                        match rec.notification() {
                            Some(msg) => println!("[{}] {}", stamp, msg),
                            None => println!("[{}] refreshed", stamp),
                        }
                    }
                    report_failures_only(&outcome);
                }
                Ok(RefreshOutcome::Skipped) => {}
                Err(e) => eprintln!("[{}] error: {}", stamp, e),
            }
        })
        .await;
    Ok(())
}

fn report_failures_only(outcome: &CycleOutcome) {
    if let CycleOutcome::Completed(rec) = outcome
        && !rec.failures.is_empty()
    {
        let ids: Vec<String> = rec.failures.iter().map(|f| format!("#{}", f.task_id)).collect();
        eprintln!("warning: could not save {}", ids.join(", "));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::board_io::init_board;
    use crate::io::repository::MemoryRepository;
    use crate::model::task::Task;

    fn template_in_config(board_dir: &Path) -> String {
        config_io::read_config(board_dir).unwrap().0.board.template
    }

    #[tokio::test]
    async fn switch_template_records_config_before_reconciling() {
        let tmp = tempfile::TempDir::new().unwrap();
        let paths = init_board(tmp.path(), "b", "default", false).unwrap();
        let repo = Arc::new(MemoryRepository::new(vec![Task::new(TaskId(1), "a", "not_started")]));
        let ctl = BoardController::new(
            "b",
            StatusTemplateRegistry::builtin(),
            repo.clone(),
            Duration::from_secs(5),
        );

        repo.fail_next_loads(1);
        let err = switch_template(&ctl, &paths.board_dir, "simple").await.unwrap_err();
        assert!(err.to_string().contains("tb refresh"));
        assert_eq!(template_in_config(&paths.board_dir), "simple");

        assert!(switch_template(&ctl, &paths.board_dir, "nope").await.is_err());
        assert_eq!(template_in_config(&paths.board_dir), "simple");

        let outcome = switch_template(&ctl, &paths.board_dir, "agile").await.unwrap();
        assert!(matches!(outcome, CycleOutcome::Completed(ref rec) if rec.migrated_count == 1));
        assert_eq!(template_in_config(&paths.board_dir), "agile");
    }
}
