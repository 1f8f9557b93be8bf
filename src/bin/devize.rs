use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};

use devize::{
    AssigneeStats, Dashboard, DueWindow, MetricsOptions, Priority, ProjectStats, Snapshot, Task,
    TaskHighlight, TaskOrder, TaskQuery, TaskStatus,
};

#[derive(Parser)]
#[command(name = "devize", about = "Devize team analytics: scores, leaderboards and schedules")]
struct Cli {
    /// Snapshot path (default: $DEVIZE_SNAPSHOT or ~/.devize/snapshot.json)
    #[arg(long)]
    snapshot: Option<String>,

    /// Evaluate as of this time (RFC 3339 or YYYY-MM-DD; default: now)
    #[arg(long)]
    now: Option<String>,

    /// Weeks used as the velocity divisor
    #[arg(long, default_value = "4")]
    velocity_weeks: u32,

    /// Length of the "needs support" list
    #[arg(long, default_value = "5")]
    support_limit: usize,

    /// Increase logging verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show snapshot status
    Status,
    /// Show the developer leaderboard
    Leaderboard {
        /// Maximum rows
        #[arg(long)]
        limit: Option<usize>,
        /// Also report this user's rank (id, email or name)
        #[arg(long)]
        user: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Compute rollups for a user, a project or the whole team
    Metrics {
        #[command(subcommand)]
        target: MetricsTarget,
    },
    /// Show progress for every project, or a member's projects
    Projects {
        /// Only projects this user belongs to (id, email or name)
        #[arg(long)]
        member: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the full analytics report
    Analytics {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show open tasks by due window
    Schedule {
        /// Only this window: today, week or month
        #[arg(long)]
        window: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the completion time and points of a task
    Score {
        /// Task id
        task_id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Open urgent, high priority or overdue tasks
    Attention {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// A user's open urgent and high priority tasks
    Focus {
        /// User id, email or name
        user: String,
        /// Maximum tasks
        #[arg(long, default_value = "3")]
        limit: usize,
    },
    /// Query tasks with filters
    Query {
        /// Filter by project id
        #[arg(long)]
        project: Option<String>,
        /// Filter by assignee id, email or name
        #[arg(long)]
        assignee: Option<String>,
        /// Filter by status (todo, in-progress, review, done)
        #[arg(long)]
        status: Option<String>,
        /// Filter by priority (low, medium, high, urgent)
        #[arg(long)]
        priority: Option<String>,
        /// Filter by label
        #[arg(long)]
        label: Option<String>,
        /// Filter completed tasks only
        #[arg(long)]
        completed: bool,
        /// Filter incomplete tasks only
        #[arg(long)]
        incomplete: bool,
        /// Filter overdue tasks only
        #[arg(long)]
        overdue: bool,
        /// Filter unassigned tasks only
        #[arg(long)]
        unassigned: bool,
        /// Created after date (YYYY-MM-DD)
        #[arg(long)]
        created_after: Option<String>,
        /// Created before date (YYYY-MM-DD)
        #[arg(long)]
        created_before: Option<String>,
        /// Due after date (YYYY-MM-DD)
        #[arg(long)]
        due_after: Option<String>,
        /// Due before date (YYYY-MM-DD)
        #[arg(long)]
        due_before: Option<String>,
        /// Sort by: created, due, completed, points, completion-time, priority
        #[arg(long)]
        order_by: Option<String>,
        /// Sort descending
        #[arg(long)]
        desc: bool,
        /// Maximum results
        #[arg(long, default_value = "100")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
        /// Output as CSV
        #[arg(long)]
        csv: bool,
        /// Count only (no output rows)
        #[arg(long)]
        count: bool,
    },
}

#[derive(Subcommand)]
enum MetricsTarget {
    /// Metrics for a user
    User {
        /// User id, email address or name
        #[arg(value_name = "USER_ID_OR_EMAIL")]
        user: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Metrics for a project
    Project {
        #[arg(value_name = "PROJECT_ID")]
        project_id: String,
        #[arg(long)]
        json: bool,
    },
    /// Headline numbers for the whole team
    Team {
        #[arg(long)]
        json: bool,
    },
}

/// Filters for the `query` subcommand.
struct QueryArgs {
    project: Option<String>,
    assignee: Option<String>,
    status: Option<String>,
    priority: Option<String>,
    label: Option<String>,
    completed: bool,
    incomplete: bool,
    overdue: bool,
    unassigned: bool,
    created_after: Option<String>,
    created_before: Option<String>,
    due_after: Option<String>,
    due_before: Option<String>,
    order_by: Option<String>,
    desc: bool,
    limit: usize,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let snapshot = match &cli.snapshot {
        Some(path) => Snapshot::open_at(path)?,
        None => Snapshot::open()?,
    };
    let now: DateTime<Utc> = match &cli.now {
        Some(s) => devize::date_util::parse_timestamp(s)?,
        None => Utc::now(),
    };
    let options = MetricsOptions {
        velocity_window_weeks: cli.velocity_weeks,
        needs_support_limit: cli.support_limit,
        ..MetricsOptions::default()
    };
    log::info!("Evaluating snapshot as of {}", now.to_rfc3339());
    let dw = Dashboard::with_options(snapshot, now, options);

    match cli.command {
        Commands::Status => print_status(&dw),
        Commands::Leaderboard { limit, user, json } => {
            handle_leaderboard(&dw, limit, user.as_deref(), json)?;
        }
        Commands::Metrics { target } => handle_metrics(&dw, target)?,
        Commands::Projects { member, json } => {
            let projects = match member {
                Some(m) => dw.member_project_stats(&m)?,
                None => dw.all_project_stats(),
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&projects)?);
            } else if projects.is_empty() {
                println!("No projects found.");
            } else {
                println!("Projects");
                print_project_lines(&projects);
            }
        }
        Commands::Analytics { json } => handle_analytics(&dw, json)?,
        Commands::Schedule { window, json } => handle_schedule(&dw, window.as_deref(), json)?,
        Commands::Score { task_id, json } => {
            let scored = dw.score_task(&task_id)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&scored)?);
            } else {
                println!("{} ({})", scored.task.title, scored.task.id);
                println!("  Priority:   {}", scored.task.priority);
                match scored.completion_days {
                    Some(days) => println!("  Completion: {days} days"),
                    None => println!("  Completion: not completed"),
                }
                println!("  Points:     {}", scored.points);
            }
        }
        Commands::Attention { json } => {
            let tasks = dw.needs_attention();
            if json {
                println!("{}", serde_json::to_string_pretty(&tasks)?);
            } else if tasks.is_empty() {
                println!("Nothing needs attention.");
            } else {
                println!("Needs Attention");
                for task in &tasks {
                    print_task_line(&dw, task);
                }
                println!("\n{} tasks", tasks.len());
            }
        }
        Commands::Focus { user, limit } => {
            let tasks = dw.focus(&user, limit)?;
            if tasks.is_empty() {
                println!("No urgent or high priority tasks.");
            } else {
                println!("Today's Focus");
                for task in &tasks {
                    print_task_line(&dw, task);
                }
            }
        }
        Commands::Query {
            project,
            assignee,
            status,
            priority,
            label,
            completed,
            incomplete,
            overdue,
            unassigned,
            created_after,
            created_before,
            due_after,
            due_before,
            order_by,
            desc,
            limit,
            json,
            csv,
            count,
        } => {
            let args = QueryArgs {
                project,
                assignee,
                status,
                priority,
                label,
                completed,
                incomplete,
                overdue,
                unassigned,
                created_after,
                created_before,
                due_after,
                due_before,
                order_by,
                desc,
                limit,
            };
            handle_query(&dw, args, json, csv, count)?;
        }
    }

    Ok(())
}

fn print_status(dw: &Dashboard) {
    let snapshot = dw.snapshot();
    let overview = dw.team_overview();
    println!("Snapshot Status");
    println!("  Users:     {}", snapshot.users.len());
    println!("  Projects:  {}", snapshot.projects.len());
    println!("  Tasks:     {}", snapshot.tasks.len());
    println!("  Completed: {}", overview.completed_tasks);
    println!("  Overdue:   {}", overview.overdue_tasks);
    println!("  Blocked:   {}", overview.blocked_tasks);
    let anomalies = snapshot.anomalies();
    if !anomalies.is_empty() {
        println!("  Anomalies: {}", anomalies.len());
    }
    println!("  As of:     {}", dw.now().to_rfc3339());
    println!("  Velocity:  per {} weeks", dw.options().velocity_window_weeks);
}

fn handle_leaderboard(
    dw: &Dashboard,
    limit: Option<usize>,
    user: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let board = dw.leaderboard();
    let your_rank = match user {
        Some(u) => {
            let resolved = dw.resolve_user(u)?;
            Some((resolved.name.clone(), devize::metrics::rank_of(&board, &resolved.id)))
        }
        None => None,
    };
    let shown = &board[..limit.unwrap_or(board.len()).min(board.len())];

    if json {
        println!("{}", serde_json::to_string_pretty(shown)?);
        return Ok(());
    }
    if shown.is_empty() {
        println!("No developers to rank.");
        return Ok(());
    }
    println!("Leaderboard");
    for entry in shown {
        let s = &entry.stats;
        println!(
            "  #{:<3} {:<20} {:>6} pts  {:>3} done  {:>5.1} days avg  {:>3}% efficiency",
            entry.rank,
            s.user_name.as_deref().unwrap_or(&s.user_id),
            s.total_points,
            s.completed_count,
            s.avg_completion_time,
            s.efficiency
        );
    }
    if let Some((name, rank)) = your_rank {
        match rank {
            Some(r) => println!("\n{name} is ranked #{r} of {}", board.len()),
            None => println!("\n{name} is not on the leaderboard"),
        }
    }
    Ok(())
}

fn handle_metrics(dw: &Dashboard, target: MetricsTarget) -> anyhow::Result<()> {
    match target {
        MetricsTarget::User { user, json } => {
            let s = dw.assignee_stats(&user)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&s)?);
            } else {
                let resolved = dw.resolve_user(&user)?;
                println!("User Metrics: {} ({})", resolved.name, resolved.role_display_name());
                print_assignee(&s);
            }
        }
        MetricsTarget::Project { project_id, json } => {
            let p = dw.project_stats(&project_id)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&p)?);
            } else {
                println!("Project Metrics: {}", p.project_name.as_deref().unwrap_or(&p.project_id));
                print_project(&p);
            }
        }
        MetricsTarget::Team { json } => {
            let o = dw.team_overview();
            if json {
                println!("{}", serde_json::to_string_pretty(&o)?);
            } else {
                println!("Team Overview");
                println!("  Tasks:       {}", o.total_tasks);
                println!("  Completed:   {} ({:.1}%)", o.completed_tasks, o.completion_rate);
                println!("  In progress: {}", o.in_progress_tasks);
                println!("  Overdue:     {}", o.overdue_tasks);
                println!("  Blocked:     {}", o.blocked_tasks);
            }
        }
    }
    Ok(())
}

fn handle_analytics(dw: &Dashboard, json: bool) -> anyhow::Result<()> {
    let report = dw.analytics();
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let o = &report.overview;
    println!("Analytics");
    println!("  Tasks:       {}", o.total_tasks);
    println!("  Completed:   {} ({:.1}%)", o.completed_tasks, o.completion_rate);
    println!("  In progress: {}", o.in_progress_tasks);
    println!("  Overdue:     {}", o.overdue_tasks);
    println!("  Blocked:     {}", o.blocked_tasks);

    println!("\nTop Performers");
    for (i, s) in report.top_performers.iter().enumerate() {
        println!(
            "  {}. {} - {} pts",
            i + 1,
            s.user_name.as_deref().unwrap_or(&s.user_id),
            s.total_points
        );
    }

    println!("\nNeeds Support");
    if report.needs_support.is_empty() {
        println!("  (none)");
    }
    for s in &report.needs_support {
        println!(
            "  {} - {:.1} days avg",
            s.user_name.as_deref().unwrap_or(&s.user_id),
            s.avg_completion_time
        );
    }

    println!("\nFastest Completions");
    print_highlights(&report.fastest_tasks);
    println!("\nSlowest Completions");
    print_highlights(&report.slowest_tasks);

    println!("\nProjects");
    print_project_lines(&report.projects);
    Ok(())
}

fn print_project_lines(projects: &[ProjectStats]) {
    for p in projects {
        println!(
            "  {:<24} {:>3}%  ({}/{} done, {} overdue)",
            p.project_name.as_deref().unwrap_or(&p.project_id),
            p.progress,
            p.completed_tasks,
            p.total_tasks,
            p.overdue_count
        );
    }
}

fn handle_schedule(dw: &Dashboard, window: Option<&str>, json: bool) -> anyhow::Result<()> {
    let buckets = dw.schedule();
    let windows: Vec<DueWindow> = match window {
        Some(w) => vec![DueWindow::parse(w)?],
        None => DueWindow::ALL.to_vec(),
    };

    if json {
        let mut out = serde_json::Map::new();
        for w in &windows {
            out.insert(w.to_key().to_string(), serde_json::to_value(buckets.get(*w))?);
        }
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    for w in &windows {
        let tasks = buckets.get(*w);
        println!("Due {w} ({})", tasks.len());
        for task in tasks {
            print_task_line(dw, task);
        }
    }
    Ok(())
}

fn handle_query(
    dw: &Dashboard,
    args: QueryArgs,
    json: bool,
    csv: bool,
    count: bool,
) -> anyhow::Result<()> {
    let mut builder = TaskQuery::new().limit(args.limit);

    if let Some(p) = args.project {
        builder = builder.project(&p);
    }
    if let Some(a) = args.assignee {
        let resolved = dw.resolve_user(&a)?;
        builder = builder.assignee(&resolved.id);
    }
    if let Some(s) = args.status {
        let status = TaskStatus::parse(&s).ok_or_else(|| anyhow::anyhow!("Unknown status: {s}"))?;
        builder = builder.status(status);
    }
    if let Some(p) = args.priority {
        let priority =
            Priority::parse(&p).ok_or_else(|| anyhow::anyhow!("Unknown priority: {p}"))?;
        builder = builder.priority(priority);
    }
    if let Some(l) = args.label {
        builder = builder.label(&l);
    }
    if args.completed {
        builder = builder.completed(true);
    }
    if args.incomplete {
        builder = builder.completed(false);
    }
    if args.overdue {
        builder = builder.overdue(true);
    }
    if args.unassigned {
        builder = builder.has_assignee(false);
    }
    if let Some(d) = args.created_after {
        builder = builder.created_after(devize::date_util::parse_timestamp(&d)?);
    }
    if let Some(d) = args.created_before {
        builder = builder.created_before(devize::date_util::parse_timestamp(&d)?);
    }
    if let Some(d) = args.due_after {
        builder = builder.due_after(devize::date_util::parse_timestamp(&d)?);
    }
    if let Some(d) = args.due_before {
        builder = builder.due_before(devize::date_util::parse_timestamp(&d)?);
    }
    if let Some(o) = args.order_by {
        builder = builder.order_by(TaskOrder::parse(&o)?);
    }
    if args.desc {
        builder = builder.descending();
    }

    let snapshot = dw.snapshot();
    let now = dw.now();
    if count {
        println!("{}", builder.count(snapshot, now));
    } else if json {
        println!("{}", builder.to_json(snapshot, now)?);
    } else if csv {
        print!("{}", builder.to_csv(snapshot, now));
    } else {
        let rows = builder.tasks(snapshot, now);
        if rows.is_empty() {
            println!("No tasks found.");
        } else {
            for row in &rows {
                let assignees = if row.assignee_names.is_empty() {
                    "unassigned".to_string()
                } else {
                    row.assignee_names.join(", ")
                };
                let project_name = row.project_name.as_deref().unwrap_or(&row.project_id);
                let due = row
                    .due_date
                    .map_or("no due date".to_string(), |d| d.format("%Y-%m-%d").to_string());
                println!(
                    "[{}] {} ({}) - {assignees} | {project_name} | due: {due} | {} pts",
                    row.status, row.title, row.task_id, row.points
                );
            }
            println!("\n{} tasks", rows.len());
        }
    }

    Ok(())
}

fn print_assignee(s: &AssigneeStats) {
    println!("  Tasks:");
    println!("    To do:       {}", s.status_counts.todo);
    println!("    In progress: {}", s.status_counts.in_progress);
    println!("    Review:      {}", s.status_counts.review);
    println!("    Done:        {}", s.status_counts.done);
    println!("    Overdue:     {}", s.overdue_count);
    println!("  Performance:");
    println!("    Points:      {}", s.total_points);
    println!("    Avg time:    {:.1} days", s.avg_completion_time);
    println!("    Velocity:    {:.2} tasks/week", s.velocity);
    println!("    Efficiency:  {}%", s.efficiency);
}

fn print_project(p: &ProjectStats) {
    println!("  Progress:    {}% ({}/{} done)", p.progress, p.completed_tasks, p.total_tasks);
    println!("  Overdue:     {}", p.overdue_count);
    println!("  To do:       {}", p.status_counts.todo);
    println!("  In progress: {}", p.status_counts.in_progress);
    println!("  Review:      {}", p.status_counts.review);
}

fn print_highlights(highlights: &[TaskHighlight]) {
    if highlights.is_empty() {
        println!("  (none)");
    }
    for h in highlights {
        println!(
            "  {} ({}) - {} days, {} pts",
            h.title, h.task_id, h.completion_days, h.points
        );
    }
}

fn print_task_line(dw: &Dashboard, task: &Task) {
    let assignees: Vec<&str> = task
        .assignees
        .iter()
        .map(|id| {
            devize::storage::repository::user_by_id(dw.snapshot(), id)
                .map_or(id.as_str(), |u| u.name.as_str())
        })
        .collect();
    let assignees = if assignees.is_empty() {
        "unassigned".to_string()
    } else {
        assignees.join(", ")
    };
    let due = match devize::schedule::days_until_due(task, dw.now()) {
        Some(d) if d < 0 => format!("{} days overdue", -d),
        Some(0) => "due today".to_string(),
        Some(d) => format!("due in {d} days"),
        None => "no due date".to_string(),
    };
    println!(
        "  [{}] [{}] {} ({}) - {assignees} | {due}",
        task.status, task.priority, task.title, task.id
    );
}
