//! grievance-desk: headless runner for the grievance portal.
//!
//! Usage:
//!   grievance-desk --db portal.db --config data/portal.json
//!   grievance-desk --db portal.db --ipc-mode

use anyhow::Result;
use grievance_core::{
    assistant::AssistantBridge,
    classifier::PriorityClassifier,
    complaint::{Complaint, ComplaintStatus, NewComplaint, Priority},
    config::PortalConfig,
    lifecycle::{ComplaintFilter, LifecycleManager},
    oracle::{oracle_from_config, ChatTurn, Oracle},
    store::PortalStore,
};
use serde::Serialize;
use std::env;
use std::io::{self, BufRead, Write};

type Desk = LifecycleManager<PortalStore>;

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    Lodge {
        complaint: NewComplaint,
    },
    Track {
        id: String,
    },
    Forward {
        id: String,
        #[serde(default)]
        remark: Option<String>,
    },
    UpdateStatus {
        id: String,
        status: String,
        #[serde(default)]
        remark: Option<String>,
    },
    List {
        #[serde(default)]
        status: Option<String>,
        #[serde(default)]
        priority: Option<String>,
        #[serde(default)]
        search: Option<String>,
    },
    Stats,
    Chat {
        #[serde(default)]
        history: Vec<ChatTurn>,
        message: String,
    },
    Quit,
}

/// A complaint as the admin table shows it.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ComplaintView<'a> {
    #[serde(flatten)]
    complaint: &'a Complaint,
    status_label: String,
    overdue: bool,
}

fn view<'a>(desk: &Desk, complaint: &'a Complaint) -> ComplaintView<'a> {
    ComplaintView {
        complaint,
        status_label: complaint.status_label(),
        overdue: desk.is_overdue(complaint),
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let db = flag_value(&args, "--db").unwrap_or(":memory:");
    let config = match flag_value(&args, "--config") {
        Some(path) => PortalConfig::load(path)?,
        None => PortalConfig::default(),
    };

    if !ipc_mode {
        println!("Grievance Desk");
        println!("  db:        {db}");
        println!("  policy:    {:?}", config.transition_policy);
        println!("  oracle:    {}", if config.oracle.enabled { config.oracle.model.as_str() } else { "disabled" });
        println!();
    }

    let store = if db == ":memory:" {
        PortalStore::in_memory()?
    } else {
        PortalStore::open(db)?
    };
    store.migrate()?;

    let oracle = oracle_from_config(&config.oracle);
    let mut desk = LifecycleManager::new(store, config);
    desk.seed_if_uninitialized()?;

    if ipc_mode {
        run_ipc_loop(&mut desk, oracle.as_ref())?;
    } else {
        print_summary(&desk)?;
    }

    Ok(())
}

fn run_ipc_loop(desk: &mut Desk, oracle: &dyn Oracle) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }
        if buffer.trim().is_empty() {
            continue;
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                writeln!(stdout, "{}", serde_json::json!({ "error": e.to_string() }))?;
                stdout.flush()?;
                continue;
            }
        };
        if matches!(cmd, IpcCommand::Quit) {
            break;
        }

        let reply = handle_command(desk, oracle, cmd).unwrap_or_else(|e| {
            log::warn!("command failed: {e}");
            serde_json::json!({ "error": e.to_string() })
        });
        writeln!(stdout, "{reply}")?;
        stdout.flush()?;
    }
    Ok(())
}

fn handle_command(desk: &mut Desk, oracle: &dyn Oracle, cmd: IpcCommand) -> Result<serde_json::Value> {
    let value = match cmd {
        IpcCommand::Lodge { complaint } => {
            let classifier = PriorityClassifier::new(oracle, &desk.config().fallback_keywords);
            let filed = desk.submit(complaint, &classifier)?;
            serde_json::json!({ "id": filed.id, "priority": filed.priority })
        }
        IpcCommand::Track { id } => {
            let id = canonical_id(&id);
            match desk.get_by_id(&id)? {
                Some(c) => serde_json::to_value(view(desk, &c))?,
                None => serde_json::json!({ "found": false, "id": id }),
            }
        }
        IpcCommand::Forward { id, remark } => {
            let id = canonical_id(&id);
            match desk.forward(&id, remark.as_deref())? {
                Some(c) => serde_json::to_value(view(desk, &c))?,
                None => serde_json::json!({ "found": false, "id": id }),
            }
        }
        IpcCommand::UpdateStatus { id, status, remark } => {
            let id = canonical_id(&id);
            let status: ComplaintStatus = status.parse()?;
            match desk.update_status(&id, status, remark.as_deref())? {
                Some(c) => serde_json::to_value(view(desk, &c))?,
                None => serde_json::json!({ "found": false, "id": id }),
            }
        }
        IpcCommand::List { status, priority, search } => {
            let filter = ComplaintFilter {
                status: status.as_deref().map(str::parse::<ComplaintStatus>).transpose()?,
                priority: priority.as_deref().map(str::parse::<Priority>).transpose()?,
                search,
            };
            let complaints = desk.list(&filter)?;
            let views: Vec<_> = complaints.iter().map(|c| view(&*desk, c)).collect();
            serde_json::to_value(views)?
        }
        IpcCommand::Stats => serde_json::to_value(desk.stats()?)?,
        IpcCommand::Chat { history, message } => {
            let reply = AssistantBridge::new(desk, oracle).reply(&history, &message);
            serde_json::json!({ "reply": reply })
        }
        IpcCommand::Quit => serde_json::Value::Null,
    };
    Ok(value)
}

fn print_summary(desk: &Desk) -> Result<()> {
    let stats = desk.stats()?;

    println!("=== DASHBOARD ===");
    println!("  total:          {}", stats.total);
    println!("  pending:        {}", stats.pending);
    println!("  in progress:    {}", stats.in_progress);
    println!("  resolved:       {}", stats.resolved);
    println!("  high priority:  {}", stats.high_priority);
    println!("  overdue:        {}", stats.overdue);

    println!();
    println!("=== ESCALATIONS (forwarded > 10 days) ===");
    let overdue = desk.escalations()?;
    if overdue.is_empty() {
        println!("  (none)");
    } else {
        let now = desk.now();
        for c in &overdue {
            let days = c.forwarded_at.map(|f| (now - f).num_days()).unwrap_or_default();
            println!("  {} | {} | {} | forwarded {days} days ago", c.id, c.department, c.title);
        }
    }

    println!();
    println!("=== QUEUE ===");
    for c in desk.list(&ComplaintFilter::default())? {
        println!(
            "  {} | {:<4} | {:<28} | {}",
            c.id,
            c.priority.as_str(),
            c.status_label(),
            c.title
        );
    }
    Ok(())
}

/// Ids typed by an operator: surrounding blanks dropped, uppercased.
fn canonical_id(id: &str) -> String {
    id.trim().to_ascii_uppercase()
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}
