use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use std::io::{BufRead, Write};
use std::path::PathBuf;

use medadmin_core::{
    AdminPanel, ColumnSpec, Config, GuardOutcome, Method, Navigator, RequestDescriptor,
    SortDirection,
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// API base URL, overrides MEDADMIN_BASE_URL
    #[arg(long)]
    base_url: Option<String>,

    /// Session database, overrides MEDADMIN_DB_PATH
    #[arg(long)]
    db: Option<PathBuf>,

    /// Request timeout in seconds, overrides MEDADMIN_TIMEOUT_SECS
    #[arg(long)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in and keep the session
    Login {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        #[arg(long, default_value = "/api/admin/auth/login")]
        endpoint: String,
    },
    /// Show the signed-in admin
    Whoami,
    /// Run the page guard for an admin path
    Guard {
        #[arg(default_value = "/admin/dashboard")]
        path: String,
    },
    /// Fetch one page of a server-side table
    List {
        endpoint: String,
        /// Comma separated fields to show
        #[arg(long, default_value = "id")]
        columns: String,
        /// Zero-based page index
        #[arg(long, default_value_t = 0)]
        page: usize,
        #[arg(long)]
        page_length: Option<usize>,
        #[arg(long)]
        search: Option<String>,
        /// `<column>:<asc|desc>`
        #[arg(long)]
        order: Option<String>,
    },
    /// Send a single request
    Request {
        method: String,
        url: String,
        /// JSON body
        #[arg(long)]
        data: Option<String>,
    },
    /// End the session
    Logout {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    medadmin_core::init_logging();

    let args = Args::parse();
    let panel = open_panel(&args, page_for(&args.command))?;

    match args.command {
        Command::Login {
            username,
            password,
            endpoint,
        } => {
            let body = panel
                .send(
                    Method::POST,
                    &endpoint,
                    Some(&json!({"username": username, "password": password})),
                )
                .await
                .context("login failed")?;
            let user = panel.login_with_response(&body)?;
            println!("{} ({})", user.username, user.role);
        }
        Command::Whoami => match panel.current_user() {
            Some(user) => println!("{} ({})", user.username, user.role),
            None => bail!("not logged in"),
        },
        Command::Guard { .. } => match panel.guard() {
            GuardOutcome::Public => println!("public"),
            GuardOutcome::Allowed => println!("allowed"),
            GuardOutcome::Redirected => {
                println!("redirected to {}", panel.config().login_path)
            }
        },
        Command::List {
            endpoint,
            columns,
            page,
            page_length,
            search,
            order,
        } => {
            if panel.guard() == GuardOutcome::Redirected {
                bail!("not logged in");
            }

            let columns: Vec<ColumnSpec> = columns
                .split(',')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(|c| ColumnSpec::new(c, c))
                .collect();
            let grid = panel.initialize_table("cli", columns, &endpoint)?;

            if let Some(length) = page_length {
                grid.select_page_length(length)?;
            }
            if let Some(term) = search {
                grid.select_search(&term);
            }
            if let Some(order) = order {
                let (column, direction) = order
                    .split_once(':')
                    .context("order must look like <column>:<asc|desc>")?;
                let direction: SortDirection =
                    direction.parse().map_err(anyhow::Error::msg)?;
                grid.select_order(column.parse()?, direction)?;
            }
            grid.select_page(page)?;
            grid.draw().await?;

            let headers: Vec<&str> = grid.columns().iter().map(|c| c.title.as_str()).collect();
            println!("{}", headers.join("\t"));
            for row in grid.rendered_rows() {
                println!("{}", row.join("\t"));
            }
            println!("{}", grid.info());
        }
        Command::Request { method, url, data } => {
            let method: Method = method.to_uppercase().parse()?;
            let descriptor = match data {
                Some(data) => RequestDescriptor::new(method, url)
                    .payload(serde_json::from_str::<Value>(&data).context("--data is not JSON")?),
                None => RequestDescriptor::new(method, url),
            };
            let descriptor = descriptor
                .on_success(|body| println!("{}", body))
                .on_error(|message| eprintln!("{}", message));
            panel.request(descriptor).await;

            if panel.location().current_path() == panel.config().login_path {
                bail!("session expired, log in again");
            }
        }
        Command::Logout { yes } => {
            let ended = panel.logout(|prompt| yes || confirm(prompt))?;
            if ended {
                println!("logged out");
            }
        }
    }

    Ok(())
}

fn open_panel(args: &Args, path: &str) -> anyhow::Result<AdminPanel> {
    let mut config = Config::from_env()?;
    if let Some(base_url) = &args.base_url {
        config.base_url = base_url.clone();
    }
    if let Some(db) = &args.db {
        config.database_path = db.clone();
    }
    if let Some(timeout) = args.timeout {
        config.request_timeout_secs = (timeout > 0).then_some(timeout);
    }

    tracing::debug!(db = %config.database_path.display(), "Opening admin panel");
    Ok(AdminPanel::new(config, path)?)
}

/// The admin page a command stands in for
fn page_for(command: &Command) -> &str {
    match command {
        Command::Login { .. } => "/admin/login",
        Command::Guard { path } => path,
        _ => "/admin/dashboard",
    }
}

fn confirm(prompt: &str) -> bool {
    print!("{} [y/N] ", prompt);
    if std::io::stdout().flush().is_err() {
        return false;
    }

    let mut answer = String::new();
    match std::io::stdin().lock().read_line(&mut answer) {
        Ok(_) => matches!(answer.trim(), "y" | "Y" | "yes"),
        Err(_) => false,
    }
}
