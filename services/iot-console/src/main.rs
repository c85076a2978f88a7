//! IoT Console CLI
//!
//! Command-line front-end for IoT project dashboards.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use iot_console::api::{Credentials, Registration};
use iot_console::chart::{self, DateRange};
use iot_console::controls::{ControlPanel, Gesture};
use iot_console::model::Project;
use iot_console::notice::Notice;
use iot_console::view::ProjectView;
use iot_console::{load_config, Config, Console};
use tracing::Level;

#[derive(Parser)]
#[command(name = "iot-console")]
#[command(about = "Client for IoT project dashboards")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: Level,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log in and store the session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Create an account and store the session
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// List projects
    Projects,
    /// Show a project's sensors and buttons
    Show { project: String },
    /// Follow live readings of a project until Ctrl-C
    Watch { project: String },
    /// Press, release or activate a button
    Button {
        project: String,
        button: String,
        gesture: Gesture,
    },
    /// Averages of a combined graph
    Combined {
        graph: String,
        /// Start of the range (RFC 3339)
        #[arg(long)]
        from: Option<DateTime<Utc>>,
        /// End of the range (RFC 3339)
        #[arg(long)]
        to: Option<DateTime<Utc>>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .init();

    tracing::debug!(
        "Parsed command line arguments: config={:?}, log_level={:?}",
        args.config,
        args.log_level
    );

    let config = if let Some(config_path) = &args.config {
        tracing::debug!("Loading configuration from {:?}", config_path);
        load_config(config_path)?
    } else {
        tracing::debug!("Using default configuration");
        Config::default()
    };

    let console = Console::new(config)?;
    run(&console, args.command).await?;
    Ok(())
}

async fn run(console: &Console, command: Command) -> iot_console::Result<()> {
    match command {
        Command::Login { email, password } => {
            let session = console
                .api()
                .login(&Credentials { email, password })
                .await?;
            console.sessions().save(&session)?;
        }
        Command::Register {
            name,
            email,
            password,
        } => {
            let session = console
                .api()
                .register(&Registration {
                    name,
                    email,
                    password,
                })
                .await?;
            console.sessions().save(&session)?;
        }
        Command::Logout => {
            console.sessions().clear()?;
            console.notify(
                Notice::success("You have been successfully logged out.").with_title("Logged Out"),
            );
        }
        Command::Projects => {
            let api = console.authenticated_api(&console.session()?);
            for project in api.list_projects().await? {
                println!(
                    "{}  {}  [{}]  {} sensor(s)",
                    project.project_id,
                    project.project_name,
                    project.development_board,
                    project.sensor_count
                );
            }
        }
        Command::Show { project } => {
            let api = console.authenticated_api(&console.session()?);
            let project = api.fetch_project(&project).await?;
            print_project(&project);
        }
        Command::Watch { project } => watch(console, &project).await?,
        Command::Button {
            project,
            button,
            gesture,
        } => {
            let api = console.authenticated_api(&console.session()?);
            let snapshot = api.fetch_project(&project).await?;
            let mut panel = ControlPanel::new(&snapshot, Arc::new(api));
            let transition = panel.dispatch(&button, gesture).await?;
            for command in &transition.commands {
                println!("pin {} <- {}", command.pin, command.data);
            }
            if let Some(control) = panel.control(&button) {
                println!("state: {:?}", control.state());
            }
        }
        Command::Combined { graph, from, to } => {
            let api = console.authenticated_api(&console.session()?);
            let data = api
                .combined_graph_data(&graph, &DateRange { from, to })
                .await?;
            println!("{} chart", data.graph_info.graph_type);
            for average in &data.results {
                println!("{:<24} {:.2}", average.title, average.average);
            }
        }
    }
    Ok(())
}

fn print_project(project: &Project) {
    println!("{} ({})", project.project_name, project.project_id);
    if !project.description.is_empty() {
        println!("  {}", project.description);
    }
    for sensor in &project.sensors {
        println!(
            "  sensor {} '{}' on {} [{}]",
            sensor.id, sensor.title, sensor.pin_number, sensor.graph_info.graph_type
        );
        for point in chart::display_window(sensor) {
            println!("    {}  {}", chart::time_label(&point.datetime), point.value);
        }
    }
    for signal in project.signals() {
        println!("  signal {} '{}'", signal.id, signal.title);
        for button in &signal.button {
            println!(
                "    button {} '{}' {} on {}",
                button.id,
                button.title,
                button.kind.type_name(),
                button.pin
            );
        }
    }
    for graph in &project.combined_sensor_graphs {
        println!("  combined graph {} '{}'", graph.id, graph.title);
        for row in chart::combined_rows(project, graph) {
            println!("    {}  {:?}", chart::time_label(&row.datetime), row.values);
        }
    }
}

async fn watch(console: &Console, project_id: &str) -> iot_console::Result<()> {
    let session = console.session()?;
    let api = console.authenticated_api(&session);
    let live = Arc::new(console.connect_live(&session).await?);
    let mut view = ProjectView::mount(api, live.clone(), project_id).await?;

    let mut snapshots = view.subscribe();
    let mut previous = snapshots.borrow_and_update().clone();
    if let Some(project) = &previous {
        print_project(project);
    }

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    tracing::warn!("Failed to listen for ctrl-c: {}", e);
                }
                tracing::info!("Shutdown signal received");
                break;
            }
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = snapshots.borrow_and_update().clone();
                if let (Some(before), Some(after)) = (&previous, &current) {
                    log_new_points(before, after);
                }
                previous = current;
            }
        }
    }

    view.unmount().await;
    live.disconnect().await;
    Ok(())
}

fn log_new_points(before: &Project, after: &Project) {
    for (old, new) in before.sensors.iter().zip(&after.sensors) {
        if Arc::ptr_eq(old, new) {
            continue;
        }
        for point in new.data.iter().skip(old.data.len()) {
            tracing::info!(
                "{} ({}): {} at {}",
                new.title,
                new.pin_number,
                point.value,
                chart::time_label(&point.datetime)
            );
        }
    }
}
