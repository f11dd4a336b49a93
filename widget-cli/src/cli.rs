use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use inquire::{CustomType, Text};
use tokio::runtime::Handle;
use widget_core::{
    Config, HttpIconFetcher, LocalHost, MethodResult, RefreshOrchestrator, RefreshPhase,
    SharedPreferences, UpdateTrigger, WidgetChannel, WidgetInstanceId, WidgetRegistry,
    host::CommitRecord,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-widget", version, about = "Weather widget refresh driver")]
pub struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Edit the stored configuration interactively.
    Configure,

    /// Send a method call over the widget channel, then run the refresh it triggers.
    Invoke {
        /// Method name, e.g. "updateWidget".
        method: String,

        #[command(flatten)]
        host: HostArgs,
    },

    /// Refresh placed instances directly, without going through the channel.
    Render {
        #[command(flatten)]
        host: HostArgs,
    },
}

#[derive(Debug, clap::Args)]
pub struct HostArgs {
    /// Number of widget instances placed on the simulated host (ids 1..=N).
    #[arg(long, default_value_t = 1)]
    instances: u16,

    /// Preference file to read instead of the configured one.
    #[arg(long)]
    prefs: Option<PathBuf>,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Invoke { method, host } => {
                let session = Session::open(&host)?;
                let result = session.channel.handle(&method);
                println!("{}", serde_json::to_string_pretty(&result)?);

                if let MethodResult::Success { .. } = result {
                    let cycle = session.host.dispatch_pending(&session.orchestrator);
                    let outcomes = cycle.wait().await;
                    session.report(&outcomes);
                }
                Ok(())
            }
            Command::Render { host } => {
                let session = Session::open(&host)?;
                let ids = session.host.list_instance_ids(session.host.widget_type());
                let outcomes = session.orchestrator.refresh(&ids).wait().await;
                session.report(&outcomes);
                Ok(())
            }
        }
    }
}

/// Core components wired against one in-process host.
struct Session {
    host: Arc<LocalHost>,
    channel: WidgetChannel,
    orchestrator: RefreshOrchestrator,
}

impl Session {
    fn open(args: &HostArgs) -> Result<Self> {
        let config = Config::load()?;

        let prefs_path = match &args.prefs {
            Some(path) => path.clone(),
            None => config.resolved_prefs_path()?,
        };
        let prefs = SharedPreferences::load(&prefs_path, config.namespace.as_str())?;
        tracing::info!(path = %prefs_path.display(), "using preference file");

        let host = Arc::new(
            LocalHost::new(config.widget_type())
                .with_instances((1..=i32::from(args.instances)).map(WidgetInstanceId)),
        );

        let fetcher = HttpIconFetcher::new(&config.icon).context("Failed to build HTTP client")?;

        let orchestrator = RefreshOrchestrator::new(
            Arc::new(prefs),
            Arc::new(fetcher),
            host.clone(),
            config.entry_target.as_str(),
            Handle::current(),
        );

        let trigger = UpdateTrigger::new(config.widget_type(), host.clone(), host.clone());

        Ok(Self {
            host,
            channel: WidgetChannel::new(trigger),
            orchestrator,
        })
    }

    fn report(&self, outcomes: &[(WidgetInstanceId, RefreshPhase)]) {
        for record in self.host.history() {
            println!("{}", describe(&record));
        }

        let enriched = outcomes
            .iter()
            .filter(|(_, phase)| *phase == RefreshPhase::Enriched)
            .count();
        println!("{} instance(s) refreshed, {} with icon", outcomes.len(), enriched);
    }
}

fn describe(record: &CommitRecord) -> String {
    let p = &record.payload;
    let icon = match &p.icon {
        Some(icon) => format!("{}x{}", icon.width(), icon.height()),
        None => "placeholder".to_string(),
    };

    format!(
        "[{}] {} {} / {} / {} / {} / {} (icon: {}, tap: {})",
        record.committed_at.with_timezone(&chrono::Local).format("%H:%M:%S%.3f"),
        record.id,
        p.city,
        p.temperature,
        p.condition,
        p.humidity,
        p.wind,
        icon,
        p.click_action.target,
    )
}

fn configure() -> Result<()> {
    let mut config = Config::load()?;

    let current_prefs = config.resolved_prefs_path()?;
    let prefs_path = Text::new("Preference file:")
        .with_default(&current_prefs.display().to_string())
        .prompt()?;

    let namespace = Text::new("Preference key prefix:")
        .with_default(&config.namespace)
        .prompt()?;

    let timeout_secs = CustomType::<u64>::new("Icon fetch timeout (seconds):")
        .with_default(config.icon.timeout_secs)
        .with_error_message("Please enter a whole number of seconds")
        .prompt()?;

    config.prefs_path = Some(PathBuf::from(prefs_path));
    config.namespace = namespace;
    config.icon.timeout_secs = timeout_secs;
    config.save()?;

    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}
