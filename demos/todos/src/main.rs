//! Interactive command-line todo list.
//!
//! Reads one command per line from stdin and re-renders the list after every
//! change, including the delayed reorder after a checkbox tap.
//!
//! ```text
//! add                 insert an empty item at the top
//! toggle <i>          check or uncheck item i
//! edit <i> <text>     replace the text of item i
//! list                print the list
//! json                print the state as JSON
//! quit                wait for a pending reorder and exit
//! ```

use anyhow::Context;
use composable_todos_runtime::{Store, StoreConfig};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use todos::cli::{render, Command, CommandError};
use todos::{app_reducer, AppAction, AppEnvironment, AppState, TodoConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing; logs go to stderr so they don't interleave with the list
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "todos=info,composable_todos_runtime=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    composable_todos_runtime::metrics::describe_metrics();

    let config = TodoConfig::from_env().context("Failed to load configuration")?;
    tracing::info!(?config, "Starting todos");

    let env = AppEnvironment::live(&config);
    let initial = if config.seed {
        AppState::sample(env.ids.as_ref())
    } else {
        AppState::default()
    };

    let store = Store::with_config(
        initial,
        app_reducer(),
        env,
        StoreConfig::default().with_shutdown_timeout(config.shutdown_timeout),
    );

    println!("{}\n", render(&store.state(Clone::clone).await));

    // Re-render when the delayed reorder lands
    let mut actions = store.subscribe_actions();
    let renderer = {
        let store = store.clone();
        tokio::spawn(async move {
            loop {
                match actions.recv().await {
                    Ok(AppAction::TodoDelayCompleted) => {
                        println!("{}\n", render(&store.state(Clone::clone).await));
                    },
                    Ok(_) | Err(RecvError::Lagged(_)) => {},
                    Err(RecvError::Closed) => break,
                }
            }
        })
    };

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        match line.parse::<Command>() {
            Ok(Command::Send(action)) => {
                store.send(action).await?;
                let state = store.state(Clone::clone).await;
                if let Some(error) = &state.last_error {
                    eprintln!("error: {error}");
                }
                println!("{}\n", render(&state));
            },
            Ok(Command::List) => println!("{}\n", render(&store.state(Clone::clone).await)),
            Ok(Command::Json) => {
                let state = store.state(Clone::clone).await;
                println!("{}", serde_json::to_string_pretty(&state)?);
            },
            Ok(Command::Quit) => break,
            Err(CommandError::Empty) => {},
            Err(error) => eprintln!("error: {error}"),
        }
    }

    tracing::info!(timeout = ?store.shutdown_timeout(), "Waiting for pending reorder");
    store
        .shutdown_gracefully()
        .await
        .context("Pending reorder did not finish")?;
    renderer.abort();

    tracing::info!("Goodbye");
    Ok(())
}
