//! `cartflow` - interactive shell for the demo shop
//!
//! Reads one command per line from stdin and drives a single shop `Store`.
//! Logs go to stderr; everything on stdout is the shop talking.

use anyhow::Context;
use cartflow_core::environment::SystemClock;
use cartflow_runtime::Store;
use cartflow_runtime::metrics::MetricsServer;
use cartflow_shop::cart::CartAction;
use cartflow_shop::checkout::CheckoutStatus;
use cartflow_shop::command::{Command, HELP};
use cartflow_shop::gemini::GeminiClient;
use cartflow_shop::images::DisabledImageGenerator;
use cartflow_shop::order::{RandomOutcome, SimulatedOrderService};
use cartflow_shop::suggestions::{
    AssistantAction, AssistantEnvironment, AssistantStatus, GeminiSuggestionService,
    SuggestionService, UnconfiguredSuggestions,
};
use cartflow_shop::types::{Page, format_money};
use cartflow_shop::{ShopAction, ShopConfig, ShopEnvironment, ShopReducer, ShopState, telemetry};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

type ShopStore = Store<ShopState, ShopAction, ShopEnvironment<SystemClock>, ShopReducer<SystemClock>>;

/// Extra time allowed on top of the checkout timeout before the shell stops waiting
const CHECKOUT_WAIT_SLACK: Duration = Duration::from_secs(2);

const ASSISTANT_WAIT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ShopConfig::from_env();
    config.validate().context("invalid configuration")?;

    telemetry::init(&config).context("failed to install tracing subscriber")?;

    let mut metrics_server = MetricsServer::new(config.telemetry.metrics_addr);
    if config.telemetry.metrics_enabled {
        metrics_server.start().context("failed to start metrics recorder")?;
        telemetry::describe_metrics();
    }

    let suggestions: Arc<dyn SuggestionService> = match &config.gemini.api_key {
        Some(key) => {
            let client = GeminiClient::new(key, &config.gemini.api_url, &config.gemini.model)?;
            tracing::info!(model = client.model(), "AI suggestions enabled");
            Arc::new(GeminiSuggestionService::new(client))
        },
        None => {
            tracing::warn!("GEMINI_API_KEY not set, AI suggestions are disabled");
            Arc::new(UnconfiguredSuggestions)
        },
    };

    let checkout = &config.checkout;
    let outcomes = match checkout.seed {
        Some(seed) => RandomOutcome::seeded(
            seed,
            checkout.success_rate,
            checkout.min_delay(),
            checkout.max_delay(),
        ),
        None => RandomOutcome::new(checkout.success_rate, checkout.min_delay(), checkout.max_delay()),
    };

    let env = ShopEnvironment::new(
        SystemClock,
        Arc::new(SimulatedOrderService::new(outcomes, SystemClock)),
        Arc::new(DisabledImageGenerator),
        AssistantEnvironment::new(suggestions),
        checkout.timeout(),
    );

    let store = Store::new(ShopState::new(), ShopReducer::new(), env);
    let checkout_wait = checkout.response_wait(CHECKOUT_WAIT_SLACK);

    println!("Welcome to Cartflow. Type 'help' for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(error) => {
                println!("{error}");
                continue;
            },
        };

        if command == Command::Quit {
            break;
        }

        run(&store, command, checkout_wait, &metrics_server).await?;
    }

    store
        .shutdown(Duration::from_secs(5))
        .await
        .context("store did not shut down cleanly")?;

    println!("Goodbye.");
    Ok(())
}

async fn run(
    store: &ShopStore,
    command: Command,
    checkout_wait: Duration,
    metrics_server: &MetricsServer,
) -> anyhow::Result<()> {
    match command {
        Command::Login(identity) => {
            store.send(ShopAction::Login { identity }).await?;
            let (user, error) = store
                .state(|s| {
                    (
                        s.session.user().map(|u| u.email.clone()),
                        s.session.login_error().map(str::to_string),
                    )
                })
                .await;
            match (user, error) {
                (Some(email), _) => println!("Logged in as {email}."),
                (None, Some(error)) => println!("{error}"),
                (None, None) => {},
            }
        },
        Command::Logout => {
            store.send(ShopAction::Logout).await?;
            println!("Logged out.");
        },
        Command::Products => {
            if require_login(store).await {
                print_products(store).await;
            }
        },
        Command::Add(id) => {
            if !require_login(store).await {
                return Ok(());
            }
            let item = store.state(|s| s.catalog.get(&id).cloned()).await;
            match item {
                Some(item) => {
                    let name = item.name.clone();
                    store.send(ShopAction::Cart(CartAction::AddItem { item })).await?;
                    println!("Added {name}.");
                    print_cart(store).await;
                },
                None => println!("No product with id {id}."),
            }
        },
        Command::Remove(id) => {
            store.send(ShopAction::Cart(CartAction::RemoveItem { id })).await?;
            print_cart(store).await;
        },
        Command::Quantity(id, quantity) => {
            store
                .send(ShopAction::Cart(CartAction::SetQuantity { id, quantity }))
                .await?;
            print_cart(store).await;
        },
        Command::Cart => print_cart(store).await,
        Command::Checkout => {
            store.send(ShopAction::NavigateToCheckout).await?;
            if store.state(|s| s.session.page()).await == Page::Checkout {
                print_cart(store).await;
                println!("Type 'confirm' to place the order or 'back' to keep shopping.");
            } else {
                println!("Checkout needs a logged-in user and at least one item in the cart.");
            }
        },
        Command::Confirm => confirm(store, checkout_wait).await?,
        Command::Back => {
            store.send(ShopAction::NavigateToCatalog).await?;
            println!("Back to the catalog.");
        },
        Command::Suggest => suggest(store).await?,
        Command::Metrics => match metrics_server.render() {
            Some(rendered) => println!("{rendered}"),
            None => println!("Metrics are disabled (set CARTFLOW_METRICS_ENABLED=true)."),
        },
        Command::Help => println!("{HELP}"),
        Command::Quit => {},
    }

    Ok(())
}

async fn require_login(store: &ShopStore) -> bool {
    let authenticated = store.state(|s| s.session.is_authenticated()).await;
    if !authenticated {
        println!("Please log in first: login <email>");
    }
    authenticated
}

async fn confirm(store: &ShopStore, checkout_wait: Duration) -> anyhow::Result<()> {
    if !store.state(ShopState::can_checkout).await {
        println!("Open the checkout page first, or wait for the pending order to finish.");
        return Ok(());
    }

    println!("Placing order...");
    let resolved = store
        .send_and_wait_for(
            ShopAction::ConfirmCheckout,
            |action| matches!(action, ShopAction::CheckoutResolved { .. }),
            checkout_wait,
        )
        .await;

    if let Err(error) = resolved {
        tracing::warn!(error = %error, "Stopped waiting for checkout");
    }

    let (status, message) = store
        .state(|s| (s.checkout.status(), s.checkout.message().map(str::to_string)))
        .await;

    match status {
        CheckoutStatus::Success => println!("Order Successful! {}", message.unwrap_or_default()),
        CheckoutStatus::Error => {
            println!("Order Failed: {}", message.unwrap_or_default());
            println!("Type 'confirm' to try again or 'back' to return to the catalog.");
        },
        CheckoutStatus::Loading => println!("Still processing, check back with 'cart'."),
        CheckoutStatus::Idle => {},
    }

    Ok(())
}

async fn suggest(store: &ShopStore) -> anyhow::Result<()> {
    if !require_login(store).await {
        return Ok(());
    }

    println!("Asking the assistant...");
    let result = store
        .send_and_wait_for(
            ShopAction::OpenAssistant,
            |action| matches!(action, ShopAction::Assistant(AssistantAction::Received { .. })),
            ASSISTANT_WAIT,
        )
        .await;

    if let Err(error) = result {
        tracing::warn!(error = %error, "Stopped waiting for suggestions");
    }

    match store.state(|s| s.assistant.status.clone()).await {
        AssistantStatus::Ready(suggestions) if suggestions.is_empty() => {
            println!("No suggestions available right now.");
        },
        AssistantStatus::Ready(suggestions) => {
            for suggestion in suggestions {
                println!("* {}: {}", suggestion.title, suggestion.suggestion);
            }
        },
        AssistantStatus::Failed(message) => println!("{message}"),
        AssistantStatus::Loading => println!("The assistant is still thinking."),
        AssistantStatus::Idle => {},
    }

    store
        .send(ShopAction::Assistant(AssistantAction::Dismiss))
        .await?;
    Ok(())
}

async fn print_products(store: &ShopStore) {
    let (items, errors) = store
        .state(|s| (s.catalog.items().to_vec(), s.image_errors.clone()))
        .await;

    for item in items {
        println!(
            "{:>3}  {:<26} {:>8}  [{}] {}",
            item.id,
            item.name,
            format_money(item.price),
            item.category,
            item.description
        );
    }
    for error in errors {
        println!("(!) {error}");
    }
}

async fn print_cart(store: &ShopStore) {
    let (lines, total, count) = store
        .state(|s| (s.cart.lines().to_vec(), s.cart_total(), s.cart_item_count()))
        .await;

    if lines.is_empty() {
        println!("Your cart is empty.");
        return;
    }

    for line in &lines {
        println!(
            "{:>3}  {:<26} x{:<3} {:>8}",
            line.item.id,
            line.item.name,
            line.quantity,
            format_money(line.subtotal())
        );
    }
    println!("Items: {count}  Total: {}", format_money(total));
}
