use anyhow::{Result, anyhow};
use clap::Parser;
use log::debug;

use bring_client::api::{Bring, Notification, ShoppingApi, ShoppingList, resolve_list};

/// bring - Bring! shopping list client
///
/// Talk to a Bring! account from the command line: show lists, add and
/// complete items, send notifications to the other members of a list.
///
/// Credentials can come from the BRING_EMAIL and BRING_PASSWORD
/// environment variables instead of flags.
///
/// Examples:
///   bring lists                      # Show all lists of the account
///   bring add Groceries Milk         # Put "Milk" on the Groceries list
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Bring account email (also via BRING_EMAIL)
    #[arg(long, env = "BRING_EMAIL", value_name = "EMAIL", global = true)]
    email: Option<String>,

    /// Bring account password (also via BRING_PASSWORD)
    #[arg(long, env = "BRING_PASSWORD", value_name = "PASSWORD", global = true)]
    password: Option<String>,

    /// Bring API URL (defaults to https://api.getbring.com/rest/v2)
    #[arg(long = "api-url", value_name = "URL", global = true)]
    api_url: Option<String>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Show all shopping lists of the account
    Lists,

    /// Show the items of a list
    Items(ListArgs),

    /// Put an item on a list
    Add(AddArgs),

    /// Move an item to the recently-bought section
    Complete(ItemArgs),

    /// Take an item off a list entirely
    Remove(ItemArgs),

    /// Send a push notification to the members of a list
    Notify(NotifyArgs),
}

#[derive(clap::Args, Debug)]
struct ListArgs {
    /// List name or UUID
    #[arg(value_name = "LIST")]
    list: String,
}

#[derive(clap::Args, Debug)]
struct AddArgs {
    /// List name or UUID
    #[arg(value_name = "LIST")]
    list: String,

    /// Item name
    #[arg(value_name = "NAME")]
    name: String,

    /// Specification shown below the item name, e.g. "low fat"
    #[arg(long, short = 's', value_name = "TEXT")]
    specification: Option<String>,
}

#[derive(clap::Args, Debug)]
struct ItemArgs {
    /// List name or UUID
    #[arg(value_name = "LIST")]
    list: String,

    /// Item name
    #[arg(value_name = "NAME")]
    name: String,
}

#[derive(clap::Args, Debug)]
struct NotifyArgs {
    /// List name or UUID
    #[arg(value_name = "LIST")]
    list: String,

    /// Notification to send
    #[arg(value_enum, value_name = "KIND")]
    kind: NotifyKind,

    /// Item an urgent message is about
    #[arg(long, value_name = "NAME")]
    item: Option<String>,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum NotifyKind {
    GoingShopping,
    ChangedList,
    ShoppingDone,
    UrgentMessage,
}

fn notification(kind: NotifyKind, item: Option<String>) -> Result<Notification> {
    Ok(match kind {
        NotifyKind::GoingShopping => Notification::GoingShopping,
        NotifyKind::ChangedList => Notification::ChangedList,
        NotifyKind::ShoppingDone => Notification::ShoppingDone,
        NotifyKind::UrgentMessage => {
            let item = item.ok_or_else(|| anyhow!("An urgent message needs --item"))?;
            Notification::UrgentMessage { item }
        }
    })
}

async fn find_list(api: &mut impl ShoppingApi, selector: &str) -> Result<ShoppingList> {
    resolve_list(api, selector)
        .await?
        .ok_or_else(|| anyhow!("No list named {:?} in this account", selector))
}

async fn lists(api: &mut impl ShoppingApi) -> Result<()> {
    let all = api.load_lists().await?;
    if all.is_empty() {
        println!("No lists in this account.");
        return Ok(());
    }

    debug!("Found {} list(s)", all.len());
    for list in all {
        println!("{}  {}", list.uuid, list.name);
    }
    Ok(())
}

async fn items(api: &mut impl ShoppingApi, selector: &str) -> Result<()> {
    let list = find_list(api, selector).await?;
    let items = api.get_items(&list.uuid).await?;

    if items.purchase.is_empty() {
        println!("Nothing to buy on {}.", list.name);
    }
    for item in &items.purchase {
        if item.specification.is_empty() {
            println!("{}", item.name);
        } else {
            println!("{} ({})", item.name, item.specification);
        }
    }

    if !items.recently.is_empty() {
        println!();
        println!("Recently bought:");
        for item in &items.recently {
            println!("{}", item.name);
        }
    }
    Ok(())
}

async fn add(
    api: &mut impl ShoppingApi,
    selector: &str,
    name: &str,
    specification: Option<String>,
) -> Result<()> {
    let list = find_list(api, selector).await?;
    api.save_item(&list.uuid, name, specification).await?;
    println!("Added {} to {}.", name, list.name);
    Ok(())
}

async fn complete(api: &mut impl ShoppingApi, selector: &str, name: &str) -> Result<()> {
    let list = find_list(api, selector).await?;
    api.complete_item(&list.uuid, name).await?;
    println!("Completed {} on {}.", name, list.name);
    Ok(())
}

async fn remove(api: &mut impl ShoppingApi, selector: &str, name: &str) -> Result<()> {
    let list = find_list(api, selector).await?;
    api.remove_item(&list.uuid, name).await?;
    println!("Removed {} from {}.", name, list.name);
    Ok(())
}

async fn notify(
    api: &mut impl ShoppingApi,
    selector: &str,
    notification: Notification,
) -> Result<()> {
    let list = find_list(api, selector).await?;
    api.notify(&list.uuid, notification).await?;
    println!("Notified the members of {}.", list.name);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let email = cli
        .email
        .ok_or_else(|| anyhow!("No email given, use --email or BRING_EMAIL"))?;
    let password = cli
        .password
        .ok_or_else(|| anyhow!("No password given, use --password or BRING_PASSWORD"))?;

    let mut api = match cli.api_url {
        Some(url) => Bring::with_base_url(email, password, url),
        None => Bring::new(email, password),
    };

    match cli.command {
        Commands::Lists => lists(&mut api).await?,
        Commands::Items(args) => items(&mut api, &args.list).await?,
        Commands::Add(args) => add(&mut api, &args.list, &args.name, args.specification).await?,
        Commands::Complete(args) => complete(&mut api, &args.list, &args.name).await?,
        Commands::Remove(args) => remove(&mut api, &args.list, &args.name).await?,
        Commands::Notify(args) => {
            let notification = notification(args.kind, args.item)?;
            notify(&mut api, &args.list, notification).await?
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_lists_parsing() {
        let cli = Cli::try_parse_from(&[
            "bring",
            "--email",
            "user@example.com",
            "--password",
            "secret",
            "lists",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Lists));
        assert_eq!(cli.email.as_deref(), Some("user@example.com"));
        assert_eq!(cli.api_url, None);
    }

    #[test]
    fn test_cli_add_parsing() {
        let cli = Cli::try_parse_from(&[
            "bring",
            "add",
            "Groceries",
            "Milk",
            "--specification",
            "low fat",
        ])
        .unwrap();
        match cli.command {
            Commands::Add(args) => {
                assert_eq!(args.list, "Groceries");
                assert_eq!(args.name, "Milk");
                assert_eq!(args.specification.as_deref(), Some("low fat"));
            }
            _ => panic!("Expected Add command"),
        }
    }

    #[test]
    fn test_cli_add_without_specification() {
        let cli = Cli::try_parse_from(&["bring", "add", "Groceries", "Milk"]).unwrap();
        match cli.command {
            Commands::Add(args) => assert_eq!(args.specification, None),
            _ => panic!("Expected Add command"),
        }
    }

    #[test]
    fn test_cli_global_api_url_parsing() {
        let cli = Cli::try_parse_from(&[
            "bring",
            "lists",
            "--api-url",
            "http://localhost:8080",
        ])
        .unwrap();
        assert_eq!(cli.api_url.as_deref(), Some("http://localhost:8080"));
    }

    #[test]
    fn test_cli_notify_parsing() {
        let cli = Cli::try_parse_from(&[
            "bring",
            "notify",
            "Groceries",
            "urgent-message",
            "--item",
            "Milk",
        ])
        .unwrap();
        match cli.command {
            Commands::Notify(args) => {
                assert!(matches!(args.kind, NotifyKind::UrgentMessage));
                assert_eq!(args.item.as_deref(), Some("Milk"));
            }
            _ => panic!("Expected Notify command"),
        }
    }

    #[test]
    fn test_cli_no_subcommand_fails() {
        let result = Cli::try_parse_from(&["bring", "Groceries"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_urgent_message_requires_item() {
        let result = notification(NotifyKind::UrgentMessage, None);
        assert!(result.is_err());
    }

    #[test]
    fn test_going_shopping_needs_no_item() {
        let notification = notification(NotifyKind::GoingShopping, None).unwrap();
        assert_eq!(notification, Notification::GoingShopping);
    }
}
