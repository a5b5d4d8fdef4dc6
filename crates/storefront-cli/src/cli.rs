use clap::{ArgAction, Args, Parser, Subcommand};
use storefront_core::SortKey;

pub const STOREFRONT_HELP_TEMPLATE: &str =
    "{before-help}\nUsage:\n    {usage}\n\nGlobal options:\n{options}\n";

pub const STOREFRONT_BEFORE_HELP: &str = concat!(
    "storefront ",
    env!("CARGO_PKG_VERSION"),
    " – Spreadsheet-backed game storefront\n\n",
    "\x1b[1;36mBrowse\x1b[0m\n",
    "  catalog          List games; filter by search, category or type and sort.\n",
    "  categories       Show the categories and types in the catalog.\n",
    "  stats            Item count, average price and top rated game.\n\n",
    "\x1b[1;36mBuy\x1b[0m\n",
    "  cart             Show, add, remove, set, clear or watch the cart.\n",
    "  checkout         Hand the cart off to the payment page.\n\n",
    "\x1b[1;36mMaintenance\x1b[0m\n",
    "  cache            Inspect or clear the cached catalog.\n",
);

#[derive(Parser, Debug)]
#[command(
    name = "storefront",
    author,
    version,
    propagate_version = false,
    disable_help_subcommand = true,
    before_help = STOREFRONT_BEFORE_HELP,
    help_template = STOREFRONT_HELP_TEMPLATE
)]
#[allow(clippy::struct_excessive_bools)]
pub struct StorefrontCli {
    #[arg(
        short,
        long,
        help = "Suppress human output (errors still print to stderr)",
        global = true
    )]
    pub quiet: bool,
    #[arg(short, long, action = ArgAction::Count, help = "Increase logging (-vv reaches debug)", global = true)]
    pub verbose: u8,
    #[arg(long, help = "Force trace logging regardless of -v/-q", global = true)]
    pub trace: bool,
    #[arg(
        long,
        help = "Emit {status,message,details} JSON envelopes",
        global = true
    )]
    pub json: bool,
    #[arg(long, help = "Disable colored human output", global = true)]
    pub no_color: bool,
    #[arg(
        long,
        help = "Skip the spreadsheet and read the local CSV (sets STOREFRONT_ONLINE=0)",
        global = true
    )]
    pub offline: bool,
    #[command(subcommand)]
    pub command: CommandGroupCli,
}

#[derive(Subcommand, Debug)]
pub enum CommandGroupCli {
    #[command(
        about = "List the catalog, filtered and sorted.",
        override_usage = "storefront catalog [--search TERM] [--category NAME] [--type NAME] [--sort name|price|rating]"
    )]
    Catalog(CatalogArgs),
    #[command(about = "Show the categories and types present in the catalog.")]
    Categories,
    #[command(about = "Summarise the whole catalog.")]
    Stats,
    #[command(
        about = "Manage the shopping cart.",
        override_usage = "storefront cart <show|add|remove|set|clear|watch>",
        subcommand
    )]
    Cart(CartCommand),
    #[command(about = "Hand the cart off to the payment page; refused when empty.")]
    Checkout,
    #[command(
        about = "Inspect the cached catalog.",
        override_usage = "storefront cache <show|clear|path>",
        subcommand
    )]
    Cache(CacheCommand),
}

#[derive(Args, Debug)]
pub struct CatalogArgs {
    #[arg(long, value_name = "TERM", help = "Match name, description or category")]
    pub search: Option<String>,
    #[arg(long, value_name = "NAME", help = "Only this category (exact match)")]
    pub category: Option<String>,
    #[arg(
        long = "type",
        value_name = "NAME",
        help = "Only this type (exact match)"
    )]
    pub kind: Option<String>,
    #[arg(
        long,
        value_name = "KEY",
        default_value = "name",
        help = "name (A-Z), price (cheapest first) or rating (best first)"
    )]
    pub sort: SortKey,
}

#[derive(Subcommand, Debug)]
pub enum CartCommand {
    #[command(about = "List cart entries with quantities and totals.")]
    Show,
    #[command(about = "Add one unit of a catalog item.")]
    Add(ItemArgs),
    #[command(about = "Remove an item from the cart.")]
    Remove(ItemArgs),
    #[command(about = "Set an item's quantity; 0 or less removes it.")]
    Set(SetArgs),
    #[command(about = "Empty the cart.")]
    Clear,
    #[command(about = "Print the cart badge whenever the cart changes, until Ctrl-C.")]
    Watch(WatchArgs),
}

#[derive(Args, Debug)]
pub struct ItemArgs {
    #[arg(value_name = "ID")]
    pub id: i64,
}

#[derive(Args, Debug)]
pub struct SetArgs {
    #[arg(value_name = "ID")]
    pub id: i64,
    #[arg(value_name = "QTY", allow_negative_numbers = true)]
    pub quantity: i64,
}

#[derive(Args, Debug)]
pub struct WatchArgs {
    #[arg(
        long,
        value_name = "MS",
        default_value_t = 500,
        help = "How often to look for changes made by other processes"
    )]
    pub interval_ms: u64,
}

#[derive(Subcommand, Debug)]
pub enum CacheCommand {
    #[command(about = "Show the cached catalog's age and freshness.")]
    Show,
    #[command(about = "Drop the cached catalog so the next load refetches.")]
    Clear,
    #[command(about = "Print the data directory.")]
    Path,
}
