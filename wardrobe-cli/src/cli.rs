use std::sync::Arc;

use anyhow::{Context, anyhow};
use clap::{Args, Parser, Subcommand};
use inquire::{Confirm, Password, PasswordDisplayMode, Text};
use wardrobe_core::{
    Classification, Config, Coordinates, Environment, ItemCatalog, ItemClient, LocationResolver,
    NewItem, ResolutionOutcome, TemperatureUnit, WeatherSnapshot, WeatherView,
    geolocation::FixedGeolocation,
    items::{IMAGE_URL_FIELD, NAME_FIELD, WEATHER_FIELD, add_item_form},
    provider::provider_from_config,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "wardrobe", version, about = "What to wear for today's weather")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure the weather API key and the item service URL.
    Configure,

    /// Show the current weather.
    Weather(LocationArgs),

    /// Show items suited to the current weather.
    Wear(LocationArgs),

    /// Manage clothing items.
    #[command(subcommand)]
    Items(ItemsCommand),
}

#[derive(Debug, Args)]
pub struct LocationArgs {
    /// Device latitude; without it the fallback location is used.
    #[arg(long, requires = "lon", allow_hyphen_values = true)]
    lat: Option<f64>,

    /// Device longitude.
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    lon: Option<f64>,

    /// Temperature unit to display, F or C.
    #[arg(long)]
    unit: Option<String>,

    /// Retry the device location once, without asking, if it could not be used.
    #[arg(long)]
    retry: bool,
}

#[derive(Debug, Subcommand)]
pub enum ItemsCommand {
    /// List items, optionally only those for one weather type.
    List {
        #[arg(long)]
        weather: Option<String>,
    },

    /// Add a new garment.
    Add {
        #[arg(long, default_value = "")]
        name: String,

        #[arg(long, default_value = "")]
        image_url: String,

        /// hot, warm or cold.
        #[arg(long, default_value = "")]
        weather: String,
    },

    /// Delete an item by id.
    Delete { id: String },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config = Config::load()?;

        match self.command {
            Command::Configure => configure(config),
            Command::Weather(args) => {
                let unit = args.unit(&config)?;
                let snapshot = resolve_weather(&config, &args).await?;
                print_weather(&snapshot, unit);
                Ok(())
            }
            Command::Wear(args) => {
                let unit = args.unit(&config)?;
                let snapshot = resolve_weather(&config, &args).await?;
                print_weather(&snapshot, unit);

                let mut catalog = ItemCatalog::new(ItemClient::new(&config.items_base_url));
                catalog.load().await.context("Failed to load clothing items")?;

                println!(
                    "Today is {}{} you may want to wear:",
                    snapshot.temperature.in_unit(unit),
                    unit.symbol()
                );
                print_items(catalog.for_weather(snapshot.classification));
                Ok(())
            }
            Command::Items(cmd) => run_items(&config, cmd).await,
        }
    }
}

impl LocationArgs {
    fn unit(&self, config: &Config) -> anyhow::Result<TemperatureUnit> {
        match &self.unit {
            Some(unit) => TemperatureUnit::try_from(unit.as_str()),
            None => Ok(config.temperature_unit),
        }
    }

    fn environment(&self) -> Environment {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Environment::default()
                .with_geolocation(Arc::new(FixedGeolocation(Coordinates::new(lat, lon)))),
            _ => Environment::unsupported(),
        }
    }
}

fn configure(mut config: Config) -> anyhow::Result<()> {
    let api_key = Password::new("Weather API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    let items_base_url = Text::new("Item service URL:")
        .with_default(&config.items_base_url)
        .prompt()
        .context("Failed to read item service URL")?;

    config.set_api_key(api_key.trim().to_string());
    config.items_base_url = items_base_url.trim().to_string();
    config.save()?;

    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn resolve_weather(config: &Config, args: &LocationArgs) -> anyhow::Result<WeatherSnapshot> {
    let provider = provider_from_config(config)?;
    let resolver = LocationResolver::new(args.environment(), provider, config.fallback);
    let view = WeatherView::new();

    let mut outcome = resolver.resolve(&view).await;
    let mut retried = false;
    while let Some(banner) = view.banner() {
        eprintln!("{banner}");
        let again = if args.retry { !retried } else { confirm_retry() };
        if !again {
            break;
        }
        retried = true;
        outcome = resolver.retry(&view).await;
    }

    match outcome {
        ResolutionOutcome::Success(snapshot) => Ok(snapshot),
        // A failed retry keeps whatever the view already shows.
        ResolutionOutcome::Failure(failure) => view
            .snapshot()
            .ok_or_else(|| anyhow!("Could not resolve weather: {}", failure.reason)),
        ResolutionOutcome::Superseded => Err(anyhow!("Weather resolution was cancelled")),
    }
}

/// Ask whether to retry the device location. Anything but an explicit yes declines.
fn confirm_retry() -> bool {
    Confirm::new("Retry location?")
        .with_default(false)
        .prompt()
        .unwrap_or(false)
}

async fn run_items(config: &Config, cmd: ItemsCommand) -> anyhow::Result<()> {
    let mut catalog = ItemCatalog::new(ItemClient::new(&config.items_base_url));

    match cmd {
        ItemsCommand::List { weather } => {
            catalog.load().await.context("Failed to load clothing items")?;
            match weather {
                Some(weather) => {
                    let classification = Classification::try_from(weather.as_str())?;
                    print_items(catalog.for_weather(classification));
                }
                None => print_items(catalog.items().iter().collect()),
            }
        }
        ItemsCommand::Add { name, image_url, weather } => {
            let mut form = add_item_form();
            form.on_field_change(NAME_FIELD, name);
            form.on_field_change(IMAGE_URL_FIELD, image_url);
            form.on_field_change(WEATHER_FIELD, weather);

            let validation = form.validate_form();
            if let Some(field) = form.first_invalid_field(&validation.errors) {
                return Err(anyhow!("{field}: {}", form.error(field)));
            }

            let item = NewItem::from_form(&form)?;
            let created = catalog.add(&item).await.context("Failed to add item")?;
            println!("Added {created}");
        }
        ItemsCommand::Delete { id } => {
            catalog.remove(&id).await.with_context(|| format!("Failed to delete item {id}"))?;
            println!("Deleted item {id}");
        }
    }

    Ok(())
}

fn print_weather(snapshot: &WeatherSnapshot, unit: TemperatureUnit) {
    let time_of_day = if snapshot.is_daytime { "day" } else { "night" };
    println!(
        "{}: {}{}, {} ({}, {})",
        snapshot.city,
        snapshot.temperature.in_unit(unit),
        unit.symbol(),
        snapshot.condition,
        snapshot.classification,
        time_of_day,
    );
}

fn print_items(items: Vec<&wardrobe_core::ClothingItem>) {
    if items.is_empty() {
        println!("No clothing items available for this weather.");
        return;
    }
    for item in items {
        println!("  {item}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_items_add() {
        let cli = Cli::parse_from([
            "wardrobe",
            "items",
            "add",
            "--name",
            "Boots",
            "--image-url",
            "https://example.com/boots.png",
            "--weather",
            "cold",
        ]);

        let Command::Items(ItemsCommand::Add { name, weather, .. }) = cli.command else {
            panic!("expected items add");
        };
        assert_eq!(name, "Boots");
        assert_eq!(weather, "cold");
    }

    #[test]
    fn coordinates_select_device_environment() {
        let cli = Cli::parse_from(["wardrobe", "weather", "--lat", "40.7", "--lon", "-74.0"]);

        let Command::Weather(args) = cli.command else {
            panic!("expected weather");
        };
        assert!(args.environment().geolocation.is_some());
    }

    #[test]
    fn no_coordinates_means_unsupported_environment() {
        let cli = Cli::parse_from(["wardrobe", "wear", "--unit", "C"]);

        let Command::Wear(args) = cli.command else {
            panic!("expected wear");
        };
        assert!(args.environment().geolocation.is_none());
        assert_eq!(args.unit(&Config::default()).unwrap(), TemperatureUnit::Celsius);
    }

    #[test]
    fn retry_flag_is_opt_in() {
        let cli = Cli::parse_from(["wardrobe", "weather", "--lat", "1", "--lon", "2", "--retry"]);
        let Command::Weather(args) = cli.command else {
            panic!("expected weather");
        };
        assert!(args.retry);

        let cli = Cli::parse_from(["wardrobe", "wear"]);
        let Command::Wear(args) = cli.command else {
            panic!("expected wear");
        };
        assert!(!args.retry);
    }

    #[test]
    fn lat_requires_lon() {
        let res = Cli::try_parse_from(["wardrobe", "weather", "--lat", "40.7"]);
        assert!(res.is_err());
    }
}
