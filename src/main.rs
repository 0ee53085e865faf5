use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use rental_scout::api::{HttpApi, MarketplaceApi};
use rental_scout::config::Config;
use rental_scout::models::{Id, UserType};
use rental_scout::session::{Route, Screen, Session, SessionStore};
use rental_scout::validation::{parse_price, PropertyDraft};
use rental_scout::views::render;
use rental_scout::views::{
    Confirm, LandlordDashboard, LandlordTab, Notifier, RenterDashboard, RenterTab, ViewFlags,
};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rental-scout")]
#[command(about = "Short-term rental marketplace client for landlords and renters")]
#[command(version)]
struct Cli {
    /// Marketplace API base URL
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Session record location
    #[arg(long, global = true)]
    session_file: Option<PathBuf>,

    /// Hide image references on cards
    #[arg(long, global = true)]
    no_images: bool,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Role {
    Landlord,
    Renter,
}

impl From<Role> for UserType {
    fn from(role: Role) -> Self {
        match role {
            Role::Landlord => UserType::Landlord,
            Role::Renter => UserType::Renter,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, value_enum, default_value = "landlord")]
        role: Role,
    },

    /// Log in by email
    Login { email: String },

    /// Forget the stored session
    Logout,

    /// Show the logged-in user
    Whoami,

    /// Change name and email
    EditProfile {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
    },

    /// Open the dashboard for the current session
    Dashboard,

    /// Manage your listings (landlord)
    Properties {
        #[command(subcommand)]
        command: PropertyCommands,
    },

    /// Reservations received for your listings (landlord)
    Reservations {
        #[command(subcommand)]
        command: ReservationCommands,
    },

    /// Search listings (renter)
    Search(SearchArgs),

    /// Book a listing for a date range (renter)
    Reserve {
        property_id: String,
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: NaiveDate,
    },

    /// List your reservations (renter)
    MyReservations,

    /// Review a concluded reservation (renter)
    Review {
        reservation_id: String,
        #[arg(long)]
        rating: Option<i64>,
        #[arg(long, default_value = "")]
        comment: String,
    },

    /// Show the reviews left on a listing
    Reviews { property_id: String },
}

#[derive(Subcommand)]
enum PropertyCommands {
    List,
    Create(PropertyArgs),
    Update {
        id: String,
        #[command(flatten)]
        fields: PropertyArgs,
    },
    Delete {
        id: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Args)]
struct PropertyArgs {
    #[arg(long)]
    title: String,
    #[arg(long, default_value = "")]
    description: String,
    #[arg(long)]
    address: String,
    #[arg(long, default_value = "")]
    city: String,
    #[arg(long)]
    price: String,
    #[arg(long)]
    from: String,
    #[arg(long)]
    until: String,
    #[arg(long, default_value = "")]
    image_url: String,
}

impl PropertyArgs {
    fn into_draft(self, id: Option<Id>) -> PropertyDraft {
        PropertyDraft {
            id,
            title: self.title,
            description: self.description,
            address: self.address,
            city: self.city,
            price_per_day: self.price,
            available_from: self.from,
            available_until: self.until,
            image_url: self.image_url,
        }
    }
}

#[derive(Subcommand)]
enum ReservationCommands {
    List,
    Approve { id: String },
    Reject { id: String },
}

#[derive(Args)]
struct SearchArgs {
    /// City or address fragment
    #[arg(long, default_value = "")]
    city: String,
    #[arg(long)]
    min_price: Option<String>,
    #[arg(long)]
    max_price: Option<String>,
    #[arg(long)]
    start: Option<NaiveDate>,
    #[arg(long)]
    end: Option<NaiveDate>,
}

/// Alerts go to stderr so stdout carries only rendered views
struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn alert(&self, message: &str) {
        eprintln!("{}", message);
    }
}

struct PromptConfirm {
    assume_yes: bool,
}

impl Confirm for PromptConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        eprint!("{} [y/N] ", prompt);
        let _ = std::io::stderr().flush();

        let mut answer = String::new();
        if std::io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    }
}

struct App {
    api: Arc<dyn MarketplaceApi>,
    session: Session,
    flags: ViewFlags,
    notifier: Arc<dyn Notifier>,
}

impl App {
    fn landlord(&self, assume_yes: bool) -> Result<LandlordDashboard> {
        LandlordDashboard::open(
            Arc::clone(&self.api),
            &self.session,
            Arc::clone(&self.notifier),
            Arc::new(PromptConfirm { assume_yes }),
            self.flags,
        )
        .context("Landlord dashboard unavailable (try `rental-scout login`)")
    }

    fn renter(&self) -> Result<RenterDashboard> {
        RenterDashboard::open(
            Arc::clone(&self.api),
            &self.session,
            Arc::clone(&self.notifier),
            self.flags,
        )
        .context("Renter dashboard unavailable (try `rental-scout login`)")
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = Config::from_env();
    if let Some(url) = cli.api_url {
        config.api_url = url;
    }
    if let Some(path) = cli.session_file {
        config.session_file = path;
    }
    if cli.no_images {
        config.show_images = false;
    }
    let api = HttpApi::from_config(&config).context("Failed to create HTTP client")?;
    debug!("Using API at {}", api.base_url());
    let mut app = App {
        api: Arc::new(api),
        session: Session::open(SessionStore::at_path(&config.session_file)),
        flags: ViewFlags {
            show_images: config.show_images,
        },
        notifier: Arc::new(StderrNotifier),
    };

    run(&mut app, cli.command).await
}

async fn run(app: &mut App, command: Commands) -> Result<()> {
    match command {
        Commands::Register { name, email, role } => {
            match Session::register(app.api.as_ref(), &name, &email, role.into()).await {
                Ok(id) => {
                    app.notifier.alert("User registered successfully!");
                    debug!("New user id {}", id);
                }
                Err(e) => app.notifier.alert(&e.user_message("Registration failed.")),
            }
        }

        Commands::Login { email } => {
            let api = Arc::clone(&app.api);
            match app.session.login(api.as_ref(), &email).await {
                Ok(user) => app.notifier.alert(&format!("Welcome, {}!", user.name)),
                Err(e) => app.notifier.alert(&e.user_message("Login failed.")),
            }
        }

        Commands::Logout => {
            let route = app.session.logout()?;
            info!("Session cleared, continue at {}", route.path());
        }

        Commands::Whoami => match app.session.current_user() {
            Some(user) => {
                println!("{} <{}> ({}, id {})", user.name, user.email, user.user_type, user.id);
                println!("Signed in by {}", app.session.auth_mode().describe());
            }
            None => println!("Not logged in. Go to {}", Route::Login.path()),
        },

        Commands::EditProfile { name, email } => {
            let api = Arc::clone(&app.api);
            match app.session.update_profile(api.as_ref(), &name, &email).await {
                Ok(message) => app.notifier.alert(&message),
                Err(e) => app.notifier.alert(&e.user_message("Failed to update profile.")),
            }
        }

        Commands::Dashboard => match app.session.resolve(Route::Root) {
            Screen::LandlordDashboard => {
                let mut view = app.landlord(false)?;
                view.load().await;
                print!("{}", view.render().await);
                view.tab = LandlordTab::Reservations;
                print!("{}", view.render().await);
            }
            Screen::RenterDashboard => {
                let mut view = app.renter()?;
                view.show_tab(RenterTab::Reservations).await;
                print!("{}", view.render().await);
            }
            Screen::Login | Screen::Register => {
                println!("Not logged in. Go to {}", Route::Login.path());
            }
        },

        Commands::Properties { command } => run_properties(app, command).await?,

        Commands::Reservations { command } => {
            let mut view = app.landlord(false)?;
            view.tab = LandlordTab::Reservations;
            view.refresh_reservations().await;
            match command {
                ReservationCommands::List => {}
                ReservationCommands::Approve { id } => {
                    view.approve(&Id::from(id)).await;
                }
                ReservationCommands::Reject { id } => {
                    view.reject(&Id::from(id)).await;
                }
            }
            print!("{}", view.render().await);
        }

        Commands::Search(args) => {
            let mut view = app.renter()?;
            view.filters.city = args.city;
            view.filters.min_price = parse_optional_price(args.min_price.as_deref())?;
            view.filters.max_price = parse_optional_price(args.max_price.as_deref())?;
            view.filters.start_date = args.start;
            view.filters.end_date = args.end;
            view.search().await;
            print!("{}", view.render().await);
        }

        Commands::Reserve {
            property_id,
            start,
            end,
        } => {
            let mut view = app.renter()?;
            view.filters.start_date = Some(start);
            view.filters.end_date = Some(end);
            if view.reserve(&Id::from(property_id)).await {
                view.tab = RenterTab::Reservations;
                print!("{}", view.render().await);
            }
        }

        Commands::MyReservations => {
            let mut view = app.renter()?;
            view.show_tab(RenterTab::Reservations).await;
            print!("{}", view.render().await);
        }

        Commands::Review {
            reservation_id,
            rating,
            comment,
        } => {
            let mut view = app.renter()?;
            let id = Id::from(reservation_id);
            view.show_tab(RenterTab::Reservations).await;
            if let Some(rating) = rating {
                view.set_review_rating(&id, rating);
            }
            view.set_review_comment(&id, &comment);
            if view.submit_review(&id).await {
                print!("{}", view.render().await);
            }
        }

        Commands::Reviews { property_id } => {
            let id = Id::from(property_id);
            match app.api.property_reviews(&id).await {
                Ok(reviews) => print!("{}", render::property_reviews(&reviews)),
                Err(e) => app.notifier.alert(&e.user_message("Failed to load reviews.")),
            }
        }
    }

    Ok(())
}

async fn run_properties(app: &App, command: PropertyCommands) -> Result<()> {
    let assume_yes = matches!(command, PropertyCommands::Delete { yes: true, .. });
    let mut view = app.landlord(assume_yes)?;
    view.refresh_properties().await;

    match command {
        PropertyCommands::List => {}
        PropertyCommands::Create(fields) => {
            view.new_listing();
            view.form = fields.into_draft(None);
            view.save().await;
        }
        PropertyCommands::Update { id, fields } => {
            let id = Id::from(id);
            if !view.edit(&id).await {
                bail!("Property {} is not one of your listings", id);
            }
            view.form = fields.into_draft(Some(id));
            view.save().await;
        }
        PropertyCommands::Delete { id, .. } => {
            view.delete(&Id::from(id)).await;
        }
    }

    view.tab = LandlordTab::Listings;
    print!("{}", view.render().await);
    Ok(())
}

fn parse_optional_price(raw: Option<&str>) -> Result<Option<f64>> {
    match raw.map(str::trim).filter(|v| !v.is_empty()) {
        Some(value) => Ok(Some(parse_price(value)?)),
        None => Ok(None),
    }
}
