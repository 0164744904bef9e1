use std::path::PathBuf;

use clap::Parser;
use color_eyre::Result;
use larder::{
    Config, Database, Profile,
    cli::{self, Cli, Commands},
    logging,
};

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    let profile = if cli.dev { Profile::Dev } else { Profile::Prod };

    let config = match &cli.config {
        Some(path) => Config::load_from_path(&larder::utils::expand_path(path), profile)?,
        None => Config::load_with_profile(profile)?,
    };

    let log_path: PathBuf = config.get_log_path();
    logging::init(&log_path, &config.log_level)?;
    tracing::debug!(?profile, log = %log_path.display(), "starting");

    let db_path = config.get_database_path();
    let db = Database::new(
        db_path
            .to_str()
            .ok_or_else(|| color_eyre::eyre::eyre!("Database path contains invalid UTF-8"))?,
    )?;

    match cli.command.unwrap_or(Commands::Tui) {
        Commands::Tui => {
            let app = larder::tui::App::new(config, db)?;
            larder::tui::run_event_loop(app)?;
        }
        Commands::Signup { name, email, password } => {
            cli::handle_signup(&name, &email, &password, &db)?;
        }
        Commands::Login { email, password } => {
            cli::handle_login(&email, &password, &db)?;
        }
        Commands::Logout => cli::handle_logout(&db)?,
        Commands::Whoami => cli::handle_whoami(&db)?,
        Commands::Add { genre, name, quantity, barcode, items } => {
            let catalog = config.catalog_lookup();
            cli::handle_add(genre, name, quantity, barcode, items, &db, &catalog)?;
        }
        Commands::Restock { genre, name, quantity, items } => {
            cli::handle_restock(genre, name, quantity, items, &db)?;
        }
        Commands::List => cli::handle_list(&db)?,
        Commands::History => cli::handle_history(&db)?,
        Commands::Edit { id, name, quantity } => {
            cli::handle_edit(&id, &name, &quantity, &db)?;
        }
        Commands::Delete { id } => cli::handle_delete(&id, &db)?,
        Commands::Calendar { date, month, search } => {
            cli::handle_calendar(date, month, search, &db)?;
        }
        Commands::AddEvent { title, date, description } => {
            cli::handle_add_event(&title, &date, description.as_deref(), &db)?;
        }
        Commands::DeleteEvent { id } => cli::handle_delete_event(&id, &db)?,
    }

    Ok(())
}
