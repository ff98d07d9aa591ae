use colored::Colorize;

use crate::db::{get_connection, init_db};
use crate::error::Result;
use crate::settings::{save_settings, settings_file_exists, shellexpand_path, Settings};

pub fn run(data_dir: Option<String>) -> Result<()> {
    // With the environment override active, settings.json is left alone so
    // scripted runs never rewrite the user's config.
    let env_dir = std::env::var("RECKON_DATA_DIR")
        .ok()
        .filter(|d| !d.is_empty());

    let target = match (&env_dir, &data_dir) {
        (Some(dir), _) => dir.clone(),
        (None, Some(dir)) => shellexpand_path(dir),
        (None, None) => Settings::default().data_dir,
    };

    std::fs::create_dir_all(&target)?;

    if env_dir.is_none() {
        let mut settings = if settings_file_exists() {
            crate::settings::load_settings()
        } else {
            Settings::default()
        };
        settings.data_dir = target.clone();
        save_settings(&settings)?;
    }

    let db_path = std::path::Path::new(&target).join("reckon.db");
    let existed = db_path.exists();
    let conn = get_connection(&db_path)?;
    init_db(&conn)?;

    if existed {
        println!("{} {}", "Reattached to".green(), db_path.display());
    } else {
        println!("{} {}", "Initialized".green(), db_path.display());
        println!("Next: add accounts with `reckon accounts add`, or try `reckon demo`.");
    }
    Ok(())
}
