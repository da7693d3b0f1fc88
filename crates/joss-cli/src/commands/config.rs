use joss_core::util::normalize_text_option;

use crate::config_profiles::CliProfilesConfig;
use crate::error::CliError;

pub struct ConfigInitArgs {
    pub profile: Option<String>,
    pub remote_url: Option<String>,
    pub api_key: Option<String>,
    pub table: Option<String>,
    pub no_activate: bool,
}

pub fn run_config_init(args: ConfigInitArgs) -> Result<(), CliError> {
    let mut config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(args.profile.as_deref());

    {
        let profile = config.profile_mut_or_default(&profile_name);
        if let Some(url) = normalize_text_option(args.remote_url) {
            profile.remote_url = Some(url);
        }
        if let Some(key) = normalize_text_option(args.api_key) {
            profile.api_key = Some(key);
        }
        if let Some(table) = normalize_text_option(args.table) {
            profile.table_name = Some(table);
        }

        // Surface half-filled profiles at configuration time, not at sync time
        profile.remote_config().map_err(CliError::Config)?;
    }

    if !args.no_activate {
        config.active_profile = Some(profile_name.clone());
    }

    let path = config.save().map_err(CliError::Config)?;
    println!("Profile '{profile_name}' saved to {}", path.display());
    Ok(())
}

pub fn run_config_show(profile: Option<&str>) -> Result<(), CliError> {
    let config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(profile);

    let Some(profile) = config.profile(&profile_name) else {
        println!("Profile '{profile_name}' is not configured (local-only sync).");
        return Ok(());
    };

    println!("profile   {profile_name}");
    println!(
        "remote    {}",
        profile.remote_url.as_deref().unwrap_or("(unset)")
    );
    println!(
        "api key   {}",
        if profile.api_key.is_some() {
            "(set)"
        } else {
            "(unset)"
        }
    );
    println!(
        "table     {}",
        profile.table_name.as_deref().unwrap_or("temple_data")
    );
    Ok(())
}
