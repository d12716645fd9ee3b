use std::str::FromStr;

use anyhow::Result;
use clap::{arg, Arg, ArgMatches, Command};

use byline::auth::{find_user_by_email, register};
use byline::{Config, Database, Profile, Role, User};

pub fn cmd() -> Command {
    Command::new("user")
        .subcommand_required(true)
        .display_order(10)
        .about("Inspect and manipulate accounts")
        .subcommand(
            Command::new("add")
                .arg_required_else_help(true)
                .about("Adds new account")
                .arg(arg!(--email <email> "Account email").required(true))
                .arg(arg!(--name <name> "Display name").required(true))
                .arg(arg!(--password [password] "Password, prompted for when missing"))
                .arg(
                    Arg::new("role")
                        .long("role")
                        .short('r')
                        .default_value("user")
                        .value_parser(["user", "author", "admin"]),
                ),
        )
        .subcommand(
            Command::new("list")
                .visible_alias("ls")
                .about("Lists accounts")
                .arg(
                    Arg::new("json")
                        .long("json")
                        .num_args(0)
                        .help("Print as json"),
                ),
        )
        .subcommand(
            Command::new("role")
                .arg_required_else_help(true)
                .about("Changes the role of an account")
                .arg(arg!(<email> "Account email"))
                .arg(Arg::new("role").required(true).value_parser(["user", "author", "admin"])),
        )
        .subcommand(
            Command::new("disable")
                .arg_required_else_help(true)
                .about("Blocks an account from logging in")
                .arg(arg!(<email> "Account email"))
                .arg(
                    Arg::new("undo")
                        .long("undo")
                        .num_args(0)
                        .help("Enable the account again"),
                ),
        )
}

pub fn run(matches: &ArgMatches, config: &Config) -> Result<()> {
    let db = Database::from_config(config)?;

    match matches.subcommand() {
        Some(("add", m)) => {
            // required args
            let email = string(m, "email")?;
            let name = string(m, "name")?;
            let role = role(m)?;

            let password = match m.get_one::<String>("password") {
                Some(password) => password.clone(),
                None => rpassword::prompt_password("Password: ")?,
            };
            if (password.chars().count() as u64) < config.auth.min_password_length {
                anyhow::bail!(
                    "password must be at least {} characters",
                    config.auth.min_password_length
                );
            }

            let (user, profile) = register(&db, &email, &password, &name, role)?;
            println!("Added {} ({}) as {}", user.email, user.id, profile.role);
        }
        Some(("list", m)) => {
            let mut profiles = db.get_collection::<Profile>()?;
            profiles.sort_by(|a, b| a.created_at.cmp(&b.created_at));
            let mut rows = Vec::new();
            for profile in profiles {
                let email = db
                    .try_get::<User>(profile.user_id)?
                    .map(|u| u.email)
                    .unwrap_or_default();
                rows.push((profile, email));
            }

            if m.get_flag("json") {
                let json = rows
                    .iter()
                    .map(|(p, email)| {
                        serde_json::json!({
                            "id": p.user_id,
                            "email": email,
                            "name": p.name,
                            "role": p.role,
                            "created_at": p.created_at,
                        })
                    })
                    .collect::<Vec<_>>();
                println!("{}", serde_json::to_string_pretty(&json)?);
            } else {
                println!("Found {} account(s):", rows.len());
                for (profile, email) in rows {
                    println!("{}  {:<8} {}  {}", profile.user_id, profile.role, email, profile.name);
                }
            }
        }
        Some(("role", m)) => {
            let user = existing(&db, m)?;
            let role = role(m)?;
            let mut profile = db
                .try_get::<Profile>(user.id)?
                .unwrap_or_else(|| Profile::new(user.id, ""));
            profile.role = role;
            profile.updated_at = chrono::Utc::now();
            db.set(&profile)?;
            println!("{} is now {}", user.email, role);
        }
        Some(("disable", m)) => {
            let mut user = existing(&db, m)?;
            user.is_disabled = !m.get_flag("undo");
            db.set(&user)?;
            let state = if user.is_disabled { "disabled" } else { "enabled" };
            println!("{} {state}", user.email);
        }
        _ => anyhow::bail!("unknown user subcommand"),
    }

    db.flush()?;
    Ok(())
}

fn string(matches: &ArgMatches, id: &str) -> Result<String> {
    matches
        .get_one::<String>(id)
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("missing argument '{id}'"))
}

fn role(matches: &ArgMatches) -> Result<Role> {
    Ok(Role::from_str(&string(matches, "role")?)?)
}

fn existing(db: &Database, matches: &ArgMatches) -> Result<User> {
    let email = string(matches, "email")?;
    find_user_by_email(db, &email)?.ok_or_else(|| anyhow::anyhow!("no account with email {email}"))
}
