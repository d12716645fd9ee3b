use anyhow::Result;
use clap::{arg, ArgMatches, Command};

use byline::engagement::reconcile_counters;
use byline::{post, Config, Database, Post};

pub fn cmd() -> Command {
    Command::new("reconcile")
        .display_order(20)
        .about("Recompute engagement counters from stored views, likes and comments")
        .arg(arg!(--slug [slug] "Only reconcile this post, all posts otherwise"))
}

pub fn run(matches: &ArgMatches, config: &Config) -> Result<()> {
    let db = Database::from_config(config)?;

    let posts = match matches.get_one::<String>("slug") {
        Some(slug) => match post::find_by_slug(&db, slug)? {
            Some(post) => vec![post],
            None => anyhow::bail!("no post with slug '{slug}'"),
        },
        None => db.get_collection::<Post>()?,
    };

    for post in &posts {
        let counters = reconcile_counters(&db, post.id)?;
        println!(
            "{}: views {} (unique {}), likes {}, comments {}",
            post.slug,
            counters.view_count,
            counters.unique_view_count,
            counters.like_count,
            counters.comment_count
        );
    }
    db.flush()?;
    println!("Reconciled {} post(s)", posts.len());

    Ok(())
}
