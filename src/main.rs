use anyhow::{anyhow, Result};
use boc::catalog::{Builder, Cache, Scan};
use boc::config::{Config, Project};
use boc::filter::{Listing, TagFilter};
use boc::post::Post;
use boc::{build, log, logger, view, warn};
use clap::{crate_version, App, AppSettings, Arg, ArgMatches, SubCommand};
use std::path::PathBuf;

fn main() -> Result<()> {
    let matches = App::new("boc")
        .version(crate_version!())
        .about("Static site generator for a personal markdown blog")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(
            Arg::with_name("verbose")
                .long("verbose")
                .short("v")
                .global(true)
                .help("Print debug output"),
        )
        .subcommand(
            SubCommand::with_name("build")
                .about("Render the site into the output directory")
                .arg(directory_arg())
                .arg(
                    Arg::with_name("output")
                        .long("output")
                        .short("o")
                        .takes_value(true)
                        .default_value("_site")
                        .help("Output directory"),
                )
                .arg(
                    Arg::with_name("threads")
                        .long("threads")
                        .takes_value(true)
                        .help("Parser threads (defaults to the number of CPUs)"),
                ),
        )
        .subcommand(
            SubCommand::with_name("list")
                .about("List the catalog, optionally filtered by tags")
                .arg(directory_arg())
                .arg(
                    Arg::with_name("tag")
                        .long("tag")
                        .short("t")
                        .takes_value(true)
                        .multiple(true)
                        .number_of_values(1)
                        .help("Toggle a tag into the filter (repeatable)"),
                ),
        )
        .subcommand(
            SubCommand::with_name("show")
                .about("Show one post's metadata")
                .arg(Arg::with_name("slug").required(true).help("Post slug"))
                .arg(directory_arg()),
        )
        .subcommand(
            SubCommand::with_name("routes")
                .about("Print every publishable post identifier")
                .arg(directory_arg()),
        )
        .get_matches();

    logger::set_verbose(matches.is_present("verbose"));

    match matches.subcommand() {
        ("build", Some(matches)) => run_build(matches),
        ("list", Some(matches)) => run_list(matches),
        ("show", Some(matches)) => run_show(matches),
        ("routes", Some(matches)) => run_routes(matches),
        _ => unreachable!("a subcommand is required"),
    }
}

fn directory_arg<'a, 'b>() -> Arg<'a, 'b> {
    Arg::with_name("directory").help("Project directory (defaults to the current directory)")
}

fn project_directory(matches: &ArgMatches) -> PathBuf {
    PathBuf::from(matches.value_of("directory").unwrap_or("."))
}

/// Opens the catalog cache for a read-only command. The cache builds at
/// most once per invocation; long-lived callers would hold onto it and
/// invalidate when the posts directory changes.
fn open_cache(matches: &ArgMatches) -> Result<Cache> {
    let (root, _) = Project::from_directory(&project_directory(matches))?;
    Ok(Cache::new(Builder::new(root.join("posts"))))
}

fn report_warnings(scan: &Scan) {
    for warning in &scan.warnings {
        warn!("catalog"; "{}", warning);
    }
}

fn run_build(matches: &ArgMatches) -> Result<()> {
    let threads = match matches.value_of("threads") {
        None => None,
        Some(raw) => Some(
            raw.parse::<usize>()
                .map_err(|_| anyhow!("--threads expects a number, got `{}`", raw))?,
        ),
    };
    let output = PathBuf::from(matches.value_of("output").unwrap_or("_site"));
    let config = Config::load(&project_directory(matches), &output, threads)?;
    build::build_site(&config)?;
    log!("build"; "site written to `{}`", output.display());
    Ok(())
}

fn run_list(matches: &ArgMatches) -> Result<()> {
    let mut cache = open_cache(matches)?;
    let scan = cache.get_or_build()?;
    report_warnings(scan);

    let mut filter = TagFilter::new();
    if let Some(tags) = matches.values_of("tag") {
        for tag in tags {
            filter.toggle(tag);
        }
    }
    print_listing(&filter, view::list_all(&scan.catalog));
    Ok(())
}

fn run_show(matches: &ArgMatches) -> Result<()> {
    let slug = matches.value_of("slug").expect("slug is a required argument");
    let mut cache = open_cache(matches)?;
    let scan = cache.get_or_build()?;
    report_warnings(scan);

    let post = view::post_by_slug(&scan.catalog, slug)?;
    println!("{}", post.title.as_deref().unwrap_or(""));
    println!("slug: {}", post.slug);
    println!("date: {}", post.date_display());
    if let Some(author) = &post.author {
        println!("author: {}", author);
    }
    if let Some(minutes) = &post.reading_time {
        println!("reading time: {} min", minutes);
    }
    if !post.tags.is_empty() {
        println!("tags: {}", post.tags.join(", "));
    }
    if let Some(summary) = &post.summary {
        println!();
        println!("{}", summary);
    }
    Ok(())
}

fn run_routes(matches: &ArgMatches) -> Result<()> {
    let mut cache = open_cache(matches)?;
    let scan = cache.get_or_build()?;
    report_warnings(scan);
    for slug in view::static_route_slugs(&scan.catalog) {
        println!("{}", slug);
    }
    Ok(())
}

/// Prints the listing the way the posts index shows it: one run when
/// nothing is filtered, matching and other sections when tags are selected,
/// and an explicit empty state when the selection matches nothing.
fn print_listing(filter: &TagFilter, posts: &[Post]) {
    match filter.listing(posts) {
        Listing::All(all) => {
            for post in all {
                print_post_line(post);
            }
        }
        Listing::Filtered { matching, other } => {
            let selected: Vec<&str> = filter.selected().collect();
            if matching.is_empty() {
                println!("No posts found with the selected tags ({}).", selected.join(", "));
                println!("Run again without --tag to clear the filter and see all posts.");
            } else {
                println!("Posts with tags: {}", selected.join(", "));
                for post in &matching {
                    print_post_line(post);
                }
            }
            if !other.is_empty() {
                println!();
                println!("Other posts");
                for post in &other {
                    print_post_line(post);
                }
            }
        }
    }
}

fn print_post_line(post: &Post) {
    let mut line = format!(
        "{}  {}  [{}]",
        post.date_iso(),
        post.title.as_deref().unwrap_or(""),
        post.slug
    );
    if !post.tags.is_empty() {
        line.push_str(&format!("  ({})", post.tags.join(", ")));
    }
    println!("{}", line);
}
