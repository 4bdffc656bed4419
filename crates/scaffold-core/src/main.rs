//! `scaffold` command line

use std::io;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use scaffold_core::{
    AnswerQueue, EntityMaker, EntitySkeleton, LinePrompter, LocalFilesystem, MakerKind,
    ProjectLayout, Regenerator, ScaffoldConfig, DEFAULT_CONFIG_PATH, VERSION,
};
use scaffold_relation::AttributeTagRenderer;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("scaffold")
        .version(VERSION)
        .about("Entity and relation scaffolding for PHP projects")
        .subcommand_required(true)
        .arg(
            Arg::new("root")
                .long("root")
                .global(true)
                .default_value(".")
                .value_parser(value_parser!(PathBuf))
                .help("Project root directory"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .default_value(DEFAULT_CONFIG_PATH)
                .value_parser(value_parser!(PathBuf))
                .help("Configuration file, relative to the project root"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::Count)
                .help("More logging (-v info, -vv debug)"),
        )
        .subcommand(
            Command::new(MakerKind::Entity.id())
                .about(MakerKind::Entity.description())
                .arg(
                    Arg::new("answers")
                        .long("answers")
                        .value_parser(value_parser!(PathBuf))
                        .help("YAML list of answers instead of interactive questions"),
                )
                .arg(
                    Arg::new("overwrite")
                        .long("overwrite")
                        .action(ArgAction::SetTrue)
                        .help("Replace existing properties and methods"),
                ),
        )
        .subcommand(
            Command::new(MakerKind::Regenerate.id())
                .about(MakerKind::Regenerate.description())
                .arg(
                    Arg::new("namespace")
                        .long("namespace")
                        .help("Namespace to regenerate (defaults to the entity namespace)"),
                )
                .arg(
                    Arg::new("overwrite")
                        .long("overwrite")
                        .action(ArgAction::SetTrue)
                        .help("Replace existing accessors and retry broken files leniently"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output the report as JSON"),
                ),
        )
}

fn init_tracing(verbosity: u8) {
    let default = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run_entity(
    fs: &LocalFilesystem,
    layout: &ProjectLayout,
    args: &ArgMatches,
) -> anyhow::Result<()> {
    let renderer = AttributeTagRenderer::new();
    let maker = EntityMaker::new(fs, layout, &renderer, &EntitySkeleton)
        .with_overwrite(args.get_flag("overwrite"));

    let report = if let Some(path) = args.get_one::<PathBuf>("answers") {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading answers from {}", path.display()))?;
        let mut answers = AnswerQueue::from_yaml(&text)
            .with_context(|| format!("parsing answers in {}", path.display()))?;
        maker.run(&mut answers)?
    } else {
        let stdin = io::stdin();
        let mut prompter = LinePrompter::new(stdin.lock(), io::stdout());
        maker.run(&mut prompter)?
    };

    for line in &report.transcript {
        println!("{line}");
    }
    for field in &report.skipped {
        println!("skipped: {field} already exists");
    }
    println!();
    println!(" Success!");
    Ok(())
}

fn run_regenerate(
    fs: &LocalFilesystem,
    layout: &ProjectLayout,
    args: &ArgMatches,
) -> anyhow::Result<()> {
    let renderer = AttributeTagRenderer::new();
    let namespace = args.get_one::<String>("namespace").map(String::as_str);
    let report = Regenerator::new(fs, layout, &renderer)
        .with_overwrite(args.get_flag("overwrite"))
        .run(namespace)?;

    if args.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{report}");
    }
    if !report.is_success() {
        std::process::exit(1);
    }
    Ok(())
}

fn load_layout(fs: &LocalFilesystem, config: &Path) -> anyhow::Result<ProjectLayout> {
    let config = ScaffoldConfig::load(fs, config)
        .with_context(|| format!("loading {}", config.display()))?;
    Ok(ProjectLayout::new(config))
}

fn main() -> anyhow::Result<()> {
    let matches = cli().get_matches();
    let Some((id, args)) = matches.subcommand() else {
        return Ok(());
    };
    init_tracing(args.get_count("verbose"));

    let root = args
        .get_one::<PathBuf>("root")
        .cloned()
        .unwrap_or_else(|| PathBuf::from("."));
    let config = args
        .get_one::<PathBuf>("config")
        .cloned()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let fs = LocalFilesystem::new(root);
    let layout = load_layout(&fs, &config)?;

    match MakerKind::from_id(id)? {
        MakerKind::Entity => run_entity(&fs, &layout, args),
        MakerKind::Regenerate => run_regenerate(&fs, &layout, args),
    }
}
