use clap::{Parser, Subcommand};
use lift_core::document::{self, Value};
use lift_core::*;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "liftc")]
#[command(about = "Workout program compiler", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Read configuration from this file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a program document into concrete prescriptions
    Render {
        /// Program document (YAML, JSON or TOML), or '-' for YAML on stdin
        file: PathBuf,

        /// Output format (json, yaml, csv)
        #[arg(long)]
        format: Option<OutputFormat>,

        /// Write output to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,

        /// Compact JSON output
        #[arg(long)]
        compact: bool,
    },

    /// Load and render a program, printing a summary
    Check {
        /// Program document (YAML, JSON or TOML), or '-' for YAML on stdin
        file: PathBuf,
    },

    /// Evaluate a single expression
    Eval {
        expression: String,

        /// Bind a variable, e.g. --var squat.starting_weight=225
        #[arg(long = "var", value_name = "NAME=VALUE", value_parser = parse_var)]
        vars: Vec<Binding>,
    },

    /// Resolve a shorthand prescription such as 225:3:5@8
    Shorthand {
        text: String,

        /// Bind a variable, e.g. --var x=225
        #[arg(long = "var", value_name = "NAME=VALUE", value_parser = parse_var)]
        vars: Vec<Binding>,

        /// Read fields as weight:reps:sets
        #[arg(long)]
        reps_before_sets: bool,
    },

    /// Write a default configuration file (to --config or the default location)
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        lift_core::logging::init_with_level("debug");
    } else {
        lift_core::logging::init();
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    if let Commands::InitConfig { force } = cli.command {
        return cmd_init_config(cli.config, force);
    }

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    tracing::debug!(?config, "using configuration");

    match cli.command {
        Commands::Render {
            file,
            format,
            output,
            compact,
        } => cmd_render(&file, format, output, compact, &config),
        Commands::Check { file } => cmd_check(&file, &config),
        Commands::Eval { expression, vars } => cmd_eval(&expression, &vars),
        Commands::Shorthand {
            text,
            vars,
            reps_before_sets,
        } => cmd_shorthand(&text, &vars, reps_before_sets),
        Commands::InitConfig { force } => cmd_init_config(cli.config, force),
    }
}

fn cmd_init_config(path: Option<PathBuf>, force: bool) -> Result<()> {
    let path = path
        .or_else(Config::default_config_path)
        .ok_or_else(|| Error::Config("no config directory available; pass --config".into()))?;

    if path.exists() && !force {
        return Err(Error::Config(format!(
            "{} already exists; pass --force to overwrite",
            path.display()
        )));
    }

    Config::default().save_to(&path)?;
    println!("✓ Wrote default configuration to {}", path.display());
    Ok(())
}

fn cmd_render(
    file: &Path,
    format: Option<OutputFormat>,
    output: Option<PathBuf>,
    compact: bool,
    config: &Config,
) -> Result<()> {
    let document = read_document(file)?;
    let rendered = render_document(&document, &config.program_defaults())?;

    let format = format.unwrap_or(config.output.format);
    let pretty = config.output.pretty && !compact;

    match output {
        Some(path) => {
            export::write_to_path(&rendered, format, pretty, &path)?;
            eprintln!("✓ Wrote {} to {}", format, path.display());
        }
        None => export::write(&rendered, format, pretty, io::stdout().lock())?,
    }

    Ok(())
}

fn cmd_check(file: &Path, config: &Config) -> Result<()> {
    let document = read_document(file)?;
    let program = load_program_with(&document, &config.program_defaults())?;
    let rendered = render(&program)?;

    let sessions: usize = rendered
        .schedule
        .blocks
        .iter()
        .map(|block| block.sessions.len())
        .sum();

    println!("✓ {} is valid", file.display());
    println!(
        "  Units: {} ({})",
        rendered.units,
        rendered.units.abbreviation()
    );
    println!("  Exercises: {}", program.exercises.len());
    println!("  Templates: {}", program.templates.len());
    println!("  Blocks: {}", rendered.schedule.blocks.len());
    println!("  Sessions: {}", sessions);
    println!("  Prescriptions: {}", rendered.exercises().count());

    Ok(())
}

fn cmd_eval(expression: &str, vars: &[Binding]) -> Result<()> {
    let value = resolve_expression(expression, vars)?;
    println!("{}", value);
    Ok(())
}

fn cmd_shorthand(text: &str, vars: &[Binding], reps_before_sets: bool) -> Result<()> {
    let config = ShorthandConfig {
        enabled: true,
        sets_before_reps: !reps_before_sets,
    };
    let definition = resolve_definition(&config, text, vars)?;
    export::check_json_numbers(&definition, format_args!("shorthand {:?}", text))?;

    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, &definition)?;
    writeln!(stdout)?;
    Ok(())
}

/// Read a program document from a path, or YAML from stdin for "-"
fn read_document(file: &Path) -> Result<Value> {
    if file == Path::new("-") {
        let mut contents = String::new();
        io::stdin().read_to_string(&mut contents)?;
        document::from_yaml_str(&contents)
    } else {
        document::from_path(file)
    }
}

fn parse_var(s: &str) -> std::result::Result<Binding, String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", s))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing variable name in '{}'", s));
    }
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a number", value.trim()))?;
    Ok(Binding::new(name, value))
}
