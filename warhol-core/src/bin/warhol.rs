//! Warhol CLI
//!
//! Commands: style init, character init, generate
//! Human-readable output by default; `generate --json` prints the manifest.

use clap::{Parser, Subcommand};
use log::debug;
use std::path::PathBuf;
use std::process::ExitCode;

use warhol_core::{
    provider::{DEFAULT_QUALITY, DEFAULT_SIZE},
    templates::{default_template_path, write_template},
    workspace::default_project_path,
    EnvCredentials, GenerateRequest, GenerationPipeline, HttpGateway, ImageOptions, ProfileKind,
    ProfileStore,
};

#[derive(Parser)]
#[command(name = "warhol", version)]
#[command(about = "warhol - CLI for creating images in a consistent visual style")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage style profiles
    Style {
        #[command(subcommand)]
        action: InitAction,
    },

    /// Manage character profiles
    Character {
        #[command(subcommand)]
        action: InitAction,
    },

    /// Compose a prompt and generate an image
    Generate(GenerateArgs),
}

#[derive(Subcommand)]
enum InitAction {
    /// Write a starter profile
    Init {
        name: String,

        /// Path to output YAML file
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(clap::Args)]
struct GenerateArgs {
    /// Style profile path or name
    #[arg(long, allow_hyphen_values = true)]
    style: String,

    /// Character profile path or name (shorthand: -<name>)
    #[arg(long, allow_hyphen_values = true)]
    character: Option<String>,

    /// Prompt text
    #[arg(long, allow_hyphen_values = true)]
    prompt: String,

    /// Directory for generated artifacts
    #[arg(long, allow_hyphen_values = true)]
    out_dir: Option<PathBuf>,

    /// Image provider (google|openai)
    #[arg(long, default_value = "google", allow_hyphen_values = true)]
    provider: String,

    /// Model override (defaults by provider)
    #[arg(long, allow_hyphen_values = true)]
    model: Option<String>,

    /// OpenAI image size
    #[arg(long, default_value = DEFAULT_SIZE, allow_hyphen_values = true)]
    size: String,

    /// OpenAI image quality (low, medium, high)
    #[arg(long, default_value = DEFAULT_QUALITY, allow_hyphen_values = true)]
    quality: String,

    /// Compose prompt and write the manifest without generating an image
    #[arg(long)]
    dry_run: bool,

    /// Print the manifest as JSON instead of a summary
    #[arg(long)]
    json: bool,
}

/// Flags of `generate` that take a value
const VALUE_FLAGS: &[&str] = &[
    "style", "character", "prompt", "out-dir", "provider", "model", "size", "quality",
];
const SWITCH_FLAGS: &[&str] = &["dry-run", "json", "h", "help"];

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse_from(normalize_args(std::env::args().collect()));

    match cli.command {
        Commands::Style { action } => init_profile(ProfileKind::Style, action),
        Commands::Character { action } => init_profile(ProfileKind::Character, action),
        Commands::Generate(args) => generate(args),
    }
}

fn init_profile(kind: ProfileKind, action: InitAction) -> ExitCode {
    let InitAction::Init { name, output } = action;
    let path = output.unwrap_or_else(|| default_template_path(kind, &name));

    match write_template(kind, &name, &path) {
        Ok(()) => {
            println!("Created {kind} template: {}", path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("failed to write {kind} template: {e}");
            ExitCode::FAILURE
        }
    }
}

fn generate(args: GenerateArgs) -> ExitCode {
    let request = GenerateRequest {
        style: args.style,
        character: args.character,
        prompt: args.prompt,
        provider: args.provider,
        model: args.model,
        options: ImageOptions {
            size: args.size,
            quality: args.quality,
        },
        out_dir: args.out_dir.unwrap_or_else(|| default_project_path("outputs")),
        dry_run: args.dry_run,
    };

    let pipeline = GenerationPipeline::new(ProfileStore::default(), HttpGateway::new(EnvCredentials));

    let outcome = match pipeline.run(&request) {
        Ok(outcome) => outcome,
        Err(e) => {
            debug!("generation failed: {e:?}");
            eprintln!("{e}");
            return ExitCode::from(e.exit_code());
        }
    };

    if args.json {
        match outcome.manifest.to_json() {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("failed to encode manifest: {e}");
                return ExitCode::FAILURE;
            }
        }
        return ExitCode::SUCCESS;
    }

    println!("Prompt: {}", outcome.manifest.final_prompt);
    match &outcome.image_path {
        Some(path) => println!("Image saved: {}", path.display()),
        None => println!("Dry run: image generation skipped."),
    }
    println!("Manifest saved: {}", outcome.manifest_path.display());
    ExitCode::SUCCESS
}

/// Rewrite `generate` arguments so single-dash flags parse: `-style x` becomes
/// `--style x` and a bare `-matt` becomes `--character matt`.
fn normalize_args(args: Vec<String>) -> Vec<String> {
    let Some(pos) = args.iter().skip(1).position(|a| a == "generate").map(|p| p + 1) else {
        return args;
    };
    if args[1..pos].iter().any(|a| !a.starts_with('-')) {
        return args;
    }

    let mut normalized = args[..=pos].to_vec();
    let mut expects_value = false;

    for arg in &args[pos + 1..] {
        if expects_value || arg.starts_with("--") || !arg.starts_with('-') || arg == "-" {
            expects_value = !expects_value && arg.starts_with("--") && takes_value(&arg[2..]);
            normalized.push(arg.clone());
            continue;
        }

        let trimmed = &arg[1..];
        let name = trimmed.split('=').next().unwrap_or(trimmed);

        if name.len() == 1 && SWITCH_FLAGS.contains(&name) {
            normalized.push(arg.clone());
        } else if VALUE_FLAGS.contains(&name) || SWITCH_FLAGS.contains(&name) {
            expects_value = !trimmed.contains('=') && takes_value(name);
            normalized.push(format!("-{arg}"));
        } else if trimmed.contains('=') {
            normalized.push(arg.clone());
        } else {
            normalized.push("--character".to_string());
            normalized.push(trimmed.to_string());
        }
    }

    normalized
}

fn takes_value(flag: &str) -> bool {
    !flag.contains('=') && VALUE_FLAGS.contains(&flag)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_bare_dash_name_becomes_character() {
        let out = normalize_args(args(&["warhol", "generate", "--style", "16bit", "-matt", "--prompt", "hi"]));
        assert_eq!(
            out,
            args(&["warhol", "generate", "--style", "16bit", "--character", "matt", "--prompt", "hi"])
        );
    }

    #[test]
    fn test_single_dash_known_flags_promoted() {
        let out = normalize_args(args(&["warhol", "generate", "-style", "noir", "-dry-run", "-prompt=x"]));
        assert_eq!(
            out,
            args(&["warhol", "generate", "--style", "noir", "--dry-run", "--prompt=x"])
        );
    }

    #[test]
    fn test_values_starting_with_dash_untouched() {
        let out = normalize_args(args(&["warhol", "generate", "--prompt", "-dramatic", "-style", "-odd"]));
        assert_eq!(
            out,
            args(&["warhol", "generate", "--prompt", "-dramatic", "--style", "-odd"])
        );

        let cli = Cli::try_parse_from(out).unwrap();
        match cli.command {
            Commands::Generate(g) => {
                assert_eq!(g.prompt, "-dramatic");
                assert_eq!(g.style, "-odd");
                assert!(g.character.is_none());
            }
            _ => panic!("expected generate"),
        }
    }

    #[test]
    fn test_prompt_with_leading_dash_parses() {
        let cli = Cli::try_parse_from(normalize_args(args(&[
            "warhol", "generate", "--style", "noir", "--prompt", "-dramatic lighting",
        ])))
        .unwrap();
        match cli.command {
            Commands::Generate(g) => assert_eq!(g.prompt, "-dramatic lighting"),
            _ => panic!("expected generate"),
        }
    }

    #[test]
    fn test_other_commands_untouched() {
        let input = args(&["warhol", "style", "init", "-matt"]);
        assert_eq!(normalize_args(input.clone()), input);
    }

    #[test]
    fn test_cli_parses_normalized_generate() {
        let cli = Cli::parse_from(normalize_args(args(&[
            "warhol", "generate", "-style", "noir", "-matt", "--prompt", "a cat", "--provider", "openai",
        ])));
        match cli.command {
            Commands::Generate(g) => {
                assert_eq!(g.style, "noir");
                assert_eq!(g.character.as_deref(), Some("matt"));
                assert_eq!(g.size, "1024x1024");
                assert_eq!(g.quality, "medium");
                assert!(!g.dry_run);
            }
            _ => panic!("expected generate"),
        }
    }
}
