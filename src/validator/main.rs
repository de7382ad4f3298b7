//! Standalone validator for content files.
//!
//! Checks a content JSON file for the LifeRhythm bot: topics, menu labels,
//! count options, lab reference keys and recipes.

use std::process::ExitCode;

use clap::Parser;

use liferhythm_bot::content::{ContentStore, Layout};

/// Content file validator.
#[derive(Parser, Debug)]
#[command(name = "validate_content")]
#[command(about = "Validates content files for the LifeRhythm bot")]
#[command(version)]
struct Args {
    /// Path to the JSON content file to validate.
    #[arg(short, long, default_value = "content.json")]
    file: String,

    /// Write the built-in content set to the specified path.
    #[arg(long)]
    generate_example: Option<String>,

    /// Show details for each topic.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    if let Some(output_path) = args.generate_example {
        return generate_example(&output_path);
    }

    validate_content(&args.file, args.verbose)
}

fn generate_example(output_path: &str) -> ExitCode {
    let example = ContentStore::example();

    match example.save_to_file(output_path) {
        Ok(()) => {
            println!("✓ Example content written to: {output_path}");
            println!(
                "\nThe file contains {} topics, {} lab references and {} recipes.",
                example.topics.len(),
                example.lab_reference.len(),
                example.recipes.len()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ Failed to write example file: {e}");
            ExitCode::FAILURE
        }
    }
}

fn validate_content(path: &str, verbose: bool) -> ExitCode {
    println!("Validating: {path}\n");

    let content = match ContentStore::load_from_file(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("✗ Failed to load content: {e}");
            return ExitCode::FAILURE;
        }
    };

    if verbose {
        for (key, topic) in &content.topics {
            let layout = match topic.layout {
                Layout::Blocks => "blocks",
                Layout::Tips => "tips",
            };
            println!(
                "[{key}] \"{}\" ({} entries, {layout}, default {}, options {:?})",
                topic.menu_label,
                topic.entries.len(),
                topic.default_count,
                topic.count_options
            );
        }
        println!();
    }

    let results = content.validate_all();
    let mut errors = 0;

    for (item, result) in &results {
        match result {
            Ok(()) => {
                if verbose {
                    println!("  ✓ {item}");
                }
            }
            Err(e) => {
                errors += 1;
                println!("  ✗ {item}: {e}");
            }
        }
    }

    println!();

    let total = results.len();
    if errors == 0 {
        println!("✓ All {total} items are valid!");
        println!("  Lab reference keys: {}", content.lab_codes().join(", "));
        ExitCode::SUCCESS
    } else {
        println!("✗ Validation failed: {errors} error(s) in {total} items");
        println!("  Valid: {}/{total}", total - errors);
        ExitCode::FAILURE
    }
}
