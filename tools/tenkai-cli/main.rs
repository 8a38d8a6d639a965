use clap::Parser;
use std::fs;
use std::time::Instant;
use tenkai::prelude::*;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

/// Transforms a screen of an experience document against runtime data
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the experience JSON file
    experience_path: String,
    /// Optional path to the runtime context JSON file (payloads, items, user, url)
    context_path: Option<String>,

    /// The screen to transform. Defaults to the document's initial screen
    #[arg(short, long)]
    screen: Option<String>,

    /// Print an indented outline instead of JSON
    #[arg(long)]
    outline: bool,

    /// Write the transformed screen JSON to this file instead of stdout
    #[arg(short, long)]
    output: Option<String>,

    /// Resolve items of collections missing from the context from their key-path
    #[arg(long)]
    resolve_missing_items: bool,

    /// Interpolate this template against the data scope of `--node`
    #[arg(long, requires = "node")]
    interpolate: Option<String>,

    /// The transformed node whose data scope `--interpolate` uses
    #[arg(long)]
    node: Option<String>,

    /// Log transformation details (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let total_start = Instant::now();

    // --- 1. File Loading ---
    let load_start = Instant::now();
    let experience = Experience::from_file(&cli.experience_path).unwrap_or_else(|e| {
        exit_with_error(&format!(
            "Failed to load experience from '{}': {}",
            cli.experience_path, e
        ))
    });
    let runtime = match &cli.context_path {
        Some(path) => RuntimeData::from_file(path).unwrap_or_else(|e| {
            exit_with_error(&format!("Failed to load context from '{}': {}", path, e))
        }),
        None => {
            eprintln!("No context file provided. Transforming without runtime data.");
            RuntimeData::default()
        }
    };
    let load_duration = load_start.elapsed();

    // --- 2. Transformation ---
    let transformer = Transformer::builder(&experience)
        .with_runtime_data(runtime)
        .resolve_missing_items(cli.resolve_missing_items)
        .build();

    let transform_start = Instant::now();
    let screen = match &cli.screen {
        Some(screen_id) => transformer.transform(screen_id),
        None => transformer.transform_initial_screen(),
    }
    .unwrap_or_else(|e| exit_with_error(&format!("Transformation failed: {}", e)));
    let transform_duration = transform_start.elapsed();

    // --- 3. Output ---
    if cli.outline {
        print!("{}", OutlineFormatter::format_screen(&screen));
    } else {
        let json = serde_json::to_string_pretty(&screen)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to serialize screen: {}", e)));
        match &cli.output {
            Some(path) => fs::write(path, json).unwrap_or_else(|e| {
                exit_with_error(&format!("Failed to write output file '{}': {}", path, e))
            }),
            None => println!("{}", json),
        }
    }

    // --- 4. Interpolation ---
    if let (Some(template), Some(node_id)) = (&cli.interpolate, &cli.node) {
        if !screen.contains(node_id) {
            exit_with_error(&format!(
                "Node '{}' is not part of the transformed screen",
                node_id
            ));
        }
        let interpolator = transformer.interpolator_for(&screen, node_id);
        match interpolator.interpolate(template) {
            Ok(Some(text)) => eprintln!("\n  -> Interpolated: {}", text),
            Ok(None) => eprintln!("\n  -> Could not interpolate: a referenced value is missing"),
            Err(e) => exit_with_error(&format!("Interpolation failed: {}", e)),
        }
    }

    // --- 5. Summary ---
    let total_duration = total_start.elapsed();
    eprintln!("\n--- Screen Summary ---");
    eprintln!("Screen:               {}", screen.screen_id);
    eprintln!("Document Nodes:       {}", experience.nodes().len());
    eprintln!("Transformed Nodes:    {}", screen.len());
    eprintln!("Collection Replicas:  {}", screen.collection_node_ids().len());

    eprintln!("\n--- Performance Summary ---");
    eprintln!("File Loading:         {:?}", load_duration);
    eprintln!("Transformation:       {:?}", transform_duration);
    eprintln!("-----------------------------");
    eprintln!("Total Execution:      {:?}", total_duration);
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
