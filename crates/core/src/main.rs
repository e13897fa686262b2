use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use env_logger::Builder;
use log::LevelFilter;
use std::path::PathBuf;
use std::time::Instant;

use jitlens::{
    analyze_model, consts::{REPORT_JSON_FILE, REPORT_TEXT_FILE}, load_model, models::AnalysisConfig, ProgramModel,
    render_listing, write_results, AnalysisResult,
};

#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Path to the JSON model snapshot
    #[clap(short = 'f', long)]
    file: PathBuf,
    /// Output directory for the report files (defaults to ./jitlens-out)
    #[clap(short, long, default_value = "./jitlens-out")]
    output: PathBuf,
    /// Confirm calls through the class hierarchy when no marker is present
    #[clap(long)]
    hierarchy: bool,
    /// Extra comment text counted as optimization evidence (repeatable)
    #[clap(short = 'm', long = "marker")]
    markers: Vec<String>,
    /// Print the assembly listing of methods whose name contains this text
    #[clap(short = 'l', long)]
    listing: Option<String>,
    /// Enable verbose logging (use multiple times for more verbosity)
    #[clap(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let args = Args::parse();

    let mut builder = Builder::new();
    let log_level = match args.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    builder
        .filter_level(log_level)
        .format_timestamp(None)
        .init();

    let start_time = Instant::now();

    if let Err(e) = run(&args) {
        eprintln!("{} {:#}", "Error:".bright_red().bold(), e);
        std::process::exit(1);
    }

    let duration = start_time.elapsed();
    println!(
        "\n{} {:.2?}",
        "Total execution time:".bright_yellow().bold(),
        duration
    );
}

fn run(args: &Args) -> Result<()> {
    let config = AnalysisConfig {
        extra_markers: args.markers.clone(),
        use_type_hierarchy: args.hierarchy,
    };

    let model = load_model(&args.file)
        .with_context(|| format!("Failed to load snapshot {}", args.file.display()))?;

    if let Some(filter) = &args.listing {
        print_listings(&model, filter);
    }

    let result = analyze_model(&model, Some(config)).context("Analysis failed")?;
    print_summary(&result);

    write_results(&result, &args.output)
        .with_context(|| format!("Failed to write results to {}", args.output.display()))?;

    println!("\n{}", "Results written to:".bright_green().bold());
    println!("- {}", args.output.join(REPORT_JSON_FILE).display());
    println!("- {}", args.output.join(REPORT_TEXT_FILE).display());

    Ok(())
}

fn print_listings(model: &ProgramModel, filter: &str) {
    let methods = model.find_methods(filter);
    if methods.is_empty() {
        println!("{}", format!("No methods match '{}'", filter).bright_yellow().italic());
        return;
    }

    for method in methods {
        println!(
            "{}",
            format!(
                "\n=================== {} ===================",
                format!(" {} ", method.member).bright_white().on_bright_blue().italic()
            )
            .bright_blue()
            .bold()
        );
        if method.is_compiled() {
            println!("{}", render_listing(&method.instructions));
        } else {
            println!("{}", "  (no native code)".bright_black().italic());
        }
    }
}

fn print_summary(result: &AnalysisResult) {
    let stats = &result.stats;

    println!(
        "{}",
        format!(
            "\n==================== {} ====================",
            " STATS ".bright_white().on_bright_black().italic()
        )
        .bright_black()
        .bold()
    );
    println!(
        "{} {}",
        "Compiled methods visited:".bright_black().bold(),
        stats.methods_visited
    );
    println!(
        "{} {}",
        "Call sites examined:".bright_black().bold(),
        stats.call_sites_examined
    );
    println!(
        "{} {}",
        "Virtual/interface call sites:".bright_black().bold(),
        stats.dispatched_call_sites
    );
    println!(
        "{} {}",
        "Hierarchy confirmation:".bright_black().bold(),
        if result.hierarchy_used { "on" } else { "off" }
    );
    println!(
        "{}",
        "================================================="
            .bright_black()
            .bold()
    );

    println!(
        "\n{} {}",
        format!("Found {} optimized virtual calls:", result.report.len())
            .bright_green()
            .bold(),
        ""
    );
    for call in &result.report {
        println!(
            "- {}@{} {} {} {}",
            call.calling_member(),
            call.bytecode_offset(),
            format!("[{}]", call.original_call_kind().opcode()).on_bright_cyan().bold(),
            call.target(),
            format!("({})", call.resolution_evidence()).bright_black().italic()
        );
    }
}
