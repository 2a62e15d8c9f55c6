use clap::{Parser, Subcommand};
use sg_app::{
    AppResult, RunOptions, RunProgressEvent, RunRequest, RunStage, project_service, query,
    run_service,
};
use sg_results::{Component, ComponentStatus, RunManifest};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "stormgap")]
#[command(about = "Stormgap - stormwater infrastructure gap analysis", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a project file and print its contents
    Validate {
        /// Path to the project YAML or JSON file
        project_path: PathBuf,
    },
    /// Run the analysis (or load the cached result)
    Run {
        /// Path to the project YAML or JSON file
        project_path: PathBuf,
        /// Skip cache and force re-run
        #[arg(long)]
        no_cache: bool,
    },
    /// List stored runs for a project
    Runs {
        /// Path to the project YAML or JSON file
        project_path: PathBuf,
    },
    /// Print the summary report of a stored run
    ShowRun {
        /// Path to the project YAML or JSON file
        project_path: PathBuf,
        /// Run ID or a unique prefix of it
        run_id: String,
        /// Also list the top segments by this column (e.g. gap_index)
        #[arg(long)]
        top: Option<String>,
        /// Number of segments for --top
        #[arg(short = 'k', long, default_value_t = 10)]
        count: usize,
    },
    /// Export the segment result table as CSV
    ExportTable {
        /// Path to the project YAML or JSON file
        project_path: PathBuf,
        /// Run ID or a unique prefix of it
        run_id: String,
        /// Output CSV file path (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> AppResult<()> {
    // Logs go to stderr so CSV on stdout stays clean
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { project_path } => cmd_validate(&project_path),
        Commands::Run {
            project_path,
            no_cache,
        } => cmd_run(&project_path, !no_cache),
        Commands::Runs { project_path } => cmd_runs(&project_path),
        Commands::ShowRun {
            project_path,
            run_id,
            top,
            count,
        } => cmd_show_run(&project_path, &run_id, top.as_deref(), count),
        Commands::ExportTable {
            project_path,
            run_id,
            output,
        } => cmd_export_table(&project_path, &run_id, output.as_deref()),
    }
}

fn cmd_validate(project_path: &Path) -> AppResult<()> {
    println!("Validating project: {}", project_path.display());
    let project = project_service::load_project(project_path)?;
    project_service::validate_project(&project)?;
    let summary = project_service::summarize_project(&project);

    println!("✓ Project is valid");
    println!("  Name: {} (schema v{})", summary.name, summary.version);
    println!(
        "  Segments: {} ({:.2} acres)",
        summary.segment_count, summary.total_area_acres
    );
    println!(
        "  Facilities: {} ({} pre-assigned)",
        summary.facility_count, summary.preassigned_facilities
    );
    if summary.incomplete_segments > 0 {
        println!(
            "  Segments with missing attributes: {} (defaults will apply)",
            summary.incomplete_segments
        );
    }
    println!("  Storms: {}", summary.storm_labels.join(", "));
    Ok(())
}

fn cmd_run(project_path: &Path, use_cache: bool) -> AppResult<()> {
    println!("Running analysis: {}", project_path.display());

    let request = RunRequest {
        project_path,
        options: RunOptions {
            use_cache,
            ..RunOptions::default()
        },
    };

    let mut last_emit = Instant::now();
    let mut last_stage: Option<RunStage> = None;
    let response = run_service::ensure_run_with_progress(
        &request,
        Some(&mut |event: RunProgressEvent| {
            let emit_now =
                last_stage != Some(event.stage) || last_emit.elapsed().as_millis() >= 100;
            if emit_now {
                render_cli_progress(&event);
                last_stage = Some(event.stage);
                last_emit = Instant::now();
            }
        }),
    )?;
    clear_progress_line();

    if response.loaded_from_cache {
        println!("✓ Loaded from cache: {}", response.run_id);
    } else {
        println!("✓ Analysis completed: {}", response.run_id);
    }

    print_components(&response.manifest);
    print_timing_summary(&response.timing);
    Ok(())
}

fn clear_progress_line() {
    print!("\r{}\r", " ".repeat(100));
    let _ = io::stdout().flush();
}

fn render_cli_progress(event: &RunProgressEvent) {
    let spinner = ['|', '/', '-', '\\'];
    let spin_idx = ((event.elapsed_wall_s * 10.0) as usize) % spinner.len();
    let mut line = format!(
        "\r{} {:?}  elapsed={:.2}s",
        spinner[spin_idx], event.stage, event.elapsed_wall_s
    );
    if let Some(msg) = &event.message {
        line.push_str(&format!("  {}", msg));
    }
    print!("{}", line);
    let _ = io::stdout().flush();
}

fn print_components(manifest: &RunManifest) {
    println!("\nComponents:");
    for component in Component::ALL {
        match manifest.status(component) {
            Some(ComponentStatus::Succeeded) => println!("  {:<14} ok", component.as_str()),
            Some(ComponentStatus::Skipped { reason, detail }) => {
                println!("  {:<14} skipped [{}] {}", component.as_str(), reason, detail)
            }
            None => println!("  {:<14} not run", component.as_str()),
        }
    }
}

fn print_timing_summary(timing: &sg_app::RunTimingSummary) {
    let total = timing.total_time_s.max(1.0e-12);
    let compile_pct = 100.0 * timing.compile_time_s / total;
    let analysis_pct = 100.0 * timing.analysis_time_s / total;
    let save_pct = 100.0 * timing.save_time_s / total;

    println!("\nTiming summary:");
    println!(
        "  Compile:  {:.3}s ({:.1}%)",
        timing.compile_time_s, compile_pct
    );
    println!(
        "  Analysis: {:.3}s ({:.1}%)",
        timing.analysis_time_s, analysis_pct
    );
    println!("  Save:     {:.3}s ({:.1}%)", timing.save_time_s, save_pct);
    if timing.load_cache_time_s > 0.0 {
        println!("  Cache load: {:.3}s", timing.load_cache_time_s);
    }
    println!("  Total:    {:.3}s", timing.total_time_s);
}

fn cmd_runs(project_path: &Path) -> AppResult<()> {
    let runs = run_service::list_runs(project_path)?;

    if runs.is_empty() {
        println!("No stored runs for {}", project_path.display());
    } else {
        println!("Stored runs (most recent first):");
        for manifest in runs {
            let skipped = manifest
                .components
                .iter()
                .filter(|c| !c.status.succeeded())
                .count();
            println!(
                "  {} ({}, engine {}, {} segments, {} skipped)",
                &manifest.run_id[..12.min(manifest.run_id.len())],
                manifest.timestamp,
                manifest.engine_version,
                manifest.segment_count,
                skipped
            );
        }
    }
    Ok(())
}

fn cmd_show_run(
    project_path: &Path,
    run_id: &str,
    top: Option<&str>,
    count: usize,
) -> AppResult<()> {
    let run_id = run_service::resolve_run_id(project_path, run_id)?;
    tracing::debug!(run_id = %run_id, "showing run");
    let (manifest, summary, records) = run_service::load_run(project_path, &run_id)?;

    print!("{}", sg_results::render_report(&manifest, &summary));

    if let Some(column) = top {
        println!("\nTop {} segments by {}:", count, column);
        for (segment_id, value) in query::top_segments(&records, column, count)? {
            println!("  {:<12} {:.3}", segment_id, value);
        }
    }
    Ok(())
}

fn cmd_export_table(project_path: &Path, run_id: &str, output: Option<&Path>) -> AppResult<()> {
    let run_id = run_service::resolve_run_id(project_path, run_id)?;
    let (_manifest, _summary, records) = run_service::load_run(project_path, &run_id)?;

    let csv = sg_results::segments_to_csv(&records);

    if let Some(path) = output {
        std::fs::write(path, csv)?;
        println!(
            "✓ Exported {} segments to {}",
            records.len(),
            path.display()
        );
    } else {
        print!("{}", csv);
    }

    Ok(())
}
