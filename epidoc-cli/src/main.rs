//! Command-line interface for the commentary-to-EpiDoc converter.
//!
//! Usage:
//!   epidoc `<path>` [--output `<dir>`] [--template `<file>`]   - Convert one file or a directory
//!
//! A directory input converts every `.txt` file in it; a file that fails
//! conversion is reported and skipped, the remaining files are still
//! processed, and the exit code is nonzero.

use clap::{Arg, ArgAction, Command};
use epidoc_parser::commentary::{process_text, Reporter, Severity, XmlConfig};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Fallback template when no `--template` is given.
const DEFAULT_TEMPLATE: &str = include_str!("../templates/xml_template.xml");

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let matches = Command::new("epidoc")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Convert annotated commentary text files to TEI/EpiDoc XML")
        .arg_required_else_help(true)
        .arg(
            Arg::new("path")
                .help("Commentary text file, or a directory of .txt files")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("template")
                .long("template")
                .short('t')
                .help("Main-document template containing an #INSERT# line"),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .short('o')
                .help("Directory the XML files are written to")
                .default_value("XML"),
        )
        .arg(
            Arg::new("offset-depth")
                .long("offset-depth")
                .help("Indentation depth of the spliced body inside the template")
                .value_parser(clap::value_parser!(usize))
                .default_value("3"),
        )
        .arg(
            Arg::new("offset-size")
                .long("offset-size")
                .help("Spaces per indentation level")
                .value_parser(clap::value_parser!(usize))
                .default_value("4"),
        )
        .arg(
            Arg::new("report-json")
                .long("report-json")
                .help("Also write per-file diagnostics as <name>_report.json")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let path = matches.get_one::<String>("path").expect("path is required");
    let output = matches.get_one::<String>("output").expect("has a default");
    let config = XmlConfig {
        offset_depth: *matches.get_one::<usize>("offset-depth").expect("has a default"),
        offset_size: *matches.get_one::<usize>("offset-size").expect("has a default"),
    };
    let report_json = matches.get_flag("report-json");

    let template = match matches.get_one::<String>("template") {
        Some(template_path) => match fs::read_to_string(template_path) {
            Ok(template) => template,
            Err(e) => {
                error!("cannot read template {}: {}", template_path, e);
                std::process::exit(1);
            }
        },
        None => DEFAULT_TEMPLATE.to_string(),
    };

    let inputs = match collect_inputs(Path::new(path)) {
        Ok(inputs) => inputs,
        Err(message) => {
            error!("{}", message);
            std::process::exit(1);
        }
    };

    let output_dir = Path::new(output);
    if let Err(e) = fs::create_dir_all(output_dir) {
        error!("cannot create output directory {}: {}", output_dir.display(), e);
        std::process::exit(1);
    }

    let mut failures = 0usize;
    for input in &inputs {
        if !convert_file(input, &template, output_dir, &config, report_json) {
            failures += 1;
        }
    }

    if failures > 0 {
        error!("{} of {} file(s) failed", failures, inputs.len());
        std::process::exit(1);
    }
}

/// Resolve the input path to the list of files to convert. A directory
/// yields its `.txt` files in name order.
fn collect_inputs(path: &Path) -> Result<Vec<PathBuf>, String> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        return Err(format!("no such file or directory: {}", path.display()));
    }
    let entries =
        fs::read_dir(path).map_err(|e| format!("cannot read directory {}: {}", path.display(), e))?;
    let mut inputs: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "txt"))
        .collect();
    inputs.sort();
    if inputs.is_empty() {
        return Err(format!("no .txt files in {}", path.display()));
    }
    Ok(inputs)
}

/// Convert one file; returns `false` on failure. All diagnostics are
/// surfaced, whether or not the conversion succeeds.
fn convert_file(
    input: &Path,
    template: &str,
    output_dir: &Path,
    config: &XmlConfig,
    report_json: bool,
) -> bool {
    let name = input.display().to_string();
    let stem = match input.file_stem().and_then(|stem| stem.to_str()) {
        Some(stem) => stem.to_string(),
        None => {
            error!("{}: file name is not valid UTF-8", name);
            return false;
        }
    };

    let text = match fs::read_to_string(input) {
        Ok(text) => text,
        Err(e) => {
            error!("{}: cannot read file: {}", name, e);
            return false;
        }
    };

    info!("converting {}", name);
    let mut reporter = Reporter::new();
    let result = process_text(&name, &text, template, config, &mut reporter);

    for diagnostic in reporter.diagnostics() {
        match diagnostic.severity {
            Severity::Info => info!("{}: {}", name, diagnostic),
            Severity::Warning => warn!("{}: {}", name, diagnostic),
            Severity::Error => error!("{}: {}", name, diagnostic),
        }
    }
    if report_json {
        let report_path = output_dir.join(format!("{}_report.json", stem));
        if let Err(e) = fs::write(&report_path, reporter.to_json()) {
            error!("{}: cannot write {}: {}", name, report_path.display(), e);
            return false;
        }
    }

    let output = match result {
        Ok(output) => output,
        Err(e) => {
            error!("{}: {}", name, e);
            return false;
        }
    };

    let main_path = output_dir.join(format!("{}_main.xml", stem));
    let app_path = output_dir.join(format!("{}_app.xml", stem));
    for (path, content) in [(&main_path, &output.main_xml), (&app_path, &output.app_xml)] {
        if let Err(e) = fs::write(path, content) {
            error!("{}: cannot write {}: {}", name, path.display(), e);
            return false;
        }
    }
    info!(
        "{}: wrote {} and {}",
        name,
        main_path.display(),
        app_path.display()
    );
    true
}
