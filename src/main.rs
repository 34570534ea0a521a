use clap::{Parser, Subcommand};
use edito::config::{self, EditorConfig};
use edito::imaging::{
    BackendError, EncodedResult, Quality, RustBackend, SearchOutcome, load_image,
    target_bytes_from_kb,
};
use edito::naming;
use edito::output;
use edito::session::{EditSession, Editor, EditorEvent, ParameterChange};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};

/// Edits applied to the loaded image, in the order listed here.
#[derive(clap::Args, Clone)]
struct EditArgs {
    /// Lock the aspect ratio before resizing
    #[arg(long)]
    keep_ratio: bool,

    /// Brightness percent (0-200, 100 = unchanged)
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..=200))]
    brightness: Option<u32>,

    /// Saturation percent (0-200, 100 = unchanged)
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..=200))]
    saturation: Option<u32>,

    /// Inversion percent (0-100)
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..=100))]
    invert: Option<u32>,

    /// Grayscale percent (0-100)
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..=100))]
    grayscale: Option<u32>,

    /// Rotation in degrees, clockwise; a multiple of 90
    #[arg(long, allow_negative_numbers = true, value_parser = parse_rotation)]
    rotate: Option<i32>,

    /// Mirror left to right
    #[arg(long)]
    flip_h: bool,

    /// Mirror top to bottom
    #[arg(long)]
    flip_v: bool,

    /// Output width in pixels
    #[arg(long)]
    width: Option<u32>,

    /// Output height in pixels
    #[arg(long)]
    height: Option<u32>,

    /// Quality percent (1-100, 100 = lossless PNG)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=100))]
    quality: Option<u32>,

    /// Raw edit event, e.g. `rotate=left` or `width=` (repeatable, applied last)
    #[arg(long = "set", value_name = "FIELD=VALUE")]
    set: Vec<ParameterChange>,
}

impl EditArgs {
    fn changes(&self) -> Vec<ParameterChange> {
        let mut changes = Vec::new();
        if self.keep_ratio {
            changes.push(ParameterChange::AspectLock(true));
        }
        changes.extend(self.brightness.map(ParameterChange::Brightness));
        changes.extend(self.saturation.map(ParameterChange::Saturation));
        changes.extend(self.invert.map(ParameterChange::Inversion));
        changes.extend(self.grayscale.map(ParameterChange::Grayscale));
        changes.extend(self.rotate.map(ParameterChange::RotateBy));
        if self.flip_h {
            changes.push(ParameterChange::FlipHorizontal);
        }
        if self.flip_v {
            changes.push(ParameterChange::FlipVertical);
        }
        changes.extend(self.width.map(|w| ParameterChange::Width(Some(w))));
        changes.extend(self.height.map(|h| ParameterChange::Height(Some(h))));
        changes.extend(self.quality.map(|q| ParameterChange::Quality(Quality::new(q))));
        changes.extend(self.set.iter().copied());
        changes
    }
}

fn parse_rotation(value: &str) -> Result<i32, String> {
    let degrees: i32 = value
        .parse()
        .map_err(|_| format!("'{value}' is not a whole number of degrees"))?;
    if degrees % 90 != 0 {
        return Err(format!("{degrees} is not a multiple of 90"));
    }
    Ok(degrees)
}

#[derive(Parser)]
#[command(name = "edito")]
#[command(about = "Rotate, flip, color-adjust and resize an image, then encode it to a size budget")]
#[command(long_about = "\
Rotate, flip, color-adjust and resize an image, then encode it to a size budget

Every edit re-encodes the image and reports the exact file size. Quality
1-99 writes JPEG; quality 100 writes lossless PNG.

Examples:

  edito size photo.jpg --rotate 90 --grayscale 100
  edito fit photo.jpg --target-kb 200 --keep-ratio --width 1200
  edito export photo.jpg --target-kb 200 --output-dir out/
  edito size photo.jpg --set rotate=left --set flip=horizontal

Raw events (--set FIELD=VALUE):
  brightness=N  saturation=N  invert=N  grayscale=N
  rotate=left|right|DEG  flip=horizontal|vertical
  width=N|''  height=N|''  ratio=on|off  quality=N|0.NN  reset

Run 'edito gen-config' to generate a documented edito.toml.")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ./edito.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args)]
struct SizeArgs {
    /// Source image (JPEG, PNG, TIFF or WebP)
    input: PathBuf,

    #[command(flatten)]
    edits: EditArgs,

    /// Print a JSON report instead of text
    #[arg(long)]
    json: bool,
}

#[derive(clap::Args)]
struct FitArgs {
    /// Source image (JPEG, PNG, TIFF or WebP)
    input: PathBuf,

    /// Size budget in kilobytes (1 KB = 1024 bytes)
    #[arg(long)]
    target_kb: u64,

    #[command(flatten)]
    edits: EditArgs,

    /// Print a JSON report instead of text
    #[arg(long)]
    json: bool,
}

#[derive(clap::Args)]
struct ExportArgs {
    /// Source image (JPEG, PNG, TIFF or WebP)
    input: PathBuf,

    /// Fit to this many kilobytes before exporting
    #[arg(long)]
    target_kb: Option<u64>,

    /// Directory to write into (overrides export.output_dir)
    #[arg(long)]
    output_dir: Option<PathBuf>,

    #[command(flatten)]
    edits: EditArgs,
}

#[derive(Subcommand)]
enum Command {
    /// Apply edits and print the encoded size
    Size(SizeArgs),
    /// Find the highest quality that fits a size budget
    Fit(FitArgs),
    /// Apply edits and write the encoded file
    Export(ExportArgs),
    /// Print a stock edito.toml with all options documented
    GenConfig,
}

#[derive(Serialize)]
struct SizeReport<'a> {
    input: &'a Path,
    session: EditSession,
    result: EncodedResult,
}

#[derive(Serialize)]
struct FitReport<'a> {
    input: &'a Path,
    target_kb: u64,
    outcome: SearchOutcome,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let config = match &cli.config {
        Some(path) if !path.exists() => {
            return Err(format!("config file not found: {}", path.display()).into());
        }
        Some(path) => config::load_config_file(path)?,
        None => config::load_config(Path::new("."))?,
    };
    init_thread_pool(&config.processing);

    match cli.command {
        Command::Size(args) => {
            let (events, printer) = spawn_printer(!args.json).unzip();
            let mut editor = open_editor(&args.input, &config, events)?;
            for change in args.edits.changes() {
                editor.dispatch(change)?;
            }
            let result = editor.measure()?;
            let session = *editor.session();
            drop(editor);
            join_printer(printer);

            if args.json {
                let report = SizeReport {
                    input: &args.input,
                    session,
                    result,
                };
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                output::print_session(&session, &result);
            }
        }
        Command::Fit(args) => {
            let (events, printer) = spawn_printer(!args.json).unzip();
            let mut editor = open_editor(&args.input, &config, events)?;
            for change in args.edits.changes() {
                editor.dispatch(change)?;
            }
            let outcome = editor.fit_to_target(target_bytes_from_kb(args.target_kb))?;
            drop(editor);
            join_printer(printer);

            if args.json {
                let report = FitReport {
                    input: &args.input,
                    target_kb: args.target_kb,
                    outcome,
                };
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
        }
        Command::Export(args) => {
            let (events, printer) = spawn_printer(true).unzip();
            let mut editor = open_editor(&args.input, &config, events)?;
            for change in args.edits.changes() {
                editor.dispatch(change)?;
            }
            if let Some(kb) = args.target_kb {
                editor.fit_to_target(target_bytes_from_kb(kb))?;
            }
            let artifact = editor.export(naming::timestamp_millis())?;
            drop(editor);
            join_printer(printer);

            let dir = args.output_dir.unwrap_or(config.export.output_dir);
            std::fs::create_dir_all(&dir)?;
            let path = dir.join(&artifact.filename);
            std::fs::write(&path, &artifact.bytes)?;
            output::print_written(&path);
        }
        Command::GenConfig => {}
    }

    Ok(())
}

fn open_editor(
    input: &Path,
    config: &EditorConfig,
    events: Option<Sender<EditorEvent>>,
) -> Result<Editor<RustBackend>, BackendError> {
    let source = load_image(input)?;
    let editor = Editor::new(RustBackend::new(), source, config);
    Ok(match events {
        Some(tx) => editor.with_events(tx),
        None => editor,
    })
}

/// Print editor events on a background thread while the editor works.
fn spawn_printer(enabled: bool) -> Option<(Sender<EditorEvent>, JoinHandle<()>)> {
    if !enabled {
        return None;
    }
    let (tx, rx) = mpsc::channel();
    let printer = thread::spawn(move || {
        for event in rx {
            output::print_editor_event(&event);
        }
    });
    Some((tx, printer))
}

fn join_printer(printer: Option<JoinHandle<()>>) {
    if let Some(printer) = printer {
        printer.join().ok();
    }
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores: the user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
