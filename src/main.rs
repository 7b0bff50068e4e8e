mod logging;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use logging::LogLevel;
use rbx_transpiler::{GenerateOptions, ParseError, Pipeline, parse, tokenize};
use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::time::Instant;
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "rbx")]
#[command(about = "Rbx - JSX-style templates compiled to Ruby")]
struct Cli {
    /// Verbosity of diagnostic logging
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Warn)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Input {
    /// Path to .rbx file (or directory, for compile)
    #[arg(required_unless_present = "stdin")]
    path: Option<PathBuf>,

    /// Read from stdin
    #[arg(long)]
    stdin: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile .rbx files to Ruby
    Compile {
        #[command(flatten)]
        input: Input,

        /// Emit the code and template metadata as JSON: printed for
        /// --stdin, written next to each .rb file otherwise
        #[arg(long)]
        json: bool,

        /// Prepend a definition of the buffer class
        #[arg(long)]
        prelude: bool,

        /// Class instantiated for output buffers
        #[arg(long, default_value = "OutputBuffer")]
        buffer_class: String,

        /// Receiver of tag calls
        #[arg(long, default_value = "tag")]
        tag_helper: String,
    },
    /// Print the token stream as JSON
    Tokens {
        #[command(flatten)]
        input: Input,
    },
    /// Print the syntax tree as JSON
    Ast {
        #[command(flatten)]
        input: Input,
    },
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.log_level);

    if let Err(err) = run(cli.command) {
        eprintln!("error: {:#}", err);
        std::process::exit(1);
    }
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Compile {
            input,
            json,
            prelude,
            buffer_class,
            tag_helper,
        } => {
            let options = GenerateOptions {
                buffer_class,
                tag_helper,
                prelude,
            };
            if input.stdin {
                compile_stdin(&options, json)
            } else if let Some(path) = input.path {
                compile_path(&path, &options, json)
            } else {
                bail!("provide a file/directory or use --stdin")
            }
        }
        Commands::Tokens { input } => {
            let (source, name) = read_input(&input)?;
            let tokens = tokenize(&source).map_err(|err| report(&err, &source, &name))?;
            println!("{}", serde_json::to_string_pretty(&tokens)?);
            Ok(())
        }
        Commands::Ast { input } => {
            let (source, name) = read_input(&input)?;
            let template = tokenize(&source)
                .and_then(parse)
                .map_err(|err| report(&err, &source, &name))?;
            println!("{}", serde_json::to_string_pretty(&template)?);
            Ok(())
        }
    }
}

fn read_input(input: &Input) -> Result<(String, String)> {
    if input.stdin {
        let mut source = String::new();
        io::stdin()
            .read_to_string(&mut source)
            .context("failed to read stdin")?;
        return Ok((source, "<stdin>".to_string()));
    }

    let Some(path) = &input.path else {
        bail!("provide a file or use --stdin");
    };
    let source = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok((source, path.display().to_string()))
}

/// Print a rendered compile error and turn it into a short summary error
fn report(err: &ParseError, source: &str, filename: &str) -> anyhow::Error {
    if io::stderr().is_terminal() {
        eprint!("{}", err.render_color(source, filename));
    } else {
        eprint!("{}", err.render(source, filename));
    }
    anyhow::anyhow!("could not compile {}", filename)
}

fn compile_stdin(options: &GenerateOptions, json_output: bool) -> Result<()> {
    let mut source = String::new();
    io::stdin()
        .read_to_string(&mut source)
        .context("failed to read stdin")?;

    let mut pipeline = Pipeline::standard();
    let result = pipeline
        .compile(&source, options)
        .map_err(|err| report(&err, &source, "<stdin>"))?;

    if json_output {
        println!("{}", serde_json::to_string(&result)?);
    } else {
        print!("{}", result.code);
    }
    Ok(())
}

fn compile_path(path: &Path, options: &GenerateOptions, json_output: bool) -> Result<()> {
    let start = Instant::now();

    if path.is_file() {
        if path.extension().is_none_or(|ext| ext != "rbx") {
            bail!("{} is not a .rbx file", path.display());
        }
        compile_file(path, options, json_output)?;
        print_summary(1, start.elapsed());
        return Ok(());
    }

    if !path.is_dir() {
        bail!("{} does not exist", path.display());
    }

    let mut compiled = 0;
    let mut failed = 0;
    for entry in WalkDir::new(path)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "rbx"))
    {
        match compile_file(entry.path(), options, json_output) {
            Ok(()) => compiled += 1,
            Err(err) => {
                log::error!("{:#}", err);
                failed += 1;
            }
        }
    }

    if compiled + failed == 0 {
        bail!("no .rbx files found in {}", path.display());
    }
    print_summary(compiled, start.elapsed());
    if failed > 0 {
        bail!("{} of {} templates failed to compile", failed, compiled + failed);
    }
    Ok(())
}

fn compile_file(path: &Path, options: &GenerateOptions, json_output: bool) -> Result<()> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let filename = path.display().to_string();

    let mut pipeline = Pipeline::standard();
    let result = pipeline
        .compile(&source, options)
        .map_err(|err| report(&err, &source, &filename))?;

    let output = path.with_extension("rb");
    fs::write(&output, &result.code)
        .with_context(|| format!("failed to write {}", output.display()))?;
    if json_output {
        let sidecar = path.with_extension("json");
        fs::write(&sidecar, serde_json::to_string(&result)?)
            .with_context(|| format!("failed to write {}", sidecar.display()))?;
    }
    log::debug!(
        "{}: {} components, {} elements",
        filename,
        result.metadata.components.len(),
        result.metadata.elements.len()
    );
    print_generated(&output.display().to_string());
    Ok(())
}

fn print_generated(path: &str) {
    if io::stderr().is_terminal() {
        eprintln!("  \x1b[32m✓\x1b[0m {}", path);
    } else {
        eprintln!("  ✓ {}", path);
    }
}

fn print_summary(count: usize, elapsed: std::time::Duration) {
    let time_str = format_duration(elapsed);
    let files_word = if count == 1 { "file" } else { "files" };

    if io::stderr().is_terminal() {
        eprintln!("\n\x1b[1mCompiled {} {} in {}\x1b[0m", count, files_word, time_str);
    } else {
        eprintln!("\nCompiled {} {} in {}", count, files_word, time_str);
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let micros = d.as_micros();
    if micros < 1000 {
        format!("{}μs", micros)
    } else if micros < 1_000_000 {
        format!("{:.1}ms", micros as f64 / 1000.0)
    } else {
        format!("{:.2}s", d.as_secs_f64())
    }
}
