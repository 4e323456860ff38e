use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use sprite_recolor_wasm::{EditorConfig, EditorSession};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Inspect and recolor the exact palette of pixel-art images.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// JSON editor configuration; defaults are used when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the sorted palette of an image
    Palette {
        input: PathBuf,

        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Replace exact colors and save the result at the original size
    Recolor {
        input: PathBuf,

        /// OLD=NEW hex pairs, applied in order (e.g. --map "#ff0000=#000000")
        #[arg(short, long = "map", value_name = "OLD=NEW", required = true)]
        mappings: Vec<String>,

        /// Output PNG path
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Center an image on a transparent canvas of the given size
    Fit {
        input: PathBuf,

        #[arg(long, default_value_t = 500)]
        width: u32,

        #[arg(long, default_value_t = 500)]
        height: u32,

        /// Output PNG path
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn split_mapping(mapping: &str) -> Result<(&str, &str)> {
    match mapping.split_once('=') {
        Some((old, new)) if !old.trim().is_empty() && !new.trim().is_empty() => {
            Ok((old.trim(), new.trim()))
        }
        _ => bail!("mapping {mapping:?} is not of the form OLD=NEW"),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => EditorConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EditorConfig::default(),
    };

    match args.command {
        Command::Palette { input, json } => {
            let mut session = EditorSession::open_image(&input, config)
                .with_context(|| format!("opening {}", input.display()))?;
            let swatches = session.swatches();
            if json {
                println!("{}", serde_json::to_string_pretty(&swatches)?);
            } else {
                for s in &swatches {
                    println!(
                        "{}  {:>6.2}%  H:{:<5} S:{:<5} L:{:<5} text:{}",
                        s.hex,
                        s.percentage,
                        s.hue,
                        s.saturation,
                        s.lightness,
                        s.text_color.as_str()
                    );
                }
            }
        }
        Command::Recolor {
            input,
            mappings,
            output,
        } => {
            // parse everything before opening so a typo fails fast
            let pairs = mappings
                .iter()
                .map(|m| split_mapping(m))
                .collect::<Result<Vec<_>>>()?;

            let mut session = EditorSession::open_image(&input, config)
                .with_context(|| format!("opening {}", input.display()))?;
            for (old, new) in pairs {
                let changed = session
                    .apply_recolor(old, new)
                    .with_context(|| format!("recoloring {old} -> {new}"))?;
                println!("{old} -> {new}: {changed} pixels");
            }

            if let Some(parent) = output.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            session.export_image(&output).context("export failed")?;
            println!("Saved → {}", output.display());
        }
        Command::Fit {
            input,
            width,
            height,
            output,
        } => {
            let config = EditorConfig {
                display_width: width,
                display_height: height,
                fit_to_display: true,
                ..config
            };
            let session = EditorSession::open_image(&input, config)
                .with_context(|| format!("opening {}", input.display()))?;
            session
                .working()
                .save_with_format(&output, image::ImageFormat::Png)
                .with_context(|| format!("writing {}", output.display()))?;
            println!("Saved → {}", output.display());
        }
    }

    Ok(())
}
