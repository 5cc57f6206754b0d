//! Command implementations

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Args;
use nether_sav::{SaveGame, TracingProgress, decode_save};

use crate::settings::{CliConfig, CodecOverrides};

#[derive(Args)]
pub struct InspectArgs {
    /// Save file to read
    pub file: PathBuf,
}

#[derive(Args)]
pub struct DumpArgs {
    /// Save file to read
    pub file: PathBuf,

    /// pathName of the object to print
    pub path_name: String,
}

#[derive(Args)]
pub struct RoundtripArgs {
    /// Save file to read
    pub input: PathBuf,

    /// Where to write the re-encoded save
    pub output: PathBuf,

    /// Decode the output again and compare it with the input graph
    #[arg(long)]
    pub verify: bool,

    #[command(flatten)]
    pub codec: CodecOverrides,
}

fn open(path: &Path) -> Result<SaveGame> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    decode_save(BufReader::new(file)).with_context(|| format!("Failed to decode {}", path.display()))
}

pub fn inspect(args: InspectArgs) -> Result<()> {
    let game = open(&args.file)?;
    let header = &game.header;

    println!("=== {} ===", args.file.display());
    println!("  Session:        {}", header.session_name);
    println!("  Map:            {} {}", header.map_name, header.map_options);
    println!(
        "  Versions:       header {}, save {}, build {}",
        header.save_header_type, header.save_version, header.build_version
    );
    println!("  Play time:      {}s", header.play_duration_seconds);
    if header.has_mod_metadata() {
        println!("  Modded:         {}", header.is_modded_save != 0);
    }
    if header.has_save_identifier() {
        println!("  Identifier:     {}", header.save_identifier);
    }
    println!("  Chunks:         {}", game.chunk_count);
    println!("  Objects:        {}", game.index.len());
    println!();

    for level in &game.levels {
        println!(
            "  {:<32} {:>8} objects {:>6} collectables",
            level.name.as_deref().unwrap_or("<persistent>"),
            level.object_keys.len(),
            level.collectables.len()
        );
    }
    Ok(())
}

pub fn dump(args: DumpArgs) -> Result<()> {
    let game = open(&args.file)?;
    let Some(object) = game.index.lookup(&args.path_name) else {
        bail!("No object '{}' in {}", args.path_name, args.file.display());
    };
    let json = serde_json::to_string_pretty(object).context("Failed to serialize object")?;
    println!("{json}");
    Ok(())
}

pub fn roundtrip(args: RoundtripArgs, config: &CliConfig) -> Result<()> {
    let codec = args.codec.apply(config.codec.clone());
    codec.validate().context("Invalid codec settings")?;

    let game = open(&args.input)?;
    tracing::info!(
        objects = game.index.len(),
        levels = game.levels.len(),
        "decoded {}",
        args.input.display()
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .context("Failed to create runtime")?;
    let mut progress = TracingProgress::default();
    let bytes = runtime
        .block_on(game.encode(codec, &mut progress))
        .context("Failed to encode save")?;

    std::fs::write(&args.output, &bytes)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;
    println!("Wrote {} ({} bytes)", args.output.display(), bytes.len());

    if args.verify {
        let reread = open(&args.output)?;
        let same = reread.header == game.header
            && reread.levels == game.levels
            && reread.index.iter().eq(game.index.iter());
        if !same {
            bail!("Re-encoded save does not decode to the same object graph");
        }
        println!("Verified {} objects", reread.index.len());
    }
    Ok(())
}

pub fn print_config(overrides: CodecOverrides, config: &CliConfig) -> Result<()> {
    let effective = CliConfig {
        codec: overrides.apply(config.codec.clone()),
    };
    let toml_str = toml::to_string_pretty(&effective).context("Failed to serialize config")?;
    print!("{toml_str}");
    Ok(())
}
