//! Command parsing and execution for headless use
//!
//! Usage:
//!   bootmeta --root <dir> list                       List installed titles
//!   bootmeta --root <dir> export <title> <out-dir>   Export assets as PNG/WAV
//!   bootmeta --root <dir> import <title> [edits]     Import edits and sync
//!   bootmeta --root <dir> backup <archive.zip>       Archive all titles
//!   bootmeta --root <dir> restore <archive.zip>      Restore from an archive
//!
//! Titles are written as `<storage>:<16-hex-id>`, e.g.
//! `mlc:00050000101c9500`.
//!
//! Import edits:
//!   --drc <png>  --tv <png>  --logo <png>  --icon <png>
//!   --sound <wav>  --loop <sample>  --target <tv|drc|both>

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use bootmeta_core::{
    Config, Image, LocalTransport, Sound, SoundTarget, Storage, TitleId, TitleSyncEngine,
};

use crate::worker;

/// Which texture slot an import edit targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TexSlot {
    Drc,
    Tv,
    Logo,
    Icon,
}

/// One requested edit of a title's metadata.
#[derive(Debug, Clone)]
pub enum Edit {
    Texture(TexSlot, PathBuf),
    Sound(PathBuf),
    LoopSample(usize),
    Target(SoundTarget),
}

/// CLI command to execute
#[derive(Debug, Clone)]
pub enum CliCommand {
    List,
    Export { title: TitleId, out_dir: PathBuf },
    Import { title: TitleId, edits: Vec<Edit> },
    Backup { archive: PathBuf },
    Restore { archive: PathBuf },
}

/// CLI options
#[derive(Debug, Clone)]
pub struct CliOptions {
    pub root: PathBuf,
}

pub fn print_help() {
    eprintln!("bootmeta - console boot metadata editor");
    eprintln!();
    eprintln!("Usage: bootmeta --root <dir> <command> [args]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  list                       List installed titles");
    eprintln!("  export <title> <out-dir>   Export assets as PNG/WAV");
    eprintln!("  import <title> [edits]     Import edits and sync them back");
    eprintln!("  backup <archive.zip>       Archive every title's metadata");
    eprintln!("  restore <archive.zip>      Restore metadata from an archive");
    eprintln!();
    eprintln!("Titles: <storage>:<16-hex-id>, e.g. mlc:00050000101c9500");
    eprintln!();
    eprintln!("Import edits:");
    eprintln!("  --drc <png> --tv <png> --logo <png> --icon <png>");
    eprintln!("  --sound <wav> --loop <sample> --target <tv|drc|both>");
}

/// Parse CLI arguments and return command + options
pub fn parse_args(args: &[String]) -> Result<(CliCommand, CliOptions), String> {
    let mut root: Option<PathBuf> = None;
    let mut positional: Vec<String> = Vec::new();
    let mut edits: Vec<Edit> = Vec::new();

    let mut i = 0;
    while i < args.len() {
        let arg = &args[i];
        match arg.as_str() {
            "--root" => {
                root = Some(PathBuf::from(take_value(args, &mut i, "--root")?));
            }
            "--drc" | "--tv" | "--logo" | "--icon" => {
                let slot = match arg.as_str() {
                    "--drc" => TexSlot::Drc,
                    "--tv" => TexSlot::Tv,
                    "--logo" => TexSlot::Logo,
                    _ => TexSlot::Icon,
                };
                let value = take_value(args, &mut i, arg)?;
                edits.push(Edit::Texture(slot, PathBuf::from(value)));
            }
            "--sound" => {
                edits.push(Edit::Sound(PathBuf::from(take_value(args, &mut i, "--sound")?)));
            }
            "--loop" => {
                let value = take_value(args, &mut i, "--loop")?;
                let sample = value
                    .parse()
                    .map_err(|_| format!("--loop expects a sample index, got {value}"))?;
                edits.push(Edit::LoopSample(sample));
            }
            "--target" => {
                let value = take_value(args, &mut i, "--target")?;
                let target = match value.as_str() {
                    "tv" => SoundTarget::Tv,
                    "drc" => SoundTarget::Drc,
                    "both" => SoundTarget::Both,
                    other => return Err(format!("unknown target: {other}")),
                };
                edits.push(Edit::Target(target));
            }
            other if other.starts_with("--") => {
                return Err(format!("unknown option: {other}"));
            }
            _ => positional.push(arg.clone()),
        }
        i += 1;
    }

    let root = root.or_else(|| Config::load().last_root).ok_or("--root is required")?;
    let had_edits = !edits.is_empty();

    let mut positional = positional.into_iter();
    let command = match positional.next().as_deref() {
        Some("list") => CliCommand::List,
        Some("export") => CliCommand::Export {
            title: parse_title(&positional.next().ok_or("export needs a title")?)?,
            out_dir: PathBuf::from(positional.next().ok_or("export needs an output dir")?),
        },
        Some("import") => {
            if edits.is_empty() {
                return Err("import needs at least one edit option".to_string());
            }
            CliCommand::Import {
                title: parse_title(&positional.next().ok_or("import needs a title")?)?,
                edits,
            }
        }
        Some("backup") => CliCommand::Backup {
            archive: PathBuf::from(positional.next().ok_or("backup needs an archive path")?),
        },
        Some("restore") => CliCommand::Restore {
            archive: PathBuf::from(positional.next().ok_or("restore needs an archive path")?),
        },
        Some(other) => return Err(format!("unknown command: {other}")),
        None => return Err("no command given".to_string()),
    };

    if let Some(extra) = positional.next() {
        return Err(format!("unexpected argument: {extra}"));
    }
    if had_edits && !matches!(command, CliCommand::Import { .. }) {
        return Err("edit options only apply to import".to_string());
    }

    Ok((command, CliOptions { root }))
}

fn take_value(args: &[String], i: &mut usize, flag: &str) -> Result<String, String> {
    *i += 1;
    args.get(*i)
        .cloned()
        .ok_or_else(|| format!("{flag} requires a value"))
}

fn parse_title(s: &str) -> Result<TitleId, String> {
    let (storage, id) = s
        .split_once(':')
        .ok_or_else(|| format!("title must be <storage>:<id>, got {s}"))?;
    let storage = match storage {
        "usb" => Storage::Usb,
        "mlc" => Storage::Mlc,
        other => return Err(format!("unknown storage: {other}")),
    };
    TitleId::from_hex(id, storage).ok_or_else(|| format!("not a 16-hex-digit title id: {id}"))
}

/// Execute a parsed command
pub fn run(command: CliCommand, options: CliOptions) -> anyhow::Result<()> {
    let engine = Arc::new(TitleSyncEngine::new());
    let transport = Arc::new(LocalTransport::new(&options.root));
    engine
        .connect(transport)
        .with_context(|| format!("connecting to {}", options.root.display()))?;

    match command {
        CliCommand::List => {
            for id in engine.titles() {
                println!("{}  [{}]", id.id(), id.storage());
            }
        }
        CliCommand::Export { title, out_dir } => {
            let meta = engine.get_title(&title, None)?;
            let meta = meta.lock().unwrap();
            std::fs::create_dir_all(&out_dir)
                .with_context(|| format!("creating {}", out_dir.display()))?;
            std::fs::write(out_dir.join("drc.png"), meta.drc_tex().to_png())?;
            std::fs::write(out_dir.join("tv.png"), meta.tv_tex().to_png())?;
            std::fs::write(out_dir.join("logo.png"), meta.logo_tex().to_png())?;
            std::fs::write(out_dir.join("icon.png"), meta.icon_tex().to_png())?;
            std::fs::write(out_dir.join("sound.wav"), meta.sound().to_wave())?;
            println!(
                "exported {} ({}, {:.2}s sound) to {}",
                title,
                meta.sound().format_name(),
                meta.sound().duration_secs(),
                out_dir.display()
            );
        }
        CliCommand::Import { title, edits } => {
            let meta = engine.get_title(&title, None)?;
            {
                let mut meta = meta.lock().unwrap();
                for edit in edits {
                    apply_edit(&mut meta, edit)?;
                }
            }
            worker::run_with_progress(&engine, |engine, progress| {
                engine.sync_dirty(Some(&progress))
            })?;
            println!("synced {}", title);
        }
        CliCommand::Backup { archive } => {
            let count = engine.titles().len();
            worker::run_with_progress(&engine, move |engine, progress| {
                engine.backup(&archive, Some(&progress))
            })?;
            println!("backed up {} titles", count);
        }
        CliCommand::Restore { archive } => {
            worker::run_with_progress(&engine, move |engine, progress| {
                engine.restore(&archive, Some(&progress))
            })?;
            println!("restore complete");
        }
    }

    let mut config = Config::load();
    config.last_root = Some(options.root);
    if let Err(e) = config.save() {
        tracing::warn!("could not save config: {}", e);
    }

    Ok(())
}

fn apply_edit(meta: &mut bootmeta_core::TitleMeta, edit: Edit) -> anyhow::Result<()> {
    match edit {
        Edit::Texture(slot, path) => {
            let bytes =
                std::fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
            let image = Image::from_png(&bytes)
                .with_context(|| format!("decoding {}", path.display()))?;
            match slot {
                TexSlot::Drc => meta.replace_drc_tex(image)?,
                TexSlot::Tv => meta.replace_tv_tex(image)?,
                TexSlot::Logo => meta.replace_logo_tex(image)?,
                TexSlot::Icon => meta.replace_icon_tex(image)?,
            }
        }
        Edit::Sound(path) => {
            let bytes =
                std::fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
            let sound = Sound::from_wave(&bytes)
                .with_context(|| format!("decoding {}", path.display()))?;
            meta.replace_sound(sound);
        }
        Edit::LoopSample(sample) => meta.set_loop_sample(sample),
        Edit::Target(target) => meta.set_target(target),
    }
    Ok(())
}
