//! `thumb` subcommands. Each writes its user-facing output to `out`.

use crate::{CliError, Fetcher, Settings};
use std::io::Write;
use std::path::{Path, PathBuf};
use thumb_core::{FileStore, ThumbnailConfig, ThumbnailId, ThumbnailStore};
use thumb_render::{CanvasRenderer, RenderOptions};

fn read_config(path: &Path) -> Result<ThumbnailConfig, CliError> {
    let json = std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_owned(),
        source,
    })?;
    ThumbnailConfig::from_json(&json).map_err(|source| CliError::Config {
        path: path.to_owned(),
        source,
    })
}

fn write_out(out: &mut impl Write, text: std::fmt::Arguments<'_>) -> Result<(), CliError> {
    out.write_fmt(text).map_err(|source| CliError::Io {
        path: PathBuf::from("<stdout>"),
        source,
    })
}

fn parse_id(id: &str) -> Result<ThumbnailId, CliError> {
    Ok(ThumbnailId::new(id)?)
}

// ─── render ──────────────────────────────────────────────────────────────

/// Fetch the config's images, draw it off-screen and write a PNG.
///
/// Images that fail to load leave their zone empty (or the fill in place
/// of a background image); the export still happens.
pub async fn render(settings: &Settings, config_path: &Path, out_path: &Path) -> Result<(u32, u32), CliError> {
    let config = read_config(config_path)?;
    let fonts = settings.font_book()?;

    let mut renderer = CanvasRenderer::new(RenderOptions {
        show_selection: false,
        ..RenderOptions::default()
    });
    renderer.images_mut().sync(&config);
    let tickets = renderer.images_mut().take_pending();

    if !tickets.is_empty() {
        let base_dir = config_path.parent().unwrap_or(Path::new("."));
        let fetcher = Fetcher::new(base_dir)?;
        log::info!("fetching {} image(s)", tickets.len());
        for (ticket, result) in fetcher.load_all(tickets).await {
            if let Err(e) = &result {
                log::warn!("{} image {} not drawn: {e}", ticket.role.as_str(), ticket.url);
            }
            renderer.images_mut().complete(&ticket, result);
        }
    }

    let png = renderer.export_png(&config, &fonts)?;
    std::fs::write(out_path, &png).map_err(|source| CliError::Io {
        path: out_path.to_owned(),
        source,
    })?;
    log::info!(
        "wrote {}x{} thumbnail to {}",
        config.width,
        config.height,
        out_path.display()
    );
    Ok((config.width, config.height))
}

// ─── store ───────────────────────────────────────────────────────────────

fn open_store(settings: &Settings) -> Result<FileStore, CliError> {
    Ok(FileStore::open(&settings.store_dir)?)
}

/// Save a config file into the store, under `id` when given.
pub fn save(
    settings: &Settings,
    config_path: &Path,
    id: Option<&str>,
    out: &mut impl Write,
) -> Result<ThumbnailId, CliError> {
    let config = read_config(config_path)?;
    let mut store = open_store(settings)?;
    let id = match id {
        Some(id) => {
            let id = parse_id(id)?;
            store.save_as(&id, &config)?;
            id
        }
        None => store.save(&config)?,
    };
    write_out(out, format_args!("{id}\n"))?;
    Ok(id)
}

/// Print a stored config as pretty JSON, with defaults filled in.
pub fn load(settings: &Settings, id: &str, out: &mut impl Write) -> Result<(), CliError> {
    let store = open_store(settings)?;
    let config = store.load(&parse_id(id)?)?;
    let json = serde_json::to_string_pretty(&config).map_err(thumb_core::StoreError::from)?;
    write_out(out, format_args!("{json}\n"))
}

pub fn delete(settings: &Settings, id: &str) -> Result<(), CliError> {
    let mut store = open_store(settings)?;
    let id = parse_id(id)?;
    store.delete(&id)?;
    log::info!("deleted {id}");
    Ok(())
}

pub fn list(settings: &Settings, out: &mut impl Write) -> Result<usize, CliError> {
    let store = open_store(settings)?;
    let ids = store.list()?;
    for id in &ids {
        write_out(out, format_args!("{id}\n"))?;
    }
    Ok(ids.len())
}
