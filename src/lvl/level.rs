use std::path::{Path, PathBuf};

use tracing::trace;

use super::{
    chunk::{Chunk, ChunkReader},
    entity_class::{EntityClass, EntityClassKind},
    logger::{LogLevel, LoggerEntry},
};
use crate::error::{ErrorLayer, Result, ToolError};

/// Deepest `lvl_` nesting we follow.  Shipped levels nest one or two deep.
pub const MAX_SUB_LEVEL_DEPTH: usize = 64;

/// A parsed level archive.  Only the entity classes are retained; all other
/// chunk types (textures, models, scripts, ...) are skipped.
#[derive(Debug)]
pub struct Level {
    pub name: String,
    pub path: PathBuf,
    pub classes: Vec<EntityClass>,
}

/// Receives parse side channel output: progress as a fraction of the file and
/// non-fatal diagnostics.
pub trait ParseObserver {
    fn progress(&mut self, fraction: f32);
    fn log(&mut self, entry: LoggerEntry);
}

/// Observer that throws everything away.
pub struct NullObserver;

impl ParseObserver for NullObserver {
    fn progress(&mut self, _fraction: f32) {}
    fn log(&mut self, _entry: LoggerEntry) {}
}

struct LevelParser<'o> {
    file_name: String,
    total: usize,
    classes: Vec<EntityClass>,
    observer: &'o mut dyn ParseObserver,
}

impl<'o> LevelParser<'o> {
    fn warn(&mut self, message: String) {
        self.observer.log(LoggerEntry::new(
            LogLevel::Warning,
            self.file_name.clone(),
            message,
        ));
    }

    fn walk(&mut self, chunks: ChunkReader, depth: usize) -> Result<()> {
        for chunk in chunks {
            let chunk = chunk?;
            self.visit(&chunk, depth)?;
            if depth == 0 && self.total > 0 {
                self.observer
                    .progress(chunk.end_offset() as f32 / self.total as f32);
            }
        }
        Ok(())
    }

    fn visit(&mut self, chunk: &Chunk, depth: usize) -> Result<()> {
        if EntityClassKind::from_tag(&chunk.tag.0).is_some() {
            match EntityClass::parse(chunk) {
                Ok(ec) => self.classes.push(ec),
                Err(err) => self.warn(format!("Skipping entity class: {}", err)),
            }
            return Ok(());
        }

        if chunk.is(b"lvl_") {
            if depth >= MAX_SUB_LEVEL_DEPTH {
                return Err(ToolError::sticky(
                    ErrorLayer::DataLayer,
                    format!(
                        "Sub-level at offset {} is nested deeper than {} levels",
                        chunk.offset, MAX_SUB_LEVEL_DEPTH
                    ),
                ));
            }
            let name_hash = chunk.read_u32(0)?;
            let size = chunk.read_u32(4)? as usize;
            let body = chunk.data.get(8..8 + size).ok_or_else(|| {
                ToolError::sticky(
                    ErrorLayer::DataLayer,
                    format!(
                        "Sub-level 0x{:08x} at offset {} claims {} bytes but only {} remain",
                        name_hash,
                        chunk.offset,
                        size,
                        chunk.data.len().saturating_sub(8)
                    ),
                )
            })?;
            trace!(
                file = %self.file_name,
                "entering sub-level 0x{:08x} ({} bytes)",
                name_hash,
                size
            );
            return self.walk(ChunkReader::new(body, chunk.data_offset() + 8), depth + 1);
        }

        trace!(file = %self.file_name, "skipping '{}' chunk", chunk.tag);
        Ok(())
    }
}

impl Level {
    /// Parse a level from its raw bytes.  Structural problems inside a single
    /// entity class are reported to the observer and skipped; problems with
    /// the chunk layout itself fail the whole level.
    pub fn parse(path: &Path, data: &[u8], observer: &mut dyn ParseObserver) -> Result<Level> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let root = match ChunkReader::new(data, 0).next() {
            Some(Ok(root)) if root.is(b"ucfb") => root,
            Some(Err(err)) => return Err(err),
            _ => {
                return Err(ToolError::sticky(
                    ErrorLayer::BadInput,
                    format!("{} is not a UCFB file", file_name),
                ))
            }
        };

        let mut parser = LevelParser {
            file_name,
            total: data.len(),
            classes: vec![],
            observer,
        };
        parser.walk(root.children(), 0)?;
        parser.observer.progress(1.0);

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Level {
            name,
            path: path.to_path_buf(),
            classes: parser.classes,
        })
    }

    /// Read and parse a level from disk.
    pub fn load(path: &Path, observer: &mut dyn ParseObserver) -> Result<Level> {
        let data = std::fs::read(path).map_err(|e| {
            ToolError::sticky(
                ErrorLayer::DataLayer,
                format!("Could not read {}: {}", path.display(), e),
            )
        })?;
        Level::parse(path, &data, observer)
    }
}
