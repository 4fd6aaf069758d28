//! FITS primary header access on disk.
//!
//! Only the primary header is parsed. The data unit and any extensions that
//! follow it are copied byte-for-byte when the header is written back.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::error::{EditError, Result};
use crate::header::{HeaderRecord, CARD_SIZE};
use crate::store::{RecordContainer, RecordStore};

pub const BLOCK_SIZE: usize = 2880;
const END_CARD: &str = "END";
/// Refuse headers larger than this many blocks (about 2.8 MB).
const MAX_HEADER_BLOCKS: usize = 1000;

/// Opens FITS files from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FitsStore;

impl RecordStore for FitsStore {
    type Container = FitsFile;

    fn open(&self, path: &Path) -> Result<FitsFile> {
        FitsFile::open(path)
    }
}

/// An open FITS file with its primary header in memory.
#[derive(Debug)]
pub struct FitsFile {
    path: PathBuf,
    records: Vec<HeaderRecord>,
    /// Byte offset of the first block after the primary header.
    data_offset: u64,
}

impl FitsFile {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| EditError::io(path, e))?;
        let mut reader = BufReader::new(file);

        // Read header blocks until we find END
        let mut records = Vec::new();
        let mut blocks = 0usize;
        let mut block = vec![0u8; BLOCK_SIZE];
        'blocks: loop {
            if blocks >= MAX_HEADER_BLOCKS {
                return Err(EditError::Parse(format!(
                    "{}: no END card within {MAX_HEADER_BLOCKS} header blocks",
                    path.display()
                )));
            }
            match reader.read_exact(&mut block) {
                Ok(()) => blocks += 1,
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                    return Err(EditError::Parse(format!(
                        "{}: header ends before an END card",
                        path.display()
                    )));
                }
                Err(e) => return Err(EditError::io(path, e)),
            }

            for chunk in block.chunks(CARD_SIZE) {
                let card = std::str::from_utf8(chunk)
                    .ok()
                    .filter(|c| c.is_ascii())
                    .ok_or_else(|| {
                        EditError::Parse(format!("{}: header card is not ASCII", path.display()))
                    })?;
                if card[..8].trim_end() == END_CARD {
                    break 'blocks;
                }
                records.push(HeaderRecord::parse_card(card)?);
            }
        }

        match records.first().map(HeaderRecord::keyword) {
            Some("SIMPLE") => {}
            _ => {
                return Err(EditError::Parse(format!(
                    "{}: primary header must start with SIMPLE",
                    path.display()
                )))
            }
        }

        Ok(Self {
            path: path.to_path_buf(),
            records,
            data_offset: (blocks * BLOCK_SIZE) as u64,
        })
    }

    /// Serialize the header: cards, END, then space padding to a block boundary.
    pub fn header_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity((self.records.len() + 1) * CARD_SIZE);
        for record in &self.records {
            out.extend_from_slice(record.to_card()?.as_bytes());
        }
        out.extend_from_slice(format!("{END_CARD:<CARD_SIZE$}").as_bytes());
        let padded = out.len().div_ceil(BLOCK_SIZE) * BLOCK_SIZE;
        out.resize(padded, b' ');
        Ok(out)
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.path.with_file_name(format!(".{name}.edit-tmp"))
    }

    fn write_to(&self, temp: &Path, header: &[u8]) -> io::Result<()> {
        let mut source = File::open(&self.path)?;
        source.seek(SeekFrom::Start(self.data_offset))?;

        let mut writer = BufWriter::new(File::create(temp)?);
        writer.write_all(header)?;
        io::copy(&mut source, &mut writer)?;
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()
    }
}

impl RecordContainer for FitsFile {
    fn records(&self) -> &[HeaderRecord] {
        &self.records
    }

    fn records_mut(&mut self) -> &mut Vec<HeaderRecord> {
        &mut self.records
    }

    /// Write header and original data to a sibling temp file, then rename it
    /// over the original. The original is untouched if anything fails.
    fn persist(&mut self) -> Result<()> {
        let header = self.header_bytes()?;
        let temp = self.temp_path();

        if let Err(e) = self.write_to(&temp, &header) {
            let _ = fs::remove_file(&temp);
            return Err(EditError::io(&self.path, e));
        }
        if let Err(e) = fs::rename(&temp, &self.path) {
            let _ = fs::remove_file(&temp);
            return Err(EditError::io(&self.path, e));
        }

        self.data_offset = header.len() as u64;
        tracing::debug!(path = %self.path.display(), bytes = header.len(), "header written");
        Ok(())
    }
}
