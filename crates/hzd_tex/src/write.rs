//! Types for writing core files
//!

use std::fs::File;
use std::io::{BufWriter, Cursor, Seek, Write};
use std::path::Path;
use tracing::instrument;

use crate::error::Result;
use crate::read::CoreArchive;

impl CoreArchive {
    /// Write every record and the trailer back out.
    ///
    /// An unmodified container produces the bytes it was loaded from. Only the core file is
    /// written, streamed payloads stay where they are.
    pub fn write_to<W: Write + Seek>(&self, writer: &mut W) -> Result<()> {
        for record in &self.records {
            record.write(writer)?;
        }
        writer.write_all(&self.trailer)?;
        Ok(())
    }

    /// Serialize into a freshly allocated buffer
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buffer = Cursor::new(Vec::new());
        self.write_to(&mut buffer)?;
        Ok(buffer.into_inner())
    }

    /// Write the core file to a new location
    #[instrument(skip(self, path), fields(path = %path.as_ref().display()), err)]
    pub fn save_as(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_to(&mut writer)?;
        writer.flush()?;
        Ok(())
    }
}
