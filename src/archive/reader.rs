use crate::error::{CollectorError, Result};
use crate::utils::encoding::decode_text;
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;
use tracing::debug;
use zip::ZipArchive;

/// Reads the delimited table embedded in a station archive.
pub struct ArchiveReader;

impl ArchiveReader {
    /// Check that downloaded bytes open as a zip archive holding a CSV table.
    /// `origin` names the archive in the error.
    pub fn verify(bytes: &[u8], origin: &Path) -> Result<()> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| CollectorError::parse(origin, format!("not a zip archive: {}", e)))?;

        for i in 0..archive.len() {
            let entry = archive
                .by_index(i)
                .map_err(|e| CollectorError::parse(origin, e.to_string()))?;
            if !entry.is_dir() && entry.name().to_ascii_lowercase().ends_with(".csv") {
                return Ok(());
            }
        }

        Err(CollectorError::parse(origin, "no CSV table in archive"))
    }

    /// List entry names that look like CSV tables.
    pub fn csv_entries(zip_path: &Path) -> Result<Vec<String>> {
        let mut archive = Self::open(zip_path)?;
        let mut names = Vec::new();

        for i in 0..archive.len() {
            let entry = archive
                .by_index(i)
                .map_err(|e| CollectorError::parse(zip_path, e.to_string()))?;
            if !entry.is_dir() && entry.name().to_ascii_lowercase().ends_with(".csv") {
                names.push(entry.name().to_string());
            }
        }

        Ok(names)
    }

    /// Decompress the single CSV table into memory. When the archive holds
    /// several, the one named `preferred` wins.
    pub fn read_table(zip_path: &Path, preferred: &str) -> Result<String> {
        let entries = Self::csv_entries(zip_path)?;

        let entry_name = match entries.as_slice() {
            [] => {
                return Err(CollectorError::parse(zip_path, "no CSV table in archive"));
            }
            [only] => only.clone(),
            many => many
                .iter()
                .find(|name| file_name(name).eq_ignore_ascii_case(preferred))
                .cloned()
                .ok_or_else(|| {
                    CollectorError::parse(
                        zip_path,
                        format!("ambiguous CSV tables in archive: {}", many.join(", ")),
                    )
                })?,
        };

        let mut archive = Self::open(zip_path)?;
        let mut entry = archive
            .by_name(&entry_name)
            .map_err(|e| CollectorError::parse(zip_path, e.to_string()))?;

        let mut bytes = Vec::new();
        entry
            .read_to_end(&mut bytes)
            .map_err(|e| CollectorError::parse(zip_path, e.to_string()))?;

        debug!(
            "Read {} bytes from {} in {}",
            bytes.len(),
            entry_name,
            zip_path.display()
        );

        Ok(decode_text(&bytes))
    }

    fn open(zip_path: &Path) -> Result<ZipArchive<File>> {
        let file = File::open(zip_path)?;
        ZipArchive::new(file).map_err(|e| CollectorError::parse(zip_path, e.to_string()))
    }
}

fn file_name(entry_name: &str) -> &str {
    entry_name.rsplit('/').next().unwrap_or(entry_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use zip::{CompressionMethod, ZipWriter};

    fn create_test_zip(entries: &[(&str, &[u8])]) -> Result<NamedTempFile> {
        let file = NamedTempFile::new()?;
        {
            let mut zip = ZipWriter::new(&file);
            for (name, content) in entries {
                zip.start_file(
                    *name,
                    zip::write::FileOptions::default().compression_method(CompressionMethod::Deflated),
                )?;
                zip.write_all(content)?;
            }
            zip.finish()?;
        }
        Ok(file)
    }

    #[test]
    fn test_read_single_table() -> Result<()> {
        let zip = create_test_zip(&[
            ("dly3904.csv", "Station Name: PHOENIX PARK\ndate,ind,rain\n".as_bytes()),
            ("KeyDaily.txt", "rain: Precipitation Amount (mm)\n".as_bytes()),
        ])?;

        let text = ArchiveReader::read_table(zip.path(), "dly3904.csv")?;
        assert!(text.contains("PHOENIX PARK"));
        Ok(())
    }

    #[test]
    fn test_prefers_named_table() -> Result<()> {
        let zip = create_test_zip(&[
            ("other.csv", "other".as_bytes()),
            ("dly3904.csv", "wanted".as_bytes()),
        ])?;

        assert_eq!(ArchiveReader::read_table(zip.path(), "dly3904.csv")?, "wanted");
        assert!(ArchiveReader::read_table(zip.path(), "dly1.csv").is_err());
        Ok(())
    }

    #[test]
    fn test_archive_without_table() -> Result<()> {
        let zip = create_test_zip(&[("readme.txt", "nothing here".as_bytes())])?;
        let err = ArchiveReader::read_table(zip.path(), "dly1.csv").unwrap_err();
        assert!(matches!(err, CollectorError::Parse { .. }));
        Ok(())
    }

    #[test]
    fn test_corrupt_archive() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        file.write_all(b"<html>not a zip</html>")?;
        let err = ArchiveReader::read_table(file.path(), "dly1.csv").unwrap_err();
        assert!(matches!(err, CollectorError::Parse { .. }));
        Ok(())
    }

    #[test]
    fn test_verify_downloaded_bytes() -> Result<()> {
        let zip = create_test_zip(&[("dly1.csv", "date,ind,rain\n".as_bytes())])?;
        let bytes = std::fs::read(zip.path())?;
        let origin = Path::new("daily/dly1.zip");

        ArchiveReader::verify(&bytes, origin)?;

        let err = ArchiveReader::verify(b"<html>Service unavailable</html>", origin).unwrap_err();
        assert!(matches!(err, CollectorError::Parse { .. }));

        let readme_only = create_test_zip(&[("readme.txt", "nothing here".as_bytes())])?;
        let bytes = std::fs::read(readme_only.path())?;
        assert!(ArchiveReader::verify(&bytes, origin).is_err());
        Ok(())
    }

    #[test]
    fn test_entry_size_header_not_trusted() -> Result<()> {
        let table = "date,ind,rain\n01-jan-2020,0,0.1\n";
        let zip = create_test_zip(&[("dly1.csv", table.as_bytes())])?;
        let mut bytes = std::fs::read(zip.path())?;

        // Claim a 2 GiB uncompressed size in the local and central headers
        let claimed = 0x7FFF_FFFFu32.to_le_bytes();
        let name = b"dly1.csv";
        let starts: Vec<usize> = bytes
            .windows(name.len())
            .enumerate()
            .filter(|(_, w)| *w == name)
            .map(|(i, _)| i)
            .collect();
        for name_at in starts {
            if name_at >= 30 && bytes[name_at - 30..name_at - 26] == *b"PK\x03\x04" {
                bytes[name_at - 8..name_at - 4].copy_from_slice(&claimed);
            }
            if name_at >= 46 && bytes[name_at - 46..name_at - 42] == *b"PK\x01\x02" {
                bytes[name_at - 22..name_at - 18].copy_from_slice(&claimed);
            }
        }

        let mut file = NamedTempFile::new()?;
        file.write_all(&bytes)?;
        assert_eq!(ArchiveReader::read_table(file.path(), "dly1.csv")?, table);
        Ok(())
    }

    #[test]
    fn test_windows_1252_fallback() -> Result<()> {
        let zip = create_test_zip(&[("dly1.csv", &b"Station Name: Ath Cliath \xb0C\n"[..])])?;
        let text = ArchiveReader::read_table(zip.path(), "dly1.csv")?;
        assert!(text.contains("°C"));
        Ok(())
    }
}
