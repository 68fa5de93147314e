use std::collections::BTreeMap;
use std::path::{
    Path,
    PathBuf,
};

use itertools::Itertools;
use log::debug;

use super::{
    IdatField,
    FIELD_ENTRY_LEN,
    HEADER_LEN,
    IDAT_MAGIC,
    IDAT_VERSION,
};
use crate::data_structs::typedef::AddressType;
use crate::data_structs::{
    ChannelReads,
    IdatMetadata,
    RunInfo,
};
use crate::error::{
    Error,
    FormatError,
};
use crate::io::compression::read_file_bytes;

/// One decoded channel file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdatFile {
    pub metadata:       IdatMetadata,
    pub reads:          ChannelReads,
    /// Field codes present in the file that were skipped.
    pub unknown_fields: Vec<u16>,
}

/// Reads an IDAT file (plain or gzipped) from disk.
pub fn read_idat<P: AsRef<Path>>(path: P) -> Result<IdatFile, Error> {
    let path = path.as_ref();
    let bytes = read_file_bytes(path)?;
    let file = IdatReader::new(&bytes, path).decode()?;
    debug!(
        "Decoded {} ({} probes, {} unknown fields)",
        path.display(),
        file.metadata.probe_count,
        file.unknown_fields.len()
    );
    Ok(file)
}

/// Decoder over the in-memory contents of one IDAT file.
///
/// `path` is only used to name the file in [`FormatError`]s.
pub struct IdatReader<'a> {
    bytes: &'a [u8],
    path:  PathBuf,
}

impl<'a> IdatReader<'a> {
    pub fn new<P: Into<PathBuf>>(
        bytes: &'a [u8],
        path: P,
    ) -> Self {
        Self {
            bytes,
            path: path.into(),
        }
    }

    fn error<F, E, D>(
        &self,
        field: F,
        expected: E,
        found: D,
    ) -> FormatError
    where
        F: std::fmt::Display,
        E: std::fmt::Display,
        D: std::fmt::Display, {
        FormatError::new(&self.path, field, expected, found)
    }

    fn cursor(
        &self,
        field: &str,
        offset: usize,
    ) -> Cursor<'_> {
        Cursor {
            reader: self,
            field: field.to_string(),
            pos: offset,
        }
    }

    pub fn decode(&self) -> Result<IdatFile, FormatError> {
        let table = self.read_header()?;

        let mut known: BTreeMap<IdatField, usize> = BTreeMap::new();
        let mut unknown_fields = Vec::new();
        for (code, offset) in table.iter().copied() {
            match IdatField::from_code(code) {
                Some(field) => {
                    if known.insert(field, offset).is_some() {
                        return Err(self.error(
                            field,
                            "single field table entry",
                            "duplicated entry",
                        ));
                    }
                },
                None => {
                    debug!("Skipping unknown IDAT field code {}", code);
                    unknown_fields.push(code);
                },
            }
        }

        // Array payloads extend up to the next field (of any code) or EOF.
        let boundaries = table.iter().map(|(_, offset)| *offset).sorted().collect_vec();
        let extent = |offset: usize| -> usize {
            boundaries
                .iter()
                .find(|b| **b > offset)
                .copied()
                .unwrap_or(self.bytes.len())
                - offset
        };

        let require = |field: IdatField| -> Result<usize, FormatError> {
            known
                .get(&field)
                .copied()
                .ok_or_else(|| self.error(field, "field present", "missing"))
        };

        let n_offset = require(IdatField::NumSnpsRead)?;
        let declared = self
            .cursor(IdatField::NumSnpsRead.name(), n_offset)
            .read_i32()?;
        if declared < 0 {
            return Err(self.error(
                IdatField::NumSnpsRead,
                "non-negative probe count",
                declared,
            ));
        }
        let n = declared as usize;

        let check_count = |field: IdatField, offset: usize| -> Result<(), FormatError> {
            // Only called for fixed-width fields.
            let width = field.element_width().unwrap_or(1);
            let available = extent(offset);
            if available != n * width {
                return Err(self.error(
                    field,
                    format!("{} records (declared by {})", n, IdatField::NumSnpsRead),
                    format!(
                        "{} records{}",
                        available / width,
                        if available % width != 0 {
                            format!(" and {} trailing bytes", available % width)
                        }
                        else {
                            String::new()
                        }
                    ),
                ));
            }
            Ok(())
        };

        let ids_offset = require(IdatField::IlluminaId)?;
        check_count(IdatField::IlluminaId, ids_offset)?;
        let addresses = self
            .cursor(IdatField::IlluminaId.name(), ids_offset)
            .read_addresses(n)?;

        let mean_offset = require(IdatField::Mean)?;
        check_count(IdatField::Mean, mean_offset)?;
        let means = self
            .cursor(IdatField::Mean.name(), mean_offset)
            .read_u16_array(n)?;

        let mut reads = ChannelReads::new(addresses, means);
        if let Some(offset) = known.get(&IdatField::StdDev).copied() {
            check_count(IdatField::StdDev, offset)?;
            reads.deviations = self
                .cursor(IdatField::StdDev.name(), offset)
                .read_u16_array(n)?;
        }
        if let Some(offset) = known.get(&IdatField::NumBeads).copied() {
            check_count(IdatField::NumBeads, offset)?;
            reads.bead_counts = self
                .cursor(IdatField::NumBeads.name(), offset)
                .take(n)?
                .to_vec();
        }

        let read_string = |field: IdatField| -> Result<Option<String>, FormatError> {
            known
                .get(&field)
                .map(|offset| self.cursor(field.name(), *offset).read_string())
                .transpose()
        };

        let metadata = IdatMetadata {
            version: IDAT_VERSION,
            probe_count: n,
            array_type: read_string(IdatField::ChipType)?,
            sample_id: read_string(IdatField::Barcode)?,
            red_green: known
                .get(&IdatField::RedGreen)
                .map(|offset| {
                    self.cursor(IdatField::RedGreen.name(), *offset)
                        .read_i32()
                })
                .transpose()?,
            run_info: known
                .get(&IdatField::RunInfo)
                .map(|offset| self.read_run_info(*offset))
                .transpose()?
                .unwrap_or_default(),
        };

        Ok(IdatFile {
            metadata,
            reads,
            unknown_fields,
        })
    }

    /// Validates magic and version, returns the `(code, offset)` table.
    fn read_header(&self) -> Result<Vec<(u16, usize)>, FormatError> {
        let mut cursor = self.cursor("magic", 0);
        let magic = cursor.take(IDAT_MAGIC.len())?;
        if magic != IDAT_MAGIC {
            return Err(self.error(
                "magic",
                String::from_utf8_lossy(IDAT_MAGIC),
                magic.escape_ascii(),
            ));
        }

        cursor.field = "version".into();
        let version = cursor.read_i64()?;
        if version != IDAT_VERSION {
            return Err(self.error("version", IDAT_VERSION, version));
        }

        cursor.field = "field count".into();
        let n_fields = cursor.read_i32()?;
        if n_fields < 0 {
            return Err(self.error("field count", "non-negative count", n_fields));
        }
        let table_end = HEADER_LEN + n_fields as usize * FIELD_ENTRY_LEN;
        if table_end > self.bytes.len() {
            return Err(self.error(
                "field table",
                format!("{} entries", n_fields),
                format!("file of {} bytes", self.bytes.len()),
            ));
        }

        let mut table = Vec::with_capacity(n_fields as usize);
        for _ in 0..n_fields {
            cursor.field = "field table".into();
            let code = cursor.read_u16()?;
            let offset = cursor.read_i64()?;
            if offset < table_end as i64 || offset > self.bytes.len() as i64 {
                let name = IdatField::from_code(code)
                    .map(|f| f.name().to_string())
                    .unwrap_or_else(|| format!("code {}", code));
                return Err(self.error(
                    name,
                    format!("offset within {}..{}", table_end, self.bytes.len()),
                    offset,
                ));
            }
            table.push((code, offset as usize));
        }
        Ok(table)
    }

    fn read_run_info(
        &self,
        offset: usize,
    ) -> Result<Vec<RunInfo>, FormatError> {
        let mut cursor = self.cursor(IdatField::RunInfo.name(), offset);
        let count = cursor.read_i32()?;
        if count < 0 {
            return Err(self.error(IdatField::RunInfo, "non-negative count", count));
        }
        (0..count)
            .map(|_| -> Result<RunInfo, FormatError> {
                Ok(RunInfo {
                    run_time:     cursor.read_string()?,
                    block_type:   cursor.read_string()?,
                    block_pars:   cursor.read_string()?,
                    block_code:   cursor.read_string()?,
                    code_version: cursor.read_string()?,
                })
            })
            .collect()
    }
}

/// Bounds-checked little-endian reads within one field.
struct Cursor<'r> {
    reader: &'r IdatReader<'r>,
    field:  String,
    pos:    usize,
}

impl<'r> Cursor<'r> {
    fn take(
        &mut self,
        len: usize,
    ) -> Result<&'r [u8], FormatError> {
        let bytes = self.reader.bytes;
        let end = self.pos.checked_add(len).filter(|end| *end <= bytes.len());
        match end {
            Some(end) => {
                let slice = &bytes[self.pos..end];
                self.pos = end;
                Ok(slice)
            },
            None => {
                Err(self.reader.error(
                    &self.field,
                    format!("{} bytes at offset {}", len, self.pos),
                    format!("end of file at {}", bytes.len()),
                ))
            },
        }
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N], FormatError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn read_u16(&mut self) -> Result<u16, FormatError> {
        Ok(u16::from_le_bytes(self.take_array()?))
    }

    fn read_i32(&mut self) -> Result<i32, FormatError> {
        Ok(i32::from_le_bytes(self.take_array()?))
    }

    fn read_i64(&mut self) -> Result<i64, FormatError> {
        Ok(i64::from_le_bytes(self.take_array()?))
    }

    fn read_u16_array(
        &mut self,
        n: usize,
    ) -> Result<Vec<u16>, FormatError> {
        Ok(self
            .take(n * 2)?
            .chunks_exact(2)
            .map(|c| u16::from_le_bytes([c[0], c[1]]))
            .collect())
    }

    fn read_addresses(
        &mut self,
        n: usize,
    ) -> Result<Vec<AddressType>, FormatError> {
        let raw = self.take(n * 4)?;
        raw.chunks_exact(4)
            .map(|c| {
                let value = i32::from_le_bytes([c[0], c[1], c[2], c[3]]);
                AddressType::try_from(value).map_err(|_| {
                    self.reader
                        .error(&self.field, "non-negative address", value)
                })
            })
            .collect()
    }

    /// 7-bit encoded length prefix, at most 5 bytes.
    fn read_varint(&mut self) -> Result<usize, FormatError> {
        let mut value: usize = 0;
        for shift in (0..35).step_by(7) {
            let byte = self.take(1)?[0];
            value |= ((byte & 0x7f) as usize) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(self
            .reader
            .error(&self.field, "string length of at most 5 bytes", "longer prefix"))
    }

    fn read_string(&mut self) -> Result<String, FormatError> {
        let len = self.read_varint()?;
        Ok(String::from_utf8_lossy(self.take(len)?).into_owned())
    }
}
