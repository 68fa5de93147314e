use std::fs::File;
use std::io::{
    BufWriter,
    Write,
};
use std::path::Path;

use super::{
    IdatField,
    FIELD_ENTRY_LEN,
    HEADER_LEN,
    IDAT_MAGIC,
    IDAT_VERSION,
};
use crate::data_structs::{
    ChannelReads,
    IdatMetadata,
};
use crate::error::Error;
use crate::io::compression::Compression;

/// Encodes one channel into the IDAT layout read by
/// [`IdatReader`](super::IdatReader).
///
/// Fields are written in code-table order with contiguous payloads, so every
/// array ends where the next field starts.
///
/// This writer is for generating fixtures and small synthetic IDAT files,
/// e.g. in tests. Nothing on the decode path uses it, and it only writes the
/// fields [`IdatReader`](super::IdatReader) understands.
#[derive(Debug, Clone)]
pub struct IdatWriter {
    reads:        ChannelReads,
    metadata:     IdatMetadata,
    extra_fields: Vec<(u16, Vec<u8>)>,
}

impl IdatWriter {
    pub fn new(
        reads: ChannelReads,
        metadata: IdatMetadata,
    ) -> Self {
        Self {
            reads,
            metadata,
            extra_fields: Vec::new(),
        }
    }

    /// Appends a raw vendor field the reader does not interpret.
    pub fn with_extra_field(
        mut self,
        code: u16,
        payload: Vec<u8>,
    ) -> Self {
        self.extra_fields.push((code, payload));
        self
    }

    fn payloads(&self) -> Vec<(u16, Vec<u8>)> {
        let reads = &self.reads;
        let mut fields: Vec<(u16, Vec<u8>)> = Vec::new();

        fields.push((
            IdatField::NumSnpsRead.code(),
            (reads.len() as i32).to_le_bytes().to_vec(),
        ));
        fields.push((
            IdatField::IlluminaId.code(),
            reads
                .addresses
                .iter()
                .flat_map(|a| (*a as i32).to_le_bytes())
                .collect(),
        ));
        if !reads.deviations.is_empty() {
            fields.push((
                IdatField::StdDev.code(),
                reads.deviations.iter().flat_map(|v| v.to_le_bytes()).collect(),
            ));
        }
        fields.push((
            IdatField::Mean.code(),
            reads.means.iter().flat_map(|v| v.to_le_bytes()).collect(),
        ));
        if !reads.bead_counts.is_empty() {
            fields.push((IdatField::NumBeads.code(), reads.bead_counts.clone()));
        }
        if !self.metadata.run_info.is_empty() {
            let mut payload =
                (self.metadata.run_info.len() as i32).to_le_bytes().to_vec();
            for info in &self.metadata.run_info {
                for value in [
                    &info.run_time,
                    &info.block_type,
                    &info.block_pars,
                    &info.block_code,
                    &info.code_version,
                ] {
                    write_string(&mut payload, value);
                }
            }
            fields.push((IdatField::RunInfo.code(), payload));
        }
        if let Some(red_green) = self.metadata.red_green {
            fields.push((
                IdatField::RedGreen.code(),
                red_green.to_le_bytes().to_vec(),
            ));
        }
        for (field, value) in [
            (IdatField::Barcode, &self.metadata.sample_id),
            (IdatField::ChipType, &self.metadata.array_type),
        ] {
            if let Some(value) = value {
                let mut payload = Vec::new();
                write_string(&mut payload, value);
                fields.push((field.code(), payload));
            }
        }
        fields.extend(self.extra_fields.iter().cloned());
        fields
    }

    /// Serialized file contents.
    pub fn encode(&self) -> Vec<u8> {
        let fields = self.payloads();
        let mut out = Vec::new();
        out.extend_from_slice(IDAT_MAGIC);
        out.extend_from_slice(&IDAT_VERSION.to_le_bytes());
        out.extend_from_slice(&(fields.len() as i32).to_le_bytes());

        let mut offset = (HEADER_LEN + fields.len() * FIELD_ENTRY_LEN) as i64;
        for (code, payload) in &fields {
            out.extend_from_slice(&code.to_le_bytes());
            out.extend_from_slice(&offset.to_le_bytes());
            offset += payload.len() as i64;
        }
        for (_, payload) in fields {
            out.extend(payload);
        }
        out
    }

    pub fn write<W: Write>(
        &self,
        writer: &mut W,
    ) -> std::io::Result<()> {
        writer.write_all(&self.encode())
    }

    /// Writes to `path`, gzipping when `compression` asks for it.
    pub fn write_to_path<P: AsRef<Path>>(
        &self,
        path: P,
        compression: Compression,
    ) -> Result<(), Error> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| Error::io(path, e))?;
        let mut encoder = compression.get_encoder(BufWriter::new(file), 6);
        self.write(&mut encoder).map_err(|e| Error::io(path, e))?;
        encoder.flush().map_err(|e| Error::io(path, e))
    }
}

fn write_string(
    out: &mut Vec<u8>,
    value: &str,
) {
    let mut len = value.len();
    loop {
        let byte = (len & 0x7f) as u8;
        len >>= 7;
        if len == 0 {
            out.push(byte);
            break;
        }
        out.push(byte | 0x80);
    }
    out.extend_from_slice(value.as_bytes());
}
