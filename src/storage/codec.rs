use std::collections::{BTreeMap, HashMap};
use chrono::{DateTime, Utc};
use fst::{Map, MapBuilder, Streamer};
use log::warn;
use roaring::RoaringTreemap;
use serde::{Serialize, Deserialize};
use crate::compression::compress::{self, CompressionType};
use crate::compression::vbyte::{VByteEncoder, VByteReader};
use crate::core::error::{Error, Result};
use crate::core::stats::FieldStats;
use crate::core::types::{DocId, StoredFields};
use crate::index::inverted::{FieldIndex, InvertedIndex};
use crate::index::posting::{Posting, PostingList};
use crate::index::stored::DocumentStore;
use crate::mvcc::controller::Snapshot;
use crate::storage::directory::Storage;

pub const META_BLOB: &str = "meta.bin";
const POSTINGS_PREFIX: &str = "postings.";
const STORED_PREFIX: &str = "stored.";
const BLOB_SUFFIX: &str = ".bin";

/// `postings.<generation>.bin`
pub fn postings_blob(generation: u64) -> String {
    format!("{}{}{}", POSTINGS_PREFIX, generation, BLOB_SUFFIX)
}

/// `stored.<generation>.bin`
pub fn stored_blob(generation: u64) -> String {
    format!("{}{}{}", STORED_PREFIX, generation, BLOB_SUFFIX)
}

/// Generation of a data blob name, `None` for anything else
fn blob_generation(name: &str) -> Option<u64> {
    let rest = name
        .strip_prefix(POSTINGS_PREFIX)
        .or_else(|| name.strip_prefix(STORED_PREFIX))?;
    rest.strip_suffix(BLOB_SUFFIX)?.parse().ok()
}

const FORMAT_VERSION: u16 = 1;
const POSTINGS_MAGIC: [u8; 4] = *b"RCPO";
const STORED_MAGIC: [u8; 4] = *b"RCST";
const META_MAGIC: [u8; 4] = *b"RCMT";

// magic(4) version(2) compression(1) generation(8) crc32(4)
const HEADER_LEN: usize = 19;

/// Index-wide metadata, written after the other blobs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexMeta {
    pub generation: u64,
    pub next_doc_id: u64,
    pub committed_at: Option<DateTime<Utc>>,
    pub fields: BTreeMap<String, FieldMeta>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldMeta {
    pub stats: FieldStats,
    pub docs: Vec<u8>,    // Portable roaring treemap
}

/// Persist a committed snapshot.
///
/// Data blobs are written under names of their own generation, then
/// `meta.bin` is replaced. Until that last write lands, `load` still sees the
/// previous generation intact. Blobs of other generations are removed after.
pub fn save(storage: &dyn Storage, snapshot: &Snapshot, compression: CompressionType) -> Result<()> {
    let generation = snapshot.generation;

    let postings = encode_postings(&snapshot.index)?;
    storage.write(&postings_blob(generation), &seal(POSTINGS_MAGIC, generation, &postings, compression))?;

    let stored: Vec<(DocId, &StoredFields)> = snapshot.store.iter().collect();
    let stored = bincode::serialize(&stored)?;
    storage.write(&stored_blob(generation), &seal(STORED_MAGIC, generation, &stored, compression))?;

    let meta = bincode::serialize(&encode_meta(snapshot)?)?;
    storage.write(META_BLOB, &seal(META_MAGIC, generation, &meta, compression))?;

    if let Err(err) = remove_stale_blobs(storage, generation) {
        warn!("generation {} committed, but old blobs were not removed: {}", generation, err);
    }
    Ok(())
}

fn remove_stale_blobs(storage: &dyn Storage, keep: u64) -> Result<()> {
    for name in storage.list()? {
        if blob_generation(&name).is_some_and(|generation| generation != keep) {
            storage.delete(&name)?;
        }
    }
    Ok(())
}

/// Metadata of the last commit, without decoding postings or stored fields.
pub fn load_meta(storage: &dyn Storage) -> Result<Option<IndexMeta>> {
    let Some(meta_bytes) = storage.read(META_BLOB)? else {
        return Ok(None);
    };
    let (meta_generation, meta) = unseal(META_MAGIC, &meta_bytes)?;
    let meta: IndexMeta = bincode::deserialize(&meta)?;
    if meta.generation != meta_generation {
        return Err(Error::Corrupt(format!(
            "metadata header says generation {}, body says {}",
            meta_generation, meta.generation
        )));
    }
    Ok(Some(meta))
}

/// Load the last committed snapshot, or `None` for a storage never written.
pub fn load(storage: &dyn Storage) -> Result<Option<Snapshot>> {
    let Some(meta) = load_meta(storage)? else {
        return Ok(None);
    };

    let postings = read_blob(storage, &postings_blob(meta.generation), POSTINGS_MAGIC, meta.generation)?;
    let stored = read_blob(storage, &stored_blob(meta.generation), STORED_MAGIC, meta.generation)?;

    let mut terms = decode_postings(&postings)?;
    let mut index = InvertedIndex::new();
    for (name, field) in meta.fields {
        let docs = RoaringTreemap::deserialize_from(field.docs.as_slice())
            .map_err(|e| Error::Corrupt(format!("membership of '{}': {}", name, e)))?;
        let field_index = FieldIndex {
            terms: terms.remove(&name).unwrap_or_default(),
            docs,
            stats: field.stats,
        };
        index.insert_field(name, field_index);
    }
    if let Some(orphan) = terms.keys().next() {
        return Err(Error::Corrupt(format!("postings for undeclared field '{}'", orphan)));
    }

    let entries: Vec<(DocId, StoredFields)> = bincode::deserialize(&stored)?;
    let mut store = DocumentStore::new();
    for (doc_id, fields) in entries {
        store.put(doc_id, fields)
            .map_err(|_| Error::Corrupt(format!("document {} stored twice", doc_id)))?;
    }

    Ok(Some(Snapshot {
        generation: meta.generation,
        index,
        store,
        next_doc_id: meta.next_doc_id,
        committed_at: meta.committed_at,
    }))
}

fn read_blob(storage: &dyn Storage, name: &str, magic: [u8; 4], generation: u64) -> Result<Vec<u8>> {
    let bytes = storage
        .read(name)?
        .ok_or_else(|| Error::Corrupt(format!("{} is missing", name)))?;
    let (found, payload) = unseal(magic, &bytes)?;
    if found != generation {
        return Err(Error::Corrupt(format!(
            "{} is from generation {}, metadata from {}",
            name, found, generation
        )));
    }
    Ok(payload)
}

fn encode_meta(snapshot: &Snapshot) -> Result<IndexMeta> {
    let mut fields = BTreeMap::new();
    for name in snapshot.index.field_names() {
        let Some(field) = snapshot.index.field(name) else {
            continue;
        };
        let mut docs = Vec::with_capacity(field.docs().serialized_size());
        field.docs().serialize_into(&mut docs)?;
        fields.insert(name.to_string(), FieldMeta { stats: field.stats(), docs });
    }
    Ok(IndexMeta {
        generation: snapshot.generation,
        next_doc_id: snapshot.next_doc_id,
        committed_at: snapshot.committed_at,
        fields,
    })
}

fn seal(magic: [u8; 4], generation: u64, payload: &[u8], compression: CompressionType) -> Vec<u8> {
    let body = compress::compress(payload, compression);
    let mut out = Vec::with_capacity(HEADER_LEN + body.len());
    out.extend_from_slice(&magic);
    out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    out.push(compression.flag());
    out.extend_from_slice(&generation.to_le_bytes());
    out.extend_from_slice(&crc32fast::hash(&body).to_le_bytes());
    out.extend_from_slice(&body);
    out
}

/// Check header and checksum; returns (generation, payload).
fn unseal(magic: [u8; 4], bytes: &[u8]) -> Result<(u64, Vec<u8>)> {
    if bytes.len() < HEADER_LEN {
        return Err(Error::Corrupt("blob shorter than its header".to_string()));
    }
    let (header, body) = bytes.split_at(HEADER_LEN);
    if header[0..4] != magic {
        return Err(Error::Corrupt("bad magic".to_string()));
    }
    let version = u16::from_le_bytes([header[4], header[5]]);
    if version != FORMAT_VERSION {
        return Err(Error::Corrupt(format!("unsupported format version {}", version)));
    }
    let compression = CompressionType::from_flag(header[6])?;
    let generation = u64::from_le_bytes(le_array(&header[7..15]));
    let expected = u32::from_le_bytes(le_array(&header[15..19]));
    let actual = crc32fast::hash(body);
    if expected != actual {
        return Err(Error::Corrupt(format!(
            "checksum mismatch: expected {:08x}, found {:08x}",
            expected, actual
        )));
    }
    Ok((generation, compress::decompress(body, compression)?))
}

fn le_array<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(bytes);
    out
}

/// Payload: `fst_len: u64 LE`, the fst map (`field \0 term` → offset), then
/// the postings area it points into.
pub fn encode_postings(index: &InvertedIndex) -> Result<Vec<u8>> {
    let mut builder = MapBuilder::memory();
    let mut area = Vec::new();
    let mut key = Vec::new();

    // Field names sort before their `\0`-suffixed keys, so keys arrive in fst order.
    for name in index.field_names() {
        let Some(field) = index.field(name) else {
            continue;
        };
        for (term, list) in field.terms() {
            key.clear();
            key.extend_from_slice(name.as_bytes());
            key.push(0);
            key.extend_from_slice(term.as_bytes());
            builder.insert(&key, area.len() as u64)?;
            encode_list(&mut area, list);
        }
    }

    let fst_bytes = builder.into_inner()?;
    let mut out = Vec::with_capacity(8 + fst_bytes.len() + area.len());
    out.extend_from_slice(&(fst_bytes.len() as u64).to_le_bytes());
    out.extend_from_slice(&fst_bytes);
    out.extend_from_slice(&area);
    Ok(out)
}

pub fn decode_postings(payload: &[u8]) -> Result<HashMap<String, BTreeMap<String, PostingList>>> {
    if payload.len() < 8 {
        return Err(Error::Corrupt("postings payload truncated".to_string()));
    }
    let fst_len = u64::from_le_bytes(le_array(&payload[..8])) as usize;
    let fst_end = 8usize
        .checked_add(fst_len)
        .filter(|&end| end <= payload.len())
        .ok_or_else(|| Error::Corrupt("term dictionary overruns payload".to_string()))?;
    let map = Map::new(payload[8..fst_end].to_vec())?;
    let area = &payload[fst_end..];

    let mut fields: HashMap<String, BTreeMap<String, PostingList>> = HashMap::new();
    let mut stream = map.stream();
    while let Some((key, offset)) = stream.next() {
        let split = key
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| Error::Corrupt("term key without field separator".to_string()))?;
        let field = std::str::from_utf8(&key[..split])
            .map_err(|_| Error::Corrupt("field name is not UTF-8".to_string()))?;
        let term = std::str::from_utf8(&key[split + 1..])
            .map_err(|_| Error::Corrupt("term is not UTF-8".to_string()))?;

        let offset = offset as usize;
        if offset > area.len() {
            return Err(Error::Corrupt(format!("postings offset {} out of range", offset)));
        }
        let list = decode_list(&area[offset..])?;
        fields
            .entry(field.to_string())
            .or_default()
            .insert(term.to_string(), list);
    }
    Ok(fields)
}

fn encode_list(out: &mut Vec<u8>, list: &PostingList) {
    VByteEncoder::encode_u64(out, list.len() as u64);
    let mut prev_doc = 0u64;
    for posting in list {
        VByteEncoder::encode_u64(out, posting.doc_id.value() - prev_doc);
        prev_doc = posting.doc_id.value();
        VByteEncoder::encode_u32(out, posting.term_freq);
        let mut prev_pos = 0u32;
        for &position in &posting.positions {
            VByteEncoder::encode_u32(out, position - prev_pos);
            prev_pos = position;
        }
    }
}

fn decode_list(data: &[u8]) -> Result<PostingList> {
    let mut reader = VByteReader::new(data);
    let len = reader.read_u64()? as usize;
    let mut postings = Vec::with_capacity(len.min(data.len()));
    let mut doc = 0u64;
    for _ in 0..len {
        doc = doc
            .checked_add(reader.read_u64()?)
            .ok_or_else(|| Error::Corrupt("doc id overflow".to_string()))?;
        let term_freq = reader.read_u32()?;
        let mut positions = Vec::with_capacity((term_freq as usize).min(data.len()));
        let mut position = 0u32;
        for _ in 0..term_freq {
            position = position
                .checked_add(reader.read_u32()?)
                .ok_or_else(|| Error::Corrupt("position overflow".to_string()))?;
            positions.push(position);
        }
        postings.push(Posting::new(DocId(doc), positions));
    }
    PostingList::from_postings(postings)
        .ok_or_else(|| Error::Corrupt("duplicate document in postings list".to_string()))
}
