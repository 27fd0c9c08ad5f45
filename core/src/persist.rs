use crate::dictionary::{Dictionaries, Dictionary};
use crate::index::InvertedIndex;
use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::fs::{create_dir_all, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: u32,
    pub num_terms: u32,
    pub inconsistencies: u32,
    pub created_at: String,
    pub version: u32,
}

pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    pub fn forward_dump(&self) -> PathBuf { self.root.join("forward_index.txt") }
    pub fn inverted_dump(&self) -> PathBuf { self.root.join("inverted_index.txt") }
    pub fn word_ids(&self) -> PathBuf { self.root.join("word_ids.txt") }
    pub fn doc_ids(&self) -> PathBuf { self.root.join("doc_ids.txt") }
    pub fn compressed_inverted(&self) -> PathBuf { self.root.join("inverted_index.bin.gz") }
    pub fn dictionaries(&self) -> PathBuf { self.root.join("dictionaries.bin") }
    pub fn meta(&self) -> PathBuf { self.root.join("meta.json") }
    pub fn file<S: AsRef<Path>>(&self, name: S) -> PathBuf { self.root.join(name) }
}

/// Create `path` and hand a buffered writer to `body`, attaching the path to any error.
pub fn write_file<F>(path: &Path, body: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> std::io::Result<()>,
{
    if let Some(parent) = path.parent() {
        create_dir_all(parent).with_context(|| format!("creating directory {}", parent.display()))?;
    }
    let f = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut w = BufWriter::new(f);
    body(&mut w).with_context(|| format!("writing {}", path.display()))?;
    w.flush().with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

/// `key: id1:count1; id2:count2` per line, keys and ids ascending.
pub fn write_index_dump<W, K, I>(w: &mut W, index: &BTreeMap<K, BTreeMap<I, u32>>) -> std::io::Result<()>
where
    W: Write,
    K: Display,
    I: Display,
{
    for (key, entries) in index {
        let joined = entries
            .iter()
            .map(|(id, count)| format!("{id}:{count}"))
            .collect::<Vec<_>>()
            .join("; ");
        writeln!(w, "{key}: {joined}")?;
    }
    Ok(())
}

/// `id: string` per line, ascending id.
pub fn write_id_map<W: Write>(w: &mut W, dict: &Dictionary) -> std::io::Result<()> {
    for (id, name) in dict.iter() {
        writeln!(w, "{id}: {name}")?;
    }
    Ok(())
}

pub fn save_compressed_inverted(paths: &IndexPaths, inverted: &InvertedIndex) -> Result<()> {
    let path = paths.compressed_inverted();
    write_file(&path, |w| {
        let mut gz = GzEncoder::new(w, Compression::default());
        bincode::serialize_into(&mut gz, inverted).map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        gz.finish()?;
        Ok(())
    })
}

pub fn load_compressed_inverted(paths: &IndexPaths) -> Result<InvertedIndex> {
    let path = paths.compressed_inverted();
    let f = File::open(&path).with_context(|| format!("opening {}", path.display()))?;
    let mut buf = Vec::new();
    GzDecoder::new(BufReader::new(f))
        .read_to_end(&mut buf)
        .with_context(|| format!("decompressing {}", path.display()))?;
    let inverted = bincode::deserialize(&buf).with_context(|| format!("decoding {}", path.display()))?;
    Ok(inverted)
}

pub fn save_dictionaries(paths: &IndexPaths, dicts: &Dictionaries) -> Result<()> {
    let path = paths.dictionaries();
    let bytes = bincode::serialize(dicts)?;
    write_file(&path, |w| w.write_all(&bytes))
}

pub fn load_dictionaries(paths: &IndexPaths) -> Result<Dictionaries> {
    let path = paths.dictionaries();
    let mut f = File::open(&path).with_context(|| format!("opening {}", path.display()))?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf).with_context(|| format!("reading {}", path.display()))?;
    let dicts = bincode::deserialize(&buf).with_context(|| format!("decoding {}", path.display()))?;
    Ok(dicts)
}

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<()> {
    let json = serde_json::to_string_pretty(meta)?;
    write_file(&paths.meta(), |w| w.write_all(json.as_bytes()))
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile> {
    let path = paths.meta();
    let buf = std::fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
    let meta: MetaFile = serde_json::from_str(&buf).with_context(|| format!("parsing {}", path.display()))?;
    Ok(meta)
}
