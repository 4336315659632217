// DOVESIM: Vanilla BGP Path Inference and Dovetail Path Sampling on the AS Graph
// Copyright (C) 2024-2025 Roland Schmid <roschmi@ethz.ch> and Tibor Schneider <sctibor@ethz.ch>
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
//! The path-file index ("pfi"): a flat static hash index over a text file of
//! path lines.
//!
//! The index maps the endpoint pair of each line to the line's byte offset
//! in the path file, using open addressing with quadratic probing over a
//! prime number of fixed-width bins. Bins are initialized to all-0xFF; a bin
//! is considered empty iff its highest-address byte reads 0xFF. That check
//! misfires for offsets carrying 0xFF in that byte position, but the quirk
//! is part of the on-disk format and must be preserved.
//!
//! With `num_bins` the next prime above twice the key count, the load factor
//! stays below 0.5, so the probe sequence always reaches an empty bin and
//! expected probing is O(1).

use std::{
    fs::{self, File},
    io::{self, BufRead, BufReader, Read, Seek, SeekFrom, Write},
    path::Path,
};

use memmap2::Mmap;
use xxhash_rust::xxh64::xxh64;

/// Three little-endian `u64` fields.
pub const HEADER_SIZE: u64 = 24;

const FILL_CHUNK: usize = 4096;
const HASH_SEED: u64 = 0;

/// The index-file header: slot geometry of the bin region.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct IndexMeta {
    pub header_size: u64,
    pub num_bins: u64,
    pub bytes_per_bin: u64,
}

impl IndexMeta {
    /// Geometry for a path file with `num_keys` indexable lines and a total
    /// size of `path_file_bytes`.
    pub fn new(num_keys: u64, path_file_bytes: u64) -> Self {
        Self {
            header_size: HEADER_SIZE,
            num_bins: next_prime(2 * num_keys),
            bytes_per_bin: bytes_per_bin(path_file_bytes),
        }
    }

    pub fn index_file_size(&self) -> u64 {
        self.header_size + self.num_bins * self.bytes_per_bin
    }

    fn bin_offset(&self, bin: u64) -> u64 {
        self.header_size + bin * self.bytes_per_bin
    }

    /// Quadratic probing: the `i`-th candidate bin for `hash`.
    fn bin_index(&self, hash: u64, i: u64) -> u64 {
        hash.wrapping_add(i.wrapping_mul(i)) % self.num_bins
    }

    fn write_to<W: Write>(&self, mut out: W) -> io::Result<()> {
        out.write_all(&self.header_size.to_le_bytes())?;
        out.write_all(&self.num_bins.to_le_bytes())?;
        out.write_all(&self.bytes_per_bin.to_le_bytes())
    }

    fn read_from(bytes: &[u8]) -> Self {
        let field = |i: usize| {
            u64::from_le_bytes(bytes[8 * i..8 * (i + 1)].try_into().unwrap())
        };
        Self {
            header_size: field(0),
            num_bins: field(1),
            bytes_per_bin: field(2),
        }
    }
}

/// The smallest prime strictly greater than `n`.
pub fn next_prime(n: u64) -> u64 {
    let mut candidate = n + 1;
    while !is_prime(candidate) {
        candidate += 1;
    }
    candidate
}

fn is_prime(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    if n % 2 == 0 {
        return n == 2;
    }
    let mut d = 3;
    while d * d <= n {
        if n % d == 0 {
            return false;
        }
        d += 2;
    }
    true
}

/// The smallest byte width able to address any byte offset of a file of
/// `num_bytes`: `ceil((log2(num_bytes) + 1) / 8)`.
pub fn bytes_per_bin(num_bytes: u64) -> u64 {
    if num_bytes == 0 {
        return 1;
    }
    (((num_bytes as f64).log2() + 1.0) / 8.0).ceil() as u64
}

/// The stable 64-bit hash both builder and reader use.
pub fn hash_key(key: &str) -> u64 {
    xxh64(key.as_bytes(), HASH_SEED)
}

/// The lookup key of a path line: first hop, one space, last hop. `None`
/// for lines without a space (single-hop paths are not indexable).
pub fn line_key(line: &str) -> Option<String> {
    let line = line.strip_suffix('\n').unwrap_or(line);
    let first_space = line.find(' ')?;
    let last_space = line.rfind(' ').unwrap();
    Some(format!(
        "{} {}",
        &line[..first_space],
        &line[last_space + 1..]
    ))
}

fn bin_is_blank(file: &mut File, meta: &IndexMeta, bin: u64) -> io::Result<bool> {
    let width = meta.bytes_per_bin as usize;
    let mut buf = [0u8; 8];
    file.seek(SeekFrom::Start(meta.bin_offset(bin)))?;
    file.read_exact(&mut buf[..width])?;
    Ok(buf[width - 1] == 0xFF)
}

fn index_insert(file: &mut File, meta: &IndexMeta, hash: u64, offset: u64) -> io::Result<()> {
    let mut i = 0;
    loop {
        let bin = meta.bin_index(hash, i);
        if bin_is_blank(file, meta, bin)? {
            file.seek(SeekFrom::Start(meta.bin_offset(bin)))?;
            return file.write_all(&offset.to_le_bytes()[..meta.bytes_per_bin as usize]);
        }
        i += 1;
    }
}

/// Allocate the index file filled with 0xFF, in page-sized chunks.
fn create_ff_file(filename: &Path, num_bytes: u64) -> io::Result<File> {
    let mut file = File::options()
        .read(true)
        .write(true)
        .create(true)
        .truncate(true)
        .open(filename)?;

    let chunk = [0xFFu8; FILL_CHUNK];
    let mut remaining = num_bytes;
    while remaining > 0 {
        let n = remaining.min(FILL_CHUNK as u64) as usize;
        file.write_all(&chunk[..n])?;
        remaining -= n as u64;
    }

    file.seek(SeekFrom::Start(0))?;
    Ok(file)
}

/// Build the static index of `path_filename` at `index_filename`.
///
/// Lines without a space are skipped with a warning. Duplicate endpoint
/// pairs are not detected; each occupies its own slot.
pub fn build_index(path_filename: &Path, index_filename: &Path) -> io::Result<IndexMeta> {
    // First pass: count the indexable lines to size the bin region.
    let mut num_keys = 0u64;
    for line in BufReader::new(File::open(path_filename)?).lines() {
        if line_key(&line?).is_some() {
            num_keys += 1;
        }
    }
    let path_file_bytes = fs::metadata(path_filename)?.len();

    let meta = IndexMeta::new(num_keys, path_file_bytes);
    log::info!("path file lines to index: {num_keys}");
    log::info!("path file bytes: {path_file_bytes}");
    log::info!("num bins: {}", meta.num_bins);
    log::info!("bytes per bin: {}", meta.bytes_per_bin);

    let mut index_file = create_ff_file(index_filename, meta.index_file_size())?;
    meta.write_to(&mut index_file)?;

    // Second pass: hash every indexable line and record its byte offset.
    let mut path_file = BufReader::new(File::open(path_filename)?);
    let mut line = String::new();
    let mut offset = 0u64;
    let mut num_indexed = 0u64;

    loop {
        line.clear();
        let num_read = path_file.read_line(&mut line)?;
        if num_read == 0 {
            break;
        }

        match line_key(&line) {
            Some(key) => {
                index_insert(&mut index_file, &meta, hash_key(&key), offset)?;
                num_indexed += 1;
                if num_indexed % 100_000 == 0 {
                    log::info!("indexed {num_indexed} lines");
                }
            }
            None => log::warn!("skipping line {:?}", line.trim_end()),
        }

        offset += num_read as u64;
    }

    log::info!("job complete, indexed {num_indexed} lines in total");
    Ok(meta)
}

/// Memory-mapped read side of the index.
pub struct PfiReader {
    meta: IndexMeta,
    index: Mmap,
    path_file: File,
}

impl PfiReader {
    pub fn open(path_filename: &Path, index_filename: &Path) -> io::Result<Self> {
        let index_file = File::open(index_filename)?;
        let index = unsafe { Mmap::map(&index_file)? };

        if index.len() < HEADER_SIZE as usize {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "index file too short for its header",
            ));
        }
        let meta = IndexMeta::read_from(&index[..HEADER_SIZE as usize]);

        Ok(Self {
            meta,
            index,
            path_file: File::open(path_filename)?,
        })
    }

    pub fn meta(&self) -> IndexMeta {
        self.meta
    }

    /// Integrity check: the index file must be exactly as large as its
    /// header claims.
    pub fn verify(&self) -> bool {
        self.index.len() as u64 == self.meta.index_file_size()
    }

    fn bin_slot(&self, bin: u64) -> &[u8] {
        let start = self.meta.bin_offset(bin) as usize;
        &self.index[start..start + self.meta.bytes_per_bin as usize]
    }

    /// Look up the path from `src` to `dst`. Follows the probe sequence,
    /// checking each stored offset against the path file, until the line
    /// with matching endpoints or an empty bin.
    pub fn get_path(&mut self, src: &str, dst: &str) -> io::Result<Option<Vec<String>>> {
        if src == dst {
            return Ok(Some(vec![src.to_string()]));
        }

        let hash = hash_key(&format!("{src} {dst}"));

        let mut i = 0;
        loop {
            let slot = self.bin_slot(self.meta.bin_index(hash, i));
            if slot[slot.len() - 1] == 0xFF {
                return Ok(None);
            }

            let mut bytes = [0u8; 8];
            bytes[..slot.len()].copy_from_slice(slot);
            let offset = u64::from_le_bytes(bytes);

            self.path_file.seek(SeekFrom::Start(offset))?;
            let mut line = String::new();
            BufReader::new(&self.path_file).read_line(&mut line)?;

            let hops: Vec<String> = line.split_whitespace().map(str::to_string).collect();
            if hops.first().map(String::as_str) == Some(src)
                && hops.last().map(String::as_str) == Some(dst)
            {
                return Ok(Some(hops));
            }

            i += 1;
        }
    }
}
