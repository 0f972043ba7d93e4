use md5::Md5;
use mirrordiff_common::{Digest, HashAlgo, Result};
use sha2::{Digest as _, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Fixed block size for streaming reads; memory stays bounded regardless of
/// file size.
const BLOCK_SIZE: usize = 4 * 1024 * 1024;

enum Hasher {
    Blake3(blake3::Hasher),
    Sha256(Sha256),
    Md5(Md5),
}

impl Hasher {
    fn new(algo: HashAlgo) -> Self {
        match algo {
            HashAlgo::Blake3 => Hasher::Blake3(blake3::Hasher::new()),
            HashAlgo::Sha256 => Hasher::Sha256(Sha256::new()),
            HashAlgo::Md5 => Hasher::Md5(Md5::new()),
        }
    }

    fn update(&mut self, data: &[u8]) {
        match self {
            Hasher::Blake3(h) => {
                h.update(data);
            }
            Hasher::Sha256(h) => h.update(data),
            Hasher::Md5(h) => h.update(data),
        }
    }

    fn finalize(self) -> Digest {
        match self {
            Hasher::Blake3(h) => Digest::new(h.finalize().as_bytes().to_vec()),
            Hasher::Sha256(h) => Digest::new(h.finalize().to_vec()),
            Hasher::Md5(h) => Digest::new(h.finalize().to_vec()),
        }
    }
}

/// Compute a digest over the file's full contents with streamed block reads
pub fn hash_file(path: &Path, algo: HashAlgo) -> Result<Digest> {
    let mut file = File::open(path)?;
    let mut hasher = Hasher::new(algo);
    let mut buffer = vec![0u8; BLOCK_SIZE];

    loop {
        let n = file.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(hasher.finalize())
}
