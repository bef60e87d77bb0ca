use std::fmt;
use sha2::{Digest, Sha256};

/// SHA-256 of a template body or rendered file.
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ContentDigest([u8; 32]);

impl ContentDigest {
    pub fn of<T: AsRef<[u8]>>(data: T) -> Self {
        let hash = Sha256::digest(data.as_ref());
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&hash);
        ContentDigest(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl fmt::Debug for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ContentDigest({})", self)
    }
}
