// Copyright 2024. The Tari Project
//
// Redistribution and use in source and binary forms, with or without modification, are permitted provided that the
// following conditions are met:
//
// 1. Redistributions of source code must retain the above copyright notice, this list of conditions and the following
// disclaimer.
//
// 2. Redistributions in binary form must reproduce the above copyright notice, this list of conditions and the
// following disclaimer in the documentation and/or other materials provided with the distribution.
//
// 3. Neither the name of the copyright holder nor the names of its contributors may be used to endorse or promote
// products derived from this software without specific prior written permission.
//
// THIS SOFTWARE IS PROVIDED BY THE COPYRIGHT HOLDERS AND CONTRIBUTORS "AS IS" AND ANY EXPRESS OR IMPLIED WARRANTIES,
// INCLUDING, BUT NOT LIMITED TO, THE IMPLIED WARRANTIES OF MERCHANTABILITY AND FITNESS FOR A PARTICULAR PURPOSE ARE
// DISCLAIMED. IN NO EVENT SHALL THE COPYRIGHT HOLDER OR CONTRIBUTORS BE LIABLE FOR ANY DIRECT, INDIRECT, INCIDENTAL,
// SPECIAL, EXEMPLARY, OR CONSEQUENTIAL DAMAGES (INCLUDING, BUT NOT LIMITED TO, PROCUREMENT OF SUBSTITUTE GOODS OR
// SERVICES; LOSS OF USE, DATA, OR PROFITS; OR BUSINESS INTERRUPTION) HOWEVER CAUSED AND ON ANY THEORY OF LIABILITY,
// WHETHER IN CONTRACT, STRICT LIABILITY, OR TORT (INCLUDING NEGLIGENCE OR OTHERWISE) ARISING IN ANY WAY OUT OF THE
// USE OF THIS SOFTWARE, EVEN IF ADVISED OF THE POSSIBILITY OF SUCH DAMAGE.
//

use std::{
    fmt,
    fmt::{Debug, Display, Formatter},
};

use primitive_types::U256;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use thiserror::Error;

pub const FIXED_HASH_SIZE: usize = 32;

/// A 32-byte hash. Hashes order lexicographically by their big-endian bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct FixedHash([u8; FIXED_HASH_SIZE]);

pub type BlockHash = FixedHash;

/// Arbitrary precision is not needed for accumulated difficulty, 256 bits is plenty
pub type Difficulty = U256;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Invalid hash size, expected {} bytes but got {0}", FIXED_HASH_SIZE)]
pub struct FixedHashSizeError(pub usize);

impl FixedHash {
    pub const fn zero() -> Self {
        Self([0u8; FIXED_HASH_SIZE])
    }

    pub const fn new(bytes: [u8; FIXED_HASH_SIZE]) -> Self {
        Self(bytes)
    }

    /// Hashes `data` with Keccak-256
    pub fn digest(data: &[u8]) -> Self {
        Self::finalize(Keccak256::new().chain_update(data))
    }

    /// Completes a Keccak-256 hash
    pub fn finalize(hasher: Keccak256) -> Self {
        let mut buf = [0u8; FIXED_HASH_SIZE];
        buf.copy_from_slice(&hasher.finalize());
        Self(buf)
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; FIXED_HASH_SIZE]
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl From<[u8; FIXED_HASH_SIZE]> for FixedHash {
    fn from(bytes: [u8; FIXED_HASH_SIZE]) -> Self {
        Self(bytes)
    }
}

impl TryFrom<&[u8]> for FixedHash {
    type Error = FixedHashSizeError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let buf: [u8; FIXED_HASH_SIZE] = bytes.try_into().map_err(|_| FixedHashSizeError(bytes.len()))?;
        Ok(Self(buf))
    }
}

impl AsRef<[u8]> for FixedHash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Display for FixedHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Debug for FixedHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let hex = self.to_hex();
        write!(f, "{}..{}", &hex[..8], &hex[hex.len() - 8..])
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn it_orders_by_big_endian_bytes() {
        let mut low = [0u8; 32];
        low[31] = 0xff;
        let mut high = [0u8; 32];
        high[0] = 0x01;
        assert!(FixedHash::from(high) > FixedHash::from(low));
    }

    #[test]
    fn it_converts_from_slices() {
        let hash = FixedHash::digest(b"chainhead");
        assert_eq!(FixedHash::try_from(hash.as_slice()).unwrap(), hash);
        assert_eq!(FixedHash::try_from(&[1u8, 2][..]).unwrap_err(), FixedHashSizeError(2));
        assert!(FixedHash::zero().is_zero());
        assert_eq!(hash.to_string().len(), 64);
    }
}
