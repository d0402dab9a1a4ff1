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

use crate::blocks::BlockHeader;

/// The three head markers, read and replaced together
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainHead {
    /// Highest known header
    pub header: BlockHeader,
    /// Highest block with body and receipts
    pub fast_block: BlockHeader,
    /// Highest block with committed state
    pub block: BlockHeader,
}

impl ChainHead {
    pub fn new(header: BlockHeader, fast_block: BlockHeader, block: BlockHeader) -> Self {
        Self {
            header,
            fast_block,
            block,
        }
    }

    /// A chain head with every marker at `header`
    pub fn at(header: BlockHeader) -> Self {
        Self::new(header.clone(), header.clone(), header)
    }

    /// Returns true if `block <= fast_block <= header` by number
    pub fn is_ordered(&self) -> bool {
        self.block.number <= self.fast_block.number && self.fast_block.number <= self.header.number
    }
}
