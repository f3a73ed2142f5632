use crate::error::GeometryError;

/// Shape of a set-associative cache.
///
/// An address is split as `| tag | set index (s bits) | block offset (b bits) |`,
/// block offset in the least significant bits.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Geometry {
    set_bits: u32,
    lines_per_set: usize,
    block_bits: u32,
    set_index_mask: u64,
    offset_mask: u64,
}

/// The three fields an address decomposes into.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct AddressFields {
    pub tag: u64,
    pub set_index: usize,
    pub offset: u64,
}

impl Geometry {
    /// `set_bits` = s, `lines_per_set` = E, `block_bits` = b.
    ///
    /// `s` and `b` may be zero (a single set, single-byte blocks), `E` may not.
    /// `s + b` must stay below 64 so the tag is never shifted out entirely.
    pub fn new(set_bits: u32, lines_per_set: usize, block_bits: u32) -> Result<Self, GeometryError> {
        if lines_per_set == 0 {
            return Err(GeometryError::NoLinesPerSet);
        }

        if set_bits
            .checked_add(block_bits)
            .is_none_or(|index_bits| index_bits >= u64::BITS)
            || set_bits >= usize::BITS
        {
            return Err(GeometryError::AddressTooNarrow {
                set_bits,
                block_bits,
            });
        }

        Ok(Self {
            set_bits,
            lines_per_set,
            block_bits,
            set_index_mask: !(!0u64 << set_bits),
            offset_mask: !(!0u64 << block_bits),
        })
    }

    pub fn set_bits(&self) -> u32 {
        self.set_bits
    }

    pub fn block_bits(&self) -> u32 {
        self.block_bits
    }

    /// E
    pub fn lines_per_set(&self) -> usize {
        self.lines_per_set
    }

    /// S = 2^s
    pub fn sets(&self) -> usize {
        1usize << self.set_bits
    }

    /// B = 2^b
    pub fn block_size(&self) -> u64 {
        1u64 << self.block_bits
    }

    pub fn tag_bits(&self) -> u32 {
        u64::BITS - (self.set_bits + self.block_bits)
    }

    pub fn decompose(&self, address: u64) -> AddressFields {
        // set_bits < usize::BITS, so the masked value always fits
        let set_index = ((address >> self.block_bits) & self.set_index_mask) as usize;

        AddressFields {
            tag: address >> (self.set_bits + self.block_bits),
            set_index,
            offset: address & self.offset_mask,
        }
    }

    pub fn format_info(&self) -> String {
        [
            "Set-Associative LRU Cache:".to_string(),
            format!(
                "\tTotal Size: {}B",
                self.block_size() as u128 * self.lines_per_set as u128 * self.sets() as u128
            ),
            format!("\tSets: {}", self.sets()),
            format!("\tLines per Set: {}", self.lines_per_set),
            format!("\tBlock-Size: {}B", self.block_size()),
            format!(
                "\t| {} tag bits | {} set bits | {} offset bits |",
                self.tag_bits(),
                self.set_bits,
                self.block_bits
            ),
        ]
        .join("\n")
    }
}

impl std::fmt::Display for Geometry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!(
            "s={} E={} b={} (S={} B={})",
            self.set_bits,
            self.lines_per_set,
            self.block_bits,
            self.sets(),
            self.block_size()
        ))
    }
}
