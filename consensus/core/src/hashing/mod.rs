use puzzle_hashes::HasherBase;

pub mod sighash;
pub mod sighash_type;
pub mod tx;

pub(crate) trait HasherExtensions {
    /// Writes the len as a compact-size integer
    fn write_len(&mut self, len: usize) -> &mut Self;

    /// Writes a compact-size integer: a single byte below 0xfd, otherwise a marker byte
    /// followed by the little endian u16, u32 or u64 value
    fn write_var_int(&mut self, value: u64) -> &mut Self;

    /// Writes the number of bytes followed by the bytes themselves
    fn write_var_bytes(&mut self, bytes: &[u8]) -> &mut Self;

    fn write_u32(&mut self, element: u32) -> &mut Self;

    fn write_u64(&mut self, element: u64) -> &mut Self;
}

/// Fails at compile time if `usize::MAX > u64::MAX`.
/// If `usize` will ever grow larger than `u64`, we need to verify
/// that the lossy conversion below at `write_len` remains precise.
const _: usize = u64::MAX as usize - usize::MAX;

impl<T: HasherBase> HasherExtensions for T {
    #[inline(always)]
    fn write_len(&mut self, len: usize) -> &mut Self {
        self.write_var_int(len as u64)
    }

    #[inline(always)]
    fn write_var_int(&mut self, value: u64) -> &mut Self {
        match value {
            0..=0xfc => self.update([value as u8]),
            0xfd..=0xffff => self.update([0xfd]).update((value as u16).to_le_bytes()),
            0x10000..=0xffff_ffff => self.update([0xfe]).update((value as u32).to_le_bytes()),
            _ => self.update([0xff]).update(value.to_le_bytes()),
        }
    }

    #[inline(always)]
    fn write_var_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.write_len(bytes.len()).update(bytes)
    }

    #[inline(always)]
    fn write_u32(&mut self, element: u32) -> &mut Self {
        self.update(element.to_le_bytes())
    }

    #[inline(always)]
    fn write_u64(&mut self, element: u64) -> &mut Self {
        self.update(element.to_le_bytes())
    }
}

/// Collects everything written to it. Used to produce wire serializations and
/// signature preimages with the same writers that feed the hashers.
#[derive(Default)]
pub(crate) struct PreimageHasher {
    pub(crate) buff: Vec<u8>,
}

impl HasherBase for PreimageHasher {
    fn update<A: AsRef<[u8]>>(&mut self, data: A) -> &mut Self {
        self.buff.extend_from_slice(data.as_ref());
        self
    }
}
