/// Knobs for a [`PngDecoder`](crate::PngDecoder).
///
/// Both checks are on by default. Turning them off decodes files whose
/// checksums were never filled in, at the cost of letting corrupt data
/// through as long as it still parses.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DecodeOptions {
    pub(crate) verify_chunk_crc: bool,
    pub(crate) verify_adler32: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self { verify_chunk_crc: true, verify_adler32: true }
    }
}

impl DecodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check the CRC-32 at the end of every chunk up to IEND.
    pub fn verify_chunk_crc(mut self, verify: bool) -> Self {
        self.verify_chunk_crc = verify;
        self
    }

    /// Check the Adler-32 trailer of the zlib stream. When off, the trailer
    /// may be missing entirely.
    pub fn verify_adler32(mut self, verify: bool) -> Self {
        self.verify_adler32 = verify;
        self
    }

    pub fn verifies_chunk_crc(&self) -> bool {
        self.verify_chunk_crc
    }

    pub fn verifies_adler32(&self) -> bool {
        self.verify_adler32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_verify_everything() {
        let options = DecodeOptions::new();
        assert!(options.verifies_chunk_crc());
        assert!(options.verifies_adler32());
    }

    #[test]
    fn setters_chain() {
        let options = DecodeOptions::default().verify_chunk_crc(false).verify_adler32(false);
        assert!(!options.verifies_chunk_crc());
        assert!(!options.verifies_adler32());

        let options = options.verify_adler32(true);
        assert!(!options.verifies_chunk_crc());
        assert!(options.verifies_adler32());
    }
}
