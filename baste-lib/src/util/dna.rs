use lazy_static::lazy_static;

/// Canonical base codes. Everything the engine scores is one of these five
/// values after the soft-mask flag has been stripped.
pub const BASE_A: u8 = 0;
pub const BASE_C: u8 = 1;
pub const BASE_G: u8 = 2;
pub const BASE_T: u8 = 3;
/// The ambiguity code; any unrecognised input base encodes to this.
pub const BASE_N: u8 = 4;

/// Soft-mask flag carried alongside the base code. Masking never affects
/// scoring; it is preserved so reported alignments can render masked bases
/// in lowercase.
pub const MASK_FLAG: u8 = 0x08;

/// Gap marker emitted in reported (gapped) alignments.
pub const GAP_MARKER: u8 = b'-';

const BASE_CHARS: [u8; 5] = *b"ACGTN";

lazy_static! {
    /// An array-based lookup from ASCII to base code. Lowercase input encodes
    /// with the soft-mask flag set.
    pub static ref ENCODE: [u8; 256] = {
        let mut table = [BASE_N; 256];
        for (code, &ch) in BASE_CHARS.iter().enumerate() {
            table[ch as usize] = code as u8;
            table[ch as usize + 32] = code as u8 | MASK_FLAG;
        }
        table
    };
}

/// Strips the soft-mask flag, leaving the bare base code.
#[inline]
pub fn base_code(symbol: u8) -> u8 {
    symbol & !MASK_FLAG
}

/// Returns true if the symbol carries the soft-mask flag.
#[inline]
pub fn is_masked(symbol: u8) -> bool {
    symbol & MASK_FLAG != 0
}

/// Encodes one ASCII base into a base code, preserving lowercase as masked.
#[inline]
pub fn encode_base(ch: u8) -> u8 {
    ENCODE[ch as usize]
}

/// Encodes an ASCII sequence into base codes.
pub fn encode(seq: &[u8]) -> Vec<u8> {
    seq.iter().map(|&ch| encode_base(ch)).collect()
}

/// Decodes one base code back to ASCII; masked codes render lowercase.
#[inline]
pub fn decode_base(symbol: u8) -> u8 {
    let ch = BASE_CHARS[(base_code(symbol) as usize).min(BASE_N as usize)];
    if is_masked(symbol) {
        ch + 32
    } else {
        ch
    }
}
