// ordergate/src/codes.rs

//! Human-readable identifiers for orders and vouchers.

use crate::settings::CodeFormat;
use rand_core::{OsRng, RngCore};

/// Symbols used in generated codes. `0`, `O`, `1` and `I` are left out because they are
/// read back over the phone.
pub const CODE_ALPHABET: &[u8] = b"23456789ABCDEFGHJKLMNPQRSTUVWXYZ";

/// Source of candidate identifiers. Candidates may collide; callers retry on `DuplicateKey`.
pub trait CodeGenerator: Send + Sync {
  fn generate(&self, format: &CodeFormat) -> String;
}

/// Draws symbols from the operating system RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomCodes;

impl CodeGenerator for RandomCodes {
  fn generate(&self, format: &CodeFormat) -> String {
    let mut code = String::with_capacity(format.prefix.len() + format.length);
    code.push_str(&format.prefix);
    let alphabet_len = CODE_ALPHABET.len() as u32;
    for _ in 0..format.length {
      // 32 divides 2^32, so the modulo is unbiased.
      let idx = OsRng.next_u32() % alphabet_len;
      code.push(char::from(CODE_ALPHABET[idx as usize]));
    }
    code
  }
}
