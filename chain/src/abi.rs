//! Minimal ABI codec for the ticketing contract call surface
//!
//! The contract surface is small and fixed, so the codec is written out
//! explicitly instead of pulling in a full ABI machinery: 4-byte selectors
//! derived from the canonical signature, head/tail encoding for calls, and
//! a word-oriented reader for return data.

use alloy_primitives::{keccak256, Address, Bytes, B256, U256};

use crate::errors::{ChainError, ChainResult};

/// ABI word size in bytes
pub const WORD: usize = 32;

// Canonical signatures of the contract surface. Selectors are derived,
// never hardcoded, so the two can't drift apart.
pub const SIG_CREATE_EVENT: &str = "createEvent(string)";
pub const SIG_CREATE_TICKET_TYPE: &str = "createTicketType(uint256,uint256,uint256,string,string)";
pub const SIG_PURCHASE_TICKET: &str =
    "purchaseTicket(uint256,uint256,uint256,string,bytes32,bytes32,uint256[8])";
pub const SIG_TOGGLE_EVENT_STATUS: &str = "toggleEventStatus(uint256)";
pub const SIG_GET_EVENT: &str = "getEvent(uint256)";
pub const SIG_GET_TICKET_TYPE: &str = "getTicketType(uint256)";
pub const SIG_IS_VERIFIED: &str = "isVerified(uint256,bytes32)";
pub const SIG_BALANCE_OF: &str = "balanceOf(address,uint256)";
pub const SIG_PLATFORM_FEE_BPS: &str = "platformFeeBps()";

/// Derive the 4-byte function selector from a canonical signature.
pub fn selector(signature: &str) -> [u8; 4] {
    let digest = keccak256(signature.as_bytes());
    [digest[0], digest[1], digest[2], digest[3]]
}

/// An ABI-encodable argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Uint(U256),
    Address(Address),
    Bool(bool),
    FixedBytes(B256),
    String(String),
    /// Fixed-size uint256 array, encoded inline in the head
    FixedUints(Vec<U256>),
    /// Dynamic uint256 array, encoded in the tail
    UintArray(Vec<U256>),
}

impl Token {
    fn head_words(&self) -> usize {
        match self {
            Token::FixedUints(values) => values.len(),
            _ => 1,
        }
    }

    fn is_dynamic(&self) -> bool {
        matches!(self, Token::String(_) | Token::UintArray(_))
    }
}

fn push_uint(out: &mut Vec<u8>, value: U256) {
    out.extend_from_slice(&value.to_be_bytes::<WORD>());
}

fn push_usize(out: &mut Vec<u8>, value: usize) {
    push_uint(out, U256::from(value));
}

fn push_padded(out: &mut Vec<u8>, data: &[u8]) {
    out.extend_from_slice(data);
    let rem = data.len() % WORD;
    if rem != 0 {
        out.extend_from_slice(&[0u8; WORD][..WORD - rem]);
    }
}

/// Encode a token sequence without a selector (return data / tuple form).
pub fn encode_tokens(tokens: &[Token]) -> Vec<u8> {
    let head_len: usize = tokens.iter().map(|t| t.head_words() * WORD).sum();

    let mut head = Vec::with_capacity(head_len);
    let mut tail: Vec<u8> = Vec::new();

    for token in tokens {
        match token {
            Token::Uint(v) => push_uint(&mut head, *v),
            Token::Address(a) => {
                head.extend_from_slice(&[0u8; 12]);
                head.extend_from_slice(a.as_slice());
            }
            Token::Bool(b) => push_uint(&mut head, U256::from(*b as u8)),
            Token::FixedBytes(b) => head.extend_from_slice(b.as_slice()),
            Token::FixedUints(values) => {
                for v in values {
                    push_uint(&mut head, *v);
                }
            }
            Token::String(s) => {
                push_usize(&mut head, head_len + tail.len());
                push_usize(&mut tail, s.len());
                push_padded(&mut tail, s.as_bytes());
            }
            Token::UintArray(values) => {
                push_usize(&mut head, head_len + tail.len());
                push_usize(&mut tail, values.len());
                for v in values {
                    push_uint(&mut tail, *v);
                }
            }
        }
    }

    head.extend_from_slice(&tail);
    head
}

/// Encode a full contract call: selector followed by encoded arguments.
pub fn encode_call(signature: &str, tokens: &[Token]) -> Bytes {
    let args = encode_tokens(tokens);
    let mut data = Vec::with_capacity(4 + args.len());
    data.extend_from_slice(&selector(signature));
    data.extend_from_slice(&args);
    Bytes::from(data)
}

/// Split calldata into selector and argument bytes.
pub fn strip_selector(data: &[u8]) -> ChainResult<([u8; 4], &[u8])> {
    if data.len() < 4 {
        return Err(ChainError::Codec("calldata shorter than selector".into()));
    }
    Ok(([data[0], data[1], data[2], data[3]], &data[4..]))
}

/// Word-oriented reader over ABI-encoded data (return data or calldata
/// with the selector already stripped).
pub struct Decoder<'a> {
    data: &'a [u8],
}

impl<'a> Decoder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    fn word(&self, index: usize) -> ChainResult<&'a [u8]> {
        let start = index * WORD;
        let end = start + WORD;
        if end > self.data.len() {
            return Err(ChainError::Codec(format!(
                "word {} out of bounds (data is {} bytes)",
                index,
                self.data.len()
            )));
        }
        Ok(&self.data[start..end])
    }

    pub fn uint(&self, index: usize) -> ChainResult<U256> {
        Ok(U256::from_be_slice(self.word(index)?))
    }

    pub fn u64(&self, index: usize) -> ChainResult<u64> {
        let value = self.uint(index)?;
        u64::try_from(value)
            .map_err(|_| ChainError::ValueOverflow(format!("word {index} does not fit in u64")))
    }

    pub fn u16(&self, index: usize) -> ChainResult<u16> {
        let value = self.uint(index)?;
        u16::try_from(value)
            .map_err(|_| ChainError::ValueOverflow(format!("word {index} does not fit in u16")))
    }

    pub fn address(&self, index: usize) -> ChainResult<Address> {
        let word = self.word(index)?;
        if word[..12].iter().any(|b| *b != 0) {
            return Err(ChainError::Codec(format!("word {index} is not an address")));
        }
        Ok(Address::from_slice(&word[12..]))
    }

    pub fn bool_at(&self, index: usize) -> ChainResult<bool> {
        let value = self.uint(index)?;
        if value > U256::from(1u8) {
            return Err(ChainError::Codec(format!("word {index} is not a bool")));
        }
        Ok(value == U256::from(1u8))
    }

    pub fn b256(&self, index: usize) -> ChainResult<B256> {
        Ok(B256::from_slice(self.word(index)?))
    }

    /// Read the dynamic-field byte offset stored in head slot `index`.
    pub fn offset(&self, index: usize) -> ChainResult<usize> {
        let value = self.uint(index)?;
        usize::try_from(value)
            .map_err(|_| ChainError::ValueOverflow(format!("offset at word {index}")))
    }

    pub fn string_at(&self, byte_offset: usize) -> ChainResult<String> {
        let bytes = self.dynamic_bytes(byte_offset, 1)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| ChainError::Codec(format!("invalid utf-8 string: {e}")))
    }

    pub fn uint_array_at(&self, byte_offset: usize) -> ChainResult<Vec<U256>> {
        let bytes = self.dynamic_bytes(byte_offset, WORD)?;
        Ok(bytes
            .chunks_exact(WORD)
            .map(U256::from_be_slice)
            .collect())
    }

    /// Read a length-prefixed dynamic region where each element occupies
    /// `elem_size` bytes (before padding).
    fn dynamic_bytes(&self, byte_offset: usize, elem_size: usize) -> ChainResult<&'a [u8]> {
        // offsets come from untrusted return data; arithmetic must not wrap
        let start = byte_offset
            .checked_add(WORD)
            .ok_or_else(|| ChainError::Codec("dynamic offset out of bounds".into()))?;
        if start > self.data.len() {
            return Err(ChainError::Codec("dynamic offset out of bounds".into()));
        }
        let len_word = U256::from_be_slice(&self.data[byte_offset..start]);
        let len = usize::try_from(len_word)
            .map_err(|_| ChainError::ValueOverflow("dynamic length".into()))?;
        let byte_len = len
            .checked_mul(elem_size)
            .ok_or_else(|| ChainError::ValueOverflow("dynamic length".into()))?;
        let end = start
            .checked_add(byte_len)
            .ok_or_else(|| ChainError::ValueOverflow("dynamic length".into()))?;
        if end > self.data.len() {
            return Err(ChainError::Codec("dynamic data out of bounds".into()));
        }
        Ok(&self.data[start..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selectors_are_distinct() {
        let sigs = [
            SIG_CREATE_EVENT,
            SIG_CREATE_TICKET_TYPE,
            SIG_PURCHASE_TICKET,
            SIG_TOGGLE_EVENT_STATUS,
            SIG_GET_EVENT,
            SIG_GET_TICKET_TYPE,
            SIG_IS_VERIFIED,
            SIG_BALANCE_OF,
            SIG_PLATFORM_FEE_BPS,
        ];
        let mut seen = std::collections::HashSet::new();
        for sig in sigs {
            assert!(seen.insert(selector(sig)), "selector collision for {sig}");
        }
    }

    #[test]
    fn test_static_call_layout() {
        let data = encode_call(
            SIG_IS_VERIFIED,
            &[
                Token::Uint(U256::from(7)),
                Token::FixedBytes(B256::repeat_byte(0xab)),
            ],
        );
        assert_eq!(data.len(), 4 + 2 * WORD);
        assert_eq!(&data[..4], &selector(SIG_IS_VERIFIED));
        // second argument occupies the second word verbatim
        assert_eq!(&data[4 + WORD..], B256::repeat_byte(0xab).as_slice());
    }

    #[test]
    fn test_string_tail_offset() {
        let data = encode_call(SIG_CREATE_EVENT, &[Token::String("Devcon".into())]);
        let dec = Decoder::new(&data[4..]);
        let offset = dec.offset(0).unwrap();
        // single-argument call: tail starts right after the one head word
        assert_eq!(offset, WORD);
        assert_eq!(dec.string_at(offset).unwrap(), "Devcon");
    }

    #[test]
    fn test_fixed_uints_are_inline() {
        let proof: Vec<U256> = (0..8).map(U256::from).collect();
        let encoded = encode_tokens(&[Token::Uint(U256::from(1)), Token::FixedUints(proof)]);
        // no offset word: 1 + 8 head words, empty tail
        assert_eq!(encoded.len(), 9 * WORD);
        let dec = Decoder::new(&encoded);
        assert_eq!(dec.uint(3).unwrap(), U256::from(2));
    }

    #[test]
    fn test_huge_dynamic_offset_is_codec_error() {
        // a corrupt node can return an offset word near usize::MAX; the
        // decoder must answer with a codec error, not wrap around
        let data = U256::from(usize::MAX - 8).to_be_bytes::<WORD>();
        let dec = Decoder::new(&data);
        let offset = dec.offset(0).unwrap();
        assert!(matches!(dec.string_at(offset), Err(ChainError::Codec(_))));
        assert!(matches!(dec.uint_array_at(offset), Err(ChainError::Codec(_))));
    }

    #[test]
    fn test_decoder_rejects_short_data() {
        let dec = Decoder::new(&[0u8; 16]);
        assert!(matches!(dec.uint(0), Err(ChainError::Codec(_))));
    }

    #[test]
    fn test_bool_decoding_is_strict() {
        let mut word = [0u8; 32];
        word[31] = 2;
        let dec = Decoder::new(&word);
        assert!(dec.bool_at(0).is_err());
    }
}
