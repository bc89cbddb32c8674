use ethers_core::abi::{self, ParamType, Token};
use ethers_core::types::{Address, Bytes, U256};
use ethers_core::utils::id;

use crate::errors::{PresaleError, PresaleResult};

pub const TIERS: &str = "tiers(uint256)";
pub const USER_INFO: &str = "userInfo(address)";
pub const TIME_START: &str = "_TIME_START()";
pub const TIME_END: &str = "_TIME_END()";
pub const TOTAL_DEPOSIT: &str = "_TOTAL_DEPOSIT()";
pub const DEPOSIT: &str = "deposit()";
pub const BALANCE_OF: &str = "balanceOf(address)";

/// Selector followed by the ABI encoded arguments.
pub fn encode_call(signature: &str, args: &[Token]) -> Bytes {
    let mut data = id(signature).to_vec();
    data.extend_from_slice(&abi::encode(args));
    Bytes::from(data)
}

pub fn uint_arg(value: u64) -> Token {
    Token::Uint(U256::from(value))
}

pub fn address_arg(address: Address) -> Token {
    Token::Address(address)
}

/// Decodes the first 32-byte word of a return payload as `uint256`.
///
/// Struct getters such as `tiers` and `userInfo` return several words; only
/// the leading field is consumed.
pub fn decode_first_uint(signature: &str, data: &[u8]) -> PresaleResult<U256> {
    let tokens = abi::decode(&[ParamType::Uint(256)], data)
        .map_err(|err| {
            PresaleError::Abi(format!("{signature}: {err} (returned 0x{})", hex::encode(data)))
        })?;
    tokens
        .into_iter()
        .next()
        .and_then(Token::into_uint)
        .ok_or_else(|| PresaleError::Abi(format!("{signature}: missing uint256 word")))
}

/// Decodes a timestamp word, rejecting values that do not fit in `u64`.
pub fn decode_timestamp(signature: &str, data: &[u8]) -> PresaleResult<u64> {
    let value = decode_first_uint(signature, data)?;
    if value > U256::from(u64::MAX) {
        return Err(PresaleError::Abi(format!(
            "{signature}: timestamp {value} out of range"
        )));
    }
    Ok(value.low_u64())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_known_selectors() {
        assert_eq!(
            encode_call(BALANCE_OF, &[address_arg(Address::zero())]).to_vec()[..4],
            [0x70, 0xa0, 0x82, 0x31]
        );
        assert_eq!(encode_call(DEPOSIT, &[]).to_vec(), vec![0xd0, 0xe3, 0x0d, 0xb0]);

        let call = encode_call(TIERS, &[uint_arg(2)]);
        assert_eq!(call.len(), 4 + 32);
        assert_eq!(call[35], 2);
    }

    #[test]
    fn decodes_leading_word_of_struct_returns() {
        let payload = abi::encode(&[
            Token::Uint(U256::from(1_500u64)),
            Token::Uint(U256::from(7u64)),
        ]);
        assert_eq!(
            decode_first_uint(TIERS, &payload).expect("decode"),
            U256::from(1_500u64)
        );
        assert!(decode_first_uint(TIERS, &[]).is_err());
    }

    #[test]
    fn rejects_oversized_timestamps() {
        let payload = abi::encode(&[Token::Uint(U256::MAX)]);
        assert!(matches!(
            decode_timestamp(TIME_END, &payload),
            Err(PresaleError::Abi(_))
        ));
        let payload = abi::encode(&[Token::Uint(U256::from(1_700_000_000u64))]);
        assert_eq!(decode_timestamp(TIME_START, &payload).expect("decode"), 1_700_000_000);
    }
}
