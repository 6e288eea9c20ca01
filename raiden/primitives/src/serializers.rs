use serde::{
	Serialize,
	Serializer,
};
use web3::types::U256;

use crate::types::{
	ChainID,
	U64,
};

/// Serialize a U256 as a decimal string.
pub fn u256_to_str<S>(v: &U256, serializer: S) -> Result<S::Ok, S::Error>
where
	S: Serializer,
{
	serializer.serialize_str(&v.to_string())
}

/// Serialize a u64 as a decimal string.
pub fn u64_to_str<S>(v: &u64, serializer: S) -> Result<S::Ok, S::Error>
where
	S: Serializer,
{
	serializer.serialize_str(&v.to_string())
}

impl Serialize for ChainID {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		let value: u64 = (*self).into();
		serializer.serialize_str(&value.to_string())
	}
}

impl Serialize for U64 {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(&self.to_string())
	}
}
