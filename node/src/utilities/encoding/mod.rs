use serde::de::DeserializeOwned;
use serde::Serialize;

/// Canonical byte form used for hashing, signing and block storage.
pub fn encode<M: Serialize>(message: &M) -> anyhow::Result<Vec<u8>> {
    Ok(serde_json::to_vec(message)?)
}

pub fn decode<M: DeserializeOwned>(bytes: &[u8]) -> anyhow::Result<M> {
    Ok(serde_json::from_slice(bytes)?)
}

pub fn to_hex<T: AsRef<[u8]>>(data: T) -> String {
    array_bytes::bytes2hex("", data)
}

pub fn from_hex<T: AsRef<str>>(data: T) -> anyhow::Result<Vec<u8>> {
    array_bytes::hex2bytes(data.as_ref())
        .map_err(|err| anyhow::anyhow!("Invalid hex string: {err:?}"))
}

pub trait Encode {
    fn encode(&self) -> anyhow::Result<Vec<u8>>;
}

pub trait Decode {
    fn decode(bytes: &[u8]) -> anyhow::Result<Self>
    where
        Self: Sized;
}
