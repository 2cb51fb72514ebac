//! Serialized-size estimation
//!
//! Sizes are the byte length of the compact JSON encoding, counted while
//! streaming so no buffer is allocated. Lazily resolved securities are not
//! part of a value's encoding and are not counted.

use crate::error::Result;
use crate::models::ComputationTarget;
use serde::Serialize;
use std::io;

#[derive(Default)]
struct ByteCounter {
    bytes: usize,
}

impl io::Write for ByteCounter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes += buf.len();
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Encoded size of `value` in bytes
pub fn estimate_size<T: Serialize + ?Sized>(value: &T) -> Result<usize> {
    let mut counter = ByteCounter::default();
    serde_json::to_writer(&mut counter, value)?;
    Ok(counter.bytes)
}

/// Encoded size of a target's specification plus its value
pub fn estimate_target_size(target: &ComputationTarget) -> Result<usize> {
    let specification = estimate_size(target.specification().as_ref())?;
    let value = match target.value() {
        Some(value) => estimate_size(value.as_ref())?,
        None => 0,
    };
    Ok(specification + value)
}
