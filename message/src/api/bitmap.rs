//! Presence bitmaps: bit `b` of byte `i` set means id `1 + 8 * i + b` is present.

use crate::{
    Error,
    Result,
};

/// Length of the node bitmap in an init data response, covering node ids 1..=232.
pub const NODE_BITMAP_LEN: usize = 29;

/// Length of the supported function bitmap in a capabilities response.
pub const FUNCTION_BITMAP_LEN: usize = 32;

pub type NodeId = u8;

/// Ids present in `bitmap`, ascending.
pub fn ids(bitmap: &[u8]) -> impl Iterator<Item = usize> + '_ {
    bitmap.iter().enumerate().flat_map(|(i, &byte)| {
        (0..8).filter(move |bit| (byte & (1u8 << bit)) != 0).map(move |bit| 1 + 8 * i + bit)
    })
}

#[inline]
pub fn check_len(expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(Error::InvalidBitmapLength {
            expected,
            actual,
        });
    }

    Ok(())
}

/// Decode a node list bitmap, which must be exactly [`NODE_BITMAP_LEN`] bytes.
pub fn node_ids(bitmap: &[u8]) -> Result<Vec<NodeId>> {
    check_len(NODE_BITMAP_LEN, bitmap.len())?;

    Ok(ids(bitmap).filter_map(|id| NodeId::try_from(id).ok()).collect())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn single_bits() {
        assert_eq!(vec![1], ids(&[0x01]).collect::<Vec<_>>());
        assert_eq!(vec![8], ids(&[0x80]).collect::<Vec<_>>());
        assert_eq!(vec![9, 16], ids(&[0x00, 0x81]).collect::<Vec<_>>());
        assert_eq!(0, ids(&[0; 4]).count());
    }

    #[test]
    fn full_node_bitmap() {
        let nodes = node_ids(&[0xff; NODE_BITMAP_LEN]).unwrap();
        assert_eq!((1..=232).collect::<Vec<NodeId>>(), nodes);
    }

    #[test]
    fn node_bitmap_length() {
        assert_eq!(
            Err(Error::InvalidBitmapLength {
                expected: 29,
                actual:   28,
            }),
            node_ids(&[0; 28])
        );
    }
}
