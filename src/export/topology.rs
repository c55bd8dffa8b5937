// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Parent lookup for the exported bone hierarchy.

use crate::error::{Result, RigError};

/// Maps a keypoint index to the keypoint its bone hangs from.
///
/// `None` attaches the bone to the synthetic root. A parent index must be
/// smaller than the child index so bones can be created in keypoint order.
pub trait BoneTopology {
    /// Parent keypoint of `joint`.
    fn parent(&self, joint: usize) -> Option<usize>;
}

/// Every bone is a child of the previous keypoint; keypoint 0 hangs from the root.
///
/// This is not an anatomical skeleton, just a chain in keypoint order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinearChain;

impl BoneTopology for LinearChain {
    fn parent(&self, joint: usize) -> Option<usize> {
        joint.checked_sub(1)
    }
}

impl<F> BoneTopology for F
where
    F: Fn(usize) -> Option<usize>,
{
    fn parent(&self, joint: usize) -> Option<usize> {
        self(joint)
    }
}

/// Resolve parents for `count` joints, rejecting forward references.
///
/// # Errors
///
/// Returns [`RigError::ConfigError`] if a joint names itself or a later joint as parent.
pub fn resolve_parents<T: BoneTopology + ?Sized>(topology: &T, count: usize) -> Result<Vec<Option<usize>>> {
    (0..count)
        .map(|joint| match topology.parent(joint) {
            Some(p) if p >= joint => Err(RigError::ConfigError(format!(
                "bone {joint} cannot hang from bone {p}: parents must precede children"
            ))),
            parent => Ok(parent),
        })
        .collect()
}
